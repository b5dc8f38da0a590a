//! Paged HTML adapter.
//!
//! Each page becomes a fixed-size `<section>` in millimetres. Text runs are absolutely
//! positioned spans, anchored with a CSS transform for centered and right-aligned runs so
//! the browser's own font metrics do not shift the anchor. Lines and circles go into one
//! SVG layer per page, drawn beneath the text. The output prints one section per sheet.

use log::info;

use super::{page_number_label, split_pages, validate_ops, Document, DocumentMeta, Renderer};
use crate::color::Color;
use crate::fonts::css_font_stack;
use crate::layout::{DrawOperation, FontWeight, TextAlign};
use crate::options::{ExportFormat, ExportOptions, PT_TO_MM};
use crate::style::ResolvedStyle;
use crate::ExportError;

/// Distance from the top of a `line-height: 1` box to its baseline, in em.
const ASCENT_EM: f32 = 0.8;

/// Escapes text for HTML element content and attribute values.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlRenderer;

impl HtmlRenderer {
    pub fn new() -> Self {
        Self
    }

    fn stylesheet(style: &ResolvedStyle, options: &ExportOptions) -> String {
        let (w, h) = options.page_dimensions_mm();
        format!(
            "@page {{ size: {w:.2}mm {h:.2}mm; margin: 0; }}\n\
             body {{ margin: 0; background: #e0e0e0; }}\n\
             .page {{ position: relative; width: {w:.2}mm; height: {h:.2}mm; margin: 8mm auto; \
             overflow: hidden; background: {bg}; color: {fg}; box-shadow: 0 1mm 3mm rgba(0,0,0,.25); }}\n\
             .page svg {{ position: absolute; left: 0; top: 0; }}\n\
             .page span {{ position: absolute; white-space: pre; line-height: 1; }}\n\
             .body-font {{ font-family: {body}; }}\n\
             .heading-font {{ font-family: {heading}; }}\n\
             .bold {{ font-weight: bold; }}\n\
             .italic {{ font-style: italic; }}\n\
             .page-number {{ position: absolute; left: 0; width: 100%; text-align: center; \
             font-family: {body}; }}\n\
             @media print {{ body {{ background: none; }} \
             .page {{ margin: 0; box-shadow: none; break-after: page; }} }}\n",
            w = w,
            h = h,
            bg = escape_html(&style.palette.background),
            fg = escape_html(&style.palette.primary),
            body = css_font_stack(&style.body_font),
            heading = css_font_stack(&style.heading_font),
        )
    }

    fn svg_layer(page_ops: &[DrawOperation], width: f32, height: f32) -> Option<String> {
        let mut shapes = String::new();
        for op in page_ops {
            match op {
                DrawOperation::Line {
                    x1,
                    y1,
                    x2,
                    y2,
                    color,
                    thickness,
                    ..
                } => shapes.push_str(&format!(
                    "<line x1=\"{:.2}\" y1=\"{:.2}\" x2=\"{:.2}\" y2=\"{:.2}\" stroke=\"{}\" stroke-width=\"{:.2}\"/>",
                    x1,
                    y1,
                    x2,
                    y2,
                    color.to_hex(),
                    thickness
                )),
                DrawOperation::Circle {
                    cx,
                    cy,
                    radius,
                    color,
                    filled,
                    ..
                } => {
                    let paint = if *filled {
                        format!("fill=\"{}\"", color.to_hex())
                    } else {
                        format!("fill=\"none\" stroke=\"{}\" stroke-width=\"0.3\"", color.to_hex())
                    };
                    shapes.push_str(&format!(
                        "<circle cx=\"{:.2}\" cy=\"{:.2}\" r=\"{:.2}\" {}/>",
                        cx, cy, radius, paint
                    ));
                }
                _ => {}
            }
        }
        if shapes.is_empty() {
            return None;
        }
        Some(format!(
            "<svg width=\"{w:.2}mm\" height=\"{h:.2}mm\" viewBox=\"0 0 {w:.2} {h:.2}\">{shapes}</svg>",
            w = width,
            h = height,
            shapes = shapes
        ))
    }

    fn text_span(op: &DrawOperation, primary: Color) -> Option<String> {
        let DrawOperation::Text {
            x,
            y,
            content,
            font_size,
            weight,
            align,
            color,
            role,
            ..
        } = op
        else {
            return None;
        };
        let size_mm = font_size * PT_TO_MM;
        let top = y - size_mm * ASCENT_EM;
        let shift = match align {
            TextAlign::Left => "",
            TextAlign::Center => " transform: translateX(-50%);",
            TextAlign::Right => " transform: translateX(-100%);",
        };
        let mut classes = vec![
            role.as_str(),
            if role.uses_heading_font() {
                "heading-font"
            } else {
                "body-font"
            },
        ];
        match weight {
            FontWeight::Bold => classes.push("bold"),
            FontWeight::Italic => classes.push("italic"),
            FontWeight::Regular => {}
        }
        let color_rule = if *color == primary {
            String::new()
        } else {
            format!(" color: {};", color.to_hex())
        };
        Some(format!(
            "<span class=\"{}\" style=\"left: {:.2}mm; top: {:.2}mm; font-size: {:.2}pt;{}{}\">{}</span>",
            classes.join(" "),
            x,
            top,
            font_size,
            color_rule,
            shift,
            escape_html(content)
        ))
    }
}

impl Renderer for HtmlRenderer {
    fn format(&self) -> ExportFormat {
        ExportFormat::Html
    }

    fn render(
        &self,
        ops: &[DrawOperation],
        style: &ResolvedStyle,
        options: &ExportOptions,
        meta: &DocumentMeta,
    ) -> Result<Document, ExportError> {
        let total = validate_ops(ops)?;
        let (width, height) = options.page_dimensions_mm();
        let primary = style.primary_color();

        let mut html = String::new();
        html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n");
        html.push_str(&format!("<title>{}</title>\n", escape_html(&meta.title)));
        if let Some(author) = &meta.author {
            html.push_str(&format!(
                "<meta name=\"author\" content=\"{}\">\n",
                escape_html(author)
            ));
        }
        html.push_str(&format!(
            "<style>\n{}</style>\n</head>\n<body>\n",
            Self::stylesheet(style, options)
        ));

        for (index, page_ops) in split_pages(ops).into_iter().enumerate() {
            html.push_str(&format!(
                "<section class=\"page\" id=\"page-{}\">\n",
                index + 1
            ));
            if let Some(svg) = Self::svg_layer(page_ops, width, height) {
                html.push_str(&svg);
                html.push('\n');
            }
            for span in page_ops.iter().filter_map(|op| Self::text_span(op, primary)) {
                html.push_str(&span);
                html.push('\n');
            }
            if options.show_page_numbers {
                let size = style.font_size * 0.8;
                let top = height - style.margin_mm / 2.0 - size * PT_TO_MM * ASCENT_EM;
                html.push_str(&format!(
                    "<div class=\"page-number\" style=\"top: {:.2}mm; font-size: {:.2}pt;\">{}</div>\n",
                    top,
                    size,
                    page_number_label(index, total)
                ));
            }
            html.push_str("</section>\n");
        }
        html.push_str("</body>\n</html>\n");

        info!("Rendered {} page(s) to HTML", total);
        Ok(Document::new(ExportFormat::Html, html.into_bytes()))
    }
}
