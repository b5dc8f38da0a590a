//! PDF adapter.
//!
//! Maps draw operations onto `printpdf` page operations. Layout coordinates are
//! millimetres from the top-left corner; PDF user space is points from the bottom-left,
//! so every y coordinate is flipped against the page height here and nowhere else.
//!
//! Text is set in the PDF base fonts (Helvetica, Times, Courier) picked through
//! [`BuiltinFamily`], unless a face was loaded for the family, in which case that face is
//! embedded. Base-font text is written as WinAnsiEncoding bytes, the encoding the font
//! dictionaries declare; characters outside it are drawn as `?`. Lines are stroked two-point polygons and circles are 32-sided polygons, the
//! same primitives `printpdf` uses for rectangles.

use std::collections::{BTreeSet, HashMap};
use std::f32::consts::PI;

use log::{debug, info, warn};
use printpdf::font::ParsedFont;
use printpdf::graphics::{LinePoint, PaintMode, Point, Polygon, PolygonRing, WindingOrder};
use printpdf::matrix::TextMatrix;
use printpdf::ops::Op;
use printpdf::text::TextItem;
use printpdf::xobject::DictItem;
use printpdf::{BuiltinFont, FontId, Mm, PdfDocument, PdfPage, PdfSaveOptions, Pt, Rgb};

use super::{page_number_label, split_pages, validate_ops, Document, DocumentMeta, Renderer};
use crate::color::Color;
use crate::fonts::{encode_win_ansi, BuiltinFamily, LoadedFace};
use crate::layout::{DrawOperation, FontWeight, TextRole};
use crate::measure::{FaceMetrics, TextMeasure};
use crate::options::{ExportFormat, ExportOptions};
use crate::style::ResolvedStyle;
use crate::ExportError;

const CIRCLE_SEGMENTS: usize = 32;
/// Stroke width of unfilled circles, in millimetres.
const CIRCLE_STROKE_MM: f32 = 0.3;
/// Page-number size relative to the body size.
const PAGE_NUMBER_SCALE: f32 = 0.8;

fn mm_to_pt(mm: f32) -> f32 {
    Mm(mm).into_pt().0
}

fn pdf_color(color: Color) -> printpdf::color::Color {
    let (r, g, b) = color.as_unit_floats();
    printpdf::color::Color::Rgb(Rgb::new(r, g, b, None))
}

fn point(x: f32, y: f32) -> LinePoint {
    LinePoint {
        p: Point { x: Pt(x), y: Pt(y) },
        bezier: false,
    }
}

fn polygon(points: Vec<LinePoint>, mode: PaintMode) -> Op {
    Op::DrawPolygon {
        polygon: Polygon {
            rings: vec![PolygonRing { points }],
            mode,
            winding_order: WindingOrder::EvenOdd,
        },
    }
}

/// Font used for one text operation.
#[derive(Debug, Clone)]
enum PdfFont {
    Builtin(BuiltinFont),
    Embedded(FontId),
}

/// Renders draw operations to PDF bytes.
#[derive(Debug, Clone, Default)]
pub struct PdfRenderer {
    /// Faces to embed, keyed by lowercase family name.
    faces: HashMap<String, LoadedFace>,
}

impl PdfRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Embeds `face` wherever `family` is used.
    pub fn with_face(mut self, family: &str, face: LoadedFace) -> Self {
        self.faces.insert(family.trim().to_lowercase(), face);
        self
    }

    pub fn has_faces(&self) -> bool {
        !self.faces.is_empty()
    }

    /// Adds the loaded faces to the document. A face that printpdf cannot parse fails the
    /// whole render.
    fn register_faces(
        &self,
        doc: &mut PdfDocument,
    ) -> Result<HashMap<String, FontId>, ExportError> {
        let mut ids = HashMap::new();
        for (family, face) in &self.faces {
            let mut warnings = Vec::new();
            let parsed = ParsedFont::from_bytes(&face.bytes, 0, &mut warnings).ok_or_else(|| {
                ExportError::RenderError {
                    message: format!("font '{}' could not be embedded", face.family),
                    page: None,
                    suggestion: format!(
                        "Replace {} or disable font embedding",
                        face.path.display()
                    ),
                }
            })?;
            if !warnings.is_empty() {
                debug!("{} warning(s) while parsing {}", warnings.len(), face.path.display());
            }
            let id = doc.add_font(&parsed);
            info!("Embedded font {} for '{}'", face.path.display(), family);
            ids.insert(family.clone(), id);
        }
        Ok(ids)
    }
}

/// Per-document state shared by all pages.
struct PageWriter<'a> {
    style: &'a ResolvedStyle,
    embedded: &'a HashMap<String, FontId>,
    page_height_pt: f32,
    ops: Vec<Op>,
    /// Characters drawn as the replacement byte.
    missing: BTreeSet<char>,
}

impl<'a> PageWriter<'a> {
    fn new(
        style: &'a ResolvedStyle,
        embedded: &'a HashMap<String, FontId>,
        page_height_mm: f32,
    ) -> Self {
        Self {
            style,
            embedded,
            page_height_pt: mm_to_pt(page_height_mm),
            ops: Vec::new(),
            missing: BTreeSet::new(),
        }
    }

    fn font_for(&self, role: TextRole, weight: FontWeight) -> PdfFont {
        let family = if role.uses_heading_font() {
            &self.style.heading_font
        } else {
            &self.style.body_font
        };
        match self.embedded.get(&family.trim().to_lowercase()) {
            Some(id) => PdfFont::Embedded(id.clone()),
            None => PdfFont::Builtin(BuiltinFamily::from_name(family).builtin(weight)),
        }
    }

    fn y(&self, mm: f32) -> f32 {
        self.page_height_pt - mm_to_pt(mm)
    }

    fn fill_page(&mut self, width_mm: f32, height_mm: f32, color: Color) {
        let (w, h) = (mm_to_pt(width_mm), mm_to_pt(height_mm));
        self.ops.push(Op::SetFillColor {
            col: pdf_color(color),
        });
        self.ops.push(polygon(
            vec![point(0.0, 0.0), point(w, 0.0), point(w, h), point(0.0, h)],
            PaintMode::Fill,
        ));
    }

    fn text(
        &mut self,
        left_mm: f32,
        baseline_mm: f32,
        content: &str,
        size: f32,
        color: Color,
        font: PdfFont,
    ) {
        let matrix = TextMatrix::Translate(Pt(mm_to_pt(left_mm)), Pt(self.y(baseline_mm)));
        self.ops.push(Op::StartTextSection);
        self.ops.push(Op::SetFillColor {
            col: pdf_color(color),
        });
        match font {
            PdfFont::Builtin(font) => {
                self.ops.push(Op::SetFontSizeBuiltinFont {
                    size: Pt(size),
                    font,
                });
                self.ops.push(Op::SetTextMatrix { matrix });
                self.builtin_text(content, font);
            }
            PdfFont::Embedded(font) => {
                self.ops.push(Op::SetFontSize {
                    size: Pt(size),
                    font: font.clone(),
                });
                self.ops.push(Op::SetTextMatrix { matrix });
                self.ops.push(Op::WriteText {
                    items: vec![TextItem::Text(content.to_string())],
                    font,
                });
            }
        }
        self.ops.push(Op::EndTextSection);
    }

    /// printpdf writes base-font strings as UTF-8, so anything beyond ASCII goes out as a
    /// raw `Tj` with WinAnsi bytes. The empty write keeps the font in the resources.
    fn builtin_text(&mut self, content: &str, font: BuiltinFont) {
        if content.is_ascii() {
            self.ops.push(Op::WriteTextBuiltinFont {
                items: vec![TextItem::Text(content.to_string())],
                font,
            });
            return;
        }
        let (bytes, missing) = encode_win_ansi(content);
        self.missing.extend(missing);
        self.ops.push(Op::WriteTextBuiltinFont {
            items: Vec::new(),
            font,
        });
        self.ops.push(Op::Unknown {
            key: "Tj".to_string(),
            value: vec![DictItem::String {
                data: bytes,
                literal: false,
            }],
        });
    }

    /// Stamps the centered page-number label.
    fn page_number(
        &mut self,
        label: &str,
        measure: &dyn TextMeasure,
        page_width_mm: f32,
        baseline_mm: f32,
        size: f32,
        color: Color,
    ) {
        let font = self.font_for(TextRole::Body, FontWeight::Regular);
        let width = measure.text_width(label, &self.style.body_font, size, FontWeight::Regular);
        self.text((page_width_mm - width) / 2.0, baseline_mm, label, size, color, font);
    }

    fn line(&mut self, from: (f32, f32), to: (f32, f32), color: Color, thickness_mm: f32) {
        self.ops.push(Op::SetOutlineColor {
            col: pdf_color(color),
        });
        self.ops.push(Op::SetOutlineThickness {
            pt: Pt(mm_to_pt(thickness_mm)),
        });
        let points = vec![
            point(mm_to_pt(from.0), self.y(from.1)),
            point(mm_to_pt(to.0), self.y(to.1)),
        ];
        self.ops.push(polygon(points, PaintMode::Stroke));
    }

    fn circle(&mut self, cx: f32, cy: f32, radius: f32, color: Color, filled: bool) {
        let (cx, cy, r) = (mm_to_pt(cx), self.y(cy), mm_to_pt(radius));
        let points = (0..CIRCLE_SEGMENTS)
            .map(|i| {
                let angle = 2.0 * PI * i as f32 / CIRCLE_SEGMENTS as f32;
                point(cx + r * angle.cos(), cy + r * angle.sin())
            })
            .collect();
        if filled {
            self.ops.push(Op::SetFillColor {
                col: pdf_color(color),
            });
            self.ops.push(polygon(points, PaintMode::Fill));
        } else {
            self.ops.push(Op::SetOutlineColor {
                col: pdf_color(color),
            });
            self.ops.push(Op::SetOutlineThickness {
                pt: Pt(mm_to_pt(CIRCLE_STROKE_MM)),
            });
            self.ops.push(polygon(points, PaintMode::Stroke));
        }
    }

    fn draw(&mut self, op: &DrawOperation) {
        match op {
            DrawOperation::Text {
                y,
                content,
                font_size,
                weight,
                color,
                role,
                ..
            } => {
                let left = op.text_left().unwrap_or(0.0);
                let font = self.font_for(*role, *weight);
                self.text(left, *y, content, *font_size, *color, font);
            }
            DrawOperation::Line {
                x1,
                y1,
                x2,
                y2,
                color,
                thickness,
                ..
            } => self.line((*x1, *y1), (*x2, *y2), *color, *thickness),
            DrawOperation::Circle {
                cx,
                cy,
                radius,
                color,
                filled,
                ..
            } => self.circle(*cx, *cy, *radius, *color, *filled),
            DrawOperation::PageBreak => {}
        }
    }
}

impl Renderer for PdfRenderer {
    fn format(&self) -> ExportFormat {
        ExportFormat::Pdf
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

        let mut doc = PdfDocument::new(&meta.title);
        let embedded = self.register_faces(&mut doc)?;
        let metrics =
            FaceMetrics::from_faces(self.faces.iter().map(|(f, face)| (f.as_str(), face)))?;
        let mut missing = BTreeSet::new();

        let background = style.background_color();
        let primary = style.primary_color();
        let number_size = style.font_size * PAGE_NUMBER_SCALE;

        for (index, page_ops) in split_pages(ops).into_iter().enumerate() {
            let mut writer = PageWriter::new(style, &embedded, height);
            if !background.is_white() {
                writer.fill_page(width, height, background);
            }
            for op in page_ops {
                writer.draw(op);
            }

            if options.show_page_numbers {
                let label = page_number_label(index, total);
                let baseline = height - style.margin_mm / 2.0;
                writer.page_number(&label, &metrics, width, baseline, number_size, primary);
            }

            missing.extend(writer.missing);
            doc.pages.push(PdfPage::new(Mm(width), Mm(height), writer.ops));
        }

        if !missing.is_empty() {
            warn!(
                "{} character(s) have no glyph in the PDF base fonts and were drawn as '?': {}",
                missing.len(),
                missing.iter().collect::<String>()
            );
        }

        // Unknown operators are only written when `secure` is off.
        let save_options = PdfSaveOptions {
            secure: false,
            ..PdfSaveOptions::default()
        };
        let mut warnings = Vec::new();
        let mut bytes = Vec::new();
        doc.save_writer(&mut bytes, &save_options, &mut warnings);
        if !warnings.is_empty() {
            warn!("printpdf reported {} warning(s) while saving", warnings.len());
        }
        if bytes.is_empty() {
            return Err(ExportError::RenderError {
                message: "PDF serialization produced no output".to_string(),
                page: None,
                suggestion: "Try again with font embedding disabled".to_string(),
            });
        }
        info!("Rendered {} page(s) to {} bytes of PDF", total, bytes.len());
        Ok(Document::new(ExportFormat::Pdf, bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mm_to_pt() {
        assert!((mm_to_pt(25.4) - 72.0).abs() < 0.01);
    }

    #[test]
    fn test_invalid_ops_produce_no_document() {
        let style = crate::style::resolve_style(None, &ExportOptions::default(), None);
        let ops = vec![DrawOperation::Line {
            page: 3,
            x1: 0.0,
            y1: 0.0,
            x2: 1.0,
            y2: 1.0,
            color: Color::BLACK,
            thickness: 0.2,
        }];
        let result = PdfRenderer::new().render(
            &ops,
            &style,
            &ExportOptions::default(),
            &DocumentMeta::default(),
        );
        assert!(matches!(result, Err(ExportError::RenderError { .. })));
    }

    #[test]
    fn test_builtin_font_selection() {
        let style = crate::style::resolve_style(None, &ExportOptions::default(), None);
        let embedded = HashMap::new();
        let writer = PageWriter::new(&style, &embedded, 100.0 * 25.4 / 72.0);
        match writer.font_for(TextRole::Title, FontWeight::Bold) {
            PdfFont::Builtin(font) => assert_eq!(font, BuiltinFont::TimesBold),
            PdfFont::Embedded(_) => panic!("no faces were loaded"),
        }
        assert!((writer.y(0.0) - 100.0).abs() < 1e-3);
    }

    #[test]
    fn test_non_ascii_text_is_written_as_win_ansi() {
        let style = crate::style::resolve_style(None, &ExportOptions::default(), None);
        let embedded = HashMap::new();
        let mut writer = PageWriter::new(&style, &embedded, 297.0);
        let font = writer.font_for(TextRole::Body, FontWeight::Regular);
        writer.text(10.0, 20.0, "Café ❄", 12.0, Color::BLACK, font);

        let raw: Vec<&Vec<DictItem>> = writer
            .ops
            .iter()
            .filter_map(|op| match op {
                Op::Unknown { key, value } if key == "Tj" => Some(value),
                _ => None,
            })
            .collect();
        assert_eq!(raw.len(), 1);
        match &raw[0][..] {
            [DictItem::String { data, .. }] => assert_eq!(data, &b"Caf\xE9 ?".to_vec()),
            other => panic!("unexpected operands {:?}", other),
        }
        assert!(writer.ops.iter().any(|op| matches!(
            op,
            Op::WriteTextBuiltinFont { items, font: BuiltinFont::TimesRoman } if items.is_empty()
        )));
        assert_eq!(writer.missing.iter().collect::<Vec<_>>(), vec![&'❄']);
    }

    struct FixedWidth(f32);

    impl TextMeasure for FixedWidth {
        fn text_width(&self, _: &str, _: &str, _: f32, _: FontWeight) -> f32 {
            self.0
        }
    }

    #[test]
    fn test_page_number_is_centered_with_given_measure() {
        let style = crate::style::resolve_style(None, &ExportOptions::default(), None);
        let embedded = HashMap::new();
        let mut writer = PageWriter::new(&style, &embedded, 297.0);
        writer.page_number("3 / 9", &FixedWidth(30.0), 210.0, 280.0, 10.0, Color::BLACK);

        let left = writer.ops.iter().find_map(|op| match op {
            Op::SetTextMatrix {
                matrix: TextMatrix::Translate(x, _),
            } => Some(x.0),
            _ => None,
        });
        assert_eq!(left, Some(mm_to_pt(90.0)));
    }
}
