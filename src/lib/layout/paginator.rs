//! Pagination.
//!
//! The [`Paginator`] walks a [`Book`] and emits [`DrawOperation`]s page by page:
//!
//! ```text
//! [cover] → contents → chapter 1 → chapter 2 → … → [credits]
//! ```
//!
//! Every chapter starts on a new page. The table of contents shows real page numbers, so it
//! is laid out twice: once with placeholders to learn how many pages it takes, and again
//! once the chapters have been placed.
//!
//! A line is only placed after checking that it fits above the bottom margin; otherwise
//! the page is closed first. A fresh page always accepts at least one line, so layout
//! terminates for any page size.

use log::{debug, info};

use super::ops::{DrawOperation, FontWeight, TextAlign, TextRole};
use super::texture::texture_dots;
use super::wrap::{wrap_lines, wrap_uniform};
use crate::book::{split_paragraphs, Book, Chapter};
use crate::color::Color;
use crate::measure::{BuiltinMetrics, TextMeasure};
use crate::options::{ExportOptions, TextAlignment};
use crate::style::{
    line_height_mm, DividerVariant, Motif, PageBreakStrategy, PageDecoration, ResolvedStyle,
    HEADING_SCALE, TITLE_SCALE,
};

/// Baseline position inside a line box, as a fraction of the line height.
const BASELINE_RATIO: f32 = 0.8;
/// Top of the cover title block, as a fraction of the page height.
const COVER_TITLE_RATIO: f32 = 0.33;
/// Width reserved for page numbers in the table of contents.
const TOC_NUMBER_PLACEHOLDER: &str = "0000";
const TOC_LEADER_PAD_MM: f32 = 1.5;
const ELLIPSIS: &str = "...";
const DIVIDER_CIRCLE_RADIUS_MM: f32 = 1.2;
const DASH_MM: f32 = 4.0;
const DASH_GAP_MM: f32 = 3.0;
const CORNER_MARK_MM: f32 = 6.0;
const RUNNING_HEADER_SCALE: f32 = 0.8;
const MIN_CONTENT_WIDTH_MM: f32 = 10.0;

#[derive(Debug, Clone, Copy)]
struct Geometry {
    width: f32,
    height: f32,
    margin: f32,
    gutter: f32,
}

impl Geometry {
    fn content_width(&self) -> f32 {
        (self.width - 2.0 * self.margin - self.gutter).max(MIN_CONTENT_WIDTH_MM)
    }

    /// Left edge of the text block. The gutter sits on the spine side, which is the left
    /// for recto pages (even indices, since index 0 is page 1).
    fn left(&self, page: usize) -> f32 {
        if page % 2 == 0 {
            self.margin + self.gutter
        } else {
            self.margin
        }
    }

    fn center_x(&self, page: usize) -> f32 {
        self.left(page) + self.content_width() / 2.0
    }

    fn top(&self) -> f32 {
        self.margin
    }

    fn bottom(&self) -> f32 {
        self.height - self.margin
    }
}

/// Pages under construction. `first_page` is the global index of `pages[0]`.
struct Layout {
    first_page: usize,
    pages: Vec<Vec<DrawOperation>>,
    /// Top of the next line box, in millimetres from the top edge.
    y: f32,
}

impl Layout {
    fn starting_at(first_page: usize) -> Self {
        Self {
            first_page,
            pages: Vec::new(),
            y: 0.0,
        }
    }

    fn page(&self) -> usize {
        self.first_page + self.pages.len().saturating_sub(1)
    }

    fn next_index(&self) -> usize {
        self.first_page + self.pages.len()
    }

    fn new_page(&mut self, top: f32) {
        self.pages.push(Vec::new());
        self.y = top;
    }

    fn push(&mut self, op: DrawOperation) {
        if self.pages.is_empty() {
            self.pages.push(Vec::new());
        }
        let page = self.page();
        if let Some(current) = self.pages.last_mut() {
            current.push(op.on_page(page));
        }
    }
}

/// Size, weight, color and role of a run of text.
#[derive(Debug, Clone, Copy)]
struct TextStyle {
    size: f32,
    weight: FontWeight,
    color: Color,
    role: TextRole,
}

/// Lays out books with one resolved style and set of options.
pub struct Paginator<'a> {
    style: &'a ResolvedStyle,
    options: &'a ExportOptions,
    measure: &'a dyn TextMeasure,
    geometry: Geometry,
}

impl<'a> Paginator<'a> {
    /// Creates a paginator measuring text with the base-font tables.
    pub fn new(style: &'a ResolvedStyle, options: &'a ExportOptions) -> Self {
        let (width, height) = options.page_dimensions_mm();
        Self {
            style,
            options,
            measure: &BuiltinMetrics,
            geometry: Geometry {
                width,
                height,
                margin: style.margin_mm,
                gutter: style.gutter_mm,
            },
        }
    }

    /// Uses other text metrics, typically those of embedded font files.
    pub fn with_measure(mut self, measure: &'a dyn TextMeasure) -> Self {
        self.measure = measure;
        self
    }

    /// Lays out the whole book.
    pub fn paginate(&self, book: &Book) -> Vec<DrawOperation> {
        let chapters = book.ordered_chapters();

        let mut cover = Layout::starting_at(0);
        if self.options.cover_page {
            self.layout_cover(&mut cover, book);
        }

        let toc_first = cover.next_index();
        let mut draft = Layout::starting_at(toc_first);
        self.layout_toc(&mut draft, &chapters, None);

        let mut body = Layout::starting_at(draft.next_index());
        let starts: Vec<usize> = chapters
            .iter()
            .enumerate()
            .map(|(index, chapter)| self.layout_chapter(&mut body, index, chapter))
            .collect();

        if self.options.credits_page {
            if let Some(credits) = book.credits_text() {
                self.layout_credits(&mut body, credits);
            }
        }

        let mut toc = Layout::starting_at(toc_first);
        self.layout_toc(&mut toc, &chapters, Some(&starts));
        debug_assert_eq!(toc.pages.len(), draft.pages.len());

        let pages: Vec<Vec<DrawOperation>> = cover
            .pages
            .into_iter()
            .chain(toc.pages)
            .chain(body.pages)
            .collect();
        info!(
            "Laid out '{}': {} chapter(s) on {} page(s)",
            book.display_title(),
            chapters.len(),
            pages.len()
        );
        self.finish(book, pages)
    }

    fn body_line_height(&self) -> f32 {
        self.style.line_height_mm()
    }

    fn body_style(&self, role: TextRole) -> TextStyle {
        TextStyle {
            size: self.style.font_size,
            weight: FontWeight::Regular,
            color: self.style.primary_color(),
            role,
        }
    }

    fn heading_style(&self, role: TextRole) -> TextStyle {
        TextStyle {
            size: self.style.font_size * HEADING_SCALE,
            weight: FontWeight::Bold,
            color: self.style.primary_color(),
            role,
        }
    }

    fn width_of(&self, text: &str, ts: TextStyle) -> f32 {
        let family = if ts.role.uses_heading_font() {
            &self.style.heading_font
        } else {
            &self.style.body_font
        };
        self.measure.text_width(text, family, ts.size, ts.weight)
    }

    fn text(
        &self,
        x: f32,
        baseline: f32,
        content: String,
        align: TextAlign,
        ts: TextStyle,
    ) -> DrawOperation {
        let width = self.width_of(&content, ts);
        DrawOperation::Text {
            page: 0,
            x,
            y: baseline,
            content,
            font_size: ts.size,
            weight: ts.weight,
            align,
            width,
            color: ts.color,
            role: ts.role,
        }
    }

    /// Starts a new page when a box of `height` does not fit above the bottom margin.
    fn ensure_room(&self, layout: &mut Layout, height: f32) {
        let g = &self.geometry;
        if layout.y + height > g.bottom() && layout.y > g.top() {
            debug!("Page {} is full, breaking", layout.page() + 1);
            layout.new_page(g.top());
        }
    }

    /// Shortens `text` with an ellipsis until it fits `max_width`.
    fn fit_with_ellipsis(&self, text: &str, max_width: f32, ts: TextStyle) -> String {
        if self.width_of(text, ts) <= max_width {
            return text.to_string();
        }
        let mut shortened = text.to_string();
        while !shortened.is_empty() {
            shortened.pop();
            let candidate = format!("{}{}", shortened.trim_end(), ELLIPSIS);
            if self.width_of(&candidate, ts) <= max_width {
                return candidate;
            }
        }
        ELLIPSIS.to_string()
    }

    /// Wraps `text` and centers every line, advancing by the line height of its size.
    fn layout_centered(&self, layout: &mut Layout, text: &str, ts: TextStyle) {
        let lh = line_height_mm(ts.size, self.style.line_height);
        let width = self.geometry.content_width();
        for line in wrap_uniform(text, width, |s| self.width_of(s, ts)) {
            self.ensure_room(layout, lh);
            let x = self.geometry.center_x(layout.page());
            let op = self.text(x, layout.y + lh * BASELINE_RATIO, line, TextAlign::Center, ts);
            layout.push(op);
            layout.y += lh;
        }
    }

    /// Emits one wrapped line inside the box starting at `left` with width `available`.
    fn emit_line(
        &self,
        layout: &mut Layout,
        line: &str,
        left: f32,
        available: f32,
        last: bool,
        ts: TextStyle,
    ) {
        let baseline = layout.y + self.body_line_height() * BASELINE_RATIO;
        let op = match self.options.alignment {
            TextAlignment::Left => self.text(left, baseline, line.to_string(), TextAlign::Left, ts),
            TextAlignment::Center => self.text(
                left + available / 2.0,
                baseline,
                line.to_string(),
                TextAlign::Center,
                ts,
            ),
            TextAlignment::Right => self.text(
                left + available,
                baseline,
                line.to_string(),
                TextAlign::Right,
                ts,
            ),
            TextAlignment::Justify => {
                let words: Vec<&str> = line.split(' ').collect();
                if last || words.len() < 2 {
                    self.text(left, baseline, line.to_string(), TextAlign::Left, ts)
                } else {
                    let widths: Vec<f32> = words.iter().map(|w| self.width_of(w, ts)).collect();
                    let natural: f32 = widths.iter().sum();
                    let gap = ((available - natural) / (words.len() - 1) as f32).max(0.0);
                    let mut x = left;
                    for (word, width) in words.iter().zip(&widths) {
                        let op = self.text(x, baseline, word.to_string(), TextAlign::Left, ts);
                        layout.push(op);
                        x += width + gap;
                    }
                    return;
                }
            }
        };
        layout.push(op);
    }

    fn layout_paragraph(&self, layout: &mut Layout, text: &str, ts: TextStyle) {
        let lh = self.body_line_height();
        let width = self.geometry.content_width();
        let lines = wrap_uniform(text, width, |s| self.width_of(s, ts));
        if lines.is_empty() {
            return;
        }

        if self.style.page_break == PageBreakStrategy::KeepShortParagraphs && lines.len() <= 2 {
            self.ensure_room(layout, lines.len() as f32 * lh);
        }

        let last = lines.len() - 1;
        for (i, line) in lines.iter().enumerate() {
            self.ensure_room(layout, lh);
            let left = self.geometry.left(layout.page());
            self.emit_line(layout, line, left, width, i == last, ts);
            layout.y += lh;
        }
        layout.y += lh / 2.0;
    }

    /// First paragraph of a chapter with an enlarged initial. The lines beside the cap are
    /// narrowed; later lines use the full width.
    fn layout_drop_cap_paragraph(&self, layout: &mut Layout, text: &str, ts: TextStyle) {
        let mut chars = text.chars();
        let cap = match chars.next() {
            Some(c) => c,
            None => return,
        };
        let rest = chars.as_str();

        let drop_cap = self.style.decorations.drop_cap;
        let cap_style = TextStyle {
            size: self.style.font_size * drop_cap.scale,
            weight: if drop_cap.bold {
                FontWeight::Bold
            } else {
                FontWeight::Regular
            },
            color: if drop_cap.accent_color {
                self.style.accent_color()
            } else {
                self.style.primary_color()
            },
            role: TextRole::DropCap,
        };
        let cap_text = cap.to_string();
        let cap_width = self.width_of(&cap_text, cap_style);

        let lh = self.body_line_height();
        let width = self.geometry.content_width();
        let beside = drop_cap.lines.max(1);
        let narrow = (width - cap_width - drop_cap.gap_mm).max(1.0);
        let lines = wrap_lines(
            rest,
            |i| if i < beside { narrow } else { width },
            |s| self.width_of(s, ts),
        );

        self.ensure_room(layout, beside as f32 * lh);
        let cap_page = layout.page();
        let cap_top = layout.y;
        let left = self.geometry.left(cap_page);
        let cap_baseline = cap_top + (beside - 1) as f32 * lh + lh * BASELINE_RATIO;
        let op = self.text(left, cap_baseline, cap_text, TextAlign::Left, cap_style);
        layout.push(op);

        let last = lines.len().saturating_sub(1);
        for (i, line) in lines.iter().enumerate() {
            self.ensure_room(layout, lh);
            let left = self.geometry.left(layout.page());
            if i < beside {
                let indent = cap_width + drop_cap.gap_mm;
                self.emit_line(layout, line, left + indent, narrow, i == last, ts);
            } else {
                self.emit_line(layout, line, left, width, i == last, ts);
            }
            layout.y += lh;
        }

        let cap_bottom = cap_top + beside as f32 * lh;
        if layout.page() == cap_page && layout.y < cap_bottom {
            layout.y = cap_bottom;
        }
        layout.y += lh / 2.0;
    }

    fn layout_cover(&self, layout: &mut Layout, book: &Book) {
        let lh = self.body_line_height();
        layout.new_page(self.geometry.top());
        layout.y = self.geometry.height * COVER_TITLE_RATIO;

        let title_style = TextStyle {
            size: self.style.font_size * TITLE_SCALE,
            weight: FontWeight::Bold,
            color: self.style.primary_color(),
            role: TextRole::Title,
        };
        self.layout_centered(layout, book.display_title(), title_style);

        if self.options.decorative_elements {
            let page = layout.page();
            let cx = self.geometry.center_x(page);
            let half = (self.geometry.content_width() * 0.2).min(30.0);
            let y = layout.y + lh * 0.25;
            layout.push(line(cx - half, y, cx + half, y, self.style.accent_color(), 0.6));
            layout.y += lh;
        }
        layout.y += lh / 2.0;

        if let Some(author) = book.author_name() {
            let author_style = TextStyle {
                weight: FontWeight::Italic,
                ..self.body_style(TextRole::Author)
            };
            self.layout_centered(layout, &format!("by {}", author), author_style);
            layout.y += lh / 2.0;
        }

        if let Some(cover_text) = book.cover_text.as_deref() {
            let paragraphs = split_paragraphs(cover_text);
            if !paragraphs.is_empty() {
                layout.y += lh;
            }
            for paragraph in paragraphs {
                self.layout_centered(layout, &paragraph, self.body_style(TextRole::CoverText));
                layout.y += lh / 2.0;
            }
        }
    }

    /// Table of contents. Without `page_numbers` every number is a placeholder.
    fn layout_toc(
        &self,
        layout: &mut Layout,
        chapters: &[&Chapter],
        page_numbers: Option<&[usize]>,
    ) {
        let lh = self.body_line_height();
        layout.new_page(self.geometry.top());
        self.layout_centered(layout, "Contents", self.heading_style(TextRole::TocHeading));
        layout.y += lh / 2.0;

        let entry_style = self.body_style(TextRole::TocEntry);
        let leader_style = self.body_style(TextRole::TocLeader);
        let number_style = self.body_style(TextRole::TocPage);
        let number_width = self.width_of(TOC_NUMBER_PLACEHOLDER, number_style);
        let dot_width = self.width_of(".", leader_style).max(0.1);
        let width = self.geometry.content_width();

        for (i, chapter) in chapters.iter().enumerate() {
            self.ensure_room(layout, lh);
            let left = self.geometry.left(layout.page());
            let baseline = layout.y + lh * BASELINE_RATIO;

            let title = chapter.title.split_whitespace().collect::<Vec<_>>().join(" ");
            let entry = self.fit_with_ellipsis(
                &format!("{}. {}", i + 1, title),
                width - number_width - 2.0 * TOC_LEADER_PAD_MM,
                entry_style,
            );
            let entry_width = self.width_of(&entry, entry_style);
            layout.push(self.text(left, baseline, entry, TextAlign::Left, entry_style));

            let leader_start = left + entry_width + TOC_LEADER_PAD_MM;
            let leader_end = left + width - number_width - TOC_LEADER_PAD_MM;
            let dots = ((leader_end - leader_start) / dot_width).floor();
            if dots >= 1.0 {
                let leader = ".".repeat(dots as usize);
                layout.push(self.text(leader_start, baseline, leader, TextAlign::Left, leader_style));
            }

            let number = page_numbers
                .and_then(|numbers| numbers.get(i))
                .map(|page| (page + 1).to_string())
                .unwrap_or_else(|| "0".to_string());
            layout.push(self.text(left + width, baseline, number, TextAlign::Right, number_style));
            layout.y += lh;
        }
    }

    /// Lays out one chapter on fresh pages and returns the index of its first page.
    fn layout_chapter(&self, layout: &mut Layout, index: usize, chapter: &Chapter) -> usize {
        let lh = self.body_line_height();
        layout.new_page(self.geometry.top());
        let start = layout.page();
        debug!("Chapter {} starts on page {}", index + 1, start + 1);

        let label_style = TextStyle {
            color: self.style.accent_color(),
            ..self.body_style(TextRole::ChapterLabel)
        };
        self.layout_centered(layout, &format!("Chapter {}", index + 1), label_style);
        self.layout_centered(
            layout,
            chapter.title.trim(),
            self.heading_style(TextRole::ChapterTitle),
        );
        layout.y += lh / 2.0;

        if self.options.chapter_dividers {
            self.layout_divider(layout, index);
        }

        let body = self.body_style(TextRole::Body);
        for (i, paragraph) in chapter.paragraphs().iter().enumerate() {
            if i == 0 && self.options.drop_caps && paragraph.chars().count() > 1 {
                self.layout_drop_cap_paragraph(layout, paragraph, body);
            } else {
                self.layout_paragraph(layout, paragraph, body);
            }
        }
        start
    }

    fn layout_divider(&self, layout: &mut Layout, index: usize) {
        let lh = self.body_line_height();
        self.ensure_room(layout, lh);

        let divider = self.style.decorations.divider;
        let color = self.style.accent_color();
        let thickness = divider.thickness_mm;
        let cx = self.geometry.center_x(layout.page());
        let y = layout.y + lh / 2.0;
        let half = self.geometry.content_width() * divider.width_ratio / 2.0;

        match DividerVariant::for_chapter(index) {
            DividerVariant::Plain => {
                layout.push(line(cx - half, y, cx + half, y, color, thickness));
            }
            DividerVariant::LineCircleLine => {
                let r = DIVIDER_CIRCLE_RADIUS_MM;
                let pad = r + 1.0;
                let half = half.max(pad);
                layout.push(line(cx - half, y, cx - pad, y, color, thickness));
                layout.push(circle(cx, y, r, color, true));
                layout.push(line(cx + pad, y, cx + half, y, color, thickness));
            }
            DividerVariant::TripleDash => {
                let total = 3.0 * DASH_MM + 2.0 * DASH_GAP_MM;
                let mut x = cx - total / 2.0;
                for _ in 0..3 {
                    layout.push(line(x, y, x + DASH_MM, y, color, thickness));
                    x += DASH_MM + DASH_GAP_MM;
                }
            }
        }
        layout.y += lh * 1.5;
    }

    fn layout_credits(&self, layout: &mut Layout, credits: &str) {
        let lh = self.body_line_height();
        layout.new_page(self.geometry.top());
        self.layout_centered(layout, "Credits", self.heading_style(TextRole::CreditsHeading));
        layout.y += lh / 2.0;
        for paragraph in split_paragraphs(credits) {
            self.layout_paragraph(layout, &paragraph, self.body_style(TextRole::Credits));
        }
    }

    /// Flattens the pages, putting page decorations first on each page and a
    /// [`DrawOperation::PageBreak`] between pages.
    fn finish(&self, book: &Book, pages: Vec<Vec<DrawOperation>>) -> Vec<DrawOperation> {
        let mut ops = Vec::new();
        for (index, page_ops) in pages.into_iter().enumerate() {
            if index > 0 {
                ops.push(DrawOperation::PageBreak);
            }
            ops.extend(self.page_decorations(book, index));
            ops.extend(page_ops);
        }
        ops
    }

    fn page_decorations(&self, book: &Book, page: usize) -> Vec<DrawOperation> {
        let g = &self.geometry;
        let accent = self.style.accent_color();
        let mut ops = Vec::new();

        if self.options.paper_texture {
            ops.extend(texture_dots(
                self.options.texture_seed,
                page,
                g.width,
                g.height,
                accent,
            ));
        }

        let inset = g.margin / 2.0;
        let (x0, y0, x1, y1) = (inset, inset, g.width - inset, g.height - inset);
        for decoration in &self.style.decorations.page {
            match decoration {
                PageDecoration::Border => {
                    ops.push(line(x0, y0, x1, y0, accent, 0.3));
                    ops.push(line(x1, y0, x1, y1, accent, 0.3));
                    ops.push(line(x1, y1, x0, y1, accent, 0.3));
                    ops.push(line(x0, y1, x0, y0, accent, 0.3));
                }
                PageDecoration::CornerMarks => {
                    let m = CORNER_MARK_MM;
                    for (x, y, dx, dy) in [
                        (x0, y0, m, m),
                        (x1, y0, -m, m),
                        (x0, y1, m, -m),
                        (x1, y1, -m, -m),
                    ] {
                        ops.push(line(x, y, x + dx, y, accent, 0.4));
                        ops.push(line(x, y, x, y + dy, accent, 0.4));
                    }
                }
            }
        }

        let is_cover = self.options.cover_page && page == 0;
        if self.options.header_footer && !is_cover {
            let ts = TextStyle {
                size: self.style.font_size * RUNNING_HEADER_SCALE,
                weight: FontWeight::Italic,
                color: self.style.primary_color(),
                role: TextRole::RunningHeader,
            };
            let title = self.fit_with_ellipsis(book.display_title(), g.content_width(), ts);
            ops.push(self.text(
                g.center_x(page),
                g.margin * 0.55,
                title,
                TextAlign::Center,
                ts,
            ));
            self.motif(&mut ops, page, self.style.decorations.header, g.margin * 0.75);
            self.motif(
                &mut ops,
                page,
                self.style.decorations.footer,
                g.height - g.margin * 0.75,
            );
        }

        ops.into_iter().map(|op| op.on_page(page)).collect()
    }

    fn motif(&self, ops: &mut Vec<DrawOperation>, page: usize, motif: Motif, y: f32) {
        let g = &self.geometry;
        let color = self.style.accent_color();
        let left = g.left(page);
        let right = left + g.content_width();
        let cx = g.center_x(page);
        match motif {
            Motif::None => {}
            Motif::Rule => ops.push(line(left, y, right, y, color, 0.3)),
            Motif::DoubleRule => {
                ops.push(line(left, y - 0.4, right, y - 0.4, color, 0.2));
                ops.push(line(left, y + 0.4, right, y + 0.4, color, 0.2));
            }
            Motif::Dots => {
                for i in -2..=2 {
                    ops.push(circle(cx + i as f32 * 3.0, y, 0.5, color, true));
                }
            }
            Motif::Ornament => {
                let half = (g.content_width() * 0.2).min(20.0).max(3.0);
                ops.push(line(cx - half, y, cx - 2.0, y, color, 0.3));
                ops.push(circle(cx, y, 1.0, color, false));
                ops.push(line(cx + 2.0, y, cx + half, y, color, 0.3));
            }
        }
    }
}

fn line(x1: f32, y1: f32, x2: f32, y2: f32, color: Color, thickness: f32) -> DrawOperation {
    DrawOperation::Line {
        page: 0,
        x1,
        y1,
        x2,
        y2,
        color,
        thickness,
    }
}

fn circle(cx: f32, cy: f32, radius: f32, color: Color, filled: bool) -> DrawOperation {
    DrawOperation::Circle {
        page: 0,
        cx,
        cy,
        radius,
        color,
        filled,
    }
}

/// Lays out `book` with the base-font metrics.
pub fn paginate(book: &Book, style: &ResolvedStyle, options: &ExportOptions) -> Vec<DrawOperation> {
    Paginator::new(style, options).paginate(book)
}
