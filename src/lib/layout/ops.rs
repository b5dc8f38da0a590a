//! Draw operations: the only contract between layout and rendering.
//!
//! Coordinates are millimetres with the origin at the top-left corner of the page. For
//! text, `y` is the baseline and `x` is the anchor named by `align`.

use crate::color::Color;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FontWeight {
    Regular,
    Bold,
    Italic,
}

/// Which point of the text `x` refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextAlign {
    Left,
    Center,
    Right,
}

/// What a piece of text is, so adapters can pick the font and tag the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextRole {
    Title,
    Author,
    CoverText,
    TocHeading,
    TocEntry,
    TocLeader,
    TocPage,
    ChapterLabel,
    ChapterTitle,
    Body,
    DropCap,
    CreditsHeading,
    Credits,
    RunningHeader,
}

impl TextRole {
    /// Roles set in the heading font; everything else uses the body font.
    pub fn uses_heading_font(self) -> bool {
        matches!(
            self,
            TextRole::Title
                | TextRole::TocHeading
                | TextRole::ChapterLabel
                | TextRole::ChapterTitle
                | TextRole::DropCap
                | TextRole::CreditsHeading
                | TextRole::RunningHeader
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TextRole::Title => "title",
            TextRole::Author => "author",
            TextRole::CoverText => "cover-text",
            TextRole::TocHeading => "toc-heading",
            TextRole::TocEntry => "toc-entry",
            TextRole::TocLeader => "toc-leader",
            TextRole::TocPage => "toc-page",
            TextRole::ChapterLabel => "chapter-label",
            TextRole::ChapterTitle => "chapter-title",
            TextRole::Body => "body",
            TextRole::DropCap => "drop-cap",
            TextRole::CreditsHeading => "credits-heading",
            TextRole::Credits => "credits",
            TextRole::RunningHeader => "running-header",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawOperation {
    Text {
        page: usize,
        x: f32,
        y: f32,
        content: String,
        /// Points.
        font_size: f32,
        weight: FontWeight,
        align: TextAlign,
        /// Measured width of `content` in millimetres.
        width: f32,
        color: Color,
        role: TextRole,
    },
    Line {
        page: usize,
        x1: f32,
        y1: f32,
        x2: f32,
        y2: f32,
        color: Color,
        thickness: f32,
    },
    Circle {
        page: usize,
        cx: f32,
        cy: f32,
        radius: f32,
        color: Color,
        filled: bool,
    },
    PageBreak,
}

impl DrawOperation {
    /// Page index of the operation; `None` for page breaks.
    pub fn page(&self) -> Option<usize> {
        match self {
            DrawOperation::Text { page, .. }
            | DrawOperation::Line { page, .. }
            | DrawOperation::Circle { page, .. } => Some(*page),
            DrawOperation::PageBreak => None,
        }
    }

    pub fn is_page_break(&self) -> bool {
        matches!(self, DrawOperation::PageBreak)
    }

    pub fn text(&self) -> Option<&str> {
        match self {
            DrawOperation::Text { content, .. } => Some(content),
            _ => None,
        }
    }

    pub fn role(&self) -> Option<TextRole> {
        match self {
            DrawOperation::Text { role, .. } => Some(*role),
            _ => None,
        }
    }

    /// Left edge of a text operation, resolving its anchor.
    pub fn text_left(&self) -> Option<f32> {
        match self {
            DrawOperation::Text { x, width, align, .. } => Some(match align {
                TextAlign::Left => *x,
                TextAlign::Center => *x - *width / 2.0,
                TextAlign::Right => *x - *width,
            }),
            _ => None,
        }
    }

    fn set_page(&mut self, index: usize) {
        match self {
            DrawOperation::Text { page, .. }
            | DrawOperation::Line { page, .. }
            | DrawOperation::Circle { page, .. } => *page = index,
            DrawOperation::PageBreak => {}
        }
    }

    pub(crate) fn on_page(mut self, index: usize) -> Self {
        self.set_page(index);
        self
    }
}

/// Number of pages described by an operation list.
pub fn page_count(ops: &[DrawOperation]) -> usize {
    1 + ops.iter().filter(|op| op.is_page_break()).count()
}
