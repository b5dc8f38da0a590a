//! Renderer adapters.
//!
//! A [`Renderer`] turns the draw operations produced by layout into a finished
//! [`Document`]. Adapters never lay text out themselves: every position, size and color
//! arrives in the [`DrawOperation`]s. The only thing an adapter adds is the `i / N`
//! page-number footer, because the page count is only final once layout is done.
//!
//! Every adapter validates the whole operation list before producing anything, so a
//! failing export never hands back a partial document.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::layout::DrawOperation;
use crate::options::{ExportFormat, ExportOptions};
use crate::style::ResolvedStyle;
use crate::ExportError;

pub mod html;
pub mod pdf;

pub use html::HtmlRenderer;
pub use pdf::PdfRenderer;

/// Document-level metadata.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentMeta {
    pub title: String,
    pub author: Option<String>,
}

/// A finished export.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub format: ExportFormat,
    pub bytes: Vec<u8>,
}

impl Document {
    pub fn new(format: ExportFormat, bytes: Vec<u8>) -> Self {
        Self { format, bytes }
    }

    pub fn mime_type(&self) -> &'static str {
        self.format.mime_type()
    }

    /// `data:<mime>;base64,<payload>`
    pub fn to_data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime_type(), STANDARD.encode(&self.bytes))
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

pub trait Renderer {
    fn format(&self) -> ExportFormat;

    fn render(
        &self,
        ops: &[DrawOperation],
        style: &ResolvedStyle,
        options: &ExportOptions,
        meta: &DocumentMeta,
    ) -> Result<Document, ExportError>;
}

/// Footer text for page `index` (0-based) of `total`.
pub fn page_number_label(index: usize, total: usize) -> String {
    format!("{} / {}", index + 1, total)
}

fn invalid(page: usize, message: String) -> ExportError {
    ExportError::RenderError {
        message,
        page: Some(page + 1),
        suggestion: "This is a layout bug; please report it with the book that triggered it"
            .to_string(),
    }
}

fn check_finite(page: usize, what: &str, values: &[f32]) -> Result<(), ExportError> {
    if values.iter().all(|v| v.is_finite()) {
        Ok(())
    } else {
        Err(invalid(page, format!("{} has a non-finite coordinate", what)))
    }
}

/// Checks an operation list and returns its page count.
///
/// Coordinates must be finite, sizes positive, and every operation must carry the index
/// of the page it appears on (the number of page breaks before it).
pub fn validate_ops(ops: &[DrawOperation]) -> Result<usize, ExportError> {
    let mut page = 0;
    for op in ops {
        match op {
            DrawOperation::PageBreak => {
                page += 1;
                continue;
            }
            DrawOperation::Text {
                x, y, font_size, ..
            } => {
                check_finite(page, "text", &[*x, *y, *font_size])?;
                if *font_size <= 0.0 {
                    return Err(invalid(page, format!("font size {} is not positive", font_size)));
                }
            }
            DrawOperation::Line {
                x1,
                y1,
                x2,
                y2,
                thickness,
                ..
            } => {
                check_finite(page, "line", &[*x1, *y1, *x2, *y2, *thickness])?;
                if *thickness < 0.0 {
                    return Err(invalid(page, "line thickness is negative".to_string()));
                }
            }
            DrawOperation::Circle { cx, cy, radius, .. } => {
                check_finite(page, "circle", &[*cx, *cy, *radius])?;
                if *radius < 0.0 {
                    return Err(invalid(page, "circle radius is negative".to_string()));
                }
            }
        }
        if op.page() != Some(page) {
            return Err(invalid(
                page,
                format!(
                    "operation claims page {} but follows {} page break(s)",
                    op.page().map_or(0, |p| p + 1),
                    page
                ),
            ));
        }
    }
    Ok(page + 1)
}

/// Splits an operation list into per-page slices.
pub fn split_pages(ops: &[DrawOperation]) -> Vec<&[DrawOperation]> {
    ops.split(DrawOperation::is_page_break).collect()
}
