//! Layout: everything between a resolved style and a renderer.
//!
//! ```text
//! Book + ResolvedStyle + ExportOptions
//!          │
//!          ▼
//!     Paginator ── wrap (line breaking)
//!          │    ── texture (seeded paper dots)
//!          ▼
//!   Vec<DrawOperation>  ──▶  render::{PdfRenderer, HtmlRenderer}
//! ```

mod ops;
mod paginator;
pub mod texture;
pub mod wrap;

pub use ops::{page_count, DrawOperation, FontWeight, TextAlign, TextRole};
pub use paginator::{paginate, Paginator};
