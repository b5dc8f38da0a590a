//! The bookpress library lays out a structured book (title, chapters, cover and credits text)
//! and exports it as a paginated PDF, a paged HTML document, an EPUB, Markdown or plain text.
//!
//! Export runs in three stages. A style is resolved from the book's category, the user's
//! options and an optional style suggestion from an enrichment service. The paginator turns
//! the book into a flat list of draw operations with every position already computed. A
//! renderer adapter finally turns those operations into bytes.
//!
//! Basic usage builds a [`Book`] and asks for a format:
//! ```rust
//! use bookpress::{export_book, Book, Chapter, ExportFormat, ExportOptions};
//! use std::error::Error;
//!
//! fn example() -> Result<(), Box<dyn Error>> {
//!     let mut book = Book::new("The Long Road");
//!     book.author = Some("R. Walker".to_string());
//!     book.chapters.push(Chapter::new("Leaving", "We left at dawn.\n\nNobody waved.", 1));
//!
//!     let document = export_book(&book, &ExportOptions::default(), ExportFormat::Pdf, None, None)?;
//!     assert_eq!(document.mime_type(), "application/pdf");
//!     Ok(())
//! }
//! # example().unwrap();
//! ```
//!
//! Export options can also come from a TOML configuration file (`bookpressrc.toml`):
//! ```toml
//! [page]
//! size = "6x9"
//! margins = "mirrored"
//!
//! [text]
//! fontfamily = "Garamond"
//! alignment = "justify"
//!
//! [features]
//! drop_caps = true
//! paper_texture = true
//!
//! [color]
//! scheme = "custom"
//! custom = ["#1b1b1b", "#fbf7ee", "#7a2e0e"]
//! ```
//!
//! ## Export pipeline
//! ```text
//! +-------------+     +-----------------+     +------------------+
//! | Book        |     | Style resolver  |     | Paginator        |
//! | + options   | --> | category table  | --> | cover, contents, |
//! | + category  |     | + enrichment    |     | chapters, credits|
//! +-------------+     | + options       |     +------------------+
//!                     +-----------------+              |
//!                                                      v
//! +-------------+     +-----------------+     +------------------+
//! | Document    |     | Renderer        |     | Vec<DrawOperation|
//! | bytes, MIME | <-- | PDF (printpdf)  | <-- | text, line,      |
//! | data URI    |     | paged HTML      |     | circle, break    |
//! +-------------+     +-----------------+     +------------------+
//! ```
//!
//! Markdown and plain text skip layout and are produced from the book directly (see
//! [`formats`]). EPUB also skips layout, since readers reflow the text, but it uses the
//! resolved style for its stylesheet (see [`epub`]).

pub mod book;
pub mod color;
pub mod config;
pub mod enrichment;
pub mod epub;
pub mod fonts;
pub mod formats;
pub mod layout;
pub mod measure;
pub mod options;
pub mod plan;
pub mod render;
pub mod style;
pub mod validation;

pub use book::{Book, Chapter};
pub use options::{ExportFormat, ExportOptions};
pub use render::{Document, DocumentMeta, Renderer};
pub use style::{resolve_style, ResolvedStyle, StyleSuggestion};

use enrichment::{enrich_or_degrade, EnrichmentRequest, StyleEnricher};
use fonts::{load_font_face, FontConfig, LoadedFace};
use layout::{DrawOperation, Paginator};
use log::{debug, info};
use measure::FaceMetrics;
use render::{HtmlRenderer, PdfRenderer};
use std::error::Error;
use std::fmt;
use std::path::Path;

/// Errors that can stop an export.
///
/// Enrichment failures never show up here: they degrade to the category defaults.
#[derive(Debug)]
pub enum ExportError {
    /// The draw operations or a font could not be turned into a document
    RenderError {
        message: String,
        /// 1-based page the problem was found on
        page: Option<usize>,
        suggestion: String,
    },
    /// Indicates an invalid configuration
    ConfigError { message: String, suggestion: String },
    /// Indicates an I/O error
    IoError {
        message: String,
        path: String,
        suggestion: String,
    },
    /// The book file could not be parsed
    BookError { message: String, suggestion: String },
    /// The subscription plan does not allow the requested export
    EntitlementError { message: String, suggestion: String },
}

impl Error for ExportError {}
impl fmt::Display for ExportError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ExportError::RenderError {
                message,
                page,
                suggestion,
            } => {
                write!(f, "❌ Render Error: {}", message)?;
                if let Some(p) = page {
                    write!(f, " (on page {})", p)?;
                }
                write!(f, "\n💡 Suggestion: {}", suggestion)?;
                Ok(())
            }
            ExportError::ConfigError {
                message,
                suggestion,
            } => {
                write!(f, "❌ Configuration Error: {}", message)?;
                write!(f, "\n💡 Suggestion: {}", suggestion)?;
                Ok(())
            }
            ExportError::IoError {
                message,
                path,
                suggestion,
            } => {
                write!(f, "❌ File Error: {}", message)?;
                write!(f, "\n📁 Path: {}", path)?;
                write!(f, "\n💡 Suggestion: {}", suggestion)?;
                Ok(())
            }
            ExportError::BookError {
                message,
                suggestion,
            } => {
                write!(f, "❌ Book Error: {}", message)?;
                write!(f, "\n💡 Suggestion: {}", suggestion)?;
                Ok(())
            }
            ExportError::EntitlementError {
                message,
                suggestion,
            } => {
                write!(f, "❌ Plan Error: {}", message)?;
                write!(f, "\n💡 Suggestion: {}", suggestion)?;
                Ok(())
            }
        }
    }
}

impl ExportError {
    /// Creates a render error that is not tied to a page
    pub fn render_error(message: impl Into<String>) -> Self {
        ExportError::RenderError {
            message: message.into(),
            page: None,
            suggestion: "Try the export again with decorative elements or font embedding disabled"
                .to_string(),
        }
    }

    /// Creates a configuration error with a generic hint
    pub fn config_error(message: impl Into<String>) -> Self {
        ExportError::ConfigError {
            message: message.into(),
            suggestion: "Run with --get-default-configuration to see every valid setting"
                .to_string(),
        }
    }
}

/// Resolves the style for `book` and lays it out.
///
/// Both steps are total; this never fails. The operations use the approximate base-14
/// metrics; [`export_book`] measures with real faces when fonts are embedded.
pub fn layout_book(
    book: &Book,
    options: &ExportOptions,
    suggestion: Option<&StyleSuggestion>,
) -> (ResolvedStyle, Vec<DrawOperation>) {
    let style = resolve_style(book.category.as_deref(), options, suggestion);
    let ops = Paginator::new(&style, options).paginate(book);
    (style, ops)
}

/// Finds font files for the style's body and heading families.
///
/// Families that cannot be found are left to the PDF base fonts; files that exist but
/// cannot be read or parsed are an error.
fn load_style_faces(
    style: &ResolvedStyle,
    font_config: &FontConfig,
) -> Result<Vec<(String, LoadedFace)>, ExportError> {
    let mut faces: Vec<(String, LoadedFace)> = Vec::new();
    for family in [&style.body_font, &style.heading_font] {
        if faces.iter().any(|(f, _)| f.eq_ignore_ascii_case(family)) {
            continue;
        }
        if let Some(face) = load_font_face(family, font_config)? {
            debug!("Using {} for '{}'", face.path.display(), family);
            faces.push((family.clone(), face));
        }
    }
    Ok(faces)
}

fn render_pdf(
    book: &Book,
    options: &ExportOptions,
    style: &ResolvedStyle,
    meta: &DocumentMeta,
    font_config: Option<&FontConfig>,
) -> Result<Document, ExportError> {
    let faces = match font_config.filter(|c| c.wants_embedding()) {
        Some(config) => load_style_faces(style, config)?,
        None => Vec::new(),
    };

    if faces.is_empty() {
        let ops = Paginator::new(style, options).paginate(book);
        return PdfRenderer::new().render(&ops, style, options, meta);
    }

    let metrics = FaceMetrics::from_faces(faces.iter().map(|(f, face)| (f.as_str(), face)))?;
    let ops = Paginator::new(style, options)
        .with_measure(&metrics)
        .paginate(book);
    let renderer = faces
        .into_iter()
        .fold(PdfRenderer::new(), |r, (family, face)| r.with_face(&family, face));
    renderer.render(&ops, style, options, meta)
}

/// Exports `book` in `format`.
///
/// # Arguments
/// * `suggestion` - A style suggestion obtained beforehand; malformed ones are ignored
/// * `font_config` - Font lookup settings; only PDF export embeds fonts
///
/// # Returns
/// * `Ok(Document)` holding the complete output
/// * `Err(ExportError)` when rendering fails; no partial document is returned
///
/// # Example
/// ```rust
/// use bookpress::{export_book, Book, Chapter, ExportFormat, ExportOptions};
///
/// let mut book = Book::new("Notes");
/// book.chapters.push(Chapter::new("First", "Hello.", 1));
/// let html = export_book(&book, &ExportOptions::default(), ExportFormat::Html, None, None).unwrap();
/// assert!(String::from_utf8(html.bytes).unwrap().contains("Notes"));
/// ```
pub fn export_book(
    book: &Book,
    options: &ExportOptions,
    format: ExportFormat,
    suggestion: Option<&StyleSuggestion>,
    font_config: Option<&FontConfig>,
) -> Result<Document, ExportError> {
    let meta = DocumentMeta {
        title: book.display_title().to_string(),
        author: book.author_name().map(str::to_string),
    };

    let document = match format {
        ExportFormat::Markdown => Document::new(
            format,
            formats::to_markdown(book, options).into_bytes(),
        ),
        ExportFormat::Text => Document::new(
            format,
            formats::to_plain_text(book, options).into_bytes(),
        ),
        ExportFormat::Pdf => {
            let style = resolve_style(book.category.as_deref(), options, suggestion);
            render_pdf(book, options, &style, &meta, font_config)?
        }
        ExportFormat::Html => {
            let (style, ops) = layout_book(book, options, suggestion);
            HtmlRenderer::new().render(&ops, &style, options, &meta)?
        }
        ExportFormat::Epub => {
            let style = resolve_style(book.category.as_deref(), options, suggestion);
            Document::new(format, epub::to_epub(book, options, &style)?)
        }
    };

    info!(
        "Exported '{}' as {} ({} bytes)",
        meta.title,
        format.as_str(),
        document.len()
    );
    Ok(document)
}

/// Asks `enricher` for a style suggestion, then exports.
///
/// Any enrichment failure falls back to the category defaults and is only logged.
pub fn export_with_enricher(
    book: &Book,
    options: &ExportOptions,
    format: ExportFormat,
    enricher: &dyn StyleEnricher,
    font_config: Option<&FontConfig>,
) -> Result<Document, ExportError> {
    let suggestion = match format {
        ExportFormat::Pdf | ExportFormat::Html | ExportFormat::Epub => {
            enrich_or_degrade(enricher, &EnrichmentRequest::new(book, options))
        }
        ExportFormat::Markdown | ExportFormat::Text => None,
    };
    export_book(book, options, format, suggestion.as_ref(), font_config)
}

/// Exports `book` and returns it as a `data:` URI.
pub fn export_to_data_uri(
    book: &Book,
    options: &ExportOptions,
    format: ExportFormat,
    suggestion: Option<&StyleSuggestion>,
    font_config: Option<&FontConfig>,
) -> Result<String, ExportError> {
    export_book(book, options, format, suggestion, font_config).map(|d| d.to_data_uri())
}

/// Writes a document to `path`. The parent directory must already exist.
pub fn save_document(document: &Document, path: &str) -> Result<(), ExportError> {
    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            return Err(ExportError::IoError {
                message: "Output directory does not exist".to_string(),
                path: parent.display().to_string(),
                suggestion: format!("Create the directory first: mkdir -p {}", parent.display()),
            });
        }
    }

    std::fs::write(path, &document.bytes).map_err(|e| {
        let reason = e.to_string();
        ExportError::IoError {
            suggestion: if e.kind() == std::io::ErrorKind::PermissionDenied {
                "Check that you have write permissions for this location".to_string()
            } else {
                "Try a different output path or check available disk space".to_string()
            },
            message: reason,
            path: path.to_string(),
        }
    })
}

/// Exports `book` to `path`, picking the format from the file extension (PDF when the
/// extension is missing or unknown).
///
/// # Example
/// ```rust,no_run
/// use bookpress::{export_to_file, Book, ExportOptions};
///
/// let book = Book::new("Draft");
/// export_to_file(&book, &ExportOptions::default(), "draft.html", None, None).unwrap();
/// ```
pub fn export_to_file(
    book: &Book,
    options: &ExportOptions,
    path: &str,
    suggestion: Option<&StyleSuggestion>,
    font_config: Option<&FontConfig>,
) -> Result<Document, ExportError> {
    let format = ExportFormat::from_path(path).unwrap_or(ExportFormat::Pdf);
    let document = export_book(book, options, format, suggestion, font_config)?;
    save_document(&document, path)?;
    Ok(document)
}

#[cfg(test)]
mod tests {
    use super::*;
    use enrichment::EnrichmentError;

    fn sample() -> Book {
        let mut book = Book::new("Harbor Lights");
        book.author = Some("M. Quay".to_string());
        book.category = Some("mystery".to_string());
        book.chapters
            .push(Chapter::new("Fog", "The fog came in.\n\nNobody saw the boat.", 1));
        book.chapters
            .push(Chapter::new("Tide", "By morning the tide had turned.", 2));
        book
    }

    struct FixedEnricher(Result<&'static str, ()>);

    impl StyleEnricher for FixedEnricher {
        fn suggest(
            &self,
            _request: &EnrichmentRequest,
        ) -> Result<StyleSuggestion, EnrichmentError> {
            match self.0 {
                Ok(json) => Ok(StyleSuggestion::from_json_str(json)),
                Err(()) => Err(EnrichmentError::Timeout),
            }
        }
    }

    #[test]
    fn test_error_display() {
        let err = ExportError::IoError {
            message: "Output directory does not exist".to_string(),
            path: "/nope".to_string(),
            suggestion: "Create it".to_string(),
        };
        let text = err.to_string();
        assert!(text.starts_with("❌ File Error"));
        assert!(text.contains("📁 Path: /nope"));
        assert!(text.contains("💡 Suggestion: Create it"));

        let render = ExportError::RenderError {
            message: "bad".to_string(),
            page: Some(4),
            suggestion: "x".to_string(),
        };
        assert!(render.to_string().contains("(on page 4)"));
        assert!(ExportError::config_error("oops")
            .to_string()
            .contains("--get-default-configuration"));
    }

    #[test]
    fn test_export_every_format() {
        let options = ExportOptions::default();
        let book = sample();

        let pdf = export_book(&book, &options, ExportFormat::Pdf, None, None).unwrap();
        assert!(pdf.bytes.starts_with(b"%PDF"));

        let html = export_book(&book, &options, ExportFormat::Html, None, None).unwrap();
        assert_eq!(html.mime_type(), "text/html");

        let md = export_book(&book, &options, ExportFormat::Markdown, None, None).unwrap();
        assert!(String::from_utf8(md.bytes).unwrap().starts_with("# Harbor Lights"));

        let txt = export_book(&book, &options, ExportFormat::Text, None, None).unwrap();
        assert_eq!(txt.mime_type(), "text/plain");

        let epub = export_book(&book, &options, ExportFormat::Epub, None, None).unwrap();
        assert!(epub.bytes.starts_with(b"PK\x03\x04"));
        assert_eq!(epub.mime_type(), "application/epub+zip");
    }

    #[test]
    fn test_failed_enrichment_matches_plain_export() {
        let options = ExportOptions::default();
        let book = sample();
        let plain = export_book(&book, &options, ExportFormat::Html, None, None).unwrap();
        let degraded = export_with_enricher(
            &book,
            &options,
            ExportFormat::Html,
            &FixedEnricher(Err(())),
            None,
        )
        .unwrap();
        assert_eq!(plain, degraded);
    }

    #[test]
    fn test_enrichment_colors_reach_output() {
        let enricher = FixedEnricher(Ok(r##"{"colorScheme": "#101010, #fafafa, #cc0000"}"##));
        let html = export_with_enricher(
            &sample(),
            &ExportOptions::default(),
            ExportFormat::Html,
            &enricher,
            None,
        )
        .unwrap();
        let html = String::from_utf8(html.bytes).unwrap();
        assert!(html.contains("background: #fafafa"));
    }

    #[test]
    fn test_layout_book_is_deterministic() {
        let options = ExportOptions {
            paper_texture: true,
            ..ExportOptions::default()
        };
        let (_, first) = layout_book(&sample(), &options, None);
        let (_, second) = layout_book(&sample(), &options, None);
        assert_eq!(first, second);
    }

    #[test]
    fn test_data_uri_prefix() {
        let uri = export_to_data_uri(
            &sample(),
            &ExportOptions::default(),
            ExportFormat::Pdf,
            None,
            None,
        )
        .unwrap();
        assert!(uri.starts_with("data:application/pdf;base64,JVBERi"));
    }

    #[test]
    fn test_save_into_missing_directory() {
        let doc = Document::new(ExportFormat::Text, b"x".to_vec());
        let err = save_document(&doc, "/definitely/not/here/out.txt").unwrap_err();
        assert!(matches!(err, ExportError::IoError { .. }));
    }
}
