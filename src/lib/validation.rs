//! Pre-flight checks run before an export.
//!
//! None of these stop an export: layout is total and renders whatever it is given. They
//! point out input that will probably not look the way the author expects, such as a
//! missing title, chapters that sort ambiguously, or characters the PDF base fonts
//! cannot draw.

use std::collections::BTreeMap;
use std::fmt;

use crate::book::Book;
use crate::fonts::win_ansi_byte;
use crate::options::{ColorScheme, ExportOptions};
use crate::style::is_known_category;

/// Words longer than this are hard-broken across lines.
pub const LONG_WORD_CHARS: usize = 40;

#[derive(Debug, Clone, PartialEq)]
pub enum ValidationWarning {
    EmptyTitle,
    DuplicateChapterOrder { order: i64, titles: Vec<String> },
    EmptyChapter { title: String },
    LongWord { chapter: String, word: String },
    UnknownCategory { category: String },
    CustomSchemeWithoutColors,
    UnsupportedCharacters { chars: Vec<char> },
}

impl fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ValidationWarning::EmptyTitle => {
                write!(f, "⚠️  The book has no title; \"Untitled\" will be used")
            }
            ValidationWarning::DuplicateChapterOrder { order, titles } => write!(
                f,
                "⚠️  Chapters {} share order {}; they keep their file order",
                titles
                    .iter()
                    .map(|t| format!("'{}'", t))
                    .collect::<Vec<_>>()
                    .join(", "),
                order
            ),
            ValidationWarning::EmptyChapter { title } => {
                write!(f, "⚠️  Chapter '{}' has no content", title)
            }
            ValidationWarning::LongWord { chapter, word } => {
                let preview: String = word.chars().take(20).collect();
                write!(
                    f,
                    "⚠️  Chapter '{}' contains a {}-character word ({}...) that will be broken across lines",
                    chapter,
                    word.chars().count(),
                    preview
                )
            }
            ValidationWarning::UnknownCategory { category } => write!(
                f,
                "⚠️  Unknown category '{}'; the default style will be used",
                category
            ),
            ValidationWarning::CustomSchemeWithoutColors => write!(
                f,
                "⚠️  Custom color scheme selected without three valid colors; the default palette will be used"
            ),
            ValidationWarning::UnsupportedCharacters { chars } => {
                let list = chars
                    .iter()
                    .map(|c| format!("U+{:04X} ({})", *c as u32, c))
                    .collect::<Vec<_>>()
                    .join(", ");
                write!(
                    f,
                    "⚠️  {} character(s) cannot be drawn with the built-in PDF fonts: {}\n💡 Suggestion: enable embed_system_fonts in [fonts] or pick a font that covers them",
                    chars.len(),
                    list
                )
            }
        }
    }
}

/// Whether `c` can be drawn with a base-14 PDF font. Line breaks and tabs never reach the
/// page as glyphs.
pub fn is_win_ansi(c: char) -> bool {
    matches!(c, '\n' | '\r' | '\t') || win_ansi_byte(c).is_some()
}

fn custom_colors_valid(options: &ExportOptions) -> bool {
    options.custom_colors.as_ref().map_or(false, |colors| {
        colors
            .iter()
            .all(|c| crate::color::Color::parse_hex(c).is_some())
    })
}

fn all_text(book: &Book) -> impl Iterator<Item = &str> {
    std::iter::once(book.title.as_str())
        .chain(book.author.as_deref())
        .chain(book.cover_text.as_deref())
        .chain(book.credits.as_deref())
        .chain(
            book.chapters
                .iter()
                .flat_map(|c| [c.title.as_str(), c.content.as_str()]),
        )
}

/// Collects warnings about `book` exported with `options`.
///
/// Unsupported characters are only reported when no system fonts will be embedded, since
/// an embedded face usually covers them.
pub fn validate_export(
    book: &Book,
    options: &ExportOptions,
    embedding_fonts: bool,
) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();

    if book.title.trim().is_empty() {
        warnings.push(ValidationWarning::EmptyTitle);
    }

    if let Some(category) = book.category.as_deref() {
        if !category.trim().is_empty() && !is_known_category(category) {
            warnings.push(ValidationWarning::UnknownCategory {
                category: category.to_string(),
            });
        }
    }

    let mut by_order: BTreeMap<i64, Vec<String>> = BTreeMap::new();
    for chapter in &book.chapters {
        by_order
            .entry(chapter.order)
            .or_default()
            .push(chapter.title.clone());
    }
    for (order, titles) in by_order {
        if titles.len() > 1 {
            warnings.push(ValidationWarning::DuplicateChapterOrder { order, titles });
        }
    }

    for chapter in book.ordered_chapters() {
        if chapter.is_empty() {
            warnings.push(ValidationWarning::EmptyChapter {
                title: chapter.title.clone(),
            });
            continue;
        }
        if let Some(word) = chapter
            .content
            .split_whitespace()
            .find(|w| w.chars().count() > LONG_WORD_CHARS)
        {
            warnings.push(ValidationWarning::LongWord {
                chapter: chapter.title.clone(),
                word: word.to_string(),
            });
        }
    }

    if options.color_scheme == ColorScheme::Custom && !custom_colors_valid(options) {
        warnings.push(ValidationWarning::CustomSchemeWithoutColors);
    }

    if !embedding_fonts {
        let mut unsupported: Vec<char> = Vec::new();
        for c in all_text(book).flat_map(str::chars) {
            if !is_win_ansi(c) && !unsupported.contains(&c) {
                unsupported.push(c);
            }
        }
        if !unsupported.is_empty() {
            warnings.push(ValidationWarning::UnsupportedCharacters { chars: unsupported });
        }
    }

    warnings
}
