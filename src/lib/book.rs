//! Book content model.
//!
//! A [`Book`] is the already-materialized record handed to the exporter: title, optional
//! metadata, ordered chapters and optional cover/credits text. The exporter only reads it.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::ExportError;

/// A single chapter. `content` holds paragraphs separated by blank lines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chapter {
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub order: i64,
}

impl Chapter {
    pub fn new(title: impl Into<String>, content: impl Into<String>, order: i64) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            order,
        }
    }

    pub fn paragraphs(&self) -> Vec<String> {
        split_paragraphs(&self.content)
    }

    pub fn is_empty(&self) -> bool {
        self.content.trim().is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Book {
    pub title: String,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default, rename = "type")]
    pub book_type: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub chapters: Vec<Chapter>,
    #[serde(default)]
    pub cover_text: Option<String>,
    #[serde(default)]
    pub credits: Option<String>,
}

impl Book {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    /// Chapters in rendering order: sorted by `order`, ties keep their input position.
    pub fn ordered_chapters(&self) -> Vec<&Chapter> {
        let mut chapters: Vec<&Chapter> = self.chapters.iter().collect();
        chapters.sort_by_key(|c| c.order);
        chapters
    }

    /// Author line for credits, when there is a non-blank author.
    pub fn author_name(&self) -> Option<&str> {
        self.author
            .as_deref()
            .map(str::trim)
            .filter(|a| !a.is_empty())
    }

    pub fn credits_text(&self) -> Option<&str> {
        self.credits
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
    }

    /// Title used for display; blank titles become "Untitled".
    pub fn display_title(&self) -> &str {
        let t = self.title.trim();
        if t.is_empty() {
            "Untitled"
        } else {
            t
        }
    }

    /// First `max_chars` characters of the book's prose, used as an enrichment sample.
    pub fn content_sample(&self, max_chars: usize) -> String {
        let mut sample = String::new();
        for chapter in self.ordered_chapters() {
            for para in chapter.paragraphs() {
                if !sample.is_empty() {
                    sample.push(' ');
                }
                sample.push_str(&para);
                if sample.chars().count() >= max_chars {
                    return sample.chars().take(max_chars).collect();
                }
            }
        }
        sample
    }

    /// Parses a book from JSON.
    pub fn from_json_str(input: &str) -> Result<Book, ExportError> {
        serde_json::from_str(input).map_err(|e| ExportError::BookError {
            message: format!("invalid book JSON: {}", e),
            suggestion: "Check that the file has a \"title\" and a \"chapters\" array".to_string(),
        })
    }

    /// Parses a book from TOML (`[[chapters]]` tables).
    pub fn from_toml_str(input: &str) -> Result<Book, ExportError> {
        toml::from_str(input).map_err(|e| ExportError::BookError {
            message: format!("invalid book TOML: {}", e),
            suggestion: "Check that the file has a title and [[chapters]] tables".to_string(),
        })
    }

    /// Loads a book file, choosing the parser from the extension (`.toml`, otherwise JSON).
    pub fn load(path: &Path) -> Result<Book, ExportError> {
        let content = fs::read_to_string(path).map_err(|e| ExportError::IoError {
            message: e.to_string(),
            path: path.display().to_string(),
            suggestion: "Check that the book file exists and is readable".to_string(),
        })?;
        let is_toml = path
            .extension()
            .and_then(|e| e.to_str())
            .map_or(false, |e| e.eq_ignore_ascii_case("toml"));
        if is_toml {
            Book::from_toml_str(&content)
        } else {
            Book::from_json_str(&content)
        }
    }
}

/// Splits text into paragraphs on blank lines (empty or whitespace-only lines).
///
/// Line breaks inside a paragraph and runs of whitespace collapse to single spaces.
/// Paragraphs that end up empty are dropped.
pub fn split_paragraphs(content: &str) -> Vec<String> {
    let mut paragraphs = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for line in content.lines() {
        if line.trim().is_empty() {
            flush_paragraph(&mut current, &mut paragraphs);
        } else {
            current.push(line);
        }
    }
    flush_paragraph(&mut current, &mut paragraphs);
    paragraphs
}

fn flush_paragraph(current: &mut Vec<&str>, paragraphs: &mut Vec<String>) {
    if current.is_empty() {
        return;
    }
    let joined = current
        .iter()
        .flat_map(|line| line.split_whitespace())
        .collect::<Vec<_>>()
        .join(" ");
    if !joined.is_empty() {
        paragraphs.push(joined);
    }
    current.clear();
}
