//! Text exports.
//!
//! Markdown and plain text carry the book's structure without any layout: title block,
//! contents, chapters and credits. They bypass the paginator entirely; plain text is
//! wrapped to [`TEXT_COLUMNS`] with the same line breaker the paginator uses.

use crate::book::{split_paragraphs, Book};
use crate::layout::wrap::wrap_uniform;
use crate::options::{ExportOptions, TextAlignment};

/// Line width of plain-text exports, in characters.
pub const TEXT_COLUMNS: usize = 72;

fn char_width(s: &str) -> f32 {
    s.chars().count() as f32
}

fn collapse(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Lower-case, hyphenated anchor for a heading, the way Markdown renderers derive ids.
fn anchor(text: &str) -> String {
    let mut slug = String::new();
    for c in text.to_lowercase().chars() {
        if c.is_alphanumeric() {
            slug.push(c);
        } else if (c.is_whitespace() || c == '-') && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    slug.trim_matches('-').to_string()
}

/// `---`, `***`, `_ _ _` and longer runs, which Markdown reads as a rule.
fn is_thematic_break(line: &str) -> bool {
    let marks: Vec<char> = line.chars().filter(|c| !c.is_whitespace()).collect();
    marks.len() >= 3
        && matches!(marks[0], '-' | '*' | '_')
        && marks.iter().all(|&c| c == marks[0])
}

/// Escapes a marker at the start of `line` that would turn prose into a heading, quote,
/// list, rule or table.
fn escape_line_start(line: &str) -> String {
    let text = line.trim_start();
    let indent = &line[..line.len() - text.len()];
    let mut chars = text.chars();
    let first = match chars.next() {
        Some(c) => c,
        None => return line.to_string(),
    };
    let rest = chars.as_str();
    let followed_by_space = rest.is_empty() || rest.starts_with(char::is_whitespace);

    match first {
        '#' | '>' | '=' | '|' => format!("{}\\{}", indent, text),
        '-' | '+' | '*' | '_' if followed_by_space || is_thematic_break(text) => {
            format!("{}\\{}", indent, text)
        }
        c if c.is_ascii_digit() => {
            let digits = text.chars().take_while(char::is_ascii_digit).count();
            let (number, tail) = text.split_at(digits);
            let is_marker = match tail.strip_prefix(['.', ')']) {
                Some(after) => after.is_empty() || after.starts_with(char::is_whitespace),
                None => false,
            };
            if is_marker {
                format!("{}{}\\{}", indent, number, tail)
            } else {
                line.to_string()
            }
        }
        _ => line.to_string(),
    }
}

/// Paragraph text with every line safe from block-level Markdown syntax.
fn escape_block(text: &str) -> String {
    text.lines()
        .map(escape_line_start)
        .collect::<Vec<_>>()
        .join("\n")
}

fn escape_link_text(text: &str) -> String {
    text.replace('[', "\\[").replace(']', "\\]")
}

/// Renders the book as Markdown.
///
/// Paragraphs are written as they are, except for markers at the start of a line, which are
/// escaped so the text cannot turn into headings, lists or rules.
pub fn to_markdown(book: &Book, options: &ExportOptions) -> String {
    let chapters = book.ordered_chapters();
    let mut out = format!("# {}\n\n", collapse(book.display_title()));

    if options.cover_page {
        if let Some(author) = book.author_name() {
            out.push_str(&format!("*by {}*\n\n", author));
        }
        if let Some(cover) = book.cover_text.as_deref() {
            for paragraph in split_paragraphs(cover) {
                let quoted = escape_block(&paragraph).replace('\n', "\n> ");
                out.push_str(&format!("> {}\n>\n", quoted));
            }
            if out.ends_with(">\n") {
                out.truncate(out.len() - 2);
                out.push('\n');
            }
        }
    }

    out.push_str("## Contents\n\n");
    for (i, chapter) in chapters.iter().enumerate() {
        let heading = format!("Chapter {}: {}", i + 1, collapse(&chapter.title));
        out.push_str(&format!(
            "{}. [{}](#{})\n",
            i + 1,
            escape_link_text(&collapse(&chapter.title)),
            anchor(&heading)
        ));
    }
    out.push('\n');

    for (i, chapter) in chapters.iter().enumerate() {
        out.push_str(&format!(
            "## Chapter {}: {}\n\n",
            i + 1,
            collapse(&chapter.title)
        ));
        for paragraph in chapter.paragraphs() {
            out.push_str(&escape_block(&paragraph));
            out.push_str("\n\n");
        }
    }

    if options.credits_page {
        if let Some(credits) = book.credits_text() {
            out.push_str("---\n\n## Credits\n\n");
            for paragraph in split_paragraphs(credits) {
                out.push_str(&escape_block(&paragraph));
                out.push_str("\n\n");
            }
        }
    }

    while out.ends_with("\n\n") {
        out.pop();
    }
    out
}

fn align_line(line: &str, alignment: TextAlignment) -> String {
    let pad = TEXT_COLUMNS.saturating_sub(line.chars().count());
    match alignment {
        TextAlignment::Center => format!("{}{}", " ".repeat(pad / 2), line),
        TextAlignment::Right => format!("{}{}", " ".repeat(pad), line),
        TextAlignment::Left | TextAlignment::Justify => line.to_string(),
    }
}

fn push_wrapped(out: &mut String, text: &str, alignment: TextAlignment) {
    for line in wrap_uniform(text, TEXT_COLUMNS as f32, char_width) {
        out.push_str(&align_line(&line, alignment));
        out.push('\n');
    }
}

fn push_heading(out: &mut String, text: &str, underline: char) {
    for line in wrap_uniform(text, TEXT_COLUMNS as f32, char_width) {
        let width = line.chars().count();
        out.push_str(&line);
        out.push('\n');
        out.push_str(&underline.to_string().repeat(width));
        out.push('\n');
    }
}

/// Renders the book as plain text wrapped to [`TEXT_COLUMNS`].
pub fn to_plain_text(book: &Book, options: &ExportOptions) -> String {
    let chapters = book.ordered_chapters();
    let mut out = String::new();

    push_wrapped(&mut out, &book.display_title().to_uppercase(), TextAlignment::Center);
    if options.cover_page {
        if let Some(author) = book.author_name() {
            push_wrapped(&mut out, &format!("by {}", author), TextAlignment::Center);
        }
        if let Some(cover) = book.cover_text.as_deref() {
            for paragraph in split_paragraphs(cover) {
                out.push('\n');
                push_wrapped(&mut out, &paragraph, TextAlignment::Center);
            }
        }
    }
    out.push('\n');

    push_heading(&mut out, "Contents", '-');
    for (i, chapter) in chapters.iter().enumerate() {
        push_wrapped(
            &mut out,
            &format!("{}. {}", i + 1, collapse(&chapter.title)),
            TextAlignment::Left,
        );
    }

    for (i, chapter) in chapters.iter().enumerate() {
        out.push('\n');
        push_heading(
            &mut out,
            &format!("Chapter {}: {}", i + 1, collapse(&chapter.title)),
            '=',
        );
        for paragraph in chapter.paragraphs() {
            out.push('\n');
            push_wrapped(&mut out, &paragraph, options.alignment);
        }
    }

    if options.credits_page {
        if let Some(credits) = book.credits_text() {
            out.push('\n');
            push_heading(&mut out, "Credits", '-');
            for paragraph in split_paragraphs(credits) {
                out.push('\n');
                push_wrapped(&mut out, &paragraph, options.alignment);
            }
        }
    }
    out
}
