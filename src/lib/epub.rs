//! EPUB export.
//!
//! Like the text formats, EPUB skips the paginator: a reader reflows the text itself. The
//! package carries one XHTML file per chapter in reading order, a navigation document that
//! doubles as the contents page, an NCX table for older readers and a stylesheet built from
//! the resolved style. The cover and credits pages follow the same toggles as every other
//! format.

use std::io::{Cursor, Write};
use std::time::{SystemTime, UNIX_EPOCH};

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::book::{split_paragraphs, Book};
use crate::fonts::css_font_stack;
use crate::options::ExportOptions;
use crate::render::html::escape_html;
use crate::style::ResolvedStyle;
use crate::ExportError;

const MIMETYPE: &[u8] = b"application/epub+zip";

const CONTAINER_XML: &[u8] = br#"<?xml version="1.0" encoding="UTF-8"?>
<container version="1.0" xmlns="urn:oasis:names:tc:opendocument:xmlns:container">
  <rootfiles>
    <rootfile full-path="OEBPS/content.opf" media-type="application/oebps-package+xml"/>
  </rootfiles>
</container>
"#;

/// One XHTML document of the package, in spine order.
#[derive(Debug, Clone, PartialEq)]
struct SpineItem {
    id: String,
    href: String,
    /// Label in the navigation tables; `None` keeps the item out of them.
    label: Option<String>,
    body: String,
}

fn epub_error(e: impl std::fmt::Display) -> ExportError {
    ExportError::render_error(format!("could not write the EPUB package: {}", e))
}

fn collapse(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Stable identifier derived from the title and author (64-bit FNV-1a).
fn book_identifier(book: &Book) -> String {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    let key = format!("{}\u{1f}{}", book.display_title(), book.author_name().unwrap_or(""));
    for byte in key.bytes() {
        hash ^= u64::from(byte);
        hash = hash.wrapping_mul(0x0100_0000_01b3);
    }
    format!("urn:bookpress:{:016x}", hash)
}

/// `YYYY-MM-DDThh:mm:ssZ` for a Unix timestamp.
fn utc_timestamp(secs: u64) -> String {
    let days = (secs / 86_400) as i64;
    let rem = secs % 86_400;
    // Days to civil date, proleptic Gregorian.
    let z = days + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z.rem_euclid(146_097);
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = doy - (153 * mp + 2) / 5 + 1;
    let month = if mp < 10 { mp + 3 } else { mp - 9 };
    let year = yoe + era * 400 + i64::from(month <= 2);
    format!(
        "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}Z",
        year,
        month,
        day,
        rem / 3600,
        rem % 3600 / 60,
        rem % 60
    )
}

fn paragraphs_html(text: &str, class: Option<&str>) -> String {
    split_paragraphs(text)
        .iter()
        .enumerate()
        .map(|(i, p)| {
            let lines = p
                .lines()
                .map(escape_html)
                .collect::<Vec<_>>()
                .join("<br/>");
            match class.filter(|_| i == 0) {
                Some(c) => format!("    <p class=\"{}\">{}</p>\n", c, lines),
                None => format!("    <p>{}</p>\n", lines),
            }
        })
        .collect()
}

fn xhtml_page(title: &str, body: &str, extra_ns: &str) -> String {
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <!DOCTYPE html>\n\
         <html xmlns=\"http://www.w3.org/1999/xhtml\"{ns} xml:lang=\"en\" lang=\"en\">\n\
         <head>\n  <title>{title}</title>\n  <link rel=\"stylesheet\" type=\"text/css\" href=\"style.css\"/>\n</head>\n\
         <body>\n{body}</body>\n</html>\n",
        ns = extra_ns,
        title = escape_html(title),
        body = body
    )
}

fn stylesheet(style: &ResolvedStyle, options: &ExportOptions) -> String {
    let mut css = format!(
        "body {{ font-family: {body}; font-size: {size:.1}pt; line-height: {lh:.2}; \
         color: {fg}; background: {bg}; text-align: {align}; }}\n\
         h1, h2, .cover-title {{ font-family: {heading}; color: {fg}; text-align: center; }}\n\
         .chapter-number {{ text-align: center; color: {accent}; text-transform: uppercase; \
         letter-spacing: 0.1em; }}\n\
         .cover {{ text-align: center; margin-top: 30%; }}\n\
         .cover-author {{ font-style: italic; }}\n\
         .credits {{ text-align: center; }}\n\
         nav ol {{ list-style: none; padding: 0; }}\n",
        body = css_font_stack(&style.body_font),
        heading = css_font_stack(&style.heading_font),
        size = style.font_size,
        lh = style.line_height,
        fg = escape_html(&style.palette.primary),
        bg = escape_html(&style.palette.background),
        accent = escape_html(&style.palette.accent),
        align = options.alignment.as_str(),
    );
    if options.chapter_dividers {
        css.push_str(&format!(
            "hr.divider {{ border: none; border-top: 1px solid {}; width: 30%; margin: 1em auto; }}\n",
            escape_html(&style.palette.accent)
        ));
    }
    if options.drop_caps {
        css.push_str(&format!(
            "p.first::first-letter {{ float: left; font-family: {}; font-size: 3.2em; \
             line-height: 0.9; padding-right: 0.08em; color: {}; }}\n",
            css_font_stack(&style.heading_font),
            escape_html(&style.palette.accent)
        ));
    }
    css
}

fn spine_items(book: &Book, options: &ExportOptions) -> Vec<SpineItem> {
    let title = collapse(book.display_title());
    let mut items = Vec::new();

    if options.cover_page {
        let mut body = format!(
            "  <div class=\"cover\">\n    <h1 class=\"cover-title\">{}</h1>\n",
            escape_html(&title)
        );
        if let Some(author) = book.author_name() {
            body.push_str(&format!(
                "    <p class=\"cover-author\">{}</p>\n",
                escape_html(author)
            ));
        }
        if let Some(cover) = book.cover_text.as_deref() {
            body.push_str(&paragraphs_html(cover, None));
        }
        body.push_str("  </div>\n");
        items.push(SpineItem {
            id: "cover".to_string(),
            href: "cover.xhtml".to_string(),
            label: Some("Cover".to_string()),
            body: xhtml_page(&title, &body, ""),
        });
    }

    let chapters = book.ordered_chapters();
    let mut nav = String::from("  <nav epub:type=\"toc\" id=\"toc\">\n    <h1>Contents</h1>\n    <ol>\n");
    for (i, chapter) in chapters.iter().enumerate() {
        nav.push_str(&format!(
            "      <li><a href=\"chapter_{}.xhtml\">{}</a></li>\n",
            i + 1,
            escape_html(&collapse(&chapter.title))
        ));
    }
    nav.push_str("    </ol>\n  </nav>\n");
    items.push(SpineItem {
        id: "nav".to_string(),
        href: "nav.xhtml".to_string(),
        label: Some("Contents".to_string()),
        body: xhtml_page(
            "Contents",
            &nav,
            " xmlns:epub=\"http://www.idpf.org/2007/ops\"",
        ),
    });

    for (i, chapter) in chapters.iter().enumerate() {
        let number = i + 1;
        let chapter_title = collapse(&chapter.title);
        let mut body = format!(
            "  <p class=\"chapter-number\">Chapter {}</p>\n  <h1>{}</h1>\n",
            number,
            escape_html(&chapter_title)
        );
        if options.chapter_dividers {
            body.push_str("  <hr class=\"divider\"/>\n");
        }
        let first = options.drop_caps.then_some("first");
        body.push_str(&paragraphs_html(&chapter.content, first));
        items.push(SpineItem {
            id: format!("chapter_{}", number),
            href: format!("chapter_{}.xhtml", number),
            label: Some(format!("Chapter {}: {}", number, chapter_title)),
            body: xhtml_page(&chapter_title, &body, ""),
        });
    }

    if options.credits_page {
        if let Some(credits) = book.credits_text() {
            let mut body = String::from("  <div class=\"credits\">\n    <h2>Credits</h2>\n");
            body.push_str(&paragraphs_html(credits, None));
            body.push_str("  </div>\n");
            items.push(SpineItem {
                id: "credits".to_string(),
                href: "credits.xhtml".to_string(),
                label: Some("Credits".to_string()),
                body: xhtml_page("Credits", &body, ""),
            });
        }
    }

    items
}

fn content_opf(book: &Book, identifier: &str, modified: &str, items: &[SpineItem]) -> String {
    let mut opf = String::from(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <package xmlns=\"http://www.idpf.org/2007/opf\" version=\"3.0\" unique-identifier=\"BookId\">\n\
         \x20 <metadata xmlns:dc=\"http://purl.org/dc/elements/1.1/\">\n",
    );
    opf.push_str(&format!(
        "    <dc:identifier id=\"BookId\">{}</dc:identifier>\n",
        escape_html(identifier)
    ));
    opf.push_str(&format!(
        "    <dc:title>{}</dc:title>\n",
        escape_html(&collapse(book.display_title()))
    ));
    if let Some(author) = book.author_name() {
        opf.push_str(&format!("    <dc:creator>{}</dc:creator>\n", escape_html(author)));
    }
    if let Some(description) = book.description.as_deref().filter(|d| !d.trim().is_empty()) {
        opf.push_str(&format!(
            "    <dc:description>{}</dc:description>\n",
            escape_html(description.trim())
        ));
    }
    opf.push_str("    <dc:language>en</dc:language>\n");
    opf.push_str(&format!(
        "    <meta property=\"dcterms:modified\">{}</meta>\n  </metadata>\n  <manifest>\n",
        modified
    ));
    opf.push_str(
        "    <item id=\"ncx\" href=\"toc.ncx\" media-type=\"application/x-dtbncx+xml\"/>\n\
         \x20   <item id=\"css\" href=\"style.css\" media-type=\"text/css\"/>\n",
    );
    for item in items {
        let properties = if item.id == "nav" {
            " properties=\"nav\""
        } else {
            ""
        };
        opf.push_str(&format!(
            "    <item id=\"{}\" href=\"{}\" media-type=\"application/xhtml+xml\"{}/>\n",
            item.id, item.href, properties
        ));
    }
    opf.push_str("  </manifest>\n  <spine toc=\"ncx\">\n");
    for item in items {
        opf.push_str(&format!("    <itemref idref=\"{}\"/>\n", item.id));
    }
    opf.push_str("  </spine>\n</package>\n");
    opf
}

fn toc_ncx(book: &Book, identifier: &str, items: &[SpineItem]) -> String {
    let mut ncx = format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <ncx xmlns=\"http://www.daisy.org/z3986/2005/ncx/\" version=\"2005-1\">\n\
         \x20 <head>\n    <meta name=\"dtb:uid\" content=\"{}\"/>\n    <meta name=\"dtb:depth\" content=\"1\"/>\n  </head>\n\
         \x20 <docTitle><text>{}</text></docTitle>\n  <navMap>\n",
        escape_html(identifier),
        escape_html(&collapse(book.display_title()))
    );
    for (play_order, item) in items.iter().filter(|i| i.label.is_some()).enumerate() {
        ncx.push_str(&format!(
            "    <navPoint id=\"nav_{id}\" playOrder=\"{order}\">\n      <navLabel><text>{label}</text></navLabel>\n      <content src=\"{href}\"/>\n    </navPoint>\n",
            id = item.id,
            order = play_order + 1,
            label = escape_html(item.label.as_deref().unwrap_or_default()),
            href = item.href
        ));
    }
    ncx.push_str("  </navMap>\n</ncx>\n");
    ncx
}

/// Packages `book` as an EPUB 3 file.
///
/// The `mimetype` entry comes first and is stored uncompressed; every other entry is
/// deflated. Only `dcterms:modified` depends on the clock.
pub fn to_epub(
    book: &Book,
    options: &ExportOptions,
    style: &ResolvedStyle,
) -> Result<Vec<u8>, ExportError> {
    let modified = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    package(book, options, style, &utc_timestamp(modified))
}

fn package(
    book: &Book,
    options: &ExportOptions,
    style: &ResolvedStyle,
    modified: &str,
) -> Result<Vec<u8>, ExportError> {
    let identifier = book_identifier(book);
    let items = spine_items(book, options);

    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let stored = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
    let deflated = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .compression_level(Some(6));

    zip.start_file("mimetype", stored).map_err(epub_error)?;
    zip.write_all(MIMETYPE).map_err(epub_error)?;

    zip.start_file("META-INF/container.xml", deflated)
        .map_err(epub_error)?;
    zip.write_all(CONTAINER_XML).map_err(epub_error)?;

    zip.start_file("OEBPS/content.opf", deflated)
        .map_err(epub_error)?;
    zip.write_all(content_opf(book, &identifier, modified, &items).as_bytes())
        .map_err(epub_error)?;

    zip.start_file("OEBPS/toc.ncx", deflated).map_err(epub_error)?;
    zip.write_all(toc_ncx(book, &identifier, &items).as_bytes())
        .map_err(epub_error)?;

    zip.start_file("OEBPS/style.css", deflated)
        .map_err(epub_error)?;
    zip.write_all(stylesheet(style, options).as_bytes())
        .map_err(epub_error)?;

    for item in &items {
        zip.start_file(format!("OEBPS/{}", item.href), deflated)
            .map_err(epub_error)?;
        zip.write_all(item.body.as_bytes()).map_err(epub_error)?;
    }

    let cursor = zip.finish().map_err(epub_error)?;
    Ok(cursor.into_inner())
}
