use bookpress::{export_book, Book, Chapter, ExportFormat, ExportOptions};
use std::io::{Cursor, Read};
use zip::{CompressionMethod, ZipArchive};

fn sample_book() -> Book {
    let mut book = Book::new("Winter Orchard");
    book.author = Some("L. Frost".to_string());
    book.category = Some("poetry".to_string());
    book.cover_text = Some("Poems from the cold months.".to_string());
    book.credits = Some("Thanks to the orchard.".to_string());
    book.chapters
        .push(Chapter::new("Snow", "White on white.\n\nThe branches bow.", 2));
    book.chapters
        .push(Chapter::new("Thaw", "Water finds the roots.", 1));
    book.chapters.push(Chapter::new("Blossom", "Pink again.", 3));
    book
}

fn export(book: &Book, options: &ExportOptions) -> ZipArchive<Cursor<Vec<u8>>> {
    let document = export_book(book, options, ExportFormat::Epub, None, None).unwrap();
    assert_eq!(document.mime_type(), "application/epub+zip");
    ZipArchive::new(Cursor::new(document.bytes)).unwrap()
}

fn read_entry(archive: &mut ZipArchive<Cursor<Vec<u8>>>, name: &str) -> String {
    let mut text = String::new();
    archive
        .by_name(name)
        .unwrap()
        .read_to_string(&mut text)
        .unwrap();
    text
}

fn spine_order(opf: &str) -> Vec<String> {
    let spine = &opf[opf.find("<spine").unwrap()..];
    spine
        .split("idref=\"")
        .skip(1)
        .map(|rest| rest[..rest.find('"').unwrap()].to_string())
        .collect()
}

#[test]
fn test_epub_mimetype_is_first_and_stored() {
    let mut archive = export(&sample_book(), &ExportOptions::default());
    let mut first = archive.by_index(0).unwrap();
    assert_eq!(first.name(), "mimetype");
    assert_eq!(first.compression(), CompressionMethod::Stored);
    let mut text = String::new();
    first.read_to_string(&mut text).unwrap();
    assert_eq!(text, "application/epub+zip");
}

#[test]
fn test_epub_spine_follows_chapter_order() {
    let mut archive = export(&sample_book(), &ExportOptions::default());
    let opf = read_entry(&mut archive, "OEBPS/content.opf");
    assert_eq!(
        spine_order(&opf),
        vec!["cover", "nav", "chapter_1", "chapter_2", "chapter_3", "credits"]
    );
    assert!(opf.contains("<dc:title>Winter Orchard</dc:title>"));
    assert!(opf.contains("<dc:creator>L. Frost</dc:creator>"));

    let titles: Vec<String> = (1..=3)
        .map(|i| read_entry(&mut archive, &format!("OEBPS/chapter_{}.xhtml", i)))
        .collect();
    assert!(titles[0].contains("<h1>Thaw</h1>"));
    assert!(titles[1].contains("<h1>Snow</h1>"));
    assert!(titles[1].contains("<p>The branches bow.</p>"));
    assert!(titles[2].contains("<h1>Blossom</h1>"));

    let nav = read_entry(&mut archive, "OEBPS/nav.xhtml");
    let thaw = nav.find("Thaw").unwrap();
    let snow = nav.find("Snow").unwrap();
    let blossom = nav.find("Blossom").unwrap();
    assert!(thaw < snow && snow < blossom);

    let ncx = read_entry(&mut archive, "OEBPS/toc.ncx");
    assert!(ncx.contains("<text>Chapter 2: Snow</text>"));
    assert!(read_entry(&mut archive, "META-INF/container.xml").contains("OEBPS/content.opf"));
}

#[test]
fn test_epub_cover_and_credits_follow_toggles() {
    let options = ExportOptions {
        cover_page: false,
        credits_page: false,
        ..ExportOptions::default()
    };
    let mut archive = export(&sample_book(), &options);
    let opf = read_entry(&mut archive, "OEBPS/content.opf");
    assert_eq!(
        spine_order(&opf),
        vec!["nav", "chapter_1", "chapter_2", "chapter_3"]
    );
    assert!(archive.by_name("OEBPS/cover.xhtml").is_err());
    assert!(archive.by_name("OEBPS/credits.xhtml").is_err());

    let mut no_credits = sample_book();
    no_credits.credits = Some("   ".to_string());
    let mut archive = export(&no_credits, &ExportOptions::default());
    assert!(archive.by_name("OEBPS/cover.xhtml").is_ok());
    assert!(archive.by_name("OEBPS/credits.xhtml").is_err());
}

#[test]
fn test_epub_stylesheet_uses_resolved_palette() {
    let options = ExportOptions {
        color_scheme: bookpress::options::ColorScheme::Custom,
        custom_colors: Some([
            "#1b1b1b".to_string(),
            "#fbf7ee".to_string(),
            "#7a2e0e".to_string(),
        ]),
        ..ExportOptions::default()
    };
    let mut archive = export(&sample_book(), &options);
    let css = read_entry(&mut archive, "OEBPS/style.css");
    assert!(css.contains("background: #fbf7ee"));
    assert!(css.contains("color: #7a2e0e"));
}
