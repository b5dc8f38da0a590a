use bookpress::layout::{page_count, paginate, DrawOperation, TextRole};
use bookpress::options::{ColorScheme, LineSpacing};
use bookpress::style::{known_categories, line_height_mm, resolve_style, Motif};
use bookpress::{Book, Chapter, ExportOptions};

fn plain_options() -> ExportOptions {
    ExportOptions {
        decorative_elements: false,
        ..ExportOptions::default()
    }
}

fn is_hex_color(s: &str) -> bool {
    s.len() == 7 && s.starts_with('#') && s[1..].chars().all(|c| c.is_ascii_hexdigit())
}

fn texts_with_role(ops: &[DrawOperation], role: TextRole) -> Vec<&DrawOperation> {
    ops.iter().filter(|op| op.role() == Some(role)).collect()
}

#[test]
fn test_every_known_category_resolves_completely() {
    let options = ExportOptions {
        color_scheme: ColorScheme::Default,
        ..ExportOptions::default()
    };
    for category in known_categories() {
        let style = resolve_style(Some(category), &options, None);
        assert!(is_hex_color(&style.palette.primary), "{}", category);
        assert!(is_hex_color(&style.palette.background), "{}", category);
        assert!(is_hex_color(&style.palette.accent), "{}", category);
        assert!(!style.body_font.trim().is_empty(), "{}", category);
        assert!(!style.heading_font.trim().is_empty(), "{}", category);
        assert!(style.margin_mm > 0.0 && style.line_height > 0.0);
        assert!(
            style.decorations.header != Motif::None || style.decorations.footer != Motif::None,
            "{} has no header or footer motif",
            category
        );
        assert!(style.decorations.divider.width_ratio > 0.0);
        assert!(style.decorations.drop_cap.scale > 1.0);
    }
}

#[test]
fn test_book_without_chapters() {
    let mut book = Book::new("Empty Shelf");
    book.credits = Some("Nobody yet.".to_string());
    let options = ExportOptions::default();
    let style = resolve_style(None, &options, None);
    let ops = paginate(&book, &style, &options);

    assert!(!ops.is_empty());
    assert_eq!(texts_with_role(&ops, TextRole::Title).len(), 1);
    assert_eq!(texts_with_role(&ops, TextRole::TocHeading).len(), 1);
    assert!(texts_with_role(&ops, TextRole::TocEntry).is_empty());
    assert!(texts_with_role(&ops, TextRole::ChapterLabel).is_empty());
    // cover, contents, credits
    assert_eq!(page_count(&ops), 3);

    let no_cover = ExportOptions {
        cover_page: false,
        credits_page: false,
        ..ExportOptions::default()
    };
    let ops = paginate(&book, &style, &no_cover);
    assert!(texts_with_role(&ops, TextRole::Title).is_empty());
    assert_eq!(page_count(&ops), 1);
}

#[test]
fn test_pagination_is_idempotent_with_texture() {
    let mut book = Book::new("Twice");
    book.category = Some("fantasy".to_string());
    for i in 0..4 {
        book.chapters.push(Chapter::new(
            format!("Part {}", i + 1),
            "The dragon slept. ".repeat(80),
            i,
        ));
    }
    let options = ExportOptions {
        paper_texture: true,
        header_footer: true,
        drop_caps: true,
        ..ExportOptions::default()
    };
    let style = resolve_style(book.category.as_deref(), &options, None);
    let first = paginate(&book, &style, &options);
    let second = paginate(&book, &style, &options);
    assert_eq!(first, second);
    assert!(first.iter().any(|op| matches!(op, DrawOperation::Circle { .. })));
}

#[test]
fn test_line_height_for_normal_spacing() {
    let options = ExportOptions {
        font_size: 12.0,
        line_spacing: Some(LineSpacing::Normal),
        ..ExportOptions::default()
    };
    let style = resolve_style(None, &options, None);
    assert!((style.line_height_mm() - 4.868).abs() < 0.001);
    assert!((line_height_mm(12.0, 1.15) - 4.868).abs() < 0.001);
}

#[test]
fn test_drop_cap_on_first_paragraph() {
    let mut book = Book::new("Greeting");
    book.chapters
        .push(Chapter::new("Opening", "Hello world, this is a test.", 1));
    let options = ExportOptions {
        drop_caps: true,
        ..plain_options()
    };
    let style = resolve_style(None, &options, None);
    let ops = paginate(&book, &style, &options);

    let caps = texts_with_role(&ops, TextRole::DropCap);
    assert_eq!(caps.len(), 1);
    let (cap_left, cap_width) = match caps[0] {
        DrawOperation::Text {
            x,
            content,
            font_size,
            width,
            ..
        } => {
            assert_eq!(content, "H");
            assert!((font_size - 36.0).abs() < 1e-4);
            (*x, *width)
        }
        _ => unreachable!(),
    };

    let body = texts_with_role(&ops, TextRole::Body);
    assert_eq!(body.len(), 1);
    assert_eq!(body[0].text(), Some("ello world, this is a test."));
    let body_left = body[0].text_left().unwrap();
    assert!(body_left >= cap_left + cap_width);
}

#[test]
fn test_drop_cap_narrows_three_lines() {
    let mut book = Book::new("Narrow");
    book.chapters
        .push(Chapter::new("Long", "Wide margins make narrow lines. ".repeat(20), 1));
    let options = ExportOptions {
        drop_caps: true,
        ..plain_options()
    };
    let style = resolve_style(None, &options, None);
    let ops = paginate(&book, &style, &options);

    let lefts: Vec<f32> = texts_with_role(&ops, TextRole::Body)
        .iter()
        .filter_map(|op| op.text_left())
        .collect();
    assert!(lefts.len() > 4);
    assert!(lefts[..3].iter().all(|l| *l > lefts[3]));
    assert!(lefts[3..].iter().all(|l| (*l - lefts[3]).abs() < 1e-4));
}

#[test]
fn test_page_break_moves_overflow_to_next_page() {
    let mut book = Book::new("Overflow");
    book.chapters.push(Chapter::new(
        "Flood",
        "The water kept rising over every wall we built. ".repeat(120),
        1,
    ));
    let options = plain_options();
    let style = resolve_style(None, &options, None);
    let ops = paginate(&book, &style, &options);

    let body_pages: Vec<usize> = texts_with_role(&ops, TextRole::Body)
        .iter()
        .filter_map(|op| op.page())
        .collect();
    let first = body_pages[0];
    assert!(body_pages.contains(&(first + 1)), "paragraph never overflowed");

    // Every break advances the next text operation by exactly one page.
    let mut last_page = None;
    let mut after_break = false;
    for op in &ops {
        match op {
            DrawOperation::PageBreak => after_break = true,
            DrawOperation::Text { page, .. } => {
                if after_break {
                    if let Some(previous) = last_page {
                        assert_eq!(*page, previous + 1);
                    }
                    after_break = false;
                }
                last_page = Some(*page);
            }
            _ => {}
        }
    }

    // No body line crosses the bottom margin.
    let (_, height) = options.page_dimensions_mm();
    let bottom = height - style.margin_mm;
    for op in texts_with_role(&ops, TextRole::Body) {
        if let DrawOperation::Text { y, .. } = op {
            assert!(*y <= bottom);
        }
    }
}

#[test]
fn test_divider_variants_cycle() {
    let mut book = Book::new("Dividers");
    for i in 0..4 {
        book.chapters
            .push(Chapter::new(format!("Ch {}", i), "Short.", i as i64));
    }
    let options = plain_options();
    let style = resolve_style(None, &options, None);
    let ops = paginate(&book, &style, &options);

    let chapter_pages: Vec<usize> = texts_with_role(&ops, TextRole::ChapterLabel)
        .iter()
        .filter_map(|op| op.page())
        .collect();
    assert_eq!(chapter_pages.len(), 4);

    let shapes: Vec<(usize, usize)> = chapter_pages
        .iter()
        .map(|page| {
            let on_page = ops.iter().filter(|op| op.page() == Some(*page));
            let (mut lines, mut circles) = (0, 0);
            for op in on_page {
                match op {
                    DrawOperation::Line { .. } => lines += 1,
                    DrawOperation::Circle { .. } => circles += 1,
                    _ => {}
                }
            }
            (lines, circles)
        })
        .collect();
    // plain line, line-circle-line, triple dash, plain line
    assert_eq!(shapes, vec![(1, 0), (2, 1), (3, 0), (1, 0)]);
}

#[test]
fn test_chapters_follow_order_field() {
    let mut book = Book::new("Shuffled");
    book.chapters.push(Chapter::new("Third", "c", 3));
    book.chapters.push(Chapter::new("First", "a", 1));
    book.chapters.push(Chapter::new("Second", "b", 2));
    let options = plain_options();
    let style = resolve_style(None, &options, None);
    let ops = paginate(&book, &style, &options);

    let titles: Vec<&str> = texts_with_role(&ops, TextRole::ChapterTitle)
        .iter()
        .filter_map(|op| op.text())
        .collect();
    assert_eq!(titles, vec!["First", "Second", "Third"]);
}
