//! Tests for TOML configuration parsing through the public API.
//!
//! Numeric settings may be written as integers or floats, files are read from disk, and a
//! parsed configuration drives a real export.

#[cfg(test)]
mod config_parsing_tests {
    use bookpress::config::{self, ConfigSource};
    use bookpress::options::{ColorScheme, MarginPreset, PageSize};
    use bookpress::style::resolve_style;
    use bookpress::{export_book, Book, Chapter, ExportFormat};
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_font_size_as_integer_or_float() {
        let integer = config::parse_config_string("[text]\nsize = 14\n");
        assert_eq!(integer.options.font_size, 14.0);

        let float = config::parse_config_string("[text]\nsize = 10.5\n");
        assert_eq!(float.options.font_size, 10.5);
    }

    #[test]
    fn test_out_of_range_font_size_is_clamped_at_use() {
        let parsed = config::parse_config_string("[text]\nsize = 200\n");
        assert_eq!(parsed.options.effective_font_size(), 36.0);
        let style = resolve_style(None, &parsed.options, None);
        assert_eq!(style.font_size, 36.0);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bookpressrc.toml");
        fs::write(
            &path,
            r#"
[page]
size = "6x9"
margins = "wide"

[color]
scheme = "forest"
"#,
        )
        .unwrap();

        let parsed = config::load_config_from_source(ConfigSource::File(path.to_str().unwrap()));
        assert_eq!(parsed.options.page_size, PageSize::Trade6x9);
        assert_eq!(parsed.options.margins, Some(MarginPreset::Wide));
        assert_eq!(
            parsed.options.color_scheme,
            ColorScheme::Named("forest".to_string())
        );

        let style = resolve_style(Some("romance"), &parsed.options, None);
        assert_eq!(style.palette.accent, "#2e7d32");
        assert!((style.margin_mm - 38.1).abs() < 1e-4);
    }

    #[test]
    fn test_default_configuration_drives_export() {
        let parsed = config::parse_config_string(&config::default_config_toml());
        let mut book = Book::new("Configured");
        book.chapters.push(Chapter::new("Only", "Text.", 1));
        let document =
            export_book(&book, &parsed.options, ExportFormat::Pdf, None, Some(&parsed.fonts))
                .unwrap();
        assert!(document.bytes.starts_with(b"%PDF"));
    }
}
