//! Configuration loading for export options.
//!
//! A configuration file is a TOML document that pre-fills the export dialog: page geometry,
//! typography, feature toggles, color scheme, texture seed, font lookup and the optional
//! style-enrichment endpoint. Parsing is lenient: invalid TOML yields the defaults, and a
//! value with the wrong type or an unknown keyword is ignored field by field.
//!
//! # Configuration Structure
//!
//! - `[page]` controls `size` (a4, a5, letter, legal, 6x9, 5x8), `orientation` and `margins`
//!   (narrow, normal, wide, mirrored)
//! - `[text]` sets `fontfamily`, `size` (points), `alignment` and `linespacing`
//!   (single, normal, double, relaxed)
//! - `[features]` holds the boolean toggles (`page_numbers`, `header_footer`, `cover_page`,
//!   `credits_page`, `decorative_elements`, `chapter_dividers`, `drop_caps`, `paper_texture`)
//! - `[color]` picks a `scheme` and, for `scheme = "custom"`, three `custom` hex colors
//! - `[texture]` sets the `seed` for the paper texture
//! - `[fonts]` lists extra font `paths` and toggles `embed_system_fonts`
//! - `[enrichment]` points at a style suggestion service (`url`, `timeout_ms`)
//!
//! # Configuration Example
//!
//! ```toml
//! [page]
//! size = "6x9"
//! margins = "mirrored"
//!
//! [text]
//! fontfamily = "Georgia"
//! size = 11
//! alignment = "justify"
//!
//! [features]
//! drop_caps = true
//!
//! [color]
//! scheme = "custom"
//! custom = ["#2c3e50", "#fdfbf7", "#c0392b"]
//! ```
//!
//! Fields left out (or commented out) keep their defaults. `fontfamily`, `margins` and
//! `linespacing` default to "unset", which lets the style resolver pick them from the
//! enrichment suggestion or the book category.

use crate::enrichment::EnrichmentConfig;
use crate::fonts::FontConfig;
use crate::options::{
    ColorScheme, ExportOptions, LineSpacing, MarginPreset, Orientation, PageSize, TextAlignment,
};
use log::{debug, warn};
use std::fs;
use std::path::{Path, PathBuf};
use toml::Value;

/// File name picked up from the working directory when no configuration is given.
pub const DEFAULT_CONFIG_FILE: &str = "bookpressrc.toml";

/// Configuration source for export settings.
/// Determines where the TOML configuration should be loaded from.
#[derive(Debug, Clone)]
pub enum ConfigSource<'a> {
    /// Use the built-in defaults
    Default,
    /// Load configuration from a file path
    File(&'a str),
    /// Use a TOML string held in memory (for example via `include_str!`)
    Embedded(&'a str),
}

/// Everything a configuration file can set.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BookpressConfig {
    pub options: ExportOptions,
    pub fonts: FontConfig,
    pub enrichment: EnrichmentConfig,
}

fn get_str<'v>(section: Option<&'v Value>, key: &str) -> Option<&'v str> {
    section.and_then(|s| s.get(key)).and_then(|v| v.as_str())
}

fn get_bool(section: Option<&Value>, key: &str) -> Option<bool> {
    section.and_then(|s| s.get(key)).and_then(|v| v.as_bool())
}

/// Reads a number that may be written as an integer or a float.
fn get_number(section: Option<&Value>, key: &str) -> Option<f64> {
    let v = section.and_then(|s| s.get(key))?;
    v.as_float().or_else(|| v.as_integer().map(|i| i as f64))
}

/// Parses a keyword with `parse`, logging and ignoring unknown values.
fn parse_keyword<T>(section: Option<&Value>, key: &str, parse: fn(&str) -> Option<T>) -> Option<T> {
    let raw = get_str(section, key)?;
    let parsed = parse(raw);
    if parsed.is_none() {
        warn!("Ignoring unknown {} value '{}' in configuration", key, raw);
    }
    parsed
}

fn parse_page(section: Option<&Value>, options: &mut ExportOptions) {
    if let Some(size) = parse_keyword(section, "size", PageSize::parse) {
        options.page_size = size;
    }
    if let Some(orientation) = parse_keyword(section, "orientation", Orientation::parse) {
        options.orientation = orientation;
    }
    if let Some(margins) = parse_keyword(section, "margins", MarginPreset::parse) {
        options.margins = Some(margins);
    }
}

fn parse_text(section: Option<&Value>, options: &mut ExportOptions) {
    if let Some(family) = get_str(section, "fontfamily") {
        let family = family.trim();
        if !family.is_empty() {
            options.font_family = Some(family.to_string());
        }
    }
    if let Some(size) = get_number(section, "size") {
        options.font_size = size as f32;
    }
    if let Some(alignment) = parse_keyword(section, "alignment", TextAlignment::parse) {
        options.alignment = alignment;
    }
    if let Some(spacing) = parse_keyword(section, "linespacing", LineSpacing::parse) {
        options.line_spacing = Some(spacing);
    }
}

fn parse_features(section: Option<&Value>, options: &mut ExportOptions) {
    let toggles: [(&str, &mut bool); 8] = [
        ("page_numbers", &mut options.show_page_numbers),
        ("header_footer", &mut options.header_footer),
        ("cover_page", &mut options.cover_page),
        ("credits_page", &mut options.credits_page),
        ("decorative_elements", &mut options.decorative_elements),
        ("chapter_dividers", &mut options.chapter_dividers),
        ("drop_caps", &mut options.drop_caps),
        ("paper_texture", &mut options.paper_texture),
    ];
    for (key, slot) in toggles {
        if let Some(value) = get_bool(section, key) {
            *slot = value;
        }
    }
}

fn parse_color(section: Option<&Value>, options: &mut ExportOptions) {
    if let Some(scheme) = get_str(section, "scheme") {
        options.color_scheme = ColorScheme::parse(scheme);
    }
    let custom = section
        .and_then(|s| s.get("custom"))
        .and_then(|v| v.as_array());
    if let Some(values) = custom {
        let colors: Vec<String> = values
            .iter()
            .filter_map(|v| v.as_str())
            .map(|s| s.trim().to_string())
            .collect();
        match <[String; 3]>::try_from(colors) {
            Ok(colors) => options.custom_colors = Some(colors),
            Err(colors) => warn!(
                "Ignoring [color].custom: expected 3 colors, found {}",
                colors.len()
            ),
        }
    }
}

fn parse_texture(section: Option<&Value>, options: &mut ExportOptions) {
    let seed = section.and_then(|s| s.get("seed")).and_then(|v| v.as_integer());
    if let Some(seed) = seed {
        if seed >= 0 {
            options.texture_seed = seed as u64;
        } else {
            warn!("Ignoring negative texture seed {}", seed);
        }
    }
}

fn parse_fonts(section: Option<&Value>) -> FontConfig {
    let mut fonts = FontConfig::default();
    if let Some(paths) = section.and_then(|s| s.get("paths")).and_then(|v| v.as_array()) {
        fonts.custom_paths = paths
            .iter()
            .filter_map(|v| v.as_str())
            .map(PathBuf::from)
            .collect();
    }
    if let Some(embed) = get_bool(section, "embed_system_fonts") {
        fonts.embed_system_fonts = embed;
    }
    fonts
}

fn parse_enrichment(section: Option<&Value>) -> EnrichmentConfig {
    let mut enrichment = EnrichmentConfig::default();
    if let Some(url) = get_str(section, "url") {
        let url = url.trim();
        if !url.is_empty() {
            enrichment.url = Some(url.to_string());
        }
    }
    let timeout = section
        .and_then(|s| s.get("timeout_ms"))
        .and_then(|v| v.as_integer());
    if let Some(ms) = timeout {
        if ms > 0 {
            enrichment.timeout_ms = ms as u64;
        }
    }
    enrichment
}

/// Parses a TOML configuration string.
///
/// Invalid TOML returns [`BookpressConfig::default`]. Within a valid document, each field
/// is read on its own, so one bad value does not discard the rest.
///
/// # Example
/// ```rust
/// use bookpress::config::parse_config_string;
/// use bookpress::options::{PageSize, TextAlignment};
///
/// let config = parse_config_string(r#"
/// [page]
/// size = "a4"
///
/// [text]
/// alignment = "justify"
/// "#);
/// assert_eq!(config.options.page_size, PageSize::A4);
/// assert_eq!(config.options.alignment, TextAlignment::Justify);
/// ```
pub fn parse_config_string(config_str: &str) -> BookpressConfig {
    let config: Value = match toml::from_str(config_str) {
        Ok(v) => v,
        Err(e) => {
            warn!("Invalid configuration TOML, using defaults: {}", e);
            return BookpressConfig::default();
        }
    };

    let mut options = ExportOptions::default();
    parse_page(config.get("page"), &mut options);
    parse_text(config.get("text"), &mut options);
    parse_features(config.get("features"), &mut options);
    parse_color(config.get("color"), &mut options);
    parse_texture(config.get("texture"), &mut options);

    BookpressConfig {
        options,
        fonts: parse_fonts(config.get("fonts")),
        enrichment: parse_enrichment(config.get("enrichment")),
    }
}

/// Loads configuration from the given source.
///
/// A file that cannot be read falls back to the defaults, like invalid TOML does.
///
/// # Examples
/// ```rust
/// use bookpress::config::{load_config_from_source, ConfigSource};
///
/// let config = load_config_from_source(ConfigSource::Default);
/// assert!(config.options.cover_page);
///
/// let config = load_config_from_source(ConfigSource::Embedded("[features]\ndrop_caps = true"));
/// assert!(config.options.drop_caps);
/// ```
pub fn load_config_from_source(source: ConfigSource) -> BookpressConfig {
    match source {
        ConfigSource::Default => BookpressConfig::default(),
        ConfigSource::File(path) => match fs::read_to_string(Path::new(path)) {
            Ok(s) => {
                debug!("Loaded configuration from {}", path);
                parse_config_string(&s)
            }
            Err(e) => {
                warn!("Could not read configuration {}: {}", path, e);
                BookpressConfig::default()
            }
        },
        ConfigSource::Embedded(content) => parse_config_string(content),
    }
}

/// Looks for a configuration file when none was named explicitly.
///
/// Checks `bookpressrc.toml` in the working directory first, then
/// `<user config dir>/bookpress/bookpressrc.toml`.
pub fn discover_config_file() -> Option<PathBuf> {
    let local = PathBuf::from(DEFAULT_CONFIG_FILE);
    if local.is_file() {
        return Some(local);
    }
    dirs::config_dir()
        .map(|dir| dir.join("bookpress").join(DEFAULT_CONFIG_FILE))
        .filter(|p| p.is_file())
}

/// Returns a commented configuration file describing the defaults.
///
/// Parsing the returned text yields [`BookpressConfig::default`]. Settings that default
/// to "unset" are present but commented out.
pub fn default_config_toml() -> String {
    let d = ExportOptions::default();
    let fonts = FontConfig::default();
    let enrichment = EnrichmentConfig::default();
    let mut out = String::new();

    out.push_str("# bookpress configuration\n");
    out.push_str("# Save as bookpressrc.toml next to your book or pass it with --config.\n\n");

    out.push_str("[page]\n");
    out.push_str("# a4, a5, letter, legal, 6x9, 5x8\n");
    out.push_str(&format!("size = \"{}\"\n", d.page_size.as_str()));
    out.push_str("# portrait or landscape\n");
    out.push_str(&format!("orientation = \"{}\"\n", d.orientation.as_str()));
    out.push_str("# narrow, normal, wide, mirrored (unset: chosen from the book category)\n");
    out.push_str("# margins = \"normal\"\n\n");

    out.push_str("[text]\n");
    out.push_str("# Body font family (unset: chosen from the book category)\n");
    out.push_str("# fontfamily = \"Georgia\"\n");
    out.push_str("# Body size in points, clamped to 6..36\n");
    out.push_str(&format!("size = {}\n", d.font_size));
    out.push_str("# left, center, right, justify\n");
    out.push_str(&format!("alignment = \"{}\"\n", d.alignment.as_str()));
    out.push_str("# single, normal, double, relaxed (unset: chosen from the book category)\n");
    out.push_str("# linespacing = \"normal\"\n\n");

    out.push_str("[features]\n");
    out.push_str(&format!("page_numbers = {}\n", d.show_page_numbers));
    out.push_str(&format!("header_footer = {}\n", d.header_footer));
    out.push_str(&format!("cover_page = {}\n", d.cover_page));
    out.push_str(&format!("credits_page = {}\n", d.credits_page));
    out.push_str(&format!("decorative_elements = {}\n", d.decorative_elements));
    out.push_str(&format!("chapter_dividers = {}\n", d.chapter_dividers));
    out.push_str(&format!("drop_caps = {}\n", d.drop_caps));
    out.push_str(&format!("paper_texture = {}\n\n", d.paper_texture));

    out.push_str("[color]\n");
    out.push_str("# default, custom, or a palette name (see --list-schemes)\n");
    out.push_str(&format!("scheme = \"{}\"\n", d.color_scheme.as_str()));
    out.push_str("# Primary, background and accent colors used with scheme = \"custom\"\n");
    out.push_str("# custom = [\"#2c3e50\", \"#ffffff\", \"#c0392b\"]\n\n");

    out.push_str("[texture]\n");
    out.push_str(&format!("seed = {}\n\n", d.texture_seed));

    out.push_str("[fonts]\n");
    out.push_str("# Extra font files or directories searched before system fonts\n");
    out.push_str("paths = []\n");
    out.push_str("# Embed matching system fonts instead of the PDF base fonts\n");
    out.push_str(&format!(
        "embed_system_fonts = {}\n\n",
        fonts.embed_system_fonts
    ));

    out.push_str("[enrichment]\n");
    out.push_str("# Style suggestion endpoint; exports use category defaults when unset or unreachable\n");
    out.push_str("# url = \"http://localhost:8080/style\"\n");
    out.push_str(&format!("timeout_ms = {}\n", enrichment.timeout_ms));

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config_string() {
        let config_str = r#"
            [page]
            size = "letter"
            orientation = "landscape"
            margins = "mirrored"

            [text]
            fontfamily = "Georgia"
            size = 11
            alignment = "justify"
            linespacing = "relaxed"

            [features]
            drop_caps = true
            cover_page = false

            [color]
            scheme = "Ocean"

            [texture]
            seed = 42
        "#;

        let config = parse_config_string(config_str);
        let o = &config.options;
        assert_eq!(o.page_size, PageSize::Letter);
        assert_eq!(o.orientation, Orientation::Landscape);
        assert_eq!(o.margins, Some(MarginPreset::Mirrored));
        assert_eq!(o.font_family.as_deref(), Some("Georgia"));
        assert_eq!(o.font_size, 11.0);
        assert_eq!(o.alignment, TextAlignment::Justify);
        assert_eq!(o.line_spacing, Some(LineSpacing::Relaxed));
        assert!(o.drop_caps);
        assert!(!o.cover_page);
        // untouched toggles keep their defaults
        assert!(o.credits_page);
        assert_eq!(o.color_scheme, ColorScheme::Named("ocean".to_string()));
        assert_eq!(o.texture_seed, 42);
    }

    #[test]
    fn test_parse_config_string_invalid_toml() {
        let config = parse_config_string("this is not valid toml {{{");
        assert_eq!(config, BookpressConfig::default());
    }

    #[test]
    fn test_wrong_types_fall_back_per_field() {
        let config = parse_config_string(
            r#"
            [page]
            size = 5
            orientation = "sideways"

            [text]
            size = "large"
            alignment = "right"

            [features]
            drop_caps = "yes"
            header_footer = true

            [texture]
            seed = -3
            "#,
        );
        let d = ExportOptions::default();
        assert_eq!(config.options.page_size, d.page_size);
        assert_eq!(config.options.orientation, d.orientation);
        assert_eq!(config.options.font_size, d.font_size);
        assert_eq!(config.options.alignment, TextAlignment::Right);
        assert_eq!(config.options.drop_caps, d.drop_caps);
        assert!(config.options.header_footer);
        assert_eq!(config.options.texture_seed, d.texture_seed);
    }

    #[test]
    fn test_custom_colors_need_three_entries() {
        let config = parse_config_string(
            r##"
            [color]
            scheme = "custom"
            custom = ["#111111", "#eeeeee", "#aa0000"]
            "##,
        );
        assert_eq!(config.options.color_scheme, ColorScheme::Custom);
        assert_eq!(
            config.options.custom_colors,
            Some([
                "#111111".to_string(),
                "#eeeeee".to_string(),
                "#aa0000".to_string()
            ])
        );

        let config = parse_config_string("[color]\ncustom = [\"#111111\"]");
        assert!(config.options.custom_colors.is_none());
    }

    #[test]
    fn test_fonts_and_enrichment_sections() {
        let config = parse_config_string(
            r#"
            [fonts]
            paths = ["./fonts", "/usr/share/fonts/extra"]
            embed_system_fonts = true

            [enrichment]
            url = "http://localhost:9000/style"
            timeout_ms = 750
            "#,
        );
        assert_eq!(config.fonts.custom_paths.len(), 2);
        assert!(config.fonts.embed_system_fonts);
        assert_eq!(
            config.enrichment.url.as_deref(),
            Some("http://localhost:9000/style")
        );
        assert_eq!(config.enrichment.timeout_ms, 750);
    }

    #[test]
    fn test_load_config() {
        let config = load_config_from_source(ConfigSource::Default);
        assert_eq!(config, BookpressConfig::default());

        let config = load_config_from_source(ConfigSource::File("nonexistent.toml"));
        assert_eq!(config, BookpressConfig::default());
    }

    #[test]
    fn test_config_source_embedded() {
        const EMBEDDED_CONFIG: &str = r#"
            [page]
            size = "a4"

            [text]
            size = 14.5
        "#;
        let config = load_config_from_source(ConfigSource::Embedded(EMBEDDED_CONFIG));
        assert_eq!(config.options.page_size, PageSize::A4);
        assert_eq!(config.options.font_size, 14.5);
    }

    #[test]
    fn test_default_config_round_trips() {
        let text = default_config_toml();
        assert!(text.contains("[features]"));
        assert!(text.contains("[enrichment]"));
        assert_eq!(parse_config_string(&text), BookpressConfig::default());
    }
}
