//! User-facing export options.
//!
//! [`ExportOptions`] mirrors the export dialog: page geometry, typography and a set of
//! boolean toggles. Every toggle has a documented default (see [`ExportOptions::default`]),
//! so an options value is always complete. Typography fields that the style resolver may
//! fill from other sources (font family, line spacing, margins) are `Option`s: `None`
//! means "let the resolver decide".

/// Conversion factor from typographic points to millimetres.
pub const PT_TO_MM: f32 = 0.352778;

/// Physical page sizes supported by the exporter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageSize {
    A4,
    A5,
    Letter,
    Legal,
    /// 6 x 9 inch trade paperback.
    Trade6x9,
    /// 5 x 8 inch digest.
    Digest5x8,
}

impl PageSize {
    pub const ALL: [PageSize; 6] = [
        PageSize::A4,
        PageSize::A5,
        PageSize::Letter,
        PageSize::Legal,
        PageSize::Trade6x9,
        PageSize::Digest5x8,
    ];

    /// Portrait width and height in millimetres.
    pub fn dimensions_mm(self) -> (f32, f32) {
        match self {
            PageSize::A4 => (210.0, 297.0),
            PageSize::A5 => (148.0, 210.0),
            PageSize::Letter => (215.9, 279.4),
            PageSize::Legal => (215.9, 355.6),
            PageSize::Trade6x9 => (152.4, 228.6),
            PageSize::Digest5x8 => (127.0, 203.2),
        }
    }

    pub fn parse(s: &str) -> Option<PageSize> {
        match s.trim().to_ascii_lowercase().as_str() {
            "a4" => Some(PageSize::A4),
            "a5" => Some(PageSize::A5),
            "letter" => Some(PageSize::Letter),
            "legal" => Some(PageSize::Legal),
            "6x9" | "trade" => Some(PageSize::Trade6x9),
            "5x8" | "digest" => Some(PageSize::Digest5x8),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PageSize::A4 => "a4",
            PageSize::A5 => "a5",
            PageSize::Letter => "letter",
            PageSize::Legal => "legal",
            PageSize::Trade6x9 => "6x9",
            PageSize::Digest5x8 => "5x8",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Portrait,
    Landscape,
}

impl Orientation {
    pub fn parse(s: &str) -> Option<Orientation> {
        match s.trim().to_ascii_lowercase().as_str() {
            "portrait" => Some(Orientation::Portrait),
            "landscape" => Some(Orientation::Landscape),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Orientation::Portrait => "portrait",
            Orientation::Landscape => "landscape",
        }
    }
}

/// Horizontal alignment of body text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextAlignment {
    Left,
    Center,
    Right,
    Justify,
}

impl TextAlignment {
    pub fn parse(s: &str) -> Option<TextAlignment> {
        match s.trim().to_ascii_lowercase().as_str() {
            "left" => Some(TextAlignment::Left),
            "center" | "centre" => Some(TextAlignment::Center),
            "right" => Some(TextAlignment::Right),
            "justify" | "justified" => Some(TextAlignment::Justify),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TextAlignment::Left => "left",
            TextAlignment::Center => "center",
            TextAlignment::Right => "right",
            TextAlignment::Justify => "justify",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineSpacing {
    Single,
    Normal,
    Double,
    Relaxed,
}

impl LineSpacing {
    pub fn multiplier(self) -> f32 {
        match self {
            LineSpacing::Single => 1.0,
            LineSpacing::Normal => 1.15,
            LineSpacing::Double => 2.0,
            LineSpacing::Relaxed => 1.5,
        }
    }

    pub fn parse(s: &str) -> Option<LineSpacing> {
        match s.trim().to_ascii_lowercase().as_str() {
            "single" => Some(LineSpacing::Single),
            "normal" => Some(LineSpacing::Normal),
            "double" => Some(LineSpacing::Double),
            "relaxed" => Some(LineSpacing::Relaxed),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LineSpacing::Single => "single",
            LineSpacing::Normal => "normal",
            LineSpacing::Double => "double",
            LineSpacing::Relaxed => "relaxed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarginPreset {
    Narrow,
    Normal,
    Wide,
    /// Normal outer margins plus a binding gutter on the inside edge.
    Mirrored,
}

impl MarginPreset {
    /// Outer margin in millimetres.
    pub fn millimetres(self) -> f32 {
        match self {
            MarginPreset::Narrow => 12.7,
            MarginPreset::Normal | MarginPreset::Mirrored => 25.4,
            MarginPreset::Wide => 38.1,
        }
    }

    /// Extra inside margin for bound books.
    pub fn gutter_mm(self) -> f32 {
        match self {
            MarginPreset::Mirrored => 6.35,
            _ => 0.0,
        }
    }

    pub fn parse(s: &str) -> Option<MarginPreset> {
        match s.trim().to_ascii_lowercase().as_str() {
            "narrow" => Some(MarginPreset::Narrow),
            "normal" => Some(MarginPreset::Normal),
            "wide" => Some(MarginPreset::Wide),
            "mirrored" => Some(MarginPreset::Mirrored),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MarginPreset::Narrow => "narrow",
            MarginPreset::Normal => "normal",
            MarginPreset::Wide => "wide",
            MarginPreset::Mirrored => "mirrored",
        }
    }
}

/// Color scheme selection from the export dialog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColorScheme {
    /// Let the category (or enrichment) decide.
    Default,
    /// Use [`ExportOptions::custom_colors`].
    Custom,
    /// A palette from [`crate::style::NAMED_PALETTES`].
    Named(String),
}

impl ColorScheme {
    pub fn parse(s: &str) -> ColorScheme {
        let key = s.trim().to_ascii_lowercase();
        match key.as_str() {
            "" | "default" => ColorScheme::Default,
            "custom" => ColorScheme::Custom,
            _ => ColorScheme::Named(key),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            ColorScheme::Default => "default",
            ColorScheme::Custom => "custom",
            ColorScheme::Named(name) => name,
        }
    }
}

/// Output formats the exporter can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExportFormat {
    Pdf,
    Html,
    Markdown,
    Text,
    Epub,
}

impl ExportFormat {
    pub fn parse(s: &str) -> Option<ExportFormat> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pdf" => Some(ExportFormat::Pdf),
            "html" | "htm" => Some(ExportFormat::Html),
            "md" | "markdown" => Some(ExportFormat::Markdown),
            "txt" | "text" => Some(ExportFormat::Text),
            "epub" => Some(ExportFormat::Epub),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ExportFormat::Pdf => "pdf",
            ExportFormat::Html => "html",
            ExportFormat::Markdown => "markdown",
            ExportFormat::Text => "text",
            ExportFormat::Epub => "epub",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            ExportFormat::Pdf => "application/pdf",
            ExportFormat::Html => "text/html",
            ExportFormat::Markdown => "text/markdown",
            ExportFormat::Text => "text/plain",
            ExportFormat::Epub => "application/epub+zip",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Pdf => "pdf",
            ExportFormat::Html => "html",
            ExportFormat::Markdown => "md",
            ExportFormat::Text => "txt",
            ExportFormat::Epub => "epub",
        }
    }

    /// Guesses the format from an output path's extension.
    pub fn from_path(path: &str) -> Option<ExportFormat> {
        std::path::Path::new(path)
            .extension()
            .and_then(|e| e.to_str())
            .and_then(ExportFormat::parse)
    }
}

/// Options chosen by the user for one export.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportOptions {
    pub page_size: PageSize,
    pub orientation: Orientation,
    pub font_family: Option<String>,
    /// Body font size in points.
    pub font_size: f32,
    pub alignment: TextAlignment,
    pub line_spacing: Option<LineSpacing>,
    pub margins: Option<MarginPreset>,
    pub show_page_numbers: bool,
    pub header_footer: bool,
    pub cover_page: bool,
    pub credits_page: bool,
    pub decorative_elements: bool,
    pub chapter_dividers: bool,
    pub drop_caps: bool,
    pub paper_texture: bool,
    pub texture_seed: u64,
    pub color_scheme: ColorScheme,
    pub custom_colors: Option<[String; 3]>,
}

impl ExportOptions {
    pub const MIN_FONT_SIZE: f32 = 6.0;
    pub const MAX_FONT_SIZE: f32 = 36.0;
    pub const DEFAULT_FONT_SIZE: f32 = 12.0;

    /// Page width and height in millimetres after applying the orientation.
    pub fn page_dimensions_mm(&self) -> (f32, f32) {
        let (w, h) = self.page_size.dimensions_mm();
        match self.orientation {
            Orientation::Portrait => (w, h),
            Orientation::Landscape => (h, w),
        }
    }

    /// Body font size clamped to the supported range. Non-finite values use the default.
    pub fn effective_font_size(&self) -> f32 {
        if self.font_size.is_finite() {
            self.font_size
                .clamp(Self::MIN_FONT_SIZE, Self::MAX_FONT_SIZE)
        } else {
            Self::DEFAULT_FONT_SIZE
        }
    }
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            page_size: PageSize::A5,
            orientation: Orientation::Portrait,
            font_family: None,
            font_size: Self::DEFAULT_FONT_SIZE,
            alignment: TextAlignment::Left,
            line_spacing: None,
            margins: None,
            show_page_numbers: true,
            header_footer: false,
            cover_page: true,
            credits_page: true,
            decorative_elements: true,
            chapter_dividers: true,
            drop_caps: false,
            paper_texture: false,
            texture_seed: 0x5EED,
            color_scheme: ColorScheme::Default,
            custom_colors: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_spacing_multipliers() {
        assert_eq!(LineSpacing::Single.multiplier(), 1.0);
        assert_eq!(LineSpacing::Normal.multiplier(), 1.15);
        assert_eq!(LineSpacing::Double.multiplier(), 2.0);
        assert_eq!(LineSpacing::Relaxed.multiplier(), 1.5);
    }

    #[test]
    fn test_margin_presets() {
        assert_eq!(MarginPreset::Narrow.millimetres(), 12.7);
        assert_eq!(MarginPreset::Normal.millimetres(), 25.4);
        assert_eq!(MarginPreset::Wide.millimetres(), 38.1);
        assert_eq!(MarginPreset::Mirrored.millimetres(), 25.4);
        assert!(MarginPreset::Mirrored.gutter_mm() > 0.0);
        assert_eq!(MarginPreset::Wide.gutter_mm(), 0.0);
    }

    #[test]
    fn test_landscape_swaps_dimensions() {
        let mut opts = ExportOptions {
            page_size: PageSize::A4,
            ..Default::default()
        };
        assert_eq!(opts.page_dimensions_mm(), (210.0, 297.0));
        opts.orientation = Orientation::Landscape;
        assert_eq!(opts.page_dimensions_mm(), (297.0, 210.0));
    }

    #[test]
    fn test_parse_enums() {
        for size in PageSize::ALL {
            assert_eq!(PageSize::parse(size.as_str()), Some(size));
        }
        assert_eq!(PageSize::parse("A4"), Some(PageSize::A4));
        assert_eq!(PageSize::parse("tabloid"), None);
        assert_eq!(TextAlignment::parse("Justify"), Some(TextAlignment::Justify));
        assert_eq!(LineSpacing::parse("relaxed"), Some(LineSpacing::Relaxed));
        assert_eq!(MarginPreset::parse("mirrored"), Some(MarginPreset::Mirrored));
        assert_eq!(ColorScheme::parse("Default"), ColorScheme::Default);
        assert_eq!(ColorScheme::parse("custom"), ColorScheme::Custom);
        assert_eq!(
            ColorScheme::parse(" Ocean "),
            ColorScheme::Named("ocean".to_string())
        );
        assert_eq!(ExportFormat::from_path("out/book.PDF"), Some(ExportFormat::Pdf));
        assert_eq!(ExportFormat::from_path("book.md"), Some(ExportFormat::Markdown));
        assert_eq!(ExportFormat::from_path("book.epub"), Some(ExportFormat::Epub));
        assert_eq!(ExportFormat::Epub.mime_type(), "application/epub+zip");
        assert_eq!(ExportFormat::from_path("book"), None);
    }

    #[test]
    fn test_font_size_is_clamped() {
        let mut opts = ExportOptions::default();
        opts.font_size = 2.0;
        assert_eq!(opts.effective_font_size(), ExportOptions::MIN_FONT_SIZE);
        opts.font_size = 99.0;
        assert_eq!(opts.effective_font_size(), ExportOptions::MAX_FONT_SIZE);
        opts.font_size = f32::NAN;
        assert_eq!(opts.effective_font_size(), ExportOptions::DEFAULT_FONT_SIZE);
    }

    #[test]
    fn test_documented_toggle_defaults() {
        let opts = ExportOptions::default();
        assert!(opts.show_page_numbers);
        assert!(!opts.header_footer);
        assert!(opts.cover_page);
        assert!(opts.credits_page);
        assert!(opts.decorative_elements);
        assert!(opts.chapter_dividers);
        assert!(!opts.drop_caps);
        assert!(!opts.paper_texture);
    }
}
