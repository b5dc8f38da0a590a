//! Style resolution.
//!
//! [`resolve_style`] turns a book category, the user's [`ExportOptions`] and an optional
//! enrichment [`StyleSuggestion`] into a [`ResolvedStyle`] in which every field is set.
//! Layout code never has to deal with a missing style value.
//!
//! Precedence, per field:
//!
//! ```text
//! colors   : named scheme option > custom colors option > enrichment > category
//! fonts    : font_family option  > enrichment pairing  > category
//! margins  : margins option      > enrichment numeric  > category
//! spacing  : line_spacing option > enrichment numeric  > category
//! ornaments: enrichment descriptor (when it parses)    > category
//! ```
//!
//! An enrichment suggestion is only consulted when it is well-formed, meaning that its
//! color scheme string holds at least three parseable colors.

use crate::color::{parse_color_list, Color};
use crate::options::{ColorScheme, ExportOptions, PT_TO_MM};
use log::debug;
use once_cell::sync::Lazy;
use serde_json::Value;
use std::collections::HashMap;

/// Scale of the cover title relative to the body size.
pub const TITLE_SCALE: f32 = 2.0;
/// Scale of chapter titles and page headings relative to the body size.
pub const HEADING_SCALE: f32 = 1.5;

/// Accepted range for enrichment margins, in millimetres.
const ENRICHMENT_MARGIN_RANGE: (f32, f32) = (5.0, 50.0);
/// Accepted range for enrichment line-height multipliers.
const ENRICHMENT_LINE_HEIGHT_RANGE: (f32, f32) = (0.8, 3.0);

/// Text, background and accent colors as `#rrggbb` strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    pub primary: String,
    pub background: String,
    pub accent: String,
}

impl Palette {
    pub fn from_colors(primary: Color, background: Color, accent: Color) -> Self {
        Self {
            primary: primary.to_hex(),
            background: background.to_hex(),
            accent: accent.to_hex(),
        }
    }

    /// Builds a palette from the first three colors of a list.
    fn from_slice(colors: &[Color]) -> Option<Self> {
        match colors {
            [p, b, a, ..] => Some(Self::from_colors(*p, *b, *a)),
            _ => None,
        }
    }

    fn from_strs(colors: [&str; 3]) -> Self {
        Self::from_colors(
            Color::from_hex(colors[0]),
            Color::from_hex(colors[1]),
            Color::from_hex(colors[2]),
        )
    }
}

/// Ornament drawn in the page header or footer band.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Motif {
    None,
    Rule,
    DoubleRule,
    Dots,
    Ornament,
}

impl Motif {
    pub fn parse(s: &str) -> Option<Motif> {
        let key = normalize_key(s);
        match key.as_str() {
            "none" | "plain" | "off" => Some(Motif::None),
            "rule" | "line" | "simple" | "thin-line" => Some(Motif::Rule),
            "double-rule" | "double-line" | "double" => Some(Motif::DoubleRule),
            "dots" | "dotted" => Some(Motif::Dots),
            "ornament" | "ornamental" | "flourish" | "decorative" => Some(Motif::Ornament),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Motif::None => "none",
            Motif::Rule => "rule",
            Motif::DoubleRule => "double-rule",
            Motif::Dots => "dots",
            Motif::Ornament => "ornament",
        }
    }
}

/// The three divider shapes. A chapter's shape is chosen by its position, see
/// [`DividerVariant::for_chapter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DividerVariant {
    Plain,
    LineCircleLine,
    TripleDash,
}

impl DividerVariant {
    /// Variant for the chapter at `index` (0-based): `index % 3`.
    pub fn for_chapter(index: usize) -> DividerVariant {
        match index % 3 {
            0 => DividerVariant::Plain,
            1 => DividerVariant::LineCircleLine,
            _ => DividerVariant::TripleDash,
        }
    }

    pub fn index(self) -> usize {
        match self {
            DividerVariant::Plain => 0,
            DividerVariant::LineCircleLine => 1,
            DividerVariant::TripleDash => 2,
        }
    }
}

/// Proportions shared by all divider variants.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DividerStyle {
    /// Divider width as a fraction of the content width.
    pub width_ratio: f32,
    pub thickness_mm: f32,
}

impl DividerStyle {
    pub const THIN: DividerStyle = DividerStyle {
        width_ratio: 0.3,
        thickness_mm: 0.3,
    };
    pub const BOLD: DividerStyle = DividerStyle {
        width_ratio: 0.3,
        thickness_mm: 0.8,
    };
    pub const WIDE: DividerStyle = DividerStyle {
        width_ratio: 0.6,
        thickness_mm: 0.4,
    };
    pub const SHORT: DividerStyle = DividerStyle {
        width_ratio: 0.15,
        thickness_mm: 0.5,
    };

    pub fn parse(s: &str) -> Option<DividerStyle> {
        match normalize_key(s).as_str() {
            "thin" | "simple" | "elegant" | "minimal" => Some(Self::THIN),
            "bold" | "thick" | "strong" => Some(Self::BOLD),
            "wide" | "full" | "long" => Some(Self::WIDE),
            "short" | "compact" | "small" => Some(Self::SHORT),
            _ => None,
        }
    }
}

/// Drop-cap parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DropCapStyle {
    /// Cap size relative to the body size.
    pub scale: f32,
    /// Number of body lines narrowed beside the cap.
    pub lines: usize,
    /// Space between the cap and the narrowed lines, in millimetres.
    pub gap_mm: f32,
    /// Draw the cap in the accent color instead of the text color.
    pub accent_color: bool,
    pub bold: bool,
}

impl DropCapStyle {
    pub const CLASSIC: DropCapStyle = DropCapStyle {
        scale: 3.0,
        lines: 3,
        gap_mm: 1.5,
        accent_color: true,
        bold: true,
    };
    pub const PLAIN: DropCapStyle = DropCapStyle {
        scale: 3.0,
        lines: 3,
        gap_mm: 1.5,
        accent_color: false,
        bold: false,
    };
    pub const AIRY: DropCapStyle = DropCapStyle {
        scale: 3.0,
        lines: 3,
        gap_mm: 3.0,
        accent_color: true,
        bold: false,
    };

    pub fn parse(s: &str) -> Option<DropCapStyle> {
        match normalize_key(s).as_str() {
            "classic" | "accent" | "bold" | "traditional" => Some(Self::CLASSIC),
            "plain" | "simple" | "minimal" => Some(Self::PLAIN),
            "airy" | "elegant" | "light" => Some(Self::AIRY),
            _ => None,
        }
    }
}

/// Decoration drawn on every page beneath the text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageDecoration {
    Border,
    CornerMarks,
}

impl PageDecoration {
    pub fn parse(s: &str) -> Option<PageDecoration> {
        match normalize_key(s).as_str() {
            "border" | "frame" | "page-border" => Some(PageDecoration::Border),
            "corners" | "corner-marks" | "corner" | "corner-ornaments" => {
                Some(PageDecoration::CornerMarks)
            }
            _ => None,
        }
    }
}

/// How paragraphs are split across pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageBreakStrategy {
    /// Break wherever the next line does not fit.
    Greedy,
    /// Move paragraphs of at most two lines to the next page rather than splitting them.
    KeepShortParagraphs,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Decorations {
    pub header: Motif,
    pub footer: Motif,
    pub divider: DividerStyle,
    pub drop_cap: DropCapStyle,
    pub page: Vec<PageDecoration>,
}

/// A complete style sheet for one export.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedStyle {
    pub body_font: String,
    pub heading_font: String,
    /// Body size in points.
    pub font_size: f32,
    pub palette: Palette,
    pub decorations: Decorations,
    /// Outer page margin in millimetres.
    pub margin_mm: f32,
    /// Extra inside margin for bound books, in millimetres.
    pub gutter_mm: f32,
    /// Line-height multiplier.
    pub line_height: f32,
    pub page_break: PageBreakStrategy,
}

impl ResolvedStyle {
    pub fn primary_color(&self) -> Color {
        Color::from_hex(&self.palette.primary)
    }

    pub fn background_color(&self) -> Color {
        Color::from_hex(&self.palette.background)
    }

    pub fn accent_color(&self) -> Color {
        Color::from_hex(&self.palette.accent)
    }

    /// Height of one body line in millimetres.
    pub fn line_height_mm(&self) -> f32 {
        line_height_mm(self.font_size, self.line_height)
    }
}

/// `font_size_pt × 0.352778 × multiplier`.
pub fn line_height_mm(font_size_pt: f32, multiplier: f32) -> f32 {
    font_size_pt * PT_TO_MM * multiplier
}

/// Partial style proposal from the enrichment service. Every field may be missing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StyleSuggestion {
    /// `"Heading, Body"` or a single family used for both.
    pub font_pairing: Option<String>,
    /// Comma-separated colors: text, background, accent.
    pub color_scheme: Option<String>,
    pub header_style: Option<String>,
    pub footer_style: Option<String>,
    pub divider_style: Option<String>,
    pub drop_cap_style: Option<String>,
    /// Comma-separated page decoration names.
    pub page_decorations: Option<String>,
    pub margin_mm: Option<f32>,
    pub line_height: Option<f32>,
}

fn json_field<'v>(value: &'v Value, names: &[&str]) -> Option<&'v Value> {
    names.iter().find_map(|n| value.get(*n))
}

fn json_string(value: &Value, names: &[&str]) -> Option<String> {
    match json_field(value, names)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Array(items) => {
            let parts: Vec<&str> = items.iter().filter_map(|v| v.as_str()).collect();
            if parts.is_empty() {
                None
            } else {
                Some(parts.join(", "))
            }
        }
        _ => None,
    }
}

fn json_number(value: &Value, names: &[&str]) -> Option<f32> {
    let n = match json_field(value, names)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s
            .trim()
            .trim_end_matches("mm")
            .trim()
            .parse::<f64>()
            .ok(),
        _ => None,
    }?;
    Some(n as f32)
}

impl StyleSuggestion {
    /// Extracts a suggestion from any JSON value. Wrong types and unknown keys are ignored;
    /// both `camelCase` and `snake_case` keys are read, and a nested `style` or
    /// `suggestion` object is unwrapped.
    pub fn from_json(value: &Value) -> StyleSuggestion {
        let root = value
            .get("style")
            .or_else(|| value.get("suggestion"))
            .filter(|v| v.is_object())
            .unwrap_or(value);

        StyleSuggestion {
            font_pairing: json_string(root, &["fontPairing", "font_pairing", "fonts"]),
            color_scheme: json_string(root, &["colorScheme", "color_scheme", "colors"]),
            header_style: json_string(root, &["headerStyle", "header_style"]),
            footer_style: json_string(root, &["footerStyle", "footer_style"]),
            divider_style: json_string(root, &["dividerStyle", "divider_style"]),
            drop_cap_style: json_string(root, &["dropCapStyle", "drop_cap_style"]),
            page_decorations: json_string(root, &["pageDecorations", "page_decorations"]),
            margin_mm: json_number(root, &["margins", "margin", "margin_mm", "marginMm"]),
            line_height: json_number(root, &["lineHeight", "line_height", "lineSpacing"]),
        }
    }

    /// Parses a JSON document; text that is not JSON yields an empty suggestion.
    pub fn from_json_str(input: &str) -> StyleSuggestion {
        serde_json::from_str::<Value>(input)
            .map(|v| Self::from_json(&v))
            .unwrap_or_default()
    }

    /// The colors of the suggestion when at least three of them parse.
    fn colors(&self) -> Option<Vec<Color>> {
        let colors = parse_color_list(self.color_scheme.as_deref()?);
        if colors.len() >= 3 {
            Some(colors)
        } else {
            None
        }
    }

    pub fn is_well_formed(&self) -> bool {
        self.colors().is_some()
    }

    /// `(heading, body)` from the font pairing.
    fn fonts(&self) -> Option<(String, String)> {
        let pairing = self.font_pairing.as_deref()?;
        let names: Vec<&str> = pairing
            .split(|c| c == ',' || c == '/' || c == '+' || c == '&')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect();
        match names.as_slice() {
            [] => None,
            [single] => Some((single.to_string(), single.to_string())),
            [heading, body, ..] => Some((heading.to_string(), body.to_string())),
        }
    }

    fn page_decorations(&self) -> Option<Vec<PageDecoration>> {
        let raw = self.page_decorations.as_deref()?;
        if matches!(normalize_key(raw).as_str(), "none" | "off") {
            return Some(Vec::new());
        }
        let parsed: Vec<PageDecoration> = raw
            .split(',')
            .filter_map(PageDecoration::parse)
            .collect();
        if parsed.is_empty() {
            None
        } else {
            Some(dedup(parsed))
        }
    }
}

fn dedup(items: Vec<PageDecoration>) -> Vec<PageDecoration> {
    let mut out = Vec::with_capacity(items.len());
    for item in items {
        if !out.contains(&item) {
            out.push(item);
        }
    }
    out
}

fn within(value: Option<f32>, (lo, hi): (f32, f32)) -> Option<f32> {
    value.filter(|v| v.is_finite() && *v >= lo && *v <= hi)
}

/// Lower-cases and folds `_` and spaces into `-`.
fn normalize_key(s: &str) -> String {
    s.trim()
        .to_ascii_lowercase()
        .chars()
        .map(|c| if c == '_' || c == ' ' { '-' } else { c })
        .collect()
}

/// Static per-category defaults.
#[derive(Debug, Clone)]
pub struct CategoryStyle {
    pub heading_font: &'static str,
    pub body_font: &'static str,
    /// Text, background, accent.
    pub palette: [&'static str; 3],
    pub header: Motif,
    pub footer: Motif,
    pub divider: DividerStyle,
    pub drop_cap: DropCapStyle,
    pub page: &'static [PageDecoration],
    pub margin_mm: f32,
    pub line_height: f32,
    pub page_break: PageBreakStrategy,
}

/// Entry used for unknown or missing categories.
pub static DEFAULT_CATEGORY: CategoryStyle = CategoryStyle {
    heading_font: "Georgia",
    body_font: "Georgia",
    palette: ["#2c3e50", "#ffffff", "#8b4513"],
    header: Motif::Rule,
    footer: Motif::Rule,
    divider: DividerStyle::THIN,
    drop_cap: DropCapStyle::CLASSIC,
    page: &[],
    margin_mm: 20.0,
    line_height: 1.15,
    page_break: PageBreakStrategy::Greedy,
};

static CATEGORY_STYLES: Lazy<HashMap<&'static str, CategoryStyle>> = Lazy::new(|| {
    let mut table = HashMap::new();
    table.insert(
        "fiction",
        CategoryStyle {
            heading_font: "Garamond",
            body_font: "Georgia",
            palette: ["#2b2b2b", "#fffdf8", "#8b0000"],
            header: Motif::Rule,
            footer: Motif::Ornament,
            divider: DividerStyle::THIN,
            drop_cap: DropCapStyle::CLASSIC,
            page: &[],
            margin_mm: 20.0,
            line_height: 1.15,
            page_break: PageBreakStrategy::KeepShortParagraphs,
        },
    );
    table.insert(
        "fantasy",
        CategoryStyle {
            heading_font: "Palatino",
            body_font: "Garamond",
            palette: ["#3e2723", "#fdf6e3", "#6a1b9a"],
            header: Motif::Ornament,
            footer: Motif::Ornament,
            divider: DividerStyle::WIDE,
            drop_cap: DropCapStyle::CLASSIC,
            page: &[PageDecoration::Border, PageDecoration::CornerMarks],
            margin_mm: 22.0,
            line_height: 1.2,
            page_break: PageBreakStrategy::KeepShortParagraphs,
        },
    );
    table.insert(
        "science-fiction",
        CategoryStyle {
            heading_font: "Helvetica",
            body_font: "Helvetica",
            palette: ["#1a1a2e", "#ffffff", "#0f4c75"],
            header: Motif::DoubleRule,
            footer: Motif::Rule,
            divider: DividerStyle::SHORT,
            drop_cap: DropCapStyle::PLAIN,
            page: &[PageDecoration::CornerMarks],
            margin_mm: 18.0,
            line_height: 1.15,
            page_break: PageBreakStrategy::Greedy,
        },
    );
    table.insert(
        "mystery",
        CategoryStyle {
            heading_font: "Times",
            body_font: "Times",
            palette: ["#212121", "#fafafa", "#b71c1c"],
            header: Motif::Rule,
            footer: Motif::Dots,
            divider: DividerStyle::BOLD,
            drop_cap: DropCapStyle::CLASSIC,
            page: &[],
            margin_mm: 20.0,
            line_height: 1.15,
            page_break: PageBreakStrategy::KeepShortParagraphs,
        },
    );
    table.insert(
        "romance",
        CategoryStyle {
            heading_font: "Palatino",
            body_font: "Georgia",
            palette: ["#4a2c2a", "#fff8f6", "#c2185b"],
            header: Motif::Ornament,
            footer: Motif::Dots,
            divider: DividerStyle::THIN,
            drop_cap: DropCapStyle::AIRY,
            page: &[PageDecoration::CornerMarks],
            margin_mm: 22.0,
            line_height: 1.3,
            page_break: PageBreakStrategy::KeepShortParagraphs,
        },
    );
    table.insert(
        "children",
        CategoryStyle {
            heading_font: "Helvetica",
            body_font: "Verdana",
            palette: ["#263238", "#fffde7", "#f57c00"],
            header: Motif::Dots,
            footer: Motif::Dots,
            divider: DividerStyle::BOLD,
            drop_cap: DropCapStyle::CLASSIC,
            page: &[PageDecoration::Border],
            margin_mm: 25.0,
            line_height: 1.5,
            page_break: PageBreakStrategy::KeepShortParagraphs,
        },
    );
    table.insert(
        "poetry",
        CategoryStyle {
            heading_font: "Garamond",
            body_font: "Garamond",
            palette: ["#333333", "#fdfcf7", "#7b5e57"],
            header: Motif::None,
            footer: Motif::Ornament,
            divider: DividerStyle::SHORT,
            drop_cap: DropCapStyle::AIRY,
            page: &[],
            margin_mm: 28.0,
            line_height: 1.5,
            page_break: PageBreakStrategy::KeepShortParagraphs,
        },
    );
    table.insert(
        "non-fiction",
        CategoryStyle {
            heading_font: "Helvetica",
            body_font: "Times",
            palette: ["#212529", "#ffffff", "#1565c0"],
            header: Motif::Rule,
            footer: Motif::Rule,
            divider: DividerStyle::WIDE,
            drop_cap: DropCapStyle::PLAIN,
            page: &[],
            margin_mm: 20.0,
            line_height: 1.15,
            page_break: PageBreakStrategy::Greedy,
        },
    );
    table.insert(
        "biography",
        CategoryStyle {
            heading_font: "Times",
            body_font: "Georgia",
            palette: ["#2e2e2e", "#fbf8f1", "#5d4037"],
            header: Motif::DoubleRule,
            footer: Motif::Rule,
            divider: DividerStyle::THIN,
            drop_cap: DropCapStyle::CLASSIC,
            page: &[],
            margin_mm: 22.0,
            line_height: 1.2,
            page_break: PageBreakStrategy::Greedy,
        },
    );
    table.insert(
        "business",
        CategoryStyle {
            heading_font: "Helvetica",
            body_font: "Helvetica",
            palette: ["#1b2631", "#ffffff", "#117a65"],
            header: Motif::Rule,
            footer: Motif::Rule,
            divider: DividerStyle::WIDE,
            drop_cap: DropCapStyle::PLAIN,
            page: &[],
            margin_mm: 20.0,
            line_height: 1.15,
            page_break: PageBreakStrategy::Greedy,
        },
    );
    table.insert(
        "self-help",
        CategoryStyle {
            heading_font: "Helvetica",
            body_font: "Georgia",
            palette: ["#263238", "#ffffff", "#00897b"],
            header: Motif::Rule,
            footer: Motif::Dots,
            divider: DividerStyle::SHORT,
            drop_cap: DropCapStyle::AIRY,
            page: &[],
            margin_mm: 20.0,
            line_height: 1.3,
            page_break: PageBreakStrategy::KeepShortParagraphs,
        },
    );
    table.insert(
        "history",
        CategoryStyle {
            heading_font: "Times",
            body_font: "Times",
            palette: ["#3b2f2f", "#f8f1e4", "#8d6e63"],
            header: Motif::DoubleRule,
            footer: Motif::DoubleRule,
            divider: DividerStyle::THIN,
            drop_cap: DropCapStyle::CLASSIC,
            page: &[PageDecoration::Border],
            margin_mm: 22.0,
            line_height: 1.2,
            page_break: PageBreakStrategy::Greedy,
        },
    );
    table.insert(
        "cookbook",
        CategoryStyle {
            heading_font: "Helvetica",
            body_font: "Helvetica",
            palette: ["#3e2723", "#fffaf0", "#d84315"],
            header: Motif::Dots,
            footer: Motif::Dots,
            divider: DividerStyle::BOLD,
            drop_cap: DropCapStyle::PLAIN,
            page: &[PageDecoration::CornerMarks],
            margin_mm: 18.0,
            line_height: 1.2,
            page_break: PageBreakStrategy::KeepShortParagraphs,
        },
    );
    table.insert(
        "academic",
        CategoryStyle {
            heading_font: "Times",
            body_font: "Times",
            palette: ["#000000", "#ffffff", "#1a237e"],
            header: Motif::Rule,
            footer: Motif::None,
            divider: DividerStyle::THIN,
            drop_cap: DropCapStyle::PLAIN,
            page: &[],
            margin_mm: 25.4,
            line_height: 2.0,
            page_break: PageBreakStrategy::Greedy,
        },
    );
    table
});

/// Alternative spellings mapped onto table keys.
const CATEGORY_ALIASES: &[(&str, &str)] = &[
    ("novel", "fiction"),
    ("sci-fi", "science-fiction"),
    ("scifi", "science-fiction"),
    ("sf", "science-fiction"),
    ("thriller", "mystery"),
    ("crime", "mystery"),
    ("kids", "children"),
    ("childrens", "children"),
    ("children's", "children"),
    ("nonfiction", "non-fiction"),
    ("memoir", "biography"),
    ("autobiography", "biography"),
    ("recipes", "cookbook"),
    ("cooking", "cookbook"),
    ("self-improvement", "self-help"),
    ("textbook", "academic"),
    ("educational", "academic"),
    ("poems", "poetry"),
];

/// Normalized category keys with a dedicated table entry, sorted.
pub fn known_categories() -> Vec<&'static str> {
    let mut keys: Vec<&'static str> = CATEGORY_STYLES.keys().copied().collect();
    keys.sort_unstable();
    keys
}

/// Looks up the defaults for a category. Matching ignores case and treats `-`, `_` and
/// spaces alike; unknown or missing categories get [`DEFAULT_CATEGORY`].
pub fn category_style(category: Option<&str>) -> &'static CategoryStyle {
    lookup_category(category).unwrap_or(&DEFAULT_CATEGORY)
}

/// True when the category has its own entry (directly or through an alias).
pub fn is_known_category(category: &str) -> bool {
    lookup_category(Some(category)).is_some()
}

fn lookup_category(category: Option<&str>) -> Option<&'static CategoryStyle> {
    let key = normalize_key(category?);
    let key = CATEGORY_ALIASES
        .iter()
        .find(|(alias, _)| *alias == key)
        .map(|(_, target)| target.to_string())
        .unwrap_or(key);
    CATEGORY_STYLES.get(key.as_str())
}

/// Named palettes selectable through [`ColorScheme::Named`]: text, background, accent.
pub const NAMED_PALETTES: &[(&str, [&str; 3])] = &[
    ("classic", ["#2c3e50", "#ffffff", "#8b4513"]),
    ("modern", ["#212121", "#ffffff", "#2196f3"]),
    ("elegant", ["#2d2d2d", "#faf8f5", "#b8860b"]),
    ("vintage", ["#4e342e", "#f5ecd7", "#a0522d"]),
    ("vibrant", ["#1a1a1a", "#ffffff", "#e91e63"]),
    ("minimal", ["#333333", "#ffffff", "#9e9e9e"]),
    ("ocean", ["#0d2c54", "#f4f9fc", "#0077b6"]),
    ("forest", ["#1b3a2d", "#f6f9f4", "#2e7d32"]),
    ("sunset", ["#3d1f2a", "#fff7f0", "#ef6c00"]),
    ("monochrome", ["#000000", "#ffffff", "#555555"]),
];

pub fn named_palette(name: &str) -> Option<Palette> {
    let key = normalize_key(name);
    NAMED_PALETTES
        .iter()
        .find(|(n, _)| *n == key)
        .map(|(_, colors)| Palette::from_strs(*colors))
}

fn custom_palette(options: &ExportOptions) -> Option<Palette> {
    let [p, b, a] = options.custom_colors.as_ref()?;
    Some(Palette::from_colors(
        Color::parse_hex(p)?,
        Color::parse_hex(b)?,
        Color::parse_hex(a)?,
    ))
}

fn resolve_palette(
    options: &ExportOptions,
    enrichment: Option<&StyleSuggestion>,
    category: &CategoryStyle,
) -> Palette {
    match &options.color_scheme {
        ColorScheme::Named(name) => {
            if let Some(palette) = named_palette(name) {
                return palette;
            }
            debug!("Unknown color scheme '{}', using category colors", name);
        }
        ColorScheme::Custom => {
            if let Some(palette) = custom_palette(options) {
                return palette;
            }
            debug!("Custom color scheme without three valid colors, using defaults");
        }
        ColorScheme::Default => {}
    }

    enrichment
        .and_then(|e| e.colors())
        .and_then(|colors| Palette::from_slice(&colors))
        .unwrap_or_else(|| Palette::from_strs(category.palette))
}

/// Resolves the complete style for one export. Pure and total.
pub fn resolve_style(
    category: Option<&str>,
    options: &ExportOptions,
    enrichment: Option<&StyleSuggestion>,
) -> ResolvedStyle {
    let base = category_style(category);
    let enrichment = enrichment.filter(|e| {
        let ok = e.is_well_formed();
        if !ok {
            debug!("Ignoring malformed style suggestion");
        }
        ok
    });

    let palette = resolve_palette(options, enrichment, base);

    let (heading_font, body_font) = match options
        .font_family
        .as_deref()
        .map(str::trim)
        .filter(|f| !f.is_empty())
    {
        Some(family) => (family.to_string(), family.to_string()),
        None => enrichment.and_then(|e| e.fonts()).unwrap_or_else(|| {
            (base.heading_font.to_string(), base.body_font.to_string())
        }),
    };

    let (margin_mm, gutter_mm) = match options.margins {
        Some(preset) => (preset.millimetres(), preset.gutter_mm()),
        None => (
            within(enrichment.and_then(|e| e.margin_mm), ENRICHMENT_MARGIN_RANGE)
                .unwrap_or(base.margin_mm),
            0.0,
        ),
    };

    let line_height = match options.line_spacing {
        Some(spacing) => spacing.multiplier(),
        None => within(
            enrichment.and_then(|e| e.line_height),
            ENRICHMENT_LINE_HEIGHT_RANGE,
        )
        .unwrap_or(base.line_height),
    };

    let mut decorations = Decorations {
        header: enrichment
            .and_then(|e| e.header_style.as_deref())
            .and_then(Motif::parse)
            .unwrap_or(base.header),
        footer: enrichment
            .and_then(|e| e.footer_style.as_deref())
            .and_then(Motif::parse)
            .unwrap_or(base.footer),
        divider: enrichment
            .and_then(|e| e.divider_style.as_deref())
            .and_then(DividerStyle::parse)
            .unwrap_or(base.divider),
        drop_cap: enrichment
            .and_then(|e| e.drop_cap_style.as_deref())
            .and_then(DropCapStyle::parse)
            .unwrap_or(base.drop_cap),
        page: enrichment
            .and_then(|e| e.page_decorations())
            .unwrap_or_else(|| base.page.to_vec()),
    };

    if !options.decorative_elements {
        decorations.header = Motif::None;
        decorations.footer = Motif::None;
        decorations.page.clear();
    }

    ResolvedStyle {
        body_font,
        heading_font,
        font_size: options.effective_font_size(),
        palette,
        decorations,
        margin_mm,
        gutter_mm,
        line_height,
        page_break: base.page_break,
    }
}
