//! Subscription plan entitlements.
//!
//! A static table of what each tier may do. The plan is always passed in explicitly; the
//! export pipeline itself never looks at it. Callers (the CLI, or a service embedding the
//! library) check entitlements before exporting with [`check_export`], or downgrade the
//! options with [`restrict_options`].
//!
//! | tier       | books | chapters | formats            | features                          |
//! |------------|-------|----------|--------------------|-----------------------------------|
//! | free       | 3     | 5        | pdf, txt           | none                              |
//! | starter    | 10    | 20       | all                | custom colors, decorations        |
//! | pro        | 50    | 50       | all                | + style enrichment, paper texture |
//! | enterprise | ∞     | ∞        | all                | all                               |

use log::warn;

use crate::book::Book;
use crate::options::{ColorScheme, ExportFormat, ExportOptions};
use crate::ExportError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PlanTier {
    #[default]
    Free,
    Starter,
    Pro,
    Enterprise,
}

impl PlanTier {
    pub const ALL: [PlanTier; 4] = [
        PlanTier::Free,
        PlanTier::Starter,
        PlanTier::Pro,
        PlanTier::Enterprise,
    ];

    pub fn parse(s: &str) -> Option<PlanTier> {
        match s.trim().to_lowercase().as_str() {
            "free" => Some(PlanTier::Free),
            "starter" => Some(PlanTier::Starter),
            "pro" | "professional" => Some(PlanTier::Pro),
            "enterprise" => Some(PlanTier::Enterprise),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PlanTier::Free => "free",
            PlanTier::Starter => "starter",
            PlanTier::Pro => "pro",
            PlanTier::Enterprise => "enterprise",
        }
    }

    pub fn limits(self) -> &'static PlanLimits {
        match self {
            PlanTier::Free => &FREE,
            PlanTier::Starter => &STARTER,
            PlanTier::Pro => &PRO,
            PlanTier::Enterprise => &ENTERPRISE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlanFeature {
    /// `custom` color schemes
    CustomColors,
    /// Header/footer motifs and page decorations
    DecorativeElements,
    StyleEnrichment,
    PaperTexture,
}

impl PlanFeature {
    pub fn as_str(self) -> &'static str {
        match self {
            PlanFeature::CustomColors => "custom colors",
            PlanFeature::DecorativeElements => "decorative elements",
            PlanFeature::StyleEnrichment => "style enrichment",
            PlanFeature::PaperTexture => "paper texture",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlanLimits {
    /// `None` means unlimited.
    pub max_books: Option<usize>,
    pub max_chapters: Option<usize>,
    pub formats: &'static [ExportFormat],
    pub features: &'static [PlanFeature],
}

const STARTER_FORMATS: &[ExportFormat] = &[
    ExportFormat::Pdf,
    ExportFormat::Html,
    ExportFormat::Markdown,
    ExportFormat::Text,
];

const ALL_FORMATS: &[ExportFormat] = &[
    ExportFormat::Pdf,
    ExportFormat::Html,
    ExportFormat::Epub,
    ExportFormat::Markdown,
    ExportFormat::Text,
];

static FREE: PlanLimits = PlanLimits {
    max_books: Some(3),
    max_chapters: Some(5),
    formats: &[ExportFormat::Pdf, ExportFormat::Text],
    features: &[],
};

static STARTER: PlanLimits = PlanLimits {
    max_books: Some(10),
    max_chapters: Some(20),
    formats: STARTER_FORMATS,
    features: &[PlanFeature::CustomColors, PlanFeature::DecorativeElements],
};

static PRO: PlanLimits = PlanLimits {
    max_books: Some(50),
    max_chapters: Some(50),
    formats: ALL_FORMATS,
    features: &[
        PlanFeature::CustomColors,
        PlanFeature::DecorativeElements,
        PlanFeature::StyleEnrichment,
        PlanFeature::PaperTexture,
    ],
};

static ENTERPRISE: PlanLimits = PlanLimits {
    max_books: None,
    max_chapters: None,
    formats: ALL_FORMATS,
    features: &[
        PlanFeature::CustomColors,
        PlanFeature::DecorativeElements,
        PlanFeature::StyleEnrichment,
        PlanFeature::PaperTexture,
    ],
};

fn under(limit: Option<usize>, current: usize) -> bool {
    limit.map_or(true, |max| current < max)
}

/// Whether a user who already owns `existing_books` may create another.
pub fn can_create_book(tier: PlanTier, existing_books: usize) -> bool {
    under(tier.limits().max_books, existing_books)
}

/// Whether a book that already has `existing_chapters` may get another.
pub fn can_add_chapter(tier: PlanTier, existing_chapters: usize) -> bool {
    under(tier.limits().max_chapters, existing_chapters)
}

pub fn can_export_in_format(tier: PlanTier, format: ExportFormat) -> bool {
    tier.limits().formats.contains(&format)
}

pub fn has_feature(tier: PlanTier, feature: PlanFeature) -> bool {
    tier.limits().features.contains(&feature)
}

fn denied(tier: PlanTier, message: String) -> ExportError {
    let upgrade = PlanTier::ALL
        .iter()
        .skip_while(|t| **t != tier)
        .nth(1)
        .map_or("enterprise", |t| t.as_str());
    ExportError::EntitlementError {
        message,
        suggestion: format!("Upgrade to the {} plan or change the export settings", upgrade),
    }
}

/// Checks that `tier` allows exporting `book` with `options` as `format`.
///
/// Only hard limits are errors here: the format, the chapter count and an explicit custom
/// color scheme. Decorative features are downgraded by [`restrict_options`] instead.
pub fn check_export(
    tier: PlanTier,
    book: &Book,
    options: &ExportOptions,
    format: ExportFormat,
) -> Result<(), ExportError> {
    if !can_export_in_format(tier, format) {
        return Err(denied(
            tier,
            format!(
                "the {} plan does not include {} export",
                tier.as_str(),
                format.as_str()
            ),
        ));
    }
    if let Some(max) = tier.limits().max_chapters {
        if book.chapters.len() > max {
            return Err(denied(
                tier,
                format!(
                    "the book has {} chapters but the {} plan allows {}",
                    book.chapters.len(),
                    tier.as_str(),
                    max
                ),
            ));
        }
    }
    if options.color_scheme == ColorScheme::Custom && !has_feature(tier, PlanFeature::CustomColors)
    {
        return Err(denied(
            tier,
            format!("custom colors are not part of the {} plan", tier.as_str()),
        ));
    }
    Ok(())
}

/// Turns off the optional features `tier` does not include.
pub fn restrict_options(tier: PlanTier, options: &ExportOptions) -> ExportOptions {
    let mut restricted = options.clone();
    if restricted.decorative_elements && !has_feature(tier, PlanFeature::DecorativeElements) {
        warn!(
            "Decorative elements are not part of the {} plan, disabling them",
            tier.as_str()
        );
        restricted.decorative_elements = false;
    }
    if restricted.paper_texture && !has_feature(tier, PlanFeature::PaperTexture) {
        warn!(
            "Paper texture is not part of the {} plan, disabling it",
            tier.as_str()
        );
        restricted.paper_texture = false;
    }
    restricted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::book::Chapter;

    fn book_with(chapters: usize) -> Book {
        let mut book = Book::new("Limits");
        for i in 0..chapters {
            book.chapters
                .push(Chapter::new(format!("C{}", i), "text", i as i64));
        }
        book
    }

    #[test]
    fn test_parse_tier() {
        assert_eq!(PlanTier::parse(" Pro "), Some(PlanTier::Pro));
        assert_eq!(PlanTier::parse("gold"), None);
        for tier in PlanTier::ALL {
            assert_eq!(PlanTier::parse(tier.as_str()), Some(tier));
        }
    }

    #[test]
    fn test_quota_predicates() {
        assert!(can_create_book(PlanTier::Free, 2));
        assert!(!can_create_book(PlanTier::Free, 3));
        assert!(can_add_chapter(PlanTier::Starter, 19));
        assert!(!can_add_chapter(PlanTier::Starter, 20));
        assert!(can_create_book(PlanTier::Enterprise, 10_000));
    }

    #[test]
    fn test_format_and_features() {
        assert!(can_export_in_format(PlanTier::Free, ExportFormat::Pdf));
        assert!(!can_export_in_format(PlanTier::Free, ExportFormat::Html));
        assert!(!can_export_in_format(PlanTier::Starter, ExportFormat::Epub));
        assert!(can_export_in_format(PlanTier::Pro, ExportFormat::Epub));
        assert!(has_feature(PlanTier::Pro, PlanFeature::PaperTexture));
        assert!(!has_feature(PlanTier::Starter, PlanFeature::StyleEnrichment));
    }

    #[test]
    fn test_check_export() {
        let options = ExportOptions::default();
        assert!(check_export(PlanTier::Free, &book_with(5), &options, ExportFormat::Pdf).is_ok());

        let err = check_export(PlanTier::Free, &book_with(6), &options, ExportFormat::Pdf);
        assert!(matches!(err, Err(ExportError::EntitlementError { .. })));

        let err = check_export(PlanTier::Free, &book_with(1), &options, ExportFormat::Html)
            .unwrap_err();
        assert!(err.to_string().contains("starter"));

        let err = check_export(PlanTier::Starter, &book_with(1), &options, ExportFormat::Epub)
            .unwrap_err();
        assert!(err.to_string().contains("Upgrade to the pro plan"));

        let custom = ExportOptions {
            color_scheme: ColorScheme::Custom,
            ..ExportOptions::default()
        };
        assert!(check_export(PlanTier::Free, &book_with(1), &custom, ExportFormat::Pdf).is_err());
        assert!(check_export(PlanTier::Starter, &book_with(1), &custom, ExportFormat::Pdf).is_ok());
    }

    #[test]
    fn test_restrict_options() {
        let options = ExportOptions {
            paper_texture: true,
            ..ExportOptions::default()
        };
        let free = restrict_options(PlanTier::Free, &options);
        assert!(!free.decorative_elements);
        assert!(!free.paper_texture);

        let starter = restrict_options(PlanTier::Starter, &options);
        assert!(starter.decorative_elements);
        assert!(!starter.paper_texture);

        assert_eq!(restrict_options(PlanTier::Enterprise, &options), options);
    }
}
