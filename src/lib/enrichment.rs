//! Best-effort style enrichment.
//!
//! An enricher proposes a [`StyleSuggestion`] for a book from its metadata and a content
//! sample. Enrichment is optional: [`enrich_or_degrade`] turns every failure (transport,
//! timeout, bad status, unparseable body) into `None`, and the style resolver then uses the
//! static category defaults. Failures are logged, never returned to the caller of an export.
//!
//! [`HttpEnricher`] (feature `fetch`) posts an [`EnrichmentRequest`] as JSON to a
//! configured endpoint and reads the suggestion from the JSON response.

use crate::book::Book;
use crate::options::ExportOptions;
use crate::style::StyleSuggestion;
use log::{debug, warn};
use serde::Serialize;
use std::error::Error;
use std::fmt;

/// Number of content characters sent along with a request.
pub const CONTENT_SAMPLE_CHARS: usize = 500;

/// Endpoint settings from the `[enrichment]` configuration section.
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichmentConfig {
    /// Suggestion endpoint. `None` disables enrichment.
    pub url: Option<String>,
    pub timeout_ms: u64,
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            url: None,
            timeout_ms: 3000,
        }
    }
}

/// What an enricher gets to look at.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrichmentRequest {
    pub title: String,
    pub category: Option<String>,
    pub book_type: Option<String>,
    pub description: Option<String>,
    /// The first [`CONTENT_SAMPLE_CHARS`] characters of the book's prose.
    pub content_sample: String,
    pub requested: RequestedOptions,
}

/// Summary of the options the user picked, so a service can stay consistent with them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RequestedOptions {
    pub page_size: String,
    pub font_family: Option<String>,
    pub color_scheme: String,
    pub decorative_elements: bool,
    pub drop_caps: bool,
}

impl EnrichmentRequest {
    pub fn new(book: &Book, options: &ExportOptions) -> Self {
        Self {
            title: book.display_title().to_string(),
            category: book.category.clone(),
            book_type: book.book_type.clone(),
            description: book.description.clone(),
            content_sample: book.content_sample(CONTENT_SAMPLE_CHARS),
            requested: RequestedOptions {
                page_size: options.page_size.as_str().to_string(),
                font_family: options.font_family.clone(),
                color_scheme: options.color_scheme.as_str().to_string(),
                decorative_elements: options.decorative_elements,
                drop_caps: options.drop_caps,
            },
        }
    }
}

/// Reasons an enrichment attempt produced nothing.
#[derive(Debug)]
pub enum EnrichmentError {
    /// No endpoint configured, or the `fetch` feature is off
    Disabled,
    /// The service did not answer within the timeout
    Timeout,
    /// Connection or protocol failure
    Transport(String),
    /// The service answered with a non-success HTTP status
    Status(u16),
    /// The response body was not usable JSON
    InvalidResponse(String),
}

impl Error for EnrichmentError {}

impl fmt::Display for EnrichmentError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            EnrichmentError::Disabled => write!(f, "style enrichment is disabled"),
            EnrichmentError::Timeout => write!(f, "style enrichment timed out"),
            EnrichmentError::Transport(msg) => write!(f, "style enrichment failed: {}", msg),
            EnrichmentError::Status(code) => {
                write!(f, "style enrichment service returned HTTP {}", code)
            }
            EnrichmentError::InvalidResponse(msg) => {
                write!(f, "style enrichment response was not valid JSON: {}", msg)
            }
        }
    }
}

/// Source of style suggestions.
pub trait StyleEnricher {
    fn suggest(&self, request: &EnrichmentRequest) -> Result<StyleSuggestion, EnrichmentError>;
}

/// Enricher that never has anything to say.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoEnrichment;

impl StyleEnricher for NoEnrichment {
    fn suggest(&self, _request: &EnrichmentRequest) -> Result<StyleSuggestion, EnrichmentError> {
        Err(EnrichmentError::Disabled)
    }
}

/// Runs the enricher and swallows its failure.
///
/// A suggestion that is returned but not well-formed is passed through anyway; the resolver
/// decides what to keep.
pub fn enrich_or_degrade(
    enricher: &dyn StyleEnricher,
    request: &EnrichmentRequest,
) -> Option<StyleSuggestion> {
    match enricher.suggest(request) {
        Ok(suggestion) => {
            if suggestion.is_well_formed() {
                debug!("Received style suggestion for '{}'", request.title);
            } else {
                warn!(
                    "Style suggestion for '{}' is incomplete, category defaults fill the gaps",
                    request.title
                );
            }
            Some(suggestion)
        }
        Err(EnrichmentError::Disabled) => {
            debug!("Style enrichment disabled, using category defaults");
            None
        }
        Err(e) => {
            warn!("{}; using category defaults", e);
            None
        }
    }
}

/// Enricher backed by an HTTP endpoint.
#[cfg(feature = "fetch")]
pub struct HttpEnricher {
    url: String,
    client: reqwest::blocking::Client,
}

#[cfg(feature = "fetch")]
impl HttpEnricher {
    pub fn new(url: impl Into<String>, timeout_ms: u64) -> Result<Self, EnrichmentError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_millis(timeout_ms))
            .build()
            .map_err(|e| EnrichmentError::Transport(e.to_string()))?;
        Ok(Self {
            url: url.into(),
            client,
        })
    }

    /// Builds an enricher from configuration. `None` when no URL is set.
    pub fn from_config(config: &EnrichmentConfig) -> Option<Result<Self, EnrichmentError>> {
        config
            .url
            .as_deref()
            .map(|url| Self::new(url, config.timeout_ms))
    }
}

#[cfg(feature = "fetch")]
impl StyleEnricher for HttpEnricher {
    fn suggest(&self, request: &EnrichmentRequest) -> Result<StyleSuggestion, EnrichmentError> {
        debug!("Requesting style suggestion from {}", self.url);
        let response = self
            .client
            .post(&self.url)
            .json(request)
            .send()
            .map_err(|e| {
                if e.is_timeout() {
                    EnrichmentError::Timeout
                } else {
                    EnrichmentError::Transport(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(EnrichmentError::Status(status.as_u16()));
        }

        let body: serde_json::Value = response
            .json()
            .map_err(|e| EnrichmentError::InvalidResponse(e.to_string()))?;
        Ok(StyleSuggestion::from_json(&body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::book::Chapter;

    struct Fixed(Option<StyleSuggestion>);

    impl StyleEnricher for Fixed {
        fn suggest(&self, _: &EnrichmentRequest) -> Result<StyleSuggestion, EnrichmentError> {
            self.0.clone().ok_or(EnrichmentError::Timeout)
        }
    }

    fn sample_book() -> Book {
        let mut book = Book::new("Tides");
        book.category = Some("poetry".to_string());
        book.chapters = vec![Chapter::new("One", "x".repeat(800), 1)];
        book
    }

    #[test]
    fn test_request_carries_bounded_sample() {
        let request = EnrichmentRequest::new(&sample_book(), &ExportOptions::default());
        assert_eq!(request.content_sample.chars().count(), CONTENT_SAMPLE_CHARS);
        assert_eq!(request.category.as_deref(), Some("poetry"));
        assert_eq!(request.requested.page_size, "a5");

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["title"], "Tides");
    }

    #[test]
    fn test_failures_degrade_to_none() {
        let request = EnrichmentRequest::new(&sample_book(), &ExportOptions::default());
        assert!(enrich_or_degrade(&Fixed(None), &request).is_none());
        assert!(enrich_or_degrade(&NoEnrichment, &request).is_none());

        let suggestion = StyleSuggestion {
            color_scheme: Some("#000,#fff,#f00".to_string()),
            ..Default::default()
        };
        assert_eq!(
            enrich_or_degrade(&Fixed(Some(suggestion.clone())), &request),
            Some(suggestion)
        );
    }

    #[cfg(feature = "fetch")]
    #[test]
    fn test_unreachable_endpoint_degrades() {
        // Port 9 (discard) on localhost is not expected to speak HTTP.
        let enricher = HttpEnricher::new("http://127.0.0.1:9/style", 200).unwrap();
        let request = EnrichmentRequest::new(&sample_book(), &ExportOptions::default());
        assert!(enrich_or_degrade(&enricher, &request).is_none());
    }

    #[test]
    fn test_config_without_url_is_disabled() {
        let config = EnrichmentConfig::default();
        assert!(config.url.is_none());
        #[cfg(feature = "fetch")]
        assert!(HttpEnricher::from_config(&config).is_none());
    }
}
