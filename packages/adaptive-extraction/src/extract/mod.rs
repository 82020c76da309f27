//! The extraction validator: applying a selector set to live HTML.
//!
//! Selectors come from stored recipes or straight from agent proposals, so
//! a selector that matches nothing, or does not parse at all, is a
//! normal, scoreable outcome, never an error. Failure to match yields a
//! 0.0 quality signal and the consensus engine takes it from there.

use scraper::{Html, Selector};
use sha2::{Digest, Sha256};

use crate::scoring::quality::score_fields;
use crate::types::config::QualityRubric;
use crate::types::quality::QualityScore;
use crate::types::recipe::SelectorSet;

/// Fields extracted from one page by one selector set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedFields {
    /// Article title, if the title selector matched
    pub title: Option<String>,

    /// Article body, if the body selector matched
    pub body: Option<String>,

    /// Publication date string as found in the page
    pub date: Option<String>,

    /// Hash over the extracted content, for change detection
    pub content_hash: String,
}

impl ExtractedFields {
    fn new(title: Option<String>, body: Option<String>, date: Option<String>) -> Self {
        let content_hash = content_hash(
            title.as_deref().unwrap_or(""),
            body.as_deref().unwrap_or(""),
            date.as_deref().unwrap_or(""),
        );
        Self {
            title,
            body,
            date,
            content_hash,
        }
    }

    /// Whether nothing at all was extracted.
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.body.is_none() && self.date.is_none()
    }
}

/// Calculate the content hash over extracted fields.
pub fn content_hash(title: &str, body: &str, date: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(title.as_bytes());
    hasher.update(b"\x1f");
    hasher.update(body.as_bytes());
    hasher.update(b"\x1f");
    hasher.update(date.as_bytes());
    hex::encode(hasher.finalize())
}

/// Apply a selector set to page HTML and score the result.
///
/// Returns the extracted fields and the normalized quality signal on
/// [0.0, 1.0]: the same rubric the quality gate uses, on the range the
/// consensus engine consumes. Selectors that match nothing at all yield
/// exactly 0.0: a well-formed URL must not lend credit to a recipe that
/// demonstrably extracts no content. Callers must pass the live HTML of
/// the current round; reusing an extraction from an earlier proposal step
/// would let the decision drift from the page.
pub fn apply(
    recipe: &SelectorSet,
    html: &str,
    url: &str,
    rubric: &QualityRubric,
) -> (ExtractedFields, f32) {
    let (fields, score) = apply_scored(recipe, html, url, rubric);
    let quality = if fields.is_empty() {
        0.0
    } else {
        score.normalized()
    };
    (fields, quality)
}

/// Apply a selector set and return the full 0-100 quality score, as the
/// quality gate consumes it.
pub fn apply_scored(
    recipe: &SelectorSet,
    html: &str,
    url: &str,
    rubric: &QualityRubric,
) -> (ExtractedFields, QualityScore) {
    let document = Html::parse_document(html);

    let title = select_first_text(&document, &recipe.title_selector);
    let body = select_joined_text(&document, &recipe.body_selector);
    let date = select_date(&document, &recipe.date_selector);

    let fields = ExtractedFields::new(title, body, date);
    let score = score_fields(
        fields.title.as_deref(),
        fields.body.as_deref(),
        fields.date.as_deref(),
        Some(url),
        rubric,
    );
    (fields, score)
}

/// Text of the first element matching the selector, or `None` when the
/// selector is invalid, matches nothing, or matches only whitespace.
fn select_first_text(document: &Html, selector: &str) -> Option<String> {
    let selector = Selector::parse(selector).ok()?;
    document
        .select(&selector)
        .next()
        .map(|el| normalize_text(el.text()))
        .filter(|t| !t.is_empty())
}

/// Concatenated text of every element matching the selector.
fn select_joined_text(document: &Html, selector: &str) -> Option<String> {
    let selector = Selector::parse(selector).ok()?;
    let joined = document
        .select(&selector)
        .map(|el| normalize_text(el.text()))
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join("\n");
    (!joined.is_empty()).then_some(joined)
}

/// Date text, preferring machine-readable attributes (`datetime` on
/// `<time>`, `content` on meta-ish elements) over the rendered text.
fn select_date(document: &Html, selector: &str) -> Option<String> {
    let selector = Selector::parse(selector).ok()?;
    let element = document.select(&selector).next()?;

    for attr in ["datetime", "content"] {
        if let Some(value) = element.value().attr(attr) {
            let value = value.trim();
            if !value.is_empty() {
                return Some(value.to_string());
            }
        }
    }

    let text = normalize_text(element.text());
    (!text.is_empty()).then_some(text)
}

/// Collapse runs of whitespace into single spaces.
fn normalize_text<'a>(parts: impl Iterator<Item = &'a str>) -> String {
    parts
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
        <html><body>
            <h1 class="headline">A headline of reasonable length</h1>
            <article><p>First paragraph of the body.</p>
            <p>Second paragraph with more words in it.</p></article>
            <time class="published" datetime="2024-03-01T09:00:00Z">March 1</time>
        </body></html>
    "#;

    fn recipe() -> SelectorSet {
        SelectorSet::new("example.com", "h1.headline", "article p", "time.published")
    }

    #[test]
    fn test_apply_extracts_all_fields() {
        let (fields, quality) = apply(
            &recipe(),
            PAGE,
            "https://example.com/news/1",
            &QualityRubric::default(),
        );
        assert_eq!(
            fields.title.as_deref(),
            Some("A headline of reasonable length")
        );
        assert!(fields.body.as_deref().unwrap().contains("Second paragraph"));
        assert_eq!(fields.date.as_deref(), Some("2024-03-01T09:00:00Z"));
        assert!(quality > 0.0);
    }

    #[test]
    fn test_no_match_scores_zero_not_error() {
        let miss = SelectorSet::new("example.com", ".nope", ".also-nope", ".still-nope");
        let (fields, quality) = apply(
            &miss,
            PAGE,
            "https://example.com/news/1",
            &QualityRubric::default(),
        );
        assert!(fields.title.is_none());
        assert!(fields.body.is_none());
        assert!(fields.date.is_none());
        assert_eq!(quality, 0.0);
    }

    #[test]
    fn test_invalid_selector_is_a_miss_not_a_panic() {
        let garbage = SelectorSet::new("example.com", ":::!!", "[unclosed", "div((");
        let (fields, _) = apply(
            &garbage,
            PAGE,
            "https://example.com/news/1",
            &QualityRubric::default(),
        );
        assert!(fields.is_empty());
    }

    #[test]
    fn test_date_prefers_datetime_attribute() {
        let (fields, _) = apply(
            &recipe(),
            PAGE,
            "https://example.com/news/1",
            &QualityRubric::default(),
        );
        assert_eq!(fields.date.as_deref(), Some("2024-03-01T09:00:00Z"));
    }

    #[test]
    fn test_content_hash_tracks_content() {
        let a = content_hash("t", "b", "d");
        let b = content_hash("t", "b", "d");
        let c = content_hash("t", "b2", "d");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_whitespace_normalization() {
        let html = "<h1 class=\"headline\">  spread \n  out   words </h1>";
        let doc = Html::parse_document(html);
        assert_eq!(
            select_first_text(&doc, "h1.headline").as_deref(),
            Some("spread out words")
        );
    }
}
