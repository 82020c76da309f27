//! The deterministic quality rubric.
//!
//! Pure scoring over extracted fields: no side effects, no failure modes
//! beyond missing inputs, which simply contribute zero for that field.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use url::Url;

use crate::types::config::QualityRubric;
use crate::types::quality::QualityScore;

/// Score extracted fields against the rubric, 0 to 100.
pub fn score_fields(
    title: Option<&str>,
    body: Option<&str>,
    date: Option<&str>,
    url: Option<&str>,
    rubric: &QualityRubric,
) -> QualityScore {
    QualityScore::new(
        title_points(title, rubric),
        body_points(body, rubric),
        date_points(date, rubric),
        url_points(url, rubric),
    )
}

fn title_points(title: Option<&str>, rubric: &QualityRubric) -> u8 {
    match title.map(str::trim) {
        Some(t) if t.chars().count() >= rubric.min_title_len => rubric.title_weight,
        Some(t) if !t.is_empty() => rubric.title_weight / 2,
        _ => 0,
    }
}

/// Graduated body credit: full above `body_full_len`, half at
/// `body_partial_len` climbing linearly to full, proportional below that.
fn body_points(body: Option<&str>, rubric: &QualityRubric) -> u8 {
    let len = match body.map(str::trim) {
        Some(b) if !b.is_empty() => b.chars().count(),
        _ => return 0,
    };

    let full = rubric.body_full_len.max(1);
    let partial = rubric.body_partial_len.min(full);
    let weight = f32::from(rubric.body_weight);

    let fraction = if len >= full {
        1.0
    } else if len >= partial {
        let span = (full - partial).max(1) as f32;
        0.5 + 0.5 * (len - partial) as f32 / span
    } else {
        0.5 * len as f32 / partial.max(1) as f32
    };

    (weight * fraction).round() as u8
}

fn date_points(date: Option<&str>, rubric: &QualityRubric) -> u8 {
    match date.map(str::trim) {
        Some(d) if parseable_date(d) => rubric.date_weight,
        _ => 0,
    }
}

fn url_points(url: Option<&str>, rubric: &QualityRubric) -> u8 {
    match url.map(str::trim) {
        Some(u) => match Url::parse(u) {
            Ok(parsed) if parsed.host_str().is_some() => rubric.url_weight,
            _ => 0,
        },
        None => 0,
    }
}

/// Whether a string parses as a date in any format sites commonly emit.
pub fn parseable_date(s: &str) -> bool {
    if DateTime::parse_from_rfc3339(s).is_ok() || DateTime::parse_from_rfc2822(s).is_ok() {
        return true;
    }

    const DATETIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"];
    if DATETIME_FORMATS
        .iter()
        .any(|f| NaiveDateTime::parse_from_str(s, f).is_ok())
    {
        return true;
    }

    const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%B %d, %Y", "%d %B %Y", "%b %d, %Y"];
    DATE_FORMATS
        .iter()
        .any(|f| NaiveDate::parse_from_str(s, f).is_ok())
}
