use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::schemas::ArticleInsight;

/// Raw news article as supplied by the caller
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Article {
    pub id: String,
    pub title: String,
    pub body: Option<String>,
    pub excerpt: Option<String>,
    pub published_at: DateTime<Utc>,
}

impl Article {
    /// Text to feed the model: body first, excerpt as fallback.
    /// `None` when neither carries usable content.
    pub fn usable_text(&self) -> Option<&str> {
        for candidate in [self.body.as_deref(), self.excerpt.as_deref()] {
            match candidate {
                Some(text) if !text.trim().is_empty() => return Some(text),
                _ => {}
            }
        }
        None
    }
}

/// OHLCV bar data
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceBar {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// Price bar with lookback features. Each derived field is `None` until its
/// full lookback window exists (1 / 24 / 168 / 24 preceding bars).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DerivedPriceBar {
    #[serde(flatten)]
    pub bar: PriceBar,
    pub pct_change_1h: Option<f64>,
    pub pct_change_24h: Option<f64>,
    pub pct_change_7d: Option<f64>,
    pub volatility_24h: Option<f64>,
}

/// Successful extraction for one article. `article_id` is unique among the
/// successes of a batch; `published_at` is carried forward for the merge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionRecord {
    pub article_id: String,
    pub title: String,
    pub published_at: DateTime<Utc>,
    #[serde(flatten)]
    pub insight: ArticleInsight,
}

/// Per-article failure surfaced instead of an `ExtractionRecord`. Reported to
/// the log sink and carried in the pipeline outcome, never silently dropped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionFailure {
    pub article_id: String,
    pub message: String,
}

/// One news record joined to the price bar sharing its hour.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergedRecord {
    pub merge_hour: DateTime<Utc>,
    pub news: ExtractionRecord,
    pub price: DerivedPriceBar,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn article(body: Option<&str>, excerpt: Option<&str>) -> Article {
        Article {
            id: "a1".to_string(),
            title: "Title".to_string(),
            body: body.map(String::from),
            excerpt: excerpt.map(String::from),
            published_at: Utc::now(),
        }
    }

    #[test]
    fn usable_text_prefers_body() {
        let a = article(Some("body text"), Some("excerpt text"));
        assert_eq!(a.usable_text(), Some("body text"));
    }

    #[test]
    fn usable_text_falls_back_to_excerpt() {
        let a = article(None, Some("excerpt text"));
        assert_eq!(a.usable_text(), Some("excerpt text"));

        let blank = article(Some("   "), Some("excerpt text"));
        assert_eq!(blank.usable_text(), Some("excerpt text"));
    }

    #[test]
    fn usable_text_none_when_empty() {
        assert!(article(None, None).usable_text().is_none());
        assert!(article(Some(""), Some("  ")).usable_text().is_none());
    }
}
