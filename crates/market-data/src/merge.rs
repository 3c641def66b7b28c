//! Temporal alignment of news records with the hourly price series.
//!
//! Both sides are keyed by their timestamp floored to the hour and joined
//! with inner semantics: news outside the price series' range (and price
//! hours with no news) contribute nothing downstream. An empty merge is a
//! documented degenerate result, not an error.

use std::collections::HashMap;

use analysis_core::{DerivedPriceBar, ExtractionRecord, MergedRecord};
use chrono::{DateTime, DurationRound, TimeDelta, Utc};

/// Truncate a timestamp to its containing hour.
pub fn floor_to_hour(ts: DateTime<Utc>) -> DateTime<Utc> {
    // duration_trunc only fails for out-of-range durations; an hour is fine
    ts.duration_trunc(TimeDelta::hours(1)).unwrap_or(ts)
}

/// Inner join on the hour-floor key. News records sharing an hour fan out
/// against the same price bar and vice versa; output preserves news order.
pub fn merge_news_price(
    records: &[ExtractionRecord],
    bars: &[DerivedPriceBar],
) -> Vec<MergedRecord> {
    let mut bars_by_hour: HashMap<DateTime<Utc>, Vec<&DerivedPriceBar>> = HashMap::new();
    for bar in bars {
        bars_by_hour
            .entry(floor_to_hour(bar.bar.timestamp))
            .or_default()
            .push(bar);
    }

    let mut merged = Vec::new();
    for record in records {
        let merge_hour = floor_to_hour(record.published_at);
        let Some(matching) = bars_by_hour.get(&merge_hour) else {
            continue;
        };
        for bar in matching {
            merged.push(MergedRecord {
                merge_hour,
                news: record.clone(),
                price: (*bar).clone(),
            });
        }
    }

    if merged.is_empty() {
        tracing::warn!(
            news = records.len(),
            bars = bars.len(),
            "merge produced zero rows; news and price hours are disjoint"
        );
    }

    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use analysis_core::{ArticleInsight, PriceBar, StructuredOutput};
    use chrono::{TimeZone, Timelike};
    use serde_json::json;

    fn insight() -> ArticleInsight {
        let value: ArticleInsight = serde_json::from_value(json!({
            "sentiment": "neutral",
            "sentiment_score": 0.0,
            "key_topics": [],
            "impact_potential": "low",
            "expected_move_pct": {"min": 0.0, "max": 0.0},
            "impact_probability": 10.0,
            "time_horizon": "short",
            "key_entities": [],
            "credibility_score": 5.0,
            "rumors_speculation": false,
            "tech_focused": false,
            "regulatory_focused": false,
            "investment_advice": false,
            "catalytic_potential": 1.0,
            "trading_signal": {"action": "hold", "confidence": 50.0},
            "price_triggers": []
        }))
        .unwrap();
        value.validate().unwrap();
        value
    }

    fn record(id: &str, ts: DateTime<Utc>) -> ExtractionRecord {
        ExtractionRecord {
            article_id: id.to_string(),
            title: format!("article {id}"),
            published_at: ts,
            insight: insight(),
        }
    }

    fn bar(ts: DateTime<Utc>) -> DerivedPriceBar {
        DerivedPriceBar {
            bar: PriceBar {
                timestamp: ts,
                open: 100.0,
                high: 101.0,
                low: 99.0,
                close: 100.5,
                volume: 10.0,
            },
            pct_change_1h: None,
            pct_change_24h: None,
            pct_change_7d: None,
            volatility_24h: None,
        }
    }

    #[test]
    fn floor_to_hour_truncates_minutes_and_seconds() {
        let ts = Utc.with_ymd_and_hms(2024, 3, 1, 14, 37, 52).unwrap();
        let floored = floor_to_hour(ts);
        assert_eq!(floored.hour(), 14);
        assert_eq!(floored.minute(), 0);
        assert_eq!(floored.second(), 0);
    }

    #[test]
    fn floor_to_hour_is_idempotent() {
        let ts = Utc.with_ymd_and_hms(2024, 3, 1, 14, 37, 52).unwrap();
        assert_eq!(floor_to_hour(floor_to_hour(ts)), floor_to_hour(ts));
    }

    #[test]
    fn merge_joins_on_shared_hour() {
        let news_ts = Utc.with_ymd_and_hms(2024, 3, 1, 14, 25, 0).unwrap();
        let bar_ts = Utc.with_ymd_and_hms(2024, 3, 1, 14, 0, 0).unwrap();

        let merged = merge_news_price(&[record("a1", news_ts)], &[bar(bar_ts)]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].merge_hour, bar_ts);
        assert_eq!(merged[0].news.article_id, "a1");
    }

    #[test]
    fn merge_with_prefloored_series_matches_raw_series() {
        let news_ts = Utc.with_ymd_and_hms(2024, 3, 1, 14, 25, 0).unwrap();
        let bar_ts = Utc.with_ymd_and_hms(2024, 3, 1, 14, 59, 0).unwrap();
        let records = [record("a1", news_ts)];

        let raw = merge_news_price(&records, &[bar(bar_ts)]);
        let floored = merge_news_price(&records, &[bar(floor_to_hour(bar_ts))]);

        assert_eq!(raw.len(), 1);
        assert_eq!(raw.len(), floored.len());
        assert_eq!(raw[0].merge_hour, floored[0].merge_hour);
    }

    #[test]
    fn multiple_records_fan_out_to_one_bar() {
        let hour = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
        let records = [
            record("a1", hour + chrono::Duration::minutes(5)),
            record("a2", hour + chrono::Duration::minutes(40)),
        ];

        let merged = merge_news_price(&records, &[bar(hour)]);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].news.article_id, "a1");
        assert_eq!(merged[1].news.article_id, "a2");
    }

    #[test]
    fn disjoint_hours_merge_to_nothing() {
        let news_ts = Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap();
        let bar_ts = Utc.with_ymd_and_hms(2024, 6, 1, 8, 0, 0).unwrap();

        let merged = merge_news_price(&[record("a1", news_ts)], &[bar(bar_ts)]);
        assert!(merged.is_empty());
    }
}
