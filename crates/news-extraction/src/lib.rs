//! Concurrent per-article extraction pipeline.
//!
//! Fans one model call out per article under a concurrency bound, validates
//! each response against the extraction schema, and fans back in without
//! losing input order among the successes. A per-article failure never
//! aborts sibling work; it is logged and carried in the outcome.

pub mod extract;

pub use extract::extract_article;

use std::sync::Arc;

use analysis_core::{Article, ExtractionFailure, ExtractionRecord};
use model_client::ModelService;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Everything the pipeline produced for one batch. `records` preserves the
/// input order of the surviving articles; `failures` is never silently
/// dropped but is excluded from downstream aggregation.
#[derive(Debug, Default)]
pub struct ExtractionOutcome {
    pub records: Vec<ExtractionRecord>,
    pub failures: Vec<ExtractionFailure>,
    /// Ids of articles skipped without a model call (no usable text)
    pub skipped: Vec<String>,
}

pub struct ExtractionPipeline {
    model: Arc<dyn ModelService>,
    max_in_flight: usize,
}

impl ExtractionPipeline {
    /// Concurrency defaults to the number of available execution units.
    pub fn new(model: Arc<dyn ModelService>) -> Self {
        let parallelism = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(4);
        Self::with_concurrency(model, parallelism)
    }

    pub fn with_concurrency(model: Arc<dyn ModelService>, max_in_flight: usize) -> Self {
        Self {
            model,
            max_in_flight: max_in_flight.max(1),
        }
    }

    /// Run the batch to completion. Returns only after every spawned unit has
    /// resolved; there is no early exit on failure.
    pub async fn run(&self, articles: &[Article]) -> ExtractionOutcome {
        let semaphore = Arc::new(Semaphore::new(self.max_in_flight));
        let mut tasks = JoinSet::new();
        let mut outcome = ExtractionOutcome::default();

        for (idx, article) in articles.iter().enumerate() {
            let Some(text) = article.usable_text() else {
                tracing::info!(article_id = %article.id, "skipping article with no usable text");
                outcome.skipped.push(article.id.clone());
                continue;
            };

            let model = Arc::clone(&self.model);
            let semaphore = Arc::clone(&semaphore);
            let article = article.clone();
            let text = text.to_string();

            tasks.spawn(async move {
                // Semaphore holders only ever drop their permit, so acquire
                // cannot see a closed semaphore here
                let _permit = semaphore.acquire().await.ok();
                let result = extract_article(model.as_ref(), &article, &text).await;
                (idx, result)
            });
        }

        let mut resolved: Vec<(usize, Result<ExtractionRecord, ExtractionFailure>)> =
            Vec::with_capacity(tasks.len());

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(entry) => resolved.push(entry),
                Err(e) => tracing::error!("extraction task panicked: {e}"),
            }
        }

        // Fan-in: completion order is arbitrary, output order is input order
        resolved.sort_by_key(|(idx, _)| *idx);

        for (_, result) in resolved {
            match result {
                Ok(record) => outcome.records.push(record),
                Err(failure) => {
                    tracing::warn!(
                        article_id = %failure.article_id,
                        "extraction failed: {}",
                        failure.message
                    );
                    outcome.failures.push(failure);
                }
            }
        }

        tracing::info!(
            analyzed = outcome.records.len(),
            failed = outcome.failures.len(),
            skipped = outcome.skipped.len(),
            total = articles.len(),
            "extraction batch complete"
        );

        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::{Duration, TimeZone, Utc};
    use model_client::{ModelError, ModelResult};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn insight_response(score: f64) -> String {
        format!(
            r#"{{
                "sentiment": "positive",
                "sentiment_score": {score},
                "key_topics": ["etf"],
                "impact_potential": "medium",
                "expected_move_pct": {{"min": 0.0, "max": 2.0}},
                "impact_probability": 40.0,
                "time_horizon": "short",
                "key_entities": [],
                "credibility_score": 7.0,
                "rumors_speculation": false,
                "tech_focused": true,
                "regulatory_focused": false,
                "investment_advice": false,
                "catalytic_potential": 3.0,
                "trading_signal": {{"action": "hold", "confidence": 55.0}},
                "price_triggers": []
            }}"#
        )
    }

    fn article(id: &str, body: Option<&str>) -> Article {
        Article {
            id: id.to_string(),
            title: format!("title {id}"),
            body: body.map(String::from),
            excerpt: None,
            published_at: Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
                + Duration::hours(id.len() as i64),
        }
    }

    /// Returns a valid insight unless the prompt mentions a poisoned title.
    struct ScriptedModel {
        poison: Option<String>,
        calls: AtomicUsize,
    }

    impl ScriptedModel {
        fn healthy() -> Self {
            Self { poison: None, calls: AtomicUsize::new(0) }
        }

        fn poisoned(title_fragment: &str) -> Self {
            Self {
                poison: Some(title_fragment.to_string()),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl ModelService for ScriptedModel {
        async fn complete(&self, _system: &str, user: &str) -> ModelResult<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(poison) = &self.poison {
                if user.contains(poison.as_str()) {
                    return Err(ModelError::ServiceUnavailable("Status: 500".to_string()));
                }
            }
            Ok(insight_response(0.4))
        }
    }

    #[tokio::test]
    async fn successes_preserve_input_order() {
        let model = Arc::new(ScriptedModel::healthy());
        let pipeline = ExtractionPipeline::with_concurrency(model, 8);

        let articles: Vec<Article> = (0..12)
            .map(|i| article(&format!("a{i:02}"), Some("body")))
            .collect();

        let outcome = pipeline.run(&articles).await;
        assert_eq!(outcome.records.len(), 12);
        assert!(outcome.failures.is_empty());

        let ids: Vec<&str> = outcome.records.iter().map(|r| r.article_id.as_str()).collect();
        let expected: Vec<String> = (0..12).map(|i| format!("a{i:02}")).collect();
        assert_eq!(ids, expected.iter().map(String::as_str).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn one_failure_does_not_abort_siblings() {
        let model = Arc::new(ScriptedModel::poisoned("title bad"));
        let pipeline = ExtractionPipeline::with_concurrency(model, 4);

        let articles = vec![
            article("ok1", Some("body")),
            article("bad", Some("body")),
            article("ok2", Some("body")),
        ];

        let outcome = pipeline.run(&articles).await;
        assert_eq!(outcome.records.len(), 2);
        assert_eq!(outcome.records[0].article_id, "ok1");
        assert_eq!(outcome.records[1].article_id, "ok2");
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].article_id, "bad");
        assert!(outcome.failures[0].message.contains("Status: 500"));
    }

    #[tokio::test]
    async fn textless_article_skipped_without_model_call() {
        let model = Arc::new(ScriptedModel::healthy());
        let pipeline = ExtractionPipeline::with_concurrency(Arc::clone(&model) as Arc<dyn ModelService>, 4);

        let articles = vec![
            article("a1", Some("body")),
            article("empty", None),
            article("a2", Some("body")),
        ];

        let outcome = pipeline.run(&articles).await;
        assert_eq!(outcome.records.len(), 2);
        assert!(outcome.failures.is_empty());
        assert_eq!(outcome.skipped, vec!["empty".to_string()]);
        // Only the two articles with text reached the model
        assert_eq!(model.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn malformed_model_output_becomes_failure() {
        struct GarbageModel;

        #[async_trait]
        impl ModelService for GarbageModel {
            async fn complete(&self, _system: &str, _user: &str) -> ModelResult<String> {
                Ok("the market seems fine to me".to_string())
            }
        }

        let pipeline = ExtractionPipeline::with_concurrency(Arc::new(GarbageModel), 2);
        let outcome = pipeline.run(&[article("a1", Some("body"))]).await;

        assert!(outcome.records.is_empty());
        assert_eq!(outcome.failures.len(), 1);
        assert!(outcome.failures[0].message.contains("no JSON object"));
    }
}
