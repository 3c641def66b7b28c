//! Batch entry point: wires price feature derivation, the extraction
//! pipeline, the hour-floor merge and the two agent-driven aggregation
//! stages together, and always hands a `BatchReport` back to the caller:
//! per-item failures and aborted agent runs are embedded in the report,
//! never thrown.

pub mod config;
pub mod stats;

pub use config::OrchestratorConfig;
pub use stats::CorpusStats;

use std::sync::Arc;

use analysis_agent::{
    Agent, AgentError, AgentOptions, AgentOutcome, AgentStep, NewsToolset, RelationshipToolset,
    NEWS_AGENT_SYSTEM, RELATIONSHIP_AGENT_SYSTEM,
};
use analysis_core::{Article, ExtractionFailure, ExtractionRecord, PriceBar};
use market_data::{derive_price_features, merge_news_price};
use model_client::{ModelService, OpenAiChatClient};
use news_extraction::ExtractionPipeline;

const NEWS_OBJECTIVE: &str = "Analyze the cryptocurrency news trends in this dataset. \
Identify main trends, overall market sentiment, and assess the potential impact on \
Bitcoin price.";

const RELATIONSHIP_OBJECTIVE: &str = "Analyze correlations between news sentiment and \
Bitcoin price movements. What patterns do you see? Finally, generate trading insights \
based on the correlation analysis.";

const INSUFFICIENT_DATA: &str =
    "Insufficient data: no articles were successfully analyzed in this batch.";

#[derive(Debug, Clone)]
pub struct BatchOptions {
    /// Number of articles (in published order) to analyze
    pub sample_size: usize,
    /// Keep agent transcripts in the report
    pub verbose: bool,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self { sample_size: 10, verbose: false }
    }
}

/// Everything one batch produced. Failure counts and messages ride along
/// instead of aborting the batch.
#[derive(Debug)]
pub struct BatchReport {
    pub records: Vec<ExtractionRecord>,
    pub failures: Vec<ExtractionFailure>,
    pub skipped: Vec<String>,
    pub merged_rows: usize,
    pub stats: CorpusStats,
    pub news_summary: String,
    pub relationship_summary: String,
    /// Populated only when `BatchOptions::verbose` is set
    pub news_transcript: Vec<AgentStep>,
    pub relationship_transcript: Vec<AgentStep>,
}

pub struct AnalysisOrchestrator {
    model: Arc<dyn ModelService>,
    pipeline_concurrency: Option<usize>,
    agent_options: AgentOptions,
}

impl AnalysisOrchestrator {
    pub fn new(model: Arc<dyn ModelService>) -> Self {
        Self {
            model,
            pipeline_concurrency: None,
            agent_options: AgentOptions::default(),
        }
    }

    /// Orchestrator backed by the configured chat-completions endpoint.
    pub fn from_config(config: &OrchestratorConfig) -> anyhow::Result<Self> {
        let client = OpenAiChatClient::new(config.model_config())?;
        let mut orchestrator = Self::new(Arc::new(client));
        if let Some(max_in_flight) = config.max_concurrency {
            orchestrator = orchestrator.with_pipeline_concurrency(max_in_flight);
        }
        Ok(orchestrator)
    }

    pub fn with_pipeline_concurrency(mut self, max_in_flight: usize) -> Self {
        self.pipeline_concurrency = Some(max_in_flight);
        self
    }

    pub fn with_agent_options(mut self, options: AgentOptions) -> Self {
        self.agent_options = options;
        self
    }

    fn pipeline(&self) -> ExtractionPipeline {
        match self.pipeline_concurrency {
            Some(n) => ExtractionPipeline::with_concurrency(Arc::clone(&self.model), n),
            None => ExtractionPipeline::new(Arc::clone(&self.model)),
        }
    }

    /// Run one complete batch. The two aggregation agents are independent
    /// and run concurrently once their inputs exist; either one aborting
    /// degrades only its own summary.
    pub async fn run_batch(
        &self,
        articles: &[Article],
        prices: &[PriceBar],
        options: BatchOptions,
    ) -> anyhow::Result<BatchReport> {
        let mut sample: Vec<Article> = articles.to_vec();
        sample.sort_by_key(|a| a.published_at);
        sample.truncate(options.sample_size);

        tracing::info!(
            sample = sample.len(),
            total = articles.len(),
            bars = prices.len(),
            "starting analysis batch"
        );

        let derived = derive_price_features(prices);
        let outcome = self.pipeline().run(&sample).await;

        if outcome.records.is_empty() {
            tracing::warn!("no successful extractions; returning insufficient-data report");
            return Ok(BatchReport {
                records: outcome.records,
                failures: outcome.failures,
                skipped: outcome.skipped,
                merged_rows: 0,
                stats: CorpusStats::default(),
                news_summary: INSUFFICIENT_DATA.to_string(),
                relationship_summary: INSUFFICIENT_DATA.to_string(),
                news_transcript: Vec::new(),
                relationship_transcript: Vec::new(),
            });
        }

        let merged = merge_news_price(&outcome.records, &derived);
        let stats = CorpusStats::from_records(&outcome.records);
        stats.log();

        let agent_options = AgentOptions {
            verbose: options.verbose,
            ..self.agent_options.clone()
        };

        let news_agent = Agent::new(
            Arc::clone(&self.model),
            NewsToolset::new(outcome.records.clone()),
            NEWS_AGENT_SYSTEM,
            agent_options.clone(),
        );
        let relationship_agent = Agent::new(
            Arc::clone(&self.model),
            RelationshipToolset::new(merged.clone()),
            RELATIONSHIP_AGENT_SYSTEM,
            agent_options,
        );

        let (news_result, relationship_result) = tokio::join!(
            news_agent.run(NEWS_OBJECTIVE),
            relationship_agent.run(RELATIONSHIP_OBJECTIVE),
        );

        let (news_summary, news_transcript) = summarize("news analysis", news_result);
        let (relationship_summary, relationship_transcript) =
            summarize("relationship analysis", relationship_result);

        tracing::info!(
            records = outcome.records.len(),
            merged = merged.len(),
            "analysis batch complete"
        );

        Ok(BatchReport {
            records: outcome.records,
            failures: outcome.failures,
            skipped: outcome.skipped,
            merged_rows: merged.len(),
            stats,
            news_summary,
            relationship_summary,
            news_transcript,
            relationship_transcript,
        })
    }
}

/// Turn an agent result into report text, keeping the partial transcript
/// from an exhausted loop so the caller can inspect what happened.
fn summarize(
    stage: &str,
    result: Result<AgentOutcome, AgentError>,
) -> (String, Vec<AgentStep>) {
    match result {
        Ok(outcome) => (outcome.answer, outcome.transcript),
        Err(AgentError::LoopExhausted { steps, transcript }) => {
            tracing::error!("{stage} aborted after {steps} steps");
            (
                format!("{stage} aborted: reasoning loop exhausted after {steps} steps"),
                transcript,
            )
        }
        Err(e) => {
            tracing::error!("{stage} unavailable: {e}");
            (format!("{stage} unavailable: {e}"), Vec::new())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::{Duration, TimeZone, Utc};
    use model_client::{ModelError, ModelResult};
    use serde_json::json;

    fn article(id: &str, hours: i64, body: Option<&str>) -> Article {
        Article {
            id: id.to_string(),
            title: format!("title {id}"),
            body: body.map(String::from),
            excerpt: None,
            published_at: Utc.with_ymd_and_hms(2024, 3, 1, 0, 30, 0).unwrap()
                + Duration::hours(hours),
        }
    }

    fn bars_covering(hours: i64) -> Vec<PriceBar> {
        let start = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        (0..hours)
            .map(|i| PriceBar {
                timestamp: start + Duration::hours(i),
                open: 100.0,
                high: 101.0,
                low: 99.0,
                close: 100.0 + i as f64,
                volume: 10.0,
            })
            .collect()
    }

    fn insight_json() -> String {
        json!({
            "sentiment": "positive",
            "sentiment_score": 0.5,
            "key_topics": ["etf"],
            "impact_potential": "medium",
            "expected_move_pct": {"min": 0.0, "max": 2.0},
            "impact_probability": 50.0,
            "time_horizon": "short",
            "key_entities": [],
            "credibility_score": 7.0,
            "rumors_speculation": false,
            "tech_focused": false,
            "regulatory_focused": false,
            "investment_advice": false,
            "catalytic_potential": 4.0,
            "trading_signal": {"action": "buy", "confidence": 60.0},
            "price_triggers": []
        })
        .to_string()
    }

    /// Answers extraction prompts with a valid insight and agent directive
    /// prompts with an immediate final answer.
    struct RoutingModel;

    #[async_trait]
    impl ModelService for RoutingModel {
        async fn complete(&self, _system: &str, user: &str) -> ModelResult<String> {
            if user.contains("Available tools:") {
                Ok(json!({
                    "thought": "enough data",
                    "final_answer": "summary of the batch"
                })
                .to_string())
            } else {
                Ok(insight_json())
            }
        }
    }

    struct FailingModel;

    #[async_trait]
    impl ModelService for FailingModel {
        async fn complete(&self, _system: &str, _user: &str) -> ModelResult<String> {
            Err(ModelError::ServiceUnavailable("Status: 503".to_string()))
        }
    }

    #[tokio::test]
    async fn batch_produces_records_merges_and_summaries() {
        let orchestrator = AnalysisOrchestrator::new(Arc::new(RoutingModel));

        // Three articles, one without text; price bars cover their hours
        let articles = vec![
            article("a1", 1, Some("body one")),
            article("a2", 2, None),
            article("a3", 3, Some("body three")),
        ];
        let report = orchestrator
            .run_batch(&articles, &bars_covering(6), BatchOptions::default())
            .await
            .unwrap();

        assert_eq!(report.records.len(), 2);
        assert_eq!(report.records[0].article_id, "a1");
        assert_eq!(report.records[1].article_id, "a3");
        assert_eq!(report.skipped, vec!["a2".to_string()]);
        assert!(report.failures.is_empty());
        assert_eq!(report.merged_rows, 2);
        assert_eq!(report.stats.article_count, 2);
        assert_eq!(report.news_summary, "summary of the batch");
        assert_eq!(report.relationship_summary, "summary of the batch");
    }

    #[tokio::test]
    async fn sample_size_caps_the_batch_in_published_order() {
        let orchestrator = AnalysisOrchestrator::new(Arc::new(RoutingModel));

        let articles = vec![
            article("late", 10, Some("body")),
            article("early", 1, Some("body")),
            article("mid", 5, Some("body")),
        ];
        let report = orchestrator
            .run_batch(
                &articles,
                &bars_covering(12),
                BatchOptions { sample_size: 2, verbose: false },
            )
            .await
            .unwrap();

        let ids: Vec<&str> = report.records.iter().map(|r| r.article_id.as_str()).collect();
        assert_eq!(ids, vec!["early", "mid"]);
    }

    #[tokio::test]
    async fn zero_successes_yields_insufficient_data_report() {
        let orchestrator = AnalysisOrchestrator::new(Arc::new(FailingModel));

        let articles = vec![article("a1", 1, Some("body"))];
        let report = orchestrator
            .run_batch(&articles, &bars_covering(3), BatchOptions::default())
            .await
            .unwrap();

        assert!(report.records.is_empty());
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.merged_rows, 0);
        assert_eq!(report.stats, CorpusStats::default());
        assert!(report.news_summary.contains("Insufficient data"));
        assert!(report.relationship_summary.contains("Insufficient data"));
    }

    #[tokio::test]
    async fn news_outside_price_range_still_returns_a_report() {
        let orchestrator = AnalysisOrchestrator::new(Arc::new(RoutingModel));

        // Articles a year after the price series ends: merge is empty but
        // the batch still completes with both summaries
        let articles = vec![article("a1", 24 * 365, Some("body"))];
        let report = orchestrator
            .run_batch(&articles, &bars_covering(3), BatchOptions::default())
            .await
            .unwrap();

        assert_eq!(report.records.len(), 1);
        assert_eq!(report.merged_rows, 0);
        assert_eq!(report.news_summary, "summary of the batch");
        assert_eq!(report.relationship_summary, "summary of the batch");
    }

    #[tokio::test]
    async fn verbose_batches_keep_agent_transcripts() {
        /// Calls one tool before finishing so the transcript is non-empty.
        struct ToolUsingModel;

        #[async_trait]
        impl ModelService for ToolUsingModel {
            async fn complete(&self, _system: &str, user: &str) -> ModelResult<String> {
                if !user.contains("Available tools:") {
                    return Ok(insight_json());
                }
                if user.contains("Steps taken so far:") {
                    Ok(json!({"final_answer": "done"}).to_string())
                } else if user.contains("analyze_topics") {
                    Ok(json!({"thought": "look at topics", "tool": "analyze_topics"}).to_string())
                } else {
                    Ok(json!({"tool": "generate_trading_insights"}).to_string())
                }
            }
        }

        let orchestrator = AnalysisOrchestrator::new(Arc::new(ToolUsingModel));
        let articles = vec![article("a1", 1, Some("body"))];
        let report = orchestrator
            .run_batch(
                &articles,
                &bars_covering(3),
                BatchOptions { sample_size: 10, verbose: true },
            )
            .await
            .unwrap();

        assert_eq!(report.news_transcript.len(), 1);
        assert_eq!(
            report.news_transcript[0].tool.as_deref(),
            Some("analyze_topics")
        );
        assert_eq!(report.relationship_transcript.len(), 1);
    }
}
