//! The two concrete toolsets the reasoning loop can be bound to.
//!
//! Tool identifiers are fixed enums; dispatch maps an identifier to a
//! handler that takes the bound dataset as an explicit parameter. Tools
//! ignore any free-text argument from the model and always operate on the
//! dataset their toolset was constructed with. Each handler makes one
//! schema-validated model call of its own.

use analysis_core::{
    CorrelationReport, ExtractionRecord, MarketInfluenceReport, MergedRecord, PositionDirective,
    SentimentReport, StructuredOutput, TopicTrendReport, TradingRecommendation,
};
use async_trait::async_trait;
use model_client::{invoke_structured, ModelError, ModelService};
use serde_json::json;
use thiserror::Error;

pub const NEWS_AGENT_SYSTEM: &str = "You are a quantitative crypto strategist whose \
analysis drives institutional investment decisions. Your insights create demonstrable \
alpha and edge.\n\n\
When analyzing Bitcoin news:\n\
1. PRIORITIZE SIGNAL OVER NOISE: identify statistically significant market-moving \
information, filter out market-neutral events, quantify information value in terms of \
trading edge.\n\
2. DELIVER ACTIONABLE INTELLIGENCE: provide specific price levels for entries and \
exits, include probability estimates for different scenarios, specify exact conditions \
that would trigger position adjustments.\n\
3. DIFFERENTIATE TIME HORIZONS: separate immediate, short-term and structural \
implications, with confirmation signals for each horizon.\n\n\
Your analysis must enable immediate trading decisions with quantifiable risk \
parameters. Vague recommendations are unacceptable.";

pub const RELATIONSHIP_AGENT_SYSTEM: &str = "You are a quantitative investment analyst \
specializing in extracting tradable edge from crypto market inefficiencies.\n\n\
When analyzing news-price relationships:\n\
1. IDENTIFY EXPLOITABLE PATTERNS: calculate statistical edge (win rate, expected \
value), measure persistence and decay of signal types, quantify overreaction and \
underreaction scenarios.\n\
2. DEVELOP AN IMPLEMENTATION FRAMEWORK: specify entry/exit methodology, position \
sizing with risk parameters, scenario-based adjustment triggers.\n\
3. DELIVER PORTFOLIO-LEVEL INSIGHTS: translate findings into allocation \
recommendations with portfolio-level risk metrics.\n\n\
Your recommendations must be specific enough to be programmatically implemented and \
backtested.";

#[derive(Error, Debug)]
pub enum ToolError {
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error(transparent)]
    Model(#[from] ModelError),
}

/// Name and description of one callable tool, rendered into the agent prompt.
#[derive(Debug, Clone, Copy)]
pub struct ToolSpec {
    pub name: &'static str,
    pub description: &'static str,
}

/// A fixed set of tools bound to one dataset.
#[async_trait]
pub trait Toolset: Send + Sync {
    fn specs(&self) -> &'static [ToolSpec];

    /// Execute the named tool. The model handle is passed in because every
    /// tool performs one structured model call of its own.
    async fn dispatch(
        &self,
        model: &dyn ModelService,
        tool: &str,
    ) -> Result<serde_json::Value, ToolError>;
}

fn to_observation<T: StructuredOutput>(report: &T) -> Result<serde_json::Value, ToolError> {
    serde_json::to_value(report).map_err(|e| ToolError::Model(ModelError::Serialization(e)))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NewsTool {
    Topics,
    Sentiment,
    MarketInfluence,
}

impl NewsTool {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "analyze_topics" => Some(NewsTool::Topics),
            "analyze_sentiment" => Some(NewsTool::Sentiment),
            "analyze_market_influence" => Some(NewsTool::MarketInfluence),
            _ => None,
        }
    }
}

/// Tools over the raw extraction corpus.
pub struct NewsToolset {
    records: Vec<ExtractionRecord>,
}

impl NewsToolset {
    pub fn new(records: Vec<ExtractionRecord>) -> Self {
        Self { records }
    }
}

#[async_trait]
impl Toolset for NewsToolset {
    fn specs(&self) -> &'static [ToolSpec] {
        &[
            ToolSpec {
                name: "analyze_topics",
                description: "Analyze trending topics across the analyzed articles",
            },
            ToolSpec {
                name: "analyze_sentiment",
                description: "Analyze overall sentiment across the analyzed articles",
            },
            ToolSpec {
                name: "analyze_market_influence",
                description: "Analyze how the news might influence the market",
            },
        ]
    }

    async fn dispatch(
        &self,
        model: &dyn ModelService,
        tool: &str,
    ) -> Result<serde_json::Value, ToolError> {
        let tool = NewsTool::from_name(tool)
            .ok_or_else(|| ToolError::UnknownTool(tool.to_string()))?;

        match tool {
            NewsTool::Topics => to_observation(&analyze_topics(model, &self.records).await?),
            NewsTool::Sentiment => {
                to_observation(&analyze_sentiment(model, &self.records).await?)
            }
            NewsTool::MarketInfluence => {
                to_observation(&analyze_market_influence(model, &self.records).await?)
            }
        }
    }
}

fn corpus_prompt(intro: &str, records: &[ExtractionRecord], asks: &str) -> String {
    let corpus = serde_json::to_string_pretty(records).unwrap_or_else(|_| "[]".to_string());
    format!("{intro}\n\n{corpus}\n\n{asks}")
}

/// Trending-topic analysis over the extracted corpus. Zero records short-
/// circuit to a defined empty-state report without a model call.
pub async fn analyze_topics(
    model: &dyn ModelService,
    records: &[ExtractionRecord],
) -> Result<TopicTrendReport, ModelError> {
    if records.is_empty() {
        return Ok(TopicTrendReport {
            trending_topics: vec![],
            topic_momentum: vec![],
            emerging_trends: vec![],
            fading_trends: vec![],
            counter_indicators: vec![],
            trend_summary: "No analyzed articles available.".to_string(),
        });
    }

    invoke_structured(
        model,
        NEWS_AGENT_SYSTEM,
        &corpus_prompt(
            "Analyze these Bitcoin news article analyses:",
            records,
            "Provide actionable trend intelligence:\n\
             1. Topic strength: rank by market impact potential with statistical confidence\n\
             2. Momentum indicators: rate of change for each trend\n\
             3. Counter-indicators: early warning signals that would invalidate trends\n\
             4. Actionable signals: specific entry/exit triggers based on trend evolution",
        ),
    )
    .await
}

/// Corpus-level sentiment analysis.
pub async fn analyze_sentiment(
    model: &dyn ModelService,
    records: &[ExtractionRecord],
) -> Result<SentimentReport, ModelError> {
    if records.is_empty() {
        return Ok(SentimentReport {
            overall_sentiment: "neutral".to_string(),
            sentiment_score: 50.0,
            sentiment_drivers: vec![],
            sentiment_trend: "stable".to_string(),
            sentiment_extremes: json!({}),
            conviction: 0.0,
            sentiment_summary: "No analyzed articles available.".to_string(),
        });
    }

    invoke_structured(
        model,
        NEWS_AGENT_SYSTEM,
        &corpus_prompt(
            "Based on these Bitcoin article analyses:",
            records,
            "Deliver precise sentiment intelligence:\n\
             1. Market sentiment score: calibrated 1-100 scale with statistical distribution\n\
             2. Sentiment-price divergence: identification of potential reversals\n\
             3. Sentiment extremes: statistical outliers suggesting contrarian opportunities\n\
             4. Conviction level: statistical confidence in the sentiment assessment",
        ),
    )
    .await
}

/// Market-influence analysis over the corpus.
pub async fn analyze_market_influence(
    model: &dyn ModelService,
    records: &[ExtractionRecord],
) -> Result<MarketInfluenceReport, ModelError> {
    if records.is_empty() {
        return Ok(MarketInfluenceReport {
            high_impact_topics: vec![],
            probability_assessment: json!({}),
            volatility_projection: json!({}),
            rumor_assessment: json!({}),
            market_drivers: vec![],
            catalytic_timeline: vec![],
        });
    }

    invoke_structured(
        model,
        NEWS_AGENT_SYSTEM,
        &corpus_prompt(
            "Analyze these Bitcoin news article analyses:",
            records,
            "Provide strategic market intelligence:\n\
             1. Impact hierarchy: factors ranked by market-moving potential\n\
             2. Probability assessment: likelihood estimates for different scenarios\n\
             3. Position management framework: entry, exit, sizing and hedging\n\
             4. Catalytic timeline: sequence and timing of expected market-moving events",
        ),
    )
    .await
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RelationshipTool {
    Correlation,
    TradingInsights,
}

impl RelationshipTool {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "analyze_price_news_correlation" => Some(RelationshipTool::Correlation),
            "generate_trading_insights" => Some(RelationshipTool::TradingInsights),
            _ => None,
        }
    }
}

/// Tools over the merged news-price dataset.
pub struct RelationshipToolset {
    records: Vec<MergedRecord>,
}

impl RelationshipToolset {
    pub fn new(records: Vec<MergedRecord>) -> Self {
        Self { records }
    }
}

#[async_trait]
impl Toolset for RelationshipToolset {
    fn specs(&self) -> &'static [ToolSpec] {
        &[
            ToolSpec {
                name: "analyze_price_news_correlation",
                description: "Analyze correlation between news and price movements",
            },
            ToolSpec {
                name: "generate_trading_insights",
                description: "Generate trading insights based on the news-price relationship",
            },
        ]
    }

    async fn dispatch(
        &self,
        model: &dyn ModelService,
        tool: &str,
    ) -> Result<serde_json::Value, ToolError> {
        let tool = RelationshipTool::from_name(tool)
            .ok_or_else(|| ToolError::UnknownTool(tool.to_string()))?;

        match tool {
            RelationshipTool::Correlation => {
                to_observation(&analyze_price_news_correlation(model, &self.records).await?)
            }
            RelationshipTool::TradingInsights => {
                to_observation(&generate_trading_insights(model, &self.records).await?)
            }
        }
    }
}

fn merged_prompt(records: &[MergedRecord], asks: &str) -> String {
    let data = serde_json::to_string_pretty(records).unwrap_or_else(|_| "[]".to_string());
    format!("Analyze these news-price relationships:\n\n{data}\n\n{asks}")
}

/// Statistical price-news correlation analysis. Empty merges (news and price
/// hours disjoint) return a defined empty-state report.
pub async fn analyze_price_news_correlation(
    model: &dyn ModelService,
    records: &[MergedRecord],
) -> Result<CorrelationReport, ModelError> {
    if records.is_empty() {
        return Ok(CorrelationReport {
            correlation_patterns: vec![],
            signal_lag_patterns: json!({}),
            topic_impacts: json!({}),
            sentiment_price_correlation: json!({}),
            false_signal_framework: json!({}),
            market_inefficiencies: vec![],
            predictive_factors: vec![],
            summary: "No merged news-price rows available.".to_string(),
        });
    }

    invoke_structured(
        model,
        RELATIONSHIP_AGENT_SYSTEM,
        &merged_prompt(
            records,
            "Deliver statistical market intelligence:\n\
             1. Correlation strength: R-values by news category with confidence intervals\n\
             2. Signal lag patterns: timeframes between news events and price reactions\n\
             3. Market inefficiency map: opportunities where news is consistently mispriced\n\
             4. Implementation framework: specific criteria for strategy execution",
        ),
    )
    .await
}

/// Trading recommendation derived from the merged dataset.
pub async fn generate_trading_insights(
    model: &dyn ModelService,
    records: &[MergedRecord],
) -> Result<TradingRecommendation, ModelError> {
    if records.is_empty() {
        return Ok(TradingRecommendation {
            position_directive: PositionDirective {
                action: "neutral".to_string(),
                confidence: 0.0,
            },
            key_signals: vec![],
            interpretation_guide: json!({}),
            priority_news_categories: vec![],
            rationale: "No merged news-price rows available.".to_string(),
        });
    }

    invoke_structured(
        model,
        RELATIONSHIP_AGENT_SYSTEM,
        &merged_prompt(
            records,
            "Provide institutional-grade recommendations:\n\
             1. Position directive: strong_buy/buy/neutral/sell/strong_sell with confidence\n\
             2. Scenario analysis: alternative outcomes with position adjustments\n\
             3. Performance benchmarks: metrics to evaluate strategy effectiveness",
        ),
    )
    .await
}
