//! Structured-output contracts for every model call.
//!
//! Each schema type describes its own fields so callers can embed a
//! field-by-field format instruction block in the prompt, then deserialize
//! and range-check the raw response before treating it as data.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::AnalysisError;

/// One field of a structured-output contract, rendered into the prompt.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub ty: &'static str,
    pub description: &'static str,
}

/// Contract for a schema the model must fill in.
pub trait StructuredOutput: DeserializeOwned + Serialize {
    const NAME: &'static str;

    fn fields() -> &'static [FieldSpec];

    /// Range/consistency checks beyond what deserialization enforces.
    fn validate(&self) -> Result<(), AnalysisError> {
        Ok(())
    }

    /// Prompt block describing the expected JSON object field by field.
    fn format_instructions() -> String {
        let mut out = format!(
            "Respond with a single JSON object (no surrounding prose, no markdown) \
             representing a {} with exactly these fields:\n",
            Self::NAME
        );
        for field in Self::fields() {
            out.push_str(&format!(
                "- \"{}\" ({}): {}\n",
                field.name, field.ty, field.description
            ));
        }
        out
    }
}

fn check_range(
    field: &'static str,
    value: f64,
    min: f64,
    max: f64,
) -> Result<(), AnalysisError> {
    if value.is_finite() && (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(AnalysisError::out_of_range(field, value, min, max))
    }
}

/// Article-level sentiment polarity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
}

impl Sentiment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sentiment::Positive => "positive",
            Sentiment::Negative => "negative",
            Sentiment::Neutral => "neutral",
        }
    }
}

/// Potential impact on price
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImpactPotential {
    High,
    Medium,
    Low,
    None,
}

/// Time horizon for expected impact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeHorizon {
    /// Hours
    Immediate,
    /// Days
    Short,
    /// Weeks
    Medium,
    /// Months
    Long,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalAction {
    Buy,
    Sell,
    Hold,
}

/// Expected price movement range in percent
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoveRange {
    pub min: f64,
    pub max: f64,
}

/// Entity mentioned in an article with its market influence capability
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityInfluence {
    pub name: String,
    /// 1 (marginal) to 10 (market-moving)
    pub influence: f64,
}

/// Buy/sell/hold call with confidence
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradingSignal {
    pub action: SignalAction,
    /// 0-100%
    pub confidence: f64,
}

/// Structured analysis of a single news article with actionable trading
/// signals. This is the per-article extraction contract.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArticleInsight {
    pub sentiment: Sentiment,
    pub sentiment_score: f64,
    pub key_topics: Vec<String>,
    pub impact_potential: ImpactPotential,
    pub expected_move_pct: MoveRange,
    pub impact_probability: f64,
    pub time_horizon: TimeHorizon,
    pub key_entities: Vec<EntityInfluence>,
    pub credibility_score: f64,
    pub rumors_speculation: bool,
    pub tech_focused: bool,
    pub regulatory_focused: bool,
    pub investment_advice: bool,
    pub catalytic_potential: f64,
    pub trading_signal: TradingSignal,
    pub price_triggers: Vec<serde_json::Value>,
}

impl StructuredOutput for ArticleInsight {
    const NAME: &'static str = "news article analysis";

    fn fields() -> &'static [FieldSpec] {
        &[
            FieldSpec { name: "sentiment", ty: "string", description: "Overall sentiment: \"positive\", \"negative\" or \"neutral\"" },
            FieldSpec { name: "sentiment_score", ty: "number", description: "Sentiment score from -1 (very negative) to 1 (very positive), with decimals" },
            FieldSpec { name: "key_topics", ty: "array of strings", description: "Main topics discussed in the article" },
            FieldSpec { name: "impact_potential", ty: "string", description: "Potential impact on Bitcoin price: \"high\", \"medium\", \"low\" or \"none\"" },
            FieldSpec { name: "expected_move_pct", ty: "object {min, max}", description: "Expected price movement range in percent" },
            FieldSpec { name: "impact_probability", ty: "number", description: "Probability (0-100) that this news moves the market" },
            FieldSpec { name: "time_horizon", ty: "string", description: "Horizon for expected impact: \"immediate\" (hours), \"short\" (days), \"medium\" (weeks) or \"long\" (months)" },
            FieldSpec { name: "key_entities", ty: "array of {name, influence}", description: "Key entities mentioned, ranked by market influence capability (1-10)" },
            FieldSpec { name: "credibility_score", ty: "number", description: "Evidence-based reliability score of the article (1-10)" },
            FieldSpec { name: "rumors_speculation", ty: "boolean", description: "Whether the article contains rumors or speculation" },
            FieldSpec { name: "tech_focused", ty: "boolean", description: "Whether the article focuses on technological aspects" },
            FieldSpec { name: "regulatory_focused", ty: "boolean", description: "Whether the article focuses on regulation" },
            FieldSpec { name: "investment_advice", ty: "boolean", description: "Whether the article gives investment advice" },
            FieldSpec { name: "catalytic_potential", ty: "number", description: "Potential to trigger broader market movements (0-10)" },
            FieldSpec { name: "trading_signal", ty: "object {action, confidence}", description: "Trading signal: action \"buy\"/\"sell\"/\"hold\" with confidence (0-100)" },
            FieldSpec { name: "price_triggers", ty: "array of objects", description: "Specific conditions that would activate a trading response" },
        ]
    }

    fn validate(&self) -> Result<(), AnalysisError> {
        check_range("sentiment_score", self.sentiment_score, -1.0, 1.0)?;
        check_range("impact_probability", self.impact_probability, 0.0, 100.0)?;
        check_range("credibility_score", self.credibility_score, 1.0, 10.0)?;
        check_range("catalytic_potential", self.catalytic_potential, 0.0, 10.0)?;
        check_range("trading_signal.confidence", self.trading_signal.confidence, 0.0, 100.0)?;
        for entity in &self.key_entities {
            check_range("key_entities.influence", entity.influence, 1.0, 10.0)?;
        }
        Ok(())
    }
}

/// Trending-topic analysis across the extracted corpus
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopicTrendReport {
    pub trending_topics: Vec<serde_json::Value>,
    pub topic_momentum: Vec<serde_json::Value>,
    pub emerging_trends: Vec<serde_json::Value>,
    pub fading_trends: Vec<serde_json::Value>,
    pub counter_indicators: Vec<serde_json::Value>,
    pub trend_summary: String,
}

impl StructuredOutput for TopicTrendReport {
    const NAME: &'static str = "topic trend report";

    fn fields() -> &'static [FieldSpec] {
        &[
            FieldSpec { name: "trending_topics", ty: "array of objects", description: "Trending topics with frequency, importance and market impact potential" },
            FieldSpec { name: "topic_momentum", ty: "array of objects", description: "Rate of change for each trend (acceleration/deceleration)" },
            FieldSpec { name: "emerging_trends", ty: "array of objects", description: "Emerging trends with growth rate and potential impact" },
            FieldSpec { name: "fading_trends", ty: "array of objects", description: "Trends losing relevance, with decay rate" },
            FieldSpec { name: "counter_indicators", ty: "array of objects", description: "Early warning signals that would invalidate each trend" },
            FieldSpec { name: "trend_summary", ty: "string", description: "Summary of the overall trend landscape" },
        ]
    }
}

/// Corpus-level sentiment analysis with trading implications
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SentimentReport {
    /// "bullish", "bearish" or "neutral"
    pub overall_sentiment: String,
    pub sentiment_score: f64,
    pub sentiment_drivers: Vec<serde_json::Value>,
    pub sentiment_trend: String,
    pub sentiment_extremes: serde_json::Value,
    pub conviction: f64,
    pub sentiment_summary: String,
}

impl StructuredOutput for SentimentReport {
    const NAME: &'static str = "market sentiment report";

    fn fields() -> &'static [FieldSpec] {
        &[
            FieldSpec { name: "overall_sentiment", ty: "string", description: "General market sentiment: \"bullish\", \"bearish\" or \"neutral\"" },
            FieldSpec { name: "sentiment_score", ty: "number", description: "Calibrated market sentiment score (1-100)" },
            FieldSpec { name: "sentiment_drivers", ty: "array of objects", description: "Key factors driving sentiment with weighted importance" },
            FieldSpec { name: "sentiment_trend", ty: "string", description: "Whether sentiment is improving, worsening or stable" },
            FieldSpec { name: "sentiment_extremes", ty: "object", description: "Statistical outliers suggesting contrarian opportunities" },
            FieldSpec { name: "conviction", ty: "number", description: "Statistical confidence in the sentiment assessment (0-100)" },
            FieldSpec { name: "sentiment_summary", ty: "string", description: "Summary of the sentiment analysis" },
        ]
    }

    fn validate(&self) -> Result<(), AnalysisError> {
        check_range("sentiment_score", self.sentiment_score, 1.0, 100.0)?;
        check_range("conviction", self.conviction, 0.0, 100.0)?;
        match self.overall_sentiment.as_str() {
            "bullish" | "bearish" | "neutral" => Ok(()),
            other => Err(AnalysisError::SchemaViolation {
                field: "overall_sentiment",
                reason: format!("unknown label '{other}'"),
            }),
        }
    }
}

/// Strategic market-influence analysis over the extracted corpus
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketInfluenceReport {
    pub high_impact_topics: Vec<serde_json::Value>,
    pub probability_assessment: serde_json::Value,
    pub volatility_projection: serde_json::Value,
    pub rumor_assessment: serde_json::Value,
    pub market_drivers: Vec<serde_json::Value>,
    pub catalytic_timeline: Vec<serde_json::Value>,
}

impl StructuredOutput for MarketInfluenceReport {
    const NAME: &'static str = "market influence report";

    fn fields() -> &'static [FieldSpec] {
        &[
            FieldSpec { name: "high_impact_topics", ty: "array of objects", description: "Topics likely to move Bitcoin price, with probability estimates" },
            FieldSpec { name: "probability_assessment", ty: "object", description: "Likelihood estimates for different market scenarios" },
            FieldSpec { name: "volatility_projection", ty: "object", description: "Expected price movement ranges with confidence intervals" },
            FieldSpec { name: "rumor_assessment", ty: "object", description: "Assessment of rumors with credibility and potential impact" },
            FieldSpec { name: "market_drivers", ty: "array of objects", description: "Key market drivers ranked by importance and reliability" },
            FieldSpec { name: "catalytic_timeline", ty: "array of objects", description: "Sequence and timing of expected market-moving events" },
        ]
    }
}

/// Quantitative price-news relationship analysis over the merged dataset
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorrelationReport {
    pub correlation_patterns: Vec<serde_json::Value>,
    pub signal_lag_patterns: serde_json::Value,
    pub topic_impacts: serde_json::Value,
    pub sentiment_price_correlation: serde_json::Value,
    pub false_signal_framework: serde_json::Value,
    pub market_inefficiencies: Vec<serde_json::Value>,
    pub predictive_factors: Vec<serde_json::Value>,
    pub summary: String,
}

impl StructuredOutput for CorrelationReport {
    const NAME: &'static str = "price-news correlation report";

    fn fields() -> &'static [FieldSpec] {
        &[
            FieldSpec { name: "correlation_patterns", ty: "array of objects", description: "Key correlation patterns with statistical significance (R-values)" },
            FieldSpec { name: "signal_lag_patterns", ty: "object", description: "Measurable timeframes between news events and price reactions" },
            FieldSpec { name: "topic_impacts", ty: "object", description: "Topic-specific price impacts with magnitude and probability" },
            FieldSpec { name: "sentiment_price_correlation", ty: "object", description: "News sentiment vs. price direction correlation with confidence intervals" },
            FieldSpec { name: "false_signal_framework", ty: "object", description: "Framework for distinguishing noise from actionable intelligence" },
            FieldSpec { name: "market_inefficiencies", ty: "array of objects", description: "Opportunities where news is consistently mispriced by the market" },
            FieldSpec { name: "predictive_factors", ty: "array of objects", description: "News factors most predictive of price movements" },
            FieldSpec { name: "summary", ty: "string", description: "Summary of the news-price relationship analysis" },
        ]
    }
}

/// Position directive with confidence
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionDirective {
    /// "strong_buy", "buy", "neutral", "sell" or "strong_sell"
    pub action: String,
    /// 0-100%
    pub confidence: f64,
}

/// Trading recommendation derived from the correlation analysis
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradingRecommendation {
    pub position_directive: PositionDirective,
    pub key_signals: Vec<serde_json::Value>,
    pub interpretation_guide: serde_json::Value,
    pub priority_news_categories: Vec<serde_json::Value>,
    pub rationale: String,
}

impl StructuredOutput for TradingRecommendation {
    const NAME: &'static str = "trading recommendation";

    fn fields() -> &'static [FieldSpec] {
        &[
            FieldSpec { name: "position_directive", ty: "object {action, confidence}", description: "Action \"strong_buy\"/\"buy\"/\"neutral\"/\"sell\"/\"strong_sell\" with confidence percentage" },
            FieldSpec { name: "key_signals", ty: "array of objects", description: "Signals to monitor with specific thresholds and importance" },
            FieldSpec { name: "interpretation_guide", ty: "object", description: "How to read different news types for trading decisions" },
            FieldSpec { name: "priority_news_categories", ty: "array of objects", description: "News categories to overweight, with thresholds" },
            FieldSpec { name: "rationale", ty: "string", description: "Supporting rationale for the recommendation" },
        ]
    }

    fn validate(&self) -> Result<(), AnalysisError> {
        check_range("position_directive.confidence", self.position_directive.confidence, 0.0, 100.0)?;
        match self.position_directive.action.as_str() {
            "strong_buy" | "buy" | "neutral" | "sell" | "strong_sell" => Ok(()),
            other => Err(AnalysisError::SchemaViolation {
                field: "position_directive.action",
                reason: format!("unknown action '{other}'"),
            }),
        }
    }
}
