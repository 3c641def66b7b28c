//! Descriptive statistics over the analyzed corpus, logged at the end of a
//! batch and returned to the caller for display layers to consume.

use analysis_core::{ExtractionRecord, Sentiment};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CorpusStats {
    pub article_count: usize,
    pub mean_sentiment_score: f64,
    pub positive: usize,
    pub neutral: usize,
    pub negative: usize,
    pub tech_focused: usize,
    pub regulatory_focused: usize,
    pub investment_advice: usize,
    pub rumors_speculation: usize,
}

impl CorpusStats {
    pub fn from_records(records: &[ExtractionRecord]) -> Self {
        if records.is_empty() {
            return Self::default();
        }

        let mut stats = Self {
            article_count: records.len(),
            ..Self::default()
        };

        let mut score_sum = 0.0;
        for record in records {
            let insight = &record.insight;
            score_sum += insight.sentiment_score;
            match insight.sentiment {
                Sentiment::Positive => stats.positive += 1,
                Sentiment::Neutral => stats.neutral += 1,
                Sentiment::Negative => stats.negative += 1,
            }
            stats.tech_focused += insight.tech_focused as usize;
            stats.regulatory_focused += insight.regulatory_focused as usize;
            stats.investment_advice += insight.investment_advice as usize;
            stats.rumors_speculation += insight.rumors_speculation as usize;
        }
        stats.mean_sentiment_score = score_sum / records.len() as f64;

        stats
    }

    fn pct(&self, count: usize) -> f64 {
        if self.article_count == 0 {
            0.0
        } else {
            count as f64 / self.article_count as f64 * 100.0
        }
    }

    pub fn log(&self) {
        tracing::info!("Sentiment statistics:");
        tracing::info!("  Average sentiment score: {:.3}", self.mean_sentiment_score);
        tracing::info!(
            "  Positive articles: {} ({:.1}%)",
            self.positive,
            self.pct(self.positive)
        );
        tracing::info!(
            "  Neutral articles: {} ({:.1}%)",
            self.neutral,
            self.pct(self.neutral)
        );
        tracing::info!(
            "  Negative articles: {} ({:.1}%)",
            self.negative,
            self.pct(self.negative)
        );
        tracing::info!("Article categories:");
        tracing::info!(
            "  Tech-focused: {} ({:.1}%)",
            self.tech_focused,
            self.pct(self.tech_focused)
        );
        tracing::info!(
            "  Regulatory-focused: {} ({:.1}%)",
            self.regulatory_focused,
            self.pct(self.regulatory_focused)
        );
        tracing::info!(
            "  With investment advice: {} ({:.1}%)",
            self.investment_advice,
            self.pct(self.investment_advice)
        );
        tracing::info!(
            "  With rumors/speculation: {} ({:.1}%)",
            self.rumors_speculation,
            self.pct(self.rumors_speculation)
        );
    }
}
