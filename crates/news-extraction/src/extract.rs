//! Schema-validated extraction of one article.

use analysis_core::{Article, ArticleInsight, ExtractionFailure, ExtractionRecord};
use model_client::{invoke_structured, ModelService};

const EXTRACTION_SYSTEM_PROMPT: &str = "You are a professional crypto market strategist \
whose analysis is used by institutional investors managing billions in assets. Your \
assessments directly influence trading decisions.";

fn extraction_prompt(title: &str, content: &str) -> String {
    format!(
        "Analyze this Bitcoin article with precision:\n\n\
         Title: {title}\n\
         Content: {content}\n\n\
         Provide actionable intelligence including:\n\
         1. Sentiment: precise score from -1 to 1 with decimals\n\
         2. Price impact probability: specific % likelihood of market movement\n\
         3. Expected magnitude: estimated % range of price movement\n\
         4. Time horizon: specific timeframe (hours/days/weeks) for expected impact\n\
         5. Key entities: ranked by market influence capability\n\
         6. Credibility assessment: evidence-based reliability score (1-10)\n\
         7. Catalytic potential: ability to trigger broader market movements\n\
         8. Trading signal: clear buy/sell/hold recommendation with confidence level\n\n\
         For each assessment, include specific price levels, conditions, or triggers \
         that would activate a trading response."
    )
}

/// One extraction call: single prompt, single model invocation, schema
/// validation on the way out. Any failure (transport, malformed output,
/// out-of-range field) comes back as an `ExtractionFailure` carrying the
/// underlying message; the pipeline treats it as "no record produced".
pub async fn extract_article(
    model: &dyn ModelService,
    article: &Article,
    text: &str,
) -> Result<ExtractionRecord, ExtractionFailure> {
    let prompt = extraction_prompt(&article.title, text);

    let insight: ArticleInsight =
        invoke_structured(model, EXTRACTION_SYSTEM_PROMPT, &prompt)
            .await
            .map_err(|e| ExtractionFailure {
                article_id: article.id.clone(),
                message: e.to_string(),
            })?;

    Ok(ExtractionRecord {
        article_id: article.id.clone(),
        title: article.title.clone(),
        published_at: article.published_at,
        insight,
    })
}
