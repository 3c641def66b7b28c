//! Schema-validated model invocation.
//!
//! Every structured call follows the same shape: embed the target schema's
//! field-by-field format instructions in the prompt, make exactly one model
//! call, pull the JSON payload out of the raw completion, deserialize it and
//! run the schema's range checks.

use analysis_core::StructuredOutput;

use crate::error::{ModelError, ModelResult};
use crate::ModelService;

/// Locate the JSON object inside a raw completion. Models frequently wrap
/// the payload in a markdown fence or lead with prose; both are tolerated.
pub fn extract_json_payload(raw: &str) -> ModelResult<&str> {
    let trimmed = raw.trim();

    // Fenced block first: ```json ... ``` or bare ``` ... ```
    if let Some(fence_start) = trimmed.find("```") {
        let after = &trimmed[fence_start + 3..];
        let body_start = after.find('\n').map(|i| i + 1).unwrap_or(0);
        if let Some(fence_end) = after[body_start..].find("```") {
            let body = after[body_start..body_start + fence_end].trim();
            if !body.is_empty() {
                return Ok(body);
            }
        }
    }

    let start = trimmed.find('{');
    let end = trimmed.rfind('}');
    match (start, end) {
        (Some(start), Some(end)) if start < end => Ok(&trimmed[start..=end]),
        _ => Err(ModelError::MalformedResponse(format!(
            "no JSON object found in completion: {}",
            truncate_for_log(trimmed)
        ))),
    }
}

fn truncate_for_log(text: &str) -> String {
    const MAX: usize = 200;
    if text.len() <= MAX {
        text.to_string()
    } else {
        let cut = text
            .char_indices()
            .take_while(|(i, _)| *i < MAX)
            .last()
            .map(|(i, c)| i + c.len_utf8())
            .unwrap_or(0);
        format!("{}...", &text[..cut])
    }
}

/// One schema-validated call: prompt + format instructions in, validated
/// schema instance out. No retry on failure; the caller decides what a
/// failure means at its boundary.
pub async fn invoke_structured<T: StructuredOutput>(
    model: &dyn ModelService,
    system: &str,
    user: &str,
) -> ModelResult<T> {
    let prompt = format!("{user}\n\n{}", T::format_instructions());
    let raw = model.complete(system, &prompt).await?;

    let payload = extract_json_payload(&raw)?;
    let value: T = serde_json::from_str(payload).map_err(|e| {
        ModelError::MalformedResponse(format!(
            "{} did not match the {} schema: {e}",
            truncate_for_log(payload),
            T::NAME
        ))
    })?;
    value.validate()?;
    Ok(value)
}
