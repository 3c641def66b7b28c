use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Schema violation: field '{field}' {reason}")]
    SchemaViolation { field: &'static str, reason: String },

    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl AnalysisError {
    /// Shorthand for a numeric field outside its allowed range.
    pub fn out_of_range(field: &'static str, value: f64, min: f64, max: f64) -> Self {
        AnalysisError::SchemaViolation {
            field,
            reason: format!("value {value} outside [{min}, {max}]"),
        }
    }
}
