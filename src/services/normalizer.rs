//! Turns the model's raw answer into an [`AnalysisReport`].

use serde_json::Value;
use thiserror::Error;

use crate::domain::{AnalysisReport, ReportMetadata};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum NormalizeError {
    #[error("model response is not valid JSON: {0}")]
    InvalidJson(String),

    #[error("model response is JSON but not an object (found {0})")]
    NotAnObject(&'static str),
}

/// Parses the model output strictly and merges request metadata into it.
///
/// Every field of the model's object is kept as-is. Metadata keys
/// (`fileName`, `fileSize`, `fileType`, `analyzedAt`, `status`) win over
/// same-named model fields.
pub fn normalize(raw: &str, metadata: &ReportMetadata) -> Result<AnalysisReport, NormalizeError> {
    let parsed: Value =
        serde_json::from_str(raw).map_err(|e| NormalizeError::InvalidJson(e.to_string()))?;

    let mut body = match parsed {
        Value::Object(body) => body,
        other => return Err(NormalizeError::NotAnObject(json_kind(&other))),
    };

    metadata.merge_into(&mut body);
    Ok(AnalysisReport::from_body(body))
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
