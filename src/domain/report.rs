//! Analysis report models.
//!
//! The report body is the model's JSON object kept verbatim, with request
//! metadata merged on top. Typed access goes through [`ReportDigest`], which
//! reads the body leniently and never changes it.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Project classification requested from the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectType {
    Arquitetonico,
    Eletrico,
    Hidraulico,
    Estrutural,
    Sanitario,
    Ppci,
    #[serde(other)]
    Desconhecido,
}

impl ProjectType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Arquitetonico => "arquitetonico",
            Self::Eletrico => "eletrico",
            Self::Hidraulico => "hidraulico",
            Self::Estrutural => "estrutural",
            Self::Sanitario => "sanitario",
            Self::Ppci => "ppci",
            Self::Desconhecido => "desconhecido",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Arquitetonico => "Arquitetônico",
            Self::Eletrico => "Elétrico",
            Self::Hidraulico => "Hidráulico",
            Self::Estrutural => "Estrutural",
            Self::Sanitario => "Sanitário",
            Self::Ppci => "PPCI",
            Self::Desconhecido => "Não identificado",
        }
    }
}

/// How a scale value was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScaleMethod {
    Manual,
    Ocr,
    Calculated,
}

/// Drawing scale `1:ratio`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scale {
    pub detected: bool,
    pub value: String,
    pub ratio: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<ScaleMethod>,
}

impl Scale {
    pub fn new(ratio: f64, detected: bool, method: ScaleMethod) -> Self {
        Self {
            detected,
            value: format!("1:{}", ratio),
            ratio,
            method: Some(method),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisStatus {
    Completed,
}

/// Request metadata appended to every report.
#[derive(Debug, Clone)]
pub struct ReportMetadata {
    pub file_name: String,
    pub file_size: u64,
    pub file_type: String,
    pub analyzed_at: DateTime<Utc>,
}

impl ReportMetadata {
    pub fn now(file_name: impl Into<String>, file_size: u64, file_type: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            file_size,
            file_type: file_type.into(),
            analyzed_at: Utc::now(),
        }
    }

    pub(crate) fn merge_into(&self, body: &mut Map<String, Value>) {
        body.insert("fileName".into(), Value::from(self.file_name.clone()));
        body.insert("fileSize".into(), Value::from(self.file_size));
        body.insert("fileType".into(), Value::from(self.file_type.clone()));
        body.insert(
            "analyzedAt".into(),
            Value::from(self.analyzed_at.to_rfc3339_opts(SecondsFormat::Millis, true)),
        );
        body.insert(
            "status".into(),
            serde_json::to_value(AnalysisStatus::Completed).unwrap_or(Value::Null),
        );
    }
}

/// Normalized report, serialized as a flat JSON object.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct AnalysisReport(Map<String, Value>);

impl AnalysisReport {
    pub(crate) fn from_body(body: Map<String, Value>) -> Self {
        Self(body)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn digest(&self) -> ReportDigest {
        ReportDigest::from_body(&self.0)
    }
}

/// Lenient typed summary of a report.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportDigest {
    pub project_type: ProjectType,
    pub scale: Option<Scale>,
    pub symbols: usize,
    pub areas: usize,
    pub walls: usize,
    pub electrical_points: usize,
    pub hydraulic_points: usize,
    pub structural_elements: usize,
    pub observations: usize,
    pub inconsistencies: usize,
    pub suggestions: usize,
}

impl ReportDigest {
    fn from_body(body: &Map<String, Value>) -> Self {
        let count = |key: &str| body.get(key).and_then(Value::as_array).map_or(0, Vec::len);

        Self {
            project_type: body
                .get("projectType")
                .and_then(|v| ProjectType::deserialize(v).ok())
                .unwrap_or(ProjectType::Desconhecido),
            scale: body.get("scale").and_then(|v| Scale::deserialize(v).ok()),
            symbols: count("symbols"),
            areas: count("areas"),
            walls: count("walls"),
            electrical_points: count("electricalPoints"),
            hydraulic_points: count("hydraulicPoints"),
            structural_elements: count("structuralElements"),
            observations: count("observations"),
            inconsistencies: count("inconsistencies"),
            suggestions: count("suggestions"),
        }
    }

    pub fn scale_detected(&self) -> bool {
        self.scale.as_ref().is_some_and(|s| s.detected)
    }
}

/// Stage of a single analysis request, used as a structured log field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisStage {
    Validating,
    BuildingPrompt,
    AwaitingUpstream,
    Normalizing,
    Completed,
    Failed,
}

impl fmt::Display for AnalysisStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Validating => "validating",
            Self::BuildingPrompt => "building-prompt",
            Self::AwaitingUpstream => "awaiting-upstream",
            Self::Normalizing => "normalizing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        })
    }
}

/// Download name for an exported report.
pub fn export_file_name(original_name: &str, epoch_millis: i64) -> String {
    let name = if original_name.trim().is_empty() {
        "projeto"
    } else {
        original_name
    };
    format!("analise_{}_{}.json", name, epoch_millis)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn unknown_project_type_falls_back() {
        let known: ProjectType = serde_json::from_value(json!("ppci")).unwrap();
        let other: ProjectType = serde_json::from_value(json!("paisagismo")).unwrap();
        assert_eq!(known, ProjectType::Ppci);
        assert_eq!(other, ProjectType::Desconhecido);
    }

    #[test]
    fn digest_reads_loosely_typed_body() {
        let body = json!({
            "projectType": "hidraulico",
            "scale": {"detected": true, "value": "1:75", "ratio": 75},
            "areas": [{"name": "Sala"}, {"name": "Cozinha"}],
            "hydraulicPoints": "not a list",
            "observations": ["a"]
        });
        let report = AnalysisReport::from_body(body.as_object().unwrap().clone());
        let digest = report.digest();

        assert_eq!(digest.project_type, ProjectType::Hidraulico);
        assert!(digest.scale_detected());
        assert_eq!(digest.scale.unwrap().ratio, 75.0);
        assert_eq!(digest.areas, 2);
        assert_eq!(digest.hydraulic_points, 0);
        assert_eq!(digest.observations, 1);
    }

    #[test]
    fn metadata_overwrites_same_named_keys() {
        let mut body = json!({"status": "draft", "fileName": "x"})
            .as_object()
            .unwrap()
            .clone();
        ReportMetadata::now("planta.png", 42, "image/png").merge_into(&mut body);

        assert_eq!(body["status"], "completed");
        assert_eq!(body["fileName"], "planta.png");
        assert_eq!(body["fileSize"], 42);
        assert!(body["analyzedAt"].as_str().unwrap().ends_with('Z'));
    }

    #[test]
    fn export_name_uses_original_or_default() {
        assert_eq!(
            export_file_name("planta.pdf", 1700000000000),
            "analise_planta.pdf_1700000000000.json"
        );
        assert_eq!(export_file_name("", 5), "analise_projeto_5.json");
    }
}
