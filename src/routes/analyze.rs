use axum::{
    extract::{
        multipart::{Field, MultipartError, MultipartRejection},
        Multipart, Query, State,
    },
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use std::sync::Arc;
use tracing::Instrument;

use crate::app::AppState;
use crate::domain::{
    export_file_name, AnalysisReport, AnalysisStage, MediaKind, ReportMetadata, SymbolDraft,
    UploadLimits, UploadPolicy, UploadedFile, ValidationError,
};
use crate::error::{ApiError, ApiResult};
use crate::middleware::request_id;
use crate::services::heuristics::review_consistency;
use crate::services::pdf::extract_text_blocking;
use crate::services::{normalize, PromptInput, UserSymbolStore};

const FILE_FIELD: &str = "file";
const CUSTOM_SYMBOLS_FIELD: &str = "customSymbols";

#[derive(Debug, Default, Deserialize)]
pub struct AnalyzeParams {
    /// Return the report as a downloadable attachment.
    #[serde(default)]
    pub download: bool,
}

/// Analyze an uploaded drawing
pub async fn analyze_drawing(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(params): Query<AnalyzeParams>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<Response> {
    let span = tracing::info_span!("analysis", request_id = %request_id(&headers));
    let declared_length = headers
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok());

    let report = async {
        let result = run_analysis(&state, multipart, declared_length).await;
        if let Err(e) = &result {
            tracing::warn!(stage = %AnalysisStage::Failed, error = %e, "Analysis aborted");
        }
        result
    }
    .instrument(span)
    .await?;

    if params.download {
        return download_response(&report);
    }

    Ok(Json(report).into_response())
}

/// Published upload rules
pub async fn upload_limits(State(state): State<Arc<AppState>>) -> Json<UploadLimits> {
    Json(state.upload_policy.limits())
}

async fn run_analysis(
    state: &AppState,
    multipart: Result<Multipart, MultipartRejection>,
    declared_length: Option<u64>,
) -> ApiResult<AnalysisReport> {
    tracing::info!(stage = %AnalysisStage::Validating, "Reading upload");

    let multipart = multipart.map_err(|rejection| {
        ApiError::bad_request(format!(
            "Envie o arquivo como multipart/form-data: {}",
            rejection.body_text()
        ))
    })?;

    let reader = FormReader {
        policy: &state.upload_policy,
        body_limit: state.body_limit_bytes() as u64,
        declared_length,
    };
    let form = reader.read(multipart).await?;
    let mut file = form.file.ok_or(ValidationError::MissingFile)?;

    tracing::info!(
        stage = %AnalysisStage::BuildingPrompt,
        file_name = %file.name,
        file_type = %file.declared_media_type,
        file_size = file.size_bytes,
        custom_symbols = form.custom_symbols.len(),
        "Upload accepted"
    );

    let symbols = form.custom_symbols.combined_with_catalog();
    let prompt = match file.kind {
        MediaKind::Pdf => {
            let pdf = extract_text_blocking(std::mem::take(&mut file.content)).await?;
            tracing::debug!(pages = pdf.num_pages, "PDF text extracted");
            state.prompt_builder.build(
                &PromptInput::PdfText {
                    text: &pdf.text,
                    num_pages: pdf.num_pages,
                    file_name: &file.name,
                },
                &symbols,
            )
        }
        MediaKind::Image => {
            let media_type = file.declared_media_type.trim().to_ascii_lowercase();
            state.prompt_builder.build(
                &PromptInput::Image {
                    media_type: &media_type,
                    bytes: &file.content,
                },
                &symbols,
            )
        }
    };

    tracing::info!(
        stage = %AnalysisStage::AwaitingUpstream,
        prompt_chars = prompt.text.chars().count(),
        with_image = prompt.image.is_some(),
        "Calling model"
    );
    let raw = state.gateway.complete(&prompt).await?;

    tracing::info!(stage = %AnalysisStage::Normalizing, response_chars = raw.len(), "Model answered");
    let metadata = ReportMetadata::now(
        file.name.clone(),
        file.size_bytes,
        file.declared_media_type.clone(),
    );
    let report = normalize(&raw, &metadata)?;

    let digest = report.digest();
    for warning in review_consistency(&digest) {
        tracing::warn!(file_name = %file.name, "{}", warning);
    }
    tracing::info!(
        stage = %AnalysisStage::Completed,
        project_type = digest.project_type.as_str(),
        scale_detected = digest.scale_detected(),
        symbols = digest.symbols,
        areas = digest.areas,
        "Analysis completed"
    );

    Ok(report)
}

struct AnalyzeForm {
    file: Option<UploadedFile>,
    custom_symbols: UserSymbolStore,
}

/// Reads the analyze form under the upload limits.
struct FormReader<'a> {
    policy: &'a UploadPolicy,
    body_limit: u64,
    /// Request `Content-Length`, when the client sent one.
    declared_length: Option<u64>,
}

impl FormReader<'_> {
    async fn read(&self, mut multipart: Multipart) -> ApiResult<AnalyzeForm> {
        let mut form = AnalyzeForm {
            file: None,
            custom_symbols: UserSymbolStore::new(),
        };

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| self.multipart_error(e))?
        {
            let name = field.name().unwrap_or_default().to_string();
            match name.as_str() {
                FILE_FIELD => {
                    if let Some(file) = self.read_file(field).await? {
                        form.file = Some(file);
                    }
                }
                CUSTOM_SYMBOLS_FIELD => {
                    let raw = field.text().await.map_err(|e| self.multipart_error(e))?;
                    form.custom_symbols =
                        UserSymbolStore::from_drafts(parse_custom_symbols(&raw)?);
                }
                other => tracing::debug!(field = other, "Ignoring unknown form field"),
            }
        }

        Ok(form)
    }

    /// Checks the declared type before reading, then streams the part to
    /// measure it, buffering only up to the ceiling.
    ///
    /// A part without a media type is typed from its file-name extension. A
    /// nameless part without a media type is an untouched file input and
    /// counts as no file.
    async fn read_file(&self, mut field: Field<'_>) -> ApiResult<Option<UploadedFile>> {
        let name = field.file_name().unwrap_or_default().to_string();
        let mut declared_media_type = field.content_type().unwrap_or_default().to_string();

        if declared_media_type.is_empty() {
            if name.is_empty() {
                return Ok(None);
            }
            if let Some(inferred) = self.policy.media_type_for_file_name(&name) {
                tracing::debug!(file_name = %name, media_type = inferred, "Media type taken from extension");
                declared_media_type = inferred.to_string();
            }
        }

        let kind = self.policy.check_media_type(&declared_media_type)?;

        let mut content = Vec::new();
        let mut size_bytes: u64 = 0;
        while let Some(chunk) = field.chunk().await.map_err(|e| self.multipart_error(e))? {
            size_bytes += chunk.len() as u64;
            if size_bytes <= self.policy.max_size_bytes() {
                content.extend_from_slice(&chunk);
            }
        }

        self.policy.check_size(size_bytes)?;

        Ok(Some(UploadedFile {
            name,
            declared_media_type,
            size_bytes,
            kind,
            content,
        }))
    }

    fn multipart_error(&self, err: MultipartError) -> ApiError {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            self.body_overflow().into()
        } else {
            ApiError::bad_request(format!(
                "Não foi possível ler o formulário enviado: {}",
                err.body_text()
            ))
        }
    }

    /// Size error once the body cap cut the stream. The request length stands
    /// in for the file size when known, otherwise the cap is a lower bound.
    fn body_overflow(&self) -> ValidationError {
        let limit_bytes = self.policy.max_size_bytes();
        match self.declared_length {
            Some(size_bytes) if size_bytes > self.body_limit => ValidationError::TooLarge {
                size_bytes,
                limit_bytes,
            },
            _ => ValidationError::BodyTooLarge {
                at_least_bytes: self.body_limit,
                limit_bytes,
            },
        }
    }
}

fn parse_custom_symbols(raw: &str) -> ApiResult<Vec<SymbolDraft>> {
    if raw.trim().is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str(raw).map_err(|e| {
        ApiError::bad_request(format!(
            "O campo customSymbols deve ser um array JSON de símbolos: {}",
            e
        ))
    })
}

fn download_response(report: &AnalysisReport) -> ApiResult<Response> {
    let original = report
        .get("fileName")
        .and_then(|v| v.as_str())
        .unwrap_or_default();
    let file_name = export_file_name(&sanitize_header_text(original), Utc::now().timestamp_millis());

    let body = serde_json::to_string_pretty(report)
        .map_err(|e| ApiError::Internal(anyhow::Error::new(e).context("serialize report")))?;
    let disposition =
        HeaderValue::from_bytes(format!("attachment; filename=\"{}\"", file_name).as_bytes())
            .map_err(|e| ApiError::Internal(anyhow::Error::new(e).context("disposition header")))?;

    Ok((
        [
            (
                header::CONTENT_TYPE,
                HeaderValue::from_static("application/json; charset=utf-8"),
            ),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    )
        .into_response())
}

/// Drops characters that cannot appear inside a quoted header parameter.
fn sanitize_header_text(value: &str) -> String {
    value
        .chars()
        .filter(|c| !c.is_control() && *c != '"' && *c != '\\')
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn custom_symbols_accept_empty_and_arrays() {
        assert!(parse_custom_symbols("").unwrap().is_empty());

        let drafts = parse_custom_symbols(
            r#"[{"id": "x", "name": "Sensor", "code": "SP", "category": "eletrico"}]"#,
        )
        .unwrap();
        assert_eq!(drafts.len(), 1);
        assert_eq!(drafts[0].code, "SP");
    }

    #[test]
    fn custom_symbols_reject_invalid_json() {
        let err = parse_custom_symbols("[{\"name\": ").unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));
    }

    #[test]
    fn body_overflow_uses_request_length_when_known() {
        let policy = UploadPolicy::new(1024 * 1024);
        let reader = FormReader {
            policy: &policy,
            body_limit: 2 * 1024 * 1024,
            declared_length: Some(3 * 1024 * 1024),
        };
        assert_eq!(
            reader.body_overflow(),
            ValidationError::TooLarge {
                size_bytes: 3 * 1024 * 1024,
                limit_bytes: 1024 * 1024,
            }
        );

        let chunked = FormReader {
            declared_length: None,
            ..reader
        };
        let err = chunked.body_overflow();
        assert_eq!(
            err,
            ValidationError::BodyTooLarge {
                at_least_bytes: 2 * 1024 * 1024,
                limit_bytes: 1024 * 1024,
            }
        );
        assert!(err.details().contains("pelo menos 2.00MB"));
    }

    #[test]
    fn header_text_loses_quotes_and_controls() {
        assert_eq!(sanitize_header_text("pla\"nta\n.pdf"), "planta.pdf");
        assert_eq!(sanitize_header_text("instalação.pdf"), "instalação.pdf");
    }
}
