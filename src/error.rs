//! Unified API error handling
//!
//! Every failure of a request ends here and becomes a JSON body of the form
//! `{error, details, code, supportedFormats?, tip?}`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::domain::ValidationError;
use crate::services::{GatewayError, NormalizeError, PdfError};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Upstream error: {0}")]
    Upstream(#[from] GatewayError),

    #[error("Malformed model response: {0}")]
    MalformedResponse(#[from] NormalizeError),

    #[error("PDF extraction failed: {0}")]
    PdfExtraction(#[from] PdfError),

    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub error: String,
    pub details: String,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supported_formats: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tip: Option<String>,
}

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Upstream(_)
            | Self::MalformedResponse(_)
            | Self::PdfExtraction(_)
            | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::BadRequest(_) => "BAD_REQUEST",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Upstream(e) if e.is_configuration() => "CONFIGURATION_ERROR",
            Self::Upstream(_) => "UPSTREAM_ERROR",
            Self::MalformedResponse(_) => "MALFORMED_RESPONSE",
            Self::PdfExtraction(_) => "PDF_EXTRACTION_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    fn title(&self) -> &'static str {
        match self {
            Self::Validation(e) => e.title(),
            Self::BadRequest(_) => "Requisição inválida",
            Self::NotFound(_) => "Não encontrado",
            Self::Upstream(e) if e.is_configuration() => "Configuração necessária",
            Self::Upstream(_) => "Erro ao processar arquivo",
            Self::MalformedResponse(_) => "Resposta inválida do modelo",
            Self::PdfExtraction(_) => "Erro ao processar PDF",
            Self::Internal(_) => "Erro interno",
        }
    }

    fn details(&self) -> String {
        match self {
            Self::Validation(e) => e.details(),
            Self::BadRequest(msg) | Self::NotFound(msg) => msg.clone(),
            Self::Upstream(GatewayError::MissingCredential) => {
                "Chave da API OpenAI não configurada. Configure OPENAI_API_KEY nas variáveis de ambiente.".to_string()
            }
            Self::Upstream(GatewayError::InvalidCredential) => {
                "A chave da API OpenAI foi recusada pelo provedor. Verifique OPENAI_API_KEY.".to_string()
            }
            Self::Upstream(e) => e.to_string(),
            Self::MalformedResponse(e) => e.to_string(),
            Self::PdfExtraction(_) => "Não foi possível extrair informações do PDF. Verifique se o arquivo não está corrompido ou protegido por senha.".to_string(),
            // Don't leak internal error details
            Self::Internal(_) => "Ocorreu um erro interno".to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self {
            Self::Internal(e) => {
                tracing::error!(error = ?e, "Internal server error");
            }
            Self::Upstream(_) | Self::MalformedResponse(_) | Self::PdfExtraction(_) => {
                tracing::error!(error = %self, code = self.error_code(), "Analysis failed");
            }
            _ => {
                tracing::warn!(error = %self, "API error");
            }
        }

        let (supported_formats, tip) = match &self {
            Self::Validation(e) => (e.supported_formats(), e.tip().map(str::to_string)),
            _ => (None, None),
        };

        let status = self.status_code();
        let body = ErrorResponse {
            error: self.title().to_string(),
            details: self.details(),
            code: self.error_code().to_string(),
            supported_formats,
            tip,
        };

        (status, Json(body)).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
