//! Uploaded drawings and the rules that admit them.

use serde::Serialize;
use thiserror::Error;

const MIB: f64 = 1024.0 * 1024.0;

pub const PDF_MEDIA_TYPE: &str = "application/pdf";

pub const IMAGE_MEDIA_TYPES: [&str; 4] = ["image/png", "image/jpeg", "image/jpg", "image/webp"];

pub const ACCEPTED_EXTENSIONS: [&str; 5] = [".pdf", ".png", ".jpg", ".jpeg", ".webp"];

pub const SUPPORTED_FORMATS: [&str; 5] = ["PDF", "PNG", "JPG", "JPEG", "WEBP"];

const CONVERSION_TIP: &str = "Para arquivos DWG, converta para PDF ou imagem antes de enviar.";

/// How the analysis pipeline treats an accepted file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Pdf,
    Image,
}

/// A file received for analysis. Lives for a single request.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub name: String,
    /// Media type exactly as declared by the client.
    pub declared_media_type: String,
    pub size_bytes: u64,
    pub kind: MediaKind,
    pub content: Vec<u8>,
}

/// Rejection reasons for an upload.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("no file was sent")]
    MissingFile,

    #[error("unsupported media type: {declared:?}")]
    UnsupportedFormat { declared: String },

    #[error("file too large: {size_bytes} bytes (limit {limit_bytes})")]
    TooLarge { size_bytes: u64, limit_bytes: u64 },

    #[error("file too large: at least {at_least_bytes} bytes (limit {limit_bytes})")]
    BodyTooLarge { at_least_bytes: u64, limit_bytes: u64 },
}

impl ValidationError {
    pub fn title(&self) -> &'static str {
        match self {
            Self::MissingFile => "Nenhum arquivo enviado",
            Self::UnsupportedFormat { .. } => "Formato não suportado",
            Self::TooLarge { .. } | Self::BodyTooLarge { .. } => "Arquivo muito grande",
        }
    }

    pub fn details(&self) -> String {
        match self {
            Self::MissingFile => "O campo 'file' é obrigatório.".to_string(),
            Self::UnsupportedFormat { declared } => {
                let declared = if declared.is_empty() {
                    "formato desconhecido"
                } else {
                    declared.as_str()
                };
                format!(
                    "Atualmente apenas imagens (PNG, JPG, JPEG, WEBP) e PDF são suportados. Você enviou: {}",
                    declared
                )
            }
            Self::TooLarge {
                size_bytes,
                limit_bytes,
            } => format!(
                "O arquivo deve ter no máximo {}MB. Tamanho atual: {:.2}MB",
                whole_mb(*limit_bytes),
                *size_bytes as f64 / MIB
            ),
            Self::BodyTooLarge {
                at_least_bytes,
                limit_bytes,
            } => format!(
                "O arquivo deve ter no máximo {}MB. Tamanho atual: pelo menos {:.2}MB",
                whole_mb(*limit_bytes),
                *at_least_bytes as f64 / MIB
            ),
        }
    }

    pub fn supported_formats(&self) -> Option<Vec<String>> {
        match self {
            Self::UnsupportedFormat { .. } => {
                Some(SUPPORTED_FORMATS.iter().map(|f| f.to_string()).collect())
            }
            _ => None,
        }
    }

    pub fn tip(&self) -> Option<&'static str> {
        match self {
            Self::UnsupportedFormat { .. } => Some(CONVERSION_TIP),
            _ => None,
        }
    }
}

fn whole_mb(bytes: u64) -> u64 {
    bytes / (1024 * 1024)
}

/// Accepted formats and the single size ceiling used everywhere an upload
/// is checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadPolicy {
    max_size_bytes: u64,
}

impl UploadPolicy {
    pub fn new(max_size_bytes: u64) -> Self {
        Self { max_size_bytes }
    }

    pub fn max_size_bytes(&self) -> u64 {
        self.max_size_bytes
    }

    /// Classifies a declared media type, case-insensitively.
    pub fn check_media_type(&self, declared: &str) -> Result<MediaKind, ValidationError> {
        let normalized = declared.trim().to_ascii_lowercase();

        if normalized == PDF_MEDIA_TYPE {
            Ok(MediaKind::Pdf)
        } else if IMAGE_MEDIA_TYPES.contains(&normalized.as_str()) {
            Ok(MediaKind::Image)
        } else {
            Err(ValidationError::UnsupportedFormat {
                declared: declared.to_string(),
            })
        }
    }

    pub fn check_size(&self, size_bytes: u64) -> Result<(), ValidationError> {
        if size_bytes > self.max_size_bytes {
            return Err(ValidationError::TooLarge {
                size_bytes,
                limit_bytes: self.max_size_bytes,
            });
        }
        Ok(())
    }

    /// Media type implied by an accepted file-name extension, for parts sent
    /// without a `Content-Type`.
    pub fn media_type_for_file_name(&self, file_name: &str) -> Option<&'static str> {
        let lower = file_name.to_ascii_lowercase();
        let extension = &lower[lower.rfind('.')?..];

        match extension {
            ".pdf" => Some(PDF_MEDIA_TYPE),
            ".png" => Some("image/png"),
            ".jpg" | ".jpeg" => Some("image/jpeg"),
            ".webp" => Some("image/webp"),
            _ => None,
        }
    }

    pub fn limits(&self) -> UploadLimits {
        UploadLimits {
            max_size_bytes: self.max_size_bytes,
            max_size_mb: whole_mb(self.max_size_bytes),
            accepted_media_types: std::iter::once(PDF_MEDIA_TYPE)
                .chain(IMAGE_MEDIA_TYPES)
                .map(str::to_string)
                .collect(),
            accepted_extensions: ACCEPTED_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            supported_formats: SUPPORTED_FORMATS.iter().map(|f| f.to_string()).collect(),
        }
    }
}

/// Published upload rules so client-side checks agree with the server.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadLimits {
    pub max_size_bytes: u64,
    pub max_size_mb: u64,
    pub accepted_media_types: Vec<String>,
    pub accepted_extensions: Vec<String>,
    pub supported_formats: Vec<String>,
}
