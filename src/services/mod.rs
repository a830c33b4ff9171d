//! Service layer: everything between an accepted upload and a report.
//!
//! Contains the LLM gateway, prompt construction, PDF text extraction,
//! response normalization, the user symbol store and drawing heuristics.

pub mod gateway;
pub mod heuristics;
pub mod normalizer;
pub mod pdf;
pub mod prompt;
pub mod symbol_store;

pub use gateway::{AnalysisGateway, GatewayError, OpenAiGateway};
pub use normalizer::{normalize, NormalizeError};
pub use pdf::{PdfError, PdfText};
pub use prompt::{AnalysisPrompt, ImageAttachment, PromptBuilder, PromptInput};
pub use symbol_store::UserSymbolStore;
