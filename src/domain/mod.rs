//! Domain types and rules
//!
//! Symbols, uploads and analysis reports. Nothing here performs I/O.

pub mod report;
pub mod symbols;
pub mod upload;

pub use report::{
    export_file_name, AnalysisReport, AnalysisStage, ProjectType, ReportDigest, ReportMetadata,
    Scale, ScaleMethod,
};
pub use symbols::{catalog, Symbol, SymbolCategory, SymbolDraft, SymbolPatch};
pub use upload::{MediaKind, UploadLimits, UploadPolicy, UploadedFile, ValidationError};
