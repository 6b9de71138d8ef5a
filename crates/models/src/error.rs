use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Wire shape for error bodies returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ErrorShape {
    pub error_message: String,
    pub error_type: String,
}

#[derive(Error, Debug)]
pub enum AtlasError {
    #[error("Paper not found: {pdf_url}")]
    PaperNotFound { pdf_url: String },

    #[error("No diatom data is loaded")]
    CatalogEmpty,

    #[error("Image index {index} out of range (total: {total})")]
    ImageIndexOutOfRange { index: usize, total: usize },

    #[error("Invalid request: {reason}")]
    InvalidRequest { reason: String },

    #[error("Invalid segmentation data: {reason}")]
    InvalidSegmentation { reason: String },

    #[error("PDF too large: {size} bytes (max: {max_size})")]
    PdfTooLarge { size: u64, max_size: u64 },

    #[error("PDF error: {reason}")]
    PdfError { reason: String },

    #[error("Object store error: {reason}")]
    ObjectStoreError { reason: String },

    #[error("Upload failed for {path}: {reason}")]
    UploadFailed { path: String, reason: String },

    #[error("Assistant error: {reason}")]
    AssistantError { reason: String },

    #[error("Assistant returned an invalid response: {reason}")]
    AssistantResponseInvalid { reason: String },

    #[error("Database error: {reason}")]
    DatabaseError { reason: String },

    #[error("SQLx error: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Configuration error: {reason}")]
    ConfigError { reason: String },

    #[error("Internal server error: {reason}")]
    InternalError { reason: String },
}

impl AtlasError {
    pub fn to_error_shape(&self) -> ErrorShape {
        ErrorShape {
            error_message: self.to_string(),
            error_type: self.error_type().to_string(),
        }
    }

    pub fn error_type(&self) -> &'static str {
        match self {
            AtlasError::PaperNotFound { .. } => "PaperNotFound",
            AtlasError::CatalogEmpty => "CatalogEmpty",
            AtlasError::ImageIndexOutOfRange { .. } => "ImageIndexOutOfRange",
            AtlasError::InvalidRequest { .. } => "InvalidRequest",
            AtlasError::InvalidSegmentation { .. } => "InvalidSegmentation",
            AtlasError::PdfTooLarge { .. } => "PdfTooLarge",
            AtlasError::PdfError { .. } => "PdfError",
            AtlasError::ObjectStoreError { .. } => "ObjectStoreError",
            AtlasError::UploadFailed { .. } => "UploadFailed",
            AtlasError::AssistantError { .. } => "AssistantError",
            AtlasError::AssistantResponseInvalid { .. } => "AssistantResponseInvalid",
            AtlasError::DatabaseError { .. } => "DatabaseError",
            AtlasError::SqlxError(_) => "DatabaseError",
            AtlasError::HttpError(_) => "HttpError",
            AtlasError::ConfigError { .. } => "ConfigError",
            AtlasError::InternalError { .. } => "InternalError",
        }
    }

    pub fn http_status(&self) -> u16 {
        match self {
            AtlasError::PaperNotFound { .. } => 404,
            AtlasError::CatalogEmpty => 404,
            AtlasError::ImageIndexOutOfRange { .. } => 404,
            AtlasError::InvalidRequest { .. } => 400,
            AtlasError::InvalidSegmentation { .. } => 400,
            AtlasError::PdfTooLarge { .. } => 400,
            AtlasError::PdfError { .. } => 422,
            AtlasError::ObjectStoreError { .. } => 502,
            AtlasError::UploadFailed { .. } => 502,
            AtlasError::AssistantError { .. } => 502,
            AtlasError::AssistantResponseInvalid { .. } => 502,
            AtlasError::DatabaseError { .. } => 500,
            AtlasError::SqlxError(_) => 500,
            AtlasError::HttpError(_) => 502,
            AtlasError::ConfigError { .. } => 500,
            AtlasError::InternalError { .. } => 500,
        }
    }
}
