use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ImgtextError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Database error: {0}")]
    Database(#[from] crate::db::DatabaseError),

    #[error("Secret error: {0}")]
    Secret(#[from] crate::secrets::SecretError),

    #[error("Upload rejected: {0}")]
    Upload(#[from] UploadError),

    #[error("Remote client setup failed: {0}")]
    ClientSetup(String),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config JSON: {0}")]
    ParseJson(#[from] serde_json::Error),

    #[error("Config validation failed: {message}")]
    Validation { message: String },

    #[error("Schema validation failed: {errors}")]
    SchemaValidation { errors: String },
}

/// Failures of a single pipeline stage.
///
/// The variants mirror the stage that raised them so a failed item can be
/// diagnosed from its `kind()` even though every variant ends up as the
/// same FAILED record.
#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("Failed to read image '{path}': {reason}")]
    ImageRead { path: PathBuf, reason: String },

    #[error("OCR engine unavailable: {0}")]
    OcrEngineUnavailable(String),

    #[error("OCR failed: {0}")]
    OcrProcessing(String),

    #[error("Remote service error: {0}")]
    RemoteService(String),

    #[error("Remote response error: {0}")]
    RemoteResponse(String),
}

impl ProcessError {
    pub fn kind(&self) -> &'static str {
        match self {
            ProcessError::ImageRead { .. } => "image_read",
            ProcessError::OcrEngineUnavailable(_) => "ocr_engine_unavailable",
            ProcessError::OcrProcessing(_) => "ocr_processing",
            ProcessError::RemoteService(_) => "remote_service",
            ProcessError::RemoteResponse(_) => "remote_response",
        }
    }
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Failed to create directory '{path}': {source}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write file '{path}': {source}")]
    WriteFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("File already exists: {0}")]
    FileExists(PathBuf),
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum UploadError {
    #[error("No files were uploaded.")]
    NoFiles,
}

pub type Result<T> = std::result::Result<T, ImgtextError>;
