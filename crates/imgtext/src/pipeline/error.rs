use std::path::PathBuf;

use thiserror::Error;

use crate::db::DatabaseError;
use crate::error::ProcessError;

/// Everything that can go wrong for one uploaded image.
///
/// Any variant turns the item into a FAILED result; the batch carries on.
#[derive(Error, Debug)]
pub enum ItemError {
    #[error("Failed to create record: {0}")]
    RecordCreation(String),

    #[error("Image file not found at {}", .0.display())]
    ImageMissing(PathBuf),

    #[error(transparent)]
    Process(#[from] ProcessError),

    #[error("Failed to save result: {0}")]
    RecordUpdate(#[source] DatabaseError),
}

impl ItemError {
    /// Stable identifier used in structured logs.
    pub fn kind(&self) -> &'static str {
        match self {
            ItemError::RecordCreation(_) => "record_creation",
            ItemError::ImageMissing(_) => "image_missing",
            ItemError::Process(e) => e.kind(),
            ItemError::RecordUpdate(_) => "record_update",
        }
    }

    /// Message stored on the FAILED record and reported to the caller.
    pub fn failure_message(&self) -> String {
        format!("Processing failed: {}", self)
    }
}
