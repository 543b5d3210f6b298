//! Processed item model and its status lifecycle.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Processing status of an uploaded image.
///
/// `Pending` is the only non-terminal state. A record moves to `Completed`
/// or `Failed` exactly once and never back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ItemStatus {
    Pending,
    Completed,
    Failed,
}

impl ItemStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemStatus::Pending => "PENDING",
            ItemStatus::Completed => "COMPLETED",
            ItemStatus::Failed => "FAILED",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, ItemStatus::Pending)
    }
}

impl fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ItemStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "PENDING" => Ok(ItemStatus::Pending),
            "COMPLETED" => Ok(ItemStatus::Completed),
            "FAILED" => Ok(ItemStatus::Failed),
            other => Err(format!("Unknown item status: {}", other)),
        }
    }
}

/// A persisted record for one uploaded image.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessedItem {
    pub id: i64,
    /// Path of the stored binary, relative to the media root.
    pub image_reference: String,
    pub original_filename: String,
    pub status: ItemStatus,
    pub local_ocr_text: Option<String>,
    pub remote_enhanced_text: Option<String>,
    /// Pipeline output when completed, error description when failed.
    pub final_text: Option<String>,
    pub uploaded_at: DateTime<Utc>,
    pub processed_at: Option<DateTime<Utc>>,
}

impl fmt::Display for ProcessedItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Image {} ({}) - {}",
            self.id, self.original_filename, self.status
        )
    }
}

/// Values for a record that has not been inserted yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewItem {
    pub image_reference: String,
    pub original_filename: String,
    pub status: ItemStatus,
    pub uploaded_at: DateTime<Utc>,
}

impl NewItem {
    /// Builds a pending record. A missing or empty filename falls back to the
    /// basename of the stored image.
    pub fn new(image_reference: impl Into<String>, original_filename: Option<&str>) -> Self {
        let image_reference = image_reference.into();
        let original_filename = match original_filename {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => Path::new(&image_reference)
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or(&image_reference)
                .to_string(),
        };

        Self {
            image_reference,
            original_filename,
            status: ItemStatus::Pending,
            uploaded_at: Utc::now(),
        }
    }
}

/// Terminal update applied to a pending record.
///
/// Every text column is written, so fields left as `None` are cleared rather
/// than carried over from the pending row.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemUpdate {
    pub status: ItemStatus,
    pub local_ocr_text: Option<String>,
    pub remote_enhanced_text: Option<String>,
    pub final_text: Option<String>,
    pub processed_at: DateTime<Utc>,
}

impl ItemUpdate {
    pub fn completed(
        local_ocr_text: String,
        remote_enhanced_text: String,
        final_text: String,
        processed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            status: ItemStatus::Completed,
            local_ocr_text: Some(local_ocr_text),
            remote_enhanced_text: Some(remote_enhanced_text),
            final_text: Some(final_text),
            processed_at,
        }
    }

    pub fn failed(
        error_message: String,
        local_ocr_text: Option<String>,
        remote_enhanced_text: Option<String>,
        processed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            status: ItemStatus::Failed,
            local_ocr_text,
            remote_enhanced_text,
            final_text: Some(error_message),
            processed_at,
        }
    }
}
