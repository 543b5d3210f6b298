use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, info_span, warn};

use crate::config::Config;
use crate::db::{Database, RecordStore};
use crate::error::{ConfigError, ImgtextError, UploadError};
use crate::item::{ItemUpdate, NewItem};
use crate::storage::ImageStorage;

use super::context::PipelineContext;
use super::error::ItemError;
use super::outcome::{BatchResponse, ItemOutcome};
use super::runner::Pipeline;

/// One file as received from the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedImage {
    pub filename: String,
    pub bytes: Vec<u8>,
}

impl UploadedImage {
    pub fn new(filename: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            bytes,
        }
    }

    /// Reads a local file as an upload named after its basename.
    pub fn from_path(path: &Path) -> std::io::Result<Self> {
        let bytes = std::fs::read(path)?;
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self { filename, bytes })
    }
}

/// A record that exists in the store, with its image on disk.
struct CreatedItem {
    id: i64,
    image_path: PathBuf,
    image_url: String,
    filename: String,
    uploaded_at: DateTime<Utc>,
}

/// Entry point for a batch of uploads.
///
/// Items are handled one after the other; whatever happens to one item is
/// confined to its own result.
pub struct UploadService {
    store: Arc<dyn RecordStore>,
    storage: ImageStorage,
    pipeline: Pipeline,
}

impl UploadService {
    pub fn new(store: Arc<dyn RecordStore>, storage: ImageStorage, pipeline: Pipeline) -> Self {
        Self {
            store,
            storage,
            pipeline,
        }
    }

    /// Production wiring: SQLite store, filesystem storage, Tesseract and Gemini.
    pub fn from_config(config: &Config) -> Result<Self, ImgtextError> {
        let db_path = config.database_path().ok_or_else(|| ConfigError::Validation {
            message: "Could not determine a database path".to_string(),
        })?;
        let database = Database::open(&db_path)?;
        let storage = ImageStorage::new(&config.media_root, &config.media_url);
        let pipeline = Pipeline::from_config(config)?;

        Ok(Self::new(Arc::new(database), storage, pipeline))
    }

    pub fn storage(&self) -> &ImageStorage {
        &self.storage
    }

    pub fn process_uploads(
        &self,
        uploads: Vec<UploadedImage>,
    ) -> Result<BatchResponse, UploadError> {
        if uploads.is_empty() {
            return Err(UploadError::NoFiles);
        }

        let _span = info_span!("upload_batch", items = uploads.len()).entered();

        let outcomes: Vec<ItemOutcome> = uploads
            .into_iter()
            .map(|upload| self.process_one(upload))
            .collect();

        let response = BatchResponse::from_outcomes(outcomes);
        info!(
            completed = response.completed_count(),
            failed = response.failed_count(),
            "Upload batch finished"
        );
        Ok(response)
    }

    pub fn process_one(&self, upload: UploadedImage) -> ItemOutcome {
        let created = match self.create_record(&upload) {
            Ok(created) => created,
            Err(e) => {
                warn!(error_kind = e.kind(), error = %e, "Could not register upload");
                return ItemOutcome::Failed {
                    id: None,
                    image_url: None,
                    filename: upload.filename,
                    error: e.failure_message(),
                };
            }
        };

        let mut ctx = PipelineContext::new(created.id, created.image_path.clone());
        let run_result = self.pipeline.run(&mut ctx);
        let processed_at = Utc::now().max(created.uploaded_at);

        match run_result {
            Ok(()) => self.finish_completed(created, ctx, processed_at),
            Err(e) => self.finish_failed(created, ctx, e, processed_at),
        }
    }

    fn create_record(&self, upload: &UploadedImage) -> Result<CreatedItem, ItemError> {
        let stored = self
            .storage
            .store(&upload.bytes, &upload.filename)
            .map_err(|e| ItemError::RecordCreation(e.to_string()))?;

        let new_item = NewItem::new(stored.reference.clone(), Some(upload.filename.as_str()));
        let id = self
            .store
            .create(&new_item)
            .map_err(|e| ItemError::RecordCreation(e.to_string()))?;

        info!(item_id = id, reference = %stored.reference, "Created pending record");

        Ok(CreatedItem {
            id,
            image_path: stored.path,
            image_url: self.storage.url_for(&stored.reference),
            filename: new_item.original_filename,
            uploaded_at: new_item.uploaded_at,
        })
    }

    fn finish_completed(
        &self,
        created: CreatedItem,
        ctx: PipelineContext,
        processed_at: DateTime<Utc>,
    ) -> ItemOutcome {
        let final_text = ctx.final_text.unwrap_or_default();
        let update = ItemUpdate::completed(
            ctx.local_text.unwrap_or_default(),
            ctx.remote_text.unwrap_or_default(),
            final_text.clone(),
            processed_at,
        );

        if let Err(e) = self.store.update(created.id, &update) {
            let err = ItemError::RecordUpdate(e);
            warn!(item_id = created.id, error_kind = err.kind(), error = %err, "Could not save result");
            let message = err.failure_message();
            self.try_mark_failed(created.id, &message, processed_at);
            return ItemOutcome::Failed {
                id: Some(created.id),
                image_url: Some(created.image_url),
                filename: created.filename,
                error: message,
            };
        }

        info!(item_id = created.id, "Item completed");
        ItemOutcome::Completed {
            id: created.id,
            image_url: created.image_url,
            filename: created.filename,
            final_text,
        }
    }

    fn finish_failed(
        &self,
        created: CreatedItem,
        ctx: PipelineContext,
        err: ItemError,
        processed_at: DateTime<Utc>,
    ) -> ItemOutcome {
        warn!(item_id = created.id, error_kind = err.kind(), error = %err, "Item failed");

        let mut message = err.failure_message();
        let update = ItemUpdate::failed(
            message.clone(),
            ctx.local_text,
            ctx.remote_text,
            processed_at,
        );

        if let Err(e) = self.store.update(created.id, &update) {
            let update_err = ItemError::RecordUpdate(e);
            warn!(item_id = created.id, error_kind = update_err.kind(), error = %update_err, "Could not save failure");
            message = update_err.failure_message();
        }

        ItemOutcome::Failed {
            id: Some(created.id),
            image_url: Some(created.image_url),
            filename: created.filename,
            error: message,
        }
    }

    /// Best effort: leaves the record in a terminal state after a failed save.
    fn try_mark_failed(&self, id: i64, message: &str, processed_at: DateTime<Utc>) {
        let update = ItemUpdate::failed(message.to_string(), None, None, processed_at);
        if let Err(e) = self.store.update(id, &update) {
            warn!(item_id = id, error = %e, "Record left pending");
        }
    }
}
