//! Test harness for isolated upload processing.
//!
//! The `TestHarness` struct provides:
//! - A temporary media root for stored uploads
//! - An in-memory database with migrations applied
//! - `UploadService` construction around caller-supplied stages

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use tempfile::TempDir;

use imgtext::config::PreprocessConfig;
use imgtext::db::{Database, RecordStore};
use imgtext::{ImageStorage, Pipeline, Preprocessor, TextEnhancer, TextRecognizer, UploadService};

pub const MEDIA_URL: &str = "/media";

pub struct TestHarness {
    temp_dir: TempDir,
    pub media_root: PathBuf,
    pub db: Database,
}

impl TestHarness {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let media_root = temp_dir.path().join("media");
        let db = Database::open_in_memory().expect("Failed to open database");

        Self {
            temp_dir,
            media_root,
            db,
        }
    }

    pub fn storage(&self) -> ImageStorage {
        ImageStorage::new(&self.media_root, MEDIA_URL)
    }

    pub fn pipeline(
        &self,
        recognizer: Arc<dyn TextRecognizer>,
        enhancer: Arc<dyn TextEnhancer>,
    ) -> Pipeline {
        Pipeline::new(
            Preprocessor::new(PreprocessConfig::default()),
            recognizer,
            enhancer,
        )
    }

    /// Service backed by the harness database.
    pub fn service(
        &self,
        recognizer: Arc<dyn TextRecognizer>,
        enhancer: Arc<dyn TextEnhancer>,
    ) -> UploadService {
        self.service_with_store(Arc::new(self.db.clone()), recognizer, enhancer)
    }

    pub fn service_with_store(
        &self,
        store: Arc<dyn RecordStore>,
        recognizer: Arc<dyn TextRecognizer>,
        enhancer: Arc<dyn TextEnhancer>,
    ) -> UploadService {
        UploadService::new(store, self.storage(), self.pipeline(recognizer, enhancer))
    }

    /// Number of files written under the uploads directory.
    pub fn stored_file_count(&self) -> usize {
        std::fs::read_dir(self.media_root.join("uploads"))
            .map(|entries| entries.count())
            .unwrap_or(0)
    }
}
