pub mod config;
pub mod db;
pub mod error;
pub mod item;
pub mod pipeline;
pub mod processor;
pub mod sanitize;
pub mod secrets;
pub mod storage;

pub use config::{load_config, Config};
pub use db::{Database, DatabaseError, ItemFilter, RecordStore};
pub use error::{ConfigError, ImgtextError, ProcessError, Result, StorageError, UploadError};
pub use item::{ItemStatus, ItemUpdate, NewItem, ProcessedItem};
pub use pipeline::{
    BatchResponse, ItemError, ItemOutcome, ItemResult, Pipeline, PipelineContext, UploadService,
    UploadedImage,
};
pub use processor::{GeminiEnhancer, ImageData, Preprocessor, TesseractEngine, TextEnhancer, TextRecognizer};
pub use secrets::{ApiKeySource, SecretError};
pub use storage::{ImageStorage, StoredImage};
