//! Stand-ins for the OCR engine, remote enhancer and record store.

#![allow(dead_code)]

use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use image::{DynamicImage, ImageFormat, Rgb, RgbImage};

use imgtext::db::{Database, DatabaseError, RecordStore};
use imgtext::{ImageData, ItemUpdate, NewItem, ProcessError, ProcessedItem, TextEnhancer, TextRecognizer};

/// PNG bytes of a small white page with a dark bar across it.
pub fn png_bytes() -> Vec<u8> {
    let img = RgbImage::from_fn(32, 16, |_, y| {
        if (6..10).contains(&y) {
            Rgb([20, 20, 20])
        } else {
            Rgb([250, 250, 250])
        }
    });
    let mut cursor = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(img)
        .write_to(&mut cursor, ImageFormat::Png)
        .expect("encode png");
    cursor.into_inner()
}

/// Recognizer returning the same text for every image.
pub struct StubRecognizer {
    text: String,
}

impl StubRecognizer {
    pub fn returning(text: &str) -> Self {
        Self {
            text: text.to_string(),
        }
    }
}

impl TextRecognizer for StubRecognizer {
    fn recognize(&self, _image: &ImageData) -> Result<String, ProcessError> {
        Ok(self.text.clone())
    }
}

/// Recognizer that reports a missing engine.
pub struct UnavailableRecognizer;

impl TextRecognizer for UnavailableRecognizer {
    fn recognize(&self, _image: &ImageData) -> Result<String, ProcessError> {
        Err(ProcessError::OcrEngineUnavailable(
            "tesseract is not installed".to_string(),
        ))
    }
}

/// Enhancer replying per call, in order; records what it was asked.
pub struct ScriptedEnhancer {
    replies: Mutex<Vec<Result<String, ProcessError>>>,
    pub calls: Mutex<Vec<(PathBuf, String)>>,
}

impl ScriptedEnhancer {
    pub fn new(replies: Vec<Result<String, ProcessError>>) -> Self {
        let mut replies = replies;
        replies.reverse();
        Self {
            replies: Mutex::new(replies),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Enhancer that always succeeds with `text`.
    pub fn always(text: &str, times: usize) -> Self {
        Self::new((0..times).map(|_| Ok(text.to_string())).collect())
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

impl TextEnhancer for ScriptedEnhancer {
    fn enhance(&self, image_path: &Path, local_text: &str) -> Result<String, ProcessError> {
        self.calls
            .lock()
            .unwrap()
            .push((image_path.to_path_buf(), local_text.to_string()));
        self.replies
            .lock()
            .unwrap()
            .pop()
            .unwrap_or_else(|| Err(ProcessError::RemoteService("no scripted reply".to_string())))
    }
}

/// Enhancer that always fails with a remote service error.
pub struct FailingEnhancer(pub String);

impl TextEnhancer for FailingEnhancer {
    fn enhance(&self, _image_path: &Path, _local_text: &str) -> Result<String, ProcessError> {
        Err(ProcessError::RemoteService(self.0.clone()))
    }
}

/// Record store wrapper that can be told to fail creates or updates.
pub struct FlakyStore {
    pub inner: Database,
    pub fail_create: bool,
    pub fail_update: bool,
}

impl FlakyStore {
    pub fn new(inner: Database) -> Self {
        Self {
            inner,
            fail_create: false,
            fail_update: false,
        }
    }
}

impl RecordStore for FlakyStore {
    fn create(&self, item: &NewItem) -> Result<i64, DatabaseError> {
        if self.fail_create {
            return Err(DatabaseError::Sqlite(rusqlite::Error::InvalidQuery));
        }
        self.inner.create(item)
    }

    fn update(&self, id: i64, update: &ItemUpdate) -> Result<(), DatabaseError> {
        if self.fail_update {
            return Err(DatabaseError::LockPoisoned);
        }
        self.inner.update(id, update)
    }

    fn get(&self, id: i64) -> Result<Option<ProcessedItem>, DatabaseError> {
        self.inner.get(id)
    }
}

/// Record store that removes the stored image right after creating the
/// record, as if the file vanished before processing started.
pub struct DeletingStore {
    pub inner: Database,
    pub media_root: PathBuf,
}

impl RecordStore for DeletingStore {
    fn create(&self, item: &NewItem) -> Result<i64, DatabaseError> {
        let id = self.inner.create(item)?;
        std::fs::remove_file(self.media_root.join(&item.image_reference)).expect("remove image");
        Ok(id)
    }

    fn update(&self, id: i64, update: &ItemUpdate) -> Result<(), DatabaseError> {
        self.inner.update(id, update)
    }

    fn get(&self, id: i64) -> Result<Option<ProcessedItem>, DatabaseError> {
        self.inner.get(id)
    }
}
