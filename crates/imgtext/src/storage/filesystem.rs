use std::io::Write;
use std::path::{Path, PathBuf};

use uuid::Uuid;

use crate::error::StorageError;

/// Subdirectory of the media root holding uploaded images.
pub const UPLOAD_DIR: &str = "uploads";

/// Extension used when the uploaded filename has none we can trust.
const FALLBACK_EXTENSION: &str = "bin";

const MAX_NAME_ATTEMPTS: usize = 8;

/// An image written to the media root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredImage {
    /// Path relative to the media root, always using `/` separators.
    pub reference: String,
    pub path: PathBuf,
}

/// Stores uploaded image bytes under generated names.
///
/// Names are a fresh UUID plus the extension of the uploaded filename, so
/// the user-supplied name never decides where bytes land on disk.
pub struct ImageStorage {
    media_root: PathBuf,
    media_url: String,
}

impl ImageStorage {
    pub fn new<P: AsRef<Path>>(media_root: P, media_url: &str) -> Self {
        Self {
            media_root: media_root.as_ref().to_path_buf(),
            media_url: media_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn media_root(&self) -> &Path {
        &self.media_root
    }

    pub fn store(&self, content: &[u8], original_filename: &str) -> Result<StoredImage, StorageError> {
        let dir_path = self.media_root.join(UPLOAD_DIR);
        self.ensure_directory(&dir_path)?;

        let extension = upload_extension(original_filename);

        for _ in 0..MAX_NAME_ATTEMPTS {
            let filename = format!("{}.{}", Uuid::new_v4(), extension);
            let try_path = dir_path.join(&filename);

            match std::fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&try_path)
            {
                Ok(mut file) => {
                    file.write_all(content)
                        .map_err(|e| StorageError::WriteFile {
                            path: try_path.clone(),
                            source: e,
                        })?;
                    log::debug!("Stored upload as {}", filename);
                    return Ok(StoredImage {
                        reference: format!("{}/{}", UPLOAD_DIR, filename),
                        path: try_path,
                    });
                }
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => continue,
                Err(e) => {
                    return Err(StorageError::WriteFile {
                        path: try_path,
                        source: e,
                    });
                }
            }
        }

        Err(StorageError::FileExists(dir_path))
    }

    /// Absolute path for a stored reference.
    pub fn path_for(&self, reference: &str) -> PathBuf {
        self.media_root.join(reference)
    }

    pub fn exists(&self, reference: &str) -> bool {
        self.path_for(reference).is_file()
    }

    /// Public locator for a stored reference, e.g. `/media/uploads/<uuid>.png`.
    pub fn url_for(&self, reference: &str) -> String {
        format!("{}/{}", self.media_url, reference.trim_start_matches('/'))
    }

    fn ensure_directory(&self, path: &Path) -> Result<(), StorageError> {
        if !path.exists() {
            std::fs::create_dir_all(path).map_err(|e| StorageError::CreateDirectory {
                path: path.to_path_buf(),
                source: e,
            })?;
        }
        Ok(())
    }
}

/// Extension taken from the text after the last dot of the uploaded name.
///
/// Only ASCII alphanumerics survive; anything else falls back to `bin`.
fn upload_extension(original_filename: &str) -> String {
    let basename = original_filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(original_filename);

    match basename.rsplit_once('.') {
        Some((_, ext))
            if !ext.is_empty() && ext.len() <= 10 && ext.chars().all(|c| c.is_ascii_alphanumeric()) =>
        {
            ext.to_ascii_lowercase()
        }
        _ => FALLBACK_EXTENSION.to_string(),
    }
}
