use std::sync::Arc;

use crate::config::OcrConfig;
use crate::error::ProcessError;
use crate::processor::preprocess::ImageData;

/// Local text recognition over a preprocessed image.
///
/// Returns an empty string when no text is found.
pub trait TextRecognizer: Send + Sync {
    fn recognize(&self, image: &ImageData) -> Result<String, ProcessError>;
}

/// Tesseract through `leptess`.
#[derive(Clone)]
pub struct TesseractEngine {
    inner: Arc<TesseractEngineInner>,
}

struct TesseractEngineInner {
    languages: String,
    dpi: u32,
}

impl TesseractEngine {
    pub fn new(languages: &[String], dpi: u32) -> Self {
        let lang_str = if languages.is_empty() {
            "eng".to_string()
        } else {
            languages.join("+")
        };

        Self {
            inner: Arc::new(TesseractEngineInner {
                languages: lang_str,
                dpi,
            }),
        }
    }

    pub fn from_config(config: &OcrConfig) -> Self {
        Self::new(&config.languages, config.dpi)
    }

    pub fn languages(&self) -> &str {
        &self.inner.languages
    }

    pub fn dpi(&self) -> u32 {
        self.inner.dpi
    }
}

impl TextRecognizer for TesseractEngine {
    fn recognize(&self, image: &ImageData) -> Result<String, ProcessError> {
        let _span = tracing::info_span!("processor.ocr", languages = %self.inner.languages)
            .entered();

        let png_data = image.to_png_bytes()?;

        let mut lt = leptess::LepTess::new(None, &self.inner.languages).map_err(|e| {
            ProcessError::OcrEngineUnavailable(format!("Failed to initialize Tesseract: {}", e))
        })?;

        lt.set_image_from_mem(&png_data)
            .map_err(|e| ProcessError::OcrProcessing(format!("Failed to set image: {}", e)))?;
        lt.set_source_resolution(self.inner.dpi as i32);

        let text = lt
            .get_utf8_text()
            .map_err(|e| ProcessError::OcrProcessing(e.to_string()))?;

        Ok(text.trim().to_string())
    }
}
