use std::sync::Arc;

use tracing::{debug, info_span};

use crate::config::Config;
use crate::error::ImgtextError;
use crate::processor::{
    merge, GeminiEnhancer, ImageData, Preprocessor, TesseractEngine, TextEnhancer, TextRecognizer,
};
use crate::sanitize;

use super::context::PipelineContext;
use super::error::ItemError;

/// The four processing stages for one stored image.
pub struct Pipeline {
    preprocessor: Preprocessor,
    recognizer: Arc<dyn TextRecognizer>,
    enhancer: Arc<dyn TextEnhancer>,
}

impl Pipeline {
    /// Production constructor: Tesseract locally, Gemini remotely.
    pub fn from_config(config: &Config) -> Result<Self, ImgtextError> {
        Ok(Self {
            preprocessor: Preprocessor::new(config.preprocess.clone()),
            recognizer: Arc::new(TesseractEngine::from_config(&config.ocr)),
            enhancer: Arc::new(GeminiEnhancer::from_config(&config.enhancer)?),
        })
    }

    pub fn new(
        preprocessor: Preprocessor,
        recognizer: Arc<dyn TextRecognizer>,
        enhancer: Arc<dyn TextEnhancer>,
    ) -> Self {
        Self {
            preprocessor,
            recognizer,
            enhancer,
        }
    }

    /// Runs verify, preprocess, local OCR, remote enhancement and merge in
    /// order. The first failing stage stops the run.
    pub fn run(&self, ctx: &mut PipelineContext) -> Result<(), ItemError> {
        let filename = sanitize::redact_path(&ctx.image_path);
        let _pipeline_span = info_span!("pipeline",
            item_id = ctx.item_id,
            filename = %filename,
        )
        .entered();

        self.step_verify_image(ctx)?;

        let image = {
            let _step = info_span!("preprocess").entered();
            self.step_preprocess(ctx)?
        };

        {
            let _step = info_span!("local_ocr").entered();
            self.step_local_ocr(ctx, &image)?;
        }
        drop(image);

        {
            let _step = info_span!("remote_enhance").entered();
            self.step_remote_enhance(ctx)?;
        }

        {
            let _step = info_span!("merge").entered();
            self.step_merge(ctx);
        }

        Ok(())
    }

    fn step_verify_image(&self, ctx: &PipelineContext) -> Result<(), ItemError> {
        if !ctx.image_path.is_file() {
            return Err(ItemError::ImageMissing(ctx.image_path.clone()));
        }
        Ok(())
    }

    fn step_preprocess(&self, ctx: &PipelineContext) -> Result<ImageData, ItemError> {
        Ok(self.preprocessor.preprocess(&ctx.image_path)?)
    }

    fn step_local_ocr(&self, ctx: &mut PipelineContext, image: &ImageData) -> Result<(), ItemError> {
        let text = self.recognizer.recognize(image)?;
        debug!(chars = text.len(), "Local OCR finished");
        ctx.local_text = Some(text);
        Ok(())
    }

    fn step_remote_enhance(&self, ctx: &mut PipelineContext) -> Result<(), ItemError> {
        let local = ctx.local_text.as_deref().unwrap_or_default();
        let text = self.enhancer.enhance(&ctx.image_path, local)?;
        ctx.remote_text = Some(text);
        Ok(())
    }

    fn step_merge(&self, ctx: &mut PipelineContext) {
        let local = ctx.local_text.as_deref().unwrap_or_default();
        let remote = ctx.remote_text.as_deref().unwrap_or_default();
        ctx.final_text = Some(merge(local, remote));
    }
}
