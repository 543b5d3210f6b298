use std::path::PathBuf;

/// State carried through the stages for one item.
///
/// Stage outputs are filled in as they complete, so after a failure the
/// context still holds whatever the earlier stages produced.
pub struct PipelineContext {
    // Input
    pub item_id: i64,
    pub image_path: PathBuf,

    // Local OCR result
    pub local_text: Option<String>,

    // Remote enhancement result
    pub remote_text: Option<String>,

    // Merge result
    pub final_text: Option<String>,
}

impl PipelineContext {
    pub fn new(item_id: i64, image_path: PathBuf) -> Self {
        Self {
            item_id,
            image_path,
            local_text: None,
            remote_text: None,
            final_text: None,
        }
    }
}
