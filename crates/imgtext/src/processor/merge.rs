/// Picks the final text: the remote transcription when it has any
/// non-whitespace content, the local OCR text otherwise.
pub fn merge(local_text: &str, remote_text: &str) -> String {
    if remote_text.trim().is_empty() {
        local_text.to_string()
    } else {
        remote_text.to_string()
    }
}
