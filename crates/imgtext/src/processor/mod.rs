pub mod enhance;
pub mod merge;
pub mod ocr;
pub mod preprocess;

pub use enhance::{GeminiEnhancer, TextEnhancer};
pub use merge::merge;
pub use ocr::{TesseractEngine, TextRecognizer};
pub use preprocess::{ImageData, Preprocessor};
