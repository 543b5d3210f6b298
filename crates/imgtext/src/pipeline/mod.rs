pub mod context;
pub mod error;
pub mod orchestrator;
pub mod outcome;
pub mod runner;

pub use context::PipelineContext;
pub use error::ItemError;
pub use orchestrator::{UploadService, UploadedImage};
pub use outcome::{BatchResponse, ItemOutcome, ItemResult};
pub use runner::Pipeline;
