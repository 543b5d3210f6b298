pub mod filesystem;

pub use filesystem::{ImageStorage, StoredImage};
