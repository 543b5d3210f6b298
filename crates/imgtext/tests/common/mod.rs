//! Shared test utilities for imgtext integration tests.
//!
//! This module provides:
//! - `TestHarness` wiring an `UploadService` to temp storage and an in-memory database
//! - Stub recognizer/enhancer implementations so no Tesseract or network is needed
//! - Helpers for generating real image bytes

pub mod harness;
pub mod stubs;

pub use harness::TestHarness;
pub use stubs::*;
