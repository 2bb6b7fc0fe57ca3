//! Input processing module
//! Handles format detection, text extraction and resume parsing

pub mod file_detector;
pub mod manager;
pub mod text_extractor;

pub use manager::{ExtractedDocument, InputManager};
