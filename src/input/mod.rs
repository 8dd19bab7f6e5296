//! Input processing module
//! Handles file detection, text extraction, OCR fallback and layout signals

pub mod file_detector;
pub mod layout;
pub mod manager;
pub mod ocr;
pub mod raw_document;
pub mod text_extractor;

pub use file_detector::{FileType, ImageFormat};
pub use manager::DocumentExtractor;
pub use raw_document::{ExtractedText, FormatMetadata, OcrQuality, RawDocument};
