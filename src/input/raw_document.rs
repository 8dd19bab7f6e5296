//! Raw input documents and the extraction result types

use crate::error::{AtsCheckerError, Result};
use crate::input::file_detector::FileType;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;
use tokio::fs;

/// Immutable file content plus its detected type
#[derive(Debug, Clone)]
pub struct RawDocument {
    bytes: Vec<u8>,
    file_type: FileType,
    source_name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OcrQuality {
    /// Mean Tesseract word confidence, 0-100
    pub mean_confidence: f32,
    pub degraded: bool,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FormatMetadata {
    pub has_tables: bool,
    pub has_images: bool,
    pub has_columns: bool,
    pub has_headers_footers: bool,
    pub has_bullet_points: bool,
    pub font_names: BTreeSet<String>,
    pub is_ocr_derived: bool,
    pub page_count: usize,
    pub ocr_quality: Option<OcrQuality>,
    pub notes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedText {
    pub text: String,
    pub metadata: FormatMetadata,
}

impl RawDocument {
    /// Wrap in-memory content, detecting the type from the name and bytes
    pub fn from_bytes(bytes: Vec<u8>, source_name: impl Into<String>) -> Self {
        let source_name = source_name.into();
        let file_type = FileType::detect(&source_name, &bytes);
        Self {
            bytes,
            file_type,
            source_name,
        }
    }

    pub fn with_file_type(bytes: Vec<u8>, file_type: FileType, source_name: impl Into<String>) -> Self {
        Self {
            bytes,
            file_type,
            source_name: source_name.into(),
        }
    }

    pub async fn from_path(path: &Path, max_file_size_mb: u64) -> Result<Self> {
        if !path.exists() {
            return Err(AtsCheckerError::InvalidInput(format!(
                "File does not exist: {}",
                path.display()
            )));
        }

        let size = fs::metadata(path).await?.len();
        let limit = max_file_size_mb.saturating_mul(1024 * 1024);
        if size > limit {
            return Err(AtsCheckerError::InvalidInput(format!(
                "File {} is {} bytes, above the {} MB limit",
                path.display(),
                size,
                max_file_size_mb
            )));
        }

        let bytes = fs::read(path).await?;
        let source_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());

        Ok(Self::from_bytes(bytes, source_name))
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn file_type(&self) -> &FileType {
        &self.file_type
    }

    pub fn source_name(&self) -> &str {
        &self.source_name
    }
}

impl ExtractedText {
    pub fn new(text: String, metadata: FormatMetadata) -> Self {
        Self { text, metadata }
    }

    pub fn char_count(&self) -> usize {
        self.text.chars().filter(|c| !c.is_whitespace()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_from_path_detects_type() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("resume.txt");
        std::fs::write(&path, "Jane Doe\nExperience").unwrap();

        let raw = RawDocument::from_path(&path, 10).await.unwrap();
        assert_eq!(raw.file_type(), &FileType::Text);
        assert_eq!(raw.source_name(), "resume.txt");
    }

    #[tokio::test]
    async fn test_missing_file_is_invalid_input() {
        let result = RawDocument::from_path(Path::new("/nonexistent/resume.pdf"), 10).await;
        assert!(matches!(result, Err(AtsCheckerError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_size_limit() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("big.txt");
        std::fs::write(&path, vec![b'a'; 2 * 1024 * 1024]).unwrap();

        let result = RawDocument::from_path(&path, 1).await;
        assert!(matches!(result, Err(AtsCheckerError::InvalidInput(_))));
    }

    #[test]
    fn test_char_count_ignores_whitespace() {
        let extracted = ExtractedText::new("a b\n c".to_string(), FormatMetadata::default());
        assert_eq!(extracted.char_count(), 3);
    }
}
