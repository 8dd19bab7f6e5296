//! Document extraction entry point: routes a raw document to its extractor

use crate::config::ExtractionConfig;
use crate::error::{AtsCheckerError, Result};
use crate::input::file_detector::FileType;
use crate::input::layout;
use crate::input::ocr::OcrEngine;
use crate::input::raw_document::{ExtractedText, RawDocument};
use crate::input::text_extractor::{
    DocxExtractor, ImageExtractor, MarkdownExtractor, PdfExtractor, PlainTextExtractor, TextExtractor,
};
use crate::processing::text_processor::TextProcessor;
use log::info;
use std::path::Path;
use std::sync::Arc;

/// Stateless apart from its configuration; safe to share between runs
pub struct DocumentExtractor {
    config: ExtractionConfig,
    ocr: Option<Arc<dyn OcrEngine>>,
    text_processor: TextProcessor,
}

impl DocumentExtractor {
    pub fn new(config: ExtractionConfig, ocr: Option<Arc<dyn OcrEngine>>) -> Self {
        Self {
            config,
            ocr,
            text_processor: TextProcessor::new(),
        }
    }

    pub fn extract(&self, raw: &RawDocument) -> Result<ExtractedText> {
        let bytes = raw.bytes();
        let name = raw.source_name();

        let mut extracted = match raw.file_type() {
            FileType::Pdf => {
                info!("Extracting text from PDF: {}", name);
                PdfExtractor::new(
                    self.config.min_chars_per_page,
                    self.config.ocr_min_confidence,
                    self.ocr.clone(),
                )
                .extract(bytes)?
            }
            FileType::Docx => {
                info!("Extracting text from DOCX: {}", name);
                DocxExtractor.extract(bytes)?
            }
            FileType::Text => {
                info!("Reading plain text file: {}", name);
                PlainTextExtractor.extract(bytes)?
            }
            FileType::Markdown => {
                info!("Processing markdown file: {}", name);
                MarkdownExtractor.extract(bytes)?
            }
            FileType::Image(format) => {
                info!("Running OCR on image: {}", name);
                ImageExtractor::new(*format, self.config.ocr_min_confidence, self.ocr.clone()).extract(bytes)?
            }
            FileType::Unknown(ext) => {
                return Err(AtsCheckerError::UnsupportedFormat(format!(
                    "Unsupported file type '{}' for: {}",
                    ext, name
                )));
            }
        };

        extracted.text = self.text_processor.normalize_text(&extracted.text);
        if extracted.text.trim().is_empty() {
            return Err(AtsCheckerError::ExtractionFailed(format!(
                "No text could be extracted from {}",
                name
            )));
        }

        let signals = layout::analyze(&extracted.text, &[]);
        let metadata = &mut extracted.metadata;
        metadata.has_tables |= signals.has_tables;
        metadata.has_columns |= signals.has_columns;
        metadata.has_headers_footers |= signals.has_headers_footers;
        metadata.has_bullet_points |= signals.has_bullet_points;

        Ok(extracted)
    }
}

/// Read a job description from a text or markdown file
pub async fn load_job_description(path: &Path) -> Result<String> {
    if !path.exists() {
        return Err(AtsCheckerError::InvalidInput(format!(
            "Job description file does not exist: {}",
            path.display()
        )));
    }

    let bytes = tokio::fs::read(path).await?;
    let raw = RawDocument::from_bytes(bytes, path.to_string_lossy());
    let extracted = match raw.file_type() {
        FileType::Markdown => MarkdownExtractor.extract(raw.bytes())?,
        _ => PlainTextExtractor.extract(raw.bytes())?,
    };
    Ok(TextProcessor::new().normalize_text(&extracted.text))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extractor() -> DocumentExtractor {
        DocumentExtractor::new(ExtractionConfig::default(), None)
    }

    #[test]
    fn test_text_document() {
        let raw = RawDocument::from_bytes(
            b"Jane Doe\r\n\r\nExperience\r\n- Built services in Rust\r\n".to_vec(),
            "resume.txt",
        );
        let extracted = extractor().extract(&raw).unwrap();
        assert!(!extracted.text.contains('\r'));
        assert!(extracted.metadata.has_bullet_points);
        assert!(!extracted.metadata.has_tables);
    }

    #[test]
    fn test_empty_document_fails() {
        let raw = RawDocument::from_bytes(b"  \n\n ".to_vec(), "empty.txt");
        assert!(matches!(
            extractor().extract(&raw),
            Err(AtsCheckerError::ExtractionFailed(_))
        ));
    }

    #[test]
    fn test_unknown_type_is_unsupported() {
        let raw = RawDocument::from_bytes(vec![0, 159, 146, 150], "resume.xyz");
        assert!(matches!(
            extractor().extract(&raw),
            Err(AtsCheckerError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_table_detected_from_text() {
        let raw = RawDocument::from_bytes(
            b"Skills\nRust      Expert      5 years\nSQL       Advanced    3 years\n".to_vec(),
            "resume.txt",
        );
        let extracted = extractor().extract(&raw).unwrap();
        assert!(extracted.metadata.has_tables);
    }

    #[tokio::test]
    async fn test_load_job_description() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("job.txt");
        std::fs::write(&path, "We need Python and SQL.").unwrap();

        let job = load_job_description(&path).await.unwrap();
        assert_eq!(job, "We need Python and SQL.");
    }
}
