//! File type detection

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageFormat {
    Png,
    Jpeg,
    Tiff,
    Bmp,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FileType {
    Pdf,
    Docx,
    Text,
    Markdown,
    Image(ImageFormat),
    /// Unrecognized content, carrying the declared extension (possibly empty)
    Unknown(String),
}

impl FileType {
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_lowercase().as_str() {
            "pdf" => FileType::Pdf,
            "docx" => FileType::Docx,
            "txt" | "text" => FileType::Text,
            "md" | "markdown" => FileType::Markdown,
            "png" => FileType::Image(ImageFormat::Png),
            "jpg" | "jpeg" => FileType::Image(ImageFormat::Jpeg),
            "tif" | "tiff" => FileType::Image(ImageFormat::Tiff),
            "bmp" => FileType::Image(ImageFormat::Bmp),
            other => FileType::Unknown(other.to_string()),
        }
    }

    /// Recognize content by its leading bytes
    pub fn from_magic_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.starts_with(b"%PDF") {
            Some(FileType::Pdf)
        } else if bytes.starts_with(b"PK\x03\x04") {
            Some(FileType::Docx)
        } else if bytes.starts_with(b"\x89PNG\r\n\x1a\n") {
            Some(FileType::Image(ImageFormat::Png))
        } else if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
            Some(FileType::Image(ImageFormat::Jpeg))
        } else if bytes.starts_with(b"II*\x00") || bytes.starts_with(b"MM\x00*") {
            Some(FileType::Image(ImageFormat::Tiff))
        } else if bytes.starts_with(b"BM") && bytes.len() > 14 {
            Some(FileType::Image(ImageFormat::Bmp))
        } else {
            None
        }
    }

    /// Extension first, then magic bytes, then UTF-8 text
    pub fn detect(file_name: &str, bytes: &[u8]) -> Self {
        let ext = std::path::Path::new(file_name)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("");

        match Self::from_extension(ext) {
            FileType::Unknown(ext) => Self::from_magic_bytes(bytes).unwrap_or_else(|| {
                if !bytes.is_empty() && std::str::from_utf8(bytes).is_ok() {
                    FileType::Text
                } else {
                    FileType::Unknown(ext)
                }
            }),
            known => known,
        }
    }

    pub fn extension(&self) -> &str {
        match self {
            FileType::Pdf => "pdf",
            FileType::Docx => "docx",
            FileType::Text => "txt",
            FileType::Markdown => "md",
            FileType::Image(ImageFormat::Png) => "png",
            FileType::Image(ImageFormat::Jpeg) => "jpg",
            FileType::Image(ImageFormat::Tiff) => "tiff",
            FileType::Image(ImageFormat::Bmp) => "bmp",
            FileType::Unknown(ext) => ext,
        }
    }

    /// Whether a configured format name (e.g. "jpeg", "TXT") denotes this type
    pub fn matches_format(&self, name: &str) -> bool {
        match Self::from_extension(name.trim().trim_start_matches('.')) {
            FileType::Unknown(_) => false,
            other => other == *self,
        }
    }

    pub fn is_image(&self) -> bool {
        matches!(self, FileType::Image(_))
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileType::Unknown(ext) if ext.is_empty() => write!(f, "unknown"),
            other => write!(f, "{}", other.extension()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_detection() {
        assert_eq!(FileType::detect("resume.PDF", b""), FileType::Pdf);
        assert_eq!(FileType::detect("resume.docx", b""), FileType::Docx);
        assert_eq!(FileType::detect("resume.markdown", b""), FileType::Markdown);
        assert_eq!(
            FileType::detect("scan.jpeg", b""),
            FileType::Image(ImageFormat::Jpeg)
        );
    }

    #[test]
    fn test_magic_byte_fallback() {
        assert_eq!(FileType::detect("upload", b"%PDF-1.7\n"), FileType::Pdf);
        assert_eq!(
            FileType::detect("upload.bin", b"\x89PNG\r\n\x1a\n...."),
            FileType::Image(ImageFormat::Png)
        );
        assert_eq!(FileType::detect("notes", b"Jane Doe\nExperience"), FileType::Text);
        assert_eq!(
            FileType::detect("blob.xyz", &[0u8, 159, 146, 150]),
            FileType::Unknown("xyz".to_string())
        );
    }

    #[test]
    fn test_format_aliases() {
        let jpeg = FileType::Image(ImageFormat::Jpeg);
        assert!(jpeg.matches_format("jpg"));
        assert!(jpeg.matches_format("JPEG"));
        assert!(FileType::Text.matches_format("txt"));
        assert!(!FileType::Pdf.matches_format("docx"));
        assert!(!FileType::Unknown("xyz".to_string()).matches_format("xyz"));
    }
}
