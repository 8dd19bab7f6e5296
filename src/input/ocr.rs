//! OCR fallback through the Tesseract and Poppler command-line tools
//!
//! Scanned PDFs are rasterised with `pdftoppm` into a scratch directory that
//! lives only for the duration of the call, then each page image is passed to
//! `tesseract` with TSV output so word confidences can be averaged.

use crate::config::ExtractionConfig;
use crate::error::{AtsCheckerError, Result};
use crate::input::file_detector::ImageFormat;
use log::{debug, info};
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

/// Text recognised from one document
#[derive(Debug, Clone, PartialEq)]
pub struct OcrOutput {
    pub text: String,
    /// One entry per rendered page
    pub pages: Vec<String>,
    /// Mean word confidence, 0-100. Zero when nothing was recognised.
    pub mean_confidence: f32,
}

pub trait OcrEngine: Send + Sync {
    fn name(&self) -> &str;
    fn recognize_pdf(&self, bytes: &[u8]) -> Result<OcrOutput>;
    fn recognize_image(&self, bytes: &[u8], format: ImageFormat) -> Result<OcrOutput>;
}

pub struct TesseractOcr {
    tesseract_path: String,
    pdftoppm_path: String,
    dpi: u32,
    language: String,
}

/// One page of parsed Tesseract TSV output
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TsvPage {
    pub text: String,
    pub confidences: Vec<f32>,
}

impl TesseractOcr {
    pub fn from_config(config: &ExtractionConfig) -> Self {
        Self {
            tesseract_path: config.tesseract_path.clone(),
            pdftoppm_path: config.pdftoppm_path.clone(),
            dpi: config.ocr_dpi,
            language: config.ocr_language.clone(),
        }
    }

    /// Check both binaries respond. Any failure is a `MissingDependency`.
    pub fn probe(&self) -> Result<()> {
        check_binary(&self.tesseract_path, "--version")?;
        check_binary(&self.pdftoppm_path, "-v")?;
        Ok(())
    }

    fn run_tesseract(&self, image: &Path) -> Result<TsvPage> {
        let output = Command::new(&self.tesseract_path)
            .arg(image)
            .arg("stdout")
            .arg("-l")
            .arg(&self.language)
            .arg("tsv")
            .output()
            .map_err(|e| AtsCheckerError::MissingDependency(format!("Failed to run tesseract: {}", e)))?;

        if !output.status.success() {
            return Err(AtsCheckerError::ExtractionFailed(format!(
                "tesseract failed on {}: {}",
                image.display(),
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        Ok(parse_tesseract_tsv(&String::from_utf8_lossy(&output.stdout)))
    }

    fn render_pdf(&self, pdf: &Path, out_dir: &Path) -> Result<Vec<PathBuf>> {
        let prefix = out_dir.join("page");
        let output = Command::new(&self.pdftoppm_path)
            .arg("-r")
            .arg(self.dpi.to_string())
            .arg("-png")
            .arg(pdf)
            .arg(&prefix)
            .output()
            .map_err(|e| AtsCheckerError::MissingDependency(format!("Failed to run pdftoppm: {}", e)))?;

        if !output.status.success() {
            return Err(AtsCheckerError::ExtractionFailed(format!(
                "pdftoppm could not render the document: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let mut pages: Vec<(u32, PathBuf)> = std::fs::read_dir(out_dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.extension().and_then(|e| e.to_str()) == Some("png"))
            .map(|path| (page_number(&path), path))
            .collect();
        pages.sort();

        Ok(pages.into_iter().map(|(_, path)| path).collect())
    }

    fn collect(&self, images: &[PathBuf]) -> Result<OcrOutput> {
        let mut pages = Vec::with_capacity(images.len());
        let mut confidences = Vec::new();

        for image in images {
            let page = self.run_tesseract(image)?;
            debug!("OCR page {}: {} words", image.display(), page.confidences.len());
            confidences.extend(page.confidences);
            pages.push(page.text);
        }

        let mean_confidence = if confidences.is_empty() {
            0.0
        } else {
            confidences.iter().sum::<f32>() / confidences.len() as f32
        };

        Ok(OcrOutput {
            text: pages.join("\n\n"),
            pages,
            mean_confidence,
        })
    }
}

impl OcrEngine for TesseractOcr {
    fn name(&self) -> &str {
        "tesseract"
    }

    fn recognize_pdf(&self, bytes: &[u8]) -> Result<OcrOutput> {
        let scratch = TempDir::new()?;
        let pdf_path = scratch.path().join("input.pdf");
        std::fs::write(&pdf_path, bytes)?;

        let images = self.render_pdf(&pdf_path, scratch.path())?;
        if images.is_empty() {
            return Err(AtsCheckerError::ExtractionFailed(
                "pdftoppm produced no page images".to_string(),
            ));
        }
        info!("Running OCR over {} rendered pages", images.len());

        self.collect(&images)
    }

    fn recognize_image(&self, bytes: &[u8], format: ImageFormat) -> Result<OcrOutput> {
        let scratch = TempDir::new()?;
        let ext = match format {
            ImageFormat::Png => "png",
            ImageFormat::Jpeg => "jpg",
            ImageFormat::Tiff => "tiff",
            ImageFormat::Bmp => "bmp",
        };
        let image_path = scratch.path().join(format!("input.{}", ext));
        std::fs::write(&image_path, bytes)?;

        self.collect(&[image_path])
    }
}

fn check_binary(path: &str, version_flag: &str) -> Result<()> {
    let status = Command::new(path)
        .arg(version_flag)
        .output()
        .map_err(|e| AtsCheckerError::MissingDependency(format!("{} is not available: {}", path, e)))?
        .status;

    if status.success() {
        Ok(())
    } else {
        Err(AtsCheckerError::MissingDependency(format!(
            "{} {} exited with {}",
            path, version_flag, status
        )))
    }
}

/// pdftoppm names pages `page-1.png` or `page-01.png` depending on page count
fn page_number(path: &Path) -> u32 {
    path.file_stem()
        .and_then(|s| s.to_str())
        .and_then(|s| s.rsplit('-').next())
        .and_then(|n| n.parse().ok())
        .unwrap_or(0)
}

/// Parse `tesseract ... tsv` output into text lines and word confidences.
///
/// Columns: level, page_num, block_num, par_num, line_num, word_num, left,
/// top, width, height, conf, text. Only level-5 rows are words.
pub fn parse_tesseract_tsv(tsv: &str) -> TsvPage {
    let mut page = TsvPage::default();
    let mut current_line: Option<(u32, u32, u32)> = None;
    let mut line_words: Vec<&str> = Vec::new();
    let mut lines: Vec<String> = Vec::new();

    for row in tsv.lines().skip(1) {
        let cols: Vec<&str> = row.split('\t').collect();
        if cols.len() < 11 || cols[0] != "5" {
            continue;
        }
        let word = cols.get(11).map(|w| w.trim()).unwrap_or("");
        let confidence: f32 = cols[10].parse().unwrap_or(-1.0);
        if word.is_empty() || confidence < 0.0 {
            continue;
        }

        let key = (
            cols[2].parse().unwrap_or(0),
            cols[3].parse().unwrap_or(0),
            cols[4].parse().unwrap_or(0),
        );
        if current_line != Some(key) {
            if !line_words.is_empty() {
                lines.push(line_words.join(" "));
                line_words.clear();
            }
            // New block means a paragraph break
            if let Some((block, _, _)) = current_line {
                if block != key.0 {
                    lines.push(String::new());
                }
            }
            current_line = Some(key);
        }

        line_words.push(word);
        page.confidences.push(confidence);
    }

    if !line_words.is_empty() {
        lines.push(line_words.join(" "));
    }
    page.text = lines.join("\n");
    page
}
