//! Text extraction from the supported file formats

use crate::error::{AtsCheckerError, Result};
use crate::input::file_detector::ImageFormat;
use crate::input::layout;
use crate::input::ocr::OcrEngine;
use crate::input::raw_document::{ExtractedText, FormatMetadata, OcrQuality};
use log::{debug, info, warn};
use pulldown_cmark::{Event, Options, Parser, Tag};
use quick_xml::escape::unescape;
use quick_xml::events::Event as XmlEvent;
use quick_xml::name::QName;
use quick_xml::Reader;
use regex::Regex;
use std::collections::BTreeSet;
use std::io::{Cursor, Read};
use std::sync::Arc;

pub trait TextExtractor {
    fn extract(&self, bytes: &[u8]) -> Result<ExtractedText>;
}

pub struct PlainTextExtractor;

impl TextExtractor for PlainTextExtractor {
    fn extract(&self, bytes: &[u8]) -> Result<ExtractedText> {
        let content = std::str::from_utf8(bytes)
            .map_err(|e| AtsCheckerError::ExtractionFailed(format!("Text file is not valid UTF-8: {}", e)))?;
        let content = content.trim_start_matches('\u{FEFF}');

        Ok(ExtractedText::new(
            content.to_string(),
            FormatMetadata {
                page_count: 1,
                ..FormatMetadata::default()
            },
        ))
    }
}

pub struct MarkdownExtractor;

impl TextExtractor for MarkdownExtractor {
    fn extract(&self, bytes: &[u8]) -> Result<ExtractedText> {
        let markdown = PlainTextExtractor.extract(bytes)?.text;

        let mut metadata = FormatMetadata {
            page_count: 1,
            ..FormatMetadata::default()
        };
        let mut text = String::new();

        for event in Parser::new_ext(&markdown, Options::ENABLE_TABLES) {
            match event {
                Event::Start(Tag::Table(_)) => metadata.has_tables = true,
                Event::Start(Tag::Image(..)) => metadata.has_images = true,
                Event::Start(Tag::Item) => {
                    metadata.has_bullet_points = true;
                    text.push_str("- ");
                }
                Event::Text(t) | Event::Code(t) => text.push_str(&t),
                Event::SoftBreak | Event::HardBreak => text.push('\n'),
                Event::End(Tag::TableCell) => text.push('\t'),
                Event::End(Tag::Heading(..)) | Event::End(Tag::Paragraph) => text.push_str("\n\n"),
                Event::End(Tag::Item) | Event::End(Tag::TableRow) | Event::End(Tag::TableHead) => {
                    text.push('\n')
                }
                Event::End(Tag::CodeBlock(_)) => text.push('\n'),
                _ => {}
            }
        }

        Ok(ExtractedText::new(collapse_blank_lines(&text), metadata))
    }
}

pub struct PdfExtractor {
    min_chars_per_page: usize,
    ocr_min_confidence: f32,
    ocr: Option<Arc<dyn OcrEngine>>,
}

impl PdfExtractor {
    pub fn new(min_chars_per_page: usize, ocr_min_confidence: f32, ocr: Option<Arc<dyn OcrEngine>>) -> Self {
        Self {
            min_chars_per_page,
            ocr_min_confidence,
            ocr,
        }
    }

    fn structure(&self, doc: &lopdf::Document, metadata: &mut FormatMetadata) {
        for object in doc.objects.values() {
            match object {
                lopdf::Object::Dictionary(dict) => {
                    let is_font = dict
                        .get(b"Type")
                        .and_then(|t| t.as_name())
                        .map(|name| name == b"Font")
                        .unwrap_or(false);
                    if !is_font {
                        continue;
                    }
                    if let Ok(base_font) = dict.get(b"BaseFont").and_then(|f| f.as_name()) {
                        let name = String::from_utf8_lossy(base_font);
                        metadata.font_names.insert(strip_subset_prefix(&name).to_string());
                    }
                }
                lopdf::Object::Stream(stream) => {
                    let is_image = stream
                        .dict
                        .get(b"Subtype")
                        .and_then(|s| s.as_name())
                        .map(|name| name == b"Image")
                        .unwrap_or(false);
                    if is_image {
                        metadata.has_images = true;
                    }
                }
                _ => {}
            }
        }
    }

    fn run_ocr(&self, bytes: &[u8], text_layer: String, metadata: &mut FormatMetadata) -> Result<String> {
        let ocr = match &self.ocr {
            Some(ocr) => ocr,
            None => {
                warn!("PDF text layer is sparse and OCR is unavailable");
                metadata
                    .notes
                    .push("Sparse PDF text layer; OCR unavailable, using the text layer as-is".to_string());
                return Ok(text_layer);
            }
        };

        match ocr.recognize_pdf(bytes) {
            Ok(output) => {
                let quality = OcrQuality {
                    mean_confidence: output.mean_confidence,
                    degraded: output.mean_confidence < self.ocr_min_confidence,
                };
                if quality.degraded {
                    warn!("Low OCR confidence: {:.1}", output.mean_confidence);
                }
                metadata.is_ocr_derived = true;
                metadata.ocr_quality = Some(quality);
                metadata.notes.push(format!(
                    "Text recovered by {} OCR (mean confidence {:.1})",
                    ocr.name(),
                    output.mean_confidence
                ));
                if output.pages.len() >= 2 {
                    metadata.has_headers_footers |= layout::detect_headers_footers("", &output.pages);
                }
                Ok(output.text)
            }
            Err(e) if !text_layer.trim().is_empty() => {
                warn!("OCR failed, keeping the sparse text layer: {}", e);
                metadata.notes.push(format!("OCR failed: {}", e));
                Ok(text_layer)
            }
            Err(e) => Err(e),
        }
    }
}

impl TextExtractor for PdfExtractor {
    fn extract(&self, bytes: &[u8]) -> Result<ExtractedText> {
        let doc = lopdf::Document::load_mem(bytes)
            .map_err(|e| AtsCheckerError::ExtractionFailed(format!("Failed to parse PDF: {}", e)))?;

        let mut metadata = FormatMetadata::default();
        self.structure(&doc, &mut metadata);

        let pages = doc.get_pages();
        metadata.page_count = pages.len();
        let page_texts: Vec<String> = pages
            .keys()
            .map(|number| doc.extract_text(&[*number]).unwrap_or_default())
            .collect();
        metadata.has_headers_footers = layout::detect_headers_footers("", &page_texts);

        let text_layer = match pdf_extract::extract_text_from_mem(bytes) {
            Ok(text) => text,
            Err(e) if doc.is_encrypted() => {
                return Err(AtsCheckerError::ExtractionFailed(format!(
                    "PDF is encrypted and its text cannot be read: {}",
                    e
                )))
            }
            Err(e) => {
                debug!("pdf-extract failed, falling back to per-page text: {}", e);
                page_texts.join("\n")
            }
        };

        let chars = text_layer.chars().filter(|c| !c.is_whitespace()).count();
        let per_page = chars / metadata.page_count.max(1);
        debug!("PDF text layer: {} chars over {} pages", chars, metadata.page_count);

        let text = if per_page < self.min_chars_per_page {
            info!(
                "Text density {} chars/page is below {}, trying OCR",
                per_page, self.min_chars_per_page
            );
            self.run_ocr(bytes, text_layer, &mut metadata)?
        } else {
            text_layer
        };

        Ok(ExtractedText::new(text, metadata))
    }
}

pub struct DocxExtractor;

impl TextExtractor for DocxExtractor {
    fn extract(&self, bytes: &[u8]) -> Result<ExtractedText> {
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
            .map_err(|e| AtsCheckerError::ExtractionFailed(format!("Invalid DOCX archive: {}", e)))?;

        let entry_names: Vec<String> = archive.file_names().map(str::to_string).collect();
        let document = read_entry(&mut archive, "word/document.xml")?.ok_or_else(|| {
            AtsCheckerError::ExtractionFailed("DOCX archive has no word/document.xml".to_string())
        })?;
        let styles = read_entry(&mut archive, "word/styles.xml")?.unwrap_or_default();

        let mut metadata = FormatMetadata {
            page_count: 1,
            ..FormatMetadata::default()
        };
        metadata.has_tables = document.contains("<w:tbl>") || document.contains("<w:tbl ");
        metadata.has_images = document.contains("<w:drawing")
            || document.contains("<w:pict")
            || entry_names.iter().any(|n| n.starts_with("word/media/"));
        metadata.has_headers_footers = entry_names.iter().any(|n| {
            (n.starts_with("word/header") || n.starts_with("word/footer")) && n.ends_with(".xml")
        });

        let columns_re = compile(r#"<w:cols\b[^>]*w:num="(\d+)""#)?;
        metadata.has_columns = columns_re
            .captures_iter(&document)
            .filter_map(|c| c[1].parse::<u32>().ok())
            .any(|n| n >= 2);

        let fonts_re = compile(r#"<w:rFonts\b[^>]*w:ascii="([^"]+)""#)?;
        metadata.font_names = fonts_re
            .captures_iter(&document)
            .chain(fonts_re.captures_iter(&styles))
            .map(|c| unescape(&c[1]).map(|name| name.into_owned()).unwrap_or_else(|_| c[1].to_string()))
            .collect::<BTreeSet<_>>();

        let lines = docx_paragraphs(&document, &mut metadata)?;
        Ok(ExtractedText::new(lines.join("\n"), metadata))
    }
}

/// Scanned images go straight to OCR
pub struct ImageExtractor {
    format: ImageFormat,
    ocr_min_confidence: f32,
    ocr: Option<Arc<dyn OcrEngine>>,
}

impl ImageExtractor {
    pub fn new(format: ImageFormat, ocr_min_confidence: f32, ocr: Option<Arc<dyn OcrEngine>>) -> Self {
        Self {
            format,
            ocr_min_confidence,
            ocr,
        }
    }
}

impl TextExtractor for ImageExtractor {
    fn extract(&self, bytes: &[u8]) -> Result<ExtractedText> {
        let ocr = self.ocr.as_ref().ok_or_else(|| {
            AtsCheckerError::ExtractionFailed("Image input requires OCR, which is unavailable".to_string())
        })?;

        let output = ocr.recognize_image(bytes, self.format)?;
        let quality = OcrQuality {
            mean_confidence: output.mean_confidence,
            degraded: output.mean_confidence < self.ocr_min_confidence,
        };
        let metadata = FormatMetadata {
            has_images: true,
            is_ocr_derived: true,
            page_count: 1,
            ocr_quality: Some(quality),
            notes: vec![format!(
                "Text recovered by {} OCR (mean confidence {:.1})",
                ocr.name(),
                output.mean_confidence
            )],
            ..FormatMetadata::default()
        };

        Ok(ExtractedText::new(output.text, metadata))
    }
}

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| AtsCheckerError::Processing(format!("Invalid pattern {}: {}", pattern, e)))
}

fn read_entry(archive: &mut zip::ZipArchive<Cursor<&[u8]>>, name: &str) -> Result<Option<String>> {
    let mut entry = match archive.by_name(name) {
        Ok(entry) => entry,
        Err(zip::result::ZipError::FileNotFound) => return Ok(None),
        Err(e) => {
            return Err(AtsCheckerError::ExtractionFailed(format!(
                "Failed to read {} from DOCX: {}",
                name, e
            )))
        }
    };

    let mut content = String::new();
    entry
        .read_to_string(&mut content)
        .map_err(|e| AtsCheckerError::ExtractionFailed(format!("Failed to read {} from DOCX: {}", name, e)))?;
    Ok(Some(content))
}

/// "ABCDEF+Calibri-Bold" -> "Calibri-Bold"
fn strip_subset_prefix(name: &str) -> &str {
    match name.split_once('+') {
        Some((prefix, rest))
            if prefix.len() == 6 && prefix.chars().all(|c| c.is_ascii_uppercase()) =>
        {
            rest
        }
        _ => name,
    }
}

struct DocxParagraph {
    text: String,
    bulleted: bool,
}

/// One line per `w:p`, in document order. Paragraphs nested in text boxes are
/// emitted on their own and the `mc:Fallback` copy of alternate content is
/// skipped.
fn docx_paragraphs(document: &str, metadata: &mut FormatMetadata) -> Result<Vec<String>> {
    let mut reader = Reader::from_str(document);
    let mut open: Vec<DocxParagraph> = Vec::new();
    let mut lines = Vec::new();
    let mut run_depth = 0usize;
    let mut in_text = false;

    loop {
        let event = reader
            .read_event()
            .map_err(|e| AtsCheckerError::ExtractionFailed(format!("Malformed DOCX XML: {}", e)))?;
        match event {
            XmlEvent::Start(e) => match e.name().as_ref() {
                b"mc:Fallback" => {
                    let name = e.name().as_ref().to_vec();
                    reader
                        .read_to_end(QName(&name))
                        .map_err(|e| AtsCheckerError::ExtractionFailed(format!("Malformed DOCX XML: {}", e)))?;
                }
                b"w:p" => open.push(DocxParagraph {
                    text: String::new(),
                    bulleted: false,
                }),
                b"w:r" => run_depth += 1,
                b"w:t" => in_text = run_depth > 0,
                b"w:numPr" => {
                    if let Some(paragraph) = open.last_mut() {
                        paragraph.bulleted = true;
                    }
                }
                _ => {}
            },
            XmlEvent::Empty(e) => match e.name().as_ref() {
                b"w:p" if open.is_empty() => lines.push(String::new()),
                b"w:tab" if run_depth > 0 => push_docx_text(&mut open, "\t"),
                b"w:br" | b"w:cr" if run_depth > 0 => push_docx_text(&mut open, "\n"),
                _ => {}
            },
            XmlEvent::Text(t) if in_text => {
                let text = t
                    .unescape()
                    .map_err(|e| AtsCheckerError::ExtractionFailed(format!("Malformed DOCX text: {}", e)))?;
                push_docx_text(&mut open, &text);
            }
            XmlEvent::End(e) => match e.name().as_ref() {
                b"w:t" => in_text = false,
                b"w:r" => run_depth = run_depth.saturating_sub(1),
                b"w:p" => {
                    if let Some(paragraph) = open.pop() {
                        let mut line = paragraph.text;
                        if paragraph.bulleted && !line.trim().is_empty() {
                            metadata.has_bullet_points = true;
                            line = format!("• {}", line.trim_start());
                        }
                        lines.push(line);
                    }
                }
                _ => {}
            },
            XmlEvent::Eof => break,
            _ => {}
        }
    }
    Ok(lines)
}

fn push_docx_text(open: &mut [DocxParagraph], text: &str) {
    if let Some(paragraph) = open.last_mut() {
        paragraph.text.push_str(text);
    }
}

fn collapse_blank_lines(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut blank_run = 0;
    for line in text.lines() {
        if line.trim().is_empty() {
            blank_run += 1;
            if blank_run > 1 {
                continue;
            }
        } else {
            blank_run = 0;
        }
        out.push_str(line.trim_end());
        out.push('\n');
    }
    out.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    fn build_docx(document_xml: &str, extra: &[(&str, &str)]) -> Vec<u8> {
        let mut buffer = Cursor::new(Vec::new());
        {
            let mut writer = zip::ZipWriter::new(&mut buffer);
            let options = SimpleFileOptions::default();
            writer.start_file("word/document.xml", options).unwrap();
            writer.write_all(document_xml.as_bytes()).unwrap();
            for (name, content) in extra {
                writer.start_file(*name, options).unwrap();
                writer.write_all(content.as_bytes()).unwrap();
            }
            writer.finish().unwrap();
        }
        buffer.into_inner()
    }

    #[test]
    fn test_plain_text_strips_bom() {
        let extracted = PlainTextExtractor.extract("\u{FEFF}Jane Doe".as_bytes()).unwrap();
        assert_eq!(extracted.text, "Jane Doe");
    }

    #[test]
    fn test_plain_text_rejects_binary() {
        let result = PlainTextExtractor.extract(&[0xFF, 0xFE, 0x00, 0x81]);
        assert!(matches!(result, Err(AtsCheckerError::ExtractionFailed(_))));
    }

    #[test]
    fn test_markdown_events() {
        let md = "# Jane Doe\n\n## Skills\n\n- Rust\n- SQL\n\n| A | B |\n|---|---|\n| 1 | 2 |\n\n![logo](logo.png)\n";
        let extracted = MarkdownExtractor.extract(md.as_bytes()).unwrap();

        assert!(extracted.text.contains("Skills"));
        assert!(extracted.text.contains("- Rust"));
        assert!(extracted.metadata.has_tables);
        assert!(extracted.metadata.has_images);
        assert!(extracted.metadata.has_bullet_points);
    }

    #[test]
    fn test_docx_paragraphs_and_features() {
        let document = r#"<w:document><w:body>
<w:p><w:r><w:rPr><w:rFonts w:ascii="Calibri"/></w:rPr><w:t>Jane Doe</w:t></w:r></w:p>
<w:p><w:r><w:t>Experience</w:t></w:r></w:p>
<w:p><w:pPr><w:numPr><w:ilvl w:val="0"/></w:numPr></w:pPr><w:r><w:t xml:space="preserve">Built APIs &amp; services</w:t></w:r></w:p>
<w:tbl><w:tr><w:tc><w:p><w:r><w:t>Cell</w:t></w:r></w:p></w:tc></w:tr></w:tbl>
<w:sectPr><w:cols w:num="2" w:space="720"/></w:sectPr>
</w:body></w:document>"#;
        let bytes = build_docx(document, &[("word/header1.xml", "<w:hdr/>")]);

        let extracted = DocxExtractor.extract(&bytes).unwrap();
        let lines: Vec<&str> = extracted.text.lines().collect();
        assert_eq!(lines[0], "Jane Doe");
        assert_eq!(lines[1], "Experience");
        assert_eq!(lines[2], "• Built APIs & services");

        let meta = &extracted.metadata;
        assert!(meta.has_tables);
        assert!(meta.has_columns);
        assert!(meta.has_headers_footers);
        assert!(meta.has_bullet_points);
        assert!(meta.font_names.contains("Calibri"));
    }

    #[test]
    fn test_docx_text_box_and_alternate_content() {
        let document = r#"<w:document><w:body>
<w:p><w:r><w:t>Jane Doe</w:t></w:r><w:r><mc:AlternateContent><mc:Choice Requires="wps"><w:drawing><wps:txbx><w:txbxContent><w:p><w:r><w:t>Contact: jane@example.com</w:t></w:r></w:p></w:txbxContent></wps:txbx></w:drawing></mc:Choice><mc:Fallback><w:pict><v:textbox><w:txbxContent><w:p><w:r><w:t>Contact: jane@example.com</w:t></w:r></w:p></w:txbxContent></v:textbox></w:pict></mc:Fallback></mc:AlternateContent></w:r><w:r><w:tab/><w:t>Engineer</w:t></w:r></w:p>
<w:p><w:pPr><w:tabs><w:tab w:val="left" w:pos="720"/></w:tabs></w:pPr><w:r><w:t>Skills</w:t></w:r></w:p>
<w:p/>
</w:body></w:document>"#;
        let bytes = build_docx(document, &[]);

        let extracted = DocxExtractor.extract(&bytes).unwrap();
        assert_eq!(extracted.text.matches("jane@example.com").count(), 1);

        let lines: Vec<&str> = extracted.text.lines().collect();
        assert_eq!(lines[0], "Contact: jane@example.com");
        assert_eq!(lines[1], "Jane Doe\tEngineer");
        assert_eq!(lines[2], "Skills");
        assert!(extracted.metadata.has_images);
    }

    #[test]
    fn test_docx_without_document_xml() {
        let mut buffer = Cursor::new(Vec::new());
        {
            let mut writer = zip::ZipWriter::new(&mut buffer);
            writer.start_file("readme.txt", SimpleFileOptions::default()).unwrap();
            writer.write_all(b"hello").unwrap();
            writer.finish().unwrap();
        }
        let result = DocxExtractor.extract(&buffer.into_inner());
        assert!(matches!(result, Err(AtsCheckerError::ExtractionFailed(_))));
    }

    #[test]
    fn test_corrupt_pdf() {
        let extractor = PdfExtractor::new(100, 60.0, None);
        let result = extractor.extract(b"this is not a pdf");
        assert!(matches!(result, Err(AtsCheckerError::ExtractionFailed(_))));
    }

    fn minimal_pdf(line: &str) -> Vec<u8> {
        use lopdf::content::{Content, Operation};
        use lopdf::{dictionary, Document, Object, Stream};

        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
            "Encoding" => "WinAnsiEncoding",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 12.into()]),
                Operation::new("Td", vec![72.into(), 720.into()]),
                Operation::new("Tj", vec![Object::string_literal(line)]),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![page_id.into()],
                "Count" => 1,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut buffer = Vec::new();
        doc.save_to(&mut buffer).unwrap();
        buffer
    }

    #[test]
    fn test_minimal_pdf_text_layer() {
        let bytes = minimal_pdf("Jane Doe Software Engineer");
        let extractor = PdfExtractor::new(1, 60.0, None);
        let extracted = extractor.extract(&bytes).unwrap();

        assert!(extracted.text.contains("Jane Doe"));
        assert_eq!(extracted.metadata.page_count, 1);
        assert!(extracted.metadata.font_names.contains("Courier"));
        assert!(!extracted.metadata.has_images);
        assert!(!extracted.metadata.is_ocr_derived);
    }

    #[test]
    fn test_sparse_pdf_without_ocr_keeps_text_layer() {
        let bytes = minimal_pdf("Jane Doe");
        let extractor = PdfExtractor::new(100, 60.0, None);
        let extracted = extractor.extract(&bytes).unwrap();

        assert!(extracted.text.contains("Jane"));
        assert!(!extracted.metadata.is_ocr_derived);
        assert!(extracted.metadata.notes.iter().any(|n| n.contains("OCR unavailable")));
    }

    #[test]
    fn test_image_without_ocr() {
        let extractor = ImageExtractor::new(ImageFormat::Png, 60.0, None);
        let result = extractor.extract(b"\x89PNG\r\n\x1a\n");
        assert!(matches!(result, Err(AtsCheckerError::ExtractionFailed(_))));
    }

    #[test]
    fn test_strip_subset_prefix() {
        assert_eq!(strip_subset_prefix("ABCDEF+Calibri-Bold"), "Calibri-Bold");
        assert_eq!(strip_subset_prefix("Arial"), "Arial");
        assert_eq!(strip_subset_prefix("C++Mono"), "C++Mono");
    }
}
