//! Text extraction from in-memory document bytes

use crate::config::DEFAULT_PDF_FALLBACK_THRESHOLD;
use crate::error::{RecommenderError, Result};
use log::{debug, warn};
use pulldown_cmark::{html, Parser};
use quick_xml::events::Event;
use quick_xml::Reader;
use regex::Regex;
use std::io::{Cursor, Read};
use std::panic;
use std::sync::LazyLock;
use zip::ZipArchive;

static HTML_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]*>").expect("valid html tag regex"));

pub trait TextExtractor {
    fn name(&self) -> &'static str;
    fn extract(&self, bytes: &[u8]) -> Result<String>;
}

/// Page-wise content stream extraction. Fast, but loses text on PDFs with
/// unusual font encodings.
pub struct LopdfExtractor;

impl TextExtractor for LopdfExtractor {
    fn name(&self) -> &'static str {
        "lopdf"
    }

    fn extract(&self, bytes: &[u8]) -> Result<String> {
        let outcome = panic::catch_unwind(|| -> std::result::Result<String, String> {
            let doc = lopdf::Document::load_mem(bytes).map_err(|e| e.to_string())?;
            let pages: Vec<u32> = doc.get_pages().keys().copied().collect();
            let mut text = String::new();
            for page in pages {
                match doc.extract_text(&[page]) {
                    Ok(page_text) => {
                        text.push_str(&page_text);
                        text.push('\n');
                    }
                    Err(e) => debug!("lopdf could not read page {}: {}", page, e),
                }
            }
            Ok(text)
        });

        match outcome {
            Ok(Ok(text)) => Ok(text),
            Ok(Err(e)) => Err(RecommenderError::Extraction(format!("lopdf: {}", e))),
            Err(_) => Err(RecommenderError::Extraction(
                "lopdf panicked while parsing the document".to_string(),
            )),
        }
    }
}

/// Layout-aware extraction through pdf-extract. Slower, handles more fonts.
pub struct PdfExtractExtractor;

impl TextExtractor for PdfExtractExtractor {
    fn name(&self) -> &'static str {
        "pdf-extract"
    }

    fn extract(&self, bytes: &[u8]) -> Result<String> {
        match panic::catch_unwind(|| pdf_extract::extract_text_from_mem(bytes)) {
            Ok(Ok(text)) => Ok(text),
            Ok(Err(e)) => Err(RecommenderError::Extraction(format!("pdf-extract: {}", e))),
            Err(_) => Err(RecommenderError::Extraction(
                "pdf-extract panicked while parsing the document".to_string(),
            )),
        }
    }
}

/// Runs the fast extractor first and only falls back when its text is too short
pub struct PdfExtractor {
    fast: Box<dyn TextExtractor + Send + Sync>,
    fallback: Box<dyn TextExtractor + Send + Sync>,
    fallback_threshold: usize,
}

impl Default for PdfExtractor {
    fn default() -> Self {
        Self::new(DEFAULT_PDF_FALLBACK_THRESHOLD)
    }
}

impl PdfExtractor {
    pub fn new(fallback_threshold: usize) -> Self {
        Self::with_strategies(
            Box::new(LopdfExtractor),
            Box::new(PdfExtractExtractor),
            fallback_threshold,
        )
    }

    pub fn with_strategies(
        fast: Box<dyn TextExtractor + Send + Sync>,
        fallback: Box<dyn TextExtractor + Send + Sync>,
        fallback_threshold: usize,
    ) -> Self {
        Self {
            fast,
            fallback,
            fallback_threshold,
        }
    }
}

impl TextExtractor for PdfExtractor {
    fn name(&self) -> &'static str {
        "pdf"
    }

    fn extract(&self, bytes: &[u8]) -> Result<String> {
        let mut failures = Vec::new();

        let mut text = match self.fast.extract(bytes) {
            Ok(text) => Some(text),
            Err(e) => {
                warn!("{} extraction failed: {}", self.fast.name(), e);
                failures.push(e.to_string());
                None
            }
        };

        let too_short = text
            .as_deref()
            .map_or(true, |t| t.trim().chars().count() < self.fallback_threshold);

        if too_short {
            debug!(
                "PDF text below {} characters, trying {}",
                self.fallback_threshold,
                self.fallback.name()
            );
            match self.fallback.extract(bytes) {
                Ok(fallback_text) => text = Some(fallback_text),
                Err(e) => {
                    warn!("{} extraction failed: {}", self.fallback.name(), e);
                    failures.push(e.to_string());
                }
            }
        }

        text.ok_or_else(|| RecommenderError::Extraction(failures.join("; ")))
    }
}

/// Word documents: body paragraphs first, then table rows (cells space separated)
pub struct DocxExtractor;

impl TextExtractor for DocxExtractor {
    fn name(&self) -> &'static str {
        "docx"
    }

    fn extract(&self, bytes: &[u8]) -> Result<String> {
        let mut archive = ZipArchive::new(Cursor::new(bytes))
            .map_err(|e| RecommenderError::Extraction(format!("Not a DOCX archive: {}", e)))?;

        let mut xml = String::new();
        archive
            .by_name("word/document.xml")
            .map_err(|e| RecommenderError::Extraction(format!("Missing document body: {}", e)))?
            .read_to_string(&mut xml)?;

        docx_body_text(&xml)
    }
}

fn docx_body_text(xml: &str) -> Result<String> {
    let mut reader = Reader::from_str(xml);

    let mut paragraphs = String::new();
    let mut tables = String::new();
    let mut paragraph = String::new();
    let mut cell = String::new();
    let mut table_depth = 0usize;
    let mut in_text = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.name().as_ref() {
                b"w:tbl" => table_depth += 1,
                b"w:tc" if table_depth == 1 => cell.clear(),
                b"w:p" => paragraph.clear(),
                b"w:t" => in_text = true,
                _ => {}
            },
            Ok(Event::Empty(e)) => match e.name().as_ref() {
                b"w:tab" => paragraph.push('\t'),
                b"w:br" | b"w:cr" => paragraph.push('\n'),
                b"w:p" if table_depth == 0 => paragraphs.push('\n'),
                _ => {}
            },
            Ok(Event::Text(t)) if in_text => {
                let unescaped = t
                    .unescape()
                    .map_err(|e| RecommenderError::Extraction(format!("Bad DOCX text: {}", e)))?;
                paragraph.push_str(&unescaped);
            }
            Ok(Event::End(e)) => match e.name().as_ref() {
                b"w:t" => in_text = false,
                b"w:p" => {
                    if table_depth == 0 {
                        paragraphs.push_str(&paragraph);
                        paragraphs.push('\n');
                    } else {
                        if !cell.is_empty() {
                            cell.push('\n');
                        }
                        cell.push_str(&paragraph);
                    }
                    paragraph.clear();
                }
                b"w:tc" if table_depth == 1 => {
                    tables.push_str(&cell);
                    tables.push(' ');
                }
                b"w:tr" if table_depth == 1 => tables.push('\n'),
                b"w:tbl" => table_depth = table_depth.saturating_sub(1),
                _ => {}
            },
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => {
                return Err(RecommenderError::Extraction(format!(
                    "Malformed DOCX XML at position {}: {}",
                    reader.buffer_position(),
                    e
                )))
            }
        }
    }

    paragraphs.push_str(&tables);
    Ok(paragraphs)
}

pub struct PlainTextExtractor;

impl TextExtractor for PlainTextExtractor {
    fn name(&self) -> &'static str {
        "text"
    }

    fn extract(&self, bytes: &[u8]) -> Result<String> {
        Ok(String::from_utf8_lossy(bytes).into_owned())
    }
}

pub struct MarkdownExtractor;

impl TextExtractor for MarkdownExtractor {
    fn name(&self) -> &'static str {
        "markdown"
    }

    fn extract(&self, bytes: &[u8]) -> Result<String> {
        let markdown_content = String::from_utf8_lossy(bytes);

        let parser = Parser::new(&markdown_content);
        let mut html_output = String::new();
        html::push_html(&mut html_output, parser);

        Ok(self.html_to_text(&html_output))
    }
}

impl MarkdownExtractor {
    fn html_to_text(&self, html: &str) -> String {
        let text = html
            .replace("<br>", "\n")
            .replace("</p>", "\n\n")
            .replace("&nbsp;", " ")
            .replace("&amp;", "&")
            .replace("&lt;", "<")
            .replace("&gt;", ">")
            .replace("&quot;", "\"")
            .replace("&#39;", "'");

        let clean_text = HTML_TAG.replace_all(&text, "");

        clean_text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    }
}
