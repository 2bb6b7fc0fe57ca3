//! Input manager: routes document bytes to the right extractor

use crate::config::{Config, DEFAULT_PDF_FALLBACK_THRESHOLD};
use crate::error::{RecommenderError, Result};
use crate::input::file_detector::FileType;
use crate::input::text_extractor::{
    DocxExtractor, MarkdownExtractor, PdfExtractor, PlainTextExtractor, TextExtractor,
};
use crate::processing::document::{parse_sections, ParsedResume};
use crate::processing::text_processor::clean_text;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

/// Cleaned text and its sections
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedDocument {
    pub file_type: FileType,
    pub raw_text: String,
    pub sections: BTreeMap<String, String>,
}

pub struct InputManager {
    pdf_fallback_threshold: usize,
    cache: HashMap<PathBuf, ParsedResume>,
    enable_cache: bool,
}

impl Default for InputManager {
    fn default() -> Self {
        Self::new()
    }
}

impl InputManager {
    pub fn new() -> Self {
        Self {
            pdf_fallback_threshold: DEFAULT_PDF_FALLBACK_THRESHOLD,
            cache: HashMap::new(),
            enable_cache: true,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self {
            pdf_fallback_threshold: config.extraction.pdf_fallback_threshold,
            ..Self::new()
        }
    }

    pub fn with_cache(mut self, enable: bool) -> Self {
        self.enable_cache = enable;
        self
    }

    /// Extract cleaned text and sections from uploaded bytes.
    ///
    /// `extension` is the declared file extension, with or without the dot.
    /// Parsing runs on the blocking thread pool.
    pub async fn extract(&self, bytes: Vec<u8>, extension: &str) -> Result<ExtractedDocument> {
        let file_type = FileType::from_extension(extension);
        if !file_type.is_supported() {
            return Err(RecommenderError::UnsupportedFormat(format!(
                "Unsupported file type: {}",
                extension
            )));
        }

        let threshold = self.pdf_fallback_threshold;
        let text = tokio::task::spawn_blocking(move || extract_blocking(&bytes, file_type, threshold))
            .await
            .map_err(|e| RecommenderError::Extraction(format!("Extraction task failed: {}", e)))??;

        let raw_text = clean_text(&text);
        let sections = parse_sections(&raw_text);
        debug!(
            "Extracted {} characters and {} sections from {:?}",
            raw_text.chars().count(),
            sections.len(),
            file_type
        );

        Ok(ExtractedDocument {
            file_type,
            raw_text,
            sections,
        })
    }

    /// Extract, then derive education, work history and experience years
    pub async fn parse_resume(&self, bytes: Vec<u8>, extension: &str) -> Result<ParsedResume> {
        let document = self.extract(bytes, extension).await?;
        Ok(ParsedResume::from_text(document.raw_text))
    }

    /// Parse a resume file from disk, caching the result per path
    pub async fn parse_file(&mut self, path: &Path) -> Result<ParsedResume> {
        if self.enable_cache {
            if let Some(cached) = self.cache.get(path) {
                info!("Using cached parse for: {}", path.display());
                return Ok(cached.clone());
            }
        }

        if !path.exists() {
            return Err(RecommenderError::InvalidInput(format!(
                "File does not exist: {}",
                path.display()
            )));
        }

        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .ok_or_else(|| {
                RecommenderError::InvalidInput(format!("File has no extension: {}", path.display()))
            })?
            .to_string();

        info!("Parsing resume: {}", path.display());
        let bytes = tokio::fs::read(path).await?;
        let parsed = self.parse_resume(bytes, &extension).await?;

        if self.enable_cache {
            self.cache.insert(path.to_path_buf(), parsed.clone());
        }
        Ok(parsed)
    }

    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    pub fn cache_size(&self) -> usize {
        self.cache.len()
    }
}

fn extract_blocking(bytes: &[u8], file_type: FileType, pdf_fallback_threshold: usize) -> Result<String> {
    let extractor: Box<dyn TextExtractor> = match file_type {
        FileType::Pdf => Box::new(PdfExtractor::new(pdf_fallback_threshold)),
        FileType::Docx => Box::new(DocxExtractor),
        FileType::Text => Box::new(PlainTextExtractor),
        FileType::Markdown => Box::new(MarkdownExtractor),
        FileType::Unknown => {
            return Err(RecommenderError::UnsupportedFormat(
                "Unsupported file type".to_string(),
            ))
        }
    };
    debug!("Extracting with {}", extractor.name());
    extractor.extract(bytes)
}
