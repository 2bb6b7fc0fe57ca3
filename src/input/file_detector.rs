//! Document format detection from a declared extension

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FileType {
    Pdf,
    Docx,
    Text,
    Markdown,
    Unknown,
}

impl FileType {
    /// Accepts `pdf`, `.PDF`, `docx` and so on
    pub fn from_extension(ext: &str) -> Self {
        match ext.trim().trim_start_matches('.').to_lowercase().as_str() {
            "pdf" => FileType::Pdf,
            "docx" | "doc" => FileType::Docx,
            "txt" => FileType::Text,
            "md" | "markdown" => FileType::Markdown,
            _ => FileType::Unknown,
        }
    }

    pub fn is_supported(&self) -> bool {
        !matches!(self, FileType::Unknown)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_variants() {
        assert_eq!(FileType::from_extension("pdf"), FileType::Pdf);
        assert_eq!(FileType::from_extension(".PDF"), FileType::Pdf);
        assert_eq!(FileType::from_extension(".doc"), FileType::Docx);
        assert_eq!(FileType::from_extension("Markdown"), FileType::Markdown);
        assert_eq!(FileType::from_extension("xyz"), FileType::Unknown);
        assert!(!FileType::from_extension("").is_supported());
    }
}
