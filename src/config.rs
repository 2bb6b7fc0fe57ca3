//! Configuration management for the resume recommender

use crate::error::{RecommenderError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Embedding dimension of the deterministic fallback (matches MiniLM-sized models)
pub const DEFAULT_EMBEDDING_DIM: usize = 384;

/// PDF text shorter than this triggers the fallback extractor
pub const DEFAULT_PDF_FALLBACK_THRESHOLD: usize = 100;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub models: ModelConfig,
    pub extraction: ExtractionConfig,
    pub recommendation: RecommendationConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Local Model2Vec model directory. `None` means fallback embeddings only.
    pub embedding_model_path: Option<PathBuf>,
    pub embedding_dim: usize,
    /// Trained classifier artifact (JSON) produced by the offline training pipeline
    pub classifier_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionConfig {
    pub pdf_fallback_threshold: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationConfig {
    pub default_limit: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub format: OutputFormat,
    pub color_output: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputFormat {
    Console,
    Json,
    Markdown,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            embedding_model_path: None,
            embedding_dim: DEFAULT_EMBEDDING_DIM,
            classifier_path: None,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            models: ModelConfig::default(),
            extraction: ExtractionConfig {
                pdf_fallback_threshold: DEFAULT_PDF_FALLBACK_THRESHOLD,
            },
            recommendation: RecommendationConfig { default_limit: 5 },
            output: OutputConfig {
                format: OutputFormat::Console,
                color_output: true,
            },
        }
    }
}

impl Config {
    /// Load from the default location, writing defaults on first use
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        if config_path.exists() {
            let content = std::fs::read_to_string(config_path)?;
            let config: Config = toml::from_str(&content).map_err(|e| {
                RecommenderError::Configuration(format!("Failed to parse config: {}", e))
            })?;
            config.validate()?;
            Ok(config)
        } else {
            let config = Self::default();
            config.save_to(config_path)?;
            Ok(config)
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self).map_err(|e| {
            RecommenderError::Configuration(format!("Failed to serialize config: {}", e))
        })?;

        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
            .join("resume-recommender")
            .join("config.toml")
    }

    fn validate(&self) -> Result<()> {
        if self.models.embedding_dim == 0 {
            return Err(RecommenderError::Configuration(
                "models.embedding_dim must be greater than zero".to_string(),
            ));
        }
        if self.recommendation.default_limit == 0 {
            return Err(RecommenderError::Configuration(
                "recommendation.default_limit must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_writes_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let config = Config::load_from(&path).unwrap();
        assert!(path.exists());
        assert_eq!(config.models.embedding_dim, DEFAULT_EMBEDDING_DIM);
        assert_eq!(config.recommendation.default_limit, 5);
    }

    #[test]
    fn test_round_trip_through_toml() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");

        let mut config = Config::default();
        config.models.classifier_path = Some(PathBuf::from("/tmp/classifier.json"));
        config.output.format = OutputFormat::Markdown;
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.output.format, OutputFormat::Markdown);
        assert_eq!(
            loaded.models.classifier_path,
            Some(PathBuf::from("/tmp/classifier.json"))
        );
    }

    #[test]
    fn test_zero_dimension_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");

        let mut config = Config::default();
        config.models.embedding_dim = 0;
        config.save_to(&path).unwrap();

        assert!(matches!(
            Config::load_from(&path),
            Err(RecommenderError::Configuration(_))
        ));
    }
}
