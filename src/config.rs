//! Configuration management for the ATS resume checker

use crate::error::{AtsCheckerError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub models: ModelConfig,
    pub extraction: ExtractionConfig,
    pub matching: MatchingConfig,
    pub scoring: ScoringConfig,
    pub feedback: FeedbackConfig,
    pub profiles: ProfileConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub models_dir: PathBuf,
    pub default_embedding_model: String,
    /// Turn the embedding-based partial matching on or off
    pub enable_semantic: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Below this many non-whitespace characters per page a PDF counts as scanned
    pub min_chars_per_page: usize,
    pub accepted_formats: Vec<String>,
    pub tesseract_path: String,
    pub pdftoppm_path: String,
    pub ocr_dpi: u32,
    pub ocr_language: String,
    /// Mean word confidence (0-100) under which OCR output is flagged as degraded
    pub ocr_min_confidence: f32,
    pub max_file_size_mb: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchingConfig {
    pub semantic_threshold: f32,
    pub partial_match_weight: f64,
    pub max_job_keywords: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub critical_penalty: f64,
    pub warning_penalty: f64,
    pub info_penalty: f64,
    /// Ratio used to split the non-keyword weight. Even split when absent.
    pub explicit_weights: Option<ExplicitWeights>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExplicitWeights {
    pub formatting: f64,
    pub structure: f64,
    pub file_type: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedbackConfig {
    pub needs_improvement_threshold: f64,
    pub strong_threshold: f64,
    pub max_missing_keywords: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileConfig {
    /// JSON file replacing the built-in ATS platform table
    pub path: Option<PathBuf>,
    pub default_profile: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub format: OutputFormat,
    pub detailed: bool,
    pub color_output: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputFormat {
    Console,
    Json,
    Markdown,
    Html,
}

impl Default for ModelConfig {
    fn default() -> Self {
        let models_dir = dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".ats-resume-checker")
            .join("models");

        Self {
            models_dir,
            default_embedding_model: "potion-base-8M".to_string(),
            enable_semantic: true,
        }
    }
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            min_chars_per_page: 100,
            accepted_formats: vec![
                "pdf".to_string(),
                "docx".to_string(),
                "txt".to_string(),
                "md".to_string(),
            ],
            tesseract_path: "tesseract".to_string(),
            pdftoppm_path: "pdftoppm".to_string(),
            ocr_dpi: 300,
            ocr_language: "eng".to_string(),
            ocr_min_confidence: 60.0,
            max_file_size_mb: 10,
        }
    }
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            semantic_threshold: 0.75,
            partial_match_weight: 0.5,
            max_job_keywords: 30,
        }
    }
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            critical_penalty: 15.0,
            warning_penalty: 5.0,
            info_penalty: 1.0,
            explicit_weights: None,
        }
    }
}

impl Default for FeedbackConfig {
    fn default() -> Self {
        Self {
            needs_improvement_threshold: 60.0,
            strong_threshold: 80.0,
            max_missing_keywords: 10,
        }
    }
}

impl Default for ProfileConfig {
    fn default() -> Self {
        Self {
            path: None,
            default_profile: "taleo".to_string(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::Console,
            detailed: false,
            color_output: true,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load from an explicit path, or from the user config directory.
    /// A missing file is created with defaults.
    pub fn load_from(path: Option<&Path>) -> Result<Self> {
        let config_path = path.map(Path::to_path_buf).unwrap_or_else(Self::config_path);

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: Config = toml::from_str(&content)
                .map_err(|e| AtsCheckerError::Configuration(format!("Failed to parse config: {}", e)))?;
            config.validate()?;
            Ok(config)
        } else {
            let config = Self::default();
            config.save_to(&config_path)?;
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

        let content = toml::to_string_pretty(self)
            .map_err(|e| AtsCheckerError::Configuration(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
            .join("ats-resume-checker")
            .join("config.toml")
    }

    pub fn validate(&self) -> Result<()> {
        let matching = &self.matching;
        if !(0.0..=1.0).contains(&matching.semantic_threshold) {
            return Err(AtsCheckerError::Configuration(format!(
                "matching.semantic_threshold must be within [0, 1], got {}",
                matching.semantic_threshold
            )));
        }
        if !(0.0..=1.0).contains(&matching.partial_match_weight) {
            return Err(AtsCheckerError::Configuration(format!(
                "matching.partial_match_weight must be within [0, 1], got {}",
                matching.partial_match_weight
            )));
        }
        if matching.max_job_keywords == 0 {
            return Err(AtsCheckerError::Configuration(
                "matching.max_job_keywords must be at least 1".to_string(),
            ));
        }

        let scoring = &self.scoring;
        for (name, value) in [
            ("critical_penalty", scoring.critical_penalty),
            ("warning_penalty", scoring.warning_penalty),
            ("info_penalty", scoring.info_penalty),
        ] {
            if value < 0.0 {
                return Err(AtsCheckerError::Configuration(format!(
                    "scoring.{} must not be negative, got {}",
                    name, value
                )));
            }
        }
        if let Some(weights) = scoring.explicit_weights {
            let parts = [weights.formatting, weights.structure, weights.file_type];
            if parts.iter().any(|w| *w < 0.0) || parts.iter().sum::<f64>() <= 0.0 {
                return Err(AtsCheckerError::Configuration(
                    "scoring.explicit_weights must be non-negative with a positive sum".to_string(),
                ));
            }
        }

        let feedback = &self.feedback;
        if feedback.needs_improvement_threshold > feedback.strong_threshold {
            return Err(AtsCheckerError::Configuration(format!(
                "feedback.needs_improvement_threshold ({}) is above feedback.strong_threshold ({})",
                feedback.needs_improvement_threshold, feedback.strong_threshold
            )));
        }

        if self.extraction.ocr_dpi == 0 {
            return Err(AtsCheckerError::Configuration(
                "extraction.ocr_dpi must be positive".to_string(),
            ));
        }

        Ok(())
    }

    pub fn models_dir(&self) -> &PathBuf {
        &self.models.models_dir
    }

    /// Directory the default embedding model is expected in
    pub fn embedding_model_path(&self) -> PathBuf {
        self.models.models_dir.join(&self.models.default_embedding_model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.extraction.min_chars_per_page, 100);
        assert_eq!(config.profiles.default_profile, "taleo");
        assert!(!config.extraction.accepted_formats.contains(&"png".to_string()));
    }

    #[test]
    fn test_load_creates_default_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("config.toml");

        let config = Config::load_from(Some(&path)).unwrap();
        assert!(path.exists());
        assert_eq!(config.matching.max_job_keywords, 30);
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(&path, "[matching]\nsemantic_threshold = 0.8\n").unwrap();

        let config = Config::load_from(Some(&path)).unwrap();
        assert!((config.matching.semantic_threshold - 0.8).abs() < f32::EPSILON);
        assert_eq!(config.scoring.critical_penalty, 15.0);
    }

    #[test]
    fn test_rejects_out_of_range_threshold() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(&path, "[matching]\nsemantic_threshold = 1.5\n").unwrap();

        let result = Config::load_from(Some(&path));
        assert!(matches!(result, Err(AtsCheckerError::Configuration(_))));
    }

    #[test]
    fn test_round_trips_explicit_weights() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");

        let mut config = Config::default();
        config.scoring.explicit_weights = Some(ExplicitWeights {
            formatting: 3.0,
            structure: 2.0,
            file_type: 1.0,
        });
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(Some(&path)).unwrap();
        assert_eq!(loaded.scoring.explicit_weights, config.scoring.explicit_weights);
    }
}
