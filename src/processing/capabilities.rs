//! Optional dependencies, probed once at startup
//!
//! The OCR engine and the semantic encoder are both optional. Whatever is
//! missing is recorded here and the rest of the pipeline just receives `None`.

use crate::config::Config;
use crate::error::AtsCheckerError;
use crate::input::ocr::{OcrEngine, TesseractOcr};
use crate::processing::embedding_manager::is_valid_model_dir;
use crate::processing::embeddings::{EmbeddingEngine, SemanticEncoder};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    Ocr,
    SemanticMatching,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DegradedCapability {
    pub capability: Capability,
    pub reason: String,
}

#[derive(Clone, Default)]
pub struct Capabilities {
    pub ocr: Option<Arc<dyn OcrEngine>>,
    pub encoder: Option<Arc<dyn SemanticEncoder>>,
    pub degraded: Vec<DegradedCapability>,
}

impl Capabilities {
    pub fn probe(config: &Config) -> Self {
        let mut capabilities = Self::default();

        let tesseract = TesseractOcr::from_config(&config.extraction);
        match tesseract.probe() {
            Ok(()) => {
                info!("OCR available via {}", config.extraction.tesseract_path);
                capabilities.ocr = Some(Arc::new(tesseract));
            }
            Err(e) => capabilities.record(Capability::Ocr, e),
        }

        match load_encoder(config) {
            Ok(engine) => {
                info!("Semantic matching enabled with {}", engine.model_name());
                capabilities.encoder = Some(Arc::new(engine));
            }
            Err(e) => capabilities.record(Capability::SemanticMatching, e),
        }

        capabilities
    }

    /// Exact matching and text layers only
    pub fn disabled() -> Self {
        Self::default()
            .without(Capability::Ocr, "disabled")
            .without(Capability::SemanticMatching, "disabled")
    }

    pub fn with_ocr(mut self, ocr: Arc<dyn OcrEngine>) -> Self {
        self.ocr = Some(ocr);
        self.degraded.retain(|d| d.capability != Capability::Ocr);
        self
    }

    pub fn with_encoder(mut self, encoder: Arc<dyn SemanticEncoder>) -> Self {
        self.encoder = Some(encoder);
        self.degraded.retain(|d| d.capability != Capability::SemanticMatching);
        self
    }

    fn without(mut self, capability: Capability, reason: &str) -> Self {
        self.degraded.push(DegradedCapability {
            capability,
            reason: reason.to_string(),
        });
        self
    }

    fn record(&mut self, capability: Capability, error: AtsCheckerError) {
        warn!("{} unavailable, continuing without it: {}", capability, error);
        self.degraded.push(DegradedCapability {
            capability,
            reason: error.to_string(),
        });
    }

    pub fn is_degraded(&self, capability: Capability) -> bool {
        self.degraded.iter().any(|d| d.capability == capability)
    }
}

fn load_encoder(config: &Config) -> crate::error::Result<EmbeddingEngine> {
    if !config.models.enable_semantic {
        return Err(AtsCheckerError::MissingDependency(
            "semantic matching disabled in configuration".to_string(),
        ));
    }

    let path = config.embedding_model_path();
    if !is_valid_model_dir(&path) {
        return Err(AtsCheckerError::MissingDependency(format!(
            "embedding model {} not found in {} (run `models download {}`)",
            config.models.default_embedding_model,
            config.models.models_dir.display(),
            config.models.default_embedding_model
        )));
    }

    EmbeddingEngine::new(&path, &config.models.default_embedding_model)
        .map_err(|e| AtsCheckerError::MissingDependency(e.to_string()))
}

impl fmt::Debug for Capabilities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Capabilities")
            .field("ocr", &self.ocr.as_ref().map(|o| o.name().to_string()))
            .field("encoder", &self.encoder.as_ref().map(|e| e.model_name().to_string()))
            .field("degraded", &self.degraded)
            .finish()
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Capability::Ocr => write!(f, "OCR"),
            Capability::SemanticMatching => write!(f, "semantic matching"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    struct NullEncoder;

    impl SemanticEncoder for NullEncoder {
        fn encode(&self, texts: &[String]) -> Vec<Vec<f32>> {
            texts.iter().map(|_| vec![0.0]).collect()
        }

        fn model_name(&self) -> &str {
            "null"
        }
    }

    #[test]
    fn test_probe_without_dependencies() {
        let temp_dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config.models.models_dir = temp_dir.path().to_path_buf();
        config.extraction.tesseract_path = "/nonexistent/tesseract".to_string();

        let capabilities = Capabilities::probe(&config);
        assert!(capabilities.ocr.is_none());
        assert!(capabilities.encoder.is_none());
        assert!(capabilities.is_degraded(Capability::Ocr));
        assert!(capabilities.is_degraded(Capability::SemanticMatching));
    }

    #[test]
    fn test_semantic_disabled_by_config() {
        let mut config = Config::default();
        config.models.enable_semantic = false;

        let capabilities = Capabilities::probe(&config);
        let semantic = capabilities
            .degraded
            .iter()
            .find(|d| d.capability == Capability::SemanticMatching)
            .unwrap();
        assert!(semantic.reason.contains("disabled"));
    }

    #[test]
    fn test_builders_clear_degradation() {
        let capabilities = Capabilities::disabled().with_encoder(Arc::new(NullEncoder));
        assert!(capabilities.encoder.is_some());
        assert!(!capabilities.is_degraded(Capability::SemanticMatching));
        assert!(capabilities.is_degraded(Capability::Ocr));
    }
}
