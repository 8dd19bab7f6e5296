//! Embedding model management for downloading and managing Model2Vec models

use crate::error::{AtsCheckerError, Result};
use hf_hub::api::tokio::Api;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use tokio::fs;

/// Information about an available embedding model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingModelInfo {
    pub id: String,
    pub name: String,
    pub repo_id: String,
    pub size_mb: u64,
    pub description: String,
    pub dimensions: u32,
}

/// Manager for embedding models - handles download, listing and removal
pub struct EmbeddingModelManager {
    models_dir: PathBuf,
    available_models: BTreeMap<String, EmbeddingModelInfo>,
    downloaded_models: BTreeSet<String>,
}

/// A model directory is usable when it holds a tokenizer and weights
pub fn is_valid_model_dir(path: &Path) -> bool {
    let has_weights = path.join("model.safetensors").is_file() || path.join("model.onnx").is_file();
    has_weights && path.join("tokenizer.json").is_file()
}

impl EmbeddingModelManager {
    pub async fn new(models_dir: PathBuf) -> Result<Self> {
        if !models_dir.exists() {
            fs::create_dir_all(&models_dir).await.map_err(|e| {
                AtsCheckerError::ModelError(format!("Failed to create models directory: {}", e))
            })?;
        }

        let mut manager = Self {
            models_dir,
            available_models: known_models(),
            downloaded_models: BTreeSet::new(),
        };
        manager.scan_downloaded_models().await?;

        Ok(manager)
    }

    async fn scan_downloaded_models(&mut self) -> Result<()> {
        let mut entries = fs::read_dir(&self.models_dir).await.map_err(|e| {
            AtsCheckerError::ModelError(format!("Failed to scan models directory: {}", e))
        })?;

        while let Some(entry) = entries.next_entry().await.map_err(|e| {
            AtsCheckerError::ModelError(format!("Failed to read directory entry: {}", e))
        })? {
            let path = entry.path();
            if path.is_dir() && is_valid_model_dir(&path) {
                self.downloaded_models
                    .insert(entry.file_name().to_string_lossy().to_string());
            }
        }

        Ok(())
    }

    /// Download an embedding model from Hugging Face Hub
    pub async fn download_model(&mut self, model_id: &str) -> Result<PathBuf> {
        let model_id = self
            .resolve_model_id(model_id)
            .ok_or_else(|| AtsCheckerError::ModelNotFound(format!("Unknown embedding model: {}", model_id)))?;
        let model_info = &self.available_models[&model_id];
        let model_dir = self.models_dir.join(&model_id);

        if self.downloaded_models.contains(&model_id) {
            info!("Model {} is already downloaded", model_id);
            return Ok(model_dir);
        }

        info!(
            "Downloading embedding model: {} ({} MB) from {}",
            model_info.name, model_info.size_mb, model_info.repo_id
        );

        fs::create_dir_all(&model_dir).await.map_err(|e| {
            AtsCheckerError::ModelError(format!("Failed to create model directory: {}", e))
        })?;

        let api = Api::new()
            .map_err(|e| AtsCheckerError::ModelError(format!("Failed to initialize HF API: {}", e)))?;
        let repo = api.model(model_info.repo_id.clone());

        for (file, required) in [
            ("model.safetensors", true),
            ("tokenizer.json", true),
            ("config.json", false),
            ("README.md", false),
        ] {
            match repo.get(file).await {
                Ok(cached) => {
                    fs::copy(&cached, model_dir.join(file)).await.map_err(|e| {
                        AtsCheckerError::ModelError(format!("Failed to copy {}: {}", file, e))
                    })?;
                    info!("Downloaded: {}", file);
                }
                Err(e) if !required => warn!("Optional file {} not found: {}", file, e),
                Err(e) => {
                    return Err(AtsCheckerError::ModelError(format!(
                        "Failed to download required file {}: {}",
                        file, e
                    )))
                }
            }
        }

        self.downloaded_models.insert(model_id.clone());
        info!("Embedding model {} downloaded", model_id);
        Ok(model_dir)
    }

    /// Delete a downloaded model directory
    pub async fn remove_model(&mut self, model_id: &str) -> Result<()> {
        let model_id = self.resolve_model_id(model_id).unwrap_or_else(|| model_id.to_string());
        if !self.downloaded_models.contains(&model_id) {
            return Err(AtsCheckerError::ModelNotFound(format!(
                "Model {} is not downloaded",
                model_id
            )));
        }

        fs::remove_dir_all(self.models_dir.join(&model_id)).await?;
        self.downloaded_models.remove(&model_id);
        info!("Removed embedding model {}", model_id);
        Ok(())
    }

    pub fn get_model_path(&self, model_id: &str) -> Option<PathBuf> {
        if self.downloaded_models.contains(model_id) {
            Some(self.models_dir.join(model_id))
        } else {
            None
        }
    }

    pub fn list_available_models(&self) -> Vec<&EmbeddingModelInfo> {
        self.available_models.values().collect()
    }

    pub fn list_downloaded_models(&self) -> Vec<String> {
        self.downloaded_models.iter().cloned().collect()
    }

    pub fn is_model_downloaded(&self, model_id: &str) -> bool {
        self.downloaded_models.contains(model_id)
    }

    /// Resolve model ID from an id, a repo id or a display name
    pub fn resolve_model_id(&self, input: &str) -> Option<String> {
        if self.available_models.contains_key(input) {
            return Some(input.to_string());
        }

        let input_lower = input.to_lowercase();
        self.available_models
            .values()
            .find(|info| info.repo_id == input || info.name.to_lowercase() == input_lower)
            .map(|info| info.id.clone())
    }
}

fn known_models() -> BTreeMap<String, EmbeddingModelInfo> {
    [
        (
            "potion-base-8M",
            "Potion Base 8M",
            "minishlab/potion-base-8M",
            33,
            "Model2Vec embeddings with 8M parameters (recommended)",
            256,
        ),
        (
            "potion-base-4M",
            "Potion Base 4M",
            "minishlab/potion-base-4M",
            16,
            "Smaller Model2Vec embeddings for low-memory machines",
            128,
        ),
        (
            "m2v-base",
            "Model2Vec Base",
            "minishlab/M2V_base_output",
            90,
            "Legacy Model2Vec base embeddings model",
            256,
        ),
    ]
    .into_iter()
    .map(|(id, name, repo_id, size_mb, description, dimensions)| {
        (
            id.to_string(),
            EmbeddingModelInfo {
                id: id.to_string(),
                name: name.to_string(),
                repo_id: repo_id.to_string(),
                size_mb,
                description: description.to_string(),
                dimensions,
            },
        )
    })
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_manager_creation() {
        let temp_dir = TempDir::new().unwrap();
        let manager = EmbeddingModelManager::new(temp_dir.path().join("models")).await.unwrap();

        assert!(!manager.list_available_models().is_empty());
        assert!(manager.list_downloaded_models().is_empty());
    }

    #[tokio::test]
    async fn test_scan_finds_valid_model_dirs() {
        let temp_dir = TempDir::new().unwrap();
        let model_dir = temp_dir.path().join("potion-base-8M");
        std::fs::create_dir_all(&model_dir).unwrap();
        std::fs::write(model_dir.join("model.safetensors"), b"weights").unwrap();
        std::fs::write(model_dir.join("tokenizer.json"), b"{}").unwrap();
        std::fs::create_dir_all(temp_dir.path().join("incomplete")).unwrap();

        let manager = EmbeddingModelManager::new(temp_dir.path().to_path_buf()).await.unwrap();
        assert_eq!(manager.list_downloaded_models(), vec!["potion-base-8M".to_string()]);
        assert!(manager.get_model_path("potion-base-8M").is_some());
    }

    #[tokio::test]
    async fn test_remove_model() {
        let temp_dir = TempDir::new().unwrap();
        let model_dir = temp_dir.path().join("potion-base-8M");
        std::fs::create_dir_all(&model_dir).unwrap();
        std::fs::write(model_dir.join("model.safetensors"), b"weights").unwrap();
        std::fs::write(model_dir.join("tokenizer.json"), b"{}").unwrap();

        let mut manager = EmbeddingModelManager::new(temp_dir.path().to_path_buf()).await.unwrap();
        manager.remove_model("potion-base-8M").await.unwrap();
        assert!(!model_dir.exists());
        assert!(!manager.is_model_downloaded("potion-base-8M"));

        let again = manager.remove_model("potion-base-8M").await;
        assert!(matches!(again, Err(AtsCheckerError::ModelNotFound(_))));
    }

    #[tokio::test]
    async fn test_resolve_model_id() {
        let temp_dir = TempDir::new().unwrap();
        let manager = EmbeddingModelManager::new(temp_dir.path().to_path_buf()).await.unwrap();

        assert_eq!(manager.resolve_model_id("potion-base-8M"), Some("potion-base-8M".to_string()));
        assert_eq!(
            manager.resolve_model_id("minishlab/potion-base-8M"),
            Some("potion-base-8M".to_string())
        );
        assert_eq!(manager.resolve_model_id("Potion Base 8M"), Some("potion-base-8M".to_string()));
        assert_eq!(manager.resolve_model_id("gpt-5"), None);
    }
}
