//! Server configuration

use herbarium_model::ModelSource;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Path to the weight artifact on the local file system
    #[serde(default = "default_model_path")]
    pub model_path: String,

    /// Hugging Face repository to pull weights from instead of
    /// `model_path` (optional)
    #[serde(default)]
    pub hf_repo: Option<String>,

    /// Weight filename inside the Hugging Face repository
    #[serde(default = "default_hf_file")]
    pub hf_file: String,

    /// Inference device: auto, cpu, cuda, or metal
    #[serde(default = "default_device")]
    pub device: String,
}

impl ServerConfig {
    /// Load configuration from file and CLI overrides
    pub fn load(config_path: &str, cli: &crate::Cli) -> anyhow::Result<Self> {
        // Try to load from file, or use defaults
        let mut config: Self = if Path::new(config_path).exists() {
            let content = std::fs::read_to_string(config_path)?;
            serde_yaml::from_str(&content)?
        } else {
            Self::default()
        };

        // Apply CLI overrides
        if let Some(model) = &cli.model {
            config.model_path = model.clone();
            config.hf_repo = None;
        }

        if let Some(device) = &cli.device {
            config.device = device.clone();
        }

        Ok(config)
    }

    /// The weight source this configuration points at
    pub fn model_source(&self) -> ModelSource {
        match &self.hf_repo {
            Some(repo) => ModelSource::from_hf(repo.clone(), self.hf_file.clone()),
            None => ModelSource::from_local(&self.model_path),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            model_path: default_model_path(),
            hf_repo: None,
            hf_file: default_hf_file(),
            device: default_device(),
        }
    }
}

fn default_model_path() -> String {
    "./models/efficientnet_b3_model.pth".to_string()
}

fn default_hf_file() -> String {
    "model.safetensors".to_string()
}

fn default_device() -> String {
    "auto".to_string()
}
