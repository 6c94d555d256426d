//! Weight artifacts: serialized model parameters of unknown provenance.
//!
//! An artifact is an opaque mapping from parameter names to tensors. Its
//! key names determine which loading strategy the resolver applies; no
//! other internal structure is trusted.

use candle_core::{Device, Tensor};
use herbarium_core::Result;
use hf_hub::{api::sync::Api, Repo, RepoType};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Parameter name marking the stem-convolution weight layout
pub const STEM_CONV_KEY: &str = "conv_stem.weight";

/// Source location for model weights
#[derive(Debug, Clone)]
pub enum ModelSource {
    /// Load from local file system
    LocalPath(PathBuf),

    /// Download from Hugging Face Hub
    HuggingFace {
        repo_id: String,
        revision: Option<String>,
        filename: String,
    },
}

impl ModelSource {
    /// Create a source from a local path
    pub fn from_local(path: impl Into<PathBuf>) -> Self {
        Self::LocalPath(path.into())
    }

    /// Create a source from a Hugging Face repository
    pub fn from_hf(repo_id: impl Into<String>, filename: impl Into<String>) -> Self {
        Self::HuggingFace {
            repo_id: repo_id.into(),
            revision: None,
            filename: filename.into(),
        }
    }

    /// Resolve the source to a local file path, downloading if needed
    pub fn resolve(&self) -> Result<PathBuf> {
        match self {
            Self::LocalPath(path) => {
                if !path.exists() {
                    return Err(herbarium_core::Error::config(format!(
                        "Weight file not found: {:?}",
                        path
                    )));
                }
                Ok(path.clone())
            }
            Self::HuggingFace {
                repo_id,
                revision,
                filename,
            } => {
                let api = Api::new().map_err(|e| {
                    herbarium_core::Error::config(format!("Failed to initialize HF API: {}", e))
                })?;

                let repo = api.repo(Repo::with_revision(
                    repo_id.clone(),
                    RepoType::Model,
                    revision.clone().unwrap_or_else(|| "main".to_string()),
                ));

                repo.get(filename).map_err(|e| {
                    herbarium_core::Error::config(format!(
                        "Failed to download weights from HF: {}",
                        e
                    ))
                })
            }
        }
    }
}

/// An opaque blob of named tensors read from a weight file.
///
/// Tensors stay on the CPU until a loading strategy moves the ones it
/// needs onto the inference device.
#[derive(Debug, Clone, Default)]
pub struct WeightArtifact {
    tensors: HashMap<String, Tensor>,
}

impl WeightArtifact {
    /// Create an artifact directly from a tensor map
    pub fn from_tensors(tensors: HashMap<String, Tensor>) -> Self {
        Self { tensors }
    }

    /// An artifact with no parameters.
    ///
    /// Resolution of an empty artifact always ends at the untrained
    /// fallback network.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Load an artifact from a weight file.
    ///
    /// SafeTensors files are recognized by extension; everything else is
    /// treated as a PyTorch pickle archive (`.pt`, `.pth`, `.bin`).
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let is_safetensors = path
            .extension()
            .and_then(|s| s.to_str())
            .is_some_and(|ext| ext == "safetensors");

        let tensors = if is_safetensors {
            candle_core::safetensors::load(path, &Device::Cpu).map_err(|e| {
                herbarium_core::Error::model(format!("Failed to read SafeTensors file: {}", e))
            })?
        } else {
            candle_core::pickle::read_all(path)
                .map_err(|e| {
                    herbarium_core::Error::model(format!("Failed to read pickle archive: {}", e))
                })?
                .into_iter()
                .collect()
        };

        tracing::debug!(
            "Loaded weight artifact from {:?} ({} tensors)",
            path,
            tensors.len()
        );
        Ok(Self { tensors })
    }

    /// Resolve a source and load the artifact it points at.
    ///
    /// An unreadable source degrades to an empty artifact with a warning
    /// rather than an error; the resolver then falls back to the
    /// untrained network and the service still starts.
    pub fn load_or_empty(source: &ModelSource) -> Self {
        let loaded = source.resolve().and_then(Self::load);
        match loaded {
            Ok(artifact) => artifact,
            Err(e) => {
                tracing::warn!("Could not read weight artifact ({}); starting empty", e);
                Self::empty()
            }
        }
    }

    /// Number of named tensors in the artifact
    pub fn len(&self) -> usize {
        self.tensors.len()
    }

    /// Whether the artifact holds no tensors
    pub fn is_empty(&self) -> bool {
        self.tensors.is_empty()
    }

    /// Tensor for the given parameter name
    pub fn get(&self, name: &str) -> Option<&Tensor> {
        self.tensors.get(name)
    }

    /// Whether a parameter with this name exists
    pub fn contains(&self, name: &str) -> bool {
        self.tensors.contains_key(name)
    }

    /// Iterate over parameter names
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.tensors.keys().map(String::as_str)
    }

    /// Whether the key names follow the stem-convolution layout
    pub fn has_stem_layout(&self) -> bool {
        self.tensors.contains_key(STEM_CONV_KEY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_artifact() {
        let artifact = WeightArtifact::empty();
        assert!(artifact.is_empty());
        assert!(!artifact.has_stem_layout());
    }

    #[test]
    fn test_stem_layout_detection() {
        let device = Device::Cpu;
        let mut tensors = HashMap::new();
        tensors.insert(
            STEM_CONV_KEY.to_string(),
            Tensor::zeros((40, 3, 3, 3), candle_core::DType::F32, &device).unwrap(),
        );
        let artifact = WeightArtifact::from_tensors(tensors);
        assert!(artifact.has_stem_layout());
        assert_eq!(artifact.len(), 1);
    }

    #[test]
    fn test_missing_local_source() {
        let source = ModelSource::from_local("/definitely/not/here.pth");
        assert!(source.resolve().is_err());
    }

    #[test]
    fn test_load_or_empty_degrades() {
        let source = ModelSource::from_local("/definitely/not/here.pth");
        let artifact = WeightArtifact::load_or_empty(&source);
        assert!(artifact.is_empty());
    }
}
