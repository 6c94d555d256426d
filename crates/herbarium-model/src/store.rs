//! Tensor store: strict and lenient parameter loading.
//!
//! `TensorStore` adapts a [`WeightArtifact`](crate::WeightArtifact) into
//! a `candle_nn` VarBuilder backend. In strict mode a missing or
//! shape-mismatched parameter aborts the load; in lenient mode the
//! layer's own initializer fills the gap and the miss is recorded, which
//! is what lets the resolver count how badly an artifact matched an
//! architecture.

use candle_core::{DType, Device, Shape, Tensor};
use candle_nn::var_builder::SimpleBackend;
use candle_nn::Init;
use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex};

use crate::artifact::WeightArtifact;

/// How to treat parameters the artifact does not provide
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadMode {
    /// Any missing or mismatched parameter is an error
    Strict,
    /// Missing parameters fall back to fresh initialization
    Lenient,
}

/// Accounting shared between the store and the caller that built it
#[derive(Debug, Default)]
pub struct LoadReport {
    missing: Mutex<BTreeSet<String>>,
    used: Mutex<BTreeSet<String>>,
}

impl LoadReport {
    /// Parameters the artifact did not provide (lenient mode only)
    pub fn missing_count(&self) -> usize {
        self.missing.lock().unwrap().len()
    }

    /// Names of the parameters the artifact did not provide
    pub fn missing_names(&self) -> Vec<String> {
        self.missing.lock().unwrap().iter().cloned().collect()
    }

    /// Artifact parameters the build never requested
    pub fn unexpected_names(&self, artifact: &WeightArtifact) -> Vec<String> {
        let used = self.used.lock().unwrap();
        artifact
            .keys()
            .filter(|k| !used.contains(*k))
            .map(str::to_string)
            .collect()
    }

    fn record_missing(&self, name: &str) {
        self.missing.lock().unwrap().insert(name.to_string());
    }

    fn record_used(&self, name: &str) {
        self.used.lock().unwrap().insert(name.to_string());
    }
}

/// VarBuilder backend over an artifact's tensor map
pub struct TensorStore {
    tensors: HashMap<String, Tensor>,
    mode: LoadMode,
    report: Arc<LoadReport>,
}

impl TensorStore {
    /// Create a store over the artifact's tensors
    pub fn new(artifact: &WeightArtifact, mode: LoadMode) -> Self {
        let tensors = artifact
            .keys()
            .filter_map(|k| artifact.get(k).map(|t| (k.to_string(), t.clone())))
            .collect();
        Self {
            tensors,
            mode,
            report: Arc::new(LoadReport::default()),
        }
    }

    /// Handle to the load accounting, valid after the store is consumed
    pub fn report(&self) -> Arc<LoadReport> {
        Arc::clone(&self.report)
    }
}

impl SimpleBackend for TensorStore {
    fn get(
        &self,
        s: Shape,
        name: &str,
        h: Init,
        dtype: DType,
        dev: &Device,
    ) -> candle_core::Result<Tensor> {
        match self.tensors.get(name) {
            Some(tensor) if tensor.shape() == &s => {
                self.report.record_used(name);
                tensor.to_device(dev)?.to_dtype(dtype)
            }
            Some(tensor) => match self.mode {
                LoadMode::Strict => candle_core::bail!(
                    "shape mismatch for {}: artifact has {:?}, expected {:?}",
                    name,
                    tensor.shape(),
                    s
                ),
                LoadMode::Lenient => {
                    tracing::debug!(
                        "Parameter {} has shape {:?}, expected {:?}; reinitializing",
                        name,
                        tensor.shape(),
                        s
                    );
                    self.report.record_missing(name);
                    Ok(h.var(s, dtype, dev)?.as_tensor().clone())
                }
            },
            None => match self.mode {
                LoadMode::Strict => {
                    candle_core::bail!("cannot find parameter {} in weight artifact", name)
                }
                LoadMode::Lenient => {
                    self.report.record_missing(name);
                    Ok(h.var(s, dtype, dev)?.as_tensor().clone())
                }
            },
        }
    }

    fn contains_tensor(&self, name: &str) -> bool {
        self.tensors.contains_key(name)
    }
}
