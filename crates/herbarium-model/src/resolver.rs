//! Model resolution: weight artifact → usable classifier network.
//!
//! Resolution walks an ordered list of (predicate, loader) strategies;
//! the first success wins and the final entry always succeeds. Failures
//! before the final entry are logged and swallowed (the service prefers
//! starting with *a* model over refusing to start), but the provenance
//! of the winning strategy is kept so an untrained fallback is never
//! served silently.

use candle_core::{DType, Device, Module, Tensor};
use candle_nn::{VarBuilder, VarMap};
use candle_transformers::models::efficientnet::{EfficientNet, MBConvConfig};
use herbarium_core::Result;

use crate::artifact::WeightArtifact;
use crate::fallback::FallbackCnn;
use crate::stem_net::StemEfficientNet;
use crate::store::{LoadMode, TensorStore};

/// Missing-parameter tolerance for the standard architecture when the
/// artifact announces a stem-convolution layout. Above this, the
/// artifact clearly belongs to the alternate implementation.
pub const MISSING_KEY_THRESHOLD: usize = 10;

/// The network behind a resolved classifier handle
pub enum ResolvedNet {
    /// Standard EfficientNet-B3
    Standard(EfficientNet),
    /// Stem-convolution-layout EfficientNet variant
    Stem(StemEfficientNet),
    /// Freshly initialized fallback CNN
    Fallback(FallbackCnn),
}

impl Module for ResolvedNet {
    fn forward(&self, xs: &Tensor) -> candle_core::Result<Tensor> {
        match self {
            Self::Standard(net) => net.forward(xs),
            Self::Stem(net) => net.forward(xs),
            Self::Fallback(net) => net.forward(xs),
        }
    }
}

impl std::fmt::Debug for ResolvedNet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Standard(_) => "Standard",
            Self::Stem(_) => "Stem",
            Self::Fallback(_) => "Fallback",
        };
        f.write_str(name)
    }
}

/// How a model came to be: which strategy won and what it cost
#[derive(Debug, Clone)]
pub struct ModelProvenance {
    /// Name of the winning strategy
    pub strategy: &'static str,

    /// Parameters the artifact did not provide
    pub missing_parameters: usize,

    /// False when the model was freshly initialized instead of loaded
    pub trained: bool,
}

/// A resolved network plus its provenance
#[derive(Debug)]
pub struct ResolvedModel {
    pub net: ResolvedNet,
    pub provenance: ModelProvenance,
}

struct Strategy {
    name: &'static str,
    applies: fn(&WeightArtifact) -> bool,
    build: fn(&WeightArtifact, usize, &Device) -> Result<ResolvedModel>,
}

/// Ordered strategy table. The final entry must succeed for any input;
/// its failure is the only fatal resolution error.
const STRATEGIES: &[Strategy] = &[
    Strategy {
        name: "standard-stem",
        applies: |artifact| artifact.has_stem_layout(),
        build: load_standard_stem,
    },
    Strategy {
        name: "stem-alternate",
        applies: |artifact| artifact.has_stem_layout(),
        build: load_stem_alternate,
    },
    Strategy {
        name: "standard-strict",
        applies: |artifact| !artifact.has_stem_layout(),
        build: load_standard_strict,
    },
    Strategy {
        name: "untrained-fallback",
        applies: |_| true,
        build: load_fallback,
    },
];

/// Resolve a weight artifact into a usable network bound to `device`.
pub fn resolve(
    artifact: &WeightArtifact,
    num_classes: usize,
    device: &Device,
) -> Result<ResolvedModel> {
    let Some((default, candidates)) = STRATEGIES.split_last() else {
        return Err(herbarium_core::Error::internal("empty strategy table"));
    };

    for strategy in candidates {
        if !(strategy.applies)(artifact) {
            continue;
        }
        match (strategy.build)(artifact, num_classes, device) {
            Ok(model) => {
                tracing::info!(
                    "Resolved model via strategy `{}` ({} missing parameters)",
                    model.provenance.strategy,
                    model.provenance.missing_parameters
                );
                return Ok(model);
            }
            Err(e) => {
                tracing::warn!("Strategy `{}` failed: {}", strategy.name, e);
            }
        }
    }

    // Guaranteed default; an error here is fatal and propagates.
    let model = (default.build)(artifact, num_classes, device)?;
    tracing::warn!(
        "No weight-matching strategy succeeded; serving a freshly initialized fallback network"
    );
    Ok(model)
}

fn build_standard(
    artifact: &WeightArtifact,
    num_classes: usize,
    device: &Device,
    mode: LoadMode,
) -> Result<(EfficientNet, std::sync::Arc<crate::store::LoadReport>)> {
    let store = TensorStore::new(artifact, mode);
    let report = store.report();
    let vb = VarBuilder::from_backend(Box::new(store), DType::F32, device.clone());
    let net = EfficientNet::new(vb, MBConvConfig::b3(), num_classes)
        .map_err(|e| herbarium_core::Error::model(format!("Failed to build EfficientNet: {}", e)))?;
    Ok((net, report))
}

/// Standard architecture against a stem-layout artifact: load leniently
/// and accept only a near-complete match.
fn load_standard_stem(
    artifact: &WeightArtifact,
    num_classes: usize,
    device: &Device,
) -> Result<ResolvedModel> {
    let (net, report) = build_standard(artifact, num_classes, device, LoadMode::Lenient)?;
    let missing = report.missing_count();
    if missing > MISSING_KEY_THRESHOLD {
        return Err(herbarium_core::Error::model(format!(
            "{} parameters missing from artifact (threshold {})",
            missing, MISSING_KEY_THRESHOLD
        )));
    }
    Ok(ResolvedModel {
        net: ResolvedNet::Standard(net),
        provenance: ModelProvenance {
            strategy: "standard-stem",
            missing_parameters: missing,
            trained: true,
        },
    })
}

/// Alternate implementation of the same family; missing and unexpected
/// parameters tolerated.
fn load_stem_alternate(
    artifact: &WeightArtifact,
    num_classes: usize,
    device: &Device,
) -> Result<ResolvedModel> {
    let store = TensorStore::new(artifact, LoadMode::Lenient);
    let report = store.report();
    let vb = VarBuilder::from_backend(Box::new(store), DType::F32, device.clone());
    let net = StemEfficientNet::new(vb, num_classes).map_err(|e| {
        herbarium_core::Error::model(format!("Failed to build stem-layout EfficientNet: {}", e))
    })?;
    let missing = report.missing_count();
    Ok(ResolvedModel {
        net: ResolvedNet::Stem(net),
        provenance: ModelProvenance {
            strategy: "stem-alternate",
            missing_parameters: missing,
            trained: true,
        },
    })
}

/// Conventional layout: every parameter must be present, nothing extra.
fn load_standard_strict(
    artifact: &WeightArtifact,
    num_classes: usize,
    device: &Device,
) -> Result<ResolvedModel> {
    let (net, report) = build_standard(artifact, num_classes, device, LoadMode::Strict)?;
    let unexpected = report.unexpected_names(artifact);
    if !unexpected.is_empty() {
        return Err(herbarium_core::Error::model(format!(
            "{} unexpected parameters in artifact (first: {})",
            unexpected.len(),
            unexpected[0]
        )));
    }
    Ok(ResolvedModel {
        net: ResolvedNet::Standard(net),
        provenance: ModelProvenance {
            strategy: "standard-strict",
            missing_parameters: 0,
            trained: true,
        },
    })
}

/// Guaranteed default: fresh weights, marked untrained.
fn load_fallback(
    _artifact: &WeightArtifact,
    num_classes: usize,
    device: &Device,
) -> Result<ResolvedModel> {
    let varmap = VarMap::new();
    let vb = VarBuilder::from_varmap(&varmap, DType::F32, device);
    let net = FallbackCnn::new(vb, num_classes).map_err(|e| {
        herbarium_core::Error::model(format!("Failed to build fallback network: {}", e))
    })?;
    Ok(ResolvedModel {
        net: ResolvedNet::Fallback(net),
        provenance: ModelProvenance {
            strategy: "untrained-fallback",
            missing_parameters: 0,
            trained: false,
        },
    })
}
