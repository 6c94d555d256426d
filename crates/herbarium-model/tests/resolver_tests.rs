//! Integration tests for model resolution.
//!
//! These exercise the strategy list end to end: well-formed artifacts
//! load strictly, stem-layout artifacts route to the alternate
//! implementation, and corrupt or empty artifacts end at the untrained
//! fallback without aborting.

use candle_core::{DType, Device, Tensor};
use candle_nn::{VarBuilder, VarMap};
use candle_transformers::models::efficientnet::{EfficientNet, MBConvConfig};
use herbarium_core::catalog;
use herbarium_model::{resolve, Classifier, PlantClassifier, WeightArtifact};
use std::collections::HashMap;

const NUM_CLASSES: usize = 10;

/// Export the standard architecture's freshly initialized parameters as
/// an artifact, exactly as a conventional-layout weight file would hold
/// them.
fn standard_layout_tensors() -> HashMap<String, Tensor> {
    let device = Device::Cpu;
    let varmap = VarMap::new();
    let vb = VarBuilder::from_varmap(&varmap, DType::F32, &device);
    let _net = EfficientNet::new(vb, MBConvConfig::b3(), NUM_CLASSES).unwrap();

    let data = varmap.data().lock().unwrap();
    data.iter()
        .map(|(name, var)| (name.clone(), var.as_tensor().clone()))
        .collect()
}

#[test]
fn test_standard_layout_resolves_strictly() {
    let artifact = WeightArtifact::from_tensors(standard_layout_tensors());
    let model = resolve(&artifact, NUM_CLASSES, &Device::Cpu).unwrap();

    assert_eq!(model.provenance.strategy, "standard-strict");
    assert_eq!(model.provenance.missing_parameters, 0);
    assert!(model.provenance.trained);
}

#[test]
fn test_stem_marker_with_complete_standard_weights() {
    let mut tensors = standard_layout_tensors();
    tensors.insert(
        "conv_stem.weight".to_string(),
        Tensor::zeros((40, 3, 3, 3), DType::F32, &Device::Cpu).unwrap(),
    );
    let artifact = WeightArtifact::from_tensors(tensors);
    let model = resolve(&artifact, NUM_CLASSES, &Device::Cpu).unwrap();

    // Near-complete match: the lenient standard load wins outright.
    assert_eq!(model.provenance.strategy, "standard-stem");
    assert_eq!(model.provenance.missing_parameters, 0);
}

#[test]
fn test_sparse_stem_artifact_routes_to_alternate() {
    let mut tensors = HashMap::new();
    tensors.insert(
        "conv_stem.weight".to_string(),
        Tensor::zeros((40, 3, 3, 3), DType::F32, &Device::Cpu).unwrap(),
    );
    let artifact = WeightArtifact::from_tensors(tensors);
    let model = resolve(&artifact, NUM_CLASSES, &Device::Cpu).unwrap();

    // Far more than the missing-key tolerance for the standard net, so
    // the stem-layout implementation takes over.
    assert_eq!(model.provenance.strategy, "stem-alternate");
    assert!(model.provenance.missing_parameters > 0);
    assert!(model.provenance.trained);
}

#[test]
fn test_empty_artifact_falls_back_untrained() {
    let model = resolve(&WeightArtifact::empty(), NUM_CLASSES, &Device::Cpu).unwrap();

    assert_eq!(model.provenance.strategy, "untrained-fallback");
    assert!(!model.provenance.trained);
}

#[test]
fn test_garbage_artifact_falls_back_untrained() {
    let mut tensors = HashMap::new();
    tensors.insert(
        "totally.unrelated.weight".to_string(),
        Tensor::zeros((7, 7), DType::F32, &Device::Cpu).unwrap(),
    );
    let artifact = WeightArtifact::from_tensors(tensors);
    let model = resolve(&artifact, NUM_CLASSES, &Device::Cpu).unwrap();

    assert_eq!(model.provenance.strategy, "untrained-fallback");
}

#[test]
fn test_artifact_file_roundtrip() {
    let device = Device::Cpu;
    let varmap = VarMap::new();
    let vb = VarBuilder::from_varmap(&varmap, DType::F32, &device);
    let _net = EfficientNet::new(vb, MBConvConfig::b3(), NUM_CLASSES).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("weights.safetensors");
    varmap.save(&path).unwrap();

    let artifact = WeightArtifact::load(&path).unwrap();
    assert!(!artifact.is_empty());
    let model = resolve(&artifact, NUM_CLASSES, &device).unwrap();
    assert_eq!(model.provenance.strategy, "standard-strict");
}

#[tokio::test]
async fn test_fallback_still_produces_valid_predictions() {
    let labels = catalog::label_set();
    let device = Device::Cpu;
    let model = resolve(&WeightArtifact::empty(), labels.len(), &device).unwrap();
    let classifier = PlantClassifier::new(model, device, labels);

    let image = image::DynamicImage::ImageRgb8(image::RgbImage::new(120, 80));
    let prediction = classifier.classify(image).await.unwrap();

    assert_eq!(prediction.probabilities.len(), NUM_CLASSES);
    let sum: f32 = prediction.probabilities.iter().sum();
    assert!((sum - 1.0).abs() < 1e-3);

    let top = prediction.top_k(3);
    assert_eq!(top.len(), 3);
    assert!(top[0].1 >= top[1].1 && top[1].1 >= top[2].1);
}
