//! Classifier trait and the candle-backed plant classifier.

use async_trait::async_trait;
use candle_core::{Device, Module, D};
use herbarium_core::{LabelSet, Prediction, Result};
use image::DynamicImage;
use std::sync::Arc;

use crate::artifact::{ModelSource, WeightArtifact};
use crate::device::{create_device, DeviceType};
use crate::preprocess::image_to_tensor;
use crate::resolver::{resolve, ModelProvenance, ResolvedModel, ResolvedNet};

/// Trait for image classifiers.
///
/// The HTTP layer depends on this seam rather than on the candle
/// implementation so it can be exercised against mocks.
#[async_trait]
pub trait Classifier: Send + Sync {
    /// Classify the given image into the fixed label set
    async fn classify(&self, image: DynamicImage) -> Result<Prediction>;

    /// The label set this classifier predicts over
    fn labels(&self) -> &LabelSet;

    /// How the underlying model was resolved
    fn provenance(&self) -> &ModelProvenance;

    /// Get the classifier name
    fn name(&self) -> &str;
}

struct ClassifierInner {
    net: ResolvedNet,
    device: Device,
    labels: LabelSet,
    provenance: ModelProvenance,
}

/// Candle-backed classifier over the resolved model.
///
/// Immutable after construction; cheap to clone and share across
/// request handlers.
#[derive(Clone)]
pub struct PlantClassifier {
    inner: Arc<ClassifierInner>,
}

impl PlantClassifier {
    /// Wrap a resolved model bound to `device`
    pub fn new(model: ResolvedModel, device: Device, labels: LabelSet) -> Self {
        Self {
            inner: Arc::new(ClassifierInner {
                net: model.net,
                device,
                labels,
                provenance: model.provenance,
            }),
        }
    }

    /// Resolve a weight source end to end: select the device, read the
    /// artifact (degrading to empty if unreadable), and run the strategy
    /// list.
    pub fn from_source(
        source: &ModelSource,
        labels: LabelSet,
        device_type: DeviceType,
    ) -> Result<Self> {
        let device = create_device(device_type)?;
        let artifact = WeightArtifact::load_or_empty(source);
        let model = resolve(&artifact, labels.len(), &device)?;
        Ok(Self::new(model, device, labels))
    }

    /// Synchronous prediction; the async trait method runs this on the
    /// blocking pool.
    pub fn predict(&self, image: &DynamicImage) -> Result<Prediction> {
        predict_inner(&self.inner, image)
    }
}

fn predict_inner(inner: &ClassifierInner, image: &DynamicImage) -> Result<Prediction> {
    let input = image_to_tensor(image, &inner.device)?;

    let batch = input
        .unsqueeze(0)
        .map_err(|e| herbarium_core::Error::inference(format!("Failed to batch input: {}", e)))?;

    let logits = inner
        .net
        .forward(&batch)
        .map_err(|e| herbarium_core::Error::inference(format!("Forward pass failed: {}", e)))?;

    let probabilities = candle_nn::ops::softmax(&logits, D::Minus1)
        .and_then(|probs| probs.squeeze(0))
        .and_then(|probs| probs.to_vec1::<f32>())
        .map_err(|e| herbarium_core::Error::inference(format!("Softmax failed: {}", e)))?;

    Prediction::from_probabilities(&inner.labels, probabilities).ok_or_else(|| {
        herbarium_core::Error::inference("model output size does not match label set")
    })
}

#[async_trait]
impl Classifier for PlantClassifier {
    async fn classify(&self, image: DynamicImage) -> Result<Prediction> {
        let inner = Arc::clone(&self.inner);
        tokio::task::spawn_blocking(move || predict_inner(&inner, &image))
            .await
            .map_err(|e| herbarium_core::Error::inference(format!("Inference task failed: {}", e)))?
    }

    fn labels(&self) -> &LabelSet {
        &self.inner.labels
    }

    fn provenance(&self) -> &ModelProvenance {
        &self.inner.provenance
    }

    fn name(&self) -> &str {
        "plant-classifier"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use herbarium_core::catalog;
    use image::{Rgb, RgbImage};

    fn fallback_classifier() -> PlantClassifier {
        let device = Device::Cpu;
        let labels = catalog::label_set();
        let model = resolve(&WeightArtifact::empty(), labels.len(), &device).unwrap();
        PlantClassifier::new(model, device, labels)
    }

    fn leaf_image() -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_pixel(96, 128, Rgb([34, 139, 34])))
    }

    #[tokio::test]
    async fn test_classify_produces_valid_distribution() {
        let classifier = fallback_classifier();
        let prediction = classifier.classify(leaf_image()).await.unwrap();

        assert_eq!(prediction.probabilities.len(), classifier.labels().len());
        let sum: f32 = prediction.probabilities.iter().sum();
        assert!((sum - 1.0).abs() < 1e-3);
        assert!(prediction
            .probabilities
            .iter()
            .all(|p| (0.0..=1.0).contains(p)));
    }

    #[tokio::test]
    async fn test_predicted_label_is_argmax() {
        let classifier = fallback_classifier();
        let prediction = classifier.classify(leaf_image()).await.unwrap();

        let index = herbarium_core::argmax(&prediction.probabilities);
        assert_eq!(classifier.labels().get(index), Some(prediction.label.as_str()));
        assert!((prediction.confidence - prediction.probabilities[index]).abs() < f32::EPSILON);
    }

    #[test]
    fn test_sync_predict_matches_trait() {
        let classifier = fallback_classifier();
        let prediction = classifier.predict(&leaf_image()).unwrap();
        assert_eq!(prediction.probabilities.len(), 10);
    }

    #[test]
    fn test_fallback_provenance_is_untrained() {
        let classifier = fallback_classifier();
        assert!(!classifier.provenance().trained);
        assert_eq!(classifier.provenance().strategy, "untrained-fallback");
    }
}
