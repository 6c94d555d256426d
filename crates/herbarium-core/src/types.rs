//! Prediction types for the Herbarium inference service

use serde::{Deserialize, Serialize};

/// Ordered, fixed set of class names.
///
/// Order defines the index-to-name mapping used by the model's output
/// layer and must never change without retraining.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelSet {
    names: Vec<String>,
}

impl LabelSet {
    /// Create a label set from an ordered list of names
    pub fn new(names: Vec<String>) -> Self {
        Self { names }
    }

    /// Number of classes
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether the label set is empty
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Class name at the given index
    pub fn get(&self, index: usize) -> Option<&str> {
        self.names.get(index).map(String::as_str)
    }

    /// Index of the given class name, if present
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    /// Iterate over class names in index order
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }
}

impl From<&[&str]> for LabelSet {
    fn from(names: &[&str]) -> Self {
        Self::new(names.iter().map(|s| s.to_string()).collect())
    }
}

/// Result of classifying one image
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prediction {
    /// Predicted class name (a member of the label set)
    pub label: String,

    /// Confidence of the predicted class (0.0-1.0)
    pub confidence: f32,

    /// Full probability distribution, one entry per class in label order
    pub probabilities: Vec<f32>,
}

impl Prediction {
    /// Build a prediction from a probability distribution.
    ///
    /// The predicted label is `labels[argmax(probabilities)]`. Returns
    /// `None` if the distribution length does not match the label set.
    pub fn from_probabilities(labels: &LabelSet, probabilities: Vec<f32>) -> Option<Self> {
        if probabilities.len() != labels.len() || probabilities.is_empty() {
            return None;
        }
        let index = argmax(&probabilities);
        let label = labels.get(index)?.to_string();
        let confidence = probabilities[index];
        Some(Self {
            label,
            confidence,
            probabilities,
        })
    }

    /// Indices of the `k` highest-probability classes, descending.
    ///
    /// Indices are pairwise distinct; ties keep the lower index first.
    pub fn top_k(&self, k: usize) -> Vec<(usize, f32)> {
        let mut ranked: Vec<(usize, f32)> = self
            .probabilities
            .iter()
            .copied()
            .enumerate()
            .collect();
        ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        ranked.truncate(k);
        ranked
    }
}

/// Index of the largest value; ties resolve to the first occurrence.
pub fn argmax(values: &[f32]) -> usize {
    let mut best = 0;
    for (i, v) in values.iter().enumerate() {
        if *v > values[best] {
            best = i;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels() -> LabelSet {
        LabelSet::from(["a", "b", "c", "d"].as_slice())
    }

    #[test]
    fn test_label_set_ordering() {
        let labels = labels();
        assert_eq!(labels.len(), 4);
        assert_eq!(labels.get(2), Some("c"));
        assert_eq!(labels.index_of("d"), Some(3));
        assert_eq!(labels.index_of("z"), None);
    }

    #[test]
    fn test_prediction_matches_argmax() {
        let probs = vec![0.1, 0.6, 0.2, 0.1];
        let prediction = Prediction::from_probabilities(&labels(), probs).unwrap();
        assert_eq!(prediction.label, "b");
        assert!((prediction.confidence - 0.6).abs() < f32::EPSILON);
    }

    #[test]
    fn test_prediction_rejects_length_mismatch() {
        assert!(Prediction::from_probabilities(&labels(), vec![0.5, 0.5]).is_none());
    }

    #[test]
    fn test_top_k_sorted_and_distinct() {
        let probs = vec![0.05, 0.4, 0.3, 0.25];
        let prediction = Prediction::from_probabilities(&labels(), probs).unwrap();
        let top = prediction.top_k(3);
        assert_eq!(top.len(), 3);
        assert_eq!(top[0].0, 1);
        assert_eq!(top[1].0, 2);
        assert_eq!(top[2].0, 3);
        assert!(top[0].1 >= top[1].1 && top[1].1 >= top[2].1);
        assert_ne!(top[0].0, top[1].0);
        assert_ne!(top[1].0, top[2].0);
    }

    #[test]
    fn test_argmax_tie_takes_first() {
        assert_eq!(argmax(&[0.3, 0.3, 0.2]), 0);
    }
}
