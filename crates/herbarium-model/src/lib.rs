//! Herbarium Model
//!
//! Model resolution and inference for the plant classification service.
//!
//! The model resolver turns a weight artifact of unknown internal layout
//! into a usable classifier: an ordered list of loading strategies is
//! attempted in sequence, first success wins, and the final entry (a
//! freshly initialized fallback network) always succeeds. The inference
//! service maps one decoded image to a prediction over the fixed label
//! set.

pub mod artifact;
pub mod classifier;
pub mod device;
pub mod fallback;
pub mod preprocess;
pub mod resolver;
pub mod stem_net;
pub mod store;

pub use artifact::{ModelSource, WeightArtifact};
pub use classifier::{Classifier, PlantClassifier};
pub use device::{create_device, DeviceType};
pub use preprocess::{decode_image, image_to_tensor, IMAGE_SIZE};
pub use resolver::{resolve, ModelProvenance, ResolvedModel, ResolvedNet, MISSING_KEY_THRESHOLD};
pub use store::{LoadMode, LoadReport, TensorStore};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::artifact::{ModelSource, WeightArtifact};
    pub use crate::classifier::{Classifier, PlantClassifier};
    pub use crate::device::{create_device, DeviceType};
    pub use crate::resolver::{resolve, ModelProvenance, ResolvedModel};
}
