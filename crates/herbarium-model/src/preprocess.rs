//! Image preprocessing for the classifier input.
//!
//! Fixed pipeline: 3-channel RGB, 300x300 resize, [0,1] scaling, then
//! per-channel ImageNet normalization. Not configurable; the constants
//! must match the ones the weights were trained with.

use candle_core::{DType, Device, Tensor};
use herbarium_core::Result;
use image::imageops::FilterType;
use image::DynamicImage;

/// Input edge length expected by the classifier
pub const IMAGE_SIZE: usize = 300;

/// Per-channel normalization mean (ImageNet statistics)
pub const IMAGENET_MEAN: [f32; 3] = [0.485, 0.456, 0.406];

/// Per-channel normalization standard deviation (ImageNet statistics)
pub const IMAGENET_STD: [f32; 3] = [0.229, 0.224, 0.225];

/// Decode uploaded bytes into an image
pub fn decode_image(bytes: &[u8]) -> Result<DynamicImage> {
    image::load_from_memory(bytes)
        .map_err(|e| herbarium_core::Error::image(format!("Failed to decode image: {}", e)))
}

/// Convert a decoded image into a normalized `(3, 300, 300)` tensor on
/// the given device.
pub fn image_to_tensor(image: &DynamicImage, device: &Device) -> Result<Tensor> {
    let resized = image
        .resize_exact(IMAGE_SIZE as u32, IMAGE_SIZE as u32, FilterType::Triangle)
        .to_rgb8();
    let data = resized.into_raw();

    normalized_tensor(data, device)
        .map_err(|e| herbarium_core::Error::image(format!("Failed to build input tensor: {}", e)))
}

fn normalized_tensor(data: Vec<u8>, device: &Device) -> candle_core::Result<Tensor> {
    let pixels = Tensor::from_vec(data, (IMAGE_SIZE, IMAGE_SIZE, 3), device)?
        .permute((2, 0, 1))?
        .to_dtype(DType::F32)?;
    let scaled = (pixels / 255.0)?;
    let mean = Tensor::new(&IMAGENET_MEAN, device)?.reshape((3, 1, 1))?;
    let std = Tensor::new(&IMAGENET_STD, device)?.reshape((3, 1, 1))?;
    scaled.broadcast_sub(&mean)?.broadcast_div(&std)
}
