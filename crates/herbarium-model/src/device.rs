//! Compute device selection

use candle_core::Device;
use herbarium_core::Result;

/// Device type for inference
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceType {
    /// Pick an accelerator if one is available, else CPU
    Auto,
    /// CPU inference (always available)
    Cpu,
    /// CUDA GPU inference (if available)
    Cuda(usize), // GPU index
    /// Metal (Apple Silicon)
    Metal(usize),
}

impl std::str::FromStr for DeviceType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "cpu" => Ok(Self::Cpu),
            "cuda" => Ok(Self::Cuda(0)),
            "metal" | "mps" => Ok(Self::Metal(0)),
            other => Err(format!("unknown device type: {}", other)),
        }
    }
}

/// Create a Candle device from a device type.
///
/// `Auto` probes CUDA first, then Metal, and falls back to CPU. The
/// selection happens once at startup; the resolved model is bound to the
/// returned device for the process lifetime.
pub fn create_device(device_type: DeviceType) -> Result<Device> {
    match device_type {
        DeviceType::Auto => {
            if candle_core::utils::cuda_is_available() {
                Device::new_cuda(0).map_err(|e| {
                    herbarium_core::Error::model(format!("Failed to create CUDA device: {}", e))
                })
            } else if candle_core::utils::metal_is_available() {
                Device::new_metal(0).map_err(|e| {
                    herbarium_core::Error::model(format!("Failed to create Metal device: {}", e))
                })
            } else {
                Ok(Device::Cpu)
            }
        }
        DeviceType::Cpu => Ok(Device::Cpu),
        DeviceType::Cuda(idx) => Device::new_cuda(idx).map_err(|e| {
            herbarium_core::Error::model(format!("Failed to create CUDA device: {}", e))
        }),
        DeviceType::Metal(idx) => Device::new_metal(idx).map_err(|e| {
            herbarium_core::Error::model(format!("Failed to create Metal device: {}", e))
        }),
    }
}
