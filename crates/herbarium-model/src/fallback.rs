//! Fixed fallback network used when no loading strategy matches.
//!
//! Three conv+relu+pool stages feeding a single linear layer. Always
//! constructed with freshly initialized weights; the resolver marks the
//! result as untrained so the boundary can say so.

use candle_core::{Module, Result, Tensor};
use candle_nn::{conv2d, linear, Conv2d, Conv2dConfig, Linear, VarBuilder};

/// Small convolutional classifier with fresh weights
#[derive(Debug)]
pub struct FallbackCnn {
    conv1: Conv2d,
    conv2: Conv2d,
    conv3: Conv2d,
    classifier: Linear,
}

impl FallbackCnn {
    /// Build the network with `num_classes` outputs
    pub fn new(vb: VarBuilder, num_classes: usize) -> Result<Self> {
        let cfg = Conv2dConfig {
            padding: 1,
            ..Default::default()
        };
        let conv1 = conv2d(3, 32, 3, cfg, vb.pp("conv1"))?;
        let conv2 = conv2d(32, 64, 3, cfg, vb.pp("conv2"))?;
        let conv3 = conv2d(64, 128, 3, cfg, vb.pp("conv3"))?;
        let classifier = linear(128, num_classes, vb.pp("classifier"))?;
        Ok(Self {
            conv1,
            conv2,
            conv3,
            classifier,
        })
    }
}

impl Module for FallbackCnn {
    fn forward(&self, xs: &Tensor) -> Result<Tensor> {
        let ys = xs.apply(&self.conv1)?.relu()?.max_pool2d(2)?;
        let ys = ys.apply(&self.conv2)?.relu()?.max_pool2d(2)?;
        let ys = ys.apply(&self.conv3)?.relu()?;
        // Global average pool, then classify.
        ys.mean(3)?.mean(2)?.apply(&self.classifier)
    }
}
