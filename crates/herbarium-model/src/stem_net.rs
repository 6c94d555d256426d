//! Alternate EfficientNet-family implementation with stem-convolution
//! parameter naming.
//!
//! Artifacts exported from training pipelines that use the
//! `conv_stem`/`blocks.N.M`/`conv_head` layout do not line up with the
//! standard implementation's parameter names. This variant mirrors that
//! layout directly so such artifacts can be loaded leniently, key for
//! key, without a renaming table.

use candle_core::{Module, Result, Tensor};
use candle_nn::{
    batch_norm, conv2d, conv2d_no_bias, linear, BatchNorm, BatchNormConfig, Conv2d, Conv2dConfig,
    Linear, VarBuilder,
};

/// Stem width, per-stage widths and depths of the B3 scaling
#[derive(Debug, Clone, Copy)]
struct StageConfig {
    expand: usize,
    kernel: usize,
    stride: usize,
    in_channels: usize,
    out_channels: usize,
    repeats: usize,
}

const STEM_CHANNELS: usize = 40;
const HEAD_CHANNELS: usize = 1536;

fn b3_stages() -> [StageConfig; 7] {
    let stage = |expand, kernel, stride, in_channels, out_channels, repeats| StageConfig {
        expand,
        kernel,
        stride,
        in_channels,
        out_channels,
        repeats,
    };
    [
        stage(1, 3, 1, 40, 24, 2),
        stage(6, 3, 2, 24, 32, 3),
        stage(6, 5, 2, 32, 48, 3),
        stage(6, 3, 2, 48, 96, 5),
        stage(6, 5, 1, 96, 136, 5),
        stage(6, 5, 2, 136, 232, 6),
        stage(6, 3, 1, 232, 384, 2),
    ]
}

fn bn_config() -> BatchNormConfig {
    BatchNormConfig {
        eps: 1e-3,
        ..Default::default()
    }
}

/// Squeeze-and-excitation gate (`se.conv_reduce` / `se.conv_expand`)
#[derive(Debug)]
struct SqueezeExcite {
    conv_reduce: Conv2d,
    conv_expand: Conv2d,
}

impl SqueezeExcite {
    fn new(channels: usize, reduced: usize, vb: VarBuilder) -> Result<Self> {
        let conv_reduce = conv2d(
            channels,
            reduced,
            1,
            Conv2dConfig::default(),
            vb.pp("conv_reduce"),
        )?;
        let conv_expand = conv2d(
            reduced,
            channels,
            1,
            Conv2dConfig::default(),
            vb.pp("conv_expand"),
        )?;
        Ok(Self {
            conv_reduce,
            conv_expand,
        })
    }

    fn forward(&self, xs: &Tensor) -> Result<Tensor> {
        let scale = xs
            .mean_keepdim(2)?
            .mean_keepdim(3)?
            .apply(&self.conv_reduce)?
            .silu()?
            .apply(&self.conv_expand)?;
        xs.broadcast_mul(&candle_nn::ops::sigmoid(&scale)?)
    }
}

/// Depthwise-separable block (first stage: no expansion pointwise conv)
#[derive(Debug)]
struct DsBlock {
    conv_dw: Conv2d,
    bn1: BatchNorm,
    se: SqueezeExcite,
    conv_pw: Conv2d,
    bn2: BatchNorm,
    residual: bool,
}

impl DsBlock {
    fn new(cfg: &StageConfig, in_channels: usize, stride: usize, vb: VarBuilder) -> Result<Self> {
        let dw_cfg = Conv2dConfig {
            stride,
            padding: cfg.kernel / 2,
            groups: in_channels,
            ..Default::default()
        };
        let conv_dw = conv2d_no_bias(in_channels, in_channels, cfg.kernel, dw_cfg, vb.pp("conv_dw"))?;
        let bn1 = batch_norm(in_channels, bn_config(), vb.pp("bn1"))?;
        let se = SqueezeExcite::new(in_channels, in_channels.div_ceil(4), vb.pp("se"))?;
        let conv_pw = conv2d_no_bias(
            in_channels,
            cfg.out_channels,
            1,
            Conv2dConfig::default(),
            vb.pp("conv_pw"),
        )?;
        let bn2 = batch_norm(cfg.out_channels, bn_config(), vb.pp("bn2"))?;
        Ok(Self {
            conv_dw,
            bn1,
            se,
            conv_pw,
            bn2,
            residual: stride == 1 && in_channels == cfg.out_channels,
        })
    }

    fn forward(&self, xs: &Tensor) -> Result<Tensor> {
        let ys = xs
            .apply(&self.conv_dw)?
            .apply_t(&self.bn1, false)?
            .silu()?;
        let ys = self.se.forward(&ys)?;
        let ys = ys.apply(&self.conv_pw)?.apply_t(&self.bn2, false)?;
        if self.residual {
            ys + xs
        } else {
            Ok(ys)
        }
    }
}

/// Inverted-residual block with expansion (`conv_pw` → `conv_dw` → se →
/// `conv_pwl`)
#[derive(Debug)]
struct IrBlock {
    conv_pw: Conv2d,
    bn1: BatchNorm,
    conv_dw: Conv2d,
    bn2: BatchNorm,
    se: SqueezeExcite,
    conv_pwl: Conv2d,
    bn3: BatchNorm,
    residual: bool,
}

impl IrBlock {
    fn new(cfg: &StageConfig, in_channels: usize, stride: usize, vb: VarBuilder) -> Result<Self> {
        let expanded = in_channels * cfg.expand;
        let conv_pw = conv2d_no_bias(
            in_channels,
            expanded,
            1,
            Conv2dConfig::default(),
            vb.pp("conv_pw"),
        )?;
        let bn1 = batch_norm(expanded, bn_config(), vb.pp("bn1"))?;
        let dw_cfg = Conv2dConfig {
            stride,
            padding: cfg.kernel / 2,
            groups: expanded,
            ..Default::default()
        };
        let conv_dw = conv2d_no_bias(expanded, expanded, cfg.kernel, dw_cfg, vb.pp("conv_dw"))?;
        let bn2 = batch_norm(expanded, bn_config(), vb.pp("bn2"))?;
        let se = SqueezeExcite::new(expanded, in_channels.div_ceil(4), vb.pp("se"))?;
        let conv_pwl = conv2d_no_bias(
            expanded,
            cfg.out_channels,
            1,
            Conv2dConfig::default(),
            vb.pp("conv_pwl"),
        )?;
        let bn3 = batch_norm(cfg.out_channels, bn_config(), vb.pp("bn3"))?;
        Ok(Self {
            conv_pw,
            bn1,
            conv_dw,
            bn2,
            se,
            conv_pwl,
            bn3,
            residual: stride == 1 && in_channels == cfg.out_channels,
        })
    }

    fn forward(&self, xs: &Tensor) -> Result<Tensor> {
        let ys = xs
            .apply(&self.conv_pw)?
            .apply_t(&self.bn1, false)?
            .silu()?;
        let ys = ys
            .apply(&self.conv_dw)?
            .apply_t(&self.bn2, false)?
            .silu()?;
        let ys = self.se.forward(&ys)?;
        let ys = ys.apply(&self.conv_pwl)?.apply_t(&self.bn3, false)?;
        if self.residual {
            ys + xs
        } else {
            Ok(ys)
        }
    }
}

#[derive(Debug)]
enum Block {
    Ds(DsBlock),
    Ir(IrBlock),
}

impl Block {
    fn forward(&self, xs: &Tensor) -> Result<Tensor> {
        match self {
            Self::Ds(block) => block.forward(xs),
            Self::Ir(block) => block.forward(xs),
        }
    }
}

/// EfficientNet-B3 with stem-convolution parameter naming
#[derive(Debug)]
pub struct StemEfficientNet {
    conv_stem: Conv2d,
    bn1: BatchNorm,
    blocks: Vec<Block>,
    conv_head: Conv2d,
    bn2: BatchNorm,
    classifier: Linear,
}

impl StemEfficientNet {
    /// Build the network with a classification head of `num_classes`
    /// outputs. Parameter names follow the stem-convolution layout
    /// (`conv_stem`, `blocks.<stage>.<index>.*`, `conv_head`,
    /// `classifier`).
    pub fn new(vb: VarBuilder, num_classes: usize) -> Result<Self> {
        let stem_cfg = Conv2dConfig {
            stride: 2,
            padding: 1,
            ..Default::default()
        };
        let conv_stem = conv2d_no_bias(3, STEM_CHANNELS, 3, stem_cfg, vb.pp("conv_stem"))?;
        let bn1 = batch_norm(STEM_CHANNELS, bn_config(), vb.pp("bn1"))?;

        let mut blocks = Vec::new();
        let vb_blocks = vb.pp("blocks");
        for (stage_index, stage) in b3_stages().iter().enumerate() {
            let vb_stage = vb_blocks.pp(stage_index.to_string());
            for block_index in 0..stage.repeats {
                // Only the first block of a stage downsamples or widens.
                let in_channels = if block_index == 0 {
                    stage.in_channels
                } else {
                    stage.out_channels
                };
                let stride = if block_index == 0 { stage.stride } else { 1 };
                let vb_block = vb_stage.pp(block_index.to_string());
                let block = if stage.expand == 1 {
                    Block::Ds(DsBlock::new(stage, in_channels, stride, vb_block)?)
                } else {
                    Block::Ir(IrBlock::new(stage, in_channels, stride, vb_block)?)
                };
                blocks.push(block);
            }
        }

        let conv_head = conv2d_no_bias(
            384,
            HEAD_CHANNELS,
            1,
            Conv2dConfig::default(),
            vb.pp("conv_head"),
        )?;
        let bn2 = batch_norm(HEAD_CHANNELS, bn_config(), vb.pp("bn2"))?;
        let classifier = linear(HEAD_CHANNELS, num_classes, vb.pp("classifier"))?;

        Ok(Self {
            conv_stem,
            bn1,
            blocks,
            conv_head,
            bn2,
            classifier,
        })
    }
}

impl Module for StemEfficientNet {
    fn forward(&self, xs: &Tensor) -> Result<Tensor> {
        let mut ys = xs
            .apply(&self.conv_stem)?
            .apply_t(&self.bn1, false)?
            .silu()?;
        for block in &self.blocks {
            ys = block.forward(&ys)?;
        }
        let ys = ys
            .apply(&self.conv_head)?
            .apply_t(&self.bn2, false)?
            .silu()?;
        // Global average pool over the spatial dimensions.
        ys.mean(3)?.mean(2)?.apply(&self.classifier)
    }
}
