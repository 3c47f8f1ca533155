// SPDX-License-Identifier: MPL-2.0

//! Per-pixel color effects

use crate::constants::EFFECT_PRESETS;
use crate::errors::{ImagingError, ImagingResult};
use crate::media::frame::{Frame, alloc_pixels};
use tracing::debug;

const ALPHA_MASK: u32 = 0xFF00_0000;
const RGB_MASK: u32 = 0x00FF_FFFF;

/// Built-in effect presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EffectPreset {
    /// BT.601 luma replicated into R, G and B
    #[default]
    Monochrome,
    /// Complement of the color channels
    Negative,
}

impl EffectPreset {
    pub const ALL: [EffectPreset; 2] = [EffectPreset::Monochrome, EffectPreset::Negative];

    pub fn name(&self) -> &'static str {
        EFFECT_PRESETS[self.index()]
    }

    pub fn index(&self) -> usize {
        match self {
            EffectPreset::Monochrome => 0,
            EffectPreset::Negative => 1,
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.name() == name)
    }

    /// Apply the preset to one `0xAARRGGBB` pixel; alpha is never touched
    #[inline]
    pub fn apply(&self, pixel: u32) -> u32 {
        match self {
            EffectPreset::Monochrome => {
                let r = (pixel >> 16) & 0xFF;
                let g = (pixel >> 8) & 0xFF;
                let b = pixel & 0xFF;
                let luma = (77 * r + 150 * g + 29 * b) >> 8;
                (pixel & ALPHA_MASK) | (luma << 16) | (luma << 8) | luma
            }
            EffectPreset::Negative => pixel ^ RGB_MASK,
        }
    }
}

/// Effect filter state
#[derive(Debug, Clone, Default)]
pub struct EffectFilter {
    preset: EffectPreset,
}

impl EffectFilter {
    /// New effect, starting on the monochrome preset
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_preset(preset: EffectPreset) -> Self {
        Self { preset }
    }

    pub fn supported_presets() -> &'static [&'static str] {
        &EFFECT_PRESETS
    }

    pub fn preset(&self) -> EffectPreset {
        self.preset
    }

    pub fn set_preset(&mut self, preset: EffectPreset) {
        self.preset = preset;
    }

    pub fn set_preset_by_name(&mut self, name: &str) -> ImagingResult<()> {
        let preset = EffectPreset::from_name(name)
            .ok_or_else(|| ImagingError::invalid(format!("unknown preset '{}'", name)))?;
        self.preset = preset;
        Ok(())
    }

    pub fn process(&self, input: &Frame) -> ImagingResult<Frame> {
        let (pixels, width, height) = input.require_rgb32("effect")?;

        let mut output = alloc_pixels(pixels.len(), 0)?;
        for (dst, &src) in output.iter_mut().zip(pixels) {
            *dst = self.preset.apply(src);
        }

        debug!(width, height, preset = self.preset.name(), "Effect applied");
        Frame::from_pixels(output, width, height)
    }
}
