// SPDX-License-Identifier: MPL-2.0

//! Image filters
//!
//! [`ImageFilter`] is a closed set of pixel transformations sharing one
//! contract: `process` consumes a frame handle and returns a new one (or the
//! same one, when there is nothing to change). Capabilities that only some
//! filters have (parameters, presets, transform geometry, overlay image) are
//! reached through methods that answer [`ImagingError::NotSupported`] on
//! filters lacking them.
//!
//! | Filter    | In    | Out        | Capabilities            |
//! |-----------|-------|------------|-------------------------|
//! | Converter | RGB32 | JPEG / PNG | int parameter `quality` |
//! | Effect    | RGB32 | RGB32      | presets                 |
//! | Transform | RGB32 | RGB32      | source rect, target size, rotation |
//! | Overlay   | RGB32 | RGB32      | overlay image           |
//!
//! The rotator is not created directly: a transform with an odd number of
//! quarter turns appends one behind itself when it joins a processor.

pub mod converter;
pub mod effect;
pub mod overlay;
pub mod rotator;
pub mod transform;

pub use converter::{ConverterFilter, EncodedFormat};
pub use effect::{EffectFilter, EffectPreset};
pub use overlay::{BlendMode, OverlayFilter};
pub use rotator::{RotateDirection, RotatorFilter};
pub use transform::{SourceRect, TransformFilter};

use crate::errors::{ImagingError, ImagingResult};
use crate::media::frame::Frame;

/// Filter kinds the factory can build
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterKind {
    Converter,
    Effect,
    Transform,
    Overlay,
}

impl FilterKind {
    pub const ALL: [FilterKind; 4] = [
        FilterKind::Converter,
        FilterKind::Effect,
        FilterKind::Transform,
        FilterKind::Overlay,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            FilterKind::Converter => "converter",
            FilterKind::Effect => "effect",
            FilterKind::Transform => "transform",
            FilterKind::Overlay => "overlay",
        }
    }

    /// Parse a kind name, ignoring ASCII case
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(name.trim()))
    }
}

impl std::fmt::Display for FilterKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Description of an integer parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntParameter {
    pub name: &'static str,
    pub min: i32,
    pub max: i32,
    pub default: i32,
}

/// One pixel transformation stage
#[derive(Debug, Clone)]
pub enum ImageFilter {
    Converter(ConverterFilter),
    Effect(EffectFilter),
    Transform(TransformFilter),
    Overlay(OverlayFilter),
    Rotator(RotatorFilter),
}

impl ImageFilter {
    /// Factory kind this filter belongs to (the rotator counts as a transform)
    pub fn kind(&self) -> FilterKind {
        match self {
            ImageFilter::Converter(_) => FilterKind::Converter,
            ImageFilter::Effect(_) => FilterKind::Effect,
            ImageFilter::Transform(_) | ImageFilter::Rotator(_) => FilterKind::Transform,
            ImageFilter::Overlay(_) => FilterKind::Overlay,
        }
    }

    /// Name used in logs
    pub fn name(&self) -> &'static str {
        match self {
            ImageFilter::Rotator(_) => "rotator",
            other => other.kind().name(),
        }
    }

    /// Run the filter on `input`
    ///
    /// The input handle is consumed. Filters that leave the image untouched
    /// return it as-is, so the caller may get back the very same buffer.
    pub fn process(&self, input: Frame) -> ImagingResult<Frame> {
        match self {
            ImageFilter::Converter(f) => f.process(&input),
            ImageFilter::Effect(f) => f.process(&input),
            ImageFilter::Transform(f) => f.process(&input),
            ImageFilter::Overlay(f) => f.process(input),
            ImageFilter::Rotator(f) => f.process(&input),
        }
    }

    /// The stages this filter contributes when appended to a processor
    ///
    /// Most filters contribute only themselves. A transform with an odd
    /// rotation is followed by the rotator that performs the quarter turn.
    pub fn into_pipeline_stages(self) -> Vec<ImageFilter> {
        match self {
            ImageFilter::Transform(transform) => {
                let companion = transform.companion_rotator();
                let mut stages = vec![ImageFilter::Transform(transform)];
                stages.extend(companion.map(ImageFilter::Rotator));
                stages
            }
            other => vec![other],
        }
    }

    // Parameter API

    pub fn int_parameters(&self) -> &'static [IntParameter] {
        match self {
            ImageFilter::Converter(_) => ConverterFilter::INT_PARAMETERS,
            _ => &[],
        }
    }

    pub fn int_param(&self, name: &str) -> ImagingResult<i32> {
        match self {
            ImageFilter::Converter(f) => f.int_param(name),
            other => Err(other.missing("integer parameters")),
        }
    }

    pub fn set_int_param(&mut self, name: &str, value: i32) -> ImagingResult<()> {
        match self {
            ImageFilter::Converter(f) => f.set_int_param(name, value),
            other => Err(other.missing("integer parameters")),
        }
    }

    /// Names of string parameters; no built-in filter defines any
    pub fn string_parameters(&self) -> &'static [&'static str] {
        &[]
    }

    pub fn string_param(&self, name: &str) -> ImagingResult<String> {
        Err(self.missing(&format!("string parameter '{}'", name)))
    }

    pub fn set_string_param(&mut self, name: &str, _value: &str) -> ImagingResult<()> {
        Err(self.missing(&format!("string parameter '{}'", name)))
    }

    // Preset API

    pub fn supported_presets(&self) -> ImagingResult<&'static [&'static str]> {
        match self {
            ImageFilter::Effect(_) => Ok(EffectFilter::supported_presets()),
            other => Err(other.missing("presets")),
        }
    }

    pub fn preset(&self) -> ImagingResult<&'static str> {
        match self {
            ImageFilter::Effect(f) => Ok(f.preset().name()),
            other => Err(other.missing("presets")),
        }
    }

    pub fn set_preset(&mut self, name: &str) -> ImagingResult<()> {
        match self {
            ImageFilter::Effect(f) => f.set_preset_by_name(name),
            other => Err(other.missing("presets")),
        }
    }

    // Transform API

    pub fn set_source_rect(
        &mut self,
        x: i32,
        y: i32,
        width: i32,
        height: i32,
    ) -> ImagingResult<()> {
        match self {
            ImageFilter::Transform(f) => {
                f.set_source_rect(x, y, width, height);
                Ok(())
            }
            other => Err(other.missing("transform geometry")),
        }
    }

    pub fn set_dest_size(&mut self, width: i32, height: i32) -> ImagingResult<()> {
        match self {
            ImageFilter::Transform(f) => f.set_dest_size(width, height),
            other => Err(other.missing("transform geometry")),
        }
    }

    pub fn set_rotation(&mut self, quarter_turns: i32) -> ImagingResult<()> {
        match self {
            ImageFilter::Transform(f) => f.set_rotation(quarter_turns),
            other => Err(other.missing("transform geometry")),
        }
    }

    pub fn source_rect(&self) -> ImagingResult<SourceRect> {
        match self {
            ImageFilter::Transform(f) => Ok(f.source_rect()),
            other => Err(other.missing("transform geometry")),
        }
    }

    pub fn dest_size(&self) -> ImagingResult<(u32, u32)> {
        match self {
            ImageFilter::Transform(f) => Ok(f.dest_size()),
            other => Err(other.missing("transform geometry")),
        }
    }

    pub fn rotation(&self) -> ImagingResult<u8> {
        match self {
            ImageFilter::Transform(f) => Ok(f.rotation()),
            other => Err(other.missing("transform geometry")),
        }
    }

    // Overlay API

    pub fn set_image(
        &mut self,
        image: &Frame,
        x: i32,
        y: i32,
        transparency: u32,
    ) -> ImagingResult<()> {
        match self {
            ImageFilter::Overlay(f) => f.set_image(image, x, y, transparency),
            other => Err(other.missing("overlay image")),
        }
    }

    pub fn clear_image(&mut self) -> ImagingResult<()> {
        match self {
            ImageFilter::Overlay(f) => {
                f.clear_image();
                Ok(())
            }
            other => Err(other.missing("overlay image")),
        }
    }

    pub fn overlay_position(&self) -> ImagingResult<(i32, i32)> {
        match self {
            ImageFilter::Overlay(f) => Ok(f.position()),
            other => Err(other.missing("overlay image")),
        }
    }

    pub fn blend_mode(&self) -> ImagingResult<BlendMode> {
        match self {
            ImageFilter::Overlay(f) => Ok(f.blend_mode()),
            other => Err(other.missing("overlay image")),
        }
    }

    fn missing(&self, capability: &str) -> ImagingError {
        ImagingError::unsupported(format!("{} filter has no {}", self.name(), capability))
    }
}
