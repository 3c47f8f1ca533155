// SPDX-License-Identifier: MPL-2.0

//! AMMS imaging - still image post-processing pipelines
//!
//! This library turns a 32-bit RGB image into a processed image or an
//! encoded file by running it through a chain of filters on a worker thread.
//!
//! # Architecture
//!
//! - [`media`]: frame buffers, filters and the filter factory
//! - [`pipelines`]: the media processor and its worker thread
//! - [`config`]: processor configuration
//! - [`errors`]: error type shared by every operation
//!
//! # Example
//!
//! ```no_run
//! use amms_imaging::media::filters::{EffectFilter, EffectPreset, ImageFilter};
//! use amms_imaging::pipelines::{MediaProcessor, event_channel};
//!
//! let (events, mut rx) = event_channel();
//! let mut processor = MediaProcessor::new(1, events);
//! processor.set_input_rgb32(&[0xFFFF_FFFF; 16], 4, 4)?;
//! processor.add_filter_owned(ImageFilter::Effect(EffectFilter::with_preset(
//!     EffectPreset::Negative,
//! )))?;
//! processor.start()?;
//! let event = rx.blocking_recv();
//! # Ok::<(), amms_imaging::ImagingError>(())
//! ```

pub mod config;
pub mod constants;
pub mod errors;
pub mod media;
pub mod pipelines;

// Re-export commonly used types
pub use config::ProcessorConfig;
pub use errors::{ImagingError, ImagingResult};
pub use media::{FilterFactory, FilterKind, Frame, ImageFilter};
pub use pipelines::{MediaProcessor, ProcessorEvent, ProcessorEventKind, ProcessorState};
