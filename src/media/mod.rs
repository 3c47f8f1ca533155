// SPDX-License-Identifier: MPL-2.0

//! Image buffers and the filters that transform them
//!
//! # Frames
//!
//! [`Frame`] is a reference-counted buffer holding either raw bytes (encoded
//! output) or 32-bit `0xAARRGGBB` pixels. Cloning a frame shares the buffer;
//! filters that need to write copy it first unless they hold the only handle.
//!
//! # Filters
//!
//! [`ImageFilter`] covers the four filter kinds plus the rotator stage that a
//! transform with an odd rotation adds to a pipeline:
//!
//! - **Converter**: RGB32 to JPEG or PNG bytes
//! - **Effect**: per-pixel presets (monochrome, negative)
//! - **Transform**: crop, mirror, nearest-neighbour scale, half turn
//! - **Overlay**: composite a second image (opaque, chroma key, alpha)
//!
//! [`FilterFactory`] builds filters for a source/destination MIME pair.

pub mod factory;
pub mod filters;
pub mod frame;

pub use factory::FilterFactory;
pub use filters::{FilterKind, ImageFilter};
pub use frame::{BufferOwnership, ContentType, Frame};
