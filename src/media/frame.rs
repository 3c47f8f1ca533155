// SPDX-License-Identifier: GPL-3.0-only

//! Reference-counted frame buffers
//!
//! A [`Frame`] is the unit passed between filters. Cloning a frame only bumps
//! a reference count, so a filter that has nothing to change can hand its
//! input back as its output without copying pixel data. The backing storage
//! is released exactly once, when the last handle is dropped.
//!
//! Frames are immutable while shared. Code that wants to write pixels goes
//! through [`Frame::into_writable_pixels`], which reuses the storage only when
//! the caller holds the sole handle to an internally allocated buffer and
//! copies otherwise.

use crate::errors::{ImagingError, ImagingResult};
use std::sync::Arc;
use tracing::trace;

/// Who allocated the storage behind a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferOwnership {
    /// Allocated by this crate; may be reused for in-place writes
    Internal,
    /// Supplied by the caller; never written to
    External,
}

/// What the bytes of a frame mean
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentType {
    /// Opaque bytes (encoded images, arbitrary caller data)
    Raw,
    /// Row-major `0xAARRGGBB` pixels
    Rgb32 { width: u32, height: u32 },
}

enum FrameData {
    Bytes(Vec<u8>),
    Pixels(Vec<u32>),
    SharedPixels(Arc<[u32]>),
}

impl std::fmt::Debug for FrameData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FrameData::Bytes(data) => write!(f, "FrameData::Bytes({} bytes)", data.len()),
            FrameData::Pixels(px) => write!(f, "FrameData::Pixels({} px)", px.len()),
            FrameData::SharedPixels(px) => write!(f, "FrameData::SharedPixels({} px)", px.len()),
        }
    }
}

#[derive(Debug)]
struct FrameInner {
    data: FrameData,
    content: ContentType,
}

/// Shared handle to a frame buffer
#[derive(Debug, Clone)]
pub struct Frame {
    inner: Arc<FrameInner>,
}

/// Number of pixels in a `width x height` image, rejecting empty and overflowing sizes
pub(crate) fn pixel_count(width: u32, height: u32) -> ImagingResult<usize> {
    if width == 0 || height == 0 {
        return Err(ImagingError::invalid(format!(
            "image size {}x{} must be positive",
            width, height
        )));
    }
    (width as usize)
        .checked_mul(height as usize)
        .filter(|count| count.checked_mul(4).is_some())
        .ok_or_else(|| ImagingError::oom(format!("image size {}x{} too large", width, height)))
}

/// Allocate `count` pixels set to `fill`, reporting allocation failure instead of aborting
pub(crate) fn alloc_pixels(count: usize, fill: u32) -> ImagingResult<Vec<u32>> {
    let mut pixels = Vec::new();
    pixels.try_reserve_exact(count)?;
    pixels.resize(count, fill);
    Ok(pixels)
}

/// Allocate an empty byte buffer able to hold `capacity` bytes
pub(crate) fn alloc_bytes(capacity: usize) -> ImagingResult<Vec<u8>> {
    let mut bytes = Vec::new();
    bytes.try_reserve_exact(capacity)?;
    Ok(bytes)
}

impl Frame {
    fn from_data(data: FrameData, content: ContentType) -> Self {
        Self {
            inner: Arc::new(FrameInner { data, content }),
        }
    }

    /// Zero-filled raw buffer of `length` bytes
    pub fn raw(length: usize) -> ImagingResult<Self> {
        let mut bytes = alloc_bytes(length)?;
        bytes.resize(length, 0);
        Ok(Self::from_bytes(bytes))
    }

    /// Raw buffer holding a copy of `bytes`
    pub fn raw_from(bytes: &[u8]) -> ImagingResult<Self> {
        let mut copy = alloc_bytes(bytes.len())?;
        copy.extend_from_slice(bytes);
        Ok(Self::from_bytes(copy))
    }

    /// Raw buffer taking ownership of `bytes`
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        trace!(len = bytes.len(), "Raw frame created");
        Self::from_data(FrameData::Bytes(bytes), ContentType::Raw)
    }

    /// Zero-filled RGB32 image, ready to be written
    pub fn rgb32(width: u32, height: u32) -> ImagingResult<Self> {
        let count = pixel_count(width, height)?;
        let pixels = alloc_pixels(count, 0)?;
        Self::from_pixels(pixels, width, height)
    }

    /// RGB32 image holding a copy of the first `width * height` entries of `pixels`
    pub fn rgb32_from(pixels: &[u32], width: u32, height: u32) -> ImagingResult<Self> {
        let count = pixel_count(width, height)?;
        if pixels.len() < count {
            return Err(ImagingError::invalid(format!(
                "{} pixels supplied for a {}x{} image",
                pixels.len(),
                width,
                height
            )));
        }
        Self::from_pixels(copy_pixels(&pixels[..count])?, width, height)
    }

    /// RGB32 image taking ownership of `pixels`, which must hold exactly `width * height` entries
    pub fn from_pixels(pixels: Vec<u32>, width: u32, height: u32) -> ImagingResult<Self> {
        let count = pixel_count(width, height)?;
        if pixels.len() != count {
            return Err(ImagingError::invalid(format!(
                "{} pixels supplied for a {}x{} image",
                pixels.len(),
                width,
                height
            )));
        }
        trace!(width, height, "RGB32 frame created");
        Ok(Self::from_data(
            FrameData::Pixels(pixels),
            ContentType::Rgb32 { width, height },
        ))
    }

    /// Wrap caller-owned pixels without copying
    ///
    /// The frame is tagged [`BufferOwnership::External`], so filters that
    /// composite in place duplicate it first.
    pub fn from_shared_pixels(pixels: Arc<[u32]>, width: u32, height: u32) -> ImagingResult<Self> {
        let count = pixel_count(width, height)?;
        if pixels.len() != count {
            return Err(ImagingError::invalid(format!(
                "{} pixels supplied for a {}x{} image",
                pixels.len(),
                width,
                height
            )));
        }
        Ok(Self::from_data(
            FrameData::SharedPixels(pixels),
            ContentType::Rgb32 { width, height },
        ))
    }

    /// Take another reference to the same buffer
    pub fn addref(&self) -> Self {
        self.clone()
    }

    /// Give up a reference held in an optional slot
    ///
    /// Storage is freed once the last reference goes. Always leaves the slot
    /// empty, which mirrors the `frame = release(frame)` idiom.
    pub fn release(slot: &mut Option<Frame>) {
        if let Some(frame) = slot.take() {
            trace!(refs = frame.ref_count(), "Releasing frame reference");
        }
    }

    /// Number of live handles to this buffer
    pub fn ref_count(&self) -> usize {
        Arc::strong_count(&self.inner)
    }

    /// True when both handles point at the same buffer
    pub fn ptr_eq(a: &Frame, b: &Frame) -> bool {
        Arc::ptr_eq(&a.inner, &b.inner)
    }

    pub fn content(&self) -> ContentType {
        self.inner.content
    }

    pub fn ownership(&self) -> BufferOwnership {
        match self.inner.data {
            FrameData::SharedPixels(_) => BufferOwnership::External,
            FrameData::Bytes(_) | FrameData::Pixels(_) => BufferOwnership::Internal,
        }
    }

    /// `(width, height)` for RGB32 frames
    pub fn dimensions(&self) -> Option<(u32, u32)> {
        match self.inner.content {
            ContentType::Rgb32 { width, height } => Some((width, height)),
            ContentType::Raw => None,
        }
    }

    /// Length of the buffer in bytes
    pub fn len(&self) -> usize {
        self.as_bytes().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The whole buffer as bytes (RGB32 pixels in native byte order)
    pub fn as_bytes(&self) -> &[u8] {
        match &self.inner.data {
            FrameData::Bytes(bytes) => bytes,
            FrameData::Pixels(px) => bytemuck::cast_slice(px),
            FrameData::SharedPixels(px) => bytemuck::cast_slice(px),
        }
    }

    /// Pixel view of an RGB32 frame
    pub fn pixels(&self) -> Option<&[u32]> {
        match &self.inner.data {
            FrameData::Pixels(px) => Some(px),
            FrameData::SharedPixels(px) => Some(px),
            FrameData::Bytes(_) => None,
        }
    }

    /// Pixels and size of an RGB32 frame, or `InvalidArgument` naming `consumer`
    pub(crate) fn require_rgb32(&self, consumer: &str) -> ImagingResult<(&[u32], u32, u32)> {
        match (self.pixels(), self.dimensions()) {
            (Some(px), Some((w, h))) => Ok((px, w, h)),
            _ => Err(ImagingError::invalid(format!(
                "{} expects an RGB32 frame",
                consumer
            ))),
        }
    }

    /// Turn this handle into a pixel vector that may be written freely
    ///
    /// Storage is reused only when this is the last handle and the buffer was
    /// allocated internally. Shared or externally owned buffers are copied,
    /// so other holders never observe the write.
    pub fn into_writable_pixels(self) -> ImagingResult<(Vec<u32>, u32, u32)> {
        let (width, height) = self
            .dimensions()
            .ok_or_else(|| ImagingError::invalid("only RGB32 frames can be written"))?;

        match Arc::try_unwrap(self.inner) {
            Ok(FrameInner {
                data: FrameData::Pixels(pixels),
                ..
            }) => Ok((pixels, width, height)),
            Ok(FrameInner {
                data: FrameData::SharedPixels(shared),
                ..
            }) => Ok((copy_pixels(&shared)?, width, height)),
            Ok(FrameInner {
                data: FrameData::Bytes(_),
                ..
            }) => Err(ImagingError::invalid("only RGB32 frames can be written")),
            Err(inner) => {
                let source = match &inner.data {
                    FrameData::Pixels(px) => &px[..],
                    FrameData::SharedPixels(px) => &px[..],
                    FrameData::Bytes(_) => {
                        return Err(ImagingError::invalid("only RGB32 frames can be written"));
                    }
                };
                trace!(width, height, "Copying shared frame before write");
                Ok((copy_pixels(source)?, width, height))
            }
        }
    }
}

fn copy_pixels(source: &[u32]) -> ImagingResult<Vec<u32>> {
    let mut copy = Vec::new();
    copy.try_reserve_exact(source.len())?;
    copy.extend_from_slice(source);
    Ok(copy)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_addref_release_frees_once() {
        let frame = Frame::rgb32(2, 2).unwrap();
        let weak = Arc::downgrade(&frame.inner);

        let mut first = Some(frame);
        let mut second = first.as_ref().map(Frame::addref);
        assert_eq!(first.as_ref().unwrap().ref_count(), 2);

        Frame::release(&mut second);
        assert!(second.is_none());
        assert!(weak.upgrade().is_some(), "freed while a reference remains");

        Frame::release(&mut first);
        assert!(weak.upgrade().is_none(), "not freed after last release");

        // Releasing an empty slot is a no-op
        Frame::release(&mut first);
    }

    #[test]
    fn test_rgb32_constructors() {
        let frame = Frame::rgb32_from(&[1, 2, 3, 4, 5], 2, 2).unwrap();
        assert_eq!(frame.pixels().unwrap(), &[1, 2, 3, 4]);
        assert_eq!(frame.len(), 16);
        assert_eq!(frame.dimensions(), Some((2, 2)));
        assert_eq!(frame.ownership(), BufferOwnership::Internal);

        assert!(matches!(
            Frame::rgb32_from(&[1, 2, 3], 2, 2),
            Err(ImagingError::InvalidArgument(_))
        ));
        assert!(matches!(
            Frame::rgb32(0, 4),
            Err(ImagingError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_raw_constructors() {
        let empty = Frame::raw(0).unwrap();
        assert!(empty.is_empty());
        assert_eq!(empty.content(), ContentType::Raw);

        let frame = Frame::raw_from(b"abc").unwrap();
        assert_eq!(frame.as_bytes(), b"abc");
        assert!(frame.pixels().is_none());
        assert!(frame.require_rgb32("test").is_err());
    }

    #[test]
    fn test_writable_reuses_unique_internal_storage() {
        let frame = Frame::rgb32_from(&[7; 4], 2, 2).unwrap();
        let ptr = frame.pixels().unwrap().as_ptr();
        let (pixels, w, h) = frame.into_writable_pixels().unwrap();
        assert_eq!((w, h), (2, 2));
        assert_eq!(pixels.as_ptr(), ptr);
    }

    #[test]
    fn test_writable_copies_shared_storage() {
        let frame = Frame::rgb32_from(&[7; 4], 2, 2).unwrap();
        let other = frame.addref();
        let (mut pixels, _, _) = frame.into_writable_pixels().unwrap();
        pixels[0] = 0;
        assert_eq!(other.pixels().unwrap()[0], 7);
    }

    #[test]
    fn test_writable_copies_external_storage() {
        let shared: Arc<[u32]> = Arc::from(vec![9u32; 4]);
        let frame = Frame::from_shared_pixels(Arc::clone(&shared), 2, 2).unwrap();
        assert_eq!(frame.ownership(), BufferOwnership::External);
        let (mut pixels, _, _) = frame.into_writable_pixels().unwrap();
        pixels[3] = 0;
        assert_eq!(shared[3], 9);
    }
}
