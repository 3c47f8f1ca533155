// SPDX-License-Identifier: MPL-2.0

//! Filter construction by capability negotiation
//!
//! Each filter kind advertises the MIME types it reads and writes. A filter
//! is only built for a source/destination pair its kind advertises.

use crate::constants::{MIME_JPEG, MIME_PNG, MIME_RGB32};
use crate::errors::{ImagingError, ImagingResult};
use crate::media::filters::{
    ConverterFilter, EffectFilter, EncodedFormat, FilterKind, ImageFilter, OverlayFilter,
    TransformFilter,
};
use tracing::debug;

const RGB32_ONLY: &[&str] = &[MIME_RGB32];
const ENCODED: &[&str] = &[MIME_JPEG, MIME_PNG];

struct FactoryEntry {
    kind: FilterKind,
    source_types: &'static [&'static str],
    dest_types: &'static [&'static str],
    build: fn(&str) -> Option<ImageFilter>,
}

/// Registry of constructible filter kinds
pub struct FilterFactory {
    entries: Vec<FactoryEntry>,
}

impl Default for FilterFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl FilterFactory {
    /// Registry with the four built-in filter kinds
    pub fn new() -> Self {
        Self {
            entries: vec![
                FactoryEntry {
                    kind: FilterKind::Converter,
                    source_types: RGB32_ONLY,
                    dest_types: ENCODED,
                    build: |dest| {
                        EncodedFormat::from_mime(dest)
                            .map(|format| ImageFilter::Converter(ConverterFilter::new(format)))
                    },
                },
                FactoryEntry {
                    kind: FilterKind::Effect,
                    source_types: RGB32_ONLY,
                    dest_types: RGB32_ONLY,
                    build: |_| Some(ImageFilter::Effect(EffectFilter::new())),
                },
                FactoryEntry {
                    kind: FilterKind::Transform,
                    source_types: RGB32_ONLY,
                    dest_types: RGB32_ONLY,
                    build: |_| Some(ImageFilter::Transform(TransformFilter::new())),
                },
                FactoryEntry {
                    kind: FilterKind::Overlay,
                    source_types: RGB32_ONLY,
                    dest_types: RGB32_ONLY,
                    build: |_| Some(ImageFilter::Overlay(OverlayFilter::new())),
                },
            ],
        }
    }

    fn entry(&self, kind: FilterKind) -> Option<&FactoryEntry> {
        self.entries.iter().find(|e| e.kind == kind)
    }

    /// Kinds this registry can build
    pub fn supported_kinds(&self) -> impl Iterator<Item = FilterKind> + '_ {
        self.entries.iter().map(|e| e.kind)
    }

    pub fn supported_source_mime_types(&self, kind: FilterKind) -> &'static [&'static str] {
        self.entry(kind).map(|e| e.source_types).unwrap_or(&[])
    }

    /// Destination types reachable from `source_type`; empty when the source is not accepted
    pub fn supported_dest_mime_types(
        &self,
        kind: FilterKind,
        source_type: &str,
    ) -> &'static [&'static str] {
        match self.entry(kind) {
            Some(e) if contains_mime(e.source_types, source_type) => e.dest_types,
            _ => &[],
        }
    }

    /// Build a filter converting `source_type` to `dest_type`
    pub fn create(
        &self,
        kind: FilterKind,
        source_type: &str,
        dest_type: &str,
    ) -> ImagingResult<ImageFilter> {
        let entry = self
            .entry(kind)
            .ok_or_else(|| ImagingError::invalid(format!("no {} filter registered", kind)))?;

        if !contains_mime(entry.source_types, source_type)
            || !contains_mime(entry.dest_types, dest_type)
        {
            return Err(ImagingError::invalid(format!(
                "{} filter cannot convert '{}' to '{}'",
                kind, source_type, dest_type
            )));
        }

        let filter = (entry.build)(dest_type).ok_or_else(|| {
            ImagingError::invalid(format!("{} filter cannot produce '{}'", kind, dest_type))
        })?;
        debug!(filter = %kind, source_type, dest_type, "Filter created");
        Ok(filter)
    }
}

fn contains_mime(list: &[&str], mime: &str) -> bool {
    list.iter().any(|m| m.eq_ignore_ascii_case(mime))
}
