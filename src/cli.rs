// SPDX-License-Identifier: GPL-3.0-only

//! CLI commands for image processing
//!
//! This module provides command-line functionality for:
//! - Running an image through a filter pipeline
//! - Listing the available filter kinds

use amms_imaging::config::ProcessorConfig;
use amms_imaging::constants::{
    MIME_RGB32, OVERLAY_ALPHA_ENABLED, OVERLAY_FULLY_OPAQUE, PARAM_QUALITY,
};
use amms_imaging::media::filters::{EncodedFormat, FilterKind, ImageFilter};
use amms_imaging::media::{FilterFactory, Frame};
use amms_imaging::pipelines::{MediaProcessor, ProcessorEventKind, event_channel};
use chrono::Local;
use std::path::{Path, PathBuf};
use tracing::info;

/// Pipeline requested on the command line
#[derive(Debug, Default)]
pub struct ProcessOptions {
    pub effects: Vec<String>,
    pub crop: Option<(i32, i32, i32, i32)>,
    pub size: Option<(i32, i32)>,
    pub rotate: Option<i32>,
    pub overlay: Option<PathBuf>,
    pub overlay_at: (i32, i32),
    pub overlay_mode: String,
    pub format: Option<String>,
    pub quality: Option<u8>,
    pub config: Option<PathBuf>,
}

/// List every filter kind with the MIME types it converts
pub fn list_filters() -> Result<(), Box<dyn std::error::Error>> {
    let factory = FilterFactory::new();

    println!("Available filters:");
    println!();
    for kind in factory.supported_kinds() {
        println!("  {}", kind);
        for source in factory.supported_source_mime_types(kind) {
            for dest in factory.supported_dest_mime_types(kind, source) {
                println!("    {} -> {}", source, dest);
            }
        }
        if let Ok(filter) = factory.create(kind, MIME_RGB32, first_dest(&factory, kind)) {
            if let Ok(presets) = filter.supported_presets() {
                println!("    presets: {}", presets.join(", "));
            }
            for param in filter.int_parameters() {
                println!(
                    "    {}: {}..={} (default {})",
                    param.name, param.min, param.max, param.default
                );
            }
        }
    }

    Ok(())
}

fn first_dest(factory: &FilterFactory, kind: FilterKind) -> &'static str {
    factory
        .supported_dest_mime_types(kind, MIME_RGB32)
        .first()
        .copied()
        .unwrap_or(MIME_RGB32)
}

/// Run `input` through the pipeline described by `options`
pub fn process_image(
    input: PathBuf,
    output: Option<PathBuf>,
    options: ProcessOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = match &options.config {
        Some(path) => ProcessorConfig::load(path)?,
        None => ProcessorConfig::default(),
    };

    let format = resolve_format(options.format.as_deref(), output.as_deref())?;
    let output_path = output.unwrap_or_else(|| default_output_path(format));

    let (width, height, pixels) = load_rgb32(&input)?;
    println!("Input: {} ({}x{})", input.display(), width, height);

    let filters = build_filters(&options, format, &config)?;

    let (events, mut receiver) = event_channel();
    let mut processor = MediaProcessor::with_config(1, events, config)?;
    processor.set_input(Frame::from_pixels(pixels, width, height)?);
    for filter in filters {
        processor.add_filter_owned(filter)?;
    }

    info!(filters = processor.filter_count(), "Running pipeline");
    println!("Processing with {} filter(s)...", processor.filter_count());
    processor.start()?;

    let event = receiver
        .blocking_recv()
        .ok_or("Pipeline finished without reporting")?;
    if let ProcessorEventKind::Error(e) = event.kind {
        return Err(e.into());
    }

    let result = processor.raw_output()?;
    match format {
        Some(_) => std::fs::write(&output_path, result.as_bytes())?,
        None => save_rgb32(&result, &output_path)?,
    }
    processor.destroy();

    println!("Image saved: {}", output_path.display());
    Ok(())
}

/// Encoded format for the converter stage; `None` keeps RGB32 and saves it as PNG
fn resolve_format(
    requested: Option<&str>,
    output: Option<&Path>,
) -> Result<Option<EncodedFormat>, Box<dyn std::error::Error>> {
    let name = match requested {
        Some(name) => name.to_lowercase(),
        None => output
            .and_then(|p| p.extension())
            .map(|ext| ext.to_string_lossy().to_lowercase())
            .unwrap_or_else(|| "png".to_string()),
    };

    match name.as_str() {
        "png" => Ok(Some(EncodedFormat::Png)),
        "jpg" | "jpeg" => Ok(Some(EncodedFormat::Jpeg)),
        "raw" | "rgb32" => Ok(None),
        other => Err(format!("Unsupported output format '{}'", other).into()),
    }
}

fn default_output_path(format: Option<EncodedFormat>) -> PathBuf {
    let timestamp = Local::now().format("%Y%m%d_%H%M%S");
    let extension = format.map(|f| f.extension()).unwrap_or("png");
    PathBuf::from(format!("IMG_{}.{}", timestamp, extension))
}

fn build_filters(
    options: &ProcessOptions,
    format: Option<EncodedFormat>,
    config: &ProcessorConfig,
) -> Result<Vec<ImageFilter>, Box<dyn std::error::Error>> {
    let factory = FilterFactory::new();
    let mut filters = Vec::new();

    if options.crop.is_some() || options.size.is_some() || options.rotate.is_some() {
        let mut transform = factory.create(FilterKind::Transform, MIME_RGB32, MIME_RGB32)?;
        if let Some((x, y, w, h)) = options.crop {
            transform.set_source_rect(x, y, w, h)?;
        }
        if let Some((w, h)) = options.size {
            transform.set_dest_size(w, h)?;
        }
        if let Some(turns) = options.rotate {
            transform.set_rotation(turns)?;
        }
        filters.push(transform);
    }

    for name in &options.effects {
        let mut effect = factory.create(FilterKind::Effect, MIME_RGB32, MIME_RGB32)?;
        effect.set_preset(name)?;
        filters.push(effect);
    }

    if let Some(path) = &options.overlay {
        let (width, height, pixels) = load_rgb32(path)?;
        let image = Frame::from_pixels(pixels, width, height)?;
        let transparency = parse_overlay_mode(&options.overlay_mode)?;
        let mut overlay = factory.create(FilterKind::Overlay, MIME_RGB32, MIME_RGB32)?;
        overlay.set_image(&image, options.overlay_at.0, options.overlay_at.1, transparency)?;
        filters.push(overlay);
    }

    if let Some(format) = format {
        let mut converter = factory.create(FilterKind::Converter, MIME_RGB32, format.mime())?;
        let quality = options.quality.unwrap_or(config.default_jpeg_quality);
        converter.set_int_param(PARAM_QUALITY, i32::from(quality))?;
        filters.push(converter);
    }

    Ok(filters)
}

/// Decode an image file into `0xAARRGGBB` pixels
fn load_rgb32(path: &Path) -> Result<(u32, u32, Vec<u32>), Box<dyn std::error::Error>> {
    let img = image::open(path)?.to_rgba8();
    let (width, height) = img.dimensions();
    let pixels = img
        .pixels()
        .map(|p| {
            let [r, g, b, a] = p.0;
            u32::from_be_bytes([a, r, g, b])
        })
        .collect();
    Ok((width, height, pixels))
}

/// Save an RGB32 frame as PNG
fn save_rgb32(frame: &Frame, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let (width, height) = frame.dimensions().ok_or("Output is not an RGB32 image")?;
    let pixels = frame.pixels().ok_or("Output is not an RGB32 image")?;
    let rgba: Vec<u8> = pixels
        .iter()
        .flat_map(|&p| {
            let [a, r, g, b] = p.to_be_bytes();
            [r, g, b, a]
        })
        .collect();
    let img = image::RgbaImage::from_raw(width, height, rgba).ok_or("Output buffer size mismatch")?;
    img.save_with_format(path, image::ImageFormat::Png)?;
    Ok(())
}

/// Map `opaque`, `alpha` or `key:RRGGBB` to the overlay transparency argument
pub fn parse_overlay_mode(mode: &str) -> Result<u32, String> {
    match mode.to_lowercase().as_str() {
        "opaque" => Ok(OVERLAY_FULLY_OPAQUE),
        "alpha" => Ok(OVERLAY_ALPHA_ENABLED),
        other => {
            let hex = other
                .strip_prefix("key:")
                .ok_or_else(|| format!("Unknown overlay mode '{}'", mode))?;
            let hex = hex.trim_start_matches('#');
            u32::from_str_radix(hex, 16)
                .ok()
                .filter(|color| *color <= 0x00FF_FFFF)
                .ok_or_else(|| format!("Invalid key color '{}'", hex))
        }
    }
}

/// Parse `X,Y`
pub fn parse_point(value: &str) -> Result<(i32, i32), String> {
    match parse_ints(value, ',')?.as_slice() {
        [x, y] => Ok((*x, *y)),
        _ => Err(format!("Expected X,Y but got '{}'", value)),
    }
}

/// Parse `X,Y,W,H`; a negative width or height mirrors that axis
pub fn parse_rect(value: &str) -> Result<(i32, i32, i32, i32), String> {
    match parse_ints(value, ',')?.as_slice() {
        [x, y, w, h] => Ok((*x, *y, *w, *h)),
        _ => Err(format!("Expected X,Y,W,H but got '{}'", value)),
    }
}

/// Parse `WxH`
pub fn parse_size(value: &str) -> Result<(i32, i32), String> {
    match parse_ints(&value.to_lowercase(), 'x')?.as_slice() {
        [w, h] if *w >= 0 && *h >= 0 => Ok((*w, *h)),
        _ => Err(format!("Expected WxH but got '{}'", value)),
    }
}

fn parse_ints(value: &str, separator: char) -> Result<Vec<i32>, String> {
    value
        .split(separator)
        .map(|part| {
            part.trim()
                .parse::<i32>()
                .map_err(|e| format!("'{}': {}", part, e))
        })
        .collect()
}
