// SPDX-License-Identifier: MPL-2.0

//! End-to-end tests running filters through a media processor

use amms_imaging::constants::{MIME_PNG, MIME_RGB32, OVERLAY_FULLY_OPAQUE};
use amms_imaging::media::filters::{EffectFilter, EffectPreset, TransformFilter};
use amms_imaging::pipelines::{EventReceiver, event_channel};
use amms_imaging::{
    FilterFactory, FilterKind, Frame, ImageFilter, ImagingError, MediaProcessor,
    ProcessorEventKind, ProcessorState,
};

const PNG_SIGNATURE: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

fn effect(preset: EffectPreset) -> ImageFilter {
    ImageFilter::Effect(EffectFilter::with_preset(preset))
}

fn scale_to(width: i32, height: i32) -> ImageFilter {
    let mut transform = TransformFilter::new();
    transform.set_dest_size(width, height).unwrap();
    ImageFilter::Transform(transform)
}

fn run(processor: &mut MediaProcessor, rx: &mut EventReceiver) -> Frame {
    processor.start().unwrap();
    let event = rx.blocking_recv().expect("processor dropped its sender");
    assert_eq!(event.processor_id, processor.id());
    assert_eq!(event.kind, ProcessorEventKind::Completed);
    processor.raw_output().unwrap()
}

#[test]
fn test_negative_of_white_is_opaque_black() {
    let (events, mut rx) = event_channel();
    let mut processor = MediaProcessor::new(1, events);
    processor.set_input_rgb32(&[0xFFFF_FFFF; 16], 4, 4).unwrap();
    processor.add_filter(&effect(EffectPreset::Negative)).unwrap();

    let output = run(&mut processor, &mut rx);
    assert_eq!(processor.output_size().unwrap(), (4, 4));
    assert!(output.pixels().unwrap().iter().all(|&p| p == 0xFF00_0000));
}

#[test]
fn test_upscale_replicates_blocks() {
    let (events, mut rx) = event_channel();
    let mut processor = MediaProcessor::new(2, events);
    let (a, b, c, d) = (0xFFFF_0000, 0xFF00_FF00, 0xFF00_00FF, 0xFFFF_FFFF);
    processor.set_input_rgb32(&[a, b, c, d], 2, 2).unwrap();
    processor.add_filter(&scale_to(4, 4)).unwrap();

    let output = run(&mut processor, &mut rx);
    assert_eq!(output.dimensions(), Some((4, 4)));
    #[rustfmt::skip]
    let expected = [
        a, a, b, b,
        a, a, b, b,
        c, c, d, d,
        c, c, d, d,
    ];
    assert_eq!(output.pixels().unwrap(), &expected);
}

#[test]
fn test_png_converter_output_is_raw() {
    let factory = FilterFactory::new();
    let converter = factory
        .create(FilterKind::Converter, MIME_RGB32, MIME_PNG)
        .unwrap();

    let (events, mut rx) = event_channel();
    let mut processor = MediaProcessor::new(3, events);
    processor.set_input_rgb32(&[0xFF33_66CC; 64], 8, 8).unwrap();
    processor.add_filter(&converter).unwrap();

    let output = run(&mut processor, &mut rx);
    assert!(matches!(processor.output_size(), Err(ImagingError::Fail(_))));
    assert!(output.len() > PNG_SIGNATURE.len());
    assert_eq!(&output.as_bytes()[..8], &PNG_SIGNATURE);
}

#[test]
fn test_eleventh_filter_is_rejected() {
    let (events, mut rx) = event_channel();
    let mut processor = MediaProcessor::new(4, events);
    let negative = effect(EffectPreset::Negative);
    for _ in 0..10 {
        processor.add_filter(&negative).unwrap();
    }
    assert!(matches!(
        processor.add_filter(&negative),
        Err(ImagingError::OutOfMemory(_))
    ));
    assert_eq!(processor.filter_count(), 10);

    // Ten negatives cancel out
    processor.set_input_rgb32(&[0xFF12_3456; 4], 2, 2).unwrap();
    let output = run(&mut processor, &mut rx);
    assert_eq!(output.pixels().unwrap(), &[0xFF12_3456; 4]);
}

#[test]
fn test_filters_run_in_insertion_order() {
    let (events, mut rx) = event_channel();
    let mut processor = MediaProcessor::new(5, events);
    processor.set_input_rgb32(&[0xFFFF_0000], 1, 1).unwrap();
    processor.add_filter(&effect(EffectPreset::Negative)).unwrap();
    processor.add_filter(&effect(EffectPreset::Monochrome)).unwrap();

    // negative(red) = cyan (0,255,255); luma = (150*255 + 29*255) >> 8 = 178
    let output = run(&mut processor, &mut rx);
    assert_eq!(output.pixels().unwrap(), &[0xFFB2_B2B2]);
}

#[test]
fn test_quarter_turns_compose_to_identity() {
    let pixels: Vec<u32> = (0..6).map(|i| 0xFF00_0000 | i).collect();
    let mut quarter = TransformFilter::new();
    quarter.set_rotation(1).unwrap();
    let quarter = ImageFilter::Transform(quarter);

    let (events, mut rx) = event_channel();
    let mut processor = MediaProcessor::new(6, events);
    processor.set_input_rgb32(&pixels, 3, 2).unwrap();
    for _ in 0..4 {
        processor.add_filter(&quarter).unwrap();
    }
    // Each quarter turn is a transform plus its rotator
    assert_eq!(processor.filter_count(), 8);

    let output = run(&mut processor, &mut rx);
    assert_eq!(output.dimensions(), Some((3, 2)));
    assert_eq!(output.pixels().unwrap(), pixels.as_slice());
}

#[test]
fn test_down_then_up_matches_composed_sampling() {
    let pixels: Vec<u32> = (0..16).map(|i| 0xFF00_0000 | i).collect();

    let (events, mut rx) = event_channel();
    let mut processor = MediaProcessor::new(7, events);
    processor.set_input_rgb32(&pixels, 4, 4).unwrap();
    processor.add_filter(&scale_to(2, 2)).unwrap();
    processor.add_filter(&scale_to(4, 4)).unwrap();
    let output = run(&mut processor, &mut rx);

    // 4 -> 2 samples {0, 3}; 2 -> 4 samples {0, 0, 1, 1}
    let down = [0usize, 3];
    let up = [0usize, 0, 1, 1];
    let expected: Vec<u32> = (0..4)
        .flat_map(|y| (0..4).map(move |x| (y, x)))
        .map(|(y, x)| pixels[down[up[y]] * 4 + down[up[x]]])
        .collect();
    assert_eq!(output.pixels().unwrap(), expected.as_slice());
}

#[test]
fn test_overlay_outside_bounds_passes_input_through() {
    let logo = Frame::rgb32_from(&[0xFF00_FF00; 4], 2, 2).unwrap();
    let mut overlay = FilterFactory::new()
        .create(FilterKind::Overlay, MIME_RGB32, MIME_RGB32)
        .unwrap();
    overlay.set_image(&logo, 10, 10, OVERLAY_FULLY_OPAQUE).unwrap();

    let input = Frame::rgb32_from(&[0xFF00_0000; 16], 4, 4).unwrap();
    let (events, mut rx) = event_channel();
    let mut processor = MediaProcessor::new(8, events);
    processor.set_input(input.addref());
    processor.add_filter_owned(overlay).unwrap();

    let output = run(&mut processor, &mut rx);
    assert!(Frame::ptr_eq(&input, &output));
}

#[test]
fn test_error_event_then_rerun() {
    let (events, mut rx) = event_channel();
    let mut processor = MediaProcessor::new(9, events);
    processor.set_input_raw(&[1, 2, 3, 4]).unwrap();
    processor.add_filter(&effect(EffectPreset::Monochrome)).unwrap();

    processor.start().unwrap();
    let event = rx.blocking_recv().unwrap();
    assert!(matches!(event.kind, ProcessorEventKind::Error(_)));
    assert_eq!(processor.state(), ProcessorState::Idle);
    assert!(processor.raw_output().is_err());

    processor.set_input_rgb32(&[0xFF00_0000], 1, 1).unwrap();
    let output = run(&mut processor, &mut rx);
    assert_eq!(output.pixels().unwrap(), &[0xFF00_0000]);
}

#[test]
fn test_reset_clears_everything() {
    let (events, mut rx) = event_channel();
    let mut processor = MediaProcessor::new(10, events);
    processor.set_input_rgb32(&[0xFFFF_FFFF; 4], 2, 2).unwrap();
    processor.add_filter(&effect(EffectPreset::Negative)).unwrap();
    run(&mut processor, &mut rx);

    processor.reset();
    assert_eq!(processor.filter_count(), 0);
    assert!(processor.input().is_none());
    assert!(matches!(processor.raw_output(), Err(ImagingError::Fail(_))));
    assert!(matches!(processor.start(), Err(ImagingError::Fail(_))));
}

#[test]
fn test_abort_when_idle_is_harmless() {
    let (events, mut rx) = event_channel();
    let mut processor = MediaProcessor::new(11, events);
    processor.abort();
    processor.stop();
    assert_eq!(processor.state(), ProcessorState::Idle);

    processor.set_input_rgb32(&[0xFF00_0000; 4], 2, 2).unwrap();
    run(&mut processor, &mut rx);
    processor.abort();
    assert_eq!(processor.state(), ProcessorState::Idle);
    // Output of a finished run survives a later abort
    assert!(processor.raw_output().is_ok());
    processor.destroy();
}

#[test]
fn test_processors_share_one_channel() {
    let (events, mut rx) = event_channel();
    let mut first = MediaProcessor::new(100, events.clone());
    let mut second = MediaProcessor::new(200, events);
    first.set_input_rgb32(&[0xFFFF_FFFF], 1, 1).unwrap();
    second.set_input_rgb32(&[0xFF00_0000], 1, 1).unwrap();

    first.start().unwrap();
    second.start().unwrap();
    let mut ids = vec![
        rx.blocking_recv().unwrap().processor_id,
        rx.blocking_recv().unwrap().processor_id,
    ];
    ids.sort();
    assert_eq!(ids, vec![100, 200]);
}
