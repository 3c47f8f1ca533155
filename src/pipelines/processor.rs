// SPDX-License-Identifier: MPL-2.0

//! Media processor: runs a chain of filters over one input frame
//!
//! ```text
//! input ─▶ filter 0 ─▶ filter 1 ─▶ … ─▶ filter n ─▶ output
//!                     (worker thread)          └─▶ ProcessorEvent
//! ```
//!
//! # States
//!
//! - **Idle**: no run in progress
//! - **Running**: a worker thread is executing the chain
//! - **Paused**: the worker is parked between two filters
//!
//! `start` moves Idle to Running (new run) or Paused to Running (resume).
//! `stop` moves Running to Paused; the worker only parks at its next filter
//! boundary, so a run that is already past its last filter completes and
//! reports anyway. `abort` cancels any run and returns once the worker has
//! exited; an aborted run sends no notification.
//!
//! Filters are snapshotted when a run starts. Adding filters while a run is
//! in progress affects only later runs.

use crate::config::ProcessorConfig;
use crate::errors::{ImagingError, ImagingResult};
use crate::media::filters::ImageFilter;
use crate::media::frame::Frame;
use crate::pipelines::events::{EventSender, ProcessorEvent, ProcessorEventKind};
use crate::pipelines::worker::{PipelineWorker, RunControl};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, warn};

/// Execution state of a processor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessorState {
    Idle,
    Running,
    Paused,
}

/// Fields written by the worker thread
#[derive(Debug)]
struct Shared {
    state: ProcessorState,
    output: Option<Frame>,
}

/// Orchestrates a filter chain over one input frame
pub struct MediaProcessor {
    id: u64,
    config: ProcessorConfig,
    filters: Arc<Vec<ImageFilter>>,
    input: Option<Frame>,
    shared: Arc<Mutex<Shared>>,
    worker: Option<PipelineWorker>,
    events: EventSender,
}

impl MediaProcessor {
    /// Processor with default configuration
    pub fn new(id: u64, events: EventSender) -> Self {
        Self {
            id,
            config: ProcessorConfig::default(),
            filters: Arc::new(Vec::new()),
            input: None,
            shared: Arc::new(Mutex::new(Shared {
                state: ProcessorState::Idle,
                output: None,
            })),
            worker: None,
            events,
        }
    }

    pub fn with_config(
        id: u64,
        events: EventSender,
        config: ProcessorConfig,
    ) -> ImagingResult<Self> {
        config.validate()?;
        let mut processor = Self::new(id, events);
        processor.config = config;
        Ok(processor)
    }

    fn lock_shared(&self) -> MutexGuard<'_, Shared> {
        self.shared.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn state(&self) -> ProcessorState {
        self.lock_shared().state
    }

    pub fn filter_count(&self) -> usize {
        self.filters.len()
    }

    pub fn filters(&self) -> &[ImageFilter] {
        &self.filters
    }

    /// Append a copy of `filter`
    ///
    /// Later changes to the caller's filter do not reach the processor.
    pub fn add_filter(&mut self, filter: &ImageFilter) -> ImagingResult<()> {
        self.add_filter_owned(filter.clone())
    }

    /// Append `filter`, handing ownership to the processor
    ///
    /// A transform with an odd rotation brings its rotator along; both count
    /// against the filter limit. Nothing is appended when the limit would be
    /// exceeded.
    pub fn add_filter_owned(&mut self, filter: ImageFilter) -> ImagingResult<()> {
        let name = filter.name();
        let stages = filter.into_pipeline_stages();
        if self.filters.len() + stages.len() > self.config.max_filters {
            warn!(
                processor_id = self.id,
                filter = name,
                max = self.config.max_filters,
                "Filter list full"
            );
            return Err(ImagingError::oom(format!(
                "processor already holds {} of {} filters",
                self.filters.len(),
                self.config.max_filters
            )));
        }

        Arc::make_mut(&mut self.filters).extend(stages);
        debug!(
            processor_id = self.id,
            filter = name,
            count = self.filters.len(),
            "Filter added"
        );
        Ok(())
    }

    /// Copy `pixels` into a new input frame
    pub fn set_input_rgb32(
        &mut self,
        pixels: &[u32],
        width: u32,
        height: u32,
    ) -> ImagingResult<()> {
        let frame = Frame::rgb32_from(pixels, width, height)?;
        self.set_input(frame);
        Ok(())
    }

    /// Copy `bytes` into a new raw input frame
    pub fn set_input_raw(&mut self, bytes: &[u8]) -> ImagingResult<()> {
        if bytes.is_empty() {
            return Err(ImagingError::invalid("raw input is empty"));
        }
        let frame = Frame::raw_from(bytes)?;
        self.set_input(frame);
        Ok(())
    }

    /// Use an existing frame as input, sharing its buffer
    pub fn set_input(&mut self, frame: Frame) {
        debug!(
            processor_id = self.id,
            len = frame.len(),
            dimensions = ?frame.dimensions(),
            "Input set"
        );
        self.input = Some(frame);
    }

    pub fn input(&self) -> Option<&Frame> {
        self.input.as_ref()
    }

    /// Start a new run, or resume a paused one
    pub fn start(&mut self) -> ImagingResult<()> {
        let mut shared = self.lock_shared();
        match shared.state {
            ProcessorState::Running => return Ok(()),
            ProcessorState::Paused => {
                shared.state = ProcessorState::Running;
                if let Some(worker) = &self.worker {
                    worker.resume();
                }
                info!(processor_id = self.id, "Pipeline resumed");
                return Ok(());
            }
            ProcessorState::Idle => {}
        }
        drop(shared);

        // A previous run has already reported; reap its thread
        if let Some(mut finished) = self.worker.take() {
            finished.join();
        }

        let input = self
            .input
            .as_ref()
            .ok_or_else(|| ImagingError::fail("no input set"))?
            .addref();
        let filters = Arc::clone(&self.filters);
        let run_shared = Arc::clone(&self.shared);
        let events = self.events.clone();
        let id = self.id;

        {
            let mut shared = self.lock_shared();
            shared.output = None;
            shared.state = ProcessorState::Running;
        }

        let name = format!("{}-{}", self.config.worker_thread_name, id);
        let spawned = PipelineWorker::spawn(&name, move |control| {
            run_pipeline(id, &filters, input, control, &run_shared, &events);
        });

        match spawned {
            Ok(worker) => {
                info!(processor_id = id, filters = self.filters.len(), "Pipeline started");
                self.worker = Some(worker);
                Ok(())
            }
            Err(e) => {
                self.lock_shared().state = ProcessorState::Idle;
                Err(e)
            }
        }
    }

    /// Pause a running pipeline at its next filter boundary
    ///
    /// Best effort: a run that finishes before reaching that boundary still
    /// completes, and the processor ends up Idle rather than Paused.
    pub fn stop(&mut self) {
        let mut shared = self.lock_shared();
        if shared.state == ProcessorState::Running {
            if let Some(worker) = &self.worker {
                worker.pause();
            }
            shared.state = ProcessorState::Paused;
            info!(processor_id = self.id, "Pipeline paused");
        }
    }

    /// Cancel any run and wait for its worker to exit
    pub fn abort(&mut self) {
        let Some(mut worker) = self.worker.take() else {
            self.lock_shared().state = ProcessorState::Idle;
            return;
        };

        {
            // Cancel under the lock so the worker cannot commit afterwards
            let mut shared = self.lock_shared();
            if shared.state != ProcessorState::Idle {
                info!(processor_id = self.id, "Aborting pipeline");
            }
            worker.request_cancel();
            shared.state = ProcessorState::Idle;
        }
        worker.join();
    }

    /// Abort, then drop input, output and all filters
    pub fn reset(&mut self) {
        self.abort();
        Frame::release(&mut self.input);
        Frame::release(&mut self.lock_shared().output);
        self.filters = Arc::new(Vec::new());
        debug!(processor_id = self.id, "Processor reset");
    }

    /// Reset and dispose of the processor
    pub fn destroy(mut self) {
        self.reset();
    }

    /// Output of the last completed run
    pub fn raw_output(&self) -> ImagingResult<Frame> {
        self.lock_shared()
            .output
            .clone()
            .ok_or_else(|| ImagingError::fail("no output available"))
    }

    /// Size of the last output, when it is an RGB32 image
    pub fn output_size(&self) -> ImagingResult<(u32, u32)> {
        let output = self.raw_output()?;
        output
            .dimensions()
            .ok_or_else(|| ImagingError::fail("output is not an RGB32 image"))
    }
}

impl Drop for MediaProcessor {
    fn drop(&mut self) {
        if self.worker.is_some() {
            self.abort();
        }
    }
}

/// Worker body: run the chain, then publish the result unless cancelled
fn run_pipeline(
    id: u64,
    filters: &[ImageFilter],
    input: Frame,
    control: &RunControl,
    shared: &Mutex<Shared>,
    events: &EventSender,
) {
    let Some(result) = execute_chain(id, filters, input, control) else {
        debug!(processor_id = id, "Run cancelled, intermediate frames released");
        return;
    };

    let kind = {
        let mut shared = shared.lock().unwrap_or_else(PoisonError::into_inner);
        if control.is_cancelled() {
            debug!(processor_id = id, "Run cancelled before publishing");
            return;
        }
        shared.state = ProcessorState::Idle;
        match result {
            Ok(frame) => {
                shared.output = Some(frame);
                ProcessorEventKind::Completed
            }
            Err(e) => {
                shared.output = None;
                ProcessorEventKind::Error(e)
            }
        }
    };

    match &kind {
        ProcessorEventKind::Completed => info!(processor_id = id, "Pipeline completed"),
        ProcessorEventKind::Error(e) => warn!(processor_id = id, error = %e, "Pipeline failed"),
    }

    if events
        .send(ProcessorEvent {
            processor_id: id,
            kind,
        })
        .is_err()
    {
        debug!(processor_id = id, "No listener for pipeline events");
    }
}

/// Feed `input` through every filter in order; `None` when cancelled
fn execute_chain(
    id: u64,
    filters: &[ImageFilter],
    input: Frame,
    control: &RunControl,
) -> Option<ImagingResult<Frame>> {
    let mut current = input;
    for (index, filter) in filters.iter().enumerate() {
        if !control.checkpoint() {
            return None;
        }
        match filter.process(current) {
            Ok(next) => current = next,
            Err(e) => {
                warn!(
                    processor_id = id,
                    index,
                    filter = filter.name(),
                    error = %e,
                    "Filter failed"
                );
                return Some(Err(e));
            }
        }
    }
    Some(Ok(current))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::filters::{EffectFilter, EffectPreset, TransformFilter};
    use crate::pipelines::events::event_channel;

    fn negative() -> ImageFilter {
        ImageFilter::Effect(EffectFilter::with_preset(EffectPreset::Negative))
    }

    #[test]
    fn test_empty_chain_outputs_input_buffer() {
        let (tx, mut rx) = event_channel();
        let mut processor = MediaProcessor::new(7, tx);
        let input = Frame::rgb32_from(&[1, 2, 3, 4], 2, 2).unwrap();
        processor.set_input(input.addref());

        processor.start().unwrap();
        let event = rx.blocking_recv().unwrap();
        assert_eq!(event.processor_id, 7);
        assert!(event.is_completed());

        let output = processor.raw_output().unwrap();
        assert!(Frame::ptr_eq(&input, &output));
        assert_eq!(processor.state(), ProcessorState::Idle);
    }

    #[test]
    fn test_start_without_input_fails() {
        let (tx, _rx) = event_channel();
        let mut processor = MediaProcessor::new(1, tx);
        assert!(matches!(processor.start(), Err(ImagingError::Fail(_))));
        assert_eq!(processor.state(), ProcessorState::Idle);
    }

    #[test]
    fn test_filter_failure_reports_error() {
        let (tx, mut rx) = event_channel();
        let mut processor = MediaProcessor::new(3, tx);
        processor.set_input_raw(b"not pixels").unwrap();
        processor.add_filter(&negative()).unwrap();

        processor.start().unwrap();
        let event = rx.blocking_recv().unwrap();
        assert!(matches!(
            event.kind,
            ProcessorEventKind::Error(ImagingError::InvalidArgument(_))
        ));
        assert!(processor.raw_output().is_err());

        // Still usable afterwards
        processor.reset();
        processor.set_input_rgb32(&[0xFFFF_FFFF], 1, 1).unwrap();
        processor.add_filter(&negative()).unwrap();
        processor.start().unwrap();
        assert!(rx.blocking_recv().unwrap().is_completed());
        assert_eq!(processor.raw_output().unwrap().pixels().unwrap(), &[0xFF00_0000]);
    }

    #[test]
    fn test_rotated_transform_takes_two_slots() {
        let (tx, _rx) = event_channel();
        let config = ProcessorConfig {
            max_filters: 2,
            ..ProcessorConfig::default()
        };
        let mut processor = MediaProcessor::with_config(1, tx, config).unwrap();

        let mut transform = TransformFilter::new();
        transform.set_rotation(3).unwrap();
        let transform = ImageFilter::Transform(transform);
        processor.add_filter(&transform).unwrap();
        assert_eq!(processor.filter_count(), 2);

        assert!(matches!(
            processor.add_filter(&negative()),
            Err(ImagingError::OutOfMemory(_))
        ));
        assert_eq!(processor.filter_count(), 2);
    }

    #[test]
    fn test_added_filter_is_a_copy() {
        let (tx, _rx) = event_channel();
        let mut processor = MediaProcessor::new(1, tx);
        let mut effect = negative();
        processor.add_filter(&effect).unwrap();
        effect.set_preset("monochrome").unwrap();
        assert_eq!(processor.filters()[0].preset().unwrap(), "negative");
    }

    #[test]
    fn test_abort_paused_run_releases_frames() {
        let (tx, mut rx) = event_channel();
        let mut processor = MediaProcessor::new(9, tx);
        let input = Frame::from_pixels(vec![0xFF10_2030; 2048 * 2048], 2048, 2048).unwrap();
        processor.set_input(input.addref());
        for _ in 0..10 {
            processor.add_filter(&negative()).unwrap();
        }

        processor.start().unwrap();
        processor.stop();
        assert_eq!(processor.state(), ProcessorState::Paused);

        processor.abort();
        assert_eq!(processor.state(), ProcessorState::Idle);
        // Only the input slot and this handle remain
        assert_eq!(input.ref_count(), 2);
        assert!(rx.try_recv().is_err());
        assert!(processor.raw_output().is_err());

        processor.reset();
        assert_eq!(input.ref_count(), 1);
    }

    #[test]
    fn test_rerun_after_abort_completes() {
        let (tx, mut rx) = event_channel();
        let mut processor = MediaProcessor::new(12, tx);
        processor.set_input_rgb32(&vec![0xFF10_2030; 1024 * 1024], 1024, 1024).unwrap();
        for _ in 0..10 {
            processor.add_filter(&negative()).unwrap();
        }

        processor.start().unwrap();
        processor.abort();
        assert_eq!(processor.state(), ProcessorState::Idle);
        while rx.try_recv().is_ok() {}

        processor.start().unwrap();
        assert!(rx.blocking_recv().unwrap().is_completed());
        assert_eq!(processor.output_size().unwrap(), (1024, 1024));
    }

    #[test]
    fn test_pause_and_resume() {
        let (tx, mut rx) = event_channel();
        let mut processor = MediaProcessor::new(4, tx);
        processor.set_input_rgb32(&vec![0xFF00_00FF; 512 * 512], 512, 512).unwrap();
        for _ in 0..4 {
            processor.add_filter(&negative()).unwrap();
        }

        processor.start().unwrap();
        processor.stop();
        // Starting again resumes a paused run and is a no-op on a running one
        processor.start().unwrap();
        processor.start().unwrap();

        assert!(rx.blocking_recv().unwrap().is_completed());
        // If the first run beat the pause, the second start began another one
        while processor.state() != ProcessorState::Idle {
            std::thread::sleep(std::time::Duration::from_millis(1));
        }
        let output = processor.raw_output().unwrap();
        assert!(output.pixels().unwrap().iter().all(|&p| p == 0xFF00_00FF));
    }
}
