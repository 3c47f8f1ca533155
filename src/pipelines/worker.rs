// SPDX-License-Identifier: GPL-3.0-only
//! Worker thread lifecycle for pipeline runs
//!
//! A pipeline run executes on its own thread. The thread cannot be suspended
//! or killed from outside; instead it calls [`RunControl::checkpoint`]
//! between filters, which parks it while paused and tells it to stop when
//! cancelled. Anything the run holds is dropped on the way out, so a
//! cancelled run releases its intermediate frames.

use crate::errors::{ImagingError, ImagingResult};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use tracing::{debug, info, warn};

/// Pause and cancel flags shared between the controller and its thread
#[derive(Debug, Default)]
pub struct RunControl {
    cancelled: AtomicBool,
    paused: Mutex<bool>,
    resumed: Condvar,
}

impl RunControl {
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Block while paused; returns `false` once the run has been cancelled
    pub fn checkpoint(&self) -> bool {
        let mut paused = self.paused.lock().unwrap_or_else(PoisonError::into_inner);
        while *paused && !self.is_cancelled() {
            paused = self
                .resumed
                .wait(paused)
                .unwrap_or_else(PoisonError::into_inner);
        }
        !self.is_cancelled()
    }

    fn set_paused(&self, value: bool) {
        *self.paused.lock().unwrap_or_else(PoisonError::into_inner) = value;
        self.resumed.notify_all();
    }

    fn cancel(&self) {
        // Store under the pause lock so a thread about to wait sees it
        let _guard = self.paused.lock().unwrap_or_else(PoisonError::into_inner);
        self.cancelled.store(true, Ordering::SeqCst);
        self.resumed.notify_all();
    }
}

/// Controller for one pipeline run on a separate thread
pub struct PipelineWorker {
    /// Thread handle for joining
    thread_handle: Option<JoinHandle<()>>,
    control: Arc<RunControl>,
    /// Name for logging
    name: String,
}

impl PipelineWorker {
    /// Run `job` on a new named thread
    pub fn spawn<F>(name: &str, job: F) -> ImagingResult<Self>
    where
        F: FnOnce(&RunControl) + Send + 'static,
    {
        let control = Arc::new(RunControl::default());
        let thread_control = Arc::clone(&control);
        let thread_name = name.to_string();

        let thread_handle = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || {
                debug!(name = %thread_name, "Pipeline worker started");
                job(&thread_control);
                debug!(name = %thread_name, "Pipeline worker exiting");
            })
            .map_err(|e| ImagingError::oom(format!("failed to spawn worker: {}", e)))?;

        info!(name = %name, "Pipeline worker spawned");

        Ok(Self {
            thread_handle: Some(thread_handle),
            control,
            name: name.to_string(),
        })
    }

    /// Check if the thread is still running
    pub fn is_running(&self) -> bool {
        self.thread_handle
            .as_ref()
            .map(|h| !h.is_finished())
            .unwrap_or(false)
    }

    /// Park the thread at its next checkpoint
    pub fn pause(&self) {
        debug!(name = %self.name, "Pausing pipeline worker");
        self.control.set_paused(true);
    }

    pub fn resume(&self) {
        debug!(name = %self.name, "Resuming pipeline worker");
        self.control.set_paused(false);
    }

    /// Signal cancellation without waiting
    pub fn request_cancel(&self) {
        debug!(name = %self.name, "Requesting pipeline worker cancel");
        self.control.cancel();
    }

    /// Cancel and wait for the thread to finish
    pub fn cancel(&mut self) {
        self.request_cancel();
        self.join();
    }

    /// Wait for the thread to finish without cancelling it
    pub fn join(&mut self) {
        if let Some(handle) = self.thread_handle.take() {
            if let Err(e) = handle.join() {
                warn!(name = %self.name, "Pipeline worker panicked: {:?}", e);
            } else {
                debug!(name = %self.name, "Pipeline worker joined");
            }
        }
    }
}

impl Drop for PipelineWorker {
    fn drop(&mut self) {
        if self.thread_handle.is_some() {
            self.cancel();
        }
    }
}
