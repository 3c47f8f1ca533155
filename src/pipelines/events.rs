// SPDX-License-Identifier: MPL-2.0

//! Completion notifications from pipeline runs

use crate::errors::ImagingError;
use tokio::sync::mpsc;

/// How a run ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessorEventKind {
    /// Output is available from the processor
    Completed,
    /// A filter failed; the processor holds no output
    Error(ImagingError),
}

/// Notification sent once per run that reaches a terminal state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessorEvent {
    /// Correlation id given when the processor was created
    pub processor_id: u64,
    pub kind: ProcessorEventKind,
}

impl ProcessorEvent {
    pub fn is_completed(&self) -> bool {
        matches!(self.kind, ProcessorEventKind::Completed)
    }
}

/// Sending half handed to a processor
pub type EventSender = mpsc::UnboundedSender<ProcessorEvent>;
/// Receiving half kept by the caller
pub type EventReceiver = mpsc::UnboundedReceiver<ProcessorEvent>;

/// Create a notification channel
///
/// The sender may be shared by several processors; events carry the id.
pub fn event_channel() -> (EventSender, EventReceiver) {
    mpsc::unbounded_channel()
}
