// SPDX-License-Identifier: MPL-2.0

//! Filter pipelines executed off the caller's thread
//!
//! ```text
//! ┌──────────────┐     ┌───────────────────┐     ┌──────────────┐
//! │ Input Frame  │ ──▶ │  MediaProcessor   │ ──▶ │ Output Frame │
//! │ (RGB32/raw)  │     │  - worker thread  │     │              │
//! │              │     │  - filter chain   │     │              │
//! └──────────────┘     └───────────────────┘     └──────────────┘
//!                                │
//!                                ▼
//!                        ProcessorEvent (mpsc)
//! ```
//!
//! # Modules
//!
//! - [`processor`]: state machine owning filters, input and output
//! - [`worker`]: thread controller with cooperative pause and cancel
//! - [`events`]: completion notifications

pub mod events;
pub mod processor;
pub mod worker;

pub use events::{EventReceiver, EventSender, ProcessorEvent, ProcessorEventKind, event_channel};
pub use processor::{MediaProcessor, ProcessorState};
