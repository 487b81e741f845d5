// src/broadcast/mod.rs

//! Live log fan-out.
//!
//! The supervisor publishes [`LogEvent`]s into a [`LogBroadcaster`]; every
//! connected observer holds its own [`LogSubscription`]. There is no replay:
//! a subscription only sees events published after it was created.
//!
//! Delivery policy: each subscriber has a bounded ring of `capacity` events.
//! Publishing never waits for subscribers. A subscriber that falls further
//! behind than the ring skips the oldest events it missed and carries on with
//! the next retained one, so order is preserved but completeness is not.

pub mod channel;

use serde::Serialize;

use crate::types::RunId;

pub use channel::{LogBroadcaster, LogSubscription};

/// One ordered unit of run output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LogEvent {
    /// A single output line of the recovery process, without its newline.
    Line { run_id: RunId, seq: u64, text: String },
    /// Terminal marker; published exactly once per run.
    Complete { run_id: RunId, seq: u64, success: bool },
}

impl LogEvent {
    pub fn run_id(&self) -> RunId {
        match self {
            LogEvent::Line { run_id, .. } | LogEvent::Complete { run_id, .. } => *run_id,
        }
    }

    pub fn seq(&self) -> u64 {
        match self {
            LogEvent::Line { seq, .. } | LogEvent::Complete { seq, .. } => *seq,
        }
    }

    pub fn is_complete(&self) -> bool {
        matches!(self, LogEvent::Complete { .. })
    }
}
