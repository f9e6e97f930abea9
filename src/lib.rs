//! # Buzzer
//!
//! Core logic of a single-player quiz bowl practice reader. It judges typed
//! answers against free-form answer lines, reveals tossups and bonuses word
//! by word on host-scheduled alarms, scores buzzes, and keeps a history of
//! results. Rendering, networking, and timers belong to the host, which talks
//! to the readers through [`session::Listener`] and the message types below.

#![cfg_attr(all(coverage_nightly, test), feature(coverage_attribute))]
#![deny(missing_docs)]
#![deny(rustdoc::missing_crate_level_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::too_many_arguments)]
#![allow(clippy::similar_names)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::ignored_unit_patterns)]
#![allow(clippy::struct_field_names)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::wildcard_imports)]
use derive_where::derive_where;
use itertools::Itertools;
use serde::{Deserialize, Serialize};

pub mod config;
pub mod constants;
pub mod history;
pub mod judging;
pub mod question;
pub mod reader;
pub mod scoring;
pub mod session;
pub mod source;

/// Complete reader state sent to a listener that just attached
#[derive(Debug, Serialize, Clone, derive_more::From)]
pub enum SyncMessage {
    /// Tossup reader state
    Tossup(reader::tossup::SyncMessage),
    /// Bonus reader state
    Bonus(reader::bonus::SyncMessage),
}

impl SyncMessage {
    /// Converts the sync message to a JSON string for transmission
    ///
    /// # Panics
    ///
    /// This method panics if serialization fails, which should never happen
    /// with the default JSON serializer for well-formed data.
    pub fn to_message(&self) -> String {
        serde_json::to_string(self).expect("default serializer cannot fail")
    }
}

/// Incremental changes pushed to a listener
#[derive(Debug, Serialize, Clone, derive_more::From)]
pub enum UpdateMessage {
    /// Tossup reader updates
    Tossup(reader::tossup::UpdateMessage),
    /// Bonus reader updates
    Bonus(reader::bonus::UpdateMessage),
}

impl UpdateMessage {
    /// Converts the update message to a JSON string for transmission
    ///
    /// # Panics
    ///
    /// This method panics if serialization fails, which should never happen
    /// with the default JSON serializer for well-formed data.
    pub fn to_message(&self) -> String {
        serde_json::to_string(self).expect("default serializer cannot fail")
    }
}

/// Delayed messages a reader asks the host to deliver back to it
///
/// The host waits for the requested duration and hands the message to the
/// reader's `receive_alarm`. Alarms that arrive after the reader moved on
/// are ignored, so hosts never need to cancel them.
#[derive(Debug, Clone, derive_more::From, Serialize, Deserialize)]
pub enum AlarmMessage {
    /// Tossup reader alarms
    Tossup(reader::tossup::AlarmMessage),
    /// Bonus reader alarms
    Bonus(reader::bonus::AlarmMessage),
}

/// Commands from the display layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum IncomingMessage {
    /// Read the next question
    Next,
    /// Stop the reveal to answer
    Buzz,
    /// Submit an answer
    Answer(String),
    /// Change the reading speed
    ReadingSpeed(u8),
}

/// A truncated vector that keeps the exact count while limiting the items
///
/// Used to show the most recent results together with how many there are
/// in total.
#[derive(Debug, Clone, Serialize)]
#[derive_where(Default)]
pub struct TruncatedVec<T> {
    exact_count: usize,
    items: Vec<T>,
}

impl<T> TruncatedVec<T> {
    /// Keeps the first `limit` items of `list`
    ///
    /// `exact_count` is the size of the full collection `list` was taken from.
    pub fn new<I: IntoIterator<Item = T>>(list: I, limit: usize, exact_count: usize) -> Self {
        Self {
            exact_count,
            items: list.into_iter().take(limit).collect_vec(),
        }
    }

    /// Returns the exact count of items
    pub fn exact_count(&self) -> usize {
        self.exact_count
    }

    /// Returns the kept items
    pub fn items(&self) -> &[T] {
        &self.items
    }
}
