//! Pending question queue with background refills

use std::collections::VecDeque;

use crate::{
    config::ReaderConfig,
    source::{QuestionSource, Refill, Request},
};

/// Questions fetched but not yet read
///
/// The queue is only ever appended to by fetches and refills and only ever
/// popped by its reader. At most one background refill is in flight.
/// Clearing the queue starts a new epoch; refills requested in an earlier
/// epoch are dropped when they arrive.
#[derive(Debug, Clone)]
pub struct PendingQueue<Q> {
    items: VecDeque<Q>,
    refill_in_flight: bool,
    offset: usize,
    epoch: u64,
}

impl<Q> Default for PendingQueue<Q> {
    fn default() -> Self {
        Self {
            items: VecDeque::new(),
            refill_in_flight: false,
            offset: 0,
            epoch: 0,
        }
    }
}

impl<Q> PendingQueue<Q> {
    /// Number of questions waiting
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether no question is waiting
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Whether a background refill has been requested and not yet delivered
    pub fn refill_in_flight(&self) -> bool {
        self.refill_in_flight
    }

    /// Drops every waiting question, for example after the filters change
    ///
    /// A refill still in flight belongs to the previous epoch and will be
    /// discarded, so a new one may be requested right away.
    pub fn clear(&mut self) {
        self.items.clear();
        self.offset = 0;
        self.refill_in_flight = false;
        self.epoch += 1;
    }

    /// Epoch stamped on every request issued from now on
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub(crate) fn pop(&mut self) -> Option<Q> {
        self.items.pop_front()
    }

    fn request(&self, config: &ReaderConfig) -> Request {
        Request {
            filters: config.filters.clone(),
            limit: config.batch_size,
            offset: self.offset,
            epoch: self.epoch,
        }
    }

    fn extend(&mut self, batch: Vec<Q>) {
        self.offset += batch.len();
        self.items.extend(batch);
    }

    /// Fetches a batch synchronously, degrading failures to an empty batch
    pub(crate) fn fetch<S: QuestionSource<Q>>(&mut self, source: &mut S, config: &ReaderConfig) {
        let batch = source.fetch(&self.request(config)).unwrap_or_else(|error| {
            tracing::warn!(%error, "question fetch failed; treating as an empty batch");
            Vec::new()
        });
        tracing::debug!(count = batch.len(), "fetched question batch");
        self.extend(batch);
    }

    /// Requests a background refill when the queue is running low
    ///
    /// Returns whether a refill was requested.
    pub(crate) fn refill_if_low<S: QuestionSource<Q>>(
        &mut self,
        source: &mut S,
        config: &ReaderConfig,
    ) -> bool {
        if self.refill_in_flight || self.items.len() >= config.refill_threshold {
            return false;
        }
        self.refill_in_flight = true;
        tracing::debug!(waiting = self.items.len(), "requesting background refill");
        source.request_refill(self.request(config));
        true
    }

    /// Appends a delivered background refill
    ///
    /// A refill from an earlier epoch is ignored. A failed refill is logged
    /// and dropped; the next request for a question decides whether to try
    /// again.
    pub fn receive_refill(&mut self, refill: Refill<Q>) {
        let Refill { request, batch } = refill;
        if request.epoch != self.epoch {
            tracing::debug!(
                epoch = request.epoch,
                current = self.epoch,
                "dropping refill requested before the queue was cleared"
            );
            return;
        }
        self.refill_in_flight = false;
        match batch {
            Ok(batch) => {
                tracing::debug!(count = batch.len(), "received background refill");
                self.extend(batch);
            }
            Err(error) => {
                tracing::warn!(%error, "background refill failed; treating as an empty batch");
            }
        }
    }
}
