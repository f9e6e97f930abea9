//! Reader configuration

use garde::Validate;
use serde::{Deserialize, Serialize};

use crate::{
    constants::{queue, reading},
    scoring::TossupValues,
    source::Filters,
};

/// Settings shared by the tossup and bonus readers
///
/// Missing fields take their default values when deserializing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct ReaderConfig {
    /// Reading speed, higher is faster
    #[garde(range(min = reading::MIN_SPEED, max = reading::MAX_SPEED))]
    pub reading_speed: u8,
    /// Which questions to fetch
    #[garde(dive)]
    pub filters: Filters,
    /// Number of questions requested per fetch
    #[garde(range(min = 1, max = queue::MAX_BATCH_SIZE))]
    pub batch_size: usize,
    /// Queue length under which a background refill is requested
    #[garde(range(min = 1, max = queue::MAX_REFILL_THRESHOLD))]
    pub refill_threshold: usize,
    /// Point values for tossups
    #[garde(dive)]
    pub tossup_values: TossupValues,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            reading_speed: reading::DEFAULT_SPEED,
            filters: Filters::default(),
            batch_size: queue::DEFAULT_BATCH_SIZE,
            refill_threshold: queue::DEFAULT_REFILL_THRESHOLD,
            tossup_values: TossupValues::default(),
        }
    }
}

impl ReaderConfig {
    /// Sets the reading speed, clamped to the fastest setting
    pub fn set_reading_speed(&mut self, speed: u8) {
        self.reading_speed = speed.min(reading::MAX_SPEED);
    }

    /// Replaces the filters after validating them
    ///
    /// # Errors
    ///
    /// Returns the validation report when `filters` are invalid; the current
    /// filters are kept.
    pub fn set_filters(&mut self, filters: Filters) -> Result<(), garde::Report> {
        filters.validate()?;
        self.filters = filters;
        Ok(())
    }
}
