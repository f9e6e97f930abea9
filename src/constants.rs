//! Configuration constants for the buzzer reader
//!
//! This module contains the limits, thresholds, and point values used
//! throughout the judging engine and the reading state machines, grouped
//! by the component that consumes them.

/// Answer judging constants
pub mod judge {
    /// Similarity a submission must exceed to match an answer
    pub const MATCH_THRESHOLD: f64 = 0.6;
    /// Weight of answer bigrams the submission is missing
    pub const ANSWER_WEIGHT: f64 = 0.75;
    /// Weight of submission bigrams the answer does not contain
    pub const SUBMISSION_WEIGHT: f64 = 0.25;
}

/// Tossup scoring constants
pub mod tossup {
    /// Default points for a correct buzz inside the power span
    pub const POWER_POINTS: i32 = 15;
    /// Default points for a correct buzz outside the power span
    pub const BASE_POINTS: i32 = 10;
    /// Default penalty for an incorrect early buzz
    pub const NEG_POINTS: i32 = -5;
    /// Token marking the end of the power span in question text
    pub const POWER_MARKER: &str = "(*)";
}

/// Bonus scoring constants
pub mod bonus {
    /// Number of parts in every bonus
    pub const PART_COUNT: usize = 3;
    /// Points earned per correct part
    pub const POINTS_PER_PART: u32 = 10;
}

/// Word reveal timing constants
pub mod reading {
    /// Slowest reading speed setting
    pub const MIN_SPEED: u8 = 0;
    /// Fastest reading speed setting
    pub const MAX_SPEED: u8 = 100;
    /// Reading speed used when none is configured
    pub const DEFAULT_SPEED: u8 = 50;
    /// Offset the speed is subtracted from to get the per-word millisecond scale
    pub const SPEED_OFFSET: f64 = 125.0;
    /// Multiplier applied to the per-word millisecond scale
    pub const SPEED_FACTOR: f64 = 0.9;
    /// Extra weight given to words that end a sentence or the power span
    pub const PAUSE_WEIGHT: f64 = 2.0;
}

/// Pending question queue constants
pub mod queue {
    /// Default queue length under which a background refill is requested
    pub const DEFAULT_REFILL_THRESHOLD: usize = 3;
    /// Maximum configurable refill threshold
    pub const MAX_REFILL_THRESHOLD: usize = 20;
    /// Default number of questions requested per fetch
    pub const DEFAULT_BATCH_SIZE: usize = 10;
    /// Maximum number of questions requested per fetch
    pub const MAX_BATCH_SIZE: usize = 100;
}

/// Question filter constants
pub mod filters {
    /// Lowest difficulty id
    pub const MIN_DIFFICULTY: u8 = 1;
    /// Highest difficulty id
    pub const MAX_DIFFICULTY: u8 = 10;
    /// Maximum length of a free-text filter in characters
    pub const MAX_QUERY_LENGTH: usize = 200;
    /// Maximum number of subcategories in one filter
    pub const MAX_SUBCATEGORY_COUNT: usize = 64;
}

/// Answer text configuration constants
pub mod answer_text {
    /// Maximum length of a submitted answer in characters
    pub const MAX_LENGTH: usize = 200;
}

/// History view constants
pub mod history {
    /// Number of records shown in the recent results view
    pub const RECENT_LIMIT: usize = 10;
}
