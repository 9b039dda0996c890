//! Configuration constants for the bingo engine
//!
//! This module contains the configuration limits and defaults used
//! throughout the engine to ensure data integrity and provide consistent
//! boundaries for the different round components.

/// Round-level configuration constants
pub mod round {
    /// Maximum number of players allowed in a single round
    pub const MAX_PLAYER_COUNT: usize = 100;
    /// Maximum length of a player name in bytes
    pub const MAX_NAME_LENGTH: usize = 30;
    /// Default duration of the pre-game countdown in seconds
    pub const DEFAULT_PREGAME_COUNTDOWN: u64 = 8;
    /// Minimum duration of the pre-game countdown in seconds
    pub const MIN_PREGAME_COUNTDOWN: u64 = 0;
    /// Maximum duration of the pre-game countdown in seconds
    pub const MAX_PREGAME_COUNTDOWN: u64 = 300;
}

/// Draw pool configuration constants
pub mod draw {
    /// Default smallest callable number
    pub const DEFAULT_RANGE_MIN: u32 = 1;
    /// Default largest callable number
    pub const DEFAULT_RANGE_MAX: u32 = 36;
}

/// Ticket configuration constants
pub mod ticket {
    /// Default number of distinct numbers on a ticket
    pub const DEFAULT_SIZE: usize = 12;
    /// Minimum number of distinct numbers on a ticket
    pub const MIN_SIZE: usize = 1;
    /// Maximum number of distinct numbers on a ticket
    pub const MAX_SIZE: usize = 90;
}

/// Number caller configuration constants
pub mod caller {
    /// Default delay between two consecutive calls in seconds
    pub const DEFAULT_CALL_DELAY: u64 = 3;
    /// Minimum delay between two consecutive calls in seconds
    pub const MIN_CALL_DELAY: u64 = 1;
    /// Maximum delay between two consecutive calls in seconds
    pub const MAX_CALL_DELAY: u64 = 60;
}
