//! Timeslice: XVIZ v2 timeslice decoder
//!
//! Turns one timeslice message (a timestamp plus state updates) into a
//! normalized snapshot: a timestamp and a map from stream name to decoded
//! stream. Flow: message → resolver → aggregator → snapshot.

pub mod config;
pub mod core;
pub mod error;
pub mod types;

pub use crate::config::{ParserConfig, StreamBlacklist};
pub use crate::core::{parse_timeslice, TimesliceParser};
pub use crate::error::{ConfigError, DecodeError, TimesliceError, TimesliceResult};

// =============================================================================
// PROTOCOL LIMITS
// =============================================================================

/// The only update_type this decoder accepts
pub const SNAPSHOT_UPDATE_TYPE: &str = "snapshot";

/// Updates per timeslice currently supported
pub const MAX_UPDATES_PER_TIMESLICE: usize = 1;

// =============================================================================
// VERSION
// =============================================================================

pub const VERSION: &str = "1.0.0";
