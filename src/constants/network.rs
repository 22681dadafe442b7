//! Network constants.

/// Manifest fetch attempts before giving up
pub const NETWORK_MAX_RETRIES: u32 = 3;
/// Per-attempt manifest timeout (milliseconds)
pub const NETWORK_TIMEOUT_MS: u64 = 10_000;
/// Base retry delay; attempt `n` waits `n` times this (milliseconds)
pub const NETWORK_RETRY_DELAY_MS: u64 = 1_000;
