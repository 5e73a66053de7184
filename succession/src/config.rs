//! # Succession Configuration
//!
//! Tunables for the four-layer trigger logic. The defaults encode policy
//! choices, not implementation details: 90 days of silence before anyone
//! worries, two independent verifiers before anything moves, and a 60-day
//! window in which a living owner or a vigilant guardian can stop the
//! whole thing.

use chrono::Duration;
use serde::{Deserialize, Serialize};

/// Days without a heartbeat before an `Active` account enters `Watch`.
pub const DEFAULT_WATCH_AFTER_DAYS: i64 = 90;

/// Days after a succession claim during which the owner or a guardian can
/// halt the process.
pub const DEFAULT_COOLING_OFF_DAYS: i64 = 60;

/// Minimum number of independent verifiers required before succession may
/// proceed.
pub const DEFAULT_VERIFIER_QUORUM: usize = 2;

/// Policy parameters for the succession state machine.
///
/// One instance per ledger. These are read at evaluation time, so a
/// config change applies to in-flight successions too — which is exactly
/// what you want when, say, a regulator lengthens the cooling-off window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuccessionConfig {
    /// Inactivity threshold for Layer 1, in days.
    pub watch_after_days: i64,
    /// Cooling-off window for Layer 4, in days.
    pub cooling_off_days: i64,
    /// Verifier quorum for Layer 3.
    pub verifier_quorum: usize,
}

impl Default for SuccessionConfig {
    fn default() -> Self {
        Self {
            watch_after_days: DEFAULT_WATCH_AFTER_DAYS,
            cooling_off_days: DEFAULT_COOLING_OFF_DAYS,
            verifier_quorum: DEFAULT_VERIFIER_QUORUM,
        }
    }
}

impl SuccessionConfig {
    /// The inactivity threshold as a `Duration`.
    pub fn watch_after(&self) -> Duration {
        Duration::days(self.watch_after_days)
    }

    /// The cooling-off window as a `Duration`.
    pub fn cooling_off(&self) -> Duration {
        Duration::days(self.cooling_off_days)
    }
}
