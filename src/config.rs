//! Session configuration knobs.

use std::time::Duration;

/// Implementer-facing knobs with no effect on decoded values besides
/// `max_event_length` gating. Plain struct with `Default`, matching the
/// Plain struct with `Default` rather than a builder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    /// `Session::open` rejects any header whose `length` exceeds this with `EventOverrun`.
    pub max_event_length: u32,
    /// Advisory only; read by callers driving `Follow`'s blocking read loop.
    pub follow_poll_interval: Duration,
    /// The core never validates the trailing 4 bytes of an event regardless of this setting.
    pub verify_checksum: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            max_event_length: u32::MAX,
            follow_poll_interval: Duration::from_secs(1),
            verify_checksum: false,
        }
    }
}
