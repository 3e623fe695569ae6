//! Session list configuration
//!
//! ```rust
//! use rvoip_session_list::SessionListConfig;
//!
//! let config = SessionListConfig::new()
//!     .with_event_channel_capacity(64)
//!     .with_invariant_checks(true)
//!     .with_auto_select_first(true);
//!
//! assert!(config.validate().is_ok());
//! assert_eq!(config.event_channel_capacity, 64);
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{SessionListError, SessionListResult};

/// Default capacity of the broadcast event channel
pub const DEFAULT_EVENT_CHANNEL_CAPACITY: usize = 256;

/// Behaviour switches for a [`SessionModel`](crate::SessionModel)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionListConfig {
    /// Capacity of the broadcast channel returned by `subscribe()`.
    /// Slow subscribers lag (and skip events) once it is exceeded.
    pub event_channel_capacity: usize,
    /// Audit contiguity, roles and selection after every mutation
    pub verify_invariants: bool,
    /// Select the first session added to an empty list
    pub auto_select_first: bool,
}

impl Default for SessionListConfig {
    fn default() -> Self {
        Self {
            event_channel_capacity: DEFAULT_EVENT_CHANNEL_CAPACITY,
            verify_invariants: cfg!(debug_assertions),
            auto_select_first: false,
        }
    }
}

impl SessionListConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_event_channel_capacity(mut self, capacity: usize) -> Self {
        self.event_channel_capacity = capacity;
        self
    }

    pub fn with_invariant_checks(mut self, enabled: bool) -> Self {
        self.verify_invariants = enabled;
        self
    }

    pub fn with_auto_select_first(mut self, enabled: bool) -> Self {
        self.auto_select_first = enabled;
        self
    }

    /// Check the configuration before building a model
    pub fn validate(&self) -> SessionListResult<()> {
        if self.event_channel_capacity == 0 {
            return Err(SessionListError::invalid_configuration(
                "event_channel_capacity",
                "must be greater than zero",
            ));
        }
        Ok(())
    }
}
