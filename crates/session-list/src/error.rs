//! Error types for the session list model
//!
//! Every error in this crate is non-fatal. A failed operation leaves the model
//! exactly as it was before the call, so a view can simply ignore the result
//! or use it to veto a drag gesture.
//!
//! # Error Categories
//!
//! - **Drop Errors** - a drag-and-drop gesture that does not map to a grouping
//!   transition (dropping a session onto itself, onto a sibling, past the end
//!   of the list, or onto a different conference)
//! - **Lookup Errors** - a session or conference id that the model does not know
//! - **Configuration Errors** - invalid [`SessionListConfig`](crate::SessionListConfig) values
//! - **Invariant Errors** - reported by [`SessionModel::check_invariants`](crate::SessionModel::check_invariants);
//!   these indicate a bug in the model, never a user action
//!
//! # Handling Drop Rejections
//!
//! ```rust
//! use rvoip_session_list::{DropRejection, Session, SessionListError, SessionModel};
//!
//! let mut model = SessionModel::with_defaults();
//! let alice = model.add_session(Session::new("Alice", "sip:alice@example.com", vec![])).unwrap();
//!
//! match model.drop_session(alice, Some(alice)) {
//!     Ok(outcome) => println!("grouping changed: {:?}", outcome),
//!     Err(SessionListError::InvalidDrop { reason }) => {
//!         assert_eq!(reason, DropRejection::SameSession);
//!     }
//!     Err(e) => eprintln!("unexpected error: {}", e),
//! }
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::conference::ConferenceId;
use crate::session::SessionId;

/// Result type alias for session list operations
pub type SessionListResult<T> = Result<T, SessionListError>;

/// Why a drop (or a hovered drop position) does not map to a transition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DropRejection {
    /// The target is the dragged session itself
    SameSession,
    /// The target belongs to the conference the dragged session is in
    SameConference,
    /// A standalone session was dropped past the end of the list
    NoTargetForStandalone,
    /// A conference member was dropped onto a member of another conference
    CrossConference,
    /// A drop arrived while no drag gesture was in progress
    NoDragInProgress,
    /// The dragged or target session is not in the list
    UnknownSession,
}

impl fmt::Display for DropRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            DropRejection::SameSession => "session dropped onto itself",
            DropRejection::SameConference => "session dropped onto a member of its own conference",
            DropRejection::NoTargetForStandalone => "standalone session dropped past the end of the list",
            DropRejection::CrossConference => "conferences cannot be merged by drag and drop",
            DropRejection::NoDragInProgress => "no drag in progress",
            DropRejection::UnknownSession => "session is not in the list",
        };
        f.write_str(text)
    }
}

/// Errors reported by the session list model
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionListError {
    /// The drop does not correspond to any grouping transition
    #[error("Invalid drop: {reason}")]
    InvalidDrop { reason: DropRejection },

    #[error("Session not found: {session_id}")]
    SessionNotFound { session_id: SessionId },

    #[error("Session already in list: {session_id}")]
    DuplicateSession { session_id: SessionId },

    #[error("Conference not found: {conference_id}")]
    ConferenceNotFound { conference_id: ConferenceId },

    #[error("Session {session_id} is not a member of conference {conference_id}")]
    NotAConferenceMember {
        session_id: SessionId,
        conference_id: ConferenceId,
    },

    /// A positional insert past the end of the list
    #[error("Position {position} out of range for list of length {len}")]
    PositionOutOfRange { position: usize, len: usize },

    #[error("Invalid configuration: {field} - {reason}")]
    InvalidConfiguration { field: String, reason: String },

    /// The model's structural invariants do not hold
    #[error("Invariant violation: {details}")]
    InvariantViolation { details: String },
}

impl SessionListError {
    /// Create an invalid drop error
    pub fn invalid_drop(reason: DropRejection) -> Self {
        Self::InvalidDrop { reason }
    }

    /// Create a session not found error
    pub fn session_not_found(session_id: SessionId) -> Self {
        Self::SessionNotFound { session_id }
    }

    /// Create an invalid configuration error
    pub fn invalid_configuration(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidConfiguration {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Create an invariant violation error
    pub fn invariant_violation(details: impl Into<String>) -> Self {
        Self::InvariantViolation {
            details: details.into(),
        }
    }

    /// Rejection reason, if this error is a refused drop
    pub fn drop_rejection(&self) -> Option<DropRejection> {
        match self {
            SessionListError::InvalidDrop { reason } => Some(*reason),
            _ => None,
        }
    }

    /// Check if this error is a refused drop
    pub fn is_drop_rejection(&self) -> bool {
        matches!(self, SessionListError::InvalidDrop { .. })
    }

    /// Check if this error comes from an unknown or duplicate id
    pub fn is_lookup_error(&self) -> bool {
        matches!(
            self,
            SessionListError::SessionNotFound { .. }
                | SessionListError::DuplicateSession { .. }
                | SessionListError::ConferenceNotFound { .. }
                | SessionListError::NotAConferenceMember { .. }
        )
    }

    /// Get error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            SessionListError::InvalidDrop { .. } => "drop",

            SessionListError::SessionNotFound { .. }
            | SessionListError::DuplicateSession { .. }
            | SessionListError::ConferenceNotFound { .. }
            | SessionListError::NotAConferenceMember { .. }
            | SessionListError::PositionOutOfRange { .. } => "lookup",

            SessionListError::InvalidConfiguration { .. } => "configuration",

            SessionListError::InvariantViolation { .. } => "invariant",
        }
    }
}

impl From<DropRejection> for SessionListError {
    fn from(reason: DropRejection) -> Self {
        Self::InvalidDrop { reason }
    }
}
