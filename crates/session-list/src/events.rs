//! Change notifications for session list views
//!
//! The model never touches widgets. Every structural or visual change is
//! described by a [`SessionListEvent`] and delivered two ways:
//!
//! - synchronously to every registered [`SessionListEventHandler`], which
//!   also receives a shared reference to the model so it can query roles,
//!   selection and drop indicators while handling the event;
//! - through a `tokio::sync::broadcast` channel obtained from
//!   [`SessionModel::subscribe`](crate::SessionModel::subscribe), for
//!   consumers that live elsewhere.
//!
//! Events are queued while an operation runs and published only once it has
//! completed, so no observer ever sees a half-applied transition. Handlers
//! only get `&SessionModel`, which makes re-entrant mutation from inside a
//! handler impossible.
//!
//! # Example
//!
//! ```rust
//! use std::sync::{Arc, Mutex};
//! use rvoip_session_list::{Session, SessionListEvent, SessionModel};
//!
//! let mut model = SessionModel::with_defaults();
//! let seen = Arc::new(Mutex::new(Vec::new()));
//! let sink = seen.clone();
//! model.add_event_handler("rows", Arc::new(move |event: &SessionListEvent, _: &SessionModel| {
//!     sink.lock().unwrap().push(event.clone());
//! }));
//!
//! let id = model.add_session(Session::new("Alice", "sip:alice@example.com", vec![])).unwrap();
//! assert_eq!(
//!     seen.lock().unwrap().as_slice(),
//!     &[
//!         SessionListEvent::SessionsInserted { start: 0, count: 1 },
//!         SessionListEvent::SessionAdded { session_id: id },
//!     ]
//! );
//! ```

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::trace;

use crate::conference::{ConferenceId, ConferenceRole};
use crate::list::ListChange;
use crate::model::SessionModel;
use crate::session::SessionId;

/// A change the view has to reflect
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionListEvent {
    /// Rows `start..start + count` were inserted
    SessionsInserted { start: usize, count: usize },
    /// Rows `start..start + count` were removed
    SessionsRemoved { start: usize, count: usize },
    /// A session's position within its conference changed
    SessionRoleChanged {
        session_id: SessionId,
        role: ConferenceRole,
    },
    /// The view should show exactly these sessions as selected (list order)
    SelectionShouldChangeTo { sessions: Vec<SessionId> },
    /// The view should show the drop indicator on exactly these sessions
    DropIndicatorsChanged { sessions: Vec<SessionId> },
    /// A call was presented to the list
    SessionAdded { session_id: SessionId },
    /// A call left the list
    SessionRemoved { session_id: SessionId },
    /// Display attributes of a session changed
    SessionUpdated { session_id: SessionId },
    /// Two sessions were joined into a new conference
    ConferenceCreated {
        conference_id: ConferenceId,
        members: Vec<SessionId>,
    },
    /// A conference fell below two members and no longer exists
    ConferenceDissolved { conference_id: ConferenceId },
}

impl SessionListEvent {
    /// Session this event is about, if it concerns a single session
    pub fn session_id(&self) -> Option<SessionId> {
        match self {
            SessionListEvent::SessionRoleChanged { session_id, .. }
            | SessionListEvent::SessionAdded { session_id }
            | SessionListEvent::SessionRemoved { session_id }
            | SessionListEvent::SessionUpdated { session_id } => Some(*session_id),
            _ => None,
        }
    }

    /// Check if this event changes the row layout of the list
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            SessionListEvent::SessionsInserted { .. } | SessionListEvent::SessionsRemoved { .. }
        )
    }
}

impl From<ListChange> for SessionListEvent {
    fn from(change: ListChange) -> Self {
        match change {
            ListChange::Inserted { start, count } => SessionListEvent::SessionsInserted { start, count },
            ListChange::Removed { start, count } => SessionListEvent::SessionsRemoved { start, count },
        }
    }
}

/// Receiver of session list events
///
/// Handlers run on the thread that mutates the model, after the operation
/// that produced the event has completed.
pub trait SessionListEventHandler: Send + Sync {
    fn on_event(&self, event: &SessionListEvent, model: &SessionModel);
}

impl<F> SessionListEventHandler for F
where
    F: Fn(&SessionListEvent, &SessionModel) + Send + Sync,
{
    fn on_event(&self, event: &SessionListEvent, model: &SessionModel) {
        self(event, model)
    }
}

/// Named handlers, a broadcast channel and the queue of unpublished events
pub(crate) struct EventDispatcher {
    handlers: Vec<(String, Arc<dyn SessionListEventHandler>)>,
    event_tx: broadcast::Sender<SessionListEvent>,
    pending: Vec<SessionListEvent>,
}

impl std::fmt::Debug for EventDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventDispatcher")
            .field("handlers", &self.handlers.iter().map(|(name, _)| name).collect::<Vec<_>>())
            .field("subscribers", &self.event_tx.receiver_count())
            .field("pending", &self.pending)
            .finish()
    }
}

impl EventDispatcher {
    pub(crate) fn new(channel_capacity: usize) -> Self {
        let (event_tx, _) = broadcast::channel(channel_capacity);
        Self {
            handlers: Vec::new(),
            event_tx,
            pending: Vec::new(),
        }
    }

    /// Register a handler; a handler with the same name is replaced
    pub(crate) fn add_handler(&mut self, name: &str, handler: Arc<dyn SessionListEventHandler>) {
        self.handlers.retain(|(existing, _)| existing != name);
        self.handlers.push((name.to_string(), handler));
    }

    pub(crate) fn remove_handler(&mut self, name: &str) -> bool {
        if let Some(pos) = self.handlers.iter().position(|(n, _)| n == name) {
            self.handlers.remove(pos);
            true
        } else {
            false
        }
    }

    pub(crate) fn handler_count(&self) -> usize {
        self.handlers.len()
    }

    pub(crate) fn subscribe(&self) -> broadcast::Receiver<SessionListEvent> {
        self.event_tx.subscribe()
    }

    pub(crate) fn queue(&mut self, event: SessionListEvent) {
        trace!(?event, "Event queued");
        self.pending.push(event);
    }

    pub(crate) fn take_pending(&mut self) -> Vec<SessionListEvent> {
        std::mem::take(&mut self.pending)
    }

    pub(crate) fn handlers(&self) -> Vec<Arc<dyn SessionListEventHandler>> {
        self.handlers.iter().map(|(_, handler)| handler.clone()).collect()
    }

    /// Send on the broadcast channel; having no subscribers is not an error
    pub(crate) fn broadcast(&self, event: SessionListEvent) {
        let _ = self.event_tx.send(event);
    }
}
