//! The session list aggregate
//!
//! [`SessionModel`] ties the pieces together: the session arena, the
//! conferences, the display order, the selection and the drag state. It is
//! the only type a view talks to.
//!
//! ```text
//!   view ──begin_drag/drag_over/drop──▶ SessionModel ──SessionListEvent──▶ view
//!                                          │
//!            ┌──────────────┬──────────────┼───────────────┬─────────────────┐
//!            ▼              ▼              ▼               ▼                 ▼
//!      sessions (arena) conferences   SessionList   SelectionTracker  DragDropController
//! ```
//!
//! Sessions and conferences refer to each other by id only. Every public
//! mutation queues its notifications and publishes them in one batch when it
//! completes (see [`events`](crate::events)).

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::{debug, error, info};

use crate::conference::{Conference, ConferenceId, ConferenceRole, MemberRemoval, RoleChange};
use crate::config::SessionListConfig;
use crate::drag_drop::DragDropController;
use crate::error::{SessionListError, SessionListResult};
use crate::events::{EventDispatcher, SessionListEvent, SessionListEventHandler};
use crate::list::SessionList;
use crate::selection::SelectionTracker;
use crate::session::{Session, SessionId, SessionInfo};

/// Ordered list of call sessions grouped into conferences
#[derive(Debug)]
pub struct SessionModel {
    pub(crate) config: SessionListConfig,
    pub(crate) sessions: HashMap<SessionId, Session>,
    pub(crate) conferences: HashMap<ConferenceId, Conference>,
    pub(crate) list: SessionList,
    pub(crate) selection: SelectionTracker,
    pub(crate) drag: DragDropController,
    pub(crate) dispatcher: EventDispatcher,
}

impl SessionModel {
    /// Create an empty model
    pub fn new(config: SessionListConfig) -> SessionListResult<Self> {
        config.validate()?;
        Ok(Self::build(config))
    }

    /// Create an empty model with the default configuration
    pub fn with_defaults() -> Self {
        Self::build(SessionListConfig::default())
    }

    fn build(config: SessionListConfig) -> Self {
        let dispatcher = EventDispatcher::new(config.event_channel_capacity);
        Self {
            config,
            sessions: HashMap::new(),
            conferences: HashMap::new(),
            list: SessionList::new(),
            selection: SelectionTracker::new(),
            drag: DragDropController::new(),
            dispatcher,
        }
    }

    pub fn config(&self) -> &SessionListConfig {
        &self.config
    }

    // ===== Queries =====

    pub fn len(&self) -> usize {
        self.list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    pub fn session(&self, session_id: SessionId) -> Option<&Session> {
        self.sessions.get(&session_id)
    }

    /// Session shown at row `index`
    pub fn session_at(&self, index: usize) -> Option<&Session> {
        self.list.get(index).and_then(|id| self.sessions.get(&id))
    }

    pub fn index_of(&self, session_id: SessionId) -> Option<usize> {
        self.list.index_of(session_id)
    }

    /// Session ids in display order
    pub fn order(&self) -> &[SessionId] {
        self.list.as_slice()
    }

    /// Sessions in display order
    pub fn sessions(&self) -> impl Iterator<Item = &Session> + '_ {
        self.list.iter().filter_map(move |id| self.sessions.get(&id))
    }

    pub fn conference(&self, conference_id: ConferenceId) -> Option<&Conference> {
        self.conferences.get(&conference_id)
    }

    /// Conference `session_id` belongs to, if any
    pub fn conference_of(&self, session_id: SessionId) -> Option<&Conference> {
        self.sessions
            .get(&session_id)
            .and_then(|session| session.conference)
            .and_then(|conference_id| self.conferences.get(&conference_id))
    }

    /// Conferences in the order their blocks appear in the list
    pub fn conferences(&self) -> Vec<&Conference> {
        let mut seen = HashSet::new();
        self.list
            .iter()
            .filter_map(|id| self.sessions.get(&id).and_then(|session| session.conference))
            .filter(|conference_id| seen.insert(*conference_id))
            .filter_map(|conference_id| self.conferences.get(&conference_id))
            .collect()
    }

    pub fn conference_count(&self) -> usize {
        self.conferences.len()
    }

    /// Visual role of a session; Standalone for unknown sessions
    pub fn role_of(&self, session_id: SessionId) -> ConferenceRole {
        self.conference_of(session_id)
            .map(|conference| conference.role_of(session_id))
            .unwrap_or_default()
    }

    /// Role of every session, in display order
    pub fn roles(&self) -> Vec<(SessionId, ConferenceRole)> {
        self.list.iter().map(|id| (id, self.role_of(id))).collect()
    }

    // ===== Session lifecycle =====

    /// Present a new session at the end of the list
    ///
    /// Fails with [`SessionListError::DuplicateSession`] if a session with the
    /// same id is already shown.
    pub fn add_session(&mut self, mut session: Session) -> SessionListResult<SessionId> {
        let session_id = session.id();
        if self.sessions.contains_key(&session_id) {
            return Err(SessionListError::DuplicateSession { session_id });
        }
        session.conference = None;

        let was_empty = self.list.is_empty();
        let position = self.list.add(session_id)?;
        info!(session_id = %session_id, name = %session.name(), position, "Session added");
        self.sessions.insert(session_id, session);
        self.flush_list_changes();
        self.queue(SessionListEvent::SessionAdded { session_id });

        if was_empty && self.config.auto_select_first {
            let before = self.selection.snapshot();
            self.selection.replace([session_id]);
            self.queue_selection_if_changed(&before);
        }

        self.commit();
        Ok(session_id)
    }

    /// Remove a session from the list and return its record
    ///
    /// The session first leaves its conference (dissolving it if only one
    /// member would remain) and the selection, then its row is removed.
    pub fn remove_session(&mut self, session_id: SessionId) -> SessionListResult<Session> {
        self.ensure_known(session_id)?;

        // Losing the dragged session ends the gesture; losing a hovered
        // target only turns its indicator off
        let indicators_changed = if self.drag.is_dragging_session(session_id) {
            self.drag.reset()
        } else {
            self.drag.forget_indicator(session_id)
        };
        if indicators_changed {
            let sessions = self.drag.indicators().to_vec();
            self.queue(SessionListEvent::DropIndicatorsChanged { sessions });
        }

        let before = self.selection.snapshot();
        if let Some(conference_id) = self.sessions.get(&session_id).and_then(|s| s.conference) {
            self.leave_conference(session_id, conference_id)?;
        }
        self.selection.forget(session_id);

        let position = self.list.remove(session_id)?;
        self.flush_list_changes();
        let session = self
            .sessions
            .remove(&session_id)
            .ok_or(SessionListError::SessionNotFound { session_id })?;
        info!(session_id = %session_id, position, "Session removed");

        self.queue(SessionListEvent::SessionRemoved { session_id });
        self.queue_selection_if_changed(&before);
        self.commit();
        Ok(session)
    }

    /// Update the display attributes of a session
    ///
    /// Returns whether anything changed; a [`SessionListEvent::SessionUpdated`]
    /// is published only in that case.
    pub fn update_session<F>(&mut self, session_id: SessionId, update: F) -> SessionListResult<bool>
    where
        F: FnOnce(&mut SessionInfo),
    {
        let session = self
            .sessions
            .get_mut(&session_id)
            .ok_or(SessionListError::SessionNotFound { session_id })?;

        let before = session.info().clone();
        update(session.info_mut());
        let changed = before != *session.info();

        if changed {
            debug!(session_id = %session_id, "Session attributes updated");
            self.queue(SessionListEvent::SessionUpdated { session_id });
            self.commit();
        }
        Ok(changed)
    }

    // ===== Observers =====

    /// Register a named event handler, replacing one with the same name
    pub fn add_event_handler(&mut self, name: &str, handler: Arc<dyn SessionListEventHandler>) {
        self.dispatcher.add_handler(name, handler);
    }

    /// Remove an event handler by name
    pub fn remove_event_handler(&mut self, name: &str) -> bool {
        self.dispatcher.remove_handler(name)
    }

    pub fn event_handler_count(&self) -> usize {
        self.dispatcher.handler_count()
    }

    /// Subscribe to the event stream
    pub fn subscribe(&self) -> broadcast::Receiver<SessionListEvent> {
        self.dispatcher.subscribe()
    }

    // ===== Invariants =====

    /// Audit the structural invariants of the model
    ///
    /// Checks that the list and the arena agree, that every conference has at
    /// least two members with matching back-references, that each
    /// conference's members occupy one contiguous run of rows in member order,
    /// and that every conference is selected either entirely or not at all.
    pub fn check_invariants(&self) -> SessionListResult<()> {
        if self.list.len() != self.sessions.len() {
            return Err(SessionListError::invariant_violation(format!(
                "list has {} rows but {} sessions are known",
                self.list.len(),
                self.sessions.len()
            )));
        }

        let mut seen = HashSet::new();
        for session_id in self.list.iter() {
            if !seen.insert(session_id) {
                return Err(SessionListError::invariant_violation(format!(
                    "session {} appears twice in the list",
                    session_id
                )));
            }
            if !self.sessions.contains_key(&session_id) {
                return Err(SessionListError::invariant_violation(format!(
                    "row for unknown session {}",
                    session_id
                )));
            }
        }

        for (conference_id, conference) in &self.conferences {
            if conference.len() < 2 {
                return Err(SessionListError::invariant_violation(format!(
                    "conference {} has {} members",
                    conference_id,
                    conference.len()
                )));
            }
            for member in conference.members() {
                let back_reference = self.sessions.get(member).and_then(|s| s.conference);
                if back_reference != Some(*conference_id) {
                    return Err(SessionListError::invariant_violation(format!(
                        "member {} of conference {} points to {:?}",
                        member, conference_id, back_reference
                    )));
                }
            }
            if self.list.block_of(conference).is_none() {
                return Err(SessionListError::invariant_violation(format!(
                    "members of conference {} are not contiguous",
                    conference_id
                )));
            }
            if !self.selection.is_atomic(conference.members()) {
                return Err(SessionListError::invariant_violation(format!(
                    "conference {} is partially selected",
                    conference_id
                )));
            }
        }

        for session in self.sessions.values() {
            if let Some(conference_id) = session.conference {
                let is_member = self
                    .conferences
                    .get(&conference_id)
                    .map(|conference| conference.contains(session.id()))
                    .unwrap_or(false);
                if !is_member {
                    return Err(SessionListError::invariant_violation(format!(
                        "session {} points to conference {} which does not list it",
                        session.id(),
                        conference_id
                    )));
                }
            }
        }

        if let Some(stale) = self
            .selection
            .snapshot()
            .into_iter()
            .find(|id| !self.sessions.contains_key(id))
        {
            return Err(SessionListError::invariant_violation(format!(
                "unknown session {} is selected",
                stale
            )));
        }

        Ok(())
    }

    // ===== Crate internals =====

    pub(crate) fn ensure_known(&self, session_id: SessionId) -> SessionListResult<()> {
        if self.sessions.contains_key(&session_id) {
            Ok(())
        } else {
            Err(SessionListError::session_not_found(session_id))
        }
    }

    pub(crate) fn queue(&mut self, event: SessionListEvent) {
        self.dispatcher.queue(event);
    }

    /// Turn the list's row edits into queued events
    pub(crate) fn flush_list_changes(&mut self) {
        for change in self.list.drain_changes() {
            self.dispatcher.queue(change.into());
        }
    }

    pub(crate) fn queue_role_changes(&mut self, changes: Vec<RoleChange>) {
        for change in changes {
            self.dispatcher.queue(SessionListEvent::SessionRoleChanged {
                session_id: change.session_id,
                role: change.role,
            });
        }
    }

    pub(crate) fn queue_selection_if_changed(&mut self, before: &HashSet<SessionId>) {
        if self.selection.snapshot() != *before {
            let sessions = self.selected_sessions();
            self.dispatcher
                .queue(SessionListEvent::SelectionShouldChangeTo { sessions });
        }
    }

    /// Take `session_id` out of its conference
    ///
    /// Queues the resulting role changes. If a single member is left, it is
    /// detached and the conference is discarded.
    pub(crate) fn leave_conference(
        &mut self,
        session_id: SessionId,
        conference_id: ConferenceId,
    ) -> SessionListResult<MemberRemoval> {
        let conference = self
            .conferences
            .get_mut(&conference_id)
            .ok_or(SessionListError::ConferenceNotFound { conference_id })?;
        let session = self
            .sessions
            .get_mut(&session_id)
            .ok_or(SessionListError::SessionNotFound { session_id })?;

        let removal = conference.remove_member(session)?;
        self.queue_role_changes(removal.role_changes.clone());

        if let Some(orphan) = removal.orphan {
            if let Some(last_member) = self.sessions.get_mut(&orphan) {
                last_member.conference = None;
            }
            self.conferences.remove(&conference_id);
            info!(conference_id = %conference_id, "Conference dissolved");
            self.queue(SessionListEvent::ConferenceDissolved { conference_id });
        }
        Ok(removal)
    }

    /// Publish everything queued by the operation that just completed
    pub(crate) fn commit(&mut self) {
        self.flush_list_changes();

        if self.config.verify_invariants {
            if let Err(e) = self.check_invariants() {
                error!(error = %e, "Session list invariant violated");
                debug_assert!(false, "{}", e);
            }
        }

        let events = self.dispatcher.take_pending();
        if events.is_empty() {
            return;
        }
        let handlers = self.dispatcher.handlers();
        for event in events {
            for handler in &handlers {
                handler.on_event(&event, self);
            }
            self.dispatcher.broadcast(event);
        }
    }
}

/// The group selection and drop indicators treat as one unit: the whole
/// conference for a member, the session alone otherwise
pub(crate) fn group_members(
    sessions: &HashMap<SessionId, Session>,
    conferences: &HashMap<ConferenceId, Conference>,
    session_id: SessionId,
) -> Vec<SessionId> {
    sessions
        .get(&session_id)
        .and_then(|session| session.conference)
        .and_then(|conference_id| conferences.get(&conference_id))
        .map(|conference| conference.members().to_vec())
        .unwrap_or_else(|| vec![session_id])
}
