//! Conference-aware selection
//!
//! The view selects individual rows, but a conference is always selected or
//! deselected as a whole. [`SelectionTracker`] keeps the set of selected
//! sessions and expands every change to the full group of the session it
//! touches: the session alone when it is standalone, every member when it is
//! in a conference.
//!
//! When the expanded selection differs from what the model held before, the
//! model publishes [`SessionListEvent::SelectionShouldChangeTo`](crate::SessionListEvent::SelectionShouldChangeTo)
//! so the view can mirror it.

use std::collections::HashSet;

use tracing::debug;

use crate::error::{SessionListError, SessionListResult};
use crate::model::{group_members, SessionModel};
use crate::session::SessionId;

/// Set of selected sessions, kept atomic per conference
#[derive(Debug, Clone, Default)]
pub struct SelectionTracker {
    selected: HashSet<SessionId>,
}

impl SelectionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_selected(&self, session_id: SessionId) -> bool {
        self.selected.contains(&session_id)
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    pub fn snapshot(&self) -> HashSet<SessionId> {
        self.selected.clone()
    }

    /// Apply a selection delta reported by the view
    ///
    /// Deselections are applied first, then selections, each expanded to the
    /// whole group of the session. Returns whether the set changed.
    pub fn selection_changed<F>(&mut self, added: &[SessionId], removed: &[SessionId], group_of: F) -> bool
    where
        F: Fn(SessionId) -> Vec<SessionId>,
    {
        let before = self.selected.clone();
        for session_id in removed {
            for member in group_of(*session_id) {
                self.selected.remove(&member);
            }
        }
        for session_id in added {
            for member in group_of(*session_id) {
                self.selected.insert(member);
            }
        }
        before != self.selected
    }

    /// Select `session_id` and its whole group
    pub fn select<F>(&mut self, session_id: SessionId, group_of: F) -> bool
    where
        F: Fn(SessionId) -> Vec<SessionId>,
    {
        self.selection_changed(&[session_id], &[], group_of)
    }

    /// Deselect `session_id` and its whole group
    pub fn deselect<F>(&mut self, session_id: SessionId, group_of: F) -> bool
    where
        F: Fn(SessionId) -> Vec<SessionId>,
    {
        self.selection_changed(&[], &[session_id], group_of)
    }

    /// Clear everything, then select `session_id` and its group
    pub fn select_only<F>(&mut self, session_id: SessionId, group_of: F) -> bool
    where
        F: Fn(SessionId) -> Vec<SessionId>,
    {
        let group: HashSet<SessionId> = group_of(session_id).into_iter().collect();
        if group == self.selected {
            return false;
        }
        self.selected = group;
        true
    }

    pub fn clear(&mut self) -> bool {
        let changed = !self.selected.is_empty();
        self.selected.clear();
        changed
    }

    /// Replace the selection with exactly `sessions`, without group expansion
    pub(crate) fn replace(&mut self, sessions: impl IntoIterator<Item = SessionId>) -> bool {
        let next: HashSet<SessionId> = sessions.into_iter().collect();
        if next == self.selected {
            return false;
        }
        self.selected = next;
        true
    }

    /// Drop a single session from the selection, without group expansion
    pub(crate) fn forget(&mut self, session_id: SessionId) -> bool {
        self.selected.remove(&session_id)
    }

    /// Check that `members` are either all selected or all unselected
    pub fn is_atomic(&self, members: &[SessionId]) -> bool {
        let selected = members.iter().filter(|id| self.is_selected(**id)).count();
        selected == 0 || selected == members.len()
    }
}

impl SessionModel {
    /// Check if a session is selected
    pub fn is_selected(&self, session_id: SessionId) -> bool {
        self.selection.is_selected(session_id)
    }

    /// Selected sessions in list order
    pub fn selected_sessions(&self) -> Vec<SessionId> {
        self.list
            .iter()
            .filter(|id| self.selection.is_selected(*id))
            .collect()
    }

    /// Apply a selection change reported by the view
    ///
    /// Every session in `removed` is deselected together with its conference
    /// siblings, then every session in `added` is selected together with its
    /// siblings. Unknown ids fail the whole call without changing anything.
    pub fn selection_changed(&mut self, added: &[SessionId], removed: &[SessionId]) -> SessionListResult<()> {
        if let Some(unknown) = added
            .iter()
            .chain(removed.iter())
            .copied()
            .find(|id| !self.sessions.contains_key(id))
        {
            return Err(SessionListError::session_not_found(unknown));
        }

        let before = self.selection.snapshot();
        let (sessions, conferences) = (&self.sessions, &self.conferences);
        self.selection
            .selection_changed(added, removed, |id| group_members(sessions, conferences, id));

        debug!(
            added = added.len(),
            removed = removed.len(),
            selected = self.selection.len(),
            "Selection changed"
        );
        self.queue_selection_if_changed(&before);
        self.commit();
        Ok(())
    }

    /// Clear the selection and select `session_id` (and its conference)
    pub fn select_only(&mut self, session_id: SessionId) -> SessionListResult<()> {
        self.ensure_known(session_id)?;
        let before = self.selection.snapshot();
        let (sessions, conferences) = (&self.sessions, &self.conferences);
        self.selection
            .select_only(session_id, |id| group_members(sessions, conferences, id));
        self.queue_selection_if_changed(&before);
        self.commit();
        Ok(())
    }

    /// Deselect everything
    pub fn clear_selection(&mut self) {
        let before = self.selection.snapshot();
        self.selection.clear();
        self.queue_selection_if_changed(&before);
        self.commit();
    }
}
