//! Display order of the session list
//!
//! [`SessionList`] owns the order in which sessions are shown. It knows
//! nothing about conferences beyond being able to check that a conference's
//! members occupy a contiguous run of rows; keeping that true is the job of
//! the drag-and-drop transitions that drive it.
//!
//! Every edit is recorded as a [`ListChange`] (rows inserted or rows removed)
//! in an internal journal. The model drains the journal after each operation
//! and turns it into view notifications, so a view never needs a full reset.

use std::ops::Range;

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::conference::Conference;
use crate::error::{SessionListError, SessionListResult};
use crate::session::SessionId;

/// One row-level edit of the list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ListChange {
    /// `count` rows were inserted starting at `start`
    Inserted { start: usize, count: usize },
    /// `count` rows were removed starting at `start`
    Removed { start: usize, count: usize },
}

/// Ordered, duplicate-free sequence of session ids
#[derive(Debug, Clone, Default)]
pub struct SessionList {
    order: Vec<SessionId>,
    journal: Vec<ListChange>,
}

impl SessionList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn contains(&self, session_id: SessionId) -> bool {
        self.order.contains(&session_id)
    }

    /// Session at row `index`
    pub fn get(&self, index: usize) -> Option<SessionId> {
        self.order.get(index).copied()
    }

    pub fn as_slice(&self) -> &[SessionId] {
        &self.order
    }

    pub fn iter(&self) -> impl Iterator<Item = SessionId> + '_ {
        self.order.iter().copied()
    }

    /// Row of `session_id`, if present
    pub fn index_of(&self, session_id: SessionId) -> Option<usize> {
        self.order.iter().position(|id| *id == session_id)
    }

    /// Append a session; fails if it is already in the list
    pub fn add(&mut self, session_id: SessionId) -> SessionListResult<usize> {
        if self.contains(session_id) {
            return Err(SessionListError::DuplicateSession { session_id });
        }
        let position = self.order.len();
        self.order.push(session_id);
        self.record(ListChange::Inserted { start: position, count: 1 });
        Ok(position)
    }

    /// Remove a session by identity, returning the row it occupied
    ///
    /// Conference membership is not touched; callers tear the conference down
    /// themselves.
    pub fn remove(&mut self, session_id: SessionId) -> SessionListResult<usize> {
        let position = self
            .index_of(session_id)
            .ok_or(SessionListError::SessionNotFound { session_id })?;
        self.order.remove(position);
        self.record(ListChange::Removed { start: position, count: 1 });
        Ok(position)
    }

    /// Insert `session_id` at `position`
    ///
    /// If the session is already in the list it is taken out first (one
    /// removal) and `position` refers to the list without it.
    pub(crate) fn move_into(&mut self, session_id: SessionId, position: usize) -> SessionListResult<usize> {
        let len_without = if self.contains(session_id) {
            self.order.len() - 1
        } else {
            self.order.len()
        };
        if position > len_without {
            return Err(SessionListError::PositionOutOfRange {
                position,
                len: len_without,
            });
        }
        if self.contains(session_id) {
            self.remove(session_id)?;
        }
        self.order.insert(position, session_id);
        self.record(ListChange::Inserted { start: position, count: 1 });
        Ok(position)
    }

    /// Insert several sessions as one contiguous block
    pub(crate) fn insert_block(&mut self, position: usize, sessions: &[SessionId]) -> SessionListResult<()> {
        if position > self.order.len() {
            return Err(SessionListError::PositionOutOfRange {
                position,
                len: self.order.len(),
            });
        }
        if let Some(session_id) = sessions.iter().copied().find(|id| self.contains(*id)) {
            return Err(SessionListError::DuplicateSession { session_id });
        }
        if sessions.is_empty() {
            return Ok(());
        }
        self.order.splice(position..position, sessions.iter().copied());
        self.record(ListChange::Inserted {
            start: position,
            count: sessions.len(),
        });
        Ok(())
    }

    /// Remove a contiguous block of rows, returning the removed ids
    pub(crate) fn remove_block(&mut self, rows: Range<usize>) -> SessionListResult<Vec<SessionId>> {
        if rows.end > self.order.len() || rows.start > rows.end {
            return Err(SessionListError::PositionOutOfRange {
                position: rows.end,
                len: self.order.len(),
            });
        }
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        let start = rows.start;
        let removed: Vec<SessionId> = self.order.drain(rows).collect();
        self.record(ListChange::Removed {
            start,
            count: removed.len(),
        });
        Ok(removed)
    }

    /// Rows occupied by the members of `conference`
    ///
    /// Returns `None` if a member is missing from the list or the members do
    /// not form one contiguous run in member order.
    pub fn block_of(&self, conference: &Conference) -> Option<Range<usize>> {
        let first = self.index_of(conference.first()?)?;
        let contiguous = conference
            .members()
            .iter()
            .enumerate()
            .all(|(offset, id)| self.order.get(first + offset) == Some(id));
        contiguous.then(|| first..first + conference.len())
    }

    /// Take the row edits recorded since the last drain
    pub(crate) fn drain_changes(&mut self) -> Vec<ListChange> {
        std::mem::take(&mut self.journal)
    }

    fn record(&mut self, change: ListChange) {
        trace!(?change, len = self.order.len(), "Session list changed");
        self.journal.push(change);
    }
}
