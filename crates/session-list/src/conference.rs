//! Conferences: ordered groups of sessions
//!
//! A [`Conference`] ties two or more sessions together. Its member order is
//! the order in which the members appear in the session list, and each
//! member's [`ConferenceRole`] follows from its position in that order:
//!
//! ```text
//!  ┌──────────────┐
//!  │ Alice   Top  │   first member
//!  ├──────────────┤
//!  │ Bob   Middle │   every member in between
//!  ├──────────────┤
//!  │ Carol Bottom │   last member
//!  └──────────────┘
//! ```
//!
//! Roles are derived from the membership on every query and never stored.
//! Membership changes return the list of roles that changed so the model can
//! forward them to the view.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::error::{SessionListError, SessionListResult};
use crate::session::{Session, SessionId};

/// Stable identity of a conference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ConferenceId(pub Uuid);

impl ConferenceId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConferenceId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConferenceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Visual position of a session relative to its conference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ConferenceRole {
    /// Not part of a conference
    #[default]
    Standalone,
    /// First member of a conference
    Top,
    /// Member between the first and the last
    Middle,
    /// Last member of a conference
    Bottom,
}

impl ConferenceRole {
    /// Role of the member at `index` in a conference of `len` members
    pub fn for_position(index: usize, len: usize) -> Self {
        if len < 2 || index >= len {
            ConferenceRole::Standalone
        } else if index == 0 {
            ConferenceRole::Top
        } else if index == len - 1 {
            ConferenceRole::Bottom
        } else {
            ConferenceRole::Middle
        }
    }

    pub fn is_grouped(&self) -> bool {
        !matches!(self, ConferenceRole::Standalone)
    }
}

/// A role that changed as the result of a membership edit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleChange {
    pub session_id: SessionId,
    pub role: ConferenceRole,
}

/// Result of removing a member from a conference
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemberRemoval {
    /// Roles that changed, including the removed session's (now Standalone)
    pub role_changes: Vec<RoleChange>,
    /// The single member left behind when the conference fell below two
    /// members. The caller must clear its conference reference and discard
    /// the conference.
    pub orphan: Option<SessionId>,
}

impl MemberRemoval {
    /// Check if the removal dissolved the conference
    pub fn dissolved(&self) -> bool {
        self.orphan.is_some()
    }
}

/// An ordered group of sessions
#[derive(Debug, Clone)]
pub struct Conference {
    id: ConferenceId,
    members: Vec<SessionId>,
}

impl Conference {
    /// Create an empty conference
    ///
    /// An empty or single-member conference only exists while it is being
    /// assembled or torn down; the model never keeps one around.
    pub fn new() -> Self {
        Self {
            id: ConferenceId::new(),
            members: Vec::new(),
        }
    }

    pub fn id(&self) -> ConferenceId {
        self.id
    }

    /// Members in list order
    pub fn members(&self) -> &[SessionId] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn contains(&self, session_id: SessionId) -> bool {
        self.members.contains(&session_id)
    }

    /// First member (role Top)
    pub fn first(&self) -> Option<SessionId> {
        self.members.first().copied()
    }

    /// Last member (role Bottom)
    pub fn last(&self) -> Option<SessionId> {
        self.members.last().copied()
    }

    /// Members other than `session_id`, in order
    pub fn siblings_of(&self, session_id: SessionId) -> Vec<SessionId> {
        self.members
            .iter()
            .copied()
            .filter(|id| *id != session_id)
            .collect()
    }

    /// Role of `session_id`; Standalone when it is not a member
    pub fn role_of(&self, session_id: SessionId) -> ConferenceRole {
        self.members
            .iter()
            .position(|id| *id == session_id)
            .map(|index| ConferenceRole::for_position(index, self.members.len()))
            .unwrap_or_default()
    }

    /// Current role of every member, in order
    pub fn roles(&self) -> Vec<RoleChange> {
        let len = self.members.len();
        self.members
            .iter()
            .enumerate()
            .map(|(index, id)| RoleChange {
                session_id: *id,
                role: ConferenceRole::for_position(index, len),
            })
            .collect()
    }

    /// Append `session` as the new last member
    ///
    /// The first member gets no role until a second one joins; after that the
    /// previous last member becomes Top (if it was alone) or Middle and the
    /// new member becomes Bottom.
    pub fn add_member(&mut self, session: &mut Session) -> Vec<RoleChange> {
        debug_assert!(
            session.conference.is_none(),
            "session {} is already in conference {:?}",
            session.id(),
            session.conference
        );
        debug_assert!(!self.contains(session.id()));

        let before = self.role_snapshot();
        self.members.push(session.id());
        session.conference = Some(self.id);

        debug!(
            conference_id = %self.id,
            session_id = %session.id(),
            members = self.members.len(),
            "Session added to conference"
        );
        self.changes_since(&before, &[])
    }

    /// Remove `session` from the conference and clear its conference reference
    pub fn remove_member(&mut self, session: &mut Session) -> SessionListResult<MemberRemoval> {
        let session_id = session.id();
        let Some(index) = self.members.iter().position(|id| *id == session_id) else {
            return Err(SessionListError::NotAConferenceMember {
                session_id,
                conference_id: self.id,
            });
        };

        let before = self.role_snapshot();
        self.members.remove(index);
        session.conference = None;

        let orphan = if self.members.len() == 1 {
            self.members.first().copied()
        } else {
            None
        };

        debug!(
            conference_id = %self.id,
            session_id = %session_id,
            members = self.members.len(),
            dissolved = orphan.is_some(),
            "Session removed from conference"
        );

        Ok(MemberRemoval {
            role_changes: self.changes_since(&before, &[session_id]),
            orphan,
        })
    }

    fn role_snapshot(&self) -> HashMap<SessionId, ConferenceRole> {
        self.roles()
            .into_iter()
            .map(|change| (change.session_id, change.role))
            .collect()
    }

    /// Roles that differ from `before`, members first (in order), then the
    /// `departed` sessions which are now Standalone
    fn changes_since(
        &self,
        before: &HashMap<SessionId, ConferenceRole>,
        departed: &[SessionId],
    ) -> Vec<RoleChange> {
        let mut changes: Vec<RoleChange> = self
            .roles()
            .into_iter()
            .filter(|change| before.get(&change.session_id).copied().unwrap_or_default() != change.role)
            .collect();

        for session_id in departed {
            if before.get(session_id).copied().unwrap_or_default() != ConferenceRole::Standalone {
                changes.push(RoleChange {
                    session_id: *session_id,
                    role: ConferenceRole::Standalone,
                });
            }
        }
        changes
    }
}
