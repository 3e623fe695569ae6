//! Drag-and-drop grouping state machine
//!
//! Conferences are built and taken apart exclusively by dragging one session
//! onto another. The view reports the gesture in three steps:
//!
//! 1. [`SessionModel::begin_drag`] when the user starts dragging a row,
//! 2. [`SessionModel::drag_over`] while the pointer hovers (advisory only:
//!    it computes drop indicators and never touches the list),
//! 3. [`SessionModel::drop_at`] when the button is released, or
//!    [`SessionModel::cancel_drag`] when the gesture is aborted.
//!
//! A drop is resolved against the dragged session (the *source*) and the
//! session under the pointer (the *target*, or none when dropped past the
//! last row).
//!
//! # Rejections
//!
//! Checked in order, before anything is modified:
//!
//! | Condition                                            | Rejection                 |
//! |------------------------------------------------------|---------------------------|
//! | target is the source                                 | `SameSession`             |
//! | target is in the source's conference                 | `SameConference`          |
//! | source is standalone and there is no target          | `NoTargetForStandalone`   |
//! | source and target are in different conferences       | `CrossConference`         |
//!
//! # Transitions
//!
//! | Source                  | Target                 | Transition                               |
//! |-------------------------|------------------------|------------------------------------------|
//! | standalone              | standalone             | [`DropAction::Merge`] into a new conference |
//! | standalone              | conference member      | [`DropAction::Join`] as the new Bottom   |
//! | member of 2             | standalone or none     | [`DropAction::Dissolve`] the conference  |
//! | member of 3 or more     | standalone or none     | [`DropAction::Detach`] below the block   |
//!
//! Each transition runs to completion before any notification is published.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::conference::{Conference, ConferenceId};
use crate::error::{DropRejection, SessionListError, SessionListResult};
use crate::events::SessionListEvent;
use crate::model::{group_members, SessionModel};
use crate::session::{Session, SessionId};

/// Grouping transition selected for a (source, target) pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DropAction {
    /// Two standalone sessions form a new conference
    Merge { source: SessionId, target: SessionId },
    /// A standalone session joins the target's conference
    Join {
        source: SessionId,
        conference_id: ConferenceId,
    },
    /// The source leaves a two-member conference, which dissolves
    Dissolve {
        source: SessionId,
        sibling: SessionId,
        conference_id: ConferenceId,
    },
    /// The source leaves a conference of three or more members
    Detach {
        source: SessionId,
        conference_id: ConferenceId,
    },
}

/// What a completed drop did to the list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DropOutcome {
    /// A new conference was created with `members` (list order)
    Merged {
        conference_id: ConferenceId,
        members: [SessionId; 2],
    },
    /// `session_id` joined `conference_id` as its last member
    Joined {
        session_id: SessionId,
        conference_id: ConferenceId,
        position: usize,
    },
    /// `conference_id` was dissolved; both former members are standalone
    Dissolved {
        conference_id: ConferenceId,
        members: [SessionId; 2],
    },
    /// `session_id` left `conference_id` and now sits at `position`
    Detached {
        session_id: SessionId,
        conference_id: ConferenceId,
        position: usize,
    },
}

/// Hover feedback for the view
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DragFeedback {
    /// Whether releasing the button here would change the grouping
    pub accepted: bool,
    /// Why a drop here would be refused
    pub rejection: Option<DropRejection>,
    /// Sessions that should show the drop indicator
    pub indicators: Vec<SessionId>,
}

/// State of the drag gesture in progress
#[derive(Debug, Clone, Default)]
pub struct DragDropController {
    dragged: Option<SessionId>,
    indicators: Vec<SessionId>,
}

impl DragDropController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Session being dragged, if a gesture is in progress
    pub fn dragged(&self) -> Option<SessionId> {
        self.dragged
    }

    /// Sessions currently showing the drop indicator
    pub fn indicators(&self) -> &[SessionId] {
        &self.indicators
    }

    pub fn is_dragging(&self) -> bool {
        self.dragged.is_some()
    }

    pub(crate) fn is_dragging_session(&self, session_id: SessionId) -> bool {
        self.dragged == Some(session_id)
    }

    /// Turn off the indicator on one session; returns whether it was lit
    pub(crate) fn forget_indicator(&mut self, session_id: SessionId) -> bool {
        let before = self.indicators.len();
        self.indicators.retain(|id| *id != session_id);
        self.indicators.len() != before
    }

    pub(crate) fn start(&mut self, session_id: SessionId) -> bool {
        self.dragged = Some(session_id);
        self.clear_indicators()
    }

    /// Replace the indicator set; returns whether it changed
    pub(crate) fn set_indicators(&mut self, indicators: Vec<SessionId>) -> bool {
        if indicators == self.indicators {
            return false;
        }
        self.indicators = indicators;
        true
    }

    pub(crate) fn clear_indicators(&mut self) -> bool {
        self.set_indicators(Vec::new())
    }

    /// End the gesture; returns whether indicators were shown
    pub(crate) fn reset(&mut self) -> bool {
        self.dragged = None;
        self.clear_indicators()
    }

    /// Pick the transition for dropping `source` onto `target`
    ///
    /// `target` is `None` when the drop happened past the last row.
    pub fn classify(
        sessions: &HashMap<SessionId, Session>,
        conferences: &HashMap<ConferenceId, Conference>,
        source: SessionId,
        target: Option<SessionId>,
    ) -> Result<DropAction, DropRejection> {
        let source_conference = sessions
            .get(&source)
            .ok_or(DropRejection::UnknownSession)?
            .conference;
        let target_conference = match target {
            Some(target_id) => {
                sessions
                    .get(&target_id)
                    .ok_or(DropRejection::UnknownSession)?
                    .conference
            }
            None => None,
        };

        if target == Some(source) {
            return Err(DropRejection::SameSession);
        }
        if source_conference.is_some() && source_conference == target_conference {
            return Err(DropRejection::SameConference);
        }

        match (source_conference, target) {
            (None, None) => Err(DropRejection::NoTargetForStandalone),
            (None, Some(target_id)) => Ok(match target_conference {
                None => DropAction::Merge {
                    source,
                    target: target_id,
                },
                Some(conference_id) => DropAction::Join {
                    source,
                    conference_id,
                },
            }),
            (Some(conference_id), _) => {
                if target_conference.is_some() {
                    return Err(DropRejection::CrossConference);
                }
                let conference = conferences
                    .get(&conference_id)
                    .ok_or(DropRejection::UnknownSession)?;
                if conference.len() == 2 {
                    let sibling = conference
                        .siblings_of(source)
                        .first()
                        .copied()
                        .ok_or(DropRejection::UnknownSession)?;
                    Ok(DropAction::Dissolve {
                        source,
                        sibling,
                        conference_id,
                    })
                } else {
                    Ok(DropAction::Detach {
                        source,
                        conference_id,
                    })
                }
            }
        }
    }
}

impl SessionModel {
    /// Session being dragged, if any
    pub fn dragged_session(&self) -> Option<SessionId> {
        self.drag.dragged()
    }

    /// Check if the drop indicator should be shown on `session_id`
    pub fn drop_indicator(&self, session_id: SessionId) -> bool {
        self.drag.indicators().contains(&session_id)
    }

    /// Transition a drop of `source` onto `target` would trigger
    pub fn classify_drop(&self, source: SessionId, target: Option<SessionId>) -> Result<DropAction, DropRejection> {
        DragDropController::classify(&self.sessions, &self.conferences, source, target)
    }

    /// Start dragging `session_id`
    pub fn begin_drag(&mut self, session_id: SessionId) -> SessionListResult<()> {
        self.ensure_known(session_id)?;
        if let Some(previous) = self.drag.dragged() {
            warn!(previous = %previous, session_id = %session_id, "Drag started while another was in progress");
        }
        debug!(session_id = %session_id, "Drag started");
        if self.drag.start(session_id) {
            self.queue_indicators();
        }
        self.commit();
        Ok(())
    }

    /// The pointer moved over row `target_index` (or past the last row)
    ///
    /// Only the drop indicators change. If the dragged session is standalone
    /// and the drop would be accepted, the indicator is lit on the target, or
    /// on every member of the target's conference.
    pub fn drag_over(&mut self, target_index: Option<usize>) -> SessionListResult<DragFeedback> {
        let source = self
            .drag
            .dragged()
            .ok_or(SessionListError::invalid_drop(DropRejection::NoDragInProgress))?;
        let target = target_index.and_then(|index| self.list.get(index));
        let action = self.classify_drop(source, target);

        let source_is_standalone = self
            .sessions
            .get(&source)
            .map(|session| session.is_standalone())
            .unwrap_or(false);
        let indicators = match (&action, target) {
            (Ok(_), Some(target_id)) if source_is_standalone => {
                group_members(&self.sessions, &self.conferences, target_id)
            }
            _ => Vec::new(),
        };

        if self.drag.set_indicators(indicators.clone()) {
            self.queue_indicators();
        }
        self.commit();

        Ok(DragFeedback {
            accepted: action.is_ok(),
            rejection: action.err(),
            indicators,
        })
    }

    /// The pointer left the list; the gesture continues
    pub fn drag_leave(&mut self) {
        if self.drag.clear_indicators() {
            self.queue_indicators();
        }
        self.commit();
    }

    /// The gesture was aborted; the list is left untouched
    pub fn cancel_drag(&mut self) {
        if let Some(source) = self.drag.dragged() {
            debug!(session_id = %source, "Drag cancelled");
        }
        if self.drag.reset() {
            self.queue_indicators();
        }
        self.commit();
    }

    /// The dragged session was released over row `target_index`
    ///
    /// `None`, or an index past the last row, means the drop happened below
    /// the list. The gesture ends whether or not the drop is accepted.
    pub fn drop_at(&mut self, target_index: Option<usize>) -> SessionListResult<DropOutcome> {
        let source = self.drag.dragged();
        if self.drag.reset() {
            self.queue_indicators();
        }
        let result = match source {
            Some(source) => {
                let target = target_index.and_then(|index| self.list.get(index));
                self.apply_drop(source, target)
            }
            None => Err(SessionListError::invalid_drop(DropRejection::NoDragInProgress)),
        };
        self.commit();
        result
    }

    /// Resolve a drop of `source` onto `target` directly, without a gesture
    pub fn drop_session(&mut self, source: SessionId, target: Option<SessionId>) -> SessionListResult<DropOutcome> {
        let result = self.apply_drop(source, target);
        self.commit();
        result
    }

    fn apply_drop(&mut self, source: SessionId, target: Option<SessionId>) -> SessionListResult<DropOutcome> {
        let action = match self.classify_drop(source, target) {
            Ok(action) => action,
            Err(reason) => {
                debug!(source = %source, target = ?target, %reason, "Drop rejected");
                return Err(SessionListError::invalid_drop(reason));
            }
        };

        let outcome = match action {
            DropAction::Merge { source, target } => self.merge_standalone(source, target)?,
            DropAction::Join {
                source,
                conference_id,
            } => self.join_conference(source, conference_id)?,
            DropAction::Dissolve {
                source,
                sibling,
                conference_id,
            } => self.dissolve_conference(source, sibling, conference_id)?,
            DropAction::Detach {
                source,
                conference_id,
            } => self.detach_from_conference(source, conference_id)?,
        };
        info!(?outcome, "Drop applied");
        Ok(outcome)
    }

    /// Both sessions are standalone: pull them together at the lower of their
    /// rows and make them a conference
    fn merge_standalone(&mut self, source: SessionId, target: SessionId) -> SessionListResult<DropOutcome> {
        let source_row = self
            .list
            .index_of(source)
            .ok_or(SessionListError::session_not_found(source))?;
        let target_row = self
            .list
            .index_of(target)
            .ok_or(SessionListError::session_not_found(target))?;
        let (first, last) = if source_row < target_row {
            (source, target)
        } else {
            (target, source)
        };
        let position = source_row.min(target_row);
        let was_selected = self.selection.is_selected(source) || self.selection.is_selected(target);
        let before = self.selection.snapshot();

        self.list.remove(source)?;
        self.list.remove(target)?;
        self.list.insert_block(position, &[first, last])?;
        self.flush_list_changes();

        let mut conference = Conference::new();
        let conference_id = conference.id();
        let mut role_changes = Vec::new();
        for member in [first, last] {
            let session = self
                .sessions
                .get_mut(&member)
                .ok_or(SessionListError::session_not_found(member))?;
            role_changes.extend(conference.add_member(session));
        }
        self.conferences.insert(conference_id, conference);
        self.queue(SessionListEvent::ConferenceCreated {
            conference_id,
            members: vec![first, last],
        });
        self.queue_role_changes(role_changes);

        if was_selected {
            let (sessions, conferences) = (&self.sessions, &self.conferences);
            self.selection
                .select(first, |id| group_members(sessions, conferences, id));
        }
        self.queue_selection_if_changed(&before);

        Ok(DropOutcome::Merged {
            conference_id,
            members: [first, last],
        })
    }

    /// A standalone session joins the target's conference below its last member
    fn join_conference(&mut self, source: SessionId, conference_id: ConferenceId) -> SessionListResult<DropOutcome> {
        let bottom = self
            .conferences
            .get(&conference_id)
            .and_then(|conference| conference.last())
            .ok_or(SessionListError::ConferenceNotFound { conference_id })?;
        let conference_selected = self.selection.is_selected(bottom);
        let was_selected = self.selection.is_selected(source) || conference_selected;
        let before = self.selection.snapshot();

        self.list.remove(source)?;
        let position = self
            .list
            .index_of(bottom)
            .ok_or(SessionListError::session_not_found(bottom))?
            + 1;
        self.list.move_into(source, position)?;
        self.flush_list_changes();

        let conference = self
            .conferences
            .get_mut(&conference_id)
            .ok_or(SessionListError::ConferenceNotFound { conference_id })?;
        let session = self
            .sessions
            .get_mut(&source)
            .ok_or(SessionListError::session_not_found(source))?;
        let role_changes = conference.add_member(session);
        self.queue_role_changes(role_changes);

        if was_selected {
            let (sessions, conferences) = (&self.sessions, &self.conferences);
            self.selection
                .select(source, |id| group_members(sessions, conferences, id));
        }
        self.queue_selection_if_changed(&before);

        Ok(DropOutcome::Joined {
            session_id: source,
            conference_id,
            position,
        })
    }

    /// The source leaves a two-member conference: both members become
    /// standalone in the rows they already occupy
    ///
    /// If the conference was selected only the source is deselected, so the
    /// sibling stays selected along with any other selected rows.
    fn dissolve_conference(
        &mut self,
        source: SessionId,
        sibling: SessionId,
        conference_id: ConferenceId,
    ) -> SessionListResult<DropOutcome> {
        let conference = self
            .conferences
            .get(&conference_id)
            .ok_or(SessionListError::ConferenceNotFound { conference_id })?;
        let &[first, second] = conference.members() else {
            return Err(SessionListError::invariant_violation(format!(
                "conference {} does not have exactly two members",
                conference_id
            )));
        };
        let members = [first, second];
        let rows = self.list.block_of(conference).ok_or_else(|| {
            SessionListError::invariant_violation(format!(
                "members of conference {} are not contiguous",
                conference_id
            ))
        })?;
        debug!(
            conference_id = %conference_id,
            source = %source,
            sibling = %sibling,
            "Dissolving conference"
        );
        let conference_selected = self.selection.is_selected(source);
        let before = self.selection.snapshot();

        // Re-present both rows as standalone sessions in place
        let start = rows.start;
        let removed = self.list.remove_block(rows)?;
        self.list.insert_block(start, &removed)?;
        self.flush_list_changes();

        self.leave_conference(source, conference_id)?;

        // A selected conference leaves its selection to the sibling
        if conference_selected {
            self.selection.forget(source);
        }
        self.queue_selection_if_changed(&before);

        Ok(DropOutcome::Dissolved {
            conference_id,
            members,
        })
    }

    /// The source leaves a conference of three or more and is placed right
    /// below what remains of it
    fn detach_from_conference(
        &mut self,
        source: SessionId,
        conference_id: ConferenceId,
    ) -> SessionListResult<DropOutcome> {
        let remaining = self
            .conferences
            .get(&conference_id)
            .map(|conference| conference.siblings_of(source))
            .ok_or(SessionListError::ConferenceNotFound { conference_id })?;
        let before = self.selection.snapshot();

        // Hand the selection to the rest of the conference first
        if self.selection.is_selected(source) {
            self.selection.forget(source);
        }

        self.list.remove(source)?;
        let bottom = remaining
            .last()
            .copied()
            .ok_or(SessionListError::ConferenceNotFound { conference_id })?;
        let position = self
            .list
            .index_of(bottom)
            .ok_or(SessionListError::session_not_found(bottom))?
            + 1;
        self.list.move_into(source, position)?;
        self.flush_list_changes();

        self.leave_conference(source, conference_id)?;
        self.queue_selection_if_changed(&before);

        Ok(DropOutcome::Detached {
            session_id: source,
            conference_id,
            position,
        })
    }

    fn queue_indicators(&mut self) {
        let sessions = self.drag.indicators().to_vec();
        self.queue(SessionListEvent::DropIndicatorsChanged { sessions });
    }
}
