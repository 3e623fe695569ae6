//! End-to-end drag-and-drop scenarios: list order, conference roles,
//! selection and the exact notification sequence each transition publishes

use std::sync::{Arc, Mutex};

use rvoip_session_list::{
    ConferenceId, ConferenceRole, DropOutcome, DropRejection, Session, SessionId,
    SessionListConfig, SessionListEvent, SessionListResult, SessionModel,
};

/// Model with one standalone session per name and a handler recording events
struct Fixture {
    model: SessionModel,
    ids: Vec<SessionId>,
    events: Arc<Mutex<Vec<SessionListEvent>>>,
}

impl Fixture {
    fn new(names: &[&str]) -> Self {
        let config = SessionListConfig::new().with_invariant_checks(true);
        let mut model = SessionModel::new(config).unwrap();
        let ids = names
            .iter()
            .map(|name| {
                let uri = format!("sip:{}@sip2sip.info", name.to_lowercase());
                model.add_session(Session::new(*name, uri, vec![])).unwrap()
            })
            .collect();

        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();
        model.add_event_handler(
            "recorder",
            Arc::new(move |event: &SessionListEvent, _: &SessionModel| {
                sink.lock().unwrap().push(event.clone());
            }),
        );
        Self { model, ids, events }
    }

    fn take_events(&self) -> Vec<SessionListEvent> {
        std::mem::take(&mut *self.events.lock().unwrap())
    }

    fn drag(&mut self, source: usize, target_row: Option<usize>) -> SessionListResult<DropOutcome> {
        self.model.begin_drag(self.ids[source])?;
        self.model.drop_at(target_row)
    }
}

fn conference_of(model: &SessionModel, id: SessionId) -> ConferenceId {
    model.conference_of(id).unwrap().id()
}

#[test]
fn test_merge_then_dissolve_keeps_positions() {
    let mut fx = Fixture::new(&["A", "B", "C"]);
    let (a, b, c) = (fx.ids[0], fx.ids[1], fx.ids[2]);

    // Drop B onto C
    let outcome = fx.drag(1, Some(2)).unwrap();
    let conference_id = conference_of(&fx.model, b);
    assert_eq!(
        outcome,
        DropOutcome::Merged {
            conference_id,
            members: [b, c]
        }
    );
    assert_eq!(fx.model.order(), &[a, b, c]);
    assert_eq!(fx.model.role_of(a), ConferenceRole::Standalone);
    assert_eq!(fx.model.role_of(b), ConferenceRole::Top);
    assert_eq!(fx.model.role_of(c), ConferenceRole::Bottom);
    assert_eq!(
        fx.take_events(),
        vec![
            SessionListEvent::SessionsRemoved { start: 1, count: 1 },
            SessionListEvent::SessionsRemoved { start: 1, count: 1 },
            SessionListEvent::SessionsInserted { start: 1, count: 2 },
            SessionListEvent::ConferenceCreated {
                conference_id,
                members: vec![b, c]
            },
            SessionListEvent::SessionRoleChanged {
                session_id: b,
                role: ConferenceRole::Top
            },
            SessionListEvent::SessionRoleChanged {
                session_id: c,
                role: ConferenceRole::Bottom
            },
        ]
    );

    // Drag B onto A: the two-member conference dissolves in place
    let outcome = fx.drag(1, Some(0)).unwrap();
    assert_eq!(
        outcome,
        DropOutcome::Dissolved {
            conference_id,
            members: [b, c]
        }
    );
    assert_eq!(fx.model.order(), &[a, b, c]);
    assert_eq!(fx.model.conference_count(), 0);
    assert!(fx.model.roles().iter().all(|(_, role)| *role == ConferenceRole::Standalone));
    assert_eq!(
        fx.take_events(),
        vec![
            SessionListEvent::SessionsRemoved { start: 1, count: 2 },
            SessionListEvent::SessionsInserted { start: 1, count: 2 },
            SessionListEvent::SessionRoleChanged {
                session_id: c,
                role: ConferenceRole::Standalone
            },
            SessionListEvent::SessionRoleChanged {
                session_id: b,
                role: ConferenceRole::Standalone
            },
            SessionListEvent::ConferenceDissolved { conference_id },
        ]
    );
    assert!(fx.model.check_invariants().is_ok());
}

#[test]
fn test_merge_uses_lower_row() {
    let mut fx = Fixture::new(&["A", "B", "C", "D"]);
    let (a, b, c, d) = (fx.ids[0], fx.ids[1], fx.ids[2], fx.ids[3]);

    // Drag D upwards onto B: the pair lands at B's row, B first
    fx.drag(3, Some(1)).unwrap();
    assert_eq!(fx.model.order(), &[a, b, d, c]);
    assert_eq!(fx.model.role_of(b), ConferenceRole::Top);
    assert_eq!(fx.model.role_of(d), ConferenceRole::Bottom);
    assert_eq!(fx.model.conference_of(d).unwrap().members(), &[b, d]);
}

#[test]
fn test_join_appends_below_bottom() {
    let mut fx = Fixture::new(&["A", "B", "C", "D"]);
    let (a, b, c, d) = (fx.ids[0], fx.ids[1], fx.ids[2], fx.ids[3]);
    fx.drag(1, Some(2)).unwrap();
    fx.take_events();
    let conference_id = conference_of(&fx.model, b);

    // D dropped on the Top member still joins at the bottom
    let outcome = fx.drag(3, Some(1)).unwrap();
    assert_eq!(
        outcome,
        DropOutcome::Joined {
            session_id: d,
            conference_id,
            position: 3
        }
    );
    assert_eq!(fx.model.order(), &[a, b, c, d]);
    assert_eq!(
        fx.model.roles(),
        vec![
            (a, ConferenceRole::Standalone),
            (b, ConferenceRole::Top),
            (c, ConferenceRole::Middle),
            (d, ConferenceRole::Bottom),
        ]
    );
    assert_eq!(
        fx.take_events(),
        vec![
            SessionListEvent::SessionsRemoved { start: 3, count: 1 },
            SessionListEvent::SessionsInserted { start: 3, count: 1 },
            SessionListEvent::SessionRoleChanged {
                session_id: c,
                role: ConferenceRole::Middle
            },
            SessionListEvent::SessionRoleChanged {
                session_id: d,
                role: ConferenceRole::Bottom
            },
        ]
    );

    // A joins from above and ends up below D
    fx.drag(0, Some(2)).unwrap();
    assert_eq!(fx.model.order(), &[b, c, d, a]);
    assert_eq!(fx.model.role_of(d), ConferenceRole::Middle);
    assert_eq!(fx.model.role_of(a), ConferenceRole::Bottom);
    assert_eq!(fx.model.conference_count(), 1);
}

#[test]
fn test_detach_from_large_conference() {
    let mut fx = Fixture::new(&["A", "B", "C", "D"]);
    let (a, b, c, d) = (fx.ids[0], fx.ids[1], fx.ids[2], fx.ids[3]);
    fx.drag(0, Some(1)).unwrap();
    fx.drag(2, Some(0)).unwrap();
    assert_eq!(fx.model.conference_of(a).unwrap().members(), &[a, b, c]);
    let conference_id = conference_of(&fx.model, a);

    // Select the conference, then pull its middle member out onto D
    fx.model.selection_changed(&[b], &[]).unwrap();
    assert_eq!(fx.model.selected_sessions(), vec![a, b, c]);
    fx.take_events();

    let outcome = fx.drag(1, Some(3)).unwrap();
    assert_eq!(
        outcome,
        DropOutcome::Detached {
            session_id: b,
            conference_id,
            position: 2
        }
    );
    assert_eq!(fx.model.order(), &[a, c, b, d]);
    assert_eq!(fx.model.role_of(a), ConferenceRole::Top);
    assert_eq!(fx.model.role_of(c), ConferenceRole::Bottom);
    assert_eq!(fx.model.role_of(b), ConferenceRole::Standalone);
    assert_eq!(fx.model.selected_sessions(), vec![a, c]);
    assert_eq!(
        fx.take_events(),
        vec![
            SessionListEvent::SessionsRemoved { start: 1, count: 1 },
            SessionListEvent::SessionsInserted { start: 2, count: 1 },
            SessionListEvent::SessionRoleChanged {
                session_id: b,
                role: ConferenceRole::Standalone
            },
            SessionListEvent::SelectionShouldChangeTo { sessions: vec![a, c] },
        ]
    );
}

#[test]
fn test_detach_past_end_lands_below_block() {
    let mut fx = Fixture::new(&["A", "B", "C", "D"]);
    let (a, b, c, d) = (fx.ids[0], fx.ids[1], fx.ids[2], fx.ids[3]);
    fx.drag(0, Some(1)).unwrap();
    fx.drag(2, Some(0)).unwrap();

    // Dropped below the list, A still lands right under what is left
    fx.drag(0, None).unwrap();
    assert_eq!(fx.model.order(), &[b, c, a, d]);
    assert_eq!(fx.model.role_of(b), ConferenceRole::Top);
    assert_eq!(fx.model.role_of(c), ConferenceRole::Bottom);
    assert_eq!(fx.model.role_of(a), ConferenceRole::Standalone);
}

#[test]
fn test_cross_conference_drop_is_rejected() {
    let mut fx = Fixture::new(&["A", "B", "C", "D"]);
    fx.drag(0, Some(1)).unwrap();
    fx.drag(2, Some(3)).unwrap();
    let order = fx.model.order().to_vec();
    let roles = fx.model.roles();
    fx.take_events();

    // D onto B
    let err = fx.drag(3, Some(1)).unwrap_err();
    assert_eq!(err.drop_rejection(), Some(DropRejection::CrossConference));
    assert_eq!(fx.model.order(), order.as_slice());
    assert_eq!(fx.model.roles(), roles);
    assert_eq!(fx.model.conference_count(), 2);
    assert!(fx.take_events().is_empty());
}

#[test]
fn test_self_drop_is_noop() {
    let mut fx = Fixture::new(&["A", "B"]);
    let order = fx.model.order().to_vec();

    let err = fx.drag(0, Some(0)).unwrap_err();
    assert_eq!(err.drop_rejection(), Some(DropRejection::SameSession));
    assert_eq!(fx.model.order(), order.as_slice());
    assert_eq!(fx.model.conference_count(), 0);
    assert!(fx.take_events().is_empty());

    // Standalone dropped below the list has nowhere to go
    let err = fx.drag(1, None).unwrap_err();
    assert_eq!(err.drop_rejection(), Some(DropRejection::NoTargetForStandalone));
    assert_eq!(fx.model.order(), order.as_slice());
}

#[test]
fn test_drop_within_same_conference_is_rejected() {
    let mut fx = Fixture::new(&["A", "B", "C"]);
    fx.drag(0, Some(1)).unwrap();
    fx.drag(2, Some(0)).unwrap();
    let order = fx.model.order().to_vec();

    let err = fx.drag(2, Some(0)).unwrap_err();
    assert_eq!(err.drop_rejection(), Some(DropRejection::SameConference));
    assert_eq!(fx.model.order(), order.as_slice());
    assert_eq!(fx.model.conference_of(fx.ids[0]).unwrap().len(), 3);
}

#[test]
fn test_cancelled_drag_leaves_model_untouched() {
    let mut fx = Fixture::new(&["A", "B", "C"]);
    let order = fx.model.order().to_vec();

    fx.model.begin_drag(fx.ids[0]).unwrap();
    let feedback = fx.model.drag_over(Some(2)).unwrap();
    assert!(feedback.accepted);
    assert_eq!(feedback.indicators, vec![fx.ids[2]]);
    fx.model.cancel_drag();

    assert_eq!(fx.model.order(), order.as_slice());
    assert_eq!(fx.model.conference_count(), 0);
    assert_eq!(
        fx.take_events(),
        vec![
            SessionListEvent::DropIndicatorsChanged {
                sessions: vec![fx.ids[2]]
            },
            SessionListEvent::DropIndicatorsChanged { sessions: vec![] },
        ]
    );
}

#[test]
fn test_merge_round_trip_restores_standalone() {
    let mut fx = Fixture::new(&["A", "B"]);
    let (a, b) = (fx.ids[0], fx.ids[1]);

    fx.model.drop_session(a, Some(b)).unwrap();
    assert_eq!(fx.model.conference_count(), 1);
    fx.model.drop_session(a, None).unwrap();

    assert_eq!(fx.model.conference_count(), 0);
    assert_eq!(fx.model.order(), &[a, b]);
    assert!(fx.model.session(a).unwrap().is_standalone());
    assert!(fx.model.session(b).unwrap().is_standalone());
}

#[test]
fn test_selection_follows_transitions() {
    let mut fx = Fixture::new(&["A", "B", "C"]);
    let (a, b, c) = (fx.ids[0], fx.ids[1], fx.ids[2]);

    // Merge: C was selected, so the whole new conference is
    fx.model.selection_changed(&[c], &[]).unwrap();
    fx.take_events();
    fx.drag(1, Some(2)).unwrap();
    assert_eq!(fx.model.selected_sessions(), vec![b, c]);
    assert_eq!(
        fx.take_events().last(),
        Some(&SessionListEvent::SelectionShouldChangeTo { sessions: vec![b, c] })
    );

    // Dissolve: the selection moves to the sibling left behind
    fx.drag(1, Some(0)).unwrap();
    assert_eq!(fx.model.selected_sessions(), vec![c]);

    // Merge again, then join: dropping onto a selected conference selects
    // the newcomer too
    fx.drag(1, Some(2)).unwrap();
    assert_eq!(fx.model.selected_sessions(), vec![b, c]);
    fx.drag(0, Some(1)).unwrap();
    assert_eq!(fx.model.order(), &[b, c, a]);
    assert_eq!(fx.model.selected_sessions(), vec![b, c, a]);

    // Unselected sources stay unselected when leaving
    fx.model.clear_selection();
    fx.drag(1, None).unwrap();
    assert!(fx.model.selected_sessions().is_empty());
}

#[test]
fn test_merge_with_selected_source_selects_conference() {
    let mut fx = Fixture::new(&["A", "B", "C"]);
    let (a, b, c) = (fx.ids[0], fx.ids[1], fx.ids[2]);
    fx.model.selection_changed(&[a], &[]).unwrap();
    fx.take_events();

    // A dragged down onto C: the pair lands at A's row
    fx.drag(0, Some(2)).unwrap();
    let conference_id = conference_of(&fx.model, a);
    assert_eq!(fx.model.order(), &[a, c, b]);
    assert_eq!(fx.model.selected_sessions(), vec![a, c]);
    assert_eq!(
        fx.take_events(),
        vec![
            SessionListEvent::SessionsRemoved { start: 0, count: 1 },
            SessionListEvent::SessionsRemoved { start: 1, count: 1 },
            SessionListEvent::SessionsInserted { start: 0, count: 2 },
            SessionListEvent::ConferenceCreated {
                conference_id,
                members: vec![a, c]
            },
            SessionListEvent::SessionRoleChanged {
                session_id: a,
                role: ConferenceRole::Top
            },
            SessionListEvent::SessionRoleChanged {
                session_id: c,
                role: ConferenceRole::Bottom
            },
            SessionListEvent::SelectionShouldChangeTo { sessions: vec![a, c] },
        ]
    );
}

#[test]
fn test_join_with_selected_source_selects_conference() {
    let mut fx = Fixture::new(&["A", "B", "C", "D"]);
    let (a, b, c, d) = (fx.ids[0], fx.ids[1], fx.ids[2], fx.ids[3]);
    fx.drag(1, Some(2)).unwrap();
    fx.model.selection_changed(&[d], &[]).unwrap();
    fx.take_events();

    fx.drag(3, Some(1)).unwrap();
    assert_eq!(fx.model.order(), &[a, b, c, d]);
    assert!(!fx.model.is_selected(a));
    assert_eq!(fx.model.selected_sessions(), vec![b, c, d]);
    assert_eq!(
        fx.take_events(),
        vec![
            SessionListEvent::SessionsRemoved { start: 3, count: 1 },
            SessionListEvent::SessionsInserted { start: 3, count: 1 },
            SessionListEvent::SessionRoleChanged {
                session_id: c,
                role: ConferenceRole::Middle
            },
            SessionListEvent::SessionRoleChanged {
                session_id: d,
                role: ConferenceRole::Bottom
            },
            SessionListEvent::SelectionShouldChangeTo {
                sessions: vec![b, c, d]
            },
        ]
    );
}

#[test]
fn test_dissolve_keeps_other_selected_rows() {
    let mut fx = Fixture::new(&["A", "B", "C"]);
    let (a, b, c) = (fx.ids[0], fx.ids[1], fx.ids[2]);
    fx.drag(1, Some(2)).unwrap();
    fx.model.selection_changed(&[a, b], &[]).unwrap();
    assert_eq!(fx.model.selected_sessions(), vec![a, b, c]);
    fx.take_events();

    fx.drag(1, Some(0)).unwrap();
    assert_eq!(fx.model.selected_sessions(), vec![a, c]);
    assert_eq!(
        fx.take_events().last(),
        Some(&SessionListEvent::SelectionShouldChangeTo { sessions: vec![a, c] })
    );
}

#[test]
fn test_selection_with_unknown_session_changes_nothing() {
    let mut fx = Fixture::new(&["A", "B"]);
    let (a, b) = (fx.ids[0], fx.ids[1]);
    fx.model.selection_changed(&[b], &[]).unwrap();
    fx.take_events();

    let stranger = SessionId::new();
    let err = fx.model.selection_changed(&[a, stranger], &[]).unwrap_err();
    assert!(err.is_lookup_error());
    let err = fx.model.selection_changed(&[], &[b, stranger]).unwrap_err();
    assert!(err.is_lookup_error());

    assert_eq!(fx.model.selected_sessions(), vec![b]);
    assert!(fx.take_events().is_empty());
}

#[test]
fn test_remove_member_dissolves_small_conference() {
    let mut fx = Fixture::new(&["A", "B", "C"]);
    let (a, b, c) = (fx.ids[0], fx.ids[1], fx.ids[2]);
    fx.drag(0, Some(1)).unwrap();
    fx.model.selection_changed(&[a], &[]).unwrap();
    let conference_id = conference_of(&fx.model, a);
    fx.take_events();

    let removed = fx.model.remove_session(a).unwrap();
    assert_eq!(removed.id(), a);
    assert!(removed.is_standalone());
    assert_eq!(fx.model.order(), &[b, c]);
    assert_eq!(fx.model.conference_count(), 0);
    assert_eq!(fx.model.selected_sessions(), vec![b]);
    assert_eq!(
        fx.take_events(),
        vec![
            SessionListEvent::SessionRoleChanged {
                session_id: b,
                role: ConferenceRole::Standalone
            },
            SessionListEvent::SessionRoleChanged {
                session_id: a,
                role: ConferenceRole::Standalone
            },
            SessionListEvent::ConferenceDissolved { conference_id },
            SessionListEvent::SessionsRemoved { start: 0, count: 1 },
            SessionListEvent::SessionRemoved { session_id: a },
            SessionListEvent::SelectionShouldChangeTo { sessions: vec![b] },
        ]
    );
}
