//! # Session-List: Call Session Grouping Model
//!
//! The model behind a softphone's call list. It keeps an ordered list of call
//! sessions, lets the user tie sessions together into ad-hoc conferences by
//! dragging one row onto another, and keeps the selection and the drop
//! indicators consistent while doing so. Rendering is left to the view: the
//! model computes each row's [`ConferenceRole`] and publishes
//! [`SessionListEvent`]s describing every change.
//!
//! ## Guarantees
//!
//! - The members of a conference always occupy one contiguous run of rows, in
//!   member order
//! - A conference always has at least two members; the first is Top, the last
//!   is Bottom, the rest are Middle
//! - A conference is selected as a whole or not at all
//! - A rejected or cancelled drop leaves the model untouched
//! - Each operation publishes its events only after it has completed
//!
//! ## Usage
//!
//! ```rust
//! use rvoip_session_list::{ConferenceRole, DropOutcome, Session, SessionModel};
//!
//! let mut model = SessionModel::with_defaults();
//! let alice = model.add_session(Session::new("Alice", "sip:alice@example.com", vec![]))?;
//! let bob = model.add_session(Session::new("Bob", "sip:bob@example.com", vec![]))?;
//! let carol = model.add_session(Session::new("Carol", "sip:carol@example.com", vec![]))?;
//!
//! // Drag Bob onto Carol
//! model.begin_drag(bob)?;
//! let outcome = model.drop_at(Some(2))?;
//! assert!(matches!(outcome, DropOutcome::Merged { .. }));
//! assert_eq!(model.order(), &[alice, bob, carol]);
//! assert_eq!(model.role_of(bob), ConferenceRole::Top);
//! assert_eq!(model.role_of(carol), ConferenceRole::Bottom);
//!
//! // Drag Bob back out onto Alice: the two-member conference dissolves
//! model.begin_drag(bob)?;
//! model.drop_at(Some(0))?;
//! assert_eq!(model.conference_count(), 0);
//! assert_eq!(model.order(), &[alice, bob, carol]);
//! # Ok::<(), rvoip_session_list::SessionListError>(())
//! ```

pub mod conference;
pub mod config;
pub mod drag_drop;
pub mod error;
pub mod events;
pub mod list;
pub mod model;
pub mod selection;
pub mod session;

pub use conference::{Conference, ConferenceId, ConferenceRole, MemberRemoval, RoleChange};
pub use config::SessionListConfig;
pub use drag_drop::{DragDropController, DragFeedback, DropAction, DropOutcome};
pub use error::{DropRejection, SessionListError, SessionListResult};
pub use events::{SessionListEvent, SessionListEventHandler};
pub use list::{ListChange, SessionList};
pub use model::SessionModel;
pub use selection::SelectionTracker;
pub use session::{MediaKind, Session, SessionId, SessionInfo, StreamDescriptor};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
