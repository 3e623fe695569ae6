//! Session records shown in the session list
//!
//! A [`Session`] is the list-side record of one call leg. It carries the
//! display attributes the view renders (name, address, codec, security flags,
//! link quality) and the id of the conference it belongs to, if any.
//!
//! Display attributes are owned by the call-control layer, which updates them
//! through [`SessionModel::update_session`](crate::SessionModel::update_session).
//! The conference reference is only ever changed by the grouping logic in this
//! crate, so it is not publicly writable.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::conference::ConferenceId;

/// Stable identity of a session in the list
///
/// Sessions are compared by id, never by value: two calls to the same
/// address with identical attributes are still two distinct sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SessionId(pub Uuid);

impl SessionId {
    /// Generate a new random session id
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Kind of media carried by a stream of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MediaKind {
    Audio,
    Video,
    Chat,
    DesktopSharing,
}

/// One negotiated (or proposed) stream of a session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamDescriptor {
    /// Media kind of the stream
    pub kind: MediaKind,
    /// Codec label, when the call-control layer knows it
    pub codec: Option<String>,
}

impl StreamDescriptor {
    pub fn new(kind: MediaKind) -> Self {
        Self { kind, codec: None }
    }

    pub fn audio() -> Self {
        Self::new(MediaKind::Audio)
    }

    pub fn video() -> Self {
        Self::new(MediaKind::Video)
    }

    pub fn with_codec(mut self, codec: impl Into<String>) -> Self {
        self.codec = Some(codec.into());
        self
    }
}

/// Display attributes of a session
///
/// The model stores these values for the view and never interprets them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionInfo {
    /// Display name of the remote party
    pub name: String,
    /// Remote party address (SIP URI)
    pub uri: String,
    /// Streams of the call
    pub streams: Vec<StreamDescriptor>,
    /// Free-form call type label, e.g. "HD Audio" or "Video"
    pub call_type: Option<String>,
    /// Codec summary, e.g. "speex 32kHz"
    pub codec_info: String,
    /// Signalling is protected by TLS
    pub tls: bool,
    /// Media is protected by SRTP
    pub srtp: bool,
    /// Round trip latency in milliseconds
    pub latency_ms: u32,
    /// Packet loss in percent (0-100)
    pub packet_loss_percent: u8,
}

impl SessionInfo {
    pub fn new(name: impl Into<String>, uri: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            uri: uri.into(),
            ..Default::default()
        }
    }

    /// Check if any stream of the given kind is present
    pub fn has_media(&self, kind: MediaKind) -> bool {
        self.streams.iter().any(|stream| stream.kind == kind)
    }

    /// Check if both signalling and media are encrypted
    pub fn is_secure(&self) -> bool {
        self.tls && self.srtp
    }
}

/// A call leg presented in the session list
#[derive(Debug, Clone)]
pub struct Session {
    id: SessionId,
    info: SessionInfo,
    created_at: DateTime<Utc>,
    pub(crate) conference: Option<ConferenceId>,
}

impl Session {
    /// Create a standalone session with a fresh id
    pub fn new(name: impl Into<String>, uri: impl Into<String>, streams: Vec<StreamDescriptor>) -> Self {
        let mut info = SessionInfo::new(name, uri);
        info.streams = streams;
        Self::from_info(info)
    }

    /// Create a standalone session from a full set of display attributes
    pub fn from_info(info: SessionInfo) -> Self {
        Self {
            id: SessionId::new(),
            info,
            created_at: Utc::now(),
            conference: None,
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn info(&self) -> &SessionInfo {
        &self.info
    }

    pub(crate) fn info_mut(&mut self) -> &mut SessionInfo {
        &mut self.info
    }

    pub fn name(&self) -> &str {
        &self.info.name
    }

    pub fn uri(&self) -> &str {
        &self.info.uri
    }

    /// When the session was presented to the list
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Conference this session belongs to, if any
    pub fn conference(&self) -> Option<ConferenceId> {
        self.conference
    }

    pub fn is_standalone(&self) -> bool {
        self.conference.is_none()
    }
}
