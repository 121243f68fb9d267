//! Error types for the receiver and sender adapters.

use crate::transport::TransportError;
use bytes::Bytes;
use std::fmt;
use thiserror::Error;

/// Result type alias for adapter operations
pub type EventHubResult<T> = Result<T, EventHubError>;

/// Which side of the link an error refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkKind {
    Receiver,
    Sender,
}

impl LinkKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LinkKind::Receiver => "receiver",
            LinkKind::Sender => "sender",
        }
    }
}

impl fmt::Display for LinkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors surfaced by the adapters.
///
/// The first five variants cover every transport interaction; the rest come from
/// configuration and payload handling.
#[derive(Debug, Error)]
pub enum EventHubError {
    /// The link could not be opened (bad address, epoch conflict, ...)
    #[error("failed to attach {kind} link to '{address}': {source}")]
    AttachFailed {
        kind: LinkKind,
        address: String,
        #[source]
        source: TransportError,
    },

    /// The adapter was closed, explicitly or after a fatal link error
    #[error("{0} was closed")]
    AlreadyClosed(LinkKind),

    /// The service detached the sender link
    #[error("sender has been closed: {0}")]
    LinkDetached(String),

    /// No credit was granted in time to send
    #[error("timed out while waiting to get credit to send")]
    SendTimeout,

    /// Any other failure reported by the transport
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Payload could not be interpreted as requested
    #[error("Invalid data: {message}")]
    InvalidData { message: String, payload: Bytes },

    /// Payload could not be serialized
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl EventHubError {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        EventHubError::Config(msg.into())
    }

    pub(crate) fn attach(kind: LinkKind, address: impl Into<String>, source: TransportError) -> Self {
        EventHubError::AttachFailed {
            kind,
            address: address.into(),
            source,
        }
    }

    /// Whether retrying the same operation may succeed.
    ///
    /// The adapters never retry on their own; this lets callers decide.
    pub fn is_retryable(&self) -> bool {
        match self {
            EventHubError::SendTimeout => true,
            EventHubError::Transport(e) => e.is_retryable(),
            _ => false,
        }
    }

    /// Whether the adapter that produced this error is no longer usable
    pub fn is_closed(&self) -> bool {
        matches!(
            self,
            EventHubError::AlreadyClosed(_) | EventHubError::LinkDetached(_)
        )
    }

    pub fn is_invalid_data(&self) -> bool {
        matches!(self, EventHubError::InvalidData { .. })
    }

    /// Short label used for metrics
    pub(crate) fn kind(&self) -> &'static str {
        match self {
            EventHubError::AttachFailed { .. } => "attach_failed",
            EventHubError::AlreadyClosed(_) => "already_closed",
            EventHubError::LinkDetached(_) => "link_detached",
            EventHubError::SendTimeout => "send_timeout",
            EventHubError::Transport(_) => "transport",
            EventHubError::Config(_) => "config",
            EventHubError::InvalidData { .. } => "invalid_data",
            EventHubError::Serialization(_) => "serialization",
        }
    }
}

impl From<serde_json::Error> for EventHubError {
    fn from(err: serde_json::Error) -> Self {
        EventHubError::Serialization(err.to_string())
    }
}
