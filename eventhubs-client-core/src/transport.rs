//! The AMQP transport the adapters sit on.
//!
//! Connection and session lifecycle, framing and flow-control accounting belong to the
//! transport library. The adapters only need the handful of link primitives below.

use crate::filter::FilterSet;
use crate::message::{AmqpMessage, AmqpValue};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Properties sent in the attach frame of a link
pub type LinkProperties = BTreeMap<String, AmqpValue>;

/// Settlement mode requested for a receiver link
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcknowledgeMode {
    /// Settled by the sender on transfer
    AtMostOnce,
    /// Settled by the receiver after it accepts or releases the delivery
    AtLeastOnce,
}

/// How the transport treats credit granted with [`ReceiverLink::set_credit`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreditMode {
    /// The transport keeps the window topped up as deliveries are settled
    Window,
    /// Credit is granted once; the caller replenishes it
    Manual,
}

/// Everything a session needs to attach a receiver link.
#[derive(Debug, Clone)]
pub struct ReceiverAttach {
    pub address: String,
    pub link_name: String,
    pub ack_mode: AcknowledgeMode,
    pub exclusive: bool,
    pub filters: FilterSet,
    /// Attach timeout; `None` leaves it to the transport default
    pub timeout: Option<Duration>,
    pub properties: LinkProperties,
}

/// Error condition reported by the remote peer (AMQP `error` type)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteError {
    pub condition: String,
    pub description: Option<String>,
}

impl RemoteError {
    pub fn new(condition: impl Into<String>, description: Option<String>) -> Self {
        Self {
            condition: condition.into(),
            description,
        }
    }
}

impl fmt::Display for RemoteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.description {
            Some(description) => write!(f, "{}: {}", self.condition, description),
            None => f.write_str(&self.condition),
        }
    }
}

/// Failures raised by the transport
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("link detached: {0}")]
    LinkDetached(String),

    #[error("timed out")]
    Timeout,

    #[error("remote error: {0}")]
    Remote(RemoteError),

    #[error("connection error: {0}")]
    Connection(String),

    #[error("error while closing link: {0}")]
    Closing(String),

    #[error(transparent)]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

impl TransportError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, TransportError::Timeout | TransportError::Connection(_))
    }
}

/// A session on an established AMQP connection.
#[async_trait]
pub trait AmqpSession: Send + Sync {
    /// Attach a receiver link and wait for the peer to confirm it.
    async fn create_receiver(
        &self,
        attach: ReceiverAttach,
    ) -> Result<Box<dyn ReceiverLink>, TransportError>;

    /// Attach a sender link to `address` and wait for the peer to confirm it.
    async fn create_sender(&self, address: &str) -> Result<Box<dyn SenderLink>, TransportError>;
}

/// An attached receiver link.
#[async_trait]
pub trait ReceiverLink: Send {
    async fn set_credit(&mut self, credit: u32, mode: CreditMode) -> Result<(), TransportError>;

    /// Wait for the next delivery. `None` waits indefinitely.
    ///
    /// Returns `Ok(None)` when the wait elapses without a delivery.
    async fn receive(
        &mut self,
        timeout: Option<Duration>,
    ) -> Result<Option<AmqpMessage>, TransportError>;

    /// Error the peer attached to this link, if any
    fn link_error(&self) -> Option<RemoteError>;

    /// Settle a delivery as accepted
    async fn accept(&mut self, message: &AmqpMessage) -> Result<(), TransportError>;

    /// Settle a delivery as released, making it eligible for redelivery
    async fn release(&mut self, message: &AmqpMessage) -> Result<(), TransportError>;

    async fn close(&mut self) -> Result<(), TransportError>;
}

/// An attached sender link.
#[async_trait]
pub trait SenderLink: Send + Sync {
    /// Transfer a message, waiting for credit if none is available.
    async fn send(&self, message: AmqpMessage) -> Result<(), TransportError>;

    async fn close(&self) -> Result<(), TransportError>;
}
