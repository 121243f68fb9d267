//! # Event Hubs Client Core
//!
//! Sender and receiver adapters for partitioned, consumer-group based Event Hubs
//! entities spoken to over AMQP 1.0.
//!
//! This library is a thin layer over an AMQP transport. It computes link addresses,
//! builds the selector filters that position a receiver in the stream, attaches the
//! epoch property for exclusive receivers, grants the initial link credit and maps
//! transport failures onto a small set of typed errors. Frame encoding, session
//! multiplexing and flow-control accounting all live in the transport, which plugs in
//! through the [`AmqpSession`], [`ReceiverLink`] and [`SenderLink`] traits.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use eventhubs_client_core::{
//!     AmqpSession, ApplicationProperties, ClientConfig, EventHubReceiver, EventHubResult,
//!     EventHubSender, EventPosition,
//! };
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! async fn pump(session: Arc<dyn AmqpSession>, config: &ClientConfig) -> EventHubResult<()> {
//!     let options = config.receiver_options("0", EventPosition::StartOfStream);
//!     let mut receiver = EventHubReceiver::open(session.as_ref(), options).await?;
//!     let sender = EventHubSender::new(session.clone(), &config.entity_path, Some("1"));
//!
//!     while let Some(message) = receiver.receive(Some(Duration::from_secs(5))).await? {
//!         sender
//!             .send_bytes(message.body().to_vec(), &ApplicationProperties::new())
//!             .await?;
//!     }
//!
//!     receiver.close().await;
//!     sender.close().await;
//!     Ok(())
//! }
//! ```

mod address;
mod config;
pub mod constants;
mod error;
mod filter;
mod message;
mod receiver;
mod sender;
mod telemetry;
mod transport;

#[cfg(test)]
mod mock;

// Re-export public API
pub use address::{consumer_address, destination_address};
pub use config::ClientConfig;
pub use error::{EventHubError, EventHubResult, LinkKind};
pub use filter::{EventPosition, FilterSet, SelectorFilter};
pub use message::{AmqpMessage, AmqpValue, ApplicationProperties, Section};
pub use receiver::{EventHubReceiver, ReceiverOptions};
pub use sender::EventHubSender;
pub use telemetry::{init_tracing, LinkMetrics};
pub use transport::{
    AcknowledgeMode, AmqpSession, CreditMode, LinkProperties, ReceiverAttach, ReceiverLink,
    RemoteError, SenderLink, TransportError,
};

// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
