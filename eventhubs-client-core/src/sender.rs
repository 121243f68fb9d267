//! Sender adapter for an entity or one of its partitions.

use crate::address::destination_address;
use crate::error::LinkKind;
use crate::message::{AmqpMessage, ApplicationProperties, Section};
use crate::telemetry::LinkMetrics;
use crate::transport::{AmqpSession, SenderLink, TransportError};
use crate::{EventHubError, EventHubResult};
use bytes::Bytes;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::OnceCell;
use tokio::time::Instant;
use tracing::{debug, error, info};

/// Sends events to an Event Hub.
///
/// The sender link is attached on the first send. Concurrent first sends share a
/// single attach; later sends go straight to the link without locking.
pub struct EventHubSender {
    session: Arc<dyn AmqpSession>,
    destination_address: String,
    link: OnceCell<Box<dyn SenderLink>>,
    closed: AtomicBool,
    detached: AtomicBool,
    metrics: LinkMetrics,
}

impl EventHubSender {
    /// Create a sender. Nothing is attached until the first send.
    ///
    /// With no partition (or an empty one) the service assigns partitions itself.
    pub fn new(
        session: Arc<dyn AmqpSession>,
        entity_path: &str,
        partition_id: Option<&str>,
    ) -> Self {
        let address = destination_address(entity_path, partition_id);

        Self {
            session,
            metrics: LinkMetrics::new(LinkKind::Sender, &address),
            destination_address: address,
            link: OnceCell::new(),
            closed: AtomicBool::new(false),
            detached: AtomicBool::new(false),
        }
    }

    pub fn destination_address(&self) -> &str {
        &self.destination_address
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Send a message made of a single section
    pub async fn send(&self, section: Section) -> EventHubResult<()> {
        self.send_sections(vec![section]).await
    }

    /// Send a message made of `sections`, attaching the link first if needed.
    ///
    /// A detached link fails with [`EventHubError::LinkDetached`], running out of
    /// credit with [`EventHubError::SendTimeout`]. Any other transport failure is
    /// returned as [`EventHubError::Transport`].
    pub async fn send_sections(&self, sections: Vec<Section>) -> EventHubResult<()> {
        if self.is_closed() {
            return Err(EventHubError::AlreadyClosed(LinkKind::Sender));
        }

        let link = self.link().await?;
        let start = Instant::now();

        match link.send(AmqpMessage::from_sections(sections)).await {
            Ok(()) => {
                self.metrics.record_sent(start.elapsed());
                debug!("Message sent to {}", self.destination_address);
                Ok(())
            }
            Err(e) => {
                let err = match e {
                    TransportError::LinkDetached(reason) => EventHubError::LinkDetached(reason),
                    TransportError::Timeout => EventHubError::SendTimeout,
                    other => EventHubError::Transport(other),
                };
                error!("Failed to send to {}: {}", self.destination_address, err);
                self.metrics.record_error(err.kind());
                Err(err)
            }
        }
    }

    /// Send raw bytes, with application properties if any are given
    pub async fn send_bytes(
        &self,
        data: impl Into<Bytes>,
        properties: &ApplicationProperties,
    ) -> EventHubResult<()> {
        let body = Section::Data(data.into());

        if properties.is_empty() {
            self.send(body).await
        } else {
            self.send_sections(vec![
                body,
                Section::ApplicationProperties(properties.clone()),
            ])
            .await
        }
    }

    /// Send a string as UTF-8 bytes so consumers in any language can read it
    pub async fn send_str(
        &self,
        data: &str,
        properties: &ApplicationProperties,
    ) -> EventHubResult<()> {
        self.send_bytes(Bytes::copy_from_slice(data.as_bytes()), properties)
            .await
    }

    /// Send a JSON-serializable value as UTF-8 JSON bytes
    pub async fn send_json<T: Serialize>(
        &self,
        data: &T,
        properties: &ApplicationProperties,
    ) -> EventHubResult<()> {
        let payload = serde_json::to_vec(data)?;
        self.send_bytes(payload, properties).await
    }

    /// Detach the link if it was ever attached.
    ///
    /// Errors while closing are logged, not returned. Later sends fail with
    /// [`EventHubError::AlreadyClosed`]. A link still attaching when this runs is
    /// detached by the send that attached it.
    pub async fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }

        match self.link.get() {
            Some(link) => self.detach(link.as_ref()).await,
            None => debug!("Sender on {} closed before first send", self.destination_address),
        }
    }

    async fn detach(&self, link: &dyn SenderLink) {
        if self.detached.swap(true, Ordering::AcqRel) {
            return;
        }

        if let Err(e) = link.close().await {
            error!("Closing a sender encountered error: {}", e);
        }
        info!("Sender closed on {}", self.destination_address);
    }

    async fn link(&self) -> EventHubResult<&dyn SenderLink> {
        let link = self
            .link
            .get_or_try_init(|| async {
                info!("Creating sender link to {}", self.destination_address);
                self.session
                    .create_sender(&self.destination_address)
                    .await
                    .map_err(|e| {
                        error!(
                            "Failed to attach sender link to {}: {}",
                            self.destination_address, e
                        );
                        self.metrics.record_error("attach_failed");
                        EventHubError::attach(LinkKind::Sender, &self.destination_address, e)
                    })
            })
            .await?;

        // close() may have run while the link was attaching
        if self.is_closed() {
            self.detach(link.as_ref()).await;
            return Err(EventHubError::AlreadyClosed(LinkKind::Sender));
        }

        Ok(link.as_ref())
    }
}
