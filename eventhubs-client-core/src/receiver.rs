//! Receiver adapter for a single partition of a consumer group.

use crate::address::consumer_address;
use crate::constants::{
    ATTACH_EPOCH, DEFAULT_AMQP_CREDITS, DEFAULT_CONSUMER_GROUP_NAME, RECEIVER_LINK_NAME,
};
use crate::error::LinkKind;
use crate::filter::{EventPosition, SelectorFilter};
use crate::message::{AmqpMessage, AmqpValue};
use crate::telemetry::LinkMetrics;
use crate::transport::{
    AcknowledgeMode, AmqpSession, CreditMode, LinkProperties, ReceiverAttach, ReceiverLink,
    TransportError,
};
use crate::{EventHubError, EventHubResult};
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Parameters for opening a receiver link
#[derive(Debug, Clone)]
pub struct ReceiverOptions {
    pub entity_path: String,
    pub consumer_group: String,
    pub partition_id: String,
    pub filter: SelectorFilter,
    /// Credit granted when the link opens; the transport owns replenishment
    pub credits: u32,
    /// Exclusive-owner generation; a higher epoch preempts older receivers
    pub epoch: Option<i64>,
    pub link_name: String,
}

impl ReceiverOptions {
    /// Options reading `partition_id` of `entity_path` from the start of the stream
    /// in the default consumer group
    pub fn new(entity_path: impl Into<String>, partition_id: impl Into<String>) -> Self {
        Self {
            entity_path: entity_path.into(),
            consumer_group: DEFAULT_CONSUMER_GROUP_NAME.to_string(),
            partition_id: partition_id.into(),
            filter: SelectorFilter::from(EventPosition::StartOfStream),
            credits: DEFAULT_AMQP_CREDITS,
            epoch: None,
            link_name: RECEIVER_LINK_NAME.to_string(),
        }
    }

    pub fn with_consumer_group(mut self, consumer_group: impl Into<String>) -> Self {
        self.consumer_group = consumer_group.into();
        self
    }

    pub fn with_position(mut self, position: EventPosition) -> Self {
        self.filter = SelectorFilter::from(position);
        self
    }

    /// Use a raw selector expression instead of a position
    pub fn with_filter(mut self, filter: SelectorFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_credits(mut self, credits: u32) -> Self {
        self.credits = credits;
        self
    }

    pub fn with_epoch(mut self, epoch: i64) -> Self {
        self.epoch = Some(epoch);
        self
    }

    pub fn with_link_name(mut self, link_name: impl Into<String>) -> Self {
        self.link_name = link_name.into();
        self
    }
}

/// Receives events from one partition.
///
/// The link is attached when the receiver is opened and stays attached until
/// [`close`](Self::close) is called or the peer reports an error. A closed receiver
/// never touches the transport again.
pub struct EventHubReceiver {
    link: Box<dyn ReceiverLink>,
    consumer_address: String,
    partition_id: String,
    epoch: Option<i64>,
    closed: bool,
    metrics: LinkMetrics,
}

impl EventHubReceiver {
    /// Attach a receiver link and grant it its initial credit
    pub async fn open<S>(session: &S, options: ReceiverOptions) -> EventHubResult<Self>
    where
        S: AmqpSession + ?Sized,
    {
        let address = consumer_address(
            &options.entity_path,
            &options.consumer_group,
            &options.partition_id,
        );

        let mut properties = LinkProperties::new();
        if let Some(epoch) = options.epoch {
            properties.insert(ATTACH_EPOCH.to_string(), AmqpValue::Long(epoch));
        }

        info!("Receiver filter string: {}", options.filter);
        info!(
            "Opening receiver link on {} (credits: {}, epoch: {:?})",
            address, options.credits, options.epoch
        );

        let attach = ReceiverAttach {
            address: address.clone(),
            link_name: options.link_name,
            ack_mode: AcknowledgeMode::AtLeastOnce,
            exclusive: false,
            filters: options.filter.filter_set(),
            timeout: None,
            properties,
        };

        let mut link = session.create_receiver(attach).await.map_err(|e| {
            error!("Failed to attach receiver link on {}: {}", address, e);
            EventHubError::attach(LinkKind::Receiver, &address, e)
        })?;

        if let Err(e) = link.set_credit(options.credits, CreditMode::Window).await {
            error!("Failed to grant credit on {}: {}", address, e);
            if let Err(close_err) = link.close().await {
                warn!("Closing receiver link on {} failed: {}", address, close_err);
            }
            return Err(EventHubError::attach(LinkKind::Receiver, &address, e));
        }

        info!("Receiver link attached on {}", address);

        Ok(Self {
            link,
            metrics: LinkMetrics::new(LinkKind::Receiver, &address),
            consumer_address: address,
            partition_id: options.partition_id,
            epoch: options.epoch,
            closed: false,
        })
    }

    /// Wait for the next event and accept it before returning it.
    ///
    /// `None` waits indefinitely. Returns `Ok(None)` if the wait elapses without an
    /// event. If the link reported an error in the meantime the receiver is closed and
    /// the error returned.
    pub async fn receive(
        &mut self,
        timeout: Option<Duration>,
    ) -> EventHubResult<Option<AmqpMessage>> {
        let Some(message) = self.next_delivery(timeout).await? else {
            return Ok(None);
        };

        // The service does not need the acknowledgement, but unsettled deliveries
        // would hold on to link credit.
        if let Err(e) = self.link.accept(&message).await {
            return Err(self.fail("accept", &message, e).await);
        }
        self.metrics.record_settled("accepted");

        Ok(Some(message))
    }

    /// Like [`receive`](Self::receive) but leaves the event unsettled.
    ///
    /// Settle it with [`complete`](Self::complete) or [`unlock`](Self::unlock).
    pub async fn peek_and_lock(
        &mut self,
        timeout: Option<Duration>,
    ) -> EventHubResult<Option<AmqpMessage>> {
        self.next_delivery(timeout).await
    }

    /// Settle a locked event as accepted
    pub async fn complete(&mut self, message: &AmqpMessage) -> EventHubResult<()> {
        self.ensure_open()?;
        if let Err(e) = self.link.accept(message).await {
            return Err(self.fail("complete", message, e).await);
        }
        self.metrics.record_settled("accepted");
        Ok(())
    }

    /// Release a locked event so it can be redelivered
    pub async fn unlock(&mut self, message: &AmqpMessage) -> EventHubResult<()> {
        self.ensure_open()?;
        if let Err(e) = self.link.release(message).await {
            return Err(self.fail("unlock", message, e).await);
        }
        self.metrics.record_settled("released");
        Ok(())
    }

    /// Detach the link. Calling this more than once is a no-op.
    pub async fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;

        if let Err(e) = self.link.close().await {
            warn!("Closing receiver link on {} failed: {}", self.consumer_address, e);
        }
        info!("Receiver closed on {}", self.consumer_address);
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn consumer_address(&self) -> &str {
        &self.consumer_address
    }

    pub fn partition_id(&self) -> &str {
        &self.partition_id
    }

    pub fn epoch(&self) -> Option<i64> {
        self.epoch
    }

    /// A failed settlement ends the receiver like any other transport failure
    async fn fail(
        &mut self,
        action: &str,
        message: &AmqpMessage,
        err: TransportError,
    ) -> EventHubError {
        error!(
            "Failed to {} {} on {}: {}",
            action,
            message.event_id(),
            self.consumer_address,
            err
        );
        self.metrics.record_error("transport");
        self.close().await;
        EventHubError::Transport(err)
    }

    fn ensure_open(&self) -> EventHubResult<()> {
        if self.closed {
            return Err(EventHubError::AlreadyClosed(LinkKind::Receiver));
        }
        Ok(())
    }

    async fn next_delivery(
        &mut self,
        timeout: Option<Duration>,
    ) -> EventHubResult<Option<AmqpMessage>> {
        self.ensure_open()?;

        match self.link.receive(timeout).await {
            Ok(Some(message)) => {
                self.metrics.record_received();
                debug!("Received {} on {}", message.event_id(), self.consumer_address);
                Ok(Some(message))
            }
            Ok(None) => {
                // An empty wait is only an error if the peer attached one to the link
                if let Some(remote) = self.link.link_error() {
                    error!("Receiver link on {} failed: {}", self.consumer_address, remote);
                    self.metrics.record_error("remote");
                    self.close().await;
                    return Err(TransportError::Remote(remote).into());
                }
                Ok(None)
            }
            Err(e) => {
                error!("Receive failed on {}: {}", self.consumer_address, e);
                self.metrics.record_error("transport");
                self.close().await;
                Err(e.into())
            }
        }
    }
}
