//! Recording transport used by the unit tests.

use crate::message::AmqpMessage;
use crate::transport::{
    AmqpSession, CreditMode, ReceiverAttach, ReceiverLink, RemoteError, SenderLink,
    TransportError,
};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

#[derive(Default)]
pub(crate) struct MockState {
    // receiver side
    pub attaches: Vec<ReceiverAttach>,
    pub attach_error: Option<TransportError>,
    pub credit: Option<(u32, CreditMode)>,
    pub deliveries: VecDeque<Result<Option<AmqpMessage>, TransportError>>,
    pub link_error: Option<RemoteError>,
    pub receive_timeouts: Vec<Option<Duration>>,
    pub accepted: Vec<AmqpMessage>,
    pub accept_error: Option<TransportError>,
    pub released: Vec<AmqpMessage>,
    pub release_error: Option<TransportError>,
    pub receiver_closes: usize,
    pub receiver_close_error: Option<TransportError>,

    // sender side
    pub senders_created: usize,
    pub sender_addresses: Vec<String>,
    pub sender_error: Option<TransportError>,
    pub send_errors: VecDeque<TransportError>,
    pub sent: Vec<AmqpMessage>,
    pub sender_closes: usize,
    pub sender_close_error: Option<TransportError>,
}

#[derive(Clone, Default)]
pub(crate) struct MockSession {
    state: Arc<Mutex<MockState>>,
    create_delay: Duration,
}

impl MockSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sleep inside `create_sender` so concurrent first sends overlap
    pub fn with_create_delay(delay: Duration) -> Self {
        Self {
            create_delay: delay,
            ..Self::default()
        }
    }

    pub fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap()
    }

    pub fn push_delivery(&self, delivery: Result<Option<AmqpMessage>, TransportError>) {
        self.state().deliveries.push_back(delivery);
    }
}

#[async_trait]
impl AmqpSession for MockSession {
    async fn create_receiver(
        &self,
        attach: ReceiverAttach,
    ) -> Result<Box<dyn ReceiverLink>, TransportError> {
        let mut state = self.state();
        state.attaches.push(attach);
        if let Some(err) = state.attach_error.take() {
            return Err(err);
        }
        Ok(Box::new(MockReceiver {
            state: self.state.clone(),
        }))
    }

    async fn create_sender(&self, address: &str) -> Result<Box<dyn SenderLink>, TransportError> {
        {
            let mut state = self.state();
            state.senders_created += 1;
            state.sender_addresses.push(address.to_string());
        }

        if !self.create_delay.is_zero() {
            tokio::time::sleep(self.create_delay).await;
        }

        if let Some(err) = self.state().sender_error.take() {
            return Err(err);
        }
        Ok(Box::new(MockSender {
            state: self.state.clone(),
        }))
    }
}

struct MockReceiver {
    state: Arc<Mutex<MockState>>,
}

impl MockReceiver {
    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap()
    }
}

#[async_trait]
impl ReceiverLink for MockReceiver {
    async fn set_credit(&mut self, credit: u32, mode: CreditMode) -> Result<(), TransportError> {
        self.state().credit = Some((credit, mode));
        Ok(())
    }

    async fn receive(
        &mut self,
        timeout: Option<Duration>,
    ) -> Result<Option<AmqpMessage>, TransportError> {
        let mut state = self.state();
        state.receive_timeouts.push(timeout);
        // an empty queue behaves like an elapsed wait
        state.deliveries.pop_front().unwrap_or(Ok(None))
    }

    fn link_error(&self) -> Option<RemoteError> {
        self.state().link_error.clone()
    }

    async fn accept(&mut self, message: &AmqpMessage) -> Result<(), TransportError> {
        let mut state = self.state();
        if let Some(err) = state.accept_error.take() {
            return Err(err);
        }
        state.accepted.push(message.clone());
        Ok(())
    }

    async fn release(&mut self, message: &AmqpMessage) -> Result<(), TransportError> {
        let mut state = self.state();
        if let Some(err) = state.release_error.take() {
            return Err(err);
        }
        state.released.push(message.clone());
        Ok(())
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        let mut state = self.state();
        state.receiver_closes += 1;
        match state.receiver_close_error.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

struct MockSender {
    state: Arc<Mutex<MockState>>,
}

impl MockSender {
    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap()
    }
}

#[async_trait]
impl SenderLink for MockSender {
    async fn send(&self, message: AmqpMessage) -> Result<(), TransportError> {
        let mut state = self.state();
        if let Some(err) = state.send_errors.pop_front() {
            return Err(err);
        }
        state.sent.push(message);
        Ok(())
    }

    async fn close(&self) -> Result<(), TransportError> {
        let mut state = self.state();
        state.sender_closes += 1;
        match state.sender_close_error.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}
