//! AMQP message model.
//!
//! This module provides the payload sections the sender assembles and the accessors used
//! to read event metadata from received messages.

use crate::constants::{ENQUEUED_TIME_KEY, OFFSET_KEY, SEQUENCE_NUMBER_KEY};
use crate::{EventHubError, EventHubResult};
use bytes::Bytes;
use chrono::{DateTime, TimeZone, Utc};
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;

/// Application properties section contents
pub type ApplicationProperties = BTreeMap<String, AmqpValue>;

/// Scalar AMQP value
#[derive(Debug, Clone, PartialEq)]
pub enum AmqpValue {
    Null,
    Bool(bool),
    Long(i64),
    Double(f64),
    String(String),
    Binary(Bytes),
    Timestamp(DateTime<Utc>),
}

impl AmqpValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            AmqpValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            AmqpValue::Long(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            AmqpValue::Timestamp(ts) => Some(*ts),
            // Some brokers stamp the enqueued time as raw epoch millis
            AmqpValue::Long(ms) => Utc.timestamp_millis_opt(*ms).single(),
            _ => None,
        }
    }
}

impl From<bool> for AmqpValue {
    fn from(v: bool) -> Self {
        AmqpValue::Bool(v)
    }
}

impl From<i64> for AmqpValue {
    fn from(v: i64) -> Self {
        AmqpValue::Long(v)
    }
}

impl From<i32> for AmqpValue {
    fn from(v: i32) -> Self {
        AmqpValue::Long(v.into())
    }
}

impl From<f64> for AmqpValue {
    fn from(v: f64) -> Self {
        AmqpValue::Double(v)
    }
}

impl From<&str> for AmqpValue {
    fn from(v: &str) -> Self {
        AmqpValue::String(v.to_string())
    }
}

impl From<String> for AmqpValue {
    fn from(v: String) -> Self {
        AmqpValue::String(v)
    }
}

impl From<Vec<u8>> for AmqpValue {
    fn from(v: Vec<u8>) -> Self {
        AmqpValue::Binary(Bytes::from(v))
    }
}

impl From<DateTime<Utc>> for AmqpValue {
    fn from(v: DateTime<Utc>) -> Self {
        AmqpValue::Timestamp(v)
    }
}

/// One body or header section of a message
#[derive(Debug, Clone, PartialEq)]
pub enum Section {
    /// Opaque binary payload
    Data(Bytes),
    /// Single typed value payload
    AmqpValue(AmqpValue),
    ApplicationProperties(ApplicationProperties),
}

/// A message as handed to and received from the transport
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AmqpMessage {
    /// Sections in wire order
    pub sections: Vec<Section>,
    /// Annotations stamped by the service (offset, sequence number, ...)
    pub annotations: BTreeMap<String, AmqpValue>,
    /// Delivery tag assigned by the transport on receipt
    pub delivery_tag: Option<Bytes>,
}

impl AmqpMessage {
    pub fn from_sections(sections: Vec<Section>) -> Self {
        Self {
            sections,
            ..Default::default()
        }
    }

    /// Get the first data section as bytes, empty if there is none
    pub fn body(&self) -> &[u8] {
        self.sections
            .iter()
            .find_map(|section| match section {
                Section::Data(data) => Some(data.as_ref()),
                _ => None,
            })
            .unwrap_or_default()
    }

    /// Get the payload as a UTF-8 string (if valid)
    pub fn payload_str(&self) -> EventHubResult<&str> {
        std::str::from_utf8(self.body()).map_err(|e| EventHubError::InvalidData {
            message: format!("Payload is not valid UTF-8: {}", e),
            payload: Bytes::copy_from_slice(self.body()),
        })
    }

    /// Deserialize the payload as JSON
    pub fn payload_json<T: DeserializeOwned>(&self) -> EventHubResult<T> {
        serde_json::from_slice(self.body()).map_err(|e| EventHubError::InvalidData {
            message: format!("Failed to deserialize JSON: {}", e),
            payload: Bytes::copy_from_slice(self.body()),
        })
    }

    /// Get the application properties section, if present
    pub fn application_properties(&self) -> Option<&ApplicationProperties> {
        self.sections.iter().find_map(|section| match section {
            Section::ApplicationProperties(props) => Some(props),
            _ => None,
        })
    }

    pub fn annotation(&self, key: &str) -> Option<&AmqpValue> {
        self.annotations.get(key)
    }

    /// Offset of this event within its partition
    pub fn offset(&self) -> Option<&str> {
        self.annotation(OFFSET_KEY).and_then(AmqpValue::as_str)
    }

    pub fn sequence_number(&self) -> Option<i64> {
        self.annotation(SEQUENCE_NUMBER_KEY)
            .and_then(AmqpValue::as_i64)
    }

    /// Time the service enqueued this event
    pub fn enqueued_time(&self) -> Option<DateTime<Utc>> {
        self.annotation(ENQUEUED_TIME_KEY)
            .and_then(AmqpValue::as_timestamp)
    }

    /// Get a formatted event ID string for logging
    pub fn event_id(&self) -> String {
        format!(
            "offset:{}/sequence:{}",
            self.offset().unwrap_or("-"),
            self.sequence_number()
                .map(|n| n.to_string())
                .unwrap_or_else(|| "-".to_string())
        )
    }
}
