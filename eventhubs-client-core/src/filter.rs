//! Selector filters that position a receiver within a partition.

use crate::address::render;
use crate::constants::{
    DEFAULT_STARTING_OFFSET, ENQUEUED_TIME_FILTER_FORMAT, OFFSET_FILTER_FORMAT,
    SELECTOR_FILTER_NAME,
};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::fmt;

/// Filters attached to a receiver link, keyed by descriptor name
pub type FilterSet = BTreeMap<String, SelectorFilter>;

/// Where in the partition a receiver starts reading
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum EventPosition {
    /// Every retained event
    #[default]
    StartOfStream,
    /// Events strictly after the given offset
    Offset(String),
    /// Events enqueued strictly after the given instant
    EnqueuedTime(DateTime<Utc>),
}

impl EventPosition {
    /// Render the selector expression for this position
    pub fn filter_expression(&self) -> String {
        match self {
            EventPosition::StartOfStream => {
                render(OFFSET_FILTER_FORMAT, &[DEFAULT_STARTING_OFFSET])
            }
            EventPosition::Offset(offset) => render(OFFSET_FILTER_FORMAT, &[offset.as_str()]),
            EventPosition::EnqueuedTime(time) => render(
                ENQUEUED_TIME_FILTER_FORMAT,
                &[&time.timestamp_millis().to_string()],
            ),
        }
    }
}

/// A selector filter; the expression is evaluated by the service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorFilter {
    expression: String,
}

impl SelectorFilter {
    /// Create a filter from a raw selector expression
    pub fn new(expression: impl Into<String>) -> Self {
        Self {
            expression: expression.into(),
        }
    }

    pub fn expression(&self) -> &str {
        &self.expression
    }

    /// Descriptor name the filter is keyed by on the wire
    pub fn descriptor(&self) -> &'static str {
        SELECTOR_FILTER_NAME
    }

    /// Single-entry filter set keyed by the selector descriptor
    pub fn filter_set(&self) -> FilterSet {
        let mut filters = FilterSet::new();
        filters.insert(SELECTOR_FILTER_NAME.to_string(), self.clone());
        filters
    }
}

impl From<EventPosition> for SelectorFilter {
    fn from(position: EventPosition) -> Self {
        SelectorFilter::new(position.filter_expression())
    }
}

impl From<&EventPosition> for SelectorFilter {
    fn from(position: &EventPosition) -> Self {
        SelectorFilter::new(position.filter_expression())
    }
}

impl fmt::Display for SelectorFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.expression)
    }
}
