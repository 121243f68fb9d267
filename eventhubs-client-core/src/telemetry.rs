//! Logging setup and per-link metrics.

use crate::error::LinkKind;
use crate::ClientConfig;
use metrics::{counter, histogram};
use std::time::Duration;

/// Initialize tracing/logging
///
/// `RUST_LOG` wins over the configured level. Does nothing if the host application has
/// already installed a global subscriber.
pub fn init_tracing(config: &ClientConfig) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .try_init()
        .ok(); // Ignore if already initialized
}

/// Metric handles labelled with the link address.
///
/// Emitted through the `metrics` facade; nothing is recorded unless the host
/// application installs a recorder.
#[derive(Debug, Clone)]
pub struct LinkMetrics {
    address: String,
    kind: LinkKind,
}

impl LinkMetrics {
    pub fn new(kind: LinkKind, address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            kind,
        }
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn record_received(&self) {
        counter!("eventhubs_messages_received_total", "address" => self.address.clone())
            .increment(1);
    }

    /// Record a settlement; `outcome` is `accepted` or `released`
    pub fn record_settled(&self, outcome: &'static str) {
        counter!(
            "eventhubs_messages_settled_total",
            "address" => self.address.clone(),
            "outcome" => outcome
        )
        .increment(1);
    }

    pub fn record_sent(&self, elapsed: Duration) {
        counter!("eventhubs_messages_sent_total", "address" => self.address.clone()).increment(1);
        histogram!("eventhubs_send_duration_seconds", "address" => self.address.clone())
            .record(elapsed.as_secs_f64());
    }

    pub fn record_error(&self, kind: &'static str) {
        counter!(
            "eventhubs_link_errors_total",
            "address" => self.address.clone(),
            "link" => self.kind.as_str(),
            "kind" => kind
        )
        .increment(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_tracing_twice() {
        let config = ClientConfig::default();
        init_tracing(&config);
        init_tracing(&config);
        tracing::info!("tracing initialized");
    }

    #[test]
    fn test_metrics_without_recorder() {
        let metrics = LinkMetrics::new(LinkKind::Sender, "hub/Partitions/0");
        assert_eq!(metrics.address(), "hub/Partitions/0");
        assert_eq!(metrics.kind, LinkKind::Sender);

        metrics.record_sent(Duration::from_millis(3));
        metrics.record_settled("accepted");
        metrics.record_error("transport");
    }
}
