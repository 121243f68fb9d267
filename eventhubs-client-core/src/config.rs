//! Configuration management for Event Hubs clients.

use crate::constants::{
    AMQP_SCHEME, AMQP_SSL_SCHEME, CONNECTION_SYNC_TIMEOUT_MS, DEFAULT_AMQP_CREDITS,
    DEFAULT_CONSUMER_GROUP_NAME, DEFAULT_PORT, DEFAULT_SSL_PORT, RECEIVER_LINK_NAME,
    SERVICE_FQDN_SUFFIX,
};
use crate::{EventHubError, EventHubResult, EventPosition, ReceiverOptions};
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

/// Main configuration for an Event Hubs client
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Service namespace (first label of the host name)
    pub namespace: String,

    /// Event Hub entity path
    pub entity_path: String,

    /// Consumer group receivers attach to
    pub consumer_group: String,

    /// Connect with TLS (`amqps`)
    pub use_ssl: bool,

    /// Port override; defaults to the scheme's well-known port
    pub port: Option<u16>,

    /// DNS suffix appended to the namespace
    pub fqdn_suffix: String,

    /// Credit granted to each receiver link when it is opened
    pub receive_credits: u32,

    /// Timeout for connection level operations in milliseconds
    pub connection_sync_timeout_ms: u64,

    /// Name given to receiver links
    pub receiver_link_name: String,

    /// Log level
    pub log_level: String,
}

impl ClientConfig {
    /// Load configuration from environment variables
    ///
    /// Environment variables:
    /// - `EVENTHUBS_NAMESPACE`: Required, service namespace
    /// - `EVENTHUBS_ENTITY_PATH`: Required, Event Hub name
    /// - `EVENTHUBS_CONSUMER_GROUP`: Consumer group (default: $default)
    /// - `EVENTHUBS_USE_SSL`: Use amqps (default: true)
    /// - `EVENTHUBS_PORT`: Port override (default: 5671 with TLS, 5672 without)
    /// - `EVENTHUBS_FQDN_SUFFIX`: DNS suffix (default: servicebus.windows.net)
    /// - `EVENTHUBS_RECEIVE_CREDITS`: Receiver link credit (default: 1024)
    /// - `EVENTHUBS_SYNC_TIMEOUT_MS`: Connection sync timeout (default: 60000)
    /// - `LOG_LEVEL`: Log level (default: info)
    pub fn from_env() -> EventHubResult<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> EventHubResult<Self> {
        let namespace = lookup("EVENTHUBS_NAMESPACE")
            .ok_or_else(|| EventHubError::config("EVENTHUBS_NAMESPACE is required"))?;

        let entity_path = lookup("EVENTHUBS_ENTITY_PATH")
            .ok_or_else(|| EventHubError::config("EVENTHUBS_ENTITY_PATH is required"))?;

        let mut config = Self {
            namespace,
            entity_path,
            ..Self::default()
        };
        config.apply_overrides(lookup);

        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: &str) -> EventHubResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            EventHubError::config(format!("Failed to read config file {}: {}", path, e))
        })?;

        toml::from_str(&content).map_err(|e| {
            EventHubError::config(format!("Failed to parse config file {}: {}", path, e))
        })
    }

    /// Apply environment variable overrides, typically after loading from TOML
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| env::var(key).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(val) = lookup("EVENTHUBS_NAMESPACE") {
            self.namespace = val;
        }
        if let Some(val) = lookup("EVENTHUBS_ENTITY_PATH") {
            self.entity_path = val;
        }
        if let Some(val) = lookup("EVENTHUBS_CONSUMER_GROUP") {
            self.consumer_group = val;
        }
        if let Some(b) = lookup("EVENTHUBS_USE_SSL").and_then(|s| s.parse().ok()) {
            self.use_ssl = b;
        }
        if let Some(port) = lookup("EVENTHUBS_PORT").and_then(|s| s.parse().ok()) {
            self.port = Some(port);
        }
        if let Some(val) = lookup("EVENTHUBS_FQDN_SUFFIX") {
            self.fqdn_suffix = val;
        }
        if let Some(n) = lookup("EVENTHUBS_RECEIVE_CREDITS").and_then(|s| s.parse().ok()) {
            self.receive_credits = n;
        }
        if let Some(n) = lookup("EVENTHUBS_SYNC_TIMEOUT_MS").and_then(|s| s.parse().ok()) {
            self.connection_sync_timeout_ms = n;
        }
        if let Some(val) = lookup("LOG_LEVEL") {
            self.log_level = val;
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> EventHubResult<()> {
        if self.namespace.is_empty() {
            return Err(EventHubError::config("namespace cannot be empty"));
        }

        if self.entity_path.is_empty() {
            return Err(EventHubError::config("entity_path cannot be empty"));
        }

        if self.consumer_group.is_empty() {
            return Err(EventHubError::config("consumer_group cannot be empty"));
        }

        if self.receive_credits == 0 {
            return Err(EventHubError::config("receive_credits must be > 0"));
        }

        if self.connection_sync_timeout_ms == 0 {
            return Err(EventHubError::config(
                "connection_sync_timeout_ms must be > 0",
            ));
        }

        Ok(())
    }

    pub fn scheme(&self) -> &'static str {
        if self.use_ssl {
            AMQP_SSL_SCHEME
        } else {
            AMQP_SCHEME
        }
    }

    pub fn port(&self) -> u16 {
        self.port.unwrap_or(if self.use_ssl {
            DEFAULT_SSL_PORT
        } else {
            DEFAULT_PORT
        })
    }

    /// Fully qualified host name of the namespace
    pub fn host(&self) -> String {
        format!("{}.{}", self.namespace, self.fqdn_suffix)
    }

    /// URL the transport connects to, e.g. `amqps://contoso.servicebus.windows.net:5671`
    pub fn service_url(&self) -> String {
        format!("{}://{}:{}", self.scheme(), self.host(), self.port())
    }

    pub fn connection_sync_timeout(&self) -> Duration {
        Duration::from_millis(self.connection_sync_timeout_ms)
    }

    /// Receiver options for one partition of the configured entity
    pub fn receiver_options(
        &self,
        partition_id: impl Into<String>,
        position: EventPosition,
    ) -> ReceiverOptions {
        ReceiverOptions::new(&self.entity_path, partition_id)
            .with_consumer_group(&self.consumer_group)
            .with_position(position)
            .with_credits(self.receive_credits)
            .with_link_name(&self.receiver_link_name)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            namespace: String::new(),
            entity_path: String::new(),
            consumer_group: DEFAULT_CONSUMER_GROUP_NAME.to_string(),
            use_ssl: true,
            port: None,
            fqdn_suffix: SERVICE_FQDN_SUFFIX.to_string(),
            receive_credits: DEFAULT_AMQP_CREDITS,
            connection_sync_timeout_ms: CONNECTION_SYNC_TIMEOUT_MS,
            receiver_link_name: RECEIVER_LINK_NAME.to_string(),
            log_level: "info".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn sample() -> ClientConfig {
        ClientConfig {
            namespace: "contoso".to_string(),
            entity_path: "telemetry".to_string(),
            ..ClientConfig::default()
        }
    }

    #[test]
    fn test_config_default() {
        let config = ClientConfig::default();
        assert_eq!(config.consumer_group, "$default");
        assert_eq!(config.receive_credits, 1024);
        assert_eq!(config.connection_sync_timeout(), Duration::from_secs(60));
        assert_eq!(config.receiver_link_name, "eventhubs-receiver-link");
        assert!(config.use_ssl);
    }

    #[test]
    fn test_config_validation() {
        let mut config = ClientConfig::default();
        assert!(config.validate().is_err());

        config = sample();
        assert!(config.validate().is_ok());

        config.receive_credits = 0;
        assert!(config.validate().is_err());

        config = sample();
        config.consumer_group = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_service_url() {
        let mut config = sample();
        assert_eq!(
            config.service_url(),
            "amqps://contoso.servicebus.windows.net:5671"
        );

        config.use_ssl = false;
        assert_eq!(
            config.service_url(),
            "amqp://contoso.servicebus.windows.net:5672"
        );

        config.port = Some(15672);
        config.fqdn_suffix = "localdomain".to_string();
        assert_eq!(config.service_url(), "amqp://contoso.localdomain:15672");
    }

    #[test]
    fn test_config_from_lookup() {
        let vars: HashMap<&str, &str> = [
            ("EVENTHUBS_NAMESPACE", "contoso"),
            ("EVENTHUBS_ENTITY_PATH", "telemetry"),
            ("EVENTHUBS_CONSUMER_GROUP", "analytics"),
            ("EVENTHUBS_USE_SSL", "false"),
            ("EVENTHUBS_RECEIVE_CREDITS", "not-a-number"),
        ]
        .into_iter()
        .collect();

        let config =
            ClientConfig::from_lookup(|key| vars.get(key).map(|v| v.to_string())).unwrap();
        assert_eq!(config.namespace, "contoso");
        assert_eq!(config.consumer_group, "analytics");
        assert!(!config.use_ssl);
        // unparsable values keep the default
        assert_eq!(config.receive_credits, 1024);
    }

    #[test]
    fn test_config_from_lookup_requires_namespace() {
        let err = ClientConfig::from_lookup(|_| None).unwrap_err();
        assert!(err.to_string().contains("EVENTHUBS_NAMESPACE"));
    }

    #[test]
    fn test_config_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
namespace = "contoso"
entity_path = "telemetry"
receive_credits = 300
"#
        )
        .unwrap();

        let config = ClientConfig::from_file(file.path().to_str().unwrap()).unwrap();
        assert_eq!(config.entity_path, "telemetry");
        assert_eq!(config.receive_credits, 300);
        assert_eq!(config.consumer_group, "$default");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_from_missing_file() {
        let err = ClientConfig::from_file("/nonexistent/eventhubs.toml").unwrap_err();
        assert!(matches!(err, EventHubError::Config(_)));
    }

    #[test]
    fn test_receiver_options_from_config() {
        let mut config = sample();
        config.consumer_group = "analytics".to_string();
        config.receive_credits = 50;

        let options = config.receiver_options("4", EventPosition::StartOfStream);
        assert_eq!(options.entity_path, "telemetry");
        assert_eq!(options.consumer_group, "analytics");
        assert_eq!(options.partition_id, "4");
        assert_eq!(options.credits, 50);
        assert_eq!(options.epoch, None);
    }
}
