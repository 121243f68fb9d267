//! Protocol constants shared by the receiver and sender adapters.
//!
//! These values are part of the wire contract with the service and must stay bit-exact.

/// Offset that positions a receiver at the very beginning of a partition.
pub const DEFAULT_STARTING_OFFSET: &str = "-1";

/// Descriptor name of the selector filter attached to receiver links.
pub const SELECTOR_FILTER_NAME: &str = "apache.org:selector-filter:string";

/// Link property key that carries the receiver epoch.
pub const ATTACH_EPOCH: &str = "com.microsoft:epoch";

/// Selector template for "offset greater than", the offset is quoted.
pub const OFFSET_FILTER_FORMAT: &str = "amqp.annotation.x-opt-offset > '{}'";

/// Selector template for "enqueued after", milliseconds since the Unix epoch.
pub const ENQUEUED_TIME_FILTER_FORMAT: &str = "amqp.annotation.x-opt-enqueuedtimeutc > {}";

/// `{entity}/ConsumerGroups/{group}/Partitions/{partition}`
pub const CONSUMER_ADDRESS_FORMAT: &str = "{}/ConsumerGroups/{}/Partitions/{}";

/// `{entity}/Partitions/{partition}`
pub const DESTINATION_ADDRESS_FORMAT: &str = "{}/Partitions/{}";

/// URL scheme for connections over TLS.
pub const AMQP_SSL_SCHEME: &str = "amqps";

/// URL scheme for plain-text connections.
pub const AMQP_SCHEME: &str = "amqp";

/// Port used with [`AMQP_SCHEME`].
pub const DEFAULT_PORT: u16 = 5672;

/// Port used with [`AMQP_SSL_SCHEME`].
pub const DEFAULT_SSL_PORT: u16 = 5671;

/// DNS suffix appended to the namespace to form the service host name.
pub const SERVICE_FQDN_SUFFIX: &str = "servicebus.windows.net";

pub const DEFAULT_CONSUMER_GROUP_NAME: &str = "$default";

/// Milliseconds to wait for connection level operations to settle.
pub const CONNECTION_SYNC_TIMEOUT_MS: u64 = 60_000;

pub const RECEIVER_LINK_NAME: &str = "eventhubs-receiver-link";

/// Credit granted to a receiver link when it is opened.
pub const DEFAULT_AMQP_CREDITS: u32 = 1024;

// Message annotation keys stamped by the service on every event.
pub const OFFSET_KEY: &str = "x-opt-offset";
pub const SEQUENCE_NUMBER_KEY: &str = "x-opt-sequence-number";
pub const ENQUEUED_TIME_KEY: &str = "x-opt-enqueued-time";
