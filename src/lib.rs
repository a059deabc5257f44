//! A minimal Kafka-protocol broker: frame codec, request header parsing,
//! version-checked dispatch, ApiVersions and DescribeTopicPartitions
//! responses, and topic resolution from the KRaft metadata log.

pub mod config;
pub mod constants;
pub mod error;
pub mod kafka_server;
pub mod message;
pub mod network;
pub mod protocol;
pub mod storage;

pub use config::BrokerConfig;
pub use error::{KafkaErrorCode, ServerError};
pub use kafka_server::KafkaServer;
pub use storage::MetadataResolver;
