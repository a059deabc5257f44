use thiserror::Error;

use crate::protocol::primitives::DecodeError;

/// Error codes carried inside response bodies.
/// https://kafka.apache.org/protocol.html#protocol_error_codes
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum KafkaErrorCode {
    None = 0,
    UnknownTopicOrPartition = 3,
    UnsupportedVersion = 35,
}

impl From<KafkaErrorCode> for i16 {
    fn from(error: KafkaErrorCode) -> i16 {
        error as i16
    }
}

pub type Result<T> = std::result::Result<T, ServerError>;

/// Connection-level failures. Any of these ends the connection without a response.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid message size: {size} (max: {max})")]
    InvalidMessageSize { size: i32, max: usize },

    #[error("Incomplete frame: expected {expected} bytes, received {received}")]
    IncompleteFrame { expected: usize, received: usize },

    #[error("Malformed request header: {0}")]
    MalformedHeader(DecodeError),

    #[error("Malformed request body for api key {api_key}: {source}")]
    MalformedRequest {
        api_key: i16,
        #[source]
        source: DecodeError,
    },
}
