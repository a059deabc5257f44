// https://kafka.apache.org/protocol.html#protocol_api_keys
pub const API_KEY_API_VERSIONS: i16 = 18;
pub const API_KEY_DESCRIBE_TOPIC_PARTITIONS: i16 = 75;

pub const API_VERSIONS_MIN_VERSION: i16 = 0;
pub const API_VERSIONS_MAX_VERSION: i16 = 4;
// ApiVersions v3 introduced compact arrays and tagged fields
pub const API_VERSIONS_FIRST_FLEXIBLE_VERSION: i16 = 3;

pub const DESCRIBE_TOPIC_PARTITIONS_MIN_VERSION: i16 = 0;
pub const DESCRIBE_TOPIC_PARTITIONS_MAX_VERSION: i16 = 0;

// frame length prefix, in bytes
pub const FRAME_HEADER_SIZE: usize = 4;
pub const MAX_MESSAGE_SIZE: usize = 100 * 1024 * 1024;

// READ | WRITE | CREATE | DELETE | ALTER | DESCRIBE | DESCRIBE_CONFIGS | ALTER_CONFIGS
pub const DEFAULT_TOPIC_AUTHORIZED_OPERATIONS: i32 = 0x0df8;

pub const DEFAULT_LISTEN_ADDRESS: &str = "0.0.0.0:9092";
pub const DEFAULT_METADATA_LOG_PATH: &str =
    "/tmp/kraft-combined-logs/__cluster_metadata-0/00000000000000000000.log";

// KRaft metadata record types
pub const METADATA_RECORD_TYPE_TOPIC: i8 = 2;

pub const RECORD_BATCH_MAGIC: i8 = 2;
