pub mod api_registry;
pub mod header;
pub mod messages;
pub mod primitives;

pub use api_registry::{ApiDescriptor, ApiKind, SUPPORTED_APIS};
pub use header::RequestHeader;
pub use primitives::{DecodeError, KafkaBuf, KafkaBufMut, TagBuffer};
