pub mod api;
pub mod protocol;

pub use api::ResponseBuilder;
pub use protocol::KafkaProtocolHandler;
