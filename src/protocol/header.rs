use bytes::Bytes;

use crate::{
    error::{Result, ServerError},
    protocol::{
        api_registry,
        primitives::{DecodeError, KafkaBuf, TagBuffer},
    },
};

// request header v1/v2: api_key, api_version, correlation_id, client_id [, tag_buffer]
// https://kafka.apache.org/protocol.html#protocol_messages
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestHeader {
    pub api_key: i16,
    pub api_version: i16,
    pub correlation_id: i32,
    pub client_id: Option<String>,
    pub tagged_fields: TagBuffer,
}

impl RequestHeader {
    /// Splits the header off the front of `frame`; what remains is the body.
    ///
    /// For an api_key/api_version pair the broker does not support, only the
    /// fixed 8-byte prefix is consumed since the rest of the layout is unknown.
    pub fn parse(frame: &mut Bytes) -> Result<Self> {
        Self::decode(frame).map_err(ServerError::MalformedHeader)
    }

    fn decode(frame: &mut Bytes) -> std::result::Result<Self, DecodeError> {
        let api_key = frame.read_i16()?;
        let api_version = frame.read_i16()?;
        let correlation_id = frame.read_i32()?;

        let mut header = RequestHeader {
            api_key,
            api_version,
            correlation_id,
            client_id: None,
            tagged_fields: TagBuffer::default(),
        };

        if let Some(descriptor) = api_registry::lookup_supported(api_key, api_version) {
            // client_id keeps its int16 length even in flexible headers
            header.client_id = frame.read_nullable_string()?;
            if descriptor.is_flexible(api_version) {
                header.tagged_fields = frame.read_tag_buffer()?;
            }
        }

        Ok(header)
    }
}
