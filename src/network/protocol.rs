use std::sync::Arc;

use bytes::Bytes;
use tracing::{debug, warn};

use crate::{
    error::{KafkaErrorCode, Result, ServerError},
    network::api::ResponseBuilder,
    protocol::{
        api_registry::{self, ApiKind},
        messages::{DescribeTopicPartitionsRequest, TopicDescription},
        RequestHeader,
    },
    storage::MetadataResolver,
};

/// Routes a parsed request to its response builder.
pub struct KafkaProtocolHandler {
    resolver: Arc<MetadataResolver>,
}

impl KafkaProtocolHandler {
    pub fn new(resolver: Arc<MetadataResolver>) -> Self {
        KafkaProtocolHandler { resolver }
    }

    pub fn is_version_supported(api_key: i16, api_version: i16) -> bool {
        api_registry::lookup_supported(api_key, api_version).is_some()
    }

    /// Produces the unframed response payload for one request.
    ///
    /// The version range is checked before the body is looked at; an unknown
    /// API or version gets an UNSUPPORTED_VERSION response and its body is
    /// dropped unread.
    pub async fn process_request(&self, header: &RequestHeader, body: Bytes) -> Result<Bytes> {
        let Some(descriptor) = api_registry::lookup_supported(header.api_key, header.api_version)
        else {
            warn!(
                api_key = header.api_key,
                api_version = header.api_version,
                correlation_id = header.correlation_id,
                discarded = body.len(),
                "unsupported api key or version"
            );
            return Ok(ResponseBuilder::build_error_response(
                header.correlation_id,
                KafkaErrorCode::UnsupportedVersion,
            ));
        };

        match descriptor.kind {
            ApiKind::ApiVersions => Ok(ResponseBuilder::build_api_versions_response(
                header.correlation_id,
                header.api_version,
            )),
            ApiKind::DescribeTopicPartitions => self.describe_topic_partitions(header, body).await,
        }
    }

    async fn describe_topic_partitions(&self, header: &RequestHeader, mut body: Bytes) -> Result<Bytes> {
        let request = DescribeTopicPartitionsRequest::decode(&mut body).map_err(|source| {
            ServerError::MalformedRequest {
                api_key: header.api_key,
                source,
            }
        })?;

        let mut names = request.topics;
        names.sort();

        let mut topics = Vec::with_capacity(names.len());
        for name in names {
            let topic = match self.resolver.topic_id(&name).await {
                Some(topic_id) => TopicDescription::known(name, topic_id),
                None => {
                    debug!(topic = %name, "unknown topic");
                    TopicDescription::unknown(name)
                }
            };
            topics.push(topic);
        }

        Ok(ResponseBuilder::build_describe_topic_partitions_response(
            header.correlation_id,
            &topics,
        ))
    }
}
