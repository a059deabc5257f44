use bytes::{BufMut, Bytes, BytesMut};
use tracing::debug;

use crate::{
    constants::API_VERSIONS_FIRST_FLEXIBLE_VERSION,
    error::KafkaErrorCode,
    protocol::{
        api_registry::SUPPORTED_APIS,
        messages::{PartitionDescription, TopicDescription},
        primitives::{KafkaBufMut, TagBuffer},
    },
};

// The ApiVersions response uses the v0 response header (correlation_id only),
// every other response uses v1 (correlation_id + tag buffer).
// Payloads built here are unframed; the frame codec adds the length prefix.
pub struct ResponseBuilder;

impl ResponseBuilder {
    pub fn build_api_versions_response(correlation_id: i32, api_version: i16) -> Bytes {
        let flexible = api_version >= API_VERSIONS_FIRST_FLEXIBLE_VERSION;
        let mut body = BytesMut::new();

        body.put_i32(correlation_id);
        body.put_i16(KafkaErrorCode::None.into());

        if flexible {
            body.write_compact_array_len(SUPPORTED_APIS.len());
        } else {
            body.put_i32(SUPPORTED_APIS.len() as i32);
        }

        for api in SUPPORTED_APIS {
            body.put_i16(api.api_key);
            body.put_i16(api.min_version);
            body.put_i16(api.max_version);
            if flexible {
                body.write_tag_buffer(&TagBuffer::EMPTY);
            }
        }

        // throttle_time_ms arrived in v1
        if api_version >= 1 {
            body.put_i32(0);
        }
        if flexible {
            body.write_tag_buffer(&TagBuffer::EMPTY);
        }

        debug!(correlation_id, api_version, len = body.len(), "ApiVersions response built");
        body.freeze()
    }

    /// Bare error response: correlation_id and error_code, nothing else.
    pub fn build_error_response(correlation_id: i32, error_code: KafkaErrorCode) -> Bytes {
        let mut body = BytesMut::with_capacity(6);
        body.put_i32(correlation_id);
        body.put_i16(error_code.into());
        body.freeze()
    }

    pub fn build_describe_topic_partitions_response(
        correlation_id: i32,
        topics: &[TopicDescription],
    ) -> Bytes {
        let mut body = BytesMut::new();

        body.put_i32(correlation_id);
        body.write_tag_buffer(&TagBuffer::EMPTY);

        // throttle_time_ms
        body.put_i32(0);

        body.write_compact_array_len(topics.len());
        for topic in topics {
            body.put_i16(topic.error_code.into());
            body.write_compact_nullable_string(Some(topic.name.as_str()));
            body.write_uuid(&topic.topic_id);
            body.write_bool(topic.is_internal);

            body.write_compact_array_len(topic.partitions.len());
            for partition in &topic.partitions {
                Self::put_partition(&mut body, partition);
            }

            body.put_i32(topic.topic_authorized_operations);
            body.write_tag_buffer(&TagBuffer::EMPTY);
        }

        // next_cursor: null
        body.put_u8(0xff);
        body.write_tag_buffer(&TagBuffer::EMPTY);

        debug!(correlation_id, topics = topics.len(), len = body.len(), "DescribeTopicPartitions response built");
        body.freeze()
    }

    fn put_partition(body: &mut BytesMut, partition: &PartitionDescription) {
        body.put_i16(partition.error_code.into());
        body.put_i32(partition.partition_index);
        body.put_i32(partition.leader_id);
        body.put_i32(partition.leader_epoch);
        for nodes in [
            &partition.replica_nodes,
            &partition.isr_nodes,
            &partition.eligible_leader_replicas,
            &partition.last_known_elr,
            &partition.offline_replicas,
        ] {
            body.write_compact_array_len(nodes.len());
            for node in nodes {
                body.put_i32(*node);
            }
        }
        body.write_tag_buffer(&TagBuffer::EMPTY);
    }
}
