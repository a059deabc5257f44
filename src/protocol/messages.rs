//! Request and response bodies for the APIs in the registry.

use bytes::Bytes;
use uuid::Uuid;

use crate::{
    constants::DEFAULT_TOPIC_AUTHORIZED_OPERATIONS,
    error::KafkaErrorCode,
    protocol::primitives::{DecodeError, KafkaBuf, TagBuffer},
};

/// Pagination cursor of DescribeTopicPartitions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicPartitionCursor {
    pub topic_name: String,
    pub partition_index: i32,
}

// DescribeTopicPartitions Request (Version: 0) =>
//   [topics] response_partition_limit cursor TAG_BUFFER
//   topics => name TAG_BUFFER
//   cursor => topic_name partition_index TAG_BUFFER
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DescribeTopicPartitionsRequest {
    pub topics: Vec<String>,
    pub response_partition_limit: i32,
    pub cursor: Option<TopicPartitionCursor>,
    pub tagged_fields: TagBuffer,
}

impl DescribeTopicPartitionsRequest {
    pub fn decode(body: &mut Bytes) -> Result<Self, DecodeError> {
        let count = body.read_compact_array_len()?.unwrap_or(0);
        let mut topics = Vec::new();
        for _ in 0..count {
            topics.push(body.read_compact_string()?);
            body.read_tag_buffer()?;
        }

        let response_partition_limit = body.read_i32()?;

        // nullable struct: 0xff marks null
        let cursor = match body.read_i8()? {
            -1 => None,
            _ => {
                let topic_name = body.read_compact_string()?;
                let partition_index = body.read_i32()?;
                body.read_tag_buffer()?;
                Some(TopicPartitionCursor {
                    topic_name,
                    partition_index,
                })
            }
        };

        let tagged_fields = body.read_tag_buffer()?;

        Ok(DescribeTopicPartitionsRequest {
            topics,
            response_partition_limit,
            cursor,
            tagged_fields,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionDescription {
    pub error_code: KafkaErrorCode,
    pub partition_index: i32,
    pub leader_id: i32,
    pub leader_epoch: i32,
    pub replica_nodes: Vec<i32>,
    pub isr_nodes: Vec<i32>,
    pub eligible_leader_replicas: Vec<i32>,
    pub last_known_elr: Vec<i32>,
    pub offline_replicas: Vec<i32>,
}

impl PartitionDescription {
    /// Placeholder partition for a topic that exists: index 0, leader 0, no replicas.
    pub fn synthetic() -> Self {
        PartitionDescription {
            error_code: KafkaErrorCode::None,
            partition_index: 0,
            leader_id: 0,
            leader_epoch: 0,
            replica_nodes: Vec::new(),
            isr_nodes: Vec::new(),
            eligible_leader_replicas: Vec::new(),
            last_known_elr: Vec::new(),
            offline_replicas: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicDescription {
    pub error_code: KafkaErrorCode,
    pub name: String,
    pub topic_id: Uuid,
    pub is_internal: bool,
    pub partitions: Vec<PartitionDescription>,
    pub topic_authorized_operations: i32,
}

impl TopicDescription {
    pub fn known(name: String, topic_id: Uuid) -> Self {
        TopicDescription {
            error_code: KafkaErrorCode::None,
            name,
            topic_id,
            is_internal: false,
            partitions: vec![PartitionDescription::synthetic()],
            topic_authorized_operations: DEFAULT_TOPIC_AUTHORIZED_OPERATIONS,
        }
    }

    pub fn unknown(name: String) -> Self {
        TopicDescription {
            error_code: KafkaErrorCode::UnknownTopicOrPartition,
            name,
            topic_id: Uuid::nil(),
            is_internal: false,
            partitions: Vec::new(),
            topic_authorized_operations: DEFAULT_TOPIC_AUTHORIZED_OPERATIONS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::primitives::KafkaBufMut;
    use bytes::{BufMut, BytesMut};

    #[test]
    fn decodes_single_topic_request() {
        let mut body = BytesMut::new();
        body.write_compact_array_len(1);
        body.write_compact_string("saz");
        body.write_tag_buffer(&TagBuffer::EMPTY);
        body.put_i32(100);
        body.put_u8(0xff);
        body.write_tag_buffer(&TagBuffer::EMPTY);

        let request = DescribeTopicPartitionsRequest::decode(&mut body.freeze()).unwrap();
        assert_eq!(request.topics, vec!["saz".to_string()]);
        assert_eq!(request.response_partition_limit, 100);
        assert_eq!(request.cursor, None);
    }

    #[test]
    fn decodes_cursor() {
        let mut body = BytesMut::new();
        body.write_compact_array_len(2);
        body.write_compact_string("a");
        body.write_tag_buffer(&TagBuffer::EMPTY);
        body.write_compact_string("b");
        body.write_tag_buffer(&TagBuffer::EMPTY);
        body.put_i32(1);
        body.put_u8(0x01);
        body.write_compact_string("b");
        body.put_i32(3);
        body.write_tag_buffer(&TagBuffer::EMPTY);
        body.write_tag_buffer(&TagBuffer::EMPTY);

        let request = DescribeTopicPartitionsRequest::decode(&mut body.freeze()).unwrap();
        assert_eq!(request.topics, vec!["a".to_string(), "b".to_string()]);
        assert_eq!(
            request.cursor,
            Some(TopicPartitionCursor {
                topic_name: "b".to_string(),
                partition_index: 3,
            })
        );
    }

    #[test]
    fn truncated_body_fails() {
        let mut body = BytesMut::new();
        body.write_compact_array_len(1);
        body.write_compact_string("saz");
        let result = DescribeTopicPartitionsRequest::decode(&mut body.freeze());
        assert!(matches!(result, Err(DecodeError::Truncated { .. })));
    }

    #[test]
    fn unknown_topic_has_nil_id_and_no_partitions() {
        let topic = TopicDescription::unknown("missing".to_string());
        assert_eq!(topic.error_code, KafkaErrorCode::UnknownTopicOrPartition);
        assert!(topic.topic_id.is_nil());
        assert!(topic.partitions.is_empty());
    }
}
