//! Topic name to topic id resolution from the KRaft cluster metadata log.

use std::collections::HashMap;
use std::path::PathBuf;

use bytes::Bytes;
use tokio::sync::OnceCell;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::{
    constants::METADATA_RECORD_TYPE_TOPIC,
    protocol::primitives::{DecodeError, KafkaBuf},
    storage::log::{read_batches, LogSegment},
};

/// The part of a metadata record value this broker understands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetadataRecord {
    Topic { name: String, topic_id: Uuid },
    Other { record_type: i8 },
}

impl MetadataRecord {
    // frame_version (int8), record_type (int8), version (int8), then the typed payload
    pub fn decode(value: &mut Bytes) -> Result<Self, DecodeError> {
        let _frame_version = value.read_i8()?;
        let record_type = value.read_i8()?;
        let _version = value.read_i8()?;

        match record_type {
            METADATA_RECORD_TYPE_TOPIC => {
                let name = value.read_compact_string()?;
                let topic_id = value.read_uuid()?;
                Ok(MetadataRecord::Topic { name, topic_id })
            }
            other => Ok(MetadataRecord::Other { record_type: other }),
        }
    }
}

/// Builds the topic index from raw log contents. Later records for the same
/// name replace earlier ones.
pub fn index_topics(data: Bytes) -> HashMap<String, Uuid> {
    let mut topics = HashMap::new();

    for batch in read_batches(data) {
        for record in batch.records {
            let Some(mut value) = record.value else {
                continue;
            };
            match MetadataRecord::decode(&mut value) {
                Ok(MetadataRecord::Topic { name, topic_id }) => {
                    debug!(topic = %name, %topic_id, "indexed topic");
                    topics.insert(name, topic_id);
                }
                Ok(MetadataRecord::Other { .. }) => {}
                Err(e) => debug!(base_offset = batch.base_offset, error = %e, "skipping metadata record"),
            }
        }
    }

    topics
}

/// Resolves topic names against the metadata log.
///
/// The log is scanned once, on the first lookup, and the index is shared
/// read-only afterwards. A missing or unreadable log means no topics exist.
#[derive(Debug)]
pub struct MetadataResolver {
    path: Option<PathBuf>,
    topics: OnceCell<HashMap<String, Uuid>>,
}

impl MetadataResolver {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        MetadataResolver {
            path: Some(path.into()),
            topics: OnceCell::new(),
        }
    }

    /// A resolver over a fixed index, with no backing file.
    pub fn from_topics(topics: HashMap<String, Uuid>) -> Self {
        MetadataResolver {
            path: None,
            topics: OnceCell::from(topics),
        }
    }

    pub async fn topics(&self) -> &HashMap<String, Uuid> {
        self.topics.get_or_init(|| self.load()).await
    }

    pub async fn topic_id(&self, name: &str) -> Option<Uuid> {
        self.topics().await.get(name).copied()
    }

    async fn load(&self) -> HashMap<String, Uuid> {
        let Some(path) = self.path.as_deref() else {
            return HashMap::new();
        };

        let segment_path = path.to_path_buf();
        let read = tokio::task::spawn_blocking(move || LogSegment::open(&segment_path)?.read_all()).await;

        match read {
            Ok(Ok(data)) => {
                let topics = index_topics(data);
                info!(path = %path.display(), topics = topics.len(), "loaded cluster metadata");
                topics
            }
            Ok(Err(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                info!(path = %path.display(), "no cluster metadata log, no topics known");
                HashMap::new()
            }
            Ok(Err(e)) => {
                warn!(path = %path.display(), error = %e, "failed to read cluster metadata log");
                HashMap::new()
            }
            Err(e) => {
                error!(error = %e, "metadata log reader task failed");
                HashMap::new()
            }
        }
    }
}
