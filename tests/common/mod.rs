//! Shared helpers: a live broker on an ephemeral port, a minimal client,
//! and a writer for KRaft metadata log fixtures.
#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::Path;

use bytes::{BufMut, Bytes, BytesMut};
use rafka_lite::message::FrameCodec;
use rafka_lite::protocol::{KafkaBufMut, TagBuffer};
use rafka_lite::{BrokerConfig, KafkaServer};
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use uuid::Uuid;

pub const MAX_FRAME: usize = 1024 * 1024;

pub async fn start_broker(metadata_log_path: &Path) -> SocketAddr {
    let config = BrokerConfig {
        listen_address: "127.0.0.1:0".to_string(),
        metadata_log_path: metadata_log_path.to_path_buf(),
        ..BrokerConfig::default()
    };
    let server = KafkaServer::bind(&config).await.unwrap();
    let addr = server.local_addr().unwrap();
    tokio::spawn(server.run());
    addr
}

pub struct TestClient {
    stream: TcpStream,
}

impl TestClient {
    pub async fn connect(addr: SocketAddr) -> Self {
        TestClient {
            stream: TcpStream::connect(addr).await.unwrap(),
        }
    }

    pub async fn send_raw(&mut self, payload: &[u8]) {
        FrameCodec::write_frame(&mut self.stream, payload).await.unwrap();
    }

    /// Writes bytes as-is, without a length prefix.
    pub async fn write_unframed(&mut self, bytes: &[u8]) {
        self.stream.write_all(bytes).await.unwrap();
    }

    pub async fn receive(&mut self) -> Option<Bytes> {
        FrameCodec::read_frame(&mut self.stream, MAX_FRAME).await.unwrap()
    }

    pub async fn round_trip(&mut self, payload: &[u8]) -> Bytes {
        self.send_raw(payload).await;
        self.receive().await.expect("broker closed the connection")
    }
}

fn flexible_header(api_key: i16, api_version: i16, correlation_id: i32) -> BytesMut {
    let mut buf = BytesMut::new();
    buf.put_i16(api_key);
    buf.put_i16(api_version);
    buf.put_i32(correlation_id);
    buf.write_nullable_string(Some("kafka-tester"));
    buf.write_tag_buffer(&TagBuffer::EMPTY);
    buf
}

pub fn api_versions_request(api_version: i16, correlation_id: i32) -> Bytes {
    let mut buf = BytesMut::new();
    buf.put_i16(18);
    buf.put_i16(api_version);
    buf.put_i32(correlation_id);
    buf.write_nullable_string(Some("kafka-tester"));
    if api_version >= 3 {
        buf.write_tag_buffer(&TagBuffer::EMPTY);
        buf.write_compact_string("kafka-cli");
        buf.write_compact_string("0.1");
        buf.write_tag_buffer(&TagBuffer::EMPTY);
    }
    buf.freeze()
}

pub fn describe_topic_partitions_request(correlation_id: i32, topics: &[&str]) -> Bytes {
    let mut buf = flexible_header(75, 0, correlation_id);
    buf.write_compact_array_len(topics.len());
    for topic in topics {
        buf.write_compact_string(topic);
        buf.write_tag_buffer(&TagBuffer::EMPTY);
    }
    buf.put_i32(100);
    buf.put_u8(0xff);
    buf.write_tag_buffer(&TagBuffer::EMPTY);
    buf.freeze()
}

fn record(value: &[u8]) -> Bytes {
    let mut body = BytesMut::new();
    body.put_i8(0);
    body.write_varlong(0);
    body.write_varint(0);
    body.write_varint(-1);
    body.write_varint(value.len() as i32);
    body.put_slice(value);
    body.write_varint(0);

    let mut framed = BytesMut::new();
    framed.write_varint(body.len() as i32);
    framed.put_slice(&body);
    framed.freeze()
}

fn batch(base_offset: i64, records: &[Bytes]) -> Bytes {
    let mut body = BytesMut::new();
    body.put_i32(1);
    body.put_i8(2);
    body.put_u32(0);
    body.put_i16(0);
    body.put_i32(records.len() as i32 - 1);
    body.put_i64(0);
    body.put_i64(0);
    body.put_i64(-1);
    body.put_i16(-1);
    body.put_i32(-1);
    body.put_i32(records.len() as i32);
    for record in records {
        body.put_slice(record);
    }

    let mut out = BytesMut::new();
    out.put_i64(base_offset);
    out.put_i32(body.len() as i32);
    out.put_slice(&body);
    out.freeze()
}

fn feature_level_record() -> Bytes {
    let mut value = BytesMut::new();
    value.put_i8(1);
    value.put_i8(12);
    value.put_i8(0);
    value.write_compact_string("metadata.version");
    value.put_i16(20);
    value.write_unsigned_varint(0);
    record(&value)
}

fn topic_record(name: &str, topic_id: Uuid) -> Bytes {
    let mut value = BytesMut::new();
    value.put_i8(1);
    value.put_i8(2);
    value.put_i8(0);
    value.write_compact_string(name);
    value.write_uuid(&topic_id);
    value.write_unsigned_varint(0);
    record(&value)
}

/// A metadata log with a feature-level batch followed by one batch of topic records.
pub fn metadata_log(topics: &[(&str, Uuid)]) -> Bytes {
    let records: Vec<Bytes> = topics.iter().map(|(name, id)| topic_record(name, *id)).collect();
    let mut out = BytesMut::new();
    out.put_slice(&batch(0, &[feature_level_record()]));
    out.put_slice(&batch(1, &records));
    out.freeze()
}
