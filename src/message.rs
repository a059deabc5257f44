use bytes::Bytes;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::{
    constants::FRAME_HEADER_SIZE,
    error::{Result, ServerError},
};

// kafka messages have 2 parts on the wire: message_size and payload
// message_size: 32-bit signed big-endian integer, the size of the payload only
pub struct FrameCodec;

impl FrameCodec {
    fn validate_message_size(size: i32, max_message_size: usize) -> Result<usize> {
        if size <= 0 || size as usize > max_message_size {
            return Err(ServerError::InvalidMessageSize {
                size,
                max: max_message_size,
            });
        }
        Ok(size as usize)
    }

    /// Reads one length-prefixed frame and returns its payload.
    ///
    /// Returns `Ok(None)` when the peer closes the stream between frames.
    pub async fn read_frame<R>(reader: &mut R, max_message_size: usize) -> Result<Option<Bytes>>
    where
        R: AsyncRead + Unpin,
    {
        let mut size_buffer = [0u8; FRAME_HEADER_SIZE];
        match reader.read_exact(&mut size_buffer).await {
            Ok(_) => {}
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
            Err(e) => return Err(e.into()),
        }

        let expected = Self::validate_message_size(i32::from_be_bytes(size_buffer), max_message_size)?;

        let mut payload = vec![0u8; expected];
        let mut received = 0;
        while received < expected {
            let n = reader.read(&mut payload[received..]).await?;
            if n == 0 {
                return Err(ServerError::IncompleteFrame { expected, received });
            }
            received += n;
        }

        Ok(Some(Bytes::from(payload)))
    }

    /// Writes `payload` behind its length prefix and flushes.
    pub async fn write_frame<W>(writer: &mut W, payload: &[u8]) -> Result<()>
    where
        W: AsyncWrite + Unpin,
    {
        writer.write_all(&(payload.len() as i32).to_be_bytes()).await?;
        writer.write_all(payload).await?;
        writer.flush().await?;
        Ok(())
    }
}
