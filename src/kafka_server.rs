use std::net::SocketAddr;
use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::{lookup_host, TcpListener, TcpSocket};
use tokio::task;
use tracing::{debug, error, info, warn, Instrument};

use crate::{
    config::BrokerConfig,
    error::Result,
    message::FrameCodec,
    network::KafkaProtocolHandler,
    protocol::RequestHeader,
    storage::MetadataResolver,
};

const LISTEN_BACKLOG: u32 = 1024;

pub struct KafkaServer {
    listener: TcpListener,
    handler: Arc<KafkaProtocolHandler>,
    max_message_size: usize,
}

impl KafkaServer {
    /// Binds the listening socket with `SO_REUSEADDR` so restarts don't fail to bind.
    pub async fn bind(config: &BrokerConfig) -> std::io::Result<Self> {
        let addr = lookup_host(&config.listen_address)
            .await?
            .next()
            .ok_or_else(|| {
                std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    format!("no address for {}", config.listen_address),
                )
            })?;

        let socket = match addr {
            SocketAddr::V4(_) => TcpSocket::new_v4()?,
            SocketAddr::V6(_) => TcpSocket::new_v6()?,
        };
        socket.set_reuseaddr(true)?;
        socket.bind(addr)?;
        let listener = socket.listen(LISTEN_BACKLOG)?;
        info!(address = %listener.local_addr()?, "Server bound");

        let resolver = Arc::new(MetadataResolver::new(config.metadata_log_path.clone()));
        Ok(KafkaServer {
            listener,
            handler: Arc::new(KafkaProtocolHandler::new(resolver)),
            max_message_size: config.max_message_size,
        })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accepts connections forever, one task per client.
    pub async fn run(self) -> std::io::Result<()> {
        info!(address = %self.listener.local_addr()?, "Starting Kafka server");

        loop {
            let (stream, peer) = match self.listener.accept().await {
                Ok(accepted) => accepted,
                Err(e) => {
                    error!(error = %e, "accept failed");
                    continue;
                }
            };
            info!(%peer, "New client connected");

            let handler = Arc::clone(&self.handler);
            let max_message_size = self.max_message_size;
            task::spawn(
                async move {
                    // the stream is dropped, and the socket closed, on every return path
                    if let Err(e) = handle_client(&handler, stream, max_message_size).await {
                        warn!(error = %e, "Connection closed on error");
                    }
                }
                .instrument(tracing::info_span!("connection", %peer)),
            );
        }
    }
}

// multiple requests from a single client connection, strictly one at a time
pub async fn handle_client<S>(
    handler: &KafkaProtocolHandler,
    mut stream: S,
    max_message_size: usize,
) -> Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    loop {
        let Some(mut frame) = FrameCodec::read_frame(&mut stream, max_message_size).await? else {
            info!("Client disconnected");
            return Ok(());
        };

        let header = RequestHeader::parse(&mut frame)?;
        debug!(
            api_key = header.api_key,
            api_version = header.api_version,
            correlation_id = header.correlation_id,
            client_id = header.client_id.as_deref().unwrap_or(""),
            "Processing request"
        );

        let response = handler.process_request(&header, frame).await?;
        FrameCodec::write_frame(&mut stream, &response).await?;
        debug!(correlation_id = header.correlation_id, len = response.len(), "Response sent");
    }
}
