use crate::types::{RealtimeError, Result};
use futures::future::BoxFuture;
use futures::stream::StreamExt;
use futures::{FutureExt, Sink, SinkExt, Stream};
use std::pin::Pin;
use tokio_tungstenite::tungstenite::Message;
use url::Url;

/// Write half of an established connection
pub type FrameSink = Pin<Box<dyn Sink<Message, Error = RealtimeError> + Send>>;

/// Read half of an established connection
pub type FrameStream = Pin<Box<dyn Stream<Item = Result<Message>> + Send>>;

/// An established bidirectional connection, already split.
pub struct Transport {
    pub sink: FrameSink,
    pub stream: FrameStream,
}

impl Transport {
    pub fn new(sink: FrameSink, stream: FrameStream) -> Self {
        Self { sink, stream }
    }
}

/// Opens transport-level connections for the connection manager.
pub trait Connector: Send + Sync + 'static {
    fn connect(&self, endpoint: &Url) -> BoxFuture<'static, Result<Transport>>;
}

/// WebSocket factory backed by tokio-tungstenite
#[derive(Debug, Clone, Copy, Default)]
pub struct WebSocketConnector;

impl Connector for WebSocketConnector {
    fn connect(&self, endpoint: &Url) -> BoxFuture<'static, Result<Transport>> {
        connect_websocket(endpoint.to_string()).boxed()
    }
}

async fn connect_websocket(url: String) -> Result<Transport> {
    tracing::debug!("Creating WebSocket connection to: {}", url);
    let (ws_stream, response) = tokio_tungstenite::connect_async(url.as_str()).await?;
    tracing::debug!("WebSocket handshake completed: {}", response.status());

    let (write_half, read_half) = ws_stream.split();
    let sink: FrameSink = Box::pin(write_half.sink_map_err(RealtimeError::from));
    let stream: FrameStream = Box::pin(read_half.map(|frame| frame.map_err(RealtimeError::from)));

    Ok(Transport::new(sink, stream))
}
