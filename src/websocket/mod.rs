// Transport layer - connection factory behind a trait seam
mod factory;

#[cfg(test)]
pub(crate) mod mock;

pub use factory::{Connector, FrameSink, FrameStream, Transport, WebSocketConnector};
