//! Low-level duplex transport for one client.
//!
//! A [`Connection`] pairs a frame sink with a frame stream and is split
//! into a [`ConnectionWriter`] (owned by the outbound pump) and a
//! [`ConnectionReader`] (owned by the inbound pump). The writer bounds
//! every write by a timeout; the reader enforces a read deadline that
//! only a pong can push back.
//!
//! Both halves are generic over the transport so the pumps can run over
//! an axum [`WebSocket`] in production and over in-memory channels in
//! tests.

use std::fmt::Display;
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::ws::{Message, WebSocket};
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{Sink, SinkExt, Stream, StreamExt};
use tokio::time::Instant;

use super::messages;
use crate::config::LivenessConfig;
use crate::domain::HubMessage;

/// Transport failure. Always fatal to the one client it happened on.
#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    /// A write did not finish in time, or no pong arrived before the
    /// read deadline.
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    /// The peer closed the connection or the stream ended.
    #[error("connection closed by peer")]
    Closed,

    /// The underlying transport reported an error.
    #[error("transport error: {0}")]
    Transport(String),

    /// The message could not be serialized.
    #[error("encode error: {0}")]
    Encode(#[from] serde_json::Error),
}

/// What the reader observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Inbound {
    /// Liveness acknowledgement.
    Pong,
    /// Ping from the peer; the transport answers it.
    Ping,
    /// Text or binary frame of the given length. Not used by the hub.
    Data(usize),
    /// Close frame from the peer.
    Close,
}

/// Production transport halves.
pub type WebSocketConnection = Connection<SplitSink<WebSocket, Message>, SplitStream<WebSocket>>;

/// A transport not yet split between the two pumps.
#[derive(Debug)]
pub struct Connection<S, R> {
    writer: ConnectionWriter<S>,
    reader: ConnectionReader<R>,
}

impl<S, R> Connection<S, R> {
    /// Wraps a sink/stream pair. The read deadline starts now.
    #[must_use]
    pub fn new(sink: S, stream: R, liveness: LivenessConfig) -> Self {
        Self {
            writer: ConnectionWriter {
                sink,
                write_timeout: liveness.write_timeout,
            },
            reader: ConnectionReader {
                stream,
                window: liveness.read_deadline,
                deadline: Instant::now() + liveness.read_deadline,
            },
        }
    }

    /// Separates the write half from the read half.
    #[must_use]
    pub fn split(self) -> (ConnectionWriter<S>, ConnectionReader<R>) {
        (self.writer, self.reader)
    }
}

impl WebSocketConnection {
    /// Wraps an upgraded axum WebSocket.
    #[must_use]
    pub fn from_socket(socket: WebSocket, liveness: LivenessConfig) -> Self {
        let (sink, stream) = socket.split();
        Self::new(sink, stream, liveness)
    }
}

/// Write half of a [`Connection`].
#[derive(Debug)]
pub struct ConnectionWriter<S> {
    sink: S,
    write_timeout: Duration,
}

impl<S> ConnectionWriter<S>
where
    S: Sink<Message> + Unpin,
    S::Error: Display,
{
    /// Writes one hub message as a JSON text frame.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectionError`] if encoding fails, the write errors, or
    /// it does not complete within the write timeout.
    pub async fn send_message(&mut self, message: &HubMessage) -> Result<(), ConnectionError> {
        let text = messages::encode(message)?;
        self.write(Message::text(text)).await
    }

    /// Writes a ping control frame.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectionError`] if the write errors or times out.
    pub async fn send_ping(&mut self) -> Result<(), ConnectionError> {
        self.write(Message::Ping(Bytes::new())).await
    }

    /// Sends a close frame and closes the sink, ignoring failures.
    pub async fn close(&mut self) {
        let _ = self.write(Message::Close(None)).await;
        let _ = tokio::time::timeout(self.write_timeout, self.sink.close()).await;
    }

    async fn write(&mut self, frame: Message) -> Result<(), ConnectionError> {
        match tokio::time::timeout(self.write_timeout, self.sink.send(frame)).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(err)) => Err(ConnectionError::Transport(err.to_string())),
            Err(_) => Err(ConnectionError::Timeout(self.write_timeout)),
        }
    }
}

/// Read half of a [`Connection`].
#[derive(Debug)]
pub struct ConnectionReader<R> {
    stream: R,
    window: Duration,
    deadline: Instant,
}

impl<R> ConnectionReader<R> {
    /// Pushes the read deadline to `now + window`.
    pub fn extend_deadline(&mut self) {
        self.deadline = Instant::now() + self.window;
    }

    /// Returns the instant at which the next read times out.
    #[must_use]
    pub const fn deadline(&self) -> Instant {
        self.deadline
    }
}

impl<R, E> ConnectionReader<R>
where
    R: Stream<Item = Result<Message, E>> + Unpin,
    E: Display,
{
    /// Reads the next frame, waiting no later than the read deadline.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectionError::Timeout`] when the deadline passes,
    /// [`ConnectionError::Closed`] when the stream ends, and
    /// [`ConnectionError::Transport`] on read errors.
    pub async fn next_frame(&mut self) -> Result<Inbound, ConnectionError> {
        match tokio::time::timeout_at(self.deadline, self.stream.next()).await {
            Err(_) => Err(ConnectionError::Timeout(self.window)),
            Ok(None) => Err(ConnectionError::Closed),
            Ok(Some(Err(err))) => Err(ConnectionError::Transport(err.to_string())),
            Ok(Some(Ok(frame))) => Ok(match frame {
                Message::Pong(_) => Inbound::Pong,
                Message::Ping(_) => Inbound::Ping,
                Message::Close(_) => Inbound::Close,
                Message::Text(text) => Inbound::Data(text.as_str().len()),
                Message::Binary(bytes) => Inbound::Data(bytes.len()),
            }),
        }
    }
}
