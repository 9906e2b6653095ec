//! One connected peer: identity, outbound queue, and the two pumps.
//!
//! [`Client::run`] registers the client with the [`Hub`], then drives an
//! outbound pump (queue → socket, plus heartbeat pings) on its own task
//! and an inbound pump (socket → liveness bookkeeping) on the calling
//! task. Whichever side fails first moves the shared [`Lifecycle`] to
//! `Draining`, asks the hub to unregister the client, and the other side
//! follows. The client is `Closed` once both pumps have exited.

use std::fmt::Display;
use std::time::Duration;

use axum::extract::ws::Message;
use futures_util::{Sink, Stream};
use tokio::time::{Instant, MissedTickBehavior};

use super::connection::{
    Connection, ConnectionError, ConnectionReader, ConnectionWriter, Inbound,
};
use super::lifecycle::{ClientState, Lifecycle};
use crate::config::LivenessConfig;
use crate::domain::{ClientId, Identity};
use crate::hub::{ClientHandle, ClientQueue, Hub};

/// A connected peer that has not started running yet.
#[derive(Debug)]
pub struct Client<S, R> {
    id: ClientId,
    identity: Identity,
    connection: Connection<S, R>,
    liveness: LivenessConfig,
    queue_capacity: usize,
    lifecycle: Lifecycle,
}

impl<S, R, E> Client<S, R>
where
    S: Sink<Message> + Unpin + Send + 'static,
    S::Error: Display + Send,
    R: Stream<Item = Result<Message, E>> + Unpin + Send + 'static,
    E: Display + Send,
{
    /// Binds an identity to a live connection with a fresh [`ClientId`].
    #[must_use]
    pub fn new(
        identity: Identity,
        connection: Connection<S, R>,
        liveness: LivenessConfig,
        queue_capacity: usize,
    ) -> Self {
        Self {
            id: ClientId::new(),
            identity,
            connection,
            liveness,
            queue_capacity,
            lifecycle: Lifecycle::new(),
        }
    }

    /// Returns the client identifier.
    #[must_use]
    pub const fn id(&self) -> ClientId {
        self.id
    }

    /// Returns a handle for observing this client's state.
    #[must_use]
    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle.clone()
    }

    /// Registers with the hub and runs both pumps until the client closes.
    pub async fn run(self, hub: Hub) {
        let Self {
            id,
            identity,
            connection,
            liveness,
            queue_capacity,
            lifecycle,
        } = self;

        let (handle, queue) =
            ClientHandle::with_lifecycle(id, identity.clone(), queue_capacity, lifecycle.clone());
        hub.register(handle).await;
        lifecycle.advance(ClientState::Active);

        let (writer, reader) = connection.split();
        let outbound = tokio::spawn(outbound_pump(
            id,
            writer,
            queue,
            hub.clone(),
            lifecycle.clone(),
            liveness.heartbeat_interval,
        ));
        inbound_pump(id, reader, hub, lifecycle.clone()).await;

        if let Err(err) = outbound.await {
            tracing::error!(client_id = %id, error = %err, "outbound pump panicked");
        }
        lifecycle.advance(ClientState::Closed);
        tracing::debug!(
            client_id = %id,
            user_id = identity.user_id,
            "client closed"
        );
    }
}

/// Drains the outbound queue into the socket and pings on a fixed interval.
async fn outbound_pump<S>(
    id: ClientId,
    mut writer: ConnectionWriter<S>,
    mut queue: ClientQueue,
    hub: Hub,
    lifecycle: Lifecycle,
    heartbeat: Duration,
) where
    S: Sink<Message> + Unpin,
    S::Error: Display,
{
    let mut ticker = tokio::time::interval_at(Instant::now() + heartbeat, heartbeat);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let outcome: Result<(), ConnectionError> = loop {
        tokio::select! {
            biased;
            // Checked first so an evicted client stops before its backlog.
            _ = lifecycle.reached(ClientState::Draining) => break Ok(()),
            next = queue.recv() => match next {
                Some(message) => {
                    if let Err(err) = writer.send_message(&message).await {
                        break Err(err);
                    }
                    tracing::trace!(client_id = %id, event_type = %message.event_type, "frame written");
                }
                // The hub dropped our handle: we have been unregistered.
                None => break Ok(()),
            },
            _ = ticker.tick() => {
                if let Err(err) = writer.send_ping().await {
                    break Err(err);
                }
            }
        }
    };

    lifecycle.advance(ClientState::Draining);
    if let Err(err) = outcome {
        tracing::debug!(client_id = %id, error = %err, "write failed; disconnecting");
        hub.unregister(id).await;
    }
    writer.close().await;
}

/// Reads control frames and enforces the read deadline.
async fn inbound_pump<R, E>(
    id: ClientId,
    mut reader: ConnectionReader<R>,
    hub: Hub,
    lifecycle: Lifecycle,
) where
    R: Stream<Item = Result<Message, E>> + Unpin,
    E: Display,
{
    let err = loop {
        tokio::select! {
            frame = reader.next_frame() => match frame {
                Ok(Inbound::Pong) => reader.extend_deadline(),
                Ok(Inbound::Ping) => {}
                Ok(Inbound::Data(len)) => {
                    tracing::debug!(client_id = %id, len, "ignoring inbound data frame");
                }
                Ok(Inbound::Close) => break ConnectionError::Closed,
                Err(err) => break err,
            },
            // The outbound side is already tearing down.
            _ = lifecycle.reached(ClientState::Draining) => return,
        }
    };

    match &err {
        ConnectionError::Timeout(window) => {
            tracing::info!(client_id = %id, window = ?window, "liveness deadline missed");
        }
        ConnectionError::Closed => tracing::debug!(client_id = %id, "peer closed connection"),
        other => tracing::debug!(client_id = %id, error = %other, "read failed"),
    }
    lifecycle.advance(ClientState::Draining);
    hub.unregister(id).await;
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::{EventType, HubMessage, Scope};
    use axum::body::Bytes;
    use futures::StreamExt;
    use futures::channel::mpsc;

    type Written = mpsc::UnboundedReceiver<Message>;
    type Peer = mpsc::UnboundedSender<Result<Message, axum::Error>>;

    fn liveness() -> LivenessConfig {
        LivenessConfig {
            heartbeat_interval: Duration::from_secs(10),
            read_deadline: Duration::from_secs(15),
            write_timeout: Duration::from_secs(1),
        }
    }

    /// Starts a client over in-memory channels and waits until it is active.
    async fn start(hub: &Hub, capacity: usize) -> (ClientId, Lifecycle, Written, Peer) {
        let (sink, written) = mpsc::unbounded();
        let (peer, stream) = mpsc::unbounded();
        let connection = Connection::new(sink, stream, liveness());
        let client = Client::new(Identity::new(1, "user"), connection, liveness(), capacity);
        let id = client.id();
        let lifecycle = client.lifecycle();
        tokio::spawn(client.run(hub.clone()));
        lifecycle.reached(ClientState::Active).await;
        (id, lifecycle, written, peer)
    }

    async fn total(hub: &Hub) -> usize {
        let Ok(stats) = hub.stats().await else {
            panic!("hub unavailable");
        };
        stats.total_clients
    }

    async fn next_text(written: &mut Written) -> serde_json::Value {
        loop {
            match written.next().await {
                Some(Message::Text(text)) => {
                    let Ok(value) = serde_json::from_str(text.as_str()) else {
                        panic!("frame is not JSON");
                    };
                    return value;
                }
                Some(_) => continue,
                None => panic!("connection closed before a text frame arrived"),
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn silent_peer_is_dropped_at_deadline_not_before() {
        let (hub, _task) = Hub::spawn(16);
        let (_id, lifecycle, _written, _peer) = start(&hub, 8).await;

        tokio::time::sleep(Duration::from_secs(14)).await;
        assert_eq!(lifecycle.state(), ClientState::Active);
        assert_eq!(total(&hub).await, 1);

        let closed =
            tokio::time::timeout(Duration::from_secs(2), lifecycle.reached(ClientState::Closed))
                .await;
        assert_eq!(closed.ok(), Some(ClientState::Closed));
        assert_eq!(total(&hub).await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn answering_pings_keeps_client_alive() {
        let (hub, _task) = Hub::spawn(16);
        let (_id, lifecycle, mut written, peer) = start(&hub, 8).await;

        let responder = tokio::spawn(async move {
            let mut pings = 0;
            while let Some(frame) = written.next().await {
                if matches!(frame, Message::Ping(_)) {
                    pings += 1;
                    if peer.unbounded_send(Ok(Message::Pong(Bytes::new()))).is_err() {
                        break;
                    }
                }
            }
            pings
        });

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(lifecycle.state(), ClientState::Active);
        assert_eq!(total(&hub).await, 1);

        hub.shutdown().await;
        lifecycle.reached(ClientState::Closed).await;
        let Ok(pings) = responder.await else {
            panic!("responder panicked");
        };
        assert!(pings >= 5);
    }

    #[tokio::test]
    async fn queued_messages_arrive_in_order() {
        let (hub, _task) = Hub::spawn(16);
        let (_id, _lifecycle, mut written, _peer) = start(&hub, 8).await;

        let welcome = next_text(&mut written).await;
        assert_eq!(welcome["type"], "connection_established");
        assert_eq!(welcome["data"]["user_id"], 1);

        for n in 0..3 {
            hub.broadcast(
                HubMessage::new(EventType::USER_UPDATED, serde_json::json!({"n": n})),
                Scope::ToUser(1),
            )
            .await;
        }
        for n in 0..3 {
            let frame = next_text(&mut written).await;
            assert_eq!(frame["type"], "user_updated");
            assert_eq!(frame["data"]["n"], n);
        }
    }

    #[tokio::test]
    async fn hub_unregister_closes_connection() {
        let (hub, _task) = Hub::spawn(16);
        let (id, lifecycle, mut written, _peer) = start(&hub, 8).await;

        hub.unregister(id).await;
        assert_eq!(lifecycle.reached(ClientState::Closed).await, ClientState::Closed);

        let mut saw_close = false;
        while let Some(frame) = written.next().await {
            if matches!(frame, Message::Close(_)) {
                saw_close = true;
            }
        }
        assert!(saw_close);
    }

    #[tokio::test]
    async fn peer_close_unregisters_client() {
        let (hub, _task) = Hub::spawn(16);
        let (_id, lifecycle, _written, peer) = start(&hub, 8).await;

        assert!(peer.unbounded_send(Ok(Message::Close(None))).is_ok());
        lifecycle.reached(ClientState::Closed).await;
        assert_eq!(total(&hub).await, 0);
    }

    #[tokio::test]
    async fn write_failure_unregisters_client() {
        let (hub, _task) = Hub::spawn(16);
        let (_id, lifecycle, written, _peer) = start(&hub, 8).await;
        drop(written);

        hub.broadcast(
            HubMessage::new(EventType::SYSTEM_ALERT, serde_json::json!({})),
            Scope::Broadcast,
        )
        .await;
        lifecycle.reached(ClientState::Closed).await;
        assert_eq!(total(&hub).await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn full_queue_eviction_stops_client_without_flushing() {
        let (hub, _task) = Hub::spawn(16);
        // Zero-buffer sink: the first frame is accepted, every later write
        // waits until the peer reads.
        let (sink, mut written) = mpsc::channel(0);
        let (_peer, stream) = mpsc::unbounded::<Result<Message, axum::Error>>();
        let liveness = LivenessConfig {
            write_timeout: Duration::from_secs(30),
            ..liveness()
        };
        let connection = Connection::new(sink, stream, liveness);
        let client = Client::new(Identity::new(1, "user"), connection, liveness, 2);
        let lifecycle = client.lifecycle();
        tokio::spawn(client.run(hub.clone()));
        lifecycle.reached(ClientState::Active).await;

        let mut queued = 0;
        let mut evicted = false;
        for n in 0..8 {
            let message = HubMessage::new(EventType::USER_UPDATED, serde_json::json!({"n": n}));
            let Ok(delivery) = hub.broadcast_confirmed(message, Scope::Broadcast).await else {
                panic!("hub unavailable");
            };
            queued += delivery.delivered;
            if !delivery.evicted.is_empty() {
                evicted = true;
                break;
            }
        }
        assert!(evicted);
        assert!(lifecycle.state() >= ClientState::Draining);
        assert_eq!(total(&hub).await, 0);

        let mut broadcasts_written = 0;
        let mut saw_close = false;
        while let Some(frame) = written.next().await {
            match frame {
                Message::Text(text) if text.as_str().contains("user_updated") => {
                    broadcasts_written += 1;
                }
                Message::Close(_) => saw_close = true,
                _ => {}
            }
        }
        // At most the write already in flight when the hub evicted us.
        assert!(broadcasts_written <= 1);
        assert!(broadcasts_written < queued);
        assert!(saw_close);
        assert_eq!(lifecycle.reached(ClientState::Closed).await, ClientState::Closed);
    }

    #[tokio::test]
    async fn read_error_unregisters_client() {
        let (hub, _task) = Hub::spawn(16);
        let (_id, lifecycle, _written, peer) = start(&hub, 8).await;

        assert!(peer.unbounded_send(Err(axum::Error::new("reset by peer"))).is_ok());
        lifecycle.reached(ClientState::Closed).await;
        assert_eq!(total(&hub).await, 0);
    }
}
