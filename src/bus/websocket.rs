//! WebSocket transport for the message bus.

use async_trait::async_trait;
use futures::{Stream, StreamExt};
use futures_util::SinkExt;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::Duration;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::{Error as WsError, Message as WsMessage};
use tracing::{debug, error, info, trace, warn};
use url::Url;

use super::{BusError, Message, MessageBus, LOG_TARGET};

/// Capacity of the incoming message broadcast channel.
const INCOMING_CAPACITY: usize = 256;
const PING_INTERVAL: Duration = Duration::from_secs(30);

/// Sender for incoming messages, taken by the reader once the connection
/// ends so that subscribers see the channel close.
pub(super) type IncomingSlot = Arc<Mutex<Option<broadcast::Sender<Message>>>>;

fn lock_slot(slot: &IncomingSlot) -> MutexGuard<'_, Option<broadcast::Sender<Message>>> {
    slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Subscribes to incoming messages. After the connection ended the returned
/// receiver is already closed.
pub(super) fn subscribe_incoming(slot: &IncomingSlot) -> broadcast::Receiver<Message> {
    match lock_slot(slot).as_ref() {
        Some(tx) => tx.subscribe(),
        None => broadcast::channel(1).1,
    }
}

/// Reads frames until the connection ends, broadcasting parsed text frames
/// and answering pings.
pub(super) async fn read_frames<S>(
    mut read: S,
    incoming: IncomingSlot,
    pong_tx: mpsc::UnboundedSender<WsMessage>,
    closed_tx: watch::Sender<bool>,
) where
    S: Stream<Item = Result<WsMessage, WsError>> + Unpin,
{
    while let Some(frame) = read.next().await {
        match frame {
            Ok(WsMessage::Text(text)) => match Message::from_json(&text) {
                Ok(msg) => {
                    trace!(target: LOG_TARGET, "Received {}", msg.msg_type);
                    if let Some(tx) = lock_slot(&incoming).as_ref() {
                        // No subscribers is normal.
                        let _ = tx.send(msg);
                    }
                }
                Err(e) => warn!(target: LOG_TARGET, "Failed to parse bus message ({}): {}", e, text),
            },
            Ok(WsMessage::Ping(data)) => {
                let _ = pong_tx.send(WsMessage::Pong(data));
            }
            Ok(WsMessage::Close(frame)) => {
                info!(target: LOG_TARGET, "Message bus closed the connection: {:?}", frame);
                break;
            }
            Ok(other) => trace!(target: LOG_TARGET, "Ignoring frame: {:?}", other),
            Err(e) => {
                error!(target: LOG_TARGET, "Message bus read error: {}", e);
                break;
            }
        }
    }
    lock_slot(&incoming).take();
    let _ = closed_tx.send(true);
    debug!(target: LOG_TARGET, "Bus reader task finished.");
}

/// Message bus client over a single websocket connection.
///
/// A reader task parses incoming text frames and broadcasts them to
/// subscribers; a writer task drains the outgoing queue and keeps the
/// connection alive with periodic pings.
pub struct WebSocketBus {
    url: String,
    outgoing_tx: mpsc::UnboundedSender<WsMessage>,
    incoming: IncomingSlot,
    closed_rx: watch::Receiver<bool>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl WebSocketBus {
    /// Builds `ws[s]://host:port/route`.
    pub fn bus_url(host: &str, port: u16, route: &str, ssl: bool) -> String {
        let scheme = if ssl { "wss" } else { "ws" };
        let route = route.trim_start_matches('/');
        format!("{}://{}:{}/{}", scheme, host, port, route)
    }

    /// Connects to the bus at `url` and starts the reader and writer tasks.
    pub async fn connect(url: &str) -> Result<Self, BusError> {
        let parsed = Url::parse(url)?;
        if parsed.scheme() != "ws" && parsed.scheme() != "wss" {
            return Err(BusError::InvalidUrl(format!("expected ws:// or wss://, got {}", url)));
        }

        debug!(target: LOG_TARGET, "Connecting to message bus at {}", url);
        let (ws_stream, _) = connect_async(parsed.as_str()).await?;
        info!(target: LOG_TARGET, "Message bus connected: {}", url);

        let (mut write, read) = ws_stream.split();
        let (outgoing_tx, mut outgoing_rx) = mpsc::unbounded_channel::<WsMessage>();
        let (incoming_tx, _) = broadcast::channel(INCOMING_CAPACITY);
        let incoming: IncomingSlot = Arc::new(Mutex::new(Some(incoming_tx)));
        let (closed_tx, closed_rx) = watch::channel(false);

        let writer = tokio::spawn(async move {
            let mut ping_interval = tokio::time::interval(PING_INTERVAL);
            ping_interval.tick().await;
            loop {
                tokio::select! {
                    maybe_msg = outgoing_rx.recv() => {
                        let Some(msg) = maybe_msg else { break };
                        let closing = matches!(msg, WsMessage::Close(_));
                        if let Err(e) = write.send(msg).await {
                            error!(target: LOG_TARGET, "Failed to write to message bus: {}", e);
                            break;
                        }
                        if closing {
                            debug!(target: LOG_TARGET, "Close frame sent.");
                            break;
                        }
                    }
                    _ = ping_interval.tick() => {
                        trace!(target: LOG_TARGET, "Sending periodic ping.");
                        if let Err(e) = write.send(WsMessage::Ping(Vec::new())).await {
                            error!(target: LOG_TARGET, "Failed to send ping: {}", e);
                            break;
                        }
                    }
                }
            }
            debug!(target: LOG_TARGET, "Bus writer task finished.");
        });

        let reader = tokio::spawn(read_frames(read, incoming.clone(), outgoing_tx.clone(), closed_tx));

        Ok(WebSocketBus {
            url: url.to_string(),
            outgoing_tx,
            incoming,
            closed_rx,
            tasks: Mutex::new(vec![writer, reader]),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn is_connected(&self) -> bool {
        !*self.closed_rx.borrow()
    }

    /// Resolves once the connection is gone.
    pub async fn closed(&self) {
        let mut rx = self.closed_rx.clone();
        while !*rx.borrow_and_update() {
            if rx.changed().await.is_err() {
                break;
            }
        }
    }

    /// Sends a close frame and waits for the transport tasks to finish.
    pub async fn close(&self) {
        debug!(target: LOG_TARGET, "Closing message bus connection.");
        let _ = self.outgoing_tx.send(WsMessage::Close(None));
        let tasks: Vec<JoinHandle<()>> = match self.tasks.lock() {
            Ok(mut guard) => guard.drain(..).collect(),
            Err(poisoned) => poisoned.into_inner().drain(..).collect(),
        };
        for task in tasks {
            match tokio::time::timeout(Duration::from_secs(2), task).await {
                Ok(_) => {}
                Err(_) => warn!(target: LOG_TARGET, "Timed out waiting for bus task to finish."),
            }
        }
    }
}

#[async_trait]
impl MessageBus for WebSocketBus {
    async fn emit(&self, message: Message) -> Result<(), BusError> {
        if !self.is_connected() {
            return Err(BusError::Closed);
        }
        let payload = message.to_json()?;
        debug!(target: LOG_TARGET, "[Bus Send] {}", message.msg_type);
        // The host echoes every message back to all clients, the sender included.
        self.outgoing_tx
            .send(WsMessage::Text(payload))
            .map_err(|_| BusError::Closed)
    }

    fn subscribe(&self) -> broadcast::Receiver<Message> {
        subscribe_incoming(&self.incoming)
    }
}
