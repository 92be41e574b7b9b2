use super::*;
use futures::sink::SinkExt;
use futures::stream::StreamExt;
use leaffall_core::InputEvent;
use log::{debug, warn};
use serde::Deserialize;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio::runtime::Runtime;
use tokio::sync::broadcast;
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};

/// Frames a slow client may fall behind before it starts skipping.
const BROADCAST_CAPACITY: usize = 16;

/// Messages a browser client may send back.
#[derive(Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ClientMessage {
    Move { x: f32, y: f32 },
    Leave,
    Resize { width: f32, height: f32 },
}

impl ClientMessage {
    /// Input event for the loop, with pointer samples stamped at `timestamp`.
    pub fn into_event(self, timestamp: f64) -> InputEvent {
        match self {
            ClientMessage::Move { x, y } => InputEvent::PointerMove { x, y, timestamp },
            ClientMessage::Leave => InputEvent::PointerLeave,
            ClientMessage::Resize { width, height } => InputEvent::Resize { width, height },
        }
    }
}

/// WebSocket sender that broadcasts frames to connected clients and feeds
/// their pointer and resize messages back into the loop.
pub struct WebSocketSender {
    host: String,
    port: u16,
    tx: Option<broadcast::Sender<Payload>>,
    runtime: Option<Runtime>,
    clients_count: Arc<AtomicUsize>,
    input: Option<(InputSender, HostClock)>,
}

impl WebSocketSender {
    pub fn new(host: &str, port: u16) -> Self {
        WebSocketSender {
            host: host.to_string(),
            port,
            tx: None,
            runtime: None,
            clients_count: Arc::new(AtomicUsize::new(0)),
            input: None,
        }
    }

    pub fn with_input(mut self, input: InputSender, clock: HostClock) -> Self {
        self.input = Some((input, clock));
        self
    }

    /// Binds the listener and starts accepting clients on a background runtime.
    pub fn start(&mut self) -> Result<(), TransportError> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build()
            .map_err(|e| TransportError::WebSocket(e.to_string()))?;

        let addr = format!("{}:{}", self.host, self.port);
        let socket_addr: SocketAddr = addr
            .parse()
            .map_err(|e| TransportError::WebSocket(format!("Invalid address {}: {}", addr, e)))?;

        let listener = runtime
            .block_on(TcpListener::bind(socket_addr))
            .map_err(|e| TransportError::WebSocket(format!("Failed to bind {}: {}", socket_addr, e)))?;

        let (tx, _) = broadcast::channel::<Payload>(BROADCAST_CAPACITY);
        self.tx = Some(tx.clone());

        let clients_count = self.clients_count.clone();
        let input = self.input.clone();

        runtime.spawn(async move {
            while let Ok((stream, addr)) = listener.accept().await {
                let count = clients_count.fetch_add(1, Ordering::SeqCst) + 1;
                info!("Client connected: {}. Total clients: {}", addr, count);

                tokio::spawn(handle_connection(
                    stream,
                    tx.subscribe(),
                    addr.to_string(),
                    clients_count.clone(),
                    input.clone(),
                ));
            }
        });

        self.runtime = Some(runtime);
        Ok(())
    }

    /// Returns the number of connected clients
    pub fn client_count(&self) -> usize {
        self.clients_count.load(Ordering::SeqCst)
    }
}

impl Sender for WebSocketSender {
    fn send(&mut self, payload: &Payload) -> Result<(), TransportError> {
        let tx = self
            .tx
            .as_ref()
            .ok_or_else(|| TransportError::WebSocket("WebSocket server not started".to_string()))?;

        // No receivers just means nobody is watching right now.
        if self.client_count() > 0 && tx.receiver_count() > 0 {
            tx.send(payload.clone())
                .map_err(|e| TransportError::WebSocket(format!("Broadcast error: {}", e)))?;
        }
        Ok(())
    }
}

async fn handle_connection(
    raw_stream: TcpStream,
    mut rx: broadcast::Receiver<Payload>,
    peer: String,
    clients_count: Arc<AtomicUsize>,
    input: Option<(InputSender, HostClock)>,
) {
    let ws_stream = match accept_async(raw_stream).await {
        Ok(stream) => stream,
        Err(e) => {
            warn!("Error during WebSocket handshake with {}: {}", peer, e);
            remove_client(&peer, &clients_count);
            return;
        }
    };

    let (mut ws_sender, mut ws_receiver) = ws_stream.split();

    let receive_peer = peer.clone();
    let mut receive_task = tokio::spawn(async move {
        while let Some(msg_result) = ws_receiver.next().await {
            match msg_result {
                Ok(Message::Text(text)) => forward_input(&text, &receive_peer, input.as_ref()),
                Ok(Message::Close(_)) => break,
                Ok(_) => {}
                Err(e) => {
                    if !is_disconnect_error(&e) {
                        warn!("WebSocket receive error: {} - {}", receive_peer, e);
                    }
                    break;
                }
            }
        }
    });

    loop {
        tokio::select! {
            msg = rx.recv() => {
                let message = match msg {
                    Ok(Payload::Text(text)) => Message::Text(text),
                    Ok(Payload::Binary(bytes)) => Message::Binary(bytes),
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        debug!("Client {} lagging, skipped {} frames", peer, skipped);
                        continue;
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                };
                if let Err(e) = ws_sender.send(message).await {
                    if !is_disconnect_error(&e) {
                        warn!("WebSocket send error: {} - {}", peer, e);
                    }
                    break;
                }
            }
            _ = &mut receive_task => break,
        }
    }

    receive_task.abort();
    remove_client(&peer, &clients_count);
}

fn forward_input(text: &str, peer: &str, input: Option<&(InputSender, HostClock)>) {
    let Some((sender, clock)) = input else {
        return;
    };
    match serde_json::from_str::<ClientMessage>(text) {
        Ok(message) => {
            sender.send(message.into_event(clock.now()));
        }
        Err(e) => debug!("Ignoring message from {}: {}", peer, e),
    }
}

// Helper function to check if an error is due to disconnection
fn is_disconnect_error(e: &WsError) -> bool {
    match e {
        WsError::ConnectionClosed | WsError::AlreadyClosed => true,
        WsError::Io(io_err) => matches!(
            io_err.kind(),
            io::ErrorKind::BrokenPipe | io::ErrorKind::ConnectionReset | io::ErrorKind::ConnectionAborted
        ),
        _ => false,
    }
}

fn remove_client(peer: &str, clients_count: &AtomicUsize) {
    // Guard against underflow
    let previous = clients_count
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| Some(n.saturating_sub(1)))
        .unwrap_or(0);
    info!("Client disconnected: {}. Total clients: {}", peer, previous.saturating_sub(1));
}
