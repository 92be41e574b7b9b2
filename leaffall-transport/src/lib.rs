use leaffall_config::{SenderType, SerializerType, TransportConfig};
use leaffall_core::{HostClock, InputSender};
use leaffall_simulation::{Frame, Renderer};
use log::{error, info};
use std::io::{self, Write};
use thiserror::Error;

pub mod state;
pub use state::{CompactFrame, CompactLeaf, FrameState, LeafState};

// --- Error Type ---
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Binary serialization failed: {0}")]
    Binary(#[from] bincode::Error),

    #[cfg(feature = "websocket")]
    #[error("WebSocket error: {0}")]
    WebSocket(String),

    #[error("Transport misconfigured: {0}")]
    Config(String),
}

/// A serialized frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Text(String),
    Binary(Vec<u8>),
}

impl Payload {
    pub fn len(&self) -> usize {
        match self {
            Payload::Text(text) => text.len(),
            Payload::Binary(bytes) => bytes.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// --- Traits ---
/// Turns a rendered frame into a payload.
pub trait Serializer: Send + Sync {
    fn serialize(&self, frame: &Frame<'_>) -> Result<Payload, TransportError>;
}

/// Delivers payloads to a destination.
pub trait Sender {
    fn send(&mut self, payload: &Payload) -> Result<(), TransportError>;
}

// --- Serializers ---

/// Full frame state with outlines, as JSON text.
pub struct JsonSerializer;

impl Serializer for JsonSerializer {
    fn serialize(&self, frame: &Frame<'_>) -> Result<Payload, TransportError> {
        let state = FrameState::capture(frame);
        Ok(Payload::Text(serde_json::to_string(&state)?))
    }
}

/// Compact bincode records without outlines.
pub struct BinarySerializer;

impl Serializer for BinarySerializer {
    fn serialize(&self, frame: &Frame<'_>) -> Result<Payload, TransportError> {
        let state = CompactFrame::capture(frame);
        Ok(Payload::Binary(bincode::serialize(&state)?))
    }
}

// --- Senders ---

/// Writes one payload per line. Binary payloads are base64-encoded.
pub struct StdioSender<W: Write = io::Stdout> {
    out: W,
}

impl StdioSender {
    pub fn new() -> Self {
        StdioSender { out: io::stdout() }
    }
}

impl Default for StdioSender {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: Write> StdioSender<W> {
    pub fn with_writer(out: W) -> Self {
        StdioSender { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Sender for StdioSender<W> {
    fn send(&mut self, payload: &Payload) -> Result<(), TransportError> {
        match payload {
            Payload::Text(text) => self.out.write_all(text.as_bytes())?,
            Payload::Binary(bytes) => self.out.write_all(base64::encode(bytes).as_bytes())?,
        }
        self.out.write_all(b"\n")?;
        self.out.flush()?;
        Ok(())
    }
}

/// Drops every payload; counts them for headless runs.
#[derive(Debug, Default)]
pub struct NullSender {
    sent: u64,
}

impl NullSender {
    pub fn sent(&self) -> u64 {
        self.sent
    }
}

impl Sender for NullSender {
    fn send(&mut self, _payload: &Payload) -> Result<(), TransportError> {
        self.sent += 1;
        Ok(())
    }
}

// --- Renderer ---

/// Failures are logged on the first occurrence and then every this many.
const FAILURE_LOG_INTERVAL: u64 = 300;

/// Renderer that serializes every Nth frame and hands it to a sender.
///
/// The renderer contract has no error channel, so failures are logged and
/// the loop keeps running.
pub struct TransportRenderer {
    serializer: Box<dyn Serializer>,
    sender: Box<dyn Sender>,
    frame_interval: u64,
    sent: u64,
    failures: u64,
}

impl TransportRenderer {
    pub fn new(serializer: Box<dyn Serializer>, sender: Box<dyn Sender>, frame_interval: u32) -> Self {
        Self {
            serializer,
            sender,
            frame_interval: frame_interval.max(1) as u64,
            sent: 0,
            failures: 0,
        }
    }

    pub fn sent(&self) -> u64 {
        self.sent
    }

    pub fn failures(&self) -> u64 {
        self.failures
    }

    fn publish(&mut self, frame: &Frame<'_>) -> Result<(), TransportError> {
        let payload = self.serializer.serialize(frame)?;
        self.sender.send(&payload)
    }
}

impl Renderer for TransportRenderer {
    fn draw_frame(&mut self, frame: &Frame<'_>) {
        if frame.number % self.frame_interval != 0 {
            return;
        }
        match self.publish(frame) {
            Ok(()) => self.sent += 1,
            Err(e) => {
                if self.failures % FAILURE_LOG_INTERVAL == 0 {
                    error!("Failed to send frame {}: {} ({} failures so far)", frame.number, e, self.failures + 1);
                }
                self.failures += 1;
            }
        }
    }
}

// --- Construction from config ---

pub fn create_serializer(kind: SerializerType) -> Box<dyn Serializer> {
    match kind {
        SerializerType::Json => Box::new(JsonSerializer),
        SerializerType::Binary => Box::new(BinarySerializer),
    }
}

/// Build the configured sender. The websocket sender forwards client input
/// into `input`, stamped with `clock`.
#[allow(unused_variables)]
pub fn create_sender(
    config: &TransportConfig,
    input: &InputSender,
    clock: HostClock,
) -> Result<Box<dyn Sender>, TransportError> {
    match config.sender {
        SenderType::Stdio => Ok(Box::new(StdioSender::new())),
        SenderType::Null => Ok(Box::new(NullSender::default())),
        SenderType::WebSocket => {
            #[cfg(feature = "websocket")]
            {
                let options = &config.websocket;
                let mut ws_sender = WebSocketSender::new(&options.host, options.port)
                    .with_input(input.clone(), clock);
                ws_sender.start()?;
                info!("WebSocket server listening on ws://{}:{}", options.host, options.port);
                Ok(Box::new(ws_sender))
            }

            #[cfg(not(feature = "websocket"))]
            {
                Err(TransportError::Config(
                    "WebSocket sender configured but the websocket feature is not enabled".to_string(),
                ))
            }
        }
    }
}

/// Serializer, sender and frame interval straight from the transport config.
pub fn create_renderer(
    config: &TransportConfig,
    input: &InputSender,
    clock: HostClock,
) -> Result<TransportRenderer, TransportError> {
    let sender = create_sender(config, input, clock)?;
    info!("Transport: {:?} over {:?}, every {} frame(s)", config.serializer, config.sender, config.frame_interval);
    Ok(TransportRenderer::new(create_serializer(config.serializer), sender, config.frame_interval))
}

#[cfg(feature = "websocket")]
mod websocket;

// Re-export WebSocketSender when websocket feature is enabled
#[cfg(feature = "websocket")]
pub use websocket::{ClientMessage, WebSocketSender};
