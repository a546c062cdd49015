//! WebSocket frame codec for obs-websocket messages.
//!
//! The WebSocket layer already delimits messages, so this module only maps
//! between tungstenite frames and [`Message`] values. obs-websocket sends JSON
//! in text frames; binary frames are accepted as long as they hold UTF-8 JSON.

use std::fmt;

use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;

use crate::protocol::Message;

/// Maximum message size (16 MB)
pub const MAX_MESSAGE_SIZE: usize = 16 * 1024 * 1024;

/// A decoded WebSocket frame
#[derive(Debug)]
pub enum Frame {
    Message(Message),
    /// Ping, pong and raw frames; tungstenite answers pings itself
    Control,
    Close(Option<CloseInfo>),
}

/// Close code and reason sent by the peer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloseInfo {
    pub code: u16,
    pub reason: String,
}

impl From<CloseFrame> for CloseInfo {
    fn from(frame: CloseFrame) -> Self {
        Self {
            code: u16::from(frame.code),
            reason: frame.reason.as_str().to_string(),
        }
    }
}

impl fmt::Display for CloseInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.reason.is_empty() {
            write!(f, "close code {}", self.code)
        } else {
            write!(f, "close code {}: {}", self.code, self.reason)
        }
    }
}

/// Encode a message as a JSON text frame.
///
/// # Errors
///
/// Returns an error if serialization fails or the payload exceeds [`MAX_MESSAGE_SIZE`].
pub fn encode(message: &Message) -> Result<WsMessage, CodecError> {
    let json = message.to_json()?;
    if json.len() > MAX_MESSAGE_SIZE {
        return Err(CodecError::MessageTooLarge(json.len()));
    }
    Ok(WsMessage::Text(json.into()))
}

/// Decode a WebSocket frame.
///
/// # Errors
///
/// Returns an error if the payload is oversized, not UTF-8, or not a valid message.
pub fn decode(frame: WsMessage) -> Result<Frame, CodecError> {
    match frame {
        WsMessage::Text(text) => parse_payload(text.as_str()).map(Frame::Message),
        WsMessage::Binary(bytes) => {
            if bytes.len() > MAX_MESSAGE_SIZE {
                return Err(CodecError::MessageTooLarge(bytes.len()));
            }
            let json = std::str::from_utf8(&bytes)?;
            parse_payload(json).map(Frame::Message)
        }
        WsMessage::Close(close) => Ok(Frame::Close(close.map(CloseInfo::from))),
        WsMessage::Ping(_) | WsMessage::Pong(_) | WsMessage::Frame(_) => Ok(Frame::Control),
    }
}

fn parse_payload(json: &str) -> Result<Message, CodecError> {
    if json.len() > MAX_MESSAGE_SIZE {
        return Err(CodecError::MessageTooLarge(json.len()));
    }
    Ok(Message::parse(json)?)
}

/// Build a close frame with an obs-websocket close code.
#[must_use]
pub fn close_frame(code: u16, reason: &str) -> WsMessage {
    WsMessage::Close(Some(CloseFrame {
        code: CloseCode::from(code),
        reason: reason.to_string().into(),
    }))
}

/// Errors that can occur during codec operations
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("UTF-8 error: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    #[error("Message too large: {0} bytes (max: {MAX_MESSAGE_SIZE})")]
    MessageTooLarge(usize),
}
