//! obs-websocket v5 message types.
//!
//! Every frame on the wire is a JSON object `{"op": <opcode>, "d": <data>}`.
//! The opcode selects the shape of `d`, so [`Message`] carries a hand-written
//! serde implementation that routes through [`RawMessage`].

use serde::de::Error as _;
use serde::ser::SerializeStruct;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

/// RPC version spoken by this client
pub const RPC_VERSION: u32 = 1;

pub const OP_HELLO: u8 = 0;
pub const OP_IDENTIFY: u8 = 1;
pub const OP_IDENTIFIED: u8 = 2;
pub const OP_EVENT: u8 = 5;
pub const OP_REQUEST: u8 = 6;
pub const OP_REQUEST_RESPONSE: u8 = 7;

// WebSocket close codes sent by the server
pub const CLOSE_AUTHENTICATION_FAILED: u16 = 4009;
pub const CLOSE_UNSUPPORTED_RPC_VERSION: u16 = 4010;

// Request status codes
pub const STATUS_SUCCESS: u16 = 100;
pub const STATUS_GENERIC_ERROR: u16 = 205;
pub const STATUS_OUTPUT_RUNNING: u16 = 500;
pub const STATUS_RESOURCE_NOT_FOUND: u16 = 600;

/// Authentication challenge carried by `Hello` when the server has a password set
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthChallenge {
    pub challenge: String,
    pub salt: String,
}

/// First message sent by the server after the WebSocket upgrade
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hello {
    pub obs_web_socket_version: String,
    pub rpc_version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authentication: Option<AuthChallenge>,
}

/// Client reply to `Hello`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identify {
    pub rpc_version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authentication: Option<String>,
    /// Event subscription bitmask; zero opts out of every event category
    pub event_subscriptions: u32,
}

/// Sent by the server once `Identify` has been accepted
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identified {
    pub negotiated_rpc_version: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub event_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_data: Option<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Request {
    pub request_type: String,
    pub request_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_data: Option<Value>,
}

impl Request {
    #[must_use]
    pub fn new(
        request_type: impl Into<String>,
        request_id: impl Into<String>,
        request_data: Option<Value>,
    ) -> Self {
        Self {
            request_type: request_type.into(),
            request_id: request_id.into(),
            request_data,
        }
    }
}

/// Outcome reported by the server for a single request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestStatus {
    pub result: bool,
    pub code: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl RequestStatus {
    #[must_use]
    pub fn success() -> Self {
        Self {
            result: true,
            code: STATUS_SUCCESS,
            comment: None,
        }
    }

    #[must_use]
    pub fn failure(code: u16, comment: impl Into<String>) -> Self {
        Self {
            result: false,
            code,
            comment: Some(comment.into()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestResponse {
    pub request_type: String,
    pub request_id: String,
    pub request_status: RequestStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_data: Option<Value>,
}

/// A single obs-websocket frame
#[derive(Debug, Clone)]
pub enum Message {
    Hello(Hello),
    Identify(Identify),
    Identified(Identified),
    Event(Event),
    Request(Request),
    RequestResponse(RequestResponse),
    /// Opcodes this client never acts on (reidentify, batches, future additions)
    Other { op: u8, d: Value },
}

/// Wire envelope shared by every opcode
#[derive(Debug, Serialize, Deserialize)]
struct RawMessage {
    op: u8,
    #[serde(default)]
    d: Value,
}

impl Message {
    #[must_use]
    pub fn op(&self) -> u8 {
        match self {
            Message::Hello(_) => OP_HELLO,
            Message::Identify(_) => OP_IDENTIFY,
            Message::Identified(_) => OP_IDENTIFIED,
            Message::Event(_) => OP_EVENT,
            Message::Request(_) => OP_REQUEST,
            Message::RequestResponse(_) => OP_REQUEST_RESPONSE,
            Message::Other { op, .. } => *op,
        }
    }

    fn from_raw(raw: RawMessage) -> Result<Self, serde_json::Error> {
        let message = match raw.op {
            OP_HELLO => Message::Hello(serde_json::from_value(raw.d)?),
            OP_IDENTIFY => Message::Identify(serde_json::from_value(raw.d)?),
            OP_IDENTIFIED => Message::Identified(serde_json::from_value(raw.d)?),
            OP_EVENT => Message::Event(serde_json::from_value(raw.d)?),
            OP_REQUEST => Message::Request(serde_json::from_value(raw.d)?),
            OP_REQUEST_RESPONSE => Message::RequestResponse(serde_json::from_value(raw.d)?),
            op => Message::Other { op, d: raw.d },
        };
        Ok(message)
    }

    /// Parse a JSON string into a `Message`.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or `d` does not match the opcode.
    pub fn parse(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Serialize this message to JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

impl Serialize for Message {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Message", 2)?;
        state.serialize_field("op", &self.op())?;
        match self {
            Message::Hello(d) => state.serialize_field("d", d)?,
            Message::Identify(d) => state.serialize_field("d", d)?,
            Message::Identified(d) => state.serialize_field("d", d)?,
            Message::Event(d) => state.serialize_field("d", d)?,
            Message::Request(d) => state.serialize_field("d", d)?,
            Message::RequestResponse(d) => state.serialize_field("d", d)?,
            Message::Other { d, .. } => state.serialize_field("d", d)?,
        }
        state.end()
    }
}

impl<'de> Deserialize<'de> for Message {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = RawMessage::deserialize(deserializer)?;
        Message::from_raw(raw).map_err(D::Error::custom)
    }
}
