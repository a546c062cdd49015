//! obs-websocket v5 protocol and session client for obskey.
//!
//! This crate provides the wire types, frame codec, authentication and the
//! session client used to drive OBS Studio from a macro keypad.
//!
//! # Architecture
//!
//! - [`protocol`]: opcode envelope and handshake/request message types
//! - [`transport`]: mapping between WebSocket frames and [`Message`]s
//! - [`auth`]: challenge/response authentication string
//! - [`client`]: [`Session`] lifecycle and the [`Connection`] seam
//! - [`requests`]: typed requests and their response data
//! - [`error`]: [`ConnectionError`] and [`CommandError`]
//!
//! # Example
//!
//! ```no_run
//! use obskey_rpc::{ConnectOptions, Session, requests};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let session = Session::connect(ConnectOptions::new("localhost", 4455, "secret")).await?;
//!
//! requests::send(
//!     &session,
//!     &requests::SetCurrentProgramScene { scene_name: "Scene 2".to_string() },
//! )
//! .await?;
//!
//! session.disconnect().await;
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod client;
pub mod error;
pub mod protocol;
pub mod requests;
pub mod transport;

pub use client::{
    Connection, ConnectOptions, DEFAULT_CONNECT_TIMEOUT, DEFAULT_HOST, DEFAULT_PORT,
    DEFAULT_REQUEST_TIMEOUT, FilterLocks, ServerInfo, Session, connect,
};

pub use error::{CommandError, ConnectionError, Result};

pub use protocol::{Message, RPC_VERSION, RequestStatus};

pub use requests::{ObsRequest, send};

pub use transport::CodecError;
