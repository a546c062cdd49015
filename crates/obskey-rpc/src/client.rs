//! Session client for the obs-websocket server.
//!
//! A [`Session`] owns one authenticated WebSocket connection. The server
//! answers requests strictly in order, so every request/response exchange runs
//! under a single async mutex: concurrent callers queue instead of
//! interleaving frames.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::net::TcpStream;
use tokio::sync::{Mutex, OwnedMutexGuard, watch};
use tokio_tungstenite::tungstenite::{self, Message as WsMessage};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, info, warn};

use crate::auth::authentication_string;
use crate::error::{CommandError, ConnectionError};
use crate::protocol::{
    CLOSE_AUTHENTICATION_FAILED, CLOSE_UNSUPPORTED_RPC_VERSION, Identify, Message, RPC_VERSION,
    Request, RequestResponse,
};
use crate::transport::{self, CloseInfo, Frame};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_PORT: u16 = 4455;
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Parameters for establishing a session
#[derive(Clone)]
pub struct ConnectOptions {
    pub host: String,
    pub port: u16,
    /// Server password; empty means the server is expected to allow anonymous access
    pub password: String,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
}

impl Default for ConnectOptions {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            password: String::new(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

impl ConnectOptions {
    #[must_use]
    pub fn new(host: impl Into<String>, port: u16, password: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port,
            password: password.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// `host:port`, with IPv6 literals bracketed
    #[must_use]
    pub fn address(&self) -> String {
        if self.host.contains(':') && !self.host.starts_with('[') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }

    fn url(&self) -> String {
        format!("ws://{}", self.address())
    }
}

impl fmt::Debug for ConnectOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectOptions")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("password", &if self.password.is_empty() { "" } else { "<redacted>" })
            .field("connect_timeout", &self.connect_timeout)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

/// A connection that can carry obs-websocket requests.
///
/// Implemented by [`Session`]; the seam exists so command sequencing can be
/// exercised against an in-memory fake.
pub trait Connection: Send + Sync {
    /// Issue one request and wait for its response data (`Null` when absent).
    fn call(
        &self,
        request_type: &str,
        request_data: Option<Value>,
    ) -> impl Future<Output = Result<Value, CommandError>> + Send;

    /// Locks serializing read-then-write sequences on one filter
    fn filter_locks(&self) -> &FilterLocks;

    fn is_live(&self) -> bool;

    /// Close the connection. Safe to call more than once.
    fn disconnect(&self) -> impl Future<Output = ()> + Send;
}

/// Per-filter locks keyed by (source name, filter name)
#[derive(Debug, Default)]
pub struct FilterLocks {
    locks: Mutex<HashMap<(String, String), Arc<Mutex<()>>>>,
}

impl FilterLocks {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive use of one filter. Released when the guard drops.
    pub async fn acquire(&self, source_name: &str, filter_name: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().await;
            locks
                .entry((source_name.to_string(), filter_name.to_string()))
                .or_default()
                .clone()
        };
        lock.lock_owned().await
    }
}

/// Versions agreed during the handshake
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerInfo {
    pub obs_web_socket_version: String,
    pub negotiated_rpc_version: u32,
    pub authenticated: bool,
}

/// One authenticated connection to obs-websocket
pub struct Session {
    options: ConnectOptions,
    socket: Mutex<Option<WsStream>>,
    live: AtomicBool,
    /// Flips to true once on disconnect; aborts the exchange holding `socket`
    closed: watch::Sender<bool>,
    next_id: AtomicU64,
    server: ServerInfo,
    filter_locks: FilterLocks,
}

/// Connect with default timeouts.
///
/// # Errors
///
/// See [`Session::connect`].
pub async fn connect(host: &str, port: u16, credential: &str) -> Result<Session, ConnectionError> {
    Session::connect(ConnectOptions::new(host, port, credential)).await
}

impl Session {
    /// Open the WebSocket, answer the `Hello` challenge and wait for `Identified`.
    ///
    /// The whole handshake is bounded by `options.connect_timeout`. Every call
    /// is independent, so a failed attempt can simply be repeated.
    ///
    /// # Errors
    ///
    /// Returns `ConnectionError::HostUnreachable` if the TCP connection fails,
    /// `AuthRejected` if the server refuses the credential, `ProtocolMismatch`
    /// if the server does not speak a compatible obs-websocket protocol, and
    /// `Timeout` if the handshake does not finish in time.
    pub async fn connect(options: ConnectOptions) -> Result<Self, ConnectionError> {
        let timeout = options.connect_timeout;
        debug!("Connecting to obs-websocket at {}", options.address());

        match tokio::time::timeout(timeout, Self::establish(options)).await {
            Ok(result) => result,
            Err(_) => Err(ConnectionError::Timeout(timeout)),
        }
    }

    async fn establish(options: ConnectOptions) -> Result<Self, ConnectionError> {
        let (mut socket, _) = connect_async(options.url())
            .await
            .map_err(|e| upgrade_error(&options.address(), e))?;

        let hello = match next_message(&mut socket).await? {
            Message::Hello(hello) => hello,
            other => {
                return Err(ConnectionError::ProtocolMismatch(format!(
                    "expected Hello, got op {}",
                    other.op()
                )));
            }
        };

        if hello.rpc_version < RPC_VERSION {
            return Err(ConnectionError::ProtocolMismatch(format!(
                "server speaks RPC version {}, need {RPC_VERSION}",
                hello.rpc_version
            )));
        }

        let authentication = match &hello.authentication {
            Some(_) if options.password.is_empty() => {
                return Err(ConnectionError::AuthRejected(
                    "server requires a password".to_string(),
                ));
            }
            Some(challenge) => Some(authentication_string(&options.password, challenge)),
            None => None,
        };
        let authenticated = authentication.is_some();

        let identify = Message::Identify(Identify {
            rpc_version: RPC_VERSION,
            authentication,
            event_subscriptions: 0,
        });
        socket.send(transport::encode(&identify)?).await.map_err(|e| {
            ConnectionError::ProtocolMismatch(format!("failed to send Identify: {e}"))
        })?;

        let identified = match next_message(&mut socket).await? {
            Message::Identified(identified) => identified,
            other => {
                return Err(ConnectionError::ProtocolMismatch(format!(
                    "expected Identified, got op {}",
                    other.op()
                )));
            }
        };

        info!(
            "Connected to obs-websocket {} at {} (rpc v{}{})",
            hello.obs_web_socket_version,
            options.address(),
            identified.negotiated_rpc_version,
            if authenticated { ", authenticated" } else { "" }
        );

        Ok(Self {
            options,
            socket: Mutex::new(Some(socket)),
            live: AtomicBool::new(true),
            closed: watch::Sender::new(false),
            next_id: AtomicU64::new(1),
            server: ServerInfo {
                obs_web_socket_version: hello.obs_web_socket_version,
                negotiated_rpc_version: identified.negotiated_rpc_version,
                authenticated,
            },
            filter_locks: FilterLocks::new(),
        })
    }

    /// Establish a fresh session with the same parameters.
    ///
    /// # Errors
    ///
    /// See [`Session::connect`].
    pub async fn reconnect(&self) -> Result<Self, ConnectionError> {
        Self::connect(self.options.clone()).await
    }

    #[must_use]
    pub fn host(&self) -> &str {
        &self.options.host
    }

    #[must_use]
    pub fn port(&self) -> u16 {
        self.options.port
    }

    #[must_use]
    pub fn server(&self) -> &ServerInfo {
        &self.server
    }

    #[must_use]
    pub fn is_live(&self) -> bool {
        self.live.load(Ordering::SeqCst)
    }

    /// Send one request and wait for the matching response.
    ///
    /// # Errors
    ///
    /// Returns `CommandError::Disconnected` if the session is closed or the
    /// connection drops mid-exchange, `NotFound` or `Backend` if the server
    /// reports a failure, and `Backend` if no response arrives in time.
    pub async fn request(
        &self,
        request_type: &str,
        request_data: Option<Value>,
    ) -> Result<Value, CommandError> {
        if !self.is_live() {
            return Err(CommandError::Disconnected);
        }

        let mut closed = self.closed.subscribe();
        let mut socket = self.socket.lock().await;
        if !self.is_live() {
            return Err(CommandError::Disconnected);
        }
        let Some(stream) = socket.as_mut() else {
            return Err(CommandError::Disconnected);
        };

        let request_id = self.next_id.fetch_add(1, Ordering::SeqCst).to_string();
        let frame = transport::encode(&Message::Request(Request::new(
            request_type,
            request_id.clone(),
            request_data,
        )))?;

        debug!("-> {} (id {})", request_type, request_id);

        let timeout = self.options.request_timeout;
        let pending = tokio::time::timeout(timeout, exchange(stream, frame, &request_id));
        let outcome = tokio::select! {
            outcome = pending => outcome,
            _ = closed.wait_for(|closed| *closed) => {
                debug!("{} (id {}) abandoned by disconnect", request_type, request_id);
                return Err(CommandError::Disconnected);
            }
        };
        match outcome {
            Ok(Ok(response)) => {
                debug!(
                    "<- {} (id {}): code {}",
                    request_type, request_id, response.request_status.code
                );
                response_data(response)
            }
            Ok(Err(reason)) => {
                warn!("Session lost during {}: {}", request_type, reason);
                self.live.store(false, Ordering::SeqCst);
                *socket = None;
                Err(CommandError::Disconnected)
            }
            Err(_) => Err(CommandError::backend(format!(
                "{request_type} timed out after {}ms",
                timeout.as_millis()
            ))),
        }
    }

    /// Close the connection.
    ///
    /// Idempotent: the socket is released by whichever call takes it first.
    /// An exchange in progress is abandoned and it, along with every request
    /// queued behind it, fails with `Disconnected`.
    pub async fn disconnect(&self) {
        self.live.store(false, Ordering::SeqCst);
        self.closed.send_replace(true);

        let Some(mut stream) = self.socket.lock().await.take() else {
            debug!("Session to {} already closed", self.options.address());
            return;
        };

        if let Err(e) = stream.close(None).await {
            debug!("Error while closing session: {}", e);
        }
        info!("Disconnected from obs-websocket at {}", self.options.address());
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("options", &self.options)
            .field("live", &self.is_live())
            .field("server", &self.server)
            .finish_non_exhaustive()
    }
}

impl Connection for Session {
    async fn call(
        &self,
        request_type: &str,
        request_data: Option<Value>,
    ) -> Result<Value, CommandError> {
        self.request(request_type, request_data).await
    }

    fn filter_locks(&self) -> &FilterLocks {
        &self.filter_locks
    }

    fn is_live(&self) -> bool {
        Session::is_live(self)
    }

    async fn disconnect(&self) {
        Session::disconnect(self).await;
    }
}

/// Send one request frame and read until its response arrives.
///
/// Events and responses to other ids are skipped. `Err` carries the reason the
/// connection can no longer be used.
async fn exchange(
    stream: &mut WsStream,
    frame: WsMessage,
    request_id: &str,
) -> Result<RequestResponse, String> {
    stream.send(frame).await.map_err(|e| e.to_string())?;

    loop {
        let frame = match stream.next().await {
            Some(Ok(frame)) => frame,
            Some(Err(e)) => return Err(e.to_string()),
            None => return Err("connection closed".to_string()),
        };

        match transport::decode(frame) {
            Ok(Frame::Message(Message::RequestResponse(response)))
                if response.request_id == request_id =>
            {
                return Ok(response);
            }
            Ok(Frame::Message(other)) => {
                debug!("Skipping op {} while awaiting id {}", other.op(), request_id);
            }
            Ok(Frame::Control) => {}
            Ok(Frame::Close(info)) => return Err(close_reason(info.as_ref())),
            Err(e) => warn!("Ignoring undecodable frame: {}", e),
        }
    }
}

fn response_data(response: RequestResponse) -> Result<Value, CommandError> {
    if response.request_status.result {
        Ok(response.response_data.unwrap_or(Value::Null))
    } else {
        Err(CommandError::from_status(
            &response.request_type,
            &response.request_status,
        ))
    }
}

async fn next_message(socket: &mut WsStream) -> Result<Message, ConnectionError> {
    loop {
        let frame = match socket.next().await {
            Some(Ok(frame)) => frame,
            Some(Err(e)) => return Err(ConnectionError::ProtocolMismatch(e.to_string())),
            None => {
                return Err(ConnectionError::ProtocolMismatch(
                    "connection closed during handshake".to_string(),
                ));
            }
        };

        match transport::decode(frame)? {
            Frame::Message(message) => return Ok(message),
            Frame::Control => {}
            Frame::Close(Some(info)) if info.code == CLOSE_AUTHENTICATION_FAILED => {
                return Err(ConnectionError::AuthRejected(info.to_string()));
            }
            Frame::Close(Some(info)) if info.code == CLOSE_UNSUPPORTED_RPC_VERSION => {
                return Err(ConnectionError::ProtocolMismatch(format!(
                    "server rejected RPC version {RPC_VERSION}: {info}"
                )));
            }
            Frame::Close(info) => {
                return Err(ConnectionError::ProtocolMismatch(close_reason(
                    info.as_ref(),
                )));
            }
        }
    }
}

fn close_reason(info: Option<&CloseInfo>) -> String {
    info.map_or_else(
        || "server closed the connection".to_string(),
        ToString::to_string,
    )
}

fn upgrade_error(address: &str, e: tungstenite::Error) -> ConnectionError {
    match e {
        tungstenite::Error::Io(e) => ConnectionError::HostUnreachable {
            address: address.to_string(),
            reason: e.to_string(),
        },
        tungstenite::Error::Url(e) => ConnectionError::HostUnreachable {
            address: address.to_string(),
            reason: e.to_string(),
        },
        tungstenite::Error::Http(response) => ConnectionError::ProtocolMismatch(format!(
            "WebSocket upgrade rejected with HTTP {}",
            response.status()
        )),
        other => ConnectionError::ProtocolMismatch(other.to_string()),
    }
}
