//! Test fixtures and helpers

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex as StdMutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use obskey_rpc::{CommandError, Connection, FilterLocks};
use serde_json::{Value, json};

use crate::launcher::Launcher;

/// One request seen by the fake
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub request_type: String,
    pub data: Option<Value>,
}

impl Call {
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.data.as_ref().and_then(|data| data.get(key))
    }
}

/// In-memory stand-in for an obs-websocket session.
///
/// Requests run one at a time like the real session. Scripted responses are
/// consumed per request type; otherwise filter requests are answered from an
/// in-memory filter table and everything else succeeds with no data.
pub struct FakeConnection {
    scripted: StdMutex<HashMap<String, VecDeque<Result<Value, CommandError>>>>,
    filters: StdMutex<HashMap<(String, String), bool>>,
    calls: StdMutex<Vec<Call>>,
    exchange: tokio::sync::Mutex<()>,
    delay: Duration,
    filter_locks: FilterLocks,
    live: AtomicBool,
    disconnects: AtomicUsize,
}

impl Default for FakeConnection {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeConnection {
    pub fn new() -> Self {
        Self {
            scripted: StdMutex::new(HashMap::new()),
            filters: StdMutex::new(HashMap::new()),
            calls: StdMutex::new(Vec::new()),
            exchange: tokio::sync::Mutex::new(()),
            delay: Duration::ZERO,
            filter_locks: FilterLocks::new(),
            live: AtomicBool::new(true),
            disconnects: AtomicUsize::new(0),
        }
    }

    /// Hold every exchange for `delay` to widen race windows
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_filter(self, source: &str, filter: &str, enabled: bool) -> Self {
        self.filters
            .lock()
            .unwrap()
            .insert((source.to_string(), filter.to_string()), enabled);
        self
    }

    /// Queue a response for the next request of `request_type`
    pub fn respond(&self, request_type: &str, response: Result<Value, CommandError>) {
        self.scripted
            .lock()
            .unwrap()
            .entry(request_type.to_string())
            .or_default()
            .push_back(response);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn request_types(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .map(|call| call.request_type)
            .collect()
    }

    pub fn filter_enabled(&self, source: &str, filter: &str) -> Option<bool> {
        self.filters
            .lock()
            .unwrap()
            .get(&(source.to_string(), filter.to_string()))
            .copied()
    }

    pub fn disconnect_count(&self) -> usize {
        self.disconnects.load(Ordering::SeqCst)
    }

    fn answer(&self, request_type: &str, data: Option<&Value>) -> Result<Value, CommandError> {
        if let Some(response) = self
            .scripted
            .lock()
            .unwrap()
            .get_mut(request_type)
            .and_then(VecDeque::pop_front)
        {
            return response;
        }

        let key = || {
            let field = |name: &str| {
                data.and_then(|d| d.get(name))
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string()
            };
            (field("sourceName"), field("filterName"))
        };

        let mut filters = self.filters.lock().unwrap();
        match request_type {
            "GetSourceFilter" => filters
                .get(&key())
                .map(|enabled| json!({"filterEnabled": enabled, "filterIndex": 0}))
                .ok_or_else(|| CommandError::NotFound("No filter was found".to_string())),
            "SetSourceFilterEnabled" => {
                let enabled = data
                    .and_then(|d| d.get("filterEnabled"))
                    .and_then(Value::as_bool)
                    .unwrap_or_default();
                match filters.get_mut(&key()) {
                    Some(state) => {
                        *state = enabled;
                        Ok(Value::Null)
                    }
                    None => Err(CommandError::NotFound("No filter was found".to_string())),
                }
            }
            _ => Ok(Value::Null),
        }
    }
}

impl Connection for FakeConnection {
    async fn call(
        &self,
        request_type: &str,
        request_data: Option<Value>,
    ) -> Result<Value, CommandError> {
        if !self.live.load(Ordering::SeqCst) {
            return Err(CommandError::Disconnected);
        }

        let _exchange = self.exchange.lock().await;
        self.calls.lock().unwrap().push(Call {
            request_type: request_type.to_string(),
            data: request_data.clone(),
        });

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        self.answer(request_type, request_data.as_ref())
    }

    fn filter_locks(&self) -> &FilterLocks {
        &self.filter_locks
    }

    fn is_live(&self) -> bool {
        self.live.load(Ordering::SeqCst)
    }

    async fn disconnect(&self) {
        if self.live.swap(false, Ordering::SeqCst) {
            self.disconnects.fetch_add(1, Ordering::SeqCst);
        }
    }
}

/// Launcher that records commands instead of running them
#[derive(Default)]
pub struct RecordingLauncher {
    launched: StdMutex<Vec<String>>,
}

impl RecordingLauncher {
    pub fn launched(&self) -> Vec<String> {
        self.launched.lock().unwrap().clone()
    }
}

impl Launcher for RecordingLauncher {
    fn launch(&self, command: &str) {
        self.launched.lock().unwrap().push(command.to_string());
    }
}

pub fn scene(name: &str) -> crate::Action {
    crate::Action::SetScene {
        scene: name.to_string(),
    }
}

pub fn filter(source: &str, filter: &str) -> crate::Action {
    crate::Action::ToggleFilter {
        source: source.to_string(),
        filter: filter.to_string(),
    }
}

pub fn run(command: &str) -> crate::Action {
    crate::Action::RunProgram {
        command: command.to_string(),
    }
}
