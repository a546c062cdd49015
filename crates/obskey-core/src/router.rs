//! Maps keypad slots and action descriptors onto dispatcher calls.

use std::sync::Arc;

use obskey_rpc::Connection;
use tracing::{debug, info, warn};

use crate::action::Action;
use crate::dispatch;
use crate::error::RouterError;
use crate::launcher::{Launcher, ShellLauncher};
use crate::layout::{SLOT_COUNT, slot_label};

/// Routes actions for one keypad.
///
/// Holds the session when one was established; without it the router runs in
/// degraded mode where protocol-backed actions fail with
/// [`RouterError::NoSession`] and local launches still work.
pub struct Router<C: Connection, L: Launcher = ShellLauncher> {
    slots: Vec<Action>,
    session: Option<Arc<C>>,
    launcher: L,
    mic_input: String,
}

impl<C: Connection, L: Launcher> Router<C, L> {
    /// Build a router over `actions`, one per slot in keypad order.
    ///
    /// Short lists are padded with [`Action::Unassigned`]; entries beyond the
    /// last slot are dropped.
    pub fn new(actions: Vec<Action>, session: Option<Arc<C>>, launcher: L) -> Self {
        let mut slots = actions;
        if slots.len() > SLOT_COUNT {
            warn!(
                "{} actions configured for {} slots; ignoring the rest",
                slots.len(),
                SLOT_COUNT
            );
            slots.truncate(SLOT_COUNT);
        }
        slots.resize(SLOT_COUNT, Action::Unassigned);

        Self {
            slots,
            session,
            launcher,
            mic_input: dispatch::MIC_INPUT.to_string(),
        }
    }

    #[must_use]
    pub fn with_mic_input(mut self, mic_input: impl Into<String>) -> Self {
        self.mic_input = mic_input.into();
        self
    }

    #[must_use]
    pub fn slots(&self) -> &[Action] {
        &self.slots
    }

    #[must_use]
    pub fn action(&self, slot: usize) -> Option<&Action> {
        self.slots.get(slot)
    }

    #[must_use]
    pub fn session(&self) -> Option<&Arc<C>> {
        self.session.as_ref()
    }

    #[must_use]
    pub fn launcher(&self) -> &L {
        &self.launcher
    }

    #[must_use]
    pub fn mic_input(&self) -> &str {
        &self.mic_input
    }

    /// Route the action bound to `slot`. Out-of-range slots do nothing.
    ///
    /// # Errors
    ///
    /// See [`Router::route`].
    pub async fn dispatch(&self, slot: usize) -> Result<(), RouterError> {
        let Some(action) = self.slots.get(slot) else {
            debug!("Ignoring press on unknown slot {}", slot);
            return Ok(());
        };
        debug!(
            "{} pressed: {}",
            slot_label(slot).unwrap_or_default(),
            action
        );
        self.route(action).await
    }

    /// Perform one action.
    ///
    /// Empty and unrecognized actions succeed without doing anything.
    /// `Run Program` launches locally and never fails. Blank scene, source or
    /// filter names are still sent, so the backend reports them.
    ///
    /// # Errors
    ///
    /// `NoSession` for protocol-backed actions in degraded mode, otherwise the
    /// dispatcher's `CommandError`.
    pub async fn route(&self, action: &Action) -> Result<(), RouterError> {
        match action {
            Action::Unassigned => Ok(()),
            Action::Unrecognized { kind } => {
                debug!("Ignoring unrecognized action '{}'", kind);
                Ok(())
            }
            Action::RunProgram { command } => {
                if command.trim().is_empty() {
                    debug!("Run Program slot has no command");
                } else {
                    info!("Launching '{}'", command);
                    self.launcher.launch(command);
                }
                Ok(())
            }
            Action::SetScene { scene } => {
                let session = self.live_session()?;
                if scene.is_empty() {
                    warn!("Set Scene slot has no scene name");
                }
                Ok(dispatch::set_scene(session, scene).await?)
            }
            Action::ToggleFilter { source, filter } => {
                let session = self.live_session()?;
                if source.is_empty() || filter.is_empty() {
                    warn!("Toggle Filter slot needs both a source and a filter");
                }
                Ok(dispatch::toggle_filter_enabled(session, source, filter).await?)
            }
            Action::ToggleMic => {
                Ok(dispatch::toggle_input_mute(self.live_session()?, &self.mic_input).await?)
            }
            Action::ToggleStream => Ok(dispatch::toggle_streaming(self.live_session()?).await?),
            Action::ToggleRecording => Ok(dispatch::toggle_recording(self.live_session()?).await?),
            Action::StartStream => Ok(dispatch::start_streaming(self.live_session()?).await?),
            Action::StopStream => Ok(dispatch::stop_streaming(self.live_session()?).await?),
            Action::StartRecording => Ok(dispatch::start_recording(self.live_session()?).await?),
            Action::StopRecording => Ok(dispatch::stop_recording(self.live_session()?).await?),
        }
    }

    /// Close the session if there is one. Safe to call repeatedly.
    pub async fn shutdown(&self) {
        match &self.session {
            Some(session) => session.disconnect().await,
            None => debug!("Shutdown without a session"),
        }
    }

    fn live_session(&self) -> Result<&C, RouterError> {
        self.session.as_deref().ok_or(RouterError::NoSession)
    }
}
