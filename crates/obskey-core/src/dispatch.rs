//! Typed OBS commands issued over a session.
//!
//! Every operation is a free function over a [`Connection`] and keeps no state
//! of its own. Most are a single request; [`toggle_filter_enabled`] reads the
//! current filter state and writes its negation while holding the session's
//! per-filter lock.

use obskey_rpc::requests::{
    GetSourceFilter, SetCurrentProgramScene, SetSourceFilterEnabled, StartRecord, StartStream,
    StopRecord, StopStream, ToggleInputMute, ToggleRecord, ToggleStream,
};
use obskey_rpc::{CommandError, Connection, send};
use tracing::{debug, info};

/// Default audio input toggled by `Toggle Mic`
pub const MIC_INPUT: &str = "Mic/Aux";

/// Switch the program output to `scene_name`.
///
/// # Errors
///
/// `NotFound` if OBS has no such scene, `Disconnected` if the session is gone,
/// `Backend` for any other failure.
pub async fn set_scene<C>(session: &C, scene_name: &str) -> Result<(), CommandError>
where
    C: Connection + ?Sized,
{
    send(
        session,
        &SetCurrentProgramScene {
            scene_name: scene_name.to_string(),
        },
    )
    .await?;
    info!("Switched scene to '{}'", scene_name);
    Ok(())
}

/// Toggle mute on the default mic input.
///
/// # Errors
///
/// See [`toggle_input_mute`].
pub async fn toggle_mic<C>(session: &C) -> Result<(), CommandError>
where
    C: Connection + ?Sized,
{
    toggle_input_mute(session, MIC_INPUT).await
}

/// Toggle mute on an arbitrary input.
///
/// # Errors
///
/// `NotFound` if the input does not exist, otherwise as for [`set_scene`].
pub async fn toggle_input_mute<C>(session: &C, input_name: &str) -> Result<(), CommandError>
where
    C: Connection + ?Sized,
{
    let state = send(
        session,
        &ToggleInputMute {
            input_name: input_name.to_string(),
        },
    )
    .await?;
    info!(
        "{} '{}'",
        if state.input_muted { "Muted" } else { "Unmuted" },
        input_name
    );
    Ok(())
}

/// # Errors
///
/// `Disconnected` or `Backend`.
pub async fn toggle_streaming<C>(session: &C) -> Result<(), CommandError>
where
    C: Connection + ?Sized,
{
    let state = send(session, &ToggleStream).await?;
    log_output_toggle("Streaming", state.output_active);
    Ok(())
}

/// # Errors
///
/// `Disconnected` or `Backend`.
pub async fn toggle_recording<C>(session: &C) -> Result<(), CommandError>
where
    C: Connection + ?Sized,
{
    let state = send(session, &ToggleRecord).await?;
    log_output_toggle("Recording", state.output_active);
    Ok(())
}

/// # Errors
///
/// `Backend` if the stream is already running.
pub async fn start_streaming<C>(session: &C) -> Result<(), CommandError>
where
    C: Connection + ?Sized,
{
    send(session, &StartStream).await?;
    info!("Streaming started");
    Ok(())
}

/// # Errors
///
/// `Backend` if the stream is not running.
pub async fn stop_streaming<C>(session: &C) -> Result<(), CommandError>
where
    C: Connection + ?Sized,
{
    send(session, &StopStream).await?;
    info!("Streaming stopped");
    Ok(())
}

/// # Errors
///
/// `Backend` if recording is already running.
pub async fn start_recording<C>(session: &C) -> Result<(), CommandError>
where
    C: Connection + ?Sized,
{
    send(session, &StartRecord).await?;
    info!("Recording started");
    Ok(())
}

/// # Errors
///
/// `Backend` if recording is not running.
pub async fn stop_recording<C>(session: &C) -> Result<(), CommandError>
where
    C: Connection + ?Sized,
{
    send(session, &StopRecord).await?;
    info!("Recording stopped");
    Ok(())
}

/// Flip a source filter between enabled and disabled.
///
/// Reads the filter state, then writes its negation. Both requests run under
/// the session's lock for this (source, filter) pair, so toggles of the same
/// filter from this process never interleave. Changes made by other clients
/// between the two requests are not detected.
///
/// # Errors
///
/// A failed read is returned as-is and nothing is written. A failed write is
/// reported as `Backend`, or `Disconnected` if the session dropped.
pub async fn toggle_filter_enabled<C>(
    session: &C,
    source_name: &str,
    filter_name: &str,
) -> Result<(), CommandError>
where
    C: Connection + ?Sized,
{
    let _guard = session.filter_locks().acquire(source_name, filter_name).await;

    let current = send(
        session,
        &GetSourceFilter {
            source_name: source_name.to_string(),
            filter_name: filter_name.to_string(),
        },
    )
    .await?;
    debug!(
        "Filter '{}' on '{}' is {}",
        filter_name,
        source_name,
        enabled_label(current.filter_enabled)
    );

    let enabled = !current.filter_enabled;
    send(
        session,
        &SetSourceFilterEnabled {
            source_name: source_name.to_string(),
            filter_name: filter_name.to_string(),
            filter_enabled: enabled,
        },
    )
    .await
    .map_err(CommandError::into_backend)?;

    info!(
        "Filter '{}' on '{}' {}",
        filter_name,
        source_name,
        enabled_label(enabled)
    );
    Ok(())
}

fn enabled_label(enabled: bool) -> &'static str {
    if enabled { "enabled" } else { "disabled" }
}

fn log_output_toggle(output: &str, active: Option<bool>) {
    match active {
        Some(true) => info!("{} started", output),
        Some(false) => info!("{} stopped", output),
        None => info!("{} toggled", output),
    }
}
