//! Tests for the command dispatcher
//!
//! Covers:
//! - Request types and parameters for each command
//! - Error mapping for not-found, backend and disconnected sessions
//! - The read-then-write filter toggle and its failure modes

use std::sync::Arc;
use std::time::Duration;

use obskey_rpc::{CommandError, Connection};
use serde_json::json;

use super::fixtures::FakeConnection;
use crate::dispatch;

#[tokio::test]
async fn test_set_scene_sends_one_request() {
    let session = FakeConnection::new();

    dispatch::set_scene(&session, "Scene 2").await.unwrap();

    let calls = session.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].request_type, "SetCurrentProgramScene");
    assert_eq!(calls[0].data, Some(json!({"sceneName": "Scene 2"})));
}

#[tokio::test]
async fn test_set_scene_not_found() {
    let session = FakeConnection::new();
    session.respond(
        "SetCurrentProgramScene",
        Err(CommandError::NotFound("No source was found".to_string())),
    );

    let err = dispatch::set_scene(&session, "Scene 9").await.unwrap_err();
    assert!(matches!(err, CommandError::NotFound(_)));
}

#[tokio::test]
async fn test_set_scene_on_closed_session() {
    let session = FakeConnection::new();
    session.disconnect().await;

    let err = dispatch::set_scene(&session, "Scene 1").await.unwrap_err();
    assert_eq!(err, CommandError::Disconnected);
    assert!(session.calls().is_empty());
}

#[tokio::test]
async fn test_toggle_mic_targets_default_input() {
    let session = FakeConnection::new();
    session.respond("ToggleInputMute", Ok(json!({"inputMuted": true})));

    dispatch::toggle_mic(&session).await.unwrap();

    let calls = session.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].request_type, "ToggleInputMute");
    assert_eq!(calls[0].field("inputName"), Some(&json!("Mic/Aux")));
}

#[tokio::test]
async fn test_toggle_input_mute_custom_input() {
    let session = FakeConnection::new();
    session.respond("ToggleInputMute", Ok(json!({"inputMuted": false})));

    dispatch::toggle_input_mute(&session, "Desktop Audio")
        .await
        .unwrap();

    assert_eq!(
        session.calls()[0].field("inputName"),
        Some(&json!("Desktop Audio"))
    );
}

#[tokio::test]
async fn test_toggle_mic_malformed_response_is_backend() {
    let session = FakeConnection::new();
    session.respond("ToggleInputMute", Ok(json!({"unexpected": 1})));

    let err = dispatch::toggle_mic(&session).await.unwrap_err();
    assert!(matches!(err, CommandError::Backend { code: None, .. }));
}

#[tokio::test]
async fn test_output_toggles_send_no_data() {
    let session = FakeConnection::new();
    session.respond("ToggleStream", Ok(json!({"outputActive": true})));

    dispatch::toggle_streaming(&session).await.unwrap();
    dispatch::toggle_recording(&session).await.unwrap();

    let calls = session.calls();
    assert_eq!(session.request_types(), vec!["ToggleStream", "ToggleRecord"]);
    assert!(calls.iter().all(|call| call.data.is_none()));
}

#[tokio::test]
async fn test_start_stop_outputs() {
    let session = FakeConnection::new();

    dispatch::start_streaming(&session).await.unwrap();
    dispatch::stop_streaming(&session).await.unwrap();
    dispatch::start_recording(&session).await.unwrap();
    dispatch::stop_recording(&session).await.unwrap();

    assert_eq!(
        session.request_types(),
        vec!["StartStream", "StopStream", "StartRecord", "StopRecord"]
    );
}

#[tokio::test]
async fn test_start_stream_already_active() {
    let session = FakeConnection::new();
    session.respond(
        "StartStream",
        Err(CommandError::Backend {
            code: Some(500),
            message: "Output already running".to_string(),
        }),
    );

    let err = dispatch::start_streaming(&session).await.unwrap_err();
    assert!(matches!(err, CommandError::Backend { code: Some(500), .. }));
}

#[tokio::test]
async fn test_toggle_filter_writes_negated_state() {
    let session = FakeConnection::new().with_filter("Camera", "Color Correction", true);

    dispatch::toggle_filter_enabled(&session, "Camera", "Color Correction")
        .await
        .unwrap();

    let calls = session.calls();
    assert_eq!(
        session.request_types(),
        vec!["GetSourceFilter", "SetSourceFilterEnabled"]
    );
    assert_eq!(
        calls[0].data,
        Some(json!({"sourceName": "Camera", "filterName": "Color Correction"}))
    );
    assert_eq!(
        calls[1].data,
        Some(json!({
            "sourceName": "Camera",
            "filterName": "Color Correction",
            "filterEnabled": false
        }))
    );
    assert_eq!(
        session.filter_enabled("Camera", "Color Correction"),
        Some(false)
    );
}

#[tokio::test]
async fn test_toggle_filter_enables_disabled_filter() {
    let session = FakeConnection::new().with_filter("Camera", "Blur", false);

    dispatch::toggle_filter_enabled(&session, "Camera", "Blur")
        .await
        .unwrap();

    assert_eq!(session.calls()[1].field("filterEnabled"), Some(&json!(true)));
}

#[tokio::test]
async fn test_toggle_filter_read_failure_skips_write() {
    let session = FakeConnection::new();

    let err = dispatch::toggle_filter_enabled(&session, "Camera", "Missing")
        .await
        .unwrap_err();

    assert!(matches!(err, CommandError::NotFound(_)));
    assert_eq!(session.request_types(), vec!["GetSourceFilter"]);
}

#[tokio::test]
async fn test_toggle_filter_write_not_found_becomes_backend() {
    let session = FakeConnection::new().with_filter("Camera", "Blur", true);
    session.respond(
        "SetSourceFilterEnabled",
        Err(CommandError::NotFound("No filter was found".to_string())),
    );

    let err = dispatch::toggle_filter_enabled(&session, "Camera", "Blur")
        .await
        .unwrap_err();

    assert!(matches!(err, CommandError::Backend { .. }));
    assert_eq!(session.calls().len(), 2);
}

#[tokio::test]
async fn test_toggle_filter_write_disconnect_stays_disconnected() {
    let session = FakeConnection::new().with_filter("Camera", "Blur", true);
    session.respond("SetSourceFilterEnabled", Err(CommandError::Disconnected));

    let err = dispatch::toggle_filter_enabled(&session, "Camera", "Blur")
        .await
        .unwrap_err();

    assert_eq!(err, CommandError::Disconnected);
}

#[tokio::test]
async fn test_toggle_filter_malformed_read() {
    let session = FakeConnection::new();
    session.respond("GetSourceFilter", Ok(json!({"filterIndex": 2})));

    let err = dispatch::toggle_filter_enabled(&session, "Camera", "Blur")
        .await
        .unwrap_err();

    assert!(matches!(err, CommandError::Backend { .. }));
    assert_eq!(session.request_types(), vec!["GetSourceFilter"]);
}

#[tokio::test]
async fn test_concurrent_toggles_of_same_filter_do_not_interleave() {
    let session = Arc::new(
        FakeConnection::new()
            .with_delay(Duration::from_millis(10))
            .with_filter("Camera", "Blur", true),
    );

    let first = {
        let session = session.clone();
        tokio::spawn(async move {
            dispatch::toggle_filter_enabled(session.as_ref(), "Camera", "Blur").await
        })
    };
    let second = {
        let session = session.clone();
        tokio::spawn(async move {
            dispatch::toggle_filter_enabled(session.as_ref(), "Camera", "Blur").await
        })
    };

    first.await.unwrap().unwrap();
    second.await.unwrap().unwrap();

    assert_eq!(
        session.request_types(),
        vec![
            "GetSourceFilter",
            "SetSourceFilterEnabled",
            "GetSourceFilter",
            "SetSourceFilterEnabled"
        ]
    );
    // Two toggles cancel out
    assert_eq!(session.filter_enabled("Camera", "Blur"), Some(true));
}
