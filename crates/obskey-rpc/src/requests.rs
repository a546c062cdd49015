//! Typed obs-websocket requests.
//!
//! Each request type pairs its `requestData` shape with the `responseData`
//! shape it produces. Only the requests obskey issues are modelled here.

use serde::de::{DeserializeOwned, IgnoredAny};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::client::Connection;
use crate::error::{CommandError, Result};

/// A request with a fixed `requestType` and typed response data
pub trait ObsRequest: Serialize + Sync {
    const REQUEST_TYPE: &'static str;
    type Response: DeserializeOwned;
}

/// Send a typed request over a connection and decode its response data.
///
/// A response without `responseData` decodes as an empty object.
///
/// # Errors
///
/// Returns the connection's `CommandError`, or `CommandError::Backend` when the
/// response data does not match the expected shape.
pub async fn send<C, R>(connection: &C, request: &R) -> Result<R::Response>
where
    C: Connection + ?Sized,
    R: ObsRequest,
{
    let request_data = match serde_json::to_value(request)
        .map_err(|e| CommandError::backend(format!("failed to encode {}: {e}", R::REQUEST_TYPE)))?
    {
        Value::Null => None,
        Value::Object(map) if map.is_empty() => None,
        data => Some(data),
    };

    let response_data = match connection.call(R::REQUEST_TYPE, request_data).await? {
        Value::Null => Value::Object(serde_json::Map::new()),
        data => data,
    };

    serde_json::from_value(response_data).map_err(|e| {
        CommandError::backend(format!(
            "malformed {} response: {e}",
            R::REQUEST_TYPE
        ))
    })
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SetCurrentProgramScene {
    pub scene_name: String,
}

impl ObsRequest for SetCurrentProgramScene {
    const REQUEST_TYPE: &'static str = "SetCurrentProgramScene";
    type Response = IgnoredAny;
}

#[derive(Debug, Clone, Serialize)]
pub struct GetSceneList;

impl ObsRequest for GetSceneList {
    const REQUEST_TYPE: &'static str = "GetSceneList";
    type Response = SceneList;
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneList {
    #[serde(default)]
    pub current_program_scene_name: Option<String>,
    #[serde(default)]
    pub scenes: Vec<SceneEntry>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneEntry {
    pub scene_name: String,
    #[serde(default)]
    pub scene_index: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToggleInputMute {
    pub input_name: String,
}

impl ObsRequest for ToggleInputMute {
    const REQUEST_TYPE: &'static str = "ToggleInputMute";
    type Response = InputMuteState;
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputMuteState {
    pub input_muted: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ToggleStream;

impl ObsRequest for ToggleStream {
    const REQUEST_TYPE: &'static str = "ToggleStream";
    type Response = OutputState;
}

#[derive(Debug, Clone, Serialize)]
pub struct ToggleRecord;

impl ObsRequest for ToggleRecord {
    const REQUEST_TYPE: &'static str = "ToggleRecord";
    type Response = OutputState;
}

/// Output state reported after a toggle; older servers omit it for recording
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputState {
    #[serde(default)]
    pub output_active: Option<bool>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StartStream;

impl ObsRequest for StartStream {
    const REQUEST_TYPE: &'static str = "StartStream";
    type Response = IgnoredAny;
}

#[derive(Debug, Clone, Serialize)]
pub struct StopStream;

impl ObsRequest for StopStream {
    const REQUEST_TYPE: &'static str = "StopStream";
    type Response = IgnoredAny;
}

#[derive(Debug, Clone, Serialize)]
pub struct StartRecord;

impl ObsRequest for StartRecord {
    const REQUEST_TYPE: &'static str = "StartRecord";
    type Response = IgnoredAny;
}

#[derive(Debug, Clone, Serialize)]
pub struct StopRecord;

impl ObsRequest for StopRecord {
    const REQUEST_TYPE: &'static str = "StopRecord";
    type Response = IgnoredAny;
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GetSourceFilter {
    pub source_name: String,
    pub filter_name: String,
}

impl ObsRequest for GetSourceFilter {
    const REQUEST_TYPE: &'static str = "GetSourceFilter";
    type Response = SourceFilter;
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceFilter {
    pub filter_enabled: bool,
    #[serde(default)]
    pub filter_index: Option<u32>,
    #[serde(default)]
    pub filter_kind: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SetSourceFilterEnabled {
    pub source_name: String,
    pub filter_name: String,
    pub filter_enabled: bool,
}

impl ObsRequest for SetSourceFilterEnabled {
    const REQUEST_TYPE: &'static str = "SetSourceFilterEnabled";
    type Response = IgnoredAny;
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GetInputList {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_kind: Option<String>,
}

impl ObsRequest for GetInputList {
    const REQUEST_TYPE: &'static str = "GetInputList";
    type Response = InputList;
}

#[derive(Debug, Clone, Deserialize)]
pub struct InputList {
    #[serde(default)]
    pub inputs: Vec<InputEntry>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputEntry {
    pub input_name: String,
    #[serde(default)]
    pub input_kind: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GetSourceFilterList {
    pub source_name: String,
}

impl ObsRequest for GetSourceFilterList {
    const REQUEST_TYPE: &'static str = "GetSourceFilterList";
    type Response = FilterList;
}

#[derive(Debug, Clone, Deserialize)]
pub struct FilterList {
    #[serde(default)]
    pub filters: Vec<FilterEntry>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterEntry {
    pub filter_name: String,
    #[serde(default)]
    pub filter_enabled: Option<bool>,
    #[serde(default)]
    pub filter_kind: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GetVersion;

impl ObsRequest for GetVersion {
    const REQUEST_TYPE: &'static str = "GetVersion";
    type Response = VersionInfo;
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionInfo {
    pub obs_version: String,
    pub obs_web_socket_version: String,
    pub rpc_version: u32,
    #[serde(default)]
    pub platform_description: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_unit_requests_serialize_to_null() {
        assert_eq!(serde_json::to_value(ToggleStream).unwrap(), Value::Null);
        assert_eq!(serde_json::to_value(GetVersion).unwrap(), Value::Null);
    }

    #[test]
    fn test_request_field_names() {
        let value = serde_json::to_value(SetSourceFilterEnabled {
            source_name: "Camera".to_string(),
            filter_name: "Color Correction".to_string(),
            filter_enabled: false,
        })
        .unwrap();
        assert_eq!(
            value,
            json!({
                "sourceName": "Camera",
                "filterName": "Color Correction",
                "filterEnabled": false
            })
        );
    }

    #[test]
    fn test_get_input_list_omits_kind() {
        let value = serde_json::to_value(GetInputList::default()).unwrap();
        assert_eq!(value, json!({}));
    }

    #[test]
    fn test_ignored_response_accepts_any_object() {
        assert!(serde_json::from_value::<IgnoredAny>(json!({})).is_ok());
        assert!(serde_json::from_value::<IgnoredAny>(json!({"outputPath": "/tmp/a.mkv"})).is_ok());
    }

    #[test]
    fn test_source_filter_response() {
        let filter: SourceFilter = serde_json::from_value(json!({
            "filterEnabled": true,
            "filterIndex": 0,
            "filterKind": "color_filter_v2",
            "filterSettings": {}
        }))
        .unwrap();
        assert!(filter.filter_enabled);
        assert_eq!(filter.filter_kind.as_deref(), Some("color_filter_v2"));
    }

    #[test]
    fn test_output_state_tolerates_missing_field() {
        let state: OutputState = serde_json::from_value(json!({})).unwrap();
        assert!(state.output_active.is_none());

        let state: OutputState = serde_json::from_value(json!({"outputActive": true})).unwrap();
        assert_eq!(state.output_active, Some(true));
    }
}
