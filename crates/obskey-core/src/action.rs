//! Keypad action descriptors.
//!
//! Actions are stored on disk as flat records with a human-readable kind
//! string (`"Toggle Mic"`, `"Run Program"`, ...) and optional parameters. The
//! in-memory [`Action`] is a sum type; kinds that are missing or unknown become
//! the explicit no-op variants instead of deserialization errors, so a single
//! bad slot never prevents the rest of the keypad from loading.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

pub const RUN_PROGRAM: &str = "Run Program";
pub const TOGGLE_STREAM: &str = "Toggle Stream";
pub const TOGGLE_RECORDING: &str = "Toggle Recording";
pub const TOGGLE_MIC: &str = "Toggle Mic";
pub const SET_SCENE: &str = "Set Scene";
pub const TOGGLE_FILTER: &str = "Toggle Filter";
pub const START_STREAM: &str = "Start Stream";
pub const STOP_STREAM: &str = "Stop Stream";
pub const START_RECORDING: &str = "Start Recording";
pub const STOP_RECORDING: &str = "Stop Recording";

/// Legacy kinds that name the scene directly
const SCENE_SHORTCUTS: [&str; 2] = ["Scene 1", "Scene 2"];

/// One controllable operation bound to a keypad slot
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Action {
    /// Empty slot
    #[default]
    Unassigned,
    RunProgram {
        command: String,
    },
    ToggleStream,
    ToggleRecording,
    ToggleMic,
    SetScene {
        scene: String,
    },
    ToggleFilter {
        source: String,
        filter: String,
    },
    StartStream,
    StopStream,
    StartRecording,
    StopRecording,
    /// A kind string this build does not know
    Unrecognized {
        kind: String,
    },
}

impl Action {
    /// Kind string as written in the action configuration
    #[must_use]
    pub fn kind(&self) -> &str {
        match self {
            Action::Unassigned => "",
            Action::RunProgram { .. } => RUN_PROGRAM,
            Action::ToggleStream => TOGGLE_STREAM,
            Action::ToggleRecording => TOGGLE_RECORDING,
            Action::ToggleMic => TOGGLE_MIC,
            Action::SetScene { .. } => SET_SCENE,
            Action::ToggleFilter { .. } => TOGGLE_FILTER,
            Action::StartStream => START_STREAM,
            Action::StopStream => STOP_STREAM,
            Action::StartRecording => START_RECORDING,
            Action::StopRecording => STOP_RECORDING,
            Action::Unrecognized { kind } => kind,
        }
    }

    /// Whether routing this action needs a live session
    #[must_use]
    pub fn needs_session(&self) -> bool {
        !matches!(
            self,
            Action::Unassigned | Action::RunProgram { .. } | Action::Unrecognized { .. }
        )
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Unassigned => write!(f, "(unassigned)"),
            Action::RunProgram { command } => write!(f, "{RUN_PROGRAM}: {command}"),
            Action::SetScene { scene } => write!(f, "{SET_SCENE}: {scene}"),
            Action::ToggleFilter { source, filter } => {
                write!(f, "{TOGGLE_FILTER}: {source} / {filter}")
            }
            Action::Unrecognized { kind } => write!(f, "(unrecognized: {kind})"),
            other => f.write_str(other.kind()),
        }
    }
}

/// On-disk shape of an action
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionRecord {
    #[serde(default, alias = "kind")]
    pub action: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scene: Option<String>,
}

impl From<ActionRecord> for Action {
    fn from(record: ActionRecord) -> Self {
        let ActionRecord {
            action,
            command,
            source,
            filter,
            scene,
        } = record;

        match action.trim() {
            "" => Action::Unassigned,
            RUN_PROGRAM => Action::RunProgram {
                command: command.unwrap_or_default(),
            },
            TOGGLE_STREAM => Action::ToggleStream,
            TOGGLE_RECORDING => Action::ToggleRecording,
            TOGGLE_MIC => Action::ToggleMic,
            SET_SCENE => Action::SetScene {
                scene: scene.unwrap_or_default(),
            },
            TOGGLE_FILTER => Action::ToggleFilter {
                source: source.unwrap_or_default(),
                filter: filter.unwrap_or_default(),
            },
            START_STREAM => Action::StartStream,
            STOP_STREAM => Action::StopStream,
            START_RECORDING => Action::StartRecording,
            STOP_RECORDING => Action::StopRecording,
            shortcut if SCENE_SHORTCUTS.contains(&shortcut) => Action::SetScene {
                scene: shortcut.to_string(),
            },
            other => Action::Unrecognized {
                kind: other.to_string(),
            },
        }
    }
}

impl From<&Action> for ActionRecord {
    fn from(action: &Action) -> Self {
        let mut record = ActionRecord {
            action: action.kind().to_string(),
            ..ActionRecord::default()
        };
        match action {
            Action::RunProgram { command } => record.command = Some(command.clone()),
            Action::SetScene { scene } => record.scene = Some(scene.clone()),
            Action::ToggleFilter { source, filter } => {
                record.source = Some(source.clone());
                record.filter = Some(filter.clone());
            }
            _ => {}
        }
        record
    }
}

impl Serialize for Action {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        ActionRecord::from(self).serialize(serializer)
    }
}

/// `null` entries load as unassigned slots
impl<'de> Deserialize<'de> for Action {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let record = Option::<ActionRecord>::deserialize(deserializer)?;
        Ok(record.map_or(Action::Unassigned, Action::from))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_strings_roundtrip_through_records() {
        let actions = [
            Action::RunProgram {
                command: "echo hi".to_string(),
            },
            Action::ToggleStream,
            Action::ToggleRecording,
            Action::ToggleMic,
            Action::SetScene {
                scene: "Scene 2".to_string(),
            },
            Action::ToggleFilter {
                source: "Camera".to_string(),
                filter: "Color Correction".to_string(),
            },
            Action::StartStream,
            Action::StopStream,
            Action::StartRecording,
            Action::StopRecording,
        ];

        for action in actions {
            let record = ActionRecord::from(&action);
            assert_eq!(Action::from(record), action);
        }
    }

    #[test]
    fn test_needs_session() {
        assert!(Action::ToggleMic.needs_session());
        assert!(!Action::Unassigned.needs_session());
        assert!(
            !Action::RunProgram {
                command: "true".to_string()
            }
            .needs_session()
        );
        assert!(
            !Action::Unrecognized {
                kind: "Launch Rocket".to_string()
            }
            .needs_session()
        );
    }

    #[test]
    fn test_display() {
        let action = Action::ToggleFilter {
            source: "Camera".to_string(),
            filter: "Blur".to_string(),
        };
        assert_eq!(action.to_string(), "Toggle Filter: Camera / Blur");
        assert_eq!(Action::ToggleMic.to_string(), "Toggle Mic");
        assert_eq!(Action::Unassigned.to_string(), "(unassigned)");
    }
}
