//! Keypad action file (`keyboard_config.json`)

use crate::Result;
use crate::action::Action;
use std::path::Path;
use tracing::{debug, error};

/// Load the ordered action list.
///
/// A missing file yields an empty list; the router pads it to the keypad.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not a JSON array of
/// action records.
pub fn load_actions(path: &Path) -> Result<Vec<Action>> {
    if !path.exists() {
        debug!("No action file at {}", path.display());
        return Ok(Vec::new());
    }

    let content = std::fs::read_to_string(path)?;
    super::validation::warn_unknown_action_fields(&content, "keyboard_config.json");
    let actions = serde_json::from_str(&content)?;
    Ok(actions)
}

/// Like [`load_actions`], but logs failures and falls back to no actions.
#[must_use]
pub fn load_actions_or_default(path: &Path) -> Vec<Action> {
    load_actions(path).unwrap_or_else(|e| {
        error!(
            "Failed to load actions from {}: {}; all slots unassigned",
            path.display(),
            e
        );
        Vec::new()
    })
}

/// Write the action list as pretty JSON.
///
/// # Errors
///
/// Returns an error if the file cannot be written.
pub fn save_actions(path: &Path, actions: &[Action]) -> Result<()> {
    let content = serde_json::to_string_pretty(actions)?;
    std::fs::write(path, content)?;
    Ok(())
}
