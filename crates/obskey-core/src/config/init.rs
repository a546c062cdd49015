//! First-run scaffolding for the config and action files.

use std::path::{Path, PathBuf};

use tracing::info;

use super::{Config, Directories, save_actions};
use crate::Result;
use crate::action::Action;
use crate::layout::SLOT_COUNT;

/// Write a default config file and an action file with every slot unassigned.
///
/// Existing files are kept unless `overwrite` is set. Returns the files written.
///
/// # Errors
///
/// Returns an error if a directory cannot be created or a file cannot be written.
pub fn write_defaults(
    config_file: &Path,
    actions_file: &Path,
    overwrite: bool,
) -> Result<Vec<PathBuf>> {
    let mut written = Vec::new();

    if prepare(config_file, overwrite)? {
        Config::default().save(config_file)?;
        written.push(config_file.to_path_buf());
    }

    if prepare(actions_file, overwrite)? {
        let slots = vec![Action::Unassigned; SLOT_COUNT];
        save_actions(actions_file, &slots)?;
        written.push(actions_file.to_path_buf());
    }

    Ok(written)
}

/// Create the parent directory. False when an existing file is kept.
fn prepare(path: &Path, overwrite: bool) -> Result<bool> {
    if path.exists() && !overwrite {
        info!("Keeping existing {}", path.display());
        return Ok(false);
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        Directories::with_base(parent.to_path_buf()).ensure_exists()?;
    }
    Ok(true)
}
