//! Local program launches for `Run Program` slots.

use std::process::Stdio;

use tokio::process::Command;
use tracing::{debug, warn};

/// Starts local commands without waiting for them
pub trait Launcher: Send + Sync {
    /// Fire-and-forget. Failures are logged, never returned.
    fn launch(&self, command: &str);
}

/// Runs commands through `/bin/sh -c` with all stdio discarded
#[derive(Debug, Clone, Copy, Default)]
pub struct ShellLauncher;

impl ShellLauncher {
    const SHELL: &'static str = "/bin/sh";
}

impl Launcher for ShellLauncher {
    fn launch(&self, command: &str) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!("Cannot launch '{}': no async runtime", command);
            return;
        };

        let command = command.to_string();
        // Detached: the task only reaps the child
        runtime.spawn(async move {
            let child = Command::new(ShellLauncher::SHELL)
                .arg("-c")
                .arg(&command)
                .stdin(Stdio::null())
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .spawn();

            match child {
                Ok(mut child) => {
                    debug!("Launched '{}' (pid {:?})", command, child.id());
                    if let Ok(status) = child.wait().await {
                        debug!("'{}' exited with {}", command, status);
                    }
                }
                Err(e) => warn!("Failed to launch '{}': {}", command, e),
            }
        });
    }
}
