mod actions;
mod dirs;
mod init;
mod settings;
mod validation;

pub use actions::{load_actions, load_actions_or_default, save_actions};
pub use dirs::Directories;
pub use init::write_defaults;
pub use settings::{Config, ConnectionConfig, ENV_HOST, ENV_PASSWORD, ENV_PORT};
pub use validation::{warn_unknown_action_fields, warn_unknown_fields};
