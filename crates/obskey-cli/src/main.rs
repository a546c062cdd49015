//! obskey CLI
//!
//! Front-end for the macro keypad. Provides:
//! - Default: read slot presses from stdin and route them to OBS
//! - One-shot commands for single slots and direct OBS control
//! - Queries and validation of the configured actions

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use obskey_core::config::{Config, Directories, load_actions_or_default, write_defaults};
use obskey_core::layout::{resolve_slot, slot_label, slot_labels};
use obskey_core::{Action, Router, ShellLauncher, dispatch, query};
use obskey_rpc::{ConnectionError, Session};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::task::JoinSet;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// obskey - OBS Studio control from a macro keypad
#[derive(Parser)]
#[command(name = "obskey")]
#[command(about = "Route macro keypad presses to OBS Studio over obs-websocket")]
#[command(version)]
#[command(after_help = "\
Examples:
  obskey                          Listen for slot presses on stdin
  obskey press \"Key 4\"            Run the action bound to Key 4
  obskey slots                    Show the keypad layout and bound actions
  obskey scene \"Scene 2\"          Switch the program scene
  obskey filter Camera Blur       Toggle a filter on a source
  obskey check                    Validate configured actions against OBS
  obskey init                     Write default config and action files

Keybinding examples (Hyprland):
  bind = , F13, exec, obskey press \"Key 1\"
  bind = , F14, exec, obskey press \"Key 2\"

Environment:
  OBS_HOST, OBS_PORT, OBS_PASSWORD override config.json
  RUST_LOG controls log verbosity (default obskey=info)
")]
struct Cli {
    /// obs-websocket host
    #[arg(long, global = true)]
    host: Option<String>,

    /// obs-websocket port
    #[arg(long, global = true)]
    port: Option<u16>,

    /// obs-websocket password
    #[arg(long, global = true)]
    password: Option<String>,

    /// Config file (default ~/.config/obskey/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Action slots file (default ~/.config/obskey/keyboard_config.json)
    #[arg(long, global = true)]
    actions: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Read slot ids (index or label) from stdin, one per line
    Listen,

    /// Run the action bound to one slot
    Press {
        /// Slot index (0-17) or label such as "Key 3"
        slot: String,
    },

    /// Show the keypad layout with configured actions
    Slots,

    /// Switch the program scene
    Scene {
        name: String,
    },

    /// Toggle mute on the mic input
    Mic {
        /// Input to toggle instead of the configured mic input
        #[arg(long)]
        input: Option<String>,
    },

    /// Control streaming
    Stream {
        #[arg(value_enum, default_value_t = OutputOp::Toggle)]
        op: OutputOp,
    },

    /// Control recording
    Record {
        #[arg(value_enum, default_value_t = OutputOp::Toggle)]
        op: OutputOp,
    },

    /// Toggle a filter on a source
    Filter {
        source: String,
        filter: String,
    },

    /// List OBS inputs
    Inputs,

    /// List filters on a source
    Filters {
        source: String,
    },

    /// Show OBS and obs-websocket versions
    Version,

    /// Check configured actions against OBS
    Check,

    /// Write a default config file and an empty action file
    Init {
        /// Replace files that already exist
        #[arg(long)]
        force: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputOp {
    Start,
    Stop,
    Toggle,
}

/// Resolved configuration for one invocation
struct Settings {
    config: Config,
    /// Empty when no location could be determined
    config_file: PathBuf,
    actions_file: PathBuf,
}

fn setup_logging() {
    let default_level = if cfg!(debug_assertions) {
        "debug"
    } else {
        "info"
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("obskey={default_level}")));

    if cfg!(debug_assertions) {
        let temp_dir = std::env::temp_dir();
        let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
        let log_filename = format!("obskey-{timestamp}.log");
        let log_path = temp_dir.join(&log_filename);

        #[cfg(unix)]
        {
            let symlink_path = temp_dir.join("obskey.log");
            let _ = std::fs::remove_file(&symlink_path);
            let _ = std::os::unix::fs::symlink(&log_path, &symlink_path);
        }

        let file_appender = tracing_appender::rolling::never(&temp_dir, &log_filename);
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        std::mem::forget(guard);

        let file_layer = fmt::layer()
            .with_writer(non_blocking)
            .with_ansi(false)
            .with_target(true)
            .with_line_number(true);

        let stderr_layer = fmt::layer()
            .with_writer(std::io::stderr)
            .with_ansi(true)
            .with_target(true)
            .with_line_number(true);

        tracing_subscriber::registry()
            .with(file_layer)
            .with(stderr_layer)
            .with(filter)
            .init();

        eprintln!("Logging to: {} (and stderr)", log_path.display());
    } else {
        tracing_subscriber::registry()
            .with(fmt::layer().with_writer(std::io::stderr))
            .with(filter)
            .init();
    }
}

/// Config file, then environment, then flags
fn load_settings(cli: &Cli) -> Result<Settings> {
    let dirs = Directories::new();

    let config_file = match (&cli.config, &dirs) {
        (Some(path), _) => path.clone(),
        (None, Ok(dirs)) => dirs.config_file.clone(),
        (None, Err(e)) => {
            warn!("{}; using default config", e);
            PathBuf::new()
        }
    };

    let mut config = if config_file.as_os_str().is_empty() {
        Config::default()
    } else {
        Config::load(&config_file).unwrap_or_else(|e| {
            error!(
                "Failed to load {}: {}; using defaults",
                config_file.display(),
                e
            );
            Config::default()
        })
    };

    config.connection.apply_env();
    if let Some(host) = &cli.host {
        config.connection.host.clone_from(host);
    }
    if let Some(port) = cli.port {
        config.connection.port = port;
    }
    if let Some(password) = &cli.password {
        config.connection.password.clone_from(password);
    }

    let actions_file = match (&cli.actions, &config.actions_file, dirs) {
        (Some(path), _, _) | (None, Some(path), _) => path.clone(),
        (None, None, Ok(dirs)) => dirs.actions_file,
        (None, None, Err(e)) => return Err(e).context("No actions file location available"),
    };

    Ok(Settings {
        config,
        config_file,
        actions_file,
    })
}

/// Connect, retrying up to the configured number of attempts
async fn connect(settings: &Settings) -> Result<Session, ConnectionError> {
    let connection = &settings.config.connection;
    let attempts = connection.attempts();
    let options = connection.to_connect_options();

    let mut attempt = 1;
    loop {
        match Session::connect(options.clone()).await {
            Ok(session) => return Ok(session),
            Err(e) if attempt < attempts => {
                warn!("Connection attempt {}/{} failed: {}", attempt, attempts, e);
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Connect for a one-shot command that cannot run without OBS
async fn require_session(settings: &Settings) -> Result<Session> {
    connect(settings).await.with_context(|| {
        format!(
            "Failed to connect to OBS at {}",
            settings.config.connection.to_connect_options().address()
        )
    })
}

/// Build the router, falling back to degraded mode when OBS is unreachable
async fn build_router(settings: &Settings) -> Router<Session> {
    let session = match connect(settings).await {
        Ok(session) => Some(Arc::new(session)),
        Err(e) => {
            warn!("Could not connect to OBS: {}", e);
            None
        }
    };

    let actions = load_actions_or_default(&settings.actions_file);
    Router::new(actions, session, ShellLauncher).with_mic_input(&settings.config.mic_input)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging();

    let settings = load_settings(&cli)?;

    match cli.command {
        None | Some(Commands::Listen) => run_listen(&settings).await,
        Some(Commands::Press { slot }) => run_press(&settings, &slot).await,
        Some(Commands::Slots) => {
            run_slots(&settings);
            Ok(())
        }
        Some(Commands::Scene { name }) => {
            with_session(&settings, |s| async move { dispatch::set_scene(&*s, &name).await }).await
        }
        Some(Commands::Mic { input }) => {
            let input = input.unwrap_or_else(|| settings.config.mic_input.clone());
            with_session(&settings, |s| async move {
                dispatch::toggle_input_mute(&*s, &input).await
            })
            .await
        }
        Some(Commands::Stream { op }) => {
            with_session(&settings, |s| async move {
                match op {
                    OutputOp::Start => dispatch::start_streaming(&*s).await,
                    OutputOp::Stop => dispatch::stop_streaming(&*s).await,
                    OutputOp::Toggle => dispatch::toggle_streaming(&*s).await,
                }
            })
            .await
        }
        Some(Commands::Record { op }) => {
            with_session(&settings, |s| async move {
                match op {
                    OutputOp::Start => dispatch::start_recording(&*s).await,
                    OutputOp::Stop => dispatch::stop_recording(&*s).await,
                    OutputOp::Toggle => dispatch::toggle_recording(&*s).await,
                }
            })
            .await
        }
        Some(Commands::Filter { source, filter }) => {
            with_session(&settings, |s| async move {
                dispatch::toggle_filter_enabled(&*s, &source, &filter).await
            })
            .await
        }
        Some(Commands::Inputs) => run_inputs(&settings).await,
        Some(Commands::Filters { source }) => run_filters(&settings, &source).await,
        Some(Commands::Version) => run_version(&settings).await,
        Some(Commands::Check) => run_check(&settings).await,
        Some(Commands::Init { force }) => run_init(&settings, force),
    }
}

/// Run one dispatcher call on a fresh session, then disconnect
async fn with_session<F, Fut>(settings: &Settings, command: F) -> Result<()>
where
    F: FnOnce(Arc<Session>) -> Fut,
    Fut: Future<Output = Result<(), obskey_rpc::CommandError>>,
{
    let session = Arc::new(require_session(settings).await?);
    let result = command(session.clone()).await;
    session.disconnect().await;
    result.map_err(anyhow::Error::from)
}

async fn run_listen(settings: &Settings) -> Result<()> {
    let router = Arc::new(build_router(settings).await);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut presses = JoinSet::new();

    match router.session() {
        Some(session) => info!(
            "Listening for slot presses on stdin (OBS at {}:{}, mic input '{}')",
            session.host(),
            session.port(),
            router.mic_input()
        ),
        None => info!("Listening for slot presses on stdin; only Run Program slots will work"),
    }

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("Failed to read stdin")? else {
                    info!("Input closed");
                    while presses.join_next().await.is_some() {}
                    break;
                };
                let id = line.trim();
                if id.is_empty() {
                    continue;
                }
                let Some(slot) = resolve_slot(id) else {
                    warn!("Unknown slot '{}'", id);
                    continue;
                };
                let router = router.clone();
                presses.spawn(async move {
                    if let Err(e) = router.dispatch(slot).await {
                        error!("{} failed: {}", slot_label(slot).unwrap_or_default(), e);
                    }
                });
            }
            Some(_) = presses.join_next(), if !presses.is_empty() => {}
            _ = &mut ctrl_c => {
                info!("Interrupted");
                break;
            }
        }
    }

    router.shutdown().await;
    Ok(())
}

async fn run_press(settings: &Settings, id: &str) -> Result<()> {
    let Some(slot) = resolve_slot(id) else {
        bail!("Unknown slot '{id}'");
    };

    let router = build_router(settings).await;
    let result = router.dispatch(slot).await;
    router.shutdown().await;

    result.with_context(|| format!("{} failed", slot_label(slot).unwrap_or_default()))
}

fn run_slots(settings: &Settings) {
    let actions = load_actions_or_default(&settings.actions_file);
    let router: Router<Session> = Router::new(actions, None, ShellLauncher);

    println!("Actions from {}:", settings.actions_file.display());
    for (index, (label, action)) in slot_labels().iter().zip(router.slots()).enumerate() {
        if *action == Action::Unassigned {
            println!("  {index:>2}  {label:<7} -");
        } else {
            println!("  {index:>2}  {label:<7} {action}");
        }
    }
}

async fn run_inputs(settings: &Settings) -> Result<()> {
    let session = require_session(settings).await?;
    let inputs = query::list_inputs(&session).await;
    session.disconnect().await;

    let inputs = inputs.context("Failed to list inputs")?;
    if inputs.is_empty() {
        println!("No inputs");
    }
    for input in inputs {
        match input.input_kind {
            Some(kind) => println!("{}  ({kind})", input.input_name),
            None => println!("{}", input.input_name),
        }
    }
    Ok(())
}

async fn run_filters(settings: &Settings, source: &str) -> Result<()> {
    let session = require_session(settings).await?;
    let filters = query::list_filters(&session, source).await;
    session.disconnect().await;

    let filters = filters.with_context(|| format!("Failed to list filters on '{source}'"))?;
    if filters.is_empty() {
        println!("No filters on '{source}'");
    }
    for filter in filters {
        let state = match filter.filter_enabled {
            Some(true) => "on",
            Some(false) => "off",
            None => "?",
        };
        println!("[{state:>3}] {}", filter.filter_name);
    }
    Ok(())
}

async fn run_version(settings: &Settings) -> Result<()> {
    let session = require_session(settings).await?;
    let version = query::version(&session).await;
    let server = session.server().clone();
    session.disconnect().await;

    let version = version.context("Failed to query version")?;
    println!("OBS Studio:    {}", version.obs_version);
    println!("obs-websocket: {}", version.obs_web_socket_version);
    println!(
        "RPC version:   {} (negotiated {})",
        version.rpc_version, server.negotiated_rpc_version
    );
    if let Some(platform) = version.platform_description {
        println!("Platform:      {platform}");
    }
    Ok(())
}

async fn run_check(settings: &Settings) -> Result<()> {
    let actions = load_actions_or_default(&settings.actions_file);
    let session = require_session(settings).await?;
    let findings = query::validate_actions(&session, &actions, &settings.config.mic_input).await;
    session.disconnect().await;

    let findings = findings.context("Validation failed")?;
    if findings.is_empty() {
        println!("All configured actions resolve");
        return Ok(());
    }

    for finding in &findings {
        println!("- {finding}");
    }
    bail!("{} unresolved reference(s)", findings.len());
}

fn run_init(settings: &Settings, force: bool) -> Result<()> {
    if settings.config_file.as_os_str().is_empty() {
        bail!("No config file location available; pass --config");
    }

    let written = write_defaults(&settings.config_file, &settings.actions_file, force)
        .context("Failed to write default files")?;

    for path in [&settings.config_file, &settings.actions_file] {
        if written.contains(path) {
            println!("Wrote {}", path.display());
        } else {
            println!("Kept {} (use --force to replace)", path.display());
        }
    }
    Ok(())
}
