//! LG TV remote: command-line entry point.
//!
//! # Usage
//!
//! ```text
//! lgtv-remote [OPTIONS] <COMMAND>
//!
//! Commands:
//!   connect       Connect (using the stored pairing key) and save the key
//!   pair          Connect without a key so the TV shows its pairing prompt
//!   disconnect    Close the connection
//!   status        Show the session state and stored TV (does not connect)
//!   volume-up     Raise the volume one step
//!   volume-down   Lower the volume one step
//!   mute          Toggle mute
//!   power-off     Turn the TV off
//!   button        Press a remote button (UP, DOWN, OK, HOME, PLAY, ...)
//!   launch        Launch an app by name ("Netflix", "Disney+", ...)
//!   launch-id     Launch an app by its exact webOS id
//!   apps          List the installed apps
//!   aliases       List the built-in app names usable with `launch`
//!   interactive   Read commands from stdin, one per line
//!
//! Options:
//!   --address <ADDR>       TV address [env: LGTV_ADDRESS] (default: stored address)
//!   --config <PATH>        Config file [env: LGTV_CONFIG]
//!   --mock                 Use an in-memory TV instead of the network
//!   --timeout-secs <SECS>  Per-command timeout override
//!   -v, -vv                More logging (RUST_LOG wins when set)
//! ```
//!
//! # Threading
//!
//! `main` is synchronous.  The async runtime lives on the command bridge's
//! worker thread; every call below blocks until the worker answers or the
//! timeout elapses.  In `interactive` mode each input line runs on its own
//! thread, so a slow command does not stop the next line from being read.

use std::io::BufRead;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::{ArgAction, Parser, Subcommand};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use lgtv_core::{Button, RemoteError};
use lgtv_remote::application::controller::{ControllerSettings, SessionController};
use lgtv_remote::infrastructure::device::{MockDevice, WebOsClient, WebOsConfig};
use lgtv_remote::infrastructure::storage::config::{
    AppConfig, ConfigStore, MemoryConfigStore, TomlConfigStore,
};

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Remote control for LG webOS TVs.
#[derive(Debug, Parser)]
#[command(name = "lgtv-remote", about = "Remote control for LG webOS TVs", version)]
struct Cli {
    /// IP address or hostname of the TV.  Defaults to the stored address.
    #[arg(long, global = true, env = "LGTV_ADDRESS")]
    address: Option<String>,

    /// Path of the TOML config file.  Defaults to the platform config dir.
    #[arg(long, global = true, env = "LGTV_CONFIG")]
    config: Option<PathBuf>,

    /// Drive an in-memory TV instead of a real one (nothing is saved).
    #[arg(long, global = true)]
    mock: bool,

    /// Seconds to wait for any single command (connect excluded).
    #[arg(long, global = true)]
    timeout_secs: Option<u64>,

    /// Increase log verbosity (-v debug, -vv trace).
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Debug, Subcommand)]
enum CliCommand {
    /// Connect using the stored pairing key and save the key the TV returns.
    Connect,
    /// Start a fresh pairing; accept the prompt on the TV.
    Pair,
    /// Close the connection.
    Disconnect,
    /// Show the session state and the stored TV without connecting.
    Status,
    /// Raise the volume one step.
    VolumeUp,
    /// Lower the volume one step.
    VolumeDown,
    /// Toggle mute.
    Mute,
    /// Turn the TV off.
    PowerOff,
    /// Press a remote-control button.
    Button { name: Button },
    /// Launch an app by name.
    Launch { name: String },
    /// Launch an app by its exact webOS id.
    LaunchId { id: String },
    /// List installed apps.
    Apps,
    /// List the built-in app names.
    Aliases,
    /// Read commands from stdin, one per line (`help` lists them).
    Interactive,
}

/// One thing a user can ask for once a connection is up.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Action {
    VolumeUp,
    VolumeDown,
    Mute,
    PowerOff,
    Press(Button),
    Launch(String),
    LaunchId(String),
    Apps,
    Status,
}

const INTERACTIVE_HELP: &str = "\
commands: vol+ | vol- | mute | off | apps | status
          launch <name> | id <app-id> | <button>   (up, down, left, right, ok,
          home, back, play, pause, stop, rewind, ff)
          quit";

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let toml_store = match &cli.config {
        Some(path) => TomlConfigStore::new(path),
        None => TomlConfigStore::at_default_location()
            .context("cannot locate the config directory; pass --config")?,
    };
    let config = toml_store
        .load()
        .with_context(|| format!("failed to read {}", toml_store.path().display()))?;

    init_tracing(&config, cli.verbose);
    debug!("config file: {}", toml_store.path().display());

    let mut settings = ControllerSettings::from(&config.remote);
    if let Some(secs) = cli.timeout_secs {
        settings.command_timeout = Duration::from_secs(secs);
    }
    let address = cli
        .address
        .clone()
        .unwrap_or_else(|| config.tv.address.clone());

    if cli.mock {
        info!("using the in-memory mock TV");
        let store = MemoryConfigStore::new(config.tv.clone());
        let controller = SessionController::new(Box::new(MockDevice::demo()), store, settings)
            .context("failed to start the command bridge")?;
        run(&controller, &address, cli.command)
    } else {
        let client = WebOsClient::new(WebOsConfig {
            port: config.remote.port,
            request_timeout: settings.command_timeout,
            pairing_timeout: settings.connect_timeout,
        });
        let controller = SessionController::new(Box::new(client), toml_store, settings)
            .context("failed to start the command bridge")?;
        run(&controller, &address, cli.command)
    }
}

/// Initialises the global tracing subscriber.
///
/// `RUST_LOG` wins; otherwise `-v` flags, otherwise the configured level.
fn init_tracing(config: &AppConfig, verbose: u8) {
    let fallback = match verbose {
        0 => config.remote.log_level.as_str(),
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run<S: ConfigStore>(
    controller: &SessionController<S>,
    address: &str,
    command: CliCommand,
) -> anyhow::Result<()> {
    let result = dispatch(controller, address, command);
    controller.shutdown();
    result
}

fn dispatch<S: ConfigStore>(
    controller: &SessionController<S>,
    address: &str,
    command: CliCommand,
) -> anyhow::Result<()> {
    let action = match command {
        CliCommand::Connect => {
            controller
                .connect(address)
                .with_context(|| format!("could not connect to {address}"))?;
            println!("connected to {address}; pairing key saved");
            return Ok(());
        }
        CliCommand::Pair => {
            println!("accept the pairing request on the TV...");
            controller
                .pair(address)
                .with_context(|| format!("pairing with {address} failed"))?;
            println!("paired with {address}; key saved");
            return Ok(());
        }
        CliCommand::Disconnect => {
            controller.disconnect()?;
            println!("disconnected");
            return Ok(());
        }
        CliCommand::Aliases => {
            for name in controller.alias_names() {
                let ids = controller.aliases().get(name).unwrap_or_default();
                println!("{name:<14} {}", ids.join(", "));
            }
            return Ok(());
        }
        CliCommand::Status => {
            println!("{}", status_report(controller)?);
            return Ok(());
        }
        CliCommand::Interactive => {
            controller
                .connect(address)
                .with_context(|| format!("could not connect to {address}"))?;
            return interactive(controller);
        }
        CliCommand::VolumeUp => Action::VolumeUp,
        CliCommand::VolumeDown => Action::VolumeDown,
        CliCommand::Mute => Action::Mute,
        CliCommand::PowerOff => Action::PowerOff,
        CliCommand::Button { name } => Action::Press(name),
        CliCommand::Launch { name } => Action::Launch(name),
        CliCommand::LaunchId { id } => Action::LaunchId(id),
        CliCommand::Apps => Action::Apps,
    };

    controller
        .connect(address)
        .with_context(|| format!("could not connect to {address}"))?;
    let message = perform(controller, &action)?;
    println!("{message}");
    Ok(())
}

/// Runs one action against a connected controller and describes the result.
fn perform<S: ConfigStore>(
    controller: &SessionController<S>,
    action: &Action,
) -> Result<String, RemoteError> {
    match action {
        Action::VolumeUp => controller.volume_up().map(|()| "volume up".to_string()),
        Action::VolumeDown => controller.volume_down().map(|()| "volume down".to_string()),
        Action::Mute => controller.toggle_mute().map(|()| "mute toggled".to_string()),
        Action::PowerOff => controller.power_off().map(|()| "power off sent".to_string()),
        Action::Press(button) => controller.press(*button).map(|()| format!("pressed {button}")),
        Action::LaunchId(id) => controller.launch_app(id).map(|()| format!("launched {id}")),
        Action::Launch(name) => controller.launch_by_name(name).map(|report| {
            format!(
                "launched {} as {} ({:?} match)",
                report.app, report.app_id, report.tier
            )
        }),
        Action::Apps => controller.list_apps().map(|apps| {
            apps.iter()
                .map(|app| format!("{:<40} {}", app.id, app.title))
                .collect::<Vec<_>>()
                .join("\n")
        }),
        Action::Status => controller.status().map(|snap| {
            format!(
                "state: {}\naddress: {}\npaired: {}",
                snap.connection_state,
                snap.endpoint_address.as_deref().unwrap_or("-"),
                if snap.pairing_key.is_some() { "yes" } else { "no" }
            )
        }),
    }
}

/// Describes the session and the stored record without contacting the TV.
fn status_report<S: ConfigStore>(
    controller: &SessionController<S>,
) -> Result<String, RemoteError> {
    let session = perform(controller, &Action::Status)?;
    let stored = controller.stored_record();
    Ok(format!(
        "{session}\nstored TV: {} ({})",
        stored.address,
        if stored.pairing_key.is_some() {
            "key saved"
        } else {
            "not paired yet"
        }
    ))
}

/// Parses one interactive input line.  `Ok(None)` means quit.
fn parse_line(line: &str) -> Result<Option<Action>, String> {
    let line = line.trim();
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };

    let action = match word.to_ascii_lowercase().as_str() {
        "quit" | "exit" | "q" => return Ok(None),
        "vol+" | "volume-up" => Action::VolumeUp,
        "vol-" | "volume-down" => Action::VolumeDown,
        "mute" => Action::Mute,
        "off" | "power-off" => Action::PowerOff,
        "apps" => Action::Apps,
        "status" => Action::Status,
        "launch" if !rest.is_empty() => Action::Launch(rest.to_string()),
        "id" | "launch-id" if !rest.is_empty() => Action::LaunchId(rest.to_string()),
        "launch" | "id" | "launch-id" => return Err(format!("{word} needs an argument")),
        other => other
            .parse::<Button>()
            .map(Action::Press)
            .map_err(|_| format!("unknown command '{word}'; type help"))?,
    };
    Ok(Some(action))
}

/// Reads stdin line by line, running each command on its own thread.
fn interactive<S: ConfigStore>(controller: &SessionController<S>) -> anyhow::Result<()> {
    println!("{INTERACTIVE_HELP}");
    let stdin = std::io::stdin();

    std::thread::scope(|scope| -> anyhow::Result<()> {
        for line in stdin.lock().lines() {
            let line = line.context("failed to read stdin")?;
            if line.trim().is_empty() {
                continue;
            }
            if line.trim().eq_ignore_ascii_case("help") {
                println!("{INTERACTIVE_HELP}");
                continue;
            }
            match parse_line(&line) {
                Ok(None) => break,
                Ok(Some(action)) => {
                    scope.spawn(move || match perform(controller, &action) {
                        Ok(message) => println!("{message}"),
                        Err(e) => println!("error: {e}"),
                    });
                }
                Err(message) => println!("{message}"),
            }
        }
        Ok(())
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
