//! holdkeys: run commands while key or button combinations are held
//!
//! Watches Linux input devices without grabbing them, in two modes:
//! - `monitor` prints every key and button change as ready-to-paste
//!   hotkey flags
//! - `run` starts each hotkey's command when its combination becomes
//!   fully held and terminates it the moment the combination breaks

mod config;
mod controls;
mod engine;
mod hotkeys;
mod monitor;
mod normalize;
mod process;
mod registry;
mod source;

use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::HotkeyDefinition;
use crate::source::EvdevSource;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Monitor only the device with this name or event number
    #[arg(long, global = true)]
    device: Option<String>,

    /// Enable debug diagnostics on stderr
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print input events as ready-to-paste hotkey flags
    Monitor,
    /// Run hotkey commands while their combinations are held
    Run {
        /// TOML file with [[hotkey]] definitions
        #[arg(long)]
        config: Option<PathBuf>,

        /// Key that must be held, by evdev name (repeatable)
        #[arg(long = "key", value_name = "NAME")]
        keys: Vec<String>,

        /// Button that must be held, by number or name (repeatable)
        #[arg(long = "button", value_name = "BUTTON")]
        buttons: Vec<String>,

        /// Shell command to run while the combination is held
        #[arg(long)]
        command: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logging goes to stderr; monitor mode owns stdout. --verbose only
    // lowers the default filter, it changes no behavior.
    let default_filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .init();

    info!(version = env!("CARGO_PKG_VERSION"), "holdkeys starting");

    match cli.command {
        Commands::Monitor => {
            let source = EvdevSource::open(cli.device.as_deref())?;
            monitor::run(source).await
        }
        Commands::Run {
            config,
            keys,
            buttons,
            command,
        } => {
            let definitions = collect_definitions(config.as_deref(), keys, buttons, command)?;
            let source = EvdevSource::open(cli.device.as_deref())?;
            hotkeys::run(source, definitions).await
        }
    }
}

/// Merge file-based definitions with the inline one built from flags
fn collect_definitions(
    config: Option<&Path>,
    keys: Vec<String>,
    buttons: Vec<String>,
    command: Option<String>,
) -> Result<Vec<HotkeyDefinition>> {
    let mut definitions = match config {
        Some(path) => config::load_hotkeys(path)?,
        None => Vec::new(),
    };

    let has_inline_controls = !keys.is_empty() || !buttons.is_empty();
    match command {
        Some(command) => definitions.push(HotkeyDefinition {
            name: None,
            keys,
            buttons,
            command,
        }),
        None if has_inline_controls => bail!("--key and --button require --command"),
        None => {}
    }

    config::validate(&definitions)?;
    Ok(definitions)
}
