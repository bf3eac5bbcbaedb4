//! Focus timer CLI for LifeOS.
//!
//! Alternates focus sessions with short and long breaks:
//! - `focus daemon` runs the countdown, ambient sound and session log
//! - every other subcommand talks to the daemon over a Unix socket

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};

use lifeos_focus::cli::{Cli, Commands, Display, IpcClient, SoundCommand};
use lifeos_focus::config::Settings;
use lifeos_focus::daemon;

/// Main entry point
#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();

    init_tracing(cli.verbose);

    if let Err(e) = execute(cli).await {
        Display::show_error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

/// Initializes the tracing subscriber for logging.
///
/// `RUST_LOG` wins over `--verbose`.
fn init_tracing(verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default_level = if verbose { "info" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .init();
}

/// Executes the CLI command.
async fn execute(cli: Cli) -> Result<()> {
    match cli.command {
        Some(Commands::Start(args)) => {
            let response = IpcClient::new()?.start(args.label).await?;
            Display::show_result(&response);
        }
        Some(Commands::Pause) => {
            let response = IpcClient::new()?.pause().await?;
            Display::show_result(&response);
        }
        Some(Commands::Reset { mode }) => {
            let response = IpcClient::new()?.reset(mode.map(Into::into)).await?;
            Display::show_result(&response);
        }
        Some(Commands::Switch { mode }) => {
            let response = IpcClient::new()?.switch(mode.into()).await?;
            Display::show_result(&response);
        }
        Some(Commands::Status) => {
            let response = IpcClient::new()?.status().await?;
            Display::show_status(&response);
        }
        Some(Commands::Config(args)) => {
            let response = IpcClient::new()?.configure(args.to_params()).await?;
            Display::show_config(&response);
        }
        Some(Commands::Sound(command)) => {
            let client = IpcClient::new()?;
            match command {
                SoundCommand::Toggle => Display::show_sound(&client.sound_toggle().await?),
                SoundCommand::Track { index } => {
                    Display::show_sound(&client.sound_track(index).await?)
                }
                SoundCommand::Volume { volume } => {
                    Display::show_sound(&client.sound_volume(volume).await?)
                }
                SoundCommand::List => Display::show_tracks(&client.sound_list().await?),
            }
        }
        Some(Commands::History) => {
            let response = IpcClient::new()?.history().await?;
            Display::show_history(&response);
        }
        Some(Commands::Daemon { config }) => {
            let settings =
                Settings::load_from(config.as_deref()).context("Failed to load settings")?;
            daemon::run(settings).await?;
        }
        Some(Commands::Completions { shell }) => {
            generate_completions(shell);
        }
        None => {
            Cli::command().print_help()?;
        }
    }

    Ok(())
}

/// Generates shell completion scripts.
fn generate_completions(shell: clap_complete::Shell) {
    use clap_complete::generate;
    use std::io;

    let mut cmd = Cli::command();
    let bin_name = cmd.get_name().to_string();
    generate(shell, &mut cmd, bin_name, &mut io::stdout());
}

// ============================================================================
// Tests
// ============================================================================
