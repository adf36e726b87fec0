//! Courier CLI - ask a chat service through an isolated worker process
//!
//! Usage:
//!   courier ask <text> [--timeout <secs>] [--worker <path>]
//!   courier direct <text>
//!   courier check
//!
//! Examples:
//!   courier ask "Tell me about CNC milling"
//!   courier ask "ping" --timeout 10 --worker ./target/debug/courier-worker
//!   courier direct "Tell me about CNC milling"
//!   courier check

use clap::{Parser, Subcommand};
use courier::bridge::Launcher;
use courier::chat::ChatProvider;
use courier::config::Settings;
use courier::worker;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "courier")]
#[command(about = "Process-isolated bridge to an external chat-completion service")]
#[command(version)]
struct Cli {
    /// Path to the config file (defaults to the courier.toml search chain)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Send a request through the isolated worker process
    Ask {
        /// The request text
        text: String,

        /// Dispatch timeout in seconds (overrides the configured value)
        #[arg(short, long)]
        timeout: Option<u64>,

        /// Worker binary path (overrides resolution)
        #[arg(short, long)]
        worker: Option<PathBuf>,
    },

    /// Call the chat service in-process, bypassing the bridge
    Direct {
        /// The request text
        text: String,
    },

    /// Validate configuration and report what `ask` would run
    Check,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let settings = match Settings::load_from(cli.config.as_deref()) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            return ExitCode::FAILURE;
        }
    };

    match cli.command {
        Commands::Ask {
            text,
            timeout,
            worker,
        } => cmd_ask(&settings, &text, timeout, worker).await,
        Commands::Direct { text } => cmd_direct(&settings, &text).await,
        Commands::Check => cmd_check(&settings),
    }
}

async fn cmd_ask(
    settings: &Settings,
    text: &str,
    timeout: Option<u64>,
    worker: Option<PathBuf>,
) -> ExitCode {
    let mut launcher = match worker {
        Some(path) => {
            let mut launcher = Launcher::new(path)
                .with_timeout(Duration::from_secs(settings.worker.timeout_secs));
            if let Some(env) = &settings.worker.env {
                launcher = launcher.with_env(env.clone());
            }
            launcher
        }
        None => match Launcher::from_settings(settings) {
            Ok(launcher) => launcher,
            Err(e) => {
                eprintln!("Error: {e}");
                return ExitCode::FAILURE;
            }
        },
    };
    if let Some(secs) = timeout {
        launcher = launcher.with_timeout(Duration::from_secs(secs));
    }

    match launcher.dispatch(text).await {
        Ok(reply) if reply.is_success() => {
            println!("{}", reply.message());
            ExitCode::SUCCESS
        }
        Ok(reply) => {
            eprintln!("Request failed: {}", reply.message());
            print_diagnostics(&reply.diagnostics);
            ExitCode::FAILURE
        }
        Err(e) => {
            eprintln!("Bridge error: {e}");
            if let Some(diagnostics) = e.diagnostics() {
                print_diagnostics(diagnostics);
            }
            ExitCode::FAILURE
        }
    }
}

async fn cmd_direct(settings: &Settings, text: &str) -> ExitCode {
    let provider = match worker::build_provider(settings) {
        Ok(provider) => provider,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
    };

    match provider.complete(text).await {
        Ok(response) => {
            println!("{response}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Request failed: {e}");
            ExitCode::FAILURE
        }
    }
}

fn cmd_check(settings: &Settings) -> ExitCode {
    println!("endpoint: {}", settings.api.endpoint);
    println!("model:    {}", settings.api.model);

    match settings.api.resolved_api_key() {
        Ok(Some(_)) => println!("api key:  configured"),
        Ok(None) => println!("api key:  none (unauthenticated endpoint)"),
        Err(e) => {
            eprintln!("api key:  {e}");
            return ExitCode::FAILURE;
        }
    }

    println!("timeout:  {}s", settings.worker.timeout_secs);
    match &settings.worker.env {
        Some(env) => println!("worker env: replaced ({} variables)", env.len()),
        None => println!("worker env: inherited"),
    }

    match courier::bridge::resolve_worker_path(settings) {
        Ok(path) => {
            println!("worker:   {}", path.display());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("worker:   {e}");
            ExitCode::FAILURE
        }
    }
}

fn print_diagnostics(diagnostics: &str) {
    if !diagnostics.is_empty() {
        eprintln!("--- worker diagnostics ---");
        eprint!("{diagnostics}");
    }
}
