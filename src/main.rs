//! Pinpoint - point at a rendered element, get a structured edit prompt
//! to your editor or coding agent.
//!
//! Main entry point for the Pinpoint CLI and relay server.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use pinpoint_config::{Config, ConfigLoader};
use pinpoint_relay::{AgentCommand, RelayServer};

/// Pinpoint CLI.
#[derive(Parser)]
#[command(name = "pinpoint")]
#[command(about = "Element-targeted prompt capture and coding-agent relay")]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the relay server in the foreground (default)
    Serve {
        /// Server host
        #[arg(long)]
        host: Option<String>,

        /// Server port
        #[arg(long)]
        port: Option<u16>,
    },

    /// Check that the agent CLI and its authentication are set up
    Check,
}

/// Initialize tracing with console output.
fn init_tracing() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();

    let cli = Cli::parse();

    let config = match ConfigLoader::load_or_default(cli.config.as_deref()) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("pinpoint: {err}");
            return ExitCode::FAILURE;
        }
    };

    match cli.command {
        None => serve(config, None, None).await,
        Some(Commands::Serve { host, port }) => serve(config, host, port).await,
        Some(Commands::Check) => check(&config),
    }
}

/// Run the relay server in the foreground.
async fn serve(mut config: Config, host: Option<String>, port: Option<u16>) -> ExitCode {
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }

    info!("Starting Pinpoint v{}", env!("CARGO_PKG_VERSION"));

    match AgentCommand::resolve(&config.agent) {
        Ok(command) if !command.is_available() => {
            eprintln!(
                "Warning: agent program '{}' not found in PATH. \
                 The server will start, but executions will fail. \
                 Run: pinpoint check",
                command.program
            );
        }
        Ok(_) => {}
        Err(err) => {
            eprintln!("pinpoint: {err}");
            return ExitCode::FAILURE;
        }
    }

    let server = RelayServer::new(config);
    match server.run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("pinpoint: {err}");
            ExitCode::FAILURE
        }
    }
}

/// Verify the agent CLI is reachable and authenticated.
fn check(config: &Config) -> ExitCode {
    println!("Pinpoint Setup Check");
    println!("====================");

    let command = match AgentCommand::resolve(&config.agent) {
        Ok(command) => command,
        Err(err) => {
            println!("✗ {err}");
            return ExitCode::FAILURE;
        }
    };

    println!("Agent kind: {}", config.agent.kind);
    println!("Editor scheme: {}", config.editor.kind.scheme());

    if command.is_available() {
        println!("✓ Agent CLI '{}' is available", command.program);
    } else {
        println!("✗ Agent CLI '{}' not found in PATH", command.program);
        println!();
        println!("To fix:");
        println!("  1. Make sure the agent application is installed");
        println!("  2. Add '{}' to your PATH", command.program);
        return ExitCode::FAILURE;
    }

    if config.agent.kind == "cursor" {
        match cursor_auth_method() {
            Some(method) => println!("✓ Authenticated ({method})"),
            None => {
                println!("✗ Not authenticated");
                println!();
                println!("To fix:");
                println!("  1. Set the CURSOR_API_KEY environment variable");
                println!("  2. Or run: cursor agent login");
                return ExitCode::FAILURE;
            }
        }
    }

    println!();
    println!("All checks passed. Agent mode is ready to use.");
    ExitCode::SUCCESS
}

/// Detect how the Cursor CLI is authenticated, if at all.
fn cursor_auth_method() -> Option<String> {
    if std::env::var("CURSOR_API_KEY").is_ok_and(|key| !key.is_empty()) {
        return Some("CURSOR_API_KEY env var".to_string());
    }

    let home = dirs::home_dir()?;
    let candidates = [
        home.join(".cursor").join("config.json"),
        home.join(".cursor-agent").join("config.json"),
        home.join(".config").join("cursor").join("config.json"),
    ];
    for path in candidates {
        let Ok(content) = std::fs::read_to_string(&path) else {
            continue;
        };
        let Ok(value) = serde_json::from_str::<serde_json::Value>(&content) else {
            continue;
        };
        if value.get("apiKey").is_some() || value.get("token").is_some() {
            return Some(format!("config file {}", path.display()));
        }
    }
    None
}
