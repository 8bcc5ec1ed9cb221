//! Command-line interface for the Homie / hub topic bridge.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use homie_hooks_bridge::MqttBridge;
use homie_hooks_core::{BridgeConfig, Translation, Translator, DEFAULT_CONFIG_PATH};
use tracing::{error, info};

/// Homie Hooks - bridge Homie device topics and hub webhook topics over MQTT.
#[derive(Parser, Debug)]
#[command(name = "homie-hooks")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Action to perform (defaults to `run`).
    #[command(subcommand)]
    command: Option<Command>,

    /// Configuration file. Must exist when given; otherwise `config.toml`
    /// is read if present.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Verbose output (per-message diagnostics).
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Broker host, overrides `server_address`.
    #[arg(long, global = true)]
    host: Option<String>,

    /// Broker port, overrides `server_port`.
    #[arg(short, long, global = true)]
    port: Option<u16>,

    /// Do not clear the terminal on start.
    #[arg(long, global = true)]
    no_clear: bool,
}

/// Available commands.
#[derive(Subcommand, Debug)]
enum Command {
    /// Connect to the broker and bridge messages until interrupted.
    Run,
    /// Translate topics offline and print the result.
    Translate {
        /// Topics to translate.
        #[arg(required = true)]
        topics: Vec<String>,
    },
    /// Validate the configuration and print the mapping tables.
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(args.verbose);

    let mut config = load_config(args.config.as_deref())?;
    apply_overrides(&mut config, &args);

    match args.command.unwrap_or(Command::Run) {
        Command::Run => run_bridge(config).await,
        Command::Translate { topics } => translate_topics(&config, &topics),
        Command::Check => check_config(&config),
    }
}

fn load_config(path: Option<&Path>) -> Result<BridgeConfig> {
    match path {
        Some(path) => BridgeConfig::load(path)
            .with_context(|| format!("Failed to load {}", path.display())),
        None => BridgeConfig::load_or_default(DEFAULT_CONFIG_PATH)
            .with_context(|| format!("Failed to load {}", DEFAULT_CONFIG_PATH)),
    }
}

fn apply_overrides(config: &mut BridgeConfig, args: &Args) {
    if args.verbose {
        config.verbose_logging = true;
    }
    if let Some(host) = &args.host {
        config.server_address = host.clone();
    }
    if let Some(port) = args.port {
        config.server_port = port;
    }
    if args.no_clear {
        config.clear_screen = false;
    }
}

fn init_logging(verbose: bool) {
    let json_logging = std::env::var("HOMIE_HOOKS_LOG_JSON")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(false);

    let default_level = if verbose { "debug" } else { "info" };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    if json_logging {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .compact()
            .with_writer(std::io::stderr)
            .init();
    }
}

fn build_translator(config: &BridgeConfig) -> Result<Translator> {
    let tables = config.build_tables().context("Invalid mapping tables")?;
    Ok(Translator::new(Arc::new(tables)))
}

/// Clear the terminal and move the cursor home.
fn clear_screen() {
    let mut stdout = std::io::stdout();
    let _ = stdout.write_all(b"\x1B[2J\x1B[1;1H");
    let _ = stdout.flush();
}

async fn run_bridge(config: BridgeConfig) -> Result<()> {
    if config.clear_screen {
        clear_screen();
    }

    let translator = build_translator(&config)?;
    let bridge = MqttBridge::new(&config, translator).context("Failed to create MQTT bridge")?;
    for filter in bridge.filters() {
        info!(category = "mqtt", "Subscription: {}", filter);
    }

    bridge.run(shutdown_signal()).await?;
    Ok(())
}

/// Wait for Ctrl+C or SIGTERM.
///
/// A handler that cannot be installed is logged and never fires, so the
/// bridge keeps running until the other signal arrives.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(category = "shutdown", "Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(category = "shutdown", "Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!(category = "shutdown", "Received Ctrl+C, shutting down"),
        _ = terminate => info!(category = "shutdown", "Received SIGTERM, shutting down"),
    }
}

fn translate_topics(config: &BridgeConfig, topics: &[String]) -> Result<()> {
    let translator = build_translator(config)?;
    for topic in topics {
        match translator.translate(topic) {
            Translation::Translated(outbound) => println!("{} -> {}", topic, outbound),
            Translation::Unhandled(reason) => println!("{} -> unhandled ({})", topic, reason),
        }
    }
    Ok(())
}

fn check_config(config: &BridgeConfig) -> Result<()> {
    let filters = config.filters().context("Invalid subscriptions")?;
    let tables = config.build_tables().context("Invalid mapping tables")?;

    println!("Broker: {}", config.broker_addr());
    println!("Subscriptions:");
    for filter in &filters {
        println!("  {}", filter);
    }
    println!("Devices:");
    for (device_id, hub_id) in &config.devices {
        println!("  {} <-> {}", device_id, hub_id);
    }
    println!("Commands:");
    let mut commands: Vec<_> = tables.commands().iter().collect();
    commands.sort();
    for (key, command) in commands {
        println!("  {} -> {}", key, command);
    }
    println!("Configuration OK");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_shutdown_signal_waits_for_a_signal() {
        let waited = tokio::time::timeout(Duration::from_millis(200), shutdown_signal()).await;
        assert!(waited.is_err());
    }

    #[test]
    fn test_explicit_config_must_exist() {
        let err = load_config(Some(Path::new("/nonexistent/homie-hooks/config.toml"))).unwrap_err();
        assert!(err.to_string().contains("Failed to load"));
    }

    #[test]
    fn test_cli_overrides() {
        let args = Args::parse_from([
            "homie-hooks",
            "--verbose",
            "--host",
            "192.168.0.26",
            "-p",
            "1884",
            "--no-clear",
            "check",
        ]);
        let mut config = BridgeConfig::default();
        apply_overrides(&mut config, &args);
        assert!(config.verbose_logging);
        assert_eq!(config.broker_addr(), "192.168.0.26:1884");
        assert!(!config.clear_screen);
        assert!(args.config.is_none());
    }
}
