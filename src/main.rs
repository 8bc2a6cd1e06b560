// LogStream - main.rs
//
// Application entry point. Handles:
// 1. CLI argument parsing
// 2. config.toml loading and logging initialisation
// 3. Source registry construction
// 4. One-shot lookups (--snapshot, --health) or live streaming of events as
//    NDJSON on stdout

use clap::Parser;
use logstream::app::api::LogApi;
use logstream::app::hub::ChannelConnection;
use logstream::app::registry::SourceRegistry;
use logstream::app::tail::TailManager;
use logstream::platform::config::{self, PlatformPaths};
use logstream::util;
use logstream::util::error::{HubError, Result};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// LogStream - tail syslog-style files and stream parsed records.
///
/// Without --snapshot or --health, prints one `initial` event followed by an
/// `update` event per batch of appended lines, one JSON object per line.
#[derive(Parser, Debug)]
#[command(name = "logstream", version, about)]
struct Cli {
    /// Path to config.toml (defaults to the platform config directory).
    #[arg(short = 'c', long = "config")]
    config: Option<PathBuf>,

    /// Source to watch as NAME=PATH. Repeatable; replaces the configured table.
    #[arg(short = 's', long = "source", value_parser = parse_source)]
    sources: Vec<(String, PathBuf)>,

    /// Poll interval in milliseconds (overrides [tail] poll_interval_ms).
    #[arg(short = 'i', long = "interval-ms")]
    interval_ms: Option<u64>,

    /// Print a snapshot and exit: one source if NAME is given, else all sources.
    #[arg(long = "snapshot", value_name = "NAME")]
    snapshot: Option<Option<String>>,

    /// Record limit for --snapshot NAME.
    #[arg(short = 'n', long = "limit")]
    limit: Option<usize>,

    /// Print a health report and exit.
    #[arg(long = "health")]
    health: bool,

    /// Enable debug logging (equivalent to RUST_LOG=debug).
    #[arg(short = 'd', long = "debug")]
    debug: bool,
}

fn parse_source(arg: &str) -> std::result::Result<(String, PathBuf), String> {
    match arg.split_once('=') {
        Some((name, path)) if !name.trim().is_empty() && !path.trim().is_empty() => {
            Ok((name.trim().to_string(), PathBuf::from(path)))
        }
        _ => Err(format!("expected NAME=PATH, got '{arg}'")),
    }
}

fn main() {
    let cli = Cli::parse();

    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| PlatformPaths::resolve().config_file());
    let (mut app_config, warnings) = config::load_config(&config_path);

    util::logging::init(cli.debug, app_config.log_level.as_deref());

    tracing::info!(
        version = util::constants::APP_VERSION,
        debug = cli.debug,
        config = %config_path.display(),
        "LogStream starting"
    );
    for warning in &warnings {
        tracing::warn!(warning = %warning, "Config warning");
    }

    if !cli.sources.is_empty() {
        app_config.sources = cli.sources.clone();
    }
    if let Some(ms) = cli.interval_ms {
        app_config.poll_interval = Duration::from_millis(ms.max(1));
    }

    if let Err(e) = run(&cli, app_config) {
        tracing::error!(error = %e, "LogStream failed");
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn run(cli: &Cli, app_config: config::AppConfig) -> Result<()> {
    let registry = Arc::new(SourceRegistry::new(app_config.sources.clone())?);
    tracing::info!(sources = ?registry.names(), "Watching sources");

    if cli.health || cli.snapshot.is_some() {
        let api = LogApi::new(
            Arc::clone(&registry),
            app_config.default_limit,
            app_config.overview_limit,
        );
        let json = if cli.health {
            serde_json::to_string_pretty(&api.health())
        } else {
            match &cli.snapshot {
                Some(Some(name)) => serde_json::to_string_pretty(&api.logs_for(name, cli.limit)?),
                _ => serde_json::to_string_pretty(&api.overview()),
            }
        };
        let json = json.map_err(HubError::Serialize)?;
        println!("{json}");
        return Ok(());
    }

    stream(registry, &app_config)
}

/// Stream events to stdout until stdout is closed.
///
/// If stdout cannot keep up, the hub drops this subscriber; it then
/// resubscribes and starts over from a fresh snapshot.
fn stream(registry: Arc<SourceRegistry>, app_config: &config::AppConfig) -> Result<()> {
    let mut manager = TailManager::new();
    let hub = manager.start_for(registry, app_config.default_limit, app_config.poll_interval);

    let stdout = std::io::stdout();
    loop {
        let (connection, rx) = ChannelConnection::new(app_config.subscriber_queue);
        let id = hub.subscribe(connection);

        for message in rx.iter() {
            let mut out = stdout.lock();
            if let Err(e) = writeln!(out, "{message}").and_then(|()| out.flush()) {
                tracing::info!(error = %e, "stdout closed; shutting down");
                hub.unsubscribe(id);
                manager.stop();
                return Ok(());
            }
        }

        tracing::warn!(subscriber = %id, "stdout fell behind; resubscribing");
        std::thread::sleep(app_config.poll_interval);
    }
}
