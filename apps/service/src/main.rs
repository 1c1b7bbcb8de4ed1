#![warn(clippy::all, clippy::pedantic)]

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use pulse::monitoring::{HttpChecker, checker::DEFAULT_PROBE_TIMEOUT};
use pulse::notifier::DiscordNotifier;
use pulse::persistence::file::JsonFileStore;
use pulse::engine::MIN_CHECK_INTERVAL;
use pulse::{Engine, EngineSettings};
use tracing::info;

mod config;
mod gateway;

use config::Config;

const LOG_FILE_NAME: &str = "pulse.log";

#[derive(Parser)]
#[command(version, about = "Endpoint uptime monitor reporting to a Discord channel")]
struct Cli {
    /// Config file to use instead of the default location
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory holding the JSON documents and the log file
    #[arg(long)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the monitor and the command gateway (default)
    Run,
    /// Probe a single URL once and exit
    Check { url: String },
    /// Print the resolved configuration
    Config,
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let mut config = Config::from_config(cli.config.as_deref())?;
    config.apply_env(|name| std::env::var(name).ok())?;
    if let Some(dir) = cli.data_dir {
        config.monitor.data_dir = dir;
    }

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run(config).await,
        Commands::Check { url } => check(&url).await,
        Commands::Config => {
            println!("{config}");
            Ok(())
        }
    }
}

async fn check(url: &str) -> anyhow::Result<()> {
    pulse::validation::validate_http_endpoint(url).into_result()?;
    let checker = HttpChecker::new(DEFAULT_PROBE_TIMEOUT)?;
    println!("{}", checker.check_url(url).await.describe());
    Ok(())
}

async fn run(config: Config) -> anyhow::Result<()> {
    let credentials = config.credentials().context("Missing TOKEN or CHANNEL_ID")?;

    let log_file = config.monitor.data_dir.join(LOG_FILE_NAME);
    logger::init_with_log_file(&log_file);

    let store = Arc::new(JsonFileStore::new(config.monitor.data_dir.clone()));
    let checker = Arc::new(HttpChecker::new(DEFAULT_PROBE_TIMEOUT)?);
    let notifier = Arc::new(DiscordNotifier::with_api_base(
        config.discord.api_base.as_str(),
        credentials.token,
        credentials.channel_id,
    ));

    let settings = EngineSettings {
        check_interval: Duration::from_millis(config.monitor.check_interval_ms).max(MIN_CHECK_INTERVAL),
        command_prefix: config.monitor.command_prefix.clone(),
        main_admin: config.monitor.main_admin.clone(),
        log_file: Some(log_file),
        ..EngineSettings::default()
    };

    let engine = Engine::load(settings, store, checker, notifier).await;
    info!(
        data_dir = %config.monitor.data_dir.display(),
        interval_ms = engine.check_interval().as_millis(),
        "Monitor started"
    );
    let monitor = engine.spawn_monitor();

    let addr = gateway::parse_addr(&config.gateway.bind, config.gateway.port)?;
    let served = gateway::run_server(addr, engine).await;
    monitor.abort();
    served?;
    Ok(())
}
