// # farmwatchd - Farmwatch client daemon
//
// Thin integration layer over `farmwatch-core`:
// 1. Reading configuration from environment variables
// 2. Initializing tracing and the runtime
// 3. Wiring the state store, HTTP transport and feed connector into the engine
// 4. Running one command (`watch` by default)
//
// Device and reconciliation logic lives in the core crate, not here.
//
// ## Example
//
// ```bash
// export FARMWATCH_API_BASE_URL=http://192.168.43.10:8000
// export FARMWATCH_USE_MOCK=false
// export FARMWATCH_STATE_DIR=/var/lib/farmwatch
//
// farmwatchd status
// farmwatchd toggle-siren --on
// farmwatchd watch --views dashboard,alerts
// ```

mod cli;
mod commands;
mod config;

use anyhow::Result;
use clap::Parser;
use farmwatch_core::{
    ClientEngine, EngineEvent, FileStateStore, MemoryStateStore, SettingsStore, StateStore,
    StateStoreConfig, View,
};
use farmwatch_http::{HttpFeedConnector, HttpTransport};
use std::process::ExitCode;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, info};
use tracing_subscriber::FmtSubscriber;

use cli::{Cli, Command};
use config::Config;

/// Exit codes for different termination scenarios
///
/// These codes follow systemd conventions:
/// - 0: Clean shutdown
/// - 1: Configuration or startup error
/// - 2: Runtime error (failed command or unexpected failure)
#[derive(Debug, Clone, Copy)]
enum FarmwatchExitCode {
    CleanShutdown = 0,
    ConfigError = 1,
    RuntimeError = 2,
}

impl From<FarmwatchExitCode> for ExitCode {
    fn from(code: FarmwatchExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {:#}", e);
            return FarmwatchExitCode::ConfigError.into();
        }
    };

    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {}", e);
        return FarmwatchExitCode::ConfigError.into();
    }

    let log_level = match config.level() {
        Ok(level) => level,
        Err(e) => {
            eprintln!("Configuration validation error: {}", e);
            return FarmwatchExitCode::ConfigError.into();
        }
    };

    // Logs go to stderr so command output stays pipeable
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return FarmwatchExitCode::ConfigError.into();
    }

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return FarmwatchExitCode::RuntimeError.into();
        }
    };

    let code = rt.block_on(async {
        let (engine, events) = match build_engine(&config).await {
            Ok(built) => built,
            Err(e) => {
                error!("Startup error: {:#}", e);
                return FarmwatchExitCode::ConfigError;
            }
        };

        let result = run_command(&engine, events, cli).await;
        if let Err(e) = engine.shutdown().await {
            error!("Failed to flush state: {}", e);
        }

        match result {
            Ok(()) => FarmwatchExitCode::CleanShutdown,
            Err(e) => {
                error!("{:#}", e);
                FarmwatchExitCode::RuntimeError
            }
        }
    });

    code.into()
}

/// Create the state store, transports and engine from `config`
async fn build_engine(config: &Config) -> Result<(ClientEngine, mpsc::Receiver<EngineEvent>)> {
    let client_config = config.client_config();
    client_config.validate()?;

    let state_store: Arc<dyn StateStore> = match &client_config.state_store {
        StateStoreConfig::File { dir } => Arc::new(FileStateStore::new(dir).await?),
        StateStoreConfig::Memory => Arc::new(MemoryStateStore::new()),
    };
    info!("State store: {}", client_config.state_store.type_name());

    // The HTTP transport reads the base URL from the same settings the engine edits
    let settings = SettingsStore::load(state_store.clone(), client_config.defaults.clone()).await;
    let timeout = client_config.engine.request_timeout();
    let live = Arc::new(HttpTransport::with_timeout(settings.clone(), timeout));
    let connector = Arc::new(HttpFeedConnector::with_connect_timeout(timeout));

    let current = settings.get();
    info!(
        "Device API: {} ({})",
        if current.api_base_url.is_empty() { "<unset>" } else { current.api_base_url.as_str() },
        if current.mock { "mock" } else { "live" }
    );

    let built =
        ClientEngine::with_settings(client_config, state_store, settings, live, connector).await?;
    Ok(built)
}

async fn run_command(
    engine: &ClientEngine,
    events: mpsc::Receiver<EngineEvent>,
    args: Cli,
) -> Result<()> {
    let as_json = args.json;
    let command = args.command.unwrap_or(Command::Watch {
        views: vec![cli::ViewArg::Dashboard, cli::ViewArg::LiveFeed, cli::ViewArg::Alerts],
    });

    match command {
        Command::Watch { views } => {
            let views: Vec<View> = views.into_iter().map(View::from).collect();
            commands::watch(engine, events, &views).await
        }
        Command::Status => commands::status(engine, as_json).await,
        Command::ToggleSystem { switch } => {
            commands::toggle_system(engine, switch.target(), as_json).await
        }
        Command::ToggleSiren { switch } => {
            commands::toggle_siren(engine, switch.target(), as_json).await
        }
        Command::Alerts { limit } => commands::alerts(engine, limit, as_json).await,
        Command::ClearAlerts { yes } => commands::clear_alerts(engine, yes).await,
        Command::Settings {
            api_base_url,
            stream_url,
            bg_url,
            mock,
        } => {
            let patch = cli::settings_patch(api_base_url, stream_url, bg_url, mock);
            commands::settings(engine, patch, as_json).await
        }
        Command::FeedUrl => commands::feed_url(engine, as_json),
    }
}
