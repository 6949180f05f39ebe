use std::sync::Arc;

use {
    clap::{Parser, Subcommand},
    tracing::info,
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

use {
    wagate_gateway::server::start_gateway,
    wagate_lifecycle::{LifecycleManager, session::FsSessionStore},
    wagate_whatsapp::WhatsAppConnector,
};

#[derive(Parser)]
#[command(name = "wagate", about = "wagate — WhatsApp HTTP gateway")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the gateway server.
    Serve {
        /// Override the configured bind address.
        #[arg(long)]
        bind: Option<String>,
        /// Override the configured port.
        #[arg(long)]
        port: Option<u16>,
    },
    /// WhatsApp session management.
    Session {
        #[command(subcommand)]
        action: SessionAction,
    },
}

#[derive(Subcommand)]
enum SessionAction {
    /// Print the session directory path.
    Path,
    /// Delete the persisted session. The next `serve` pairs from scratch.
    Clear,
}

fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    if cli.json_logs {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_target(true).with_thread_ids(false))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_ansi(true),
            )
            .init();
    }
}

async fn serve(bind: Option<String>, port: Option<u16>) -> anyhow::Result<()> {
    let mut config = wagate_config::discover_and_load();
    if let Some(bind) = bind {
        config.gateway.bind = bind;
    }
    if let Some(port) = port {
        config.gateway.port = port;
    }

    let session_dir = config.whatsapp.resolved_session_dir();
    let session = Arc::new(FsSessionStore::new(&session_dir)?);
    let manager = LifecycleManager::new(session);

    let connector = Arc::new(WhatsAppConnector::new(
        session_dir,
        config.whatsapp.device_name.clone(),
    ));
    manager.set_connector(connector).await;
    manager.start().await;

    start_gateway(&config, manager).await
}

fn session_command(action: SessionAction) -> anyhow::Result<()> {
    let config = wagate_config::discover_and_load();
    let dir = config.whatsapp.resolved_session_dir();
    match action {
        SessionAction::Path => {
            println!("{}", dir.display());
        },
        SessionAction::Clear => {
            if dir.exists() {
                std::fs::remove_dir_all(&dir)?;
                println!("removed {}", dir.display());
            } else {
                println!("no session at {}", dir.display());
            }
        },
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_telemetry(&cli);

    info!(version = env!("CARGO_PKG_VERSION"), "wagate starting");

    match cli.command {
        Commands::Serve { bind, port } => serve(bind, port).await,
        Commands::Session { action } => session_command(action),
    }
}
