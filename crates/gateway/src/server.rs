use std::{net::SocketAddr, sync::Arc};

use {
    axum::{
        Router,
        routing::{get, post},
    },
    tower_http::cors::{Any, CorsLayer},
    tracing::info,
};

use {wagate_config::WagateConfig, wagate_lifecycle::LifecycleManager};

use crate::{routes, state::GatewayState};

/// Build the gateway router (shared between production startup and tests).
pub fn build_gateway_app(state: Arc<GatewayState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(routes::root))
        .route("/qr", get(routes::qr))
        .route("/status", get(routes::status))
        .route("/health", get(routes::health))
        .route("/send-message", post(routes::send_message))
        .route("/send-message-group", post(routes::send_message_group))
        .route("/pairing", post(routes::pairing))
        .route("/list-groups", get(routes::list_groups))
        .layer(cors)
        .with_state(state)
}

/// Start the gateway HTTP server. The lifecycle manager is wired to its
/// connector by the caller; this only serves HTTP on top of it.
pub async fn start_gateway(
    config: &WagateConfig,
    manager: Arc<LifecycleManager>,
) -> anyhow::Result<()> {
    let state = GatewayState::new(Arc::clone(&manager), config.whatsapp.country_code.clone());
    let app = build_gateway_app(Arc::clone(&state));

    let addr: SocketAddr = format!("{}:{}", config.gateway.bind, config.gateway.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;

    // Startup banner.
    let lines = [
        format!("wagate v{}", state.version),
        format!("listening on http://{addr}"),
        format!("session: {}", manager.session().dir().display()),
        format!("pair at http://{addr}/qr"),
    ];
    let width = lines.iter().map(|l| l.len()).max().unwrap_or(0) + 4;
    info!("┌{}┐", "─".repeat(width));
    for line in &lines {
        info!("│  {:<w$}│", line, w = width - 2);
    }
    info!("└{}┘", "─".repeat(width));

    axum::serve(listener, app).await?;
    Ok(())
}
