use std::net::SocketAddr;
use std::sync::Arc;

use dotenvy::dotenv;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use conference_desk::config::AppConfig;
use conference_desk::database::{self, delegate_repo};
use conference_desk::services::scan_feed::SimulatedCamera;
use conference_desk::web::{self, AppState};

#[tokio::main]
async fn main() {
    // Load .env
    dotenv().ok();

    // 1. Logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::from_env();

    // 2. In-memory store with the sample data
    let pool = database::open_seeded()
        .await
        .expect("could not open the in-memory store");

    // 3. Simulated camera reads badges from the seeded roster
    let badges = delegate_repo::list_roster(&pool)
        .await
        .expect("could not load the delegate roster")
        .into_iter()
        .map(|d| d.badge_id)
        .collect();
    let camera = SimulatedCamera::new(config.scan_success_probability, badges);

    let host = config.host.clone();
    let port = config.port;
    let state = AppState::new(pool, Arc::new(camera), config);
    let desk = state.desk.clone();
    let app = web::build_router(state);

    // 4. Bind, falling back to the next port
    let addr: SocketAddr = format!("{}:{}", host, port)
        .parse()
        .expect("could not parse HOST/PORT");
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(e) => {
            let fallback = port.saturating_add(1);
            warn!("Could not bind {}: {}. Trying {}:{}", addr, e, host, fallback);
            let fallback: SocketAddr = format!("{}:{}", host, fallback)
                .parse()
                .expect("could not parse fallback address");
            tokio::net::TcpListener::bind(fallback)
                .await
                .expect("could not bind the fallback port")
        }
    };

    match listener.local_addr() {
        Ok(bound) => info!("Conference desk listening on http://{}", bound),
        Err(e) => warn!("Listening, but the local address is unknown: {}", e),
    }

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        warn!("Server stopped with an error: {}", e);
    }

    desk.lock().await.shutdown().await;
    info!("Check-in desk stopped");
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Could not listen for ctrl-c: {}", e);
    }
}
