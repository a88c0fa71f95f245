use ip_server::{build_router, run_tick_driven_work, AppState, ServerConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServerConfig::from_env();
    let port = config.port;
    let state = AppState::new(&config);

    state.tick.start();
    tokio::spawn(run_tick_driven_work(state.clone()));

    let app = build_router(state);
    let addr = format!("0.0.0.0:{port}");

    tracing::info!(%addr, "intelligence plane server starting");

    let listener = tokio::net::TcpListener::bind(&addr).await.expect("bind server address");
    axum::serve(listener, app).await.expect("server loop exited");
}
