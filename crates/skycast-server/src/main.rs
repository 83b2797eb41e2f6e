use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    Router, middleware,
    routing::{delete, get, post},
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use skycast_api::auth::{self, AppState, AppStateInner};
use skycast_api::locations;
use skycast_api::middleware::require_auth;
use skycast_api::search_history;
use skycast_api::weather;
use skycast_jobs::{JobRunner, WorkerConfig};
use skycast_provider::WeatherClient;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "skycast=debug,tower_http=debug".into()),
        )
        .init();

    // Config
    let jwt_secret =
        std::env::var("SKYCAST_JWT_SECRET").unwrap_or_else(|_| "dev-secret-change-me".into());
    let db_path = std::env::var("SKYCAST_DB_PATH").unwrap_or_else(|_| "skycast.db".into());
    let host = std::env::var("SKYCAST_HOST").unwrap_or_else(|_| "0.0.0.0".into());
    let port: u16 = std::env::var("SKYCAST_PORT")
        .unwrap_or_else(|_| "8000".into())
        .parse()?;

    // Init database and the upstream weather client
    let db = Arc::new(skycast_db::Database::open(&PathBuf::from(&db_path))?);
    let weather = WeatherClient::from_env()?;

    // Background job runner for long-range forecast fetches
    let runner = JobRunner::new(db.clone(), weather.clone(), WorkerConfig::from_env());
    tokio::spawn(runner.run());

    // Shared state
    let app_state: AppState = Arc::new(AppStateInner {
        db,
        weather,
        jwt_secret,
    });

    // Routes
    let public_routes = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .with_state(app_state.clone());

    let protected_routes = Router::new()
        .route("/locations", get(locations::list_locations))
        .route("/locations", post(locations::create_location))
        .route("/locations/{id}", get(locations::get_location))
        .route("/locations/{id}", delete(locations::delete_location))
        .route("/weather", get(weather::list_weather_queries))
        .route("/weather/current", get(weather::current))
        .route("/weather/forecast", get(weather::forecast))
        .route("/weather/history", get(weather::history))
        .route("/weather/tasks/{id}", get(weather::task_status))
        .route("/search-history", get(search_history::list))
        .route(
            "/search-history/frequent_locations",
            get(search_history::frequent_locations),
        )
        .layer(middleware::from_fn(require_auth))
        .with_state(app_state);

    let app = Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("Skycast server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        let mut sigterm =
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
                .expect("failed to install SIGTERM handler");
        tokio::select! {
            _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
            _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
        info!("Received Ctrl+C, shutting down...");
    }
}
