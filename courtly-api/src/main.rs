use std::net::SocketAddr;
use std::sync::Arc;

use courtly_api::{app, state::{AppState, AuthConfig}};
use courtly_store::{DbClient, StoreBookingRepository};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "courtly_api=debug,tower_http=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = courtly_store::Config::load().expect("Failed to load config");
    tracing::info!("Starting Courtly API on port {}", config.server.port);

    let db = DbClient::new(&config.database.url, config.database.max_connections)
        .await
        .expect("Failed to connect to Postgres");
    db.migrate().await.expect("Failed to run migrations");

    let bookings = Arc::new(StoreBookingRepository::new(db.pool.clone()));

    let app_state = AppState {
        bookings,
        auth: AuthConfig {
            secret: config.auth.jwt_secret.clone(),
        },
        payfast: config.payfast.clone(),
    };

    let app = app(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
