use std::sync::Arc;

use axum::Router;
use dotenvy::dotenv;
use sqlx::postgres::PgPoolOptions;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use events_server::auth::ensure_superuser;
use events_server::config::Config;
use events_server::routes::create_routes;
use events_server::store::{MemoryStore, PgStore, Store};
use events_server::AppState;

#[tokio::main]
async fn main() {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("events_server=info,tower_http=info")),
        )
        .init();

    let config = Config::from_env();
    if config.is_production && config.uses_development_secret() {
        panic!("SECRET_KEY must be set in production");
    }

    let store: Arc<dyn Store> = match &config.database_url {
        Some(database_url) => {
            let pool = PgPoolOptions::new()
                .max_connections(5)
                .connect(database_url)
                .await
                .expect("Failed to connect to database");

            tracing::info!("Successfully connected to database");

            sqlx::migrate!()
                .run(&pool)
                .await
                .expect("Failed to run migrations");

            tracing::info!("Migrations run successfully");
            Arc::new(PgStore::new(pool))
        }
        None => {
            tracing::warn!("DATABASE_URL is not set, data will live in memory only");
            Arc::new(MemoryStore::new())
        }
    };

    if let Some(admin) = &config.admin {
        ensure_superuser(store.as_ref(), admin)
            .await
            .expect("Failed to create superuser");
    }

    let state = AppState::new(store, &config).expect("Failed to build application state");
    let app: Router = create_routes(state, &config);

    tracing::info!("Server running at http://{}", config.bind_addr);

    let listener = TcpListener::bind(config.bind_addr)
        .await
        .expect("Failed to bind address");

    axum::serve(listener, app).await.expect("Server failed");
}
