//! Backend for a poll web application: poll CRUD with compensating
//! rollback over a transactionless hosted datastore, and once-per-identity
//! vote admission.

use std::net::SocketAddr;
use std::sync::Arc;

use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

pub mod config;
pub mod error;
pub mod handlers;
pub mod identity;
pub mod models;
pub mod polls;
pub mod routes;
pub mod store;
pub mod validation;
pub mod votes;

use config::Config;
use routes::AppState;
use store::{PgStore, PollStore};

pub async fn start_server() {
    dotenvy::dotenv().ok(); // Load environment variables from .env file

    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let config = Config::load();

    let store = PgStore::connect(&config.database_url, config.max_db_connections)
        .await
        .expect("Failed to connect to the database");
    let store: Arc<dyn PollStore> = Arc::new(store);

    let app = routes::create_routes(AppState { store });

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!("Server running on {addr}");

    axum_server::bind(addr)
        .serve(app.into_make_service())
        .await
        .expect("Server error");
}
