use std::sync::Arc;

use tracing_subscriber::EnvFilter;

mod admin;
mod api;
mod app;
mod auth;
mod config;
mod error;
mod lockout;
mod mail;
mod model;
mod state;
mod store;

use config::Config;
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = Config::from_env()?;
    if config.admin.is_none() {
        tracing::warn!("EQUIPBOOK_ADMIN_ID is not set, no superuser will be bootstrapped");
    }

    let state = Arc::new(AppState::open(&config)?);
    let users = state.users.read().await.len();
    let equipment = state.equipment.read().await.len();
    let bookings = state.bookings.read().await.len();
    tracing::info!(
        data_dir = %config.data_dir.display(),
        users,
        equipment,
        bookings,
        "Data loaded"
    );

    let app = app::router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("EquipBook server listening on {}", config.bind_addr);
    axum::serve(listener, app).await?;

    Ok(())
}
