mod catalog;
mod changeset;
mod config;
mod db;
mod entities;
mod error;
mod models;
mod query;
mod repository;
mod routes;
mod seed;
mod service;
mod validation;

use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::{catalog::CatalogService, config::Config, service::MovieService};

pub struct AppState {
    pub movies: MovieService,
    pub catalog: CatalogService,
}

impl AppState {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { movies: MovieService::new(db.clone()), catalog: CatalogService::new(db) }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "info,movie_catalog=debug,sqlx=warn".to_string()),
        )
        .init();

    let config = Config::from_env()?;

    let db = db::connect_and_migrate(&config.database_url, config.db_max_connections).await?;
    let state = Arc::new(AppState::new(db));

    if config.seed_data {
        seed::seed_if_empty(&state.catalog, &state.movies).await?;
    }

    let app = routes::router(state);

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    tracing::info!(addr = %config.addr, "listening");
    axum::serve(listener, app).await?;

    Ok(())
}
