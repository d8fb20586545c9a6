use std::sync::Arc;

use anyhow::Result;
use axum::Router;
use diesel_migrations::{EmbeddedMigrations, embed_migrations};
use rasdesh_storeservice::{
    api::mailer,
    app_state::AppState,
    bootstrap::{self, bootstrap},
    config::AppConfig,
    consumers::notifications::Notifier,
    db,
    events::EventPublisher,
    routes, swagger,
};

/// Migrations embedded into the binary which helps with streamlining image building process
const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

#[tokio::main]
async fn main() -> Result<()> {
    bootstrap::init_env();
    bootstrap::init_tracing();

    let config = AppConfig::load()?;

    tracing::info!("Running migrations...");
    let migrations_count = db::run_migrations_blocking(MIGRATIONS, &config.database.url).await?;
    tracing::info!("Run {} new migrations successfully", migrations_count);

    let db_pool = db::connect(&config.database.url).await?;
    let mailer = mailer::from_config(&config.email)?;
    let notifier = Arc::new(Notifier::new(
        mailer,
        config.email.admin_email.clone(),
        &config.server.public_base_url,
    ));

    let (events, events_rx) = EventPublisher::channel();
    let state = AppState::new(db_pool, config, events);

    let routes = routes::routes_with_openapi(&state);

    let mut openapi = routes.get_openapi().clone();
    openapi.info = utoipa::openapi::InfoBuilder::new()
        .title("Vrindavan Ras Desh StoreService API")
        .version("1.0.0")
        .build();
    let swagger_ui = swagger::create_swagger_ui(openapi)?;

    let app = Router::new().merge(routes).merge(swagger_ui);

    tracing::info!("Bootstrapping...");
    bootstrap("StoreService", app, state, notifier, events_rx).await?;
    Ok(())
}
