use dotenvy::dotenv;
use janu_storefront::{
    api::{self, AppState},
    config::{admin, database, store},
    core::{catalog, clock::SystemClock},
    errors::{Error, Result},
};
use std::{env, sync::Arc};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

const DEFAULT_PORT: u16 = 3000;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file; variables may also come from the environment directly
    dotenv().ok();

    // 3. Load config.toml plus environment overrides
    let app_config = store::load_app_configuration()
        .inspect_err(|e| error!("Failed to load configuration: {}", e))?;

    // 4. Connect and make sure the tables exist
    let db = database::create_connection()
        .await
        .inspect_err(|e| error!("Failed to connect to database: {}", e))?;
    database::create_tables(&db)
        .await
        .inspect(|_| info!("Database initialized successfully."))
        .inspect_err(|e| error!("Failed to create tables: {}", e))?;

    // 5. Seed the catalog on first run
    let clock = Arc::new(SystemClock);
    let seeded = catalog::seed_catalog(&db, &app_config, clock.as_ref())
        .await
        .inspect_err(|e| error!("Failed to seed catalog: {}", e))?;
    if seeded > 0 {
        info!(products = seeded, "seeded initial catalog");
    }

    // 6. Serve the API
    let admin = admin::get_admin_credentials();
    if admin.is_none() {
        warn!("ADMIN_EMAIL / ADMIN_PASSWORD not set; admin routes will reject every login");
    }

    let port = match env::var("PORT") {
        Ok(raw) => raw.parse::<u16>().map_err(|e| Error::Config {
            message: format!("PORT must be a port number, got {raw:?}: {e}"),
        })?,
        Err(_) => DEFAULT_PORT,
    };

    let app = api::router(AppState::new(db, app_config, admin, clock));
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await?;
    info!(port = listener.local_addr()?.port(), "storefront API listening");
    axum::serve(listener, app).await?;

    Ok(())
}
