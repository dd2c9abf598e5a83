use sqlx::postgres::PgPoolOptions;
use std::net::TcpListener;
use std::sync::Arc;
use std::time::Duration;
use token_service::auth::TokenService;
use token_service::configuration::{get_configuration, load_env_file, ENV_FILE};
use token_service::startup::run;
use token_service::storage::PgTokenStore;
use token_service::telemetry::init_telemetry;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    // Read before telemetry so a `RUST_LOG` in the file takes effect.
    let env_file = load_env_file(ENV_FILE);

    if let Err(e) = init_telemetry("info") {
        eprintln!("Failed to initialize telemetry: {}", e);
    }
    if let Err(e) = env_file {
        tracing::warn!("No {} file loaded, using the process environment: {}", ENV_FILE, e);
    }

    tracing::info!("Starting token service");

    let configuration = get_configuration().map_err(|e| {
        tracing::error!("Failed to read configuration: {}", e);
        std::io::Error::new(std::io::ErrorKind::InvalidInput, "Configuration error")
    })?;

    tracing::info!("Attempting to connect to database");
    let pool = PgPoolOptions::new()
        .max_connections(configuration.database.max_connections)
        .acquire_timeout(Duration::from_secs(
            configuration.database.acquire_timeout_seconds,
        ))
        .connect(&configuration.database.url)
        .await
        .map_err(|e| {
            tracing::error!("Failed to create connection pool: {}", e);
            std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "Database connection error",
            )
        })?;

    let store = PgTokenStore::new(pool);
    store.migrate().await.map_err(|e| {
        tracing::error!("Failed to prepare token table: {}", e);
        std::io::Error::new(std::io::ErrorKind::Other, "Database migration error")
    })?;
    tracing::info!("Token storage ready");

    let token_service = TokenService::new(&configuration.jwt, Arc::new(store));

    let address = configuration.application.address();
    let listener = TcpListener::bind(&address)?;
    tracing::info!("Server listening on: {}", address);

    run(listener, token_service)?.await
}
