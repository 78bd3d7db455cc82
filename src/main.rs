use sqlx::postgres::PgPoolOptions;
use squawk::clock::SystemClock;
use squawk::configuration::get_configuration;
use squawk::startup::run;
use squawk::store::{MemoryStore, PgStore, Store};
use squawk::telemetry::init_telemetry;
use std::net::TcpListener;
use std::sync::Arc;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    init_telemetry("info");

    tracing::info!("Starting application");

    let configuration = match get_configuration() {
        Ok(config) => {
            tracing::info!("Configuration loaded successfully");
            config
        }
        Err(e) => {
            tracing::error!("Failed to read configuration: {}", e);
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "Configuration error",
            ));
        }
    };

    let store: Arc<dyn Store> = if configuration.database.in_memory {
        tracing::warn!("Running with the in-memory store; data is lost on exit");
        Arc::new(MemoryStore::new())
    } else {
        tracing::info!("Attempting to connect to database");
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(&configuration.database.connection_string())
            .await
            .map_err(|e| {
                tracing::error!("Failed to create connection pool: {}", e);
                std::io::Error::new(
                    std::io::ErrorKind::ConnectionRefused,
                    "Database connection error",
                )
            })?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to run migrations: {}", e);
                std::io::Error::new(std::io::ErrorKind::Other, "Migration error")
            })?;

        tracing::info!("Database ready");
        Arc::new(PgStore::new(pool))
    };

    let address = format!(
        "{}:{}",
        configuration.application.host, configuration.application.port
    );
    let listener = TcpListener::bind(&address)?;
    tracing::info!(address = %address, platform = %configuration.application.platform, "Server listening");

    let server = run(listener, store, Arc::new(SystemClock), configuration)?;
    server.await
}
