pub mod models;
pub mod test_utils;

use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use std::path::Path;
use std::time::Duration;
use util::config;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

/// Connects using `DATABASE_PATH` from configuration.
///
/// Accepts either a full DSN (`sqlite:`, `postgres://`, `mysql://`) or a bare
/// SQLite file path, creating parent directories for the latter. Connection
/// establishment and pool acquisition both carry explicit timeouts so a
/// stalled store surfaces as an error instead of a hang.
pub async fn connect() -> DatabaseConnection {
    connect_to(&config::database_path()).await
}

async fn connect_to(path_or_url: &str) -> DatabaseConnection {
    let mut opts = ConnectOptions::new(normalize_url(path_or_url));
    opts.connect_timeout(CONNECT_TIMEOUT)
        .acquire_timeout(ACQUIRE_TIMEOUT);

    Database::connect(opts)
        .await
        .expect("Failed to connect to database")
}

fn normalize_url(path_or_url: &str) -> String {
    if path_or_url.starts_with("sqlite:")
        || path_or_url.starts_with("postgres://")
        || path_or_url.starts_with("mysql://")
    {
        return path_or_url.to_owned();
    }

    // SQLite won't create intermediate dirs.
    if let Some(parent) = Path::new(path_or_url).parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    format!("sqlite://{path_or_url}?mode=rwc")
}
