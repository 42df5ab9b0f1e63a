use migration::Migrator;
use sea_orm::{Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;

/// Fresh in-memory SQLite database with all migrations applied.
pub async fn setup_test_db() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:")
        .await
        .expect("Failed to connect to in-memory db");

    Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");

    db
}

/// File-backed SQLite database for tests that need a shared connection pool
/// (e.g. concurrent writers). Returns the connection and the temp dir that
/// owns the file; keep the dir alive for the duration of the test.
pub async fn setup_test_db_file() -> (DatabaseConnection, tempfile::TempDir) {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("test.db");
    let url = format!("sqlite://{}?mode=rwc", path.display());

    let db = Database::connect(&url)
        .await
        .expect("Failed to connect to file-backed db");

    Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");

    (db, dir)
}
