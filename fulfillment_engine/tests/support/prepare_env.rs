use fulfillment_engine::SqliteDatabase;
use log::*;
use sqlx::{migrate, migrate::MigrateDatabase, Sqlite};

/// Returns a unique sqlite url under the system temp directory, so parallel tests never share a database file.
pub fn random_db_path() -> String {
    format!("sqlite://{}/test_fulfillment_{}.db", std::env::temp_dir().display(), rand::random::<u64>())
}

/// Drops any stale database at `url`, recreates it and brings the schema up to date.
pub async fn prepare_test_env(url: &str) {
    dotenvy::from_filename(".env.test").ok();
    let _ = env_logger::try_init();
    if let Err(e) = Sqlite::drop_database(url).await {
        debug!("Could not drop {url}: {e}");
    }
    Sqlite::create_database(url).await.expect("Error creating test database");
    let db = SqliteDatabase::new_with_url(url, 5).await.expect("Error connecting to test database");
    migrate!("./src/sqlite/migrations").run(db.pool()).await.expect("Error running migrations");
    info!("🚀️ Test database ready at {url}");
}
