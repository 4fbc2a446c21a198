//! SQLite database module for the fulfillment engine.

mod sqlite_impl;

pub mod db;

use log::info;
use sqlx::{
    migrate::{MigrateDatabase, Migrator},
    Sqlite,
};
pub use sqlite_impl::SqliteDatabase;

/// The embedded schema migrations.
pub static MIGRATOR: Migrator = sqlx::migrate!("./src/sqlite/migrations");

/// Creates the database file if it does not already exist, then brings the schema up to date. Run this once at
/// startup, before handing the URL to [`SqliteDatabase::new_with_url`].
pub async fn create_database_and_migrate(url: &str) -> Result<(), sqlx::Error> {
    if !Sqlite::database_exists(url).await? {
        info!("🗃️ Creating new database at {url}");
        Sqlite::create_database(url).await?;
    }
    let pool = db::new_pool(url, 1).await?;
    MIGRATOR.run(&pool).await?;
    pool.close().await;
    Ok(())
}
