//! Database layer
//!
//! SQLite (default, single-file deployment) or MySQL, selected by
//! `database.driver`. The pool is built once by [`create_pool`] and injected
//! into every repository; [`Storage`] bundles the repositories behind their
//! traits so handlers and services never see the backend.
//!
//! # Usage
//!
//! ```ignore
//! use civicare::config::DatabaseConfig;
//! use civicare::db::{create_pool, migrations, Storage};
//!
//! let pool = create_pool(&DatabaseConfig::default()).await?;
//! migrations::run_migrations(&pool).await?;
//! let storage = Storage::from_pool(pool.clone());
//! let hospitals = storage.hospitals.list().await?;
//! pool.close().await;
//! ```

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repositories;
pub mod storage;

pub use error::StorageError;
pub use pool::{
    create_pool, create_test_pool, mysql_pool, sqlite_pool, DatabasePool, DynDatabasePool,
    MysqlDatabase, SqliteDatabase,
};
pub use storage::Storage;
