//! # nightrelay-adapter-storage-sqlite-sqlx
//!
//! `SQLite` persistence adapter using [sqlx](https://docs.rs/sqlx).
//!
//! ## Responsibilities
//! - Implement the `KeyValueStore` port defined in `nightrelay-app::ports`
//! - Manage `SQLite` connection pool lifecycle
//! - Run database migrations (using sqlx embedded migrations)
//! - Honour per-key expiry
//!
//! ## Dependency rule
//! Depends on `nightrelay-app` (for port traits) and `nightrelay-domain`
//! (for error and time types). The `app` and `domain` crates must never
//! reference this adapter.

pub mod error;
pub mod kv_store;
pub mod pool;
