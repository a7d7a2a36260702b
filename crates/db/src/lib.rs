//! Connection handle and migration runner for the shelf store.
//!
//! The whole process shares one [`Database`]: it is opened once at startup,
//! cloned into request handlers, and closed explicitly on shutdown.

pub mod database;
pub mod error;
pub mod migrate;

pub use database::Database;
pub use error::DbError;
pub use migrate::Migration;
