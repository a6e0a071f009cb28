//! Blog Service
//!
//! REST backend for a multi-author blog: accounts, posts, comments and
//! categories. Every read and write is gated by the [`authz`] layer, which
//! combines an ownership policy with an administrator role policy.
//!
//! # Modules
//!
//! - `authz`: principals, ownership and role policies, the action gate
//! - `services`: operations in check, lookup, check, mutate order
//! - `handlers`: actix-web routes under `/api/v1`
//! - `db`: repository traits and their PostgreSQL implementations
//! - `storage`: profile photo files
//! - `jobs`: background maintenance loops
//! - `middleware`: bearer-token authentication and request metrics

pub mod authz;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod jobs;
pub mod metrics;
pub mod middleware;
pub mod models;
pub mod openapi;
pub mod pagination;
pub mod services;
pub mod state;
pub mod storage;

pub use config::Config;
pub use error::{AppError, Result};
pub use state::AppState;
