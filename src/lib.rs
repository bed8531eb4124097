//! # treetracker-query
//!
//! Read-only query service over the denormalized tree planting dataset.
//!
//! The crate exposes a small HTTP surface for looking trees up by id or
//! uuid, listing them by a single filter dimension (organization, capture
//! date range, tag, wallet, or planter) with pagination and exact totals,
//! and returning the curated featured list.
//!
//! ## Layout
//!
//! - [`config`] - layered configuration (files, then environment)
//! - [`database`] - Postgres pool creation with retry
//! - [`error`] - crate-wide error type and HTTP mapping
//! - [`model`] - the denormalized tree record
//! - [`query`] - filters, SQL builders, readers, and the query engine
//! - [`handlers`] / [`health`] - the HTTP surface
//! - [`server`] - axum server with middleware and graceful shutdown

pub mod config;
pub mod database;
pub mod error;
pub mod handlers;
pub mod health;
pub mod model;
pub mod observability;
pub mod query;
pub mod server;
pub mod state;

/// Common imports for binaries and tests
pub mod prelude {
    pub use crate::config::Config;
    pub use crate::database::create_pool;
    pub use crate::error::{Error, Result};
    pub use crate::model::Tree;
    pub use crate::query::{
        ListFilter, Page, QueryEngine, QueryOutcome, SortField, SortOrder, SortSpec, TreeFilter,
        TreeKey, TreeQuery,
    };
    pub use crate::server::Server;
    pub use crate::state::AppState;
}
