/// Engagement Service Library
///
/// Likes, subscriptions and the read-time views built from them. Content
/// records (users, videos, comments, posts) are owned elsewhere; this service
/// reads them and cascades their deletes into the edge tables.
///
/// # Modules
///
/// - `domain`: Edge and entity records, pagination, read projections
/// - `repository`: `EdgeStore`/`EntityStore` traits with Postgres and in-memory backends
/// - `services`: Toggle engine, cascade coordinator, aggregation engine
/// - `handlers`: HTTP request handlers
/// - `middleware`: Identity extractors for the `x-user-id` header
/// - `error`: Error types and HTTP mapping
/// - `config`: Configuration management
/// - `metrics`: Prometheus collectors
pub mod config;
pub mod domain;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod repository;
pub mod services;
pub mod state;

pub use config::Config;
pub use error::{ServiceError, ServiceResult};
pub use state::AppState;
