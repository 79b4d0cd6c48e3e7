/// Business logic layer for engagement-service
///
/// - Toggle engine: like/unlike and subscribe/unsubscribe as one idempotent toggle
/// - Cascade coordinator: edge and comment cleanup when entities disappear
/// - Aggregation engine: paginated read views with counts and viewer flags
pub mod aggregation;
pub mod cascade;
pub mod toggle;

#[cfg(test)]
pub(crate) mod fixtures;

pub use aggregation::AggregationEngine;
pub use cascade::{CascadeCoordinator, ChannelCleanupReport, DeletionReport, SweepReport};
pub use toggle::ToggleEngine;
