mod memory;
mod postgres;
mod r#trait;

pub use memory::{InMemoryEdgeStore, InMemoryEntityStore, SeedData};
pub use postgres::{PgEdgeStore, PgEntityStore, MIGRATOR};
pub use r#trait::{EdgeStore, EntityStore};

#[cfg(test)]
pub use r#trait::{MockEdgeStore, MockEntityStore};
