//! Infrastructure layer: storage backends and DI container
//!
//! This layer implements the storage boundary traits and wires up services.

pub mod di;
pub mod error;
pub mod memory;
pub mod sqlite;
pub mod traits;

pub use di::ServiceContainer;
pub use error::{StoreError, StoreResult};
pub use memory::MemoryNodeStore;
pub use sqlite::SqliteNodeStore;
pub use traits::{NodeReader, NodeStore, NodeTransaction};
