//! Application services
//!
//! Concrete service implementations that orchestrate domain logic.
//! Services depend on the storage boundary traits (NodeStore)
//! but are themselves concrete structs, not traits.

mod menu;

pub use menu::{DeleteOutcome, MenuService, MenuUpdate, ReorderOutcome, DEFAULT_CONFLICT_RETRIES};
