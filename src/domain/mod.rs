//! Domain layer: entities and tree rules
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod ancestry;
pub mod error;
pub mod forest;
pub mod node;
pub mod ordering;

pub use ancestry::AncestryIndex;
pub use error::{DomainError, ErrorKind};
pub use forest::{Forest, ForestNode};
pub use node::{validate_name, Node, NodeDetail, NodeId, NodeUpdate};
pub use ordering::{is_contiguous, OrderChange, SiblingGroup};
