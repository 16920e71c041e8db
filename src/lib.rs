//! Hierarchical menu tree engine.
//!
//! Nodes form a forest: each has at most one parent, siblings carry a dense
//! `0..n-1` order, and no node is ever its own ancestor. All mutations go
//! through [`application::services::MenuService`], which keeps those
//! properties on every committed state.

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod util;
