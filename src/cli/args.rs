//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{ArgGroup, Parser, Subcommand, ValueHint};

use crate::domain::NodeId;

/// Hierarchical menu tree: add, move, reorder and delete menu entries
#[derive(Parser, Debug)]
#[command(name = "menutree")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Debug output, repeat for more (-d, -dd, -ddd)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub debug: u8,

    /// SQLite database file (overrides config)
    #[arg(long, global = true, value_hint = ValueHint::FilePath)]
    pub database: Option<PathBuf>,

    /// Additional config file, applied after the global one
    #[arg(long, global = true, value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create a menu entry at the end of its sibling group
    Add {
        /// Display name
        name: String,

        /// Parent entry (default: top level)
        #[arg(long)]
        parent: Option<NodeId>,
    },

    /// Show an entry with its parent and children
    Show {
        id: NodeId,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Rename an entry
    Rename { id: NodeId, name: String },

    /// Move an entry under another parent (appended at the end)
    #[command(group(ArgGroup::new("target").required(true).args(["parent", "root"])))]
    Move {
        id: NodeId,

        /// New parent entry
        #[arg(long)]
        parent: Option<NodeId>,

        /// Move to top level
        #[arg(long)]
        root: bool,
    },

    /// Delete an entry together with everything below it
    Delete { id: NodeId },

    /// Move an entry to a position among its siblings (clamped)
    Reorder {
        id: NodeId,

        /// Zero-based target position
        #[arg(allow_negative_numbers = true)]
        order: i64,
    },

    /// Print the whole menu tree
    Tree {
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,

        /// Only entries whose name contains TERM (case-insensitive), with their ancestors
        #[arg(long, value_name = "TERM")]
        search: Option<String>,
    },

    /// Print the path from the top level down to an entry
    Path { id: NodeId },

    /// Insert a sample menu into an empty database
    Seed,

    /// Manage settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completion {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show effective configuration
    Show,
    /// Show config file locations
    Path,
}
