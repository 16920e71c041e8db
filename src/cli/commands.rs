//! Command dispatch: turns parsed arguments into service calls and output.

use std::io;

use clap::CommandFactory;
use clap_complete::{generate, Shell};
use serde::Serialize;
use tracing::{debug, instrument};

use crate::application::services::MenuService;
use crate::application::ApplicationError;
use crate::cli::args::{Cli, Commands, ConfigCommands};
use crate::cli::error::{CliError, CliResult};
use crate::cli::output;
use crate::config::{global_config_path, Settings};
use crate::domain::{Forest, NodeDetail, NodeId};
use crate::infrastructure::ServiceContainer;

/// Sample menu inserted by `seed`: top-level entries with their children.
const SEED_MENU: &[(&str, &[&str])] = &[
    ("Dashboard", &[]),
    ("System Management", &["Users", "Roles & Permissions"]),
];

pub fn execute_command(cli: &Cli) -> CliResult<()> {
    let Some(command) = &cli.command else {
        return Err(CliError::InvalidArgs(
            "no command given, see --help".into(),
        ));
    };

    match command {
        Commands::Completion { shell } => {
            _completion(*shell);
            return Ok(());
        }
        Commands::Config { command } => {
            return _config(command, &load_settings(cli)?);
        }
        _ => {}
    }

    let container = ServiceContainer::new(load_settings(cli)?)?;
    debug!("database: {}", container.settings.database.display());
    run(command, &container.menus)
}

/// Dispatch a menu command against an already wired service.
pub fn run(command: &Commands, menus: &MenuService) -> CliResult<()> {
    match command {
        Commands::Add { name, parent } => _add(menus, name, *parent),
        Commands::Show { id, json } => _show(menus, id, *json),
        Commands::Rename { id, name } => _rename(menus, id, name),
        Commands::Move { id, parent, .. } => _move(menus, id, *parent),
        Commands::Delete { id } => _delete(menus, id),
        Commands::Reorder { id, order } => _reorder(menus, id, *order),
        Commands::Tree { json, search } => _tree(menus, *json, search.as_deref()),
        Commands::Path { id } => _path(menus, id),
        Commands::Seed => _seed(menus),
        Commands::Config { .. } | Commands::Completion { .. } => Err(CliError::InvalidArgs(
            "command does not operate on the menu tree".into(),
        )),
    }
}

fn load_settings(cli: &Cli) -> CliResult<Settings> {
    let settings = Settings::load(cli.config.as_deref())?;
    Ok(match &cli.database {
        Some(path) => settings.with_database(path),
        None => settings,
    })
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> CliResult<()> {
    output::info(&serde_json::to_string_pretty(value)?);
    Ok(())
}

#[instrument(skip(menus))]
fn _add(menus: &MenuService, name: &str, parent: Option<NodeId>) -> CliResult<()> {
    let node = menus.create(name, parent)?;
    output::action("Created", &node);
    Ok(())
}

#[instrument(skip(menus))]
fn _show(menus: &MenuService, id: &NodeId, json: bool) -> CliResult<()> {
    let detail = menus.get(id)?;
    if json {
        return print_json(&detail);
    }
    print_detail(&detail);
    Ok(())
}

fn print_detail(detail: &NodeDetail) {
    output::header(&detail.node.name);
    output::detail(&format!("id:     {}", detail.node.id));
    output::detail(&format!("order:  {}", detail.node.order));
    match &detail.parent {
        Some(parent) => output::detail(&format!("parent: {}", parent)),
        None => output::detail(&"parent: -"),
    }
    if detail.children.is_empty() {
        return;
    }
    output::detail(&"children:");
    for child in &detail.children {
        output::detail(&format!("  [{}] {}", child.order, child));
    }
}

#[instrument(skip(menus))]
fn _rename(menus: &MenuService, id: &NodeId, name: &str) -> CliResult<()> {
    let node = menus.rename(id, name)?;
    output::action("Renamed", &node);
    Ok(())
}

#[instrument(skip(menus))]
fn _move(menus: &MenuService, id: &NodeId, parent: Option<NodeId>) -> CliResult<()> {
    let node = menus.move_node(id, parent)?;
    match node.parent_id {
        Some(parent) => output::action("Moved", &format!("{} under {} at {}", node, parent, node.order)),
        None => output::action("Moved", &format!("{} to top level at {}", node, node.order)),
    }
    Ok(())
}

#[instrument(skip(menus))]
fn _delete(menus: &MenuService, id: &NodeId) -> CliResult<()> {
    let outcome = menus.delete(id)?;
    output::action("Deleted", &format!("{} entries", outcome.removed.len()));
    for removed in &outcome.removed {
        output::removed(removed);
    }
    Ok(())
}

#[instrument(skip(menus))]
fn _reorder(menus: &MenuService, id: &NodeId, order: i64) -> CliResult<()> {
    let outcome = menus.reorder(id, order)?;
    if i64::from(outcome.order) != order {
        output::warning(&format!("position {} clamped to {}", order, outcome.order));
    }
    output::action("Reordered", &format!("{} to {}", id, outcome.order));
    Ok(())
}

#[instrument(skip(menus))]
fn _tree(menus: &MenuService, json: bool, search: Option<&str>) -> CliResult<()> {
    let forest = match search {
        Some(term) => menus.search(term)?,
        None => menus.forest()?,
    };
    if json {
        return print_json(&forest);
    }
    print_forest(&forest);
    Ok(())
}

fn print_forest(forest: &Forest) {
    if forest.is_empty() {
        output::warning(&"menu is empty");
        return;
    }
    output::tree(&forest.render());
}

#[instrument(skip(menus))]
fn _path(menus: &MenuService, id: &NodeId) -> CliResult<()> {
    let path = menus.path(id)?;
    let names: Vec<&str> = path.iter().map(|node| node.name.as_str()).collect();
    output::info(&names.join(" > "));
    Ok(())
}

#[instrument(skip(menus))]
fn _seed(menus: &MenuService) -> CliResult<()> {
    let existing = menus.store().fetch_all().map_err(ApplicationError::from)?;
    if !existing.is_empty() {
        output::warning(&"database is not empty, skipping seed");
        return Ok(());
    }
    for (name, children) in SEED_MENU {
        let parent = menus.create(name, None)?;
        output::success(&parent);
        for child in children.iter() {
            let node = menus.create(child, Some(parent.id))?;
            output::success_detail(&node);
        }
    }
    Ok(())
}

fn _config(command: &ConfigCommands, settings: &Settings) -> CliResult<()> {
    match command {
        ConfigCommands::Show => output::info(&settings.to_toml()?),
        ConfigCommands::Path => match global_config_path() {
            Some(path) => {
                let state = if path.exists() { "exists" } else { "not found" };
                output::detail(&format!("global: {} ({})", path.display(), state));
            }
            None => output::warning(&"no config directory on this platform"),
        },
    }
    Ok(())
}

fn _completion(shell: Shell) {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    generate(shell, &mut cmd, name, &mut io::stdout());
}
