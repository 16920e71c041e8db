//! Terminal output for menu commands
//!
//! Colors follow NO_COLOR, CLICOLOR and CLICOLOR_FORCE.

use colored::Colorize;

/// Error line on stderr, red bold "error:" prefix
pub fn error(msg: &(impl std::fmt::Display + ?Sized)) {
    eprintln!("{}: {}", "error".red().bold(), msg);
}

/// Warning line on stderr, e.g. a clamped reorder position
pub fn warning(msg: &(impl std::fmt::Display + ?Sized)) {
    eprintln!("{}: {}", "Warning".yellow(), msg);
}

/// Seeded top-level entry
pub fn success(msg: &(impl std::fmt::Display + ?Sized)) {
    println!("{} {}", "✓".green(), msg);
}

/// Seeded child entry, indented under its parent
pub fn success_detail(msg: &(impl std::fmt::Display + ?Sized)) {
    println!("  {} {}", "✓".green(), msg);
}

/// Completed mutation: green label, then the affected entry
pub fn action(label: &str, msg: &(impl std::fmt::Display + ?Sized)) {
    println!("{}: {}", label.green(), msg);
}

/// Entry name heading `show` output
pub fn header(msg: &(impl std::fmt::Display + ?Sized)) {
    println!("{}", msg.to_string().cyan().bold());
}

/// One id removed by a cascading delete
pub fn removed(id: &(impl std::fmt::Display + ?Sized)) {
    println!("  {} {}", "-".red(), id);
}

/// Indented field line (no color)
pub fn detail(msg: &(impl std::fmt::Display + ?Sized)) {
    println!("  {}", msg);
}

/// Plain data line (paths, JSON, config)
pub fn info(msg: &(impl std::fmt::Display + ?Sized)) {
    println!("{}", msg);
}

/// Pre-rendered tree text; every line already ends in a newline.
pub fn tree(rendered: &str) {
    print!("{}", rendered);
}
