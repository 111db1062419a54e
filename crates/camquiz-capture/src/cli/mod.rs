//! CLI subcommand implementations for the camquiz binary.

pub mod capture_cmd;
pub mod extract_cmd;
pub mod history_cmd;
pub mod output;
pub mod show_cmd;
pub mod watch_cmd;
