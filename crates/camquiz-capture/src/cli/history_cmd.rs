//! `camquiz history` — list stored captures, newest first.

use anyhow::{Context, Result};
use std::path::Path;

use crate::cli::output;
use crate::display::render_history;
use crate::store::{history, SqliteStore};

/// Run the history command.
pub async fn run(db_path: &Path, limit: Option<usize>) -> Result<()> {
    let store = SqliteStore::open(db_path)
        .with_context(|| format!("failed to open capture store {}", db_path.display()))?;

    let mut records = history(&store)?;
    if let Some(limit) = limit {
        records.truncate(limit);
    }

    if output::is_json() {
        output::print_json(&records);
    } else {
        print!("{}", render_history(&records));
    }

    Ok(())
}
