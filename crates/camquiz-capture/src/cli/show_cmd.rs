//! `camquiz show` — restore the panel for a content page from the store.

use anyhow::{Context, Result};
use camquiz::render_html;
use std::path::Path;

use crate::cli::output;
use crate::display::{is_video_page, restore_for_page};
use crate::store::SqliteStore;

/// Run the show command.
pub async fn run(db_path: &Path, page_url: &str, html: bool) -> Result<()> {
    let store = SqliteStore::open(db_path)
        .with_context(|| format!("failed to open capture store {}", db_path.display()))?;

    let restored = restore_for_page(&store, page_url)?;

    match restored {
        Some(shown) if output::is_json() => output::print_json(&shown),
        Some(shown) if html => println!("{}", render_html(&shown.view)),
        Some(shown) => print!("{}", shown.to_text()),
        None if output::is_json() => output::print_json(&serde_json::Value::Null),
        None => {
            if !output::is_quiet() {
                if is_video_page(page_url) {
                    println!("  No capture found for this page.");
                } else {
                    println!("  {page_url} is not a content page.");
                }
            }
        }
    }

    Ok(())
}
