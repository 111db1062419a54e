//! `camquiz extract` — show the quizzes in a local descriptor file.

use anyhow::{Context, Result};
use camquiz::{extract_quizzes, render_html, render_text, PanelView};
use std::path::Path;

use crate::cli::output;

/// Run the extract command.
pub async fn run(file: &Path, html: bool) -> Result<()> {
    let xml = tokio::fs::read_to_string(file)
        .await
        .with_context(|| format!("failed to read {}", file.display()))?;

    let document = extract_quizzes(&xml)
        .with_context(|| format!("{} is not well-formed XML", file.display()))?;
    let view = PanelView::from_document(&document);

    if output::is_json() {
        output::print_json(&document);
    } else if html {
        println!("{}", render_html(&view));
    } else if view.is_empty() {
        if !output::is_quiet() {
            println!("  No quiz questions found in {}.", file.display());
        }
    } else {
        print!("{}", render_text(&view));
    }

    Ok(())
}
