//! camquiz — capture quiz descriptors and show the answers.

use std::path::PathBuf;

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

use camquiz_capture::cli;
use camquiz_capture::config::{resolve_db_path, CaptureConfig};

#[derive(Parser)]
#[command(
    name = "camquiz",
    about = "camquiz — capture interactive-video quiz descriptors and show the answers",
    version,
    after_help = "Run 'camquiz <command> --help' for details on each command."
)]
struct Cli {
    /// Output results as JSON (machine-readable)
    #[arg(long, global = true)]
    json: bool,

    /// Suppress non-essential output
    #[arg(long, short, global = true)]
    quiet: bool,

    /// Path to the capture database
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Path to a JSON config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the quizzes in a local descriptor XML file
    Extract {
        /// Descriptor file (e.g. "Lecture_01_config.xml")
        file: PathBuf,
        /// Print the side-panel HTML instead of text
        #[arg(long)]
        html: bool,
    },
    /// Capture one observed request: filter, fetch, store and show
    Capture {
        /// Request URL
        url: String,
        /// Request resource type as reported by the browser
        #[arg(long, default_value = "xmlhttprequest")]
        kind: String,
    },
    /// Read "<kind> <url>" request lines from stdin and capture matches
    Watch,
    /// List stored captures, newest first
    History {
        /// Maximum number of entries
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Show the most recent capture for a content page
    Show {
        /// Content page URL (".../d2l/le/content/...")
        page_url: String,
        /// Print the side-panel HTML instead of text
        #[arg(long)]
        html: bool,
    },
    /// Generate shell completion scripts
    Completions {
        /// Shell type (bash, zsh, fish, powershell, elvish)
        shell: Shell,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    // Set global flags via environment variables so all commands can check them
    if cli.json {
        std::env::set_var(cli::output::JSON_ENV, "1");
    }
    if cli.quiet {
        std::env::set_var(cli::output::QUIET_ENV, "1");
    }

    let result = run(cli).await;

    // Consistent exit codes: 0=success, 1=error
    if let Err(e) = &result {
        if cli::output::is_json() {
            cli::output::print_json(&serde_json::json!({
                "error": true,
                "message": format!("{e:#}"),
            }));
        } else if !cli::output::is_quiet() {
            eprintln!("  Error: {e:#}");
        }
        std::process::exit(1);
    }

    result
}

async fn run(cli: Cli) -> Result<()> {
    let config = CaptureConfig::load_or_default(cli.config.as_deref())?;
    let explicit_db = cli.db.or_else(|| config.db_path.clone());
    let db_path = resolve_db_path(explicit_db.as_deref());

    match cli.command {
        Commands::Extract { file, html } => cli::extract_cmd::run(&file, html).await,
        Commands::Capture { url, kind } => {
            cli::capture_cmd::run(&config, &db_path, &url, &kind).await
        }
        Commands::Watch => cli::watch_cmd::run(&config, &db_path).await,
        Commands::History { limit } => cli::history_cmd::run(&db_path, limit).await,
        Commands::Show { page_url, html } => cli::show_cmd::run(&db_path, &page_url, html).await,
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "camquiz", &mut std::io::stdout());
            Ok(())
        }
    }
}
