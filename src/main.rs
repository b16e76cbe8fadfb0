//! nfquery - ask questions about invoice CSV archives
//!
//! A CLI tool that loads a ZIP with an invoice header CSV and an invoice
//! items CSV, and answers natural-language questions about them through
//! an OpenAI-compatible chat completion API.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (config, unreadable archive, missing or malformed tables)
//!   2 - A one-shot question was not answered by the agent

mod agent;
mod analysis;
mod archive;
mod cli;
mod config;
mod error;
mod loader;
mod models;
mod report;
mod session;
mod shell;

use agent::QueryDispatcher;
use anyhow::{Context, Result};
use cli::{Args, OutputFormat};
use config::{Config, CONFIG_FILE_NAME};
use indicatif::{ProgressBar, ProgressStyle};
use models::{Answer, TableSelection, UploadedArchive};
use session::Session;
use shell::Command;
use std::io::Write;
use std::path::Path;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    init_logging(&args);

    info!("nfquery v{}", env!("CARGO_PKG_VERSION"));
    debug!("Archive: {}", args.archive_path().display());

    match run(args).await {
        Ok(exit_code) => {
            std::process::exit(exit_code);
        }
        Err(e) => {
            error!("nfquery failed: {:#}", e);
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .nfquery.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(CONFIG_FILE_NAME);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            CONFIG_FILE_NAME
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", CONFIG_FILE_NAME))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE_NAME);
    println!("   Edit it to customize the model, API URL, file name tokens, and more.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
fn init_logging(args: &Args) {
    let level = args.log_level();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

/// Where and how results are printed.
struct Output {
    format: OutputFormat,
    quiet: bool,
    preview_rows: usize,
}

impl Output {
    /// Progress lines only appear in text mode and outside --quiet.
    fn progress(&self, message: &str) {
        if !self.quiet && self.format == OutputFormat::Text {
            println!("{}", message);
        }
    }

    fn tables(&self, session: &Session, preview_rows: usize) -> Result<()> {
        match (self.format, session.tables()) {
            (OutputFormat::Json, tables) => {
                println!("{}", report::generate_tables_json(tables, preview_rows)?)
            }
            (OutputFormat::Text, Some(tables)) => {
                print!("{}", report::generate_tables_text(tables, preview_rows))
            }
            (OutputFormat::Text, None) => println!("No tables loaded. Use :load <zip>."),
        }
        Ok(())
    }

    fn schema(&self, session: &Session) -> Result<()> {
        match self.format {
            OutputFormat::Json => self.tables(session, 0),
            OutputFormat::Text => {
                let summaries = session.summaries();
                if summaries.is_empty() {
                    println!("No tables loaded. Use :load <zip>.");
                } else {
                    print!("{}", report::generate_schema_text(&summaries));
                }
                Ok(())
            }
        }
    }

    fn answer(&self, question: &str, selection: TableSelection, answer: &Answer) -> Result<()> {
        match self.format {
            OutputFormat::Json => println!(
                "{}",
                report::generate_answer_json(question, selection, answer)?
            ),
            OutputFormat::Text => print!("{}", report::generate_answer_text(answer)),
        }
        Ok(())
    }
}

/// Run the CLI workflow. Returns the exit code (0 or 2).
async fn run(args: Args) -> Result<i32> {
    // Load configuration
    let mut config = load_config(&args)?;
    config.merge_with_args(&args);

    let output = Output {
        format: args.format,
        quiet: args.quiet,
        preview_rows: config.display.preview_rows,
    };

    let dispatcher = QueryDispatcher::from_settings(&config.agent);
    if let Some(model) = dispatcher.model() {
        output.progress(&format!("🤖 Agent: {} at {}", model, config.agent.api_url));
    } else {
        output.progress("⚠️  No API key configured: questions will not be answered.");
    }

    let mut session = Session::new(&config, dispatcher);

    let archive_path = args.archive_path();
    upload_from_path(&mut session, &archive_path, &output)?;

    // --describe: print schemas and previews, then exit
    if args.describe {
        output.tables(&session, output.preview_rows)?;
        return Ok(0);
    }

    // One-shot question
    if let Some(ref question) = args.question {
        let answer = ask_with_spinner(&mut session, question, args.table, args.quiet).await;
        output.answer(question, args.table, &answer)?;

        if !answer.is_answered() {
            return Ok(2);
        }
        return Ok(0);
    }

    output.tables(&session, output.preview_rows)?;
    run_shell(&mut session, &output, args.table).await
}

/// Read an archive from disk and load it into the session.
fn upload_from_path(session: &mut Session, path: &Path, output: &Output) -> Result<()> {
    output.progress(&format!("📦 Loading archive: {}", path.display()));

    let archive = UploadedArchive::from_path(path)
        .with_context(|| format!("Failed to read archive: {}", path.display()))?;
    let tables = session.upload(&archive)?;

    output.progress(&format!(
        "✅ Loaded {} ({} rows) and {} ({} rows)\n",
        tables.header.name,
        tables.header.row_count(),
        tables.items.name,
        tables.items.row_count()
    ));
    debug!("Session is {}", session.phase());
    Ok(())
}

/// Ask a question, showing a spinner while the agent works.
async fn ask_with_spinner(
    session: &mut Session,
    question: &str,
    selection: TableSelection,
    quiet: bool,
) -> Answer {
    let spinner = if !quiet && session.dispatcher().is_configured() && session.tables().is_some() {
        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg} [{elapsed}]") {
            pb.set_style(style);
        }
        pb.set_message(format!("Asking the agent about the {} table(s)...", selection));
        pb.enable_steady_tick(Duration::from_millis(120));
        Some(pb)
    } else {
        None
    };

    let answer = session.ask(question, selection).await;

    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }
    answer
}

/// Interactive loop over stdin. Returns the exit code.
async fn run_shell(session: &mut Session, output: &Output, initial: TableSelection) -> Result<i32> {
    let mut selection = initial;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    output.progress("Type a question, or :help for commands.");

    loop {
        if !output.quiet && output.format == OutputFormat::Text {
            print!("nfquery [{}]> ", selection);
            std::io::stdout().flush().context("Failed to flush stdout")?;
        }

        let Some(line) = lines.next_line().await.context("Failed to read input")? else {
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let command = match Command::parse(line) {
            Ok(command) => command,
            Err(message) => {
                eprintln!("{}", message);
                continue;
            }
        };

        match command {
            Command::Quit => break,
            Command::Help => println!("{}", shell::HELP),
            Command::Table(next) => {
                selection = next;
                output.progress(&format!("Questions now go to the {} table(s).", selection));
            }
            Command::Preview => output.tables(session, output.preview_rows)?,
            Command::Schema => output.schema(session)?,
            Command::Reset => {
                session.reset();
                output.progress("Tables dropped.");
            }
            Command::Load(path) => {
                if let Err(e) = upload_from_path(session, &path, output) {
                    warn!("Load failed: {:#}", e);
                    eprintln!("❌ {:#}", e);
                }
            }
            Command::Ask(question) => {
                let answer = ask_with_spinner(session, &question, selection, output.quiet).await;
                output.answer(&question, selection, &answer)?;
            }
        }
    }

    session.reset();
    Ok(0)
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from {}", CONFIG_FILE_NAME);
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {}", e);
            Ok(Config::default())
        }
    }
}
