use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use codescope::boundary::ProjectBoundary;
use codescope::config::Config;
use codescope::engine::Engine;
use codescope::language::{ConstructKind, LanguageId};
use codescope::mcp::server::{McpContext, McpServer};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "codescope",
    version,
    about = "Measure, outline, and extract slices of large source files"
)]
struct Cli {
    /// Path to the config file (defaults to codescope.json)
    #[arg(long, global = true, default_value = "")]
    config: String,

    /// Project root override (skips marker detection)
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the MCP server on stdio
    Serve,
    /// File-level size and comment metrics
    Measure {
        /// File path, relative to the project root
        file: PathBuf,
        /// Language override; detected when omitted
        #[arg(long)]
        language: Option<LanguageId>,
    },
    /// Structural outline with exact line positions
    Outline {
        /// File path, relative to the project root
        file: PathBuf,
        /// Language override; detected when omitted
        #[arg(long)]
        language: Option<LanguageId>,
        /// Construct kinds to extract (e.g. class,method); all when omitted
        #[arg(long, value_delimiter = ',')]
        constructs: Option<Vec<ConstructKind>>,
    },
    /// Print an exact line range (1-based, inclusive)
    Extract {
        /// File path, relative to the project root
        file: PathBuf,
        start_line: usize,
        end_line: usize,
        /// Emit JSON with position metadata instead of raw content
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr; stdout belongs to the MCP transport and to results.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    // 1. Load config
    let config = Config::load(&cli.config)?;
    config.validate()?;

    // 2. Resolve the project boundary: CLI flag, then config, then markers
    let root_override = cli
        .root
        .clone()
        .or_else(|| config.project_root.as_ref().map(PathBuf::from));
    let boundary = match root_override {
        Some(root) => ProjectBoundary::new(&root)
            .with_context(|| format!("invalid project root: {}", root.display()))?,
        None => {
            let cwd = std::env::current_dir().context("failed to get current directory")?;
            ProjectBoundary::detect(&cwd, &config.root_markers)?
        }
    };
    tracing::info!("Project root: {}", boundary.root().display());

    // 3. Build the engine and dispatch
    let engine = Engine::new(config, boundary);

    match cli.command {
        Command::Serve => {
            let server = McpServer::new(McpContext {
                engine: Arc::new(engine),
            });
            server.start().await?;
        }
        Command::Measure { file, language } => {
            let metrics = engine.measure(&file, language)?;
            println!("{}", serde_json::to_string_pretty(&metrics)?);
        }
        Command::Outline {
            file,
            language,
            constructs,
        } => {
            let result = engine.analyze(&file, language, constructs.as_deref())?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Command::Extract {
            file,
            start_line,
            end_line,
            json,
        } => {
            let slice = engine.extract(&file, start_line, end_line)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&slice)?);
            } else {
                print!("{}", slice.content);
            }
        }
    }

    Ok(())
}
