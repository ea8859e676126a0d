//! # docset CLI
//!
//! Command-line interface for docset documentation sites.

mod commands;

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "docset")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(long, default_value = "docset.yml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a new docset project
    Init {
        /// Target directory (defaults to current directory)
        path: Option<PathBuf>,
    },

    /// Build the static site
    Build,

    /// Start development server with live reload
    Dev {
        /// Server port (defaults to server.port from the config)
        #[arg(long)]
        port: Option<u16>,
    },

    /// Validate the content collection and emit diagnostics
    Verify {
        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Resolve a single page by slug
    Doc {
        /// Page slug (`kit/routing`)
        slug: String,

        /// Output format
        #[arg(long, value_enum, default_value_t = DocFormat::Json)]
        format: DocFormat,
    },
}

#[derive(Copy, Clone, ValueEnum)]
pub enum DocFormat {
    Json,
    Html,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(if cli.verbose {
                tracing::Level::DEBUG.into()
            } else {
                tracing::Level::INFO.into()
            }),
        )
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Init { path } => commands::init_project(path.as_deref()),
        Commands::Build => commands::build_site(&cli.config).await.map(|_| ()),
        Commands::Dev { port } => commands::dev_server(&cli.config, port).await,
        Commands::Verify { json } => commands::verify_site(&cli.config, json).await,
        Commands::Doc { slug, format } => commands::show_doc(&cli.config, &slug, format).await,
    }
}
