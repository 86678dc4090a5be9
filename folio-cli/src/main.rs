//! # folio CLI
//!
//! Command-line interface for the folio wiki engine.

mod commands;
mod documents;

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "folio")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to configuration file (used when it exists)
    #[arg(long, global = true, default_value = "folio.yml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a document directory to HTML
    Render {
        /// Directory of `*.txt` parts
        dir: PathBuf,

        /// Render a single part without heading or edit button
        #[arg(long)]
        fragment: bool,

        /// Render headings without section numbers
        #[arg(long)]
        preview: bool,

        /// Wrap the article in a complete HTML page
        #[arg(long)]
        standalone: bool,

        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print document metadata as JSON
    Metadata {
        /// Directory of `*.txt` parts
        dir: PathBuf,

        /// User slug for the document URL
        #[arg(long, env = "FOLIO_USER")]
        user: String,

        /// IANA timezone for `$ DATE`
        #[arg(long)]
        timezone: Option<String>,

        /// Document slug (defaults to the slug of the title)
        #[arg(long)]
        doc: Option<String>,
    },

    /// Print the document outline
    Outline {
        /// Directory of `*.txt` parts
        dir: PathBuf,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutlineFormat::Text)]
        format: OutlineFormat,
    },

    /// Normalise the layout of one part
    Canonicalize {
        /// Part file
        file: PathBuf,

        /// Rewrite the file instead of printing
        #[arg(long)]
        in_place: bool,
    },

    /// Bundle a document directory into one text file
    Export {
        /// Directory of `*.txt` parts
        dir: PathBuf,

        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Split a bundle back into a document directory
    Import {
        /// Bundle written by `folio export`
        bundle: PathBuf,

        /// Target directory (created if missing)
        dir: PathBuf,
    },
}

#[derive(Copy, Clone, ValueEnum)]
pub enum OutlineFormat {
    Text,
    Json,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let subscriber = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(if cli.verbose {
                tracing::Level::DEBUG.into()
            } else {
                tracing::Level::INFO.into()
            }),
        )
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Render {
            dir,
            fragment,
            preview,
            standalone,
            output,
        } => {
            let opts = commands::RenderArgs {
                fragment,
                preview,
                standalone,
            };
            commands::render_document(&cli.config, &dir, opts, output.as_deref())
        }
        Commands::Metadata {
            dir,
            user,
            timezone,
            doc,
        } => commands::show_metadata(&cli.config, &dir, &user, timezone, doc.as_deref()),
        Commands::Outline { dir, format } => commands::show_outline(&cli.config, &dir, format),
        Commands::Canonicalize { file, in_place } => commands::canonicalize_file(&file, in_place),
        Commands::Export { dir, output } => {
            commands::export_document(&cli.config, &dir, output.as_deref())
        }
        Commands::Import { bundle, dir } => commands::import_document(&bundle, &dir),
    }
}
