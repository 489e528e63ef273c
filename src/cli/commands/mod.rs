//! CLI parser and dispatch to command-specific modules.

mod check;
mod config_cmd;
mod crop;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::Config;
use crate::models::DocumentType;

#[derive(Parser)]
#[command(name = "deedcheck")]
#[command(about = "Proofread Japanese real-estate transaction documents with a vision model")]
#[command(version)]
pub struct Cli {
    /// Config file path (overrides auto-discovery)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Model name (overrides config file and GEMINI_MODEL)
    #[arg(short, long, global = true)]
    model: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// Check a single document
    Check {
        /// PDF to check
        pdf: PathBuf,
        /// Document type
        #[arg(short = 't', long = "type", value_enum, default_value_t = DocumentType::Auto)]
        document_type: DocumentType,
        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Cross-check a disclosure draft against evidence documents
    CrossCheck {
        /// Evidence PDF (registry transcript, survey map, ...); repeat for several
        #[arg(short, long = "evidence", required = true)]
        evidence: Vec<PathBuf>,
        /// Disclosure statement draft PDF
        disclosure: PathBuf,
        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Cut the region a finding points at out of a page image
    Crop {
        /// Page image (JPEG or PNG)
        image: PathBuf,
        /// Box as ymin,xmin,ymax,xmax normalised to 0-1000
        #[arg(short, long = "box")]
        bbox: String,
        /// Output PNG path
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Show the effective configuration
    Config,
}

async fn load_config(path: Option<&PathBuf>, model: Option<&str>) -> anyhow::Result<Config> {
    let mut config = match path {
        Some(path) => Config::load_from_path(path).await?,
        None => Config::load().await,
    };
    if let Some(model) = model {
        config.llm = config.llm.with_model(model);
    }
    Ok(config)
}

/// Run the CLI.
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_ref(), cli.model.as_deref()).await?;

    match cli.command {
        Commands::Check {
            pdf,
            document_type,
            json,
        } => check::cmd_check(&config, &pdf, document_type, json).await,
        Commands::CrossCheck {
            evidence,
            disclosure,
            json,
        } => check::cmd_cross_check(&config, &evidence, &disclosure, json).await,
        Commands::Crop {
            image,
            bbox,
            output,
        } => crop::cmd_crop(&image, &bbox, &output),
        Commands::Config => config_cmd::cmd_config_show(&config),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_cross_check_with_repeated_evidence() {
        let cli = Cli::parse_from([
            "deedcheck",
            "cross-check",
            "-e",
            "registry.pdf",
            "--evidence",
            "survey.pdf",
            "draft.pdf",
            "--json",
        ]);
        match cli.command {
            Commands::CrossCheck {
                evidence,
                disclosure,
                json,
            } => {
                assert_eq!(evidence.len(), 2);
                assert_eq!(disclosure, PathBuf::from("draft.pdf"));
                assert!(json);
            }
            _ => panic!("expected cross-check"),
        }
    }

    #[test]
    fn test_parse_check_type() {
        let cli = Cli::parse_from([
            "deedcheck",
            "-m",
            "gemini-2.5-pro",
            "check",
            "a.pdf",
            "--type",
            "equipment",
        ]);
        assert_eq!(cli.model.as_deref(), Some("gemini-2.5-pro"));
        match cli.command {
            Commands::Check { document_type, .. } => {
                assert_eq!(document_type, DocumentType::Equipment)
            }
            _ => panic!("expected check"),
        }
    }
}
