//! CLI interface for the ATS resume checker

use crate::config::OutputFormat;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "ats-resume-checker")]
#[command(version)]
#[command(about = "Check how well a resume will survive an applicant tracking system")]
#[command(long_about = "Score a resume against an ATS platform profile and an optional job description: formatting rules, required sections, file type and keyword coverage")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Analyze a resume against an ATS profile
    Analyze {
        /// Path to the resume (PDF, DOCX, TXT, MD, or an image when OCR is enabled)
        resume: PathBuf,

        /// Job description file (TXT, MD)
        #[arg(short, long, conflicts_with = "job_text")]
        job: Option<PathBuf>,

        /// Job description given inline
        #[arg(long)]
        job_text: Option<String>,

        /// ATS profile key, e.g. taleo, greenhouse, workday
        #[arg(short, long)]
        profile: Option<String>,

        /// Output format: console, json, markdown, html
        #[arg(short, long)]
        output: Option<String>,

        /// Save output to file
        #[arg(short, long)]
        save: Option<PathBuf>,

        /// Include sections, entities and layout details
        #[arg(short, long)]
        detailed: bool,
    },

    /// ATS platform profiles
    Profiles {
        #[command(subcommand)]
        action: ProfileAction,
    },

    /// Embedding model management
    Models {
        #[command(subcommand)]
        action: ModelAction,
    },

    /// Show configuration
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },
}

#[derive(Subcommand)]
pub enum ProfileAction {
    /// List available ATS profiles
    List,

    /// Show the rules of one profile
    Show {
        /// Profile key
        key: String,
    },
}

#[derive(Subcommand)]
pub enum ModelAction {
    /// List available and downloaded embedding models
    List,

    /// Download an embedding model
    Download {
        /// Model id, name or HuggingFace repo ID
        model: String,
    },

    /// Remove a downloaded model
    Remove {
        /// Model id to remove
        model: String,
    },
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Reset configuration to defaults
    Reset,

    /// Print the configuration file location
    Path,
}

/// Parse and validate output format
pub fn parse_output_format(format: &str) -> Result<OutputFormat, String> {
    match format.to_lowercase().as_str() {
        "console" => Ok(OutputFormat::Console),
        "json" => Ok(OutputFormat::Json),
        "markdown" | "md" => Ok(OutputFormat::Markdown),
        "html" => Ok(OutputFormat::Html),
        _ => Err(format!(
            "Invalid output format: {}. Supported: console, json, markdown, html",
            format
        )),
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
    fn test_parse_analyze() {
        let cli = Cli::try_parse_from([
            "ats-resume-checker",
            "analyze",
            "resume.pdf",
            "--job",
            "job.txt",
            "--profile",
            "workday",
            "-o",
            "json",
        ])
        .unwrap();

        match cli.command {
            Commands::Analyze { resume, job, profile, output, .. } => {
                assert_eq!(resume, PathBuf::from("resume.pdf"));
                assert_eq!(job, Some(PathBuf::from("job.txt")));
                assert_eq!(profile.as_deref(), Some("workday"));
                assert_eq!(output.as_deref(), Some("json"));
            }
            _ => panic!("expected analyze"),
        }
    }

    #[test]
    fn test_job_sources_conflict() {
        let result = Cli::try_parse_from([
            "ats-resume-checker",
            "analyze",
            "resume.pdf",
            "--job",
            "job.txt",
            "--job-text",
            "Rust",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_output_format() {
        assert_eq!(parse_output_format("MD"), Ok(OutputFormat::Markdown));
        assert_eq!(parse_output_format("html"), Ok(OutputFormat::Html));
        assert!(parse_output_format("pdf").is_err());
    }
}
