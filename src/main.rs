//! ATS resume checker: score a resume against applicant tracking system profiles

use anyhow::{Context, Result};
use ats_checker::cli::{self, Cli, Commands, ConfigAction, ModelAction, ProfileAction};
use ats_checker::config::{Config, OutputFormat};
use ats_checker::input::manager::load_job_description;
use ats_checker::input::RawDocument;
use ats_checker::output::formatter::{save_report_to_file, suggest_filename, ReportGenerator};
use ats_checker::processing::analyzer::AnalysisPipeline;
use ats_checker::processing::capabilities::Capabilities;
use ats_checker::processing::embedding_manager::EmbeddingModelManager;
use ats_checker::profiles::ProfileTable;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use log::{error, info};
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;
use std::time::Duration;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    if let Err(e) = run(cli).await {
        error!("{:#}", e);
        process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config.clone();
    let config = Config::load_from(config_path.as_deref()).context("Failed to load configuration")?;

    match cli.command {
        Commands::Analyze {
            resume,
            job,
            job_text,
            profile,
            output,
            save,
            detailed,
        } => {
            let format = match output {
                Some(format) => cli::parse_output_format(&format).map_err(anyhow::Error::msg)?,
                None => config.output.format,
            };
            let request = AnalyzeRequest {
                resume,
                job,
                job_text,
                profile: profile.unwrap_or_else(|| config.profiles.default_profile.clone()),
                format,
                save,
                detailed: detailed || config.output.detailed,
            };
            analyze(request, &config).await
        }
        Commands::Profiles { action } => run_profiles(action, &config),
        Commands::Models { action } => run_models(action, &config).await,
        Commands::Config { action } => run_config(action, &config, config_path.as_deref()),
    }
}

struct AnalyzeRequest {
    resume: PathBuf,
    job: Option<PathBuf>,
    job_text: Option<String>,
    profile: String,
    format: OutputFormat,
    save: Option<PathBuf>,
    detailed: bool,
}

async fn analyze(request: AnalyzeRequest, config: &Config) -> Result<()> {
    info!("Starting ATS analysis of {}", request.resume.display());

    let profiles = Arc::new(
        ProfileTable::load(config.profiles.path.as_deref()).context("Failed to load ATS profiles")?,
    );
    // Fail on a bad profile key before probing tools or reading files
    profiles.get(&request.profile)?;

    let job_description = match (&request.job, request.job_text) {
        (Some(path), _) => Some(
            load_job_description(path)
                .await
                .with_context(|| format!("Failed to read job description {}", path.display()))?,
        ),
        (None, text) => text,
    };

    let capabilities = Capabilities::probe(config);
    let pipeline = Arc::new(AnalysisPipeline::new(config, profiles, capabilities)?);

    let raw = RawDocument::from_path(&request.resume, config.extraction.max_file_size_mb)
        .await
        .with_context(|| format!("Failed to read resume {}", request.resume.display()))?;

    let spinner = (request.format == OutputFormat::Console).then(|| {
        let spinner = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("{spinner:.green} {msg}") {
            spinner.set_style(style);
        }
        spinner.set_message(format!("Analyzing {} for {}", raw.source_name(), request.profile));
        spinner.enable_steady_tick(Duration::from_millis(100));
        spinner
    });

    let result = pipeline
        .analyze_in_background(raw, job_description, request.profile.clone())
        .await;
    if let Some(spinner) = spinner {
        spinner.finish_and_clear();
    }
    let report = result.context("Analysis failed")?;

    let generator = ReportGenerator::with_options(config.output.color_output, request.detailed, true, true, true);
    let content = generator.generate_report(&report, &request.format)?;
    println!("{}", content);

    if let Some(save) = &request.save {
        let path = if save.is_dir() {
            save.join(suggest_filename(&request.format, &report.metadata.source_name, true))
        } else {
            save.clone()
        };
        // Files never get terminal color codes
        let plain = ReportGenerator::with_options(false, request.detailed, true, true, true)
            .generate_report(&report, &request.format)?;
        save_report_to_file(&plain, &path)
            .with_context(|| format!("Failed to save report to {}", path.display()))?;
        println!("Report saved to {}", path.display());
    }

    Ok(())
}

fn run_profiles(action: ProfileAction, config: &Config) -> Result<()> {
    let profiles = ProfileTable::load(config.profiles.path.as_deref()).context("Failed to load ATS profiles")?;

    match action {
        ProfileAction::List => {
            println!("ATS profiles:\n");
            for profile in profiles.iter() {
                let marker = if profile.key == config.profiles.default_profile { " (default)" } else { "" };
                println!("  • {} - {}{}", profile.key, profile.name, marker);
                if !profile.description.is_empty() {
                    println!("    {}", profile.description);
                }
            }
        }
        ProfileAction::Show { key } => {
            let profile = profiles.get(&key)?;
            println!("{} ({})", profile.name, profile.key);
            println!("{}\n", profile.description);
            println!("Preferred format:   {}", profile.preferred_format);
            println!("Keyword weight:     {:.2}", profile.keyword_importance_weight);
            let headings: Vec<&str> = profile.required_sections.iter().map(|s| s.heading.as_str()).collect();
            println!("Required sections:  {}", headings.join(", "));
            println!("File types:         {}", profile.allowed_file_types.join(", "));
            println!("Recommended fonts:  {}", profile.recommended_fonts.join(", "));
            println!("Formatting:");
            for (rule, allowed) in &profile.formatting_preferences {
                println!("  {:<16} {}", rule, if *allowed { "allowed" } else { "avoid" });
            }
            if let Some(notes) = &profile.special_notes {
                println!("\nNote: {}", notes);
            }
        }
    }
    Ok(())
}

async fn run_models(action: ModelAction, config: &Config) -> Result<()> {
    let mut manager = EmbeddingModelManager::new(config.models_dir().clone()).await?;

    match action {
        ModelAction::List => {
            println!("Embedding models:\n");
            for model in manager.list_available_models() {
                let status = if manager.is_model_downloaded(&model.id) { "downloaded" } else { "available" };
                let marker = if model.id == config.models.default_embedding_model { " (default)" } else { "" };
                println!(
                    "  • {} ({}) - {} MB, {} dims [{}]{}",
                    model.id, model.repo_id, model.size_mb, model.dimensions, status, marker
                );
                println!("    {}", model.description);
            }
        }
        ModelAction::Download { model } => {
            let path = manager
                .download_model(&model)
                .await
                .with_context(|| format!("Failed to download model '{}'", model))?;
            println!("Model '{}' is ready at {}", model, path.display());
        }
        ModelAction::Remove { model } => {
            manager
                .remove_model(&model)
                .await
                .with_context(|| format!("Failed to remove model '{}'", model))?;
            println!("Model '{}' removed", model);
        }
    }
    Ok(())
}

fn run_config(action: Option<ConfigAction>, config: &Config, config_path: Option<&Path>) -> Result<()> {
    let path = config_path.map(Path::to_path_buf).unwrap_or_else(Config::config_path);

    match action {
        Some(ConfigAction::Show) | None => {
            let content = toml::to_string_pretty(config).context("Failed to serialize configuration")?;
            println!("# {}\n{}", path.display(), content);
        }
        Some(ConfigAction::Reset) => {
            Config::default().save_to(&path)?;
            println!("Configuration reset: {}", path.display());
        }
        Some(ConfigAction::Path) => println!("{}", path.display()),
    }
    Ok(())
}
