//! resume-recommender: resume parsing, match scoring and job recommendations

use clap::Parser;
use log::{error, info};
use resume_recommender::cli::{self, Cli, Commands, ConfigAction, OutputArgs};
use resume_recommender::config::{Config, OutputFormat};
use resume_recommender::error::{RecommenderError, Result};
use resume_recommender::input::InputManager;
use resume_recommender::matching::{
    analyze_skill_gaps, explain, MatchScorer, Recommender, ResumeProfile,
};
use resume_recommender::output::formatter::save_report_to_file;
use resume_recommender::output::ReportGenerator;
use resume_recommender::processing::embeddings;
use std::path::Path;
use std::process;

/// Profile id used for resumes parsed from the command line
const LOCAL_RESUME_ID: i64 = 1;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    let config = match &cli.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    };
    let config = match config {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            process::exit(1);
        }
    };

    if let Err(e) = run_command(cli.command, cli.config.as_deref(), config).await {
        error!("Command failed: {}", e);
        process::exit(1);
    }
}

async fn run_command(command: Commands, config_path: Option<&Path>, config: Config) -> Result<()> {
    match command {
        Commands::Parse { resume, output } => {
            let profile = load_profile(&resume, &config).await?;
            emit(&config, &output, |f| f.format_profile(&profile))?;
        }

        Commands::Match { resume, job, output } => {
            let profile = load_profile(&resume, &config).await?;
            let mut jobs = cli::load_jobs(&job)?;
            if jobs.len() != 1 {
                return Err(RecommenderError::InvalidInput(format!(
                    "{} must hold exactly one job, found {}",
                    job.display(),
                    jobs.len()
                )));
            }
            let job = jobs.remove(0);

            let scorer = MatchScorer::from_config(&config)?;
            let result = scorer.calculate(&profile, &job)?;
            let explanation = explain(&result);
            emit(&config, &output, |f| f.format_match(&result, &explanation))?;
        }

        Commands::Recommend {
            resume,
            jobs,
            location,
            job_type,
            remote,
            min_salary,
            max_salary,
            limit,
            output,
        } => {
            let profile = load_profile(&resume, &config).await?;
            let catalog = cli::load_jobs(&jobs)?;
            let filters = cli::build_filters(location, job_type, remote, min_salary, max_salary);
            let limit = limit.unwrap_or(config.recommendation.default_limit);
            info!("Ranking {} jobs (limit {})", catalog.len(), limit);

            let recommender = Recommender::from_config(&config)?;
            let batch = recommender.generate(&profile, &catalog, &filters, limit);
            emit(&config, &output, |f| f.format_recommendations(&batch))?;
        }

        Commands::Gaps {
            resume,
            jobs,
            output,
        } => {
            let profile = load_profile(&resume, &config).await?;
            let catalog = cli::load_jobs(&jobs)?;
            let report = analyze_skill_gaps(&profile, &catalog);
            emit(&config, &output, |f| f.format_skill_gaps(&report))?;
        }

        Commands::Config { action } => match action {
            Some(ConfigAction::Show) | None => {
                let content = toml::to_string_pretty(&config).map_err(|e| {
                    RecommenderError::Configuration(format!("Failed to serialize config: {}", e))
                })?;
                println!("⚙️  Current Configuration\n");
                println!("{}", content);
            }

            Some(ConfigAction::Reset) => {
                println!("🔄 Resetting configuration to defaults...");
                let default_config = Config::default();
                match config_path {
                    Some(path) => default_config.save_to(path)?,
                    None => default_config.save()?,
                }
                println!("✅ Configuration reset successfully!");
            }

            Some(ConfigAction::Path) => {
                let path = config_path
                    .map(Path::to_path_buf)
                    .unwrap_or_else(Config::config_path);
                println!("{}", path.display());
            }
        },
    }

    Ok(())
}

async fn load_profile(path: &Path, config: &Config) -> Result<ResumeProfile> {
    let mut input_manager = InputManager::from_config(config);
    let parsed = input_manager.parse_file(path).await?;
    let provider = embeddings::shared(config);
    Ok(ResumeProfile::build(LOCAL_RESUME_ID, parsed, Some(provider.as_ref())))
}

fn emit<F>(config: &Config, args: &OutputArgs, render: F) -> Result<()>
where
    F: FnOnce(&dyn resume_recommender::output::OutputFormatter) -> Result<String>,
{
    let format = match &args.output {
        Some(format) => cli::parse_output_format(format).map_err(RecommenderError::InvalidInput)?,
        None => config.output.format,
    };

    // colors only make sense on a terminal
    let use_colors = config.output.color_output && args.save.is_none() && format == OutputFormat::Console;
    let generator = ReportGenerator::new(use_colors);
    let content = render(generator.formatter(format))?;

    match &args.save {
        Some(path) => {
            save_report_to_file(&content, path)?;
            info!("Report saved to {}", path.display());
        }
        None => println!("{}", content),
    }
    Ok(())
}
