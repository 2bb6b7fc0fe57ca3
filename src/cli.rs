//! CLI interface for the resume recommender

use crate::config::OutputFormat;
use crate::error::{RecommenderError, Result};
use crate::matching::models::{JobRecord, RecommendationFilters};
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "resume-recommender")]
#[command(about = "Resume parsing, explainable job matching and recommendations")]
#[command(long_about = "Extract skills and structure from a resume, score it against job postings and rank a job catalog with explanations")]
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

#[derive(Args)]
pub struct OutputArgs {
    /// Output format: console, json, markdown (defaults to the configured format)
    #[arg(short, long)]
    pub output: Option<String>,

    /// Save output to file
    #[arg(short, long)]
    pub save: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Parse a resume into sections, skills, education and experience
    Parse {
        /// Path to resume file (PDF, DOCX, TXT, MD)
        #[arg(short, long)]
        resume: PathBuf,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Score a resume against a single job
    Match {
        #[arg(short, long)]
        resume: PathBuf,

        /// JSON file holding one job record
        #[arg(short, long)]
        job: PathBuf,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Rank a job catalog for a resume
    Recommend {
        #[arg(short, long)]
        resume: PathBuf,

        /// JSON file holding an array of job records
        #[arg(short, long)]
        jobs: PathBuf,

        /// Keep jobs whose location contains this text
        #[arg(long)]
        location: Option<String>,

        /// Keep jobs of this type (e.g. full-time)
        #[arg(long)]
        job_type: Option<String>,

        /// Keep jobs with this remote option (e.g. remote, hybrid)
        #[arg(long)]
        remote: Option<String>,

        #[arg(long)]
        min_salary: Option<f64>,

        #[arg(long)]
        max_salary: Option<f64>,

        /// Number of recommendations (defaults to the configured limit)
        #[arg(short, long)]
        limit: Option<usize>,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Aggregate missing skills across a job catalog
    Gaps {
        #[arg(short, long)]
        resume: PathBuf,

        #[arg(short, long)]
        jobs: PathBuf,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Show configuration
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Reset configuration to defaults
    Reset,

    /// Print the configuration file path
    Path,
}

/// Parse and validate output format
pub fn parse_output_format(format: &str) -> std::result::Result<OutputFormat, String> {
    match format.to_lowercase().as_str() {
        "console" => Ok(OutputFormat::Console),
        "json" => Ok(OutputFormat::Json),
        "markdown" | "md" => Ok(OutputFormat::Markdown),
        _ => Err(format!(
            "Invalid output format: {}. Supported: console, json, markdown",
            format
        )),
    }
}

pub fn build_filters(
    location: Option<String>,
    job_type: Option<String>,
    remote_option: Option<String>,
    min_salary: Option<f64>,
    max_salary: Option<f64>,
) -> RecommendationFilters {
    RecommendationFilters {
        location,
        job_type,
        remote_option,
        min_salary,
        max_salary,
    }
}

/// Read job records from JSON: either an array or a single object
pub fn load_jobs(path: &Path) -> Result<Vec<JobRecord>> {
    if !path.exists() {
        return Err(RecommenderError::InvalidInput(format!(
            "File does not exist: {}",
            path.display()
        )));
    }

    let content = std::fs::read_to_string(path)?;
    let value: serde_json::Value = serde_json::from_str(&content)?;
    let jobs = match value {
        serde_json::Value::Array(_) => serde_json::from_value(value)?,
        serde_json::Value::Object(_) => vec![serde_json::from_value(value)?],
        _ => {
            return Err(RecommenderError::InvalidInput(format!(
                "{} must contain a job object or an array of jobs",
                path.display()
            )))
        }
    };
    Ok(jobs)
}
