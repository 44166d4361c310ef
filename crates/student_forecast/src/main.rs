//! Student Performance Prediction Service
//!
//! Predicts a student's future CGPA and academic-risk level from
//! demographic and performance features, and appends every successful
//! prediction to the prediction log.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use config::Config;
use database::{create_pool, run_migrations};
use student_forecast::pipeline::InferenceContext;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod commands;

/// Student Performance Prediction Service
#[derive(Parser)]
#[command(name = "student-forecast")]
#[command(about = "CGPA and academic-risk prediction service")]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Predict CGPA and academic risk for one student record
    Predict {
        /// Path to a JSON file containing the student record
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Show the feature columns the loaded models expect
    Features,

    /// Run database migrations
    Migrate,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing subscriber
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = Config::from_env()?;
    let pool = create_pool(&config.database_url).await?;

    match cli.command {
        Commands::Predict { input } => {
            let ctx = InferenceContext::load(&config.model_dir)?;
            commands::predict::run(&pool, &ctx, &input).await?;
        }
        Commands::Features => {
            let ctx = InferenceContext::load(&config.model_dir)?;
            commands::features::run(&ctx)?;
        }
        Commands::Migrate => {
            run_migrations(&pool).await?;
            info!("Migrations completed successfully");
        }
    }

    Ok(())
}
