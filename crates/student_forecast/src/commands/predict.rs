//! Predict command - runs one inference request from a JSON payload file.

use std::path::Path;

use anyhow::{Context, Result};
use database::PgPredictionStore;
use sqlx::PgPool;
use student_forecast::api;
use student_forecast::pipeline::InferenceContext;

/// Runs the predict command.
///
/// Reads a student record from `input`, runs the full inference
/// pipeline against the live prediction log, and prints the response
/// payload. On failure the error payload is printed and the command
/// exits non-zero.
///
/// # Errors
///
/// Returns an error if the input file is unreadable or the request
/// fails at any pipeline stage.
pub async fn run(pool: &PgPool, ctx: &InferenceContext, input: &Path) -> Result<()> {
    let body = std::fs::read_to_string(input)
        .with_context(|| format!("Failed to read input file: {}", input.display()))?;

    let store = PgPredictionStore::new(pool.clone());

    match api::handle_predict(ctx, &store, &body).await {
        Ok(response) => {
            println!("{}", serde_json::to_string_pretty(&response)?);
            Ok(())
        }
        Err(api_err) => {
            println!("{}", serde_json::to_string_pretty(&api_err)?);
            anyhow::bail!("prediction failed with status {}", api_err.status_code)
        }
    }
}
