//! Features command - prints the feature columns the loaded models expect.

use anyhow::Result;
use student_forecast::api;
use student_forecast::pipeline::InferenceContext;

/// Runs the features command.
///
/// # Errors
///
/// Returns an error if the payload cannot be serialized.
pub fn run(ctx: &InferenceContext) -> Result<()> {
    let info = api::service_info(ctx);
    println!("{}", serde_json::to_string_pretty(&info)?);
    Ok(())
}
