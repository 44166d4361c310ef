//! Request/response surface of the prediction API.
//!
//! HTTP routing itself lives outside this core; these types and entry
//! points pin the exact JSON shapes any transport exchanges with
//! callers.

use database::PredictionStore;
use serde::Serialize;
use serde_json::{Value, json};
use student_structs::{PredictionResponse, StudentRecord};
use tracing::error;

use crate::pipeline::{self, InferenceContext, PipelineError};

/// Error payload returned to callers on any failed request.
///
/// `detail` is a plain string for most failures and an object for the
/// missing-feature case, where the caller needs the full expected
/// orders to self-diagnose.
#[derive(Debug, Clone, Serialize)]
pub struct ApiError {
    pub status_code: u16,
    pub detail: Value,
}

impl From<PipelineError> for ApiError {
    fn from(err: PipelineError) -> Self {
        let status_code = err.status_code();
        let detail = match &err {
            PipelineError::InvalidPayload(message) => {
                json!(format!("Invalid request payload: {message}"))
            }
            PipelineError::UnknownCategory {
                column,
                value,
                known,
            } => json!(format!(
                "Unknown value for '{column}': '{value}'. Expected one of: {known:?}"
            )),
            PipelineError::MissingFeatures {
                missing_reg,
                missing_clf,
                expected_reg,
                expected_clf,
            } => json!({
                "message": "Input is missing features required by the trained models.",
                "missing_reg_features": missing_reg,
                "missing_clf_features": missing_clf,
                "expected_reg_features": expected_reg,
                "expected_clf_features": expected_clf,
            }),
            PipelineError::Model(model_err) => {
                json!(format!("Model prediction failed: {model_err}"))
            }
            PipelineError::Storage(_) => json!("Database save failed"),
            PipelineError::EncoderMismatch { .. } => json!("Serving artifacts are inconsistent"),
        };

        Self {
            status_code,
            detail,
        }
    }
}

/// Deserializes and schema-validates one request body.
///
/// Validation here is types and requiredness only; business rules are
/// the models' concern.
///
/// # Errors
///
/// Returns `InvalidPayload` when the body is not a structurally valid
/// `StudentRecord`.
pub fn parse_request(body: &str) -> Result<StudentRecord, PipelineError> {
    serde_json::from_str(body).map_err(|err| PipelineError::InvalidPayload(err.to_string()))
}

/// Framework-independent request entry point: JSON body in, response
/// payload or error payload out.
///
/// # Errors
///
/// Returns the `ApiError` payload for any failed request. Server faults
/// are logged here; the payload carries only a short message.
pub async fn handle_predict<S: PredictionStore>(
    ctx: &InferenceContext,
    store: &S,
    body: &str,
) -> Result<PredictionResponse, ApiError> {
    let record = parse_request(body)?;

    pipeline::predict_student(ctx, store, record)
        .await
        .map_err(|err| {
            if err.status_code() >= 500 {
                error!("Prediction request failed: {err}");
            }
            ApiError::from(err)
        })
}

/// Service self-description: liveness message plus the feature columns
/// each loaded model expects.
#[must_use]
pub fn service_info(ctx: &InferenceContext) -> Value {
    json!({
        "message": "API is running",
        "expected_reg_features": ctx.regression_features(),
        "expected_clf_features": ctx.classification_features(),
    })
}
