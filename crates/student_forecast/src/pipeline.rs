//! Inference pipeline - encode, select, predict, label, persist.
//!
//! One request moves through `Received -> Encoded -> Selected ->
//! Predicted -> Persisted -> Responded`, with an error exit from any
//! stage. Every step is a single-attempt, deterministic transformation;
//! there are no retries anywhere.

use std::path::Path;

use database::{CreateStudentPrediction, PredictionStore, StoreError};
use feature_extractor::{
    EncodeError, EncoderRegistry, LABEL_ENCODERS_FILE, missing_fields, select,
};
use ml_model::{
    CLASSIFICATION_MODEL_FILE, LinearRegressor, ModelError, Predictor, REGRESSION_MODEL_FILE,
    TreeClassifier, load_classifier, load_regressor,
};
use student_structs::{PredictionResponse, RiskLabel, StudentRecord};
use thiserror::Error;
use tracing::{debug, info};

/// Failure modes of one prediction request.
///
/// `status_code` splits them into the client-fixable (400) and the
/// server-fault (500) halves of the taxonomy.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Request payload failed schema validation.
    #[error("invalid request payload: {0}")]
    InvalidPayload(String),

    /// A categorical value outside the training vocabulary.
    #[error("unknown value '{value}' for '{column}'")]
    UnknownCategory {
        column: String,
        value: String,
        known: Vec<String>,
    },

    /// The encoded record cannot satisfy a model's column order.
    #[error("input is missing features required by the trained models")]
    MissingFeatures {
        missing_reg: Vec<String>,
        missing_clf: Vec<String>,
        expected_reg: Vec<String>,
        expected_clf: Vec<String>,
    },

    /// The registry and the model artifacts disagree with each other;
    /// the caller cannot fix this.
    #[error("encoder registry has no encoder for column '{column}'")]
    EncoderMismatch { column: String },

    /// Model invocation failed after feature construction.
    #[error("model prediction failed: {0}")]
    Model(#[from] ModelError),

    /// The prediction log rejected the append.
    #[error("failed to persist prediction: {0}")]
    Storage(#[from] StoreError),
}

impl PipelineError {
    /// HTTP-style status code for the error payload.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::InvalidPayload(_)
            | Self::UnknownCategory { .. }
            | Self::MissingFeatures { .. } => 400,
            Self::EncoderMismatch { .. } | Self::Model(_) | Self::Storage(_) => 500,
        }
    }
}

impl From<EncodeError> for PipelineError {
    fn from(err: EncodeError) -> Self {
        match err {
            EncodeError::UnknownCategory {
                column,
                value,
                known,
            } => Self::UnknownCategory {
                column,
                value,
                known,
            },
            EncodeError::MissingEncoder { column } => Self::EncoderMismatch { column },
        }
    }
}

/// Everything the pipeline needs, loaded once at startup.
///
/// Constructed in `main` and passed by reference into every request;
/// nothing here is mutated after load, so concurrent requests share it
/// without locking.
pub struct InferenceContext {
    registry: EncoderRegistry,
    regressor: LinearRegressor,
    classifier: TreeClassifier,
}

impl InferenceContext {
    #[must_use]
    pub fn new(
        registry: EncoderRegistry,
        regressor: LinearRegressor,
        classifier: TreeClassifier,
    ) -> Self {
        Self {
            registry,
            regressor,
            classifier,
        }
    }

    /// Loads and validates all training artifacts from `model_dir`.
    ///
    /// # Errors
    ///
    /// Returns an error if any artifact is absent, corrupt, or fails
    /// validation. The process must not serve with partially-loaded
    /// state, so callers treat this as fatal.
    pub fn load(model_dir: &Path) -> anyhow::Result<Self> {
        let registry = EncoderRegistry::load(&model_dir.join(LABEL_ENCODERS_FILE))?;
        let regressor = load_regressor(&model_dir.join(REGRESSION_MODEL_FILE))?;
        let classifier = load_classifier(&model_dir.join(CLASSIFICATION_MODEL_FILE))?;

        info!(
            reg_features = regressor.feature_order().len(),
            clf_features = classifier.feature_order().len(),
            "Models and encoders loaded"
        );

        Ok(Self::new(registry, regressor, classifier))
    }

    /// Column order the regression model expects.
    #[must_use]
    pub fn regression_features(&self) -> &[String] {
        self.regressor.feature_order()
    }

    /// Column order the classification model expects.
    #[must_use]
    pub fn classification_features(&self) -> &[String] {
        self.classifier.feature_order()
    }
}

/// Runs one prediction request through the full pipeline.
///
/// Encodes the categorical columns, builds both model input vectors,
/// invokes the regressor and the classifier, maps the class code to its
/// label, appends the outcome to the prediction log, and returns the
/// response payload. Persistence failure fails the whole request: a
/// record is written if and only if a result is returned.
///
/// # Errors
///
/// Returns a `PipelineError` describing the failed stage; see
/// [`PipelineError::status_code`] for the client/server split.
pub async fn predict_student<S: PredictionStore>(
    ctx: &InferenceContext,
    store: &S,
    record: StudentRecord,
) -> Result<PredictionResponse, PipelineError> {
    debug!(department = %record.department, semester = record.semester, "Received prediction request");

    let encoded = ctx.registry.encode_record(&record)?;
    debug!("Categorical columns encoded");

    let reg_input = select(&encoded, ctx.regressor.feature_order());
    let clf_input = select(&encoded, ctx.classifier.feature_order());
    let (reg_input, clf_input) = match (reg_input, clf_input) {
        (Ok(reg), Ok(clf)) => (reg, clf),
        _ => {
            return Err(PipelineError::MissingFeatures {
                missing_reg: missing_fields(&encoded, ctx.regressor.feature_order()),
                missing_clf: missing_fields(&encoded, ctx.classifier.feature_order()),
                expected_reg: ctx.regressor.feature_order().to_vec(),
                expected_clf: ctx.classifier.feature_order().to_vec(),
            });
        }
    };
    debug!(
        reg_len = reg_input.len(),
        clf_len = clf_input.len(),
        "Feature vectors selected"
    );

    let raw_cgpa = ctx.regressor.predict(&reg_input)?;
    let risk_code = ctx.classifier.predict(&clf_input)?;
    let predicted_cgpa = round2(raw_cgpa);
    let label = RiskLabel::from_code(risk_code);
    info!(predicted_cgpa, risk = %label, "Prediction computed");

    let stored = store
        .append(to_prediction_record(&record, predicted_cgpa, label))
        .await?;
    info!(id = %stored.id, "Prediction persisted");

    Ok(PredictionResponse {
        predicted_cgpa,
        academic_risk_level: label,
    })
}

fn to_prediction_record(
    record: &StudentRecord,
    predicted_cgpa: f64,
    label: RiskLabel,
) -> CreateStudentPrediction {
    CreateStudentPrediction {
        semester: record.semester,
        department: record.department.clone(),
        age: record.age,
        gender: record.gender.clone(),
        attendance_percentage: record.attendance_percentage,
        study_hours_per_week: record.study_hours_per_week,
        backlogs: record.backlogs,
        part_time_work: record.part_time_work.clone(),
        previous_cgpa: record.previous_cgpa,
        predicted_cgpa,
        academic_risk_level: label.as_str().to_string(),
    }
}

/// Rounds to the two decimal places promised by the response contract.
fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::future::Future;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use chrono::Utc;
    use database::StudentPrediction;
    use feature_extractor::{ColumnEncoder, columns};
    use uuid::Uuid;

    use super::*;

    fn reg_order() -> Vec<String> {
        [
            columns::PREVIOUS_CGPA,
            columns::ATTENDANCE_PERCENTAGE,
            columns::STUDY_HOURS_PER_WEEK,
            columns::BACKLOGS,
            columns::PART_TIME_WORK,
        ]
        .iter()
        .map(ToString::to_string)
        .collect()
    }

    fn clf_order() -> Vec<String> {
        let mut order = reg_order();
        order.push(columns::SEMESTER.to_string());
        order.push(columns::DEPARTMENT.to_string());
        order
    }

    fn test_registry() -> EncoderRegistry {
        EncoderRegistry::new(BTreeMap::from([
            (
                columns::DEPARTMENT.to_string(),
                ColumnEncoder::new(vec!["CS".into(), "EE".into(), "ME".into()]),
            ),
            (
                columns::GENDER.to_string(),
                ColumnEncoder::new(vec!["F".into(), "M".into()]),
            ),
            (
                columns::PART_TIME_WORK.to_string(),
                ColumnEncoder::new(vec!["No".into(), "Yes".into()]),
            ),
        ]))
    }

    fn test_regressor() -> LinearRegressor {
        LinearRegressor::new(reg_order(), vec![0.9, 0.01, 0.02, -0.15, -0.05], 0.5).unwrap()
    }

    /// Stump on Previous_CGPA: at or below 6.0 -> class 1 (High risk),
    /// above -> class 0 (Low risk).
    fn test_classifier() -> TreeClassifier {
        TreeClassifier::new(
            clf_order(),
            vec![1, -1, -1],
            vec![2, -1, -1],
            vec![0, -1, -1],
            vec![6.0, 0.0, 0.0],
            vec![0, 1, 0],
        )
        .unwrap()
    }

    /// Classifier whose only leaf emits a code outside the trained set.
    fn degenerate_classifier() -> TreeClassifier {
        TreeClassifier::new(clf_order(), vec![-1], vec![-1], vec![-1], vec![0.0], vec![7])
            .unwrap()
    }

    fn test_context() -> InferenceContext {
        InferenceContext::new(test_registry(), test_regressor(), test_classifier())
    }

    fn scenario_record() -> StudentRecord {
        StudentRecord {
            semester: 3,
            department: "CS".to_string(),
            age: 20,
            gender: "M".to_string(),
            attendance_percentage: 85,
            study_hours_per_week: 10,
            backlogs: 0,
            part_time_work: "No".to_string(),
            previous_cgpa: 8.1,
        }
    }

    #[derive(Default)]
    struct InMemoryStore {
        records: Mutex<Vec<StudentPrediction>>,
    }

    impl InMemoryStore {
        fn records(&self) -> Vec<StudentPrediction> {
            self.records.lock().unwrap().clone()
        }
    }

    impl PredictionStore for InMemoryStore {
        fn append(
            &self,
            input: CreateStudentPrediction,
        ) -> impl Future<Output = Result<StudentPrediction, StoreError>> + Send {
            async move {
                let stored = StudentPrediction {
                    id: Uuid::new_v4(),
                    semester: input.semester,
                    department: input.department,
                    age: input.age,
                    gender: input.gender,
                    attendance_percentage: input.attendance_percentage,
                    study_hours_per_week: input.study_hours_per_week,
                    backlogs: input.backlogs,
                    part_time_work: input.part_time_work,
                    previous_cgpa: input.previous_cgpa,
                    predicted_cgpa: input.predicted_cgpa,
                    academic_risk_level: input.academic_risk_level,
                    created_at: Utc::now(),
                };
                self.records.lock().unwrap().push(stored.clone());
                Ok(stored)
            }
        }
    }

    /// Store whose every append fails, counting the attempts.
    #[derive(Default)]
    struct FailingStore {
        attempts: AtomicUsize,
    }

    impl PredictionStore for FailingStore {
        fn append(
            &self,
            _input: CreateStudentPrediction,
        ) -> impl Future<Output = Result<StudentPrediction, StoreError>> + Send {
            async move {
                self.attempts.fetch_add(1, Ordering::SeqCst);
                Err(StoreError::Unavailable("connection refused".to_string()))
            }
        }
    }

    #[tokio::test]
    async fn test_valid_request_end_to_end() {
        let ctx = test_context();
        let store = InMemoryStore::default();

        let response = predict_student(&ctx, &store, scenario_record())
            .await
            .unwrap();

        // 0.9*8.1 + 0.01*85 + 0.02*10 - 0.15*0 - 0.05*0 + 0.5
        assert_eq!(response.predicted_cgpa, 8.84);
        assert_eq!(response.academic_risk_level, RiskLabel::Low);

        let records = store.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].department, "CS");
        assert_eq!(records[0].predicted_cgpa, 8.84);
        assert_eq!(records[0].academic_risk_level, "Low");
    }

    #[tokio::test]
    async fn test_low_prior_cgpa_is_high_risk() {
        let ctx = test_context();
        let store = InMemoryStore::default();

        let mut record = scenario_record();
        record.previous_cgpa = 4.2;
        record.backlogs = 3;

        let response = predict_student(&ctx, &store, record).await.unwrap();
        assert_eq!(response.academic_risk_level, RiskLabel::High);
    }

    #[tokio::test]
    async fn test_predicted_cgpa_rounds_to_two_decimals() {
        let ctx = test_context();
        let store = InMemoryStore::default();

        let mut record = scenario_record();
        record.previous_cgpa = 8.123;

        let response = predict_student(&ctx, &store, record).await.unwrap();

        // Raw value 8.8607 carries four decimals before rounding.
        assert_eq!(response.predicted_cgpa, 8.86);
        assert_eq!((response.predicted_cgpa * 100.0).round() / 100.0, response.predicted_cgpa);
    }

    #[tokio::test]
    async fn test_unknown_category_is_bad_request_and_persists_nothing() {
        let ctx = test_context();
        let store = InMemoryStore::default();

        let mut record = scenario_record();
        record.department = "Astrology".to_string();

        let err = predict_student(&ctx, &store, record).await.unwrap_err();
        assert_eq!(err.status_code(), 400);

        match err {
            PipelineError::UnknownCategory {
                column,
                value,
                known,
            } => {
                assert_eq!(column, "Department");
                assert_eq!(value, "Astrology");
                assert_eq!(known, vec!["CS", "EE", "ME"]);
                assert!(!known.iter().any(|k| k == "Astrology"));
            }
            other => panic!("unexpected error: {other:?}"),
        }

        assert!(store.records().is_empty());
    }

    #[tokio::test]
    async fn test_missing_feature_reports_both_expected_orders() {
        let mut order = reg_order();
        order.push("GPA_Trend".to_string());
        let mut coefficients = vec![0.9, 0.01, 0.02, -0.15, -0.05];
        coefficients.push(0.3);
        let regressor = LinearRegressor::new(order, coefficients, 0.5).unwrap();

        let ctx = InferenceContext::new(test_registry(), regressor, test_classifier());
        let store = InMemoryStore::default();

        let err = predict_student(&ctx, &store, scenario_record())
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 400);

        match err {
            PipelineError::MissingFeatures {
                missing_reg,
                missing_clf,
                expected_reg,
                expected_clf,
            } => {
                assert_eq!(missing_reg, vec!["GPA_Trend"]);
                assert!(missing_clf.is_empty());
                assert_eq!(expected_reg.len(), 6);
                assert_eq!(expected_clf, clf_order());
            }
            other => panic!("unexpected error: {other:?}"),
        }

        assert!(store.records().is_empty());
    }

    #[tokio::test]
    async fn test_storage_failure_fails_the_whole_request() {
        let ctx = test_context();
        let store = FailingStore::default();

        let err = predict_student(&ctx, &store, scenario_record())
            .await
            .unwrap_err();

        assert_eq!(err.status_code(), 500);
        assert!(matches!(err, PipelineError::Storage(_)));
        assert_eq!(store.attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_out_of_set_class_code_degrades_to_unknown() {
        let ctx = InferenceContext::new(test_registry(), test_regressor(), degenerate_classifier());
        let store = InMemoryStore::default();

        let response = predict_student(&ctx, &store, scenario_record())
            .await
            .unwrap();

        assert_eq!(response.academic_risk_level, RiskLabel::Unknown);
        assert_eq!(store.records()[0].academic_risk_level, "Unknown");
    }

    #[tokio::test]
    async fn test_repeated_requests_are_deterministic() {
        let ctx = test_context();
        let store = InMemoryStore::default();

        let first = predict_student(&ctx, &store, scenario_record())
            .await
            .unwrap();
        let second = predict_student(&ctx, &store, scenario_record())
            .await
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(store.records().len(), 2);
    }

    #[test]
    fn test_round2() {
        assert_eq!(round2(8.8607), 8.86);
        assert_eq!(round2(7.456), 7.46);
        assert_eq!(round2(-0.004), 0.0);
        assert_eq!(round2(9.0), 9.0);
    }
}
