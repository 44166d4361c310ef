//! Repository functions for database operations.

use std::future::Future;

use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{CreateStudentPrediction, StudentPrediction};

/// Error raised by the prediction log.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// Append-only log of prediction records.
///
/// The serving core only ever inserts; read access for audit and
/// reporting lives outside it. Each append is one transaction scoped to
/// one request.
pub trait PredictionStore {
    /// Appends one record and returns it with its assigned identity.
    fn append(
        &self,
        input: CreateStudentPrediction,
    ) -> impl Future<Output = Result<StudentPrediction, StoreError>> + Send;
}

/// Repository for prediction record operations.
pub struct PredictionRepository;

impl PredictionRepository {
    /// Creates a new prediction record.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub async fn create(
        pool: &PgPool,
        input: CreateStudentPrediction,
    ) -> Result<StudentPrediction, sqlx::Error> {
        let id = Uuid::new_v4();

        sqlx::query_as::<_, StudentPrediction>(
            r#"
            INSERT INTO student_predictions (
                id, semester, department, age, gender, attendance_percentage,
                study_hours_per_week, backlogs, part_time_work, previous_cgpa,
                predicted_cgpa, academic_risk_level
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(input.semester)
        .bind(&input.department)
        .bind(input.age)
        .bind(&input.gender)
        .bind(input.attendance_percentage)
        .bind(input.study_hours_per_week)
        .bind(input.backlogs)
        .bind(&input.part_time_work)
        .bind(input.previous_cgpa)
        .bind(input.predicted_cgpa)
        .bind(&input.academic_risk_level)
        .fetch_one(pool)
        .await
    }

    /// Counts persisted prediction records.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub async fn count(pool: &PgPool) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM student_predictions")
            .fetch_one(pool)
            .await?;

        Ok(count)
    }
}

/// `PostgreSQL`-backed prediction store.
#[derive(Clone)]
pub struct PgPredictionStore {
    pool: PgPool,
}

impl PgPredictionStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl PredictionStore for PgPredictionStore {
    fn append(
        &self,
        input: CreateStudentPrediction,
    ) -> impl Future<Output = Result<StudentPrediction, StoreError>> + Send {
        async move {
            let stored = PredictionRepository::create(&self.pool, input).await?;
            Ok(stored)
        }
    }
}
