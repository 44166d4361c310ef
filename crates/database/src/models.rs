//! Database model types.

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// A persisted prediction: the request inputs plus both model outputs.
///
/// Rows are append-only; nothing in the serving core updates or deletes
/// them.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct StudentPrediction {
    pub id: Uuid,
    pub semester: i32,
    pub department: String,
    pub age: i32,
    pub gender: String,
    pub attendance_percentage: i32,
    pub study_hours_per_week: i32,
    pub backlogs: i32,
    pub part_time_work: String,
    pub previous_cgpa: f64,
    pub predicted_cgpa: f64,
    pub academic_risk_level: String,
    pub created_at: DateTime<Utc>,
}

/// Input for creating a new prediction record.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateStudentPrediction {
    pub semester: i32,
    pub department: String,
    pub age: i32,
    pub gender: String,
    pub attendance_percentage: i32,
    pub study_hours_per_week: i32,
    pub backlogs: i32,
    pub part_time_work: String,
    pub previous_cgpa: f64,
    pub predicted_cgpa: f64,
    pub academic_risk_level: String,
}
