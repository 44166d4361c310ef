use serde::{Deserialize, Serialize};

use crate::RiskLabel;

/// One inference request's payload.
///
/// Wire field names match the column names the models were trained on,
/// so the serde renames are part of the API contract. All fields are
/// required; there are no defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentRecord {
    #[serde(rename = "Semester")]
    pub semester: i32,
    #[serde(rename = "Department")]
    pub department: String,
    #[serde(rename = "Age")]
    pub age: i32,
    #[serde(rename = "Gender")]
    pub gender: String,
    #[serde(rename = "Attendance_Percentage")]
    pub attendance_percentage: i32,
    #[serde(rename = "Study_Hours_Per_Week")]
    pub study_hours_per_week: i32,
    #[serde(rename = "Backlogs")]
    pub backlogs: i32,
    #[serde(rename = "Part_Time_Work")]
    pub part_time_work: String,
    #[serde(rename = "Previous_CGPA")]
    pub previous_cgpa: f64,
}

/// Response payload for a successful prediction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResponse {
    /// Forecasted CGPA, rounded to 2 decimal places.
    #[serde(rename = "predicted_CGPA")]
    pub predicted_cgpa: f64,
    pub academic_risk_level: RiskLabel,
}
