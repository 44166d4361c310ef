//! Feature extractor crate for the student performance models.
//!
//! This crate turns a raw `StudentRecord` into the ordered numeric
//! vectors the regression and classification models expect: categorical
//! columns are replaced by the integer codes fixed at training time,
//! then columns are selected in each model's exact training order.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use student_structs::StudentRecord;
use thiserror::Error;

/// File name the offline training job uses for the fitted encoder set.
pub const LABEL_ENCODERS_FILE: &str = "label_encoders.json";

/// Canonical column names shared with the training pipeline.
pub mod columns {
    pub const SEMESTER: &str = "Semester";
    pub const DEPARTMENT: &str = "Department";
    pub const AGE: &str = "Age";
    pub const GENDER: &str = "Gender";
    pub const ATTENDANCE_PERCENTAGE: &str = "Attendance_Percentage";
    pub const STUDY_HOURS_PER_WEEK: &str = "Study_Hours_Per_Week";
    pub const BACKLOGS: &str = "Backlogs";
    pub const PART_TIME_WORK: &str = "Part_Time_Work";
    pub const PREVIOUS_CGPA: &str = "Previous_CGPA";

    /// Columns the training job label-encodes. The registry must carry
    /// an encoder for every one of these.
    pub const CATEGORICAL: [&str; 3] = [DEPARTMENT, GENDER, PART_TIME_WORK];
}

/// Error raised while encoding categorical columns.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodeError {
    /// The raw value was never seen during training for this column.
    /// Passing it through unencoded would hand the model a semantically
    /// meaningless feature value, so this is always a hard failure.
    #[error("unknown value '{value}' for '{column}'; expected one of: {known:?}")]
    UnknownCategory {
        column: String,
        value: String,
        known: Vec<String>,
    },

    /// The registry has no encoder for a categorical column. The request
    /// is fine; the serving artifacts disagree with each other.
    #[error("encoder registry has no encoder for column '{column}'")]
    MissingEncoder { column: String },
}

/// Error raised while assembling a model input vector.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectError {
    /// A column required by the model cannot be derived from the record.
    #[error("missing feature '{field}'")]
    MissingFeature { field: String },
}

/// Value-to-code mapping for one categorical column.
///
/// The code of a value is its index in `classes`, exactly as the encoder
/// was fitted during training; `classes` doubles as the known-value list
/// reported on encoding failures. Codes are unique per column by
/// construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ColumnEncoder {
    classes: Vec<String>,
}

impl ColumnEncoder {
    #[must_use]
    pub fn new(classes: Vec<String>) -> Self {
        Self { classes }
    }

    /// The raw values observed during training, in fitted order.
    #[must_use]
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    fn code_for(&self, value: &str) -> Option<i64> {
        self.classes.iter().position(|c| c == value).map(|i| i as i64)
    }
}

/// One fitted encoder per categorical column, keyed by column name.
///
/// Built once at training time and reused verbatim at inference time so
/// the same raw value always produces the same code. Immutable after
/// load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EncoderRegistry {
    encoders: BTreeMap<String, ColumnEncoder>,
}

impl EncoderRegistry {
    #[must_use]
    pub fn new(encoders: BTreeMap<String, ColumnEncoder>) -> Self {
        Self { encoders }
    }

    /// Loads and validates the fitted encoder set.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is absent or corrupt, if any column's
    /// vocabulary is empty or contains duplicates, or if an encoder is
    /// missing for a categorical column. The process must not serve in
    /// any of those states.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read encoder registry: {}", path.display()))?;

        let registry: Self = serde_json::from_str(&data)
            .with_context(|| format!("Failed to parse encoder registry: {}", path.display()))?;

        registry.validate()?;

        Ok(registry)
    }

    fn validate(&self) -> anyhow::Result<()> {
        for column in columns::CATEGORICAL {
            if !self.encoders.contains_key(column) {
                anyhow::bail!("encoder registry has no encoder for column '{column}'");
            }
        }

        for (column, encoder) in &self.encoders {
            if encoder.classes.is_empty() {
                anyhow::bail!("encoder for column '{column}' has an empty vocabulary");
            }

            let mut seen = std::collections::BTreeSet::new();
            for class in &encoder.classes {
                if !seen.insert(class.as_str()) {
                    anyhow::bail!("encoder for column '{column}' has duplicate value '{class}'");
                }
            }
        }

        Ok(())
    }

    /// Encodes one categorical value to its training-time integer code.
    ///
    /// # Errors
    ///
    /// Returns `UnknownCategory` for a value outside the column's
    /// training vocabulary, `MissingEncoder` if the registry carries no
    /// encoder for the column.
    pub fn encode(&self, column: &str, value: &str) -> Result<i64, EncodeError> {
        let encoder = self
            .encoders
            .get(column)
            .ok_or_else(|| EncodeError::MissingEncoder {
                column: column.to_string(),
            })?;

        encoder
            .code_for(value)
            .ok_or_else(|| EncodeError::UnknownCategory {
                column: column.to_string(),
                value: value.to_string(),
                known: encoder.classes.clone(),
            })
    }

    /// The recorded vocabulary for a column, if an encoder exists.
    #[must_use]
    pub fn known_values(&self, column: &str) -> Option<&[String]> {
        self.encoders.get(column).map(ColumnEncoder::classes)
    }

    /// Applies the registry to every categorical field of a record and
    /// passes the numeric fields through unchanged.
    ///
    /// # Errors
    ///
    /// Returns the first `EncodeError` hit; nothing is substituted and
    /// nothing fails silently.
    pub fn encode_record(&self, record: &StudentRecord) -> Result<EncodedRecord, EncodeError> {
        let mut values = BTreeMap::new();

        values.insert(columns::SEMESTER.to_string(), f64::from(record.semester));
        values.insert(columns::AGE.to_string(), f64::from(record.age));
        values.insert(
            columns::ATTENDANCE_PERCENTAGE.to_string(),
            f64::from(record.attendance_percentage),
        );
        values.insert(
            columns::STUDY_HOURS_PER_WEEK.to_string(),
            f64::from(record.study_hours_per_week),
        );
        values.insert(columns::BACKLOGS.to_string(), f64::from(record.backlogs));
        values.insert(columns::PREVIOUS_CGPA.to_string(), record.previous_cgpa);

        let department = self.encode(columns::DEPARTMENT, &record.department)?;
        values.insert(columns::DEPARTMENT.to_string(), department as f64);

        let gender = self.encode(columns::GENDER, &record.gender)?;
        values.insert(columns::GENDER.to_string(), gender as f64);

        let part_time_work = self.encode(columns::PART_TIME_WORK, &record.part_time_work)?;
        values.insert(columns::PART_TIME_WORK.to_string(), part_time_work as f64);

        Ok(EncodedRecord { values })
    }
}

/// A `StudentRecord` with categorical columns replaced by their codes,
/// keyed by canonical column name.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedRecord {
    values: BTreeMap<String, f64>,
}

impl EncodedRecord {
    #[must_use]
    pub fn get(&self, column: &str) -> Option<f64> {
        self.values.get(column).copied()
    }
}

/// Ordered numeric input for one specific model.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector {
    values: Vec<f64>,
}

impl FeatureVector {
    #[must_use]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Assembles the ordered input vector a model expects.
///
/// `field_order` must be the exact column order the model was trained
/// on; it is stored alongside the model artifact rather than re-derived
/// here, because a silent reordering corrupts predictions without
/// raising an error.
///
/// # Errors
///
/// Returns `MissingFeature` for the first `field_order` entry that
/// cannot be derived from the encoded record.
pub fn select(record: &EncodedRecord, field_order: &[String]) -> Result<FeatureVector, SelectError> {
    let mut values = Vec::with_capacity(field_order.len());

    for field in field_order {
        let value = record.get(field).ok_or_else(|| SelectError::MissingFeature {
            field: field.clone(),
        })?;
        values.push(value);
    }

    Ok(FeatureVector { values })
}

/// Lists every `field_order` entry the encoded record cannot satisfy.
#[must_use]
pub fn missing_fields(record: &EncodedRecord, field_order: &[String]) -> Vec<String> {
    field_order
        .iter()
        .filter(|field| record.get(field).is_none())
        .cloned()
        .collect()
}
