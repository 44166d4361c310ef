//! Model artifacts for CGPA regression and academic-risk classification.
//!
//! Both models are trained by an offline batch job and exported as
//! typed JSON artifacts. Each artifact carries the exact column order
//! it was trained on, so callers never re-derive feature order at the
//! call site. Deserialization plus structural validation at load time
//! is the capability check: an artifact that does not decode into a
//! `Predictor` implementation can never serve a request.

use std::path::Path;

use anyhow::Context;
use feature_extractor::FeatureVector;
use serde::{Deserialize, Serialize};
use serde::de::DeserializeOwned;
use thiserror::Error;

/// File name of the regression model artifact.
pub const REGRESSION_MODEL_FILE: &str = "regression_model.json";

/// File name of the classification model artifact.
pub const CLASSIFICATION_MODEL_FILE: &str = "classification_model.json";

/// Error raised by model invocation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    /// The input vector length disagrees with the trained column count.
    /// Feature construction validates shape, so hitting this at request
    /// time is a server fault.
    #[error("expected {expected} features, got {got}")]
    ShapeMismatch { expected: usize, got: usize },

    /// The decision tree structure is internally inconsistent.
    #[error("malformed decision tree: {0}")]
    MalformedTree(String),
}

/// Capability required of every loaded model artifact.
pub trait Predictor {
    /// The model's output domain.
    type Output;

    /// Runs inference on one ordered feature vector.
    ///
    /// # Errors
    ///
    /// Returns an error if the vector does not match the model's shape.
    fn predict(&self, input: &FeatureVector) -> Result<Self::Output, ModelError>;

    /// The exact column order the model was trained on.
    fn feature_order(&self) -> &[String];
}

/// Linear regression artifact: `y = coefficients · x + intercept`.
///
/// The output is domain-unconstrained; no clamping to a valid GPA range
/// is performed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearRegressor {
    feature_order: Vec<String>,
    coefficients: Vec<f64>,
    intercept: f64,
}

impl LinearRegressor {
    /// # Errors
    ///
    /// Returns an error if the coefficient count disagrees with the
    /// column order.
    pub fn new(
        feature_order: Vec<String>,
        coefficients: Vec<f64>,
        intercept: f64,
    ) -> anyhow::Result<Self> {
        let model = Self {
            feature_order,
            coefficients,
            intercept,
        };
        model.validate()?;
        Ok(model)
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.feature_order.is_empty() {
            anyhow::bail!("regression model has an empty feature order");
        }
        if self.coefficients.len() != self.feature_order.len() {
            anyhow::bail!(
                "regression model has {} coefficients for {} features",
                self.coefficients.len(),
                self.feature_order.len()
            );
        }
        if !self.intercept.is_finite() || self.coefficients.iter().any(|c| !c.is_finite()) {
            anyhow::bail!("regression model contains non-finite parameters");
        }
        Ok(())
    }
}

impl Predictor for LinearRegressor {
    type Output = f64;

    fn predict(&self, input: &FeatureVector) -> Result<f64, ModelError> {
        let x = input.values();
        if x.len() != self.coefficients.len() {
            return Err(ModelError::ShapeMismatch {
                expected: self.coefficients.len(),
                got: x.len(),
            });
        }

        let dot: f64 = self.coefficients.iter().zip(x).map(|(c, v)| c * v).sum();
        Ok(dot + self.intercept)
    }

    fn feature_order(&self) -> &[String] {
        &self.feature_order
    }
}

/// Decision tree classifier artifact in flattened-array form.
///
/// Node `i` is a leaf when `children_left[i] < 0`; `class_labels[i]`
/// then holds the predicted class code. Interior nodes route on
/// `x[split_feature[i]] <= threshold[i]`. Child indices are strictly
/// greater than their parent's, which load-time validation enforces and
/// traversal relies on for termination.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeClassifier {
    feature_order: Vec<String>,
    children_left: Vec<i32>,
    children_right: Vec<i32>,
    split_feature: Vec<i32>,
    threshold: Vec<f64>,
    class_labels: Vec<i64>,
}

impl TreeClassifier {
    /// # Errors
    ///
    /// Returns an error if the arrays are inconsistent.
    pub fn new(
        feature_order: Vec<String>,
        children_left: Vec<i32>,
        children_right: Vec<i32>,
        split_feature: Vec<i32>,
        threshold: Vec<f64>,
        class_labels: Vec<i64>,
    ) -> anyhow::Result<Self> {
        let model = Self {
            feature_order,
            children_left,
            children_right,
            split_feature,
            threshold,
            class_labels,
        };
        model.validate()?;
        Ok(model)
    }

    fn validate(&self) -> anyhow::Result<()> {
        let n = self.children_left.len();

        if n == 0 {
            anyhow::bail!("classification model has no tree nodes");
        }
        if self.feature_order.is_empty() {
            anyhow::bail!("classification model has an empty feature order");
        }
        if self.children_right.len() != n
            || self.split_feature.len() != n
            || self.threshold.len() != n
            || self.class_labels.len() != n
        {
            anyhow::bail!("classification model has tree arrays of unequal length");
        }

        for i in 0..n {
            let left = self.children_left[i];
            let right = self.children_right[i];

            if left < 0 {
                if right >= 0 {
                    anyhow::bail!("tree node {i} is half-leaf");
                }
                continue;
            }

            for child in [left, right] {
                if child as usize >= n {
                    anyhow::bail!("tree node {i} has out-of-bounds child {child}");
                }
                if child as usize <= i {
                    anyhow::bail!("tree node {i} has non-increasing child {child}");
                }
            }

            let feature = self.split_feature[i];
            if feature < 0 || feature as usize >= self.feature_order.len() {
                anyhow::bail!("tree node {i} splits on out-of-bounds feature {feature}");
            }
            if !self.threshold[i].is_finite() {
                anyhow::bail!("tree node {i} has a non-finite threshold");
            }
        }

        Ok(())
    }
}

impl Predictor for TreeClassifier {
    type Output = i64;

    fn predict(&self, input: &FeatureVector) -> Result<i64, ModelError> {
        let x = input.values();
        if x.len() != self.feature_order.len() {
            return Err(ModelError::ShapeMismatch {
                expected: self.feature_order.len(),
                got: x.len(),
            });
        }

        let mut node = 0usize;
        loop {
            if self.children_left[node] < 0 {
                return Ok(self.class_labels[node]);
            }

            let feature = self.split_feature[node] as usize;
            node = if x[feature] <= self.threshold[node] {
                self.children_left[node] as usize
            } else {
                self.children_right[node] as usize
            };
        }
    }

    fn feature_order(&self) -> &[String] {
        &self.feature_order
    }
}

/// Loads and validates the regression model artifact.
///
/// # Errors
///
/// Returns an error if the file is absent, corrupt, or structurally
/// invalid; the process must not serve in that state.
pub fn load_regressor(path: &Path) -> anyhow::Result<LinearRegressor> {
    let model: LinearRegressor = load_artifact(path)?;
    model
        .validate()
        .with_context(|| format!("Invalid regression model: {}", path.display()))?;
    Ok(model)
}

/// Loads and validates the classification model artifact.
///
/// # Errors
///
/// Returns an error if the file is absent, corrupt, or structurally
/// invalid; the process must not serve in that state.
pub fn load_classifier(path: &Path) -> anyhow::Result<TreeClassifier> {
    let model: TreeClassifier = load_artifact(path)?;
    model
        .validate()
        .with_context(|| format!("Invalid classification model: {}", path.display()))?;
    Ok(model)
}

fn load_artifact<T: DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let data = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read model artifact: {}", path.display()))?;

    serde_json::from_str(&data)
        .with_context(|| format!("Failed to parse model artifact: {}", path.display()))
}
