//! Student Performance Prediction Service
//!
//! Predicts a student's future CGPA and academic-risk level from
//! demographic and performance features, and appends every successful
//! prediction to the prediction log.

pub mod api;
pub mod pipeline;
