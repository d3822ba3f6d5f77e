//! Pure domain logic for heart-rate telemetry analysis and diagnosis.
//!
//! Nothing in this crate performs I/O except the explicit model-file
//! loader in [`model`]. Async collaborators (sample storage, external
//! predictors) live in `pulse-diagnosis`.

pub mod dashboard;
pub mod diagnosis;
pub mod error;
pub mod ideal_metrics;
pub mod model;
pub mod numeric;
pub mod personalization;
pub mod report;
pub mod rules;
pub mod severity;
pub mod stats;
pub mod telemetry;
pub mod trend;
pub mod types;
