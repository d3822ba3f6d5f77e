//! External severity predictors.
//!
//! The [`external::ExternalPredictor`] trait is the seam the diagnosis
//! service calls first. [`process::ProcessPredictor`] implements it by
//! running a model script as a child process with JSON over stdio.
//! [`history::HistoryPredictor`] runs the separate history-trained label
//! model, which takes its inputs as command-line flags.

pub mod external;
pub mod history;
pub mod process;
pub mod subprocess;

pub use external::{ExternalPredictor, ExternalRequest, ExternalResponse, PredictorError};
pub use history::{HistoryPrediction, HistoryPredictor, HistoryRequest};
pub use process::ProcessPredictor;
