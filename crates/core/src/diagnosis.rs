//! Diagnosis result types shared by every classification path.

use serde::{Deserialize, Serialize};

use crate::severity::{SeverityLabel, UrgencyLevel};
use crate::types::Timestamp;

/// Maximum recommendations carried by any diagnosis.
pub const MAX_RECOMMENDATIONS: usize = 6;
/// Maximum risk factors carried by any diagnosis.
pub const MAX_RISK_FACTORS: usize = 4;

/// A single classification result. Built fresh per call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnosis {
    pub title: String,
    pub severity: SeverityLabel,
    pub narrative: String,
    pub recommendations: Vec<String>,
    pub risk_factors: Vec<String>,
    pub needs_attention: bool,
    pub urgency_level: UrgencyLevel,
}

/// Which classification path produced a diagnosis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosisSource {
    ExternalModel,
    NumericModel,
    RuleBased,
}

/// A diagnosis tagged with its source and creation time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnosisOutcome {
    pub diagnosis: Diagnosis,
    pub source: DiagnosisSource,
    pub diagnosed_at: Timestamp,
}

impl DiagnosisOutcome {
    pub fn new(diagnosis: Diagnosis, source: DiagnosisSource) -> Self {
        Self {
            diagnosis,
            source,
            diagnosed_at: chrono::Utc::now(),
        }
    }
}

/// Copy a static string list into owned strings.
pub(crate) fn owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
