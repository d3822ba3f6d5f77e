//! Severity tiers, labels, and urgency levels.
//!
//! A [`SeverityTier`] is the ordinal 0..=4 produced by model-based paths.
//! Five tiers collapse onto four [`SeverityLabel`]s via [`TIER_LABELS`].

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Number of ordinal classes a severity model predicts.
pub const SEVERITY_CLASSES: usize = 5;

// ---------------------------------------------------------------------------
// SeverityLabel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeverityLabel {
    #[default]
    Low,
    Medium,
    High,
    Critical,
}

impl SeverityLabel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

// ---------------------------------------------------------------------------
// UrgencyLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UrgencyLevel {
    #[default]
    Routine,
    Urgent,
    Emergency,
}

// ---------------------------------------------------------------------------
// SeverityTier
// ---------------------------------------------------------------------------

/// Label lookup for tiers 0..=4.
pub const TIER_LABELS: [SeverityLabel; SEVERITY_CLASSES] = [
    SeverityLabel::Low,
    SeverityLabel::Medium,
    SeverityLabel::High,
    SeverityLabel::High,
    SeverityLabel::Critical,
];

/// Urgency lookup for tiers 0..=4.
pub const TIER_URGENCY: [UrgencyLevel; SEVERITY_CLASSES] = [
    UrgencyLevel::Routine,
    UrgencyLevel::Routine,
    UrgencyLevel::Urgent,
    UrgencyLevel::Urgent,
    UrgencyLevel::Emergency,
];

const TIER_TITLES: [&str; SEVERITY_CLASSES] = [
    "Healthy heart rate",
    "Heart rate needs monitoring",
    "Moderate cardiovascular risk",
    "High cardiovascular risk",
    "Very high cardiovascular risk - use caution",
];

/// Ordinal severity class predicted by a model (0 = healthy, 4 = most severe).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct SeverityTier(u8);

impl SeverityTier {
    pub const LOWEST: Self = Self(0);
    pub const HIGHEST: Self = Self(SEVERITY_CLASSES as u8 - 1);

    /// Build a tier from a class index, rejecting anything above 4.
    pub fn from_index(index: usize) -> Result<Self, CoreError> {
        if index < SEVERITY_CLASSES {
            Ok(Self(index as u8))
        } else {
            Err(CoreError::Validation(format!(
                "severity index must be between 0 and {}, got {index}",
                SEVERITY_CLASSES - 1
            )))
        }
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }

    pub fn label(self) -> SeverityLabel {
        TIER_LABELS[self.index()]
    }

    pub fn urgency(self) -> UrgencyLevel {
        TIER_URGENCY[self.index()]
    }

    /// Short headline used for model-produced diagnoses.
    pub fn title(self) -> &'static str {
        TIER_TITLES[self.index()]
    }
}

impl TryFrom<u8> for SeverityTier {
    type Error = CoreError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::from_index(value as usize)
    }
}

impl From<SeverityTier> for u8 {
    fn from(tier: SeverityTier) -> Self {
        tier.0
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn tiers_map_to_labels() {
        let labels: Vec<_> = (0..SEVERITY_CLASSES)
            .map(|i| SeverityTier::from_index(i).expect("valid").label())
            .collect();
        assert_eq!(
            labels,
            vec![
                SeverityLabel::Low,
                SeverityLabel::Medium,
                SeverityLabel::High,
                SeverityLabel::High,
                SeverityLabel::Critical,
            ]
        );
    }

    #[test]
    fn tiers_map_to_urgency() {
        assert_eq!(SeverityTier::LOWEST.urgency(), UrgencyLevel::Routine);
        assert_eq!(
            SeverityTier::from_index(2).expect("valid").urgency(),
            UrgencyLevel::Urgent
        );
        assert_eq!(SeverityTier::HIGHEST.urgency(), UrgencyLevel::Emergency);
    }

    #[test]
    fn rejects_out_of_range_index() {
        assert_matches!(SeverityTier::from_index(5), Err(CoreError::Validation(_)));
    }

    #[test]
    fn deserialize_rejects_bad_tier() {
        assert!(serde_json::from_str::<SeverityTier>("3").is_ok());
        assert!(serde_json::from_str::<SeverityTier>("7").is_err());
    }

    #[test]
    fn labels_serialize_snake_case() {
        assert_eq!(
            serde_json::to_string(&SeverityLabel::Critical).expect("serialize"),
            "\"critical\""
        );
        assert_eq!(
            serde_json::to_string(&UrgencyLevel::Emergency).expect("serialize"),
            "\"emergency\""
        );
    }
}
