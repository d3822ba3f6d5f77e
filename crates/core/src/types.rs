use serde::{Deserialize, Serialize};

/// Subject (user) and device identifiers are opaque store keys.
pub type SubjectId = String;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Status flag stored alongside each reading.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordStatus {
    #[default]
    Normal,
    Warning,
    Critical,
}

/// A single persisted heart-rate reading.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HeartRateSample {
    /// Beats per minute.
    pub value: f64,
    pub recorded_at: Timestamp,
    #[serde(default)]
    pub status: RecordStatus,
}

impl HeartRateSample {
    /// A reading with the default `normal` status.
    pub fn new(value: f64, recorded_at: Timestamp) -> Self {
        Self {
            value,
            recorded_at,
            status: RecordStatus::Normal,
        }
    }

    pub fn with_status(mut self, status: RecordStatus) -> Self {
        self.status = status;
        self
    }
}

/// Extract the bpm values from a sample slice, keeping the caller's order.
pub fn sample_values(samples: &[HeartRateSample]) -> Vec<f64> {
    samples.iter().map(|s| s.value).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_defaults_to_normal_when_absent() {
        let sample: HeartRateSample =
            serde_json::from_str(r#"{"value": 72.0, "recorded_at": "2026-03-01T08:00:00Z"}"#)
                .expect("parse");
        assert_eq!(sample.status, RecordStatus::Normal);
    }

    #[test]
    fn status_uses_lowercase_names() {
        let json = serde_json::to_string(&RecordStatus::Warning).expect("serialize");
        assert_eq!(json, r#""warning""#);
    }
}
