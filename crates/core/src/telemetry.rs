//! Parser for the text frames sent by paired heart-rate sensors.
//!
//! A frame looks like
//! `BPM: 72.5 ax=0.01 ay=-0.98 az=0.12 Fallen: NO Time: 123456`.
//! Fields may appear in any order; everything except `BPM` is optional.
//! Numbers are read from their longest valid prefix, so `72.5.1` is 72.5.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

static BPM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"BPM:\s*([\d.]+)").expect("valid regex"));
static AX_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"ax=([-\d.]+)").expect("valid regex"));
static AY_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"ay=([-\d.]+)").expect("valid regex"));
static AZ_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"az=([-\d.]+)").expect("valid regex"));
static FALLEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Fallen:\s*(\w+)").expect("valid regex"));
static TIME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Time:\s*(\d+)").expect("valid regex"));
static LEADING_NUMBER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[-+]?(?:\d+\.?\d*|\.\d+)(?:[eE][-+]?\d+)?").expect("valid regex")
});

/// Accelerometer reading in g.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Acceleration {
    pub ax: f64,
    pub ay: f64,
    pub az: f64,
}

/// One decoded sensor frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryFrame {
    pub bpm: f64,
    pub acceleration: Acceleration,
    pub fallen: bool,
    /// Device clock in milliseconds; receive time when the frame has none.
    pub device_timestamp_ms: i64,
}

/// Decode a sensor frame.
///
/// Fails when the BPM field is missing, unparseable, or zero.
pub fn parse_telemetry_line(line: &str) -> Result<TelemetryFrame, CoreError> {
    let bpm = capture_number(&BPM_RE, line)
        .filter(|bpm| *bpm != 0.0)
        .ok_or_else(|| CoreError::Validation("invalid heart rate data".to_string()))?;

    let acceleration = Acceleration {
        ax: capture_number(&AX_RE, line).unwrap_or(0.0),
        ay: capture_number(&AY_RE, line).unwrap_or(0.0),
        az: capture_number(&AZ_RE, line).unwrap_or(0.0),
    };

    let fallen = FALLEN_RE
        .captures(line)
        .is_some_and(|c| &c[1] == "YES");

    let device_timestamp_ms = TIME_RE
        .captures(line)
        .and_then(|c| c[1].parse::<i64>().ok())
        .unwrap_or_else(|| chrono::Utc::now().timestamp_millis());

    Ok(TelemetryFrame {
        bpm,
        acceleration,
        fallen,
        device_timestamp_ms,
    })
}

/// First capture of `re`, read as the longest numeric prefix. Values with
/// no numeric prefix (`ax=-`) count as missing.
fn capture_number(re: &Regex, line: &str) -> Option<f64> {
    let caps = re.captures(line)?;
    let number = LEADING_NUMBER_RE.find(caps.get(1)?.as_str())?;
    number.as_str().parse().ok().filter(|v: &f64| v.is_finite())
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn parses_full_frame() {
        let frame =
            parse_telemetry_line("BPM: 72.5 ax=0.01 ay=-0.98 az=0.12 Fallen: YES Time: 123456")
                .expect("parse");
        assert_eq!(frame.bpm, 72.5);
        assert_eq!(
            frame.acceleration,
            Acceleration {
                ax: 0.01,
                ay: -0.98,
                az: 0.12
            }
        );
        assert!(frame.fallen);
        assert_eq!(frame.device_timestamp_ms, 123456);
    }

    #[test]
    fn optional_fields_default() {
        let before = chrono::Utc::now().timestamp_millis();
        let frame = parse_telemetry_line("BPM:88").expect("parse");
        assert_eq!(frame.bpm, 88.0);
        assert_eq!(frame.acceleration, Acceleration::default());
        assert!(!frame.fallen);
        assert!(frame.device_timestamp_ms >= before);
    }

    #[test]
    fn fallen_only_on_yes() {
        let frame = parse_telemetry_line("BPM: 70 Fallen: yes").expect("parse");
        assert!(!frame.fallen);
    }

    #[test]
    fn missing_or_zero_bpm_is_rejected() {
        assert_matches!(
            parse_telemetry_line("ax=0.1 ay=0.2"),
            Err(CoreError::Validation(_))
        );
        assert_matches!(parse_telemetry_line("BPM: 0"), Err(CoreError::Validation(_)));
        assert_matches!(parse_telemetry_line("BPM: ..."), Err(CoreError::Validation(_)));
    }

    #[test]
    fn numbers_use_longest_prefix() {
        let frame = parse_telemetry_line("BPM: 7.2.1 ax=-0.5-1 ay=- az=.25").expect("parse");
        assert_eq!(frame.bpm, 7.2);
        assert_eq!(frame.acceleration.ax, -0.5);
        assert_eq!(frame.acceleration.ay, 0.0);
        assert_eq!(frame.acceleration.az, 0.25);
    }
}
