//! `pulse-diagnose` -- classify heart-rate readings from the command line.
//!
//! Each argument is either a bare bpm value (`pulse-diagnose 72`) or a
//! sensor frame (`pulse-diagnose "BPM: 72 ax=0.1 ay=0.0 az=0.9 Fallen: NO"`).
//! With no arguments, frames are read line by line from stdin. Every
//! result is printed to stdout as one JSON object per line; logs go to
//! stderr. Ctrl-C cancels the reading in flight.
//!
//! # Environment variables
//!
//! | Variable                 | Required | Default   | Description                          |
//! |--------------------------|----------|-----------|--------------------------------------|
//! | `PREDICTOR_PROGRAM`      | no       | `python3` | Interpreter for the predictor script |
//! | `PREDICTOR_SCRIPT`       | no       | --        | Enables the external path            |
//! | `PREDICTOR_WORKDIR`      | no       | --        | Working directory for the script     |
//! | `PREDICTOR_TIMEOUT_SECS` | no       | `5`       | Bound on one external call           |
//! | `MODEL_PATH`             | no       | --        | Softmax model JSON, enables numeric  |
//! | `NORMALIZATION_PATH`     | with `MODEL_PATH` | -- | Normalization JSON                |

use serde::Serialize;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pulse_core::diagnosis::DiagnosisOutcome;
use pulse_core::telemetry::{parse_telemetry_line, TelemetryFrame};
use pulse_diagnosis::{DiagnosisConfig, DiagnosisError, DiagnosisRequest, DiagnosisService};

/// Log filter used when `RUST_LOG` is unset. Covers this binary and the
/// service library.
const DEFAULT_LOG_FILTER: &str = "pulse_diagnose=info,pulse_diagnosis=info";

#[derive(Serialize)]
struct Report {
    input: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    frame: Option<TelemetryFrame>,
    outcome: DiagnosisOutcome,
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = DiagnosisConfig::from_env().unwrap_or_else(|e| {
        tracing::error!(error = %e, "Invalid configuration");
        std::process::exit(1);
    });

    let service = DiagnosisService::from_config(&config).unwrap_or_else(|e| {
        tracing::error!(error = %e, "Failed to start diagnosis service");
        std::process::exit(1);
    });

    tracing::info!(
        external = service.has_external(),
        numeric = service.has_numeric(),
        "Starting pulse-diagnose",
    );

    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        });
    }

    let args: Vec<String> = std::env::args().skip(1).collect();
    let mut failed = false;

    if args.is_empty() {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            let line = tokio::select! {
                _ = cancel.cancelled() => break,
                line = lines.next_line() => line,
            };
            match line {
                Ok(Some(line)) if line.trim().is_empty() => continue,
                Ok(Some(line)) => failed |= !run_one(&service, &line, &cancel).await,
                Ok(None) => break,
                Err(e) => {
                    tracing::error!(error = %e, "Failed to read stdin");
                    std::process::exit(1);
                }
            }
        }
    } else {
        for arg in &args {
            failed |= !run_one(&service, arg, &cancel).await;
        }
    }

    if failed {
        std::process::exit(1);
    }
}

/// Diagnose one input and print the result. Returns `false` on failure.
async fn run_one(service: &DiagnosisService, input: &str, cancel: &CancellationToken) -> bool {
    let (heart_rate, frame) = match input.trim().parse::<f64>() {
        Ok(bpm) => (bpm, None),
        Err(_) => match parse_telemetry_line(input) {
            Ok(frame) => (frame.bpm, Some(frame)),
            Err(e) => {
                tracing::error!(input, error = %e, "Unrecognized reading");
                return false;
            }
        },
    };

    let outcome = match service
        .diagnose_cancellable(&DiagnosisRequest::new(heart_rate), cancel)
        .await
    {
        Ok(outcome) => outcome,
        Err(DiagnosisError::Cancelled) => return false,
        Err(e) => {
            tracing::error!(input, error = %e, "Diagnosis failed");
            return false;
        }
    };

    let report = Report {
        input: input.to_string(),
        frame,
        outcome,
    };
    match serde_json::to_string(&report) {
        Ok(json) => {
            println!("{json}");
            true
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to serialize result");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_filter_enables_this_binary() {
        let targets: Vec<&str> = DEFAULT_LOG_FILTER
            .split(',')
            .filter_map(|directive| directive.split('=').next())
            .collect();
        assert!(targets.contains(&env!("CARGO_CRATE_NAME")));
        assert!(targets.contains(&"pulse_diagnosis"));
    }

    #[test]
    fn default_filter_parses() {
        assert!(tracing_subscriber::EnvFilter::try_new(DEFAULT_LOG_FILTER).is_ok());
    }
}
