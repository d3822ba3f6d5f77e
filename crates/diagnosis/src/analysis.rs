//! Heart-rate analysis over stored samples.
//!
//! [`HeartRateAnalyzer`] resolves the query window, pulls samples through an
//! injected [`SampleSource`] and hands them to the pure report builder.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Duration;

use pulse_core::dashboard::{build_dashboard, HealthDashboard, DASHBOARD_WINDOW_DAYS};
use pulse_core::ideal_metrics::SubjectProfile;
use pulse_core::report::{build_report, AnalysisQuery, AnalysisReport, TimeWindow};
use pulse_core::trend::{summarize_trend, TrendSummary, MAX_TREND_POINTS};
use pulse_core::types::{sample_values, HeartRateSample, SubjectId};

use crate::error::{DiagnosisError, DiagnosisResult};

/// What to fetch from the sample store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleQuery {
    pub subject_id: SubjectId,
    pub window: TimeWindow,
    /// Maximum rows to return.
    pub limit: usize,
}

/// Read access to persisted heart-rate samples.
///
/// Implementations return samples newest first.
#[async_trait]
pub trait SampleSource: Send + Sync {
    async fn fetch_samples(
        &self,
        query: &SampleQuery,
    ) -> Result<Vec<HeartRateSample>, Box<dyn std::error::Error + Send + Sync>>;
}

/// Builds analysis reports from an injected sample store.
#[derive(Clone)]
pub struct HeartRateAnalyzer {
    source: Arc<dyn SampleSource>,
}

impl HeartRateAnalyzer {
    pub fn new(source: Arc<dyn SampleSource>) -> Self {
        Self { source }
    }

    /// Fetch samples for `subject_id` and build a report.
    ///
    /// Store failures surface as [`DiagnosisError::PersistenceUnavailable`].
    pub async fn analyze(
        &self,
        subject_id: &str,
        query: &AnalysisQuery,
    ) -> DiagnosisResult<AnalysisReport> {
        let window = query.resolve_window(chrono::Utc::now())?;
        tracing::debug!(
            subject_id,
            from = ?window.from,
            to = ?window.to,
            limit = query.limit,
            "Analyzing heart rate",
        );

        let samples = self
            .fetch(SampleQuery {
                subject_id: subject_id.to_string(),
                window,
                limit: query.limit,
            })
            .await?;

        Ok(build_report(query, &samples))
    }

    /// Dashboard for `profile`: the newest reading plus a seven-day
    /// aggregate. The aggregate is not row-capped.
    pub async fn dashboard(
        &self,
        subject_id: &str,
        profile: &SubjectProfile,
    ) -> DiagnosisResult<HealthDashboard> {
        let now = chrono::Utc::now();
        let open = TimeWindow { from: None, to: None };

        let latest = self
            .fetch(SampleQuery {
                subject_id: subject_id.to_string(),
                window: open,
                limit: 1,
            })
            .await?;
        let recent = self
            .fetch(SampleQuery {
                subject_id: subject_id.to_string(),
                window: TimeWindow {
                    from: now.checked_sub_signed(Duration::days(DASHBOARD_WINDOW_DAYS)),
                    to: None,
                },
                limit: usize::MAX,
            })
            .await?;

        Ok(build_dashboard(profile, latest.first(), &recent, now))
    }

    /// Trend summary over the most recent readings.
    pub async fn summarize_recent(&self, subject_id: &str) -> DiagnosisResult<TrendSummary> {
        let samples = self
            .fetch(SampleQuery {
                subject_id: subject_id.to_string(),
                window: TimeWindow { from: None, to: None },
                limit: MAX_TREND_POINTS,
            })
            .await?;

        Ok(summarize_trend(&sample_values(&samples))?)
    }

    async fn fetch(&self, query: SampleQuery) -> DiagnosisResult<Vec<HeartRateSample>> {
        let mut samples = self.source.fetch_samples(&query).await.map_err(|e| {
            tracing::error!(subject_id = %query.subject_id, error = %e, "Sample fetch failed");
            DiagnosisError::PersistenceUnavailable(e.to_string())
        })?;
        samples.truncate(query.limit);
        Ok(samples)
    }
}
