//! Analytics engine: the orchestrating seam between the query layer and
//! the statistical cores
//!
//! The engine owns its two collaborators as explicit constructor-injected
//! dependencies: a [`TelemetryStore`] handle and an [`IdealCycleCache`]
//! handle. There are no process-wide singletons; a second engine over a
//! different store is just another value.
//!
//! Each public method is one batch analysis over an explicit window:
//! a store round-trip followed by a pure computation. Calls are independent
//! and idempotent given identical store results, so the caller may issue
//! them concurrently as long as each engine owns its own store session.

use chrono::Utc;
use std::time::Duration;
use tracing::{debug, info, instrument};

use crate::analytics::{alerts, baseline, multivariate, oee, pareto, patterns, trend};
use crate::cache::{ideal_cycle_time_key, IdealCycleCache};
use crate::config::AnalyticsConfig;
use crate::error::AnalyticsError;
use crate::store::TelemetryStore;
use crate::types::{
    Alert, Anomaly, LossAnalysis, MultivariateObservation, OeeRecord, PatternEvent, TimeRange,
    TrendAnalysis,
};

/// Batch analytics over a telemetry store and a per-asset cycle-time cache.
pub struct AnalyticsEngine<S, C> {
    store: S,
    cache: C,
    config: AnalyticsConfig,
}

impl<S, C> AnalyticsEngine<S, C>
where
    S: TelemetryStore,
    C: IdealCycleCache,
{
    pub fn new(store: S, cache: C, config: AnalyticsConfig) -> Self {
        Self {
            store,
            cache,
            config,
        }
    }

    /// Detect univariate OEE anomalies for a line: baselines are learned
    /// over `historical` and recent samples from `recent` are z-scored
    /// against them.
    #[instrument(skip(self))]
    pub async fn detect_oee_anomalies(
        &self,
        line_id: &str,
        recent: &TimeRange,
        historical: &TimeRange,
    ) -> Result<Vec<Anomaly>, AnalyticsError> {
        let samples = self.store.recent_oee_samples(line_id, recent).await?;
        let stats = self.store.baseline_stats(line_id, historical).await?;

        let baselines = baseline::build_baselines(&stats, historical);
        let anomalies =
            baseline::detect_anomalies(&samples, &baselines, &self.config.detection);

        info!(
            line_id,
            samples = samples.len(),
            baselined_assets = baselines.len(),
            anomalies = anomalies.len(),
            "univariate detection complete"
        );
        Ok(anomalies)
    }

    /// Apply the heuristic pattern rules to one asset's recent telemetry.
    #[instrument(skip(self))]
    pub async fn detect_pattern_anomalies(
        &self,
        asset_id: &str,
        window: &TimeRange,
    ) -> Result<Vec<PatternEvent>, AnalyticsError> {
        let rows = self.store.pattern_window(asset_id, window).await?;
        let events = patterns::detect_patterns(&rows, window.end, &self.config.patterns);

        info!(
            asset_id,
            rows = rows.len(),
            events = events.len(),
            "pattern detection complete"
        );
        Ok(events)
    }

    /// Mahalanobis-distance detection across a line's feature vectors.
    ///
    /// Returns [`AnalyticsError::CovarianceNotInvertible`] when the
    /// analysis itself cannot run, which is distinct from an empty result.
    #[instrument(skip(self))]
    pub async fn detect_multivariate_anomalies(
        &self,
        line_id: &str,
        window: &TimeRange,
    ) -> Result<Vec<MultivariateObservation>, AnalyticsError> {
        let rows = self.store.feature_window(line_id, window).await?;
        let observations = multivariate::detect_multivariate(&rows, &self.config.multivariate)?;

        info!(
            line_id,
            rows = rows.len(),
            observations = observations.len(),
            "multivariate detection complete"
        );
        Ok(observations)
    }

    /// Compute OEE for one asset over a window.
    ///
    /// A window with no rows at all for the asset is a hard
    /// [`AnalyticsError::NoData`], distinct from metrics that are
    /// legitimately zero.
    #[instrument(skip(self))]
    pub async fn calculate_oee(
        &self,
        asset_id: &str,
        range: &TimeRange,
    ) -> Result<OeeRecord, AnalyticsError> {
        let totals = self
            .store
            .asset_totals(asset_id, range)
            .await?
            .ok_or_else(|| AnalyticsError::NoData {
                asset_id: asset_id.to_string(),
            })?;

        let ideal_cycle_time = self.ideal_cycle_time(asset_id).await?;
        let record = oee::compute_oee(
            &totals,
            range.duration_minutes(),
            ideal_cycle_time,
            Utc::now(),
        );

        info!(
            asset_id,
            oee = record.oee,
            availability = record.availability,
            performance = record.performance,
            quality = record.quality,
            "OEE calculated"
        );
        Ok(record)
    }

    /// Rank a line's losses and derive remediation recommendations.
    #[instrument(skip(self))]
    pub async fn analyze_losses(
        &self,
        line_id: &str,
        range: &TimeRange,
    ) -> Result<LossAnalysis, AnalyticsError> {
        let rows = self.store.loss_rows(line_id, range).await?;
        let analysis = pareto::analyze_losses(&rows, *range, &self.config.pareto);

        match &analysis {
            LossAnalysis::NoLosses => info!(line_id, "no losses recorded in window"),
            LossAnalysis::Pareto(report) => info!(
                line_id,
                causes = report.total_losses,
                total_loss_time = report.total_loss_time,
                vital_few = report.vital_few.len(),
                "loss analysis complete"
            ),
        }
        Ok(analysis)
    }

    /// Fit the daily-OEE trend over a history window and project it
    /// `days_forecast` days forward.
    #[instrument(skip(self))]
    pub async fn forecast_oee_trend(
        &self,
        line_id: &str,
        history: &TimeRange,
        days_forecast: usize,
    ) -> Result<TrendAnalysis, AnalyticsError> {
        let daily = self.store.daily_oee(line_id, history).await?;
        let analysis = trend::forecast_trend(&daily, days_forecast, &self.config.trend);

        match &analysis {
            TrendAnalysis::InsufficientData { days_available, .. } => {
                info!(line_id, days_available, "insufficient history for trend fit")
            }
            TrendAnalysis::Forecast(report) => info!(
                line_id,
                trend = %report.trend,
                slope = report.daily_change,
                r_squared = report.trend_strength,
                "trend forecast complete"
            ),
        }
        Ok(analysis)
    }

    /// Group raw anomalies into actionable alerts. Pure; no store access.
    pub fn generate_alerts(&self, anomalies: &[Anomaly]) -> Vec<Alert> {
        alerts::generate_alerts(anomalies)
    }

    /// Resolve an asset's ideal cycle time through the cache, writing back
    /// the configured default (with TTL) on a miss.
    async fn ideal_cycle_time(&self, asset_id: &str) -> Result<f64, AnalyticsError> {
        let key = ideal_cycle_time_key(asset_id);
        if let Some(value) = self.cache.get(&key).await? {
            return Ok(value);
        }

        let default = self.config.oee.default_ideal_cycle_time;
        self.cache
            .put(
                &key,
                default,
                Duration::from_secs(self.config.oee.cycle_time_ttl_secs),
            )
            .await?;
        debug!(asset_id, value = default, "ideal cycle time missing, cached default");
        Ok(default)
    }
}
