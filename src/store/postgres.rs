//! Postgres/TimescaleDB implementation of the query layer
//!
//! Runtime-bound queries with explicit casts; every row is mapped into its
//! typed struct here so nothing dynamically-shaped leaks into the analytics
//! core. Aggregate casts (`::double precision`, `::bigint`) pin the Rust
//! tuple types regardless of the underlying column types.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::time::Duration;
use tracing::{debug, info};

use super::{
    AssetTotals, BaselineStats, DailyOee, FeatureRow, LossRow, MetricSample, PatternRow,
    TelemetryStore,
};
use crate::types::TimeRange;

/// Create a PostgreSQL connection pool for the time-series store.
pub async fn create_pool(database_url: &str) -> Result<PgPool, sqlx::Error> {
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url)
        .await?;

    info!("Connected to time-series store");
    Ok(pool)
}

/// Postgres-backed telemetry store.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TelemetryStore for PgStore {
    async fn recent_oee_samples(
        &self,
        line_id: &str,
        range: &TimeRange,
    ) -> Result<Vec<MetricSample>, sqlx::Error> {
        let rows: Vec<(String, DateTime<Utc>, f64, f64, f64, f64)> = sqlx::query_as(
            r#"
            SELECT asset_id,
                   timestamp,
                   oee::double precision,
                   availability::double precision,
                   performance::double precision,
                   quality::double precision
            FROM   oee_calculations
            WHERE  line_id = $1
              AND  timestamp >= $2
              AND  timestamp < $3
            ORDER  BY timestamp
            "#,
        )
        .bind(line_id)
        .bind(range.start)
        .bind(range.end)
        .fetch_all(&self.pool)
        .await?;

        debug!(line_id, rows = rows.len(), "fetched recent OEE samples");

        Ok(rows
            .into_iter()
            .map(
                |(asset_id, timestamp, oee, availability, performance, quality)| MetricSample {
                    timestamp,
                    asset_id,
                    oee,
                    availability,
                    performance,
                    quality,
                },
            )
            .collect())
    }

    async fn baseline_stats(
        &self,
        line_id: &str,
        range: &TimeRange,
    ) -> Result<Vec<BaselineStats>, sqlx::Error> {
        type StatsRow = (
            String,
            Option<f64>,
            Option<f64>,
            Option<f64>,
            Option<f64>,
            Option<f64>,
            Option<f64>,
            Option<f64>,
            Option<f64>,
        );
        let rows: Vec<StatsRow> = sqlx::query_as(
            r#"
            SELECT asset_id,
                   AVG(oee)::double precision,
                   STDDEV(oee)::double precision,
                   AVG(availability)::double precision,
                   STDDEV(availability)::double precision,
                   AVG(performance)::double precision,
                   STDDEV(performance)::double precision,
                   AVG(quality)::double precision,
                   STDDEV(quality)::double precision
            FROM   oee_calculations
            WHERE  line_id = $1
              AND  timestamp >= $2
              AND  timestamp < $3
            GROUP  BY asset_id
            "#,
        )
        .bind(line_id)
        .bind(range.start)
        .bind(range.end)
        .fetch_all(&self.pool)
        .await?;

        // An asset whose averages are all NULL contributed no usable rows;
        // it simply gets no baseline.
        Ok(rows
            .into_iter()
            .filter_map(
                |(asset_id, avg_oee, std_oee, avg_av, std_av, avg_pf, std_pf, avg_q, std_q)| {
                    Some(BaselineStats {
                        asset_id,
                        avg_oee: avg_oee?,
                        std_oee,
                        avg_availability: avg_av?,
                        std_availability: std_av,
                        avg_performance: avg_pf?,
                        std_performance: std_pf,
                        avg_quality: avg_q?,
                        std_quality: std_q,
                    })
                },
            )
            .collect())
    }

    async fn pattern_window(
        &self,
        asset_id: &str,
        range: &TimeRange,
    ) -> Result<Vec<PatternRow>, sqlx::Error> {
        let rows: Vec<(DateTime<Utc>, f64, f64, f64, i64, i64)> = sqlx::query_as(
            r#"
            SELECT timestamp,
                   oee::double precision,
                   COALESCE(runtime, 0)::double precision,
                   COALESCE(downtime, 0)::double precision,
                   COALESCE(good_count, 0)::bigint,
                   COALESCE(reject_count, 0)::bigint
            FROM   telemetry
            WHERE  asset_id = $1
              AND  timestamp >= $2
              AND  timestamp < $3
              AND  oee IS NOT NULL
            ORDER  BY timestamp
            "#,
        )
        .bind(asset_id)
        .bind(range.start)
        .bind(range.end)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(
                |(timestamp, oee, runtime, downtime, good_count, reject_count)| PatternRow {
                    timestamp,
                    oee,
                    runtime,
                    downtime,
                    good_count,
                    reject_count,
                },
            )
            .collect())
    }

    async fn feature_window(
        &self,
        line_id: &str,
        range: &TimeRange,
    ) -> Result<Vec<FeatureRow>, sqlx::Error> {
        type Row = (
            DateTime<Utc>,
            String,
            Option<f64>,
            f64,
            f64,
            f64,
            Option<f64>,
        );
        let rows: Vec<Row> = sqlx::query_as(
            r#"
            SELECT timestamp,
                   asset_id,
                   oee::double precision,
                   temperature::double precision,
                   pressure::double precision,
                   vibration::double precision,
                   "current"::double precision
            FROM   telemetry
            WHERE  line_id = $1
              AND  timestamp >= $2
              AND  timestamp < $3
              AND  temperature IS NOT NULL
              AND  pressure IS NOT NULL
              AND  vibration IS NOT NULL
            ORDER  BY timestamp
            "#,
        )
        .bind(line_id)
        .bind(range.start)
        .bind(range.end)
        .fetch_all(&self.pool)
        .await?;

        debug!(line_id, rows = rows.len(), "fetched multivariate feature window");

        Ok(rows
            .into_iter()
            .map(
                |(timestamp, asset_id, oee, temperature, pressure, vibration, current)| {
                    FeatureRow {
                        timestamp,
                        asset_id,
                        oee,
                        temperature,
                        pressure,
                        vibration,
                        current,
                    }
                },
            )
            .collect())
    }

    async fn asset_totals(
        &self,
        asset_id: &str,
        range: &TimeRange,
    ) -> Result<Option<AssetTotals>, sqlx::Error> {
        type Row = (String, String, f64, f64, i64, i64, Option<f64>, Option<f64>);
        let row: Option<Row> = sqlx::query_as(
            r#"
            SELECT asset_id,
                   line_id,
                   COALESCE(SUM(runtime), 0)::double precision,
                   COALESCE(SUM(downtime), 0)::double precision,
                   COALESCE(SUM(good_count), 0)::bigint,
                   COALESCE(SUM(reject_count), 0)::bigint,
                   AVG(temperature)::double precision,
                   AVG(vibration)::double precision
            FROM   telemetry
            WHERE  asset_id = $1
              AND  timestamp >= $2
              AND  timestamp < $3
            GROUP  BY asset_id, line_id
            "#,
        )
        .bind(asset_id)
        .bind(range.start)
        .bind(range.end)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(
            |(asset_id, line_id, runtime, downtime, good, reject, avg_temp, avg_vib)| {
                AssetTotals {
                    asset_id,
                    line_id,
                    runtime,
                    downtime,
                    good_count: good,
                    reject_count: reject,
                    avg_temperature: avg_temp,
                    avg_vibration: avg_vib,
                }
            },
        ))
    }

    async fn loss_rows(
        &self,
        line_id: &str,
        range: &TimeRange,
    ) -> Result<Vec<LossRow>, sqlx::Error> {
        let rows: Vec<(String, String, String, f64, f64, i64)> = sqlx::query_as(
            r#"
            SELECT category,
                   subcategory,
                   reason,
                   COALESCE(SUM(duration), 0)::double precision AS total_duration,
                   COALESCE(SUM(impact), 0)::double precision,
                   COUNT(*)::bigint
            FROM   losses
            WHERE  line_id = $1
              AND  timestamp >= $2
              AND  timestamp < $3
            GROUP  BY category, subcategory, reason
            ORDER  BY total_duration DESC
            "#,
        )
        .bind(line_id)
        .bind(range.start)
        .bind(range.end)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(
                |(category, subcategory, reason, duration, impact, occurrences)| LossRow {
                    category,
                    subcategory,
                    reason,
                    duration,
                    impact,
                    occurrences,
                },
            )
            .collect())
    }

    async fn daily_oee(
        &self,
        line_id: &str,
        range: &TimeRange,
    ) -> Result<Vec<DailyOee>, sqlx::Error> {
        let rows: Vec<(NaiveDate, Option<f64>)> = sqlx::query_as(
            r#"
            SELECT DATE(timestamp) AS day,
                   AVG(oee)::double precision
            FROM   oee_calculations
            WHERE  line_id = $1
              AND  timestamp >= $2
              AND  timestamp < $3
            GROUP  BY DATE(timestamp)
            ORDER  BY day
            "#,
        )
        .bind(line_id)
        .bind(range.start)
        .bind(range.end)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .filter_map(|(date, avg_oee)| Some(DailyOee { date, avg_oee: avg_oee? }))
            .collect())
    }
}
