//! OEE computation from summed telemetry totals
//!
//! availability = runtime / planned time
//! performance  = ideal cycle time x produced units / runtime
//! quality      = good units / total units
//! oee          = availability x performance x quality
//!
//! Each ratio guards its zero denominator with 0, and all four outputs are
//! clamped to [0, 100] after the composite is computed; performance
//! exceeds 100 whenever actual cycle time beats the ideal.

use chrono::{DateTime, Utc};

use crate::store::AssetTotals;
use crate::types::OeeRecord;

/// Compute the OEE record for one asset over a window.
///
/// `planned_minutes` is the duration of the analysis window; the caller
/// resolves `ideal_cycle_time` through the per-asset cache.
pub fn compute_oee(
    totals: &AssetTotals,
    planned_minutes: f64,
    ideal_cycle_time: f64,
    timestamp: DateTime<Utc>,
) -> OeeRecord {
    let total_count = totals.good_count + totals.reject_count;

    let availability = if planned_minutes > 0.0 {
        totals.runtime / planned_minutes * 100.0
    } else {
        0.0
    };

    let performance = if totals.runtime > 0.0 {
        (total_count as f64 * ideal_cycle_time) / totals.runtime * 100.0
    } else {
        0.0
    };

    let quality = if total_count > 0 {
        totals.good_count as f64 / total_count as f64 * 100.0
    } else {
        0.0
    };

    // Composite from the raw components, then clamp everything.
    let oee = availability * performance * quality / 10_000.0;

    OeeRecord {
        timestamp,
        asset_id: totals.asset_id.clone(),
        line_id: totals.line_id.clone(),
        oee: oee.clamp(0.0, 100.0),
        availability: availability.clamp(0.0, 100.0),
        performance: performance.clamp(0.0, 100.0),
        quality: quality.clamp(0.0, 100.0),
        runtime: totals.runtime,
        downtime: totals.downtime,
        total_count,
        good_count: totals.good_count,
        reject_count: totals.reject_count,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn totals(runtime: f64, downtime: f64, good: i64, reject: i64) -> AssetTotals {
        AssetTotals {
            asset_id: "CNC-7".to_string(),
            line_id: "LINE-A".to_string(),
            runtime,
            downtime,
            good_count: good,
            reject_count: reject,
            avg_temperature: Some(61.5),
            avg_vibration: Some(1.2),
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 16, 0, 0).unwrap()
    }

    #[test]
    fn nominal_shift() {
        // 8h window, 420min runtime, 400 units at 1 min ideal, 380 good.
        let record = compute_oee(&totals(420.0, 60.0, 380, 20), 480.0, 1.0, now());

        assert!((record.availability - 87.5).abs() < 1e-9);
        assert!((record.performance - 400.0 / 420.0 * 100.0).abs() < 1e-9);
        assert!((record.quality - 95.0).abs() < 1e-9);
        let expected_oee = 87.5 * (400.0 / 420.0 * 100.0) * 95.0 / 10_000.0;
        assert!((record.oee - expected_oee).abs() < 1e-9);
        assert_eq!(record.total_count, 400);
    }

    #[test]
    fn zero_runtime_zeroes_the_ratios_without_fault() {
        let record = compute_oee(&totals(0.0, 480.0, 0, 0), 480.0, 1.0, now());
        assert_eq!(record.availability, 0.0);
        assert_eq!(record.performance, 0.0);
        assert_eq!(record.quality, 0.0);
        assert_eq!(record.oee, 0.0);
    }

    #[test]
    fn zero_planned_time_is_guarded() {
        let record = compute_oee(&totals(100.0, 0.0, 50, 0), 0.0, 1.0, now());
        assert_eq!(record.availability, 0.0);
        assert_eq!(record.oee, 0.0);
    }

    #[test]
    fn fast_cycle_time_clamps_performance_at_100() {
        // 600 units in 420 minutes at 1.0 ideal -> raw performance ~142.9
        let record = compute_oee(&totals(420.0, 0.0, 600, 0), 480.0, 1.0, now());
        assert_eq!(record.performance, 100.0);
        assert!(record.oee <= 100.0);
    }

    #[test]
    fn composite_uses_unclamped_components() {
        // Raw: availability 87.5, performance 142.9 (clamped later), quality
        // 100 -> composite 125.0, clamped to 100.
        let record = compute_oee(&totals(420.0, 0.0, 600, 0), 480.0, 1.0, now());
        assert_eq!(record.oee, 100.0);
    }

    #[test]
    fn all_outputs_within_bounds_across_inputs() {
        let cases = [
            (0.0, 0.0, 0, 0, 0.0),
            (480.0, 0.0, 1000, 0, 480.0),
            (10.0, 470.0, 3, 900, 480.0),
            (9999.0, 0.0, 1, 1, 1.0),
        ];
        for (runtime, downtime, good, reject, planned) in cases {
            let record = compute_oee(&totals(runtime, downtime, good, reject), planned, 1.0, now());
            for value in [
                record.oee,
                record.availability,
                record.performance,
                record.quality,
            ] {
                assert!((0.0..=100.0).contains(&value), "out of bounds: {value}");
            }
        }
    }
}
