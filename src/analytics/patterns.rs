//! Heuristic pattern rules over a recent telemetry window
//!
//! Three fixed rules run independently over the same ordered window and
//! their events are concatenated:
//! - sudden drop: row-to-row OEE delta below the configured negative step
//! - rising rejects: recent reject mean exceeding the historical mean by
//!   the configured factor (needs the longer window)
//! - threshold breach: downtime exceeding the configured fraction of runtime
//!
//! Fewer than the minimum rows is a soft no-op, not an error.

use chrono::{DateTime, Utc};

use crate::config::PatternThresholds;
use crate::store::PatternRow;
use crate::types::{PatternEvent, PatternKind, Severity};

/// Evaluate all pattern rules over an ordered telemetry window.
///
/// `window_end` stamps window-level events (the reject trend has no single
/// offending row).
pub fn detect_patterns(
    rows: &[PatternRow],
    window_end: DateTime<Utc>,
    thresholds: &PatternThresholds,
) -> Vec<PatternEvent> {
    if rows.len() < thresholds.min_rows {
        return Vec::new();
    }

    let mut events = Vec::new();
    events.extend(sudden_drops(rows, thresholds));
    events.extend(reject_trend(rows, window_end, thresholds));
    events.extend(downtime_breaches(rows, thresholds));
    events
}

/// Flag every row whose OEE fell by more than the configured step from the
/// previous row.
fn sudden_drops(rows: &[PatternRow], thresholds: &PatternThresholds) -> Vec<PatternEvent> {
    rows.windows(2)
        .filter(|pair| pair[1].oee - pair[0].oee < -thresholds.sudden_drop_points)
        .map(|pair| PatternEvent {
            kind: PatternKind::SuddenDrop,
            metric: "OEE".to_string(),
            timestamp: pair[1].timestamp,
            value: Some(pair[1].oee),
            severity: Severity::High,
            description: format!(
                "Sudden OEE drop detected at {}",
                pair[1].timestamp.to_rfc3339()
            ),
        })
        .collect()
}

/// Compare the reject mean of the last N rows against the first N; a recent
/// mean beyond `trend_factor` times the historical one is one MEDIUM event.
fn reject_trend(
    rows: &[PatternRow],
    window_end: DateTime<Utc>,
    thresholds: &PatternThresholds,
) -> Option<PatternEvent> {
    if rows.len() < thresholds.trend_min_rows {
        return None;
    }

    // The two comparison windows can never overlap, whatever the config.
    let n = thresholds.trend_window.min(rows.len() / 2);
    if n == 0 {
        return None;
    }
    let historical = mean(rows[..n].iter().map(|r| r.reject_count as f64));
    let recent = mean(rows[rows.len() - n..].iter().map(|r| r.reject_count as f64));

    if recent > historical * thresholds.trend_factor {
        Some(PatternEvent {
            kind: PatternKind::Trend,
            metric: "Quality".to_string(),
            timestamp: window_end,
            value: None,
            severity: Severity::Medium,
            description: "Increasing reject rate trend detected".to_string(),
        })
    } else {
        None
    }
}

/// Flag every row where downtime exceeds the configured fraction of runtime.
fn downtime_breaches(rows: &[PatternRow], thresholds: &PatternThresholds) -> Vec<PatternEvent> {
    rows.iter()
        .filter(|row| row.downtime > row.runtime * thresholds.downtime_runtime_ratio)
        .map(|row| PatternEvent {
            kind: PatternKind::ThresholdBreach,
            metric: "Downtime".to_string(),
            timestamp: row.timestamp,
            value: Some(row.downtime),
            severity: Severity::High,
            description: format!("Excessive downtime at {}", row.timestamp.to_rfc3339()),
        })
        .collect()
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let mut sum = 0.0;
    let mut count = 0usize;
    for v in values {
        sum += v;
        count += 1;
    }
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn row(minute: u32, oee: f64, runtime: f64, downtime: f64, rejects: i64) -> PatternRow {
        PatternRow {
            timestamp: Utc.with_ymd_and_hms(2024, 3, 1, 8, minute, 0).unwrap(),
            oee,
            runtime,
            downtime,
            good_count: 100,
            reject_count: rejects,
        }
    }

    fn end() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap()
    }

    fn steady(count: usize) -> Vec<PatternRow> {
        (0..count).map(|i| row(i as u32, 85.0, 60.0, 5.0, 2)).collect()
    }

    #[test]
    fn short_window_is_a_soft_no_op() {
        let rows = steady(9);
        let events = detect_patterns(&rows, end(), &PatternThresholds::default());
        assert!(events.is_empty());
    }

    #[test]
    fn sudden_drop_flags_the_offending_row() {
        let mut rows = steady(12);
        rows[6].oee = 60.0; // 85 -> 60 is a 25-point drop

        let events = detect_patterns(&rows, end(), &PatternThresholds::default());
        let drops: Vec<_> = events
            .iter()
            .filter(|e| e.kind == PatternKind::SuddenDrop)
            .collect();
        assert_eq!(drops.len(), 1);
        assert_eq!(drops[0].timestamp, rows[6].timestamp);
        assert_eq!(drops[0].value, Some(60.0));
        assert_eq!(drops[0].severity, Severity::High);
    }

    #[test]
    fn exact_twenty_point_drop_does_not_fire() {
        let mut rows = steady(12);
        rows[6].oee = 65.0; // exactly -20

        let events = detect_patterns(&rows, end(), &PatternThresholds::default());
        assert!(events.iter().all(|e| e.kind != PatternKind::SuddenDrop));
    }

    #[test]
    fn reject_trend_needs_twenty_rows() {
        // 15 rows with a sharp reject increase: trend rule must stay silent.
        let mut rows = steady(15);
        for r in rows.iter_mut().skip(10) {
            r.reject_count = 50;
        }
        let events = detect_patterns(&rows, end(), &PatternThresholds::default());
        assert!(events.iter().all(|e| e.kind != PatternKind::Trend));
    }

    #[test]
    fn rising_reject_trend_fires_once() {
        let mut rows = steady(24);
        for r in rows.iter_mut().skip(14) {
            r.reject_count = 10; // recent mean 10 vs historical mean 2
        }

        let events = detect_patterns(&rows, end(), &PatternThresholds::default());
        let trends: Vec<_> = events
            .iter()
            .filter(|e| e.kind == PatternKind::Trend)
            .collect();
        assert_eq!(trends.len(), 1);
        assert_eq!(trends[0].timestamp, end());
        assert_eq!(trends[0].severity, Severity::Medium);
        assert_eq!(trends[0].metric, "Quality");
    }

    #[test]
    fn reject_mean_below_factor_stays_silent() {
        let mut rows = steady(24);
        for r in rows.iter_mut().skip(14) {
            r.reject_count = 3; // 3 <= 2 * 1.5
        }
        let events = detect_patterns(&rows, end(), &PatternThresholds::default());
        assert!(events.iter().all(|e| e.kind != PatternKind::Trend));
    }

    #[test]
    fn downtime_breach_flags_each_row() {
        let mut rows = steady(12);
        rows[3].downtime = 25.0; // > 60 * 0.3
        rows[8].downtime = 30.0;

        let events = detect_patterns(&rows, end(), &PatternThresholds::default());
        let breaches: Vec<_> = events
            .iter()
            .filter(|e| e.kind == PatternKind::ThresholdBreach)
            .collect();
        assert_eq!(breaches.len(), 2);
        assert_eq!(breaches[0].value, Some(25.0));
        assert_eq!(breaches[1].value, Some(30.0));
    }

    #[test]
    fn zero_runtime_with_downtime_breaches() {
        let mut rows = steady(12);
        rows[0].runtime = 0.0;
        rows[0].downtime = 1.0;
        let events = detect_patterns(&rows, end(), &PatternThresholds::default());
        assert!(events.iter().any(|e| e.kind == PatternKind::ThresholdBreach));
    }

    #[test]
    fn rules_are_independent_and_concatenated() {
        let mut rows = steady(24);
        rows[5].oee = 50.0; // sudden drop
        rows[7].downtime = 40.0; // breach
        for r in rows.iter_mut().skip(14) {
            r.reject_count = 20; // trend
        }

        let events = detect_patterns(&rows, end(), &PatternThresholds::default());
        assert!(events.iter().any(|e| e.kind == PatternKind::SuddenDrop));
        assert!(events.iter().any(|e| e.kind == PatternKind::Trend));
        assert!(events.iter().any(|e| e.kind == PatternKind::ThresholdBreach));
    }
}
