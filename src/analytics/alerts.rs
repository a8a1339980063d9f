//! Alert aggregation over raw anomalies
//!
//! Anomalies group by (asset, severity). A group of three or more collapses
//! into one MULTIPLE_ANOMALIES alert; smaller groups surface only at HIGH
//! or CRITICAL, one SINGLE_ANOMALY alert per member with a recommended
//! action from a fixed (metric, severity) table. The final list is ordered
//! by severity rank, highest first.

use std::collections::{BTreeSet, HashMap};

use crate::types::{Alert, AlertKind, Anomaly, OeeMetric, Severity};

/// Anomalies in a group before it collapses into a single alert.
const MULTI_ANOMALY_THRESHOLD: usize = 3;

/// Group raw anomalies into actionable alerts.
pub fn generate_alerts(anomalies: &[Anomaly]) -> Vec<Alert> {
    let mut groups: HashMap<(&str, Severity), Vec<&Anomaly>> = HashMap::new();
    for anomaly in anomalies {
        groups
            .entry((anomaly.asset_id.as_str(), anomaly.severity))
            .or_default()
            .push(anomaly);
    }

    let mut alerts = Vec::new();
    for ((asset_id, severity), group) in groups {
        if group.len() >= MULTI_ANOMALY_THRESHOLD {
            let metrics: BTreeSet<OeeMetric> = group.iter().map(|a| a.metric).collect();
            let latest = group
                .iter()
                .map(|a| a.timestamp)
                .max()
                .unwrap_or_else(|| group[0].timestamp);

            alerts.push(Alert {
                asset_id: asset_id.to_string(),
                severity,
                kind: AlertKind::MultipleAnomalies {
                    count: group.len(),
                    metrics: metrics.into_iter().collect(),
                },
                action: "Immediate investigation required".to_string(),
                timestamp: latest,
            });
        } else if severity >= Severity::High {
            for anomaly in group {
                alerts.push(Alert {
                    asset_id: asset_id.to_string(),
                    severity,
                    kind: AlertKind::SingleAnomaly {
                        metric: anomaly.metric,
                        value: anomaly.value,
                        expected: anomaly.expected_value,
                    },
                    action: recommended_action(anomaly.metric, severity).to_string(),
                    timestamp: anomaly.timestamp,
                });
            }
        }
        // LOW/MEDIUM groups below the threshold produce nothing.
    }

    // Severity rank descending; asset id as a deterministic tiebreak.
    alerts.sort_by(|a, b| {
        b.severity
            .cmp(&a.severity)
            .then_with(|| a.asset_id.cmp(&b.asset_id))
    });
    alerts
}

/// Fixed operator-action table for single-anomaly alerts.
fn recommended_action(metric: OeeMetric, severity: Severity) -> &'static str {
    match (metric, severity) {
        (OeeMetric::Oee, Severity::High) => "Check production line immediately",
        (OeeMetric::Oee, Severity::Critical) => "Stop production and investigate",
        (OeeMetric::Availability, Severity::High) => "Check for equipment failures",
        (OeeMetric::Availability, Severity::Critical) => "Initiate maintenance protocol",
        (OeeMetric::Performance, Severity::High) => "Review cycle times and minor stops",
        (OeeMetric::Performance, Severity::Critical) => "Check for major speed losses",
        (OeeMetric::Quality, Severity::High) => "Increase quality inspections",
        (OeeMetric::Quality, Severity::Critical) => "Quarantine recent production",
        _ => "Monitor situation closely",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn anomaly(asset_id: &str, metric: OeeMetric, severity: Severity, minute: i64) -> Anomaly {
        let base = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        Anomaly {
            timestamp: base + Duration::minutes(minute),
            asset_id: asset_id.to_string(),
            metric,
            value: 60.0,
            expected_value: 80.0,
            deviation: 4.0,
            severity,
            confidence: 99.9,
            description: String::new(),
        }
    }

    #[test]
    fn three_anomalies_collapse_into_one_multiple_alert() {
        let anomalies = vec![
            anomaly("CNC-7", OeeMetric::Oee, Severity::High, 0),
            anomaly("CNC-7", OeeMetric::Availability, Severity::High, 5),
            anomaly("CNC-7", OeeMetric::Quality, Severity::High, 10),
        ];
        let alerts = generate_alerts(&anomalies);

        assert_eq!(alerts.len(), 1);
        let alert = &alerts[0];
        assert_eq!(alert.asset_id, "CNC-7");
        assert_eq!(alert.severity, Severity::High);
        match &alert.kind {
            AlertKind::MultipleAnomalies { count, metrics } => {
                assert_eq!(*count, 3);
                assert_eq!(
                    metrics,
                    &vec![OeeMetric::Oee, OeeMetric::Availability, OeeMetric::Quality]
                );
            }
            other => panic!("unexpected alert kind: {other:?}"),
        }
        // Latest timestamp in the group wins.
        assert_eq!(alert.timestamp, anomalies[2].timestamp);
        assert_eq!(alert.action, "Immediate investigation required");
    }

    #[test]
    fn duplicate_metrics_deduplicate_in_multiple_alert() {
        let anomalies = vec![
            anomaly("CNC-7", OeeMetric::Oee, Severity::Critical, 0),
            anomaly("CNC-7", OeeMetric::Oee, Severity::Critical, 1),
            anomaly("CNC-7", OeeMetric::Quality, Severity::Critical, 2),
        ];
        let alerts = generate_alerts(&anomalies);
        assert_eq!(alerts.len(), 1);
        match &alerts[0].kind {
            AlertKind::MultipleAnomalies { count, metrics } => {
                assert_eq!(*count, 3);
                assert_eq!(metrics, &vec![OeeMetric::Oee, OeeMetric::Quality]);
            }
            other => panic!("unexpected alert kind: {other:?}"),
        }
    }

    #[test]
    fn lone_high_anomaly_gets_single_alert_with_table_action() {
        let anomalies = vec![anomaly("CNC-7", OeeMetric::Oee, Severity::Critical, 0)];
        let alerts = generate_alerts(&anomalies);

        assert_eq!(alerts.len(), 1);
        match &alerts[0].kind {
            AlertKind::SingleAnomaly { metric, .. } => assert_eq!(*metric, OeeMetric::Oee),
            other => panic!("unexpected alert kind: {other:?}"),
        }
        assert_eq!(alerts[0].action, "Stop production and investigate");
    }

    #[test]
    fn action_table_covers_all_metrics() {
        assert_eq!(
            recommended_action(OeeMetric::Availability, Severity::High),
            "Check for equipment failures"
        );
        assert_eq!(
            recommended_action(OeeMetric::Performance, Severity::Critical),
            "Check for major speed losses"
        );
        assert_eq!(
            recommended_action(OeeMetric::Quality, Severity::High),
            "Increase quality inspections"
        );
        // Unmatched combinations fall back to the default.
        assert_eq!(
            recommended_action(OeeMetric::Oee, Severity::Low),
            "Monitor situation closely"
        );
    }

    #[test]
    fn small_low_and_medium_groups_are_dropped() {
        let anomalies = vec![
            anomaly("CNC-7", OeeMetric::Oee, Severity::Low, 0),
            anomaly("CNC-7", OeeMetric::Quality, Severity::Medium, 1),
            anomaly("MILL-2", OeeMetric::Performance, Severity::Medium, 2),
        ];
        assert!(generate_alerts(&anomalies).is_empty());
    }

    #[test]
    fn three_medium_anomalies_still_aggregate() {
        let anomalies = vec![
            anomaly("CNC-7", OeeMetric::Oee, Severity::Medium, 0),
            anomaly("CNC-7", OeeMetric::Quality, Severity::Medium, 1),
            anomaly("CNC-7", OeeMetric::Performance, Severity::Medium, 2),
        ];
        let alerts = generate_alerts(&anomalies);
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].severity, Severity::Medium);
    }

    #[test]
    fn final_order_is_severity_rank_descending() {
        let anomalies = vec![
            anomaly("A1", OeeMetric::Oee, Severity::High, 0),
            anomaly("A2", OeeMetric::Oee, Severity::Critical, 1),
            // Three mediums on a third asset -> MULTIPLE_ANOMALIES at MEDIUM
            anomaly("A3", OeeMetric::Oee, Severity::Medium, 2),
            anomaly("A3", OeeMetric::Quality, Severity::Medium, 3),
            anomaly("A3", OeeMetric::Performance, Severity::Medium, 4),
        ];
        let alerts = generate_alerts(&anomalies);

        assert_eq!(alerts.len(), 3);
        assert_eq!(alerts[0].severity, Severity::Critical);
        assert_eq!(alerts[1].severity, Severity::High);
        assert_eq!(alerts[2].severity, Severity::Medium);
    }
}
