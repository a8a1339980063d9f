//! Pareto ranking of loss causes and remediation recommendations
//!
//! Loss rows arrive grouped and duration-ranked from the store. Each entry
//! gets its share of total loss time and a running cumulative share; the
//! "vital few" are the prefix responsible for the first 80% (Pareto rule).
//! A fixed rule table keyed on (category, subcategory) turns the top
//! vital-few entries into improvement recommendations.

use crate::config::ParetoSettings;
use crate::store::LossRow;
use crate::types::{
    LossAnalysis, LossParetoReport, ParetoEntry, Priority, Recommendation, TimeRange,
};

/// Rank losses for a window. An empty window is an explicit no-losses
/// outcome, not an error.
pub fn analyze_losses(
    rows: &[LossRow],
    period: TimeRange,
    settings: &ParetoSettings,
) -> LossAnalysis {
    if rows.is_empty() {
        return LossAnalysis::NoLosses;
    }

    let total_loss_time: f64 = rows.iter().map(|r| r.duration).sum();

    let mut cumulative = 0.0;
    let pareto_analysis: Vec<ParetoEntry> = rows
        .iter()
        .map(|row| {
            let percentage = if total_loss_time > 0.0 {
                row.duration / total_loss_time * 100.0
            } else {
                0.0
            };
            cumulative += percentage;
            ParetoEntry {
                category: row.category.clone(),
                subcategory: row.subcategory.clone(),
                reason: row.reason.clone(),
                duration: row.duration,
                impact: row.impact,
                occurrences: row.occurrences,
                percentage: round2(percentage),
                cumulative_percentage: round2(cumulative),
            }
        })
        .collect();

    // Prefix through the first entry at or past the cutoff; the whole list
    // when the cutoff is never reached.
    let mut vital_few = Vec::new();
    for entry in &pareto_analysis {
        vital_few.push(entry.clone());
        if entry.cumulative_percentage >= settings.vital_few_cutoff {
            break;
        }
    }

    let recommendations = recommend(&vital_few, settings.max_recommendations);

    LossAnalysis::Pareto(LossParetoReport {
        period,
        total_loss_time,
        total_losses: rows.len(),
        pareto_analysis,
        vital_few,
        recommendations,
    })
}

/// Apply the remediation rule table to the top vital-few entries. Entries
/// matching no rule produce no recommendation.
fn recommend(vital_few: &[ParetoEntry], max_entries: usize) -> Vec<Recommendation> {
    vital_few
        .iter()
        .take(max_entries)
        .filter_map(|entry| {
            match (entry.category.as_str(), entry.subcategory.as_str()) {
                ("AVAILABILITY", "BREAKDOWN") => Some(Recommendation {
                    area: "Maintenance".to_string(),
                    priority: Priority::High,
                    action: format!("Implement predictive maintenance for {}", entry.reason),
                    expected_impact: format!(
                        "Reduce downtime by {:.1}%",
                        entry.percentage / 2.0
                    ),
                }),
                ("AVAILABILITY", "SETUP") => Some(Recommendation {
                    area: "Process".to_string(),
                    priority: Priority::Medium,
                    action: format!("Apply SMED techniques to reduce {} time", entry.reason),
                    expected_impact: "Reduce setup time by 30-50%".to_string(),
                }),
                ("PERFORMANCE", "MINOR_STOPS") => Some(Recommendation {
                    area: "Automation".to_string(),
                    priority: Priority::Medium,
                    action: format!(
                        "Automate or eliminate minor stops due to {}",
                        entry.reason
                    ),
                    expected_impact: format!(
                        "Improve performance by {:.1}%",
                        entry.percentage / 3.0
                    ),
                }),
                ("PERFORMANCE", "SPEED_LOSS") => Some(Recommendation {
                    area: "Optimization".to_string(),
                    priority: Priority::Low,
                    action: format!("Optimize process parameters for {}", entry.reason),
                    expected_impact: "Increase speed by 10-15%".to_string(),
                }),
                ("QUALITY", _) => Some(Recommendation {
                    area: "Quality Control".to_string(),
                    priority: Priority::High,
                    action: format!(
                        "Implement SPC and root cause analysis for {}",
                        entry.reason
                    ),
                    expected_impact: format!("Reduce defects by {:.1}%", entry.percentage / 2.0),
                }),
                _ => None,
            }
        })
        .collect()
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
