use std::io::Write;

use serde::Serialize;

use super::ledger::HistoryEntry;
use super::repository::TechnicianAssessment;
use super::rules::RuleTable;
use super::scoring::compute_score;

/// Number of technicians currently sitting at each competency level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RosterSummary {
    pub technicians: usize,
    pub average_points: Option<i32>,
    pub levels: Vec<LevelCount>,
    /// Set when the roster hit the service's read limit and omits technicians.
    pub truncated: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LevelCount {
    pub level: u8,
    pub label: String,
    pub technicians: usize,
}

/// Re-score every committed record with the active rules and bucket by level.
pub fn roster_summary(assessments: &[TechnicianAssessment], rules: &RuleTable) -> RosterSummary {
    let mut bands: Vec<_> = rules.levels.iter().collect();
    bands.sort_by_key(|band| band.min_points);

    let mut levels: Vec<LevelCount> = bands
        .into_iter()
        .map(|band| LevelCount {
            level: band.level,
            label: band.label.clone(),
            technicians: 0,
        })
        .collect();

    let mut total_points: i64 = 0;
    for assessment in assessments {
        let score = compute_score(&assessment.committed, rules);
        total_points += i64::from(score.total_points);
        if let Some(count) = levels.iter_mut().find(|count| count.level == score.level) {
            count.technicians += 1;
        }
    }

    let average_points = if assessments.is_empty() {
        None
    } else {
        Some((total_points / assessments.len() as i64) as i32)
    };

    RosterSummary {
        technicians: assessments.len(),
        average_points,
        levels,
        truncated: false,
    }
}

const HISTORY_HEADERS: [&str; 10] = [
    "Entry ID",
    "Technician ID",
    "Recorded At",
    "Actor",
    "Rules Version",
    "Previous Total",
    "New Total",
    "Previous Level",
    "New Level",
    "Changes",
];

#[derive(Debug, Serialize)]
struct HistoryRow<'a> {
    #[serde(rename = "Entry ID")]
    id: &'a str,
    #[serde(rename = "Technician ID")]
    technician_id: &'a str,
    #[serde(rename = "Recorded At")]
    recorded_at: String,
    #[serde(rename = "Actor")]
    actor: &'a str,
    #[serde(rename = "Rules Version")]
    rules_version: &'a str,
    #[serde(rename = "Previous Total")]
    previous_total: i32,
    #[serde(rename = "New Total")]
    new_total: i32,
    #[serde(rename = "Previous Level")]
    previous_level: u8,
    #[serde(rename = "New Level")]
    new_level: u8,
    #[serde(rename = "Changes")]
    changes: String,
}

/// Write history entries as CSV, one row per entry in the order given. The header row is
/// always written, even for an empty ledger.
pub fn export_history_csv<'a, W, I>(entries: I, writer: W) -> Result<(), csv::Error>
where
    W: Write,
    I: IntoIterator<Item = &'a HistoryEntry>,
{
    let mut csv_writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    csv_writer.write_record(HISTORY_HEADERS)?;

    for entry in entries {
        csv_writer.serialize(HistoryRow {
            id: &entry.id.0,
            technician_id: &entry.technician_id.0,
            recorded_at: entry.recorded_at.to_rfc3339(),
            actor: &entry.actor,
            rules_version: &entry.rules_version,
            previous_total: entry.previous.score.total_points,
            new_total: entry.current.score.total_points,
            previous_level: entry.previous.score.level,
            new_level: entry.current.score.level,
            changes: entry.changes.join("; "),
        })?;
    }

    csv_writer.flush()?;
    Ok(())
}
