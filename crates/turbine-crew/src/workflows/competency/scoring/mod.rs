mod levels;
mod subtotals;

pub use levels::{derive_level, LevelDerivation};

use serde::{Deserialize, Serialize};

use super::domain::AssessmentRecord;
use super::rules::RuleTable;

/// Per-category contributions behind a total, kept for transparent audits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub internal_experience: i32,
    pub external_experience: i32,
    pub multiplier: f64,
    pub experience: i32,
    pub education: i32,
    pub extra_courses: i32,
    pub subjective: i32,
}

/// Derived score for a record. Recomputed on demand, never stored on its own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreResult {
    pub subtotals: ScoreBreakdown,
    pub total_points: i32,
    pub level: u8,
    pub level_label: String,
    pub next_level_at: Option<i32>,
}

/// Score a record against the rule table.
///
/// Total over every input: unset selections and unknown keys add nothing, an unknown tier
/// falls back to the lowest multiplier, and the subjective score is added as given.
pub fn compute_score(record: &AssessmentRecord, rules: &RuleTable) -> ScoreResult {
    let subtotals = subtotals::breakdown(record, rules);

    let total_points = subtotals
        .education
        .saturating_add(subtotals.extra_courses)
        .saturating_add(subtotals.experience)
        .saturating_add(subtotals.subjective);

    let derived = derive_level(total_points, &rules.levels);

    ScoreResult {
        subtotals,
        total_points,
        level: derived.level,
        level_label: derived.label,
        next_level_at: derived.next_level_at,
    }
}
