use std::collections::BTreeSet;

use super::super::domain::AssessmentRecord;
use super::super::rules::{RuleCategory, RuleTable};
use super::ScoreBreakdown;

pub(crate) fn breakdown(record: &AssessmentRecord, rules: &RuleTable) -> ScoreBreakdown {
    let internal_experience = single(
        rules,
        RuleCategory::InternalExperience,
        &record.internal_experience,
    );
    let external_experience = single(
        rules,
        RuleCategory::ExternalExperience,
        &record.external_experience,
    );
    let multiplier = rules.multiplier_for(record.certification_tier.as_deref());

    ScoreBreakdown {
        internal_experience,
        external_experience,
        multiplier,
        experience: experience_points(internal_experience, external_experience, multiplier),
        education: multi(rules, RuleCategory::Education, &record.education),
        extra_courses: multi(rules, RuleCategory::ExtraCourses, &record.extra_courses),
        subjective: record.subjective_score,
    }
}

/// Rounds once after summing; rounding each term first changes odd totals under 1.5x.
pub(crate) fn experience_points(internal: i32, external: i32, multiplier: f64) -> i32 {
    let raw = (f64::from(internal) + f64::from(external)) * multiplier;
    // Half-up to match the stored totals; `as` saturates on out-of-range floats.
    (raw + 0.5).floor() as i32
}

fn single(rules: &RuleTable, category: RuleCategory, key: &Option<String>) -> i32 {
    key.as_deref()
        .map(|key| rules.points(category, key))
        .unwrap_or(0)
}

fn multi(rules: &RuleTable, category: RuleCategory, keys: &BTreeSet<String>) -> i32 {
    keys.iter()
        .map(|key| rules.points(category, key))
        .fold(0, i32::saturating_add)
}
