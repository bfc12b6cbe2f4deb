use std::collections::BTreeSet;

use super::domain::Snapshot;
use super::rules::{RuleCategory, RuleTable};

const NONE_LABEL: &str = "None";

/// Describe every tracked difference between two snapshots.
///
/// Lines come out in a fixed order: tier, internal experience, external experience, education
/// added/removed, extra courses added/removed, subjective score, total points. Keys are shown
/// by their rule-table label when the table still knows them. The level is never reported on
/// its own line.
pub fn detect_changes(previous: &Snapshot, next: &Snapshot, rules: &RuleTable) -> Vec<String> {
    let before = &previous.record;
    let after = &next.record;
    let mut changes = Vec::new();

    if before.certification_tier != after.certification_tier {
        changes.push(format!(
            "Certification Tier: {} → {}",
            tier_label(rules, before.certification_tier.as_deref()),
            tier_label(rules, after.certification_tier.as_deref()),
        ));
    }

    single_change(
        &mut changes,
        rules,
        RuleCategory::InternalExperience,
        before.internal_experience.as_deref(),
        after.internal_experience.as_deref(),
    );
    single_change(
        &mut changes,
        rules,
        RuleCategory::ExternalExperience,
        before.external_experience.as_deref(),
        after.external_experience.as_deref(),
    );
    set_changes(
        &mut changes,
        rules,
        RuleCategory::Education,
        &before.education,
        &after.education,
    );
    set_changes(
        &mut changes,
        rules,
        RuleCategory::ExtraCourses,
        &before.extra_courses,
        &after.extra_courses,
    );

    if before.subjective_score != after.subjective_score {
        changes.push(format!(
            "Subjective Score: {} → {}",
            before.subjective_score, after.subjective_score
        ));
    }

    if previous.score.total_points != next.score.total_points {
        changes.push(format!(
            "Total Points: {} → {}",
            previous.score.total_points, next.score.total_points
        ));
    }

    changes
}

fn tier_label<'a>(rules: &'a RuleTable, key: Option<&'a str>) -> &'a str {
    key.map(|key| rules.tier_label(key)).unwrap_or(NONE_LABEL)
}

fn single_change(
    changes: &mut Vec<String>,
    rules: &RuleTable,
    category: RuleCategory,
    before: Option<&str>,
    after: Option<&str>,
) {
    if before == after {
        return;
    }

    let describe = |key: Option<&str>| {
        key.map(|key| rules.label(category, key).to_string())
            .unwrap_or_else(|| NONE_LABEL.to_string())
    };

    changes.push(format!(
        "{}: {} → {}",
        category.label(),
        describe(before),
        describe(after)
    ));
}

fn set_changes(
    changes: &mut Vec<String>,
    rules: &RuleTable,
    category: RuleCategory,
    before: &BTreeSet<String>,
    after: &BTreeSet<String>,
) {
    for added in after.difference(before) {
        changes.push(format!(
            "{} Added: {}",
            category.label(),
            rules.label(category, added)
        ));
    }
    for removed in before.difference(after) {
        changes.push(format!(
            "{} Removed: {}",
            category.label(),
            rules.label(category, removed)
        ));
    }
}
