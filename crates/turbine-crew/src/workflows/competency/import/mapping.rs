use super::super::rules::{RuleCategory, RuleTable};
use super::normalizer::normalize_token;

/// Resolve a legacy cell to a rule key, accepting either the key or the display label.
///
/// Tokens the table does not recognise are kept as-is so they score zero and still show up
/// in change descriptions.
pub(crate) fn resolve_option(rules: &RuleTable, category: RuleCategory, token: &str) -> String {
    rules
        .bands(category)
        .iter()
        .find(|rule| normalize_token(&rule.key) == token || normalize_token(&rule.label) == token)
        .map(|rule| rule.key.clone())
        .unwrap_or_else(|| token.to_string())
}

pub(crate) fn resolve_tier(rules: &RuleTable, token: &str) -> String {
    rules
        .tiers
        .iter()
        .find(|rule| normalize_token(&rule.key) == token || normalize_token(&rule.label) == token)
        .map(|rule| rule.key.clone())
        .unwrap_or_else(|| token.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_labels_and_keys() {
        let rules = RuleTable::standard();
        assert_eq!(
            resolve_option(&rules, RuleCategory::Education, "electrical apprenticeship"),
            "electrical"
        );
        assert_eq!(
            resolve_option(&rules, RuleCategory::ExtraCourses, "hv_switching"),
            "hv_switching"
        );
        assert_eq!(resolve_tier(&rules, "senior technician"), "senior_technician");
    }

    #[test]
    fn keeps_unknown_tokens() {
        let rules = RuleTable::standard();
        assert_eq!(
            resolve_option(&rules, RuleCategory::Education, "welding"),
            "welding"
        );
    }
}
