pub(crate) fn normalize_token(value: &str) -> String {
    let cleaned = value.replace(['\u{feff}', '\u{200b}'], "");
    let collapsed = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed.to_ascii_lowercase()
}

/// Split a multi-select cell. Legacy exports used `;`, a few hand-edited files used `|`.
pub(crate) fn split_list(value: &str) -> Vec<String> {
    value
        .split([';', '|'])
        .map(normalize_token)
        .filter(|token| !token.is_empty())
        .collect()
}
