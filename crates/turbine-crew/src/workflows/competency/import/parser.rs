use serde::{Deserialize, Deserializer};
use std::io::Read;

use super::normalizer::{normalize_token, split_list};

/// One row of a legacy assessment export, with cells normalised but not yet resolved.
#[derive(Debug)]
pub(crate) struct LegacyRow {
    pub(crate) line: usize,
    pub(crate) technician_id: String,
    pub(crate) tier: Option<String>,
    pub(crate) internal_experience: Option<String>,
    pub(crate) external_experience: Option<String>,
    pub(crate) education: Vec<String>,
    pub(crate) extra_courses: Vec<String>,
    pub(crate) subjective: Option<String>,
    pub(crate) recorded_total: Option<String>,
    pub(crate) recorded_level: Option<String>,
}

pub(crate) fn parse_rows<R: Read>(reader: R) -> Result<Vec<LegacyRow>, csv::Error> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let headers = csv_reader.headers()?.clone();
    let mut rows = Vec::new();

    for (index, record) in csv_reader.records().enumerate() {
        let record = record?;
        // Line where the record starts; quoted cells may span several lines.
        let line = record
            .position()
            .map(|position| position.line() as usize)
            .unwrap_or(index + 2);
        let raw: RawRow = record.deserialize(Some(&headers))?;
        rows.push(LegacyRow {
            line,
            technician_id: raw.technician_id.trim().to_string(),
            tier: raw.tier.as_deref().map(normalize_token),
            internal_experience: raw.internal_experience.as_deref().map(normalize_token),
            external_experience: raw.external_experience.as_deref().map(normalize_token),
            education: raw.education.as_deref().map(split_list).unwrap_or_default(),
            extra_courses: raw.extra_courses.as_deref().map(split_list).unwrap_or_default(),
            subjective: raw.subjective,
            recorded_total: raw.recorded_total,
            recorded_level: raw.recorded_level,
        });
    }

    Ok(rows)
}

#[derive(Debug, Deserialize)]
struct RawRow {
    #[serde(rename = "Technician ID", alias = "\u{feff}Technician ID")]
    technician_id: String,
    #[serde(
        rename = "Certification Tier",
        default,
        deserialize_with = "empty_string_as_none"
    )]
    tier: Option<String>,
    #[serde(
        rename = "Internal Experience",
        default,
        deserialize_with = "empty_string_as_none"
    )]
    internal_experience: Option<String>,
    #[serde(
        rename = "External Experience",
        default,
        deserialize_with = "empty_string_as_none"
    )]
    external_experience: Option<String>,
    #[serde(rename = "Education", default, deserialize_with = "empty_string_as_none")]
    education: Option<String>,
    #[serde(
        rename = "Extra Courses",
        default,
        deserialize_with = "empty_string_as_none"
    )]
    extra_courses: Option<String>,
    #[serde(
        rename = "Subjective Score",
        default,
        deserialize_with = "empty_string_as_none"
    )]
    subjective: Option<String>,
    #[serde(
        rename = "Total Points",
        default,
        deserialize_with = "empty_string_as_none"
    )]
    recorded_total: Option<String>,
    #[serde(rename = "Level", default, deserialize_with = "empty_string_as_none")]
    recorded_level: Option<String>,
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}
