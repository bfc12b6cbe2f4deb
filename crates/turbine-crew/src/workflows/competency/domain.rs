use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::scoring::ScoreResult;

/// Identifier wrapper for technicians managed by the roster.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TechnicianId(pub String);

impl fmt::Display for TechnicianId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TechnicianId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Competency assessment inputs captured for a single technician.
///
/// Every selection refers to a key of the active rule table. Keys the table does not know
/// score zero points, so records written against older tables stay loadable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssessmentRecord {
    #[serde(default)]
    pub technician_id: TechnicianId,
    #[serde(default)]
    pub certification_tier: Option<String>,
    #[serde(default)]
    pub internal_experience: Option<String>,
    #[serde(default)]
    pub external_experience: Option<String>,
    #[serde(default)]
    pub education: BTreeSet<String>,
    #[serde(default)]
    pub extra_courses: BTreeSet<String>,
    #[serde(default)]
    pub subjective_score: i32,
}

impl AssessmentRecord {
    /// Blank record used for a technician's first assessment.
    pub fn empty(technician_id: TechnicianId) -> Self {
        Self {
            technician_id,
            ..Self::default()
        }
    }

    pub fn apply(&mut self, edit: FieldEdit) {
        match edit {
            FieldEdit::CertificationTier(tier) => self.certification_tier = tier,
            FieldEdit::InternalExperience(key) => self.internal_experience = key,
            FieldEdit::ExternalExperience(key) => self.external_experience = key,
            FieldEdit::Education(keys) => self.education = keys,
            FieldEdit::AddEducation(key) => {
                self.education.insert(key);
            }
            FieldEdit::RemoveEducation(key) => {
                self.education.remove(&key);
            }
            FieldEdit::ExtraCourses(keys) => self.extra_courses = keys,
            FieldEdit::AddExtraCourse(key) => {
                self.extra_courses.insert(key);
            }
            FieldEdit::RemoveExtraCourse(key) => {
                self.extra_courses.remove(&key);
            }
            FieldEdit::SubjectiveScore(score) => self.subjective_score = score,
        }
    }

    /// True when every tracked field matches. The technician id is not a tracked field.
    pub fn same_assessment(&self, other: &Self) -> bool {
        self.certification_tier == other.certification_tier
            && self.internal_experience == other.internal_experience
            && self.external_experience == other.external_experience
            && self.education == other.education
            && self.extra_courses == other.extra_courses
            && self.subjective_score == other.subjective_score
    }
}

/// A single field-level edit raised by the roster UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "field", content = "value", rename_all = "snake_case")]
pub enum FieldEdit {
    CertificationTier(Option<String>),
    InternalExperience(Option<String>),
    ExternalExperience(Option<String>),
    Education(BTreeSet<String>),
    AddEducation(String),
    RemoveEducation(String),
    ExtraCourses(BTreeSet<String>),
    AddExtraCourse(String),
    RemoveExtraCourse(String),
    SubjectiveScore(i32),
}

/// A record paired with the score it produced at capture time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub record: AssessmentRecord,
    pub score: ScoreResult,
}
