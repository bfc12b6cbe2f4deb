use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// Point-valued option inside a single- or multi-select category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BandRule {
    pub key: String,
    pub label: String,
    pub points: i32,
}

/// Certification tier and the experience multiplier it unlocks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierRule {
    pub key: String,
    pub label: String,
    pub multiplier: f64,
}

/// Lower bound of a competency level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelBand {
    pub min_points: i32,
    pub level: u8,
    pub label: String,
}

/// Selectable categories of the assessment form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleCategory {
    InternalExperience,
    ExternalExperience,
    Education,
    ExtraCourses,
}

impl RuleCategory {
    pub const fn ordered() -> [Self; 4] {
        [
            Self::InternalExperience,
            Self::ExternalExperience,
            Self::Education,
            Self::ExtraCourses,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::InternalExperience => "Internal Experience",
            Self::ExternalExperience => "External Experience",
            Self::Education => "Education",
            Self::ExtraCourses => "Extra Course",
        }
    }
}

/// Versioned scoring configuration. Immutable once handed to the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleTable {
    pub version: String,
    pub tiers: Vec<TierRule>,
    pub internal_experience: Vec<BandRule>,
    pub external_experience: Vec<BandRule>,
    pub education: Vec<BandRule>,
    pub extra_courses: Vec<BandRule>,
    pub levels: Vec<LevelBand>,
    #[serde(default = "default_subjective_max")]
    pub subjective_max: i32,
}

fn default_subjective_max() -> i32 {
    5
}

impl RuleTable {
    /// Built-in table used by the service crews: five levels over 0..=163 points.
    pub fn standard() -> Self {
        Self {
            version: "standard-2024.1".to_string(),
            tiers: vec![
                tier("trainee", "Trainee", 1.0),
                tier("technician", "Technician", 1.5),
                tier("senior_technician", "Senior Technician", 2.0),
                tier("lead_technician", "Lead Technician", 2.0),
            ],
            internal_experience: vec![
                band("internal_lt_1y", "Less than 1 year", 5),
                band("internal_1_3y", "1-3 years", 10),
                band("internal_3_5y", "3-5 years", 15),
                band("internal_gt_5y", "More than 5 years", 20),
            ],
            external_experience: vec![
                band("external_lt_1y", "Less than 1 year", 2),
                band("external_1_3y", "1-3 years", 5),
                band("external_3_5y", "3-5 years", 8),
                band("external_gt_5y", "More than 5 years", 10),
            ],
            education: vec![
                band("electrical", "Electrical apprenticeship", 40),
                band("mechanical", "Mechanical apprenticeship", 30),
            ],
            extra_courses: vec![
                band("hv_switching", "High-voltage switching", 10),
                band("rope_rescue", "Advanced rope rescue", 8),
                band("hydraulics", "Hydraulic systems", 5),
                band("blade_repair", "Blade inspection and repair", 5),
            ],
            levels: vec![
                level(0, 1, "Foundation"),
                level(15, 2, "Developing"),
                level(40, 3, "Proficient"),
                level(80, 4, "Advanced"),
                level(100, 5, "Expert"),
            ],
            subjective_max: default_subjective_max(),
        }
    }

    pub fn from_json(raw: &str) -> Result<Self, RuleTableError> {
        let table: Self = serde_json::from_str(raw)?;
        table.validate()?;
        Ok(table)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, RuleTableError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    pub fn validate(&self) -> Result<(), RuleTableError> {
        if self.tiers.is_empty() {
            return Err(RuleTableError::NoTiers);
        }

        let mut tier_keys = HashSet::new();
        for rule in &self.tiers {
            if !rule.multiplier.is_finite() || rule.multiplier <= 0.0 {
                return Err(RuleTableError::InvalidMultiplier {
                    key: rule.key.clone(),
                    multiplier: rule.multiplier,
                });
            }
            if !tier_keys.insert(rule.key.as_str()) {
                return Err(RuleTableError::DuplicateKey {
                    category: "certification tiers",
                    key: rule.key.clone(),
                });
            }
        }

        for category in RuleCategory::ordered() {
            let mut keys = HashSet::new();
            for rule in self.bands(category) {
                if rule.points < 0 {
                    return Err(RuleTableError::NegativePoints {
                        key: rule.key.clone(),
                        points: rule.points,
                    });
                }
                if !keys.insert(rule.key.as_str()) {
                    return Err(RuleTableError::DuplicateKey {
                        category: category.label(),
                        key: rule.key.clone(),
                    });
                }
            }
        }

        if !self.levels.iter().any(|band| band.min_points == 0) {
            return Err(RuleTableError::MissingBaseLevel);
        }

        let mut thresholds = HashSet::new();
        for band in &self.levels {
            if !thresholds.insert(band.min_points) {
                return Err(RuleTableError::DuplicateThreshold(band.min_points));
            }
        }

        Ok(())
    }

    pub fn bands(&self, category: RuleCategory) -> &[BandRule] {
        match category {
            RuleCategory::InternalExperience => &self.internal_experience,
            RuleCategory::ExternalExperience => &self.external_experience,
            RuleCategory::Education => &self.education,
            RuleCategory::ExtraCourses => &self.extra_courses,
        }
    }

    /// Points for `key`, or zero when the table does not define it.
    pub fn points(&self, category: RuleCategory, key: &str) -> i32 {
        self.bands(category)
            .iter()
            .find(|rule| rule.key == key)
            .map(|rule| rule.points)
            .unwrap_or(0)
    }

    /// Display label for `key`, falling back to the raw key for retired options.
    pub fn label<'a>(&'a self, category: RuleCategory, key: &'a str) -> &'a str {
        self.bands(category)
            .iter()
            .find(|rule| rule.key == key)
            .map(|rule| rule.label.as_str())
            .unwrap_or(key)
    }

    pub fn tier(&self, key: &str) -> Option<&TierRule> {
        self.tiers.iter().find(|rule| rule.key == key)
    }

    pub fn tier_label<'a>(&'a self, key: &'a str) -> &'a str {
        self.tier(key).map(|rule| rule.label.as_str()).unwrap_or(key)
    }

    pub fn lowest_multiplier(&self) -> f64 {
        self.tiers
            .iter()
            .map(|rule| rule.multiplier)
            .fold(None, |lowest: Option<f64>, value| match lowest {
                Some(current) if current <= value => Some(current),
                _ => Some(value),
            })
            .unwrap_or(1.0)
    }

    pub fn highest_multiplier(&self) -> f64 {
        self.tiers
            .iter()
            .map(|rule| rule.multiplier)
            .fold(None, |highest: Option<f64>, value| match highest {
                Some(current) if current >= value => Some(current),
                _ => Some(value),
            })
            .unwrap_or(1.0)
    }

    /// Multiplier for the given tier; unset or unknown tiers get the lowest one.
    pub fn multiplier_for(&self, tier: Option<&str>) -> f64 {
        tier.and_then(|key| self.tier(key))
            .map(|rule| rule.multiplier)
            .unwrap_or_else(|| self.lowest_multiplier())
    }

    pub fn max_level(&self) -> u8 {
        self.levels.iter().map(|band| band.level).max().unwrap_or(1)
    }

    /// Theoretical ceiling reachable with every option selected and the best tier.
    /// Saturates at `i32::MAX` for tables with very large point values.
    pub fn max_points(&self) -> i32 {
        let best = |bands: &[BandRule]| bands.iter().map(|rule| rule.points).max().unwrap_or(0);
        let sum = |bands: &[BandRule]| {
            bands
                .iter()
                .map(|rule| rule.points)
                .fold(0, i32::saturating_add)
        };

        let experience = ((f64::from(best(&self.internal_experience))
            + f64::from(best(&self.external_experience)))
            * self.highest_multiplier())
        .round() as i32;

        [
            sum(&self.education),
            sum(&self.extra_courses),
            self.subjective_max,
        ]
        .into_iter()
        .fold(experience, i32::saturating_add)
    }
}

fn tier(key: &str, label: &str, multiplier: f64) -> TierRule {
    TierRule {
        key: key.to_string(),
        label: label.to_string(),
        multiplier,
    }
}

fn band(key: &str, label: &str, points: i32) -> BandRule {
    BandRule {
        key: key.to_string(),
        label: label.to_string(),
        points,
    }
}

fn level(min_points: i32, level: u8, label: &str) -> LevelBand {
    LevelBand {
        min_points,
        level,
        label: label.to_string(),
    }
}

/// Raised when a host-provided rule table cannot be used.
#[derive(Debug, thiserror::Error)]
pub enum RuleTableError {
    #[error("failed to read rule table: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid rule table JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("rule table defines no certification tiers")]
    NoTiers,
    #[error("tier '{key}' has invalid multiplier {multiplier}")]
    InvalidMultiplier { key: String, multiplier: f64 },
    #[error("option '{key}' has negative points {points}")]
    NegativePoints { key: String, points: i32 },
    #[error("duplicate key '{key}' in {category}")]
    DuplicateKey { category: &'static str, key: String },
    #[error("level bands must include a band starting at 0 points")]
    MissingBaseLevel,
    #[error("more than one level band starts at {0} points")]
    DuplicateThreshold(i32),
}
