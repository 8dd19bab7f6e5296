//! ATS platform profiles
//!
//! The profile table is parsed once from JSON into typed records and shared
//! read-only (behind an `Arc`) by every analysis run.

use crate::error::{AtsCheckerError, Result};
use crate::processing::heading_classifier::{lookup_kind, normalize_heading};
use crate::processing::resume::{SectionKind, StructuredResume};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

const BUILTIN_PROFILES: &str = include_str!("../config/ats_platforms.json");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PreferredFormat {
    Chronological,
    Hybrid,
    Functional,
}

/// `keywords_importance` is either a level name or a literal weight
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
enum KeywordImportance {
    Weight(f64),
    Level(String),
}

#[derive(Debug, Deserialize)]
struct RawProfile {
    name: String,
    #[serde(default)]
    description: String,
    parsing_rules: RawRules,
}

#[derive(Debug, Deserialize)]
struct RawRules {
    preferred_format: PreferredFormat,
    #[serde(default)]
    section_headings: Vec<String>,
    keywords_importance: KeywordImportance,
    #[serde(default)]
    formatting_preferences: BTreeMap<String, bool>,
    #[serde(default)]
    file_preferences: Vec<String>,
    #[serde(default)]
    recommended_fonts: Vec<String>,
    #[serde(default)]
    special_notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RequiredSection {
    pub heading: String,
    /// `None` when the heading is not in the synonym lexicon
    pub kind: Option<SectionKind>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AtsProfile {
    pub key: String,
    pub name: String,
    pub description: String,
    pub preferred_format: PreferredFormat,
    pub required_sections: Vec<RequiredSection>,
    pub keyword_importance_weight: f64,
    pub formatting_preferences: BTreeMap<String, bool>,
    pub allowed_file_types: Vec<String>,
    pub recommended_fonts: Vec<String>,
    pub special_notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProfileTable {
    profiles: BTreeMap<String, AtsProfile>,
}

impl KeywordImportance {
    fn weight(&self, key: &str) -> Result<f64> {
        let weight = match self {
            KeywordImportance::Weight(w) => *w,
            KeywordImportance::Level(level) => match level.to_lowercase().as_str() {
                "high" => 0.5,
                "medium" => 0.4,
                "low" => 0.3,
                other => {
                    return Err(AtsCheckerError::Configuration(format!(
                        "Profile '{}' has unknown keywords_importance '{}'",
                        key, other
                    )))
                }
            },
        };

        if !(0.0..=1.0).contains(&weight) {
            return Err(AtsCheckerError::Configuration(format!(
                "Profile '{}' keywords_importance {} is outside [0, 1]",
                key, weight
            )));
        }
        Ok(weight)
    }
}

impl RequiredSection {
    fn new(heading: &str) -> Self {
        Self {
            heading: heading.trim().to_string(),
            kind: lookup_kind(heading),
        }
    }

    pub fn is_present(&self, resume: &StructuredResume) -> bool {
        match self.kind {
            Some(kind) if kind != SectionKind::Other => resume.has(kind),
            _ => {
                let wanted = normalize_heading(&self.heading);
                resume
                    .sections
                    .iter()
                    .filter_map(|s| s.heading.as_deref())
                    .any(|h| normalize_heading(h) == wanted)
            }
        }
    }
}

impl AtsProfile {
    fn from_raw(key: &str, raw: RawProfile) -> Result<Self> {
        let rules = raw.parsing_rules;

        let mut required_sections: Vec<RequiredSection> = Vec::new();
        for heading in &rules.section_headings {
            let section = RequiredSection::new(heading);
            if !required_sections
                .iter()
                .any(|s| normalize_heading(&s.heading) == normalize_heading(&section.heading))
            {
                required_sections.push(section);
            }
        }

        Ok(Self {
            key: key.to_string(),
            name: raw.name,
            description: raw.description,
            preferred_format: rules.preferred_format,
            required_sections,
            keyword_importance_weight: rules.keywords_importance.weight(key)?,
            formatting_preferences: rules.formatting_preferences,
            allowed_file_types: rules.file_preferences.iter().map(|f| f.to_lowercase()).collect(),
            recommended_fonts: rules.recommended_fonts,
            special_notes: rules.special_notes.filter(|n| !n.trim().is_empty()),
        })
    }
}

impl ProfileTable {
    /// The table shipped with the binary
    pub fn builtin() -> Result<Self> {
        Self::from_json_str(BUILTIN_PROFILES)
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let raw: BTreeMap<String, RawProfile> = serde_json::from_str(json)
            .map_err(|e| AtsCheckerError::Configuration(format!("Invalid ATS profile table: {}", e)))?;

        let mut profiles = BTreeMap::new();
        for (key, profile) in raw {
            let key = key.to_lowercase();
            let profile = AtsProfile::from_raw(&key, profile)?;
            profiles.insert(key, profile);
        }

        if profiles.is_empty() {
            return Err(AtsCheckerError::Configuration(
                "ATS profile table is empty".to_string(),
            ));
        }
        Ok(Self { profiles })
    }

    /// A user file replaces the built-in table entirely
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => {
                let content = std::fs::read_to_string(path).map_err(|e| {
                    AtsCheckerError::Configuration(format!(
                        "Failed to read profile table {}: {}",
                        path.display(),
                        e
                    ))
                })?;
                Self::from_json_str(&content)
            }
            None => Self::builtin(),
        }
    }

    pub fn get(&self, key: &str) -> Result<&AtsProfile> {
        self.profiles.get(&key.trim().to_lowercase()).ok_or_else(|| {
            AtsCheckerError::InvalidProfile(format!(
                "'{}' (available: {})",
                key,
                self.keys().join(", ")
            ))
        })
    }

    pub fn keys(&self) -> Vec<&str> {
        self.profiles.keys().map(String::as_str).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &AtsProfile> {
        self.profiles.values()
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

impl fmt::Display for PreferredFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PreferredFormat::Chronological => write!(f, "chronological"),
            PreferredFormat::Hybrid => write!(f, "hybrid"),
            PreferredFormat::Functional => write!(f, "functional"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processing::resume::Section;

    #[test]
    fn test_builtin_table_has_all_platforms() {
        let table = ProfileTable::builtin().unwrap();
        for key in ["taleo", "greenhouse", "workday", "lever", "icims", "jobvite"] {
            assert!(table.get(key).is_ok(), "missing {}", key);
        }
    }

    #[test]
    fn test_taleo_profile() {
        let table = ProfileTable::builtin().unwrap();
        let taleo = table.get("Taleo").unwrap();

        assert_eq!(taleo.preferred_format, PreferredFormat::Chronological);
        assert_eq!(taleo.keyword_importance_weight, 0.5);
        assert_eq!(taleo.formatting_preferences.get("tables"), Some(&false));
        assert_eq!(taleo.formatting_preferences.get("bullet_points"), Some(&true));
        assert!(taleo.allowed_file_types.contains(&"pdf".to_string()));

        let kinds: Vec<Option<SectionKind>> = taleo.required_sections.iter().map(|s| s.kind).collect();
        assert_eq!(
            kinds,
            vec![
                Some(SectionKind::Experience),
                Some(SectionKind::Education),
                Some(SectionKind::Skills)
            ]
        );
    }

    #[test]
    fn test_numeric_keyword_importance() {
        let table = ProfileTable::builtin().unwrap();
        assert_eq!(table.get("icims").unwrap().keyword_importance_weight, 0.45);
        assert_eq!(table.get("jobvite").unwrap().keyword_importance_weight, 0.3);
    }

    #[test]
    fn test_unknown_key_is_invalid_profile() {
        let table = ProfileTable::builtin().unwrap();
        assert!(matches!(
            table.get("bamboohr"),
            Err(AtsCheckerError::InvalidProfile(_))
        ));
    }

    #[test]
    fn test_rejects_bad_importance() {
        let json = r#"{"x": {"name": "X", "parsing_rules": {"preferred_format": "hybrid", "keywords_importance": "extreme"}}}"#;
        assert!(matches!(
            ProfileTable::from_json_str(json),
            Err(AtsCheckerError::Configuration(_))
        ));

        let json = r#"{"x": {"name": "X", "parsing_rules": {"preferred_format": "hybrid", "keywords_importance": 1.5}}}"#;
        assert!(ProfileTable::from_json_str(json).is_err());
    }

    #[test]
    fn test_required_section_presence() {
        let json = r#"{"custom": {"name": "Custom", "parsing_rules": {
            "preferred_format": "hybrid",
            "section_headings": ["Work History", "Certifications", "Volunteer Work"],
            "keywords_importance": "low"}}}"#;
        let table = ProfileTable::from_json_str(json).unwrap();
        let profile = table.get("custom").unwrap();

        let resume = StructuredResume {
            sections: vec![
                Section::new(SectionKind::Experience, Some("Experience".to_string()), String::new()),
                Section::new(SectionKind::Other, Some("CERTIFICATIONS".to_string()), String::new()),
            ],
        };

        let present: Vec<bool> = profile.required_sections.iter().map(|s| s.is_present(&resume)).collect();
        assert_eq!(present, vec![true, true, false]);
    }
}
