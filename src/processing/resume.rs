//! Structured resume produced by the entity extractor

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SectionKind {
    Contact,
    Summary,
    Experience,
    Education,
    Skills,
    Projects,
    Other,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub kind: SectionKind,
    /// Heading line as written in the source, `None` for implicit sections
    pub heading: Option<String>,
    pub raw_text: String,
    pub entities: BTreeMap<String, Vec<String>>,
}

/// Sections in source order. Absent sections are simply not listed.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StructuredResume {
    pub sections: Vec<Section>,
}

/// Reference to a section used by issues
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionRef {
    pub kind: SectionKind,
    pub heading: Option<String>,
}

impl Section {
    pub fn new(kind: SectionKind, heading: Option<String>, raw_text: String) -> Self {
        Self {
            kind,
            heading,
            raw_text,
            entities: BTreeMap::new(),
        }
    }

    pub fn entity(&self, field: &str) -> &[String] {
        self.entities.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn to_ref(&self) -> SectionRef {
        SectionRef {
            kind: self.kind,
            heading: self.heading.clone(),
        }
    }
}

impl StructuredResume {
    pub fn has(&self, kind: SectionKind) -> bool {
        self.sections.iter().any(|s| s.kind == kind)
    }

    /// Whether an `Other` section carries the given heading text
    pub fn has_other_heading(&self, heading: &str) -> bool {
        self.sections.iter().any(|s| {
            s.kind == SectionKind::Other
                && s
                    .heading
                    .as_deref()
                    .map(|h| h.trim().trim_end_matches(':').eq_ignore_ascii_case(heading.trim()))
                    .unwrap_or(false)
        })
    }

    pub fn sections_of(&self, kind: SectionKind) -> impl Iterator<Item = &Section> {
        self.sections.iter().filter(move |s| s.kind == kind)
    }

    pub fn first_index_of(&self, kind: SectionKind) -> Option<usize> {
        self.sections.iter().position(|s| s.kind == kind)
    }

    /// Concatenated raw text of every section of the given kinds
    pub fn text_of(&self, kinds: &[SectionKind]) -> String {
        self.sections
            .iter()
            .filter(|s| kinds.contains(&s.kind))
            .map(|s| s.raw_text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn full_text(&self) -> String {
        self.sections
            .iter()
            .map(|s| s.raw_text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn kinds(&self) -> Vec<SectionKind> {
        self.sections.iter().map(|s| s.kind).collect()
    }
}

impl std::fmt::Display for SectionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SectionKind::Contact => write!(f, "Contact"),
            SectionKind::Summary => write!(f, "Summary"),
            SectionKind::Experience => write!(f, "Experience"),
            SectionKind::Education => write!(f, "Education"),
            SectionKind::Skills => write!(f, "Skills"),
            SectionKind::Projects => write!(f, "Projects"),
            SectionKind::Other => write!(f, "Other"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> StructuredResume {
        StructuredResume {
            sections: vec![
                Section::new(SectionKind::Contact, None, "Jane Doe".to_string()),
                Section::new(SectionKind::Skills, Some("Skills".to_string()), "Rust, SQL".to_string()),
                Section::new(
                    SectionKind::Other,
                    Some("Certifications:".to_string()),
                    "AWS Certified".to_string(),
                ),
            ],
        }
    }

    #[test]
    fn test_section_lookup() {
        let resume = sample();
        assert!(resume.has(SectionKind::Skills));
        assert!(!resume.has(SectionKind::Experience));
        assert_eq!(resume.first_index_of(SectionKind::Skills), Some(1));
        assert!(resume.has_other_heading("certifications"));
    }

    #[test]
    fn test_text_of_kinds() {
        let resume = sample();
        assert_eq!(resume.text_of(&[SectionKind::Skills]), "Rust, SQL");
        assert!(resume.full_text().contains("Jane Doe"));
    }
}
