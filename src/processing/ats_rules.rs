//! ATS compatibility rules
//!
//! Compares the extracted document against one platform profile and reports
//! issues ordered critical, then warning, then info. Within a tier issues
//! keep the order they were found in.

use crate::input::{FileType, FormatMetadata};
use crate::processing::resume::{SectionKind, SectionRef, StructuredResume};
use crate::profiles::{AtsProfile, PreferredFormat};
use log::debug;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Script, handwriting and display faces that parsers tend to mangle
const DECORATIVE_FONTS: &[&str] = &[
    "comic sans",
    "brush script",
    "papyrus",
    "lobster",
    "pacifico",
    "curlz",
    "jokerman",
    "chiller",
    "harrington",
    "edwardian script",
    "vivaldi",
    "kunstler script",
    "lucida handwriting",
    "segoe script",
    "bradley hand",
    "snell roundhand",
    "zapfino",
    "impact",
    "old english",
    "dancing script",
    "great vibes",
];

const STYLE_SUFFIXES: &[&str] = &[
    "psmt", "mt", "ps", "bold", "italic", "oblique", "regular", "light", "medium", "semibold",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    Warning,
    Info,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    pub code: String,
    pub severity: Severity,
    pub message: String,
    pub affected_section: Option<SectionRef>,
}

impl Issue {
    fn new(code: impl Into<String>, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            severity,
            message: message.into(),
            affected_section: None,
        }
    }

    fn in_section(mut self, section: SectionRef) -> Self {
        self.affected_section = Some(section);
        self
    }
}

/// Stateless evaluator of profile rules
#[derive(Debug, Clone, Default)]
pub struct AtsRuleEngine;

impl AtsRuleEngine {
    pub fn new() -> Self {
        Self
    }

    pub fn evaluate(
        &self,
        resume: &StructuredResume,
        metadata: &FormatMetadata,
        profile: &AtsProfile,
        file_type: &FileType,
    ) -> Vec<Issue> {
        let mut issues = Vec::new();

        self.check_formatting(metadata, profile, &mut issues);
        self.check_sections(resume, profile, &mut issues);
        self.check_file_type(file_type, profile, &mut issues);
        self.check_fonts(metadata, profile, &mut issues);

        // sort_by_key is stable, so discovery order survives within a tier
        issues.sort_by_key(|issue| issue.severity);

        debug!(
            "Profile {} produced {} issues ({} critical)",
            profile.key,
            issues.len(),
            issues.iter().filter(|i| i.severity == Severity::Critical).count()
        );
        issues
    }

    fn check_formatting(&self, metadata: &FormatMetadata, profile: &AtsProfile, issues: &mut Vec<Issue>) {
        for (rule, allowed) in &profile.formatting_preferences {
            let present = match rule.as_str() {
                "tables" => metadata.has_tables,
                "images" => metadata.has_images,
                "columns" => metadata.has_columns,
                "headers_footers" => metadata.has_headers_footers,
                "bullet_points" => metadata.has_bullet_points,
                "fancy_fonts" => metadata.font_names.iter().any(|f| is_decorative_font(f)),
                other => {
                    debug!("Skipping unknown formatting rule '{}' in profile {}", other, profile.key);
                    continue;
                }
            };

            match (*allowed, present) {
                (false, true) => issues.push(Issue::new(
                    format!("formatting.{}", rule),
                    Severity::Critical,
                    format!("{} does not handle {}", profile.name, describe_rule(rule)),
                )),
                (true, false) if rule == "bullet_points" => issues.push(Issue::new(
                    "formatting.bullet_points",
                    Severity::Warning,
                    "No bullet points found; list achievements as bullets",
                )),
                _ => {}
            }
        }
    }

    fn check_sections(&self, resume: &StructuredResume, profile: &AtsProfile, issues: &mut Vec<Issue>) {
        for required in &profile.required_sections {
            if required.is_present(resume) {
                continue;
            }
            issues.push(
                Issue::new(
                    "structure.missing_section",
                    Severity::Warning,
                    format!("Missing required section: {}", required.heading),
                )
                .in_section(SectionRef {
                    kind: required.kind.unwrap_or(SectionKind::Other),
                    heading: Some(required.heading.clone()),
                }),
            );
        }

        if profile.preferred_format == PreferredFormat::Chronological {
            if let (Some(skills), Some(experience)) = (
                resume.first_index_of(SectionKind::Skills),
                resume.first_index_of(SectionKind::Experience),
            ) {
                if skills < experience {
                    issues.push(
                        Issue::new(
                            "structure.section_order",
                            Severity::Info,
                            format!(
                                "{} prefers a chronological layout; place Experience before Skills",
                                profile.name
                            ),
                        )
                        .in_section(resume.sections[skills].to_ref()),
                    );
                }
            }
        }
    }

    fn check_file_type(&self, file_type: &FileType, profile: &AtsProfile, issues: &mut Vec<Issue>) {
        if profile.allowed_file_types.is_empty() {
            return;
        }
        if !profile.allowed_file_types.iter().any(|f| file_type.matches_format(f)) {
            issues.push(Issue::new(
                "file_type.not_allowed",
                Severity::Critical,
                format!(
                    "{} files are not accepted by {} (use {})",
                    file_type,
                    profile.name,
                    profile.allowed_file_types.join(", ")
                ),
            ));
        }
    }

    fn check_fonts(&self, metadata: &FormatMetadata, profile: &AtsProfile, issues: &mut Vec<Issue>) {
        if profile.recommended_fonts.is_empty() {
            return;
        }
        let recommended: Vec<String> = profile.recommended_fonts.iter().map(|f| font_family(f)).collect();

        for font in &metadata.font_names {
            let family = font_family(font);
            if family.is_empty() {
                continue;
            }
            if !recommended.iter().any(|r| family == *r || family.starts_with(r.as_str())) {
                issues.push(Issue::new(
                    "font.unlisted",
                    Severity::Info,
                    format!("Font '{}' is not among the fonts {} recommends", font, profile.name),
                ));
            }
        }
    }
}

fn describe_rule(rule: &str) -> &str {
    match rule {
        "tables" => "tables; move table content into plain lines",
        "images" => "images; remove photos, logos and icons",
        "columns" => "multi-column layouts; use a single column",
        "headers_footers" => "content in headers or footers; move it into the body",
        "fancy_fonts" => "decorative fonts; switch to a standard font",
        other => other,
    }
}

/// Lowercased family name without style suffixes, e.g. "TimesNewRomanPS-BoldMT" -> "timesnewroman"
pub fn font_family(font: &str) -> String {
    let base = font.split([',', '-']).next().unwrap_or(font);
    let mut family: String = base
        .chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect();

    loop {
        let before = family.len();
        for suffix in STYLE_SUFFIXES {
            if family.len() > suffix.len() && family.ends_with(suffix) {
                family.truncate(family.len() - suffix.len());
            }
        }
        if family.len() == before {
            break;
        }
    }
    family
}

pub fn is_decorative_font(font: &str) -> bool {
    let family = font_family(font);
    DECORATIVE_FONTS
        .iter()
        .any(|d| family.contains(&d.replace(' ', "")))
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Critical => write!(f, "critical"),
            Severity::Warning => write!(f, "warning"),
            Severity::Info => write!(f, "info"),
        }
    }
}
