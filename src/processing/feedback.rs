//! Human-readable recommendations built from issues and scores

use crate::config::FeedbackConfig;
use crate::processing::ats_rules::{Issue, Severity};
use crate::processing::keyword_matcher::KeywordMatchResult;
use crate::processing::resume::StructuredResume;
use crate::processing::scoring::ScoreBreakdown;
use crate::profiles::AtsProfile;

const MIN_CONTENT_CHARS: usize = 500;
const MAX_CONTENT_CHARS: usize = 5000;

/// Everything the generator reads; it never changes any of it
pub struct ReportInputs<'a> {
    pub resume: &'a StructuredResume,
    pub issues: &'a [Issue],
    pub keywords: &'a KeywordMatchResult,
    pub scores: &'a ScoreBreakdown,
    pub profile: &'a AtsProfile,
}

#[derive(Default)]
struct Tiers {
    critical: Vec<String>,
    warning: Vec<String>,
    info: Vec<String>,
}

impl Tiers {
    fn push(&mut self, severity: Severity, line: String) {
        match severity {
            Severity::Critical => self.critical.push(line),
            Severity::Warning => self.warning.push(line),
            Severity::Info => self.info.push(line),
        }
    }
}

pub struct FeedbackGenerator {
    config: FeedbackConfig,
}

impl FeedbackGenerator {
    pub fn new(config: FeedbackConfig) -> Self {
        Self { config }
    }

    pub fn generate(&self, inputs: &ReportInputs) -> Vec<String> {
        let mut feedback = vec![self.headline(inputs)];
        let mut tiers = Tiers::default();

        self.issue_lines(inputs, &mut tiers);
        self.keyword_lines(inputs, &mut tiers);
        content_length_lines(inputs.resume, &mut tiers);

        feedback.append(&mut tiers.critical);
        feedback.append(&mut tiers.warning);
        feedback.append(&mut tiers.info);

        if let Some(notes) = &inputs.profile.special_notes {
            feedback.push(format!("{} note: {}", inputs.profile.name, notes));
        }
        feedback
    }

    fn headline(&self, inputs: &ReportInputs) -> String {
        let overall = inputs.scores.overall;
        let name = &inputs.profile.name;

        if overall >= self.config.strong_threshold {
            format!("Your resume is highly compatible with {} ({:.1}/100).", name, overall)
        } else if overall >= self.config.needs_improvement_threshold {
            format!("Your resume is moderately compatible with {} ({:.1}/100).", name, overall)
        } else {
            let (area, score) = biggest_gap(inputs);
            format!(
                "Your resume has significant compatibility issues with {} ({:.1}/100). The biggest gap is {} ({:.1}/100).",
                name, overall, area, score
            )
        }
    }

    fn issue_lines(&self, inputs: &ReportInputs, tiers: &mut Tiers) {
        let mut unlisted_fonts: Vec<&str> = Vec::new();
        let mut font_slot: Option<Severity> = None;

        for issue in inputs.issues {
            if issue.code == "font.unlisted" {
                unlisted_fonts.push(quoted_name(&issue.message));
                font_slot.get_or_insert(issue.severity);
                continue;
            }

            let line = match issue.code.as_str() {
                "formatting.bullet_points" => {
                    "Use bullet points to list achievements and responsibilities.".to_string()
                }
                "structure.missing_section" => {
                    let heading = issue
                        .affected_section
                        .as_ref()
                        .and_then(|s| s.heading.clone())
                        .unwrap_or_else(|| "required".to_string());
                    format!(
                        "Add a section headed \"{}\"; {} looks for it by name.",
                        heading, inputs.profile.name
                    )
                }
                "file_type.not_allowed" => format!(
                    "Save your resume as {} before submitting to {}.",
                    inputs.profile.allowed_file_types.join(" or ").to_uppercase(),
                    inputs.profile.name
                ),
                _ => format!("{}.", issue.message.trim_end_matches('.')),
            };
            tiers.push(issue.severity, line);
        }

        if let Some(severity) = font_slot {
            let recommended = if inputs.profile.recommended_fonts.is_empty() {
                "a standard font".to_string()
            } else {
                inputs.profile.recommended_fonts.join(", ")
            };
            tiers.push(
                severity,
                format!("Switch {} to {}.", unlisted_fonts.join(", "), recommended),
            );
        }
    }

    fn keyword_lines(&self, inputs: &ReportInputs, tiers: &mut Tiers) {
        let keywords = inputs.keywords;
        if !keywords.has_job_keywords() {
            tiers.push(
                Severity::Info,
                "No job description keywords were available; the score reflects formatting and structure only."
                    .to_string(),
            );
            return;
        }

        let missing: Vec<&str> = keywords
            .missing_by_weight()
            .into_iter()
            .filter(|k| keywords.partial_for(&k.term).is_none())
            .take(self.config.max_missing_keywords)
            .map(|k| k.term.as_str())
            .collect();
        if !missing.is_empty() {
            tiers.push(
                Severity::Warning,
                format!("Add missing job keywords where they apply: {}.", missing.join(", ")),
            );
        }

        if !keywords.partial.is_empty() {
            let pairs: Vec<String> = keywords
                .partial
                .iter()
                .map(|p| format!("{} (you wrote {})", p.job_term, p.resume_term))
                .collect();
            tiers.push(
                Severity::Info,
                format!(
                    "Some keywords only match by meaning; use the job's exact wording for {}.",
                    pairs.join(", ")
                ),
            );
        }
    }
}

fn content_length_lines(resume: &StructuredResume, tiers: &mut Tiers) {
    let chars = resume.full_text().chars().filter(|c| !c.is_whitespace()).count();
    if chars < MIN_CONTENT_CHARS {
        tiers.push(
            Severity::Warning,
            "Resume content is too brief; describe your experience and results in more detail.".to_string(),
        );
    } else if chars > MAX_CONTENT_CHARS {
        tiers.push(
            Severity::Info,
            "Resume content may be too long; keep it focused on the most relevant experience.".to_string(),
        );
    }
}

/// Lowest weighted sub-score; keywords only count when a job description was given
fn biggest_gap(inputs: &ReportInputs) -> (&'static str, f64) {
    let scores = inputs.scores;
    let mut areas = vec![
        ("formatting", scores.formatting_score),
        ("section structure", scores.structure_score),
        ("file type", scores.filetype_score),
    ];
    if inputs.keywords.has_job_keywords() {
        areas.insert(0, ("keyword match", scores.keyword_score));
    }

    areas
        .into_iter()
        .fold(("formatting", f64::MAX), |lowest, area| if area.1 < lowest.1 { area } else { lowest })
}

/// Font name between the first pair of single quotes of a message
fn quoted_name(message: &str) -> &str {
    message
        .split('\'')
        .nth(1)
        .unwrap_or(message)
}
