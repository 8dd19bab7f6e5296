//! The analysis report handed to formatters and callers

use crate::input::{FileType, FormatMetadata};
use crate::processing::ats_rules::{Issue, Severity};
use crate::processing::capabilities::DegradedCapability;
use crate::processing::keyword_matcher::KeywordMatchResult;
use crate::processing::resume::StructuredResume;
use crate::processing::scoring::ScoreBreakdown;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Created once per (resume, job description, profile) run and never mutated
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub resume: StructuredResume,

    /// Layout signals and fonts detected during extraction
    pub extracted_metadata: FormatMetadata,

    /// Critical first, then warning, then info
    pub issues: Vec<Issue>,

    pub scores: ScoreBreakdown,
    pub keywords: KeywordMatchResult,

    /// Prioritised recommendations, headline first
    pub feedback: Vec<String>,

    pub metadata: ReportMetadata,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportMetadata {
    pub profile_key: String,
    pub profile_name: String,
    pub source_name: String,
    pub file_type: FileType,

    /// Not part of the analysis outcome; differs between identical runs
    pub generated_at: DateTime<Utc>,
    pub processing_time_ms: u64,

    /// Optional capabilities that were unavailable for this run
    pub degraded: Vec<DegradedCapability>,
    pub notes: Vec<String>,
    pub tool_version: String,
}

impl AnalysisReport {
    pub fn issues_with(&self, severity: Severity) -> impl Iterator<Item = &Issue> {
        self.issues.iter().filter(move |i| i.severity == severity)
    }

    pub fn critical_count(&self) -> usize {
        self.issues_with(Severity::Critical).count()
    }

    pub fn is_degraded(&self) -> bool {
        !self.metadata.degraded.is_empty()
    }

    /// Equality ignoring generation time and duration
    pub fn same_outcome(&self, other: &AnalysisReport) -> bool {
        let strip = |report: &AnalysisReport| {
            let mut metadata = report.metadata.clone();
            metadata.generated_at = DateTime::<Utc>::default();
            metadata.processing_time_ms = 0;
            metadata
        };

        self.resume == other.resume
            && self.extracted_metadata == other.extracted_metadata
            && self.issues == other.issues
            && self.scores == other.scores
            && self.keywords == other.keywords
            && self.feedback == other.feedback
            && strip(self) == strip(other)
    }
}

impl ReportMetadata {
    pub fn tool_version() -> String {
        env!("CARGO_PKG_VERSION").to_string()
    }
}
