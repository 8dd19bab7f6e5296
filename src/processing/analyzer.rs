//! Analysis pipeline tying extraction, rules, matching, scoring and feedback together

use crate::config::Config;
use crate::error::{AtsCheckerError, Result};
use crate::input::{DocumentExtractor, ExtractedText, FileType, RawDocument};
use crate::output::report::{AnalysisReport, ReportMetadata};
use crate::processing::ats_rules::AtsRuleEngine;
use crate::processing::capabilities::{Capabilities, DegradedCapability};
use crate::processing::entity_extractor::EntityExtractor;
use crate::processing::feedback::{FeedbackGenerator, ReportInputs};
use crate::processing::keyword_matcher::KeywordMatcher;
use crate::processing::scoring::ScoreAggregator;
use crate::processing::skill_lexicon::SkillLexicon;
use crate::profiles::ProfileTable;
use chrono::Utc;
use log::{info, warn};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Immutable after construction, so one instance can serve concurrent runs
pub struct AnalysisPipeline {
    profiles: Arc<ProfileTable>,
    accepted_formats: Vec<String>,
    extractor: DocumentExtractor,
    entity_extractor: EntityExtractor,
    keyword_matcher: KeywordMatcher,
    rule_engine: AtsRuleEngine,
    score_aggregator: ScoreAggregator,
    feedback_generator: FeedbackGenerator,
    degraded: Vec<DegradedCapability>,
}

impl AnalysisPipeline {
    pub fn new(config: &Config, profiles: Arc<ProfileTable>, capabilities: Capabilities) -> Result<Self> {
        config.validate()?;
        let lexicon = Arc::new(SkillLexicon::new()?);

        Ok(Self {
            profiles,
            accepted_formats: config.extraction.accepted_formats.clone(),
            extractor: DocumentExtractor::new(config.extraction.clone(), capabilities.ocr.clone()),
            entity_extractor: EntityExtractor::new(lexicon.clone())?,
            keyword_matcher: KeywordMatcher::new(lexicon, config.matching.clone(), capabilities.encoder.clone()),
            rule_engine: AtsRuleEngine::new(),
            score_aggregator: ScoreAggregator::new(config.scoring.clone()),
            feedback_generator: FeedbackGenerator::new(config.feedback.clone()),
            degraded: capabilities.degraded,
        })
    }

    pub fn profiles(&self) -> &ProfileTable {
        &self.profiles
    }

    pub fn degraded(&self) -> &[DegradedCapability] {
        &self.degraded
    }

    /// Run the whole pipeline on one document
    pub fn analyze(
        &self,
        raw: &RawDocument,
        job_description: Option<&str>,
        profile_key: &str,
    ) -> Result<AnalysisReport> {
        let start_time = Instant::now();

        // Fail fast on the cheap checks before touching the document
        self.profiles.get(profile_key)?;
        self.check_accepted(raw)?;

        info!("Extracting {}", raw.source_name());
        let extracted = self.extractor.extract(raw)?;

        self.build_report(
            extracted,
            raw.file_type(),
            raw.source_name(),
            job_description,
            profile_key,
            start_time,
        )
    }

    /// Analyse text that was already extracted elsewhere
    pub fn analyze_extracted(
        &self,
        extracted: ExtractedText,
        file_type: &FileType,
        source_name: &str,
        job_description: Option<&str>,
        profile_key: &str,
    ) -> Result<AnalysisReport> {
        self.build_report(
            extracted,
            file_type,
            source_name,
            job_description,
            profile_key,
            Instant::now(),
        )
    }

    /// Run on a blocking worker thread; the future resolves once with the outcome
    pub async fn analyze_in_background(
        self: &Arc<Self>,
        raw: RawDocument,
        job_description: Option<String>,
        profile_key: String,
    ) -> Result<AnalysisReport> {
        let pipeline = Arc::clone(self);
        tokio::task::spawn_blocking(move || pipeline.analyze(&raw, job_description.as_deref(), &profile_key))
            .await
            .map_err(|e| AtsCheckerError::AnalysisFailed(format!("Analysis worker failed: {}", e)))?
    }

    fn check_accepted(&self, raw: &RawDocument) -> Result<()> {
        let file_type = raw.file_type();
        if self.accepted_formats.iter().any(|f| file_type.matches_format(f)) {
            return Ok(());
        }
        Err(AtsCheckerError::UnsupportedFormat(format!(
            "{} ({}); accepted formats: {}",
            raw.source_name(),
            file_type,
            self.accepted_formats.join(", ")
        )))
    }

    fn build_report(
        &self,
        extracted: ExtractedText,
        file_type: &FileType,
        source_name: &str,
        job_description: Option<&str>,
        profile_key: &str,
        start_time: Instant,
    ) -> Result<AnalysisReport> {
        let profile = self.profiles.get(profile_key)?;

        if extracted.metadata.is_ocr_derived {
            match &extracted.metadata.ocr_quality {
                Some(quality) if quality.degraded => warn!(
                    "{} was read by OCR with low confidence ({:.1})",
                    source_name, quality.mean_confidence
                ),
                _ => info!("{} was read by OCR", source_name),
            }
        }

        info!("Segmenting resume sections");
        let resume = self.entity_extractor.extract(&extracted);

        info!("Checking {} rules and matching keywords", profile.name);
        let issues = self
            .rule_engine
            .evaluate(&resume, &extracted.metadata, profile, file_type);
        let keywords = self.keyword_matcher.match_resume(&resume, job_description);

        let scores = self
            .score_aggregator
            .aggregate(&keywords, &issues, profile, file_type);
        info!("Overall score for {}: {:.1}", profile.name, scores.overall);

        let feedback = self.feedback_generator.generate(&ReportInputs {
            resume: &resume,
            issues: &issues,
            keywords: &keywords,
            scores: &scores,
            profile,
        });

        let notes = extracted.metadata.notes.clone();
        Ok(AnalysisReport {
            resume,
            extracted_metadata: extracted.metadata,
            issues,
            scores,
            keywords,
            feedback,
            metadata: ReportMetadata {
                profile_key: profile.key.clone(),
                profile_name: profile.name.clone(),
                source_name: source_name.to_string(),
                file_type: file_type.clone(),
                generated_at: Utc::now(),
                processing_time_ms: elapsed_millis(start_time.elapsed()),
                degraded: self.degraded.clone(),
                notes,
                tool_version: ReportMetadata::tool_version(),
            },
        })
    }
}

/// Milliseconds as `u64`, saturating instead of truncating
fn elapsed_millis(elapsed: Duration) -> u64 {
    u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
}
