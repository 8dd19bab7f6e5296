//! Weighted aggregation of the four sub-scores

use crate::config::{ExplicitWeights, ScoringConfig};
use crate::input::FileType;
use crate::processing::ats_rules::{Issue, Severity};
use crate::processing::keyword_matcher::KeywordMatchResult;
use crate::profiles::AtsProfile;
use log::debug;
use serde::{Deserialize, Serialize};

pub const MISSING_SECTION_CODE: &str = "structure.missing_section";

/// Round to one decimal place
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreWeights {
    pub keyword: f64,
    pub formatting: f64,
    pub structure: f64,
    pub file_type: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub keyword_score: f64,
    pub formatting_score: f64,
    pub structure_score: f64,
    pub filetype_score: f64,
    pub overall: f64,
    /// Weights actually applied to `overall`
    pub weights: ScoreWeights,
}

impl ScoreWeights {
    /// Profile keyword weight plus the remainder split evenly or by ratio
    pub fn derive(keyword_weight: f64, explicit: Option<ExplicitWeights>) -> Self {
        let keyword = keyword_weight.clamp(0.0, 1.0);
        let remainder = 1.0 - keyword;

        let (f, s, t) = match explicit {
            Some(w) if w.formatting + w.structure + w.file_type > 0.0 => {
                let total = w.formatting + w.structure + w.file_type;
                (w.formatting / total, w.structure / total, w.file_type / total)
            }
            _ => (1.0 / 3.0, 1.0 / 3.0, 1.0 / 3.0),
        };

        Self {
            keyword,
            formatting: remainder * f,
            structure: remainder * s,
            file_type: remainder * t,
        }
    }

    /// Moves the keyword share onto the other three in proportion
    pub fn without_keywords(&self) -> Self {
        let others = self.formatting + self.structure + self.file_type;
        if others <= 0.0 {
            return Self {
                keyword: 0.0,
                formatting: 1.0 / 3.0,
                structure: 1.0 / 3.0,
                file_type: 1.0 / 3.0,
            };
        }
        Self {
            keyword: 0.0,
            formatting: self.formatting / others,
            structure: self.structure / others,
            file_type: self.file_type / others,
        }
    }

    pub fn sum(&self) -> f64 {
        self.keyword + self.formatting + self.structure + self.file_type
    }
}

pub struct ScoreAggregator {
    config: ScoringConfig,
}

impl ScoreAggregator {
    pub fn new(config: ScoringConfig) -> Self {
        Self { config }
    }

    pub fn weights_for(&self, profile: &AtsProfile) -> ScoreWeights {
        ScoreWeights::derive(profile.keyword_importance_weight, self.config.explicit_weights)
    }

    pub fn aggregate(
        &self,
        keywords: &KeywordMatchResult,
        issues: &[Issue],
        profile: &AtsProfile,
        file_type: &FileType,
    ) -> ScoreBreakdown {
        let keyword_score = round1(keywords.score.clamp(0.0, 100.0));
        let formatting_score = round1(self.formatting_score(issues));
        let structure_score = round1(structure_score(issues, profile));
        let filetype_score = if profile.allowed_file_types.is_empty()
            || profile.allowed_file_types.iter().any(|f| file_type.matches_format(f))
        {
            100.0
        } else {
            0.0
        };

        let mut weights = self.weights_for(profile);
        if !keywords.has_job_keywords() {
            weights = weights.without_keywords();
        }

        let overall = keyword_score * weights.keyword
            + formatting_score * weights.formatting
            + structure_score * weights.structure
            + filetype_score * weights.file_type;

        let breakdown = ScoreBreakdown {
            keyword_score,
            formatting_score,
            structure_score,
            filetype_score,
            overall: round1(overall.clamp(0.0, 100.0)),
            weights,
        };
        debug!("Scores for {}: {:?}", profile.key, breakdown);
        breakdown
    }

    fn formatting_score(&self, issues: &[Issue]) -> f64 {
        let penalty: f64 = issues
            .iter()
            .map(|issue| match issue.severity {
                Severity::Critical => self.config.critical_penalty,
                Severity::Warning => self.config.warning_penalty,
                Severity::Info => self.config.info_penalty,
            })
            .sum();
        (100.0 - penalty).max(0.0)
    }
}

fn structure_score(issues: &[Issue], profile: &AtsProfile) -> f64 {
    let required = profile.required_sections.len();
    if required == 0 {
        return 100.0;
    }
    let missing = issues
        .iter()
        .filter(|i| i.code == MISSING_SECTION_CODE)
        .count()
        .min(required);
    (required - missing) as f64 / required as f64 * 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processing::keyword_matcher::{Keyword, KeywordSource};
    use crate::profiles::ProfileTable;

    fn issue(code: &str, severity: Severity) -> Issue {
        Issue {
            code: code.to_string(),
            severity,
            message: String::new(),
            affected_section: None,
        }
    }

    fn keywords(score: f64) -> KeywordMatchResult {
        KeywordMatchResult {
            job_keywords: vec![Keyword {
                term: "rust".to_string(),
                weight: 1.0,
                source: KeywordSource::Job,
            }],
            score,
            ..KeywordMatchResult::default()
        }
    }

    #[test]
    fn test_round1() {
        assert_eq!(round1(66.666), 66.7);
        assert_eq!(round1(85.04), 85.0);
        assert_eq!(round1(100.0), 100.0);
    }

    #[test]
    fn test_weights_sum_to_one_for_every_profile() {
        let table = ProfileTable::builtin().unwrap();
        let aggregator = ScoreAggregator::new(ScoringConfig::default());
        for profile in table.iter() {
            let weights = aggregator.weights_for(profile);
            assert!((weights.sum() - 1.0).abs() < 1e-3, "{}: {:?}", profile.key, weights);
            assert!((weights.without_keywords().sum() - 1.0).abs() < 1e-3);
        }
    }

    #[test]
    fn test_explicit_weights() {
        let weights = ScoreWeights::derive(
            0.4,
            Some(ExplicitWeights {
                formatting: 2.0,
                structure: 1.0,
                file_type: 1.0,
            }),
        );
        assert!((weights.formatting - 0.3).abs() < 1e-9);
        assert!((weights.structure - 0.15).abs() < 1e-9);
        assert!((weights.file_type - 0.15).abs() < 1e-9);
    }

    #[test]
    fn test_formatting_penalties() {
        let table = ProfileTable::builtin().unwrap();
        let taleo = table.get("taleo").unwrap();
        let aggregator = ScoreAggregator::new(ScoringConfig::default());

        let one_critical = aggregator.aggregate(&keywords(50.0), &[issue("formatting.tables", Severity::Critical)], taleo, &FileType::Pdf);
        assert_eq!(one_critical.formatting_score, 85.0);

        let mixed = [
            issue("formatting.tables", Severity::Critical),
            issue("formatting.bullet_points", Severity::Warning),
            issue("font.unlisted", Severity::Info),
        ];
        let breakdown = aggregator.aggregate(&keywords(50.0), &mixed, taleo, &FileType::Pdf);
        assert_eq!(breakdown.formatting_score, 79.0);

        let many: Vec<Issue> = (0..10).map(|_| issue("formatting.images", Severity::Critical)).collect();
        let floored = aggregator.aggregate(&keywords(50.0), &many, taleo, &FileType::Pdf);
        assert_eq!(floored.formatting_score, 0.0);
    }

    #[test]
    fn test_structure_and_file_type() {
        let table = ProfileTable::builtin().unwrap();
        let taleo = table.get("taleo").unwrap();
        let aggregator = ScoreAggregator::new(ScoringConfig::default());

        let issues = [issue(MISSING_SECTION_CODE, Severity::Warning)];
        let breakdown = aggregator.aggregate(&keywords(100.0), &issues, taleo, &FileType::Markdown);
        assert_eq!(breakdown.structure_score, 66.7);
        assert_eq!(breakdown.filetype_score, 0.0);
    }

    #[test]
    fn test_overall_weighting() {
        let table = ProfileTable::builtin().unwrap();
        let taleo = table.get("taleo").unwrap();
        let aggregator = ScoreAggregator::new(ScoringConfig::default());

        let breakdown = aggregator.aggregate(&keywords(40.0), &[], taleo, &FileType::Pdf);
        // 40 * 0.5 + 100 * 0.5
        assert_eq!(breakdown.overall, 70.0);
    }

    #[test]
    fn test_no_job_keywords_renormalizes() {
        let table = ProfileTable::builtin().unwrap();
        let taleo = table.get("taleo").unwrap();
        let aggregator = ScoreAggregator::new(ScoringConfig::default());

        let breakdown = aggregator.aggregate(&KeywordMatchResult::default(), &[], taleo, &FileType::Pdf);
        assert_eq!(breakdown.keyword_score, 0.0);
        assert_eq!(breakdown.weights.keyword, 0.0);
        assert_eq!(breakdown.overall, 100.0);
    }
}
