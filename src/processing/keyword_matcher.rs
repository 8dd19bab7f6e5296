//! Keyword extraction and job-description matching
//!
//! Job keywords are ranked by `1 + ln(tf)`, boosted for known skills, and
//! compared to resume keywords after lowercasing and plural lemmatisation.
//! When an encoder is available, job keywords without an exact match get a
//! second chance through embedding similarity and count as partial matches.

use crate::config::MatchingConfig;
use crate::processing::embeddings::{EmbeddingEngine, SemanticEncoder};
use crate::processing::resume::{SectionKind, StructuredResume};
use crate::processing::scoring::round1;
use crate::processing::skill_lexicon::SkillLexicon;
use crate::processing::text_processor::TextProcessor;
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

const SKILL_BOOST: f64 = 1.5;
const MIN_TOKEN_LEN: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeywordSource {
    Job,
    Resume,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Keyword {
    pub term: String,
    pub weight: f64,
    pub source: KeywordSource,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartialMatch {
    pub job_term: String,
    pub resume_term: String,
    pub similarity: f32,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct KeywordMatchResult {
    pub resume_keywords: Vec<Keyword>,
    pub job_keywords: Vec<Keyword>,
    pub matched: BTreeSet<String>,
    /// Job keywords without an exact match. Partial matches stay listed here.
    pub missing: BTreeSet<String>,
    pub partial: Vec<PartialMatch>,
    pub score: f64,
    pub semantic_enabled: bool,
}

impl KeywordMatchResult {
    /// Missing job keywords, heaviest first
    pub fn missing_by_weight(&self) -> Vec<&Keyword> {
        self.job_keywords
            .iter()
            .filter(|k| self.missing.contains(&k.term))
            .collect()
    }

    pub fn has_job_keywords(&self) -> bool {
        !self.job_keywords.is_empty()
    }

    pub fn partial_for(&self, job_term: &str) -> Option<&PartialMatch> {
        self.partial.iter().find(|p| p.job_term == job_term)
    }
}

pub struct KeywordMatcher {
    lexicon: Arc<SkillLexicon>,
    processor: TextProcessor,
    config: MatchingConfig,
    encoder: Option<Arc<dyn SemanticEncoder>>,
}

impl KeywordMatcher {
    pub fn new(
        lexicon: Arc<SkillLexicon>,
        config: MatchingConfig,
        encoder: Option<Arc<dyn SemanticEncoder>>,
    ) -> Self {
        Self {
            lexicon,
            processor: TextProcessor::new(),
            config,
            encoder,
        }
    }

    pub fn match_resume(&self, resume: &StructuredResume, job_description: Option<&str>) -> KeywordMatchResult {
        let resume_text = if resume.has(SectionKind::Skills) || resume.has(SectionKind::Experience) {
            resume.text_of(&[SectionKind::Skills, SectionKind::Experience])
        } else {
            resume.full_text()
        };
        let resume_keywords = self.extract_keywords(&resume_text, KeywordSource::Resume);

        let mut job_keywords = job_description
            .map(|jd| self.extract_keywords(jd, KeywordSource::Job))
            .unwrap_or_default();
        job_keywords.truncate(self.config.max_job_keywords);

        let mut result = KeywordMatchResult {
            semantic_enabled: self.encoder.is_some(),
            ..KeywordMatchResult::default()
        };

        if job_keywords.is_empty() {
            debug!("No job keywords; keyword score is 0");
            result.resume_keywords = resume_keywords;
            return result;
        }

        let resume_terms: BTreeSet<&str> = resume_keywords.iter().map(|k| k.term.as_str()).collect();
        for keyword in &job_keywords {
            if resume_terms.contains(keyword.term.as_str()) {
                result.matched.insert(keyword.term.clone());
            } else {
                result.missing.insert(keyword.term.clone());
            }
        }

        if let Some(encoder) = &self.encoder {
            result.partial = self.semantic_pass(encoder.as_ref(), &result.missing, &resume_keywords);
        }

        let total: f64 = job_keywords.iter().map(|k| k.weight).sum();
        let earned: f64 = job_keywords
            .iter()
            .map(|k| {
                if result.matched.contains(&k.term) {
                    k.weight
                } else if result.partial_for(&k.term).is_some() {
                    k.weight * self.config.partial_match_weight
                } else {
                    0.0
                }
            })
            .sum();
        result.score = if total > 0.0 { round1(earned / total * 100.0) } else { 0.0 };

        debug!(
            "Keywords: {} matched, {} partial, {} missing of {}",
            result.matched.len(),
            result.partial.len(),
            result.missing.len(),
            job_keywords.len()
        );

        result.resume_keywords = resume_keywords;
        result.job_keywords = job_keywords;
        result
    }

    /// Ranked, deduplicated keywords of a text
    pub fn extract_keywords(&self, text: &str, source: KeywordSource) -> Vec<Keyword> {
        let mut counts: BTreeMap<String, usize> = BTreeMap::new();

        let hits = self.lexicon.find(text);
        for hit in &hits {
            *counts.entry(hit.term.clone()).or_insert(0) += 1;
        }

        for token in self.processor.tokenize(text) {
            if hits.iter().any(|h| token.start < h.end && h.start < token.end) {
                continue;
            }
            if let Some(term) = self.normalize_term(&text[token.start..token.end]) {
                *counts.entry(term).or_insert(0) += 1;
            }
        }

        let mut keywords: Vec<Keyword> = counts
            .into_iter()
            .map(|(term, tf)| {
                let mut weight = 1.0 + (tf as f64).ln();
                if self.lexicon.contains(&term) {
                    weight *= SKILL_BOOST;
                }
                Keyword { term, weight, source }
            })
            .collect();

        keywords.sort_by(|a, b| {
            b.weight
                .partial_cmp(&a.weight)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.term.cmp(&b.term))
        });
        keywords
    }

    /// Lowercase, trim edge punctuation, drop filler, lemmatise plurals
    fn normalize_term(&self, token: &str) -> Option<String> {
        let trimmed = token.trim_matches(|c: char| !c.is_alphanumeric() && c != '+' && c != '#');
        let term = trimmed.to_lowercase();
        if term.chars().count() < MIN_TOKEN_LEN || self.processor.is_filler(&term) {
            return None;
        }
        if self.lexicon.contains(&term) {
            return Some(term);
        }
        if let Some(stem) = TextProcessor::acronym_singular(trimmed) {
            return Some(stem);
        }
        if let Some(stem) = term.strip_suffix('s').filter(|stem| self.lexicon.contains(stem)) {
            return Some(stem.to_string());
        }

        let lemma = self.processor.lemmatize(&term);
        if self.processor.is_filler(&lemma) {
            return None;
        }
        Some(lemma)
    }

    fn semantic_pass(
        &self,
        encoder: &dyn SemanticEncoder,
        missing: &BTreeSet<String>,
        resume_keywords: &[Keyword],
    ) -> Vec<PartialMatch> {
        if missing.is_empty() || resume_keywords.is_empty() {
            return Vec::new();
        }

        let job_terms: Vec<String> = missing.iter().cloned().collect();
        let resume_terms: Vec<String> = resume_keywords.iter().map(|k| k.term.clone()).collect();

        let job_vectors = encoder.encode(&job_terms);
        let resume_vectors = encoder.encode(&resume_terms);

        let mut partial = Vec::new();
        for (job_term, job_vector) in job_terms.iter().zip(&job_vectors) {
            let best = resume_terms
                .iter()
                .zip(&resume_vectors)
                .filter_map(|(term, vector)| {
                    EmbeddingEngine::cosine_similarity(job_vector, vector)
                        .ok()
                        .map(|similarity| (term, similarity))
                })
                .fold(None, |best: Option<(&String, f32)>, (term, similarity)| match best {
                    Some((_, current)) if current >= similarity => best,
                    _ => Some((term, similarity)),
                });

            if let Some((resume_term, similarity)) = best {
                if similarity >= self.config.semantic_threshold {
                    debug!("Partial match {} ~ {} ({:.2})", job_term, resume_term, similarity);
                    partial.push(PartialMatch {
                        job_term: job_term.clone(),
                        resume_term: resume_term.clone(),
                        similarity,
                    });
                }
            }
        }
        partial
    }
}
