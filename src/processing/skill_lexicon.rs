//! Known skill vocabulary backed by an Aho-Corasick automaton

use crate::error::{AtsCheckerError, Result};
use aho_corasick::{AhoCorasick, MatchKind};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SkillCategory {
    Technical,
    Soft,
    Role,
}

/// Skill vocabulary shared by the entity extractor and the keyword matcher
pub struct SkillLexicon {
    matcher: AhoCorasick,
    terms: Vec<String>,
    categories: HashMap<String, SkillCategory>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LexiconHit {
    pub term: String,
    pub start: usize,
    pub end: usize,
    pub category: SkillCategory,
}

impl SkillLexicon {
    pub fn new() -> Result<Self> {
        Self::with_custom_skills(Vec::new())
    }

    /// Build the lexicon with additional technical skills
    pub fn with_custom_skills(additional_skills: Vec<String>) -> Result<Self> {
        let mut categories = HashMap::new();
        for (terms, category) in [
            (TECH_SKILLS, SkillCategory::Technical),
            (SOFT_SKILLS, SkillCategory::Soft),
            (ROLE_TERMS, SkillCategory::Role),
        ] {
            for term in terms {
                categories.entry(term.to_string()).or_insert(category);
            }
        }
        for skill in additional_skills {
            let skill = skill.trim().to_lowercase();
            if !skill.is_empty() {
                categories.entry(skill).or_insert(SkillCategory::Technical);
            }
        }

        let mut terms: Vec<String> = categories.keys().cloned().collect();
        terms.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));

        // Standard semantics so overlapping matches can be reported; the
        // longest word-bounded candidate is chosen in `find`
        let matcher = AhoCorasick::builder()
            .ascii_case_insensitive(true)
            .match_kind(MatchKind::Standard)
            .build(&terms)
            .map_err(|e| AtsCheckerError::Processing(format!("Failed to build skill lexicon: {}", e)))?;

        Ok(Self {
            matcher,
            terms,
            categories,
        })
    }

    /// Every whole-word occurrence of a known skill, in text order.
    ///
    /// Among candidates starting at the same position the longest one that is
    /// word-bounded wins, so "SQL serverless" still yields `sql`. A trailing
    /// plural `s` is absorbed into the hit ("APIs" is `api`).
    pub fn find(&self, text: &str) -> Vec<LexiconHit> {
        let mut candidates: Vec<LexiconHit> = self
            .matcher
            .find_overlapping_iter(text)
            .filter_map(|m| {
                let term = &self.terms[m.pattern().as_usize()];
                if CASE_SENSITIVE_TERMS.contains(&term.as_str())
                    && text[m.start()..m.end()].chars().all(|c| !c.is_uppercase())
                {
                    return None;
                }
                let end = bounded_end(text, m.start(), m.end(), term)?;
                Some(LexiconHit {
                    term: term.clone(),
                    start: m.start(),
                    end,
                    category: self.categories[term],
                })
            })
            .collect();

        candidates.sort_by(|a, b| {
            a.start
                .cmp(&b.start)
                .then_with(|| b.end.cmp(&a.end))
                .then_with(|| a.term.cmp(&b.term))
        });

        let mut hits: Vec<LexiconHit> = Vec::new();
        let mut covered = 0;
        for hit in candidates {
            if hit.start >= covered {
                covered = hit.end;
                hits.push(hit);
            }
        }
        hits
    }

    pub fn contains(&self, term: &str) -> bool {
        self.categories.contains_key(&term.to_lowercase())
    }

    pub fn category(&self, term: &str) -> Option<SkillCategory> {
        self.categories.get(&term.to_lowercase()).copied()
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Whether the text at `index` continues a hyphenated compound ("go-to-market")
fn joins_after(text: &str, index: usize) -> bool {
    let rest = &text[index..];
    let Some(word) = rest.strip_prefix('-') else {
        return false;
    };
    if !word.chars().next().map(is_word_char).unwrap_or(false) {
        return false;
    }
    let next: String = word.chars().take_while(|c| is_word_char(*c)).collect::<String>().to_lowercase();
    !HYPHEN_MODIFIERS.contains(&next.as_str())
}

fn blocked_before(text: &str, start: usize) -> bool {
    let mut chars = text[..start].chars().rev();
    match chars.next() {
        Some(c) if is_word_char(c) => true,
        Some('-') => chars.next().map(is_word_char).unwrap_or(false),
        _ => false,
    }
}

fn blocked_after(text: &str, end: usize) -> bool {
    text[end..].chars().next().map(is_word_char).unwrap_or(false) || joins_after(text, end)
}

/// End of a whole-word hit, extended over a plural `s`, or `None` when the
/// match sits inside a larger word
fn bounded_end(text: &str, start: usize, end: usize, term: &str) -> Option<usize> {
    if blocked_before(text, start) {
        return None;
    }
    if !blocked_after(text, end) {
        return Some(end);
    }
    let plural = term.ends_with(|c: char| c.is_ascii_alphabetic() && c != 's')
        && text[end..].starts_with('s')
        && !blocked_after(text, end + 1);
    plural.then_some(end + 1)
}

/// Terms that are also everyday words and only count when capitalized
const CASE_SENSITIVE_TERMS: &[&str] = &["go"];

/// Second halves of hyphenated compounds that still name the skill ("Python-based")
const HYPHEN_MODIFIERS: &[&str] = &["based", "driven", "powered", "native", "first", "backed", "heavy"];

const TECH_SKILLS: &[&str] = &[
    // Programming languages
    "rust", "python", "javascript", "typescript", "java", "c++", "c#", "go", "golang", "ruby",
    "php", "swift", "kotlin", "scala", "haskell", "clojure", "matlab", "sql", "nosql", "bash",
    "powershell",
    // Web
    "react", "vue", "angular", "svelte", "html", "css", "sass", "tailwind", "bootstrap",
    "jquery", "webpack", "node.js", "express.js", "next.js", "graphql", "rest api", "restful",
    // Infrastructure
    "docker", "kubernetes", "aws", "azure", "gcp", "terraform", "ansible", "jenkins", "gitlab",
    "github", "ci/cd", "devops", "microservices", "api", "grpc", "redis", "elasticsearch",
    "nginx", "linux", "unix", "git",
    // Databases
    "postgresql", "mysql", "mongodb", "cassandra", "dynamodb", "sqlite", "oracle",
    "sql server", "neo4j",
    // Data
    "machine learning", "deep learning", "tensorflow", "pytorch", "scikit-learn", "pandas",
    "numpy", "jupyter", "spark", "hadoop", "kafka", "airflow", "etl", "data analysis",
    "data visualization", "statistics", "excel", "tableau", "power bi",
    // Testing and process
    "jest", "pytest", "junit", "selenium", "cypress", "testing", "tdd", "agile", "scrum",
    "kanban", "jira", "confluence",
];

const SOFT_SKILLS: &[&str] = &[
    "leadership", "communication", "teamwork", "problem solving", "critical thinking",
    "creativity", "adaptability", "time management", "project management", "collaboration",
    "mentoring", "coaching", "presentation", "negotiation", "customer service", "analytical",
    "detail oriented", "stakeholder management",
];

const ROLE_TERMS: &[&str] = &[
    "software engineer", "developer", "architect", "full stack", "frontend", "backend", "sre",
    "data scientist", "data engineer", "ml engineer", "product manager", "designer", "analyst",
    "consultant",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_core_skills() {
        let lexicon = SkillLexicon::new().unwrap();
        for skill in ["sql", "python", "leadership", "machine learning", "c++"] {
            assert!(lexicon.contains(skill), "missing {}", skill);
        }
        assert_eq!(lexicon.category("Leadership"), Some(SkillCategory::Soft));
        assert!(!lexicon.is_empty());
    }

    #[test]
    fn test_find_prefers_longest_and_respects_word_bounds() {
        let lexicon = SkillLexicon::new().unwrap();
        let hits = lexicon.find("Machine Learning with MySQL, PostgreSQL and Python.");
        let terms: Vec<&str> = hits.iter().map(|h| h.term.as_str()).collect();

        assert!(terms.contains(&"machine learning"));
        assert!(terms.contains(&"mysql"));
        assert!(terms.contains(&"postgresql"));
        assert!(terms.contains(&"python"));
        assert!(!terms.contains(&"sql"));
    }

    #[test]
    fn test_shorter_skill_when_longer_is_not_bounded() {
        let lexicon = SkillLexicon::new().unwrap();
        let hits = lexicon.find("SQL serverless functions");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].term, "sql");
        assert_eq!((hits[0].start, hits[0].end), (0, 3));

        let hits = lexicon.find("Migrated to SQL Server 2019");
        assert_eq!(hits[0].term, "sql server");
    }

    #[test]
    fn test_plural_skills() {
        let lexicon = SkillLexicon::new().unwrap();
        let hits = lexicon.find("Designed REST APIs and internal APIs");
        let terms: Vec<&str> = hits.iter().map(|h| h.term.as_str()).collect();
        assert_eq!(terms, vec!["rest api", "api"]);
        assert_eq!(hits[1].end, "Designed REST APIs and internal APIs".len());
    }

    #[test]
    fn test_hyphenated_compounds() {
        let lexicon = SkillLexicon::new().unwrap();
        assert!(lexicon.find("Own our go-to-market plan").is_empty());
        assert!(lexicon.find("Own our Go-to-market plan").is_empty());

        let terms: Vec<String> = lexicon
            .find("Python-based tooling and React-driven UIs")
            .into_iter()
            .map(|h| h.term)
            .collect();
        assert_eq!(terms, vec!["python", "react"]);
    }

    #[test]
    fn test_go_needs_capital() {
        let lexicon = SkillLexicon::new().unwrap();
        assert!(lexicon.find("willing to go above and beyond").is_empty());
        let hits = lexicon.find("Services written in Go and Rust");
        let terms: Vec<&str> = hits.iter().map(|h| h.term.as_str()).collect();
        assert_eq!(terms, vec!["go", "rust"]);
    }

    #[test]
    fn test_custom_skills() {
        let lexicon = SkillLexicon::with_custom_skills(vec!["Bevy".to_string()]).unwrap();
        assert!(lexicon.contains("bevy"));
        let hits = lexicon.find("Built a game in Bevy");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].category, SkillCategory::Technical);
    }
}
