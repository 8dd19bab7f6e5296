//! Text normalization, tokenization and term filtering

use regex::Regex;
use std::collections::HashSet;
use unicode_segmentation::UnicodeSegmentation;

pub struct TextProcessor {
    stop_words: HashSet<&'static str>,
    generic_terms: HashSet<&'static str>,
    token_regex: Regex,
}

/// A token with its byte span in the source text
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub text: String,
    pub start: usize,
    pub end: usize,
}

impl Default for TextProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl TextProcessor {
    pub fn new() -> Self {
        // Letters first, then word chars; '.' and '-' only between word chars so
        // "node.js" and "ci-cd" stay whole while a sentence-final period is dropped.
        let token_regex = Regex::new(r"[A-Za-z][A-Za-z0-9+#]*(?:[.\-][A-Za-z0-9+#]+)*")
            .expect("Invalid token regex");

        Self {
            stop_words: STOP_WORDS.iter().copied().collect(),
            generic_terms: GENERIC_VERBS
                .iter()
                .chain(GENERIC_POSTING_TERMS.iter())
                .copied()
                .collect(),
            token_regex,
        }
    }

    /// Tokenize into lowercase terms with byte offsets
    pub fn tokenize(&self, text: &str) -> Vec<Token> {
        self.token_regex
            .find_iter(text)
            .map(|m| Token {
                text: m.as_str().to_lowercase(),
                start: m.start(),
                end: m.end(),
            })
            .collect()
    }

    /// Count words the way a reader would (Unicode word boundaries)
    pub fn word_count(&self, text: &str) -> usize {
        text.unicode_words().count()
    }

    pub fn is_stop_word(&self, term: &str) -> bool {
        self.stop_words.contains(term)
    }

    /// Stop words, generic verbs and boilerplate job-posting vocabulary
    pub fn is_filler(&self, term: &str) -> bool {
        self.stop_words.contains(term) || self.generic_terms.contains(term)
    }

    /// Plural-only lemmatization. Short tokens are returned unchanged.
    pub fn lemmatize(&self, term: &str) -> String {
        if term.len() <= 3 || term.contains(' ') || !term.chars().all(|c| c.is_ascii_alphabetic()) {
            return term.to_string();
        }
        if let Some(stem) = term.strip_suffix("ies") {
            if stem.len() >= 2 {
                return format!("{}y", stem);
            }
        }
        if let Some(stem) = term.strip_suffix("sses") {
            return format!("{}ss", stem);
        }
        if term.ends_with("ss") || term.ends_with("us") || term.ends_with("is") {
            return term.to_string();
        }
        match term.strip_suffix('s') {
            Some(stem) => stem.to_string(),
            None => term.to_string(),
        }
    }

    /// Singular of an acronym plural written as capitals plus a lowercase `s`
    /// ("KPIs" is `kpi`). Case is taken from the source text.
    pub fn acronym_singular(original: &str) -> Option<String> {
        let stem = original.strip_suffix('s')?;
        let is_acronym = stem.len() >= 2 && stem.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit());
        (is_acronym && stem.starts_with(|c: char| c.is_ascii_uppercase())).then(|| stem.to_lowercase())
    }

    /// Normalize CRLF line endings and typographic punctuation
    pub fn normalize_text(&self, text: &str) -> String {
        let unified = text.replace("\r\n", "\n").replace('\r', "\n");
        self.normalize_unicode(&unified)
    }

    /// Normalize Unicode characters
    fn normalize_unicode(&self, text: &str) -> String {
        text.chars()
            .map(|c| match c {
                '\u{2018}' | '\u{2019}' => '\'', // Smart quotes to regular quotes
                '\u{201C}' | '\u{201D}' => '"',  // Smart double quotes
                '\u{00A0}' => ' ',               // Non-breaking space
                '\u{FEFF}' => ' ',               // Stray BOM
                _ => c,
            })
            .collect()
    }
}

const STOP_WORDS: &[&str] = &[
    "a", "about", "above", "after", "again", "against", "all", "also", "am", "an", "and", "any",
    "are", "as", "at", "be", "because", "been", "before", "being", "below", "between", "both",
    "but", "by", "can", "could", "did", "do", "does", "doing", "down", "during", "each", "either",
    "etc", "few", "for", "from", "further", "had", "has", "have", "having", "he", "her", "here",
    "hers", "him", "his", "how", "i", "if", "in", "into", "is", "it", "its", "itself", "just",
    "me", "more", "most", "must", "my", "no", "nor", "not", "now", "of", "off", "on", "once",
    "only", "or", "other", "our", "ours", "out", "over", "own", "per", "same", "she", "should",
    "so", "some", "such", "than", "that", "the", "their", "them", "then", "there", "these",
    "they", "this", "those", "through", "to", "too", "under", "until", "up", "us", "very", "via",
    "was", "we", "were", "what", "when", "where", "which", "while", "who", "whom", "why", "will",
    "with", "within", "would", "you", "your", "yours", "yourself",
];

const GENERIC_VERBS: &[&str] = &[
    "ability", "able", "apply", "assist", "build", "building", "create", "creating", "deliver",
    "develop", "developing", "drive", "ensure", "help", "include", "including", "join", "looking",
    "make", "manage", "need", "provide", "seeking", "support", "take", "use", "using", "work",
    "working", "write", "writing", "like", "want", "get", "know", "learn", "grow",
];

const GENERIC_POSTING_TERMS: &[&str] = &[
    "applicant", "applicants", "benefits", "candidate", "candidates", "company", "environment",
    "equal", "excellent", "experience", "opportunity", "plus", "position", "preferred",
    "qualifications", "requirements", "required", "responsibilities", "role", "salary", "skills",
    "strong", "team", "world", "year", "years", "knowledge", "understanding", "new", "great",
    "good", "well", "best", "highly", "proven", "related", "relevant", "across", "day", "ideal",
    "you'll", "we're", "degree", "bonus", "nice", "etc", "minimum", "least", "based",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenization_keeps_tech_terms_whole() {
        let processor = TextProcessor::new();
        let tokens: Vec<String> = processor
            .tokenize("Node.js, C++ and C# on CI-CD. Python.")
            .into_iter()
            .map(|t| t.text)
            .collect();

        assert!(tokens.contains(&"node.js".to_string()));
        assert!(tokens.contains(&"c++".to_string()));
        assert!(tokens.contains(&"c#".to_string()));
        assert!(tokens.contains(&"ci-cd".to_string()));
        assert!(tokens.contains(&"python".to_string()));
    }

    #[test]
    fn test_token_spans() {
        let processor = TextProcessor::new();
        let text = "Rust and SQL";
        let tokens = processor.tokenize(text);
        assert_eq!(&text[tokens[2].start..tokens[2].end], "SQL");
    }

    #[test]
    fn test_filler_detection() {
        let processor = TextProcessor::new();
        assert!(processor.is_filler("the"));
        assert!(processor.is_filler("responsibilities"));
        assert!(processor.is_filler("using"));
        assert!(!processor.is_filler("kubernetes"));
        assert!(processor.is_stop_word("and"));
    }

    #[test]
    fn test_plural_lemmatization() {
        let processor = TextProcessor::new();
        assert_eq!(processor.lemmatize("databases"), "database");
        assert_eq!(processor.lemmatize("technologies"), "technology");
        assert_eq!(processor.lemmatize("processes"), "process");
        assert_eq!(processor.lemmatize("analysis"), "analysis");
        assert_eq!(processor.lemmatize("business"), "business");
        assert_eq!(processor.lemmatize("aws"), "aws");
        assert_eq!(processor.lemmatize("status"), "status");
    }

    #[test]
    fn test_acronym_singular() {
        assert_eq!(TextProcessor::acronym_singular("KPIs").as_deref(), Some("kpi"));
        assert_eq!(TextProcessor::acronym_singular("APIs").as_deref(), Some("api"));
        assert_eq!(TextProcessor::acronym_singular("OKRs").as_deref(), Some("okr"));
        assert_eq!(TextProcessor::acronym_singular("AWS"), None);
        assert_eq!(TextProcessor::acronym_singular("analysis"), None);
        assert_eq!(TextProcessor::acronym_singular("Is"), None);
    }

    #[test]
    fn test_normalize_text() {
        let processor = TextProcessor::new();
        let text = "It\u{2019}s\r\nfine";
        assert_eq!(processor.normalize_text(text), "It's\nfine");
    }

    #[test]
    fn test_word_count() {
        let processor = TextProcessor::new();
        assert_eq!(processor.word_count("Rust programming language"), 3);
    }
}
