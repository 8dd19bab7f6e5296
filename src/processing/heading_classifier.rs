//! Section heading classification
//!
//! A line is classified as a heading in three steps: an exact lookup in the
//! synonym lexicon, then the longest synonym contained in a heading-shaped
//! line, then a Jaro-Winkler fallback. Everything here is a pure function of
//! the line and its surrounding blank lines.

use crate::processing::resume::SectionKind;
use strsim::jaro_winkler;

pub const FUZZY_THRESHOLD: f64 = 0.88;
const MAX_EXACT_WORDS: usize = 5;
const MAX_HEADING_WORDS: usize = 4;
const MAX_HEADING_CHARS: usize = 60;

const HEADING_LEXICON: &[(&str, SectionKind)] = &[
    ("contact", SectionKind::Contact),
    ("contact information", SectionKind::Contact),
    ("contact info", SectionKind::Contact),
    ("contact details", SectionKind::Contact),
    ("personal information", SectionKind::Contact),
    ("personal details", SectionKind::Contact),
    ("summary", SectionKind::Summary),
    ("professional summary", SectionKind::Summary),
    ("career summary", SectionKind::Summary),
    ("executive summary", SectionKind::Summary),
    ("summary of qualifications", SectionKind::Summary),
    ("profile", SectionKind::Summary),
    ("professional profile", SectionKind::Summary),
    ("objective", SectionKind::Summary),
    ("career objective", SectionKind::Summary),
    ("about me", SectionKind::Summary),
    ("about", SectionKind::Summary),
    ("overview", SectionKind::Summary),
    ("experience", SectionKind::Experience),
    ("work experience", SectionKind::Experience),
    ("professional experience", SectionKind::Experience),
    ("relevant experience", SectionKind::Experience),
    ("work history", SectionKind::Experience),
    ("employment history", SectionKind::Experience),
    ("employment", SectionKind::Experience),
    ("career history", SectionKind::Experience),
    ("professional background", SectionKind::Experience),
    ("internships", SectionKind::Experience),
    ("education", SectionKind::Education),
    ("education and training", SectionKind::Education),
    ("education and certifications", SectionKind::Education),
    ("academic background", SectionKind::Education),
    ("academic qualifications", SectionKind::Education),
    ("educational background", SectionKind::Education),
    ("academics", SectionKind::Education),
    ("qualifications", SectionKind::Education),
    ("skills", SectionKind::Skills),
    ("technical skills", SectionKind::Skills),
    ("key skills", SectionKind::Skills),
    ("core skills", SectionKind::Skills),
    ("skill set", SectionKind::Skills),
    ("skills and abilities", SectionKind::Skills),
    ("core competencies", SectionKind::Skills),
    ("competencies", SectionKind::Skills),
    ("areas of expertise", SectionKind::Skills),
    ("expertise", SectionKind::Skills),
    ("technical proficiencies", SectionKind::Skills),
    ("technologies", SectionKind::Skills),
    ("tools and technologies", SectionKind::Skills),
    ("projects", SectionKind::Projects),
    ("personal projects", SectionKind::Projects),
    ("key projects", SectionKind::Projects),
    ("academic projects", SectionKind::Projects),
    ("notable projects", SectionKind::Projects),
    ("portfolio", SectionKind::Projects),
    ("certifications", SectionKind::Other),
    ("certificates", SectionKind::Other),
    ("licenses and certifications", SectionKind::Other),
    ("awards", SectionKind::Other),
    ("honors and awards", SectionKind::Other),
    ("achievements", SectionKind::Other),
    ("publications", SectionKind::Other),
    ("volunteer", SectionKind::Other),
    ("volunteer experience", SectionKind::Other),
    ("volunteering", SectionKind::Other),
    ("languages", SectionKind::Other),
    ("interests", SectionKind::Other),
    ("hobbies", SectionKind::Other),
    ("activities", SectionKind::Other),
    ("references", SectionKind::Other),
];

const CONNECTORS: &[&str] = &["and", "of", "the", "for", "in", "&"];

/// Blank-line context around a candidate line
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LineLayout {
    pub blank_before: bool,
    pub blank_after: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchMethod {
    Exact,
    Synonym,
    Fuzzy,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HeadingMatch {
    pub kind: SectionKind,
    pub synonym: &'static str,
    pub method: MatchMethod,
}

/// Lowercase, fold `&` into `and`, drop punctuation, collapse whitespace
pub fn normalize_heading(line: &str) -> String {
    let folded = line.trim().trim_start_matches('#').replace('&', " and ").to_lowercase();
    folded
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Classify a single line. Returns `None` for body text.
pub fn classify_heading(line: &str, layout: LineLayout) -> Option<HeadingMatch> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.chars().count() > MAX_HEADING_CHARS {
        return None;
    }
    if starts_with_bullet(trimmed) || trimmed.contains(',') || trimmed.contains('@') {
        return None;
    }
    // "Languages: Rust, Go" is a labelled value, not a heading
    if let Some((_, rest)) = trimmed.split_once(':') {
        if !rest.trim().is_empty() {
            return None;
        }
    }

    let normalized = normalize_heading(trimmed);
    let word_count = normalized.split_whitespace().count();
    if word_count == 0 || word_count > MAX_EXACT_WORDS {
        return None;
    }

    if let Some((synonym, kind)) = HEADING_LEXICON.iter().find(|(s, _)| *s == normalized) {
        return Some(HeadingMatch {
            kind: *kind,
            synonym: *synonym,
            method: MatchMethod::Exact,
        });
    }

    if word_count > MAX_HEADING_WORDS || !looks_like_heading(trimmed, layout) {
        return None;
    }

    if let Some((synonym, kind)) = longest_contained_synonym(&normalized) {
        return Some(HeadingMatch {
            kind,
            synonym,
            method: MatchMethod::Synonym,
        });
    }

    fuzzy_match(&normalized, word_count).map(|(synonym, kind)| HeadingMatch {
        kind,
        synonym,
        method: MatchMethod::Fuzzy,
    })
}

/// Map a configured heading (e.g. a profile's required heading) to a section kind
pub fn lookup_kind(heading: &str) -> Option<SectionKind> {
    let normalized = normalize_heading(heading);
    HEADING_LEXICON
        .iter()
        .find(|(s, _)| *s == normalized)
        .map(|(_, kind)| *kind)
        .or_else(|| longest_contained_synonym(&normalized).map(|(_, kind)| kind))
}

fn looks_like_heading(trimmed: &str, layout: LineLayout) -> bool {
    let body = trimmed.trim_end_matches(':').trim();
    let ends_with_colon = trimmed.ends_with(':');

    let letters: Vec<char> = body.chars().filter(|c| c.is_alphabetic()).collect();
    let all_caps = !letters.is_empty() && letters.iter().all(|c| c.is_uppercase());

    let isolated = layout.blank_before && layout.blank_after;

    let title_case = body.split_whitespace().all(|word| {
        CONNECTORS.contains(&word.to_lowercase().as_str())
            || word
                .chars()
                .find(|c| c.is_alphabetic())
                .map(|c| c.is_uppercase())
                .unwrap_or(true)
    });

    ends_with_colon || all_caps || isolated || title_case
}

fn longest_contained_synonym(normalized: &str) -> Option<(&'static str, SectionKind)> {
    let padded = format!(" {} ", normalized);
    HEADING_LEXICON
        .iter()
        .filter(|(s, _)| padded.contains(&format!(" {} ", s)))
        .fold(None, |best: Option<(&'static str, SectionKind)>, (s, kind)| match best {
            Some((current, _)) if current.len() >= s.len() => best,
            _ => Some((*s, *kind)),
        })
}

fn fuzzy_match(normalized: &str, word_count: usize) -> Option<(&'static str, SectionKind)> {
    let mut best: Option<(&'static str, SectionKind, f64)> = None;

    for (synonym, kind) in HEADING_LEXICON {
        if synonym.split_whitespace().count() != word_count {
            continue;
        }
        let similarity = jaro_winkler(normalized, synonym);
        if similarity < FUZZY_THRESHOLD {
            continue;
        }
        match best {
            Some((_, _, score)) if score >= similarity => {}
            _ => best = Some((*synonym, *kind, similarity)),
        }
    }

    best.map(|(synonym, kind, _)| (synonym, kind))
}

fn starts_with_bullet(trimmed: &str) -> bool {
    crate::input::layout::is_bullet_line(trimmed)
}
