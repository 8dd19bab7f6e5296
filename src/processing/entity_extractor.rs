//! Section segmentation and per-section entity extraction
//!
//! Headings are found line by line with the heading classifier. Content
//! before the first heading becomes an implicit Contact block (and Summary
//! when there is more than one paragraph). Text without any heading is kept
//! as a single `Other` section, so extraction never fails.

use crate::error::{AtsCheckerError, Result};
use crate::input::layout::is_bullet_line;
use crate::input::raw_document::ExtractedText;
use crate::processing::heading_classifier::{classify_heading, LineLayout};
use crate::processing::resume::{Section, SectionKind, StructuredResume};
use crate::processing::skill_lexicon::SkillLexicon;
use log::debug;
use regex::Regex;
use std::sync::Arc;

const MONTH: &str = r"(?:jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec)[a-z]*\.?";
const MAX_CONTACT_LINES: usize = 6;
const MAX_NAME_WORDS: usize = 5;

const TITLE_WORDS: &[&str] = &[
    "engineer", "developer", "manager", "analyst", "intern", "director", "lead", "consultant",
    "designer", "architect", "scientist", "specialist", "coordinator", "administrator",
    "assistant", "officer", "head", "vp", "president", "founder", "associate", "programmer",
    "technician", "researcher", "teacher", "instructor", "supervisor", "sre", "cto", "ceo",
];

const ORG_SUFFIXES: &[&str] = &[
    "inc", "llc", "ltd", "corp", "corporation", "company", "co", "gmbh", "technologies", "labs",
    "group", "solutions", "systems", "agency", "bank", "partners",
];

const INSTITUTION_WORDS: &[&str] = &["university", "college", "institute", "school", "academy", "polytechnic"];

const DEGREE_TOKENS: &[&str] = &[
    "bachelor", "bachelors", "master", "masters", "phd", "doctorate", "associate", "associates",
    "mba", "bs", "ms", "bsc", "msc", "ba", "ma", "beng", "meng",
];

struct EntityPatterns {
    email: Regex,
    phone: Regex,
    linkedin: Regex,
    github: Regex,
    website: Regex,
    date_range: Regex,
    year: Regex,
    separator: Regex,
}

pub struct EntityExtractor {
    lexicon: Arc<SkillLexicon>,
    patterns: EntityPatterns,
}

struct RawSegment<'a> {
    kind: SectionKind,
    heading: Option<String>,
    lines: Vec<&'a str>,
}

impl EntityExtractor {
    pub fn new(lexicon: Arc<SkillLexicon>) -> Result<Self> {
        let date_point = format!(r"(?:{}\s+\d{{4}}|\d{{1,2}}/\d{{4}}|\d{{4}})", MONTH);
        let date_range = format!(
            r"(?i)\b{point}\s*(?:-|–|—|to)\s*(?:{point}|present|current|now)\b",
            point = date_point
        );

        let patterns = EntityPatterns {
            email: compile(r"[A-Za-z0-9._%+\-]+@[A-Za-z0-9.\-]+\.[A-Za-z]{2,}")?,
            phone: compile(r"(?:\+?\d{1,3}[\s.\-]?)?(?:\(\d{3}\)|\d{3})[\s.\-]?\d{3}[\s.\-]?\d{4}")?,
            linkedin: compile(r"(?i)(?:https?://)?(?:www\.)?linkedin\.com/[A-Za-z0-9/_\-]+")?,
            github: compile(r"(?i)(?:https?://)?(?:www\.)?github\.com/[A-Za-z0-9_\-]+")?,
            website: compile(
                r"(?i)\b(?:https?://)?(?:www\.)?[a-z0-9\-]+(?:\.[a-z0-9\-]+)*\.(?:com|io|dev|me|net|org|co|ai|app)\b(?:/[^\s,|]*)?",
            )?,
            date_range: compile(&date_range)?,
            year: compile(r"\b(?:19|20)\d{2}\b")?,
            separator: compile(r"\s*\|\s*|\s+[-–—@]\s+|,\s*|\s+at\s+|[()]")?,
        };

        Ok(Self { lexicon, patterns })
    }

    pub fn extract(&self, extracted: &ExtractedText) -> StructuredResume {
        let lines: Vec<&str> = extracted.text.lines().collect();
        let segments = segment(&lines);

        if !segments.iter().any(|s| s.heading.is_some()) {
            debug!("No section headings found, keeping the text as a single section");
            let mut section = Section::new(SectionKind::Other, None, extracted.text.trim().to_string());
            self.fill_entities(&mut section);
            return StructuredResume {
                sections: vec![section],
            };
        }

        let mut sections = Vec::new();
        for segment in segments {
            if segment.heading.is_none() {
                sections.extend(self.leading_sections(&segment.lines));
                continue;
            }
            let mut section = Section::new(segment.kind, segment.heading, join_trimmed(&segment.lines));
            self.fill_entities(&mut section);
            sections.push(section);
        }

        StructuredResume { sections }
    }

    /// Content above the first heading: contact block, then summary
    fn leading_sections(&self, lines: &[&str]) -> Vec<Section> {
        let paragraphs = paragraphs(lines);
        let mut sections = Vec::new();
        let mut rest = paragraphs.as_slice();

        if let Some((first, tail)) = paragraphs.split_first() {
            let joined = first.join("\n");
            if self.has_contact_markers(&joined) || first.len() <= MAX_CONTACT_LINES {
                let mut contact = Section::new(SectionKind::Contact, None, joined);
                self.fill_entities(&mut contact);
                sections.push(contact);
                rest = tail;
            }
        }

        if !rest.is_empty() {
            let text = rest
                .iter()
                .map(|p| p.join("\n"))
                .collect::<Vec<_>>()
                .join("\n\n");
            sections.push(Section::new(SectionKind::Summary, None, text));
        }
        sections
    }

    fn has_contact_markers(&self, text: &str) -> bool {
        let p = &self.patterns;
        p.email.is_match(text) || p.phone.is_match(text) || p.linkedin.is_match(text) || p.github.is_match(text)
    }

    fn fill_entities(&self, section: &mut Section) {
        let text = section.raw_text.clone();
        let entities: Vec<(&str, Vec<String>)> = match section.kind {
            SectionKind::Contact => self.contact_entities(&text),
            SectionKind::Experience => self.experience_entities(&text),
            SectionKind::Education => self.education_entities(&text),
            SectionKind::Skills => vec![("skills", skill_entities(&text))],
            SectionKind::Projects => self.project_entities(&text),
            SectionKind::Summary | SectionKind::Other => Vec::new(),
        };

        for (field, values) in entities {
            if !values.is_empty() {
                section.entities.insert(field.to_string(), values);
            }
        }
    }

    fn contact_entities(&self, text: &str) -> Vec<(&'static str, Vec<String>)> {
        let p = &self.patterns;
        let all = |re: &Regex, haystack: &str| {
            let mut found = Vec::new();
            for m in re.find_iter(haystack) {
                push_unique(&mut found, m.as_str().trim());
            }
            found
        };

        let emails = all(&p.email, text);
        let linkedin = all(&p.linkedin, text);
        let github = all(&p.github, text);

        // Strip already-claimed spans so their domains don't count as websites
        let mut remainder = text.to_string();
        for claimed in emails.iter().chain(&linkedin).chain(&github) {
            remainder = remainder.replace(claimed.as_str(), " ");
        }
        let websites = all(&p.website, &remainder);

        let name = text
            .lines()
            .map(str::trim)
            .find(|line| {
                !line.is_empty()
                    && line.split_whitespace().count() <= MAX_NAME_WORDS
                    && line.chars().any(char::is_alphabetic)
                    && !line.chars().any(|c| c.is_ascii_digit())
                    && !line.contains('@')
                    && !line.contains('/')
                    && !line.contains('|')
            })
            .map(|line| vec![line.to_string()])
            .unwrap_or_default();

        vec![
            ("name", name),
            ("email", emails),
            ("phone", all(&p.phone, text)),
            ("linkedin", linkedin),
            ("github", github),
            ("website", websites),
        ]
    }

    fn experience_entities(&self, text: &str) -> Vec<(&'static str, Vec<String>)> {
        let mut titles = Vec::new();
        let mut organizations = Vec::new();
        let mut date_ranges = Vec::new();

        let lines: Vec<&str> = text.lines().map(str::trim).collect();
        for (i, line) in lines.iter().enumerate() {
            if line.is_empty() || is_bullet_line(line) {
                continue;
            }

            let ranges: Vec<&str> = self.patterns.date_range.find_iter(line).map(|m| m.as_str()).collect();
            if ranges.is_empty() {
                if has_org_suffix(line) && !self.header_precedes_date(&lines, i) {
                    for piece in self.pieces(line) {
                        if has_org_suffix(&piece) {
                            push_unique(&mut organizations, &piece);
                        }
                    }
                }
                continue;
            }
            for range in ranges {
                push_unique(&mut date_ranges, range.trim());
            }

            let remainder = self.patterns.date_range.replace_all(line, " ");
            let remainder = trim_separators(&remainder);
            let header_lines: Vec<String> = if remainder.is_empty() {
                self.preceding_header_lines(&lines, i)
            } else {
                vec![remainder.to_string()]
            };

            let pieces: Vec<String> = if header_lines.len() == 1 {
                self.pieces(&header_lines[0])
            } else {
                header_lines
            };
            assign_title_and_org(&pieces, &mut titles, &mut organizations);
        }

        vec![
            ("titles", titles),
            ("organizations", organizations),
            ("date_ranges", date_ranges),
        ]
    }

    /// Up to two plain lines directly above a date-only line
    fn preceding_header_lines(&self, lines: &[&str], index: usize) -> Vec<String> {
        let mut found = Vec::new();
        for line in lines[..index].iter().rev() {
            if line.is_empty() || is_bullet_line(line) || self.patterns.date_range.is_match(line) {
                break;
            }
            found.push(trim_separators(line).to_string());
            if found.len() == 2 {
                break;
            }
        }
        found.reverse();
        found
    }

    /// Whether this line is picked up as a header by a date-only line below it
    fn header_precedes_date(&self, lines: &[&str], index: usize) -> bool {
        lines[index + 1..]
            .iter()
            .take(2)
            .take_while(|l| !l.is_empty() && !is_bullet_line(l))
            .any(|l| {
                self.patterns.date_range.is_match(l) && trim_separators(&self.patterns.date_range.replace_all(l, " ")).is_empty()
            })
    }

    fn education_entities(&self, text: &str) -> Vec<(&'static str, Vec<String>)> {
        let mut degrees = Vec::new();
        let mut institutions = Vec::new();
        let mut years = Vec::new();

        for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
            let line = strip_bullet(line);
            for piece in self.pieces(line) {
                if has_degree_token(&piece) {
                    push_unique(&mut degrees, &piece);
                } else if contains_word(&piece, INSTITUTION_WORDS) {
                    push_unique(&mut institutions, &piece);
                }
            }
            for m in self.patterns.year.find_iter(line) {
                push_unique(&mut years, m.as_str());
            }
        }

        vec![("degrees", degrees), ("institutions", institutions), ("years", years)]
    }

    fn project_entities(&self, text: &str) -> Vec<(&'static str, Vec<String>)> {
        let mut names = Vec::new();
        let mut previous_blank = true;
        for line in text.lines().map(str::trim) {
            if line.is_empty() {
                previous_blank = true;
                continue;
            }
            if previous_blank && !is_bullet_line(line) {
                let head = line.split(':').next().unwrap_or(line);
                if let Some(name) = self.pieces(head).into_iter().next() {
                    push_unique(&mut names, &name);
                }
            }
            previous_blank = false;
        }

        let mut technologies = Vec::new();
        for hit in self.lexicon.find(text) {
            push_unique(&mut technologies, &hit.term);
        }

        vec![("names", names), ("technologies", technologies)]
    }

    fn pieces(&self, line: &str) -> Vec<String> {
        self.patterns
            .separator
            .split(line)
            .map(trim_separators)
            .filter(|p| !p.is_empty())
            .map(str::to_string)
            .collect()
    }
}

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| AtsCheckerError::Processing(format!("Invalid entity pattern: {}", e)))
}

/// Split lines into headed segments using the classifier
fn segment<'a>(lines: &[&'a str]) -> Vec<RawSegment<'a>> {
    let blank = |i: usize| lines.get(i).map(|l| l.trim().is_empty()).unwrap_or(true);

    let mut segments = vec![RawSegment {
        kind: SectionKind::Other,
        heading: None,
        lines: Vec::new(),
    }];

    for (i, line) in lines.iter().enumerate() {
        let layout = LineLayout {
            blank_before: i == 0 || blank(i - 1),
            blank_after: blank(i + 1),
        };
        match classify_heading(line, layout) {
            Some(heading) => {
                debug!("Heading '{}' -> {} ({:?})", line.trim(), heading.kind, heading.method);
                segments.push(RawSegment {
                    kind: heading.kind,
                    heading: Some(line.trim().to_string()),
                    lines: Vec::new(),
                });
            }
            None => {
                if let Some(current) = segments.last_mut() {
                    current.lines.push(*line);
                }
            }
        }
    }

    // Drop an empty leading block
    if segments[0].lines.iter().all(|l| l.trim().is_empty()) {
        segments.remove(0);
    }
    segments
}

fn paragraphs<'a>(lines: &[&'a str]) -> Vec<Vec<&'a str>> {
    let mut paragraphs = Vec::new();
    let mut current = Vec::new();
    for line in lines {
        if line.trim().is_empty() {
            if !current.is_empty() {
                paragraphs.push(std::mem::take(&mut current));
            }
        } else {
            current.push(line.trim());
        }
    }
    if !current.is_empty() {
        paragraphs.push(current);
    }
    paragraphs
}

fn join_trimmed(lines: &[&str]) -> String {
    lines.join("\n").trim().to_string()
}

fn trim_separators(text: &str) -> &str {
    text.trim_matches(|c: char| c.is_whitespace() || matches!(c, '|' | '-' | '–' | '—' | ',' | '(' | ')' | '@' | ':'))
}

fn strip_bullet(line: &str) -> &str {
    if !is_bullet_line(line) {
        return line.trim();
    }
    line.trim_start()
        .trim_start_matches(|c: char| c.is_ascii_digit())
        .trim_start_matches(|c: char| !c.is_alphanumeric() && !c.is_whitespace())
        .trim()
}

fn words_lower(text: &str) -> Vec<String> {
    text.to_lowercase()
        .replace('.', "")
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_string)
        .collect()
}

fn contains_word(text: &str, words: &[&str]) -> bool {
    words_lower(text).iter().any(|w| words.contains(&w.as_str()))
}

fn has_degree_token(text: &str) -> bool {
    contains_word(text, DEGREE_TOKENS)
}

fn has_org_suffix(text: &str) -> bool {
    words_lower(text)
        .last()
        .map(|w| ORG_SUFFIXES.contains(&w.as_str()))
        .unwrap_or(false)
        || contains_word(text, &["inc", "llc", "ltd", "gmbh", "corp"])
}

fn is_title(text: &str) -> bool {
    contains_word(text, TITLE_WORDS)
}

fn assign_title_and_org(pieces: &[String], titles: &mut Vec<String>, organizations: &mut Vec<String>) {
    match pieces {
        [] => {}
        [only] => {
            if is_title(only) {
                push_unique(titles, only);
            } else {
                push_unique(organizations, only);
            }
        }
        [first, second, ..] => {
            if is_title(second) && !is_title(first) {
                push_unique(titles, second);
                push_unique(organizations, first);
            } else {
                push_unique(titles, first);
                push_unique(organizations, second);
            }
        }
    }
}

fn skill_entities(text: &str) -> Vec<String> {
    let mut skills = Vec::new();
    for line in text.lines() {
        let line = strip_bullet(line);
        let values = match line.split_once(':') {
            Some((label, rest)) if label.split_whitespace().count() <= 4 => rest,
            _ => line,
        };
        for item in values.split([',', ';', '|', '•', '·', '/']) {
            let item = item.trim().trim_end_matches('.').trim();
            if !item.is_empty() {
                push_unique(&mut skills, item);
            }
        }
    }
    skills
}

/// Case-insensitive dedupe that keeps the first spelling
fn push_unique(values: &mut Vec<String>, value: &str) {
    if !values.iter().any(|v| v.eq_ignore_ascii_case(value)) {
        values.push(value.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::raw_document::FormatMetadata;

    fn extractor() -> EntityExtractor {
        EntityExtractor::new(Arc::new(SkillLexicon::new().unwrap())).unwrap()
    }

    fn extract(text: &str) -> StructuredResume {
        extractor().extract(&ExtractedText::new(text.to_string(), FormatMetadata::default()))
    }

    const RESUME: &str = "Jane Doe
jane.doe@example.com | (555) 123-4567
linkedin.com/in/janedoe | janedoe.dev

Backend engineer with eight years of experience building data platforms.

EXPERIENCE

Senior Software Engineer, Acme Corp, Jan 2020 - Present
- Led a team of five engineers
- Built Rust services

Data Engineer
Beta Analytics LLC
06/2016 - 12/2019
- Maintained SQL pipelines

Education

B.S. in Computer Science, State University, 2016

Skills
Languages: Rust, Python, SQL
Tools: Docker / Kubernetes; Git

Projects

Resume Checker: a CLI in Rust and SQL
- Parses PDFs
";

    #[test]
    fn test_sections_in_source_order() {
        let resume = extract(RESUME);
        assert_eq!(
            resume.kinds(),
            vec![
                SectionKind::Contact,
                SectionKind::Summary,
                SectionKind::Experience,
                SectionKind::Education,
                SectionKind::Skills,
                SectionKind::Projects,
            ]
        );
        assert_eq!(resume.sections[2].heading.as_deref(), Some("EXPERIENCE"));
    }

    #[test]
    fn test_contact_entities() {
        let resume = extract(RESUME);
        let contact = &resume.sections[0];
        assert_eq!(contact.entity("name"), ["Jane Doe"]);
        assert_eq!(contact.entity("email"), ["jane.doe@example.com"]);
        assert_eq!(contact.entity("phone"), ["(555) 123-4567"]);
        assert_eq!(contact.entity("linkedin"), ["linkedin.com/in/janedoe"]);
        assert_eq!(contact.entity("website"), ["janedoe.dev"]);
    }

    #[test]
    fn test_experience_entities() {
        let resume = extract(RESUME);
        let experience = resume.sections_of(SectionKind::Experience).next().unwrap();

        assert_eq!(experience.entity("date_ranges"), ["Jan 2020 - Present", "06/2016 - 12/2019"]);
        assert_eq!(experience.entity("titles"), ["Senior Software Engineer", "Data Engineer"]);
        assert_eq!(experience.entity("organizations"), ["Acme Corp", "Beta Analytics LLC"]);
    }

    #[test]
    fn test_education_entities() {
        let resume = extract(RESUME);
        let education = resume.sections_of(SectionKind::Education).next().unwrap();
        assert_eq!(education.entity("degrees"), ["B.S. in Computer Science"]);
        assert_eq!(education.entity("institutions"), ["State University"]);
        assert_eq!(education.entity("years"), ["2016"]);
    }

    #[test]
    fn test_skill_entities() {
        let resume = extract(RESUME);
        let skills = resume.sections_of(SectionKind::Skills).next().unwrap();
        assert_eq!(
            skills.entity("skills"),
            ["Rust", "Python", "SQL", "Docker", "Kubernetes", "Git"]
        );
    }

    #[test]
    fn test_project_entities() {
        let resume = extract(RESUME);
        let projects = resume.sections_of(SectionKind::Projects).next().unwrap();
        assert_eq!(projects.entity("names"), ["Resume Checker"]);
        assert!(projects.entity("technologies").contains(&"rust".to_string()));
        assert!(projects.entity("technologies").contains(&"sql".to_string()));
    }

    #[test]
    fn test_no_headings_yields_single_other_section() {
        let resume = extract("just some words\nwithout any structure at all");
        assert_eq!(resume.kinds(), vec![SectionKind::Other]);
        assert!(resume.sections[0].raw_text.contains("without any structure"));
    }

    #[test]
    fn test_malformed_input_never_panics() {
        for text in ["", "\n\n\n", "::::\n|||\n- \n•", "Experience", "Skills\n,,,;;;"] {
            let resume = extract(text);
            assert!(!resume.sections.is_empty() || text.trim().is_empty());
        }
    }

    #[test]
    fn test_duplicate_skills_keep_first_spelling() {
        assert_eq!(skill_entities("Python, python, PYTHON\n- SQL"), ["Python", "SQL"]);
    }
}
