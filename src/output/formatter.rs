//! Output formatters: console, JSON, Markdown and HTML

use crate::config::OutputFormat;
use crate::error::{AtsCheckerError, Result};
use crate::output::report::AnalysisReport;
use crate::processing::ats_rules::{Issue, Severity};
use askama::Template;
use colored::{Color, Colorize};
use std::path::Path;

const MAX_LISTED_KEYWORDS: usize = 15;

/// Trait for rendering an analysis report
pub trait OutputFormatter {
    fn format_report(&self, report: &AnalysisReport) -> Result<String>;
    fn supports_format(&self) -> OutputFormat;
}

/// Console formatter with optional colors
pub struct ConsoleFormatter {
    use_colors: bool,
    detailed: bool,
}

/// JSON formatter for scripting and integrations
pub struct JsonFormatter {
    pretty: bool,
}

pub struct MarkdownFormatter {
    include_metadata: bool,
}

pub struct HtmlFormatter {
    include_styles: bool,
}

/// Report generator that dispatches to the formatter for a format
pub struct ReportGenerator {
    console_formatter: ConsoleFormatter,
    json_formatter: JsonFormatter,
    markdown_formatter: MarkdownFormatter,
    html_formatter: HtmlFormatter,
}

#[derive(Template)]
#[template(source = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>ATS Compatibility Report: {{ profile_name }}</title>
    {% if include_styles %}
    <style>
        body {
            font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif;
            line-height: 1.6;
            color: #333;
            max-width: 900px;
            margin: 0 auto;
            padding: 20px;
            background: #f8f9fa;
        }
        .container { background: white; padding: 30px; border-radius: 8px; box-shadow: 0 2px 10px rgba(0,0,0,0.1); }
        .header { text-align: center; margin-bottom: 30px; }
        .score-badge { display: inline-block; padding: 4px 12px; border-radius: 12px; color: white; font-size: 0.8em; }
        .score-excellent { background: #28a745; }
        .score-good { background: #17a2b8; }
        .score-fair { background: #ffc107; color: #000; }
        .score-poor { background: #dc3545; }
        .section { margin: 25px 0; }
        table { border-collapse: collapse; width: 100%; }
        th, td { text-align: left; padding: 6px 10px; border-bottom: 1px solid #e9ecef; }
        .issue { border-left: 4px solid #17a2b8; padding: 6px 12px; margin: 8px 0; background: #f8f9fa; }
        .issue-critical { border-left-color: #dc3545; }
        .issue-warning { border-left-color: #ffc107; }
        .issue-info { border-left-color: #17a2b8; }
        .metadata { font-size: 0.85em; color: #6c757d; border-top: 1px solid #e9ecef; padding-top: 15px; }
    </style>
    {% endif %}
</head>
<body>
    <div class="container">
        <div class="header">
            <h1>ATS Compatibility Report</h1>
            <p>{{ source_name }} against {{ profile_name }} | Generated: {{ generated_at }}</p>
        </div>

        <div class="section">
            <h2>Overall Score: {{ overall }} <span class="score-badge {{ score_class }}">{{ score_label }}</span></h2>
            <table>
                <tr><th>Component</th><th>Score</th><th>Weight</th></tr>
                {% for row in score_rows %}
                <tr><td>{{ row.label }}</td><td>{{ row.score }}</td><td>{{ row.weight }}</td></tr>
                {% endfor %}
            </table>
        </div>

        <div class="section">
            <h2>Issues</h2>
            {% if issues.is_empty() %}
            <p>No compatibility issues found.</p>
            {% endif %}
            {% for issue in issues %}
            <div class="issue issue-{{ issue.severity }}">
                <strong>{{ issue.severity }}</strong> <code>{{ issue.code }}</code>: {{ issue.message }}
            </div>
            {% endfor %}
        </div>

        {% if has_keywords %}
        <div class="section">
            <h2>Keywords</h2>
            <p><strong>Matched:</strong> {{ matched }}</p>
            <p><strong>Missing:</strong> {{ missing }}</p>
        </div>
        {% endif %}

        <div class="section">
            <h2>Recommendations</h2>
            <ul>
                {% for line in feedback %}
                <li>{{ line }}</li>
                {% endfor %}
            </ul>
        </div>

        <div class="metadata">
            <p>ATS Resume Checker v{{ version }} | Processing time: {{ processing_time }}ms</p>
            {% for note in notes %}
            <p>{{ note }}</p>
            {% endfor %}
        </div>
    </div>
</body>
</html>"#, ext = "html")]
struct HtmlTemplate {
    include_styles: bool,
    profile_name: String,
    source_name: String,
    generated_at: String,
    overall: String,
    score_class: String,
    score_label: String,
    score_rows: Vec<HtmlScoreRow>,
    issues: Vec<HtmlIssue>,
    has_keywords: bool,
    matched: String,
    missing: String,
    feedback: Vec<String>,
    notes: Vec<String>,
    version: String,
    processing_time: u64,
}

struct HtmlScoreRow {
    label: String,
    score: String,
    weight: String,
}

struct HtmlIssue {
    severity: String,
    code: String,
    message: String,
}

fn score_label(score: f64) -> (&'static str, &'static str, Color) {
    match score {
        s if s >= 90.0 => ("EXCELLENT", "score-excellent", Color::Green),
        s if s >= 80.0 => ("STRONG", "score-good", Color::BrightGreen),
        s if s >= 60.0 => ("FAIR", "score-fair", Color::Yellow),
        _ => ("NEEDS WORK", "score-poor", Color::Red),
    }
}

/// Component label, score and weight in display order
fn score_rows(report: &AnalysisReport) -> Vec<(&'static str, f64, f64)> {
    let scores = &report.scores;
    vec![
        ("Keyword match", scores.keyword_score, scores.weights.keyword),
        ("Formatting", scores.formatting_score, scores.weights.formatting),
        ("Structure", scores.structure_score, scores.weights.structure),
        ("File type", scores.filetype_score, scores.weights.file_type),
    ]
}

fn keyword_list<'a>(terms: impl Iterator<Item = &'a String>) -> String {
    let terms: Vec<&str> = terms.map(String::as_str).collect();
    if terms.is_empty() {
        return "none".to_string();
    }
    let mut listed = terms
        .iter()
        .take(MAX_LISTED_KEYWORDS)
        .copied()
        .collect::<Vec<_>>()
        .join(", ");
    if terms.len() > MAX_LISTED_KEYWORDS {
        listed.push_str(&format!(" (+{} more)", terms.len() - MAX_LISTED_KEYWORDS));
    }
    listed
}

impl ConsoleFormatter {
    pub fn new(use_colors: bool, detailed: bool) -> Self {
        Self { use_colors, detailed }
    }

    fn colorize(&self, text: &str, color: Color) -> String {
        if self.use_colors {
            text.color(color).to_string()
        } else {
            text.to_string()
        }
    }

    fn format_header(&self, title: &str, level: u8) -> String {
        let (prefix, color) = match level {
            1 => ("█", Color::Blue),
            2 => ("▓", Color::Green),
            _ => ("▒", Color::Yellow),
        };

        if self.use_colors {
            format!("\n{} {}\n", prefix.color(color).bold(), title.color(color).bold())
        } else {
            format!("\n{} {}\n", prefix, title)
        }
    }

    fn format_score_badge(&self, score: f64) -> String {
        let (badge, _, color) = score_label(score);
        if self.use_colors {
            format!("[{}]", badge.color(color).bold())
        } else {
            format!("[{}]", badge)
        }
    }

    fn format_issue(&self, issue: &Issue) -> String {
        let (tag, color) = match issue.severity {
            Severity::Critical => ("[!]", Color::Red),
            Severity::Warning => ("[*]", Color::Yellow),
            Severity::Info => ("[-]", Color::Blue),
        };
        format!("{} {} ({})\n", self.colorize(tag, color), issue.message, issue.code)
    }
}

impl OutputFormatter for ConsoleFormatter {
    fn format_report(&self, report: &AnalysisReport) -> Result<String> {
        let mut output = String::new();
        let metadata = &report.metadata;

        output.push_str(&self.format_header("ATS COMPATIBILITY REPORT", 1));
        output.push_str(&format!(
            "Resume: {} ({}) | Profile: {}\n",
            metadata.source_name, metadata.file_type, metadata.profile_name
        ));
        output.push_str(&format!(
            "Generated: {} | Processing time: {}ms\n",
            metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC"),
            metadata.processing_time_ms
        ));

        output.push_str(&self.format_header("Score", 2));
        output.push_str(&format!(
            "Overall: {:.1}/100 {}\n",
            report.scores.overall,
            self.format_score_badge(report.scores.overall)
        ));
        for (label, score, weight) in score_rows(report) {
            output.push_str(&format!("  {:<14} {:>5.1}  (weight {:.0}%)\n", label, score, weight * 100.0));
        }

        output.push_str(&self.format_header("Issues", 2));
        if report.issues.is_empty() {
            output.push_str(&self.colorize("No compatibility issues found.\n", Color::Green));
        }
        for issue in &report.issues {
            output.push_str(&self.format_issue(issue));
        }

        if report.keywords.has_job_keywords() {
            output.push_str(&self.format_header("Keywords", 2));
            output.push_str(&format!(
                "Matched: {}\n",
                self.colorize(&keyword_list(report.keywords.matched.iter()), Color::Green)
            ));
            output.push_str(&format!(
                "Missing: {}\n",
                self.colorize(&keyword_list(report.keywords.missing.iter()), Color::Red)
            ));
            for partial in &report.keywords.partial {
                output.push_str(&format!(
                    "Partial: {} ~ {} ({:.2})\n",
                    partial.job_term, partial.resume_term, partial.similarity
                ));
            }
        }

        output.push_str(&self.format_header("Recommendations", 2));
        for (i, line) in report.feedback.iter().enumerate() {
            output.push_str(&format!("{}. {}\n", i + 1, line));
        }

        if self.detailed {
            output.push_str(&self.format_header("Sections", 3));
            for section in &report.resume.sections {
                let heading = section.heading.as_deref().unwrap_or("(implicit)");
                output.push_str(&format!("{} - {}\n", section.kind, heading));
                for (field, values) in &section.entities {
                    output.push_str(&format!("    {}: {}\n", field, values.join("; ")));
                }
            }

            let extracted = &report.extracted_metadata;
            output.push_str(&self.format_header("Document", 3));
            output.push_str(&format!(
                "Pages: {} | Tables: {} | Columns: {} | Images: {} | Headers/footers: {} | Bullets: {}\n",
                extracted.page_count,
                extracted.has_tables,
                extracted.has_columns,
                extracted.has_images,
                extracted.has_headers_footers,
                extracted.has_bullet_points
            ));
            if !extracted.font_names.is_empty() {
                let fonts: Vec<&str> = extracted.font_names.iter().map(String::as_str).collect();
                output.push_str(&format!("Fonts: {}\n", fonts.join(", ")));
            }
        }

        if !metadata.degraded.is_empty() || !metadata.notes.is_empty() {
            output.push_str(&self.format_header("Notes", 3));
            for degraded in &metadata.degraded {
                output.push_str(&self.colorize(
                    &format!("{} unavailable: {}\n", degraded.capability, degraded.reason),
                    Color::Yellow,
                ));
            }
            for note in &metadata.notes {
                output.push_str(&format!("{}\n", note));
            }
        }

        Ok(output)
    }

    fn supports_format(&self) -> OutputFormat {
        OutputFormat::Console
    }
}

impl JsonFormatter {
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }
}

impl OutputFormatter for JsonFormatter {
    fn format_report(&self, report: &AnalysisReport) -> Result<String> {
        if self.pretty {
            Ok(serde_json::to_string_pretty(report)?)
        } else {
            Ok(serde_json::to_string(report)?)
        }
    }

    fn supports_format(&self) -> OutputFormat {
        OutputFormat::Json
    }
}

impl MarkdownFormatter {
    pub fn new(include_metadata: bool) -> Self {
        Self { include_metadata }
    }

    fn severity_badge(severity: Severity) -> &'static str {
        match severity {
            Severity::Critical => "🔴 Critical",
            Severity::Warning => "🟡 Warning",
            Severity::Info => "🔵 Info",
        }
    }
}

impl OutputFormatter for MarkdownFormatter {
    fn format_report(&self, report: &AnalysisReport) -> Result<String> {
        let mut output = String::new();
        let metadata = &report.metadata;

        output.push_str(&format!("# ATS Compatibility Report: {}\n\n", metadata.profile_name));

        if self.include_metadata {
            output.push_str(&format!(
                "**Resume:** `{}` ({}) | **Generated:** {} | **Processing Time:** {}ms\n\n",
                metadata.source_name,
                metadata.file_type,
                metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC"),
                metadata.processing_time_ms
            ));
        }

        output.push_str(&format!(
            "## Overall Score: {:.1}/100 ({})\n\n",
            report.scores.overall,
            score_label(report.scores.overall).0
        ));
        output.push_str("| Component | Score | Weight |\n");
        output.push_str("|-----------|-------|--------|\n");
        for (label, score, weight) in score_rows(report) {
            output.push_str(&format!("| {} | {:.1} | {:.0}% |\n", label, score, weight * 100.0));
        }
        output.push('\n');

        output.push_str("## Issues\n\n");
        if report.issues.is_empty() {
            output.push_str("No compatibility issues found.\n");
        }
        for issue in &report.issues {
            output.push_str(&format!(
                "- **{}** `{}`: {}\n",
                Self::severity_badge(issue.severity),
                issue.code,
                issue.message
            ));
        }
        output.push('\n');

        if report.keywords.has_job_keywords() {
            output.push_str("## Keywords\n\n");
            output.push_str(&format!("- **Matched:** {}\n", keyword_list(report.keywords.matched.iter())));
            output.push_str(&format!("- **Missing:** {}\n", keyword_list(report.keywords.missing.iter())));
            for partial in &report.keywords.partial {
                output.push_str(&format!(
                    "- **Partial:** {} ~ {} ({:.2})\n",
                    partial.job_term, partial.resume_term, partial.similarity
                ));
            }
            output.push('\n');
        }

        output.push_str("## Recommendations\n\n");
        for (i, line) in report.feedback.iter().enumerate() {
            output.push_str(&format!("{}. {}\n", i + 1, line));
        }

        if self.include_metadata && (!metadata.degraded.is_empty() || !metadata.notes.is_empty()) {
            output.push_str("\n---\n\n");
            for degraded in &metadata.degraded {
                output.push_str(&format!("> {} unavailable: {}\n", degraded.capability, degraded.reason));
            }
            for note in &metadata.notes {
                output.push_str(&format!("> {}\n", note));
            }
        }

        Ok(output)
    }

    fn supports_format(&self) -> OutputFormat {
        OutputFormat::Markdown
    }
}

impl HtmlFormatter {
    pub fn new(include_styles: bool) -> Self {
        Self { include_styles }
    }

    fn create_template_data(&self, report: &AnalysisReport) -> HtmlTemplate {
        let metadata = &report.metadata;
        let (label, class, _) = score_label(report.scores.overall);

        let mut notes: Vec<String> = metadata
            .degraded
            .iter()
            .map(|d| format!("{} unavailable: {}", d.capability, d.reason))
            .collect();
        notes.extend(metadata.notes.iter().cloned());

        HtmlTemplate {
            include_styles: self.include_styles,
            profile_name: metadata.profile_name.clone(),
            source_name: metadata.source_name.clone(),
            generated_at: metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
            overall: format!("{:.1}", report.scores.overall),
            score_class: class.to_string(),
            score_label: label.to_string(),
            score_rows: score_rows(report)
                .into_iter()
                .map(|(label, score, weight)| HtmlScoreRow {
                    label: label.to_string(),
                    score: format!("{:.1}", score),
                    weight: format!("{:.0}%", weight * 100.0),
                })
                .collect(),
            issues: report
                .issues
                .iter()
                .map(|i| HtmlIssue {
                    severity: i.severity.to_string(),
                    code: i.code.clone(),
                    message: i.message.clone(),
                })
                .collect(),
            has_keywords: report.keywords.has_job_keywords(),
            matched: keyword_list(report.keywords.matched.iter()),
            missing: keyword_list(report.keywords.missing.iter()),
            feedback: report.feedback.clone(),
            notes,
            version: metadata.tool_version.clone(),
            processing_time: metadata.processing_time_ms,
        }
    }
}

impl OutputFormatter for HtmlFormatter {
    fn format_report(&self, report: &AnalysisReport) -> Result<String> {
        self.create_template_data(report)
            .render()
            .map_err(|e| AtsCheckerError::OutputFormatting(e.to_string()))
    }

    fn supports_format(&self) -> OutputFormat {
        OutputFormat::Html
    }
}

impl ReportGenerator {
    pub fn new() -> Self {
        Self::with_options(true, false, true, true, true)
    }

    pub fn with_options(
        use_colors: bool,
        detailed: bool,
        pretty_json: bool,
        include_metadata: bool,
        include_html_styles: bool,
    ) -> Self {
        Self {
            console_formatter: ConsoleFormatter::new(use_colors, detailed),
            json_formatter: JsonFormatter::new(pretty_json),
            markdown_formatter: MarkdownFormatter::new(include_metadata),
            html_formatter: HtmlFormatter::new(include_html_styles),
        }
    }

    pub fn generate_report(&self, report: &AnalysisReport, format: &OutputFormat) -> Result<String> {
        match format {
            OutputFormat::Console => self.console_formatter.format_report(report),
            OutputFormat::Json => self.json_formatter.format_report(report),
            OutputFormat::Markdown => self.markdown_formatter.format_report(report),
            OutputFormat::Html => self.html_formatter.format_report(report),
        }
    }
}

impl Default for ReportGenerator {
    fn default() -> Self {
        Self::new()
    }
}

pub fn save_report_to_file(content: &str, file_path: &Path) -> Result<()> {
    use std::fs;
    if let Some(parent) = file_path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(file_path, content)?;
    Ok(())
}

pub fn suggest_filename(format: &OutputFormat, resume_name: &str, timestamp: bool) -> String {
    let base_name = Path::new(resume_name)
        .file_stem()
        .unwrap_or_default()
        .to_string_lossy();

    let timestamp_suffix = if timestamp {
        format!("_{}", chrono::Utc::now().format("%Y%m%d_%H%M%S"))
    } else {
        String::new()
    };

    let extension = match format {
        OutputFormat::Console => "txt",
        OutputFormat::Json => "json",
        OutputFormat::Markdown => "md",
        OutputFormat::Html => "html",
    };
    format!("{}_ats_report{}.{}", base_name, timestamp_suffix, extension)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{FileType, FormatMetadata};
    use crate::output::report::ReportMetadata;
    use crate::processing::capabilities::{Capability, DegradedCapability};
    use crate::processing::keyword_matcher::{Keyword, KeywordMatchResult, KeywordSource};
    use crate::processing::resume::StructuredResume;
    use crate::processing::scoring::{ScoreBreakdown, ScoreWeights};
    use tempfile::TempDir;

    fn report() -> AnalysisReport {
        AnalysisReport {
            resume: StructuredResume::default(),
            extracted_metadata: FormatMetadata::default(),
            issues: vec![Issue {
                code: "formatting.tables".to_string(),
                severity: Severity::Critical,
                message: "Taleo does not handle <table> layouts".to_string(),
                affected_section: None,
            }],
            scores: ScoreBreakdown {
                keyword_score: 66.7,
                formatting_score: 85.0,
                structure_score: 100.0,
                filetype_score: 100.0,
                overall: 79.2,
                weights: ScoreWeights::derive(0.5, None),
            },
            keywords: KeywordMatchResult {
                job_keywords: vec![Keyword {
                    term: "leadership".to_string(),
                    weight: 1.0,
                    source: KeywordSource::Job,
                }],
                matched: ["python".to_string(), "sql".to_string()].into_iter().collect(),
                missing: ["leadership".to_string()].into_iter().collect(),
                score: 66.7,
                ..KeywordMatchResult::default()
            },
            feedback: vec!["Your resume is moderately compatible with Taleo (79.2/100).".to_string()],
            metadata: ReportMetadata {
                profile_key: "taleo".to_string(),
                profile_name: "Taleo".to_string(),
                source_name: "resume.pdf".to_string(),
                file_type: FileType::Pdf,
                generated_at: chrono::Utc::now(),
                processing_time_ms: 5,
                degraded: vec![DegradedCapability {
                    capability: Capability::Ocr,
                    reason: "tesseract not found".to_string(),
                }],
                notes: Vec::new(),
                tool_version: ReportMetadata::tool_version(),
            },
        }
    }

    #[test]
    fn test_console_output() {
        let output = ConsoleFormatter::new(false, true).format_report(&report()).unwrap();
        assert!(output.contains("Overall: 79.2/100 [FAIR]"));
        assert!(output.contains("[!] Taleo does not handle <table> layouts (formatting.tables)"));
        assert!(output.contains("Missing: leadership"));
        assert!(output.contains("OCR unavailable: tesseract not found"));
    }

    #[test]
    fn test_json_output() {
        let output = JsonFormatter::new(false).format_report(&report()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["scores"]["overall"], 79.2);
        assert_eq!(value["metadata"]["degraded"][0]["capability"], "ocr");
    }

    #[test]
    fn test_markdown_output() {
        let output = MarkdownFormatter::new(true).format_report(&report()).unwrap();
        assert!(output.starts_with("# ATS Compatibility Report: Taleo"));
        assert!(output.contains("| Formatting | 85.0 | 17% |"));
        assert!(output.contains("`formatting.tables`"));
    }

    #[test]
    fn test_html_output_escapes() {
        let output = HtmlFormatter::new(false).format_report(&report()).unwrap();
        assert!(output.contains("<title>ATS Compatibility Report: Taleo</title>"));
        assert!(output.contains("&lt;table&gt;"));
        assert!(!output.contains("<style>"));
    }

    #[test]
    fn test_save_and_suggest_filename() {
        assert_eq!(
            suggest_filename(&OutputFormat::Json, "/tmp/jane_resume.pdf", false),
            "jane_resume_ats_report.json"
        );

        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("reports").join("out.md");
        save_report_to_file("# report", &path).unwrap();
        assert_eq!(std::fs::read_to_string(path).unwrap(), "# report");
    }
}
