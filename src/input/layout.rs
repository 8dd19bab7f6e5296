//! Layout heuristics over extracted plain text

const BULLET_GLYPHS: &[char] = &['•', '·', '‣', '⁃', '⦿', '⦾', '✓', '✔', '➢', '➤', '▪', '◦'];
const DEEP_INDENT: usize = 20;
const WIDE_GAP: usize = 8;
const TABLE_GAP: usize = 3;

/// Layout features detected from text alone
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LayoutSignals {
    pub has_tables: bool,
    pub has_columns: bool,
    pub has_headers_footers: bool,
    pub has_bullet_points: bool,
}

/// Run every text heuristic. `pages` enables repeated header/footer detection.
pub fn analyze(text: &str, pages: &[String]) -> LayoutSignals {
    LayoutSignals {
        has_tables: detect_tables(text),
        has_columns: detect_columns(text),
        has_headers_footers: detect_headers_footers(text, pages),
        has_bullet_points: text.lines().any(is_bullet_line),
    }
}

pub fn is_bullet_line(line: &str) -> bool {
    let trimmed = line.trim_start();
    let mut chars = trimmed.chars();
    let first = match chars.next() {
        Some(c) => c,
        None => return false,
    };

    if BULLET_GLYPHS.contains(&first) {
        return true;
    }
    if first == '-' || first == '*' {
        return chars.next().map(char::is_whitespace).unwrap_or(false);
    }

    // "1." / "2)" followed by whitespace
    let digits = trimmed.chars().take_while(|c| c.is_ascii_digit()).count();
    if digits == 0 || digits > 3 {
        return false;
    }
    let mut rest = trimmed[digits..].chars();
    matches!(rest.next(), Some('.') | Some(')')) && rest.next().map(char::is_whitespace).unwrap_or(false)
}

/// Two or more consecutive rows that split into cells
pub fn detect_tables(text: &str) -> bool {
    let mut run = 0;
    for line in text.lines() {
        if is_table_row(line) {
            run += 1;
            if run >= 2 {
                return true;
            }
        } else {
            run = 0;
        }
    }
    false
}

fn is_table_row(line: &str) -> bool {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return false;
    }

    let pipe_cells = trimmed
        .trim_matches('|')
        .split('|')
        .filter(|cell| !cell.trim().is_empty())
        .count();
    if trimmed.matches('|').count() >= 2 && pipe_cells >= 2 {
        return true;
    }

    interior_gaps(trimmed).iter().filter(|gap| **gap >= TABLE_GAP).count() >= 2
}

/// Widths of whitespace runs between words; a tab counts as a full gap
fn interior_gaps(trimmed: &str) -> Vec<usize> {
    let mut gaps = Vec::new();
    let mut current = 0;
    for c in trimmed.chars() {
        match c {
            '\t' => current += TABLE_GAP.max(4),
            ' ' => current += 1,
            _ => {
                if current > 0 {
                    gaps.push(current);
                }
                current = 0;
            }
        }
    }
    gaps
}

fn indent_width(line: &str) -> usize {
    line.chars()
        .take_while(|c| c.is_whitespace())
        .map(|c| if c == '\t' { 4 } else { 1 })
        .sum()
}

pub fn detect_columns(text: &str) -> bool {
    let lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
    if lines.is_empty() {
        return false;
    }

    let deep = lines.iter().filter(|l| indent_width(l) >= DEEP_INDENT).count();
    if deep >= 3 && deep * 5 >= lines.len() {
        return true;
    }

    let gapped = lines
        .iter()
        .filter(|l| interior_gaps(l.trim()).iter().any(|gap| *gap >= WIDE_GAP))
        .count();
    gapped > 3
}

/// Identical first/last lines across pages, or "Page N" markers anywhere
pub fn detect_headers_footers(text: &str, pages: &[String]) -> bool {
    if text.lines().any(is_page_marker) {
        return true;
    }
    if pages.len() < 2 {
        return false;
    }

    repeated_edge_line(pages, false) || repeated_edge_line(pages, true)
}

fn repeated_edge_line(pages: &[String], last: bool) -> bool {
    let edges: Vec<&str> = pages
        .iter()
        .filter_map(|page| {
            let mut lines = page.lines().map(str::trim).filter(|l| !l.is_empty());
            if last {
                lines.last()
            } else {
                lines.next()
            }
        })
        .collect();

    edges
        .iter()
        .enumerate()
        .any(|(i, line)| edges[i + 1..].contains(line))
}

fn is_page_marker(line: &str) -> bool {
    let lower = line.trim().to_lowercase();
    let rest = match lower.strip_prefix("page ") {
        Some(rest) => rest,
        None => return false,
    };
    let parts: Vec<&str> = rest.split_whitespace().collect();
    let numeric = |s: &str| !s.is_empty() && s.chars().all(|c| c.is_ascii_digit());
    match parts.as_slice() {
        [n] => numeric(n),
        [n, "of", m] => numeric(n) && numeric(m),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bullet_lines() {
        assert!(is_bullet_line("• Built APIs"));
        assert!(is_bullet_line("   - Led a team"));
        assert!(is_bullet_line("* Shipped"));
        assert!(is_bullet_line("1. First"));
        assert!(is_bullet_line("12) Twelfth"));
        assert!(is_bullet_line("➤ Arrow"));
        assert!(!is_bullet_line("-5% churn"));
        assert!(!is_bullet_line("2020 - 2022"));
        assert!(!is_bullet_line("Experience"));
        assert!(!is_bullet_line(""));
    }

    #[test]
    fn test_tables() {
        let gapped = "Skill     Level     Years\nRust      Expert    5\n";
        assert!(detect_tables(gapped));

        let piped = "| Skill | Years |\n|-------|-------|\n| Rust | 5 |\n";
        assert!(detect_tables(piped));

        let prose = "Built services in Rust.\nLed a team of four.\n";
        assert!(!detect_tables(prose));

        let single = "Rust | Go | SQL\nPlain line\n";
        assert!(!detect_tables(single));
    }

    #[test]
    fn test_columns() {
        let text = "Jane Doe                 Skills\n\
                    Engineer                 Rust\n\
                    Acme Corp                Python\n\
                    2019 - 2023              SQL\n\
                    Beta Inc                 Docker\n";
        assert!(detect_columns(text));
        assert!(!detect_columns("One line\nAnother line\n"));
    }

    #[test]
    fn test_headers_footers() {
        let pages = vec![
            "Jane Doe - Resume\nExperience\nAcme".to_string(),
            "Jane Doe - Resume\nEducation\nState U".to_string(),
        ];
        assert!(detect_headers_footers("", &pages));
        assert!(detect_headers_footers("Experience\nPage 2 of 3\n", &[]));
        assert!(!detect_headers_footers("Experience\nPaged memory systems\n", &[]));

        let distinct = vec!["A\nB".to_string(), "C\nD".to_string()];
        assert!(!detect_headers_footers("", &distinct));
    }
}
