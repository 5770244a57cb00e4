//! Validation System - Embosser Contract Checks
//!
//! Rules produce structured issues. The validator runs every rule over the
//! whole document and never stops early, so one pass yields the complete
//! diagnostic picture.

use serde::{Deserialize, Serialize};

use crate::cell::{is_braille, FORM_FEED};
use crate::embosser::PageGeometry;
use crate::transcode::{tokenize, Token};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum IssueSeverity {
    Error,
    Warning,
}

/// One finding. Page, line and column are 1-based where present.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ValidationIssue {
    pub rule: String,
    pub severity: IssueSeverity,
    pub message: String,
    pub page: Option<usize>,
    pub line: Option<usize>,
    pub column: Option<usize>,
    pub expected: Option<String>,
    pub actual: Option<String>,
}

impl ValidationIssue {
    fn error(rule: &str, message: impl Into<String>) -> Self {
        Self {
            rule: rule.to_string(),
            severity: IssueSeverity::Error,
            message: message.into(),
            page: None,
            line: None,
            column: None,
            expected: None,
            actual: None,
        }
    }

    fn warning(rule: &str, message: impl Into<String>) -> Self {
        Self {
            severity: IssueSeverity::Warning,
            ..Self::error(rule, message)
        }
    }

    fn at(mut self, page: usize, line: Option<usize>, column: Option<usize>) -> Self {
        self.page = Some(page);
        self.line = line;
        self.column = column;
        self
    }

    fn expected_actual(mut self, expected: impl ToString, actual: impl ToString) -> Self {
        self.expected = Some(expected.to_string());
        self.actual = Some(actual.to_string());
        self
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ValidationStats {
    pub pages: usize,
    pub lines: usize,
    pub compliant_lines: usize,
    pub braille_cells: usize,
    pub form_feeds: usize,
    pub compliance_percent: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ValidationReport {
    pub valid: bool,
    pub errors: Vec<ValidationIssue>,
    pub warnings: Vec<ValidationIssue>,
    pub stats: ValidationStats,
}

impl ValidationReport {
    pub fn issue_count(&self) -> usize {
        self.errors.len() + self.warnings.len()
    }
}

/// A document split back into pages and lines.
#[derive(Debug, Clone)]
pub struct ParsedDocument<'a> {
    pub pages: Vec<Vec<&'a str>>,
}

impl<'a> ParsedDocument<'a> {
    /// One trailing newline, as text editors leave behind, is not a line.
    pub fn parse(document: &'a str) -> Self {
        let document = document
            .strip_suffix("\r\n")
            .or_else(|| document.strip_suffix('\n'))
            .unwrap_or(document);
        if document.is_empty() {
            return Self { pages: Vec::new() };
        }
        let pages = document
            .split(FORM_FEED)
            .map(|page| page.split('\n').collect())
            .collect();
        Self { pages }
    }

    pub fn line_count(&self) -> usize {
        self.pages.iter().map(Vec::len).sum()
    }

    fn lines(&self) -> impl Iterator<Item = (usize, usize, &'a str)> + '_ {
        self.pages.iter().enumerate().flat_map(|(p, lines)| {
            lines.iter().enumerate().map(move |(l, line)| (p + 1, l + 1, *line))
        })
    }
}

/// Validation rule trait - produces issues
pub trait ValidationRule {
    fn name(&self) -> &'static str;
    fn check(&self, document: &ParsedDocument<'_>, geometry: &PageGeometry) -> Vec<ValidationIssue>;
}

// --- Concrete Rules ---

pub struct PageLengthRule;

impl ValidationRule for PageLengthRule {
    fn name(&self) -> &'static str { "page_length" }

    fn check(&self, document: &ParsedDocument<'_>, geometry: &PageGeometry) -> Vec<ValidationIssue> {
        let expected = geometry.page_length();
        let last = document.pages.len().saturating_sub(1);
        let mut issues = vec![];

        for (index, page) in document.pages.iter().enumerate() {
            let is_final = index == last;
            let bad = if is_final { page.len() > expected } else { page.len() != expected };
            if bad {
                issues.push(
                    ValidationIssue::error(self.name(), format!("Page {} has {} lines", index + 1, page.len()))
                        .at(index + 1, None, None)
                        .expected_actual(
                            if is_final { format!("at most {expected}") } else { expected.to_string() },
                            page.len(),
                        ),
                );
            }
        }
        issues
    }
}

pub struct LineLengthRule;

impl ValidationRule for LineLengthRule {
    fn name(&self) -> &'static str { "line_length" }

    fn check(&self, document: &ParsedDocument<'_>, geometry: &PageGeometry) -> Vec<ValidationIssue> {
        let expected = geometry.line_length();
        document
            .lines()
            .filter_map(|(page, line, text)| {
                let width = text.chars().count();
                (width != expected).then(|| {
                    ValidationIssue::error(self.name(), format!("Line {line} of page {page} is {width} cells wide"))
                        .at(page, Some(line), None)
                        .expected_actual(expected, width)
                })
            })
            .collect()
    }
}

pub struct CharacterSetRule;

impl ValidationRule for CharacterSetRule {
    fn name(&self) -> &'static str { "character_set" }

    fn check(&self, document: &ParsedDocument<'_>, _geometry: &PageGeometry) -> Vec<ValidationIssue> {
        let mut issues = vec![];
        for (page, line, text) in document.lines() {
            for (column, c) in text.chars().enumerate() {
                if c != ' ' && !is_braille(c) {
                    issues.push(
                        ValidationIssue::error(self.name(), format!("Character U+{:04X} is not embossable", c as u32))
                            .at(page, Some(line), Some(column + 1))
                            .expected_actual("space or U+2800-U+28FF", format!("{c:?}")),
                    );
                }
            }
        }
        issues
    }
}

/// Every form feed must land after a whole multiple of `page_length` lines.
pub struct PageBoundaryRule;

impl ValidationRule for PageBoundaryRule {
    fn name(&self) -> &'static str { "page_boundary" }

    fn check(&self, document: &ParsedDocument<'_>, geometry: &PageGeometry) -> Vec<ValidationIssue> {
        let page_length = geometry.page_length();
        let mut lines_before = 0;
        let mut issues = vec![];

        for index in 1..document.pages.len() {
            lines_before += document.pages[index - 1].len();
            if lines_before % page_length != 0 {
                issues.push(
                    ValidationIssue::error(
                        self.name(),
                        format!("Form feed before page {} follows {} lines", index + 1, lines_before),
                    )
                    .at(index + 1, None, None)
                    .expected_actual(format!("a multiple of {page_length}"), lines_before),
                );
            }
        }
        issues
    }
}

/// Numbered documents should end every page with a Braille page number.
pub struct PageNumberRule;

impl ValidationRule for PageNumberRule {
    fn name(&self) -> &'static str { "page_number" }

    fn check(&self, document: &ParsedDocument<'_>, geometry: &PageGeometry) -> Vec<ValidationIssue> {
        if !geometry.numbered() {
            return vec![];
        }
        document
            .pages
            .iter()
            .enumerate()
            .filter(|(_, page)| {
                let last = page.last().copied().unwrap_or("");
                !matches!(tokenize(last.trim_start()).as_slice(), [Token::Number(_)])
            })
            .map(|(index, _)| {
                ValidationIssue::warning(self.name(), format!("Page {} does not end with a page number", index + 1))
                    .at(index + 1, None, None)
            })
            .collect()
    }
}

/// Validator orchestrates rules and aggregates the report
pub struct Validator {
    geometry: PageGeometry,
    rules: Vec<Box<dyn ValidationRule + Send + Sync>>,
}

impl Validator {
    pub fn new(geometry: PageGeometry) -> Self {
        Self {
            geometry,
            rules: vec![
                Box::new(PageLengthRule),
                Box::new(LineLengthRule),
                Box::new(CharacterSetRule),
                Box::new(PageBoundaryRule),
                Box::new(PageNumberRule),
            ],
        }
    }

    pub fn geometry(&self) -> &PageGeometry {
        &self.geometry
    }

    pub fn validate(&self, document: &str) -> ValidationReport {
        let parsed = ParsedDocument::parse(document);
        let mut errors = vec![];
        let mut warnings = vec![];

        if parsed.pages.is_empty() {
            warnings.push(ValidationIssue::warning("document", "Document is empty"));
        }

        for rule in &self.rules {
            for issue in rule.check(&parsed, &self.geometry) {
                match issue.severity {
                    IssueSeverity::Error => errors.push(issue),
                    IssueSeverity::Warning => warnings.push(issue),
                }
            }
        }

        let stats = self.stats(&parsed, document);
        ValidationReport {
            valid: errors.is_empty(),
            errors,
            warnings,
            stats,
        }
    }

    fn stats(&self, parsed: &ParsedDocument<'_>, document: &str) -> ValidationStats {
        let width = self.geometry.line_length();
        let lines = parsed.line_count();
        let compliant_lines = parsed
            .lines()
            .filter(|(_, _, text)| text.chars().count() == width && text.chars().all(|c| c == ' ' || is_braille(c)))
            .count();
        let compliance_percent = if lines == 0 {
            100.0
        } else {
            compliant_lines as f64 * 100.0 / lines as f64
        };

        ValidationStats {
            pages: parsed.pages.len(),
            lines,
            compliant_lines,
            braille_cells: document.chars().filter(|c| is_braille(*c)).count(),
            form_feeds: document.matches(FORM_FEED).count(),
            compliance_percent,
        }
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::new(PageGeometry::default())
    }
}
