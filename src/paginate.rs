//! Paginator - word wrap and page grouping for embosser output
//!
//! Wrapping works on [`Token`](crate::transcode::Token)s so an indicator is never parted from the cell
//! it modifies. Over-long words are never hyphenated; they get a line of their
//! own and overflow it.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::warn;

use crate::cell::{FORM_FEED, NUMBER_INDICATOR};
use crate::embosser::PageGeometry;
use crate::transcode::{encode_number, tokenize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub lines: Vec<String>,
}

/// Pages ready for the embosser. Rendering joins lines with `\n` and pages
/// with a single form feed, with no trailing separator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pages: Vec<Page>,
}

impl Document {
    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn line_count(&self) -> usize {
        self.pages.iter().map(|p| p.lines.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    pub fn render(&self) -> String {
        let separator = FORM_FEED.to_string();
        self.pages
            .iter()
            .map(|p| p.lines.join("\n"))
            .collect::<Vec<_>>()
            .join(&separator)
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

#[derive(Debug, Clone, Default)]
pub struct Paginator {
    geometry: PageGeometry,
}

impl Paginator {
    pub fn new(geometry: PageGeometry) -> Self {
        Self { geometry }
    }

    pub fn geometry(&self) -> &PageGeometry {
        &self.geometry
    }

    /// Wrap and paginate Braille text in one go.
    pub fn format(&self, braille: &str) -> Document {
        self.paginate(self.wrap(braille))
    }

    /// Wrap every paragraph, separating paragraphs with one blank line.
    pub fn wrap(&self, braille: &str) -> Vec<String> {
        let mut lines = Vec::new();
        for paragraph in paragraphs(braille) {
            if !lines.is_empty() {
                lines.push(self.geometry.blank_line());
            }
            lines.extend(self.wrap_paragraph(&paragraph));
        }
        lines
    }

    /// Greedy fill of one paragraph; line breaks inside it count as spaces.
    pub fn wrap_paragraph(&self, paragraph: &str) -> Vec<String> {
        let width = self.geometry.line_length();
        let mut lines = Vec::new();
        let mut current = String::new();
        let mut current_len = 0;

        for (word, word_len) in words(paragraph) {
            if current_len == 0 {
                current = word;
                current_len = word_len;
            } else if current_len + 1 + word_len <= width {
                current.push(' ');
                current.push_str(&word);
                current_len += 1 + word_len;
            } else {
                lines.push(self.pad(std::mem::take(&mut current), current_len));
                current = word;
                current_len = word_len;
            }
        }
        if current_len > 0 {
            lines.push(self.pad(current, current_len));
        }

        lines
    }

    /// Group finished lines into pages, numbering each page on its last line.
    /// Only the final page may come up short.
    pub fn paginate(&self, lines: Vec<String>) -> Document {
        if lines.is_empty() {
            return Document::default();
        }

        let per_page = self.geometry.content_lines();
        let page_total = lines.len().div_ceil(per_page);
        let mut pages = Vec::with_capacity(page_total);

        for (index, chunk) in lines.chunks(per_page).enumerate() {
            let mut page_lines = chunk.to_vec();
            let is_final = index + 1 == page_total;
            if !is_final {
                page_lines.resize(per_page, self.geometry.blank_line());
            }
            if self.geometry.numbered() {
                page_lines.push(self.page_number_line(index + 1));
            }
            pages.push(Page { lines: page_lines });
        }

        Document { pages }
    }

    /// Right-justified Braille page number. A label wider than the line keeps
    /// its number indicator and the low-order digits that fit.
    pub fn page_number_line(&self, number: usize) -> String {
        let width = self.geometry.line_length();
        let mut label = encode_number(number);
        let used = label.chars().count();
        if used > width {
            warn!(page = number, width, "page number wider than the line, keeping low-order digits");
            let digits: String = label.chars().skip(1 + used - width).collect();
            label = format!("{NUMBER_INDICATOR}{digits}");
        }
        let mut line = " ".repeat(width - label.chars().count());
        line.push_str(&label);
        line
    }

    fn pad(&self, mut line: String, len: usize) -> String {
        let width = self.geometry.line_length();
        if len < width {
            line.extend(std::iter::repeat(' ').take(width - len));
        }
        line
    }
}

/// Split on blank lines, joining the lines of each paragraph with spaces.
fn paragraphs(text: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    for line in text.lines() {
        if line.trim().is_empty() {
            if !current.is_empty() {
                out.push(current.join(" "));
                current.clear();
            }
        } else {
            current.push(line);
        }
    }
    if !current.is_empty() {
        out.push(current.join(" "));
    }
    out
}

/// Maximal runs of non-separator tokens, with their width in cells.
fn words(paragraph: &str) -> Vec<(String, usize)> {
    let mut out = Vec::new();
    let mut word = String::new();
    let mut word_len = 0;
    for token in tokenize(paragraph) {
        if token.is_separator() {
            if word_len > 0 {
                out.push((std::mem::take(&mut word), word_len));
                word_len = 0;
            }
            continue;
        }
        word_len += token.width();
        token.write_to(&mut word);
    }
    if word_len > 0 {
        out.push((word, word_len));
    }
    out
}

/// Width of a line in cells, which is what the embosser counts.
pub fn line_width(line: &str) -> usize {
    line.chars().count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transcode::Transcoder;

    fn paginator(line_length: usize, page_length: usize, numbered: bool) -> Paginator {
        Paginator::new(PageGeometry::new(line_length, page_length, numbered).unwrap())
    }

    #[test]
    fn test_empty_input_has_no_pages() {
        let p = Paginator::default();
        let doc = p.format("");
        assert!(doc.is_empty());
        assert_eq!(doc.render(), "");
        assert!(p.format("\n\n  \n").is_empty());
    }

    #[test]
    fn test_single_short_line() {
        let t = Transcoder::default();
        let p = Paginator::default();
        let doc = p.format(&t.encode("Hi 9!"));
        let rendered = doc.render();

        assert!(!rendered.contains(FORM_FEED));
        assert_eq!(doc.page_count(), 1);
        let lines = &doc.pages()[0].lines;
        assert_eq!(lines.len(), 2);
        assert_eq!(line_width(&lines[0]), 40);
        assert!(lines[0].starts_with(&t.encode("Hi 9!")));
        assert!(lines[1].ends_with(&encode_number(1)));
        assert_eq!(line_width(&lines[1]), 40);
    }

    #[test]
    fn test_wrap_greedy() {
        let p = paginator(10, 25, false);
        let lines = p.wrap_paragraph("\u{2801}\u{2801}\u{2801}\u{2801} \u{2803}\u{2803}\u{2803}\u{2803}\u{2803} \u{2809}");
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], "\u{2801}\u{2801}\u{2801}\u{2801} \u{2803}\u{2803}\u{2803}\u{2803}\u{2803}");
        assert_eq!(lines[1], format!("\u{2809}{}", " ".repeat(9)));
    }

    #[test]
    fn test_token_never_split() {
        let t = Transcoder::default();
        let p = paginator(6, 25, false);
        // "ab Cd" -> "ab" (2) + space + capital pair + d (3) = 6 fits exactly
        let lines = p.wrap_paragraph(&t.encode("ab Cd"));
        assert_eq!(lines.len(), 1);
        // "abc Cd" would need 7 cells, so the whole word moves down
        let lines = p.wrap_paragraph(&t.encode("abc Cd"));
        assert_eq!(lines.len(), 2);
        assert!(lines[1].starts_with("\u{2820}\u{2809}"));
    }

    #[test]
    fn test_overlong_word_kept_whole() {
        let t = Transcoder::default();
        let p = paginator(4, 25, false);
        let lines = p.wrap_paragraph(&t.encode("a abcdefg b"));
        assert_eq!(lines.len(), 3);
        assert_eq!(line_width(&lines[1]), 7);
    }

    #[test]
    fn test_paragraph_gap_and_collapse() {
        let t = Transcoder::default();
        let p = paginator(20, 25, false);
        let lines = p.wrap(&t.encode("one\ntwo   three\n\n\nfour"));
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[1], " ".repeat(20));
        assert!(lines[0].starts_with(&t.encode("one two three")));
    }

    #[test]
    fn test_page_grouping_and_form_feeds() {
        let p = paginator(10, 4, true);
        let lines: Vec<String> = (0..7).map(|_| "\u{2801}".repeat(10)).collect();
        let doc = p.paginate(lines);
        // 3 content lines per page -> pages of 3, 3, 1
        assert_eq!(doc.page_count(), 3);
        assert_eq!(doc.pages()[0].lines.len(), 4);
        assert_eq!(doc.pages()[2].lines.len(), 2);
        assert_eq!(doc.render().matches(FORM_FEED).count(), 2);
        assert!(!doc.render().ends_with(FORM_FEED));
        assert!(doc.pages()[1].lines[3].ends_with(&encode_number(2)));
    }

    #[test]
    fn test_page_number_line_never_exceeds_width() {
        let p = paginator(5, 2, true);
        for number in [1, 9, 10, 999, 9999, 10000, 123456] {
            let line = p.page_number_line(number);
            assert_eq!(line_width(&line), 5, "page {number}");
            assert!(matches!(tokenize(line.trim_start()).as_slice(), [crate::transcode::Token::Number(_)]));
        }
        assert!(p.page_number_line(123456).ends_with(&encode_number(3456)[NUMBER_INDICATOR.len_utf8()..]));

        let lines: Vec<String> = (0..12).map(|_| " ".repeat(5)).collect();
        let doc = p.paginate(lines);
        assert_eq!(doc.page_count(), 12);
        assert!(doc.pages().iter().flat_map(|page| &page.lines).all(|l| line_width(l) == 5));
    }

    #[test]
    fn test_unnumbered_pages() {
        let p = paginator(10, 2, false);
        let lines: Vec<String> = (0..3).map(|_| " ".repeat(10)).collect();
        let doc = p.paginate(lines);
        assert_eq!(doc.page_count(), 2);
        assert_eq!(doc.pages()[1].lines.len(), 1);
    }
}
