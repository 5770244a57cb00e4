//! Tactile Graphics Encoder
//!
//! Tiles an ASCII (or already rasterised) grid into 2-column by 4-row windows
//! and packs each window into one Braille cell.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::cell::{BrailleCell, BLANK_CELL};
use crate::config::{ConversionConfig, DEFAULT_RAISED_GLYPHS};

/// A rectangular block of Braille cells standing in for one figure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtBlock {
    pub figure_id: String,
    #[serde(default)]
    pub caption: Option<String>,
    pub lines: Vec<String>,
}

impl ArtBlock {
    pub fn new(figure_id: impl Into<String>, lines: Vec<String>) -> Self {
        Self {
            figure_id: figure_id.into(),
            caption: None,
            lines,
        }
    }

    /// Wrap a block that was rendered to Braille elsewhere.
    pub fn from_braille(figure_id: impl Into<String>, text: &str) -> Self {
        let lines = text.lines().map(|l| l.trim_end_matches('\r').to_string()).collect();
        Self::new(figure_id, lines)
    }

    pub fn with_caption(mut self, caption: impl Into<String>) -> Self {
        self.caption = Some(caption.into());
        self
    }

    /// Widest line, in cells.
    pub fn width(&self) -> usize {
        self.lines.iter().map(|l| l.chars().count()).max().unwrap_or(0)
    }

    pub fn height(&self) -> usize {
        self.lines.len()
    }
}

/// Art for one figure as supplied by whoever produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "content", rename_all = "snake_case")]
pub enum FigureArt {
    /// Plain ASCII drawing still to be encoded.
    Ascii(String),
    /// Braille lines ready to be placed as-is.
    Braille(String),
}

#[derive(Debug, Clone)]
pub struct TactileEncoder {
    raised: BTreeSet<char>,
}

impl Default for TactileEncoder {
    fn default() -> Self {
        Self::new(DEFAULT_RAISED_GLYPHS.chars())
    }
}

impl TactileEncoder {
    pub fn new(raised: impl IntoIterator<Item = char>) -> Self {
        Self {
            raised: raised.into_iter().collect(),
        }
    }

    pub fn from_config(config: &ConversionConfig) -> Self {
        Self::new(config.raised_glyphs.chars())
    }

    pub fn is_raised(&self, c: char) -> bool {
        self.raised.contains(&c)
    }

    /// Encode one window given as up to 4 rows of up to 2 glyphs.
    /// Anything missing counts as blank.
    pub fn encode_block(&self, rows: &[&[char]]) -> BrailleCell {
        let mut dots = [[false; 2]; 4];
        for (row, dot_row) in dots.iter_mut().enumerate() {
            for (col, dot) in dot_row.iter_mut().enumerate() {
                *dot = rows
                    .get(row)
                    .and_then(|r| r.get(col))
                    .is_some_and(|c| self.is_raised(*c));
            }
        }
        BrailleCell::from_dots(dots)
    }

    /// Encode a raster mask (`true` = raised). Rows may be ragged.
    pub fn encode_mask(&self, mask: &[Vec<bool>]) -> Vec<String> {
        let width = mask.iter().map(Vec::len).max().unwrap_or(0);
        let height = mask.len();
        if width == 0 || height == 0 {
            return Vec::new();
        }

        let padded_height = height.div_ceil(4) * 4;
        let padded_width = width.div_ceil(2) * 2;
        let at = |row: usize, col: usize| mask.get(row).and_then(|r| r.get(col)).copied().unwrap_or(false);

        let mut lines = Vec::with_capacity(padded_height / 4);
        for top in (0..padded_height).step_by(4) {
            let mut line = String::with_capacity(padded_width / 2);
            for left in (0..padded_width).step_by(2) {
                let mut dots = [[false; 2]; 4];
                for (dy, dot_row) in dots.iter_mut().enumerate() {
                    for (dx, dot) in dot_row.iter_mut().enumerate() {
                        *dot = at(top + dy, left + dx);
                    }
                }
                line.push(BrailleCell::from_dots(dots).to_char());
            }
            let trimmed = line.trim_end_matches(BLANK_CELL).len();
            line.truncate(trimmed);
            lines.push(line);
        }
        lines
    }

    /// Encode ASCII art into a block of Braille lines, one per 4 input rows.
    pub fn encode_art(&self, figure_id: &str, ascii: &str) -> ArtBlock {
        let mask: Vec<Vec<bool>> = ascii
            .lines()
            .map(|line| line.trim_end_matches('\r').chars().map(|c| self.is_raised(c)).collect())
            .collect();
        ArtBlock::new(figure_id, self.encode_mask(&mask))
    }

    /// Resolve supplied art into a block, encoding ASCII when needed.
    pub fn resolve(&self, figure_id: &str, art: &FigureArt) -> ArtBlock {
        match art {
            FigureArt::Ascii(ascii) => self.encode_art(figure_id, ascii),
            FigureArt::Braille(text) => ArtBlock::from_braille(figure_id, text),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(rows: [&str; 4]) -> Vec<Vec<char>> {
        rows.iter().map(|r| r.chars().collect()).collect()
    }

    fn as_slices(rows: &[Vec<char>]) -> Vec<&[char]> {
        rows.iter().map(Vec::as_slice).collect()
    }

    #[test]
    fn test_encode_block_full_and_blank() {
        let enc = TactileEncoder::default();
        let full = block(["##", "##", "##", "##"]);
        assert_eq!(enc.encode_block(&as_slices(&full)).to_char(), '\u{28FF}');

        let blank = block(["  ", "  ", "  ", "  "]);
        assert_eq!(enc.encode_block(&as_slices(&blank)).to_char(), '\u{2800}');
    }

    #[test]
    fn test_encode_block_top_left() {
        let enc = TactileEncoder::default();
        let rows = block(["# ", "  ", "  ", "  "]);
        assert_eq!(enc.encode_block(&as_slices(&rows)).to_char(), '\u{2801}');
    }

    #[test]
    fn test_encode_block_bit_order() {
        let enc = TactileEncoder::default();
        let rows = block(["  ", "  ", "  ", " @"]);
        assert_eq!(enc.encode_block(&as_slices(&rows)).bits(), 0x80);
        let rows = block(["  ", "  ", "X ", "  "]);
        assert_eq!(enc.encode_block(&as_slices(&rows)).bits(), 0x04);
    }

    #[test]
    fn test_encode_block_missing_cells_blank() {
        let enc = TactileEncoder::default();
        let row: Vec<char> = vec!['#'];
        assert_eq!(enc.encode_block(&[row.as_slice()]).to_char(), '\u{2801}');
        assert_eq!(enc.encode_block(&[]).to_char(), '\u{2800}');
    }

    #[test]
    fn test_encode_art_pads_and_tiles() {
        let enc = TactileEncoder::default();
        // 3 wide, 5 tall -> padded to 4 wide, 8 tall -> 2 lines of up to 2 cells
        let art = "###\n###\n###\n###\n#";
        let block = enc.encode_art("Fig_1", art);
        assert_eq!(block.height(), 2);
        assert_eq!(block.lines[0], "\u{28FF}\u{2847}");
        assert_eq!(block.lines[1], "\u{2801}");
    }

    #[test]
    fn test_encode_art_trims_trailing_blank_cells() {
        let enc = TactileEncoder::default();
        let block = enc.encode_art("Fig_2", "  #     \n");
        // cells: blank, top-left raised, blank, blank
        assert_eq!(block.lines, vec!["\u{2800}\u{2801}".to_string()]);
    }

    #[test]
    fn test_encode_art_empty() {
        let enc = TactileEncoder::default();
        assert!(enc.encode_art("Fig_3", "").lines.is_empty());
    }

    #[test]
    fn test_custom_raised_set() {
        let enc = TactileEncoder::new(['.']);
        assert!(enc.is_raised('.'));
        assert!(!enc.is_raised('#'));
    }

    #[test]
    fn test_resolve_prerendered() {
        let enc = TactileEncoder::default();
        let art = FigureArt::Braille("\u{28FF}\u{28FF}\r\n\u{2801}".to_string());
        let block = enc.resolve("Fig_4", &art);
        assert_eq!(block.lines, vec!["\u{28FF}\u{28FF}".to_string(), "\u{2801}".to_string()]);
        assert_eq!(block.width(), 2);
    }
}
