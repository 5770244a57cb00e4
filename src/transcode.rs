//! Grade-1 Transcoder
//!
//! Letter-for-letter Braille. Capitals and digit runs carry an indicator cell
//! and travel as one [`Token`] so word wrap can never separate them.
//!
//! Decoding is a partial inverse. Several punctuation marks share one cell
//! (`"`, `(` and `)` all become U+2836) and digits reuse the `a`-`j` cells, so:
//! - U+2836 always decodes to `"`
//! - after a number indicator, `a`-`j` cells decode as digits until any other cell
//! - the blank cell decodes to a space
//! - a capital indicator not followed by a letter cell is dropped
//! - anything outside the table passes through unchanged

use serde::{Deserialize, Serialize};

use crate::cell::{BrailleCell, BLANK_CELL, CAPITAL_INDICATOR, FORM_FEED, NUMBER_INDICATOR};
use crate::config::{ConversionConfig, UnmappedCharPolicy};

const LETTERS: [u8; 26] = [
    0x01, 0x03, 0x09, 0x19, 0x11, 0x0B, 0x1B, 0x13, 0x0A, 0x1A, // a-j
    0x05, 0x07, 0x0D, 0x1D, 0x15, 0x0F, 0x1F, 0x17, 0x0E, 0x1E, // k-t
    0x25, 0x27, 0x3A, 0x2D, 0x3D, 0x35, // u-z
];

// Order matters for decoding: the first entry for a shared cell wins.
const PUNCTUATION: &[(char, u8)] = &[
    (',', 0x02),
    (';', 0x06),
    (':', 0x12),
    ('.', 0x32),
    ('!', 0x16),
    ('?', 0x26),
    ('"', 0x36),
    ('(', 0x36),
    (')', 0x36),
    ('\u{201C}', 0x36),
    ('\u{201D}', 0x36),
    ('\'', 0x04),
    ('\u{2019}', 0x04),
    ('-', 0x24),
    ('/', 0x0C),
    ('*', 0x14),
    ('_', 0x38),
];

fn letter_cell(lower: char) -> char {
    BrailleCell::from_bits(LETTERS[(lower as u8 - b'a') as usize]).to_char()
}

fn digit_cell(digit: char) -> char {
    // 1-9 share a-i, 0 shares j
    let index = match digit {
        '0' => 9,
        d => (d as u8 - b'1') as usize,
    };
    BrailleCell::from_bits(LETTERS[index]).to_char()
}

fn punctuation_cell(c: char) -> Option<char> {
    PUNCTUATION
        .iter()
        .find(|(p, _)| *p == c)
        .map(|(_, bits)| BrailleCell::from_bits(*bits).to_char())
}

fn cell_to_letter(cell: char) -> Option<char> {
    let bits = BrailleCell::from_char(cell)?.bits();
    LETTERS
        .iter()
        .position(|b| *b == bits)
        .map(|i| (b'a' + i as u8) as char)
}

fn cell_to_digit(cell: char) -> Option<char> {
    match cell_to_letter(cell)? {
        'j' => Some('0'),
        l @ 'a'..='i' => Some((b'1' + (l as u8 - b'a')) as char),
        _ => None,
    }
}

fn cell_to_punctuation(cell: char) -> Option<char> {
    let bits = BrailleCell::from_char(cell)?.bits();
    PUNCTUATION.iter().find(|(_, b)| *b == bits).map(|(p, _)| *p)
}

/// Smallest unit word wrap may move between lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Space,
    LineBreak,
    Cell(char),
    /// Letter cell preceded by the capital indicator.
    Capital(char),
    /// Digit cells preceded by one number indicator.
    Number(String),
    /// Character kept verbatim under the passthrough policy.
    Raw(char),
}

impl Token {
    /// Width in cells once written to a line.
    pub fn width(&self) -> usize {
        match self {
            Token::LineBreak => 0,
            Token::Space | Token::Cell(_) | Token::Raw(_) => 1,
            Token::Capital(_) => 2,
            Token::Number(digits) => 1 + digits.chars().count(),
        }
    }

    pub fn is_separator(&self) -> bool {
        matches!(self, Token::Space | Token::LineBreak)
    }

    pub fn write_to(&self, out: &mut String) {
        match self {
            Token::Space => out.push(' '),
            Token::LineBreak => out.push('\n'),
            Token::Cell(c) | Token::Raw(c) => out.push(*c),
            Token::Capital(c) => {
                out.push(CAPITAL_INDICATOR);
                out.push(*c);
            }
            Token::Number(digits) => {
                out.push(NUMBER_INDICATOR);
                out.push_str(digits);
            }
        }
    }
}

/// How an unmapped input character was resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "resolution", rename_all = "snake_case")]
pub enum EncodingGap {
    Blanked { character: char, offset: usize },
    PassedThrough { character: char, offset: usize },
}

impl EncodingGap {
    pub fn character(&self) -> char {
        match self {
            EncodingGap::Blanked { character, .. } | EncodingGap::PassedThrough { character, .. } => *character,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Encoded {
    pub tokens: Vec<Token>,
    pub gaps: Vec<EncodingGap>,
}

impl Encoded {
    pub fn braille(&self) -> String {
        let mut out = String::with_capacity(self.tokens.len());
        for token in &self.tokens {
            token.write_to(&mut out);
        }
        out
    }
}

#[derive(Debug, Clone)]
pub struct Transcoder {
    tab_spaces: usize,
    policy: UnmappedCharPolicy,
}

impl Default for Transcoder {
    fn default() -> Self {
        Self::new(2, UnmappedCharPolicy::Blank)
    }
}

impl Transcoder {
    pub fn new(tab_spaces: usize, policy: UnmappedCharPolicy) -> Self {
        Self { tab_spaces, policy }
    }

    pub fn from_config(config: &ConversionConfig) -> Self {
        Self::new(config.tab_spaces, config.unmapped_char_policy)
    }

    pub fn policy(&self) -> UnmappedCharPolicy {
        self.policy
    }

    pub fn encode(&self, text: &str) -> String {
        self.encode_detailed(text).braille()
    }

    pub fn encode_tokens(&self, text: &str) -> Vec<Token> {
        self.encode_detailed(text).tokens
    }

    /// Encode and report every character the table could not map.
    pub fn encode_detailed(&self, text: &str) -> Encoded {
        let mut encoded = Encoded::default();
        let mut in_number = false;

        for (offset, c) in text.chars().enumerate() {
            if c.is_ascii_digit() {
                let cell = digit_cell(c);
                match encoded.tokens.last_mut() {
                    Some(Token::Number(digits)) if in_number => digits.push(cell),
                    _ => encoded.tokens.push(Token::Number(cell.to_string())),
                }
                in_number = true;
                continue;
            }
            in_number = false;

            match c {
                '\n' => encoded.tokens.push(Token::LineBreak),
                // Page breaks belong to the paginator; a form feed in the text only ends a paragraph.
                FORM_FEED => encoded.tokens.extend([Token::LineBreak, Token::LineBreak]),
                '\r' => {}
                '\t' => encoded
                    .tokens
                    .extend(std::iter::repeat(Token::Space).take(self.tab_spaces)),
                ' ' => encoded.tokens.push(Token::Space),
                'a'..='z' => encoded.tokens.push(Token::Cell(letter_cell(c))),
                'A'..='Z' => encoded
                    .tokens
                    .push(Token::Capital(letter_cell(c.to_ascii_lowercase()))),
                _ => match punctuation_cell(c) {
                    Some(cell) => encoded.tokens.push(Token::Cell(cell)),
                    None => match self.policy {
                        UnmappedCharPolicy::Blank => {
                            encoded.tokens.push(Token::Cell(BLANK_CELL));
                            encoded.gaps.push(EncodingGap::Blanked { character: c, offset });
                        }
                        UnmappedCharPolicy::Passthrough => {
                            encoded.tokens.push(Token::Raw(c));
                            encoded.gaps.push(EncodingGap::PassedThrough { character: c, offset });
                        }
                    },
                },
            }
        }

        encoded
    }

    /// Decode Braille back to text; see the module docs for what is lost.
    pub fn decode(&self, braille: &str) -> String {
        let mut out = String::with_capacity(braille.len());
        for token in tokenize(braille) {
            match token {
                Token::Space => out.push(' '),
                Token::LineBreak => out.push('\n'),
                Token::Raw(c) => out.push(c),
                Token::Capital(cell) => {
                    if let Some(letter) = cell_to_letter(cell) {
                        out.push(letter.to_ascii_uppercase());
                    }
                }
                Token::Number(digits) => {
                    out.extend(digits.chars().filter_map(cell_to_digit));
                }
                Token::Cell(CAPITAL_INDICATOR) | Token::Cell(NUMBER_INDICATOR) => {}
                Token::Cell(BLANK_CELL) => out.push(' '),
                Token::Cell(cell) => {
                    let decoded = cell_to_letter(cell)
                        .or_else(|| cell_to_punctuation(cell))
                        .unwrap_or(cell);
                    out.push(decoded);
                }
            }
        }
        out
    }
}

/// Split already-encoded Braille into tokens, regrouping indicator pairs.
pub fn tokenize(braille: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut chars = braille.chars().peekable();

    while let Some(c) = chars.next() {
        let token = match c {
            ' ' => Token::Space,
            '\n' => Token::LineBreak,
            CAPITAL_INDICATOR => match chars.peek() {
                Some(&next) if cell_to_letter(next).is_some() => {
                    chars.next();
                    Token::Capital(next)
                }
                _ => Token::Cell(c),
            },
            NUMBER_INDICATOR => {
                let mut digits = String::new();
                while let Some(&next) = chars.peek() {
                    if cell_to_digit(next).is_none() {
                        break;
                    }
                    digits.push(next);
                    chars.next();
                }
                if digits.is_empty() {
                    Token::Cell(c)
                } else {
                    Token::Number(digits)
                }
            }
            c if BrailleCell::from_char(c).is_some() => Token::Cell(c),
            c => Token::Raw(c),
        };
        tokens.push(token);
    }

    tokens
}

/// Braille rendering of a page number: number indicator plus digit cells.
pub fn encode_number(n: usize) -> String {
    let mut out = String::new();
    out.push(NUMBER_INDICATOR);
    out.extend(n.to_string().chars().map(digit_cell));
    out
}
