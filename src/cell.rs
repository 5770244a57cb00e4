//! Cell Codec - 2x4 dot grid <-> Braille Unicode cell
//!
//! Dot layout inside one cell (row, column) and the bit it sets:
//! ```text
//! (0,0)=bit0  (0,1)=bit3
//! (1,0)=bit1  (1,1)=bit4
//! (2,0)=bit2  (2,1)=bit5
//! (3,0)=bit6  (3,1)=bit7
//! ```

use serde::{Deserialize, Serialize};

/// First code point of the Braille Patterns block (empty cell).
pub const BRAILLE_BASE: u32 = 0x2800;

/// Last code point of the Braille Patterns block (all eight dots).
pub const BRAILLE_LAST: u32 = 0x28FF;

pub const BLANK_CELL: char = '\u{2800}';
pub const CAPITAL_INDICATOR: char = '\u{2820}';
pub const NUMBER_INDICATOR: char = '\u{283C}';

/// Page separator understood by embossers.
pub const FORM_FEED: char = '\u{000C}';

const DOT_BITS: [[u8; 2]; 4] = [
    [0x01, 0x08],
    [0x02, 0x10],
    [0x04, 0x20],
    [0x40, 0x80],
];

/// Eight tactile dots packed into one byte.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BrailleCell(u8);

impl BrailleCell {
    pub const BLANK: BrailleCell = BrailleCell(0x00);
    pub const FULL: BrailleCell = BrailleCell(0xFF);

    pub const fn from_bits(bits: u8) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Build a cell from a `[row][column]` grid of raised flags.
    pub fn from_dots(dots: [[bool; 2]; 4]) -> Self {
        let mut bits = 0u8;
        for (row, cols) in dots.iter().enumerate() {
            for (col, raised) in cols.iter().enumerate() {
                if *raised {
                    bits |= DOT_BITS[row][col];
                }
            }
        }
        Self(bits)
    }

    pub fn is_raised(self, row: usize, col: usize) -> bool {
        match DOT_BITS.get(row).and_then(|r| r.get(col)) {
            Some(bit) => self.0 & bit != 0,
            None => false,
        }
    }

    pub fn is_blank(self) -> bool {
        self.0 == 0
    }

    pub fn to_char(self) -> char {
        char::from_u32(BRAILLE_BASE | self.0 as u32).unwrap_or(BLANK_CELL)
    }

    /// Inverse of [`BrailleCell::to_char`]; `None` outside U+2800..=U+28FF.
    pub fn from_char(c: char) -> Option<Self> {
        let code = c as u32;
        if is_braille(c) {
            Some(Self((code - BRAILLE_BASE) as u8))
        } else {
            None
        }
    }
}

impl From<BrailleCell> for char {
    fn from(cell: BrailleCell) -> char {
        cell.to_char()
    }
}

pub fn is_braille(c: char) -> bool {
    (BRAILLE_BASE..=BRAILLE_LAST).contains(&(c as u32))
}

/// Characters allowed inside an embosser line.
pub fn is_line_char(c: char) -> bool {
    c == ' ' || is_braille(c)
}
