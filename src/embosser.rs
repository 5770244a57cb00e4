//! Embosser Geometry
//!
//! Fixed line width and page height every emitted document must honour.

use serde::Serialize;

use crate::config::ConfigError;

pub const DEFAULT_LINE_LENGTH: usize = 40;
pub const DEFAULT_PAGE_LENGTH: usize = 25;
/// Number indicator plus four digit cells.
pub const MIN_NUMBERED_LINE_LENGTH: usize = 5;

/// Page geometry for embosser output.
///
/// Only constructible through [`PageGeometry::new`], so a value in hand is
/// always usable by the paginator and validator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageGeometry {
    line_length: usize,
    page_length: usize,
    numbered: bool,
}

impl Default for PageGeometry {
    fn default() -> Self {
        Self {
            line_length: DEFAULT_LINE_LENGTH,
            page_length: DEFAULT_PAGE_LENGTH,
            numbered: true,
        }
    }
}

impl PageGeometry {
    pub fn new(line_length: usize, page_length: usize, numbered: bool) -> Result<Self, ConfigError> {
        if line_length == 0 {
            return Err(ConfigError::InvalidGeometry {
                field: "line_length",
                value: line_length,
                reason: "must be greater than zero",
            });
        }
        if page_length == 0 {
            return Err(ConfigError::InvalidGeometry {
                field: "page_length",
                value: page_length,
                reason: "must be greater than zero",
            });
        }
        if numbered && page_length < 2 {
            return Err(ConfigError::InvalidGeometry {
                field: "page_length",
                value: page_length,
                reason: "numbered pages need at least one content line besides the page number",
            });
        }
        if numbered && line_length < MIN_NUMBERED_LINE_LENGTH {
            return Err(ConfigError::InvalidGeometry {
                field: "line_length",
                value: line_length,
                reason: "numbered pages need room for a four digit page number",
            });
        }
        Ok(Self {
            line_length,
            page_length,
            numbered,
        })
    }

    pub fn line_length(&self) -> usize {
        self.line_length
    }

    pub fn page_length(&self) -> usize {
        self.page_length
    }

    pub fn numbered(&self) -> bool {
        self.numbered
    }

    /// Lines per page available to content; the last one goes to the page number.
    pub fn content_lines(&self) -> usize {
        if self.numbered {
            self.page_length - 1
        } else {
            self.page_length
        }
    }

    pub fn blank_line(&self) -> String {
        " ".repeat(self.line_length)
    }
}
