//! Conversion Configuration
//!
//! One explicit value passed into every component. Loaded from TOML or built
//! in code; validated once, before any text is touched.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::batch::BatchConfig;
use crate::embosser::{PageGeometry, DEFAULT_LINE_LENGTH, DEFAULT_PAGE_LENGTH};

/// Glyphs that count as a raised dot in ASCII art unless configured otherwise.
pub const DEFAULT_RAISED_GLYPHS: &str =
    "#@OX*+=|-_/\\─━│┃┌┍┎┏┐┑┒┓└┕┖┗┘┙┚┛├┝┠┣┤┥┨┫┬┯┰┳┴┷┸┻┼┿╂╋═║╔╗╚╝╠╣╦╩╬╭╮╯╰╱╲╳█";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid {field} = {value}: {reason}")]
    InvalidGeometry {
        field: &'static str,
        value: usize,
        reason: &'static str,
    },

    #[error("Malformed raised glyph set: {0}")]
    MalformedGlyphSet(String),

    #[error("Failed to read config file '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file '{path}': {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// What to emit for a character the Grade-1 table does not cover.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnmappedCharPolicy {
    /// Substitute the empty cell U+2800.
    #[default]
    Blank,
    /// Keep the original character.
    Passthrough,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversionConfig {
    pub line_length: usize,
    pub page_length: usize,
    pub include_page_numbers: bool,
    pub tab_spaces: usize,
    pub raised_glyphs: String,
    pub unmapped_char_policy: UnmappedCharPolicy,
    pub batch: BatchConfig,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            line_length: DEFAULT_LINE_LENGTH,
            page_length: DEFAULT_PAGE_LENGTH,
            include_page_numbers: true,
            tab_spaces: 2,
            raised_glyphs: DEFAULT_RAISED_GLYPHS.to_string(),
            unmapped_char_policy: UnmappedCharPolicy::Blank,
            batch: BatchConfig::default(),
        }
    }
}

impl ConversionConfig {
    /// Load from a TOML file, or defaults when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        let config: ConversionConfig = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn geometry(&self) -> Result<PageGeometry, ConfigError> {
        PageGeometry::new(self.line_length, self.page_length, self.include_page_numbers)
    }

    /// Check every option; the pipeline calls this before doing any work.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.geometry()?;
        if self.raised_glyphs.is_empty() {
            return Err(ConfigError::MalformedGlyphSet("set is empty".to_string()));
        }
        if let Some(c) = self.raised_glyphs.chars().find(|c| c.is_whitespace() || c.is_control()) {
            return Err(ConfigError::MalformedGlyphSet(format!(
                "contains non-printing character U+{:04X}",
                c as u32
            )));
        }
        Ok(())
    }
}
