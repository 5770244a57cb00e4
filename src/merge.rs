//! Figure Merger - inline figure tags + tactile art -> one paginated document
//!
//! Tags look like `[Fig_<n>: <caption>]`. A missing figure never fails the
//! merge; the caption is kept with a placeholder and a warning is recorded.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::sync::OnceLock;
use tracing::{debug, warn};

use crate::cell::is_line_char;
use crate::config::ConversionConfig;
use crate::embosser::PageGeometry;
use crate::paginate::{Document, Paginator};
use crate::tactile::{ArtBlock, FigureArt, TactileEncoder};
use crate::transcode::{EncodingGap, Transcoder};

pub const TABLE_OF_FIGURES_HEADING: &str = "Table of Figures";
pub const MISSING_ART_PLACEHOLDER: &str = "missing art";

/// Figure id -> art, as handed over by the art producers.
pub type ArtLookup = BTreeMap<String, FigureArt>;

fn figure_tag_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\[Fig_(\d+):\s*([^\]]*)\]").expect("figure tag pattern compiles"))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FigureTag {
    pub figure_id: String,
    pub number: u64,
    pub caption: String,
    /// Byte range of the tag in the transcript.
    pub start: usize,
    pub end: usize,
}

impl FigureTag {
    pub fn label(&self) -> String {
        format!("{}: {}", self.figure_id, self.caption)
    }
}

/// Find every well-formed figure tag, in transcript order.
pub fn scan_figure_tags(transcript: &str) -> Vec<FigureTag> {
    figure_tag_pattern()
        .captures_iter(transcript)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let digits = caps.get(1)?.as_str();
            let number = digits.parse().ok()?;
            Some(FigureTag {
                figure_id: format!("Fig_{digits}"),
                number,
                caption: caps.get(2).map_or("", |m| m.as_str()).trim().to_string(),
                start: whole.start(),
                end: whole.end(),
            })
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranscriptSegment {
    Text(String),
    Art {
        figure_id: String,
        caption: String,
        block: Option<ArtBlock>,
    },
}

/// Conditions the merge recovered from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MergeWarning {
    MissingArt { figure_id: String },
    UnmappedCharacter { gap: EncodingGap },
    ArtWiderThanLine { figure_id: String, width: usize, line_length: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FigureEntry {
    pub figure_id: String,
    pub caption: String,
    pub has_art: bool,
}

#[derive(Debug, Clone)]
pub struct MergedDocument {
    pub document: Document,
    pub figures: Vec<FigureEntry>,
    pub warnings: Vec<MergeWarning>,
}

pub struct Merger {
    transcoder: Transcoder,
    encoder: TactileEncoder,
    paginator: Paginator,
}

impl Merger {
    pub fn new(transcoder: Transcoder, encoder: TactileEncoder, geometry: PageGeometry) -> Self {
        Self {
            transcoder,
            encoder,
            paginator: Paginator::new(geometry),
        }
    }

    pub fn from_config(config: &ConversionConfig, geometry: PageGeometry) -> Self {
        Self::new(Transcoder::from_config(config), TactileEncoder::from_config(config), geometry)
    }

    /// Split a transcript into text and figure segments, leading with a
    /// table of figures when any tag is present.
    pub fn segment(&self, transcript: &str, art: &ArtLookup) -> Vec<TranscriptSegment> {
        let tags = scan_figure_tags(transcript);
        let mut segments = Vec::with_capacity(tags.len() * 2 + 2);

        if !tags.is_empty() {
            segments.push(TranscriptSegment::Text(table_of_figures(&tags)));
        }

        let mut cursor = 0;
        for tag in &tags {
            let before = &transcript[cursor..tag.start];
            if !before.trim().is_empty() {
                segments.push(TranscriptSegment::Text(before.to_string()));
            }
            let block = art
                .get(&tag.figure_id)
                .map(|a| self.encoder.resolve(&tag.figure_id, a).with_caption(tag.caption.clone()));
            segments.push(TranscriptSegment::Art {
                figure_id: tag.figure_id.clone(),
                caption: tag.label(),
                block,
            });
            cursor = tag.end;
        }

        let rest = &transcript[cursor..];
        if !rest.trim().is_empty() {
            segments.push(TranscriptSegment::Text(rest.to_string()));
        }

        segments
    }

    pub fn merge(&self, transcript: &str, art: &ArtLookup) -> MergedDocument {
        let segments = self.segment(transcript, art);
        let mut warnings = Vec::new();
        let mut figures = Vec::new();
        let mut listed = HashSet::new();
        let mut lines = Vec::new();
        let mut last_was_text = false;

        for segment in &segments {
            match segment {
                TranscriptSegment::Text(text) => {
                    if last_was_text {
                        lines.push(self.paginator.geometry().blank_line());
                    }
                    last_was_text = true;
                    let encoded = self.transcoder.encode_detailed(text);
                    warnings.extend(
                        encoded
                            .gaps
                            .iter()
                            .cloned()
                            .map(|gap| MergeWarning::UnmappedCharacter { gap }),
                    );
                    lines.extend(self.paginator.wrap(&encoded.braille()));
                }
                TranscriptSegment::Art {
                    figure_id,
                    caption,
                    block,
                } => {
                    last_was_text = false;
                    if listed.insert(figure_id.clone()) {
                        figures.push(FigureEntry {
                            figure_id: figure_id.clone(),
                            caption: caption.clone(),
                            has_art: block.is_some(),
                        });
                    }
                    lines.extend(self.art_lines(figure_id, caption, block.as_ref(), &mut warnings));
                }
            }
        }

        let lines = lines.into_iter().map(|line| self.sanitize(&line)).collect();
        let document = self.paginator.paginate(lines);
        debug!(
            segments = segments.len(),
            figures = figures.len(),
            pages = document.page_count(),
            "merged transcript"
        );

        MergedDocument {
            document,
            figures,
            warnings,
        }
    }

    fn art_lines(
        &self,
        figure_id: &str,
        caption: &str,
        block: Option<&ArtBlock>,
        warnings: &mut Vec<MergeWarning>,
    ) -> Vec<String> {
        let geometry = self.paginator.geometry();
        let mut lines = vec![geometry.blank_line()];
        lines.extend(self.paginator.wrap(&self.transcoder.encode(caption)));

        match block {
            Some(block) => {
                let width = block.width();
                if width > geometry.line_length() {
                    warn!(figure_id, width, "art is wider than the embosser line");
                    warnings.push(MergeWarning::ArtWiderThanLine {
                        figure_id: figure_id.to_string(),
                        width,
                        line_length: geometry.line_length(),
                    });
                }
                lines.extend(block.lines.iter().cloned());
            }
            None => {
                warn!(figure_id, "no art supplied for figure");
                warnings.push(MergeWarning::MissingArt {
                    figure_id: figure_id.to_string(),
                });
                let placeholder = format!("({MISSING_ART_PLACEHOLDER})");
                lines.extend(self.paginator.wrap(&self.transcoder.encode(&placeholder)));
            }
        }

        lines.push(geometry.blank_line());
        lines
    }

    /// Keep only embossable characters, then pad to the line width.
    fn sanitize(&self, line: &str) -> String {
        let mut kept: String = line.chars().filter(|c| is_line_char(*c)).collect();
        let width = kept.chars().count();
        let target = self.paginator.geometry().line_length();
        if width < target {
            kept.extend(std::iter::repeat(' ').take(target - width));
        }
        kept
    }
}

fn table_of_figures(tags: &[FigureTag]) -> String {
    let mut seen = HashSet::new();
    let mut out = String::from(TABLE_OF_FIGURES_HEADING);
    for tag in tags.iter().filter(|t| seen.insert(t.figure_id.as_str())) {
        out.push_str("\n\n");
        out.push_str(&tag.label());
    }
    out
}
