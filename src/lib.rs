//! BrailleForge Core - Embosser Production Compiler
//!
//! # The Five Laws (Non-Negotiable)
//! 1. Every Line Is Exactly One Line Wide
//! 2. Indicators Never Leave Their Cells
//! 3. Validation Is Advisory, Never Skipped
//! 4. Missing Art Never Stops a Document
//! 5. Only Bad Configuration Is Fatal

pub mod batch;
pub mod cell;
pub mod config;
pub mod embosser;
pub mod hashing;
pub mod merge;
pub mod paginate;
pub mod pipeline;
pub mod tactile;
pub mod transcode;
pub mod validation;

pub use batch::{generate_batched, ArtGenerator, ArtRequest, BatchConfig, BatchOutcome, GeneratedArt, GenerationError};
pub use cell::{BrailleCell, BLANK_CELL, CAPITAL_INDICATOR, FORM_FEED, NUMBER_INDICATOR};
pub use config::{ConfigError, ConversionConfig, UnmappedCharPolicy};
pub use embosser::PageGeometry;
pub use hashing::{canonical_json, compute_job_hash, compute_manifest_hash};
pub use merge::{ArtLookup, MergeWarning, MergedDocument, Merger, TranscriptSegment};
pub use paginate::{Document, Page, Paginator};
pub use pipeline::{ConversionPipeline, ConvertRequest, ConvertedDocument, PipelineError};
pub use tactile::{ArtBlock, FigureArt, TactileEncoder};
pub use transcode::{EncodingGap, Token, Transcoder};
pub use validation::{ValidationIssue, ValidationReport, ValidationRule, Validator};

pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");
