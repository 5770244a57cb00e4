//! Conversion Pipeline - Single Entry Point
//!
//! CRITICAL: convert MUST call validate internally. No bypass.
//! Validation is advisory: a failing report is returned, never raised.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::{ConfigError, ConversionConfig};
use crate::embosser::PageGeometry;
use crate::hashing::{compute_job_hash, compute_manifest_hash};
use crate::merge::{ArtLookup, FigureEntry, MergeWarning, Merger};
use crate::paginate::{Document, Paginator};
use crate::tactile::{ArtBlock, TactileEncoder};
use crate::transcode::{Encoded, Transcoder};
use crate::validation::{ValidationReport, Validator};
use crate::ENGINE_VERSION;

#[cfg(feature = "test-hooks")]
use std::sync::atomic::{AtomicU32, Ordering};

#[cfg(feature = "test-hooks")]
static VALIDATION_CALL_COUNT: AtomicU32 = AtomicU32::new(0);

#[cfg(feature = "test-hooks")]
pub fn get_validation_call_count() -> u32 {
    VALIDATION_CALL_COUNT.load(Ordering::SeqCst)
}

#[cfg(feature = "test-hooks")]
pub fn reset_validation_call_count() {
    VALIDATION_CALL_COUNT.store(0, Ordering::SeqCst);
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConvertRequest {
    pub transcript: String,
    #[serde(default)]
    pub figures: ArtLookup,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConvertedDocument {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub engine_version: String,
    pub job_hash: String,
    pub manifest_hash: String,
    pub page_count: usize,
    pub document: String,
    pub figures: Vec<FigureEntry>,
    pub warnings: Vec<MergeWarning>,
    pub validation: ValidationReport,
}

impl ConvertedDocument {
    pub fn ready_to_print(&self) -> bool {
        self.validation.valid
    }
}

/// The conversion pipeline - single entry point for all document operations
pub struct ConversionPipeline {
    config: ConversionConfig,
    transcoder: Transcoder,
    encoder: TactileEncoder,
    paginator: Paginator,
    merger: Merger,
    validator: Validator,
}

impl ConversionPipeline {
    /// Build every component from one config. Invalid configuration is the
    /// only fatal error and is reported here, before any input is read.
    pub fn new(config: ConversionConfig) -> Result<Self, PipelineError> {
        config.validate()?;
        let geometry = config.geometry()?;

        Ok(Self {
            transcoder: Transcoder::from_config(&config),
            encoder: TactileEncoder::from_config(&config),
            paginator: Paginator::new(geometry),
            merger: Merger::from_config(&config, geometry),
            validator: Validator::new(geometry),
            config,
        })
    }

    pub fn config(&self) -> &ConversionConfig {
        &self.config
    }

    pub fn geometry(&self) -> &PageGeometry {
        self.paginator.geometry()
    }

    pub fn encode_text(&self, text: &str) -> Encoded {
        self.transcoder.encode_detailed(text)
    }

    pub fn decode_text(&self, braille: &str) -> String {
        self.transcoder.decode(braille)
    }

    /// Encode plain text and lay it out as an embosser document.
    pub fn format_text(&self, text: &str) -> Document {
        self.paginator.format(&self.transcoder.encode(text))
    }

    pub fn encode_art(&self, figure_id: &str, ascii: &str) -> ArtBlock {
        self.encoder.encode_art(figure_id, ascii)
    }

    /// Validate a rendered document
    ///
    /// This is the ONLY validation entry point.
    pub fn validate_document(&self, document: &str) -> ValidationReport {
        #[cfg(feature = "test-hooks")]
        VALIDATION_CALL_COUNT.fetch_add(1, Ordering::SeqCst);

        let report = self.validator.validate(document);
        if !report.valid {
            warn!(errors = report.errors.len(), "document failed embosser validation");
        }
        report
    }

    /// Convert a transcript with inline figure tags into an embosser document
    ///
    /// CRITICAL: This ALWAYS calls validate_document internally. No bypass possible.
    pub fn convert(&self, request: &ConvertRequest) -> Result<ConvertedDocument, PipelineError> {
        info!(
            chars = request.transcript.len(),
            figures = request.figures.len(),
            "converting transcript"
        );

        let merged = self.merger.merge(&request.transcript, &request.figures);
        let document = merged.document.render();

        // MANDATORY: Validation is always called. This is non-negotiable.
        let validation = self.validate_document(&document);

        let job_hash = compute_job_hash(&self.config, request, ENGINE_VERSION)?;

        let mut converted = ConvertedDocument {
            id: Uuid::new_v4().to_string(),
            created_at: Utc::now(),
            engine_version: ENGINE_VERSION.to_string(),
            job_hash,
            manifest_hash: String::new(), // Computed after
            page_count: merged.document.page_count(),
            document,
            figures: merged.figures,
            warnings: merged.warnings,
            validation,
        };

        converted.manifest_hash = compute_manifest_hash(&converted)?;

        info!(
            pages = converted.page_count,
            warnings = converted.warnings.len(),
            valid = converted.validation.valid,
            "conversion finished"
        );
        Ok(converted)
    }
}
