//! BrailleForge CLI - Bridge interface for calling services
//!
//! Commands: encode, decode, format, validate, art, convert
//! Outputs JSON to stdout, logs to stderr
//! Returns non-zero on validation failure

use clap::{Parser, Subcommand};
use serde::Serialize;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use brailleforge_core::{
    ArtLookup, ConversionConfig, ConversionPipeline, ConvertRequest,
};

#[derive(Parser)]
#[command(name = "brailleforge-cli")]
#[command(about = "BrailleForge CLI - Embosser Production Compiler")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to a TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Encode plain text to Grade-1 Braille
    Encode {
        /// Input file (stdin when omitted)
        input: Option<PathBuf>,
    },

    /// Decode Grade-1 Braille back to text
    Decode {
        /// Input file (stdin when omitted)
        input: Option<PathBuf>,
    },

    /// Encode and paginate plain text into an embosser document
    Format {
        /// Input file (stdin when omitted)
        input: Option<PathBuf>,

        /// Write the document itself instead of JSON
        #[arg(long)]
        raw: bool,
    },

    /// Validate an embosser document
    Validate {
        /// Input file (stdin when omitted)
        input: Option<PathBuf>,
    },

    /// Encode an ASCII drawing into a tactile graphic
    Art {
        /// Input file (stdin when omitted)
        input: Option<PathBuf>,

        /// Figure id to attach to the block
        #[arg(short, long, default_value = "Fig_1")]
        figure: String,
    },

    /// Merge a transcript with its figures into one embosser document
    Convert {
        /// Transcript file (stdin when omitted)
        transcript: Option<PathBuf>,

        /// JSON object mapping figure ids to art
        #[arg(short, long)]
        figures: Option<PathBuf>,

        /// Write the document itself instead of JSON
        #[arg(long)]
        raw: bool,
    },
}

fn read_input(path: Option<&Path>) -> std::io::Result<String> {
    match path {
        Some(path) => std::fs::read_to_string(path),
        None => {
            let mut buffer = String::new();
            std::io::stdin().read_to_string(&mut buffer)?;
            Ok(buffer)
        }
    }
}

fn emit<T: Serialize>(value: &T, code: ExitCode) -> ExitCode {
    match serde_json::to_string_pretty(value) {
        Ok(json) => {
            println!("{}", json);
            code
        }
        Err(e) => {
            println!(r#"{{"success": false, "error": "Failed to serialize output: {}"}}"#, e);
            ExitCode::FAILURE
        }
    }
}

fn fail(message: String) -> ExitCode {
    emit(
        &serde_json::json!({ "success": false, "error": message }),
        ExitCode::FAILURE,
    )
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    let config = match ConversionConfig::load(cli.config.as_deref()) {
        Ok(c) => c,
        Err(e) => return fail(e.to_string()),
    };

    let pipeline = match ConversionPipeline::new(config) {
        Ok(p) => p,
        Err(e) => return fail(e.to_string()),
    };

    match cli.command {
        Commands::Encode { input } => {
            let text = match read_input(input.as_deref()) {
                Ok(t) => t,
                Err(e) => return fail(format!("Failed to read input: {}", e)),
            };
            let encoded = pipeline.encode_text(&text);
            emit(
                &serde_json::json!({
                    "braille": encoded.braille(),
                    "gaps": encoded.gaps,
                }),
                ExitCode::SUCCESS,
            )
        }

        Commands::Decode { input } => {
            let braille = match read_input(input.as_deref()) {
                Ok(t) => t,
                Err(e) => return fail(format!("Failed to read input: {}", e)),
            };
            emit(
                &serde_json::json!({ "text": pipeline.decode_text(&braille) }),
                ExitCode::SUCCESS,
            )
        }

        Commands::Format { input, raw } => {
            let text = match read_input(input.as_deref()) {
                Ok(t) => t,
                Err(e) => return fail(format!("Failed to read input: {}", e)),
            };
            let document = pipeline.format_text(&text).render();
            if raw {
                print!("{}", document);
                return ExitCode::SUCCESS;
            }
            let validation = pipeline.validate_document(&document);
            let code = if validation.valid { ExitCode::SUCCESS } else { ExitCode::from(2) };
            emit(
                &serde_json::json!({
                    "document": document,
                    "validation": validation,
                }),
                code,
            )
        }

        Commands::Validate { input } => {
            let document = match read_input(input.as_deref()) {
                Ok(t) => t,
                Err(e) => return fail(format!("Failed to read input: {}", e)),
            };
            let report = pipeline.validate_document(&document);
            let code = if report.valid {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(2) // Validation failure
            };
            emit(&report, code)
        }

        Commands::Art { input, figure } => {
            let ascii = match read_input(input.as_deref()) {
                Ok(t) => t,
                Err(e) => return fail(format!("Failed to read input: {}", e)),
            };
            emit(&pipeline.encode_art(&figure, &ascii), ExitCode::SUCCESS)
        }

        Commands::Convert { transcript, figures, raw } => {
            let transcript = match read_input(transcript.as_deref()) {
                Ok(t) => t,
                Err(e) => return fail(format!("Failed to read transcript: {}", e)),
            };
            let figures: ArtLookup = match figures {
                Some(path) => {
                    let content = match std::fs::read_to_string(&path) {
                        Ok(c) => c,
                        Err(e) => return fail(format!("Failed to read figures: {}", e)),
                    };
                    match serde_json::from_str(&content) {
                        Ok(f) => f,
                        Err(e) => return fail(format!("Invalid figures payload: {}", e)),
                    }
                }
                None => ArtLookup::new(),
            };

            let request = ConvertRequest { transcript, figures };
            match pipeline.convert(&request) {
                Ok(converted) => {
                    let code = if converted.ready_to_print() {
                        ExitCode::SUCCESS
                    } else {
                        ExitCode::from(2) // Not embosser-ready
                    };
                    if raw {
                        print!("{}", converted.document);
                        return code;
                    }
                    emit(&converted, code)
                }
                Err(e) => fail(e.to_string()),
            }
        }
    }
}
