//! Contract Invariant Tests
//!
//! These tests verify the non-negotiable guarantees of embosser output.

use std::sync::Arc;

use brailleforge_core::{
    generate_batched,
    merge::MISSING_ART_PLACEHOLDER,
    paginate::line_width,
    ArtGenerator, ArtLookup, ArtRequest, BatchConfig, ConversionConfig, ConversionPipeline, ConvertRequest,
    FigureArt, GeneratedArt, GenerationError, MergeWarning, PageGeometry, Paginator, TactileEncoder, Token,
    Transcoder, Validator, CAPITAL_INDICATOR, FORM_FEED, NUMBER_INDICATOR,
};

const LOWERCASE_CORPUS: &[&str] = &[
    "",
    "a",
    "hello world",
    "the quick brown fox\njumps over the lazy dog",
    "  leading and trailing  ",
    "many\n\n\nblank\nlines",
    "abcdefghijklmnopqrstuvwxyz",
];

const MIXED_CORPUS: &[&str] = &[
    "Hi 9!",
    "In 2024, NASA launched 3 probes; 12 more follow in 2030.",
    "Call 555 0100 now.",
    "A1B2C3 d4e5",
    "Tabs\tand\ttabs, \"quotes\" (parens) and apostrophes' - dashes.",
    "ALL CAPS HEADING\n\nbody text 7 8 9 0",
    "x99y 1.5 12:30",
];

fn long_text() -> String {
    let paragraph = "Braille transcription keeps every capital and number indicator next to its cell. \
                     Pages are exactly twenty five lines and lines exactly forty cells wide.";
    vec![paragraph; 30].join("\n\n")
}

fn digit_runs(s: &str) -> usize {
    let mut runs = 0;
    let mut in_run = false;
    for c in s.chars() {
        let digit = c.is_ascii_digit();
        if digit && !in_run {
            runs += 1;
        }
        in_run = digit;
    }
    runs
}

#[test]
fn invariant_lowercase_round_trip() {
    let t = Transcoder::default();
    for s in LOWERCASE_CORPUS {
        assert_eq!(&t.decode(&t.encode(s)), s);
    }
}

#[test]
fn invariant_capital_indicator_count() {
    let t = Transcoder::default();
    for s in MIXED_CORPUS.iter().chain(LOWERCASE_CORPUS) {
        let indicators = t.encode(s).chars().filter(|c| *c == CAPITAL_INDICATOR).count();
        let capitals = s.chars().filter(char::is_ascii_uppercase).count();
        assert_eq!(indicators, capitals, "input {s:?}");
    }
}

#[test]
fn invariant_number_indicator_per_digit_run() {
    let t = Transcoder::default();
    for s in MIXED_CORPUS.iter().chain(LOWERCASE_CORPUS) {
        let indicators = t.encode(s).chars().filter(|c| *c == NUMBER_INDICATOR).count();
        assert_eq!(indicators, digit_runs(s), "input {s:?}");
    }
}

#[test]
fn invariant_every_line_exact_width() {
    let t = Transcoder::default();
    for line_length in [20, 32, 40] {
        let p = Paginator::new(PageGeometry::new(line_length, 25, true).unwrap());
        let text = long_text();
        for s in MIXED_CORPUS.iter().copied().chain(std::iter::once(text.as_str())) {
            let rendered = p.format(&t.encode(s)).render();
            for page in rendered.split(FORM_FEED) {
                for line in page.split('\n') {
                    assert_eq!(line_width(line), line_length, "input {s:?}");
                }
            }
        }
    }
}

#[test]
fn invariant_form_feed_count() {
    let t = Transcoder::default();
    for (page_length, numbered) in [(25, true), (25, false), (4, true), (2, false)] {
        let p = Paginator::new(PageGeometry::new(40, page_length, numbered).unwrap());
        let doc = p.format(&t.encode(&long_text()));
        let rendered = doc.render();

        let total_lines: usize = rendered.split(FORM_FEED).map(|page| page.split('\n').count()).sum();
        let form_feeds = rendered.matches(FORM_FEED).count();
        assert_eq!(form_feeds, total_lines.div_ceil(page_length) - 1);
        assert!(doc.page_count() > 1);
    }
}

#[test]
fn invariant_pipeline_self_consistent() {
    let t = Transcoder::default();
    let geometry = PageGeometry::default();
    let p = Paginator::new(geometry);
    let v = Validator::new(geometry);

    let text = long_text();
    for s in MIXED_CORPUS.iter().copied().chain(LOWERCASE_CORPUS.iter().copied()).chain([text.as_str()]) {
        let report = v.validate(&p.format(&t.encode(s)).render());
        assert!(report.valid, "input {s:?}: {:?}", report.errors);
    }
}

#[test]
fn invariant_encode_block_extremes() {
    let enc = TactileEncoder::default();
    let full: Vec<Vec<char>> = vec![vec!['#'; 2]; 4];
    let blank: Vec<Vec<char>> = vec![vec![' '; 2]; 4];
    let mut corner = blank.clone();
    corner[0][0] = '@';

    fn rows<'a>(g: &'a Vec<Vec<char>>) -> Vec<&'a [char]> {
        g.iter().map(Vec::as_slice).collect::<Vec<_>>()
    }
    assert_eq!(enc.encode_block(&rows(&full)).to_char(), '\u{28FF}');
    assert_eq!(enc.encode_block(&rows(&blank)).to_char(), '\u{2800}');
    assert_eq!(enc.encode_block(&rows(&corner)).to_char(), '\u{2801}');
}

#[test]
fn invariant_missing_art_never_fails() {
    let pipeline = ConversionPipeline::new(ConversionConfig::default()).unwrap();
    let request = ConvertRequest {
        transcript: "Look at this. [Fig_1: A circle] Done.".to_string(),
        figures: ArtLookup::new(),
    };

    let converted = pipeline.convert(&request).unwrap();
    let placeholder = Transcoder::default().encode(MISSING_ART_PLACEHOLDER);

    assert!(converted.document.contains(&placeholder));
    assert!(converted.warnings.contains(&MergeWarning::MissingArt {
        figure_id: "Fig_1".to_string()
    }));
    assert!(converted.validation.valid);
}

#[test]
fn invariant_hi_nine_scenario() {
    let t = Transcoder::default();
    let tokens = t.encode_tokens("Hi 9!");
    assert_eq!(tokens.len(), 5);
    assert!(matches!(tokens[0], Token::Capital(_)));
    assert!(matches!(tokens[3], Token::Number(_)));

    let doc = Paginator::default().format(&t.encode("Hi 9!"));
    let rendered = doc.render();
    assert_eq!(rendered.matches(FORM_FEED).count(), 0);

    let first = rendered.split('\n').next().unwrap();
    assert_eq!(line_width(first), 40);
    assert!(first.starts_with(&t.encode("Hi 9!")));
}

#[test]
fn invariant_merged_document_validates() {
    let pipeline = ConversionPipeline::new(ConversionConfig::default()).unwrap();
    let mut figures = ArtLookup::new();
    figures.insert(
        "Fig_1".to_string(),
        FigureArt::Ascii("+--------+\n|        |\n|   XX   |\n+--------+".to_string()),
    );
    figures.insert("Fig_2".to_string(), FigureArt::Braille("\u{28FF}\u{2801}\n\u{2808}".to_string()));

    let transcript = format!(
        "{}\n\n[Fig_1: A framed square]\n\nMore text.\n\n[Fig_2: Dots] closing remarks [Fig_3: Not drawn]",
        long_text()
    );
    let converted = pipeline
        .convert(&ConvertRequest {
            transcript,
            figures,
        })
        .unwrap();

    assert!(converted.validation.valid, "{:?}", converted.validation.errors);
    assert!(converted.page_count > 1);
    assert_eq!(converted.figures.len(), 3);
    assert_eq!(
        converted.warnings,
        vec![MergeWarning::MissingArt {
            figure_id: "Fig_3".to_string()
        }]
    );
}

#[test]
fn invariant_passthrough_is_caught_by_validator() {
    let config = ConversionConfig {
        unmapped_char_policy: brailleforge_core::UnmappedCharPolicy::Passthrough,
        ..Default::default()
    };
    let pipeline = ConversionPipeline::new(config).unwrap();
    let document = pipeline.format_text("price: 5€").render();

    let report = pipeline.validate_document(&document);
    assert!(!report.valid);
    assert!(report.errors.iter().any(|e| e.rule == "character_set"));
}

#[test]
fn invariant_page_count_matches_rendered_document() {
    let config = ConversionConfig {
        unmapped_char_policy: brailleforge_core::UnmappedCharPolicy::Passthrough,
        ..Default::default()
    };
    let pipeline = ConversionPipeline::new(config).unwrap();
    for transcript in ["one\u{000C}two", "\u{000C}\u{000C}", "[Fig_1: Page\u{000C}break] after"] {
        let converted = pipeline
            .convert(&ConvertRequest {
                transcript: transcript.to_string(),
                figures: ArtLookup::new(),
            })
            .unwrap();
        let form_feeds = converted.document.matches(FORM_FEED).count();
        assert_eq!(form_feeds, converted.page_count.saturating_sub(1), "input {transcript:?}");
        assert!(converted.validation.valid, "input {transcript:?}: {:?}", converted.validation.errors);
    }
}

#[test]
fn invariant_narrow_numbered_lines_stay_exact() {
    let t = Transcoder::default();
    let p = Paginator::new(PageGeometry::new(5, 2, true).unwrap());
    let rendered = p.format(&t.encode(&"ab ".repeat(40))).render();
    for page in rendered.split(FORM_FEED) {
        for line in page.split('\n') {
            assert_eq!(line_width(line), 5);
        }
    }
    assert!(Validator::new(*p.geometry()).validate(&rendered).valid);
}

#[test]
fn invariant_bad_geometry_is_fatal() {
    for (line_length, page_length) in [(0, 25), (40, 0), (2, 2)] {
        let config = ConversionConfig {
            line_length,
            page_length,
            ..Default::default()
        };
        assert!(ConversionPipeline::new(config).is_err());
    }
}

struct Numbered;

impl ArtGenerator for Numbered {
    fn generate(&self, batch: &[ArtRequest]) -> Result<Vec<GeneratedArt>, GenerationError> {
        if batch.iter().any(|r| r.description == "unreachable service") {
            return Err(GenerationError::Service("connection refused".to_string()));
        }
        Ok(batch
            .iter()
            .map(|r| GeneratedArt {
                figure_id: r.figure_id.clone(),
                art: FigureArt::Ascii("##\n##".to_string()),
            })
            .collect())
    }
}

#[test]
fn invariant_batch_failure_degrades_not_aborts() {
    let mut requests: Vec<ArtRequest> = (1..=5)
        .map(|i| ArtRequest {
            figure_id: format!("Fig_{i}"),
            description: "a square".to_string(),
        })
        .collect();
    requests[4].description = "unreachable service".to_string();

    let config = BatchConfig {
        batch_size: 2,
        max_retries: 1,
        retry_delay_ms: 1,
        ..Default::default()
    };
    let outcome = generate_batched(Arc::new(Numbered), requests, &config);
    assert_eq!(outcome.failed_batches.len(), 1);
    assert_eq!(outcome.failed_batches[0].index, 2);

    let figures = outcome.into_lookup();
    let pipeline = ConversionPipeline::new(ConversionConfig::default()).unwrap();
    let transcript = (1..=5).map(|i| format!("[Fig_{i}: Square {i}]")).collect::<Vec<_>>().join("\n");
    let converted = pipeline.convert(&ConvertRequest { transcript, figures }).unwrap();

    assert_eq!(converted.figures.iter().filter(|f| f.has_art).count(), 4);
    assert!(converted.validation.valid);
}

#[cfg(feature = "test-hooks")]
#[test]
fn invariant_convert_calls_validate() {
    use brailleforge_core::pipeline::{get_validation_call_count, reset_validation_call_count};

    reset_validation_call_count();
    let pipeline = ConversionPipeline::new(ConversionConfig::default()).unwrap();
    pipeline.convert(&ConvertRequest::default()).unwrap();
    assert_eq!(get_validation_call_count(), 1);
}
