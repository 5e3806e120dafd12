//! End-to-end extraction and playback over generated PDFs.

mod common;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use common::{prose_pdf, PdfBuilder};
use futures::stream::{self, StreamExt};
use readaloud::content::sampler::SAMPLE_SIZE;
use readaloud::content::{sample_hint, StrategyHint};
use readaloud::playback::{
    event_channel, EventSender, PlaybackDriver, PlaybackEngine, PlaybackState, SpeechBackend,
    SpeechEvent, Utterance,
};
use readaloud::summary::{summarize, ByteStream, SummaryRequest, TokenSource};
use readaloud::{
    ExtractionMethod, ExtractionOrchestrator, QualityGrade, RawDocument, ReaderError, Tier,
};
use tokio::sync::watch;

// ─── Extraction ──────────────────────────────────────────────────────────────

#[test]
fn structured_tier_grades_good() {
    let result = ExtractionOrchestrator::new().extract(&prose_pdf(), ExtractionMethod::Structured);

    assert_eq!(result.quality, QualityGrade::Good);
    assert_eq!(result.tier, Some(Tier::Structured));
    assert_eq!(result.page_count, Some(1));
    assert!(result.text.contains("The quick brown fox jumps over the lazy dog."));
    assert!(result.text.contains("Reading aloud helps with long papers."));
    assert_eq!(result.chunks.len(), 2);
}

#[test]
fn structured_tier_reads_compressed_content() {
    let pdf = PdfBuilder::new()
        .page(&["Compressed streams still carry sentences like this one."])
        .compressed()
        .build();
    let result = ExtractionOrchestrator::new().extract(&pdf, ExtractionMethod::Structured);

    assert_eq!(result.quality, QualityGrade::Good);
    assert!(result.text.contains("Compressed streams still carry sentences like this one."));
}

#[test]
fn structured_output_keeps_page_order() {
    let pdf = PdfBuilder::new()
        .page(&["Chapter one begins on the first page."])
        .page(&["Chapter two continues on the second page."])
        .build();
    let result = ExtractionOrchestrator::new().extract(&pdf, ExtractionMethod::Structured);

    assert_eq!(result.page_count, Some(2));
    let first = result.text.find("Chapter one").unwrap();
    let second = result.text.find("Chapter two").unwrap();
    assert!(first < second);
}

#[test]
fn auto_mode_scans_literals_when_streams_are_visible() {
    let pdf = prose_pdf();
    assert_eq!(sample_hint(&pdf), StrategyHint::StructuredObjectsPresent);

    let result = ExtractionOrchestrator::new().extract(&pdf, ExtractionMethod::Auto);
    assert_eq!(result.quality, QualityGrade::Fair);
    assert_eq!(result.tier, Some(Tier::Pattern));
    assert!(result.text.contains("The quick brown fox jumps over the lazy dog."));
}

#[test]
fn auto_mode_decodes_page_model_for_plain_layout() {
    let pdf = PdfBuilder::new()
        .page(&["A padded document still decodes through the page model."])
        .padded(SAMPLE_SIZE + 2_000)
        .build();
    assert_eq!(sample_hint(&pdf), StrategyHint::PlainLayout);

    let result = ExtractionOrchestrator::new().extract(&pdf, ExtractionMethod::Auto);
    assert_eq!(result.quality, QualityGrade::Good);
    assert!(result.text.contains("A padded document still decodes through the page model."));
    assert!(!result.text.contains("xxxx"));
}

#[test]
fn arbitrary_bytes_never_panic() {
    let orchestrator = ExtractionOrchestrator::new();
    let mut truncated = prose_pdf();
    truncated.truncate(truncated.len() / 2);

    let inputs: Vec<Vec<u8>> = vec![
        Vec::new(),
        b"%PDF-".to_vec(),
        truncated,
        (0..=255u8).cycle().take(4096).collect(),
        b"not a pdf at all, just words".to_vec(),
    ];

    for bytes in &inputs {
        for method in [
            ExtractionMethod::Auto,
            ExtractionMethod::Structured,
            ExtractionMethod::Pattern,
            ExtractionMethod::Loose,
            ExtractionMethod::Raw,
        ] {
            let result = orchestrator.extract(bytes, method);
            if result.quality == QualityGrade::Failed {
                assert!(result.error.as_deref().is_some_and(|e| !e.is_empty()));
                assert!(result.chunks.is_empty());
            }
        }
    }
}

#[test]
fn short_text_fails_with_reason() {
    // No text objects, so pattern falls through to raw, which keeps only "(Hi)"
    let result = ExtractionOrchestrator::new().extract(b"(Hi)", ExtractionMethod::Pattern);
    assert_eq!(result.quality, QualityGrade::Failed);
    assert_eq!(result.tier, Some(Tier::Raw));
    assert!(result.text.is_empty());

    let err = result.into_result().unwrap_err();
    assert!(matches!(
        err,
        ReaderError::ExtractionInsufficientText(ref reason) if !reason.is_empty()
    ));
}

#[test]
fn chunks_are_speakable_sentences() {
    let result = ExtractionOrchestrator::new().extract(&prose_pdf(), ExtractionMethod::Structured);
    for chunk in &result.chunks {
        assert!(chunk.len() > 5, "{chunk:?}");
        assert!(chunk.chars().any(|c| c.is_ascii_alphabetic()));
        assert!(chunk.ends_with(['.', '!', '?']));
    }
}

#[test]
fn non_pdf_is_rejected_before_extraction() {
    let bytes = b"Plain notes.".to_vec();
    let err = RawDocument::open("notes.txt", Some("text/plain"), bytes, ExtractionMethod::Auto)
        .unwrap_err();
    assert!(matches!(err, ReaderError::UnsupportedInput(_)));
}

// ─── Playback ────────────────────────────────────────────────────────────────

/// Reports every utterance as finished as soon as it is submitted.
struct EchoBackend {
    events: EventSender,
    spoken: Arc<Mutex<Vec<String>>>,
}

impl SpeechBackend for EchoBackend {
    fn is_available(&self) -> bool {
        true
    }

    fn submit(&mut self, utterance: Utterance) -> readaloud::Result<()> {
        self.spoken.lock().unwrap().push(utterance.text);
        let _ = self.events.send(SpeechEvent::started(utterance.token));
        let _ = self.events.send(SpeechEvent::ended(utterance.token));
        Ok(())
    }

    fn cancel(&mut self) {}

    fn pause_active(&mut self) -> readaloud::Result<()> {
        Ok(())
    }

    fn resume_active(&mut self) -> readaloud::Result<()> {
        Ok(())
    }
}

#[tokio::test]
async fn extracted_document_plays_end_to_end() {
    let result = ExtractionOrchestrator::new()
        .extract(&prose_pdf(), ExtractionMethod::Structured)
        .into_result()
        .unwrap();

    let (tx, rx) = event_channel();
    let spoken = Arc::new(Mutex::new(Vec::new()));
    let engine = PlaybackEngine::new(EchoBackend {
        events: tx,
        spoken: Arc::clone(&spoken),
    })
    .unwrap()
    .with_advance_delay(Duration::from_millis(1));
    let driver = PlaybackDriver::spawn(engine, rx);

    let expected: Vec<String> = result.chunks.iter().map(str::to_string).collect();
    driver.load(result.chunks).await.unwrap();
    driver.play().await.unwrap();

    let mut snapshots = driver.subscribe();
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            let done = {
                let snap = snapshots.borrow_and_update();
                snap.state == PlaybackState::Idle && spoken.lock().unwrap().len() == expected.len()
            };
            if done {
                break;
            }
            snapshots.changed().await.unwrap();
        }
    })
    .await
    .unwrap();

    assert_eq!(*spoken.lock().unwrap(), expected);
    assert_eq!(driver.snapshot().cursor, 0);
    driver.shutdown().await.unwrap();
}

// ─── Summary ─────────────────────────────────────────────────────────────────

fn sse_frame(content: &str) -> Bytes {
    Bytes::from(format!(
        "data: {}\n\n",
        serde_json::json!({ "choices": [{ "delta": { "content": content } }] })
    ))
}

struct ScriptedSource {
    frames: Vec<Bytes>,
    prompts: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl TokenSource for ScriptedSource {
    async fn open(&self, request: &SummaryRequest) -> readaloud::Result<ByteStream> {
        self.prompts.lock().unwrap().push(request.prompt().to_string());
        let items: Vec<readaloud::Result<Bytes>> = self.frames.iter().cloned().map(Ok).collect();
        Ok(stream::iter(items).boxed())
    }
}

#[test]
fn extracted_text_is_summarized_from_stream() {
    let result = ExtractionOrchestrator::new().extract(&prose_pdf(), ExtractionMethod::Structured);
    let prompts = Arc::new(Mutex::new(Vec::new()));
    let source = ScriptedSource {
        frames: vec![
            sse_frame("A fox "),
            sse_frame("and a dog."),
            Bytes::from_static(b"data: [DONE]\n\n"),
            sse_frame("never delivered"),
        ],
        prompts: Arc::clone(&prompts),
    };
    let (_cancel_tx, cancel_rx) = watch::channel(false);

    let mut tokens = Vec::new();
    let summary = tokio_test::block_on(summarize(&source, &result.text, cancel_rx, |t| {
        tokens.push(t.to_string())
    }))
    .unwrap();

    assert_eq!(summary, "A fox and a dog.");
    assert_eq!(tokens, ["A fox ", "and a dog."]);
    assert!(prompts.lock().unwrap()[0].contains("The quick brown fox"));
}
