//! Benchmarks for the extraction cascade and text clean-up at varying payload sizes.
//!
//! Run with: `cargo bench --bench extract_bench`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use readaloud::content::{ExtractionMethod, ExtractionOrchestrator, LooseStrategy, PatternStrategy};
use readaloud::text::{chunk, sanitize};

/// Generate an uncompressed PDF-like byte buffer of approximately `target_bytes`.
///
/// Text objects are interleaved with object headers, dictionaries and a short
/// binary run so every tier has something to skip.
fn generate_pdf(target_bytes: usize) -> Vec<u8> {
    let header = b"%PDF-1.4\n%\xe2\xe3\xcf\xd3\n";
    let text_object = b"4 0 obj\n<< /Length 120 >>\nstream\nBT /F1 12 Tf 72 700 Td \
        (Reading a long paper aloud takes patience.) Tj T* \
        (Each sentence becomes one chunk of speech!) Tj ET\nendstream\nendobj\n";
    let dictionary = b"5 0 obj\n<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] >>\nendobj\n";
    let binary = [0x00, 0x9c, 0xff, 0x1f, 0x80, 0x7f, 0x0a];

    let mut pdf = Vec::with_capacity(target_bytes + 512);
    pdf.extend_from_slice(header);
    let blocks: [&[u8]; 3] = [text_object, dictionary, &binary];
    let mut block_idx = 0;

    while pdf.len() < target_bytes {
        pdf.extend_from_slice(blocks[block_idx % blocks.len()]);
        block_idx += 1;
    }

    pdf.extend_from_slice(b"trailer\n<< /Root 1 0 R >>\n%%EOF\n");
    pdf
}

/// Noisy extracted text: prose mixed with PDF syntax fragments.
fn generate_noisy_text(target_bytes: usize) -> String {
    let blocks = [
        "The committee reviewed every proposal in detail. ",
        "xref 0 6 0000000000 65535 f trailer ",
        "Did the results hold up under scrutiny? ",
        "stream QmFzZTY0RW5jb2RlZERhdGFCbG9ja0hlcmU endstream ",
        "They did, and the findings were published! ",
    ];

    let mut text = String::with_capacity(target_bytes + 128);
    let mut block_idx = 0;
    while text.len() < target_bytes {
        text.push_str(blocks[block_idx % blocks.len()]);
        block_idx += 1;
    }
    text
}

const SIZES: &[(usize, &str)] = &[(10_240, "10KB"), (102_400, "100KB"), (1_048_576, "1MB")];

fn bench_cascade(c: &mut Criterion) {
    let mut group = c.benchmark_group("extraction_cascade");
    let orchestrator = ExtractionOrchestrator::new();

    for &(size, label) in SIZES {
        let pdf = generate_pdf(size);
        group.throughput(Throughput::Bytes(pdf.len() as u64));

        for method in [ExtractionMethod::Auto, ExtractionMethod::Pattern, ExtractionMethod::Raw] {
            group.bench_with_input(BenchmarkId::new(method.to_string(), label), &pdf, |b, pdf| {
                b.iter(|| black_box(orchestrator.extract(black_box(pdf), method)));
            });
        }
    }

    group.finish();
}

fn bench_scanners(c: &mut Criterion) {
    let mut group = c.benchmark_group("scanners");

    let pdf = generate_pdf(102_400);
    let content = String::from_utf8_lossy(&pdf).into_owned();
    group.throughput(Throughput::Bytes(content.len() as u64));

    group.bench_function("pattern_100kb", |b| {
        b.iter(|| black_box(PatternStrategy::scan(black_box(&content))));
    });
    group.bench_function("loose_100kb", |b| {
        b.iter(|| black_box(LooseStrategy::scan(black_box(&content))));
    });

    group.finish();
}

fn bench_text_cleanup(c: &mut Criterion) {
    let mut group = c.benchmark_group("text_cleanup");

    for &(size, label) in SIZES {
        let noisy = generate_noisy_text(size);
        group.throughput(Throughput::Bytes(noisy.len() as u64));

        group.bench_with_input(BenchmarkId::new("sanitize", label), &noisy, |b, text| {
            b.iter(|| black_box(sanitize(black_box(text))));
        });

        let clean = sanitize(&noisy);
        group.bench_with_input(BenchmarkId::new("chunk", label), &clean, |b, text| {
            b.iter(|| black_box(chunk(black_box(text))));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_cascade, bench_scanners, bench_text_cleanup);
criterion_main!(benches);
