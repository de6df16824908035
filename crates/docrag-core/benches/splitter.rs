use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use docrag_core::document::Document;
use docrag_core::index::cosine_similarity;
use docrag_core::splitter::{SplitterConfig, TextSplitter};
use std::hint::black_box;

fn generate_text(size: usize) -> String {
    let paragraph = "The quick brown fox jumps over the lazy dog. \
                     This sentence contains various English words and punctuation marks.\n\n";
    paragraph.repeat(size / paragraph.len() + 1)[..size].to_string()
}

fn split_prose(c: &mut Criterion) {
    let mut group = c.benchmark_group("split");
    let Ok(splitter) = TextSplitter::new(SplitterConfig::default()) else {
        return;
    };

    for size in [10_000, 100_000, 1_000_000] {
        let doc = Document::new(generate_text(size), "bench.txt");
        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::new("prose", size), &doc, |b, doc| {
            b.iter(|| splitter.split(black_box(doc)));
        });
    }

    group.finish();
}

fn split_unbroken(c: &mut Criterion) {
    let mut group = c.benchmark_group("split_unbroken");
    let Ok(splitter) = TextSplitter::new(SplitterConfig::new(200, 20)) else {
        return;
    };

    for size in [10_000, 100_000] {
        let doc = Document::new("x".repeat(size), "bench.txt");
        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::new("chars", size), &doc, |b, doc| {
            b.iter(|| splitter.split(black_box(doc)));
        });
    }

    group.finish();
}

fn cosine(c: &mut Criterion) {
    let mut group = c.benchmark_group("cosine_similarity");

    for dim in [384, 768, 1536] {
        #[allow(clippy::cast_precision_loss)]
        let a: Vec<f32> = (0..dim).map(|i| (i as f32).sin()).collect();
        #[allow(clippy::cast_precision_loss)]
        let b: Vec<f32> = (0..dim).map(|i| (i as f32).cos()).collect();
        group.bench_with_input(BenchmarkId::new("dim", dim), &(a, b), |bench, (a, b)| {
            bench.iter(|| cosine_similarity(black_box(a), black_box(b)));
        });
    }

    group.finish();
}

criterion_group!(benches, split_prose, split_unbroken, cosine);
criterion_main!(benches);
