use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};
use document_core::{
    HeightTree, SearchOptions, SegmentLayerId, TextDocument, TextSource, search,
};

fn large_text(line_count: usize) -> String {
    let mut out = String::with_capacity(line_count * 48);
    for i in 0..line_count {
        if i > 0 {
            out.push(if i % 7 == 0 { '\r' } else { '\n' });
        }
        out.push_str(&format!("let value_{i} = lazy(\"{i:06}\") + other_{};", i % 97));
    }
    out
}

fn bench_large_file_open(c: &mut Criterion) {
    let text = large_text(50_000);
    c.bench_function("large_file_open/50k_lines", |b| {
        b.iter(|| {
            let doc = TextDocument::from_text(black_box(&text));
            black_box(doc.line_count());
        })
    });
}

fn bench_typing_in_middle(c: &mut Criterion) {
    let text = large_text(50_000);
    c.bench_function("typing_middle/100_inserts", |b| {
        b.iter_batched(
            || TextDocument::from_text(&text),
            |mut doc| {
                let mut offset = doc.text_length() / 2;
                for _ in 0..100 {
                    doc.insert(offset, "x").unwrap();
                    offset += 1;
                }
                black_box(doc.text_length());
            },
            BatchSize::LargeInput,
        )
    });
}

fn bench_edits_with_segments(c: &mut Criterion) {
    let text = large_text(10_000);
    c.bench_function("segments/1k_segments_100_newlines", |b| {
        b.iter_batched(
            || {
                let mut doc = TextDocument::from_text(&text);
                let step = doc.text_length() / 1000;
                for i in 0..1000 {
                    doc.add_segment(SegmentLayerId::HIGHLIGHTS, i * step, 5, 0)
                        .unwrap();
                }
                doc
            },
            |mut doc| {
                let offset = doc.text_length() / 3;
                for _ in 0..100 {
                    doc.insert(offset, "\n").unwrap();
                }
                black_box(doc.layer(SegmentLayerId::HIGHLIGHTS).map(|l| l.len()));
            },
            BatchSize::LargeInput,
        )
    });
}

fn bench_height_tree_hit_test(c: &mut Criterion) {
    let mut tree = HeightTree::new(100_000, 16.0);
    for start in (1..99_000).step_by(1000) {
        tree.collapse(start, start + 100).unwrap();
    }
    let total = tree.total_height();
    c.bench_function("height_tree/1k_hit_tests", |b| {
        b.iter(|| {
            let mut y = 0.0;
            while y < total {
                black_box(tree.line_by_visual_position(black_box(y)));
                y += total / 1000.0;
            }
        })
    });
}

fn bench_search_snapshot(c: &mut Criterion) {
    let doc = TextDocument::from_text(&large_text(20_000));
    let strategy = search::create("lazy", SearchOptions::normal().with_whole_words(true)).unwrap();
    c.bench_function("search/20k_lines_whole_words", |b| {
        b.iter(|| {
            let snapshot = doc.snapshot();
            black_box(strategy.find_all(&snapshot, 0, snapshot.text_length()).count());
        })
    });
}

criterion_group!(
    benches,
    bench_large_file_open,
    bench_typing_in_middle,
    bench_edits_with_segments,
    bench_height_tree_hit_test,
    bench_search_snapshot
);
criterion_main!(benches);
