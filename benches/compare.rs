use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use seekr::processor::{search_bytes, ScanOptions};
use seekr::search::{Matcher, MatcherOptions};
use seekr::walker::{WalkOptions, Walker};
use std::fs;
use std::hint::black_box;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

fn corpus(lines: usize) -> Vec<u8> {
    let mut text = String::with_capacity(lines * 48);
    for i in 0..lines {
        if i % 97 == 0 {
            text.push_str("fn handle_request(ctx: &Context) -> Result<()> {\n");
        } else {
            text.push_str("    let value = compute(index, offset) + 42;\n");
        }
    }
    text.into_bytes()
}

fn matcher_benchmark(c: &mut Criterion) {
    let bytes = corpus(20_000);
    let path: Arc<Path> = Arc::from(Path::new("bench.rs"));
    let mut group = c.benchmark_group("scan");
    group.throughput(Throughput::Bytes(bytes.len() as u64));

    let cases = [
        ("literal", vec!["handle_request".to_string()], true),
        ("regex", vec![r"fn \w+_request".to_string()], false),
        ("alternation", vec!["Context".to_string(), "offset".to_string()], true),
    ];
    for (name, patterns, fixed) in cases {
        let matcher = Matcher::new(
            &patterns,
            &MatcherOptions {
                fixed_strings: fixed,
                ..Default::default()
            },
        )
        .expect("valid pattern");
        for collect in [false, true] {
            let options = ScanOptions {
                collect,
                ..Default::default()
            };
            let id = BenchmarkId::new(name, if collect { "records" } else { "count" });
            group.bench_function(id, |b| {
                b.iter(|| search_bytes(Arc::clone(&path), black_box(&bytes), &matcher, &options))
            });
        }
    }
    group.finish();
}

fn walk_benchmark(c: &mut Criterion) {
    let dir = TempDir::new().expect("Failed to create temp dir");
    for d in 0..10 {
        let sub = dir.path().join(format!("dir{d}"));
        fs::create_dir_all(&sub).expect("Failed to create dir");
        fs::write(sub.join(".gitignore"), "*.log\n").expect("Failed to write ignore file");
        for f in 0..50 {
            let ext = if f % 5 == 0 { "log" } else { "txt" };
            fs::write(sub.join(format!("file{f}.{ext}")), "content\n").expect("Failed to write file");
        }
    }

    c.bench_function("walk_500_files", |b| {
        b.iter(|| {
            let walker = Walker::new(vec![dir.path().to_path_buf()], WalkOptions::default());
            black_box(walker.count())
        })
    });
}

criterion_group!(benches, matcher_benchmark, walk_benchmark);
criterion_main!(benches);
