use criterion::{black_box, criterion_group, criterion_main, Criterion};
use pdf_shelf::client::{BibRecord, MetadataSource};
use pdf_shelf::rename::filename::{render, sanitize};

fn bench_sanitize(c: &mut Criterion) {
    let short = "Shannon - A Mathematical Theory of Communication (1948)";
    let messy = "  Ünïcode <title>  with/illegal\\chars  and   runs of   whitespace  ".repeat(4);
    let long = "word ".repeat(100);

    let mut group = c.benchmark_group("sanitize");
    group.bench_function("clean_short", |b| b.iter(|| sanitize(black_box(short))));
    group.bench_function("messy_unicode", |b| b.iter(|| sanitize(black_box(&messy))));
    group.bench_function("truncated_long", |b| b.iter(|| sanitize(black_box(&long))));
    group.finish();
}

fn bench_render(c: &mut Criterion) {
    let record = BibRecord {
        title: "Attention Is All You Need".to_string(),
        authors: vec![
            "Vaswani, Ashish".to_string(),
            "Shazeer, Noam".to_string(),
            "Parmar, Niki".to_string(),
        ],
        year: "2017".to_string(),
        journal: "NeurIPS".to_string(),
        ..BibRecord::new(MetadataSource::Crossref, 1.0)
    };

    c.bench_function("render_journal_template", |b| {
        b.iter(|| {
            render(
                black_box(&record),
                black_box("{author} - {title} - {journal} ({year})"),
            )
        })
    });
}

criterion_group!(benches, bench_sanitize, bench_render);
criterion_main!(benches);
