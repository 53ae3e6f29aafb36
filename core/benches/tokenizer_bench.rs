use criterion::{criterion_group, criterion_main, Criterion};
use zonedex_core::partial::PartialIndex;
use zonedex_core::{Tokenizer, Zones};

const PAGE: &str = "<html><head><title>Master of Software Engineering</title></head><body>\
    <h1>Graduate Programs</h1><p>The <b>MSWE</b> program covers software architecture, \
    machine learning systems, distributed computing and <strong>ACM</strong> style research \
    seminars. Students running projects with faculty learn testing, requirements and design.</p>\
    <script>var tracking = true;</script></body></html>";

fn bench_tokenize(c: &mut Criterion) {
    let text = Zones::extract(PAGE).body;
    let stemming = Tokenizer::new(true);
    let plain = Tokenizer::new(false);
    c.bench_function("tokenize_stemmed", |b| b.iter(|| stemming.tokenize(&text)));
    c.bench_function("tokenize_plain", |b| b.iter(|| plain.tokenize(&text)));
}

fn bench_partial(c: &mut Criterion) {
    let zones = Zones::extract(PAGE);
    let tok = Tokenizer::default();
    c.bench_function("partial_index_100_docs", |b| {
        b.iter(|| {
            let mut idx = PartialIndex::new();
            for doc_id in 0..100 {
                idx.add_document(doc_id, &zones, &tok);
            }
            idx.into_sorted_records()
        })
    });
}

criterion_group!(benches, bench_tokenize, bench_partial);
criterion_main!(benches);
