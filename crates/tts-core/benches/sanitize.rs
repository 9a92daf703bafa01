use criterion::{black_box, criterion_group, criterion_main, Criterion};

use tts_core::{default_token_set, sanitize, sanitize_with};

const URLS: &[&str] = &[
    "https://example.com/",
    "https://example.com/page?id=5&sort=asc#top",
    "https://example.com/page?utm_source=newsletter&utm_medium=email&utm_campaign=launch&id=5",
    "https://shop.example.com/p/123?gclid=Cj0KCQjw&srsltid=AfmBOop&variant=red&size=m",
    "https://news.example.com/a?fbclid=IwAR3x&__tn__=R&mc_cid=abc&mc_eid=def",
];

fn bench_sanitize(c: &mut Criterion) {
    let tokens = default_token_set();

    c.bench_function("sanitize_mixed", |b| {
        b.iter(|| {
            for url in URLS {
                black_box(sanitize(black_box(url)));
            }
        })
    });

    c.bench_function("sanitize_clean_url", |b| {
        b.iter(|| sanitize_with(black_box("https://example.com/page?id=5&sort=asc"), tokens))
    });
}

criterion_group!(benches, bench_sanitize);
criterion_main!(benches);
