//! Pipeline Benchmarks
//!
//! Measures the per-item helpers on the ingest and enrichment paths.
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use tokio::runtime::Runtime;

use news_relay::fingerprint::url_fingerprint;
use news_relay::schemas::{CrawledContent, Enrichment};
use news_relay::slug::slugify;
use news_relay::storage::ItemStore;
use news_relay::text::truncate_chars;

/// Benchmark URL fingerprinting over a feed-sized batch
fn bench_fingerprint(c: &mut Criterion) {
    let urls: Vec<String> = (0..1_000)
        .map(|i| format!("https://www.example.cat/esports/futbol/noticia-{}.html?utm_source=feed", i))
        .collect();

    let mut group = c.benchmark_group("fingerprint");
    group.throughput(Throughput::Elements(urls.len() as u64));
    group.bench_function("url_fingerprint_1000", |b| {
        b.iter(|| {
            for url in &urls {
                black_box(url_fingerprint(black_box(url)));
            }
        })
    });
    group.finish();
}

/// Benchmark slug normalization on short and long titles
fn bench_slugify(c: &mut Criterion) {
    let short = "قهرمانی بارسلونا در لیگ";
    let long = "گزارش کامل: بارسلونا — پس از ۹۰ دقیقه بازی نفس‌گیر — قهرمان لالیگا شد! ".repeat(8);

    let mut group = c.benchmark_group("slugify");
    group.bench_function("short_title", |b| b.iter(|| black_box(slugify(black_box(short)))));
    group.bench_function("long_title", |b| b.iter(|| black_box(slugify(black_box(&long)))));
    group.finish();
}

/// Benchmark body truncation at the default content limit
fn bench_truncate(c: &mut Criterion) {
    let body = "<p>بارسلونا در روز یکشنبه قهرمان شد.</p> ".repeat(400);

    c.bench_function("truncate_chars_3000", |b| {
        b.iter(|| black_box(truncate_chars(black_box(&body), 3000)))
    });
}

/// Benchmark ingest-side inserts and the enrichment selection query
fn bench_store(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();

    let mut group = c.benchmark_group("store");
    group.throughput(Throughput::Elements(100));
    group.bench_function("insert_discovered_100", |b| {
        b.iter(|| {
            rt.block_on(async {
                let store = ItemStore::in_memory().await.unwrap();
                for i in 0..100 {
                    let url = format!("https://x/{}", i);
                    black_box(store.insert_discovered(&url_fingerprint(&url), &url).await.unwrap());
                }
            })
        })
    });
    group.finish();

    let store = rt.block_on(async {
        let store = ItemStore::in_memory().await.unwrap();
        for i in 0..500 {
            let url = format!("https://x/{}", i);
            store.insert_discovered(&url_fingerprint(&url), &url).await.unwrap();
            let id = i64::from(i) + 1;
            store
                .mark_crawled(
                    id,
                    &CrawledContent {
                        title_en: "Title".to_string(),
                        content_en: "Body".to_string(),
                        photo_url: None,
                    },
                )
                .await
                .unwrap();
            if i % 2 == 0 {
                store
                    .finalize_enrichment(
                        id,
                        &Enrichment {
                            title_fa: "عنوان".to_string(),
                            content_fa: "متن".to_string(),
                            seo_title: "تیتر".to_string(),
                            seo_description: "توضیح".to_string(),
                            seo_keywords: "الف, ب".to_string(),
                            summary: "خلاصه".to_string(),
                            slug_url: "تیتر".to_string(),
                        },
                    )
                    .await
                    .unwrap();
            }
        }
        store
    });

    c.bench_function("select_for_enrichment", |b| {
        b.iter(|| rt.block_on(async { black_box(store.select_for_enrichment(None).await.unwrap()) }))
    });
}

criterion_group!(benches, bench_fingerprint, bench_slugify, bench_truncate, bench_store);
criterion_main!(benches);
