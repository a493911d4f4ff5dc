//! Benchmarks for page parsing.

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use merganser::page::HtmlPage;

fn synthetic_page(blocks: usize) -> String {
    let mut body = String::new();
    for i in 0..blocks {
        body.push_str(&format!(
            "<p>Section {i}</p>\
             <div class=\"highlight-mermaid notranslate\"><div class=\"highlight\">\
             <pre><span></span>graph TD; A{i}--&gt;B{i}</pre>\
             </div></div>"
        ));
    }
    format!("<!DOCTYPE html><html><head><title>Docs</title></head><body>{body}</body></html>")
}

fn bench_parse_small(c: &mut Criterion) {
    let html = synthetic_page(2);
    c.bench_function("parse_small", |b| {
        b.iter(|| HtmlPage::parse(black_box(&html)))
    });
}

fn bench_parse_large(c: &mut Criterion) {
    let html = synthetic_page(200);
    c.bench_function("parse_large", |b| {
        b.iter(|| HtmlPage::parse(black_box(&html)))
    });
}

fn bench_serialize(c: &mut Criterion) {
    let page = HtmlPage::parse(&synthetic_page(200));
    c.bench_function("serialize", |b| b.iter(|| black_box(&page).to_html()));
}

criterion_group!(benches, bench_parse_small, bench_parse_large, bench_serialize);
criterion_main!(benches);
