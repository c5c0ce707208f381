use criterion::{black_box, criterion_group, criterion_main, Criterion};

use quizkit_core::bank::QuestionBank;
use quizkit_core::parser::{format_options, parse_options};

fn bench_parse_options(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse_options");

    group.bench_function("plain", |b| {
        b.iter(|| parse_options(black_box("['London', 'Berlin', 'Paris', 'Madrid']")))
    });

    group.bench_function("escaped", |b| {
        b.iter(|| parse_options(black_box(r#"["It's", 'say \'hi\'', "a\\b", 'd']"#)))
    });

    group.finish();
}

fn bench_bank_roundtrip(c: &mut Criterion) {
    let bank = QuestionBank::default_set();
    let options: Vec<String> = bank.at(3).unwrap().options.clone();

    c.bench_function("format_options", |b| b.iter(|| format_options(black_box(&options))));

    c.bench_function("bank_from_raw", |b| {
        b.iter(|| QuestionBank::from_raw(black_box(bank.to_raw())))
    });
}

criterion_group!(benches, bench_parse_options, bench_bank_roundtrip);
criterion_main!(benches);
