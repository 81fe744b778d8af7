use criterion::{criterion_group, criterion_main, Criterion};
use jobrank_core::tokenizer::tokenize;

const TEXT: &str = "Develop and maintain web applications using Python, React and PostgreSQL. \
    Collaborate with data scientists to ship machine learning models into production services. \
    Experience with cloud infrastructure, containers and continuous delivery is a plus.";

fn bench_tokenize(c: &mut Criterion) {
    c.bench_function("tokenize_description", |b| b.iter(|| tokenize(TEXT)));
}

criterion_group!(benches, bench_tokenize);
criterion_main!(benches);
