use criterion::{black_box, criterion_group, criterion_main, Criterion};
use remold::Transformer;

pub fn transform_benchmark(c: &mut Criterion) {
    let transformer =
        Transformer::new(include_str!("spec.json")).expect("parsed transform spec");
    let input = include_str!("input.json");

    c.bench_function("shift and default ops", |b| {
        b.iter(|| transformer.transform_str(black_box(input)))
    });
}

pub fn wildcard_benchmark(c: &mut Criterion) {
    let transformer = Transformer::new(
        r#"[{"operation": "shift", "spec": {"texts": "documents[*].norm.text"}}]"#,
    )
    .expect("parsed transform spec");

    let docs: Vec<String> = (0..100)
        .map(|i| format!(r#"{{"norm": {{"text": "String {i}"}}}}"#))
        .collect();
    let input = format!(r#"{{"documents":[{}]}}"#, docs.join(","));

    c.bench_function("wildcard fan-out", |b| {
        b.iter(|| transformer.transform_str(black_box(&input)))
    });
}

criterion_group!(benches, transform_benchmark, wildcard_benchmark);
criterion_main!(benches);
