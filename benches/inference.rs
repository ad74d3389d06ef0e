//! Benchmarks for inference and validation over the bundled snapshot.

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use shapegraph::config::Vocabulary;
use shapegraph::federation::BUNDLED_SNAPSHOT;
use shapegraph::graph::GraphStore;
use shapegraph::graph::io::RdfSyntax;
use shapegraph::ontology::Ontology;
use shapegraph::rules::RuleEngine;
use shapegraph::validate::ShapeValidator;

const REQUEST: &str = r#"
    @prefix : <http://example.org/ontology/> .
    @prefix ex: <http://example.com/> .
    _:s a :Acquisition ; :lemma "acquire" ; :acquirer ex:Google ; :acquisition ex:YouTube .
    _:e a :Employment ; :employer ex:Google ; :employee ex:Alice .
"#;

fn bundled() -> Ontology {
    let graph = GraphStore::parse(BUNDLED_SNAPSHOT, RdfSyntax::Turtle, None).unwrap();
    Ontology::new(graph, Vocabulary::default())
}

fn bench_parse_snapshot(c: &mut Criterion) {
    c.bench_function("parse_bundled_snapshot", |bench| {
        bench.iter(|| black_box(GraphStore::parse(BUNDLED_SNAPSHOT, RdfSyntax::Turtle, None).unwrap()))
    });
}

fn bench_infer(c: &mut Criterion) {
    let ontology = bundled();
    let data = GraphStore::parse(REQUEST, RdfSyntax::Turtle, None).unwrap();
    let engine = RuleEngine::new(&ontology);

    c.bench_function("infer_two_situations", |bench| {
        bench.iter(|| black_box(engine.infer(&data).unwrap()))
    });
}

fn bench_validate(c: &mut Criterion) {
    let ontology = bundled();
    let data = GraphStore::parse(REQUEST, RdfSyntax::Turtle, None).unwrap();
    let validator = ShapeValidator::new(&ontology);

    c.bench_function("validate_two_situations", |bench| {
        bench.iter(|| black_box(validator.validate(&data).unwrap()))
    });
}

criterion_group!(benches, bench_parse_snapshot, bench_infer, bench_validate);
criterion_main!(benches);
