use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use std::hint::black_box;

use esolang::{
    brainfuck::Brainfuck,
    chess::Chess,
    shorto::ShortO,
    vm::{Engine, EngineOptions, EngineState, Language, Step},
};

fn run<L: Language>(language: L, source: &str) {
    let mut engine = Engine::new(language, EngineOptions::default().with_seed(0));
    engine.run(source);
    assert_eq!(engine.run_until_blocked(), Step::Done(EngineState::Completed));
    black_box(engine.output());
}

/// `depth` nested loops, each running `count` times around a single increment.
fn nested_loops(depth: usize, count: usize) -> String {
    let mut source = String::new();
    for _ in 0..depth {
        source.push_str(&"+".repeat(count));
        source.push_str("[>");
    }
    source.push('+');
    for _ in 0..depth {
        source.push_str("<-]");
    }
    source
}

fn criterion_benchmark(c: &mut Criterion) {
    let hello = include_str!("programs/hello.bf");
    let loops = nested_loops(3, 40);
    let countdown = include_str!("programs/countdown.sho");
    let chess = include_str!("programs/countdown.chess");

    let mut group = c.benchmark_group("full_program");
    group.bench_function(BenchmarkId::from_parameter("bf-hello"), |bencher| {
        bencher.iter(|| run(Brainfuck, black_box(hello)));
    });
    group.bench_function(BenchmarkId::from_parameter("bf-nested-loops"), |bencher| {
        bencher.iter(|| run(Brainfuck, black_box(&loops)));
    });
    group.bench_function(BenchmarkId::from_parameter("chess-countdown"), |bencher| {
        bencher.iter(|| run(Chess, black_box(chess)));
    });
    group.finish();

    let mut slow_group = c.benchmark_group("full_program_slow");
    slow_group.sample_size(10);
    slow_group.sampling_mode(criterion::SamplingMode::Flat);
    slow_group.bench_function(BenchmarkId::from_parameter("shorto-countdown"), |bencher| {
        bencher.iter(|| run(ShortO::default(), black_box(countdown)));
    });
    slow_group.finish();

    let shorto = ShortO::default();
    let source = "Line of text\\n $\"block\" 2 3 + , 1 2 ^;".repeat(2_000);
    let mut parse_group = c.benchmark_group("tokenize");
    parse_group.bench_function(BenchmarkId::from_parameter("shorto"), |bencher| {
        bencher.iter(|| black_box(shorto.tokenize(black_box(&source)).unwrap()));
    });
    parse_group.bench_function(BenchmarkId::from_parameter("brainfuck"), |bencher| {
        bencher.iter(|| black_box(Brainfuck.tokenize(black_box(&loops)).unwrap()));
    });
    parse_group.finish();
}

criterion_group!(
    name = benches;
    config = Criterion::default();
    targets = criterion_benchmark
);
criterion_main!(benches);
