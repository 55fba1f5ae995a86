//! Benchmarks for the parse/compile/run pipeline.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use fernlang::bytecode::{Compiler, VM};
use fernlang::lexer::Scanner;
use fernlang::parser::Parser;

const ARITHMETIC: &str = "\
let a = 1 + 2 * 3 - 4 / 2;
let b = (a + 10) * (a - 1);
let c = -b + a * a;
if (c > b) { c } else { b }
";

const COMPOSITES: &str = "\
let xs = [1, 2, 3, 4, 5, 6, 7, 8, 9, 10];
let table = {\"one\": 1, \"two\": 2, \"three\": 3};
xs[3] + xs[7] + table[\"two\"]
";

const CALLS: &str = "\
let one = fn() { let x = 1; x };
let two = fn() { one() + one() };
let four = fn() { two() + two() };
let eight = fn() { four() + four() };
eight() + eight()
";

fn parse(source: &str) -> fernlang::ast::Program {
    let tokens = Scanner::new(source).scan_tokens();
    Parser::new(tokens).parse().expect("parser errors")
}

fn run(source: &str) {
    let program = parse(source);
    let mut compiler = Compiler::new();
    compiler.compile(&program).expect("compile error");
    let mut vm = VM::new(compiler.bytecode());
    vm.run().expect("vm error");
}

fn parse_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse");
    group.bench_function("arithmetic", |b| b.iter(|| parse(black_box(ARITHMETIC))));
    group.bench_function("composites", |b| b.iter(|| parse(black_box(COMPOSITES))));
    group.bench_function("calls", |b| b.iter(|| parse(black_box(CALLS))));
    group.finish();
}

fn compile_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("compile");

    for (name, source) in [
        ("arithmetic", ARITHMETIC),
        ("composites", COMPOSITES),
        ("calls", CALLS),
    ] {
        let program = parse(source);
        group.bench_function(name, |b| {
            b.iter(|| {
                let mut compiler = Compiler::new();
                compiler.compile(black_box(&program)).expect("compile error");
                compiler.bytecode()
            })
        });
    }

    group.finish();
}

fn run_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("run");
    group.bench_function("arithmetic", |b| b.iter(|| run(black_box(ARITHMETIC))));
    group.bench_function("composites", |b| b.iter(|| run(black_box(COMPOSITES))));
    group.bench_function("calls", |b| b.iter(|| run(black_box(CALLS))));
    group.finish();
}

criterion_group!(benches, parse_benchmark, compile_benchmark, run_benchmark);
criterion_main!(benches);
