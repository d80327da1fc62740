//! Shape compiler throughput.
//!
//! Measures `define_function` on synthetic shape bodies:
//! 1. A deep chain of pure subexpressions repeated many times (CSE hits)
//! 2. A long chain of impure arithmetic on the parameter
//! 3. A counted loop with a vector accumulator

use std::rc::Rc;

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use subcurv::function::Closure;
use subcurv::op::{BinaryOp, Op, OpKind, OpRef, Pattern};
use subcurv::{Module, ScCompiler, Target, Ty, Value};

fn closure(nslots: usize, body: OpRef, module: Module) -> Value {
    Value::function(Closure::new("f", Pattern::Slot(0), body, Rc::new(module), nslots))
}

/// `x + (k*k + k*k) + (k*k + k*k) + ...` with `n` repetitions of the pure term.
fn repeated_pure(n: usize) -> Value {
    let mut module = Module::new();
    module.define("k", Value::Num(2.0));
    let square = || Op::binary(BinaryOp::Mul, Op::nonlocal(0), Op::nonlocal(0));
    let mut body = Op::local(0);
    for _ in 0..n {
        let term = Op::binary(BinaryOp::Add, square(), square());
        body = Op::binary(BinaryOp::Add, body, term);
    }
    closure(1, body, module)
}

/// `((x*x + 1)*x + 2)*x + ...`, all impure.
fn impure_chain(n: usize) -> Value {
    let mut body = Op::local(0);
    for i in 0..n {
        body = Op::binary(
            BinaryOp::Add,
            Op::binary(BinaryOp::Mul, body, Op::local(0)),
            Op::num(i as f64),
        );
    }
    closure(1, body, Module::new())
}

/// `var acc := x; for (i in 1..n) acc := acc * 0.5 + x; acc`
fn counted_loop(n: usize) -> Value {
    let range = Op::new(OpKind::Range {
        first: Op::num(1.0),
        last: Op::num(n as f64),
        step: None,
        half_open: false,
    });
    let update = Op::assign(
        subcurv::op::Locative::Local(1),
        Op::binary(
            BinaryOp::Add,
            Op::binary(BinaryOp::Mul, Op::local(1), Op::num(0.5)),
            Op::local(0),
        ),
    );
    let body = Op::block(
        vec![
            Op::define(Pattern::Slot(1), Op::local(0)),
            Op::new(OpKind::For {
                pattern: Pattern::Slot(2),
                list: range,
                cond: None,
                body: update,
            }),
        ],
        Op::local(1),
    );
    closure(3, body, Module::new())
}

fn compile(target: Target, params: &[Ty], result: &Ty, f: &Value) -> String {
    let mut sc = ScCompiler::new(target);
    match sc.define_function("f", params, result, f) {
        Ok(()) => sc.into_output(),
        Err(e) => panic!("benchmark shape failed to compile: {}", e),
    }
}

fn bench_repeated_pure(c: &mut Criterion) {
    let f10 = repeated_pure(10);
    let f100 = repeated_pure(100);

    let mut group = c.benchmark_group("repeated_pure");
    group.bench_function("10_terms", |b| {
        b.iter(|| compile(Target::Glsl, &[Ty::Num], &Ty::Num, black_box(&f10)))
    });
    group.bench_function("100_terms", |b| {
        b.iter(|| compile(Target::Glsl, &[Ty::Num], &Ty::Num, black_box(&f100)))
    });
    group.finish();
}

fn bench_impure_chain(c: &mut Criterion) {
    let f = impure_chain(200);
    let vec = Ty::num_vec(4);
    let mut group = c.benchmark_group("impure_chain");
    group.bench_function("200_ops_glsl", |b| {
        b.iter(|| compile(Target::Glsl, &[vec.clone()], &vec, black_box(&f)))
    });
    group.bench_function("200_ops_opencl", |b| {
        b.iter(|| compile(Target::OpenCl, &[vec.clone()], &vec, black_box(&f)))
    });
    group.finish();
}

fn bench_counted_loop(c: &mut Criterion) {
    let f = counted_loop(64);
    let vec = Ty::num_vec(3);
    c.bench_function("counted_loop", |b| {
        b.iter(|| compile(Target::Cpp, &[vec.clone()], &vec, black_box(&f)))
    });
}

criterion_group!(benches, bench_repeated_pure, bench_impure_chain, bench_counted_loop);
criterion_main!(benches);
