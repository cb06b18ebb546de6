//! Criterion benchmarks for the reduction machine.
//!
//! Measures whole-program evaluation (recursion through the control stack,
//! thunk update) and raw primitive-operation dispatch.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::rc::Rc;
use stg_core::builder::*;
use stg_core::syntax::{AltType, Binding, Expr, Lit, PrimRep, Program, ResultType};
use stg_core::Atom;
use stg_rt::{Machine, PrimCall, PrimOpChain, StgState};

fn int_case(scrutinee: Rc<Expr>, binder: &str, rhs: Rc<Expr>) -> Rc<Expr> {
    let alts = vec![alt_default(rhs)];
    case(scrutinee, binder, AltType::Prim(PrimRep::Int), alts)
}

/// `sum n` over `Int#`, boxed by `main`.
fn sum_program(n: i64) -> Program {
    let sum: Binding = top(
        "sum",
        closure(
            &[],
            &["n"],
            case(
                op("==#", vec![var("n"), int(0)], PrimRep::Int),
                "c",
                AltType::Prim(PrimRep::Int),
                vec![
                    alt_lit(Lit::Int(1), lit_int(0)),
                    alt_default(int_case(
                        op("-#", vec![var("n"), int(1)], PrimRep::Int),
                        "m",
                        int_case(
                            app("sum", vec![var("m")]),
                            "r",
                            op("+#", vec![var("n"), var("r")], PrimRep::Int),
                        ),
                    )),
                ],
            ),
        ),
    );
    let ibox = data_con("I#", 0, 1);
    let boxed = con_app(&ibox, vec![var("r")]);
    let body = int_case(app("sum", vec![int(n)]), "r", boxed);
    let main = top("main", thunk(&[], body));
    Program {
        bindings: vec![sum, main],
        entry: id("main"),
    }
}

fn bench_recursion(c: &mut Criterion) {
    let mut group = c.benchmark_group("recursion");
    for n in [100i64, 1_000, 10_000] {
        let program = sum_program(n);
        group.throughput(Throughput::Elements(n as u64));
        group.bench_with_input(BenchmarkId::new("sum", n), &program, |b, program| {
            b.iter(|| {
                let mut machine = Machine::default();
                black_box(machine.run_program(program).unwrap());
            });
        });
    }
    group.finish();
}

fn bench_primop_dispatch(c: &mut Criterion) {
    let chain = PrimOpChain::standard();
    let result_type = ResultType::Single(PrimRep::Double);
    let args = [Atom::Double(1.5), Atom::Double(2.25)];
    c.bench_function("dispatch_plus_double", |b| {
        let mut state = StgState::new();
        b.iter(|| {
            let call = PrimCall {
                name: "+##",
                args: black_box(&args),
                result_type: &result_type,
                result_tycon: None,
            };
            black_box(chain.evaluate(&mut state, &call).unwrap());
        });
    });
}

criterion_group!(benches, bench_recursion, bench_primop_dispatch);
criterion_main!(benches);
