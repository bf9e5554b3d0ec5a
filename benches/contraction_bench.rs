//! Performance benchmarks: baseline recursion vs parallel contraction

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rakefold::tree::shapes::{self, OpMix};
use rakefold::{ContractionConfig, Contractor};

fn benchmark_baseline(c: &mut Criterion) {
    c.bench_function("baseline_perfect_d10", |b| {
        let tree = shapes::perfect(10, OpMix::Mixed, 42).expect("tree builds");
        b.iter(|| black_box(tree.compute().expect("evaluates")));
    });
}

fn benchmark_contraction(c: &mut Criterion) {
    for workers in [1, 4] {
        c.bench_function(&format!("contract_perfect_d10_w{workers}"), |b| {
            let contractor = Contractor::new(ContractionConfig::with_workers(workers));
            b.iter(|| {
                let tree = shapes::perfect(10, OpMix::Mixed, 42).expect("tree builds");
                black_box(contractor.run(tree).expect("contracts"))
            });
        });
    }
}

criterion_group!(benches, benchmark_baseline, benchmark_contraction);
criterion_main!(benches);
