// SPDX-License-Identifier: Apache-2.0

//! Benchmarks identification of a few well-known threshold and
//! non-threshold functions.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use tlf_ident::normalize::normalize;
use tlf_ident::{is_threshold, TruthTable};

fn majority(num_vars: usize) -> TruthTable {
    TruthTable::from_fn(num_vars, |a| 2 * a.count_ones() as usize > num_vars)
}

fn identify_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("identify");

    for num_vars in [3, 5] {
        let maj = majority(num_vars);
        group.bench_function(format!("majority_{}", num_vars), |b| {
            b.iter(|| is_threshold(black_box(&maj), None).unwrap())
        });
    }

    // Weighted form [4, 2, 1, 1, 1; 5] over five inputs.
    let weights = [4, 2, 1, 1, 1];
    let weighted = TruthTable::from_fn(5, |a| {
        (0..5).filter(|j| (a >> j) & 1 == 1).map(|j| weights[j]).sum::<i64>() >= 5
    });
    group.bench_function("weighted_5", |b| {
        b.iter(|| is_threshold(black_box(&weighted), None).unwrap())
    });

    // Binate functions stop in the normalizer.
    let parity = TruthTable::from_fn(12, |a| a.count_ones() % 2 == 1);
    group.bench_function("parity_12_normalize", |b| {
        b.iter(|| normalize(black_box(&parity)))
    });

    group.finish();
}

criterion_group!(benches, identify_benchmark);
criterion_main!(benches);
