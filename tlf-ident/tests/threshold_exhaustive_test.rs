// SPDX-License-Identifier: Apache-2.0

//! Cross-checks identification against brute force over small weights and
//! checks every positive answer on random larger tables.

use std::collections::HashSet;

use pretty_assertions::assert_eq;
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;
use test_case::test_case;
use tlf_ident::lp::simplex::{SimplexConfig, SimplexOracle};
use tlf_ident::{identify, is_threshold, Identification, IdentifyOptions, Rejection, TruthTable};

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Every function over `num_vars` variables realizable with weights in
/// `[-max_weight, max_weight]`, as its packed table.
fn brute_force_threshold_functions(num_vars: usize, max_weight: i64) -> HashSet<u64> {
    let span = (2 * max_weight + 1) as usize;
    let bound = num_vars as i64 * max_weight;
    let mut found = HashSet::new();
    let mut weights = vec![0i64; num_vars];
    for code in 0..span.pow(num_vars as u32) {
        let mut rest = code;
        for w in weights.iter_mut() {
            *w = (rest % span) as i64 - max_weight;
            rest /= span;
        }
        let sums: Vec<i64> = (0..1usize << num_vars)
            .map(|a| {
                (0..num_vars)
                    .filter(|j| (a >> j) & 1 == 1)
                    .map(|j| weights[j])
                    .sum()
            })
            .collect();
        for t in -bound..=bound + 1 {
            let packed = sums
                .iter()
                .enumerate()
                .filter(|&(_, &s)| s >= t)
                .fold(0u64, |acc, (i, _)| acc | (1 << i));
            found.insert(packed);
        }
    }
    found
}

#[test_case(0, 2; "zero vars")]
#[test_case(1, 4; "one var")]
#[test_case(2, 14; "two vars")]
#[test_case(3, 104; "three vars")]
#[test_case(4, 1882; "four vars")]
fn test_exhaustive_matches_brute_force(num_vars: usize, expected_count: usize) {
    init_logger();
    let reference = brute_force_threshold_functions(num_vars, 3);
    assert_eq!(reference.len(), expected_count);

    let mut positives = 0;
    for packed in 0..1u64 << (1 << num_vars) {
        let tt = TruthTable::from_words(num_vars, vec![packed]).expect("valid table");
        let mut form = Vec::new();
        let answer = is_threshold(&tt, Some(&mut form)).expect("identify");
        assert_eq!(
            answer,
            reference.contains(&packed),
            "disagreement on {} over {} variables",
            tt,
            num_vars
        );
        if answer {
            positives += 1;
            assert_eq!(form.len(), num_vars + 1);
            let weights = &form[..num_vars];
            let threshold = form[num_vars];
            for a in 0..1usize << num_vars {
                let sum: i64 = (0..num_vars)
                    .filter(|j| (a >> j) & 1 == 1)
                    .map(|j| weights[j])
                    .sum();
                assert_eq!(sum >= threshold, tt.get_bit(a));
            }
        } else {
            assert!(form.is_empty());
        }
    }
    assert_eq!(positives, expected_count);
}

#[test_case(5; "five vars")]
#[test_case(6; "six vars")]
fn test_random_positives_are_sound(num_vars: usize) {
    init_logger();
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(0x7165_u64 + num_vars as u64);
    let config = SimplexConfig::default();
    let options = IdentifyOptions {
        check_linear_form: false,
    };
    for _ in 0..20 {
        // Random linear forms give threshold functions, so most draws
        // exercise the LP rather than stopping at the normalizer.
        let weights: Vec<i64> = (0..num_vars).map(|_| rng.gen_range(-6..=6)).collect();
        let threshold = rng.gen_range(-10..=10);
        let tt = TruthTable::from_fn(num_vars, |a| {
            let sum: i64 = (0..num_vars)
                .filter(|j| (a >> j) & 1 == 1)
                .map(|j| weights[j])
                .sum();
            sum >= threshold
        });
        match identify::<SimplexOracle, _>(&tt, &config, &options).expect("identify") {
            Identification::Threshold(form) => assert!(
                form.realizes(&tt),
                "{} does not realize {}",
                form,
                tt
            ),
            other => panic!(
                "{} from [{:?}; {}] not identified: {:?}",
                tt, weights, threshold, other
            ),
        }
    }
}

#[test]
fn test_random_unstructured_tables_are_rejected_or_sound() {
    init_logger();
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(2024);
    for _ in 0..50 {
        let tt = TruthTable::from_words(6, vec![rng.gen::<u64>()]).expect("valid table");
        let mut form = Vec::new();
        if is_threshold(&tt, Some(&mut form)).expect("identify") {
            let form = tlf_ident::LinearForm::from_vec(form).expect("non-empty");
            assert!(form.realizes(&tt));
        }
    }
}

#[test]
fn test_known_negatives() {
    init_logger();
    let x = |n, j| TruthTable::nth_var(n, j);
    let xor2 = x(2, 0) ^ x(2, 1);
    let parity3 = x(3, 0) ^ x(3, 1) ^ x(3, 2);
    let mux = (x(3, 0) & x(3, 1)) | (!x(3, 0) & x(3, 2));
    for tt in [&xor2, &parity3, &mux] {
        let mut form = vec![-1];
        assert_eq!(is_threshold(tt, Some(&mut form)), Ok(false));
        assert_eq!(form, vec![-1]);
    }
    let result = identify::<SimplexOracle, _>(
        &mux,
        &SimplexConfig::default(),
        &IdentifyOptions::default(),
    )
    .expect("identify");
    assert_eq!(result, Identification::NotThreshold(Rejection::Binate { var: 0 }));
}

#[test_case(2; "or2")]
#[test_case(4; "or4")]
#[test_case(6; "or6")]
fn test_or_of_n(num_vars: usize) {
    let or = (0..num_vars).fold(TruthTable::constant(num_vars, false), |acc, j| {
        acc | TruthTable::nth_var(num_vars, j)
    });
    let mut form = Vec::new();
    assert_eq!(is_threshold(&or, Some(&mut form)), Ok(true));
    let mut expected = vec![1i64; num_vars];
    expected.push(1);
    assert_eq!(form, expected);
}

#[test]
fn test_repeated_calls_agree() {
    let tt = TruthTable::from_hex_str(4, "fee8").expect("parse");
    let mut first = Vec::new();
    let mut second = Vec::new();
    assert_eq!(is_threshold(&tt, Some(&mut first)), Ok(true));
    assert_eq!(is_threshold(&tt, Some(&mut second)), Ok(true));
    assert_eq!(first, second);

    let xor = TruthTable::from_hex_str(2, "6").expect("parse");
    assert_eq!(is_threshold(&xor, None), Ok(false));
    assert_eq!(is_threshold(&xor, None), Ok(false));
}
