/*
 * SPDX-FileCopyrightText: 2026 Inria
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use logrank::math::{LOG_ZERO, log_sum};

const SAMPLES: &[f64] = &[
    0.0,
    -0.5,
    -1.0,
    -10.0,
    -100.0,
    -700.0,
    -1E4,
    2.0_f64,
    500.0,
];

#[test]
fn test_identity() {
    for &x in SAMPLES {
        assert_eq!(log_sum(x, LOG_ZERO), x);
        assert_eq!(log_sum(LOG_ZERO, x), x);
    }
    assert_eq!(log_sum(LOG_ZERO, LOG_ZERO), LOG_ZERO);
}

#[test]
fn test_commutative() {
    for &a in SAMPLES {
        for &b in SAMPLES {
            assert_eq!(log_sum(a, b), log_sum(b, a), "a={a} b={b}");
        }
    }
}

#[test]
fn test_associative_within_tolerance() {
    for &a in SAMPLES {
        for &b in SAMPLES {
            for &c in SAMPLES {
                let left = log_sum(log_sum(a, b), c);
                let right = log_sum(a, log_sum(b, c));
                assert!(
                    (left - right).abs() <= 1E-12 * left.abs().max(1.0),
                    "a={a} b={b} c={c}: {left} != {right}"
                );
            }
        }
    }
}

#[test]
fn test_agrees_with_direct_sum() {
    for &p in &[1.0f64, 0.5, 0.125, 1E-9] {
        for &q in &[1.0f64, 0.25, 1E-3, 1E-12] {
            let s = log_sum(p.ln(), q.ln()).exp();
            assert!(
                ((s - (p + q)) / (p + q)).abs() < 1E-14,
                "p={p} q={q}: {s}"
            );
        }
    }
}

#[test]
fn test_no_overflow_or_underflow() {
    // exp of either operand would overflow or underflow an f64
    let s = log_sum(800.0, 800.0);
    assert!((s - (800.0 + 2.0_f64.ln())).abs() < 1E-12);
    let s = log_sum(-800.0, -800.0);
    assert!((s - (-800.0 + 2.0_f64.ln())).abs() < 1E-12);
    // A huge gap between the operands must return the larger one
    assert_eq!(log_sum(0.0, -1E6), 0.0);
}
