//! GCD/HCF and LCM aggregation
//!
//! `hcf` never exceeds the largest input magnitude, so it stays in `u64`.
//! LCMs grow multiplicatively and are carried as `BigInt`.

use num_bigint::{BigInt, BigUint};

/// Greatest common divisor of `|a|` and `|b|`; `gcd(a, 0) == |a|`
pub const fn gcd(a: i64, b: i64) -> u64 {
    gcd_u64(a.unsigned_abs(), b.unsigned_abs())
}

const fn gcd_u64(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        let t = a % b;
        a = b;
        b = t;
    }
    a
}

fn gcd_big(a: &BigUint, b: &BigUint) -> BigUint {
    let mut a = a.clone();
    let mut b = b.clone();
    while b != BigUint::ZERO {
        let t = &a % &b;
        a = b;
        b = t;
    }
    a
}

/// Left fold of `gcd` over `values`
///
/// An empty slice yields 0.
pub fn hcf(values: &[i64]) -> u64 {
    values
        .iter()
        .skip(1)
        .fold(values.first().map_or(0, |v| v.unsigned_abs()), |acc, &v| {
            gcd_u64(acc, v.unsigned_abs())
        })
}

/// Least common multiple `|a / gcd(a, b) * b|`, or 0 if either operand is 0
pub fn lcm(a: i64, b: i64) -> BigInt {
    if a == 0 || b == 0 {
        return BigInt::ZERO;
    }
    BigInt::from(a.unsigned_abs() / gcd(a, b)) * BigInt::from(b.unsigned_abs())
}

fn lcm_big(a: &BigInt, b: &BigInt) -> BigInt {
    if *a == BigInt::ZERO || *b == BigInt::ZERO {
        return BigInt::ZERO;
    }
    let (a, b) = (a.magnitude(), b.magnitude());
    BigInt::from(a / gcd_big(a, b) * b)
}

/// Left fold of pairwise `lcm` over `values`
///
/// The first element seeds the fold as-is, so a single negative input comes
/// back negative. An empty slice yields 0.
pub fn lcm_list(values: &[i64]) -> BigInt {
    let Some((&first, rest)) = values.split_first() else {
        return BigInt::ZERO;
    };
    rest.iter()
        .fold(BigInt::from(first), |acc, &v| lcm_big(&acc, &BigInt::from(v)))
}
