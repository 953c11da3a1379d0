//! Primality by trial division

/// Whether `x` is prime
///
/// Evens are excluded up front, then odd candidates up to `sqrt(x)` are tried.
pub const fn is_prime(x: i64) -> bool {
    if x < 2 {
        return false;
    }
    if x == 2 || x == 3 {
        return true;
    }
    if x % 2 == 0 {
        return false;
    }

    // i <= x / i is i * i <= x without the overflow near i64::MAX
    let mut i = 3;
    while i <= x / i {
        if x % i == 0 {
            return false;
        }
        i += 2;
    }
    true
}

/// Keep only the primes of `values`, preserving their order
pub fn primes_from_list(values: &[i64]) -> Vec<i64> {
    values.iter().copied().filter(|&v| is_prime(v)).collect()
}
