//! Fibonacci sequence generation

use num_bigint::BigUint;

/// First `n` Fibonacci numbers, starting `0, 1, 1, 2, ...`
///
/// Terms are arbitrary precision: past F(93) they no longer fit a `u64`.
pub fn fibonacci(n: usize) -> Vec<BigUint> {
    let mut out = Vec::with_capacity(n);
    let mut current = BigUint::ZERO;
    let mut next = BigUint::from(1u8);

    for _ in 0..n {
        let following = &current + &next;
        out.push(std::mem::replace(&mut current, std::mem::replace(&mut next, following)));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn as_u64(seq: &[BigUint]) -> Vec<u64> {
        seq.iter()
            .map(|v| u64::try_from(v).expect("fits in u64"))
            .collect()
    }

    #[test]
    fn test_small_sequences() {
        assert!(fibonacci(0).is_empty());
        assert_eq!(as_u64(&fibonacci(1)), vec![0]);
        assert_eq!(as_u64(&fibonacci(2)), vec![0, 1]);
        assert_eq!(as_u64(&fibonacci(7)), vec![0, 1, 1, 2, 3, 5, 8]);
    }

    #[test]
    fn test_large_terms_are_exact() {
        let seq = fibonacci(101);
        assert_eq!(seq.len(), 101);
        assert_eq!(seq[100].to_string(), "354224848179261915075");
    }

    #[test]
    fn test_upper_bound_length() {
        let seq = fibonacci(2000);
        assert_eq!(seq.len(), 2000);
        assert_eq!(&seq[1998] + &seq[1997], seq[1999]);
    }
}
