//! Numeric library
//!
//! Pure functions behind the `/bfhl` operations. Callers validate input
//! ranges before calling in, so nothing here signals errors.

mod divisors;
mod fibonacci;
mod prime;

pub use divisors::{gcd, hcf, lcm, lcm_list};
pub use fibonacci::fibonacci;
pub use prime::{is_prime, primes_from_list};
