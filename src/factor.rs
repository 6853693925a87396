// Trial division for the small factors of a group cofactor. Only divisors
// below 2^16 are worth finding: each one later costs an O(r) brute-force
// search against the victim's oracle.

use num_bigint::BigUint;
use num_traits::Zero;

use crate::errors::{AttackError, Result};

const FACTOR_SEARCH_BOUND: u64 = 1 << 16;

/// Returns the divisors of `cofactor` found below 2^16, smallest first. Each
/// divisor is recorded once and divided out completely, so the results are
/// coprime to each other. A returned value is not guaranteed prime: if the
/// remaining cofactor has no sub-factor below the bound, whatever trial
/// division stopped on is reported as-is, and callers only ever verify that
/// a sampled element satisfies `h^r == 1`, not that `r` is minimal.
pub fn find_small_factors(cofactor: &BigUint) -> Result<Vec<BigUint>> {
    if cofactor.is_zero() {
        return Err(AttackError::NoSmallFactorsFound {
            cofactor: cofactor.clone(),
        });
    }

    let mut factors = Vec::new();
    let mut remaining = cofactor.clone();
    for divisor in 2..FACTOR_SEARCH_BOUND {
        if (&remaining % divisor).is_zero() {
            factors.push(BigUint::from(divisor));
            while (&remaining % divisor).is_zero() {
                remaining /= divisor;
            }
        }
        // Nothing below the bound can divide a smaller remainder.
        if BigUint::from(divisor) >= remaining {
            break;
        }
    }

    if factors.is_empty() {
        return Err(AttackError::NoSmallFactorsFound {
            cofactor: cofactor.clone(),
        });
    }
    Ok(factors)
}
