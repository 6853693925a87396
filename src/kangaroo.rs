// Pollard's kangaroo (lambda) method: an interval-bounded discrete log.
//
// Two pseudo-random walks hop through the group taking jumps whose size is a
// deterministic function of the current point. The tame kangaroo starts at
// the known top of the interval, g^b, walks a fixed number of steps and digs
// a trap at its final position. The wild kangaroo starts at the target y and
// follows the same jump rule; if its path ever touches a point the tame one
// visited, it is funnelled along the identical deterministic route into the
// trap, and the difference of the two distances travelled reveals the
// exponent. Expected cost is O(sqrt(b - a)) group operations with constant
// memory.
//
// The jump sizing follows Pollard's analysis in https://arxiv.org/pdf/0812.0789
// and is heuristic: a run can fail (the wild kangaroo hops clean over the
// trap), but a returned value is always verified exactly before use.

use num_bigint::BigUint;
use num_traits::{ToPrimitive, Zero};

use crate::cancel::CancelToken;
use crate::errors::{AttackError, Result};

/// A walking point: `position` is the distance travelled in the exponent and
/// `element` the corresponding group element, so `element = start * g^position`
/// holds at every step.
struct Kangaroo {
    position: BigUint,
    element: BigUint,
}

impl Kangaroo {
    fn new(element: BigUint) -> Self {
        Self {
            position: Zero::zero(),
            element,
        }
    }

    fn hop(&mut self, g: &BigUint, p: &BigUint, k: &BigUint) {
        let jump = jump_distance(&self.element, k, p);
        self.element = &self.element * g.modpow(&jump, p) % p;
        self.position += jump;
    }
}

/// The jump rule `f(y) = 2^(y mod k)`: a deterministic pseudo-random jump
/// derived from the current group element.
fn jump_distance(element: &BigUint, k: &BigUint, p: &BigUint) -> BigUint {
    BigUint::from(2u64).modpow(&(element % k), p)
}

/// Number of distinct jump sizes, `k ~ log2(sqrt(d)) + log2(log2(sqrt(d))) - 2`
/// for interval width `d`, clamped to at least one so that degenerate
/// intervals cannot reduce modulo zero.
fn jump_table_size(a: &BigUint, b: &BigUint) -> BigUint {
    let width_root = (b - a).sqrt();
    let log_root = width_root.to_f64().unwrap_or(f64::MAX).log2();
    let size = log_root + log_root.log2() - 2.0;
    BigUint::from((size + 1.0).max(1.0) as u64)
}

/// Expected number of tame steps: four times the mean jump size.
fn expected_steps(k: &BigUint, p: &BigUint) -> BigUint {
    let mut total: BigUint = Zero::zero();
    let mut i: BigUint = Zero::zero();
    while &i < k {
        total += jump_distance(&i, k, p);
        i += 1u64;
    }
    total / k * 4u64
}

/// Walks the tame kangaroo from `g^b` and returns `(x_t, y_t)`, its distance
/// and final element. The relation `y_t = g^(b + x_t)` is checked exactly on
/// return; a mismatch means the arithmetic or the parameters are broken and
/// the solve cannot be trusted.
fn tame_kangaroo(
    p: &BigUint,
    g: &BigUint,
    b: &BigUint,
    k: &BigUint,
    cancel: &CancelToken,
) -> Result<(BigUint, BigUint)> {
    let steps = expected_steps(k, p);
    let mut tame = Kangaroo::new(g.modpow(b, p));

    let mut i: BigUint = Zero::zero();
    while i < steps {
        if cancel.is_cancelled() {
            return Err(AttackError::Cancelled("walking the tame kangaroo"));
        }
        tame.hop(g, p, k);
        i += 1u64;
    }

    if tame.element != g.modpow(&(b + &tame.position), p) {
        return Err(AttackError::TameKangarooDivergence { modulus: p.clone() });
    }
    Ok((tame.position, tame.element))
}

/// Solves `y = g^x mod p` for `x` in `[a, b]`.
///
/// Success is probabilistic (see the module comment), but any returned value
/// satisfies `g^x == y` exactly. `NotFound` means the wild kangaroo crossed
/// the whole trapping region without a collision; callers may re-derive the
/// target and try again, this function never retries internally.
pub fn catch_kangaroo(
    p: &BigUint,
    g: &BigUint,
    y: &BigUint,
    a: &BigUint,
    b: &BigUint,
    cancel: &CancelToken,
) -> Result<BigUint> {
    let k = jump_table_size(a, b);
    let (tame_position, trap) = tame_kangaroo(p, g, b, &k, cancel)?;

    let mut wild = Kangaroo::new(y.clone());
    let limit = &tame_position + (b - a);
    while wild.position < limit {
        if cancel.is_cancelled() {
            return Err(AttackError::Cancelled("walking the wild kangaroo"));
        }
        wild.hop(g, p, &k);

        if wild.element == trap {
            // The wild kangaroo travelled x_w from y = g^x, the tame one
            // x_t from g^b, and both ended on the same element, so
            // x + x_w = b + x_t.
            let tame_total = b + &tame_position;
            if tame_total < wild.position {
                return Err(AttackError::CollisionVerificationFailed);
            }
            let candidate = tame_total - &wild.position;
            if g.modpow(&candidate, p) != *y {
                return Err(AttackError::CollisionVerificationFailed);
            }
            return Ok(candidate);
        }
    }
    Err(AttackError::NotFound)
}
