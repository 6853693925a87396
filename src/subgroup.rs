// Small-subgroup confinement against prime-field Diffie-Hellman. Sending the
// victim an element h of small order r confines the shared secret to the
// subgroup generated by h:
//
//   K = h^secret = h^(secret mod r)
//
// so an exhaustive search over the r possible values of K, each pushed
// through the same key-derivation the victim tags with, recovers
// `secret mod r` from a single oracle response.

use num_bigint::{BigUint, RandBigInt};
use num_traits::{One, ToPrimitive, Zero};
use rayon::prelude::*;

use crate::cancel::CancelToken;
use crate::errors::{AttackError, Result};

/// Samples an element of order `order` in the multiplicative group modulo
/// `p`, by raising random elements to `(p - 1) / order` until the result is
/// not the identity. When `order` is prime the accepted element has order
/// exactly `order`; for composite `order` its true order merely divides it,
/// which the brute-force step tolerates.
///
/// There is no iteration cap: if no element of the requested order exists
/// (e.g. `order` does not divide `p - 1`, or `order` is 1) the loop never
/// terminates on its own, and the cancel token is the only way out.
pub fn find_element_of_small_order<R: RandBigInt>(
    p: &BigUint,
    order: &BigUint,
    rng: &mut R,
    cancel: &CancelToken,
) -> Result<BigUint> {
    let one: BigUint = One::one();
    let exponent = (p - &one) / order;
    loop {
        if cancel.is_cancelled() {
            return Err(AttackError::Cancelled("sampling for a small-order element"));
        }
        let candidate = rng.gen_biguint_below(p);
        if candidate.is_zero() {
            continue;
        }
        let h = candidate.modpow(&exponent, p);
        if h != one {
            return Ok(h);
        }
    }
}

/// Recovers `secret mod order` from the tag the victim produced for the
/// low-order element `h`. `derive_tag` must be the same key-derivation-plus-
/// MAC primitive the victim applies to the shared secret.
///
/// Cost is O(order) candidate tags, which is what bounds useful factors to
/// the trial-division search bound in the first place.
pub fn brute_force_secret_mod_order(
    order: &BigUint,
    h: &BigUint,
    p: &BigUint,
    target_tag: &[u8],
    derive_tag: impl Fn(&[u8]) -> Vec<u8> + Sync,
) -> Result<BigUint> {
    if !h.modpow(order, p).is_one() {
        return Err(AttackError::InvalidElementOrder {
            element: h.to_string(),
            order: order.clone(),
        });
    }

    let bound = order.to_u64().unwrap_or(u64::MAX);
    (0..bound)
        .into_par_iter()
        .find_map_first(|i| {
            let shared_secret = h.modpow(&BigUint::from(i), p);
            (derive_tag(&shared_secret.to_bytes_be()) == target_tag).then(|| BigUint::from(i))
        })
        .ok_or_else(|| AttackError::NoMatchFound {
            order: order.clone(),
        })
}
