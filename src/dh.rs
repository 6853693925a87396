// End-to-end attacks on Diffie-Hellman peers that skip public-key
// validation. Both attacks hand the victim elements of small order taken
// from the subgroups hiding in the cofactor of the group order, read the
// authentication tag the victim derives from the confined shared secret,
// and stitch the per-order residues of the private key back together with
// the Chinese Remainder Theorem. When the stitched-together modulus still
// falls short of the group order, a kangaroo walk closes the remaining
// interval.

use num_bigint::{BigUint, RandBigInt};
use num_traits::{One, Zero};

use crate::cancel::CancelToken;
use crate::crt::ResidueSystem;
use crate::errors::Result;
use crate::factor::find_small_factors;
use crate::kangaroo::catch_kangaroo;
use crate::subgroup::{brute_force_secret_mod_order, find_element_of_small_order};

/// Domain parameters of the group under attack: prime modulus `p`, a
/// generator `g` of the prime-order-`q` subgroup, and the cofactor
/// `(p - 1) / q` whose small factors are what make the group exploitable.
/// Immutable for the duration of an attack run.
#[derive(Debug, Clone)]
pub struct DhParams {
    pub p: BigUint,
    pub g: BigUint,
    pub q: BigUint,
    pub cofactor: BigUint,
}

/// Recovers the victim's private key when the smooth part of the cofactor
/// exceeds the subgroup order `q`.
///
/// `oracle` is the victim's handshake: it raises whatever public value we
/// send to its private key and returns the tag it derives from the result.
/// `derive_tag` must be the same key-derivation-plus-MAC primitive the
/// victim uses; the attacker is assumed to know it, never the raw secret.
///
/// Factors are solved smallest first and accumulation stops as soon as the
/// combined modulus exceeds `q`, at which point the residue *is* the key.
pub fn small_subgroup_attack<R: RandBigInt>(
    params: &DhParams,
    oracle: impl Fn(&BigUint) -> Vec<u8>,
    derive_tag: impl Fn(&[u8]) -> Vec<u8> + Sync,
    rng: &mut R,
    cancel: &CancelToken,
) -> Result<BigUint> {
    let factors = find_small_factors(&params.cofactor)?;

    let mut residues = ResidueSystem::new();
    for order in &factors {
        let h = find_element_of_small_order(&params.p, order, rng, cancel)?;
        let tag = oracle(&h);
        let residue = brute_force_secret_mod_order(order, &h, &params.p, &tag, &derive_tag)?;
        residues.push(residue, order.clone());

        if residues.combined_modulus() > params.q {
            break;
        }
    }

    let (secret, _) = residues.combine()?;
    Ok(secret)
}

/// Recovers the victim's private key when the cofactor is not smooth enough
/// to cover `q` on its own.
///
/// The small-subgroup phase pins the key down to `n mod M`, with `M` the
/// product of every usable factor. Writing the key as `x = n + m * M`, the
/// victim's public key `y = g^x` gives
///
///   y * g^(-n) = g^(m * M) = (g^M)^m
///
/// so `m` is a discrete log of a known target to the base `g^M`, confined to
/// the interval `[0, (q - 1) / M]`, which is exactly what the kangaroo
/// solver is for. `get_public_key` is consumed once, here.
pub fn kangaroo_attack<R: RandBigInt>(
    params: &DhParams,
    oracle: impl Fn(&BigUint) -> Vec<u8>,
    derive_tag: impl Fn(&[u8]) -> Vec<u8> + Sync,
    get_public_key: impl FnOnce() -> BigUint,
    rng: &mut R,
    cancel: &CancelToken,
) -> Result<BigUint> {
    let factors = find_small_factors(&params.cofactor)?;

    let mut residues = ResidueSystem::new();
    for order in &factors {
        let h = find_element_of_small_order(&params.p, order, rng, cancel)?;
        let tag = oracle(&h);
        let residue = brute_force_secret_mod_order(order, &h, &params.p, &tag, &derive_tag)?;
        residues.push(residue, order.clone());
    }
    let (known, modulus) = residues.combine()?;

    let public_key = get_public_key();
    // g has order q, so g^(-n) = g^(q - n mod q) stays in BigUint territory.
    let neg_known = (&params.q - (&known % &params.q)) % &params.q;
    let target = public_key * params.g.modpow(&neg_known, &params.p) % &params.p;
    let base = params.g.modpow(&modulus, &params.p);
    let upper = (&params.q - BigUint::one()) / &modulus;

    let m = catch_kangaroo(&params.p, &base, &target, &Zero::zero(), &upper, cancel)?;
    Ok(known + m * modulus)
}
