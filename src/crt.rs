// Chinese Remainder combination of the per-factor residues.

use num_bigint::BigUint;
use num_traits::Zero;

use crate::errors::{AttackError, Result};

/// An ordered collection of `(residue, modulus)` congruences on the secret,
/// grown one solved factor at a time and combined exactly once. Residues are
/// reduced on insertion so each stays within `[0, modulus)`; the moduli must
/// be pairwise coprime, which `combine` checks rather than trusts.
#[derive(Debug, Clone, Default)]
pub struct ResidueSystem {
    congruences: Vec<(BigUint, BigUint)>,
}

impl ResidueSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.congruences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.congruences.is_empty()
    }

    pub fn push(&mut self, residue: BigUint, modulus: BigUint) {
        self.congruences.push((&residue % &modulus, modulus));
    }

    /// Like `push`, but drops the congruence if the modulus is already
    /// present. The invalid-curve attack discovers the same small orders on
    /// several curves and only the first residue for each is kept.
    pub fn push_unique(&mut self, residue: BigUint, modulus: BigUint) {
        if self.congruences.iter().any(|(_, m)| *m == modulus) {
            return;
        }
        self.push(residue, modulus);
    }

    /// The product of all moduli: how much of the secret is pinned down.
    pub fn combined_modulus(&self) -> BigUint {
        self.congruences.iter().map(|(_, m)| m).product()
    }

    /// Solves the system, returning the unique `x` modulo the product `M` of
    /// all moduli that satisfies every congruence, as `(x, M)`. Fails with
    /// `NonCoprimeModuli` if any pair of moduli shares a factor; that is
    /// detected through the modular inverse rather than silently folded into
    /// a wrong answer.
    pub fn combine(self) -> Result<(BigUint, BigUint)> {
        let product = self.combined_modulus();
        let mut combined: BigUint = Zero::zero();
        for (residue, modulus) in &self.congruences {
            let complement = &product / modulus;
            // The complement is invertible modulo `modulus` exactly when
            // `modulus` is coprime to every other modulus in the system.
            let inverse =
                complement
                    .modinv(modulus)
                    .ok_or_else(|| AttackError::NonCoprimeModuli {
                        modulus: modulus.clone(),
                    })?;
            combined += residue * complement * inverse;
        }
        combined %= &product;
        Ok((combined, product))
    }
}
