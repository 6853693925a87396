// Shared fixtures for the attack tests.

/// 2311 is prime and 2310 = 2 * 3 * 5 * 7 * 11, so every subgroup order of
/// its multiplicative group is known by construction.
pub const P_2311: u64 = 2311;

/// Stand-in for the victim's key-derivation-plus-MAC step (FNV-1a over the
/// shared secret bytes). The real primitive is an external collaborator; the
/// attacks only require that attacker and victim compute the same bytes.
pub fn mix_key(shared_secret: &[u8]) -> Vec<u8> {
    let mut digest: u64 = 0xcbf2_9ce4_8422_2325;
    for &byte in shared_secret {
        digest ^= u64::from(byte);
        digest = digest.wrapping_mul(0x0100_0000_01b3);
    }
    digest.to_be_bytes().to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mix_key_is_deterministic_and_input_sensitive() {
        assert_eq!(mix_key(b"secret"), mix_key(b"secret"));
        assert_ne!(mix_key(b"secret"), mix_key(b"secres"));
        assert_eq!(mix_key(b"secret").len(), 8);
    }
}
