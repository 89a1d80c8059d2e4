//! Seeded file contents.

use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// `len` pseudo-random bytes, identical for every run with the same seed.
pub fn seeded_contents(seed: u64, len: usize) -> Vec<u8> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut contents = vec![0u8; len];
    rng.fill_bytes(&mut contents);
    contents
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_bytes() {
        assert_eq!(seeded_contents(7, 1000), seeded_contents(7, 1000));
        assert_ne!(seeded_contents(7, 1000), seeded_contents(8, 1000));
        assert!(seeded_contents(7, 0).is_empty());
    }
}
