use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Supplies the bytes consumed by Cxkk.
///
/// Every draw must be uniform over 0..=255 and independent of the last.
pub trait EntropySource {
    fn next_byte(&mut self) -> u8;
}

/// The default entropy source, backed by `StdRng`.
pub struct SeededEntropy {
    rng: StdRng,
}

impl SeededEntropy {
    /// Seeds from the operating system's entropy.
    pub fn new() -> Self {
        SeededEntropy {
            rng: StdRng::from_os_rng(),
        }
    }

    /// Seeds explicitly so draws are reproducible.
    pub fn from_seed(seed: u64) -> Self {
        SeededEntropy {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for SeededEntropy {
    fn default() -> Self {
        Self::new()
    }
}

impl EntropySource for SeededEntropy {
    fn next_byte(&mut self) -> u8 {
        self.rng.random()
    }
}
