use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Seedable random source for card draws.
///
/// The same seed always yields the same sequence of draws.
#[derive(Clone, Debug)]
pub struct BattleRng {
    inner: ChaCha8Rng,
    seed: u64,
}

impl BattleRng {
    pub fn new(seed: u64) -> Self {
        Self {
            inner: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }

    pub fn from_entropy() -> Self {
        BattleRng::new(rand::random())
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Uniform index into a collection of `len` elements.
    pub fn pick(&mut self, len: usize) -> usize {
        self.inner.gen_range(0..len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_sequence() {
        let mut first = BattleRng::new(42);
        let mut second = BattleRng::new(42);
        let a: Vec<usize> = (0..32).map(|_| first.pick(4)).collect();
        let b: Vec<usize> = (0..32).map(|_| second.pick(4)).collect();
        assert_eq!(a, b);
    }

    #[test]
    fn picks_stay_in_range() {
        let mut rng = BattleRng::from_entropy();
        assert!((0..256).all(|_| rng.pick(4) < 4));
    }
}
