use crate::direction::{Direction, ALL_DIRECTIONS};

use rand::{prelude::*, rngs::SmallRng};
use rand_distr::{Bernoulli, Distribution};

pub fn small_rng(seed: Option<u64>) -> SmallRng {
    match seed {
        Some(s) => SmallRng::seed_from_u64(s),
        None => SmallRng::from_entropy(),
    }
}

/// All eight directions in random order.
pub fn shuffled_directions(rng: &mut impl Rng) -> [Direction; 8] {
    let mut dirs = ALL_DIRECTIONS;
    dirs.shuffle(rng);

    dirs
}

/// One draw of a coin that lands true with probability `chance`, clamped to [0, 1].
pub fn coin_flip(rng: &mut impl Rng, chance: f64) -> bool {
    match Bernoulli::new(chance.max(0.0).min(1.0)) {
        Ok(coin) => coin.sample(rng),
        Err(_) => false,
    }
}
