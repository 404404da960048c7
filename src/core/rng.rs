//! Deterministic random number generation for event rolls.
//!
//! ## Key Features
//!
//! - **Deterministic**: Same seed produces identical sequence
//! - **Serializable**: O(1) state capture and restore
//!
//! Every engine operation that needs randomness takes a `&mut dyn Roller`.
//! `GameRng` is the production roller; `ScriptedRolls` replays a fixed
//! sequence so outcome branches can be pinned down in tests.
//!
//! ```
//! use cultivation_events::core::{GameRng, Roller};
//!
//! let mut rng = GameRng::new(42);
//! let sample = rng.roll();
//! assert!((0.0..1.0).contains(&sample));
//!
//! let mut again = GameRng::new(42);
//! assert_eq!(sample, again.roll());
//! ```

use std::collections::VecDeque;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Source of uniform samples in `[0, 1)`.
///
/// Everything else (ranges, integer picks, Bernoulli draws) is derived from
/// `roll`, so a roller only has to implement that one method.
pub trait Roller {
    /// Uniform sample in `[0, 1)`.
    fn roll(&mut self) -> f64;

    /// Uniform sample in `[low, high)`.
    fn roll_between(&mut self, low: f64, high: f64) -> f64 {
        low + (high - low) * self.roll()
    }

    /// Uniform integer in `[low, high]` (inclusive on both ends).
    fn roll_int(&mut self, low: i64, high: i64) -> i64 {
        if high <= low {
            return low;
        }
        let span = (high - low + 1) as f64;
        let offset = (self.roll() * span).floor() as i64;
        low + offset.min(high - low)
    }

    /// Bernoulli draw: true with the given probability.
    fn chance(&mut self, probability: f64) -> bool {
        self.roll() < probability
    }

    /// Pick an index into a collection of `len` elements.
    fn pick_index(&mut self, len: usize) -> Option<usize> {
        if len == 0 {
            return None;
        }
        Some(self.roll_int(0, len as i64 - 1) as usize)
    }
}

/// Seeded ChaCha8 roller.
///
/// The state is a seed plus a stream position, so a scheduler can save it
/// next to its event snapshots and resume the exact same sequence.
#[derive(Clone, Debug)]
pub struct GameRng {
    inner: ChaCha8Rng,
    seed: u64,
}

impl GameRng {
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            inner: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }

    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Capture the current position for a save.
    #[must_use]
    pub fn state(&self) -> GameRngState {
        GameRngState {
            seed: self.seed,
            word_pos: self.inner.get_word_pos(),
        }
    }

    /// Resume from a saved position.
    #[must_use]
    pub fn from_state(state: &GameRngState) -> Self {
        let mut inner = ChaCha8Rng::seed_from_u64(state.seed);
        inner.set_word_pos(state.word_pos);
        Self {
            inner,
            seed: state.seed,
        }
    }
}

impl Roller for GameRng {
    fn roll(&mut self) -> f64 {
        self.inner.gen::<f64>()
    }
}

/// Saved `GameRng` position.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameRngState {
    pub seed: u64,
    /// ChaCha8 word position (128-bit counter)
    pub word_pos: u128,
}

/// Roller that replays a fixed list of samples.
///
/// Samples are consumed front to back. Once exhausted the last sample
/// repeats, so a single-value script behaves like a constant roller.
#[derive(Clone, Debug, Default)]
pub struct ScriptedRolls {
    samples: VecDeque<f64>,
    last: f64,
    consumed: usize,
}

impl ScriptedRolls {
    /// Create a roller from a list of samples.
    pub fn new(samples: impl IntoIterator<Item = f64>) -> Self {
        Self {
            samples: samples.into_iter().collect(),
            last: 0.0,
            consumed: 0,
        }
    }

    /// A roller that always returns the same sample.
    #[must_use]
    pub fn constant(sample: f64) -> Self {
        Self {
            samples: VecDeque::new(),
            last: sample,
            consumed: 0,
        }
    }

    /// How many samples have been drawn so far.
    #[must_use]
    pub fn consumed(&self) -> usize {
        self.consumed
    }
}

impl Roller for ScriptedRolls {
    fn roll(&mut self) -> f64 {
        self.consumed += 1;
        if let Some(sample) = self.samples.pop_front() {
            self.last = sample;
        }
        self.last
    }
}
