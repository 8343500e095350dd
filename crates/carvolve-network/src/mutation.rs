use rand::Rng;
use serde::{Deserialize, Serialize};

/// Per-weight perturbation chosen by a mutation roll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::IsVariant)]
pub enum WeightMutation {
    /// Flip the sign of the weight.
    Negate,
    /// Replace the weight with a fresh value from the initial weight range.
    Rerandomize,
    /// Multiply the weight by a fresh factor in `[0, 1)`.
    Scale,
    /// Leave the weight unchanged.
    Keep,
}

/// Threshold bands for the three-way weight mutation.
///
/// For every weight a roll is drawn uniformly from `[0, roll_max]` and compared with
/// the thresholds in increasing order; the first band the roll falls into wins:
///
/// | roll                     | effect                 |
/// |--------------------------|------------------------|
/// | `..= negate`             | [`WeightMutation::Negate`] |
/// | `..= rerandomize`        | [`WeightMutation::Rerandomize`] |
/// | `..= scale`              | [`WeightMutation::Scale`] |
/// | above `scale`            | [`WeightMutation::Keep`] |
///
/// With the defaults (`70`, `3`, `6`, `9`) each band hits about 4.3% of the weights
/// and roughly 87% are left as they are.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MutationBands {
    pub roll_max: f32,
    pub negate: f32,
    pub rerandomize: f32,
    pub scale: f32,
}

impl Default for MutationBands {
    fn default() -> Self {
        Self {
            roll_max: 70.0,
            negate: 3.0,
            rerandomize: 6.0,
            scale: 9.0,
        }
    }
}

impl MutationBands {
    /// Maps a roll to the band it falls into.
    #[must_use]
    pub fn classify(&self, roll: f32) -> WeightMutation {
        if roll <= self.negate {
            WeightMutation::Negate
        } else if roll <= self.rerandomize {
            WeightMutation::Rerandomize
        } else if roll <= self.scale {
            WeightMutation::Scale
        } else {
            WeightMutation::Keep
        }
    }

    /// Draws a roll and returns the band it falls into.
    pub fn roll<R>(&self, rng: &mut R) -> WeightMutation
    where
        R: Rng + ?Sized,
    {
        self.classify(rng.random_range(0.0..=self.roll_max))
    }
}
