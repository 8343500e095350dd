use serde::{Deserialize, Serialize};

/// Summary of the fitness values of one generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitnessStats {
    pub min: f32,
    pub max: f32,
    pub mean: f32,
    pub std_dev: f32,
    /// Pool index of the first genome reaching `max`.
    pub best_index: usize,
}

impl FitnessStats {
    /// Computes statistics over fitness values in pool order.
    ///
    /// Returns `None` for an empty input.
    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn new<I>(values: I) -> Option<Self>
    where
        I: IntoIterator<Item = f32>,
    {
        let values = values.into_iter().collect::<Vec<_>>();
        let (first, rest) = values.split_first()?;

        let mut min = *first;
        let mut max = *first;
        let mut best_index = 0;
        for (i, &v) in rest.iter().enumerate() {
            min = min.min(v);
            if v > max {
                max = v;
                best_index = i + 1;
            }
        }

        let n = values.len() as f32;
        let mean = values.iter().sum::<f32>() / n;
        let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f32>() / n;

        Some(Self {
            min,
            max,
            mean,
            std_dev: variance.sqrt(),
            best_index,
        })
    }
}
