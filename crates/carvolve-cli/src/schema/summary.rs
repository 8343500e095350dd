use std::path::PathBuf;

use carvolve_network::Topology;
use carvolve_training::FitnessStats;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Result of a `train` run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingSummary {
    /// Timestamp when training finished (ISO 8601 format)
    pub finished_at: DateTime<Utc>,
    /// Seed of the training RNG, for reproducing the run
    pub seed: u64,
    /// Number of generations fully evaluated
    pub generations: usize,
    pub population_size: usize,
    pub topology: Topology,
    /// Best fitness ever seen, including fitness loaded from the network file
    pub best_fitness: f32,
    /// File holding the best network
    pub network_path: PathBuf,
    /// Fitness statistics of the last evaluated generation
    pub last_generation: Option<FitnessStats>,
}
