use std::path::PathBuf;

use carvolve_network::{MutationBands, Topology};
use serde::{Deserialize, Serialize};

/// Parameters of a training (or evaluation-only) run.
///
/// Every field has a default, so a config file only needs to list what it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    /// Number of genomes evaluated per generation
    pub population_size: usize,
    /// Layer sizes of every genome
    pub topology: Topology,
    /// Top-ranked genomes copied unchanged into the next generation
    pub elite_count: usize,
    /// Children bred by crossover each generation (produced in pairs)
    pub crossover_count: usize,
    /// Probability that a bred child is mutated
    pub mutation_rate: f32,
    /// Whether elites are exposed to mutation as well
    pub mutate_elites: bool,
    /// Thresholds of the per-weight mutation roll
    pub mutation_bands: MutationBands,
    /// Evolve the population; when false every slot runs the saved best network
    pub train: bool,
    /// File the best network is saved to and loaded from
    pub network_path: PathBuf,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            population_size: 50,
            topology: Topology::reference(),
            elite_count: 10,
            crossover_count: 30,
            mutation_rate: 0.01,
            mutate_elites: false,
            mutation_bands: MutationBands::default(),
            train: true,
            network_path: PathBuf::from("best_network.dat"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, derive_more::Display, derive_more::Error)]
pub enum ConfigError {
    #[display("population size must be positive")]
    EmptyPopulation,
    #[display("elite count {elite_count} exceeds population size {population_size}")]
    TooManyElites {
        elite_count: usize,
        population_size: usize,
    },
    #[display("crossover count {crossover_count} must be even")]
    OddCrossover { crossover_count: usize },
    #[display(
        "{elite_count} elites plus {crossover_count} crossover children exceed population size {population_size}"
    )]
    Overcrowded {
        elite_count: usize,
        crossover_count: usize,
        population_size: usize,
    },
    #[display("mutation rate {rate} is outside [0, 1]")]
    MutationRate { rate: f32 },
    #[display("mutation roll maximum {roll_max} must be finite and non-negative")]
    MutationRoll { roll_max: f32 },
}

impl TrainingConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let Self {
            population_size,
            elite_count,
            crossover_count,
            mutation_rate,
            ..
        } = *self;
        if population_size == 0 {
            return Err(ConfigError::EmptyPopulation);
        }
        if elite_count > population_size {
            return Err(ConfigError::TooManyElites {
                elite_count,
                population_size,
            });
        }
        if crossover_count % 2 != 0 {
            return Err(ConfigError::OddCrossover { crossover_count });
        }
        if elite_count + crossover_count > population_size {
            return Err(ConfigError::Overcrowded {
                elite_count,
                crossover_count,
                population_size,
            });
        }
        if !(0.0..=1.0).contains(&mutation_rate) {
            return Err(ConfigError::MutationRate {
                rate: mutation_rate,
            });
        }
        let roll_max = self.mutation_bands.roll_max;
        if !roll_max.is_finite() || roll_max < 0.0 {
            return Err(ConfigError::MutationRoll { roll_max });
        }
        Ok(())
    }
}
