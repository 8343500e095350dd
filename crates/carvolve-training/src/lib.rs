//! Evolutionary training engine for fixed-topology network controllers.
//!
//! This crate evolves a population of [`NeuralNetwork`] genomes by evaluating one
//! genome at a time in an [`Environment`] and breeding the next generation once the
//! whole population has been scored.
//!
//! # How Training Works
//!
//! 1. **Population** - Create `population_size` random genomes of one topology
//! 2. **Evaluation** - The environment runs the active genome until it terminates
//!    and reports a fitness value
//! 3. **Persistence** - Any genome beating the best fitness so far is saved to disk
//!    immediately
//! 4. **Selection** - After the last genome, rank the population by fitness and keep
//!    the top `elite_count` genomes unchanged
//! 5. **Reproduction** - Breed `crossover_count` children from fitness-weighted
//!    parents, mutate them, and fill the rest with random genomes
//! 6. **Repeat** - Evaluation restarts at genome 0 of the new generation
//!
//! # Architecture
//!
//! ```text
//! EvolutionaryController
//!     ↓ hands active genome to
//! Environment (simulation, one tick per evaluate/apply)
//!     ↓ reports termination fitness to
//! EvolutionaryController
//!     ↓ saves improvements via
//! carvolve_network::codec
//!     ↓ at generation end, ranks and breeds with
//! PopulationEvolver
//! ```
//!
//! # Evaluation-only Mode
//!
//! With `train` disabled, every population slot aliases one snapshot of the saved
//! best network. Nothing is bred or saved; at each generation boundary the snapshot
//! is reloaded from disk, so another process can keep improving the file.
//!
//! # Example
//!
//! ```rust,ignore
//! use carvolve_training::{EvolutionaryController, NullDisplay, TrainingConfig};
//! # let mut env = todo!(); // any `Environment` with 3 observations and 2 actions
//!
//! let config = TrainingConfig::default();
//! let mut controller = EvolutionaryController::new(config, NullDisplay, 42)?;
//! for _ in 0..100 {
//!     controller.run_generation(&mut env)?;
//! }
//! println!("best fitness: {}", controller.best_fitness());
//! ```
//!
//! [`NeuralNetwork`]: carvolve_network::NeuralNetwork

pub use self::{
    config::{ConfigError, TrainingConfig},
    controller::{Advance, ControllerError, EvolutionaryController},
    environment::{Environment, NullDisplay, Progress, ProgressDisplay, Step, run_episode},
    stats::FitnessStats,
};

pub mod config;
pub mod controller;
pub mod environment;
pub mod genetic;
pub mod stats;
