//! The generation loop: one active genome at a time, repopulation at the boundary.

use std::rc::Rc;

use carvolve_network::{
    NeuralNetwork,
    codec::{self, CodecError, LoadOutcome},
};
use rand::SeedableRng as _;
use rand_pcg::Pcg32;

use crate::{
    config::{ConfigError, TrainingConfig},
    environment::{self, Environment, Progress, ProgressDisplay},
    genetic::{EvolutionReport, Population, PopulationEvolver},
    stats::FitnessStats,
};

#[derive(Debug, derive_more::Display, derive_more::Error, derive_more::From)]
pub enum ControllerError {
    #[display("invalid training configuration: {_0}")]
    Config(ConfigError),
    #[display("best network persistence failed: {_0}")]
    Persistence(CodecError),
}

/// What the controller did after a termination was reported.
#[derive(Debug, Clone, PartialEq, derive_more::IsVariant)]
pub enum Advance {
    /// The cursor moved to the next genome of the same generation.
    NextGenome { index: usize },
    /// The generation was exhausted and a new pool is ready at index 0.
    NewGeneration {
        /// Number of the generation that just started
        generation: usize,
        /// Fitness summary of the generation that just ended
        stats: Option<FitnessStats>,
        /// `None` when training is disabled
        report: Option<EvolutionReport>,
    },
}

/// Genomes of the current generation.
#[derive(Debug)]
enum GenomePool {
    Evolving(Population),
    /// Evaluation-only mode: every slot aliases one read-only snapshot.
    Frozen {
        slots: Vec<Rc<NeuralNetwork>>,
        fitness: Vec<f32>,
    },
}

impl GenomePool {
    fn frozen(snapshot: NeuralNetwork, size: usize) -> Self {
        let snapshot = Rc::new(snapshot);
        GenomePool::Frozen {
            slots: vec![snapshot; size],
            fitness: vec![0.0; size],
        }
    }

    fn len(&self) -> usize {
        match self {
            GenomePool::Evolving(population) => population.len(),
            GenomePool::Frozen { slots, .. } => slots.len(),
        }
    }

    fn genome(&self, index: usize) -> Option<&NeuralNetwork> {
        match self {
            GenomePool::Evolving(population) => population.get(index),
            GenomePool::Frozen { slots, .. } => slots.get(index).map(Rc::as_ref),
        }
    }

    fn record_fitness(&mut self, index: usize, value: f32) {
        match self {
            GenomePool::Evolving(population) => {
                if let Some(genome) = population.get_mut(index) {
                    genome.set_fitness(value);
                }
            }
            GenomePool::Frozen { fitness, .. } => fitness[index] = value,
        }
    }

    fn fitness_stats(&self) -> Option<FitnessStats> {
        match self {
            GenomePool::Evolving(population) => population.compute_fitness_stats(),
            GenomePool::Frozen { fitness, .. } => FitnessStats::new(fitness.iter().copied()),
        }
    }
}

/// Owns the population and drives it through generations.
///
/// The environment reports each finished genome through [`Self::on_termination`]
/// (or lets [`Self::run_episode`] do it). When the last genome of a generation
/// finishes, the population is ranked and bred into the next one.
///
/// While training, every genome that beats the best fitness seen so far replaces the
/// best-network snapshot and is saved to `network_path` right away. The snapshot on
/// disk therefore only ever holds a fully evaluated genome.
#[derive(Debug)]
pub struct EvolutionaryController<D> {
    config: TrainingConfig,
    evolver: PopulationEvolver,
    pool: GenomePool,
    active: usize,
    generation: usize,
    best: NeuralNetwork,
    best_fitness: f32,
    display: D,
    rng: Pcg32,
}

impl<D> EvolutionaryController<D>
where
    D: ProgressDisplay,
{
    /// Validates `config`, loads the saved best network, and sets up generation 1.
    ///
    /// A missing or empty network file is not an error: training starts with a best
    /// fitness of zero, and evaluation-only mode runs a random network.
    pub fn new(config: TrainingConfig, display: D, seed: u64) -> Result<Self, ControllerError> {
        config.validate()?;
        let mut rng = Pcg32::seed_from_u64(seed);

        let mut best = NeuralNetwork::random(config.topology.clone(), &mut rng);
        let best_fitness = match codec::load(&config.network_path, &mut best)? {
            LoadOutcome::Loaded { fitness } => {
                log::info!(
                    "loaded best network from {} (fitness {fitness})",
                    config.network_path.display()
                );
                best.set_fitness(fitness);
                fitness
            }
            LoadOutcome::Empty => {
                log::info!(
                    "no saved network at {}, starting from scratch",
                    config.network_path.display()
                );
                0.0
            }
        };

        let pool = if config.train {
            GenomePool::Evolving(Population::random(
                &config.topology,
                config.population_size,
                &mut rng,
            ))
        } else {
            GenomePool::frozen(best.clone(), config.population_size)
        };

        Ok(Self {
            evolver: PopulationEvolver::from_config(&config),
            config,
            pool,
            active: 0,
            generation: 1,
            best,
            best_fitness,
            display,
            rng,
        })
    }

    #[must_use]
    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    /// Number of the generation currently being evaluated, starting at 1.
    #[must_use]
    pub fn generation(&self) -> usize {
        self.generation
    }

    /// 0-based pool index of the genome currently being evaluated.
    #[must_use]
    pub fn active_index(&self) -> usize {
        self.active
    }

    #[must_use]
    pub fn population_size(&self) -> usize {
        self.pool.len()
    }

    /// The genome the environment should be running.
    #[must_use]
    pub fn active_genome(&self) -> &NeuralNetwork {
        self.genome(self.active)
            .expect("active index stays within the pool")
    }

    #[must_use]
    pub fn genome(&self, index: usize) -> Option<&NeuralNetwork> {
        self.pool.genome(index)
    }

    /// The evolving population; `None` in evaluation-only mode.
    #[must_use]
    pub fn population(&self) -> Option<&Population> {
        match &self.pool {
            GenomePool::Evolving(population) => Some(population),
            GenomePool::Frozen { .. } => None,
        }
    }

    /// Snapshot of the best genome seen so far.
    #[must_use]
    pub fn best_network(&self) -> &NeuralNetwork {
        &self.best
    }

    #[must_use]
    pub fn best_fitness(&self) -> f32 {
        self.best_fitness
    }

    /// Runs the active genome for one episode and reports its fitness.
    pub fn run_episode<E>(&mut self, env: &mut E) -> Result<Advance, ControllerError>
    where
        E: Environment + ?Sized,
    {
        let fitness = environment::run_episode(env, self.active_genome());
        self.on_termination(fitness)
    }

    /// Runs episodes until the current generation is exhausted.
    pub fn run_generation<E>(&mut self, env: &mut E) -> Result<Advance, ControllerError>
    where
        E: Environment + ?Sized,
    {
        loop {
            let advance = self.run_episode(env)?;
            if advance.is_new_generation() {
                return Ok(advance);
            }
        }
    }

    /// Records the active genome's fitness and moves on.
    ///
    /// Non-finite fitness values are recorded as zero.
    pub fn on_termination(&mut self, fitness: f32) -> Result<Advance, ControllerError> {
        let fitness = if fitness.is_finite() {
            fitness
        } else {
            log::warn!("genome {} reported fitness {fitness}, using 0", self.active);
            0.0
        };
        self.pool.record_fitness(self.active, fitness);
        log::debug!(
            "generation {} genome {}/{}: fitness {fitness}",
            self.generation,
            self.active + 1,
            self.pool.len()
        );
        self.display.show(&Progress {
            generation: self.generation,
            genome: self.active + 1,
            population_size: self.pool.len(),
        });

        if self.config.train && fitness > self.best_fitness {
            self.replace_best(fitness)?;
        }

        if self.active + 1 < self.pool.len() {
            self.active += 1;
            return Ok(Advance::NextGenome { index: self.active });
        }
        self.repopulate()
    }

    fn replace_best(&mut self, fitness: f32) -> Result<(), ControllerError> {
        let mut best = self.active_genome().clone_topology();
        best.set_fitness(fitness);
        best.set_best_fitness(fitness);
        codec::save(&self.config.network_path, &best)?;
        log::debug!(
            "new best fitness {fitness} (was {}) in generation {}, saved to {}",
            self.best_fitness,
            self.generation,
            self.config.network_path.display()
        );
        self.best = best;
        self.best_fitness = fitness;
        Ok(())
    }

    fn repopulate(&mut self) -> Result<Advance, ControllerError> {
        let stats = self.pool.fitness_stats();

        let report = if let GenomePool::Evolving(population) = &mut self.pool {
            let (next, report) = self.evolver.evolve(population, &mut self.rng);
            *population = next;
            Some(report)
        } else {
            self.reload_frozen()?;
            None
        };

        if let Some(stats) = &stats {
            log::info!(
                "generation {} finished: max {:.3}, mean {:.3}, min {:.3}, std {:.3}, best so far {:.3}",
                self.generation,
                stats.max,
                stats.mean,
                stats.min,
                stats.std_dev,
                self.best_fitness
            );
        }
        self.generation += 1;
        self.active = 0;

        Ok(Advance::NewGeneration {
            generation: self.generation,
            stats,
            report,
        })
    }

    /// Picks up a best network written by another process since the last generation.
    ///
    /// A file that is empty or does not parse (for example while another writer is
    /// replacing it) keeps the current snapshot. Only I/O errors are returned.
    fn reload_frozen(&mut self) -> Result<(), ControllerError> {
        let path = &self.config.network_path;
        let mut candidate = self.best.clone_topology();
        let snapshot = match codec::load(path, &mut candidate) {
            Ok(LoadOutcome::Loaded { fitness }) => {
                log::info!("reloaded best network (fitness {fitness})");
                candidate.set_fitness(fitness);
                self.best = candidate.clone();
                self.best_fitness = fitness;
                candidate
            }
            Ok(LoadOutcome::Empty) => {
                log::warn!("{} is empty, keeping the current network", path.display());
                self.best.clone()
            }
            Err(e @ CodecError::Io(_)) => return Err(e.into()),
            Err(e) => {
                log::warn!(
                    "{} is unreadable, keeping the current network: {e}",
                    path.display()
                );
                self.best.clone()
            }
        };
        self.pool = GenomePool::frozen(snapshot, self.config.population_size);
        Ok(())
    }
}
