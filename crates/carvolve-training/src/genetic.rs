//! Genetic operators turning one evaluated generation into the next.
//!
//! # Repopulation
//!
//! [`PopulationEvolver::evolve`] builds the next generation in four blocks:
//!
//! 1. **Elites** - the top `elite_count` genomes (stable ranking by descending
//!    fitness, ties keep pool order) are copied with their fitness reset
//! 2. **Crossover children** - pairs of parents drawn from the [`BreedingPool`]
//!    produce two complementary children each, until `crossover_count` children exist
//! 3. **Mutation** - each child is mutated as a whole with probability
//!    `mutation_rate` (elites only when `mutate_elites` is set)
//! 4. **Refill** - any slot still empty gets a fresh random genome
//!
//! # Breeding Pool
//!
//! Only elites enter the breeding pool. Each elite holds
//! `round(fitness * 10)` tickets (never negative), and parents are drawn uniformly
//! over tickets, so a genome's chance of breeding grows linearly with its fitness.
//!
//! Parent draws retry up to [`PARENT_DRAW_ATTEMPTS`] times to find two distinct
//! genomes and otherwise accept a self-pairing. When the pool holds fewer than two
//! distinct candidates the pairing is counted as starved in [`EvolutionReport`].
//! With no tickets at all the parents fall back to consecutive ranked positions.

use carvolve_network::{MutationBands, NeuralNetwork, Topology};
use rand::Rng;

use crate::{config::TrainingConfig, stats::FitnessStats};

/// Maximum draws spent looking for two distinct parents.
pub const PARENT_DRAW_ATTEMPTS: usize = 85;

/// The genomes of one generation, in pool order.
///
/// All genomes share one topology.
#[derive(Debug, Clone)]
pub struct Population {
    networks: Vec<NeuralNetwork>,
}

impl Population {
    /// Creates `count` genomes with random weights.
    pub fn random<R>(topology: &Topology, count: usize, rng: &mut R) -> Self
    where
        R: Rng + ?Sized,
    {
        let networks = (0..count)
            .map(|_| NeuralNetwork::random(topology.clone(), rng))
            .collect();
        Self { networks }
    }

    #[must_use]
    pub fn networks(&self) -> &[NeuralNetwork] {
        &self.networks
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&NeuralNetwork> {
        self.networks.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut NeuralNetwork> {
        self.networks.get_mut(index)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.networks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.networks.is_empty()
    }

    /// Pool indices ordered by descending fitness.
    ///
    /// The sort is stable, so genomes with equal fitness keep their pool order.
    #[must_use]
    pub fn ranked_indices(&self) -> Vec<usize> {
        let mut indices = (0..self.networks.len()).collect::<Vec<_>>();
        indices.sort_by(|&a, &b| {
            self.networks[b]
                .fitness()
                .total_cmp(&self.networks[a].fitness())
        });
        indices
    }

    #[must_use]
    pub fn compute_fitness_stats(&self) -> Option<FitnessStats> {
        FitnessStats::new(self.networks.iter().map(NeuralNetwork::fitness))
    }
}

/// Number of breeding-pool tickets an elite with the given fitness receives.
///
/// Never negative and non-decreasing in fitness.
#[expect(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
#[must_use]
pub fn breeding_tickets(fitness: f32) -> usize {
    let tickets = (fitness * 10.0).round();
    if tickets > 0.0 {
        // saturating conversion
        tickets as usize
    } else {
        0
    }
}

/// Weighted multiset of pool indices that crossover parents are drawn from.
///
/// Stored as cumulative ticket counts rather than repeated entries.
#[derive(Debug, Clone, Default)]
pub struct BreedingPool {
    candidates: Vec<usize>,
    cumulative: Vec<usize>,
}

impl BreedingPool {
    /// Adds `tickets` entries for `index`. Zero tickets add nothing.
    pub fn add(&mut self, index: usize, tickets: usize) {
        if tickets == 0 {
            return;
        }
        let total = self.len().saturating_add(tickets);
        self.candidates.push(index);
        self.cumulative.push(total);
    }

    /// Total number of tickets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cumulative.last().copied().unwrap_or(0)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// Number of distinct pool indices holding at least one ticket.
    #[must_use]
    pub fn distinct_count(&self) -> usize {
        let mut seen = self.candidates.clone();
        seen.sort_unstable();
        seen.dedup();
        seen.len()
    }

    /// Draws one index, weighted by tickets.
    pub fn draw<R>(&self, rng: &mut R) -> Option<usize>
    where
        R: Rng + ?Sized,
    {
        if self.is_empty() {
            return None;
        }
        let ticket = rng.random_range(0..self.len());
        let slot = self.cumulative.partition_point(|&end| end <= ticket);
        Some(self.candidates[slot])
    }

    /// Draws two parents, retrying up to `attempts` times for distinct ones.
    ///
    /// The last draw is kept when no distinct pair turns up.
    pub fn draw_parents<R>(&self, attempts: usize, rng: &mut R) -> Option<(usize, usize)>
    where
        R: Rng + ?Sized,
    {
        let mut pair = None;
        for _ in 0..attempts.max(1) {
            let p1 = self.draw(rng)?;
            let p2 = self.draw(rng)?;
            pair = Some((p1, p2));
            if p1 != p2 {
                break;
            }
        }
        pair
    }
}

/// What happened while building one generation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EvolutionReport {
    pub elites: usize,
    pub breeding_tickets: usize,
    pub children: usize,
    /// Pairings made while the breeding pool had fewer than two distinct candidates
    pub starved_pairings: usize,
    pub mutated_genomes: usize,
    pub random_fill: usize,
}

/// Controls how a population evolves from one generation to the next.
#[derive(Debug, Clone)]
pub struct PopulationEvolver {
    /// Number of top genomes preserved unchanged (elitism)
    pub elite_count: usize,
    /// Number of children produced by crossover
    pub crossover_count: usize,
    /// Probability of mutating each child (rolled once per genome)
    pub mutation_rate: f32,
    /// Whether elites are mutated too
    pub mutate_elites: bool,
    pub mutation_bands: MutationBands,
}

impl PopulationEvolver {
    #[must_use]
    pub fn from_config(config: &TrainingConfig) -> Self {
        Self {
            elite_count: config.elite_count,
            crossover_count: config.crossover_count,
            mutation_rate: config.mutation_rate,
            mutate_elites: config.mutate_elites,
            mutation_bands: config.mutation_bands,
        }
    }

    /// Evolves an evaluated population into the next generation.
    ///
    /// The returned population has the same size as the input. Its genomes all have
    /// fitness zero.
    pub fn evolve<R>(&self, population: &Population, rng: &mut R) -> (Population, EvolutionReport)
    where
        R: Rng + ?Sized,
    {
        let size = population.len();
        let mut report = EvolutionReport::default();
        let Some(topology) = population.networks.first().map(|n| n.topology().clone()) else {
            return (Population { networks: vec![] }, report);
        };

        let ranked = population.ranked_indices();
        let mut next = Vec::with_capacity(size);

        // elite selection
        let mut pool = BreedingPool::default();
        for &index in ranked.iter().take(self.elite_count) {
            let elite = &population.networks[index];
            next.push(elite.clone_topology());
            pool.add(index, breeding_tickets(elite.fitness()));
        }
        report.elites = next.len();
        report.breeding_tickets = pool.len();

        // crossover
        let starving = pool.distinct_count() < 2;
        let child_limit = usize::min(report.elites + self.crossover_count, size);
        let mut pairing = 0;
        while next.len() < child_limit {
            let (p1, p2) = pool
                .draw_parents(PARENT_DRAW_ATTEMPTS, rng)
                .unwrap_or_else(|| ranked_fallback(&ranked, pairing));
            if starving {
                report.starved_pairings += 1;
            }
            let (c1, c2) = population.networks[p1]
                .crossover(&population.networks[p2], rng)
                .expect("population genomes share one topology");
            next.push(c1);
            if next.len() < child_limit {
                next.push(c2);
            }
            pairing += 1;
        }
        report.children = next.len() - report.elites;
        if report.starved_pairings > 0 {
            log::warn!(
                "selection starvation: breeding pool has {} distinct candidate(s), {} pairing(s) may be self-paired",
                pool.distinct_count(),
                report.starved_pairings
            );
        }

        // mutation
        let first_mutable = if self.mutate_elites { 0 } else { report.elites };
        for genome in &mut next[first_mutable..] {
            if rng.random_bool(self.mutation_rate.into()) {
                genome.mutate_with(&self.mutation_bands, rng);
                report.mutated_genomes += 1;
            }
        }

        // refill
        while next.len() < size {
            next.push(NeuralNetwork::random(topology.clone(), rng));
            report.random_fill += 1;
        }

        (Population { networks: next }, report)
    }
}

/// Parents for the `pairing`-th crossover when the breeding pool is empty.
fn ranked_fallback(ranked: &[usize], pairing: usize) -> (usize, usize) {
    let last = ranked.len() - 1;
    (
        ranked[usize::min(2 * pairing, last)],
        ranked[usize::min(2 * pairing + 1, last)],
    )
}
