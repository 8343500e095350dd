use std::{cell::RefCell, ops::RangeInclusive};

use rand::Rng;

use crate::{MutationBands, ShapeError, Topology, WeightMutation};

/// Range initial and re-randomized weights are drawn from.
pub const WEIGHT_RANGE: RangeInclusive<f32> = -0.5..=0.5;

/// Constant added to every neuron's weighted sum before activation.
pub const BIAS: f32 = 0.5;

/// A fixed-topology feedforward network acting as one genome.
///
/// Weights are stored flat in canonical order: transition, then destination neuron,
/// then source neuron. The length always equals [`Topology::weight_count`], so the
/// matrix for transition `i` has `layers[i + 1]` rows of `layers[i]` entries.
///
/// Two fitness values are tracked separately:
///
/// - `fitness` - score of the most recent evaluation run, set by the controller
/// - `best_fitness` - best score recorded for these weights in persistence
#[derive(Debug, Clone)]
pub struct NeuralNetwork {
    topology: Topology,
    weights: Vec<f32>,
    activations: RefCell<Vec<Vec<f32>>>,
    fitness: f32,
    best_fitness: f32,
}

impl NeuralNetwork {
    /// Creates a network with weights drawn uniformly from [`WEIGHT_RANGE`].
    pub fn random<R>(topology: Topology, rng: &mut R) -> Self
    where
        R: Rng + ?Sized,
    {
        let weights = (0..topology.weight_count())
            .map(|_| rng.random_range(WEIGHT_RANGE))
            .collect();
        Self::with_weights(topology, weights)
    }

    /// Like [`Self::random`], but validates raw layer sizes first.
    pub fn from_layer_sizes<R>(layers: &[usize], rng: &mut R) -> Result<Self, ShapeError>
    where
        R: Rng + ?Sized,
    {
        let topology = Topology::new(layers.to_vec())?;
        Ok(Self::random(topology, rng))
    }

    /// Creates a network from weights in canonical order.
    pub fn from_weights(topology: Topology, weights: Vec<f32>) -> Result<Self, ShapeError> {
        check_weight_count(&topology, weights.len())?;
        Ok(Self::with_weights(topology, weights))
    }

    fn with_weights(topology: Topology, weights: Vec<f32>) -> Self {
        debug_assert_eq!(weights.len(), topology.weight_count());
        let activations = topology
            .layers()
            .iter()
            .map(|&size| vec![0.0; size])
            .collect();
        Self {
            topology,
            weights,
            activations: RefCell::new(activations),
            fitness: 0.0,
            best_fitness: 0.0,
        }
    }

    /// Returns a weight-for-weight copy with both fitness values reset to zero.
    #[must_use]
    pub fn clone_topology(&self) -> Self {
        Self::with_weights(self.topology.clone(), self.weights.clone())
    }

    #[must_use]
    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    /// All weights in canonical order.
    #[must_use]
    pub fn weights(&self) -> &[f32] {
        &self.weights
    }

    /// Returns `weights[transition][dst][src]`.
    ///
    /// # Panics
    ///
    /// Panics if any index is out of range for the topology.
    #[must_use]
    pub fn weight(&self, transition: usize, dst: usize, src: usize) -> f32 {
        let t = self
            .topology
            .transitions()
            .nth(transition)
            .expect("transition index out of range");
        assert!(dst < t.rows && src < t.cols, "neuron index out of range");
        self.weights[t.range.start + dst * t.cols + src]
    }

    /// Replaces every weight, keeping the topology.
    pub fn set_weights(&mut self, weights: Vec<f32>) -> Result<(), ShapeError> {
        check_weight_count(&self.topology, weights.len())?;
        self.weights = weights;
        Ok(())
    }

    #[must_use]
    pub fn fitness(&self) -> f32 {
        self.fitness
    }

    pub fn set_fitness(&mut self, fitness: f32) {
        self.fitness = fitness;
    }

    #[must_use]
    pub fn best_fitness(&self) -> f32 {
        self.best_fitness
    }

    pub fn set_best_fitness(&mut self, best_fitness: f32) {
        self.best_fitness = best_fitness;
    }

    /// Feeds `inputs` forward and returns the output layer activations.
    ///
    /// Each non-input neuron computes `tanh(BIAS + Σ w·a)` over the previous layer,
    /// so every output lies in `(-1, 1)`. The activation buffers are overwritten on
    /// every call; nothing carries over between evaluations.
    pub fn evaluate(&self, inputs: &[f32]) -> Result<Vec<f32>, ShapeError> {
        let expected = self.topology.input_size();
        if inputs.len() != expected {
            return Err(ShapeError::InputLength {
                expected,
                actual: inputs.len(),
            });
        }

        let mut activations = self.activations.borrow_mut();
        activations[0].copy_from_slice(inputs);
        for t in self.topology.transitions() {
            let (done, rest) = activations.split_at_mut(t.index + 1);
            let prev = &done[t.index];
            let next = &mut rest[0];
            let matrix = &self.weights[t.range];
            for (neuron, row) in next.iter_mut().zip(matrix.chunks_exact(t.cols)) {
                let sum = row.iter().zip(prev).map(|(w, a)| w * a).sum::<f32>();
                *neuron = (BIAS + sum).tanh();
            }
        }

        Ok(activations[activations.len() - 1].clone())
    }

    /// Applies [`Self::mutate_with`] using the default bands.
    pub fn mutate<R>(&mut self, rng: &mut R) -> usize
    where
        R: Rng + ?Sized,
    {
        self.mutate_with(&MutationBands::default(), rng)
    }

    /// Rolls every weight against `bands` and applies the resulting perturbation.
    ///
    /// Returns the number of weights that fell into one of the three bands.
    pub fn mutate_with<R>(&mut self, bands: &MutationBands, rng: &mut R) -> usize
    where
        R: Rng + ?Sized,
    {
        let mut touched = 0;
        for w in &mut self.weights {
            match bands.roll(rng) {
                WeightMutation::Negate => *w = -*w,
                WeightMutation::Rerandomize => *w = rng.random_range(WEIGHT_RANGE),
                WeightMutation::Scale => *w *= rng.random_range(0.0..1.0),
                WeightMutation::Keep => continue,
            }
            touched += 1;
        }
        touched
    }

    /// Breeds two children by exchanging individual weights between `self` and `other`.
    ///
    /// For every weight a fair coin decides whether the first child takes it from
    /// `self` and the second from `other`, or the other way round. Both children have
    /// fitness zero.
    pub fn crossover<R>(&self, other: &Self, rng: &mut R) -> Result<(Self, Self), ShapeError>
    where
        R: Rng + ?Sized,
    {
        if self.topology != other.topology {
            return Err(ShapeError::TopologyMismatch {
                left: self.topology.clone(),
                right: other.topology.clone(),
            });
        }

        let len = self.weights.len();
        let mut first = Vec::with_capacity(len);
        let mut second = Vec::with_capacity(len);
        for (&a, &b) in self.weights.iter().zip(&other.weights) {
            if rng.random_bool(0.5) {
                first.push(a);
                second.push(b);
            } else {
                first.push(b);
                second.push(a);
            }
        }

        Ok((
            Self::with_weights(self.topology.clone(), first),
            Self::with_weights(self.topology.clone(), second),
        ))
    }
}

fn check_weight_count(topology: &Topology, actual: usize) -> Result<(), ShapeError> {
    let expected = topology.weight_count();
    if actual == expected {
        Ok(())
    } else {
        Err(ShapeError::WeightCount { expected, actual })
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng as _;
    use rand_pcg::Pcg32;

    use super::*;

    fn rng() -> Pcg32 {
        Pcg32::seed_from_u64(0x5eed)
    }

    fn network(layers: &[usize], rng: &mut Pcg32) -> NeuralNetwork {
        NeuralNetwork::from_layer_sizes(layers, rng).unwrap()
    }

    #[test]
    fn test_construct_rejects_too_few_layers() {
        let err = NeuralNetwork::from_layer_sizes(&[3], &mut rng()).unwrap_err();
        assert_eq!(err, ShapeError::TooFewLayers { layers: 1 });
    }

    #[test]
    fn test_random_weights_within_range() {
        let net = network(&[3, 7, 2], &mut rng());
        assert_eq!(net.weights().len(), 35);
        assert!(net.weights().iter().all(|w| WEIGHT_RANGE.contains(w)));
        assert!(net.fitness().abs() < f32::EPSILON);
    }

    #[test]
    fn test_outputs_strictly_bounded() {
        let mut rng = rng();
        for layers in [
            &[1, 1][..],
            &[3, 7, 2][..],
            &[4, 8, 8, 3][..],
            &[2, 5, 5, 5, 1][..],
            &[8, 1][..],
        ] {
            let net = network(layers, &mut rng);
            for _ in 0..20 {
                let inputs = (0..layers[0])
                    .map(|_| rng.random_range(-1.0..=1.0))
                    .collect::<Vec<f32>>();
                let outputs = net.evaluate(&inputs).unwrap();
                assert_eq!(outputs.len(), *layers.last().unwrap());
                assert!(outputs.iter().all(|o| *o > -1.0 && *o < 1.0), "{outputs:?}");
            }
        }
    }

    #[test]
    fn test_evaluate_known_values() {
        let topology = Topology::new(vec![2, 1]).unwrap();
        let net = NeuralNetwork::from_weights(topology, vec![0.25, -0.5]).unwrap();
        let out = net.evaluate(&[1.0, 1.0]).unwrap();
        assert!((out[0] - 0.25f32.tanh()).abs() < 1e-6);

        // zero weights leave only the bias
        let topology = Topology::new(vec![2, 3, 1]).unwrap();
        let net = NeuralNetwork::from_weights(topology, vec![0.0; 9]).unwrap();
        let expected = BIAS.tanh();
        assert!((net.evaluate(&[5.0, -5.0]).unwrap()[0] - expected).abs() < 1e-6);
    }

    #[test]
    fn test_evaluate_rejects_wrong_input_length() {
        let net = network(&[3, 7, 2], &mut rng());
        assert_eq!(
            net.evaluate(&[1.0, 2.0]),
            Err(ShapeError::InputLength {
                expected: 3,
                actual: 2
            })
        );
    }

    #[test]
    fn test_evaluate_is_stateless() {
        let net = network(&[3, 7, 2], &mut rng());
        let first = net.evaluate(&[0.1, 0.2, 0.3]).unwrap();
        net.evaluate(&[9.0, -9.0, 4.0]).unwrap();
        let again = net.evaluate(&[0.1, 0.2, 0.3]).unwrap();
        assert_eq!(first, again);
    }

    #[test]
    fn test_clone_topology_preserves_outputs() {
        let mut net = network(&[3, 7, 2], &mut rng());
        net.set_fitness(12.0);
        net.set_best_fitness(30.0);
        let clone = net.clone_topology();
        assert_eq!(clone.topology(), net.topology());
        assert_eq!(clone.weights(), net.weights());
        assert!(clone.fitness().abs() < f32::EPSILON);
        assert!(clone.best_fitness().abs() < f32::EPSILON);
        let x = [0.7, -0.3, 2.5];
        assert_eq!(clone.evaluate(&x).unwrap(), net.evaluate(&x).unwrap());
    }

    #[test]
    fn test_weight_indexing_is_canonical() {
        let topology = Topology::new(vec![2, 3, 1]).unwrap();
        let weights = (0..9).map(|i| i as f32).collect();
        let net = NeuralNetwork::from_weights(topology, weights).unwrap();
        assert!((net.weight(0, 0, 0) - 0.0).abs() < f32::EPSILON);
        assert!((net.weight(0, 1, 0) - 2.0).abs() < f32::EPSILON);
        assert!((net.weight(0, 2, 1) - 5.0).abs() < f32::EPSILON);
        assert!((net.weight(1, 0, 2) - 8.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_set_weights_rejects_wrong_count() {
        let mut net = network(&[3, 7, 2], &mut rng());
        assert_eq!(
            net.set_weights(vec![0.0; 34]),
            Err(ShapeError::WeightCount {
                expected: 35,
                actual: 34
            })
        );
    }

    #[test]
    fn test_mutate_preserves_topology() {
        let mut rng = rng();
        let mut net = network(&[3, 7, 2], &mut rng);
        let topology = net.topology().clone();
        for _ in 0..100 {
            net.mutate(&mut rng);
        }
        assert_eq!(net.topology(), &topology);
        assert_eq!(net.weights().len(), topology.weight_count());
    }

    #[test]
    fn test_mutate_band_distribution() {
        let mut rng = rng();
        let topology = Topology::new(vec![10, 10]).unwrap();
        let trials = 500;
        let (mut negated, mut scaled_down, mut untouched) = (0, 0, 0);
        for _ in 0..trials {
            // 2.0 lies outside WEIGHT_RANGE, so re-randomized weights are recognizable
            let mut net = NeuralNetwork::from_weights(topology.clone(), vec![2.0; 100]).unwrap();
            net.mutate(&mut rng);
            for &w in net.weights() {
                if (w - 2.0).abs() < f32::EPSILON {
                    untouched += 1;
                } else if (w + 2.0).abs() < f32::EPSILON {
                    negated += 1;
                } else if WEIGHT_RANGE.contains(&w) {
                    // re-randomized, or scaled below 0.5
                } else {
                    assert!((0.0..2.0).contains(&w), "{w}");
                    scaled_down += 1;
                }
            }
        }
        let total = f64::from(trials * 100);
        // 3/70 of the rolls land in each band, the rest leave the weight alone
        let negated_share = f64::from(negated) / total;
        let untouched_share = f64::from(untouched) / total;
        assert!((negated_share - 3.0 / 70.0).abs() < 0.01, "{negated_share}");
        assert!((untouched_share - 61.0 / 70.0).abs() < 0.015, "{untouched_share}");
        assert!(scaled_down > 0);
    }

    #[test]
    fn test_crossover_identical_parents() {
        let mut rng = rng();
        let parent = network(&[3, 7, 2], &mut rng);
        let (a, b) = parent.crossover(&parent.clone_topology(), &mut rng).unwrap();
        assert_eq!(a.weights(), parent.weights());
        assert_eq!(b.weights(), parent.weights());
    }

    #[test]
    fn test_crossover_children_are_complementary() {
        let mut rng = rng();
        let topology = Topology::new(vec![4, 6, 2]).unwrap();
        let count = topology.weight_count();
        let left = NeuralNetwork::from_weights(topology.clone(), vec![1.0; count]).unwrap();
        let right = NeuralNetwork::from_weights(topology, vec![-1.0; count]).unwrap();
        let (a, b) = left.crossover(&right, &mut rng).unwrap();
        for (x, y) in a.weights().iter().zip(b.weights()) {
            assert!((x + y).abs() < f32::EPSILON);
        }
        // 36 independent fair coins
        assert!(a.weights().contains(&1.0));
        assert!(a.weights().contains(&-1.0));
    }

    #[test]
    fn test_crossover_rejects_mismatched_topology() {
        let mut rng = rng();
        let a = network(&[3, 7, 2], &mut rng);
        let b = network(&[3, 5, 2], &mut rng);
        assert!(matches!(
            a.crossover(&b, &mut rng),
            Err(ShapeError::TopologyMismatch { .. })
        ));
    }
}
