//! Fixed-topology feedforward networks used as genomes by the training engine.
//!
//! A [`NeuralNetwork`] is a plain weight tensor over a [`Topology`]. It is never
//! trained by gradient descent; the training crate changes its weights only through
//! the genetic operators defined here:
//!
//! - [`NeuralNetwork::mutate`] - three-band per-weight perturbation (sign flip,
//!   re-randomize, scale)
//! - [`NeuralNetwork::crossover`] - per-weight coin-flip exchange between two parents
//! - [`NeuralNetwork::clone_topology`] - weight-preserving copy with fitness reset
//!
//! # Evaluation
//!
//! Every non-input neuron computes `tanh(0.5 + Σ w·a)` over the previous layer, so
//! outputs always lie in `(-1, 1)`. The network keeps per-layer activation scratch
//! buffers internally, which lets evaluation take `&self` and a single network be
//! shared read-only between several population slots.
//!
//! # Persistence
//!
//! The [`codec`] module reads and writes the plain-text network file: the fitness on
//! the first line followed by one weight per line in canonical order
//! (`transition → destination neuron → source neuron`).
//!
//! # Example
//!
//! ```
//! use carvolve_network::{NeuralNetwork, Topology};
//!
//! let topology = Topology::new(vec![3, 7, 2]).unwrap();
//! let network = NeuralNetwork::random(topology, &mut rand::rng());
//! let outputs = network.evaluate(&[0.2, 1.0, 0.4]).unwrap();
//! assert_eq!(outputs.len(), 2);
//! assert!(outputs.iter().all(|o| o.abs() < 1.0));
//! ```

pub use self::{mutation::*, network::*, topology::*};

pub mod codec;
mod mutation;
mod network;
mod topology;

/// Errors raised when data does not fit a network's topology.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum ShapeError {
    #[display("topology needs at least 2 layers, got {layers}")]
    TooFewLayers { layers: usize },
    #[display("layer {index} has no neurons")]
    EmptyLayer { index: usize },
    #[display("expected {expected} inputs, got {actual}")]
    InputLength { expected: usize, actual: usize },
    #[display("expected {expected} weights, got {actual}")]
    WeightCount { expected: usize, actual: usize },
    #[display("topology mismatch: {left} vs {right}")]
    TopologyMismatch { left: Topology, right: Topology },
}
