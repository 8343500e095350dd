use std::path::PathBuf;

use carvolve_network::{NeuralNetwork, Topology};
use serde::{Deserialize, Serialize};

/// Contents of a persisted network file, as printed by `inspect`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkReport {
    pub path: PathBuf,
    pub topology: Topology,
    /// Fitness stored on the first line of the file
    pub fitness: f32,
    pub weight_count: usize,
    /// One entry per layer transition, input side first
    pub transitions: Vec<TransitionReport>,
}

/// Weight statistics of the connections between two adjacent layers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransitionReport {
    pub from_neurons: usize,
    pub to_neurons: usize,
    pub min: f32,
    pub max: f32,
    pub mean: f32,
    pub mean_abs: f32,
}

impl NetworkReport {
    #[expect(clippy::cast_precision_loss)]
    pub fn new(path: PathBuf, network: &NeuralNetwork, fitness: f32) -> Self {
        let topology = network.topology().clone();
        let transitions = topology
            .transitions()
            .map(|t| {
                let weights = &network.weights()[t.range.clone()];
                let n = weights.len() as f32;
                TransitionReport {
                    from_neurons: t.cols,
                    to_neurons: t.rows,
                    min: weights.iter().copied().fold(f32::INFINITY, f32::min),
                    max: weights.iter().copied().fold(f32::NEG_INFINITY, f32::max),
                    mean: weights.iter().sum::<f32>() / n,
                    mean_abs: weights.iter().map(|w| w.abs()).sum::<f32>() / n,
                }
            })
            .collect();
        Self {
            path,
            weight_count: topology.weight_count(),
            topology,
            fitness,
            transitions,
        }
    }
}
