use std::{fmt, ops::Range};

use serde::{Deserialize, Serialize};

use crate::ShapeError;

/// Layer sizes of a feedforward network, from the input layer to the output layer.
///
/// A topology always has at least two layers and no empty layer. It is fixed for the
/// lifetime of every network built from it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<usize>", into = "Vec<usize>")]
pub struct Topology {
    layers: Vec<usize>,
}

/// Shape and position of one weight matrix inside the flat weight tensor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    /// Index of the source layer.
    pub index: usize,
    /// Neurons in the destination layer (matrix rows).
    pub rows: usize,
    /// Neurons in the source layer (matrix columns).
    pub cols: usize,
    /// Range of this matrix in the flat, canonically ordered weight vector.
    pub range: Range<usize>,
}

impl Topology {
    /// Validates and wraps the given layer sizes.
    pub fn new(layers: Vec<usize>) -> Result<Self, ShapeError> {
        if layers.len() < 2 {
            return Err(ShapeError::TooFewLayers {
                layers: layers.len(),
            });
        }
        if let Some(index) = layers.iter().position(|&size| size == 0) {
            return Err(ShapeError::EmptyLayer { index });
        }
        Ok(Self { layers })
    }

    /// The 3-7-2 layout driving the car: three distance sensors in, acceleration and
    /// steering out.
    #[must_use]
    pub fn reference() -> Self {
        Self {
            layers: vec![3, 7, 2],
        }
    }

    #[must_use]
    pub fn layers(&self) -> &[usize] {
        &self.layers
    }

    #[must_use]
    pub fn input_size(&self) -> usize {
        self.layers[0]
    }

    #[must_use]
    pub fn output_size(&self) -> usize {
        self.layers[self.layers.len() - 1]
    }

    /// Number of weight matrices (`layers - 1`).
    #[must_use]
    pub fn transition_count(&self) -> usize {
        self.layers.len() - 1
    }

    /// Total number of weights over all transitions.
    #[must_use]
    pub fn weight_count(&self) -> usize {
        self.layers.windows(2).map(|w| w[0] * w[1]).sum()
    }

    /// Iterates the weight matrices in canonical order.
    pub fn transitions(&self) -> impl Iterator<Item = Transition> + '_ {
        let mut offset = 0;
        self.layers.windows(2).enumerate().map(move |(index, w)| {
            let (cols, rows) = (w[0], w[1]);
            let start = offset;
            offset += rows * cols;
            Transition {
                index,
                rows,
                cols,
                range: start..offset,
            }
        })
    }
}

impl TryFrom<Vec<usize>> for Topology {
    type Error = ShapeError;

    fn try_from(layers: Vec<usize>) -> Result<Self, Self::Error> {
        Self::new(layers)
    }
}

impl From<Topology> for Vec<usize> {
    fn from(topology: Topology) -> Self {
        topology.layers
    }
}

impl fmt::Display for Topology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, size) in self.layers.iter().enumerate() {
            if i > 0 {
                f.write_str("-")?;
            }
            write!(f, "{size}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_single_layer() {
        assert_eq!(
            Topology::new(vec![4]),
            Err(ShapeError::TooFewLayers { layers: 1 })
        );
        assert_eq!(
            Topology::new(vec![]),
            Err(ShapeError::TooFewLayers { layers: 0 })
        );
    }

    #[test]
    fn test_rejects_empty_layer() {
        assert_eq!(
            Topology::new(vec![3, 0, 2]),
            Err(ShapeError::EmptyLayer { index: 1 })
        );
    }

    #[test]
    fn test_reference_weight_count() {
        let topology = Topology::reference();
        assert_eq!(topology.input_size(), 3);
        assert_eq!(topology.output_size(), 2);
        assert_eq!(topology.transition_count(), 2);
        assert_eq!(topology.weight_count(), 3 * 7 + 7 * 2);
    }

    #[test]
    fn test_transitions_are_contiguous() {
        let topology = Topology::new(vec![2, 4, 3, 1]).unwrap();
        let transitions = topology.transitions().collect::<Vec<_>>();
        assert_eq!(transitions.len(), 3);
        assert_eq!(transitions[0].range, 0..8);
        assert_eq!((transitions[1].rows, transitions[1].cols), (3, 4));
        assert_eq!(transitions[1].range, 8..20);
        assert_eq!(transitions[2].range, 20..23);
        assert_eq!(transitions[2].range.end, topology.weight_count());
    }

    #[test]
    fn test_serde_validates() {
        let topology: Topology = serde_json::from_str("[3, 7, 2]").unwrap();
        assert_eq!(topology, Topology::reference());
        assert_eq!(serde_json::to_string(&topology).unwrap(), "[3,7,2]");
        assert!(serde_json::from_str::<Topology>("[3]").is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(Topology::reference().to_string(), "3-7-2");
    }
}
