//! Point-in-time copies of the weights in an [`SNNPredictor`].

use itertools::Itertools;
use serde::Serialize;

use crate::predictor::snn::*;

/// A committed sparse segment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct SparseWeight {
    pub valid: bool,
    pub ptr: usize,
    pub weight: i32,
}

/// The learned state of a single [`Neuron`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct NeuronWeights {
    pub index: usize,
    pub dense: Vec<i32>,
    pub bias: i32,
    pub theta: i32,
    pub active_start: usize,
    pub active: Vec<i32>,
    pub sparse: Vec<SparseWeight>,
}
impl NeuronWeights {
    pub fn new(index: usize, n: &Neuron) -> Self {
        Self {
            index,
            dense: n.dense_weights().collect(),
            bias: n.bias(),
            theta: n.theta(),
            active_start: n.active_start(),
            active: n.active_weights().collect(),
            sparse: n.sparse_segs().iter().map(|s| SparseWeight {
                valid: s.valid,
                ptr: s.ptr,
                weight: s.weight.read(),
            }).collect(),
        }
    }
}

/// The learned state of every neuron in a table.
///
/// The [`Display`](std::fmt::Display) implementation prints one CSV row per
/// neuron: the table index, then each dense weight, then the bias.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct WeightSnapshot {
    pub neurons: Vec<NeuronWeights>,
}

impl std::fmt::Display for WeightSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        for n in self.neurons.iter() {
            let weights = n.dense.iter().chain(std::iter::once(&n.bias))
                .join(",");
            writeln!(f, "{},{}", n.index, weights)?;
        }
        Ok(())
    }
}
