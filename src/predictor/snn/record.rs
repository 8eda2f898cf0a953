//! Speculative state carried between a prediction and its resolution.

use crate::history::*;
use crate::Outcome;

/// Diagnostic identifier assigned to each prediction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PredictionId(pub u64);

impl std::fmt::Display for PredictionId {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Identifies where a prediction came from.
#[derive(Debug, PartialEq, Eq)]
pub enum RecordSource {
    /// Predicted by the neuron at 'index'. Carries a copy of its local
    /// history at prediction time.
    Entry { index: usize, local_history: HistoryRegister },

    /// An unconditional control transfer. There is no neuron to train.
    Unconditional,
}

/// The state needed to train or undo a single prediction.
///
/// A record is created by [`SNNPredictor::lookup`] or
/// [`SNNPredictor::uncond_branch`] and must be handed back exactly once, to
/// either [`SNNPredictor::update`] or [`SNNPredictor::squash`]. Both take the
/// record by value, so it cannot be consumed twice.
///
/// Dropping a record without handing it back is a protocol error: the
/// speculative global history it describes is never corrected.
///
/// [`SNNPredictor::lookup`]: crate::predictor::snn::SNNPredictor::lookup
/// [`SNNPredictor::uncond_branch`]: crate::predictor::snn::SNNPredictor::uncond_branch
/// [`SNNPredictor::update`]: crate::predictor::snn::SNNPredictor::update
/// [`SNNPredictor::squash`]: crate::predictor::snn::SNNPredictor::squash
#[derive(Debug)]
#[must_use = "a prediction record must be passed to update() or squash()"]
pub struct PredictionRecord {
    global_history: HistoryRegister,
    source: RecordSource,
    predicted: Outcome,
    id: PredictionId,
    raw_sum: i32,
}

impl PredictionRecord {
    pub(crate) fn new(
        global_history: HistoryRegister,
        source: RecordSource,
        predicted: Outcome,
        raw_sum: i32,
        id: PredictionId,
    ) -> Self
    {
        Self { global_history, source, predicted, id, raw_sum }
    }

    /// Global history at the time of the prediction.
    pub fn global_history(&self) -> &HistoryRegister { &self.global_history }

    pub fn source(&self) -> &RecordSource { &self.source }

    pub fn predicted(&self) -> Outcome { self.predicted }

    pub fn id(&self) -> PredictionId { self.id }

    /// The perceptron output behind this prediction.
    pub fn raw_sum(&self) -> i32 { self.raw_sum }

    /// The index of the neuron that made this prediction, if any.
    pub fn table_index(&self) -> Option<usize> {
        match self.source {
            RecordSource::Entry { index, .. } => Some(index),
            RecordSource::Unconditional => None,
        }
    }
}
