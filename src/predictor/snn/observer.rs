//! Hooks for watching an [`SNNPredictor`] as it runs.
//!
//! Observers are purely diagnostic. They only see shared references and
//! cannot affect a prediction or the outcome of training.

use std::cell::RefCell;
use std::rc::Rc;
use tracing::{debug, trace};

use crate::history::*;
use crate::predictor::snn::*;
use crate::Outcome;

/// Emitted after a neuron makes a prediction.
#[derive(Debug)]
pub struct PredictEvent<'a> {
    pub id: PredictionId,
    pub pc: usize,
    pub index: usize,
    /// Perceptron output
    pub sum: i32,
    pub predicted: Outcome,
    pub global_history: &'a HistoryRegister,
    pub local_history: &'a HistoryRegister,
}

/// Emitted after a neuron is trained with a resolved outcome.
#[derive(Clone, Copy, Debug)]
pub struct FitEvent {
    pub id: PredictionId,
    pub pc: usize,
    pub index: usize,
    pub predicted: Outcome,
    pub outcome: Outcome,
    /// Perceptron output at prediction time
    pub old_sum: i32,
    /// Perceptron output for the same history after training
    pub new_sum: i32,
    pub theta: i32,
    pub result: FitOutcome,
}

/// Interface for receiving events from an [`SNNPredictor`].
pub trait SNNObserver {
    fn on_predict(&mut self, _event: &PredictEvent<'_>) {}
    fn on_fit(&mut self, _event: &FitEvent) {}
}

/// Logs predictor events with [`tracing`].
///
/// Events for the probed table entry are logged at `DEBUG`, everything else
/// at `TRACE`.
#[derive(Clone, Copy, Debug, Default)]
pub struct ProbeObserver {
    probe: Option<usize>,
}
impl ProbeObserver {
    pub fn new(probe: Option<usize>) -> Self {
        Self { probe }
    }

    fn is_probed(&self, index: usize) -> bool {
        self.probe == Some(index)
    }
}

impl SNNObserver for ProbeObserver {
    fn on_predict(&mut self, e: &PredictEvent<'_>) {
        if self.is_probed(e.index) {
            debug!(id = %e.id, pc = format_args!("{:#x}", e.pc),
                local = %e.local_history, global = %e.global_history,
                sum = e.sum, "predict");
        } else {
            trace!(id = %e.id, index = e.index, sum = e.sum, "predict");
        }
    }

    fn on_fit(&mut self, e: &FitEvent) {
        if self.is_probed(e.index) {
            debug!(id = %e.id, pc = format_args!("{:#x}", e.pc),
                correct = e.predicted == e.outcome, old_sum = e.old_sum,
                new_sum = e.new_sum, theta = e.theta, result = ?e.result,
                "fit");
        } else {
            trace!(id = %e.id, index = e.index, result = ?e.result, "fit");
        }
    }
}

impl<T: SNNObserver> SNNObserver for Rc<RefCell<T>> {
    fn on_predict(&mut self, event: &PredictEvent<'_>) {
        self.borrow_mut().on_predict(event);
    }
    fn on_fit(&mut self, event: &FitEvent) {
        self.borrow_mut().on_fit(event);
    }
}
