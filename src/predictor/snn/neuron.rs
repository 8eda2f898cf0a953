//! A single entry in an [`SNNPredictor`].

use crate::branch::sign;
use crate::history::*;
use crate::predictor::counter::*;
use crate::predictor::snn::*;
use crate::Outcome;

/// A committed sparse history feature: a single global history bit (found
/// by probing one segment) and its weight.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SparseSegment {
    /// Only valid segments contribute to a prediction
    pub valid: bool,

    /// Index of the tracked bit in global history
    pub ptr: usize,

    pub weight: SignedSaturatingCounter,
}

/// The action taken on a sparse segment at the end of a probe.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Rotation {
    /// A previously unused segment became valid
    Promoted { slot: usize, ptr: usize },

    /// The segment already tracked the strongest bit
    Confirmed { slot: usize, ptr: usize },

    /// The segment switched to a different bit and was retrained
    Replaced { slot: usize, old_ptr: usize, new_ptr: usize },
}

/// Result of [`Neuron::fit`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FitOutcome {
    /// The prediction was correct and confident, nothing was trained
    Skipped,

    /// Weights were trained. Carries the action taken if the active window
    /// rotated during this update.
    Trained(Option<Rotation>),
}

/// A perceptron over recent ("dense") global history, plus a set of single
/// bits selected from older ("sparse") segments of global history.
///
/// Sparse bits are chosen by an attention scan: one segment at a time is
/// trained in full (the "active" window) for `active_term` updates. At the
/// end of the term, the bit with the strongest weight in the window is
/// committed to the sparse slot that owns the segment, and the window moves
/// on to the next segment.
#[derive(Clone, Debug)]
pub struct Neuron {
    dense_len: usize,
    seg_len: usize,
    n_segs: usize,
    active_term: usize,

    /// Local history for this entry.
    ///
    /// NOTE: This is saved and restored around speculation, but it isn't
    /// used as an input to the perceptron.
    pub local_history: HistoryRegister,

    /// Weights for dense history; the last entry is the bias
    dense_weights: Vec<SignedSaturatingCounter>,

    /// Index of the first global history bit in the active window
    active_start: usize,
    active_weights: Vec<SignedSaturatingCounter>,
    active_time: usize,

    sparse_segs: Vec<SparseSegment>,

    /// Training threshold
    theta: i32,
}

impl Neuron {
    pub fn new(cfg: &SNNConfig) -> Self {
        let ctr = SignedSaturatingCounter::new(cfg.ctr_bits);
        let seg = SparseSegment { valid: false, ptr: 0, weight: ctr };
        Self {
            dense_len: cfg.dense_history_len,
            seg_len: cfg.sparse_seg_len,
            n_segs: cfg.sparse_n_segs,
            active_term: cfg.active_term,
            local_history: HistoryRegister::new(cfg.local_history_len),
            dense_weights: vec![ctr; cfg.dense_history_len + 1],
            active_start: cfg.dense_history_len,
            active_weights: vec![ctr; cfg.sparse_seg_len],
            active_time: 0,
            sparse_segs: vec![seg; cfg.sparse_n_segs],
            theta: cfg.initial_theta(),
        }
    }

    pub fn theta(&self) -> i32 { self.theta }
    pub fn active_start(&self) -> usize { self.active_start }
    pub fn active_time(&self) -> usize { self.active_time }
    pub fn sparse_segs(&self) -> &[SparseSegment] { &self.sparse_segs }

    pub fn bias(&self) -> i32 {
        self.bias_ctr().read()
    }

    /// Weights for dense history, not including the bias.
    pub fn dense_weights(&self) -> impl Iterator<Item = i32> + '_ {
        self.dense_weights[..self.dense_len].iter().map(|w| w.read())
    }

    pub fn active_weights(&self) -> impl Iterator<Item = i32> + '_ {
        self.active_weights.iter().map(|w| w.read())
    }

    fn bias_ctr(&self) -> &SignedSaturatingCounter {
        &self.dense_weights[self.dense_len]
    }

    /// Index of the sparse slot that owns the active window.
    fn active_slot(&self) -> usize {
        (self.active_start - self.dense_len) / self.seg_len
    }

    /// Convert the output of [`Neuron::predict`] into an outcome.
    pub fn outcome_of(sum: i32) -> Outcome {
        if sum >= 0 { Outcome::T } else { Outcome::N }
    }
}

impl Neuron {
    /// Compute the perceptron output for some global history.
    /// The predicted outcome is determined by the sign of the output.
    pub fn predict(&self, ghr: &HistoryRegister) -> i32 {
        let mut sum = self.bias_ctr().read();

        for (i, w) in self.dense_weights[..self.dense_len].iter().enumerate() {
            sum += sign(ghr.bit(i)) * w.read();
        }
        for (i, w) in self.active_weights.iter().enumerate() {
            sum += sign(ghr.bit(self.active_start + i)) * w.read();
        }
        for seg in self.sparse_segs.iter().filter(|s| s.valid) {
            sum += sign(ghr.bit(seg.ptr)) * seg.weight.read();
        }
        sum
    }

    /// Train with the resolved outcome of some prediction.
    ///
    /// Inputs are taken from the global history captured in the record
    /// (the state *before* the predicted outcome was shifted in).
    pub fn fit(&mut self, record: &PredictionRecord, outcome: Outcome)
        -> FitOutcome
    {
        // Training occurs after a misprediction, or when the magnitude of
        // the output is not above the threshold.
        let hit = record.predicted() == outcome;
        if hit && record.raw_sum().abs() > self.theta {
            return FitOutcome::Skipped;
        }

        let ghr = record.global_history();
        let t = outcome.sign();

        match outcome {
            Outcome::T => self.dense_weights[self.dense_len].increment(),
            Outcome::N => self.dense_weights[self.dense_len].decrement(),
        }
        for i in 0..self.dense_len {
            self.dense_weights[i].add(t * sign(ghr.bit(i)));
        }
        for seg in self.sparse_segs.iter_mut().filter(|s| s.valid) {
            seg.weight.add(t * sign(ghr.bit(seg.ptr)));
        }
        for (i, w) in self.active_weights.iter_mut().enumerate() {
            w.add(t * sign(ghr.bit(self.active_start + i)));
        }

        self.active_time += 1;
        if self.active_time >= self.active_term {
            FitOutcome::Trained(Some(self.rotate()))
        } else {
            FitOutcome::Trained(None)
        }
    }

    /// Commit the strongest bit in the active window to its sparse slot,
    /// then move the window to the next segment.
    fn rotate(&mut self) -> Rotation {
        // The first occurrence wins a tie
        let (max_index, _) = self.active_weights.iter().enumerate()
            .fold((0, -1), |(best, max), (i, w)| {
                let mag = w.read().abs();
                if mag > max { (i, mag) } else { (best, max) }
            });
        let max_weight = self.active_weights[max_index].read();
        let new_ptr = self.active_start + max_index;

        let slot = self.active_slot();
        let seg = &mut self.sparse_segs[slot];
        let res = if !seg.valid {
            seg.valid = true;
            seg.ptr = new_ptr;
            seg.weight.add(max_weight);
            self.theta += 2;
            Rotation::Promoted { slot, ptr: new_ptr }
        } else if seg.ptr == new_ptr {
            Rotation::Confirmed { slot, ptr: new_ptr }
        } else {
            let old_ptr = seg.ptr;
            seg.ptr = new_ptr;
            seg.weight.reset();
            seg.weight.add(max_weight);
            Rotation::Replaced { slot, old_ptr, new_ptr }
        };

        self.active_time = 0;
        for w in self.active_weights.iter_mut() {
            w.reset();
        }
        if slot + 1 == self.n_segs {
            self.active_start = self.dense_len;
        } else {
            self.active_start += self.seg_len;
        }
        res
    }
}
