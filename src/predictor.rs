//! Branch predictor implementations.

pub mod table;
pub mod counter;
pub mod snn;

pub use table::*;
pub use counter::*;
pub use snn::*;

use crate::Outcome;

/// Interface to a predictor driven by a speculative pipeline.
///
/// A prediction made by [`SpeculativePredictor::lookup`] (or
/// [`SpeculativePredictor::uncond_branch`]) returns a token holding whatever
/// state is needed to undo the speculation. Each token must be handed back
/// exactly once, either to [`SpeculativePredictor::update`] or to
/// [`SpeculativePredictor::squash`].
pub trait SpeculativePredictor {
    /// Handle for a hardware thread.
    type Thread: Copy;

    /// Speculative state returned with each prediction.
    type Token;

    fn name(&self) -> &'static str;

    /// Predict the direction of the conditional branch at 'pc'.
    fn lookup(&mut self, tid: Self::Thread, pc: usize)
        -> (Outcome, Self::Token);

    /// Record an unconditional control transfer at 'pc'.
    fn uncond_branch(&mut self, tid: Self::Thread, pc: usize) -> Self::Token;

    /// Correct speculative history with the resolved outcome without
    /// consuming the token.
    fn repair(&mut self, tid: Self::Thread, outcome: Outcome,
        token: &Self::Token);

    /// Resolve a prediction. When 'squashed' is set, only history is
    /// corrected and no training occurs.
    fn update(&mut self, tid: Self::Thread, pc: usize, outcome: Outcome,
        token: Self::Token, squashed: bool);

    /// Discard a prediction, undoing its speculative history updates.
    fn squash(&mut self, tid: Self::Thread, token: Self::Token);

    /// Notify the predictor of a miss in the branch target buffer.
    fn btb_update(&mut self, tid: Self::Thread, pc: usize);
}
