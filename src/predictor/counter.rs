//! Implementation of a signed saturating counter.

/// An N-bit signed saturating counter used as a perceptron weight.
///
/// The value always lies in `[-2^(N-1), 2^(N-1) - 1]`. Operations that
/// would leave this range clamp at the nearest bound instead of wrapping.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SignedSaturatingCounter {
    bits: u32,
    min: i32,
    max: i32,
    val: i32,
}
impl SignedSaturatingCounter {
    /// Create a new counter with the given width, initialized to zero.
    ///
    /// Widths are expected to be in `1..=31` (see [`SNNConfig::validate`]).
    ///
    /// [`SNNConfig::validate`]: crate::predictor::snn::SNNConfig::validate
    pub fn new(bits: u32) -> Self {
        debug_assert!((1..=31).contains(&bits));
        let half = 1i64 << (bits - 1);
        Self {
            bits,
            min: -half as i32,
            max: (half - 1) as i32,
            val: 0,
        }
    }

    /// Number of storage bits.
    pub fn bits(&self) -> u32 { self.bits }

    /// The lowest representable value.
    pub fn min(&self) -> i32 { self.min }

    /// The highest representable value.
    pub fn max(&self) -> i32 { self.max }

    /// Return the current value.
    pub fn read(&self) -> i32 { self.val }

    pub fn increment(&mut self) {
        self.add(1);
    }

    pub fn decrement(&mut self) {
        self.add(-1);
    }

    /// Add some signed value, clamping the result.
    pub fn add(&mut self, delta: i32) {
        let sum = self.val as i64 + delta as i64;
        self.val = sum.clamp(self.min as i64, self.max as i64) as i32;
    }

    /// Reset the counter to zero.
    pub fn reset(&mut self) {
        self.val = 0;
    }
}
