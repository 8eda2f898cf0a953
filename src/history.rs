
use bitvec::prelude::*;

/// A fixed-length register of branch outcomes.
///
/// Bit 0 is the most recent outcome. Shifting a new outcome in moves every
/// bit one position older and discards the oldest bit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HistoryRegister {
    data: BitVec<usize, Lsb0>,
}

// NOTE: This *reverses* the all of the bits and presents them in a format
// where the leftmost bit is the oldest (index n) and the rightmost bit is
// the most recent (index 0).
impl std::fmt::Display for HistoryRegister {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let x: String = self.data.as_bitslice().iter().by_vals()
            .map(|b| if b { '1' } else { '0' })
            .rev()
            .collect();
        write!(f, "{}", x)
    }
}

impl HistoryRegister {
    /// Create a register with the specified length in bits.
    /// All bits in the register are initialized to zero.
    pub fn new(len: usize) -> Self {
        Self { data: bitvec![usize, Lsb0; 0; len] }
    }

    pub fn len(&self) -> usize { self.data.len() }
    pub fn is_empty(&self) -> bool { self.data.is_empty() }
}

impl HistoryRegister {
    /// Shift the register by one bit and record 'bit' as the most recent
    /// outcome.
    pub fn shift_in(&mut self, bit: bool) {
        if self.data.is_empty() {
            return;
        }
        self.data.shift_end(1);
        self.data.set(0, bit);
    }

    /// Read the bit at position 'idx' (0 is the most recent).
    pub fn bit(&self, idx: usize) -> bool {
        self.data[idx]
    }

    /// Clear the most recent bit.
    pub fn clear_newest(&mut self) {
        if !self.data.is_empty() {
            self.data.set(0, false);
        }
    }

    /// Take a copy of the current state.
    pub fn snapshot(&self) -> Self {
        self.clone()
    }

    /// Take a copy of the current state with one more bit shifted in.
    pub fn shifted_snapshot(&self, bit: bool) -> Self {
        let mut res = self.clone();
        res.shift_in(bit);
        res
    }

    /// Overwrite the current state with some snapshot.
    pub fn restore_from(&mut self, snapshot: &Self) {
        debug_assert_eq!(self.len(), snapshot.len());
        self.data.clone_from(&snapshot.data);
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn shift_in_ages_bits() {
        let mut h = HistoryRegister::new(4);
        h.shift_in(true);
        h.shift_in(false);
        h.shift_in(true);
        assert!(h.bit(0));
        assert!(!h.bit(1));
        assert!(h.bit(2));
        assert!(!h.bit(3));
        assert_eq!(h.to_string(), "0101");

        // The oldest bit falls off the end
        h.shift_in(false);
        h.shift_in(false);
        assert_eq!(h.to_string(), "0100");
        assert_eq!(h.len(), 4);
    }

    #[test]
    fn snapshot_restore() {
        let mut h = HistoryRegister::new(8);
        h.shift_in(true);
        let snap = h.snapshot();
        h.shift_in(true);
        h.shift_in(true);
        h.restore_from(&snap);
        assert_eq!(h, snap);

        let shifted = snap.shifted_snapshot(false);
        assert_eq!(shifted.to_string(), "00000010");
    }

    #[test]
    fn clear_newest_only_touches_bit_zero() {
        let mut h = HistoryRegister::new(3);
        h.shift_in(true);
        h.shift_in(true);
        h.clear_newest();
        assert_eq!(h.to_string(), "010");
    }
}
