//! Helpers for collecting statistics.

use std::collections::*;
use crate::branch::*;
use bitvec::prelude::*;
use itertools::*;

/// Container for recording simple statistics while evaluating some model.
#[derive(Default)]
pub struct BranchStats {
    /// Per-branch statistics (indexed by program counter value).
    pub data: BTreeMap<usize, BranchData>,

    /// Number of correct predictions
    pub global_hits: usize,

    /// Number of times any branch instruction was executed
    pub global_brns: usize,
}
impl BranchStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the global hit rate.
    pub fn hit_rate(&self) -> f64 {
        if self.global_brns == 0 {
            return 0.0;
        }
        self.global_hits as f64 / self.global_brns as f64
    }

    /// Return the global hit count.
    pub fn global_hits(&self) -> usize { self.global_hits }

    /// Return the global miss count.
    pub fn global_miss(&self) -> usize { self.global_brns - self.global_hits }

    /// Return the total branch count.
    pub fn global_brns(&self) -> usize { self.global_brns }

    /// Update global and per-branch statistics with some prediction.
    pub fn update(&mut self, record: &BranchRecord, predicted: Outcome) {
        let outcome = record.outcome();
        let hit = outcome == predicted;
        self.global_brns += 1;
        if hit { self.global_hits += 1; }

        let data = self.get_mut(record.pc);
        data.occ += 1;
        data.pat.push(outcome.into());
        if hit { data.hits += 1; }
    }

    /// Returns a reference to data collected for a particular branch.
    pub fn get(&self, pc: usize) -> Option<&BranchData> {
        self.data.get(&pc)
    }

    /// Returns a mutable reference to data collected for a particular branch.
    /// Creates a new entry if one doesn't already exist.
    pub fn get_mut(&mut self, pc: usize) -> &mut BranchData {
        self.data.entry(pc).or_default()
    }

    /// Returns the number of unique observed branch instructions.
    pub fn num_unique_branches(&self) -> usize {
        self.data.len()
    }

    /// Returns the 'n' most frequently executed branches.
    pub fn get_common_branches(&self, n: usize) -> Vec<(usize, &BranchData)> {
        self.data.iter()
            .sorted_by_key(|(_, s)| s.occ)
            .rev()
            .take(n)
            .map(|(pc, s)| (*pc, s))
            .collect()
    }

    /// Returns up to 'n' of the most frequently executed branches whose hit
    /// rate is no better than a coin flip.
    pub fn get_low_rate_branches(&self, n: usize)
        -> Vec<(usize, &BranchData)>
    {
        self.data.iter()
            .filter(|(_, s)| s.occ > 100 && s.hit_rate() <= 0.55)
            .sorted_by_key(|(_, s)| s.occ)
            .rev()
            .take(n)
            .map(|(pc, s)| (*pc, s))
            .collect()
    }
}

/// Container for per-branch statistics.
#[derive(Default)]
pub struct BranchData {
    /// Number of times this branch was encountered.
    pub occ: usize,

    /// Number of correct predictions for this branch.
    pub hits: usize,

    /// Record of all observed outcomes for this branch.
    pub pat: BitVec,
}
impl BranchData {
    /// Return the hit rate for this branch.
    pub fn hit_rate(&self) -> f64 {
        self.hits as f64 / self.occ as f64
    }

    pub fn times_taken(&self) -> usize {
        self.pat.count_ones()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn counts_hits_per_branch() {
        let mut s = BranchStats::new();
        let a = BranchRecord::new(0x10, 0x40, BranchKind::DirectBranch,
            Outcome::T);
        let b = BranchRecord::new(0x20, 0x40, BranchKind::DirectBranch,
            Outcome::N);
        s.update(&a, Outcome::T);
        s.update(&a, Outcome::N);
        s.update(&b, Outcome::N);

        assert_eq!(s.global_brns(), 3);
        assert_eq!(s.global_hits(), 2);
        assert_eq!(s.global_miss(), 1);
        assert_eq!(s.num_unique_branches(), 2);
        assert_eq!(s.get(0x10).unwrap().hits, 1);
        assert_eq!(s.get(0x10).unwrap().times_taken(), 2);
        assert_eq!(s.get_common_branches(1)[0].0, 0x10);
    }

    #[test]
    fn low_rate_branches_need_samples() {
        let mut s = BranchStats::new();
        let a = BranchRecord::new(0x10, 0x40, BranchKind::DirectBranch,
            Outcome::T);
        for i in 0..200 {
            s.update(&a, Outcome::from_bool(i % 2 == 0));
        }
        let b = BranchRecord::new(0x20, 0x40, BranchKind::DirectBranch,
            Outcome::T);
        s.update(&b, Outcome::N);

        let low = s.get_low_rate_branches(4);
        assert_eq!(low.len(), 1);
        assert_eq!(low[0].0, 0x10);
    }
}
