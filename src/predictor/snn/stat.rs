
/// Container for [`SNNPredictor`] runtime stats.
///
/// [`SNNPredictor`]: crate::predictor::snn::SNNPredictor
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SNNStats {
    /// Conditional predictions
    pub lookups: usize,

    /// Unconditional control transfers
    pub uncond: usize,

    /// Resolved predictions (not including squashed updates)
    pub updates: usize,

    /// Resolved predictions that were correct
    pub hits: usize,

    /// History repairs [from squashed updates or explicit repairs]
    pub repairs: usize,

    /// Squashed predictions
    pub squashes: usize,

    /// Updates skipped by the confidence threshold
    pub skipped: usize,

    /// Sparse segments validated for the first time
    pub promotions: usize,

    /// Probes which confirmed the bit already tracked by a segment
    pub confirmations: usize,

    /// Probes which moved a segment to a different bit
    pub replacements: usize,

    /// BTB miss notifications
    pub btb_updates: usize,
}
impl SNNStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fraction of resolved conditional predictions that were correct.
    pub fn hit_rate(&self) -> f64 {
        if self.updates == 0 {
            return 0.0;
        }
        self.hits as f64 / self.updates as f64
    }
}
