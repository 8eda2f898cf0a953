//! Implementation of a perceptron predictor with sparse history attention.
//!
//! Each entry in the table is a [`Neuron`]: a perceptron over the most
//! recent global history bits, plus a handful of single bits selected from
//! much older global history. See [`Neuron`] for the selection policy.
//!
//! See the following papers:
//!
//! - "Dynamic Branch Prediction with Perceptrons" (Jiménez and Lin, 2001)
//! - "Neural Methods for Dynamic Branch Prediction" (Jiménez and Lin, 2002)

pub mod config;
pub mod neuron;
pub mod observer;
pub mod record;
pub mod snapshot;
pub mod stat;

pub use config::*;
pub use neuron::*;
pub use observer::*;
pub use record::*;
pub use snapshot::*;
pub use stat::*;

use tracing::info;

use crate::history::*;
use crate::predictor::*;
use crate::Outcome;

/// Handle for a hardware thread in an [`SNNPredictor`].
///
/// Handles are only created by [`SNNPredictor::thread`], so they always
/// refer to an existing thread of the predictor that created them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ThreadId(usize);
impl ThreadId {
    pub fn index(&self) -> usize { self.0 }
}

/// A table of [`Neuron`] indexed by the program counter, along with the
/// global history register for each hardware thread.
pub struct SNNPredictor {
    /// The configuration used to create this object
    cfg: SNNConfig,

    stat: SNNStats,

    table: Vec<Neuron>,

    /// Global history for each thread
    ghr: Vec<HistoryRegister>,

    next_id: u64,

    observer: Option<Box<dyn SNNObserver>>,
}

impl SNNPredictor {
    /// Create a predictor from a configuration that has already been
    /// validated (see [`SNNConfig::build`]).
    fn new(cfg: SNNConfig) -> Self {
        info!(
            table_size = cfg.table_size,
            dense = cfg.dense_history_len,
            segments = format_args!("{}x{}", cfg.sparse_n_segs,
                cfg.sparse_seg_len),
            storage_bits = cfg.storage_bits(),
            "building SNN predictor"
        );
        let proto = Neuron::new(&cfg);
        let ghr = vec![HistoryRegister::new(cfg.global_history_len());
            cfg.num_threads];
        Self {
            table: vec![proto; cfg.table_size],
            ghr,
            next_id: 0,
            observer: None,
            stat: SNNStats::new(),
            cfg,
        }
    }

    /// Map a program counter value onto a table index.
    ///
    /// Distinct branches may share an entry.
    pub fn compute_index(&self, pc: usize) -> usize {
        (pc >> 2) % self.table.len()
    }

    /// Get the handle for hardware thread 'n'.
    pub fn thread(&self, n: usize) -> Option<ThreadId> {
        (n < self.ghr.len()).then_some(ThreadId(n))
    }

    /// Handles for every hardware thread.
    pub fn threads(&self) -> impl Iterator<Item = ThreadId> {
        (0..self.ghr.len()).map(ThreadId)
    }

    /// The current [speculative] global history for a thread.
    pub fn global_history(&self, tid: ThreadId) -> &HistoryRegister {
        &self.ghr[tid.0]
    }

    pub fn config(&self) -> &SNNConfig { &self.cfg }

    pub fn stats(&self) -> &SNNStats { &self.stat }

    /// Install an observer, replacing any previous one.
    pub fn set_observer(&mut self, observer: Box<dyn SNNObserver>) {
        self.observer = Some(observer);
    }

    /// Remove the current observer.
    pub fn take_observer(&mut self) -> Option<Box<dyn SNNObserver>> {
        self.observer.take()
    }

    /// Copy the weights of every neuron in the table.
    pub fn snapshot_weights(&self) -> WeightSnapshot {
        let neurons = self.table.iter().enumerate()
            .map(|(idx, n)| NeuronWeights::new(idx, n))
            .collect();
        WeightSnapshot { neurons }
    }

    fn alloc_id(&mut self) -> PredictionId {
        let id = PredictionId(self.next_id);
        self.next_id += 1;
        id
    }
}

/// The public interface used by the pipeline.
impl SNNPredictor {
    /// Predict the direction of the conditional branch at 'pc'.
    ///
    /// The predicted outcome is shifted into the thread's global history
    /// right away. The returned record must be passed back to
    /// [`SNNPredictor::update`] or [`SNNPredictor::squash`].
    pub fn lookup(&mut self, tid: ThreadId, pc: usize)
        -> (Outcome, PredictionRecord)
    {
        let index = self.compute_index(pc);
        let id = self.alloc_id();

        let ghr = &self.ghr[tid.0];
        let entry = &self.table[index];
        let sum = entry.predict(ghr);
        let predicted = Neuron::outcome_of(sum);

        if let Some(obs) = self.observer.as_mut() {
            obs.on_predict(&PredictEvent {
                id, pc, index, sum, predicted,
                global_history: ghr,
                local_history: &entry.local_history,
            });
        }

        let source = RecordSource::Entry {
            index,
            local_history: entry.local_history.snapshot(),
        };
        let record = PredictionRecord::new(ghr.snapshot(), source,
            predicted, sum, id);

        self.ghr[tid.0].shift_in(predicted.into());
        self.stat.lookups += 1;
        (predicted, record)
    }

    /// Record an unconditional control transfer at 'pc'.
    ///
    /// This is always predicted taken. There's no neuron associated with the
    /// record, so resolving it never trains the table.
    pub fn uncond_branch(&mut self, tid: ThreadId, _pc: usize)
        -> PredictionRecord
    {
        let id = self.alloc_id();
        let sum = self.table[0].theta() + 1;
        let record = PredictionRecord::new(self.ghr[tid.0].snapshot(),
            RecordSource::Unconditional, Outcome::T, sum, id);
        self.ghr[tid.0].shift_in(true);
        self.stat.uncond += 1;
        record
    }

    /// Replace speculative history with the history at the time of the
    /// prediction, followed by the resolved outcome.
    ///
    /// The record is left intact so that it can be used for training later.
    pub fn repair(&mut self, tid: ThreadId, outcome: Outcome,
        record: &PredictionRecord)
    {
        let bit: bool = outcome.into();
        self.ghr[tid.0] = record.global_history().shifted_snapshot(bit);
        if let RecordSource::Entry { index, local_history } = record.source() {
            self.table[*index].local_history =
                local_history.shifted_snapshot(bit);
        }
        self.stat.repairs += 1;
    }

    /// Resolve a prediction.
    ///
    /// When 'squashed' is set, the outcome is being replayed after a flush:
    /// history is repaired (see [`SNNPredictor::repair`]) and nothing is
    /// trained. Otherwise the neuron that made the prediction is trained
    /// with the outcome.
    pub fn update(&mut self, tid: ThreadId, pc: usize, outcome: Outcome,
        record: PredictionRecord, squashed: bool)
    {
        if squashed {
            self.repair(tid, outcome, &record);
            return;
        }

        let index = match record.source() {
            RecordSource::Entry { index, .. } => *index,
            RecordSource::Unconditional => return,
        };
        debug_assert!(index < self.table.len());
        debug_assert_eq!(index, self.compute_index(pc));

        let entry = &mut self.table[index];
        let result = entry.fit(&record, outcome);

        self.stat.updates += 1;
        if record.predicted() == outcome {
            self.stat.hits += 1;
        }
        match result {
            FitOutcome::Skipped => self.stat.skipped += 1,
            FitOutcome::Trained(None) => {},
            FitOutcome::Trained(Some(rot)) => match rot {
                Rotation::Promoted { .. } => self.stat.promotions += 1,
                Rotation::Confirmed { .. } => self.stat.confirmations += 1,
                Rotation::Replaced { .. } => self.stat.replacements += 1,
            },
        }

        if let Some(obs) = self.observer.as_mut() {
            let new_sum = entry.predict(record.global_history());
            obs.on_fit(&FitEvent {
                id: record.id(),
                pc,
                index,
                predicted: record.predicted(),
                outcome,
                old_sum: record.raw_sum(),
                new_sum,
                theta: entry.theta(),
                result,
            });
        }
    }

    /// Discard a prediction, restoring history to its state at the time the
    /// prediction was made.
    pub fn squash(&mut self, tid: ThreadId, record: PredictionRecord) {
        self.ghr[tid.0].restore_from(record.global_history());
        if let RecordSource::Entry { index, local_history } = record.source() {
            self.table[*index].local_history.restore_from(local_history);
        }
        self.stat.squashes += 1;
    }

    /// Notify the predictor that the branch at 'pc' missed in the BTB.
    ///
    /// Clears the most recent bit of both the thread's global history and
    /// the local history of the entry for 'pc'.
    pub fn btb_update(&mut self, tid: ThreadId, pc: usize) {
        let index = self.compute_index(pc);
        self.ghr[tid.0].clear_newest();
        self.table[index].local_history.clear_newest();
        self.stat.btb_updates += 1;
    }
}

impl PredictorTable for SNNPredictor {
    type Input = usize;
    type Index = usize;
    type Entry = Neuron;

    fn size(&self) -> usize { self.table.len() }

    fn get_index(&self, pc: usize) -> usize {
        self.compute_index(pc)
    }

    fn get_entry(&self, idx: usize) -> &Neuron {
        &self.table[idx]
    }

    fn get_entry_mut(&mut self, idx: usize) -> &mut Neuron {
        &mut self.table[idx]
    }
}

impl SpeculativePredictor for SNNPredictor {
    type Thread = ThreadId;
    type Token = PredictionRecord;

    fn name(&self) -> &'static str { "SNN" }

    fn lookup(&mut self, tid: ThreadId, pc: usize)
        -> (Outcome, PredictionRecord)
    {
        SNNPredictor::lookup(self, tid, pc)
    }

    fn uncond_branch(&mut self, tid: ThreadId, pc: usize) -> PredictionRecord {
        SNNPredictor::uncond_branch(self, tid, pc)
    }

    fn repair(&mut self, tid: ThreadId, outcome: Outcome,
        token: &PredictionRecord)
    {
        SNNPredictor::repair(self, tid, outcome, token)
    }

    fn update(&mut self, tid: ThreadId, pc: usize, outcome: Outcome,
        token: PredictionRecord, squashed: bool)
    {
        SNNPredictor::update(self, tid, pc, outcome, token, squashed)
    }

    fn squash(&mut self, tid: ThreadId, token: PredictionRecord) {
        SNNPredictor::squash(self, tid, token)
    }

    fn btb_update(&mut self, tid: ThreadId, pc: usize) {
        SNNPredictor::btb_update(self, tid, pc)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn small() -> SNNPredictor {
        SNNConfig {
            table_size: 4,
            dense_history_len: 2,
            sparse_seg_len: 2,
            sparse_n_segs: 1,
            local_history_len: 4,
            ctr_bits: 3,
            active_term: 1,
            num_threads: 2,
            probe_index: None,
        }.build().unwrap()
    }

    #[test]
    fn thread_handles_are_bounded() {
        let snn = small();
        assert!(snn.thread(1).is_some());
        assert!(snn.thread(2).is_none());
        assert_eq!(snn.threads().count(), 2);
        assert_eq!(snn.config().num_threads, 2);
    }

    #[test]
    fn lookup_speculates_on_one_thread_only() {
        let mut snn = small();
        let t0 = snn.thread(0).unwrap();
        let t1 = snn.thread(1).unwrap();

        // All weights are zero, so the first prediction is 'taken'
        let (p, record) = snn.lookup(t0, 0x1000);
        assert_eq!(p, Outcome::T);
        assert_eq!(record.raw_sum(), 0);
        assert_eq!(record.table_index(), Some(snn.compute_index(0x1000)));
        assert_eq!(snn.global_history(t0).to_string(), "0001");
        assert_eq!(snn.global_history(t1).to_string(), "0000");
        snn.update(t0, 0x1000, Outcome::T, record, false);
    }

    #[test]
    fn unconditional_records_do_not_train() {
        let mut snn = small();
        let t0 = snn.thread(0).unwrap();
        let record = snn.uncond_branch(t0, 0x40);
        assert_eq!(record.table_index(), None);
        assert_eq!(record.predicted(), Outcome::T);
        assert_eq!(record.raw_sum(), snn.get_entry(0).theta() + 1);
        assert_eq!(snn.global_history(t0).to_string(), "0001");

        let before = snn.snapshot_weights();
        snn.update(t0, 0x40, Outcome::T, record, false);
        assert_eq!(snn.snapshot_weights(), before);
        assert_eq!(snn.stats().updates, 0);
    }

    #[test]
    fn btb_update_clears_newest_bits() {
        let mut snn = small();
        let t0 = snn.thread(0).unwrap();
        let idx = snn.compute_index(0x10);
        snn.get_entry_mut(idx).local_history.shift_in(true);
        let record = snn.uncond_branch(t0, 0x20);
        snn.update(t0, 0x20, Outcome::T, record, false);
        assert!(snn.global_history(t0).bit(0));

        snn.btb_update(t0, 0x10);
        assert!(!snn.global_history(t0).bit(0));
        assert!(!snn.get_entry(idx).local_history.bit(0));
    }

    #[test]
    fn snapshot_csv_rows() {
        let mut snn = small();
        let t0 = snn.thread(0).unwrap();
        let (_, record) = snn.lookup(t0, 0x4);
        snn.update(t0, 0x4, Outcome::T, record, false);

        let text = snn.snapshot_weights().to_string();
        let rows: Vec<&str> = text.lines().collect();
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[0], "0,0,0,0");
        assert_eq!(rows[1], "1,-1,-1,1");
    }
}
