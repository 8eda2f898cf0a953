
use serde::Deserialize;
use thiserror::Error;

use crate::predictor::snn::*;

/// Coefficients for the initial training threshold.
/// Papers suggest this constant (based on the history size).
const THETA_COEFF: f64 = 1.93;
const THETA_BIAS: f64 = 14.0;

/// Reasons for rejecting an [`SNNConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("table size must be non-zero")]
    EmptyTable,

    #[error("sparse segment length must be non-zero")]
    EmptySegment,

    #[error("sparse segment count must be non-zero")]
    NoSegments,

    #[error("local history length must be non-zero")]
    EmptyLocalHistory,

    #[error("active term must be non-zero")]
    ZeroActiveTerm,

    #[error("thread count must be non-zero")]
    NoThreads,

    #[error("counter width must be in 1..=31 bits, got {0}")]
    CounterBits(u32),

    #[error("probe index {index} is outside a table of {size} entries")]
    ProbeOutOfRange { index: usize, size: usize },

    #[error("invalid JSON configuration: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration for an [`SNNPredictor`].
///
/// Every neuron in the table and every global history register is built
/// from the same configuration, so the history geometry is shared.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SNNConfig {
    /// Number of neurons in the table
    pub table_size: usize,

    /// Number of recent global history bits that are always weighted
    pub dense_history_len: usize,

    /// Length of each sparse segment [in bits]
    pub sparse_seg_len: usize,

    /// Number of sparse segments following the dense history
    pub sparse_n_segs: usize,

    /// Length of the per-neuron local history register
    pub local_history_len: usize,

    /// Width of each weight counter
    pub ctr_bits: u32,

    /// Number of training events spent probing each segment
    pub active_term: usize,

    /// Number of hardware threads
    pub num_threads: usize,

    /// Table entry singled out for verbose tracing
    pub probe_index: Option<usize>,
}

impl Default for SNNConfig {
    fn default() -> Self {
        Self {
            table_size: 1024,
            dense_history_len: 16,
            sparse_seg_len: 8,
            sparse_n_segs: 8,
            local_history_len: 16,
            ctr_bits: 8,
            active_term: 64,
            num_threads: 1,
            probe_index: None,
        }
    }
}

impl SNNConfig {
    /// Parse a configuration from JSON. Missing fields take their default
    /// values.
    pub fn from_json(s: &str) -> Result<Self, ConfigError> {
        let cfg: Self = serde_json::from_str(s)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Check that this configuration describes a buildable predictor.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.table_size == 0 {
            return Err(ConfigError::EmptyTable);
        }
        if self.sparse_seg_len == 0 {
            return Err(ConfigError::EmptySegment);
        }
        if self.sparse_n_segs == 0 {
            return Err(ConfigError::NoSegments);
        }
        if self.local_history_len == 0 {
            return Err(ConfigError::EmptyLocalHistory);
        }
        if self.active_term == 0 {
            return Err(ConfigError::ZeroActiveTerm);
        }
        if self.num_threads == 0 {
            return Err(ConfigError::NoThreads);
        }
        if !(1..=31).contains(&self.ctr_bits) {
            return Err(ConfigError::CounterBits(self.ctr_bits));
        }
        if let Some(index) = self.probe_index {
            if index >= self.table_size {
                return Err(ConfigError::ProbeOutOfRange {
                    index, size: self.table_size
                });
            }
        }
        Ok(())
    }

    /// Total length of global history: the dense region followed by every
    /// sparse segment.
    pub fn global_history_len(&self) -> usize {
        self.dense_history_len + self.sparse_n_segs * self.sparse_seg_len
    }

    /// The training threshold of a freshly built neuron.
    /// Only the dense history and the active window are counted.
    pub fn initial_theta(&self) -> i32 {
        let inputs = (self.dense_history_len + self.sparse_seg_len) as f64;
        (THETA_COEFF * inputs + THETA_BIAS).round() as i32
    }

    /// Get the [approximate] number of storage bits.
    pub fn storage_bits(&self) -> usize {
        let ctr = self.ctr_bits as usize;
        let ptr = usize::BITS as usize
            - self.global_history_len().leading_zeros() as usize;
        let dense  = (self.dense_history_len + 1) * ctr;
        let active = self.sparse_seg_len * ctr;
        let sparse = self.sparse_n_segs * (1 + ptr + ctr);
        let neuron = dense + active + sparse + self.local_history_len;
        neuron * self.table_size
            + self.global_history_len() * self.num_threads
    }

    /// Use this configuration to create a new [`SNNPredictor`].
    pub fn build(self) -> Result<SNNPredictor, ConfigError> {
        self.validate()?;
        Ok(SNNPredictor::new(self))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use rstest::rstest;

    #[test]
    fn default_is_valid() {
        let cfg = SNNConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.global_history_len(), 16 + 64);
    }

    #[test]
    fn theta_is_rounded() {
        let cfg = SNNConfig {
            dense_history_len: 2, sparse_seg_len: 2, ..Default::default()
        };
        // 1.93 * 4 + 14 = 21.72
        assert_eq!(cfg.initial_theta(), 22);

        let cfg = SNNConfig::default();
        // 1.93 * 24 + 14 = 60.32
        assert_eq!(cfg.initial_theta(), 60);
    }

    #[rstest]
    #[case::table(SNNConfig { table_size: 0, ..Default::default() })]
    #[case::seg_len(SNNConfig { sparse_seg_len: 0, ..Default::default() })]
    #[case::n_segs(SNNConfig { sparse_n_segs: 0, ..Default::default() })]
    #[case::local(SNNConfig { local_history_len: 0, ..Default::default() })]
    #[case::term(SNNConfig { active_term: 0, ..Default::default() })]
    #[case::threads(SNNConfig { num_threads: 0, ..Default::default() })]
    #[case::narrow(SNNConfig { ctr_bits: 0, ..Default::default() })]
    #[case::wide(SNNConfig { ctr_bits: 32, ..Default::default() })]
    #[case::probe(SNNConfig { probe_index: Some(1024), ..Default::default() })]
    fn rejects_invalid(#[case] cfg: SNNConfig) {
        assert!(cfg.validate().is_err());
        assert!(cfg.build().is_err());
    }

    #[test]
    fn json_fills_defaults() {
        let cfg = SNNConfig::from_json(r#"{ "table_size": 64, "ctr_bits": 6 }"#)
            .unwrap();
        assert_eq!(cfg.table_size, 64);
        assert_eq!(cfg.ctr_bits, 6);
        assert_eq!(cfg.sparse_n_segs, SNNConfig::default().sparse_n_segs);
    }

    #[test]
    fn json_errors() {
        assert!(matches!(
            SNNConfig::from_json(r#"{ "table_size": "big" }"#),
            Err(ConfigError::Json(_))
        ));
        assert!(matches!(
            SNNConfig::from_json(r#"{ "probe_index": 9, "table_size": 4 }"#),
            Err(ConfigError::ProbeOutOfRange { index: 9, size: 4 })
        ));
    }
}
