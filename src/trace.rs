//! Reading binary branch traces.
//!
//! A trace is a flat array of fixed-size little-endian records:
//!
//! | offset | size | field                         |
//! |--------|------|-------------------------------|
//! | 0      | 8    | program counter               |
//! | 8      | 8    | target address                |
//! | 16     | 4    | flags (see [`BranchFlags`])   |
//! | 20     | 4    | padding                       |

use std::path::Path;
use thiserror::Error;

use crate::branch::*;

/// Size of a single record in a binary trace.
pub const RECORD_SIZE: usize = 24;

#[derive(Debug, Error)]
pub enum TraceError {
    #[error("failed to read trace: {0}")]
    Io(#[from] std::io::Error),

    #[error("trace length {0} is not a multiple of the 24-byte record size")]
    Truncated(usize),
}

/// A set of trace files, loaded one at a time.
pub struct BinaryTraceSet {
    /// A list of filenames
    pub files: Vec<String>,

    cur: usize,
}
impl BinaryTraceSet {
    pub fn new_from_slice(strings: &[String]) -> Self {
        Self {
            files: strings.to_vec(),
            cur: 0,
        }
    }
}
impl Iterator for BinaryTraceSet {
    type Item = Result<BinaryTrace, TraceError>;
    fn next(&mut self) -> Option<Self::Item> {
        let path = self.files.get(self.cur)?;
        self.cur += 1;
        Some(BinaryTrace::from_file(path))
    }
}


/// A list of branch records decoded from a binary trace.
pub struct BinaryTrace {
    pub name: String,
    data: Vec<BranchRecord>,
}
impl BinaryTrace {
    /// Load a [BinaryTrace] from a file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, TraceError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        let name = path.file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self::from_bytes(name, &bytes)
    }

    /// Decode a [BinaryTrace] from raw bytes.
    pub fn from_bytes(name: impl ToString, bytes: &[u8])
        -> Result<Self, TraceError>
    {
        if bytes.len() % RECORD_SIZE != 0 {
            return Err(TraceError::Truncated(bytes.len()));
        }
        let data = bytes.chunks_exact(RECORD_SIZE).map(|r| {
            let mut pc = [0u8; 8];
            let mut tgt = [0u8; 8];
            let mut flags = [0u8; 4];
            pc.copy_from_slice(&r[0..8]);
            tgt.copy_from_slice(&r[8..16]);
            flags.copy_from_slice(&r[16..20]);
            BranchRecord {
                pc: u64::from_le_bytes(pc) as usize,
                tgt: u64::from_le_bytes(tgt) as usize,
                flags: BranchFlags(u32::from_le_bytes(flags)),
            }
        }).collect();
        Ok(Self { name: name.to_string(), data })
    }

    /// Return the number of records
    pub fn num_entries(&self) -> usize { self.data.len() }

    pub fn name(&self) -> &str { &self.name }

    /// Return a slice of records.
    pub fn as_slice(&self) -> &[BranchRecord] { &self.data }

    /// Return a truncated slice of records
    pub fn as_slice_trunc(&self, limit: usize) -> &[BranchRecord] {
        &self.data[..limit.min(self.data.len())]
    }
}

/// Encode records in the binary trace format.
pub fn encode_records(records: &[BranchRecord]) -> Vec<u8> {
    let mut res = Vec::with_capacity(records.len() * RECORD_SIZE);
    for r in records {
        res.extend_from_slice(&(r.pc as u64).to_le_bytes());
        res.extend_from_slice(&(r.tgt as u64).to_le_bytes());
        res.extend_from_slice(&r.flags.0.to_le_bytes());
        res.extend_from_slice(&[0u8; 4]);
    }
    res
}
