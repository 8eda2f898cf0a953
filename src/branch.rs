//! Types for representing branches and branch outcomes.

/// A branch outcome.
#[repr(u32)]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Outcome {
    /// Not taken
    N = 0,
    /// Taken
    T = 1
}

impl Outcome {
    pub fn from_bool(b: bool) -> Self {
        match b {
            true => Self::T,
            false => Self::N,
        }
    }

    /// Map an outcome onto a perceptron input: 'not-taken' is -1 and
    /// 'taken' is +1.
    pub fn sign(self) -> i32 {
        match self {
            Self::T => 1,
            Self::N => -1,
        }
    }

    pub fn is_taken(self) -> bool {
        matches!(self, Self::T)
    }
}

/// Map a history bit onto a perceptron input (0 => -1, 1 => +1).
pub fn sign(bit: bool) -> i32 {
    Outcome::from_bool(bit).sign()
}

impl std::fmt::Debug for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let s = match self {
            Self::T => "t",
            Self::N => "n",
        };
        write!(f, "{}", s)
    }
}

impl std::ops::Not for Outcome {
    type Output = Self;
    fn not(self) -> Self {
        match self {
            Self::N => Self::T,
            Self::T => Self::N,
        }
    }
}

impl From<bool> for Outcome {
    fn from(x: bool) -> Self {
        Self::from_bool(x)
    }
}
impl From<Outcome> for bool {
    fn from(x: Outcome) -> bool {
        x.is_taken()
    }
}

/// Representing different kinds of branch/control-flow instructions.
///
/// NOTE: The discriminants are the flag bits used by the binary trace
/// format (see [BranchFlags]).
#[repr(u32)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum BranchKind {
    /// A direct conditional branch instruction.
    DirectBranch = BranchFlags::BRN_FLAG,

    /// A direct unconditional jump instruction.
    DirectJump   = BranchFlags::JMP_FLAG,

    /// An indirect unconditional jump instruction.
    IndirectJump = BranchFlags::JMP_FLAG | BranchFlags::IND_FLAG,

    /// A direct procedure call instruction.
    DirectCall   = BranchFlags::CALL_FLAG,

    /// An indirect procedure call instruction.
    IndirectCall = BranchFlags::CALL_FLAG | BranchFlags::IND_FLAG,

    /// A return instruction.
    Return       = BranchFlags::RET_FLAG | BranchFlags::IND_FLAG,
}
impl BranchKind {
    const DIRECT_BRANCH: u32 = BranchFlags::BRN_FLAG;
    const DIRECT_JUMP: u32 = BranchFlags::JMP_FLAG;
    const DIRECT_CALL: u32 = BranchFlags::CALL_FLAG;
    const INDIRECT_CALL: u32 = BranchFlags::CALL_FLAG | BranchFlags::IND_FLAG;
    const INDIRECT_JUMP: u32 = BranchFlags::JMP_FLAG | BranchFlags::IND_FLAG;
    const RETURN: u32 = BranchFlags::RET_FLAG | BranchFlags::IND_FLAG;

    /// Decode the kind bits of a flags word.
    /// Returns [None] for combinations that don't name a branch.
    pub fn from_bits(x: u32) -> Option<Self> {
        match x & 0b01_1111 {
            Self::DIRECT_BRANCH => Some(Self::DirectBranch),
            Self::DIRECT_JUMP   => Some(Self::DirectJump),
            Self::DIRECT_CALL   => Some(Self::DirectCall),
            Self::INDIRECT_JUMP => Some(Self::IndirectJump),
            Self::INDIRECT_CALL => Some(Self::IndirectCall),
            Self::RETURN        => Some(Self::Return),
            _ => None,
        }
    }
}

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct BranchFlags(pub u32);
impl BranchFlags {

    const BRN_FLAG: u32   = 1 << 0;
    const JMP_FLAG: u32   = 1 << 1;
    const CALL_FLAG: u32  = 1 << 2;
    const RET_FLAG: u32   = 1 << 3;
    const IND_FLAG: u32   = 1 << 4;
    const TAKEN_FLAG: u32 = 1 << 5;

    pub fn is_brn(&self) -> bool { self.0 & Self::BRN_FLAG != 0 }
    pub fn is_call(&self) -> bool { self.0 & Self::CALL_FLAG != 0 }
    pub fn is_ret(&self) -> bool { self.0 & Self::RET_FLAG != 0 }
    pub fn is_taken(&self) -> bool { self.0 & Self::TAKEN_FLAG != 0 }

    pub fn kind(&self) -> Option<BranchKind> {
        BranchKind::from_bits(self.0)
    }

    pub fn new(kind: BranchKind, outcome: Outcome) -> Self {
        let tbit = if outcome.is_taken() { Self::TAKEN_FLAG } else { 0 };
        Self(kind as u32 | tbit)
    }
}


/// A record of branch execution.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct BranchRecord {
    /// The program counter value for this branch
    pub pc: usize,

    /// The target address evaluated for this branch
    pub tgt: usize,

    pub flags: BranchFlags,
}
impl BranchRecord {
    pub fn new(pc: usize, tgt: usize, kind: BranchKind, outcome: Outcome)
        -> Self
    {
        Self { pc, tgt, flags: BranchFlags::new(kind, outcome) }
    }

    pub fn outcome(&self) -> Outcome {
        Outcome::from_bool(self.flags.is_taken())
    }
    pub fn kind(&self) -> Option<BranchKind> {
        self.flags.kind()
    }

    /// Returns 'true' if this is a conditional instruction.
    pub fn is_conditional(&self) -> bool {
        self.flags.is_brn()
    }

    /// Returns 'true' if this is an unconditional instruction.
    pub fn is_unconditional(&self) -> bool {
        !self.flags.is_brn()
    }

    /// Returns 'true' if this is a "call" or "return".
    pub fn is_procedural(&self) -> bool {
        self.flags.is_call() || self.flags.is_ret()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn sign_mapping() {
        assert_eq!(sign(false), -1);
        assert_eq!(sign(true), 1);
        assert_eq!(Outcome::N.sign(), -1);
        assert_eq!(Outcome::T.sign(), 1);
    }

    #[test]
    fn flags_roundtrip_kind_and_outcome() {
        let r = BranchRecord::new(0x1000, 0x2000, BranchKind::IndirectCall,
            Outcome::T);
        assert_eq!(r.kind(), Some(BranchKind::IndirectCall));
        assert_eq!(r.outcome(), Outcome::T);
        assert!(r.is_unconditional());
        assert!(r.is_procedural());

        let r = BranchRecord::new(0x1000, 0x2000, BranchKind::DirectBranch,
            Outcome::N);
        assert!(r.is_conditional());
        assert_eq!(r.outcome(), Outcome::N);
    }

    #[test]
    fn unknown_kind_bits() {
        assert_eq!(BranchFlags(0).kind(), None);
        assert_eq!(BranchFlags(0b1_1111).kind(), None);
    }
}
