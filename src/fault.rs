/// Fatal runtime faults
///
/// Every fault terminates the run; there is no recovery path. A faulted
/// machine reports terminal state `Outcome::Faulted` with the reason.
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Fault {
    #[error("unknown opcode `{0}`")]
    UnknownOpcode(String),
    #[error("malformed instruction `{0}`")]
    MalformedInstruction(String),
    #[error("fetch out of bounds: pc {pc} in a program of {len} instructions")]
    FetchOutOfBounds { pc: i64, len: usize },
    #[error("{0} stack underflow")]
    StackUnderflow(&'static str),
    #[error("division by zero")]
    DivisionByZero,
    #[error("frame snapshot has {got} slots, bank holds {want}")]
    SnapshotMismatch { got: usize, want: usize },
}
