use thiserror::Error;

/// Errors raised while building a machine or deriving its test suite.
///
/// Labels are carried as their `Debug` rendering so the error type does not depend on the
/// machine's label types.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MachineError {
    #[error("no transition defined for state {state} on action {action}")]
    UndefinedTransition { state: String, action: String },
    #[error("state {state} has conflicting transitions on action {action}")]
    NondeterministicTransition { state: String, action: String },
    #[error("unknown state {0}")]
    UnknownState(String),
    #[error("unknown action {0}")]
    UnknownAction(String),
    #[error("no initial state was given")]
    MissingInitialState,
    #[error("the action alphabet is empty")]
    EmptyAlphabet,
    #[error("states not reachable from the initial state: {}", .0.join(", "))]
    UnreachableStates(Vec<String>),
    #[error("partitions were computed for a different machine")]
    PartitionMismatch,
    #[error("states {q1} and {q2} are equivalent")]
    EquivalentStates { q1: String, q2: String },
    #[error("round {round} separates {q1} and {q2} but their behavior vectors agree")]
    NoDivergence { q1: String, q2: String, round: usize },
    #[error("separating round of {q1} and {q2} went from {from} to {to} instead of dropping by one")]
    NoProgress {
        q1: String,
        q2: String,
        from: usize,
        to: usize,
    },
    #[error("no word of the characterization set separates {q1} and {q2}")]
    CharacterizationSetIncomplete { q1: String, q2: String },
}

/// Errors raised while reading a transition table.
#[derive(Debug, Error)]
pub enum TableError {
    #[error("could not read table: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed csv: {0}")]
    Csv(#[from] csv::Error),
    #[error("missing header line `{0}`")]
    MissingHeader(&'static str),
    #[error("row for state {state} has {found} entries, expected {expected}")]
    RowWidth {
        state: String,
        expected: usize,
        found: usize,
    },
    #[error(transparent)]
    Machine(#[from] MachineError),
}

pub type Result<T, E = MachineError> = std::result::Result<T, E>;

pub(crate) fn label<T: std::fmt::Debug>(t: &T) -> String {
    format!("{:?}", t)
}
