//! # W-method conformance test derivation
//!
//! `wmethod` derives a conformance test suite for a deterministic Mealy machine. Given a
//! [machine](MealyMachine) it computes
//!
//! * the successive [partitions](Partitions) of its states by observable behavior,
//! * a [characterization set](CharacterizationSet) `W` whose words tell apart every pair of
//!   distinguishable states,
//! * a [state cover](StateCover) and an edge cover rooted at the initial state,
//! * and the derived [test set](TestSet) `Z` built from the covers and `W`.
//!
//! Machines should be specified using the [builder](MachineBuilder) or [loaded](load) from a
//! [transition table](TransitionTable).
//!
//! ```
//! use wmethod::{MachineBuilder, TestSuite, DerivationConfig};
//!
//! let machine = MachineBuilder::new()
//!     .with_transition("A", 'x', "B", 0)
//!     .with_transition("A", 'y', "A", 1)
//!     .with_transition("B", 'x', "A", 1)
//!     .with_transition("B", 'y', "B", 0)
//!     .with_initial("A")
//!     .build()
//!     .unwrap();
//!
//! let suite = TestSuite::derive(&machine, &DerivationConfig::default()).unwrap();
//! assert_eq!(suite.state_cover.path_to(&"B"), Some(&vec!['x']));
//! assert!(!suite.characterization.is_empty());
//! ```
//!
//! # References
//!
//! \[1\] Chow, T. S. Testing Software Design Modeled by Finite-State Machines.
//! IEEE Transactions on Software Engineering, 1978.

use std::fmt::Debug;
use std::hash::Hash;

pub mod characterize;
pub mod cover;
pub mod error;
pub mod gviz;
pub mod machine;
pub mod partition;
pub mod reader;
pub mod table;
pub mod testset;

pub use characterize::{
    build_distinguishing_sequence, characterization_set, find_separating_round, responses,
    separation_table, CharacterizationSet, Separation,
};
pub use cover::{edge_cover, state_cover, transition_cover, SpanningTree, StateCover, Traversal};
pub use error::{MachineError, Result, TableError};
pub use machine::{MachineBuilder, MealyMachine, Transition};
pub use partition::{refine, Partition, Partitions};
pub use table::{load, TableRow, TransitionTable};
pub use testset::{
    derive_test_set, distinguishing_inputs, test_edge_cover, test_state_cover, DerivationConfig,
    TestSet, TestSuite,
};

/// Anything that can name a state, an action or an output.
pub trait Label: Clone + Eq + Ord + Hash + Debug {}

impl<T: Clone + Eq + Ord + Hash + Debug> Label for T {}

/// A finite input sequence, applied left to right.
pub type Word<A> = Vec<A>;
