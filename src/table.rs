//! The record set a machine is loaded from.
//!
//! A [TransitionTable] is what a table reader hands over: a few header fields and one row per
//! state carrying its next state and output for every action of the alphabet, in alphabet
//! order. [load] turns it into a validated [MealyMachine].

use crate::error::{label, TableError};
use crate::machine::{MachineBuilder, MealyMachine};
use crate::Label;
use tracing::info;

/// One row of a transition table.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TableRow<S, O> {
    pub source: S,
    /// Next state per action, in alphabet order.
    pub next: Vec<S>,
    /// Output per action, in alphabet order.
    pub outputs: Vec<O>,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TransitionTable<S, A, O> {
    pub initial: S,
    pub final_states: Vec<S>,
    pub default_output: Option<O>,
    pub actions: Vec<A>,
    pub rows: Vec<TableRow<S, O>>,
}

impl<S: Label, A: Label, O: Label> TransitionTable<S, A, O> {
    pub fn new(initial: S, actions: Vec<A>) -> Self {
        TransitionTable {
            initial,
            final_states: Vec::new(),
            default_output: None,
            actions,
            rows: Vec::new(),
        }
    }

    pub fn with_row(mut self, source: S, next: Vec<S>, outputs: Vec<O>) -> Self {
        self.rows.push(TableRow {
            source,
            next,
            outputs,
        });
        self
    }

    pub fn with_final(mut self, state: S) -> Self {
        self.final_states.push(state);
        self
    }

    pub fn with_default_output(mut self, output: O) -> Self {
        self.default_output = Some(output);
        self
    }
}

/// Builds a machine from a transition table.
///
/// ```
/// use wmethod::{load, TransitionTable};
///
/// let table = TransitionTable::new("A", vec!['x', 'y'])
///     .with_row("A", vec!["B", "A"], vec![0, 1])
///     .with_row("B", vec!["A", "B"], vec![1, 0]);
///
/// let machine = load(&table).unwrap();
/// assert_eq!(machine.size(), 2);
/// assert_eq!(machine.next_output(&"B", &'x'), Ok(&1));
/// ```
pub fn load<S: Label, A: Label, O: Label>(
    table: &TransitionTable<S, A, O>,
) -> Result<MealyMachine<S, A, O>, TableError> {
    let width = table.actions.len();
    let mut builder: MachineBuilder<S, A, O> = MachineBuilder::new()
        .with_actions(table.actions.iter().cloned())
        .with_initial(table.initial.clone());

    for state in &table.final_states {
        builder = builder.with_final(state.clone());
    }
    if let Some(output) = &table.default_output {
        builder = builder.with_default_output(output.clone());
    }

    for row in &table.rows {
        for found in [row.next.len(), row.outputs.len()] {
            if found != width {
                return Err(TableError::RowWidth {
                    state: label(&row.source),
                    expected: width,
                    found,
                });
            }
        }
        for ((action, to), output) in table.actions.iter().zip(&row.next).zip(&row.outputs) {
            builder = builder.with_transition(
                row.source.clone(),
                action.clone(),
                to.clone(),
                output.clone(),
            );
        }
    }

    info!("loaded table with {} rows", table.rows.len());
    Ok(builder.build()?)
}
