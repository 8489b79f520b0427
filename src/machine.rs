use crate::error::{label, MachineError, Result};
use crate::{Label, Word};
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use tracing::{debug, info};

/// Describes a single transition relation: reading `action` in `from` emits `output` and
/// moves to `to`.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Transition<S, A, O> {
    pub from: S,
    pub action: A,
    pub to: S,
    pub output: O,
}

impl<S, A, O> fmt::Display for Transition<S, A, O>
where
    S: fmt::Debug,
    A: fmt::Debug,
    O: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:?} --{:?}/{:?}--> {:?}",
            self.from, self.action, self.output, self.to
        )
    }
}

/// A deterministic, total Mealy machine.
/// In most cases, use the [builder](MachineBuilder) to specify a machine.
///
/// States are kept in `Ord` order and actions in declaration order; every query that
/// produces one entry per action follows that order.
///
/// # See also
///
/// * [MachineBuilder]
/// * [load](crate::load)
#[derive(Clone, Debug)]
pub struct MealyMachine<S, A, O> {
    states: Vec<S>,
    state_index: HashMap<S, usize>,
    actions: Vec<A>,
    action_index: HashMap<A, usize>,

    // Dense transition table, `table[state][action] = (next state, output)`.
    table: Vec<Vec<(usize, O)>>,

    initial: usize,
    final_states: BTreeSet<S>,
    default_output: Option<O>,
    output_alphabet: BTreeSet<O>,
}

impl<S: Label, A: Label, O: Label> MealyMachine<S, A, O> {
    /// Returns the number of states.
    pub fn size(&self) -> usize {
        self.states.len()
    }

    pub fn states(&self) -> &[S] {
        &self.states
    }

    /// The action alphabet in its declared order.
    pub fn actions(&self) -> &[A] {
        &self.actions
    }

    pub fn output_alphabet(&self) -> &BTreeSet<O> {
        &self.output_alphabet
    }

    pub fn initial(&self) -> &S {
        &self.states[self.initial]
    }

    pub fn final_states(&self) -> &BTreeSet<S> {
        &self.final_states
    }

    pub fn default_output(&self) -> Option<&O> {
        self.default_output.as_ref()
    }

    /// Returns the state reached from `state` on `action`.
    ///
    /// ```
    /// use wmethod::MachineBuilder;
    ///
    /// let machine = MachineBuilder::new()
    ///     .with_transition(0, 'a', 1, "hi")
    ///     .with_transition(1, 'a', 0, "lo")
    ///     .with_initial(0)
    ///     .build()
    ///     .unwrap();
    ///
    /// assert_eq!(machine.next_state(&0, &'a'), Ok(&1));
    /// assert!(machine.next_state(&2, &'a').is_err());
    /// ```
    pub fn next_state(&self, state: &S, action: &A) -> Result<&S> {
        let (to, _) = self.lookup(state, action)?;
        Ok(&self.states[to])
    }

    /// Returns the output emitted when reading `action` in `state`.
    pub fn next_output(&self, state: &S, action: &A) -> Result<&O> {
        let (_, output) = self.lookup(state, action)?;
        Ok(output)
    }

    /// Returns the successors of `state`, one per action.
    pub fn successors(&self, state: &S) -> Result<Vec<&S>> {
        let q = self.state_idx(state)?;
        Ok(self.table[q].iter().map(|(to, _)| &self.states[*to]).collect())
    }

    /// Returns the outputs of `state`, one per action.
    pub fn outputs(&self, state: &S) -> Result<Vec<&O>> {
        let q = self.state_idx(state)?;
        Ok(self.table[q].iter().map(|(_, output)| output).collect())
    }

    /// Runs `word` from `state` and returns the state it ends in together with the emitted
    /// outputs. Each letter is read in the state reached by the previous one.
    ///
    /// ```
    /// use wmethod::MachineBuilder;
    ///
    /// let machine = MachineBuilder::new()
    ///     .with_transition("A", 'x', "B", 0)
    ///     .with_transition("A", 'y', "A", 1)
    ///     .with_transition("B", 'x', "A", 1)
    ///     .with_transition("B", 'y', "B", 0)
    ///     .with_initial("A")
    ///     .build()
    ///     .unwrap();
    ///
    /// let (end, outputs) = machine.apply(&"A", &['x', 'y', 'x']).unwrap();
    /// assert_eq!(end, "A");
    /// assert_eq!(outputs, vec![0, 0, 1]);
    /// ```
    pub fn apply(&self, state: &S, word: &[A]) -> Result<(S, Vec<O>)> {
        let mut current = self.state_idx(state)?;
        let mut outputs = Vec::with_capacity(word.len());
        for action in word {
            let (to, output) = self.step(current, self.action_idx(action)?);
            outputs.push(output.clone());
            current = to;
        }
        Ok((self.states[current].clone(), outputs))
    }

    /// Returns every state passed through while running `word` from `state`, including
    /// `state` itself.
    pub fn states_visited(&self, state: &S, word: &[A]) -> Result<BTreeSet<S>> {
        let mut current = self.state_idx(state)?;
        let mut visited = BTreeSet::from([state.clone()]);
        for action in word {
            current = self.step(current, self.action_idx(action)?).0;
            visited.insert(self.states[current].clone());
        }
        Ok(visited)
    }

    /// Returns every transition, as `(from, to, action)`, taken while running `word` from
    /// `state`.
    pub fn transitions_used(&self, state: &S, word: &[A]) -> Result<BTreeSet<(S, S, A)>> {
        let mut current = self.state_idx(state)?;
        let mut used = BTreeSet::new();
        for action in word {
            let to = self.step(current, self.action_idx(action)?).0;
            used.insert((
                self.states[current].clone(),
                self.states[to].clone(),
                action.clone(),
            ));
            current = to;
        }
        Ok(used)
    }

    /// Returns all transitions as `(from, to, action)`.
    pub fn transitions_set(&self) -> BTreeSet<(S, S, A)> {
        self.transitions()
            .map(|t| (t.from, t.to, t.action))
            .collect()
    }

    /// Iterates over all transitions, by source state and then by action.
    pub fn transitions(&self) -> impl Iterator<Item = Transition<S, A, O>> + '_ {
        self.table.iter().enumerate().flat_map(move |(q, row)| {
            row.iter().enumerate().map(move |(a, (to, output))| Transition {
                from: self.states[q].clone(),
                action: self.actions[a].clone(),
                to: self.states[*to].clone(),
                output: output.clone(),
            })
        })
    }

    fn lookup(&self, state: &S, action: &A) -> Result<(usize, &O)> {
        let q = self.state_idx(state)?;
        let a = self.action_idx(action)?;
        self.table
            .get(q)
            .and_then(|row| row.get(a))
            .map(|(to, output)| (*to, output))
            .ok_or_else(|| MachineError::UndefinedTransition {
                state: label(state),
                action: label(action),
            })
    }
}

// Index based access used by the derivation algorithms. Indices are always in range, since
// they are handed out by the machine itself.
impl<S: Label, A: Label, O: Label> MealyMachine<S, A, O> {
    pub(crate) fn state_idx(&self, state: &S) -> Result<usize> {
        self.state_index
            .get(state)
            .copied()
            .ok_or_else(|| MachineError::UnknownState(label(state)))
    }

    pub(crate) fn action_idx(&self, action: &A) -> Result<usize> {
        self.action_index
            .get(action)
            .copied()
            .ok_or_else(|| MachineError::UnknownAction(label(action)))
    }

    pub(crate) fn initial_idx(&self) -> usize {
        self.initial
    }

    pub(crate) fn state(&self, q: usize) -> &S {
        &self.states[q]
    }

    pub(crate) fn action(&self, a: usize) -> &A {
        &self.actions[a]
    }

    pub(crate) fn step(&self, q: usize, a: usize) -> (usize, &O) {
        let (to, output) = &self.table[q][a];
        (*to, output)
    }

    pub(crate) fn successor_indices(&self, q: usize) -> impl Iterator<Item = usize> + '_ {
        self.table[q].iter().map(|(to, _)| *to)
    }

    pub(crate) fn output_row(&self, q: usize) -> impl Iterator<Item = &O> + '_ {
        self.table[q].iter().map(|(_, output)| output)
    }

    pub(crate) fn word_from_indices(&self, word: &[usize]) -> Word<A> {
        word.iter().map(|a| self.actions[*a].clone()).collect()
    }
}

/// Helps with specifying [machines](MealyMachine).
#[derive(Clone, Debug)]
pub struct MachineBuilder<S, A, O> {
    actions: Vec<A>,
    transitions: Vec<Transition<S, A, O>>,
    initial: Option<S>,
    final_states: BTreeSet<S>,
    default_output: Option<O>,
}

impl<S: Label, A: Label, O: Label> Default for MachineBuilder<S, A, O> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: Label, A: Label, O: Label> MachineBuilder<S, A, O> {
    /// Create a new machine builder.
    pub fn new() -> Self {
        MachineBuilder {
            actions: Vec::new(),
            transitions: Vec::new(),
            initial: None,
            final_states: BTreeSet::new(),
            default_output: None,
        }
    }

    /// Declare actions up front. The alphabet is ordered by declaration; actions that only
    /// appear in transitions are appended in order of first appearance.
    pub fn with_actions<I: IntoIterator<Item = A>>(mut self, actions: I) -> Self {
        for action in actions {
            if !self.actions.contains(&action) {
                self.actions.push(action);
            }
        }
        self
    }

    /// Add a transition from state `from` on `action`.
    pub fn with_transition(mut self, from: S, action: A, to: S, output: O) -> Self {
        debug!("add transition {:?} --{:?}/{:?}--> {:?}", from, action, output, to);
        if !self.actions.contains(&action) {
            self.actions.push(action.clone());
        }
        self.transitions.push(Transition {
            from,
            action,
            to,
            output,
        });
        self
    }

    /// Mark `state` as the initial state; all covering paths start here.
    pub fn with_initial(mut self, state: S) -> Self {
        info!("mark state {:?} as initial", state);
        self.initial = Some(state);
        self
    }

    /// Mark `state` as final.
    pub fn with_final(mut self, state: S) -> Self {
        info!("mark state {:?} as final", state);
        self.final_states.insert(state);
        self
    }

    pub fn with_default_output(mut self, output: O) -> Self {
        self.default_output = Some(output);
        self
    }

    /// Create and return a new machine from the current specification.
    ///
    /// Fails if no initial state was given, the alphabet is empty, some `(state, action)`
    /// pair has two different entries or the transition function is not total.
    pub fn build(self) -> Result<MealyMachine<S, A, O>> {
        let initial = self.initial.ok_or(MachineError::MissingInitialState)?;
        if self.actions.is_empty() {
            return Err(MachineError::EmptyAlphabet);
        }

        let mut state_set: BTreeSet<S> = BTreeSet::new();
        state_set.insert(initial.clone());
        state_set.extend(self.final_states.iter().cloned());
        for t in &self.transitions {
            state_set.insert(t.from.clone());
            state_set.insert(t.to.clone());
        }

        let states: Vec<S> = state_set.into_iter().collect();
        let state_index: HashMap<S, usize> = states
            .iter()
            .enumerate()
            .map(|(i, s)| (s.clone(), i))
            .collect();
        let action_index: HashMap<A, usize> = self
            .actions
            .iter()
            .enumerate()
            .map(|(i, a)| (a.clone(), i))
            .collect();

        let mut output_alphabet: BTreeSet<O> = self.default_output.iter().cloned().collect();
        let mut cells: Vec<Vec<Option<(usize, O)>>> =
            vec![vec![None; self.actions.len()]; states.len()];

        for t in self.transitions {
            let q = state_index[&t.from];
            let a = action_index[&t.action];
            let entry = (state_index[&t.to], t.output);
            match &cells[q][a] {
                Some(existing) if *existing != entry => {
                    return Err(MachineError::NondeterministicTransition {
                        state: label(&t.from),
                        action: label(&t.action),
                    });
                }
                Some(_) => {}
                None => {
                    output_alphabet.insert(entry.1.clone());
                    cells[q][a] = Some(entry);
                }
            }
        }

        let mut table = Vec::with_capacity(states.len());
        for (q, row) in cells.into_iter().enumerate() {
            let mut complete = Vec::with_capacity(row.len());
            for (a, cell) in row.into_iter().enumerate() {
                match cell {
                    Some(entry) => complete.push(entry),
                    None => {
                        return Err(MachineError::UndefinedTransition {
                            state: label(&states[q]),
                            action: label(&self.actions[a]),
                        })
                    }
                }
            }
            table.push(complete);
        }

        info!(
            "build machine with {} states and {} actions",
            states.len(),
            self.actions.len()
        );

        Ok(MealyMachine {
            initial: state_index[&initial],
            states,
            state_index,
            actions: self.actions,
            action_index,
            table,
            final_states: self.final_states,
            default_output: self.default_output,
            output_alphabet,
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// The two state machine used throughout the test suites.
    pub(crate) fn two_state() -> MealyMachine<&'static str, char, u8> {
        MachineBuilder::new()
            .with_transition("A", 'x', "B", 0)
            .with_transition("A", 'y', "A", 1)
            .with_transition("B", 'x', "A", 1)
            .with_transition("B", 'y', "B", 0)
            .with_initial("A")
            .build()
            .unwrap()
    }

    #[test_log::test]
    fn every_pair_is_defined() {
        let machine = two_state();
        for state in machine.states() {
            for action in machine.actions() {
                assert!(machine.next_state(state, action).is_ok());
                assert!(machine.next_output(state, action).is_ok());
            }
        }
        assert_eq!(machine.transitions().count(), 4);
        assert_eq!(machine.output_alphabet().len(), 2);
    }

    #[test_log::test]
    fn successors_and_outputs_follow_alphabet_order() {
        let machine = two_state();
        assert_eq!(machine.successors(&"A").unwrap(), vec![&"B", &"A"]);
        assert_eq!(machine.outputs(&"A").unwrap(), vec![&0, &1]);
        assert_eq!(machine.outputs(&"B").unwrap(), vec![&1, &0]);
    }

    #[test_log::test]
    fn apply_reads_each_letter_in_the_running_state() {
        let machine = two_state();
        // Restarting from "A" for every letter would emit [0, 0] here.
        let (end, outputs) = machine.apply(&"A", &['x', 'x']).unwrap();
        assert_eq!(end, "A");
        assert_eq!(outputs, vec![0, 1]);

        let (end, outputs) = machine.apply(&"B", &[]).unwrap();
        assert_eq!(end, "B");
        assert!(outputs.is_empty());
    }

    #[test_log::test]
    fn apply_is_deterministic() {
        let machine = two_state();
        let word = ['x', 'y', 'y', 'x', 'x'];
        assert_eq!(
            machine.apply(&"B", &word).unwrap(),
            machine.apply(&"B", &word).unwrap()
        );
    }

    #[test_log::test]
    fn visited_states_and_used_transitions() {
        let machine = two_state();
        let visited = machine.states_visited(&"A", &['y']).unwrap();
        assert_eq!(visited, BTreeSet::from(["A"]));

        let used = machine.transitions_used(&"A", &['x', 'y']).unwrap();
        assert_eq!(used, BTreeSet::from([("A", "B", 'x'), ("B", "B", 'y')]));
        assert_eq!(machine.transitions_set().len(), 4);
    }

    #[test_log::test]
    fn lookups_outside_the_machine_fail() {
        let machine = two_state();
        assert_eq!(
            machine.next_state(&"C", &'x'),
            Err(MachineError::UnknownState("\"C\"".into()))
        );
        assert_eq!(
            machine.next_output(&"A", &'z'),
            Err(MachineError::UnknownAction("'z'".into()))
        );
        assert!(machine.apply(&"A", &['x', 'z']).is_err());
    }

    #[test_log::test]
    fn partial_tables_are_rejected() {
        let result = MachineBuilder::new()
            .with_transition("A", 'x', "B", 0)
            .with_transition("A", 'y', "A", 1)
            .with_transition("B", 'x', "A", 1)
            .with_initial("A")
            .build();
        assert_eq!(
            result.unwrap_err(),
            MachineError::UndefinedTransition {
                state: "\"B\"".into(),
                action: "'y'".into()
            }
        );
    }

    #[test_log::test]
    fn conflicting_entries_are_rejected() {
        let result = MachineBuilder::new()
            .with_transition("A", 'x', "A", 0)
            .with_transition("A", 'x', "A", 1)
            .with_initial("A")
            .build();
        assert!(matches!(
            result,
            Err(MachineError::NondeterministicTransition { .. })
        ));

        // Repeating an identical entry is harmless.
        let machine = MachineBuilder::new()
            .with_transition("A", 'x', "A", 0)
            .with_transition("A", 'x', "A", 0)
            .with_initial("A")
            .build()
            .unwrap();
        assert_eq!(machine.transitions().count(), 1);
    }

    #[test_log::test]
    fn missing_initial_state_or_alphabet() {
        let result = MachineBuilder::<&str, char, u8>::new()
            .with_transition("A", 'x', "A", 0)
            .build();
        assert_eq!(result.unwrap_err(), MachineError::MissingInitialState);

        let result = MachineBuilder::<&str, char, u8>::new()
            .with_initial("A")
            .build();
        assert_eq!(result.unwrap_err(), MachineError::EmptyAlphabet);
    }

    #[test_log::test]
    fn declared_actions_fix_the_order() {
        let machine = MachineBuilder::new()
            .with_actions(['y', 'x'])
            .with_transition("A", 'x', "A", 0)
            .with_transition("A", 'y', "A", 1)
            .with_initial("A")
            .with_final("A")
            .with_default_output(9)
            .build()
            .unwrap();
        assert_eq!(machine.actions(), &['y', 'x']);
        assert_eq!(machine.outputs(&"A").unwrap(), vec![&1, &0]);
        assert_eq!(machine.default_output(), Some(&9));
        assert!(machine.output_alphabet().contains(&9));
        assert!(machine.final_states().contains("A"));
    }
}
