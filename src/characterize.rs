//! Distinguishing sequences and the characterization set `W`.
//!
//! For a pair of states the [partitions](Partitions) tell in which round the two first land in
//! different classes. That round, together with the first action on which their behavior
//! vectors diverge, is a [Separation]. Following that action from both states yields a pair
//! that separates exactly one round earlier, so chaining separations down to round `0`
//! produces a shortest word on which the two states emit different outputs.

use crate::error::{label, MachineError, Result};
use crate::machine::MealyMachine;
use crate::partition::Partitions;
use crate::{Label, Word};
use itertools::Itertools;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info, trace};

/// Where and how two states first come apart.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Separation<A> {
    /// The first round in which the states sit in different classes.
    pub round: usize,
    /// The first action, in alphabet order, on which their behavior vectors differ.
    pub action: A,
}

/// Finds the [Separation] of `q1` and `q2`.
///
/// In round `0` the behavior vectors are the output vectors. In round `r > 0` they are the
/// classes, in round `r - 1`, of the successors per action.
///
/// Fails with [MachineError::EquivalentStates] if no round separates the states, and with
/// [MachineError::NoDivergence] if the vectors agree although the classes differ, which means
/// `partitions` are inconsistent with `machine`.
pub fn find_separating_round<S: Label, A: Label, O: Label>(
    machine: &MealyMachine<S, A, O>,
    partitions: &Partitions<S>,
    q1: &S,
    q2: &S,
) -> Result<Separation<A>> {
    partitions.matches(machine)?;
    let (round, action) = separate(
        machine,
        partitions,
        machine.state_idx(q1)?,
        machine.state_idx(q2)?,
    )?;
    Ok(Separation {
        round,
        action: machine.action(action).clone(),
    })
}

fn separate<S: Label, A: Label, O: Label>(
    machine: &MealyMachine<S, A, O>,
    partitions: &Partitions<S>,
    q1: usize,
    q2: usize,
) -> Result<(usize, usize)> {
    let round = partitions
        .separating_round(q1, q2)
        .ok_or_else(|| MachineError::EquivalentStates {
            q1: label(machine.state(q1)),
            q2: label(machine.state(q2)),
        })?;

    let action = if round == 0 {
        machine
            .output_row(q1)
            .zip(machine.output_row(q2))
            .position(|(o1, o2)| o1 != o2)
    } else {
        let previous = partitions.round_at(round - 1);
        machine
            .successor_indices(q1)
            .zip(machine.successor_indices(q2))
            .position(|(p1, p2)| previous.class(p1) != previous.class(p2))
    };

    action
        .map(|action| (round, action))
        .ok_or_else(|| MachineError::NoDivergence {
            q1: label(machine.state(q1)),
            q2: label(machine.state(q2)),
            round,
        })
}

/// Builds a shortest word on which `q1` and `q2` emit different outputs.
///
/// The word has length `r + 1` where `r` is the separating round of the pair. Every step must
/// lower the separating round by exactly one, otherwise [MachineError::NoProgress] is returned.
///
/// ```
/// use wmethod::{build_distinguishing_sequence, refine, MachineBuilder};
///
/// let machine = MachineBuilder::new()
///     .with_transition(0, '+', 1, false)
///     .with_transition(1, '+', 2, false)
///     .with_transition(2, '+', 0, true)
///     .with_initial(0)
///     .build()
///     .unwrap();
/// let partitions = refine(&machine);
///
/// let word = build_distinguishing_sequence(&machine, &partitions, &0, &1).unwrap();
/// assert_eq!(word, vec!['+', '+']);
/// ```
pub fn build_distinguishing_sequence<S: Label, A: Label, O: Label>(
    machine: &MealyMachine<S, A, O>,
    partitions: &Partitions<S>,
    q1: &S,
    q2: &S,
) -> Result<Word<A>> {
    partitions.matches(machine)?;
    let word = distinguish(
        machine,
        partitions,
        machine.state_idx(q1)?,
        machine.state_idx(q2)?,
    )?;
    Ok(machine.word_from_indices(&word))
}

fn distinguish<S: Label, A: Label, O: Label>(
    machine: &MealyMachine<S, A, O>,
    partitions: &Partitions<S>,
    q1: usize,
    q2: usize,
) -> Result<Vec<usize>> {
    let (round, mut action) = separate(machine, partitions, q1, q2)?;
    let mut word = Vec::with_capacity(round + 1);
    word.push(action);

    let (mut p1, mut p2) = (q1, q2);
    let mut last = round;
    for _ in 0..round {
        p1 = machine.step(p1, action).0;
        p2 = machine.step(p2, action).0;
        let (next_round, next_action) = separate(machine, partitions, p1, p2)?;
        trace!(
            "{:?} and {:?} separate in round {}",
            machine.state(p1),
            machine.state(p2),
            next_round
        );
        if next_round + 1 != last {
            return Err(MachineError::NoProgress {
                q1: label(machine.state(q1)),
                q2: label(machine.state(q2)),
                from: last,
                to: next_round,
            });
        }
        last = next_round;
        action = next_action;
        word.push(action);
    }

    Ok(word)
}

/// The characterization set `W` together with the word chosen for every pair of states.
#[derive(Clone, Debug)]
pub struct CharacterizationSet<S, A> {
    pairs: BTreeMap<(S, S), Word<A>>,
    words: BTreeSet<Word<A>>,
    equivalent: Vec<(S, S)>,
}

impl<S: Label, A: Label> CharacterizationSet<S, A> {
    /// Wraps a set of words chosen by other means, e.g. to check it with
    /// [distinguishing_inputs](crate::distinguishing_inputs).
    pub fn from_words<I: IntoIterator<Item = Word<A>>>(words: I) -> Self {
        CharacterizationSet {
            pairs: BTreeMap::new(),
            words: words.into_iter().collect(),
            equivalent: Vec::new(),
        }
    }

    /// The distinct words of `W`, in lexicographic order.
    pub fn words(&self) -> impl Iterator<Item = &Word<A>> {
        self.words.iter()
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn contains(&self, word: &[A]) -> bool {
        self.words.iter().any(|w| w.as_slice() == word)
    }

    /// Returns the word chosen for `q1` and `q2`, in either order.
    pub fn sequence_for(&self, q1: &S, q2: &S) -> Option<&Word<A>> {
        self.pairs.get(&(q1.clone(), q2.clone()))
    }

    /// Pairs of distinct states that no word separates.
    pub fn equivalent_pairs(&self) -> &[(S, S)] {
        &self.equivalent
    }

    pub fn max_word_len(&self) -> usize {
        self.words.iter().map(Vec::len).max().unwrap_or(0)
    }
}

/// Builds the characterization set of `machine`.
///
/// Every unordered pair of distinguishable states contributes its distinguishing sequence,
/// stored under both orderings; equivalent pairs contribute nothing and are listed in
/// [CharacterizationSet::equivalent_pairs].
pub fn characterization_set<S: Label, A: Label, O: Label>(
    machine: &MealyMachine<S, A, O>,
    partitions: &Partitions<S>,
) -> Result<CharacterizationSet<S, A>> {
    partitions.matches(machine)?;

    let mut pairs = BTreeMap::new();
    let mut words = BTreeSet::new();
    let mut equivalent = Vec::new();
    let fixed_point = partitions.last();

    for (q1, q2) in (0..machine.size()).tuple_combinations() {
        let (s1, s2) = (machine.state(q1).clone(), machine.state(q2).clone());
        if fixed_point.class(q1) == fixed_point.class(q2) {
            debug!("{:?} and {:?} are equivalent", s1, s2);
            equivalent.push((s1, s2));
            continue;
        }

        let word = machine.word_from_indices(&distinguish(machine, partitions, q1, q2)?);
        debug!("{:?} and {:?} are told apart by {:?}", s1, s2, word);
        words.insert(word.clone());
        pairs.insert((s2.clone(), s1.clone()), word.clone());
        pairs.insert((s1, s2), word);
    }

    info!(
        "characterization set has {} words for {} pairs",
        words.len(),
        pairs.len() / 2
    );

    Ok(CharacterizationSet {
        pairs,
        words,
        equivalent,
    })
}

/// Returns the separating round of every ordered pair of distinguishable states.
pub fn separation_table<S: Label, A: Label, O: Label>(
    machine: &MealyMachine<S, A, O>,
    partitions: &Partitions<S>,
) -> Result<BTreeMap<(S, S), usize>> {
    partitions.matches(machine)?;
    let mut table = BTreeMap::new();
    for (q1, q2) in (0..machine.size()).tuple_combinations() {
        if let Some(round) = partitions.separating_round(q1, q2) {
            let (s1, s2) = (machine.state(q1).clone(), machine.state(q2).clone());
            table.insert((s2.clone(), s1.clone()), round);
            table.insert((s1, s2), round);
        }
    }
    Ok(table)
}

/// Returns, for every state, the outputs it emits for each word of `w` in order.
pub fn responses<S: Label, A: Label, O: Label>(
    machine: &MealyMachine<S, A, O>,
    w: &CharacterizationSet<S, A>,
) -> Result<BTreeMap<S, Vec<Vec<O>>>> {
    machine
        .states()
        .iter()
        .map(|state| {
            let outputs = w
                .words()
                .map(|word| machine.apply(state, word).map(|(_, outputs)| outputs))
                .collect::<Result<Vec<_>>>()?;
            Ok((state.clone(), outputs))
        })
        .collect()
}
