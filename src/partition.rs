//! # Partition Module
//!
//! Successive partitions of a machine's states by observable behavior.
//!
//! Round `0` groups states by their output vector, the outputs they emit for every action in
//! alphabet order. Round `k > 0` groups states that shared a class in round `k - 1` and whose
//! successors, action by action, shared classes in round `k - 1`. Two states share a class in
//! round `k` exactly when no word of length at most `k + 1` tells them apart.
//!
//! Refinement stops as soon as every state sits in its own class or a round adds no class.
//! A round that adds no class is not stored, so every stored round strictly refines the one
//! before it and a machine with `n` states yields at most `n` rounds.

use crate::error::{label, MachineError, Result};
use crate::machine::MealyMachine;
use crate::Label;
use std::collections::HashMap;
use std::hash::Hash;
use tracing::{debug, info};

/// A single round: a class id for every state.
///
/// Class ids are handed out in order of first appearance while scanning the states in order,
/// so recomputing a round always yields the same ids.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Partition {
    class_of: Vec<usize>,
    len: usize,
}

impl Partition {
    fn from_keys<K, I>(keys: I) -> Self
    where
        K: Hash + Eq,
        I: IntoIterator<Item = K>,
    {
        let mut ids: HashMap<K, usize> = HashMap::new();
        let class_of = keys
            .into_iter()
            .map(|key| {
                let next = ids.len();
                *ids.entry(key).or_insert(next)
            })
            .collect();
        Partition {
            class_of,
            len: ids.len(),
        }
    }

    /// Returns the number of classes.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Class ids indexed by state position.
    pub fn class_ids(&self) -> &[usize] {
        &self.class_of
    }

    /// Checks that every class of `self` lies within a class of `coarser`.
    pub fn refines(&self, coarser: &Partition) -> bool {
        let mut seen: HashMap<usize, usize> = HashMap::new();
        self.class_of
            .iter()
            .zip(&coarser.class_of)
            .all(|(fine, coarse)| *seen.entry(*fine).or_insert(*coarse) == *coarse)
    }

    pub(crate) fn class(&self, q: usize) -> usize {
        self.class_of[q]
    }
}

/// The sequence of rounds computed by [refine], ending in the fixed point.
#[derive(Clone, Debug)]
pub struct Partitions<S> {
    states: Vec<S>,
    rounds: Vec<Partition>,
}

impl<S: Label> Partitions<S> {
    /// The number of stored rounds, at least one.
    pub fn rounds(&self) -> usize {
        self.rounds.len()
    }

    pub fn round(&self, k: usize) -> Option<&Partition> {
        self.rounds.get(k)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Partition> {
        self.rounds.iter()
    }

    /// The fixed point.
    pub fn last(&self) -> &Partition {
        &self.rounds[self.rounds.len() - 1]
    }

    /// The states the class ids refer to, in order.
    pub fn states(&self) -> &[S] {
        &self.states
    }

    /// Checks whether the fixed point separates every pair of states.
    pub fn is_discrete(&self) -> bool {
        self.last().len() == self.states.len()
    }

    /// Returns the class of `state` in round `k`.
    pub fn class_of(&self, k: usize, state: &S) -> Result<Option<usize>> {
        let q = self.index(state)?;
        Ok(self.rounds.get(k).map(|round| round.class(q)))
    }

    /// Returns the classes of round `k`, each listing its states in order.
    pub fn classes(&self, k: usize) -> Option<Vec<Vec<&S>>> {
        let round = self.rounds.get(k)?;
        let mut classes = vec![Vec::new(); round.len()];
        for (q, class) in round.class_of.iter().enumerate() {
            classes[*class].push(&self.states[q]);
        }
        Some(classes)
    }

    /// Checks whether no word tells `q1` and `q2` apart.
    pub fn equivalent(&self, q1: &S, q2: &S) -> Result<bool> {
        let (q1, q2) = (self.index(q1)?, self.index(q2)?);
        Ok(self.separating_round(q1, q2).is_none())
    }

    /// The first round in which `q1` and `q2` sit in different classes.
    pub(crate) fn separating_round(&self, q1: usize, q2: usize) -> Option<usize> {
        self.rounds
            .iter()
            .position(|round| round.class(q1) != round.class(q2))
    }

    pub(crate) fn round_at(&self, k: usize) -> &Partition {
        &self.rounds[k]
    }

    /// Checks that these partitions were computed for a machine with the given states.
    pub(crate) fn matches<A: Label, O: Label>(&self, machine: &MealyMachine<S, A, O>) -> Result<()> {
        if self.states.as_slice() == machine.states() {
            Ok(())
        } else {
            Err(MachineError::PartitionMismatch)
        }
    }

    fn index(&self, state: &S) -> Result<usize> {
        self.states
            .binary_search(state)
            .map_err(|_| MachineError::UnknownState(label(state)))
    }

    #[cfg(test)]
    pub(crate) fn from_class_ids(states: Vec<S>, rounds: Vec<Vec<usize>>) -> Self {
        let rounds = rounds.into_iter().map(Partition::from_keys).collect();
        Partitions { states, rounds }
    }
}

/// Computes the successive partitions of `machine`'s states up to the fixed point.
///
/// ```
/// use wmethod::{refine, MachineBuilder};
///
/// // A counter modulo three that only reports when it wraps around.
/// let machine = MachineBuilder::new()
///     .with_transition(0, '+', 1, false)
///     .with_transition(1, '+', 2, false)
///     .with_transition(2, '+', 0, true)
///     .with_initial(0)
///     .build()
///     .unwrap();
///
/// let partitions = refine(&machine);
/// assert_eq!(partitions.rounds(), 2);
/// assert_eq!(partitions.round(0).unwrap().len(), 2);
/// assert!(partitions.is_discrete());
/// ```
pub fn refine<S: Label, A: Label, O: Label>(machine: &MealyMachine<S, A, O>) -> Partitions<S> {
    let n = machine.size();
    let mut rounds = Vec::new();
    let mut current = Partition::from_keys((0..n).map(|q| machine.output_row(q).collect::<Vec<_>>()));

    loop {
        debug!("round {} has {} classes", rounds.len(), current.len());
        if current.len() == n {
            rounds.push(current);
            break;
        }

        let next = Partition::from_keys((0..n).map(|q| {
            let successors: Vec<usize> = machine
                .successor_indices(q)
                .map(|p| current.class(p))
                .collect();
            (current.class(q), successors)
        }));

        let stable = next.len() == current.len();
        rounds.push(current);
        if stable {
            break;
        }
        current = next;
    }

    info!(
        "refined {} states into {} classes over {} rounds",
        n,
        rounds[rounds.len() - 1].len(),
        rounds.len()
    );

    Partitions {
        states: machine.states().to_vec(),
        rounds,
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::machine::tests::two_state;
    use crate::machine::MachineBuilder;
    use itertools::Itertools;

    /// Five states on a line, told apart only by how far they are from the end.
    fn chain() -> MealyMachine<u8, char, u8> {
        let mut builder = MachineBuilder::new().with_initial(0);
        for q in 0..5u8 {
            let next = (q + 1).min(4);
            builder = builder
                .with_transition(q, 'a', next, u8::from(q == 4))
                .with_transition(q, 'b', 0, 0);
        }
        builder.build().unwrap()
    }

    /// States 1 and 2 behave identically.
    pub(crate) fn redundant() -> MealyMachine<u8, char, u8> {
        MachineBuilder::new()
            .with_transition(0, 'a', 1, 0)
            .with_transition(0, 'b', 2, 1)
            .with_transition(1, 'a', 0, 1)
            .with_transition(1, 'b', 2, 0)
            .with_transition(2, 'a', 0, 1)
            .with_transition(2, 'b', 1, 0)
            .with_initial(0)
            .build()
            .unwrap()
    }

    /// Checks whether every word of length at most `depth` gives the same outputs.
    fn agree_up_to(machine: &MealyMachine<u8, char, u8>, q1: u8, q2: u8, depth: usize) -> bool {
        (1..=depth).all(|len| {
            std::iter::repeat(machine.actions().iter().cloned())
                .take(len)
                .multi_cartesian_product()
                .all(|word| {
                    machine.apply(&q1, &word).unwrap().1 == machine.apply(&q2, &word).unwrap().1
                })
        })
    }

    #[test_log::test]
    fn two_states_split_in_round_zero() {
        let partitions = refine(&two_state());
        assert_eq!(partitions.rounds(), 1);
        assert!(partitions.is_discrete());
        assert_ne!(
            partitions.class_of(0, &"A").unwrap(),
            partitions.class_of(0, &"B").unwrap()
        );
    }

    #[test_log::test]
    fn chain_needs_a_round_per_state() {
        let machine = chain();
        let partitions = refine(&machine);

        assert_eq!(partitions.rounds(), machine.size() - 1);
        let sizes: Vec<usize> = partitions.iter().map(Partition::len).collect();
        assert_eq!(sizes, vec![2, 3, 4, 5]);
        assert_eq!(
            partitions.classes(0).unwrap(),
            vec![vec![&0, &1, &2, &3], vec![&4]]
        );
    }

    #[test_log::test]
    fn rounds_refine_each_other() {
        for partitions in [refine(&chain()), refine(&redundant())] {
            for (coarse, fine) in partitions.iter().tuple_windows() {
                assert!(fine.refines(coarse));
                assert!(fine.len() > coarse.len());
            }
            assert!(partitions.rounds() <= partitions.states().len());
        }
    }

    #[test_log::test]
    fn classes_match_bounded_equivalence() {
        for machine in [chain(), redundant()] {
            let partitions = refine(&machine);
            let states = machine.states().to_vec();
            for (k, round) in partitions.iter().enumerate() {
                for (i, j) in (0..states.len()).tuple_combinations() {
                    let same = round.class_ids()[i] == round.class_ids()[j];
                    assert_eq!(
                        same,
                        agree_up_to(&machine, states[i], states[j], k + 1),
                        "round {} states {} and {}",
                        k,
                        states[i],
                        states[j]
                    );
                }
            }
        }
    }

    #[test_log::test]
    fn equivalent_states_reach_a_fixed_point() {
        let machine = redundant();
        let partitions = refine(&machine);

        assert!(!partitions.is_discrete());
        assert_eq!(partitions.last().len(), 2);
        assert!(partitions.equivalent(&1, &2).unwrap());
        assert!(!partitions.equivalent(&0, &1).unwrap());
        assert!(partitions.equivalent(&0, &7).is_err());
    }

    #[test_log::test]
    fn refinement_is_reproducible() {
        let machine = chain();
        assert_eq!(refine(&machine).last(), refine(&machine).last());
    }
}
