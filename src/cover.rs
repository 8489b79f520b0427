//! Covering paths rooted at the initial state.
//!
//! A [SpanningTree] records, for every state, the state and action it was first discovered
//! from. Walking the parent links back to the root gives the [StateCover]; extending it by one
//! action for every transition the tree does not use gives the edge cover.

use crate::error::{label, MachineError, Result};
use crate::machine::MealyMachine;
use crate::{Label, Word};
use itertools::Itertools;
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use tracing::{debug, info, trace};

/// The order in which the frontier is explored.
///
/// States are marked as discovered when they enter the frontier, and the successors of a state
/// are pushed in alphabet order, so both orders are reproducible.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum Traversal {
    /// First in, first out. Every covering path is a shortest path.
    #[default]
    BreadthFirst,
    /// Last in, first out. Paths may be longer than necessary.
    DepthFirst,
}

#[derive(Clone, Debug)]
pub struct SpanningTree<S, A> {
    root: S,
    parent: BTreeMap<S, (S, A)>,
    order: Vec<S>,
}

impl<S: Label, A: Label> SpanningTree<S, A> {
    /// Explores `machine` from its initial state.
    ///
    /// Fails with [MachineError::UnreachableStates] listing every state the exploration never
    /// reaches.
    pub fn build<O: Label>(machine: &MealyMachine<S, A, O>, traversal: Traversal) -> Result<Self> {
        let n = machine.size();
        let root = machine.initial_idx();
        let mut parent: Vec<Option<(usize, usize)>> = vec![None; n];
        let mut discovered = vec![false; n];
        let mut order = Vec::with_capacity(n);
        let mut frontier = VecDeque::from([root]);
        discovered[root] = true;

        loop {
            let next = match traversal {
                Traversal::BreadthFirst => frontier.pop_front(),
                Traversal::DepthFirst => frontier.pop_back(),
            };
            let Some(q) = next else {
                break;
            };

            trace!("visit {:?}", machine.state(q));
            order.push(q);
            for a in 0..machine.actions().len() {
                let (child, _) = machine.step(q, a);
                if discovered[child] {
                    continue;
                }
                trace!(
                    "    found {:?} via {:?}",
                    machine.state(child),
                    machine.action(a)
                );
                discovered[child] = true;
                parent[child] = Some((q, a));
                frontier.push_back(child);
            }
        }

        let unreachable: Vec<String> = (0..n)
            .filter(|q| !discovered[*q])
            .map(|q| label(machine.state(q)))
            .collect();
        if !unreachable.is_empty() {
            return Err(MachineError::UnreachableStates(unreachable));
        }

        debug!("spanning tree visits states in order {:?}", order);
        Ok(SpanningTree {
            root: machine.state(root).clone(),
            parent: parent
                .into_iter()
                .enumerate()
                .filter_map(|(q, link)| {
                    link.map(|(p, a)| {
                        (
                            machine.state(q).clone(),
                            (machine.state(p).clone(), machine.action(a).clone()),
                        )
                    })
                })
                .collect(),
            order: order.into_iter().map(|q| machine.state(q).clone()).collect(),
        })
    }

    pub fn root(&self) -> &S {
        &self.root
    }

    /// The states in the order they were visited.
    pub fn discovery_order(&self) -> &[S] {
        &self.order
    }

    /// Returns the state and action `state` was discovered from, `None` for the root.
    pub fn parent(&self, state: &S) -> Option<&(S, A)> {
        self.parent.get(state)
    }

    /// Reconstructs the word leading from the root to `state` along parent links.
    pub fn path_to(&self, state: &S) -> Option<Word<A>> {
        let mut path = Vec::new();
        let mut current = state;
        while *current != self.root {
            let (from, action) = self.parent.get(current)?;
            path.push(action.clone());
            current = from;
        }
        path.reverse();
        Some(path)
    }

    /// The transitions, as `(from, to, action)`, the tree is made of.
    pub fn tree_transitions(&self) -> BTreeSet<(S, S, A)> {
        self.parent
            .iter()
            .map(|(to, (from, action))| (from.clone(), to.clone(), action.clone()))
            .collect()
    }

    /// Returns the path to every state but the root.
    pub fn state_cover(&self) -> StateCover<S, A> {
        let paths = self
            .parent
            .keys()
            .filter_map(|state| Some((state.clone(), self.path_to(state)?)))
            .collect();
        StateCover {
            initial: self.root.clone(),
            paths,
        }
    }

    /// Returns the state cover words followed by one word for every transition outside the
    /// tree: the path to its source extended by its action.
    pub fn edge_cover<O: Label>(&self, machine: &MealyMachine<S, A, O>) -> Vec<Word<A>> {
        let cover = self.state_cover();
        let tree = self.tree_transitions();

        let extensions = machine
            .transitions()
            .filter(|t| !tree.contains(&(t.from.clone(), t.to.clone(), t.action.clone())))
            .filter_map(|t| {
                let mut path = self.path_to(&t.from)?;
                path.push(t.action);
                Some(path)
            });

        let words: Vec<Word<A>> = cover.words().cloned().chain(extensions).unique().collect();
        info!(
            "edge cover has {} words, {} from the state cover",
            words.len(),
            cover.len()
        );
        words
    }
}

/// A path from the initial state to every other state.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct StateCover<S, A> {
    initial: S,
    paths: BTreeMap<S, Word<A>>,
}

impl<S: Label, A: Label> StateCover<S, A> {
    pub fn initial(&self) -> &S {
        &self.initial
    }

    pub fn path_to(&self, state: &S) -> Option<&Word<A>> {
        self.paths.get(state)
    }

    /// The covering words, ordered by target state.
    pub fn words(&self) -> impl Iterator<Item = &Word<A>> {
        self.paths.values()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&S, &Word<A>)> {
        self.paths.iter()
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

/// Computes the state cover of `machine`.
///
/// ```
/// use wmethod::{state_cover, MachineBuilder, Traversal};
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
/// let cover = state_cover(&machine, Traversal::BreadthFirst).unwrap();
/// assert_eq!(cover.len(), 1);
/// assert_eq!(cover.path_to(&"B"), Some(&vec!['x']));
/// ```
pub fn state_cover<S: Label, A: Label, O: Label>(
    machine: &MealyMachine<S, A, O>,
    traversal: Traversal,
) -> Result<StateCover<S, A>> {
    Ok(SpanningTree::build(machine, traversal)?.state_cover())
}

/// Computes the edge cover of `machine`. Replayed from the initial state, its words take every
/// transition at least once.
pub fn edge_cover<S: Label, A: Label, O: Label>(
    machine: &MealyMachine<S, A, O>,
    traversal: Traversal,
) -> Result<Vec<Word<A>>> {
    Ok(SpanningTree::build(machine, traversal)?.edge_cover(machine))
}

/// Computes the state cover words followed by every one letter extension of the empty word
/// and of each state cover word. This covers every transition as well, at the cost of many
/// redundant words.
pub fn transition_cover<S: Label, A: Label, O: Label>(
    machine: &MealyMachine<S, A, O>,
    traversal: Traversal,
) -> Result<Vec<Word<A>>> {
    let cover = state_cover(machine, traversal)?;
    let prefixes: Vec<Word<A>> = std::iter::once(Vec::new())
        .chain(cover.words().cloned())
        .collect();

    let extensions = prefixes
        .iter()
        .cartesian_product(machine.actions())
        .map(|(prefix, action)| {
            let mut word = prefix.clone();
            word.push(action.clone());
            word
        });

    Ok(cover.words().cloned().chain(extensions).unique().collect())
}
