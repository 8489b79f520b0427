//! Assembly of the test set `Z` and the self checks run on the derived artifacts.

use crate::characterize::{characterization_set, CharacterizationSet};
use crate::cover::{SpanningTree, StateCover, Traversal};
use crate::error::{label, MachineError, Result};
use crate::machine::MealyMachine;
use crate::partition::{refine, Partitions};
use crate::{Label, Word};
use itertools::{iproduct, Itertools};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info};

/// Knobs of the derivation.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct DerivationConfig {
    /// How covering paths are explored.
    pub traversal: Traversal,
    /// How many more states an implementation may have than the machine it is tested against.
    /// Every word of the alphabet up to this length is inserted between covering paths and `W`.
    pub extra_states: usize,
}

impl DerivationConfig {
    pub fn with_traversal(mut self, traversal: Traversal) -> Self {
        self.traversal = traversal;
        self
    }

    pub fn with_extra_states(mut self, extra_states: usize) -> Self {
        self.extra_states = extra_states;
        self
    }
}

/// The test set `Z`. Every word is meant to be applied from the initial state.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TestSet<A> {
    words: BTreeSet<Word<A>>,
}

impl<A: Label> TestSet<A> {
    /// The test words in lexicographic order.
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

    pub fn max_word_len(&self) -> usize {
        self.words.iter().map(Vec::len).max().unwrap_or(0)
    }

    /// Returns the outputs `machine` emits for every test word, read from its initial state.
    /// An implementation conforms if it reproduces them.
    pub fn expected_outputs<S: Label, O: Label>(
        &self,
        machine: &MealyMachine<S, A, O>,
    ) -> Result<BTreeMap<Word<A>, Vec<O>>> {
        self.words
            .iter()
            .map(|word| Ok((word.clone(), machine.apply(machine.initial(), word)?.1)))
            .collect()
    }
}

/// Returns every word over `actions` of exactly `len` letters.
fn words_of_length<A: Label>(actions: &[A], len: usize) -> Vec<Word<A>> {
    if len == 0 {
        return vec![Vec::new()];
    }
    std::iter::repeat(actions.iter().cloned())
        .take(len)
        .multi_cartesian_product()
        .collect()
}

/// Derives the test set `Z = ({ε} ∪ paths) · Σ^{≤k} · W` where `k` is `extra_states`.
///
/// With `k = 0` this is every covering path followed by every word of `W`, together with `W`
/// itself. If `W` is empty, because the machine has a single state or only equivalent ones,
/// the covering paths and their extensions are the test words.
///
/// ```
/// use wmethod::{characterization_set, derive_test_set, edge_cover, refine};
/// use wmethod::{MachineBuilder, Traversal};
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
/// let w = characterization_set(&machine, &refine(&machine)).unwrap();
/// let paths = edge_cover(&machine, Traversal::BreadthFirst).unwrap();
/// let z = derive_test_set(&machine, &paths, &w, 0);
///
/// assert!(z.contains(&['x']));
/// assert!(z.contains(&['x', 'y', 'x']));
/// assert_eq!(z.len(), paths.len() + w.len());
/// ```
pub fn derive_test_set<S, A, O, I>(
    machine: &MealyMachine<S, A, O>,
    paths: I,
    w: &CharacterizationSet<S, A>,
    extra_states: usize,
) -> TestSet<A>
where
    S: Label,
    A: Label,
    O: Label,
    I: IntoIterator,
    I::Item: AsRef<[A]>,
{
    let prefixes: Vec<Word<A>> = std::iter::once(Vec::new())
        .chain(paths.into_iter().map(|path| path.as_ref().to_vec()))
        .unique()
        .collect();
    let middles: Vec<Word<A>> = (0..=extra_states)
        .flat_map(|len| words_of_length(machine.actions(), len))
        .collect();
    let suffixes: Vec<Word<A>> = if w.is_empty() {
        vec![Vec::new()]
    } else {
        w.words().cloned().collect()
    };

    let words: BTreeSet<Word<A>> = iproduct!(&prefixes, &middles, &suffixes)
        .map(|(prefix, middle, suffix)| {
            prefix
                .iter()
                .chain(middle)
                .chain(suffix)
                .cloned()
                .collect::<Word<A>>()
        })
        .filter(|word| !word.is_empty())
        .collect();

    info!(
        "test set has {} words from {} prefixes, {} middles and {} suffixes",
        words.len(),
        prefixes.len(),
        middles.len(),
        suffixes.len()
    );
    TestSet { words }
}

/// Checks that for every pair of distinguishable states some word of `w` makes them emit
/// different outputs.
///
/// Fails with [MachineError::CharacterizationSetIncomplete] naming the first pair no word
/// separates.
pub fn distinguishing_inputs<S: Label, A: Label, O: Label>(
    machine: &MealyMachine<S, A, O>,
    partitions: &Partitions<S>,
    w: &CharacterizationSet<S, A>,
) -> Result<()> {
    let states = machine.states();
    for (q1, q2) in states.iter().tuple_combinations() {
        if partitions.equivalent(q1, q2)? {
            continue;
        }
        let mut separated = false;
        for word in w.words() {
            if machine.apply(q1, word)?.1 != machine.apply(q2, word)?.1 {
                separated = true;
                break;
            }
        }
        if !separated {
            return Err(MachineError::CharacterizationSetIncomplete {
                q1: label(q1),
                q2: label(q2),
            });
        }
    }
    debug!("characterization set separates all distinguishable pairs");
    Ok(())
}

/// Returns the states no path reaches from the initial state. Empty means the paths cover
/// every state.
pub fn test_state_cover<S, A, O, I>(machine: &MealyMachine<S, A, O>, paths: I) -> Result<BTreeSet<S>>
where
    S: Label,
    A: Label,
    O: Label,
    I: IntoIterator,
    I::Item: AsRef<[A]>,
{
    let mut missing: BTreeSet<S> = machine.states().iter().cloned().collect();
    missing.remove(machine.initial());
    for path in paths {
        for state in machine.states_visited(machine.initial(), path.as_ref())? {
            missing.remove(&state);
        }
    }
    Ok(missing)
}

/// Returns the transitions, as `(from, to, action)`, no path takes when replayed from the
/// initial state. Empty means the paths cover every transition.
pub fn test_edge_cover<S, A, O, I>(
    machine: &MealyMachine<S, A, O>,
    paths: I,
) -> Result<BTreeSet<(S, S, A)>>
where
    S: Label,
    A: Label,
    O: Label,
    I: IntoIterator,
    I::Item: AsRef<[A]>,
{
    let mut missing = machine.transitions_set();
    for path in paths {
        for transition in machine.transitions_used(machine.initial(), path.as_ref())? {
            missing.remove(&transition);
        }
    }
    Ok(missing)
}

/// Every artifact derived for one machine. The artifacts are computed once and never change;
/// derive a new suite if the machine changes.
#[derive(Clone, Debug)]
pub struct TestSuite<S, A> {
    pub partitions: Partitions<S>,
    pub characterization: CharacterizationSet<S, A>,
    pub state_cover: StateCover<S, A>,
    pub edge_cover: Vec<Word<A>>,
    pub test_set: TestSet<A>,
}

impl<S: Label, A: Label> TestSuite<S, A> {
    /// Runs the whole derivation: refinement, characterization, covering paths and assembly.
    /// The characterization set is checked before it is used.
    pub fn derive<O: Label>(
        machine: &MealyMachine<S, A, O>,
        config: &DerivationConfig,
    ) -> Result<Self> {
        info!(
            "deriving test suite for {} states with {:?}",
            machine.size(),
            config
        );

        let partitions = refine(machine);
        let characterization = characterization_set(machine, &partitions)?;
        distinguishing_inputs(machine, &partitions, &characterization)?;

        let tree = SpanningTree::build(machine, config.traversal)?;
        let state_cover = tree.state_cover();
        let edge_cover = tree.edge_cover(machine);
        let test_set = derive_test_set(machine, &edge_cover, &characterization, config.extra_states);

        Ok(TestSuite {
            partitions,
            characterization,
            state_cover,
            edge_cover,
            test_set,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::machine::tests::two_state;
    use crate::machine::MachineBuilder;
    use crate::partition::tests::redundant;

    /// A coffee machine: a second coin is refunded and pushing dispenses only when paid.
    fn vending() -> MealyMachine<&'static str, &'static str, &'static str> {
        MachineBuilder::new()
            .with_actions(["coin", "push"])
            .with_transition("idle", "coin", "paid", "ok")
            .with_transition("idle", "push", "idle", "nothing")
            .with_transition("paid", "coin", "paid", "refund")
            .with_transition("paid", "push", "idle", "coffee")
            .with_initial("idle")
            .build()
            .unwrap()
    }

    #[test_log::test]
    fn two_state_suite() {
        let machine = two_state();
        let suite = TestSuite::derive(&machine, &DerivationConfig::default()).unwrap();

        assert_eq!(suite.state_cover.path_to(&"B"), Some(&vec!['x']));
        assert_eq!(suite.characterization.len(), 1);
        let words: Vec<&Word<char>> = suite.test_set.words().collect();
        assert_eq!(
            words,
            vec![
                &vec!['x'],
                &vec!['x', 'x'],
                &vec!['x', 'x', 'x'],
                &vec!['x', 'y', 'x'],
                &vec!['y', 'x'],
            ]
        );
    }

    #[test_log::test]
    fn extra_states_insert_every_short_word() {
        let machine = two_state();
        let partitions = refine(&machine);
        let w = characterization_set(&machine, &partitions).unwrap();
        let paths = vec![vec!['x']];

        let z = derive_test_set(&machine, &paths, &w, 1);
        // {ε, x} · {ε, x, y} · {x}, where x·ε·x and ε·x·x coincide.
        assert_eq!(z.len(), 5);
        for word in [
            vec!['x'],
            vec!['x', 'x'],
            vec!['y', 'x'],
            vec!['x', 'x', 'x'],
            vec!['x', 'y', 'x'],
        ] {
            assert!(z.contains(&word), "missing {:?}", word);
        }
        assert_eq!(z.max_word_len(), 3);

        // Every word of up to two letters followed by x, plus the four letter words x·Σ²·x.
        let z = derive_test_set(&machine, &paths, &w, 2);
        assert_eq!(z.len(), 7 + 4);
    }

    #[test_log::test]
    fn single_state_machine_tests_its_transitions() {
        let machine = MachineBuilder::new()
            .with_transition("only", 'a', "only", 0)
            .with_transition("only", 'b', "only", 1)
            .with_initial("only")
            .build()
            .unwrap();
        let suite = TestSuite::derive(&machine, &DerivationConfig::default()).unwrap();

        assert!(suite.characterization.is_empty());
        assert!(suite.state_cover.is_empty());
        assert_eq!(
            suite.test_set.words().collect::<Vec<_>>(),
            vec![&vec!['a'], &vec!['b']]
        );
    }

    #[test_log::test]
    fn incomplete_characterization_is_detected() {
        let machine = vending();
        let partitions = refine(&machine);

        let good = CharacterizationSet::from_words([vec!["push"]]);
        assert!(distinguishing_inputs(&machine, &partitions, &good).is_ok());

        let bad = CharacterizationSet::from_words(Vec::<Word<&str>>::new());
        assert_eq!(
            distinguishing_inputs(&machine, &partitions, &bad),
            Err(MachineError::CharacterizationSetIncomplete {
                q1: "\"idle\"".into(),
                q2: "\"paid\"".into()
            })
        );
    }

    #[test_log::test]
    fn equivalent_states_need_no_separating_word() {
        let machine = redundant();
        let suite = TestSuite::derive(&machine, &DerivationConfig::default()).unwrap();

        // No word of W separates 1 and 2, and none has to.
        assert!(suite.partitions.equivalent(&1, &2).unwrap());
        assert_eq!(
            suite.characterization.words().collect::<Vec<_>>(),
            vec![&vec!['a']]
        );
        assert!(distinguishing_inputs(&machine, &suite.partitions, &suite.characterization).is_ok());

        assert_eq!(suite.edge_cover.len(), 6);
        assert_eq!(suite.test_set.len(), 7);
        assert!(suite.test_set.contains(&['b', 'b', 'a']));
    }

    #[test_log::test]
    fn cover_checks_name_what_is_missing() {
        let machine = vending();

        let missing = test_state_cover(&machine, Vec::<Word<&str>>::new()).unwrap();
        assert_eq!(missing, BTreeSet::from(["paid"]));

        let missing = test_edge_cover(&machine, [vec!["coin", "coin"]]).unwrap();
        assert_eq!(
            missing,
            BTreeSet::from([
                ("idle", "idle", "push"),
                ("paid", "idle", "push"),
            ])
        );
    }

    #[test_log::test]
    fn expected_outputs_come_from_the_initial_state() {
        let machine = vending();
        let suite = TestSuite::derive(&machine, &DerivationConfig::default()).unwrap();
        let expected = suite.test_set.expected_outputs(&machine).unwrap();

        assert_eq!(expected.len(), suite.test_set.len());
        assert_eq!(
            expected[&vec!["coin", "push", "coin"]],
            vec!["ok", "coffee", "ok"]
        );
        let edges = test_edge_cover(&machine, suite.test_set.words()).unwrap();
        assert!(edges.is_empty());
    }

    #[test_log::test]
    fn depth_first_config_gives_a_valid_suite() {
        let machine = vending();
        let config = DerivationConfig::default()
            .with_traversal(Traversal::DepthFirst)
            .with_extra_states(1);
        let suite = TestSuite::derive(&machine, &config).unwrap();

        assert!(test_state_cover(&machine, suite.state_cover.words())
            .unwrap()
            .is_empty());
        assert!(test_edge_cover(&machine, &suite.edge_cover)
            .unwrap()
            .is_empty());
        assert!(suite.test_set.len() > suite.edge_cover.len());
    }

    #[test_log::test]
    fn unreachable_states_abort_the_derivation() {
        let machine = MachineBuilder::new()
            .with_transition(0, 'a', 0, 0)
            .with_transition(1, 'a', 0, 1)
            .with_initial(0)
            .build()
            .unwrap();
        assert_eq!(
            TestSuite::derive(&machine, &DerivationConfig::default()).unwrap_err(),
            MachineError::UnreachableStates(vec!["1".into()])
        );
    }
}
