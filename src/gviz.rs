use crate::machine::MealyMachine;
use crate::Label;

/// A Graphviz rendering of a [MealyMachine]. Convert it into a `String` to get the DOT text.
///
/// ```
/// use wmethod::gviz::GvGraph;
/// use wmethod::MachineBuilder;
///
/// let machine = MachineBuilder::new()
///     .with_transition("A", 'x', "A", 0)
///     .with_initial("A")
///     .build()
///     .unwrap();
///
/// let dot: String = GvGraph::from(&machine).into();
/// assert!(dot.contains("n0 -> n0 [label=\"'x'/0\"];"));
/// ```
pub struct GvGraph {
    nodes: Vec<GvNode>,
    edges: Vec<GvEdge>,
}

impl GvGraph {
    fn new() -> Self {
        GvGraph {
            nodes: Vec::new(),
            edges: Vec::new(),
        }
    }
}

struct GvNode {
    id: String,
    label: String,
    peripheries: u8,
    initial: bool,
}

struct GvEdge {
    label: String,
    head: String,
    tail: String,
}

fn escape(text: &str) -> String {
    text.replace('\\', "\\\\").replace('"', "\\\"")
}

impl From<GvGraph> for String {
    fn from(graph: GvGraph) -> Self {
        let mut spec = String::new();

        // Begin a new graph definition.
        spec.push_str("digraph machine {\n");
        spec.push_str("graph [center=true pad=.5];\n");
        spec.push_str("rankdir=LR;\n");

        for node in graph.nodes {
            let style = if node.initial { ",style=bold" } else { "" };
            spec.push_str(&format!(
                "{}[shape=circle,peripheries={},label=\"{}\"{}];\n",
                node.id, node.peripheries, node.label, style
            ));
        }

        for edge in graph.edges {
            spec.push_str(&format!(
                "{} -> {} [label=\"{}\"];\n",
                edge.head, edge.tail, edge.label
            ));
        }

        // Close the graph definition block.
        spec.push_str("}\n");

        spec
    }
}

impl<S: Label, A: Label, O: Label> From<&MealyMachine<S, A, O>> for GvGraph {
    fn from(machine: &MealyMachine<S, A, O>) -> Self {
        let mut gv = GvGraph::new();

        for (q, state) in machine.states().iter().enumerate() {
            // Double line for final states.
            let peripheries = match machine.final_states().contains(state) {
                true => 2,
                false => 1,
            };

            // Each state gets a GvNode.
            gv.nodes.push(GvNode {
                id: format!("n{}", q),
                label: escape(&format!("{:?}", state)),
                peripheries,
                initial: q == machine.initial_idx(),
            });

            // Each transition gets a GvEdge.
            for (a, action) in machine.actions().iter().enumerate() {
                let (to, output) = machine.step(q, a);
                gv.edges.push(GvEdge {
                    label: escape(&format!("{:?}/{:?}", action, output)),
                    head: format!("n{}", q),
                    tail: format!("n{}", to),
                });
            }
        }

        gv
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::machine::tests::two_state;
    use crate::machine::MachineBuilder;

    #[test_log::test]
    fn renders_states_and_transitions() {
        let dot: String = GvGraph::from(&two_state()).into();

        assert!(dot.starts_with("digraph machine {\n"));
        assert!(dot.ends_with("}\n"));
        assert!(dot.contains("n0[shape=circle,peripheries=1,label=\"\\\"A\\\"\",style=bold];"));
        assert!(dot.contains("n1[shape=circle,peripheries=1,label=\"\\\"B\\\"\"];"));
        assert!(dot.contains("n0 -> n1 [label=\"'x'/0\"];"));
        assert_eq!(dot.matches("->").count(), 4);
    }

    #[test_log::test]
    fn final_states_get_a_double_line() {
        let machine = MachineBuilder::new()
            .with_transition(1, 'a', 2, 'o')
            .with_transition(2, 'a', 1, 'o')
            .with_initial(1)
            .with_final(2)
            .build()
            .unwrap();
        let dot: String = GvGraph::from(&machine).into();
        assert!(dot.contains("n1[shape=circle,peripheries=2,label=\"2\"];"));
    }
}
