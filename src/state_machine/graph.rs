use crate::state_machine::{MooreMachine, State, StateId};
use petgraph::Direction;
use petgraph::stable_graph::{NodeIndex, StableGraph};
use petgraph::visit::{Dfs, EdgeRef};
use std::collections::HashMap;
use std::fmt;

/// A directed graph view of a Moore machine.
///
/// Nodes are the machine's states and edges are its defined transitions,
/// labelled with the input symbol. Undefined pairs simply have no edge.
pub struct StateGraph {
    pub graph: StableGraph<State, String>,

    /// Maps state names to node indices
    pub state_index: HashMap<StateId, NodeIndex>,

    /// Node of the machine's initial state
    pub initial: NodeIndex,
}

impl StateGraph {
    /// Build the graph by resolving every (state, symbol) pair of `machine`
    pub fn from_machine<T>(machine: &MooreMachine<T>) -> Self
    where
        T: PartialEq + fmt::Debug + fmt::Display + Send + Sync,
    {
        let mut graph = StableGraph::new();
        let mut state_index = HashMap::new();

        for state in machine.states() {
            let idx = graph.add_node(state.clone());
            state_index.insert(state.name().to_string(), idx);
        }

        for state in machine.states() {
            let from_idx = state_index[state.name()];
            for symbol in machine.alphabet() {
                let Some(to) = machine.resolve(state, symbol) else {
                    continue;
                };
                graph.add_edge(from_idx, state_index[to.name()], symbol.to_string());
            }
        }

        let initial = state_index[machine.initial().name()];
        Self {
            graph,
            state_index,
            initial,
        }
    }

    /// States that no input sequence can reach from the initial state
    pub fn unreachable_states(&self) -> Vec<&State> {
        let mut reachable = Vec::new();
        let mut dfs = Dfs::new(&self.graph, self.initial);
        while let Some(idx) = dfs.next(&self.graph) {
            reachable.push(idx);
        }

        self.graph
            .node_indices()
            .filter(|idx| !reachable.contains(idx))
            .filter_map(|idx| self.graph.node_weight(idx))
            .collect()
    }

    /// States with no outgoing transitions other than self-loops
    pub fn trap_states(&self) -> Vec<&State> {
        self.graph
            .node_indices()
            .filter(|&idx| {
                self.graph
                    .edges_directed(idx, Direction::Outgoing)
                    .all(|edge| edge.target() == idx)
            })
            .filter_map(|idx| self.graph.node_weight(idx))
            .collect()
    }

    /// Whether some input sequence can revisit a state
    pub fn has_cycles(&self) -> bool {
        petgraph::algo::is_cyclic_directed(&self.graph)
    }

    /// Export to DOT format for Graphviz
    pub fn to_dot(&self) -> String {
        let mut dot = "digraph MooreMachine {\n".to_string();
        dot.push_str("  rankdir=LR;\n");
        dot.push_str("  node [shape=circle];\n");
        dot.push_str("  __start [shape=point];\n\n");

        for idx in self.graph.node_indices() {
            if let Some(state) = self.graph.node_weight(idx) {
                let shape = if idx == self.initial {
                    "doublecircle"
                } else {
                    "circle"
                };
                dot.push_str(&format!(
                    "  \"{}\" [shape={}];\n",
                    escape(state.name()),
                    shape
                ));
            }
        }

        if let Some(initial) = self.graph.node_weight(self.initial) {
            dot.push_str(&format!("  __start -> \"{}\";\n", escape(initial.name())));
        }
        dot.push('\n');

        for edge_idx in self.graph.edge_indices() {
            if let Some((from_idx, to_idx)) = self.graph.edge_endpoints(edge_idx)
                && let (Some(from), Some(to), Some(symbol)) = (
                    self.graph.node_weight(from_idx),
                    self.graph.node_weight(to_idx),
                    self.graph.edge_weight(edge_idx),
                )
            {
                dot.push_str(&format!(
                    "  \"{}\" -> \"{}\" [label=\"{}\"];\n",
                    escape(from.name()),
                    escape(to.name()),
                    escape(symbol)
                ));
            }
        }

        dot.push_str("}\n");
        dot
    }

    /// Get graph statistics
    pub fn stats(&self) -> GraphStats {
        GraphStats {
            total_states: self.graph.node_count(),
            total_transitions: self.graph.edge_count(),
            unreachable_states: self.unreachable_states().len(),
            trap_states: self.trap_states().len(),
            has_cycles: self.has_cycles(),
        }
    }
}

fn escape(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

#[derive(Debug, Clone)]
pub struct GraphStats {
    pub total_states: usize,
    pub total_transitions: usize,
    pub unreachable_states: usize,
    pub trap_states: usize,
    pub has_cycles: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state_machine::machine::tests::example_machine;
    use crate::state_machine::{MemorySink, TransitionTable};
    use std::sync::Arc;

    fn names(states: Vec<&State>) -> Vec<&str> {
        states.into_iter().map(State::name).collect()
    }

    #[test]
    fn test_example_graph() {
        let machine = example_machine(Arc::new(MemorySink::new()));
        let graph = StateGraph::from_machine(&machine);

        let stats = graph.stats();
        assert_eq!(stats.total_states, 2);
        assert_eq!(stats.total_transitions, 2);
        assert_eq!(stats.unreachable_states, 0);
        assert_eq!(stats.trap_states, 0);
        assert!(stats.has_cycles);
    }

    #[test]
    fn test_unreachable_and_trap_states() {
        let start = State::silent("Start");
        let done = State::silent("Done");
        let orphan = State::silent("Orphan");
        let table = TransitionTable::new()
            .define(&start, "go", &done)
            .unwrap()
            .define(&done, "go", &done)
            .unwrap()
            .define(&orphan, "go", &start)
            .unwrap();
        let machine = MooreMachine::new(
            vec!["go"],
            vec![start.clone(), done, orphan],
            start,
            table,
        )
        .unwrap();

        let graph = StateGraph::from_machine(&machine);
        assert_eq!(names(graph.unreachable_states()), vec!["Orphan"]);
        assert_eq!(names(graph.trap_states()), vec!["Done"]);
        assert!(graph.has_cycles());
    }

    #[test]
    fn test_acyclic_machine() {
        let start = State::silent("Start");
        let done = State::silent("Done");
        let table = TransitionTable::new().define(&start, 'x', &done).unwrap();
        let machine =
            MooreMachine::new(vec!['x'], vec![start.clone(), done], start, table).unwrap();

        let stats = StateGraph::from_machine(&machine).stats();
        assert!(!stats.has_cycles);
        assert_eq!(stats.trap_states, 1);
    }

    #[test]
    fn test_destination_outside_state_set_has_no_edge() {
        let s0 = State::silent("S0");
        let ghost = State::silent("Ghost");
        let table = TransitionTable::new()
            .define(&s0, 'a', &ghost)
            .unwrap()
            .define(&s0, 'b', &s0)
            .unwrap();
        let machine = MooreMachine::new(vec!['a', 'b'], vec![s0.clone()], s0, table).unwrap();

        let graph = StateGraph::from_machine(&machine);
        assert_eq!(graph.stats().total_states, 1);
        assert_eq!(graph.stats().total_transitions, 1);
        assert!(!graph.to_dot().contains("Ghost"));
    }

    #[test]
    fn test_to_dot_output() {
        let machine = example_machine(Arc::new(MemorySink::new()));
        let dot = StateGraph::from_machine(&machine).to_dot();

        assert!(dot.starts_with("digraph MooreMachine {"));
        assert!(dot.contains("\"S0\" [shape=doublecircle];"));
        assert!(dot.contains("__start -> \"S0\";"));
        assert!(dot.contains("\"S0\" -> \"S1\" [label=\"a\"];"));
        assert!(dot.contains("\"S1\" -> \"S0\" [label=\"b\"];"));
    }
}
