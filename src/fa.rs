use bitvec::prelude::BitVec;
use petgraph::dot::Dot;
use petgraph::graph::{EdgeIndex, NodeIndex};
use petgraph::prelude::StableGraph;
use std::collections::HashMap;
use std::fmt;

/// Label of an automaton edge.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy, PartialOrd, Ord)]
pub enum Symbol {
    /// Consumes no input
    Epsilon,
    /// Consumes exactly one arbitrary character
    Omega,
    /// Taken by every character a DFA state has no explicit transition for
    Other,
    Char(char),
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Symbol::Epsilon => write!(f, "𝛆"),
            Symbol::Omega => write!(f, "any"),
            Symbol::Other => write!(f, "other"),
            Symbol::Char(ch) => write!(f, "{}", ch.escape_default()),
        }
    }
}

pub trait FA {
    fn get_num_states(&self) -> usize;
    fn get_acceptor_states(&self) -> BitVec<u8>;
    /// Every outgoing edge of the state, one entry per (label, target) pair
    fn get_state_transitions(&self, state_id: usize) -> Vec<(Symbol, usize)>;

    fn get_start_state(&self) -> usize {
        0
    }

    /// Render the automaton as a Graphviz digraph. Parallel edges between the same
    /// pair of states are merged into one edge with a comma separated label.
    fn to_dot(&self) -> String {
        let mut stable_graph: StableGraph<String, String> = StableGraph::new();

        let num_states = self.get_num_states();
        let accept_states = self.get_acceptor_states();

        let mut edge_map: HashMap<(NodeIndex, NodeIndex), EdgeIndex> = HashMap::new();

        for state_idx in 0..num_states {
            let is_start = state_idx == self.get_start_state();
            let node_label = if is_start && accept_states[state_idx] {
                format!("Start/Accept\nState {}", state_idx)
            } else if is_start {
                format!("Start\nState {}", state_idx)
            } else if accept_states[state_idx] {
                format!("Accept\nState {}", state_idx)
            } else {
                format!("State {}", state_idx)
            };
            stable_graph.add_node(node_label);
        }

        for state_idx in 0..num_states {
            let mut transition_list = self.get_state_transitions(state_idx);
            transition_list.sort();

            for (symbol, target) in transition_list {
                let key = (NodeIndex::new(state_idx), NodeIndex::new(target));

                match edge_map.get(&key) {
                    Some(&edge_idx) => {
                        let new_label = format!("{}, {}", stable_graph[edge_idx], symbol);
                        stable_graph[edge_idx] = new_label;
                    }
                    None => {
                        let edge_idx = stable_graph.add_edge(key.0, key.1, symbol.to_string());
                        edge_map.insert(key, edge_idx);
                    }
                }
            }
        }

        Dot::new(&stable_graph).to_string()
    }
}
