/* Perform subset construction to convert an NFA into a DFA. Omega edges of the NFA fire on every
 * character, so they join the successor of every explicit character and also form the default
 * successor for all other characters. */

use crate::fa::{Symbol, FA};
use crate::nfa::NFA;
use bitvec::prelude::*;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};
use std::fmt;
use std::hash::{DefaultHasher, Hash, Hasher};

/// A struct which is a bitvec and its hash stored together to ease fetching the hash of the bitvec
/// quickly instead of calculating it each time.
#[derive(Clone)]
struct HashedBitVec {
    bv: BitVec<u8>,
    hash: u64,
}

impl HashedBitVec {
    fn new(bv: BitVec<u8>) -> Self {
        let mut hasher = DefaultHasher::new();
        bv.hash(&mut hasher);
        let hash = hasher.finish();
        Self { bv, hash }
    }
}

impl Hash for HashedBitVec {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.hash);
    }
}

impl PartialEq for HashedBitVec {
    fn eq(&self, other: &Self) -> bool {
        self.hash == other.hash && self.bv == other.bv
    }
}

impl Eq for HashedBitVec {}

/// Outgoing edges of a DFA state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transitions {
    /// Every character leads to the same state
    Default(usize),
    /// Listed characters go to their own state, all others take `default` when there is one
    Explicit {
        map: BTreeMap<char, usize>,
        default: Option<usize>,
    },
}

impl Transitions {
    // Collapse to the single default form when no character stands out from the default
    fn new(map: BTreeMap<char, usize>, default: Option<usize>) -> Self {
        match default {
            Some(target) if map.values().all(|&dest| dest == target) => {
                Transitions::Default(target)
            }
            _ => Transitions::Explicit { map, default },
        }
    }

    /// The state reached on `ch`, if any
    pub fn next_state(&self, ch: char) -> Option<usize> {
        match self {
            Transitions::Default(target) => Some(*target),
            Transitions::Explicit { map, default } => map.get(&ch).copied().or(*default),
        }
    }

    pub fn get_default(&self) -> Option<usize> {
        match self {
            Transitions::Default(target) => Some(*target),
            Transitions::Explicit { default, .. } => *default,
        }
    }
}

fn serialize_transitions<S>(transitions: &Transitions, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    let (map, default) = match transitions {
        Transitions::Default(target) => (None, Some(*target)),
        Transitions::Explicit { map, default } => (Some(map), *default),
    };

    let len = map.map_or(0, |map| map.len()) + usize::from(default.is_some());
    let mut ser_map = serializer.serialize_map(Some(len))?;

    if let Some(map) = map {
        for (ch, target) in map {
            ser_map.serialize_entry(&ch.to_string(), target)?;
        }
    }
    if let Some(target) = default {
        ser_map.serialize_entry("default", &target)?;
    }
    ser_map.end()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DFAState {
    is_accepting: bool,
    #[serde(serialize_with = "serialize_transitions")]
    transitions: Transitions,
}

/// A deterministic automaton whose start state is state 0
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DFA {
    states: Vec<DFAState>,
    regex: String,
}

impl DFAState {
    fn new(is_accepting: bool) -> Self {
        DFAState {
            is_accepting,
            transitions: Transitions::Explicit {
                map: BTreeMap::new(),
                default: None,
            },
        }
    }

    pub fn is_accepting(&self) -> bool {
        self.is_accepting
    }

    pub fn get_transitions(&self) -> &Transitions {
        &self.transitions
    }
}

impl FA for DFA {
    fn get_num_states(&self) -> usize {
        self.states.len()
    }

    fn get_acceptor_states(&self) -> BitVec<u8> {
        self.states.iter().map(|state| state.is_accepting).collect()
    }

    fn get_state_transitions(&self, state_id: usize) -> Vec<(Symbol, usize)> {
        let mut transition_list: Vec<(Symbol, usize)> = Vec::new();
        if let Transitions::Explicit { map, .. } = &self.states[state_id].transitions {
            for (ch, target) in map {
                transition_list.push((Symbol::Char(*ch), *target));
            }
        }
        if let Some(target) = self.states[state_id].transitions.get_default() {
            transition_list.push((Symbol::Other, target));
        }
        transition_list
    }
}

impl DFA {
    fn new() -> Self {
        DFA {
            states: Vec::new(),
            regex: String::new(),
        }
    }

    fn add_state(&mut self, is_accepting: bool) -> usize {
        let state_id = self.states.len();
        self.states.push(DFAState::new(is_accepting));
        state_id
    }

    pub fn get_state(&self, id: usize) -> Option<&DFAState> {
        self.states.get(id)
    }

    pub fn states(&self) -> &[DFAState] {
        &self.states
    }

    /// The state reached from `state_id` on `ch`: the explicit transition if there is one,
    /// otherwise the default one. None means the input is rejected.
    pub fn next_state(&self, state_id: usize, ch: char) -> Option<usize> {
        self.states.get(state_id)?.transitions.next_state(ch)
    }

    /// The regular expression this automaton was built from
    pub fn get_regex(&self) -> &str {
        &self.regex
    }
}

impl fmt::Display for DFA {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (state_id, state) in self.states.iter().enumerate() {
            write!(f, "{}: ", state_id)?;
            match &state.transitions {
                Transitions::Default(target) => write!(f, "default->{}", target)?,
                Transitions::Explicit { map, default } => {
                    write!(f, "{{")?;
                    for (idx, (ch, target)) in map.iter().enumerate() {
                        if idx > 0 {
                            write!(f, ", ")?;
                        }
                        write!(f, "{:?}->{}", ch, target)?;
                    }
                    write!(f, "}}")?;
                    if let Some(target) = default {
                        write!(f, " default->{}", target)?;
                    }
                }
            }
            if state.is_accepting {
                write!(f, " accept")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

fn get_epsilon_closure(nfa: &NFA, nfa_states: BitVec<u8>) -> HashedBitVec {
    let mut epsilon_closure = nfa_states;

    let mut nfa_states: VecDeque<usize> = epsilon_closure.iter_ones().collect();

    while let Some(state) = nfa_states.pop_front() {
        let Some(state) = nfa.get_state(state) else {
            continue;
        };

        for &target in state.get_epsilon_transitions() {
            if !epsilon_closure[target] {
                epsilon_closure.set(target, true);
                nfa_states.push_back(target);
            }
        }
    }

    HashedBitVec::new(epsilon_closure)
}

// The characters with an explicit transition out of q, and the targets of its omega transitions
fn get_moves(nfa: &NFA, q: &HashedBitVec) -> (BTreeSet<char>, BitVec<u8>) {
    let mut alphabet = BTreeSet::new();
    let mut omega_targets = BitVec::repeat(false, q.bv.len());

    for node in q.bv.iter_ones() {
        let Some(nfa_state) = nfa.get_state(node) else {
            continue;
        };
        for (ch, _) in nfa_state.get_char_transitions() {
            alphabet.insert(*ch);
        }
        for &target in nfa_state.get_omega_transitions() {
            omega_targets.set(target, true);
        }
    }
    (alphabet, omega_targets)
}

// This function returns the set of states reachable via char c from the set q, omega targets
// included
fn delta(nfa: &NFA, q: &HashedBitVec, c: char, omega_targets: &BitVec<u8>) -> BitVec<u8> {
    let mut result = omega_targets.clone();
    for node in q.bv.iter_ones() {
        let Some(nfa_state) = nfa.get_state(node) else {
            continue;
        };
        for &(ch, target) in nfa_state.get_char_transitions() {
            if ch == c {
                result.set(target, true);
            }
        }
    }
    result
}

struct SubsetConstruction<'a> {
    nfa: &'a NFA,
    result: DFA,
    q_list: HashMap<HashedBitVec, usize>, // Mapping from nfa state set to DFA state
    work_list: VecDeque<HashedBitVec>,
}

impl<'a> SubsetConstruction<'a> {
    fn new(nfa: &'a NFA) -> Self {
        SubsetConstruction {
            nfa,
            result: DFA::new(),
            q_list: HashMap::new(),
            work_list: VecDeque::new(),
        }
    }

    /// The DFA state for the subset t, which is queued for processing if it is new
    fn get_dfa_state(&mut self, t: HashedBitVec) -> usize {
        if let Some(&existing_di) = self.q_list.get(&t) {
            return existing_di;
        }

        let nfa = self.nfa;
        let has_accept = t
            .bv
            .iter_ones()
            .any(|state| nfa.get_state(state).is_some_and(|state| state.is_accepting()));

        let di = self.result.add_state(has_accept);
        self.q_list.insert(t.clone(), di);
        self.work_list.push_back(t);
        di
    }

    fn run(mut self) -> DFA {
        let mut nfa_states = BitVec::repeat(false, self.nfa.get_num_states());
        nfa_states.set(self.nfa.get_start_state(), true);

        let q0 = get_epsilon_closure(self.nfa, nfa_states);
        self.get_dfa_state(q0);

        while let Some(q) = self.work_list.pop_front() {
            let dq = self.q_list[&q];
            let (alphabet, omega_targets) = get_moves(self.nfa, &q);

            let mut map = BTreeMap::new();
            for c in alphabet {
                let end_states = delta(self.nfa, &q, c, &omega_targets);
                let t = get_epsilon_closure(self.nfa, end_states);
                map.insert(c, self.get_dfa_state(t));
            }

            let default = if omega_targets.any() {
                let t = get_epsilon_closure(self.nfa, omega_targets);
                Some(self.get_dfa_state(t))
            } else {
                None
            };

            self.result.states[dq].transitions = Transitions::new(map, default);
        }

        self.result.regex = self.nfa.get_regex().to_string();
        self.result
    }
}

///  Apply the subset construction algorithm on a finished NFA to build a DFA. Characters are
///  processed in ascending order, so the same NFA always yields the same numbering.
pub fn construct_dfa(nfa: &NFA) -> DFA {
    SubsetConstruction::new(nfa).run()
}
