use bitvec::prelude::*;
use color_eyre::eyre::Result;
use std::collections::BTreeSet;
use std::fmt;

use crate::fa::{Symbol, FA};
use crate::regex::build_nfa;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NFAState {
    is_accepting: bool,
    epsilon_transitions: BTreeSet<usize>,
    omega_transitions: BTreeSet<usize>,
    char_transitions: Vec<(char, usize)>, // Multimap, the same pair may appear more than once
}

/// A nondeterministic automaton kept in an append-only arena. State 0 is the start state and
/// every transition refers to its target by index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NFA {
    states: Vec<NFAState>,
    regex: String,
}

impl NFAState {
    pub fn is_accepting(&self) -> bool {
        self.is_accepting
    }

    pub fn get_epsilon_transitions(&self) -> &BTreeSet<usize> {
        &self.epsilon_transitions
    }

    pub fn get_omega_transitions(&self) -> &BTreeSet<usize> {
        &self.omega_transitions
    }

    /// Character transitions in the order they were added, duplicates included
    pub fn get_char_transitions(&self) -> &[(char, usize)] {
        &self.char_transitions
    }
}

impl FA for NFA {
    fn get_num_states(&self) -> usize {
        self.states.len()
    }

    fn get_acceptor_states(&self) -> BitVec<u8> {
        self.states.iter().map(|state| state.is_accepting).collect()
    }

    fn get_state_transitions(&self, state_id: usize) -> Vec<(Symbol, usize)> {
        let state = &self.states[state_id];
        let mut transition_list: Vec<(Symbol, usize)> = Vec::new();

        for target in &state.epsilon_transitions {
            transition_list.push((Symbol::Epsilon, *target));
        }
        for target in &state.omega_transitions {
            transition_list.push((Symbol::Omega, *target));
        }
        for (ch, target) in &state.char_transitions {
            transition_list.push((Symbol::Char(*ch), *target));
        }
        transition_list
    }
}

impl NFA {
    /// An automaton holding only the start state
    pub(crate) fn new() -> Self {
        NFA {
            states: vec![NFAState::default()],
            regex: String::new(),
        }
    }

    pub(crate) fn add_state(&mut self) -> usize {
        let state_id = self.states.len();
        self.states.push(NFAState::default());
        state_id
    }

    pub(crate) fn add_epsilon_transition(&mut self, from: usize, to: usize) {
        self.states[from].epsilon_transitions.insert(to);
    }

    pub(crate) fn add_omega_transition(&mut self, from: usize, to: usize) {
        self.states[from].omega_transitions.insert(to);
    }

    pub(crate) fn add_char_transition(&mut self, from: usize, ch: char, to: usize) {
        self.states[from].char_transitions.push((ch, to));
    }

    pub(crate) fn set_accept_state(&mut self, state_id: usize) {
        self.states[state_id].is_accepting = true;
    }

    pub(crate) fn set_regex(&mut self, regex: String) {
        self.regex = regex;
    }

    pub fn get_state(&self, id: usize) -> Option<&NFAState> {
        self.states.get(id)
    }

    pub fn states(&self) -> &[NFAState] {
        &self.states
    }

    /// The regular expression this automaton was built from
    pub fn get_regex(&self) -> &str {
        &self.regex
    }
}

impl fmt::Display for NFA {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (state_id, state) in self.states.iter().enumerate() {
            write!(
                f,
                "{}: eps={:?} omega={:?} chars={{",
                state_id, state.epsilon_transitions, state.omega_transitions
            )?;
            for (idx, (ch, target)) in state.char_transitions.iter().enumerate() {
                if idx > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{:?}->{}", ch, target)?;
            }
            write!(f, "}}")?;
            if state.is_accepting {
                write!(f, " accept")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Build the NFA for a single regular expression. Nothing of a partially built automaton
/// survives a failed parse; the returned report wraps a [`crate::regex::RegExError`].
pub fn construct_nfa(regex: &str) -> Result<NFA> {
    let mut result = build_nfa(regex)?;
    result.set_regex(regex.to_string());
    Ok(result)
}

#[cfg(test)]
mod nfa_tests {
    use super::*;

    #[test]
    fn test_new_nfa_has_start_state() {
        let nfa = NFA::new();
        assert_eq!(nfa.get_num_states(), 1);
        assert_eq!(nfa.get_start_state(), 0);
        assert!(!nfa.get_acceptor_states().any());
    }

    #[test]
    fn test_char_transitions_keep_duplicates() {
        let mut nfa = NFA::new();
        let end = nfa.add_state();
        nfa.add_char_transition(0, 'a', end);
        nfa.add_char_transition(0, 'a', end);
        nfa.add_epsilon_transition(0, end);
        nfa.add_epsilon_transition(0, end);

        let state = nfa.get_state(0).unwrap();
        assert_eq!(state.get_char_transitions(), &[('a', end), ('a', end)]);
        assert_eq!(state.get_epsilon_transitions().len(), 1);
    }

    #[test]
    fn test_state_transitions_listing() {
        let mut nfa = NFA::new();
        let s1 = nfa.add_state();
        let s2 = nfa.add_state();
        nfa.add_epsilon_transition(0, s1);
        nfa.add_omega_transition(s1, s2);
        nfa.add_char_transition(0, 'x', s2);
        nfa.set_accept_state(s2);

        let transitions = nfa.get_state_transitions(0);
        assert_eq!(transitions, vec![(Symbol::Epsilon, s1), (Symbol::Char('x'), s2)]);
        assert_eq!(nfa.get_state_transitions(s1), vec![(Symbol::Omega, s2)]);

        let accepts: Vec<usize> = nfa.get_acceptor_states().iter_ones().collect();
        assert_eq!(accepts, vec![s2]);
    }

    #[test]
    fn test_construct_nfa_keeps_regex() {
        let nfa = construct_nfa("ab").unwrap();
        assert_eq!(nfa.get_regex(), "ab");
        assert_eq!(nfa.get_acceptor_states().count_ones(), 1);
    }

    #[test]
    fn test_construct_nfa_failure() {
        assert!(construct_nfa("(ab").is_err());
    }

    #[test]
    fn test_dump_format() {
        let nfa = construct_nfa("a").unwrap();
        let dump = nfa.to_string();

        assert_eq!(dump.lines().count(), nfa.get_num_states());
        assert!(dump.lines().next().unwrap().starts_with("0: "));
        assert!(dump.contains("'a'->"));
        assert_eq!(dump.matches(" accept").count(), 1);
    }
}
