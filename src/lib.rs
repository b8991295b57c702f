//! # lexfa
//!
//! The automaton building front end of a scanner generator. Each token is described by a
//! regular expression which is turned into a finite automaton a scanner can run.
//!
//! This library provides functionality to:
//! - Parse regular expressions while building their NFA directly, without a syntax tree
//! - Convert NFAs to DFAs using Subset Construction
//! - Read token specification files and compile them into an ordered token table
//! - Export the automata as Graphviz graphs and readable dumps

// Re-export the modules
pub mod dfa;
pub mod fa;
pub mod nfa;
pub mod regex;
pub mod token_spec;
pub mod token_table;

// Re-export commonly used functions for convenience
pub use dfa::construct_dfa;
pub use nfa::construct_nfa;
pub use token_spec::{parse_token_spec, read_token_file, read_token_stream};
pub use token_table::{construct_token_table, construct_token_table_with};
