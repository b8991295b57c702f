use color_eyre::eyre::{Result, WrapErr};
use serde::Serialize;
use std::collections::HashMap;

use crate::dfa::{construct_dfa, DFA};
use crate::nfa::{construct_nfa, NFA};
use crate::token_spec::{TokenMode, TokenSpec};

#[derive(Debug, Clone, Serialize)]
pub struct TokenEntry {
    name: String,
    mode: TokenMode,
    dfa: DFA,
}

impl TokenEntry {
    pub fn get_name(&self) -> &str {
        &self.name
    }

    pub fn get_mode(&self) -> TokenMode {
        self.mode
    }

    pub fn get_dfa(&self) -> &DFA {
        &self.dfa
    }
}

/// Compiled tokens, iterated in the order they were inserted
#[derive(Debug, Clone, Default, Serialize)]
pub struct TokenTable {
    tokens: Vec<TokenEntry>,
    #[serde(skip)]
    index: HashMap<String, usize>,
}

impl TokenTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a token at the end of the table. Returns false and leaves the table untouched when
    /// the name is already present.
    pub fn insert(&mut self, name: &str, mode: TokenMode, dfa: DFA) -> bool {
        if self.index.contains_key(name) {
            return false;
        }
        self.index.insert(name.to_string(), self.tokens.len());
        self.tokens.push(TokenEntry {
            name: name.to_string(),
            mode,
            dfa,
        });
        true
    }

    pub fn get(&self, name: &str) -> Option<&TokenEntry> {
        self.index.get(name).map(|&idx| &self.tokens[idx])
    }

    pub fn iter(&self) -> impl Iterator<Item = &TokenEntry> {
        self.tokens.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tokens.iter().map(|token| token.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

/// Compile every token in order, handing each intermediate NFA and final DFA to `inspect`.
/// The first token that fails aborts the whole batch and no table is returned.
pub fn construct_token_table_with<F>(
    token_list: &[TokenSpec],
    mut inspect: F,
) -> Result<TokenTable>
where
    F: FnMut(&TokenSpec, &NFA, &DFA) -> Result<()>,
{
    let mut table = TokenTable::new();

    for token in token_list {
        let nfa = construct_nfa(&token.regex)
            .wrap_err_with(|| format!("failed to parse regex: token '{}'", token.name))?;
        let dfa = construct_dfa(&nfa);

        inspect(token, &nfa, &dfa)?;

        if !table.insert(&token.name, token.mode, dfa) {
            color_eyre::eyre::bail!("duplicate token '{}'", token.name);
        }
    }
    Ok(table)
}

/// Compile every token in order. The first token that fails aborts the whole batch.
pub fn construct_token_table(token_list: &[TokenSpec]) -> Result<TokenTable> {
    construct_token_table_with(token_list, |_, _, _| Ok(()))
}

#[cfg(test)]
mod token_table_tests {
    use super::*;
    use crate::fa::FA;
    use crate::regex::RegExError;
    use crate::token_spec::parse_token_spec;

    #[test]
    fn test_insertion_order() {
        let tokens = parse_token_spec("ZED z\nALPHA a\nMID m\n").unwrap();
        let table = construct_token_table(&tokens).unwrap();

        let names: Vec<&str> = table.names().collect();
        assert_eq!(names, vec!["ZED", "ALPHA", "MID"]);
        assert_eq!(table.len(), 3);
        assert!(!table.is_empty());
    }

    #[test]
    fn test_lookup() {
        let tokens = parse_token_spec("-WS /s+\nDOT .\n").unwrap();
        let table = construct_token_table(&tokens).unwrap();

        let ws = table.get("WS").unwrap();
        assert_eq!(ws.get_mode(), TokenMode::Ignore);
        assert_eq!(ws.get_dfa().get_regex(), "/s+");

        let dot = table.get("DOT").unwrap();
        assert_eq!(dot.get_dfa().get_num_states(), 2);
        assert!(table.get("MISSING").is_none());
    }

    #[test]
    fn test_insert_rejects_duplicates() {
        let dfa = construct_dfa(&construct_nfa("a").unwrap());
        let mut table = TokenTable::new();

        assert!(table.insert("A", TokenMode::Standard, dfa.clone()));
        assert!(!table.insert("A", TokenMode::Save, dfa));
        assert_eq!(table.len(), 1);
        assert_eq!(table.get("A").unwrap().get_mode(), TokenMode::Standard);
    }

    #[test]
    fn test_first_failure_aborts_batch() {
        let tokens = parse_token_spec("GOOD a\nBAD a{5-2}\nLATER b\n").unwrap();
        let mut inspected: Vec<String> = Vec::new();

        let result = construct_token_table_with(&tokens, |token, _, _| {
            inspected.push(token.name.clone());
            Ok(())
        });

        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(err.to_string().contains("token 'BAD'"));
        assert!(matches!(
            err.root_cause().downcast_ref::<RegExError>(),
            Some(RegExError::BoundsError(_))
        ));
        assert_eq!(inspected, vec!["GOOD".to_string()]);
    }

    #[test]
    fn test_serialize_table() {
        let tokens = parse_token_spec("+A a\n").unwrap();
        let table = construct_token_table(&tokens).unwrap();
        let json = serde_json::to_value(&table).unwrap();

        assert_eq!(json["tokens"][0]["name"], "A");
        assert_eq!(json["tokens"][0]["mode"], "Save");
        assert!(json.get("index").is_none());
    }
}
