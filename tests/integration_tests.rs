mod integration_tests_helper {

    use lexfa::construct_token_table;
    use lexfa::dfa::DFA;
    use lexfa::fa::FA;
    use lexfa::nfa::NFA;
    use lexfa::read_token_file;
    use lexfa::token_table::TokenTable;
    use std::collections::BTreeSet;

    pub fn get_table(token_path: &str) -> TokenTable {
        let token_list = read_token_file(token_path);

        // assert that reading the file was successful
        assert!(token_list.is_ok());

        let token_table = construct_token_table(&token_list.unwrap());

        // assert that every regex compiled
        assert!(token_table.is_ok());

        token_table.unwrap()
    }

    pub fn dfa_accepts(dfa: &DFA, input: &str) -> bool {
        let mut state = dfa.get_start_state();
        for ch in input.chars() {
            match dfa.next_state(state, ch) {
                Some(next) => state = next,
                None => return false,
            }
        }
        dfa.get_state(state).unwrap().is_accepting()
    }

    fn epsilon_closure(nfa: &NFA, mut states: BTreeSet<usize>) -> BTreeSet<usize> {
        let mut stack: Vec<usize> = states.iter().copied().collect();
        while let Some(state) = stack.pop() {
            for &target in nfa.get_state(state).unwrap().get_epsilon_transitions() {
                if states.insert(target) {
                    stack.push(target);
                }
            }
        }
        states
    }

    pub fn nfa_accepts(nfa: &NFA, input: &str) -> bool {
        let mut current = epsilon_closure(nfa, BTreeSet::from([nfa.get_start_state()]));

        for ch in input.chars() {
            let mut next = BTreeSet::new();
            for &state in &current {
                let state = nfa.get_state(state).unwrap();
                next.extend(state.get_omega_transitions().iter().copied());
                for &(c, target) in state.get_char_transitions() {
                    if c == ch {
                        next.insert(target);
                    }
                }
            }
            current = epsilon_closure(nfa, next);
        }

        current
            .iter()
            .any(|&state| nfa.get_state(state).unwrap().is_accepting())
    }
}

mod integration_tests {
    use crate::integration_tests_helper::{dfa_accepts, get_table, nfa_accepts};

    use lexfa::fa::FA;
    use lexfa::regex::RegExError;
    use lexfa::token_spec::{TokenMode, TokenSpecError};
    use lexfa::{construct_dfa, construct_nfa, construct_token_table, read_token_file};

    #[test]
    fn test_sample_table() {
        let table = get_table("test_data/sample.tok");

        let names: Vec<&str> = table.names().collect();
        assert_eq!(names, vec!["IDENT", "NUMBER", "WS", "STRING", "KEYWORD", "BAD"]);

        let modes: Vec<TokenMode> = table.iter().map(|token| token.get_mode()).collect();
        assert_eq!(
            modes,
            vec![
                TokenMode::Standard,
                TokenMode::Standard,
                TokenMode::Ignore,
                TokenMode::Save,
                TokenMode::Standard,
                TokenMode::Error
            ]
        );
    }

    #[test]
    fn test_sample_matches() {
        let table = get_table("test_data/sample.tok");
        let accepts =
            |name: &str, input: &str| dfa_accepts(table.get(name).unwrap().get_dfa(), input);

        assert!(accepts("IDENT", "abc1"));
        assert!(accepts("IDENT", "snake_case"));
        assert!(!accepts("IDENT", "1abc"));
        assert!(!accepts("IDENT", ""));

        assert!(accepts("NUMBER", "12345"));
        assert!(!accepts("NUMBER", ""));
        assert!(!accepts("NUMBER", "12a"));

        assert!(accepts("WS", "   "));
        assert!(accepts("WS", "\t"));
        assert!(accepts("WS", "\n"));
        assert!(!accepts("WS", " \t"));

        assert!(accepts("STRING", "\"hello there #1\""));
        assert!(accepts("STRING", "\"\""));
        assert!(!accepts("STRING", "\"unterminated"));

        assert!(accepts("KEYWORD", "if"));
        assert!(accepts("KEYWORD", "else"));
        assert!(accepts("KEYWORD", "while"));
        assert!(!accepts("KEYWORD", "iff"));

        assert!(accepts("BAD", "@"));
        assert!(!accepts("BAD", "@@"));
    }

    #[test]
    fn test_bounds_file() {
        let table = get_table("test_data/bounds.tok");
        let accepts =
            |name: &str, input: &str| dfa_accepts(table.get(name).unwrap().get_dfa(), input);

        assert!(accepts("HEX", "0x1"));
        assert!(accepts("HEX", "0xBEEF"));
        assert!(!accepts("HEX", "0x"));
        assert!(!accepts("HEX", "0x12345"));

        assert!(accepts("TRIPLE", "ababab"));
        assert!(!accepts("TRIPLE", "abab"));
        assert!(!accepts("TRIPLE", "abababab"));

        assert!(accepts("MANY", "zz"));
        assert!(accepts("MANY", "zzzzzz"));
        assert!(!accepts("MANY", "z"));
    }

    #[test]
    fn test_bad_regex_aborts_batch() {
        let token_list = read_token_file("test_data/bad_regex.tok").unwrap();
        let result = construct_token_table(&token_list);

        assert!(result.is_err());

        let err = result.unwrap_err();
        assert!(err.to_string().contains("token 'BROKEN'"));

        match err.root_cause().downcast_ref::<RegExError>() {
            Some(RegExError::SyntaxError(_)) => {}
            other => panic!("Expected a syntax error, got {:?}", other),
        }
    }

    #[test]
    fn test_duplicate_token() {
        let result = read_token_file("test_data/duplicate.tok");

        match result {
            Err(TokenSpecError::DuplicateToken(name, 2)) => assert_eq!(name, "NAME"),
            other => panic!("Expected a duplicate token error, got {:?}", other),
        }
    }

    #[test]
    fn test_dot_regex() {
        let dfa = construct_dfa(&construct_nfa(".").unwrap());

        assert_eq!(dfa.get_num_states(), 2);
        assert_eq!(dfa.get_state_transitions(0).len(), 1);
        assert_eq!(dfa.next_state(0, 'q'), Some(1));
        assert!(dfa.get_state(1).unwrap().is_accepting());
    }

    #[test]
    fn test_nfa_dfa_agree() {
        let regexes = [
            "a*",
            "a+",
            "a{3}",
            "a{2-4}",
            "(ab|cd)*",
            "[a-c]+d?",
            "(a|.)(b|.)",
            "x.*y",
            "((a|b){2})+",
        ];
        let inputs = [
            "", "a", "aa", "aaa", "aaaa", "aaaaa", "ab", "cd", "abcd", "cdab", "abc", "d", "bd",
            "xy", "xay", "xyy", "yx", "abab", "ba", "bbaa", "bab",
        ];

        for regex in regexes {
            let nfa = construct_nfa(regex).unwrap();
            let dfa = construct_dfa(&nfa);

            for input in inputs {
                assert_eq!(
                    nfa_accepts(&nfa, input),
                    dfa_accepts(&dfa, input),
                    "regex {} input {:?}",
                    regex,
                    input
                );
            }
        }
    }

    #[test]
    fn test_dot_export() {
        let nfa = construct_nfa("a|b.").unwrap();
        let dfa = construct_dfa(&nfa);

        let nfa_dot = nfa.to_dot();
        assert!(nfa_dot.contains("any"));
        assert!(nfa_dot.contains("𝛆"));

        let dfa_dot = dfa.to_dot();
        assert!(dfa_dot.contains("other"));
        assert!(!dfa_dot.contains("𝛆"));

        let star_dot = construct_dfa(&construct_nfa("a*").unwrap()).to_dot();
        assert!(star_dot.contains("Start/Accept"));
    }
}
