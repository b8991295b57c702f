use lexfa::fa::FA;
use lexfa::{construct_dfa, construct_nfa, construct_token_table, parse_token_spec};

use std::fs::File;
use std::io::Write;
use std::path::Path;

fn main() {
    let regex = "(ab|cd)*e";

    let root = env!("CARGO_MANIFEST_DIR");
    let path = Path::new(root);

    let nfa = construct_nfa(regex).unwrap();
    let dfa = construct_dfa(&nfa);

    println!("NFA for {}:\n{}", regex, nfa);
    println!("DFA for {}:\n{}", regex, dfa);

    let dot_path = path.join("demos/constructed_dfa.dot");
    let mut dot_file = File::create(&dot_path).unwrap();
    dot_file.write_all(dfa.to_dot().as_bytes()).unwrap();
    println!("DFA vizualization saved as {}", dot_path.display());

    let tokens = parse_token_spec("IDENT [a-z][a-z0-9]*\nNUMBER [0-9]{1-3}\n-WS /s+\n").unwrap();
    let table = construct_token_table(&tokens).unwrap();

    for token in table.iter() {
        println!(
            "The token is {} and its DFA has {} states",
            token.get_name(),
            token.get_dfa().get_num_states()
        );
    }
}
