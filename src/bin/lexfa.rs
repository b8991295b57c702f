use clap::Parser;
use color_eyre::eyre::{Result, WrapErr};
use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use lexfa::fa::FA;
use lexfa::token_spec::{read_token_stream, TokenSpec};
use lexfa::{construct_token_table_with, read_token_file};

#[derive(Parser, Debug)]
#[command(
    name = "lexfa",
    version,
    about = "Compile token regular expressions into NFAs and DFAs for a scanner generator"
)]
struct Args {
    /// Token specification file, one `[mode] NAME regex...` entry per line. Reads stdin when omitted
    #[arg(value_name = "TOKEN FILE")]
    input: Option<PathBuf>,

    /// Save the NFA of every token as a Graphviz dot file
    #[arg(short = 'n', long)]
    save_nfa: bool,

    /// Save the DFA obtained after Subset Construction of every token as a Graphviz dot file
    #[arg(short = 'd', long)]
    save_dfa: bool,

    /// Directory the dot files are written to
    #[arg(long, value_name = "DIR", default_value = ".")]
    out_dir: PathBuf,

    /// Write the compiled token table as JSON
    #[arg(short, long, value_name = "OUTPUT FILE")]
    output: Option<PathBuf>,

    /// Print every automaton state by state as it is built
    #[arg(short, long)]
    verbose: bool,
}

fn read_tokens(args: &Args) -> Result<Vec<TokenSpec>> {
    let token_list = match &args.input {
        Some(path) => read_token_file(&path.to_string_lossy())?,
        None => read_token_stream(io::stdin().lock())?,
    };
    Ok(token_list)
}

fn save_dot<T: FA>(fa: &T, path: &Path) -> Result<()> {
    let mut dot_file = File::create(path)
        .wrap_err_with(|| format!("Failed to create dot file {}", path.display()))?;

    dot_file
        .write_all(fa.to_dot().as_bytes())
        .wrap_err_with(|| format!("Failed to write dot file {}", path.display()))?;
    Ok(())
}

fn write_output(args: &Args, token_list: &[TokenSpec]) -> Result<usize> {
    let table = construct_token_table_with(token_list, |token, nfa, dfa| {
        if args.verbose {
            println!("NFA for token '{}' ({}):\n{}", token.name, token.regex, nfa);
            println!("DFA for token '{}':\n{}", token.name, dfa);
        }
        if args.save_nfa {
            let path = args.out_dir.join(format!("{}_nfa.dot", token.name));
            save_dot(nfa, &path)?;
            println!("NFA for token '{}' saved as {}", token.name, path.display());
        }
        if args.save_dfa {
            let path = args.out_dir.join(format!("{}_dfa.dot", token.name));
            save_dot(dfa, &path)?;
            println!("DFA for token '{}' saved as {}", token.name, path.display());
        }
        Ok(())
    })?;

    if let Some(output) = &args.output {
        let out_file = File::create(output)
            .wrap_err_with(|| format!("Failed to create output file {}", output.display()))?;
        serde_json::to_writer_pretty(out_file, &table)?;
        println!("Token table saved as {}", output.display());
    }
    Ok(table.len())
}

fn main() -> ExitCode {
    if let Err(err) = color_eyre::install() {
        eprintln!("{:?}", err);
        return ExitCode::FAILURE;
    }

    let args = Args::parse();

    let token_list = match read_tokens(&args) {
        Ok(token_list) => token_list,
        Err(err) => {
            eprintln!("{:?}", err);
            return ExitCode::from(1);
        }
    };

    match write_output(&args, &token_list) {
        Ok(num_tokens) => {
            println!("Compiled {} tokens", num_tokens);
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("{:?}", err);
            ExitCode::from(2)
        }
    }
}
