/* Reader for token specification files. Each line names one token:
 *
 *     [mode] NAME fragment [fragment ...]   # comment
 *
 * The optional mode character is '.' (standard), '-' (ignore), '+' (save) or '!' (error).
 * Fragments are separated by whitespace and joined into one alternation. */

use serde::Serialize;
use std::collections::HashSet;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;

/// What the scanner does with a token once it is matched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum TokenMode {
    #[default]
    Standard,
    Ignore,
    Save,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenSpec {
    pub mode: TokenMode,
    pub name: String,
    pub regex: String,
}

/// List of possible errors while reading a token specification. Line numbers start at 1.
#[derive(Debug)]
pub enum TokenSpecError {
    FileOpenError(String),
    FileReadError(String),
    EmptyInput,
    InvalidTokenName(usize),
    MissingTokenName(usize),
    MissingRegex(usize),
    DuplicateToken(String, usize),
}

impl std::fmt::Display for TokenSpecError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenSpecError::FileOpenError(err_line) => write!(f, "{}", err_line),
            TokenSpecError::FileReadError(err_line) => write!(f, "{}", err_line),
            TokenSpecError::EmptyInput => write!(f, "Error: The token specification is empty!"),
            TokenSpecError::InvalidTokenName(line) => {
                write!(f, "Error: Invalid token name on line {}", line)
            }
            TokenSpecError::MissingTokenName(line) => {
                write!(f, "Error: No token name provided on line {}", line)
            }
            TokenSpecError::MissingRegex(line) => {
                write!(f, "Error: No regex provided on line {}", line)
            }
            TokenSpecError::DuplicateToken(name, line) => {
                write!(f, "Error: Duplicate token '{}' on line {}", name, line)
            }
        }
    }
}

impl std::error::Error for TokenSpecError {}

fn valid_name_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_' || ch == '-'
}

// None for lines holding nothing but whitespace or a comment
fn parse_line(line: &str, line_number: usize) -> Result<Option<TokenSpec>, TokenSpecError> {
    let content = match line.find('#') {
        Some(idx) => &line[..idx],
        None => line,
    };
    let content = content.trim();

    if content.is_empty() {
        return Ok(None);
    }

    let mut chars = content.chars();
    let mode = match chars.next() {
        Some('.') => TokenMode::Standard,
        Some('-') => TokenMode::Ignore,
        Some('+') => TokenMode::Save,
        Some('!') => TokenMode::Error,
        _ => {
            chars = content.chars(); // No mode character, the line starts with the name
            TokenMode::Standard
        }
    };

    let mut fields = chars.as_str().split_whitespace();

    let name = match fields.next() {
        Some(name) => name,
        None => return Err(TokenSpecError::MissingTokenName(line_number)),
    };

    if !name.chars().all(valid_name_char) {
        return Err(TokenSpecError::InvalidTokenName(line_number));
    }

    let fragments: Vec<&str> = fields.collect();
    if fragments.is_empty() {
        return Err(TokenSpecError::MissingRegex(line_number));
    }

    Ok(Some(TokenSpec {
        mode,
        name: name.to_string(),
        regex: fragments.join("|"),
    }))
}

/// Read token specifications from any buffered reader, keeping their order
pub fn read_token_stream<R: BufRead>(reader: R) -> Result<Vec<TokenSpec>, TokenSpecError> {
    let mut token_list: Vec<TokenSpec> = Vec::new();
    let mut seen_names: HashSet<String> = HashSet::new();

    for (line_idx, line) in reader.lines().enumerate() {
        let line_number = line_idx + 1;
        let line = match line {
            Ok(line) => line,
            Err(error) => {
                let err_line = format!(
                    "Error: Failed to read line number {} of the token specification {}",
                    line_number, error
                );
                return Err(TokenSpecError::FileReadError(err_line));
            }
        };

        let Some(token) = parse_line(&line, line_number)? else {
            continue;
        };

        if !seen_names.insert(token.name.clone()) {
            return Err(TokenSpecError::DuplicateToken(token.name, line_number));
        }
        token_list.push(token);
    }

    if token_list.is_empty() {
        return Err(TokenSpecError::EmptyInput);
    }
    Ok(token_list)
}

/// Parse token specifications held in a string
pub fn parse_token_spec(text: &str) -> Result<Vec<TokenSpec>, TokenSpecError> {
    read_token_stream(text.as_bytes())
}

/// Parse a file containing token specifications
pub fn read_token_file(file_path: &str) -> Result<Vec<TokenSpec>, TokenSpecError> {
    let file_path = PathBuf::from(file_path);

    let file = match File::open(&file_path) {
        Ok(file) => file,
        Err(error) => {
            let err_line = format!(
                "Error: Failed to open the token specification {}: {}",
                file_path.display(),
                error
            );
            return Err(TokenSpecError::FileOpenError(err_line));
        }
    };
    read_token_stream(BufReader::new(file))
}
