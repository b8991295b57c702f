/* Recursive descent parser which builds the NFA while it parses. There is no syntax tree: every
 * construct receives the state it starts from and returns the state it ends in.
 *
 * S  -> G S' $
 * S' -> '|' S | eps
 * G  -> U O G | eps
 * U  -> ch | '.' | '(' S ')' | '[' A ']' | '/' E
 * A  -> ch '-' ch A | ch '-' ch
 * O  -> '*' | '+' | '?' | '{' I '}' | '{' I '+' '}' | '{' I '-' I '}' | eps
 */

use color_eyre::eyre::{Report, Result};

use crate::nfa::NFA;

const ESCAPE_MARKER: char = '/';

// Every repetition is a fresh copy of the element, so counts are kept small
const MAX_REPEAT: u32 = 1000;

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum RegExError {
    /// Misplaced operator, unterminated group or class, bad escape or malformed bound
    SyntaxError(&'static str),
    /// Repetition bounds out of order or too large
    BoundsError(&'static str),
    /// The regex ended before a construct was complete
    TruncationError(&'static str),
}

impl std::fmt::Display for RegExError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RegExError::SyntaxError(msg) => write!(f, "Error: Syntax error in regex: {}", msg),
            RegExError::BoundsError(msg) => write!(f, "Error: Invalid repetition bound: {}", msg),
            RegExError::TruncationError(msg) => {
                write!(f, "Error: Regex ended unexpectedly: {}", msg)
            }
        }
    }
}

impl std::error::Error for RegExError {}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
enum Bound {
    Exact(u32),
    Atleast(u32),
    Range(u32, u32),
}

fn syntax_error(msg: &'static str) -> Report {
    Report::new(RegExError::SyntaxError(msg))
}

fn unexpected_character(ch: char) -> Report {
    let msg = match ch {
        ']' => "unexpected character ']'",
        ')' => "unexpected character ')'",
        '*' => "unexpected character '*'",
        '+' => "unexpected character '+'",
        '?' => "unexpected character '?'",
        '{' => "unexpected character '{'",
        '}' => "unexpected character '}'",
        '-' => "unexpected character '-'",
        '|' => "unexpected character '|'",
        _ => "unexpected character",
    };
    syntax_error(msg)
}

fn is_operator(ch: char) -> bool {
    matches!(ch, ']' | ')' | '*' | '+' | '?' | '{' | '}' | '-' | '|')
}

struct RegexParser {
    regex: Vec<char>,
    pos: usize,
    nfa: NFA,
}

impl RegexParser {
    fn new(regex: &str) -> Self {
        RegexParser {
            regex: regex.chars().collect(),
            pos: 0,
            nfa: NFA::new(),
        }
    }

    fn peek(&self) -> Option<char> {
        self.regex.get(self.pos).copied()
    }

    fn next_char(&mut self, truncation_msg: &'static str) -> Result<char> {
        match self.peek() {
            Some(ch) => {
                self.pos += 1;
                Ok(ch)
            }
            None => Err(Report::new(RegExError::TruncationError(truncation_msg))),
        }
    }

    fn expect(&mut self, expected: char, msg: &'static str) -> Result<()> {
        if self.next_char(msg)? != expected {
            return Err(syntax_error(msg));
        }
        Ok(())
    }

    fn parse(mut self) -> Result<NFA> {
        let accept_state = self.parse_regex(0)?;

        if let Some(ch) = self.peek() {
            // Only a stray ')' can be left over once the top level alternation is done
            return Err(unexpected_character(ch));
        }

        self.nfa.set_accept_state(accept_state);
        Ok(self.nfa)
    }

    // S: every alternative starts from in_state and joins the shared exit state
    fn parse_regex(&mut self, in_state: usize) -> Result<usize> {
        let out_state = self.nfa.add_state();

        loop {
            let chunk_out = self.parse_chunk(in_state)?;
            self.nfa.add_epsilon_transition(chunk_out, out_state);

            if self.peek() == Some('|') {
                self.pos += 1;
            } else {
                break;
            }
        }
        Ok(out_state)
    }

    // G: a sequence of quantified elements chained exit to entry
    fn parse_chunk(&mut self, in_state: usize) -> Result<usize> {
        let mut working_state = in_state;

        // A loop-back edge may only target a state whose other outgoing edges belong to the
        // looped element. The chunk's entry is shared with sibling alternatives and the exit of
        // a loop already leads back into that loop, so neither qualifies.
        let mut isolated = false;

        while let Some(ch) = self.peek() {
            if ch == '|' || ch == ')' {
                break;
            }

            let element_start = self.pos;

            if !isolated && self.loop_follows(element_start) {
                let entry_state = self.nfa.add_state();
                self.nfa.add_epsilon_transition(working_state, entry_state);
                working_state = entry_state;
            }

            let mut next_state = self.parse_element(working_state)?;
            let mut looped = false;

            match self.peek() {
                Some('*') => {
                    self.pos += 1;
                    self.nfa.add_epsilon_transition(working_state, next_state);
                    self.nfa.add_epsilon_transition(next_state, working_state);
                    looped = true;
                }
                Some('+') => {
                    self.pos += 1;
                    self.nfa.add_epsilon_transition(next_state, working_state);
                    looped = true;
                }
                Some('?') => {
                    self.pos += 1;
                    self.nfa.add_epsilon_transition(working_state, next_state);
                }
                Some('{') => {
                    self.pos += 1;
                    let bound = self.parse_bound()?;
                    looped = matches!(bound, Bound::Atleast(_));
                    next_state =
                        self.repeat_element(bound, element_start, working_state, next_state)?;
                }
                _ => {}
            }

            working_state = next_state;
            isolated = !looped;
        }
        Ok(working_state)
    }

    // U
    fn parse_element(&mut self, in_state: usize) -> Result<usize> {
        let ch = self.next_char("expected an element")?;

        if ch == '(' {
            let out_state = self.parse_regex(in_state)?;
            if self.peek() != Some(')') {
                return Err(syntax_error("expected ')' to close '('"));
            }
            self.pos += 1; // Consume the rparen
            return Ok(out_state);
        }

        if is_operator(ch) {
            return Err(unexpected_character(ch));
        }

        match ch {
            '.' => {
                let out_state = self.nfa.add_state();
                self.nfa.add_omega_transition(in_state, out_state);
                Ok(out_state)
            }
            '[' => self.parse_char_class(in_state),
            ESCAPE_MARKER => {
                let literal = self.parse_escape()?;
                let out_state = self.nfa.add_state();
                self.nfa.add_char_transition(in_state, literal, out_state);
                Ok(out_state)
            }
            _ => {
                let out_state = self.nfa.add_state();
                self.nfa.add_char_transition(in_state, ch, out_state);
                Ok(out_state)
            }
        }
    }

    // Called with the '[' consumed. Every range leads to the same destination state.
    fn parse_char_class(&mut self, in_state: usize) -> Result<usize> {
        let out_state = self.nfa.add_state();

        if self.peek() == Some(']') {
            return Err(syntax_error("empty character class"));
        }

        loop {
            let mut low = self.parse_class_char()?;
            self.expect('-', "'-' required in character range")?;
            let mut high = self.parse_class_char()?;

            if high < low {
                std::mem::swap(&mut low, &mut high);
            }

            for ch in low..=high {
                self.nfa.add_char_transition(in_state, ch, out_state);
            }

            match self.peek() {
                Some(']') => {
                    self.pos += 1;
                    break;
                }
                None => return Err(syntax_error("expected ']' to close '['")),
                Some(_) => {}
            }
        }
        Ok(out_state)
    }

    fn parse_class_char(&mut self) -> Result<char> {
        match self.next_char("unterminated character range")? {
            ESCAPE_MARKER => self.parse_escape(),
            ']' => Err(unexpected_character(']')),
            ch => Ok(ch),
        }
    }

    // Called with the escape marker consumed
    fn parse_escape(&mut self) -> Result<char> {
        let ch = self.next_char("escape marker at end of regex")?;

        let literal = match ch {
            '.' | '*' | '+' | '?' | '|' | '[' | ']' | '(' | ')' | '{' | '}' | '-' | '/' => ch,
            'n' => '\n',
            'r' => '\r',
            't' => '\t',
            'v' => '\u{0b}',
            'f' => '\u{0c}',
            'b' => '\u{08}',
            'a' => '\u{07}',
            's' => ' ',
            'z' => '\0',
            'x' => {
                let high = self.parse_hex_digit()?;
                let low = self.parse_hex_digit()?;
                char::from((high * 16 + low) as u8)
            }
            _ => return Err(syntax_error("invalid escape sequence")),
        };
        Ok(literal)
    }

    fn parse_hex_digit(&mut self) -> Result<u32> {
        self.next_char("unterminated hex escape")?
            .to_digit(16)
            .ok_or_else(|| syntax_error("invalid hex digit in escape sequence"))
    }

    fn parse_number(&mut self) -> Result<u32> {
        let first = self.next_char("unterminated repetition bound")?;
        let mut number = match first.to_digit(10) {
            Some(digit) => digit,
            None => return Err(syntax_error("expected digit in repetition bound")),
        };

        while let Some(digit) = self.peek().and_then(|ch| ch.to_digit(10)) {
            number = number
                .checked_mul(10)
                .and_then(|n| n.checked_add(digit))
                .ok_or_else(|| Report::new(RegExError::BoundsError("repetition bound too large")))?;
            self.pos += 1;
        }
        Ok(number)
    }

    // Called with the '{' consumed, reads up to and including the '}'
    fn parse_bound(&mut self) -> Result<Bound> {
        let min = self.parse_number()?;

        let bound = match self.next_char("unterminated repetition bound")? {
            '}' => Bound::Exact(min),
            '+' => {
                self.expect('}', "expected '}' to close '{'")?;
                Bound::Atleast(min)
            }
            '-' => {
                let max = self.parse_number()?;
                self.expect('}', "expected '}' to close '{'")?;
                if max <= min {
                    return Err(Report::new(RegExError::BoundsError(
                        "upper bound must be greater than lower bound",
                    )));
                }
                Bound::Range(min, max)
            }
            _ => return Err(syntax_error("unexpected character in repetition bound")),
        };

        if min == 0 {
            return Err(syntax_error("repetition count must be at least one"));
        }
        let max = match bound {
            Bound::Exact(min) | Bound::Atleast(min) => min,
            Bound::Range(_, max) => max,
        };
        if max > MAX_REPEAT {
            return Err(Report::new(RegExError::BoundsError(
                "repetition bound exceeds the repeat limit",
            )));
        }
        Ok(bound)
    }

    /// Chain further copies of the element which was parsed from `element_start` into the states
    /// `entry_state` -> `exit_state`. Each copy is parsed again from the regex text. Returns the
    /// exit state of the whole repetition.
    fn repeat_element(
        &mut self,
        bound: Bound,
        element_start: usize,
        entry_state: usize,
        exit_state: usize,
    ) -> Result<usize> {
        let min = match bound {
            Bound::Exact(min) | Bound::Atleast(min) | Bound::Range(min, _) => min,
        };

        let mut working_state = entry_state;
        let mut next_state = exit_state;

        for _ in 1..min {
            working_state = next_state;
            next_state = self.reparse_element(element_start, working_state)?;
        }

        match bound {
            Bound::Exact(_) => {}
            Bound::Atleast(_) => {
                self.nfa.add_epsilon_transition(next_state, working_state);
            }
            Bound::Range(min, max) => {
                let end_state = self.nfa.add_state();
                for _ in min..max {
                    working_state = next_state;
                    self.nfa.add_epsilon_transition(working_state, end_state);
                    next_state = self.reparse_element(element_start, working_state)?;
                }
                self.nfa.add_epsilon_transition(next_state, end_state);
                next_state = end_state;
            }
        }
        Ok(next_state)
    }

    fn reparse_element(&mut self, element_start: usize, in_state: usize) -> Result<usize> {
        let resume = self.pos;
        self.pos = element_start;
        let out_state = self.parse_element(in_state)?;
        self.pos = resume;
        Ok(out_state)
    }

    /* Lookahead used before an element is built. None means the element is malformed, the
     * parse proper reports the error. */

    fn escape_end(&self, pos: usize) -> Option<usize> {
        let end = match self.regex.get(pos + 1).copied()? {
            'x' => pos + 4,
            _ => pos + 2,
        };
        (end <= self.regex.len()).then_some(end)
    }

    fn class_end(&self, pos: usize) -> Option<usize> {
        let mut idx = pos + 1;
        loop {
            match self.regex.get(idx).copied()? {
                ']' => return Some(idx + 1),
                ESCAPE_MARKER => idx = self.escape_end(idx)?,
                _ => idx += 1,
            }
        }
    }

    fn element_end(&self, pos: usize) -> Option<usize> {
        match self.regex.get(pos).copied()? {
            '(' => {
                let mut depth = 0usize;
                let mut idx = pos;
                loop {
                    match self.regex.get(idx).copied()? {
                        '(' => {
                            depth += 1;
                            idx += 1;
                        }
                        ')' => {
                            depth -= 1;
                            idx += 1;
                            if depth == 0 {
                                return Some(idx);
                            }
                        }
                        '[' => idx = self.class_end(idx)?,
                        ESCAPE_MARKER => idx = self.escape_end(idx)?,
                        _ => idx += 1,
                    }
                }
            }
            '[' => self.class_end(pos),
            ESCAPE_MARKER => self.escape_end(pos),
            _ => Some(pos + 1),
        }
    }

    // True when the element at pos carries '*', '+' or '{n+}'
    fn loop_follows(&self, pos: usize) -> bool {
        let Some(end) = self.element_end(pos) else {
            return false;
        };

        match self.regex.get(end).copied() {
            Some('*') | Some('+') => true,
            Some('{') => self.regex[end + 1..]
                .iter()
                .take_while(|&&ch| ch != '}')
                .any(|&ch| ch == '+'),
            _ => false,
        }
    }
}

/// Parse a regex and build its NFA. The automaton under construction is dropped on failure.
pub(crate) fn build_nfa(regex: &str) -> Result<NFA> {
    RegexParser::new(regex).parse()
}
