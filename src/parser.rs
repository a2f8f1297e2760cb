//! Shared pieces of the tokenizers: the error type and a character cursor.
use thiserror::Error;

use crate::program::MarkerTable;

/// Number of characters shown on each side of an error position.
const EXCERPT_RADIUS: usize = 10;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseErrorKind {
    #[error("Marker has no defined ending")]
    UnterminatedMarker,
    #[error("Jump has no defined ending")]
    UnterminatedJump,
    #[error("Code block has no defined ending")]
    UnterminatedBlock,
    #[error("String isn't stopped")]
    UnterminatedString,
    #[error("No escaped character defined")]
    DanglingEscape,
    #[error("Invalid character `{0}`")]
    InvalidCharacter(char),
    #[error("The marker \"{0}\" has already been set")]
    DuplicateMarker(String),
    #[error("No marker for \"{0}\" detected")]
    UnknownMarker(String),
    #[error("Invalid move")]
    InvalidMove,
    #[error("Game has no ending")]
    MissingGameEnd,
    #[error("Game has more than one ending")]
    DuplicateGameEnd,
    #[error("Number is too large")]
    NumberTooLarge,
    #[error("Incomplete command")]
    IncompleteCommand,
    #[error("Constant \"{0}\" has already been defined")]
    DuplicateConstant(String),
    #[error("Constant \"{0}\" has not been defined")]
    UnknownConstant(String),
    #[error("Constant \"{name}\" cannot be assigned to `{value}`")]
    InvalidConstantValue { name: String, value: String },
}

/// A tokenization failure. Nothing of a program is kept once one of these is produced.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{kind} at character {offset} (Parsing)\n\"{excerpt}\"")]
pub struct ParseError {
    pub kind: ParseErrorKind,
    /// 1-based character offset of the offending position.
    pub offset: usize,
    /// Source text around the offending position.
    pub excerpt: String,
}

/// Left-to-right cursor over the source. Steps back by at most one character.
pub(crate) struct Scanner {
    chars: Vec<char>,
    idx: usize,
}

impl Scanner {
    pub fn new(source: &str) -> Self {
        Scanner { chars: source.chars().collect(), idx: 0 }
    }

    pub fn advance(&mut self) -> Option<char> {
        let c = self.chars.get(self.idx).copied();
        self.idx += 1;
        c
    }

    /// Undoes the last [`Scanner::advance`].
    pub fn retrieve(&mut self) {
        debug_assert!(self.idx > 0);
        self.idx -= 1;
    }

    pub fn peek(&self) -> Option<char> {
        self.peek_nth(0)
    }

    /// Looks `n` characters past the next one without consuming anything.
    pub fn peek_nth(&self, n: usize) -> Option<char> {
        self.chars.get(self.idx + n).copied()
    }

    /// Collects characters up to `terminator`, consuming it.
    pub fn take_until(&mut self, terminator: char, missing: ParseErrorKind) -> Result<String, ParseError> {
        let mut value = String::new();
        loop {
            match self.advance() {
                Some(c) if c == terminator => return Ok(value),
                Some(c) => value.push(c),
                None => return Err(self.error(missing)),
            }
        }
    }

    pub fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.idx += 1;
        }
    }

    pub fn offset(&self) -> usize {
        self.idx.min(self.chars.len())
    }

    pub fn error(&self, kind: ParseErrorKind) -> ParseError {
        self.error_at(kind, self.offset())
    }

    pub fn error_at(&self, kind: ParseErrorKind, offset: usize) -> ParseError {
        ParseError { kind, offset, excerpt: excerpt(&self.chars, offset) }
    }
}

pub(crate) fn excerpt(chars: &[char], offset: usize) -> String {
    let start = offset.saturating_sub(EXCERPT_RADIUS);
    let end = (offset + EXCERPT_RADIUS).min(chars.len());
    chars[start.min(end)..end].iter().collect()
}

/// Registers a marker pointing at `index`, rejecting duplicates.
pub(crate) fn define_marker(
    markers: &mut MarkerTable,
    name: String,
    index: usize,
    scanner: &Scanner,
) -> Result<(), ParseError> {
    if markers.contains_key(&name) {
        return Err(scanner.error(ParseErrorKind::DuplicateMarker(name)));
    }
    markers.insert(name, index);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_excerpt_window() {
        let chars: Vec<char> = "abcdefghijklmnopqrstuvwxyz".chars().collect();
        assert_eq!(excerpt(&chars, 0), "abcdefghij");
        assert_eq!(excerpt(&chars, 13), "defghijklmnopqrstuvw");
        assert_eq!(excerpt(&chars, 26), "qrstuvwxyz");
    }

    #[test]
    fn test_take_until() {
        let mut scanner = Scanner::new("name;rest");
        assert_eq!(scanner.take_until(';', ParseErrorKind::UnterminatedMarker), Ok("name".to_string()));
        assert_eq!(scanner.peek(), Some('r'));

        let mut scanner = Scanner::new("open");
        let err = scanner.take_until(';', ParseErrorKind::UnterminatedMarker).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::UnterminatedMarker);
        assert_eq!(err.offset, 4);
    }

    #[test]
    fn test_error_display() {
        let scanner = Scanner::new("ab");
        let err = scanner.error(ParseErrorKind::InvalidCharacter('?'));
        assert_eq!(err.to_string(), "Invalid character `?` at character 0 (Parsing)\n\"ab\"");
    }
}
