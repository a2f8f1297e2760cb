use std::{fmt, mem};

use rustc_hash::FxHashMap;
use tracing::trace;

use super::{Literal, Script, Token, TokenKind};
use crate::parser::{ParseError, ParseErrorKind, Scanner};

const STRING: char = '"';
const NUMBER: char = '~';
const VARIABLE: char = '$';
const CONSTANT: char = '#';
const INFO: char = '@';
const COMMENT: char = '/';
const ESCAPE: char = '\\';
const END_OF_LINE: char = '\n';
const DEFINE: char = ':';
const OPERATORS: &str = "!/*+-=%:";

/// A token before variables get their slots and constants their values.
#[derive(Clone, Debug)]
enum Lexeme {
    Plain(TokenKind),
    Variable(String),
    Constant(String),
}

impl fmt::Display for Lexeme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Lexeme::Plain(kind) => kind.fmt(f),
            Lexeme::Variable(name) => write!(f, "{VARIABLE}{name}"),
            Lexeme::Constant(name) => write!(f, "{CONSTANT}{name}"),
        }
    }
}

struct Raw {
    lexeme: Lexeme,
    offset: usize,
}

pub fn tokenize(source: &str) -> Result<Script, ParseError> {
    let mut scanner = Scanner::new(source);
    let mut lines = Vec::new();
    let mut line = Vec::new();

    while let Some(c) = scanner.advance() {
        let offset = scanner.offset();
        let lexeme = match c {
            END_OF_LINE => {
                lines.push(mem::take(&mut line));
                continue;
            }
            COMMENT if scanner.peek() == Some(COMMENT) => {
                while scanner.peek().is_some_and(|c| c != END_OF_LINE) {
                    scanner.advance();
                }
                continue;
            }
            c if c.is_whitespace() => continue,
            c if is_key_char(c) => {
                scanner.retrieve();
                Lexeme::Plain(TokenKind::Key(take_name(&mut scanner)))
            }
            STRING => Lexeme::Plain(TokenKind::Value(Literal::Text(parse_string(&mut scanner)?))),
            NUMBER => Lexeme::Plain(TokenKind::Value(Literal::Number(parse_hex(&mut scanner, offset)?))),
            VARIABLE => Lexeme::Variable(take_name(&mut scanner)),
            CONSTANT => Lexeme::Constant(take_name(&mut scanner)),
            INFO => Lexeme::Plain(TokenKind::Info(take_name(&mut scanner))),
            '-' if scanner.peek() == Some('>') => {
                scanner.advance();
                Lexeme::Plain(TokenKind::EndOfCommand)
            }
            c if OPERATORS.contains(c) => Lexeme::Plain(TokenKind::Operator(c)),
            '[' | '(' => Lexeme::Plain(TokenKind::OpenBracket(c)),
            ']' | ')' => Lexeme::Plain(TokenKind::ClosedBracket(c)),
            c => return Err(scanner.error(ParseErrorKind::InvalidCharacter(c))),
        };
        line.push(Raw { lexeme, offset });
    }
    lines.push(line);

    let mut resolver = Resolver { scanner: &scanner, constants: FxHashMap::default(), variables: Vec::new() };
    let commands = lines
        .iter()
        .filter(|line| !line.is_empty())
        .map(|line| resolver.command(line))
        .collect::<Result<Vec<_>, _>>()?;
    trace!(commands = commands.len(), variables = resolver.variables.len(), "tokenized");
    Ok(Script { commands, variables: resolver.variables })
}

/// Letters, digits and `_`.
fn is_key_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn take_name(scanner: &mut Scanner) -> String {
    let mut name = String::new();
    while let Some(c) = scanner.peek().filter(|&c| is_key_char(c)) {
        scanner.advance();
        name.push(c);
    }
    name
}

/// Reads up to the closing quote. `\n` is a line break, any other escaped
/// character stands for itself. A string cannot span lines.
fn parse_string(scanner: &mut Scanner) -> Result<String, ParseError> {
    let mut text = String::new();
    loop {
        match scanner.advance() {
            Some(STRING) => return Ok(text),
            Some(ESCAPE) => match scanner.advance() {
                Some('n') => text.push('\n'),
                Some(c) if c != END_OF_LINE => text.push(c),
                _ => return Err(scanner.error(ParseErrorKind::UnterminatedString)),
            },
            Some(c) if c != END_OF_LINE => text.push(c),
            _ => return Err(scanner.error(ParseErrorKind::UnterminatedString)),
        }
    }
}

/// Hexadecimal digits after `~`. No digits at all is 0.
fn parse_hex(scanner: &mut Scanner, offset: usize) -> Result<i64, ParseError> {
    let mut value: i64 = 0;
    while let Some(digit) = scanner.peek().and_then(|c| c.to_digit(16)) {
        scanner.advance();
        value = value
            .checked_mul(16)
            .and_then(|v| v.checked_add(i64::from(digit)))
            .ok_or_else(|| scanner.error_at(ParseErrorKind::NumberTooLarge, offset))?;
    }
    Ok(value)
}

struct Resolver<'a> {
    scanner: &'a Scanner,
    constants: FxHashMap<String, Literal>,
    variables: Vec<String>,
}

impl Resolver<'_> {
    fn command(&mut self, line: &[Raw]) -> Result<Vec<Token>, ParseError> {
        let mut tokens = Vec::with_capacity(line.len());
        let mut idx = 0;
        while let Some(raw) = line.get(idx) {
            let kind = match &raw.lexeme {
                Lexeme::Plain(kind) => kind.clone(),
                Lexeme::Variable(name) => TokenKind::Variable(self.slot(name)),
                Lexeme::Constant(name) => {
                    let (value, next) = self.constant(line, idx, name)?;
                    tokens.push(Token { kind: TokenKind::Value(value), offset: raw.offset });
                    idx = next;
                    continue;
                }
            };
            tokens.push(Token { kind, offset: raw.offset });
            idx += 1;
        }
        Ok(tokens)
    }

    fn slot(&mut self, name: &str) -> usize {
        match self.variables.iter().position(|known| known == name) {
            Some(slot) => slot,
            None => {
                self.variables.push(name.to_string());
                self.variables.len() - 1
            }
        }
    }

    /// Value of the constant at `line[idx]` and the index after everything it
    /// consumed. A definition's value may itself be a constant, defined or used.
    fn constant(&mut self, line: &[Raw], idx: usize, name: &str) -> Result<(Literal, usize), ParseError> {
        let offset = line[idx].offset;
        let defines = matches!(
            line.get(idx + 1),
            Some(Raw { lexeme: Lexeme::Plain(TokenKind::Operator(DEFINE)), .. })
        );
        if !defines {
            let value = self
                .constants
                .get(name)
                .cloned()
                .ok_or_else(|| self.scanner.error_at(ParseErrorKind::UnknownConstant(name.to_string()), offset))?;
            return Ok((value, idx + 1));
        }

        let Some(raw) = line.get(idx + 2) else {
            return Err(self.scanner.error_at(ParseErrorKind::IncompleteCommand, offset));
        };
        if self.constants.contains_key(name) {
            return Err(self.scanner.error_at(ParseErrorKind::DuplicateConstant(name.to_string()), offset));
        }
        let (value, next) = match &raw.lexeme {
            Lexeme::Plain(TokenKind::Value(value)) => (value.clone(), idx + 3),
            Lexeme::Constant(inner) => self.constant(line, idx + 2, inner)?,
            other => {
                let kind = ParseErrorKind::InvalidConstantValue { name: name.to_string(), value: other.to_string() };
                return Err(self.scanner.error_at(kind, raw.offset));
            }
        };
        self.constants.insert(name.to_string(), value.clone());
        Ok((value, next))
    }
}
