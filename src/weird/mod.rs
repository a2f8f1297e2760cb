//! Tokenizer for a line-oriented data language.
//!
//! Every non-empty line is one command. Commands are made of bare keys
//! (`say`), literal values (`"text"`, or `~` followed by hexadecimal digits),
//! variables (`$name`), constants (`#name`), info lookups (`@name`), the
//! operators `! / * + - = % :`, brackets and the `->` end-of-command arrow.
//! `//` comments out the rest of a line.
//!
//! Variables are numbered in order of first appearance across the whole script.
//! Constants are resolved while tokenizing: `#name : value` defines one and
//! becomes the value itself, later uses of `#name` are replaced by that value.
//! The language has no interpreter here; [`tokenize`] is the whole front-end.
use std::fmt;

pub mod parser;

#[cfg(test)]
mod tests;

pub use parser::tokenize;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Literal {
    Number(i64),
    Text(String),
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Number(n) => write!(f, "~{n:x}"),
            Literal::Text(text) => write!(f, "{text:?}"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TokenKind {
    Key(String),
    Value(Literal),
    /// Index into [`Script::variables`].
    Variable(usize),
    Info(String),
    Operator(char),
    OpenBracket(char),
    ClosedBracket(char),
    EndOfCommand,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Key(name) => write!(f, "KEY: {name}"),
            TokenKind::Value(value) => write!(f, "VAL: {value}"),
            TokenKind::Variable(slot) => write!(f, "VAR: {slot}"),
            TokenKind::Info(name) => write!(f, "INF: {name}"),
            TokenKind::Operator(symbol) => write!(f, "OPR: {symbol}"),
            TokenKind::OpenBracket(bracket) => write!(f, "OBR: {bracket}"),
            TokenKind::ClosedBracket(bracket) => write!(f, "CBR: {bracket}"),
            TokenKind::EndOfCommand => f.write_str("EOC"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    /// 1-based character offset of the token's first character.
    pub offset: usize,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.kind.fmt(f)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Script {
    pub commands: Vec<Vec<Token>>,
    /// Variable names by slot.
    pub variables: Vec<String>,
}

impl Script {
    pub fn variable_name(&self, slot: usize) -> Option<&str> {
        self.variables.get(slot).map(String::as_str)
    }
}

impl fmt::Display for Script {
    /// One command per line, tokens separated by ` | `.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for command in &self.commands {
            for (i, token) in command.iter().enumerate() {
                if i > 0 {
                    f.write_str(" | ")?;
                }
                write!(f, "{token}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
