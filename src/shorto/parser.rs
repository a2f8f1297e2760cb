use super::{value::parse_float, OperatorRegistry, Token, Value};
use crate::{
    parser::{define_marker, ParseError, ParseErrorKind, Scanner},
    program::{MarkerTable, Program},
};

const STRING: char = '"';
const CODE_BLOCK: char = '$';
const MARKER: char = '#';
const END: char = ';';
const ESCAPE: char = '\\';
const COMMENT: char = '/';
/// `@{ ... }` is the same as `$ ... ;`.
const ALIAS_BLOCK: char = '@';
const ALIAS_OPEN: char = '{';
const ALIAS_CLOSE: char = '}';

/// Splits `source` into tokens and collects the marker definitions.
///
/// Every jump must name a marker defined somewhere in the source.
pub fn tokenize(source: &str, operators: &OperatorRegistry) -> Result<Program<Token>, ParseError> {
    let mut scanner = Scanner::new(source);
    let mut tokens = Vec::new();
    let mut markers = MarkerTable::default();
    let mut jumps = Vec::new();

    while let Some(c) = scanner.advance() {
        match c {
            MARKER => {
                let name = scanner.take_until(END, ParseErrorKind::UnterminatedMarker)?;
                define_marker(&mut markers, name, tokens.len(), &scanner)?;
            }
            CODE_BLOCK => parse_block(&mut scanner, END, operators, &mut tokens, &mut jumps)?,
            ALIAS_BLOCK if scanner.peek() == Some(ALIAS_OPEN) => {
                scanner.advance();
                parse_block(&mut scanner, ALIAS_CLOSE, operators, &mut tokens, &mut jumps)?;
            }
            STRING | END => return Err(scanner.error(ParseErrorKind::InvalidCharacter(c))),
            _ => {
                scanner.retrieve();
                let text = parse_text(&mut scanner)?;
                if !text.is_empty() {
                    tokens.push(Token::Text(text));
                }
            }
        }
    }

    for (name, offset) in jumps {
        if !markers.contains_key(&name) {
            return Err(scanner.error_at(ParseErrorKind::UnknownMarker(name), offset));
        }
    }
    Ok(Program::new(tokens, markers))
}

fn breaks_text(scanner: &Scanner) -> bool {
    match scanner.peek() {
        None | Some(STRING | CODE_BLOCK | MARKER | END) => true,
        Some(ALIAS_BLOCK) => scanner.peek_nth(1) == Some(ALIAS_OPEN),
        Some(_) => false,
    }
}

fn parse_text(scanner: &mut Scanner) -> Result<String, ParseError> {
    let mut text = String::new();
    while !breaks_text(scanner) {
        let Some(c) = scanner.advance() else { break };
        match c {
            ESCAPE => match scanner.advance() {
                Some(escaped) => text.push(escaped),
                None => return Err(scanner.error(ParseErrorKind::DanglingEscape)),
            },
            COMMENT if scanner.peek() == Some(COMMENT) => {
                // The newline ending a comment is still text.
                while let Some(c) = scanner.advance() {
                    if c == '\n' {
                        text.push(c);
                        break;
                    }
                }
            }
            c => text.push(c),
        }
    }
    Ok(text)
}

fn parse_block(
    scanner: &mut Scanner,
    end: char,
    operators: &OperatorRegistry,
    tokens: &mut Vec<Token>,
    jumps: &mut Vec<(String, usize)>,
) -> Result<(), ParseError> {
    loop {
        let Some(c) = scanner.advance() else {
            return Err(scanner.error(ParseErrorKind::UnterminatedBlock));
        };
        match c {
            c if c == end => return Ok(()),
            STRING => tokens.push(Token::Value(Value::Text(parse_string(scanner)?))),
            MARKER => {
                let offset = scanner.offset();
                let name = scanner.take_until(END, ParseErrorKind::UnterminatedJump)?;
                jumps.push((name.clone(), offset));
                tokens.push(Token::Jump(name));
            }
            c if c.is_ascii_digit() => tokens.push(Token::Value(Value::number(parse_number(c, scanner)))),
            c if c.is_whitespace() => scanner.skip_whitespace(),
            c if operators.contains(c) => tokens.push(Token::Operator(c)),
            c => return Err(scanner.error(ParseErrorKind::InvalidCharacter(c))),
        }
    }
}

fn parse_string(scanner: &mut Scanner) -> Result<String, ParseError> {
    let mut value = String::new();
    loop {
        match scanner.advance() {
            Some(STRING) => return Ok(value),
            Some(ESCAPE) => match scanner.advance() {
                Some('n') => value.push('\n'),
                Some('t') => value.push('\t'),
                Some(c) => value.push(c),
                None => return Err(scanner.error(ParseErrorKind::UnterminatedString)),
            },
            Some(c) => value.push(c),
            None => return Err(scanner.error(ParseErrorKind::UnterminatedString)),
        }
    }
}

/// Digits with at most one decimal point; a second point ends the literal.
fn parse_number(first: char, scanner: &mut Scanner) -> f64 {
    let mut literal = String::from(first);
    let mut seen_point = false;
    while let Some(c) = scanner.peek() {
        if c == '.' {
            if seen_point {
                break;
            }
            seen_point = true;
        } else if !c.is_ascii_digit() {
            break;
        }
        literal.push(c);
        scanner.advance();
    }
    parse_float(&literal)
}
