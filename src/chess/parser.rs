use super::{Castle, GameResult, Move, Piece, Square, Token, TokenKind};
use crate::{
    parser::{ParseError, ParseErrorKind, Scanner},
    program::Program,
};

/// Splits `source` into whitespace separated moves. Exactly one of them must
/// be a game result.
pub fn tokenize(source: &str) -> Result<Program<Token>, ParseError> {
    let mut scanner = Scanner::new(source);
    let mut tokens = Vec::new();
    let mut has_end = false;

    loop {
        scanner.skip_whitespace();
        let start = scanner.offset();
        let Some(first) = scanner.advance() else { break };
        let mut text = String::from(first);
        while let Some(c) = scanner.peek().filter(|c| !c.is_whitespace()) {
            text.push(c);
            scanner.advance();
        }

        let error = |kind| ParseError { kind, offset: start + 1, excerpt: text.clone() };
        let kind = match text.as_str() {
            "#" | "1/2" => {
                if has_end {
                    return Err(error(ParseErrorKind::DuplicateGameEnd));
                }
                has_end = true;
                TokenKind::GameEnd(if text == "#" { GameResult::Checkmate } else { GameResult::Draw })
            }
            "0-0" => TokenKind::Castle(Castle::Short),
            "0-0-0" => TokenKind::Castle(Castle::Long),
            _ => TokenKind::Move(parse_move(&text).ok_or_else(|| error(ParseErrorKind::InvalidMove))?),
        };
        tokens.push(Token { kind, text });
    }

    if !has_end {
        return Err(scanner.error(ParseErrorKind::MissingGameEnd));
    }
    Ok(Program::without_markers(tokens))
}

/// `[NBRQK]? x? [a-h][1-8] +? (=[NBRQK])?`, the promotion only for pawns.
pub fn parse_move(text: &str) -> Option<Move> {
    let mut chars = text.chars().peekable();
    let mut piece = match chars.peek().copied().and_then(Piece::from_letter) {
        Some(piece) => {
            chars.next();
            piece
        }
        None => Piece::Pawn,
    };
    let capture = chars.next_if_eq(&'x').is_some();
    let square = Square::from_coordinates(chars.next()?, chars.next()?)?;
    let check = chars.next_if_eq(&'+').is_some();
    let mut promotion = false;
    if piece == Piece::Pawn && chars.next_if_eq(&'=').is_some() {
        piece = chars.next().and_then(Piece::from_letter)?;
        promotion = true;
    }
    if chars.next().is_some() {
        return None;
    }
    Some(Move { piece, square, check, capture, promotion })
}
