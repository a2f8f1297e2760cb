//! A tape machine programmed in algebraic chess notation.
//!
//! Every move acts on a [`Tape`] of 30 000 byte cells. What a move does depends
//! on the piece and on the difference between the file and the rank index of
//! the target square: `a1` is 0, `b1` is 1, `a2` is -1. A move with a check
//! (`+`) or a capture (`x`) usually reads the following move as a number
//! instead of executing it (see [`Move::parameter`]).
//!
//! | piece  | difference < 0           | difference = 0            | difference > 0          |
//! |--------|--------------------------|---------------------------|-------------------------|
//! | King   | skip forward if cell = 0 |                           | jump back if cell = 0   |
//! | Rook   | pointer right            |                           | pointer left            |
//! | Bishop | output cell              | read back from the output | input                   |
//! | Knight | add                      |                           | subtract                |
//! | Pawn   | nothing                  | nothing                   | nothing                 |
//!
//! The Queen stores a value chosen by the absolute difference: 0 a random byte,
//! 1 the output length (the tape pointer with `+`/`x`), 2 the logical not of the
//! cell, 3 a parameter with `+`/`x` and zero without.
//!
//! `0-0` marks the start of a loop, `0-0-0` jumps back to it. A program ends with
//! exactly one result, `#` or `1/2`; running past it is an error.
use std::fmt;

use rand::Rng;

use crate::{
    input::{InputMode, InputValue, LineKind},
    parser::ParseError,
    program::Program,
    tape::Tape,
    vm::{Context, Effect, EngineOptions, Language, OperationError},
};

pub mod parser;


#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Piece {
    Pawn,
    Knight,
    Bishop,
    Rook,
    Queen,
    King,
}

impl Piece {
    /// Piece of a move prefix or promotion suffix. Pawns have no letter.
    pub fn from_letter(c: char) -> Option<Piece> {
        match c {
            'N' => Some(Piece::Knight),
            'B' => Some(Piece::Bishop),
            'R' => Some(Piece::Rook),
            'Q' => Some(Piece::Queen),
            'K' => Some(Piece::King),
            _ => None,
        }
    }
}

/// A board square with 0-based file (`a` = 0) and rank (`1` = 0).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Square {
    pub file: u8,
    pub rank: u8,
}

impl Square {
    pub fn from_coordinates(file: char, rank: char) -> Option<Square> {
        if !('a'..='h').contains(&file) || !('1'..='8').contains(&rank) {
            return None;
        }
        Some(Square { file: file as u8 - b'a', rank: rank as u8 - b'1' })
    }

    pub fn difference(self) -> i64 {
        self.file as i64 - self.rank as i64
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Move {
    /// The piece that moves; for a promotion the piece the pawn becomes.
    pub piece: Piece,
    pub square: Square,
    pub check: bool,
    pub capture: bool,
    pub promotion: bool,
}

impl Move {
    /// Whether this move takes the following move as its parameter.
    pub fn has_flag(&self) -> bool {
        self.check || self.capture
    }

    /// The value of this move when used as a parameter: `file * 8 + rank`,
    /// plus 64 for a check and 128 for a capture.
    pub fn parameter(&self) -> i64 {
        let mut value = self.square.file as i64 * 8 + self.square.rank as i64;
        if self.check {
            value += 64;
        }
        if self.capture {
            value += 128;
        }
        value
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Castle {
    /// `0-0`
    Short,
    /// `0-0-0`
    Long,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GameResult {
    /// `#`
    Checkmate,
    /// `1/2`
    Draw,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Move(Move),
    Castle(Castle),
    GameEnd(GameResult),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    /// The move as written in the source.
    pub text: String,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

#[derive(Clone, Debug, Default)]
pub struct State {
    pub tape: Tape,
    /// Positions following the `0-0` moves that were not yet closed.
    pub loop_starts: Vec<usize>,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct Chess;

impl Language for Chess {
    type Token = Token;
    type State = State;

    const NAME: &'static str = "chess";
    const KEEPS_COMMITTED_INPUT: bool = false;

    fn tokenize(&self, source: &str) -> Result<Program<Token>, ParseError> {
        parser::tokenize(source)
    }

    fn new_state(&self, _options: &EngineOptions) -> State {
        State::default()
    }

    fn execute(&self, token: &Token, ctx: &mut Context<'_, Self>) -> Result<Effect, OperationError> {
        match token.kind {
            TokenKind::GameEnd(_) => Ok(Effect::Halt),
            TokenKind::Castle(Castle::Short) => {
                ctx.state.loop_starts.push(ctx.program.pc());
                Ok(Effect::None)
            }
            TokenKind::Castle(Castle::Long) => {
                let start = ctx.state.loop_starts.pop().ok_or(OperationError::MissingLoopStart)?;
                ctx.program.jump_to(start)?;
                ctx.state.loop_starts.push(start);
                Ok(Effect::Yield)
            }
            TokenKind::Move(mv) => play(&mv, ctx),
        }
    }

    fn accept_input(&self, state: &mut State, value: InputValue) -> Result<(), OperationError> {
        match value {
            InputValue::Char(c) => state.tape.set(c as i64),
            InputValue::Number(n) => state.tape.set(to_cell(n)),
            InputValue::Text(_) => return Err(OperationError::UnexpectedInput),
        }
        Ok(())
    }

    fn finish(&self, _state: &State) -> Result<(), OperationError> {
        Err(OperationError::MissingResult)
    }
}

/// Consumes the next token as a number.
fn parameter(ctx: &mut Context<'_, Chess>) -> Result<i64, OperationError> {
    let token = ctx.program.advance().ok_or(OperationError::MissingParameter)?;
    match token.kind {
        TokenKind::Move(mv) => Ok(mv.parameter()),
        _ => Err(OperationError::InvalidParameter { token: token.text }),
    }
}

fn amount(mv: &Move, ctx: &mut Context<'_, Chess>) -> Result<i64, OperationError> {
    if mv.has_flag() {
        parameter(ctx)
    } else {
        Ok(1)
    }
}

fn to_cell(n: f64) -> i64 {
    if n.is_finite() {
        n.trunc().rem_euclid(256.0) as i64
    } else {
        0
    }
}

fn play(mv: &Move, ctx: &mut Context<'_, Chess>) -> Result<Effect, OperationError> {
    let difference = mv.square.difference();
    match mv.piece {
        Piece::Pawn => {}
        Piece::King => {
            let amount = amount(mv, ctx)?;
            if ctx.state.tape.get() != 0 || difference == 0 {
                return Ok(Effect::None);
            }
            if difference > 0 {
                // Also back over the parameter move, if there was one.
                ctx.program.jump_by(-(amount + mv.has_flag() as i64))?;
            } else {
                ctx.program.jump_by(amount)?;
            }
            return Ok(Effect::Yield);
        }
        Piece::Queen => {
            let value = match difference.abs() {
                0 => ctx.rng.random_range(0..256),
                1 if mv.has_flag() => ctx.state.tape.pointer() as i64,
                1 => ctx.console.char_len() as i64,
                2 => (ctx.state.tape.get() == 0) as i64,
                3 if mv.has_flag() => parameter(ctx)?,
                3 => 0,
                _ => return Ok(Effect::None),
            };
            ctx.state.tape.set(value);
        }
        Piece::Rook => {
            let amount = amount(mv, ctx)?;
            ctx.state.tape.move_by(-amount * difference.signum());
        }
        Piece::Knight => {
            let amount = amount(mv, ctx)?;
            ctx.state.tape.add(-amount * difference.signum());
        }
        Piece::Bishop if difference > 0 => {
            let mode = if mv.has_flag() { InputMode::Line(LineKind::Digits) } else { InputMode::Char };
            return Ok(Effect::Input(mode));
        }
        Piece::Bishop if difference < 0 => {
            let cell = ctx.state.tape.get();
            if mv.has_flag() {
                ctx.console.append(&cell.to_string());
            } else {
                ctx.console.push_char(char::from(cell));
            }
        }
        Piece::Bishop => {
            let amount = amount(mv, ctx)?;
            read_back(amount, ctx);
        }
    }
    Ok(Effect::None)
}

/// Moves characters from the end of the output back onto the tape. With 0 the
/// first character is read and the whole output is cleared.
fn read_back(amount: i64, ctx: &mut Context<'_, Chess>) {
    let len = ctx.console.char_len();
    if amount == 0 {
        let code = ctx.console.char_at(0).map_or(0, |c| c as i64);
        ctx.state.tape.set(code);
        ctx.console.clear();
        return;
    }
    let amount = amount as usize;
    let code = len.checked_sub(amount).and_then(|i| ctx.console.char_at(i)).map_or(0, |c| c as i64);
    ctx.state.tape.set(code);
    ctx.console.truncate_chars(amount);
}
