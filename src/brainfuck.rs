//! Brainfuck on a 30 000 cell wrapping tape.
//!
//! Loops are resolved while running: `[` remembers its own position and `]`
//! jumps back to it while the current cell is non-zero, so a loop body always
//! runs at least once. Characters other than the eight instructions are comments.
use std::fmt;

use crate::{
    input::{InputEvent, InputMode, InputValue},
    parser::ParseError,
    program::Program,
    tape::Tape,
    vm::{Context, Effect, EngineOptions, Language, OperationError},
};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BfOp {
    Right,
    Left,
    Increment,
    Decrement,
    Output,
    Input,
    LoopStart,
    LoopEnd,
}

impl BfOp {
    pub fn from_char(c: char) -> Option<BfOp> {
        match c {
            '>' => Some(BfOp::Right),
            '<' => Some(BfOp::Left),
            '+' => Some(BfOp::Increment),
            '-' => Some(BfOp::Decrement),
            '.' => Some(BfOp::Output),
            ',' => Some(BfOp::Input),
            '[' => Some(BfOp::LoopStart),
            ']' => Some(BfOp::LoopEnd),
            _ => None,
        }
    }

    pub fn symbol(self) -> char {
        match self {
            BfOp::Right => '>',
            BfOp::Left => '<',
            BfOp::Increment => '+',
            BfOp::Decrement => '-',
            BfOp::Output => '.',
            BfOp::Input => ',',
            BfOp::LoopStart => '[',
            BfOp::LoopEnd => ']',
        }
    }
}

impl fmt::Display for BfOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

#[derive(Clone, Debug, Default)]
pub struct BfState {
    pub tape: Tape,
    /// Positions of the `[` instructions entered and not yet closed.
    pub loop_starts: Vec<usize>,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct Brainfuck;

impl Language for Brainfuck {
    type Token = BfOp;
    type State = BfState;

    const NAME: &'static str = "brainfuck";

    fn tokenize(&self, source: &str) -> Result<Program<BfOp>, ParseError> {
        Ok(Program::without_markers(source.chars().filter_map(BfOp::from_char).collect()))
    }

    fn new_state(&self, _options: &EngineOptions) -> BfState {
        BfState::default()
    }

    fn execute(&self, op: &BfOp, ctx: &mut Context<'_, Self>) -> Result<Effect, OperationError> {
        let tape = &mut ctx.state.tape;
        match op {
            BfOp::Right => tape.move_by(1),
            BfOp::Left => tape.move_by(-1),
            BfOp::Increment => tape.add(1),
            BfOp::Decrement => tape.add(-1),
            BfOp::Output => ctx.console.push_char(char::from(tape.get())),
            BfOp::Input => return Ok(Effect::Input(InputMode::Char)),
            BfOp::LoopStart => ctx.state.loop_starts.push(ctx.program.pc() - 1),
            BfOp::LoopEnd => {
                if let Some(start) = ctx.state.loop_starts.pop() {
                    if ctx.state.tape.get() != 0 {
                        ctx.program.jump_to(start)?;
                    }
                }
                return Ok(Effect::Yield);
            }
        }
        Ok(Effect::None)
    }

    /// Only printable keys and Enter count as input.
    fn char_for_key(event: InputEvent) -> Option<char> {
        match event {
            InputEvent::Char(c) => Some(c),
            InputEvent::Enter => Some('\n'),
            _ => None,
        }
    }

    fn accept_input(&self, state: &mut BfState, value: InputValue) -> Result<(), OperationError> {
        match value {
            InputValue::Char(c) => {
                state.tape.set(c as i64);
                Ok(())
            }
            _ => Err(OperationError::UnexpectedInput),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vm::{Engine, EngineState, Step};

    fn run(source: &str) -> Engine<Brainfuck> {
        let mut engine = Engine::new(Brainfuck, EngineOptions::default());
        engine.run(source);
        engine.run_until_blocked();
        engine
    }

    #[test]
    fn test_comments_are_ignored() {
        let program = Brainfuck.tokenize("a+b-c\n[x]").unwrap();
        assert_eq!(
            program.tokens(),
            &[BfOp::Increment, BfOp::Decrement, BfOp::LoopStart, BfOp::LoopEnd]
        );
    }

    #[test]
    fn test_output_three() {
        let engine = run("+++.");
        assert_eq!(engine.state(), EngineState::Completed);
        assert_eq!(engine.output(), "\u{3}");
    }

    #[test]
    fn test_hello() {
        let source = "++++++++[>++++[>++>+++>+++>+<<<<-]>+>+>->>+[<]<-]>>.>---.+++++++..+++.>>.<-.<.+++.------.--------.>>+.>++.";
        let engine = run(source);
        assert_eq!(engine.output(), "Hello World!\n");
    }

    #[test]
    fn test_loop_body_runs_once_on_zero() {
        // `[` does not skip, so the body runs once even though cell 0 is zero.
        let engine = run("[>+<]>.");
        assert_eq!(engine.output(), "\u{1}");
    }

    #[test]
    fn test_unmatched_loop_end_is_ignored() {
        let engine = run("]+.");
        assert_eq!(engine.state(), EngineState::Completed);
        assert_eq!(engine.output(), "\u{1}");
    }

    #[test]
    fn test_pointer_wraps_left() {
        let engine = run("<+++.>.");
        assert_eq!(engine.output(), "\u{3}\u{0}");
    }

    #[test]
    fn test_input_echo() {
        let mut engine = Engine::new(Brainfuck, EngineOptions::default());
        engine.run(",+.");
        assert_eq!(engine.run_until_blocked(), Step::AwaitingInput(InputMode::Char));
        assert_eq!(engine.input(InputEvent::Char('a')), Step::Done(EngineState::Completed));
        assert_eq!(engine.output(), "b");
    }

    #[test]
    fn test_named_keys_other_than_enter_are_ignored() {
        let mut engine = Engine::new(Brainfuck, EngineOptions::default());
        engine.run(",.,.");
        engine.run_until_blocked();
        assert_eq!(engine.input(InputEvent::Tab), Step::AwaitingInput(InputMode::Char));
        assert_eq!(engine.input(InputEvent::Backspace), Step::AwaitingInput(InputMode::Char));
        assert_eq!(engine.input(InputEvent::Enter), Step::AwaitingInput(InputMode::Char));
        assert_eq!(engine.input(InputEvent::Char('x')), Step::Done(EngineState::Completed));
        assert_eq!(engine.output(), "\nx");
    }

    #[test]
    fn test_input_wraps_to_byte() {
        let mut engine = Engine::new(Brainfuck, EngineOptions::default());
        engine.run(",.");
        engine.run_until_blocked();
        engine.input(InputEvent::Char('\u{141}'));
        assert_eq!(engine.output(), "A");
    }

    #[test]
    fn test_loop_end_yields() {
        let mut engine = Engine::new(Brainfuck, EngineOptions::default());
        engine.run("++[-]+.");
        assert_eq!(engine.step(), Step::Continue);
        assert_eq!(engine.output(), "");
        assert_eq!(engine.run_until_blocked(), Step::Done(EngineState::Completed));
        assert_eq!(engine.output(), "\u{1}");
    }
}
