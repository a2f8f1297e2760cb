//! A stack machine over numbers and text.
//!
//! Source is literal text that gets printed, interleaved with code blocks:
//!
//! ```text
//! #loop;Hello!$10 #loop;;
//! ```
//!
//! `#name;` outside a block defines a marker, `$ ... ;` (or `@{ ... }`) is a
//! block of values, operators and `#name;` jumps. See [`ops`] for the operators.
use std::{fmt, sync::Arc};

use crate::{
    input::InputValue,
    parser::ParseError,
    program::Program,
    vm::{Context, Effect, EngineOptions, Language, OperationError},
};

pub mod ops;
pub mod parser;
pub mod value;


pub use ops::OperatorRegistry;
pub use value::{Value, ValueKind};

#[derive(Clone, Debug, PartialEq)]
pub enum Token {
    /// Printed as is.
    Text(String),
    /// Pushed onto the stack.
    Value(Value),
    Operator(char),
    /// Jump to the named marker.
    Jump(String),
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Text(text) => write!(f, "TXT: {text:?}"),
            Token::Value(Value::Text(text)) => write!(f, "VAL: {text:?}"),
            Token::Value(value) => write!(f, "VAL: {value}"),
            Token::Operator(symbol) => write!(f, "OPR: {symbol}"),
            Token::Jump(name) => write!(f, "JMP: {name}"),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct State {
    pub stack: Vec<Value>,
    max_stack_size: usize,
}

impl State {
    pub fn new(max_stack_size: usize) -> Self {
        State { stack: Vec::new(), max_stack_size }
    }

    pub fn with_stack(stack: Vec<Value>, max_stack_size: usize) -> Self {
        State { stack, max_stack_size }
    }

    pub fn pop(&mut self) -> Result<Value, OperationError> {
        self.stack.pop().ok_or(OperationError::PopFailed)
    }

    pub fn push(&mut self, value: Value) -> Result<(), OperationError> {
        if self.stack.len() >= self.max_stack_size {
            return Err(OperationError::PushFailed);
        }
        self.stack.push(value);
        Ok(())
    }
}

#[derive(Clone, Debug)]
pub struct ShortO {
    operators: Arc<OperatorRegistry>,
}

impl Default for ShortO {
    fn default() -> Self {
        Self::new(Arc::new(OperatorRegistry::standard()))
    }
}

impl ShortO {
    pub fn new(operators: Arc<OperatorRegistry>) -> Self {
        ShortO { operators }
    }

    pub fn operators(&self) -> &OperatorRegistry {
        &self.operators
    }
}

impl Language for ShortO {
    type Token = Token;
    type State = State;

    const NAME: &'static str = "shorto";

    fn tokenize(&self, source: &str) -> Result<Program<Token>, ParseError> {
        parser::tokenize(source, &self.operators)
    }

    fn new_state(&self, options: &EngineOptions) -> State {
        State::new(options.max_stack_size)
    }

    fn execute(&self, token: &Token, ctx: &mut Context<'_, Self>) -> Result<Effect, OperationError> {
        match token {
            Token::Text(text) => {
                ctx.console.append(text);
                Ok(Effect::None)
            }
            Token::Value(value) => {
                ctx.state.push(value.clone())?;
                Ok(Effect::None)
            }
            Token::Operator(symbol) => {
                let operator = self
                    .operators
                    .get(*symbol)
                    .ok_or(OperationError::UnknownOperator { symbol: *symbol })?;
                (operator.apply)(ctx)
            }
            Token::Jump(name) => {
                let target = ctx
                    .program
                    .marker(name)
                    .ok_or_else(|| OperationError::UnknownMarker { name: name.clone() })?;
                ctx.program.jump_to(target)?;
                Ok(Effect::Yield)
            }
        }
    }

    fn accept_input(&self, state: &mut State, value: InputValue) -> Result<(), OperationError> {
        let value = match value {
            InputValue::Char(c) => Value::Text(c.to_string()),
            InputValue::Text(text) => Value::Text(text),
            InputValue::Number(n) => Value::number(n),
        };
        state.push(value)
    }
}
