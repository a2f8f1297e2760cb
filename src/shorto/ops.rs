//! The operator table of the stack machine.
//!
//! Binary operators pop the right operand first.
use std::{cmp::Ordering, fmt};

use rand::Rng;
use rustc_hash::FxHashMap as HashMap;

use super::{
    value::{char_from_code, clamp_index, parse_float, MAX_TEXT_LENGTH, NOT_A_NUMBER},
    ShortO, Value, ValueKind,
};
use crate::{
    input::{InputMode, LineKind},
    vm::{Context, Effect, OperationError},
};

pub type OperatorFn = fn(&mut Context<'_, ShortO>) -> Result<Effect, OperationError>;

#[derive(Clone, Copy)]
pub struct Operator {
    pub symbol: char,
    pub name: &'static str,
    pub apply: OperatorFn,
}

impl fmt::Debug for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Operator").field("symbol", &self.symbol).field("name", &self.name).finish()
    }
}

/// Symbol to operator mapping. Built once, then only read.
#[derive(Clone, Debug, Default)]
pub struct OperatorRegistry {
    operators: HashMap<char, Operator>,
}

impl OperatorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces an operator, returning the replaced one.
    pub fn register(&mut self, symbol: char, name: &'static str, apply: OperatorFn) -> Option<Operator> {
        self.operators.insert(symbol, Operator { symbol, name, apply })
    }

    pub fn get(&self, symbol: char) -> Option<&Operator> {
        self.operators.get(&symbol)
    }

    pub fn contains(&self, symbol: char) -> bool {
        self.operators.contains_key(&symbol)
    }

    pub fn len(&self) -> usize {
        self.operators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operators.is_empty()
    }

    pub fn symbols(&self) -> impl Iterator<Item = char> + '_ {
        self.operators.keys().copied()
    }

    /// The full standard operator set.
    pub fn standard() -> Self {
        let mut registry = Self::new();
        registry.register('+', "add", add);
        registry.register('-', "subtract", subtract);
        registry.register('*', "multiply", multiply);
        registry.register('/', "divide", divide);
        registry.register('%', "remainder", remainder);
        registry.register('~', "to number", to_number);
        registry.register('\'', "to character", to_character);
        registry.register(',', "print", print);
        registry.register('!', "not", not);
        registry.register('X', "drop", drop_top);
        registry.register('^', "repeat", repeat);
        registry.register('S', "to text", to_text);
        registry.register('N', "character codes", char_codes);
        registry.register('>', "skip if", skip_if);
        registry.register('.', "read character", read_char);
        registry.register('=', "compare", compare);
        registry.register('v', "reverse", reverse);
        registry.register('_', "read text", read_text);
        registry.register(':', "read number", read_number);
        registry.register('D', "delete output", delete_output);
        registry.register('T', "is text", is_text);
        registry.register('C', "clear output", clear_output);
        registry.register('L', "length", length);
        registry.register('|', "or", or);
        registry.register('&', "and", and);
        registry.register('?', "random", random);
        registry.register('°', "floor", floor);
        registry.register('l', "stack length", stack_length);
        registry
    }
}

type Ctx<'a, 'b> = &'a mut Context<'b, ShortO>;

fn pop2(ctx: Ctx) -> Result<(Value, Value), OperationError> {
    let right = ctx.state.pop()?;
    let left = ctx.state.pop()?;
    Ok((left, right))
}

fn push(ctx: Ctx, value: Value) -> Result<Effect, OperationError> {
    ctx.state.push(value)?;
    Ok(Effect::None)
}

fn check_length(operator: char, left: &Value, right: &Value, requested: u64) -> Result<(), OperationError> {
    if requested > MAX_TEXT_LENGTH {
        return Err(OperationError::TextTooLong {
            operator,
            left: left.kind(),
            right: right.kind(),
            requested,
        });
    }
    Ok(())
}

/// Number of iterations of a `while (n-- > 0)` loop.
fn loop_count(n: f64) -> u64 {
    if n > 0.0 { n.ceil() as u64 } else { 0 }
}

fn add(ctx: Ctx) -> Result<Effect, OperationError> {
    let (left, right) = pop2(ctx)?;
    let value = match (&left, &right) {
        (Value::Number(l), Value::Number(r)) => Value::number(l + r),
        _ => {
            let joined = format!("{left}{right}");
            check_length('+', &left, &right, joined.chars().count() as u64)?;
            Value::Text(joined)
        }
    };
    push(ctx, value)
}

fn subtract(ctx: Ctx) -> Result<Effect, OperationError> {
    let (left, right) = pop2(ctx)?;
    let value = match (left, right) {
        (Value::Number(l), Value::Number(r)) => Value::number(l - r),
        (Value::Text(l), Value::Text(r)) => Value::Text(l.replace(&r, "")),
        // Number minus text drops characters from the front of the text.
        (Value::Number(l), Value::Text(r)) => {
            let skip = clamp_index(l, r.chars().count());
            Value::Text(r.chars().skip(skip).collect())
        }
        // Text minus number drops characters from its end.
        (Value::Text(l), Value::Number(r)) => {
            let len = l.chars().count();
            let keep = clamp_index(len as f64 - r, len);
            Value::Text(l.chars().take(keep).collect())
        }
    };
    push(ctx, value)
}

fn multiply(ctx: Ctx) -> Result<Effect, OperationError> {
    let (left, right) = pop2(ctx)?;
    let (text, count) = match (&left, &right) {
        (Value::Number(l), Value::Number(r)) => return push(ctx, Value::number(l * r)),
        (Value::Text(_), Value::Text(_)) => return push(ctx, Value::text(NOT_A_NUMBER)),
        (Value::Number(n), Value::Text(s)) | (Value::Text(s), Value::Number(n)) => (s, n.abs().trunc()),
    };
    let requested = (text.chars().count() as f64 * count).min(u64::MAX as f64) as u64;
    check_length('*', &left, &right, requested)?;
    let repeated = text.repeat(count as usize);
    push(ctx, Value::Text(repeated))
}

fn numeric(ctx: Ctx, op: impl Fn(f64, f64) -> f64) -> Result<Effect, OperationError> {
    let value = match pop2(ctx)? {
        (Value::Number(l), Value::Number(r)) => Value::number(op(l, r)),
        _ => Value::text(NOT_A_NUMBER),
    };
    push(ctx, value)
}

fn divide(ctx: Ctx) -> Result<Effect, OperationError> {
    numeric(ctx, |l, r| l / r)
}

fn remainder(ctx: Ctx) -> Result<Effect, OperationError> {
    numeric(ctx, |l, r| l % r)
}

fn to_number(ctx: Ctx) -> Result<Effect, OperationError> {
    let value = match ctx.state.pop()? {
        Value::Text(s) => Value::number(parse_float(&s)),
        number => number,
    };
    push(ctx, value)
}

fn to_character(ctx: Ctx) -> Result<Effect, OperationError> {
    let value = match ctx.state.pop()? {
        Value::Number(n) => Value::Text(char_from_code(n).to_string()),
        text => text,
    };
    push(ctx, value)
}

fn print(ctx: Ctx) -> Result<Effect, OperationError> {
    let value = ctx.state.pop()?;
    ctx.console.append(&value.to_string());
    Ok(Effect::None)
}

fn not(ctx: Ctx) -> Result<Effect, OperationError> {
    let value = ctx.state.pop()?;
    push(ctx, Value::bool(!value.is_truthy()))
}

fn drop_top(ctx: Ctx) -> Result<Effect, OperationError> {
    ctx.state.pop()?;
    Ok(Effect::None)
}

fn repeat(ctx: Ctx) -> Result<Effect, OperationError> {
    let count = ctx.state.pop()?.as_count();
    let value = ctx.state.pop()?;
    for _ in 0..loop_count(count) {
        ctx.state.push(value.clone())?;
    }
    Ok(Effect::None)
}

fn to_text(ctx: Ctx) -> Result<Effect, OperationError> {
    let value = ctx.state.pop()?;
    push(ctx, Value::Text(value.to_string()))
}

fn char_codes(ctx: Ctx) -> Result<Effect, OperationError> {
    match ctx.state.pop()? {
        Value::Text(s) => {
            for c in s.chars() {
                ctx.state.push(Value::Number(c as u32 as f64))?;
            }
            Ok(Effect::None)
        }
        number => push(ctx, number),
    }
}

fn skip_if(ctx: Ctx) -> Result<Effect, OperationError> {
    let amount = ctx.state.pop()?.as_count();
    let condition = ctx.state.pop()?;
    if condition.is_truthy() {
        ctx.program.jump_by(amount.trunc() as i64)?;
    }
    Ok(Effect::None)
}

fn read_char(_ctx: Ctx) -> Result<Effect, OperationError> {
    Ok(Effect::Input(InputMode::Char))
}

fn read_text(_ctx: Ctx) -> Result<Effect, OperationError> {
    Ok(Effect::Input(InputMode::Line(LineKind::Text)))
}

fn read_number(_ctx: Ctx) -> Result<Effect, OperationError> {
    Ok(Effect::Input(InputMode::Line(LineKind::Decimal)))
}

fn compare(ctx: Ctx) -> Result<Effect, OperationError> {
    let (left, right) = pop2(ctx)?;
    let result = match left.compare(&right) {
        Ordering::Less => -1.0,
        Ordering::Equal => 0.0,
        Ordering::Greater => 1.0,
    };
    push(ctx, Value::Number(result))
}

fn reverse(ctx: Ctx) -> Result<Effect, OperationError> {
    let count = loop_count(ctx.state.pop()?.as_count());
    let mut values = Vec::new();
    for _ in 0..count {
        values.push(ctx.state.pop()?);
    }
    for value in values {
        ctx.state.push(value)?;
    }
    Ok(Effect::None)
}

fn delete_output(ctx: Ctx) -> Result<Effect, OperationError> {
    let amount = ctx.state.pop()?.as_count();
    let len = ctx.console.char_len();
    ctx.console.truncate_to(clamp_index(len as f64 - amount, len));
    Ok(Effect::None)
}

fn is_text(ctx: Ctx) -> Result<Effect, OperationError> {
    let value = ctx.state.pop()?;
    push(ctx, Value::bool(value.kind() == ValueKind::Text))
}

fn clear_output(ctx: Ctx) -> Result<Effect, OperationError> {
    ctx.console.clear();
    Ok(Effect::None)
}

fn length(ctx: Ctx) -> Result<Effect, OperationError> {
    let value = match ctx.state.pop()? {
        Value::Text(s) => s.chars().count() as f64,
        Value::Number(n) => {
            let mut n = n.floor().abs();
            let mut digits = 1.0;
            while n >= 10.0 {
                digits += 1.0;
                n = (n / 10.0).floor();
            }
            digits
        }
    };
    push(ctx, Value::Number(value))
}

fn or(ctx: Ctx) -> Result<Effect, OperationError> {
    let result = ctx.state.pop()?.is_truthy() || ctx.state.pop()?.is_truthy();
    push(ctx, Value::bool(result))
}

fn and(ctx: Ctx) -> Result<Effect, OperationError> {
    let result = ctx.state.pop()?.is_truthy() && ctx.state.pop()?.is_truthy();
    push(ctx, Value::bool(result))
}

fn random(ctx: Ctx) -> Result<Effect, OperationError> {
    let n: f64 = ctx.rng.random();
    push(ctx, Value::Number(n))
}

fn floor(ctx: Ctx) -> Result<Effect, OperationError> {
    let value = match ctx.state.pop()? {
        Value::Number(n) => Value::number(n.floor()),
        text => text,
    };
    push(ctx, value)
}

fn stack_length(ctx: Ctx) -> Result<Effect, OperationError> {
    let len = ctx.state.stack.len();
    push(ctx, Value::Number(len as f64))
}
