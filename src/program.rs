//! The token sequence of a parsed program together with its instruction pointer.
use rustc_hash::FxHashMap as HashMap;

use crate::vm::OperationError;

/// Marker name to the index of the token following its definition.
pub type MarkerTable = HashMap<String, usize>;

#[derive(Clone, Debug, PartialEq)]
pub struct Program<T> {
    tokens: Vec<T>,
    markers: MarkerTable,
    pc: usize,
}

impl<T: Clone> Program<T> {
    pub fn new(tokens: Vec<T>, markers: MarkerTable) -> Self {
        Program { tokens, markers, pc: 0 }
    }

    pub fn without_markers(tokens: Vec<T>) -> Self {
        Self::new(tokens, MarkerTable::default())
    }

    pub fn tokens(&self) -> &[T] {
        &self.tokens
    }

    pub fn markers(&self) -> &MarkerTable {
        &self.markers
    }

    pub fn marker(&self, name: &str) -> Option<usize> {
        self.markers.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Index of the next token to execute; equal to [`Program::len`] once finished.
    pub fn pc(&self) -> usize {
        self.pc
    }

    pub fn is_finished(&self) -> bool {
        self.pc >= self.tokens.len()
    }

    /// Returns the token at the instruction pointer and moves past it.
    pub fn advance(&mut self) -> Option<T> {
        let token = self.tokens.get(self.pc)?.clone();
        self.pc += 1;
        Some(token)
    }

    pub fn peek(&self) -> Option<&T> {
        self.tokens.get(self.pc)
    }

    /// Sets the instruction pointer. `index == len()` is allowed and ends the program.
    pub fn jump_to(&mut self, index: usize) -> Result<(), OperationError> {
        if index > self.tokens.len() {
            return Err(OperationError::JumpOutOfRange { target: index as i64 });
        }
        self.pc = index;
        Ok(())
    }

    /// Moves the instruction pointer relative to its current position.
    pub fn jump_by(&mut self, offset: i64) -> Result<(), OperationError> {
        let target = (self.pc as i64)
            .checked_add(offset)
            .ok_or(OperationError::JumpOutOfRange { target: i64::MAX })?;
        if target < 0 {
            return Err(OperationError::JumpOutOfRange { target });
        }
        self.jump_to(target as usize)
    }

    pub fn reset(&mut self) {
        self.pc = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advance_until_end() {
        let mut program = Program::without_markers(vec!['a', 'b']);
        assert_eq!(program.advance(), Some('a'));
        assert_eq!(program.advance(), Some('b'));
        assert!(program.is_finished());
        assert_eq!(program.advance(), None);
        assert_eq!(program.pc(), 2);
    }

    #[test]
    fn test_jumps_are_bounds_checked() {
        let mut program = Program::without_markers(vec![1, 2, 3]);
        assert!(program.jump_to(3).is_ok());
        assert!(program.is_finished());
        assert_eq!(program.jump_to(4), Err(OperationError::JumpOutOfRange { target: 4 }));
        program.reset();
        assert_eq!(program.jump_by(-1), Err(OperationError::JumpOutOfRange { target: -1 }));
        assert!(program.jump_by(2).is_ok());
        assert_eq!(program.advance(), Some(3));
    }
}
