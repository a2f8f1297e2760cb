//! A fixed-length byte tape with a single wrapping pointer.
use num_integer::Integer;

/// Number of cells on a fresh tape.
pub const TAPE_LENGTH: usize = 30_000;

/// Cells hold values in `0..CELL_MODULUS`.
pub const CELL_MODULUS: i64 = 256;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Tape {
    cells: Vec<u8>,
    pointer: usize,
}

impl Default for Tape {
    fn default() -> Self {
        Self::new(TAPE_LENGTH)
    }
}

impl Tape {
    pub fn new(length: usize) -> Self {
        assert!(length > 0, "tape must have at least one cell");
        Tape { cells: vec![0; length], pointer: 0 }
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn pointer(&self) -> usize {
        self.pointer
    }

    pub fn get(&self) -> u8 {
        self.cells[self.pointer]
    }

    pub fn cells(&self) -> &[u8] {
        &self.cells
    }

    /// Moves the pointer, wrapping around both ends.
    pub fn move_by(&mut self, amount: i64) {
        let len = self.cells.len() as i64;
        self.pointer = (self.pointer as i64 + amount.mod_floor(&len)).mod_floor(&len) as usize;
    }

    /// Adds to the current cell modulo 256.
    pub fn add(&mut self, amount: i64) {
        let value = self.get() as i64 + amount.mod_floor(&CELL_MODULUS);
        self.cells[self.pointer] = value.mod_floor(&CELL_MODULUS) as u8;
    }

    /// Stores `value` modulo 256.
    pub fn set(&mut self, value: i64) {
        self.cells[self.pointer] = value.mod_floor(&CELL_MODULUS) as u8;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{Rng, SeedableRng};

    #[test]
    fn test_pointer_wraps_both_ways() {
        let mut tape = Tape::default();
        tape.move_by(-1);
        assert_eq!(tape.pointer(), TAPE_LENGTH - 1);
        tape.move_by(1);
        assert_eq!(tape.pointer(), 0);
        tape.move_by(TAPE_LENGTH as i64 * 3 + 5);
        assert_eq!(tape.pointer(), 5);
        tape.move_by(i64::MIN);
        assert!(tape.pointer() < TAPE_LENGTH);
    }

    #[test]
    fn test_cell_arithmetic_wraps() {
        let mut tape = Tape::new(4);
        tape.add(-1);
        assert_eq!(tape.get(), 255);
        tape.add(2);
        assert_eq!(tape.get(), 1);
        tape.set(-3);
        assert_eq!(tape.get(), 253);
        tape.set(256 * 7 + 9);
        assert_eq!(tape.get(), 9);
        tape.add(i64::MAX);
        assert_eq!(tape.get(), ((9 + (i64::MAX % 256)) % 256) as u8);
    }

    #[test]
    fn test_random_moves_stay_in_bounds() {
        let mut rng = rand::rngs::SmallRng::seed_from_u64(1);
        let mut tape = Tape::default();
        let mut expected: i64 = 0;
        for _ in 0..10_000 {
            let amount = match rng.random_range(0..4) {
                0 => 1,
                1 => -1,
                2 => rng.random_range(-100_000..100_000),
                _ => rng.random::<i64>(),
            };
            tape.move_by(amount);
            expected = (expected + amount.rem_euclid(TAPE_LENGTH as i64)) % TAPE_LENGTH as i64;
            assert!(tape.pointer() < TAPE_LENGTH);
            assert_eq!(tape.pointer() as i64, expected);
        }
    }
}
