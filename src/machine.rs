use std::fmt;
use std::io;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::error::Result;
use crate::grid::Grid;
use crate::opcode::{Op, is_quote};
use crate::port::{Input, Port};

/// Direction of travel of the instruction pointer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    North,
    East,
    South,
    West,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
    ];

    /// The `(dy, dx)` step for this direction.
    #[inline(always)]
    pub fn vector(self) -> (i64, i64) {
        match self {
            Direction::North => (-1, 0),
            Direction::East => (0, 1),
            Direction::South => (1, 0),
            Direction::West => (0, -1),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let c = match self {
            Direction::North => 'N',
            Direction::East => 'E',
            Direction::South => 'S',
            Direction::West => 'W',
        };
        write!(f, "{c}")
    }
}

/// A Befunge-93 machine: one grid, one instruction pointer, one stack.
///
/// The pointer starts at the top-left cell heading east. Each step fetches
/// the cell under the pointer, executes it, and moves one cell along the
/// current direction, wrapping around the grid edges. The machine stops
/// only at `@`; there is no built-in step bound, so hosts that need one
/// drive it with [`Machine::run_for`] or [`Machine::step`].
///
/// Stack underflow is not an error: popping an empty stack yields 0.
pub struct Machine<P> {
    grid: Grid,
    port: P,
    rng: SmallRng,
    y: usize,
    x: usize,
    direction: Direction,
    stack: Vec<i64>,
    string_mode: bool,
    halted: bool,
    steps: u64,
}

impl<P: Port> Machine<P> {
    /// Create a machine whose `?` draws from an entropy-seeded RNG.
    pub fn new(grid: Grid, port: P) -> Self {
        Self::with_rng(grid, port, SmallRng::from_entropy())
    }

    /// Create a machine with a reproducible `?`.
    pub fn with_seed(grid: Grid, port: P, seed: u64) -> Self {
        Self::with_rng(grid, port, SmallRng::seed_from_u64(seed))
    }

    fn with_rng(grid: Grid, port: P, rng: SmallRng) -> Self {
        Self {
            grid,
            port,
            rng,
            y: 0,
            x: 0,
            direction: Direction::East,
            stack: Vec::new(),
            string_mode: false,
            halted: false,
            steps: 0,
        }
    }

    /// Run until `@` is executed. A program that never halts never returns.
    pub fn run(&mut self) -> Result<()> {
        while !self.halted {
            self.step()?;
        }
        self.port.flush()?;
        Ok(())
    }

    /// Run until `@` or until `step_limit` steps have been executed.
    ///
    /// Returns the number of steps actually executed.
    pub fn run_for(&mut self, step_limit: usize) -> Result<usize> {
        let mut steps = 0;
        while !self.halted && steps < step_limit {
            self.step()?;
            steps += 1;
        }
        self.port.flush()?;
        Ok(steps)
    }

    /// Push buffered output through to the port's sink.
    pub fn flush(&mut self) -> Result<()> {
        self.port.flush()?;
        Ok(())
    }

    /// Execute the instruction under the pointer and move on.
    ///
    /// Does nothing once the machine has halted. After `@` the pointer
    /// stays on the halting cell.
    pub fn step(&mut self) -> Result<()> {
        if self.halted {
            return Ok(());
        }
        self.steps += 1;

        let code = self.grid.char_at(self.y, self.x);
        if self.string_mode {
            if is_quote(code) {
                self.string_mode = false;
            } else {
                self.push(code);
            }
        } else {
            self.execute(Op::decode(code))?;
        }

        if !self.halted {
            self.advance();
        }
        Ok(())
    }

    fn execute(&mut self, op: Op) -> Result<()> {
        match op {
            Op::Digit(d) => self.push(d as i64),
            Op::Add => {
                let a = self.safe_pop();
                let b = self.safe_pop();
                self.push(b.wrapping_add(a));
            }
            Op::Sub => {
                let a = self.safe_pop();
                let b = self.safe_pop();
                self.push(b.wrapping_sub(a));
            }
            Op::Mul => {
                let a = self.safe_pop();
                let b = self.safe_pop();
                self.push(b.wrapping_mul(a));
            }
            Op::Div => {
                let a = self.safe_pop();
                let b = self.safe_pop();
                self.push(floor_div(b, a));
            }
            Op::Mod => {
                let a = self.safe_pop();
                let b = self.safe_pop();
                self.push(floor_mod(b, a));
            }
            Op::Not => {
                let v = self.safe_pop();
                self.push((v == 0) as i64);
            }
            Op::Greater => {
                let a = self.safe_pop();
                let b = self.safe_pop();
                self.push((b > a) as i64);
            }
            Op::Go(direction) => self.direction = direction,
            Op::Random => {
                self.direction = Direction::ALL[self.rng.gen_range(0..Direction::ALL.len())];
            }
            Op::HorizontalIf => {
                self.direction = if self.safe_pop() == 0 {
                    Direction::East
                } else {
                    Direction::West
                };
            }
            Op::VerticalIf => {
                self.direction = if self.safe_pop() == 0 {
                    Direction::South
                } else {
                    Direction::North
                };
            }
            Op::StringMode => self.string_mode = true,
            Op::Dup => {
                let v = self.safe_pop();
                self.push(v);
                self.push(v);
            }
            Op::Swap => {
                let a = self.safe_pop();
                let b = self.safe_pop();
                self.push(a);
                self.push(b);
            }
            Op::Discard => {
                self.safe_pop();
            }
            Op::PrintInt => {
                let v = self.safe_pop();
                self.port.print_int(v)?;
            }
            Op::PrintChar => {
                let v = self.safe_pop();
                self.port.print_char(v)?;
            }
            // The regular advance after this step makes it two cells.
            Op::Bridge => self.advance(),
            Op::Get => {
                let y = self.safe_pop();
                let x = self.safe_pop();
                let v = self.grid.get(y, x);
                self.push(v);
            }
            Op::Put => {
                let y = self.safe_pop();
                let x = self.safe_pop();
                let v = self.safe_pop();
                self.grid.put(y, x, v);
            }
            Op::ReadInt => {
                let v = self.read_until_valid(P::read_int)?;
                self.push(v);
            }
            Op::ReadChar => {
                let v = self.read_until_valid(P::read_char)?;
                self.push(v);
            }
            Op::Halt => self.halted = true,
            Op::Nop => {}
        }
        Ok(())
    }

    /// Keep asking the port until it produces a value. Exhausted input
    /// reads as -1.
    fn read_until_valid(&mut self, read: fn(&mut P) -> io::Result<Input<i64>>) -> Result<i64> {
        loop {
            match read(&mut self.port)? {
                Input::Value(v) => return Ok(v),
                Input::Invalid(reason) => self.port.reject(&reason)?,
                Input::Closed => return Ok(-1),
            }
        }
    }
}

impl<P> Machine<P> {
    /// Pop the top of the stack, or 0 if the stack is empty.
    #[inline(always)]
    pub fn safe_pop(&mut self) -> i64 {
        self.stack.pop().unwrap_or(0)
    }

    #[inline(always)]
    pub fn push(&mut self, value: i64) {
        self.stack.push(value);
    }

    #[inline(always)]
    fn advance(&mut self) {
        let (dy, dx) = self.direction.vector();
        let (y, x) = self.grid.wrap(self.y as i64 + dy, self.x as i64 + dx);
        self.y = y;
        self.x = x;
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// The pointer as `(row, column)`.
    pub fn pointer(&self) -> (usize, usize) {
        (self.y, self.x)
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// The stack, bottom first.
    pub fn stack(&self) -> &[i64] {
        &self.stack
    }

    pub fn string_mode(&self) -> bool {
        self.string_mode
    }

    pub fn is_halted(&self) -> bool {
        self.halted
    }

    /// Total steps executed since construction.
    pub fn steps(&self) -> u64 {
        self.steps
    }

    pub fn port(&self) -> &P {
        &self.port
    }
}

/// Integer division rounding toward negative infinity. Division by zero
/// yields 0.
pub fn floor_div(b: i64, a: i64) -> i64 {
    if a == 0 {
        return 0;
    }
    let q = b.wrapping_div(a);
    if b.wrapping_rem(a) != 0 && ((b < 0) != (a < 0)) {
        q - 1
    } else {
        q
    }
}

/// Remainder matching [`floor_div`]: takes the sign of the divisor.
/// Modulo by zero yields 0.
pub fn floor_mod(b: i64, a: i64) -> i64 {
    if a == 0 {
        return 0;
    }
    let r = b.wrapping_rem(a);
    if r != 0 && ((r < 0) != (a < 0)) {
        r + a
    } else {
        r
    }
}
