use std::fmt;

use crate::error::{Error, Result};

const SPACE: i64 = b' ' as i64;

/// The program space: a fixed-size, toroidal grid of character codes.
///
/// Cells are stored as a flat row-major buffer indexed by `y * cols + x`.
/// Each cell holds an integer code rather than a `char` so that values
/// written by `p` survive a later `g` even when they are not printable.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Grid {
    rows: usize,
    cols: usize,
    cells: Vec<i64>,
}

impl Grid {
    /// Build a grid from source lines.
    ///
    /// Empty lines are dropped. The width is the length of the longest
    /// line and every kept line is right-padded with spaces to it.
    pub fn from_lines<I, S>(lines: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut cols = 0;
        let mut kept: Vec<Vec<i64>> = Vec::new();
        for line in lines {
            let codes: Vec<i64> = line.as_ref().chars().map(|c| c as i64).collect();
            cols = cols.max(codes.len());
            if !codes.is_empty() {
                kept.push(codes);
            }
        }
        if kept.is_empty() {
            return Err(Error::EmptyProgram);
        }

        let rows = kept.len();
        let mut cells = Vec::with_capacity(rows * cols);
        for mut row in kept {
            row.resize(cols, SPACE);
            cells.extend_from_slice(&row);
        }
        Ok(Self { rows, cols, cells })
    }

    /// Split program text on line terminators and build a grid from it.
    pub fn parse(source: &str) -> Result<Self> {
        Self::from_lines(source.lines())
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// The cells of row `y`. Panics if `y >= rows`.
    pub fn row(&self, y: usize) -> &[i64] {
        &self.cells[y * self.cols..(y + 1) * self.cols]
    }

    /// Read the cell at `(y, x)`. The caller guarantees the coordinates are
    /// in range; the fetch step only ever passes wrapped positions.
    #[inline(always)]
    pub fn char_at(&self, y: usize, x: usize) -> i64 {
        self.cells[y * self.cols + x]
    }

    /// Bounds-checked read for `g`: out-of-range coordinates read as 0.
    pub fn get(&self, y: i64, x: i64) -> i64 {
        match self.index(y, x) {
            Some(idx) => self.cells[idx],
            None => 0,
        }
    }

    /// Bounds-checked write for `p`: out-of-range writes are discarded.
    pub fn put(&mut self, y: i64, x: i64, value: i64) {
        if let Some(idx) = self.index(y, x) {
            self.cells[idx] = value;
        }
    }

    /// Map any coordinate pair onto the torus with floor-mod semantics.
    #[inline(always)]
    pub fn wrap(&self, y: i64, x: i64) -> (usize, usize) {
        (
            y.rem_euclid(self.rows as i64) as usize,
            x.rem_euclid(self.cols as i64) as usize,
        )
    }

    fn index(&self, y: i64, x: i64) -> Option<usize> {
        let y = usize::try_from(y).ok().filter(|&y| y < self.rows)?;
        let x = usize::try_from(x).ok().filter(|&x| x < self.cols)?;
        Some(y * self.cols + x)
    }
}

/// Render a cell code as a displayable character.
pub fn cell_char(code: i64) -> char {
    u32::try_from(code)
        .ok()
        .and_then(char::from_u32)
        .unwrap_or(char::REPLACEMENT_CHARACTER)
}

impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for y in 0..self.rows {
            let line: String = self.row(y).iter().map(|&c| cell_char(c)).collect();
            writeln!(f, "{line}")?;
        }
        Ok(())
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn wrap_always_in_bounds(
            rows in 1usize..20,
            cols in 1usize..20,
            y in any::<i64>(),
            x in any::<i64>()
        ) {
            let lines = vec!["#".repeat(cols); rows];
            let grid = Grid::from_lines(&lines).unwrap();
            let (wy, wx) = grid.wrap(y, x);
            prop_assert!(wy < rows);
            prop_assert!(wx < cols);
        }

        #[test]
        fn every_row_is_padded_to_width(lines in prop::collection::vec("[ -~]{0,12}", 1..10)) {
            if let Ok(grid) = Grid::from_lines(&lines) {
                let widest = lines.iter().map(|l| l.len()).max().unwrap_or(0);
                prop_assert_eq!(grid.cols(), widest);
                prop_assert_eq!(grid.rows(), lines.iter().filter(|l| !l.is_empty()).count());
                for y in 0..grid.rows() {
                    prop_assert_eq!(grid.row(y).len(), widest);
                }
            } else {
                prop_assert!(lines.iter().all(|l| l.is_empty()));
            }
        }
    }
}
