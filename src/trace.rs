use std::fmt::Write;

use crate::grid::cell_char;
use crate::machine::Machine;
use crate::opcode::{Op, is_quote};

/// How many stack entries (from the top) a trace line shows.
const STACK_WINDOW: usize = 8;

/// Describe the instruction the machine is about to execute.
///
/// Format: `step (row,col) dir 'c' MNEMONIC [stack, top last]`.
pub fn step_line<P>(machine: &Machine<P>) -> String {
    let (y, x) = machine.pointer();
    let code = machine.grid().char_at(y, x);
    let mnemonic = if machine.string_mode() && !is_quote(code) {
        "CHAR"
    } else {
        Op::decode(code).mnemonic()
    };

    let mut out = format!(
        "{:>6} ({y},{x}) {} {:?} {mnemonic:<5} [",
        machine.steps(),
        machine.direction(),
        cell_char(code),
    );
    let stack = machine.stack();
    let start = stack.len().saturating_sub(STACK_WINDOW);
    if start > 0 {
        out.push_str("..");
    }
    for (i, v) in stack[start..].iter().enumerate() {
        if i > 0 || start > 0 {
            out.push(' ');
        }
        let _ = write!(out, "{v}");
    }
    out.push(']');
    out
}

/// Render the grid with a `^` marker under the pointer's cell.
pub fn snapshot<P>(machine: &Machine<P>) -> String {
    let (py, px) = machine.pointer();
    let mut out = String::new();
    for (y, line) in machine.grid().to_string().lines().enumerate() {
        let _ = writeln!(out, "{}", line.trim_end());
        if y == py {
            let _ = writeln!(out, "{}^", " ".repeat(px));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Grid;
    use crate::port::LinePort;

    fn machine(source: &str) -> Machine<LinePort<&'static [u8], Vec<u8>>> {
        Machine::with_seed(Grid::parse(source).unwrap(), LinePort::new(&b""[..], Vec::new()), 0)
    }

    #[test]
    fn test_step_line_initial() {
        let m = machine("12+@");
        assert_eq!(step_line(&m), "     0 (0,0) E '1' PUSH  []");
    }

    #[test]
    fn test_step_line_after_steps() {
        let mut m = machine("12+@");
        m.run_for(2).unwrap();
        assert_eq!(step_line(&m), "     2 (0,2) E '+' ADD   [1 2]");
    }

    #[test]
    fn test_step_line_string_mode() {
        let mut m = machine("\"a\"@");
        m.step().unwrap();
        assert!(step_line(&m).contains("'a' CHAR"));
        m.step().unwrap();
        assert!(step_line(&m).contains("STR"));
    }

    #[test]
    fn test_step_line_truncates_deep_stack() {
        let mut m = machine("@");
        for v in 0..10 {
            m.push(v);
        }
        assert!(step_line(&m).ends_with("[.. 2 3 4 5 6 7 8 9]"));
    }

    #[test]
    fn test_snapshot_marks_pointer() {
        let mut m = machine("v\n >@\n");
        m.run_for(1).unwrap();
        assert_eq!(m.pointer(), (1, 0));
        assert_eq!(snapshot(&m), "v\n >@\n^\n");
    }

    #[test]
    fn test_snapshot_shows_written_cells() {
        let mut m = machine("99g\"x\"10p @");
        m.run().unwrap();
        assert_eq!(m.pointer(), (0, 10));
        assert_eq!(snapshot(&m), "9xg\"x\"10p @\n          ^\n");
    }
}
