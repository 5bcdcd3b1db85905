use std::collections::VecDeque;
use std::io::{self, BufRead, BufWriter, IsTerminal, StdinLock, StdoutLock, Write};

use crate::grid::cell_char;

/// The outcome of one attempt to read a value from the user.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Input<T> {
    /// A well-formed value.
    Value(T),
    /// Malformed entry; the machine reports the reason and asks again.
    Invalid(String),
    /// Input is exhausted and cannot be retried.
    Closed,
}

/// The interpreter's only channel to the outside world.
///
/// `.` and `,` write through `print_int`/`print_char`; `&` and `~` read
/// through `read_int`/`read_char`. A read may come back `Invalid`, in which
/// case the machine calls `reject` and reads again.
pub trait Port {
    fn print_int(&mut self, value: i64) -> io::Result<()>;

    fn print_char(&mut self, code: i64) -> io::Result<()>;

    fn read_int(&mut self) -> io::Result<Input<i64>>;

    /// Read one character, returned as its code.
    fn read_char(&mut self) -> io::Result<Input<i64>>;

    /// Tell the user their last entry was rejected.
    fn reject(&mut self, reason: &str) -> io::Result<()>;

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// A line-oriented port over any reader/writer pair.
///
/// Input is consumed a line at a time. `~` hands out the characters of the
/// current line one by one, then a single `\n`, and only reads a new line
/// once they run out; `&` takes whatever is left of the current line (or a
/// fresh one, if nothing but the line break is left) as a decimal integer.
pub struct LinePort<R, W> {
    reader: R,
    writer: W,
    /// Unconsumed characters of the last line read.
    pending: VecDeque<char>,
    /// Prompt on stderr and flush output before every read.
    interactive: bool,
    rejected: usize,
}

/// The port used by the command-line binary.
pub type StdioPort = LinePort<StdinLock<'static>, BufWriter<StdoutLock<'static>>>;

impl StdioPort {
    /// Wrap the process's stdin and stdout. Prompts are shown only when
    /// stdin is a terminal.
    pub fn stdio() -> Self {
        let stdin = io::stdin();
        let interactive = stdin.is_terminal();
        LinePort::new(stdin.lock(), BufWriter::new(io::stdout().lock())).interactive(interactive)
    }
}

impl<R: BufRead, W: Write> LinePort<R, W> {
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            reader,
            writer,
            pending: VecDeque::new(),
            interactive: false,
            rejected: 0,
        }
    }

    pub fn interactive(mut self, interactive: bool) -> Self {
        self.interactive = interactive;
        self
    }

    /// Number of entries rejected so far.
    pub fn rejected(&self) -> usize {
        self.rejected
    }

    /// Read the next line without its terminator, or `None` at end of input.
    fn next_line(&mut self, prompt: &str) -> io::Result<Option<String>> {
        if self.interactive {
            self.writer.flush()?;
            eprint!("{prompt}");
        }
        let mut line = String::new();
        if self.reader.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        while line.ends_with(['\n', '\r']) {
            line.pop();
        }
        Ok(Some(line))
    }
}

impl<R: BufRead, W: Write> Port for LinePort<R, W> {
    fn print_int(&mut self, value: i64) -> io::Result<()> {
        write!(self.writer, "{value} ")
    }

    fn print_char(&mut self, code: i64) -> io::Result<()> {
        write!(self.writer, "{}", cell_char(code))
    }

    fn read_int(&mut self) -> io::Result<Input<i64>> {
        let leftover: String = self.pending.drain(..).collect();
        let text = if leftover.trim().is_empty() {
            match self.next_line("& ")? {
                Some(line) => line,
                None => return Ok(Input::Closed),
            }
        } else {
            leftover
        };

        let text = text.trim();
        if text.is_empty() {
            return Ok(Input::Invalid("expected an integer".to_string()));
        }
        Ok(match text.parse::<i64>() {
            Ok(value) => Input::Value(value),
            Err(e) => Input::Invalid(format!("{text:?} is not an integer: {e}")),
        })
    }

    fn read_char(&mut self) -> io::Result<Input<i64>> {
        if self.pending.is_empty() {
            match self.next_line("~ ")? {
                Some(line) if line.is_empty() => {
                    return Ok(Input::Invalid("expected a character".to_string()));
                }
                Some(line) => {
                    self.pending.extend(line.chars());
                    self.pending.push_back('\n');
                }
                None => return Ok(Input::Closed),
            }
        }
        Ok(match self.pending.pop_front() {
            Some(c) => Input::Value(c as i64),
            None => Input::Closed,
        })
    }

    fn reject(&mut self, reason: &str) -> io::Result<()> {
        self.rejected += 1;
        if self.interactive {
            eprintln!("invalid input: {reason}");
        }
        Ok(())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

impl<R> LinePort<R, Vec<u8>> {
    /// Everything printed so far, for in-memory ports.
    pub fn output(&self) -> String {
        String::from_utf8_lossy(&self.writer).into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn port(input: &str) -> LinePort<&[u8], Vec<u8>> {
        LinePort::new(input.as_bytes(), Vec::new())
    }

    #[test]
    fn test_print_int_appends_space() {
        let mut p = port("");
        p.print_int(42).unwrap();
        p.print_int(-3).unwrap();
        assert_eq!(p.output(), "42 -3 ");
    }

    #[test]
    fn test_print_char() {
        let mut p = port("");
        p.print_char(b'H' as i64).unwrap();
        p.print_char('é' as i64).unwrap();
        p.print_char(10).unwrap();
        p.print_char(-1).unwrap();
        assert_eq!(p.output(), "Hé\n\u{FFFD}");
    }

    #[test]
    fn test_read_int() {
        let mut p = port("  17 \n-4\n");
        assert_eq!(p.read_int().unwrap(), Input::Value(17));
        assert_eq!(p.read_int().unwrap(), Input::Value(-4));
        assert_eq!(p.read_int().unwrap(), Input::Closed);
    }

    #[test]
    fn test_read_int_invalid() {
        let mut p = port("abc\n\n12x\n");
        assert!(matches!(p.read_int().unwrap(), Input::Invalid(_)));
        assert!(matches!(p.read_int().unwrap(), Input::Invalid(_)));
        assert!(matches!(p.read_int().unwrap(), Input::Invalid(_)));
    }

    #[test]
    fn test_read_char_walks_the_line() {
        let mut p = port("hi\r\nx");
        assert_eq!(p.read_char().unwrap(), Input::Value(b'h' as i64));
        assert_eq!(p.read_char().unwrap(), Input::Value(b'i' as i64));
        assert_eq!(p.read_char().unwrap(), Input::Value(10));
        assert_eq!(p.read_char().unwrap(), Input::Value(b'x' as i64));
        assert_eq!(p.read_char().unwrap(), Input::Value(10));
        assert_eq!(p.read_char().unwrap(), Input::Closed);
    }

    #[test]
    fn test_read_char_empty_line_is_invalid() {
        let mut p = port("\nz\n");
        assert!(matches!(p.read_char().unwrap(), Input::Invalid(_)));
        assert_eq!(p.read_char().unwrap(), Input::Value(b'z' as i64));
    }

    #[test]
    fn test_read_int_skips_leftover_line_break() {
        let mut p = port("q\n7\n");
        assert_eq!(p.read_char().unwrap(), Input::Value(b'q' as i64));
        assert_eq!(p.read_int().unwrap(), Input::Value(7));
        assert_eq!(p.rejected(), 0);
    }

    #[test]
    fn test_read_int_takes_rest_of_pending_line() {
        let mut p = port("a 25\n");
        assert_eq!(p.read_char().unwrap(), Input::Value(b'a' as i64));
        assert_eq!(p.read_int().unwrap(), Input::Value(25));
        assert_eq!(p.read_char().unwrap(), Input::Closed);
    }

    #[test]
    fn test_reject_counts() {
        let mut p = port("");
        p.reject("nope").unwrap();
        p.reject("still nope").unwrap();
        assert_eq!(p.rejected(), 2);
        assert_eq!(p.output(), "");
    }
}
