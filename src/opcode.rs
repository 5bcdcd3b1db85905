use crate::machine::Direction;

/// A decoded Befunge-93 instruction.
///
/// Every cell value maps to exactly one `Op`; anything outside the
/// instruction set (including padding spaces and codes that are not
/// characters at all) decodes to `Nop`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Op {
    /// `0`-`9`: push the digit.
    Digit(u8),
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    /// `!`
    Not,
    /// `` ` ``
    Greater,
    /// `>` `<` `^` `v`
    Go(Direction),
    /// `?`
    Random,
    /// `_`
    HorizontalIf,
    /// `|`
    VerticalIf,
    /// `"`
    StringMode,
    /// `:`
    Dup,
    /// `\`
    Swap,
    /// `$`
    Discard,
    /// `.`
    PrintInt,
    /// `,`
    PrintChar,
    /// `#`
    Bridge,
    /// `g`
    Get,
    /// `p`
    Put,
    /// `&`
    ReadInt,
    /// `~`
    ReadChar,
    /// `@`
    Halt,
    Nop,
}

const QUOTE: i64 = b'"' as i64;

impl Op {
    /// Decode a cell value.
    pub fn decode(code: i64) -> Op {
        let Ok(byte) = u8::try_from(code) else {
            return Op::Nop;
        };
        match byte {
            b'0'..=b'9' => Op::Digit(byte - b'0'),
            b'+' => Op::Add,
            b'-' => Op::Sub,
            b'*' => Op::Mul,
            b'/' => Op::Div,
            b'%' => Op::Mod,
            b'!' => Op::Not,
            b'`' => Op::Greater,
            b'>' => Op::Go(Direction::East),
            b'<' => Op::Go(Direction::West),
            b'^' => Op::Go(Direction::North),
            b'v' => Op::Go(Direction::South),
            b'?' => Op::Random,
            b'_' => Op::HorizontalIf,
            b'|' => Op::VerticalIf,
            b'"' => Op::StringMode,
            b':' => Op::Dup,
            b'\\' => Op::Swap,
            b'$' => Op::Discard,
            b'.' => Op::PrintInt,
            b',' => Op::PrintChar,
            b'#' => Op::Bridge,
            b'g' => Op::Get,
            b'p' => Op::Put,
            b'&' => Op::ReadInt,
            b'~' => Op::ReadChar,
            b'@' => Op::Halt,
            _ => Op::Nop,
        }
    }

    /// Short human-readable name, used by the step trace.
    pub fn mnemonic(self) -> &'static str {
        match self {
            Op::Digit(_) => "PUSH",
            Op::Add => "ADD",
            Op::Sub => "SUB",
            Op::Mul => "MUL",
            Op::Div => "DIV",
            Op::Mod => "MOD",
            Op::Not => "NOT",
            Op::Greater => "GT",
            Op::Go(Direction::North) => "NORTH",
            Op::Go(Direction::East) => "EAST",
            Op::Go(Direction::South) => "SOUTH",
            Op::Go(Direction::West) => "WEST",
            Op::Random => "RAND",
            Op::HorizontalIf => "HIF",
            Op::VerticalIf => "VIF",
            Op::StringMode => "STR",
            Op::Dup => "DUP",
            Op::Swap => "SWAP",
            Op::Discard => "POP",
            Op::PrintInt => "OUTN",
            Op::PrintChar => "OUTC",
            Op::Bridge => "SKIP",
            Op::Get => "GET",
            Op::Put => "PUT",
            Op::ReadInt => "INN",
            Op::ReadChar => "INC",
            Op::Halt => "HALT",
            Op::Nop => "NOP",
        }
    }
}

/// Returns true if the cell value closes string mode.
#[inline(always)]
pub fn is_quote(code: i64) -> bool {
    code == QUOTE
}
