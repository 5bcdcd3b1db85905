pub mod error;
pub mod grid;
pub mod opcode;
pub mod machine;
pub mod port;
pub mod trace;
