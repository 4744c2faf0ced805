pub mod engine;
pub mod op;
pub mod stack;

pub use engine::{evaluate, ErrorKind, VirtualMachine, VmError};
pub use op::{decode, encode, listing, Instruction, Opcode};
