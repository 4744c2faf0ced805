//! Reference programs: `let` expressions compiled by hand into stack code.
//!
//! A `let` pushes the bound value, the body reads it with `VAR` at an offset
//! that grows with every value pushed above it, and `SWAP; POP` drops the
//! binding once the body's value sits on top.

use crate::vm::op::{ADD, LOAD_VAR, MUL, POP, PUSH_CONST, SWAP};

/// A named flat program.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sample {
    pub name: &'static str,
    pub code: &'static [i64],
    pub expected: i64,
}

/// `let z = 17 in z + z`
pub const LET_DOUBLE: Sample = Sample {
    name: "let z = 17 in z + z",
    code: &[PUSH_CONST, 17, LOAD_VAR, 0, LOAD_VAR, 1, ADD, SWAP, POP],
    expected: 34,
};

/// `let x = 17 in (let y = 22 in 100 * y) + x`
pub const NESTED_LET: Sample = Sample {
    name: "let x = 17 in (let y = 22 in 100 * y) + x",
    code: &[
        PUSH_CONST, 17, PUSH_CONST, 22, PUSH_CONST, 100, LOAD_VAR, 1, MUL, SWAP, POP, LOAD_VAR, 1,
        ADD, SWAP, POP,
    ],
    expected: 2217,
};

pub const ALL: [Sample; 2] = [LET_DOUBLE, NESTED_LET];
