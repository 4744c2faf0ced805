use crate::vm::engine::VmError;
use std::fmt;

/// Flat codes of the instruction set, as they appear in an encoded program.
pub const PUSH_CONST: i64 = 0;
pub const LOAD_VAR: i64 = 1;
pub const ADD: i64 = 2;
pub const SUB: i64 = 3;
pub const MUL: i64 = 4;
pub const POP: i64 = 5;
pub const SWAP: i64 = 6;

/// Instruction tag without its operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opcode {
    PushConst,
    LoadVar,
    Add,
    Sub,
    Mul,
    Pop,
    Swap,
}

impl Opcode {
    pub const ALL: [Opcode; 7] = [
        Opcode::PushConst,
        Opcode::LoadVar,
        Opcode::Add,
        Opcode::Sub,
        Opcode::Mul,
        Opcode::Pop,
        Opcode::Swap,
    ];

    /// Maps a flat code back to its opcode, `None` outside the closed set.
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            PUSH_CONST => Some(Opcode::PushConst),
            LOAD_VAR => Some(Opcode::LoadVar),
            ADD => Some(Opcode::Add),
            SUB => Some(Opcode::Sub),
            MUL => Some(Opcode::Mul),
            POP => Some(Opcode::Pop),
            SWAP => Some(Opcode::Swap),
            _ => None,
        }
    }

    pub fn code(self) -> i64 {
        match self {
            Opcode::PushConst => PUSH_CONST,
            Opcode::LoadVar => LOAD_VAR,
            Opcode::Add => ADD,
            Opcode::Sub => SUB,
            Opcode::Mul => MUL,
            Opcode::Pop => POP,
            Opcode::Swap => SWAP,
        }
    }

    /// Number of inline operands following the opcode.
    pub fn arity(self) -> usize {
        match self {
            Opcode::PushConst | Opcode::LoadVar => 1,
            _ => 0,
        }
    }

    /// Net change in stack height.
    pub fn stack_effect(self) -> isize {
        match self {
            Opcode::PushConst | Opcode::LoadVar => 1,
            Opcode::Add | Opcode::Sub | Opcode::Mul | Opcode::Pop => -1,
            Opcode::Swap => 0,
        }
    }

    /// Elements that must be present before the instruction runs.
    pub fn required_depth(self) -> usize {
        match self {
            Opcode::PushConst | Opcode::LoadVar => 0,
            Opcode::Pop => 1,
            Opcode::Add | Opcode::Sub | Opcode::Mul | Opcode::Swap => 2,
        }
    }

    pub fn mnemonic(self) -> &'static str {
        match self {
            Opcode::PushConst => "CST",
            Opcode::LoadVar => "VAR",
            Opcode::Add => "ADD",
            Opcode::Sub => "SUB",
            Opcode::Mul => "MUL",
            Opcode::Pop => "POP",
            Opcode::Swap => "SWAP",
        }
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}

/// A decoded instruction with its operand folded in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    PushConst(i64),
    LoadVar(u32),
    Add,
    Sub,
    Mul,
    Pop,
    Swap,
}

impl Instruction {
    pub fn opcode(&self) -> Opcode {
        match self {
            Instruction::PushConst(_) => Opcode::PushConst,
            Instruction::LoadVar(_) => Opcode::LoadVar,
            Instruction::Add => Opcode::Add,
            Instruction::Sub => Opcode::Sub,
            Instruction::Mul => Opcode::Mul,
            Instruction::Pop => Opcode::Pop,
            Instruction::Swap => Opcode::Swap,
        }
    }

    /// Decodes the instruction starting at `pc` in a flat program.
    ///
    /// # Returns
    /// * `Ok((Instruction, usize))` - the instruction and the number of integers it occupies.
    /// * `Err(VmError)` - `IllegalInstruction` for an unknown code, `TruncatedOperand` when the
    ///   operand is cut off by the end of the program, `StackUnderflow` for a `LOAD_VAR` offset
    ///   that can never address a slot (negative or wider than `u32`).
    ///
    /// # Panics
    /// If `pc` is not a valid index into `code`.
    pub fn decode_at(code: &[i64], pc: usize) -> Result<(Instruction, usize), VmError> {
        let raw = code[pc];
        let opcode = Opcode::from_code(raw).ok_or(VmError::IllegalInstruction { opcode: raw, pc })?;

        let instruction = match opcode {
            Opcode::PushConst | Opcode::LoadVar => {
                let operand = *code
                    .get(pc + 1)
                    .ok_or(VmError::TruncatedOperand { opcode, pc })?;
                if opcode == Opcode::PushConst {
                    Instruction::PushConst(operand)
                } else {
                    let offset =
                        u32::try_from(operand).map_err(|_| VmError::StackUnderflow { pc })?;
                    Instruction::LoadVar(offset)
                }
            }
            Opcode::Add => Instruction::Add,
            Opcode::Sub => Instruction::Sub,
            Opcode::Mul => Instruction::Mul,
            Opcode::Pop => Instruction::Pop,
            Opcode::Swap => Instruction::Swap,
        };
        Ok((instruction, 1 + opcode.arity()))
    }

    /// Appends the flat form of this instruction to `out`.
    pub fn encode_into(&self, out: &mut Vec<i64>) {
        out.push(self.opcode().code());
        match self {
            Instruction::PushConst(value) => out.push(*value),
            Instruction::LoadVar(offset) => out.push(i64::from(*offset)),
            _ => {}
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instruction::PushConst(value) => write!(f, "{} {}", self.opcode(), value),
            Instruction::LoadVar(offset) => write!(f, "{} {}", self.opcode(), offset),
            other => write!(f, "{}", other.opcode()),
        }
    }
}

/// Decodes a whole flat program up front.
pub fn decode(code: &[i64]) -> Result<Vec<Instruction>, VmError> {
    let mut instructions = Vec::new();
    let mut pc = 0;
    while pc < code.len() {
        let (instruction, width) = Instruction::decode_at(code, pc)?;
        instructions.push(instruction);
        pc += width;
    }
    Ok(instructions)
}

pub fn encode(instructions: &[Instruction]) -> Vec<i64> {
    let mut code = Vec::with_capacity(instructions.len() * 2);
    for instruction in instructions {
        instruction.encode_into(&mut code);
    }
    code
}

/// Renders a flat program one instruction per line, each prefixed with its address.
/// Stops at the first malformed instruction and reports it.
pub fn listing(code: &[i64]) -> Result<String, VmError> {
    let mut out = String::new();
    let mut pc = 0;
    while pc < code.len() {
        let (instruction, width) = Instruction::decode_at(code, pc)?;
        out.push_str(&format!("{:>4}  {}\n", pc, instruction));
        pc += width;
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opcode_codes_round_trip() {
        for opcode in Opcode::ALL {
            assert_eq!(Opcode::from_code(opcode.code()), Some(opcode));
        }
        assert_eq!(Opcode::from_code(7), None);
        assert_eq!(Opcode::from_code(-1), None);
    }

    #[test]
    fn test_arity_and_stack_effect() {
        assert_eq!(Opcode::PushConst.arity(), 1);
        assert_eq!(Opcode::LoadVar.arity(), 1);
        assert_eq!(Opcode::Swap.arity(), 0);
        assert_eq!(Opcode::PushConst.stack_effect(), 1);
        assert_eq!(Opcode::Mul.stack_effect(), -1);
        assert_eq!(Opcode::Pop.stack_effect(), -1);
        assert_eq!(Opcode::Swap.stack_effect(), 0);
        assert_eq!(Opcode::Pop.required_depth(), 1);
        assert_eq!(Opcode::Sub.required_depth(), 2);
    }

    #[test]
    fn test_decode_reference_program() {
        let code = [PUSH_CONST, 17, LOAD_VAR, 0, LOAD_VAR, 1, ADD, SWAP, POP];
        let decoded = decode(&code).unwrap();
        assert_eq!(
            decoded,
            vec![
                Instruction::PushConst(17),
                Instruction::LoadVar(0),
                Instruction::LoadVar(1),
                Instruction::Add,
                Instruction::Swap,
                Instruction::Pop,
            ]
        );
        assert_eq!(encode(&decoded), code.to_vec());
    }

    #[test]
    fn test_decode_illegal_instruction_position() {
        let code = [PUSH_CONST, 1, 999, ADD];
        assert_eq!(
            decode(&code),
            Err(VmError::IllegalInstruction { opcode: 999, pc: 2 })
        );
    }

    #[test]
    fn test_decode_truncated_operand() {
        assert_eq!(
            decode(&[PUSH_CONST, 4, LOAD_VAR]),
            Err(VmError::TruncatedOperand {
                opcode: Opcode::LoadVar,
                pc: 2
            })
        );
        assert_eq!(
            decode(&[PUSH_CONST]),
            Err(VmError::TruncatedOperand {
                opcode: Opcode::PushConst,
                pc: 0
            })
        );
    }

    #[test]
    fn test_negative_offset_never_addresses_a_slot() {
        assert_eq!(
            decode(&[PUSH_CONST, 1, LOAD_VAR, -1]),
            Err(VmError::StackUnderflow { pc: 2 })
        );
    }

    #[test]
    fn test_operand_looks_like_opcode() {
        // Operands are never decoded as opcodes.
        let code = [PUSH_CONST, SWAP, PUSH_CONST, 999];
        assert_eq!(
            decode(&code).unwrap(),
            vec![Instruction::PushConst(SWAP), Instruction::PushConst(999)]
        );
    }

    #[test]
    fn test_listing() {
        let text = listing(&[PUSH_CONST, 17, LOAD_VAR, 0, ADD]).unwrap();
        assert_eq!(text, "   0  CST 17\n   2  VAR 0\n   4  ADD\n");
        assert_eq!(Instruction::Swap.to_string(), "SWAP");
    }
}
