use crate::vm::op::{Instruction, Opcode};
use crate::vm::stack::{Stack, StackError, DEFAULT_STACK_CAPACITY};
use log::{debug, trace};
use thiserror::Error;

/// Failure of a single evaluation. Every variant carries the address of the
/// instruction that faulted.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum VmError {
    #[error("Illegal instruction {opcode} at address {pc}")]
    IllegalInstruction { opcode: i64, pc: usize },
    #[error("Stack overflow at address {pc} (capacity {capacity})")]
    StackOverflow { pc: usize, capacity: usize },
    #[error("Stack underflow at address {pc}")]
    StackUnderflow { pc: usize },
    #[error("Missing operand for {opcode} at address {pc}")]
    TruncatedOperand { opcode: Opcode, pc: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    IllegalInstruction,
    StackOverflow,
    StackUnderflow,
    TruncatedOperand,
}

impl VmError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            VmError::IllegalInstruction { .. } => ErrorKind::IllegalInstruction,
            VmError::StackOverflow { .. } => ErrorKind::StackOverflow,
            VmError::StackUnderflow { .. } => ErrorKind::StackUnderflow,
            VmError::TruncatedOperand { .. } => ErrorKind::TruncatedOperand,
        }
    }

    pub fn pc(&self) -> usize {
        match self {
            VmError::IllegalInstruction { pc, .. }
            | VmError::StackOverflow { pc, .. }
            | VmError::StackUnderflow { pc }
            | VmError::TruncatedOperand { pc, .. } => *pc,
        }
    }

    fn at(err: StackError, pc: usize) -> Self {
        match err {
            StackError::Overflow { capacity } => VmError::StackOverflow { pc, capacity },
            StackError::Underflow => VmError::StackUnderflow { pc },
        }
    }
}

/// Evaluates a flat program on a fresh machine with the default capacity.
pub fn evaluate(program: &[i64]) -> Result<i64, VmError> {
    VirtualMachine::new().evaluate(program)
}

/// Stack machine over a single combined evaluation/environment stack.
///
/// The stack is cleared at the start of every run, so one machine can be
/// reused for many programs but never shares state between them.
#[derive(Debug, Clone)]
pub struct VirtualMachine {
    stack: Stack,
}

impl Default for VirtualMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl VirtualMachine {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_STACK_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            stack: Stack::with_capacity(capacity),
        }
    }

    pub fn capacity(&self) -> usize {
        self.stack.capacity()
    }

    #[cfg(test)]
    pub fn stack_len(&self) -> usize {
        self.stack.len()
    }

    /// Runs a flat program, decoding one instruction at a time.
    ///
    /// # Arguments
    /// * `program` - opcodes interleaved with their inline operands
    ///
    /// # Returns
    /// * `Ok(i64)` - the value left at the top of the stack
    /// * `Err(VmError)` - the first fault, positioned at the address of the faulting opcode
    pub fn evaluate(&mut self, program: &[i64]) -> Result<i64, VmError> {
        self.stack.clear();
        debug!("Evaluating {} words", program.len());
        let mut pc = 0;

        while pc < program.len() {
            let (instruction, width) = Instruction::decode_at(program, pc)?;
            self.step(instruction, pc)?;
            pc += width;
        }
        self.finish(program.len())
    }

    /// Runs an already decoded program. Error positions are instruction indices.
    pub fn execute(&mut self, program: &[Instruction]) -> Result<i64, VmError> {
        self.stack.clear();
        debug!("Executing {} instructions", program.len());

        for (pc, instruction) in program.iter().enumerate() {
            self.step(*instruction, pc)?;
        }
        self.finish(program.len())
    }

    #[inline]
    fn step(&mut self, instruction: Instruction, pc: usize) -> Result<(), VmError> {
        trace!("{:>4}  {}  {:?}", pc, instruction, self.stack.as_slice());
        let stack = &mut self.stack;
        let result = match instruction {
            Instruction::PushConst(value) => stack.push(value),
            Instruction::LoadVar(offset) => {
                let offset = usize::try_from(offset).map_err(|_| VmError::StackUnderflow { pc })?;
                stack.peek(offset).and_then(|value| stack.push(value))
            }
            Instruction::Add => stack.fold_top_two(|a, b| a.wrapping_add(b)),
            Instruction::Sub => stack.fold_top_two(|a, b| a.wrapping_sub(b)),
            Instruction::Mul => stack.fold_top_two(|a, b| a.wrapping_mul(b)),
            Instruction::Pop => stack.pop().map(|_| ()),
            Instruction::Swap => stack.swap_top_two(),
        };
        result.map_err(|e| VmError::at(e, pc))
    }

    fn finish(&self, end: usize) -> Result<i64, VmError> {
        let value = self
            .stack
            .peek(0)
            .map_err(|e| VmError::at(e, end))?;
        debug!("Result {} (residual depth {})", value, self.stack.len());
        Ok(value)
    }
}
