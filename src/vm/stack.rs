use thiserror::Error;

/// Capacity of the reference machine's combined evaluation/environment stack.
pub const DEFAULT_STACK_CAPACITY: usize = 1000;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StackError {
    #[error("stack overflow (capacity {capacity})")]
    Overflow { capacity: usize },
    #[error("stack underflow")]
    Underflow,
}

/// Bounded stack of machine integers. Every access is checked against the
/// current depth and the capacity ceiling.
#[derive(Debug, Clone)]
pub struct Stack {
    slots: Vec<i64>,
    capacity: usize,
}

impl Default for Stack {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_STACK_CAPACITY)
    }
}

impl Stack {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Index of the topmost element, `None` when empty.
    pub fn stack_pointer(&self) -> Option<usize> {
        self.slots.len().checked_sub(1)
    }

    pub fn clear(&mut self) {
        self.slots.clear();
    }

    #[inline]
    pub fn push(&mut self, value: i64) -> Result<(), StackError> {
        if self.slots.len() < self.capacity {
            self.slots.push(value);
            Ok(())
        } else {
            Err(StackError::Overflow {
                capacity: self.capacity,
            })
        }
    }

    #[inline]
    pub fn pop(&mut self) -> Result<i64, StackError> {
        self.slots.pop().ok_or(StackError::Underflow)
    }

    /// Reads the value `offset` slots below the top; `peek(0)` is the top itself.
    #[inline]
    pub fn peek(&self, offset: usize) -> Result<i64, StackError> {
        self.stack_pointer()
            .and_then(|sp| sp.checked_sub(offset))
            .map(|index| self.slots[index])
            .ok_or(StackError::Underflow)
    }

    #[inline]
    pub fn swap_top_two(&mut self) -> Result<(), StackError> {
        let len = self.slots.len();
        if len < 2 {
            return Err(StackError::Underflow);
        }
        self.slots.swap(len - 1, len - 2);
        Ok(())
    }

    /// Replaces the two topmost values `[.., second, top]` with `op(second, top)`.
    #[inline]
    pub fn fold_top_two<F>(&mut self, op: F) -> Result<(), StackError>
    where
        F: Fn(i64, i64) -> i64,
    {
        if self.slots.len() < 2 {
            return Err(StackError::Underflow);
        }
        let top = self.pop()?;
        let second = self.pop()?;
        self.push(op(second, top))
    }

    pub fn as_slice(&self) -> &[i64] {
        &self.slots
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_until_full() {
        let mut stack = Stack::with_capacity(2);
        stack.push(1).unwrap();
        stack.push(2).unwrap();
        assert_eq!(stack.push(3), Err(StackError::Overflow { capacity: 2 }));
        assert_eq!(stack.as_slice(), &[1, 2]);
    }

    #[test]
    fn test_zero_capacity_rejects_first_push() {
        let mut stack = Stack::with_capacity(0);
        assert_eq!(stack.push(1), Err(StackError::Overflow { capacity: 0 }));
    }

    #[test]
    fn test_pop_empty() {
        let mut stack = Stack::default();
        assert_eq!(stack.capacity(), DEFAULT_STACK_CAPACITY);
        assert_eq!(stack.stack_pointer(), None);
        assert_eq!(stack.pop(), Err(StackError::Underflow));
    }

    #[test]
    fn test_peek_offsets() {
        let mut stack = Stack::default();
        for v in [10, 20, 30] {
            stack.push(v).unwrap();
        }
        assert_eq!(stack.stack_pointer(), Some(2));
        assert_eq!(stack.peek(0), Ok(30));
        assert_eq!(stack.peek(2), Ok(10));
        assert_eq!(stack.peek(3), Err(StackError::Underflow));
        assert_eq!(Stack::default().peek(0), Err(StackError::Underflow));
    }

    #[test]
    fn test_swap_twice_restores_order() {
        let mut stack = Stack::default();
        stack.push(1).unwrap();
        stack.push(2).unwrap();
        stack.push(3).unwrap();
        stack.swap_top_two().unwrap();
        assert_eq!(stack.as_slice(), &[1, 3, 2]);
        stack.swap_top_two().unwrap();
        assert_eq!(stack.as_slice(), &[1, 2, 3]);
    }

    #[test]
    fn test_swap_and_fold_need_two() {
        let mut stack = Stack::default();
        stack.push(1).unwrap();
        assert_eq!(stack.swap_top_two(), Err(StackError::Underflow));
        assert_eq!(stack.fold_top_two(|a, b| a + b), Err(StackError::Underflow));
        // A failed fold leaves the stack untouched
        assert_eq!(stack.as_slice(), &[1]);
    }

    #[test]
    fn test_fold_operand_order() {
        let mut stack = Stack::default();
        stack.push(10).unwrap();
        stack.push(3).unwrap();
        stack.fold_top_two(|second, top| second - top).unwrap();
        assert_eq!(stack.as_slice(), &[7]);
    }
}
