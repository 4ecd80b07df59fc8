/// Stacks and the local variable bank
///
/// The machine owns three independent LIFO stacks: the data stack
/// (operand values), the frame stack (saved local-bank snapshots), and
/// the return stack (saved program counters). The frame and return
/// stacks always hold exactly one entry per open call.
use crate::fault::Fault;
use crate::value::{Value, SENTINEL};

/// A LIFO stack with checked pop. The name shows up in underflow faults.
#[derive(Debug)]
pub struct Stack<T> {
    name: &'static str,
    items: Vec<T>,
}

#[allow(dead_code)]
impl<T> Stack<T> {
    pub fn new(name: &'static str) -> Stack<T> {
        Stack {
            name,
            items: Vec::new(),
        }
    }

    pub fn push(&mut self, item: T) {
        self.items.push(item);
    }

    pub fn pop(&mut self) -> Result<T, Fault> {
        self.items.pop().ok_or(Fault::StackUnderflow(self.name))
    }

    pub fn peek(&self) -> Option<&T> {
        self.items.last()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn into_items(self) -> Vec<T> {
        self.items
    }
}

/// A saved copy of every local slot, captured at a call site and
/// restored by the matching return.
pub type Frame = Vec<Value>;

/// The fixed bank of local variable slots for the active call. Calls
/// swap the whole bank regardless of how many slots the callee uses;
/// there is no per-function arity metadata.
#[derive(Debug)]
pub struct LocalBank {
    slots: Vec<Value>,
}

impl LocalBank {
    pub fn new(max_locals: usize) -> LocalBank {
        LocalBank {
            slots: vec![Value::Int(0); max_locals],
        }
    }

    /// Read a slot. Out-of-range indexes, negative included, yield the
    /// sentinel and never fault.
    pub fn get(&self, index: i64) -> Value {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.slots.get(i))
            .cloned()
            .unwrap_or(Value::Int(SENTINEL))
    }

    /// Write a slot. Out-of-range indexes are a no-op.
    pub fn set(&mut self, index: i64, value: Value) {
        if let Some(slot) = usize::try_from(index)
            .ok()
            .and_then(|i| self.slots.get_mut(i))
        {
            *slot = value;
        }
    }

    /// Capture all slots in index order.
    pub fn snapshot(&self) -> Frame {
        self.slots.clone()
    }

    /// Overwrite all slots from a prior snapshot. A length mismatch
    /// cannot come from `snapshot`, but it is checked anyway.
    pub fn restore(&mut self, frame: Frame) -> Result<(), Fault> {
        if frame.len() != self.slots.len() {
            return Err(Fault::SnapshotMismatch {
                got: frame.len(),
                want: self.slots.len(),
            });
        }
        self.slots = frame;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stack_lifo() {
        let mut stack = Stack::new("data");
        stack.push(Value::Int(1));
        stack.push(Value::Int(2));
        assert_eq!(stack.len(), 2);
        assert_eq!(stack.peek(), Some(&Value::Int(2)));
        assert_eq!(stack.pop().unwrap(), Value::Int(2));
        assert_eq!(stack.pop().unwrap(), Value::Int(1));
        assert!(stack.is_empty());
    }

    #[test]
    fn test_stack_underflow() {
        let mut stack: Stack<Value> = Stack::new("data");
        assert_eq!(stack.pop().unwrap_err(), Fault::StackUnderflow("data"));
    }

    #[test]
    fn test_bank_round_trip() {
        let mut bank = LocalBank::new(100);
        for i in 0..100 {
            bank.set(i, Value::Int(i * 10));
        }
        for i in 0..100 {
            assert_eq!(bank.get(i), Value::Int(i * 10));
        }
    }

    #[test]
    fn test_bank_defaults_to_zero() {
        let bank = LocalBank::new(4);
        assert_eq!(bank.get(0), Value::Int(0));
        assert_eq!(bank.get(3), Value::Int(0));
    }

    #[test]
    fn test_bank_out_of_range_read_is_sentinel() {
        let bank = LocalBank::new(100);
        assert_eq!(bank.get(100), Value::Int(SENTINEL));
        assert_eq!(bank.get(5000), Value::Int(SENTINEL));
        assert_eq!(bank.get(-1), Value::Int(SENTINEL));
    }

    #[test]
    fn test_bank_out_of_range_write_is_noop() {
        let mut bank = LocalBank::new(2);
        bank.set(2, Value::Int(9));
        bank.set(-4, Value::Int(9));
        assert_eq!(bank.get(0), Value::Int(0));
        assert_eq!(bank.get(1), Value::Int(0));
    }

    #[test]
    fn test_snapshot_restore() {
        let mut bank = LocalBank::new(3);
        bank.set(1, Value::Int(7));
        let frame = bank.snapshot();

        bank.set(1, Value::Int(99));
        bank.set(2, Value::Text("x".into()));
        bank.restore(frame).unwrap();

        assert_eq!(bank.get(1), Value::Int(7));
        assert_eq!(bank.get(2), Value::Int(0));
    }

    #[test]
    fn test_restore_length_mismatch() {
        let mut bank = LocalBank::new(3);
        let result = bank.restore(vec![Value::Int(0); 2]);
        assert_eq!(
            result.unwrap_err(),
            Fault::SnapshotMismatch { got: 2, want: 3 }
        );
    }
}
