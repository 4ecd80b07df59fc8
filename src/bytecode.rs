/// Bytecode opcodes for the hydro VM
///
/// Programs arrive as whitespace-separated instruction tokens. Each token
/// is a tag, optionally followed by `/` and one integer operand:
/// `c/3` pushes constant 3, `+` adds, `k/17` calls the subroutine at
/// pc 17. Tokens are decoded at fetch time, so a malformed token only
/// faults a run that actually reaches it.
use crate::fault::Fault;
use crate::value::Value;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Op {
    /// `c/N` - push constant pool entry N
    Constant(i64),

    // Arithmetic: pop B, pop A, push A op B
    Add,      // +
    Subtract, // -
    Multiply, // *
    Divide,   // ÷
    Modulo,   // %

    // Comparison: pop B, pop A, push 1 or 0
    GreaterThan, // >
    LessThan,    // <
    Equal,       // =

    // Logic over the truth value 1
    Or,  // |
    And, // &
    Not, // !

    /// `e` - pop a value, append its text plus newline to the output
    Echo,

    // Control flow; targets are absolute pc indexes
    JumpIf(i64), // j/N - pop condition, jump if it is 1
    Goto(i64),   // g/N
    Call(i64),   // k/N - snapshot locals, save return pc, jump
    Return,      // r - restore caller locals, or halt at depth 0

    // Local variable slots
    SetLocal(i64), // s/N - pop into slot N
    GetLocal(i64), // v/N - push slot N
}

impl Op {
    /// Decode one instruction token. Unknown tags and missing or
    /// non-integer operands are decode faults.
    pub fn decode(token: &str) -> Result<Op, Fault> {
        let mut parts = token.splitn(2, '/');
        let tag = parts.next().unwrap_or("");
        let operand = parts.next();

        let op = match tag {
            "c" => Op::Constant(Self::require_operand(token, operand)?),
            "+" => Op::Add,
            "-" => Op::Subtract,
            "*" => Op::Multiply,
            "÷" => Op::Divide,
            "%" => Op::Modulo,
            ">" => Op::GreaterThan,
            "<" => Op::LessThan,
            "=" => Op::Equal,
            "|" => Op::Or,
            "&" => Op::And,
            "!" => Op::Not,
            "e" => Op::Echo,
            "j" => Op::JumpIf(Self::require_operand(token, operand)?),
            "g" => Op::Goto(Self::require_operand(token, operand)?),
            "k" => Op::Call(Self::require_operand(token, operand)?),
            "s" => Op::SetLocal(Self::require_operand(token, operand)?),
            "v" => Op::GetLocal(Self::require_operand(token, operand)?),
            "r" => Op::Return,
            _ => return Err(Fault::UnknownOpcode(token.to_string())),
        };

        Ok(op)
    }

    fn require_operand(token: &str, operand: Option<&str>) -> Result<i64, Fault> {
        operand
            .and_then(|text| text.parse().ok())
            .ok_or_else(|| Fault::MalformedInstruction(token.to_string()))
    }
}

/// An immutable program: the raw instruction tokens, 0-indexed by pc.
#[derive(Debug, Clone)]
pub struct Program {
    tokens: Vec<String>,
}

impl Program {
    pub fn parse(text: &str) -> Program {
        Program {
            tokens: text.split_whitespace().map(String::from).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Decode the instruction at `pc`. Fetching outside the program,
    /// including after a jump to a negative target, is a decode fault.
    pub fn fetch(&self, pc: i64) -> Result<Op, Fault> {
        let token = usize::try_from(pc)
            .ok()
            .and_then(|index| self.tokens.get(index))
            .ok_or(Fault::FetchOutOfBounds {
                pc,
                len: self.tokens.len(),
            })?;
        Op::decode(token)
    }
}

/// The constant pool: an ordered, immutable sequence of values loaded
/// once before execution.
#[derive(Debug, Clone, Default)]
pub struct ConstantPool {
    values: Vec<Value>,
}

impl ConstantPool {
    pub fn parse(text: &str) -> ConstantPool {
        ConstantPool {
            values: text.split_whitespace().map(Value::parse).collect(),
        }
    }

    /// Look up a constant. An out-of-range index yields an empty token
    /// rather than a fault.
    pub fn get(&self, index: i64) -> Value {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.values.get(i))
            .cloned()
            .unwrap_or_else(|| Value::Text(String::new()))
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_plain_tags() {
        assert_eq!(Op::decode("+").unwrap(), Op::Add);
        assert_eq!(Op::decode("÷").unwrap(), Op::Divide);
        assert_eq!(Op::decode("e").unwrap(), Op::Echo);
        assert_eq!(Op::decode("r").unwrap(), Op::Return);
    }

    #[test]
    fn test_decode_operands() {
        assert_eq!(Op::decode("c/3").unwrap(), Op::Constant(3));
        assert_eq!(Op::decode("j/10").unwrap(), Op::JumpIf(10));
        assert_eq!(Op::decode("k/0").unwrap(), Op::Call(0));
        assert_eq!(Op::decode("v/-3").unwrap(), Op::GetLocal(-3));
    }

    #[test]
    fn test_decode_unknown_tag() {
        assert_eq!(
            Op::decode("q").unwrap_err(),
            Fault::UnknownOpcode("q".into())
        );
    }

    #[test]
    fn test_decode_missing_operand() {
        assert_eq!(
            Op::decode("c").unwrap_err(),
            Fault::MalformedInstruction("c".into())
        );
        assert_eq!(
            Op::decode("j/x").unwrap_err(),
            Fault::MalformedInstruction("j/x".into())
        );
    }

    #[test]
    fn test_fetch_bounds() {
        let program = Program::parse("c/0 e r");
        assert_eq!(program.len(), 3);
        assert_eq!(program.fetch(0).unwrap(), Op::Constant(0));
        assert_eq!(program.fetch(2).unwrap(), Op::Return);
        assert_eq!(
            program.fetch(3).unwrap_err(),
            Fault::FetchOutOfBounds { pc: 3, len: 3 }
        );
        assert_eq!(
            program.fetch(-1).unwrap_err(),
            Fault::FetchOutOfBounds { pc: -1, len: 3 }
        );
    }

    #[test]
    fn test_constant_pool() {
        let pool = ConstantPool::parse("2 3 hello");
        assert_eq!(pool.get(0), Value::Int(2));
        assert_eq!(pool.get(2), Value::Text("hello".into()));
        assert_eq!(pool.get(99), Value::Text(String::new()));
        assert_eq!(pool.get(-1), Value::Text(String::new()));
    }
}
