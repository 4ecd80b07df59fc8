/// Fetch-decode-execute loop for hydro bytecode
///
/// The `Vm` owns every piece of run state: the three stacks, the local
/// bank, the program counter, the cycle counter, and the output buffer.
/// A run is one synchronous loop from pc 0 to a terminal state; nothing
/// is shared and nothing suspends.
use crate::bytecode::{ConstantPool, Op, Program};
use crate::fault::Fault;
use crate::machine::{Frame, LocalBank, Stack};
use crate::value::Value;
use tracing::{debug, trace};

pub const DEFAULT_MAX_LOCALS: usize = 100;
pub const DEFAULT_CYCLE_LIMIT: u64 = 12_345_678;

/// Tunable execution limits.
///
/// The cycle limit is a safety valve against runaway programs, not a
/// scheduler: any real program returns at depth 0 long before it.
#[derive(Debug, Clone, Copy)]
pub struct VmConfig {
    /// Number of local variable slots per frame.
    pub max_locals: usize,
    /// Hard ceiling on executed cycles.
    pub cycle_limit: u64,
}

impl Default for VmConfig {
    fn default() -> VmConfig {
        VmConfig {
            max_locals: DEFAULT_MAX_LOCALS,
            cycle_limit: DEFAULT_CYCLE_LIMIT,
        }
    }
}

/// Why the run stopped. `Running` never escapes the loop, so it has no
/// variant here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// `return` executed at call depth 0.
    HaltedByReturn,
    /// The cycle ceiling was reached before the program returned. The
    /// computation is not necessarily complete.
    HaltedByCycleLimit,
    /// A fatal fault; no further cycles execute.
    Faulted(Fault),
}

/// Final machine state handed back to the caller.
#[derive(Debug)]
pub struct Report {
    pub outcome: Outcome,
    /// Echoed lines, in order.
    pub output: Vec<String>,
    /// Whatever was left on the data stack, bottom first.
    pub stack: Vec<Value>,
    pub cycles: u64,
    pub pc: i64,
}

impl Report {
    pub fn stack_depth(&self) -> usize {
        self.stack.len()
    }
}

/// Where the program counter goes after an instruction.
enum Flow {
    Next,
    Jump(i64),
    Halt,
}

pub struct Vm {
    constants: ConstantPool,
    program: Program,
    config: VmConfig,
    data: Stack<Value>,
    frames: Stack<Frame>,
    returns: Stack<i64>,
    locals: LocalBank,
    output: Vec<String>,
    pc: i64,
    cycle: u64,
}

impl Vm {
    pub fn new(constants: ConstantPool, program: Program) -> Vm {
        Vm::with_config(constants, program, VmConfig::default())
    }

    pub fn with_config(constants: ConstantPool, program: Program, config: VmConfig) -> Vm {
        Vm {
            constants,
            program,
            config,
            data: Stack::new("data"),
            frames: Stack::new("frame"),
            returns: Stack::new("return"),
            locals: LocalBank::new(config.max_locals),
            output: Vec::new(),
            pc: 0,
            cycle: 0,
        }
    }

    /// Run to a terminal state, consuming the machine.
    ///
    /// The cycle counter increments at the top of every iteration, so
    /// the halting `return` (or a faulting instruction) counts as a
    /// cycle of its own.
    pub fn run(mut self) -> Report {
        debug!(
            instructions = self.program.len(),
            cycle_limit = self.config.cycle_limit,
            "starting run"
        );

        let outcome = loop {
            if self.cycle >= self.config.cycle_limit {
                debug!(cycles = self.cycle, "cycle ceiling reached");
                break Outcome::HaltedByCycleLimit;
            }
            self.cycle += 1;

            match self.step() {
                Ok(Flow::Next) => self.pc += 1,
                Ok(Flow::Jump(target)) => self.pc = target,
                Ok(Flow::Halt) => {
                    debug!(cycles = self.cycle, pc = self.pc, "returned at depth 0");
                    break Outcome::HaltedByReturn;
                }
                Err(fault) => {
                    debug!(%fault, pc = self.pc, cycles = self.cycle, "faulted");
                    break Outcome::Faulted(fault);
                }
            }
        };

        Report {
            outcome,
            output: self.output,
            stack: self.data.into_items(),
            cycles: self.cycle,
            pc: self.pc,
        }
    }

    fn step(&mut self) -> Result<Flow, Fault> {
        let op = self.program.fetch(self.pc)?;
        trace!(pc = self.pc, cycle = self.cycle, op = ?op, "execute");
        self.exec(op)
    }

    fn exec(&mut self, op: Op) -> Result<Flow, Fault> {
        match op {
            Op::Constant(index) => {
                let value = self.constants.get(index);
                self.data.push(value);
            }

            Op::Add => self.binary_int(|a, b| Ok(a.wrapping_add(b)))?,
            Op::Subtract => self.binary_int(|a, b| Ok(a.wrapping_sub(b)))?,
            Op::Multiply => self.binary_int(|a, b| Ok(a.wrapping_mul(b)))?,
            Op::Divide => self.binary_int(|a, b| {
                if b == 0 {
                    Err(Fault::DivisionByZero)
                } else {
                    Ok(a.wrapping_div(b))
                }
            })?,
            Op::Modulo => self.binary_int(|a, b| {
                if b == 0 {
                    Err(Fault::DivisionByZero)
                } else {
                    Ok(a.wrapping_rem(b))
                }
            })?,

            Op::GreaterThan => self.compare(|a, b| a > b)?,
            Op::LessThan => self.compare(|a, b| a < b)?,
            Op::Equal => {
                let b = self.data.pop()?;
                let a = self.data.pop()?;
                self.data.push(Value::flag(a.same_token(&b)));
            }

            Op::Or => {
                let b = self.data.pop()?;
                let a = self.data.pop()?;
                self.data.push(Value::flag(a.is_true() || b.is_true()));
            }
            Op::And => {
                let b = self.data.pop()?;
                let a = self.data.pop()?;
                self.data.push(Value::flag(a.is_true() && b.is_true()));
            }
            Op::Not => {
                let a = self.data.pop()?;
                self.data.push(Value::flag(!a.is_true()));
            }

            Op::Echo => {
                let value = self.data.pop()?;
                self.output.push(value.to_string());
            }

            Op::JumpIf(target) => {
                let condition = self.data.pop()?;
                if condition.is_true() {
                    return Ok(Flow::Jump(target));
                }
            }
            Op::Goto(target) => return Ok(Flow::Jump(target)),

            Op::Call(target) => {
                self.frames.push(self.locals.snapshot());
                self.returns.push(self.pc + 1);
                return Ok(Flow::Jump(target));
            }
            Op::Return => {
                if self.returns.is_empty() {
                    return Ok(Flow::Halt);
                }
                let frame = self.frames.pop()?;
                self.locals.restore(frame)?;
                let target = self.returns.pop()?;
                return Ok(Flow::Jump(target));
            }

            Op::SetLocal(index) => {
                let value = self.data.pop()?;
                self.locals.set(index, value);
            }
            Op::GetLocal(index) => {
                let value = self.locals.get(index);
                self.data.push(value);
            }
        }

        Ok(Flow::Next)
    }

    /// Pop B, pop A, push A op B as an integer.
    fn binary_int(&mut self, apply: fn(i64, i64) -> Result<i64, Fault>) -> Result<(), Fault> {
        let b = self.data.pop()?.as_int();
        let a = self.data.pop()?.as_int();
        self.data.push(Value::Int(apply(a, b)?));
        Ok(())
    }

    /// Pop B, pop A, push 1 if A relates to B else 0.
    fn compare(&mut self, relation: fn(i64, i64) -> bool) -> Result<(), Fault> {
        let b = self.data.pop()?.as_int();
        let a = self.data.pop()?.as_int();
        self.data.push(Value::flag(relation(a, b)));
        Ok(())
    }
}
