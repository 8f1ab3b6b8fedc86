//! One activation record of a method call.

use crate::method::Method;
use crate::value::Value;
use std::cell::RefCell;
use std::rc::Rc;

/// Where a frame's return values go once it completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReturnContinuation {
    /// Write onto the parent frame's operand stack (an inner call).
    Caller,
    /// Write onto the engine's result collector (the entry call).
    Result,
}

#[derive(Debug, Clone)]
pub struct Frame {
    pub method: Rc<Method>,
    pub pc: usize,
    pub locals: Vec<Value>,
    pub operand_stack: Vec<Value>,
    pub return_continuation: ReturnContinuation,
    /// The field storage of the contract this frame executes inside, if
    /// any. `CallLocal` inherits the caller's, so nested calls within one
    /// contract method share the same backing `Vec`; `CallExternal` swaps
    /// in the callee contract's own fields.
    pub contract_fields: Option<Rc<RefCell<Vec<Value>>>>,
    complete: bool,
}

impl Frame {
    pub fn new(method: Rc<Method>, args: Vec<Value>, return_continuation: ReturnContinuation) -> Self {
        debug_assert_eq!(args.len(), method.args_length);
        let mut locals = args;
        for ty in method.local_types.iter().skip(locals.len()) {
            locals.push(ty.zero_value());
        }
        Self {
            method,
            pc: 0,
            locals,
            operand_stack: Vec::new(),
            return_continuation,
            contract_fields: None,
            complete: false,
        }
    }

    pub fn with_contract_fields(mut self, fields: Option<Rc<RefCell<Vec<Value>>>>) -> Self {
        self.contract_fields = fields;
        self
    }

    pub fn is_complete(&self) -> bool {
        self.complete || self.pc >= self.method.instrs.len()
    }

    pub fn mark_complete(&mut self) {
        self.complete = true;
    }

    pub fn current_instruction(&self) -> Option<&crate::instruction::Instruction> {
        self.method.instrs.get(self.pc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instruction::Instruction;
    use alephium_core::U256;

    fn method() -> Rc<Method> {
        Rc::new(Method {
            is_public: true,
            is_payable: false,
            args_length: 1,
            locals_length: 2,
            return_length: 1,
            local_types: vec![crate::value::Type::U256, crate::value::Type::Bool],
            instrs: vec![Instruction::Return],
        })
    }

    #[test]
    fn new_frame_zero_fills_remaining_locals() {
        let frame = Frame::new(
            method(),
            vec![Value::U256(U256::from_u64(7))],
            ReturnContinuation::Caller,
        );
        assert_eq!(frame.locals.len(), 2);
        assert_eq!(frame.locals[0], Value::U256(U256::from_u64(7)));
        assert_eq!(frame.locals[1], Value::Bool(false));
    }

    #[test]
    fn frame_completes_at_end_of_instrs_or_explicit_return() {
        let mut frame = Frame::new(method(), vec![Value::Bool(false)], ReturnContinuation::Caller);
        assert!(!frame.is_complete());
        frame.pc = 1;
        assert!(frame.is_complete());

        let mut frame2 = Frame::new(method(), vec![Value::Bool(false)], ReturnContinuation::Caller);
        frame2.mark_complete();
        assert!(frame2.is_complete());
    }
}
