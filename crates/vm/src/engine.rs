//! The execution engine: the frame-stack driver loop described by
//! `push(initialFrame); while frameStack not empty { ... }`.

use crate::context::Capability;
use crate::error::{ExecutionError, VmError, VmResult};
use crate::frame::{Frame, ReturnContinuation};
use crate::instruction::Instruction;
use crate::method::Method;
use crate::stack::Stack;
use crate::value::{ContractId, Value};
use alephium_config::FRAME_STACK_CAPACITY;
use std::rc::Rc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Running,
    Halt,
    Fault,
}

/// Drives one script or contract-method call to completion against a
/// [`Capability`]. One engine instance is used for exactly one execution.
pub struct ExecutionEngine {
    frames: Stack<Frame>,
    state: EngineState,
    result: Vec<Value>,
    /// The method table of the script/contract currently executing.
    /// `CallLocal(i)` indexes into this; it is set once at `run()` and is
    /// immutable for the engine's lifetime (one engine per execution).
    methods: Rc<Vec<Rc<Method>>>,
    /// Index into the transaction's signature array, advanced by each
    /// `VerifyTxSignature`.
    sig_cursor: usize,
}

impl ExecutionEngine {
    pub fn new() -> Self {
        Self {
            frames: Stack::with_capacity(FRAME_STACK_CAPACITY),
            state: EngineState::Running,
            result: Vec::new(),
            methods: Rc::new(Vec::new()),
            sig_cursor: 0,
        }
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    /// Runs method `entry_index` of `methods` with `args` to completion,
    /// returning its declared return values on success. `CallLocal`
    /// instructions resolve against the same `methods` table.
    pub fn run<C: Capability>(
        &mut self,
        methods: Rc<Vec<Rc<Method>>>,
        entry_index: usize,
        args: Vec<Value>,
        ctx: &mut C,
    ) -> VmResult<Vec<Value>> {
        let _span = tracing::debug_span!("execute_method", entry_index).entered();
        let entry = methods
            .get(entry_index)
            .cloned()
            .ok_or(ExecutionError::InvalidPc(entry_index as i64))?;
        self.methods = methods;
        let frame = Frame::new(entry, args, ReturnContinuation::Result);
        if let Err(e) = self.frames.push(frame).map_err(VmError::Execution) {
            self.state = EngineState::Fault;
            return Err(e);
        }

        loop {
            if self.frames.is_empty() {
                break;
            }
            let step_result = if self.frames.peek().map(|f| f.is_complete()).unwrap_or(true) {
                self.frames
                    .pop()
                    .map_err(VmError::Execution)
                    .and_then(|finished| self.complete_frame(finished))
            } else {
                self.step(ctx)
            };
            if let Err(e) = step_result {
                self.state = EngineState::Fault;
                tracing::debug!(error = %e, "execution faulted");
                return Err(e);
            }
        }

        self.state = EngineState::Halt;
        Ok(std::mem::take(&mut self.result))
    }

    fn complete_frame(&mut self, frame: Frame) -> VmResult<()> {
        let returned: Vec<Value> = frame
            .operand_stack
            .iter()
            .rev()
            .take(frame.method.return_length)
            .rev()
            .cloned()
            .collect();

        match frame.return_continuation {
            ReturnContinuation::Result => {
                self.result = returned;
            }
            ReturnContinuation::Caller => {
                let parent = self.frames.peek_mut().map_err(VmError::Execution)?;
                for value in returned {
                    parent
                        .operand_stack
                        .push(value);
                }
            }
        }
        Ok(())
    }

    /// Executes exactly one instruction of the top frame.
    fn step<C: Capability>(&mut self, ctx: &mut C) -> VmResult<()> {
        let pc = self.frames.peek().map_err(VmError::Execution)?.pc;
        let instr = self
            .frames
            .peek()
            .map_err(VmError::Execution)?
            .current_instruction()
            .cloned()
            .ok_or(ExecutionError::InvalidPc(pc as i64))?;

        ctx.charge_gas(instr.base_gas_cost())
            .map_err(VmError::Execution)?;

        self.frames.peek_mut().map_err(VmError::Execution)?.pc += 1;

        self.dispatch(instr, ctx)
    }

    fn dispatch<C: Capability>(&mut self, instr: Instruction, ctx: &mut C) -> VmResult<()> {
        use Instruction::*;
        match instr {
            ConstBool(v) => self.push(Value::Bool(v)),
            ConstU256(v) => self.push(Value::U256(v)),
            ConstI256(v) => self.push(Value::I256(v)),
            ConstByteVec(v) => self.push(Value::ByteVec(v)),
            ConstAddress(v) => self.push(Value::Address(v)),

            AddU256 => self.binary_u256(|a, b| a.checked_add(b)),
            SubU256 => self.binary_u256(|a, b| a.checked_sub(b)),
            MulU256 => self.binary_u256(|a, b| a.checked_mul(b)),
            DivU256 => self.binary_u256(|a, b| a.checked_div(b)),
            ModU256 => self.binary_u256(|a, b| a.checked_rem(b)),

            AddI256 => self.binary_i256(|a, b| a.checked_add(b)),
            SubI256 => self.binary_i256(|a, b| a.checked_sub(b)),
            MulI256 => self.binary_i256(|a, b| a.checked_mul(b)),
            DivI256 => self.binary_i256(|a, b| a.checked_div(b)),
            ModI256 => self.binary_i256(|a, b| a.checked_rem(b)),

            EqU256 => self.compare_u256(|a, b| a == b),
            LtU256 => self.compare_u256(|a, b| a < b),
            GtU256 => self.compare_u256(|a, b| a > b),
            LeU256 => self.compare_u256(|a, b| a <= b),
            GeU256 => self.compare_u256(|a, b| a >= b),

            And => self.binary_bool(|a, b| a && b),
            Or => self.binary_bool(|a, b| a || b),
            Not => {
                let v = self.pop_bool()?;
                self.push(Value::Bool(!v));
                Ok(())
            }

            Jump(offset) => self.jump(offset),
            IfTrue(offset) => {
                if self.pop_bool()? {
                    self.jump(offset)
                } else {
                    Ok(())
                }
            }
            IfFalse(offset) => {
                if !self.pop_bool()? {
                    self.jump(offset)
                } else {
                    Ok(())
                }
            }
            Return => {
                self.frames
                    .peek_mut()
                    .map_err(VmError::Execution)?
                    .mark_complete();
                Ok(())
            }

            CallLocal(method_index) => self.call_local(method_index),
            CallExternal(method_index) => self.call_external(method_index, ctx),

            LoadLocal(idx) => {
                let frame = self.frames.peek().map_err(VmError::Execution)?;
                let value = frame
                    .locals
                    .get(idx as usize)
                    .cloned()
                    .ok_or(ExecutionError::InvalidPc(idx as i64))?;
                self.push(value);
                Ok(())
            }
            StoreLocal(idx) => {
                let value = self.pop()?;
                let frame = self.frames.peek_mut().map_err(VmError::Execution)?;
                let slot = frame
                    .locals
                    .get_mut(idx as usize)
                    .ok_or(ExecutionError::InvalidPc(idx as i64))?;
                *slot = value;
                Ok(())
            }
            LoadField(idx) => {
                let frame = self.frames.peek().map_err(VmError::Execution)?;
                let cell = frame
                    .contract_fields
                    .as_ref()
                    .ok_or(VmError::Execution(ExecutionError::ExpectPayableMethod))?;
                let value = cell
                    .borrow()
                    .get(idx as usize)
                    .cloned()
                    .ok_or(ExecutionError::InvalidPc(idx as i64))?;
                self.push(value)
            }
            StoreField(idx) => {
                let value = self.pop()?;
                let frame = self.frames.peek().map_err(VmError::Execution)?;
                let cell = frame
                    .contract_fields
                    .as_ref()
                    .ok_or(VmError::Execution(ExecutionError::ExpectPayableMethod))?;
                let mut fields = cell.borrow_mut();
                let slot = fields
                    .get_mut(idx as usize)
                    .ok_or(ExecutionError::InvalidPc(idx as i64))?;
                *slot = value;
                Ok(())
            }

            ContractConv => {
                let bytes = self.pop_byte_vec()?;
                let id: [u8; 32] = bytes.try_into().map_err(|bytes: Vec<u8>| {
                    VmError::Execution(ExecutionError::TypeMismatch {
                        expected: "32-byte ByteVec".into(),
                        got: format!("{}-byte ByteVec", bytes.len()),
                    })
                })?;
                self.push(Value::Contract(ContractId::from_bytes(id)))
            }

            Pop => self.pop().map(|_| ()),

            Blake2bHash => self.hash_top(ctx, alephium_cryptography::blake2b_256),
            Keccak256Hash => self.hash_top(ctx, alephium_cryptography::keccak256),
            VerifyTxSignature => self.verify_tx_signature(ctx),
            EthEcRecover => self.eth_ec_recover(ctx),

            Log { field_count, event_id } => {
                let mut fields = Vec::with_capacity(field_count as usize);
                for _ in 0..field_count {
                    fields.push(self.pop()?);
                }
                fields.reverse();
                ctx.emit_log(event_id, fields)
            }

            ApproveAlf => {
                let amount = self.pop_u256()?;
                let lockup_script = self.pop_address()?;
                ctx.approve_alf(lockup_script, amount)
            }
            TransferAlf => {
                let amount = self.pop_u256()?;
                let to = self.pop_address()?;
                let from = self.pop_address()?;
                ctx.transfer_alf(from, to, amount)
            }
            UseContractAssets => {
                let id = self.pop_contract()?;
                let addr = ctx.use_contract_assets(id)?;
                self.push(Value::Address(addr))
            }
            GenerateOutput => {
                let amount = self.pop_u256()?;
                let lockup_script = self.pop_address()?;
                ctx.generate_output(lockup_script, amount)
            }
        }
    }

    fn jump(&mut self, offset: i32) -> VmResult<()> {
        let frame = self.frames.peek_mut().map_err(VmError::Execution)?;
        let target = frame.pc as i64 + offset as i64;
        if target < 0 || target > frame.method.instrs.len() as i64 {
            return Err(VmError::Execution(ExecutionError::InvalidPc(target)));
        }
        frame.pc = target as usize;
        Ok(())
    }

    fn call_local(&mut self, method_index: u16) -> VmResult<()> {
        if self.frames.len() + 1 >= FRAME_STACK_CAPACITY {
            return Err(VmError::Execution(ExecutionError::CallDepthExceeded));
        }
        let callee = self
            .methods
            .get(method_index as usize)
            .cloned()
            .ok_or(ExecutionError::InvalidPc(method_index as i64))?;

        let caller_fields = self.frames.peek().map_err(VmError::Execution)?.contract_fields.clone();
        let args = {
            let caller = self.frames.peek_mut().map_err(VmError::Execution)?;
            let len = caller.operand_stack.len();
            if len < callee.args_length {
                return Err(VmError::Execution(ExecutionError::StackUnderflow));
            }
            caller
                .operand_stack
                .split_off(len - callee.args_length)
        };

        // A local call stays inside the same contract (or script), so the
        // callee shares the caller's field storage rather than re-entering
        // through `resolve_external_method`.
        let frame = Frame::new(callee, args, ReturnContinuation::Caller).with_contract_fields(caller_fields);
        self.frames.push(frame).map_err(VmError::Execution)
    }

    fn call_external<C: Capability>(&mut self, method_index: u16, ctx: &mut C) -> VmResult<()> {
        if self.frames.len() + 1 >= FRAME_STACK_CAPACITY {
            return Err(VmError::Execution(ExecutionError::CallDepthExceeded));
        }
        let contract_id = self.pop_contract()?;
        let (callee, fields) = ctx.resolve_external_method(contract_id, method_index)?;

        let args = {
            let caller = self.frames.peek_mut().map_err(VmError::Execution)?;
            let len = caller.operand_stack.len();
            if len < callee.args_length {
                return Err(VmError::Execution(ExecutionError::StackUnderflow));
            }
            caller
                .operand_stack
                .split_off(len - callee.args_length)
        };

        let frame = Frame::new(callee, args, ReturnContinuation::Caller).with_contract_fields(Some(fields));
        self.frames.push(frame).map_err(VmError::Execution)
    }

    fn verify_tx_signature<C: Capability>(&mut self, ctx: &mut C) -> VmResult<()> {
        let public_key = self.pop_byte_vec()?;
        self.charge_linear_gas(ctx, public_key.len())?;
        let idx = self.sig_cursor;
        self.sig_cursor += 1;
        let signature = *ctx
            .tx_env()
            .signature_stack
            .get(idx)
            .ok_or(VmError::Execution(ExecutionError::StackUnderflow))?;
        let tx_id = ctx.tx_env().tx_id;
        let verified = alephium_cryptography::verify_secp256k1(&tx_id, &signature, &public_key)
            .unwrap_or(false);
        self.push(Value::Bool(verified))
    }

    fn eth_ec_recover<C: Capability>(&mut self, ctx: &mut C) -> VmResult<()> {
        let signature = self.pop_byte_vec()?;
        let message_hash = self.pop_byte_vec()?;
        self.charge_linear_gas(ctx, signature.len() + message_hash.len())?;
        if signature.len() != 65 {
            return Err(VmError::Execution(ExecutionError::TypeMismatch {
                expected: "65-byte signature (r || s || v)".into(),
                got: format!("{} bytes", signature.len()),
            }));
        }
        let v = signature[64];
        let recovery_id = if v >= 27 { v - 27 } else { v };
        // An invalid signature recovers to the zero address rather than
        // aborting execution, matching the Ethereum `ecrecover` precompile.
        let recovered = alephium_cryptography::eth_ecrecover(&message_hash, &signature[..64], recovery_id)
            .unwrap_or([0u8; 20]);
        self.push(Value::ByteVec(std::sync::Arc::new(recovered.to_vec())))
    }

    /// Charges the per-byte surcharge the crypto instructions' documented
    /// gas cost promises on top of their fixed `base_gas_cost()`.
    fn charge_linear_gas<C: Capability>(&self, ctx: &mut C, input_len: usize) -> VmResult<()> {
        let surcharge = crate::instruction::gas::HASH_PER_BYTE_COST * input_len as u64;
        ctx.charge_gas(surcharge).map_err(VmError::Execution)
    }

    fn push(&mut self, value: Value) -> VmResult<()> {
        self.frames
            .peek_mut()
            .map_err(VmError::Execution)?
            .operand_stack
            .push(value);
        Ok(())
    }

    fn pop(&mut self) -> VmResult<Value> {
        self.frames
            .peek_mut()
            .map_err(VmError::Execution)?
            .operand_stack
            .pop()
            .ok_or(VmError::Execution(ExecutionError::StackUnderflow))
    }

    fn pop_bool(&mut self) -> VmResult<bool> {
        match self.pop()? {
            Value::Bool(b) => Ok(b),
            other => Err(type_mismatch("Bool", &other)),
        }
    }

    fn pop_u256(&mut self) -> VmResult<alephium_core::U256> {
        match self.pop()? {
            Value::U256(v) => Ok(v),
            other => Err(type_mismatch("U256", &other)),
        }
    }

    fn pop_address(&mut self) -> VmResult<alephium_core::Address> {
        match self.pop()? {
            Value::Address(v) => Ok(v),
            other => Err(type_mismatch("Address", &other)),
        }
    }

    fn pop_contract(&mut self) -> VmResult<ContractId> {
        match self.pop()? {
            Value::Contract(id) => Ok(id),
            other => Err(type_mismatch("Contract", &other)),
        }
    }

    fn pop_byte_vec(&mut self) -> VmResult<Vec<u8>> {
        match self.pop()? {
            Value::ByteVec(v) => Ok((*v).clone()),
            other => Err(type_mismatch("ByteVec", &other)),
        }
    }

    fn binary_u256(
        &mut self,
        op: impl FnOnce(
            &alephium_core::U256,
            &alephium_core::U256,
        ) -> Result<alephium_core::U256, alephium_core::ArithmeticError>,
    ) -> VmResult<()> {
        let b = self.pop()?;
        let a = self.pop()?;
        let (a, b) = (
            a.as_u256().cloned().ok_or_else(type_mismatch_u256)?,
            b.as_u256().cloned().ok_or_else(type_mismatch_u256)?,
        );
        let result = op(&a, &b).map_err(|e| VmError::Execution(ExecutionError::Arithmetic(e)))?;
        self.push(Value::U256(result))
    }

    fn binary_i256(
        &mut self,
        op: impl FnOnce(
            &alephium_core::I256,
            &alephium_core::I256,
        ) -> Result<alephium_core::I256, alephium_core::ArithmeticError>,
    ) -> VmResult<()> {
        let b = self.pop()?;
        let a = self.pop()?;
        let (a, b) = (
            a.as_i256().cloned().ok_or_else(type_mismatch_i256)?,
            b.as_i256().cloned().ok_or_else(type_mismatch_i256)?,
        );
        let result = op(&a, &b).map_err(|e| VmError::Execution(ExecutionError::Arithmetic(e)))?;
        self.push(Value::I256(result))
    }

    fn compare_u256(&mut self, op: impl FnOnce(&alephium_core::U256, &alephium_core::U256) -> bool) -> VmResult<()> {
        let b = self.pop()?;
        let a = self.pop()?;
        let (a, b) = (
            a.as_u256().cloned().ok_or_else(type_mismatch_u256)?,
            b.as_u256().cloned().ok_or_else(type_mismatch_u256)?,
        );
        self.push(Value::Bool(op(&a, &b)))
    }

    fn binary_bool(&mut self, op: impl FnOnce(bool, bool) -> bool) -> VmResult<()> {
        let b = self.pop_bool()?;
        let a = self.pop_bool()?;
        self.push(Value::Bool(op(a, b)))
    }

    fn hash_top<C: Capability>(
        &mut self,
        ctx: &mut C,
        hasher: impl FnOnce(&[u8]) -> [u8; 32],
    ) -> VmResult<()> {
        let value = self.pop()?;
        let bytes = value.as_byte_vec().ok_or_else(|| {
            VmError::Execution(ExecutionError::TypeMismatch {
                expected: "ByteVec".into(),
                got: format!("{:?}", value.value_type()),
            })
        })?;
        self.charge_linear_gas(ctx, bytes.len())?;
        let digest = hasher(bytes);
        self.push(Value::ByteVec(std::sync::Arc::new(digest.to_vec())))
    }
}

impl Default for ExecutionEngine {
    fn default() -> Self {
        Self::new()
    }
}

fn type_mismatch(expected: &str, got: &Value) -> VmError {
    VmError::Execution(ExecutionError::TypeMismatch {
        expected: expected.into(),
        got: format!("{:?}", got.value_type()),
    })
}

fn type_mismatch_u256() -> VmError {
    VmError::Execution(ExecutionError::TypeMismatch {
        expected: "U256".into(),
        got: "other".into(),
    })
}

fn type_mismatch_i256() -> VmError {
    VmError::Execution(ExecutionError::TypeMismatch {
        expected: "I256".into(),
        got: "other".into(),
    })
}
