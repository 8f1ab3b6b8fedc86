//! The stack-based virtual machine: value domain, instruction set, the
//! bounded frame/operand stacks, execution contexts and the driver loop.

pub mod context;
pub mod engine;
pub mod error;
pub mod frame;
pub mod instruction;
pub mod method;
pub mod serialize;
pub mod stack;
pub mod value;

pub use context::{
    AssetOutput, Balances, BalancesPerLockup, BlockEnv, Capability, ContractPool, StatefulContext,
    StatelessContext, TxEnv, WorldStateView,
};
pub use engine::{EngineState, ExecutionEngine};
pub use error::{ExecutionError, IOError, VmError, VmResult};
pub use frame::{Frame, ReturnContinuation};
pub use instruction::{gas, Instruction};
pub use method::{Method, PackagingError, StatefulContract, StatefulScript, StatelessScript};
pub use stack::Stack;
pub use value::{ContractId, Type, Value};
