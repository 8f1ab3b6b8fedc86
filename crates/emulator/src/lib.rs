//! Gas-metered dry-run emulation of a `TxScript`: build a throwaway
//! transaction around a compiled script, run it against a staged world
//! state borrowed from a chain collaborator, and report what it would
//! have cost. Nothing here ever commits — the staged world state is
//! discarded the moment `emulate` returns.
//!
//! [`chain::BlockFlowView`] is a trait boundary, not an implementation: a
//! full node supplies its own block cache and mempool behind it. This
//! crate only ever consumes that boundary.

pub mod chain;
pub mod emulate;
pub mod error;
pub mod gas;
pub mod transaction;

pub use chain::{BlockFlowView, ChainIndex, GroupIndex};
pub use emulate::{emulate, TxScriptEmulationResult};
pub use error::EmulationError;
pub use transaction::{TransactionTemplate, TxInput};
