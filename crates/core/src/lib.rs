//! Shared value primitives for the Alephium contract toolchain.
//!
//! This crate has no knowledge of the stack machine, the compiler, or world
//! state — it only defines the fixed-precision numeric types and the small
//! set of errors that are common to every layer above it.

pub mod address;
pub mod constants;
pub mod difficulty;
pub mod error;
pub mod i256;
pub mod u256;

pub use address::Address;
pub use difficulty::{cal_median_block_time, re_target, RETARGET_WINDOW_SIZE};
pub use error::ArithmeticError;
pub use i256::I256;
pub use u256::U256;
