//! Named constants shared across the toolchain.
//!
//! Keeping these here (rather than scattering magic numbers through the VM
//! and compiler) lets the protocol-level limits in spec section 4/6 be
//! audited in one place.

/// Width, in bits, of [`crate::U256`] and the unsigned half of [`crate::I256`].
pub const WORD_BITS: u32 = 256;

/// Width, in bytes, of a serialized `U256`/`I256`.
pub const WORD_BYTES: usize = 32;

/// Width, in bytes, of an [`crate::Address`] (a lockup-script hash).
pub const ADDRESS_BYTES: usize = 32;

/// Jump offsets in compiled method bytecode are single signed bytes — a
/// protocol-level limit (see spec "Short branches only"), not an
/// implementation shortcut. Do not widen this.
pub const MAX_JUMP_OFFSET: i32 = i8::MAX as i32;
pub const MIN_JUMP_OFFSET: i32 = i8::MIN as i32;
