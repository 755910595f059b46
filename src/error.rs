//! Contract-violation errors reported by the fallible domain operations.
//!
//! Only genuine contract violations surface as [`DomainError`]: mismatched
//! operand widths, ill-formed shift amounts, division by an interval that
//! contains zero, and casts with impossible width changes. Recoverable
//! imprecision (arithmetic overflow, truncation overflow) is *not* an error:
//! it yields `Top` and bumps the overflow counter of the domain manager.

use thiserror::Error;

/// Errors raised by transfer functions and guard refinement.
///
/// Every error here is a caller bug: the analysis driver is expected to have
/// established the precondition (same widths, proven non-zero divisor, shift
/// amount in range) before invoking the operation. No malformed abstract
/// value is ever produced alongside an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DomainError {
    /// Binary operation over operands of different bit widths.
    #[error("operand widths differ: {0} vs {1}")]
    WidthMismatch(u32, u32),

    /// Shift amount is negative (under the signed view) or not below the
    /// operand width.
    #[error("shift amount outside [0, {width})")]
    ShiftOutOfRange { width: u32 },

    /// Division or remainder by an interval containing zero. The caller must
    /// refine the divisor (e.g. via a guard) before dividing.
    #[error("division by an interval containing zero")]
    DivisionByZero,

    /// Truncation to a width that is not strictly smaller, extension to a
    /// width that is smaller, or a bitcast that changes the width.
    #[error("invalid cast from width {from} to width {to}")]
    BadCastWidth { from: u32, to: u32 },
}
