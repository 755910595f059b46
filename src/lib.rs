//! # wrapint: wrapped interval arithmetic for abstract interpretation
//!
//! **`wrapint`** implements the *wrapped* (signedness-agnostic) interval
//! abstract domain over fixed-width machine integers, together with the
//! classical signed/unsigned interval domain used as a precision baseline.
//! It is designed as the numeric core of a static analyser for low-level
//! code: LLVM-style IR, bytecode verifiers, binary analysis.
//!
//! ## What is a wrapped interval?
//!
//! A wrapped interval `[a, b]` at width `w` denotes the values reached by
//! walking **clockwise** on the circle `Z/2^w` from `a` to `b` inclusive.
//! The walk is allowed to pass the *south pole* (the `11...1 | 00...0`
//! boundary where unsigned arithmetic overflows) and the *north pole* (the
//! `01...1 | 10...0` boundary where signed arithmetic overflows). A
//! conventional interval domain must widen any range that touches one of
//! these boundaries all the way to `Top`; the wrapped domain keeps a tight
//! arc without ever committing to a sign interpretation of the values.
//!
//! ## Key Properties
//!
//! - **Signedness-agnostic**: one value describes both readings; operations
//!   that depend on sign (division, comparisons) split the interval at the
//!   relevant pole first and work on the monotone pieces.
//! - **Not a lattice**: the order is a pre-order and the join is a
//!   *pseudo*-join. Multi-way combinations must go through
//!   [`WrappedInterval::generalized_join`], which computes the best upper
//!   bound of a finite set; every composite operation here does so.
//! - **Manager-centric**: the [`WrappedDomain`] manager carries the runtime
//!   configuration (widening strategy) and the overflow statistic; the
//!   values themselves are plain immutable data.
//!
//! ## Basic Usage
//!
//! ```rust
//! use wrapint::{ArithOp, WrappedDomain, WrappedInterval};
//!
//! let domain = WrappedDomain::default();
//!
//! // x in [200, 250], y in [100, 110] as 8-bit values.
//! let x = WrappedInterval::from_bounds(8, 200, 250);
//! let y = WrappedInterval::from_bounds(8, 100, 110);
//!
//! // The sum wraps past the unsigned boundary but stays a tight arc.
//! let sum = domain.arith_binop(ArithOp::Add, &x, &y).unwrap();
//! assert_eq!(sum, WrappedInterval::from_bounds(8, 44, 104));
//! assert_eq!(sum.cardinality(), 61);
//! ```
//!
//! ## Core Components
//!
//! - **[`wrapint`]**: the width-tagged two's-complement integer primitive.
//! - **[`wrapped`]**: the [`WrappedInterval`] value and its printer.
//! - **[`split`]**: the south/north pole cuts everything else dispatches on.
//! - **[`lattice`]**: order, pseudo-join, generalized join, meet, widening.
//! - **[`transfer`]**: arithmetic, bitwise, and casting transfer functions.
//! - **[`guard`]**: three-valued comparison and sigma-node refinement.
//! - **[`classic`]**: the classical interval baseline.
//! - **[`domain`]**: the [`AbstractDomain`] seam a fixpoint engine drives.
//!
//! The construction follows "Signedness-Agnostic Program Analysis: Precise
//! Integer Bounds for Low-Level Code" by Navas, Schachte, Sondergaard and
//! Stuckey (APLAS 2012).

mod bits;

pub mod classic;
pub mod domain;
pub mod error;
pub mod guard;
pub mod lattice;
pub mod split;
pub mod transfer;
pub mod wrapint;
pub mod wrapped;

// Re-exports for convenience
pub use classic::ClassicInterval;
pub use domain::{AbstractDomain, ClassicDomain, WideningStrategy, WrappedDomain};
pub use error::DomainError;
pub use guard::{CmpPred, TriBool};
pub use lattice::JumpSet;
pub use split::{nsplit, psplit, ssplit};
pub use transfer::{ArithOp, BitOp, CastOp};
pub use wrapint::Wrapint;
pub use wrapped::WrappedInterval;
