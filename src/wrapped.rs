//! The wrapped-interval value.
//!
//! A [`WrappedInterval`] denotes a set of `w`-bit patterns: the values
//! reached by walking *clockwise* on the circle `Z/2^w` from `lb` to `ub`
//! inclusive. Because the walk may pass the point between `11...1` and
//! `00...0` (the south pole) or between `01...1` and `10...0` (the north
//! pole), an interval can represent unsigned-wrapping or signed-wrapping
//! ranges without committing to a sign interpretation and without collapsing
//! to `Top`.
//!
//! # Lattice Structure
//!
//! The domain is **not** a lattice: the order [`leq`][WrappedInterval::leq]
//! is a pre-order (not antisymmetric), the join in [`crate::lattice`] is a
//! pseudo-join (an upper bound, not a least one), and neither join nor meet
//! is associative. See the paper by Navas, Schachte, Sondergaard and Stuckey,
//! "Signedness-Agnostic Program Analysis: Precise Integer Bounds for
//! Low-Level Code" (APLAS 2012).
//!
//! # Invariants
//!
//! - Both bounds of a `Range` have the same width.
//! - A `Range` covering the full circle is canonicalised to `Top`: the
//!   constructors here never leak `[x+1, x]`-shaped full ranges, and every
//!   public operation in the crate preserves that.

use std::fmt;

use crate::guard::TriBool;
use crate::wrapint::Wrapint;

/// A set of `w`-bit values: empty, everything, or a clockwise arc.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WrappedInterval {
    /// The empty set. Bottom carries no width; it is below every value of
    /// every width.
    Bot,
    /// The full circle of `2^w` values at the given width.
    Top(u32),
    /// The clockwise arc from `lb` to `ub` inclusive. Never the full circle.
    Range { lb: Wrapint, ub: Wrapint },
}

use WrappedInterval::{Bot, Range, Top};

impl WrappedInterval {
    // ---- constructors ------------------------------------------------------

    /// The empty interval.
    pub fn bot() -> Self {
        Bot
    }

    /// The full interval of all `2^width` values.
    pub fn top(width: u32) -> Self {
        assert!((1..=Wrapint::MAX_WIDTH).contains(&width));
        Top(width)
    }

    /// The singleton `{n mod 2^width}`.
    pub fn singleton(width: u32, n: u64) -> Self {
        let v = Wrapint::new(width, n);
        Range { lb: v, ub: v }
    }

    /// The arc from `lb` to `ub` (both taken modulo `2^width`), canonicalised
    /// to [`Top`] when it covers the whole circle.
    pub fn from_bounds(width: u32, lb: u64, ub: u64) -> Self {
        Self::from_wrapints(Wrapint::new(width, lb), Wrapint::new(width, ub))
    }

    /// As [`from_bounds`][Self::from_bounds], for already-tagged bounds.
    pub fn from_wrapints(lb: Wrapint, ub: Wrapint) -> Self {
        assert_eq!(lb.width(), ub.width(), "interval bounds must share a width");
        if ub.wrapping_sub(lb) == Wrapint::max_unsigned(lb.width()) {
            Top(lb.width())
        } else {
            Range { lb, ub }
        }
    }

    /// A width-1 interval from a three-valued boolean: `[0,0]`, `[1,1]`, or
    /// everything for `Maybe`.
    pub fn from_bool(b: TriBool) -> Self {
        match b {
            TriBool::False => Self::singleton(1, 0),
            TriBool::True => Self::singleton(1, 1),
            TriBool::Maybe => Self::top(1),
        }
    }

    // ---- inspection --------------------------------------------------------

    /// The width, or `None` for bottom.
    pub fn width(&self) -> Option<u32> {
        match self {
            Bot => None,
            Top(w) => Some(*w),
            Range { lb, .. } => Some(lb.width()),
        }
    }

    pub fn is_bot(&self) -> bool {
        matches!(self, Bot)
    }

    pub fn is_top(&self) -> bool {
        matches!(self, Top(_))
    }

    /// True for a singleton arc (exactly one value).
    pub fn is_constant(&self) -> bool {
        matches!(self, Range { lb, ub } if lb == ub)
    }

    /// True for the singleton `{0}`.
    pub fn is_zero(&self) -> bool {
        matches!(self, Range { lb, ub } if lb == ub && lb.raw() == 0)
    }

    /// The lower bound, or `None` for bottom. `Top` reports the canonical
    /// bounds `[0, 2^w-1]`.
    pub fn lb(&self) -> Option<Wrapint> {
        self.bounds().map(|(lb, _)| lb)
    }

    /// The upper bound, or `None` for bottom.
    pub fn ub(&self) -> Option<Wrapint> {
        self.bounds().map(|(_, ub)| ub)
    }

    /// Both bounds at once; `Top` yields `(0, 2^w-1)`.
    pub(crate) fn bounds(&self) -> Option<(Wrapint, Wrapint)> {
        match self {
            Bot => None,
            Top(w) => Some((Wrapint::min_unsigned(*w), Wrapint::max_unsigned(*w))),
            Range { lb, ub } => Some((*lb, *ub)),
        }
    }

    /// Number of values denoted, in `[0, 2^w]`.
    pub fn cardinality(&self) -> u128 {
        match self {
            Bot => 0,
            Top(w) => 1u128 << w,
            Range { lb, ub } => ub.wrapping_sub(*lb).raw() as u128 + 1,
        }
    }

    /// The fundamental membership test: `e ∈ [a,b]` iff walking clockwise
    /// from `a` we meet `e` no later than `b`, i.e.
    /// `(e - a) mod 2^w <= (b - a) mod 2^w`.
    pub fn contains(&self, e: Wrapint) -> bool {
        match self {
            Bot => false,
            Top(w) => {
                debug_assert_eq!(*w, e.width());
                true
            }
            Range { lb, ub } => {
                e.wrapping_sub(*lb).ule(ub.wrapping_sub(*lb))
            }
        }
    }

    /// Membership of a raw pattern at this interval's width.
    pub fn contains_raw(&self, e: u64) -> bool {
        match self.width() {
            None => false,
            Some(w) => self.contains(Wrapint::new(w, e)),
        }
    }

    /// Set complement on the circle: `[a,b]` becomes `[b+1, a-1]`.
    pub fn complement(&self) -> Self {
        match self {
            Bot => panic!("complement of bottom has no width"),
            Top(w) => Self::complement_at(*w, self),
            Range { .. } => Self::complement_at(self.width().unwrap(), self),
        }
    }

    /// Complement with an explicit width, so `Bot` can flip to `Top(w)`.
    pub fn complement_at(width: u32, v: &Self) -> Self {
        match v {
            Bot => Top(width),
            Top(_) => Bot,
            Range { lb, ub } => Range {
                lb: ub.succ(),
                ub: lb.pred(),
            },
        }
    }

    /// True iff the arc passes the south pole (between `11...1` and
    /// `00...0`), i.e. the unsigned reading wraps.
    pub fn crosses_south_pole(&self) -> bool {
        match self {
            Bot => false,
            Top(_) => true,
            Range { lb, ub } => ub.ult(*lb),
        }
    }

    /// True iff the arc passes the north pole (between `01...1` and
    /// `10...0`), i.e. the signed reading wraps.
    pub fn crosses_north_pole(&self) -> bool {
        match self {
            Bot => false,
            Top(_) => true,
            Range { lb, ub } => ub.slt(*lb),
        }
    }

    /// Width of `self`, or of `other` if `self` is bottom. `None` when both
    /// are bottom.
    pub(crate) fn common_width(&self, other: &Self) -> Option<u32> {
        self.width().or_else(|| other.width())
    }
}

impl fmt::Display for WrappedInterval {
    /// Prints `bottom`, `[-oo,+oo]`, or `[u:<lb>|s:<lb>,u:<ub>|s:<ub>]` with
    /// both renderings of each bound.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Bot => write!(f, "bottom"),
            Top(_) => write!(f, "[-oo,+oo]"),
            Range { lb, ub } => write!(
                f,
                "[u:{}|s:{},u:{}|s:{}]",
                lb.raw(),
                lb.as_signed(),
                ub.raw(),
                ub.as_signed()
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_top() {
        // Every full circle collapses to the same Top.
        assert_eq!(WrappedInterval::from_bounds(8, 1, 0), WrappedInterval::top(8));
        assert_eq!(WrappedInterval::from_bounds(8, 200, 199), WrappedInterval::top(8));
        assert_eq!(WrappedInterval::from_bounds(8, 0, 255), WrappedInterval::top(8));
        assert_ne!(WrappedInterval::from_bounds(8, 0, 254), WrappedInterval::top(8));
        assert_eq!(WrappedInterval::from_bounds(1, 0, 1), WrappedInterval::top(1));
    }

    #[test]
    fn test_membership_rotation() {
        let r = WrappedInterval::from_bounds(8, 250, 10); // wraps the south pole
        assert!(r.contains_raw(250));
        assert!(r.contains_raw(255));
        assert!(r.contains_raw(0));
        assert!(r.contains_raw(10));
        assert!(!r.contains_raw(11));
        assert!(!r.contains_raw(249));
        assert!(!r.contains_raw(128));
    }

    /// The single rotation test agrees with both case-split membership
    /// formulations (unsigned and signed), so one predicate serves every
    /// signedness context.
    #[test]
    fn test_membership_matches_case_splits() {
        let w = 8;
        for a in 0..=255u64 {
            for b in [0, 1, 5, 127, 128, 200, 255] {
                let r = WrappedInterval::from_bounds(w, a, b);
                if r.is_top() {
                    continue;
                }
                for e in 0..=255u64 {
                    let x = Wrapint::new(w, a);
                    let y = Wrapint::new(w, b);
                    let ev = Wrapint::new(w, e);
                    let unsigned_variant = (x.ule(y) && x.ule(ev) && ev.ule(y))
                        || (x.ugt(y) && (ev.ule(y) || x.ule(ev)));
                    let signed_variant = (x.sle(y) && x.sle(ev) && ev.sle(y))
                        || (x.sgt(y) && (ev.sle(y) || x.sle(ev)));
                    assert_eq!(r.contains(ev), unsigned_variant, "u-split {a},{b},{e}");
                    assert_eq!(r.contains(ev), signed_variant, "s-split {a},{b},{e}");
                }
            }
        }
    }

    #[test]
    fn test_cardinality() {
        assert_eq!(WrappedInterval::bot().cardinality(), 0);
        assert_eq!(WrappedInterval::top(8).cardinality(), 256);
        assert_eq!(WrappedInterval::top(64).cardinality(), 1u128 << 64);
        assert_eq!(WrappedInterval::from_bounds(8, 10, 20).cardinality(), 11);
        assert_eq!(WrappedInterval::from_bounds(8, 250, 10).cardinality(), 17);
        assert_eq!(WrappedInterval::singleton(8, 5).cardinality(), 1);
    }

    #[test]
    fn test_complement_involution() {
        let r = WrappedInterval::from_bounds(8, 250, 10);
        assert_eq!(r.complement(), WrappedInterval::from_bounds(8, 11, 249));
        assert_eq!(r.complement().complement(), r);
        assert_eq!(WrappedInterval::top(8).complement(), WrappedInterval::bot());
        assert_eq!(
            WrappedInterval::complement_at(8, &WrappedInterval::bot()),
            WrappedInterval::top(8)
        );
    }

    #[test]
    fn test_pole_crossing() {
        assert!(WrappedInterval::from_bounds(8, 250, 10).crosses_south_pole());
        assert!(!WrappedInterval::from_bounds(8, 250, 10).crosses_north_pole());
        assert!(WrappedInterval::from_bounds(8, 120, 130).crosses_north_pole());
        assert!(!WrappedInterval::from_bounds(8, 120, 130).crosses_south_pole());
        assert!(!WrappedInterval::singleton(8, 0).crosses_south_pole());
        assert!(!WrappedInterval::from_bounds(8, 10, 20).crosses_north_pole());
    }

    #[test]
    fn test_constant_predicates() {
        assert!(WrappedInterval::singleton(8, 7).is_constant());
        assert!(!WrappedInterval::singleton(8, 7).is_zero());
        assert!(WrappedInterval::singleton(8, 0).is_zero());
        assert!(!WrappedInterval::top(8).is_constant());
        assert!(!WrappedInterval::bot().is_constant());
    }

    #[test]
    fn test_from_bool() {
        assert_eq!(WrappedInterval::from_bool(TriBool::False), WrappedInterval::singleton(1, 0));
        assert_eq!(WrappedInterval::from_bool(TriBool::True), WrappedInterval::singleton(1, 1));
        assert_eq!(WrappedInterval::from_bool(TriBool::Maybe), WrappedInterval::top(1));
    }

    #[test]
    fn test_printer() {
        assert_eq!(WrappedInterval::bot().to_string(), "bottom");
        assert_eq!(WrappedInterval::top(8).to_string(), "[-oo,+oo]");
        assert_eq!(
            WrappedInterval::from_bounds(8, 250, 4).to_string(),
            "[u:250|s:-6,u:4|s:4]"
        );
    }

    #[test]
    fn test_bound_round_trip() {
        let r = WrappedInterval::from_bounds(8, 250, 10);
        assert_eq!(r.lb().unwrap().raw(), 250);
        assert_eq!(r.ub().unwrap().raw(), 10);
    }
}
