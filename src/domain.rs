//! Domain managers and the abstract-domain seam.
//!
//! Mirroring the manager-centric layout of the rest of this crate's API,
//! all stateful concerns — the widening strategy and the overflow counter —
//! live on a small manager object, while the interval values stay plain
//! immutable data. A fixpoint engine drives a manager through the
//! [`AbstractDomain`] trait and the transfer methods in [`crate::transfer`]
//! and [`crate::guard`].

use std::cell::Cell;
use std::fmt::Debug;

use crate::classic::ClassicInterval;
use crate::lattice::JumpSet;
use crate::wrapped::WrappedInterval;

/// How a manager widens at loop heads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WideningStrategy {
    /// No extrapolation: widen is join. Termination is the caller's problem.
    None,
    /// Cousot'76: any unstable bound gives up the whole circle.
    Classical,
    /// Double the previous cardinality, then snap outward to the nearest
    /// landmark of the jump set.
    #[default]
    JumpSet,
}

/// The lattice interface a fixpoint engine drives.
///
/// For the wrapped domain this is a *pre-order* with a pseudo-join: `le` is
/// not antisymmetric and `join` returns an upper bound that is not least.
/// The engine contract is unchanged — ascend with `join`/`widen`, descend
/// with `narrow`, stop when `le` holds in both directions.
pub trait AbstractDomain {
    type Element: Clone + Debug + PartialEq;

    /// The empty element at the given width.
    fn bottom(&self, width: u32) -> Self::Element;

    /// The full element at the given width.
    fn top(&self, width: u32) -> Self::Element;

    fn is_bottom(&self, elem: &Self::Element) -> bool;

    fn is_top(&self, elem: &Self::Element) -> bool;

    /// `elem1` denotes a subset of `elem2`.
    fn le(&self, elem1: &Self::Element, elem2: &Self::Element) -> bool;

    /// Upper bound of both elements.
    fn join(&self, elem1: &Self::Element, elem2: &Self::Element) -> Self::Element;

    /// Over-approximation of the intersection.
    fn meet(&self, elem1: &Self::Element, elem2: &Self::Element) -> Self::Element;

    /// Extrapolation at loop heads, honouring the manager's strategy.
    fn widen(&self, prev: &Self::Element, curr: &Self::Element, jumps: &JumpSet) -> Self::Element;

    /// Refinement after widening has stabilised. Meet is a safe default.
    fn narrow(&self, elem1: &Self::Element, elem2: &Self::Element) -> Self::Element {
        self.meet(elem1, elem2)
    }
}

/// Manager for the wrapped-interval domain.
///
/// Owns the widening strategy and the overflow statistic. One manager per
/// analysis context; the values it produces are freely shareable.
#[derive(Debug, Default)]
pub struct WrappedDomain {
    widening: WideningStrategy,
    overflows: Cell<u64>,
}

impl WrappedDomain {
    pub fn new(widening: WideningStrategy) -> Self {
        WrappedDomain {
            widening,
            overflows: Cell::new(0),
        }
    }

    pub fn widening_strategy(&self) -> WideningStrategy {
        self.widening
    }

    /// Number of operations so far that lost all precision to overflow
    /// (additive, multiplicative, truncation, or widening-cardinality).
    pub fn overflow_count(&self) -> u64 {
        self.overflows.get()
    }

    pub fn reset_overflow_count(&self) {
        self.overflows.set(0);
    }

    pub(crate) fn note_overflow(&self) {
        self.overflows.set(self.overflows.get() + 1);
    }
}

impl AbstractDomain for WrappedDomain {
    type Element = WrappedInterval;

    fn bottom(&self, _width: u32) -> WrappedInterval {
        WrappedInterval::bot()
    }

    fn top(&self, width: u32) -> WrappedInterval {
        WrappedInterval::top(width)
    }

    fn is_bottom(&self, elem: &WrappedInterval) -> bool {
        elem.is_bot()
    }

    fn is_top(&self, elem: &WrappedInterval) -> bool {
        elem.is_top()
    }

    fn le(&self, elem1: &WrappedInterval, elem2: &WrappedInterval) -> bool {
        elem1.leq(elem2)
    }

    fn join(&self, elem1: &WrappedInterval, elem2: &WrappedInterval) -> WrappedInterval {
        elem1.join(elem2)
    }

    fn meet(&self, elem1: &WrappedInterval, elem2: &WrappedInterval) -> WrappedInterval {
        elem1.meet(elem2)
    }

    fn widen(
        &self,
        prev: &WrappedInterval,
        curr: &WrappedInterval,
        jumps: &JumpSet,
    ) -> WrappedInterval {
        match self.widening {
            WideningStrategy::None => prev.join(curr),
            WideningStrategy::Classical => prev.widen_classical(curr),
            WideningStrategy::JumpSet => {
                let (res, overflowed) = prev.widen_reporting(curr, jumps);
                if overflowed {
                    self.note_overflow();
                }
                res
            }
        }
    }
}

/// Manager for the classical interval baseline. The signedness tag decides
/// how the trait-level bottom and top elements are read.
#[derive(Debug, Default)]
pub struct ClassicDomain {
    widening: WideningStrategy,
    signed: bool,
    overflows: Cell<u64>,
}

impl ClassicDomain {
    pub fn new(widening: WideningStrategy, signed: bool) -> Self {
        ClassicDomain {
            widening,
            signed,
            overflows: Cell::new(0),
        }
    }

    pub fn widening_strategy(&self) -> WideningStrategy {
        self.widening
    }

    pub fn is_signed(&self) -> bool {
        self.signed
    }

    pub fn overflow_count(&self) -> u64 {
        self.overflows.get()
    }

    pub fn reset_overflow_count(&self) {
        self.overflows.set(0);
    }

    pub(crate) fn note_overflow(&self) {
        self.overflows.set(self.overflows.get() + 1);
    }
}

impl AbstractDomain for ClassicDomain {
    type Element = ClassicInterval;

    fn bottom(&self, width: u32) -> ClassicInterval {
        ClassicInterval::bot(width, self.signed)
    }

    fn top(&self, width: u32) -> ClassicInterval {
        ClassicInterval::top(width, self.signed)
    }

    fn is_bottom(&self, elem: &ClassicInterval) -> bool {
        elem.is_bot()
    }

    fn is_top(&self, elem: &ClassicInterval) -> bool {
        elem.is_top()
    }

    fn le(&self, elem1: &ClassicInterval, elem2: &ClassicInterval) -> bool {
        elem1.leq(elem2)
    }

    fn join(&self, elem1: &ClassicInterval, elem2: &ClassicInterval) -> ClassicInterval {
        elem1.join(elem2)
    }

    fn meet(&self, elem1: &ClassicInterval, elem2: &ClassicInterval) -> ClassicInterval {
        elem1.meet(elem2)
    }

    fn widen(
        &self,
        prev: &ClassicInterval,
        curr: &ClassicInterval,
        jumps: &JumpSet,
    ) -> ClassicInterval {
        match self.widening {
            WideningStrategy::None => prev.join(curr),
            WideningStrategy::Classical => prev.widen_cousot(curr),
            WideningStrategy::JumpSet => prev.widen_jump(curr, jumps),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// The pre-order axioms the fixpoint engine relies on, checked over a
    /// sample of wrapped values.
    #[test]
    fn test_wrapped_domain_axioms() {
        let d = WrappedDomain::default();
        let samples = [
            d.bottom(8),
            d.top(8),
            WrappedInterval::singleton(8, 0),
            WrappedInterval::singleton(8, 200),
            WrappedInterval::from_bounds(8, 0, 10),
            WrappedInterval::from_bounds(8, 250, 10),
            WrappedInterval::from_bounds(8, 120, 130),
        ];
        for a in &samples {
            // Reflexivity.
            assert!(d.le(a, a));
            // Bottom below, top above.
            assert!(d.le(&d.bottom(8), a));
            if !a.is_bot() {
                assert!(d.le(a, &d.top(8)));
            }
            for b in &samples {
                // Join is an upper bound of both operands.
                let j = d.join(a, b);
                assert!(d.le(a, &j), "join({a}, {b}) = {j} not above {a}");
                assert!(d.le(b, &j), "join({a}, {b}) = {j} not above {b}");
                // Meet is below the join.
                let m = d.meet(a, b);
                assert!(d.le(&m, &j));
                // Widening covers the current value.
                let wid = d.widen(a, b, &JumpSet::new());
                assert!(d.le(b, &wid), "widen({a}, {b}) = {wid} below {b}");
            }
        }
    }

    #[test]
    fn test_widening_strategies() {
        let prev = WrappedInterval::from_bounds(8, 0, 3);
        let curr = WrappedInterval::from_bounds(8, 0, 5);
        let jumps = JumpSet::new();

        let none = WrappedDomain::new(WideningStrategy::None);
        assert_eq!(none.widen(&prev, &curr, &jumps), curr);

        let classical = WrappedDomain::new(WideningStrategy::Classical);
        assert_eq!(classical.widen(&prev, &curr, &jumps), WrappedInterval::top(8));

        let jump = WrappedDomain::new(WideningStrategy::JumpSet);
        assert_eq!(
            jump.widen(&prev, &curr, &jumps),
            WrappedInterval::from_bounds(8, 0, 8)
        );
    }

    #[test]
    fn test_overflow_counter_on_widening() {
        let d = WrappedDomain::new(WideningStrategy::JumpSet);
        let prev = WrappedInterval::from_bounds(8, 0, 130);
        let curr = WrappedInterval::from_bounds(8, 0, 140);
        assert_eq!(d.overflow_count(), 0);
        let res = d.widen(&prev, &curr, &JumpSet::new());
        assert!(res.is_top());
        assert_eq!(d.overflow_count(), 1);
        d.reset_overflow_count();
        assert_eq!(d.overflow_count(), 0);
    }
}
