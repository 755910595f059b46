//! Guard evaluation and refinement.
//!
//! [`WrappedDomain::compare`] decides a branch condition over two intervals
//! as a three-valued answer, and [`WrappedDomain::filter_sigma`] sharpens
//! the range of a variable on the edge where a condition is known to hold.
//! Both are signedness-directed: signed predicates cut at the north pole,
//! unsigned ones (and equality) at the south pole, and the per-piece tests
//! reduce to plain bound comparisons.

use log::debug;

use crate::domain::WrappedDomain;
use crate::error::DomainError;
use crate::split::{nsplit, ssplit};
use crate::wrapint::Wrapint;
use crate::wrapped::WrappedInterval;

/// Three-valued truth.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriBool {
    False,
    True,
    Maybe,
}

/// Comparison predicates of a branch condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpPred {
    Eq,
    Ne,
    Ult,
    Ule,
    Ugt,
    Uge,
    Slt,
    Sle,
    Sgt,
    Sge,
}

impl CmpPred {
    /// True for the predicates that read the operands as signed.
    pub fn is_signed(self) -> bool {
        matches!(self, CmpPred::Slt | CmpPred::Sle | CmpPred::Sgt | CmpPred::Sge)
    }

    /// The predicate satisfied exactly when `self` is not.
    pub fn negation(self) -> Self {
        match self {
            CmpPred::Eq => CmpPred::Ne,
            CmpPred::Ne => CmpPred::Eq,
            CmpPred::Ult => CmpPred::Uge,
            CmpPred::Ule => CmpPred::Ugt,
            CmpPred::Ugt => CmpPred::Ule,
            CmpPred::Uge => CmpPred::Ult,
            CmpPred::Slt => CmpPred::Sge,
            CmpPred::Sle => CmpPred::Sgt,
            CmpPred::Sgt => CmpPred::Sle,
            CmpPred::Sge => CmpPred::Slt,
        }
    }

    fn min_value(self, width: u32) -> Wrapint {
        if self.is_signed() {
            Wrapint::min_signed(width)
        } else {
            Wrapint::min_unsigned(width)
        }
    }

    fn max_value(self, width: u32) -> Wrapint {
        if self.is_signed() {
            Wrapint::max_signed(width)
        } else {
            Wrapint::max_unsigned(width)
        }
    }
}

/// `[a,b] < [c,d]` may hold iff some piece pair has `a < d` (non-strict:
/// `a <= d`). Splitting makes the bound test exact per pair.
fn may_unsigned_less(x: &WrappedInterval, y: &WrappedInterval, strict: bool) -> bool {
    for p1 in ssplit(x) {
        for p2 in ssplit(y) {
            let a = p1.lb().unwrap();
            let d = p2.ub().unwrap();
            if if strict { a.ult(d) } else { a.ule(d) } {
                return true;
            }
        }
    }
    false
}

fn may_signed_less(x: &WrappedInterval, y: &WrappedInterval, strict: bool) -> bool {
    for p1 in nsplit(x) {
        for p2 in nsplit(y) {
            let a = p1.lb().unwrap();
            let d = p2.ub().unwrap();
            if if strict { a.slt(d) } else { a.sle(d) } {
                return true;
            }
        }
    }
    false
}

/// Whether `pred` can hold for some pair of concrete values.
fn may_hold(pred: CmpPred, a: &WrappedInterval, b: &WrappedInterval) -> bool {
    match pred {
        CmpPred::Eq => !a.meet(b).is_bot(),
        CmpPred::Ne => !(a.is_constant() && b.is_constant() && a == b),
        CmpPred::Ult => may_unsigned_less(a, b, true),
        CmpPred::Ule => may_unsigned_less(a, b, false),
        CmpPred::Ugt => may_unsigned_less(b, a, true),
        CmpPred::Uge => may_unsigned_less(b, a, false),
        CmpPred::Slt => may_signed_less(a, b, true),
        CmpPred::Sle => may_signed_less(a, b, false),
        CmpPred::Sgt => may_signed_less(b, a, true),
        CmpPred::Sge => may_signed_less(b, a, false),
    }
}

impl WrappedDomain {
    /// Evaluates `pred(a, b)` to a three-valued answer: definitely true,
    /// definitely false, or maybe.
    ///
    /// The predicate and its negation are both tested for satisfiability;
    /// when each can hold the guard is undecided. A bottom operand means the
    /// guard sits on an unreachable edge and is reported as `Maybe`.
    pub fn compare(
        &self,
        pred: CmpPred,
        a: &WrappedInterval,
        b: &WrappedInterval,
    ) -> Result<TriBool, DomainError> {
        if let (Some(w1), Some(w2)) = (a.width(), b.width()) {
            if w1 != w2 {
                return Err(DomainError::WidthMismatch(w1, w2));
            }
        }
        if a.is_bot() || b.is_bot() {
            return Ok(TriBool::Maybe);
        }
        let may_true = may_hold(pred, a, b);
        let may_false = may_hold(pred.negation(), a, b);
        let res = match (may_true, may_false) {
            (true, true) => TriBool::Maybe,
            (true, false) => TriBool::True,
            (false, true) => TriBool::False,
            // Unreachable for non-empty operands; stay conservative.
            (false, false) => TriBool::Maybe,
        };
        debug!("compare {pred:?} {a} {b} = {res:?}");
        Ok(res)
    }

    /// Refines `refined` under the assumption that `pred(refined, other)`
    /// holds (the sigma-node of a conditional edge).
    ///
    /// Both operands are cut at the pole matching the predicate's
    /// signedness; infeasible piece pairs are dropped; each feasible pair is
    /// refined by the classical case split, computed with the wrapped meet
    /// and falling back to the unrefined piece whenever the meet would be
    /// empty or less informative; the refined pieces are joined back
    /// together. An empty result means the edge is dead.
    pub fn filter_sigma(
        &self,
        pred: CmpPred,
        refined: &WrappedInterval,
        other: &WrappedInterval,
    ) -> Result<WrappedInterval, DomainError> {
        if let (Some(w1), Some(w2)) = (refined.width(), other.width()) {
            if w1 != w2 {
                return Err(DomainError::WidthMismatch(w1, w2));
            }
        }
        let split_fn = if pred.is_signed() { nsplit } else { ssplit };
        let mut pieces = Vec::new();
        for p1 in split_fn(refined) {
            for p2 in split_fn(other) {
                if pair_feasible(pred, &p1, &p2) {
                    pieces.push(refine_pair(pred, &p1, &p2));
                }
            }
        }
        let res = WrappedInterval::generalized_join(pieces);
        debug!("filter_sigma {pred:?} {refined} {other} = {res}");
        Ok(res)
    }
}

fn pair_feasible(pred: CmpPred, p1: &WrappedInterval, p2: &WrappedInterval) -> bool {
    match pred {
        // Equality and disequality keep every pair; the refinement itself
        // rules out what it can.
        CmpPred::Eq | CmpPred::Ne => true,
        _ => may_hold(pred, p1, p2),
    }
}

fn refine_pair(pred: CmpPred, p1: &WrappedInterval, p2: &WrappedInterval) -> WrappedInterval {
    if p1.is_constant() {
        // A constant cannot be improved.
        return *p1;
    }
    if p2.is_constant() {
        refine_with_constant(pred, p1, p2)
    } else {
        refine_with_range(pred, p1, p2)
    }
}

/// The branch compares against a single constant `n`: intersect with the
/// half-line the predicate induces, taking care not to step over the
/// extreme value at the half-line's closed end.
fn refine_with_constant(
    pred: CmpPred,
    v: &WrappedInterval,
    n: &WrappedInterval,
) -> WrappedInterval {
    let (a, b) = v.bounds().unwrap();
    let k = n.lb().unwrap();
    let w = k.width();
    let meet_or_keep = |half: WrappedInterval| {
        let m = v.wrapped_meet(&half);
        if m.is_bot() { *v } else { m }
    };
    match pred {
        CmpPred::Eq => *n,
        CmpPred::Ne => {
            let lb = if a == k { a.succ() } else { a };
            let ub = if b == k { b.pred() } else { b };
            WrappedInterval::from_wrapints(lb, ub)
        }
        CmpPred::Ule | CmpPred::Sle => {
            meet_or_keep(WrappedInterval::from_wrapints(pred.min_value(w), k))
        }
        CmpPred::Ult | CmpPred::Slt => {
            let ub = if k == pred.min_value(w) { k } else { k.pred() };
            meet_or_keep(WrappedInterval::from_wrapints(pred.min_value(w), ub))
        }
        CmpPred::Ugt | CmpPred::Sgt => {
            let lb = if k == pred.max_value(w) { k } else { k.succ() };
            meet_or_keep(WrappedInterval::from_wrapints(lb, pred.max_value(w)))
        }
        CmpPred::Uge | CmpPred::Sge => {
            meet_or_keep(WrappedInterval::from_wrapints(k, pred.max_value(w)))
        }
    }
}

/// Bound comparison under the predicate's signedness.
fn bridge_le(pred: CmpPred, x: Wrapint, y: Wrapint) -> bool {
    if pred.is_signed() { x.sle(y) } else { x.ule(y) }
}

fn bridge_lt(pred: CmpPred, x: Wrapint, y: Wrapint) -> bool {
    if pred.is_signed() { x.slt(y) } else { x.ult(y) }
}

/// `[c,d]` is included in `[a,b]` under the predicate's reading.
fn bridge_included(pred: CmpPred, c: Wrapint, d: Wrapint, a: Wrapint, b: Wrapint) -> bool {
    bridge_le(pred, a, c) && bridge_le(pred, d, b)
}

/// `[c,d]` hangs off the low side of `[a,b]`.
fn bridge_overlap_left(pred: CmpPred, a: Wrapint, c: Wrapint, d: Wrapint) -> bool {
    bridge_lt(pred, c, a) && bridge_le(pred, a, d)
}

/// `[c,d]` hangs off the high side of `[a,b]`.
fn bridge_overlap_right(pred: CmpPred, b: Wrapint, c: Wrapint, d: Wrapint) -> bool {
    bridge_le(pred, c, b) && bridge_lt(pred, b, d)
}

/// Both sides of the branch are proper ranges. The meet does most of the
/// work; the bridge case split decides when a bound of the other range can
/// cap this one directly.
fn refine_with_range(
    pred: CmpPred,
    p1: &WrappedInterval,
    p2: &WrappedInterval,
) -> WrappedInterval {
    let (a, b) = p1.bounds().unwrap();
    let (c, d) = p2.bounds().unwrap();
    let m = p1.wrapped_meet(p2);
    if m.is_bot() {
        // Disjoint operands, e.g. [0,2] < [10,50]: nothing to refine.
        return *p1;
    }
    match pred {
        CmpPred::Eq => m,
        CmpPred::Ne => *p1,
        CmpPred::Ult | CmpPred::Ule | CmpPred::Slt | CmpPred::Sle => {
            if bridge_included(pred, c, d, a, b) {
                let strict = matches!(pred, CmpPred::Ult | CmpPred::Slt);
                let ub = if strict && d != pred.min_value(d.width()) {
                    d.pred()
                } else {
                    d
                };
                WrappedInterval::from_wrapints(a, ub)
            } else if bridge_overlap_left(pred, a, c, d) {
                m
            } else {
                *p1
            }
        }
        CmpPred::Ugt | CmpPred::Uge | CmpPred::Sgt | CmpPred::Sge => {
            if bridge_included(pred, c, d, a, b) {
                let strict = matches!(pred, CmpPred::Ugt | CmpPred::Sgt);
                let lb = if strict && c != pred.max_value(c.width()) {
                    c.succ()
                } else {
                    c
                };
                WrappedInterval::from_wrapints(lb, b)
            } else if bridge_overlap_right(pred, b, c, d) {
                m
            } else {
                *p1
            }
        }
    }
}
