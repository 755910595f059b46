//! End-to-end scenarios for the wrapped domain, driven through the public
//! manager API the way a fixpoint engine would drive it.

use wrapint::{
    AbstractDomain, ArithOp, BitOp, CastOp, CmpPred, JumpSet, TriBool, WideningStrategy, Wrapint,
    WrappedDomain, WrappedInterval,
};

fn r(lb: u64, ub: u64) -> WrappedInterval {
    WrappedInterval::from_bounds(8, lb, ub)
}

/// Scenario: an 8-bit addition that runs over the unsigned boundary keeps a
/// 61-value arc where a classical interval analysis reports everything.
#[test]
fn scenario_wrap_around_add() {
    let domain = WrappedDomain::default();
    let sum = domain
        .arith_binop(ArithOp::Add, &r(200, 250), &r(100, 110))
        .unwrap();
    assert_eq!(sum, r(44, 104));
    assert_eq!(sum.cardinality(), 61);
}

/// Scenario: the multi-way pseudo-lub that multiplication and phi nodes
/// rely on. Three low arcs combine into one; a fourth, south-crossing arc
/// forces the result to wrap around the largest uncovered run.
#[test]
fn scenario_generalized_join() {
    let three = WrappedInterval::generalized_join([r(2, 10), r(120, 130), r(132, 135)]);
    assert_eq!(three, r(2, 135));

    let four = WrappedInterval::generalized_join([
        r(2, 10),
        r(120, 130),
        r(132, 135),
        r(200, 100),
    ]);
    assert_eq!(four, r(200, 135));
    // Still an upper bound of everything.
    for v in [r(2, 10), r(120, 130), r(132, 135), r(200, 100)] {
        assert!(v.leq(&four));
    }
}

/// Scenario: a signed guard on a south-pole-wrapping range. `x` holds
/// `[-6, 10]` as bit patterns `[250, 10]`; assuming `x <_s 5` cuts the
/// range to `[-6, 4]`, i.e. `[250, 4]`.
#[test]
fn scenario_signed_comparison_guard() {
    let domain = WrappedDomain::default();
    let x = r(250, 10);
    let five = WrappedInterval::singleton(8, 5);

    assert_eq!(domain.compare(CmpPred::Slt, &x, &five).unwrap(), TriBool::Maybe);
    let refined = domain.filter_sigma(CmpPred::Slt, &x, &five).unwrap();
    assert_eq!(refined, r(250, 4));

    // The other edge of the branch.
    let refined = domain.filter_sigma(CmpPred::Sge, &x, &five).unwrap();
    assert_eq!(refined, r(5, 10));
}

/// Scenario: left shifts keep exact bounds while no set bit falls off, and
/// degrade to the multiples-of-2^k pattern once one would.
#[test]
fn scenario_shl_bit_preservation() {
    let domain = WrappedDomain::default();
    let four = WrappedInterval::singleton(8, 4);
    assert_eq!(
        domain.bit_binop(BitOp::Shl, &r(0x00, 0x0f), &four).unwrap(),
        r(0x00, 0xf0)
    );
    assert_eq!(
        domain.bit_binop(BitOp::Shl, &r(0x00, 0x1f), &four).unwrap(),
        r(0x00, 0xf0)
    );
}

/// Scenario: truncation to a circle smaller than the interval's
/// cardinality covers the whole target type.
#[test]
fn scenario_trunc_overflow() {
    let domain = WrappedDomain::default();
    let v = WrappedInterval::from_bounds(6, 0b000111, 0b011011);
    assert_eq!(v.cardinality(), 21);
    let res = domain.cast(CastOp::Trunc, &v, 3).unwrap();
    assert!(res.is_top());
    assert_eq!(domain.overflow_count(), 1);
}

/// Scenario: jump-set widening doubles the interval and rounds up to the
/// next landmark.
#[test]
fn scenario_widening_with_jump_set() {
    let domain = WrappedDomain::new(WideningStrategy::JumpSet);
    let jumps: JumpSet = [Wrapint::new(8, 0), Wrapint::new(8, 100)].into_iter().collect();
    let res = domain.widen(&r(0, 3), &r(0, 5), &jumps);
    assert_eq!(res, r(0, 100));
}

/// A small loop analysis sketch: `for (i = 0; i < 100; ++i)` at width 8,
/// iterated the way a worklist engine iterates it, terminates at `[0, 100]`
/// on the head with the back-edge guard trimming to `[0, 99]`.
#[test]
fn scenario_loop_fixpoint() {
    let domain = WrappedDomain::default();
    let mut jumps = JumpSet::new();
    jumps.insert_extremes(8);
    jumps.insert(Wrapint::new(8, 100));

    let bound = WrappedInterval::singleton(8, 100);
    let one = WrappedInterval::singleton(8, 1);

    let mut head = WrappedInterval::singleton(8, 0);
    for _ in 0..20 {
        let body = domain.filter_sigma(CmpPred::Ult, &head, &bound).unwrap();
        let inc = domain.arith_binop(ArithOp::Add, &body, &one).unwrap();
        let next = WrappedInterval::singleton(8, 0).join(&inc);
        let widened = domain.widen(&head, &next, &jumps);
        if widened == head {
            break;
        }
        head = widened;
    }
    assert_eq!(head, r(0, 100));
    let in_loop = domain.filter_sigma(CmpPred::Ult, &head, &bound).unwrap();
    assert_eq!(in_loop, r(0, 99));
    // On exit the guard proves i == 100.
    let out = domain.filter_sigma(CmpPred::Uge, &head, &bound).unwrap();
    assert_eq!(out, WrappedInterval::singleton(8, 100));
}

#[test]
fn round_trip_bounds() {
    let v = WrappedInterval::from_bounds(8, 250, 10);
    assert_eq!(v.lb().unwrap().raw(), 250);
    assert_eq!(v.ub().unwrap().raw(), 10);
}

#[test]
fn round_trip_complement() {
    for v in [r(0, 0), r(10, 20), r(250, 10), r(128, 126)] {
        assert_eq!(v.complement().complement(), v);
    }
    assert!(WrappedInterval::top(8).complement().is_bot());
    assert!(WrappedInterval::complement_at(8, &WrappedInterval::bot()).is_top());
}

#[test]
fn idempotence() {
    let domain = WrappedDomain::default();
    let empty = JumpSet::new();
    for v in [r(0, 0), r(10, 20), r(250, 10), WrappedInterval::top(8)] {
        assert_eq!(v.join(&v), v);
        assert_eq!(v.meet(&v), v);
        assert_eq!(domain.widen(&v, &v, &empty), v);
    }
}

#[test]
fn canonical_top_everywhere() {
    let domain = WrappedDomain::default();
    // An addition covering the whole circle is the canonical top, whatever
    // bounds produced it.
    let res = domain
        .arith_binop(ArithOp::Add, &r(0, 127), &r(0, 128))
        .unwrap();
    assert_eq!(res, WrappedInterval::top(8));
    // Joining two complementary halves likewise.
    let res = r(0, 127).join(&r(128, 255));
    assert_eq!(res, WrappedInterval::top(8));
}

#[test]
fn printer_is_oracle_stable() {
    assert_eq!(WrappedInterval::bot().to_string(), "bottom");
    assert_eq!(WrappedInterval::top(8).to_string(), "[-oo,+oo]");
    assert_eq!(r(250, 4).to_string(), "[u:250|s:-6,u:4|s:4]");
    assert_eq!(
        WrappedInterval::singleton(8, 128).to_string(),
        "[u:128|s:-128,u:128|s:-128]"
    );
}

#[test]
fn widening_strategy_selection() {
    let prev = r(0, 3);
    let curr = r(0, 5);
    let empty = JumpSet::new();
    assert_eq!(
        WrappedDomain::new(WideningStrategy::None).widen(&prev, &curr, &empty),
        r(0, 5)
    );
    assert!(WrappedDomain::new(WideningStrategy::Classical)
        .widen(&prev, &curr, &empty)
        .is_top());
    assert_eq!(
        WrappedDomain::new(WideningStrategy::JumpSet).widen(&prev, &curr, &empty),
        r(0, 8)
    );
}
