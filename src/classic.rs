//! The classical interval baseline.
//!
//! [`ClassicInterval`] is the textbook interval domain over machine
//! integers: a non-wrapping range `[lb, ub]` read either signed or unsigned
//! (the tag is fixed per value), with `lb <= ub` under that reading. It
//! exists as the precision baseline the wrapped domain is measured against:
//! wherever a program value straddles the unsigned or signed overflow
//! boundary, this domain must give up and answer `Top`, while the wrapped
//! domain keeps a tight arc.
//!
//! The transfer functions mirror the wrapped ones operation for operation
//! so the two domains can be driven side by side by the same engine.

use std::fmt;

use log::debug;

use crate::domain::ClassicDomain;
use crate::error::DomainError;
use crate::guard::{CmpPred, TriBool};
use crate::lattice::JumpSet;
use crate::transfer::{ArithOp, BitOp, CastOp};
use crate::bits;
use crate::wrapint::{mask, Wrapint};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Kind {
    Bot,
    Top,
    Range { lb: Wrapint, ub: Wrapint },
}

/// A non-wrapping signed or unsigned interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClassicInterval {
    width: u32,
    signed: bool,
    kind: Kind,
}

impl ClassicInterval {
    pub fn bot(width: u32, signed: bool) -> Self {
        ClassicInterval { width, signed, kind: Kind::Bot }
    }

    pub fn top(width: u32, signed: bool) -> Self {
        ClassicInterval { width, signed, kind: Kind::Top }
    }

    pub fn singleton(width: u32, signed: bool, n: u64) -> Self {
        let v = Wrapint::new(width, n);
        ClassicInterval { width, signed, kind: Kind::Range { lb: v, ub: v } }
    }

    /// Builds `[lb, ub]`, empty when the bounds are inverted under the
    /// signedness tag, `Top` when they span the whole type.
    pub fn from_bounds(width: u32, signed: bool, lb: u64, ub: u64) -> Self {
        let lb = Wrapint::new(width, lb);
        let ub = Wrapint::new(width, ub);
        Self::from_wrapints(width, signed, lb, ub)
    }

    fn from_wrapints(width: u32, signed: bool, lb: Wrapint, ub: Wrapint) -> Self {
        let ordered = if signed { lb.sle(ub) } else { lb.ule(ub) };
        if !ordered {
            return Self::bot(width, signed);
        }
        if lb == Self::type_min(width, signed) && ub == Self::type_max(width, signed) {
            return Self::top(width, signed);
        }
        ClassicInterval { width, signed, kind: Kind::Range { lb, ub } }
    }

    fn type_min(width: u32, signed: bool) -> Wrapint {
        if signed { Wrapint::min_signed(width) } else { Wrapint::min_unsigned(width) }
    }

    fn type_max(width: u32, signed: bool) -> Wrapint {
        if signed { Wrapint::max_signed(width) } else { Wrapint::max_unsigned(width) }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn is_signed(&self) -> bool {
        self.signed
    }

    pub fn is_bot(&self) -> bool {
        matches!(self.kind, Kind::Bot)
    }

    pub fn is_top(&self) -> bool {
        matches!(self.kind, Kind::Top)
    }

    pub fn is_constant(&self) -> bool {
        matches!(self.kind, Kind::Range { lb, ub } if lb == ub)
    }

    pub fn is_zero(&self) -> bool {
        matches!(self.kind, Kind::Range { lb, ub } if lb == ub && lb.raw() == 0)
    }

    pub fn lb(&self) -> Option<Wrapint> {
        self.bounds().map(|(lb, _)| lb)
    }

    pub fn ub(&self) -> Option<Wrapint> {
        self.bounds().map(|(_, ub)| ub)
    }

    fn bounds(&self) -> Option<(Wrapint, Wrapint)> {
        match self.kind {
            Kind::Bot => None,
            Kind::Top => Some((
                Self::type_min(self.width, self.signed),
                Self::type_max(self.width, self.signed),
            )),
            Kind::Range { lb, ub } => Some((lb, ub)),
        }
    }

    pub fn cardinality(&self) -> u128 {
        match self.kind {
            Kind::Bot => 0,
            Kind::Top => 1u128 << self.width,
            Kind::Range { lb, ub } => ub.wrapping_sub(lb).raw() as u128 + 1,
        }
    }

    pub fn contains(&self, e: Wrapint) -> bool {
        match self.bounds() {
            None => false,
            Some((lb, ub)) => {
                if self.signed {
                    lb.sle(e) && e.sle(ub)
                } else {
                    lb.ule(e) && e.ule(ub)
                }
            }
        }
    }

    fn le_bound(&self, x: Wrapint, y: Wrapint) -> bool {
        if self.signed { x.sle(y) } else { x.ule(y) }
    }

    fn min_bound(&self, x: Wrapint, y: Wrapint) -> Wrapint {
        if self.signed { x.smin(y) } else { x.umin(y) }
    }

    fn max_bound(&self, x: Wrapint, y: Wrapint) -> Wrapint {
        if self.signed { x.smax(y) } else { x.umax(y) }
    }

    fn check_compatible(&self, other: &Self) {
        assert_eq!(self.width, other.width, "classic interval width mismatch");
        assert_eq!(self.signed, other.signed, "classic interval signedness mismatch");
    }

    /// Interval inclusion.
    pub fn leq(&self, other: &Self) -> bool {
        self.check_compatible(other);
        if self.is_bot() {
            return true;
        }
        if other.is_bot() {
            return false;
        }
        let (l1, u1) = self.bounds().unwrap();
        let (l2, u2) = other.bounds().unwrap();
        self.le_bound(l2, l1) && self.le_bound(u1, u2)
    }

    /// Convex hull.
    pub fn join(&self, other: &Self) -> Self {
        self.check_compatible(other);
        if self.is_bot() {
            return *other;
        }
        if other.is_bot() {
            return *self;
        }
        if self.is_top() || other.is_top() {
            return Self::top(self.width, self.signed);
        }
        let (l1, u1) = self.bounds().unwrap();
        let (l2, u2) = other.bounds().unwrap();
        Self::from_wrapints(
            self.width,
            self.signed,
            self.min_bound(l1, l2),
            self.max_bound(u1, u2),
        )
    }

    /// Exact intersection.
    pub fn meet(&self, other: &Self) -> Self {
        self.check_compatible(other);
        if self.is_bot() || other.is_bot() {
            return Self::bot(self.width, self.signed);
        }
        let (l1, u1) = self.bounds().unwrap();
        let (l2, u2) = other.bounds().unwrap();
        Self::from_wrapints(
            self.width,
            self.signed,
            self.max_bound(l1, l2),
            self.min_bound(u1, u2),
        )
    }

    /// Cousot'76 widening. An unstable bound cannot be pushed to just one
    /// infinity — the next iterate may wrap — so it gives up the whole type.
    pub fn widen_cousot(&self, curr: &Self) -> Self {
        self.check_compatible(curr);
        if curr.leq(self) {
            return *curr;
        }
        if self.is_bot() {
            return *curr;
        }
        let (l1, u1) = self.bounds().unwrap();
        let (l2, u2) = curr.bounds().unwrap();
        if self.le_bound(l1, l2) && self.le_bound(u2, u1) {
            *self
        } else {
            Self::top(self.width, self.signed)
        }
    }

    /// Jump-set widening: snap the current bounds outward to the nearest
    /// landmarks. A side with no landmark left to snap to is escaping the
    /// known constants, and the result gives up the whole type.
    pub fn widen_jump(&self, curr: &Self, jumps: &JumpSet) -> Self {
        self.check_compatible(curr);
        if curr.leq(self) {
            return *curr;
        }
        if self.is_bot() {
            return *curr;
        }
        let (l2, u2) = match curr.bounds() {
            Some(b) => b,
            None => return *self,
        };
        match (self.snap_down(l2, jumps), self.snap_up(u2, jumps)) {
            (Some(lo), Some(hi)) => Self::from_wrapints(self.width, self.signed, lo, hi),
            _ => Self::top(self.width, self.signed),
        }
    }

    fn snap_down(&self, x: Wrapint, jumps: &JumpSet) -> Option<Wrapint> {
        let mut best: Option<Wrapint> = None;
        for c in jumps.iter().filter(|c| c.width() == self.width) {
            if self.le_bound(c, x) && best.map_or(true, |b| self.le_bound(b, c)) {
                best = Some(c);
            }
        }
        best
    }

    fn snap_up(&self, x: Wrapint, jumps: &JumpSet) -> Option<Wrapint> {
        let mut best: Option<Wrapint> = None;
        for c in jumps.iter().filter(|c| c.width() == self.width) {
            if self.le_bound(x, c) && best.map_or(true, |b| self.le_bound(c, b)) {
                best = Some(c);
            }
        }
        best
    }
}

impl fmt::Display for ClassicInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            Kind::Bot => write!(f, "bottom"),
            Kind::Top => write!(f, "[-oo,+oo]"),
            Kind::Range { lb, ub } => write!(
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

impl ClassicDomain {
    /// Arithmetic on the baseline. Any bound overflow under the value's
    /// signedness loses the whole interval to `Top`.
    pub fn arith_binop(
        &self,
        op: ArithOp,
        a: &ClassicInterval,
        b: &ClassicInterval,
    ) -> Result<ClassicInterval, DomainError> {
        if a.width() != b.width() {
            return Err(DomainError::WidthMismatch(a.width(), b.width()));
        }
        assert_eq!(a.is_signed(), b.is_signed(), "classic interval signedness mismatch");
        let (w, signed) = (a.width(), a.is_signed());
        if a.is_bot() || b.is_bot() {
            return Ok(ClassicInterval::bot(w, signed));
        }
        let res = match op {
            ArithOp::Add | ArithOp::Sub => {
                if a.is_top() || b.is_top() {
                    ClassicInterval::top(w, signed)
                } else {
                    self.add_sub(op, a, b)
                }
            }
            ArithOp::Mul => {
                if a.is_zero() || b.is_zero() {
                    ClassicInterval::singleton(w, signed, 0)
                } else if a.is_top() || b.is_top() {
                    ClassicInterval::top(w, signed)
                } else {
                    self.mul(a, b)
                }
            }
            ArithOp::SDiv | ArithOp::UDiv | ArithOp::SRem | ArithOp::URem => {
                if b.contains(Wrapint::zero(w)) {
                    return Err(DomainError::DivisionByZero);
                }
                if a.is_zero() {
                    ClassicInterval::singleton(w, signed, 0)
                } else if a.is_top() {
                    ClassicInterval::top(w, signed)
                } else {
                    self.div_rem(op, a, b)
                }
            }
        };
        debug!("classic {a} {op:?} {b} = {res}");
        Ok(res)
    }

    fn add_sub(&self, op: ArithOp, x: &ClassicInterval, y: &ClassicInterval) -> ClassicInterval {
        let (w, signed) = (x.width(), x.is_signed());
        let (a, b) = x.bounds().unwrap();
        let (c, d) = y.bounds().unwrap();
        let (lo, hi, overflow) = match (op, signed) {
            (ArithOp::Add, true) => {
                let (lo, o1) = a.overflowing_sadd(c);
                let (hi, o2) = b.overflowing_sadd(d);
                (lo, hi, o1 || o2)
            }
            (ArithOp::Add, false) => {
                let (lo, o1) = a.overflowing_uadd(c);
                let (hi, o2) = b.overflowing_uadd(d);
                (lo, hi, o1 || o2)
            }
            (ArithOp::Sub, true) => {
                let (lo, o1) = a.overflowing_ssub(d);
                let (hi, o2) = b.overflowing_ssub(c);
                (lo, hi, o1 || o2)
            }
            (ArithOp::Sub, false) => {
                let (lo, o1) = a.overflowing_usub(d);
                let (hi, o2) = b.overflowing_usub(c);
                (lo, hi, o1 || o2)
            }
            _ => unreachable!(),
        };
        if overflow {
            self.note_overflow();
            return ClassicInterval::top(w, signed);
        }
        ClassicInterval::from_wrapints(w, signed, lo, hi)
    }

    fn mul(&self, x: &ClassicInterval, y: &ClassicInterval) -> ClassicInterval {
        let (w, signed) = (x.width(), x.is_signed());
        let (a, b) = x.bounds().unwrap();
        let (c, d) = y.bounds().unwrap();
        let mut overflow = false;
        let mut corners = [Wrapint::zero(w); 4];
        for (i, (p, q)) in [(a, c), (a, d), (b, c), (b, d)].into_iter().enumerate() {
            let (v, o) = if signed { p.overflowing_smul(q) } else { p.overflowing_umul(q) };
            corners[i] = v;
            overflow |= o;
        }
        if overflow {
            self.note_overflow();
            return ClassicInterval::top(w, signed);
        }
        let fold = |f: fn(Wrapint, Wrapint) -> Wrapint| {
            corners[1..].iter().fold(corners[0], |acc, v| f(acc, *v))
        };
        let (lo, hi) = if signed {
            (fold(Wrapint::smin), fold(Wrapint::smax))
        } else {
            (fold(Wrapint::umin), fold(Wrapint::umax))
        };
        ClassicInterval::from_wrapints(w, signed, lo, hi)
    }

    fn div_rem(&self, op: ArithOp, x: &ClassicInterval, y: &ClassicInterval) -> ClassicInterval {
        let (w, signed) = (x.width(), x.is_signed());
        let (a, b) = x.bounds().unwrap();
        let (c, d) = y.bounds().unwrap();
        match op {
            ArithOp::UDiv => {
                let corners = [
                    a.checked_udiv(c),
                    a.checked_udiv(d),
                    b.checked_udiv(c),
                    b.checked_udiv(d),
                ];
                let vals: Vec<Wrapint> = corners.into_iter().flatten().collect();
                let lo = vals.iter().copied().reduce(Wrapint::umin).unwrap();
                let hi = vals.iter().copied().reduce(Wrapint::umax).unwrap();
                ClassicInterval::from_wrapints(w, signed, lo, hi)
            }
            ArithOp::SDiv => {
                let half = 1i128 << (w - 1);
                let mut lo = i128::MAX;
                let mut hi = i128::MIN;
                for (p, q) in [(a, c), (a, d), (b, c), (b, d)] {
                    let quotient = p.as_signed() as i128 / q.as_signed() as i128;
                    lo = lo.min(quotient);
                    hi = hi.max(quotient);
                }
                if lo < -half || hi >= half {
                    self.note_overflow();
                    return ClassicInterval::top(w, signed);
                }
                ClassicInterval::from_wrapints(
                    w,
                    signed,
                    Wrapint::new(w, lo as u64),
                    Wrapint::new(w, hi as u64),
                )
            }
            ArithOp::URem => {
                // Remainder is not monotone in its bounds; stay below the
                // divisor and the dividend.
                if b.ult(c) {
                    return ClassicInterval::from_wrapints(w, signed, a, b);
                }
                ClassicInterval::from_bounds(w, signed, 0, b.raw().min(d.raw() - 1))
            }
            ArithOp::SRem => {
                let divisor_positive = !c.is_msb_set();
                let mag_minus_1: i128 = if divisor_positive {
                    d.as_signed() as i128 - 1
                } else {
                    -(c.as_signed() as i128) - 1
                };
                let lo: i128 = if a.as_signed() >= 0 { 0 } else { -mag_minus_1 };
                let hi: i128 = if b.as_signed() < 0 { 0 } else { mag_minus_1 };
                ClassicInterval::from_wrapints(
                    w,
                    signed,
                    Wrapint::new(w, lo as u64),
                    Wrapint::new(w, hi as u64),
                )
            }
            _ => unreachable!(),
        }
    }

    /// Bitwise operations on the baseline. Logical operations on signed
    /// values that straddle zero are conservatively `Top` (the bound scans
    /// need an unsigned-ordered box); `or` recovers precision through the
    /// sign-case table.
    pub fn bit_binop(
        &self,
        op: BitOp,
        a: &ClassicInterval,
        b: &ClassicInterval,
    ) -> Result<ClassicInterval, DomainError> {
        if a.width() != b.width() {
            return Err(DomainError::WidthMismatch(a.width(), b.width()));
        }
        assert_eq!(a.is_signed(), b.is_signed(), "classic interval signedness mismatch");
        let (w, signed) = (a.width(), a.is_signed());
        let res = match op {
            BitOp::And | BitOp::Or | BitOp::Xor => {
                if a.is_bot() || b.is_bot() || a.is_top() || b.is_top() {
                    ClassicInterval::top(w, signed)
                } else {
                    self.logical(op, a, b)
                }
            }
            BitOp::Shl | BitOp::LShr | BitOp::AShr => {
                if a.is_bot() || b.is_bot() || a.is_top() {
                    ClassicInterval::top(w, signed)
                } else {
                    self.shift(op, a, b)?
                }
            }
        };
        debug!("classic {a} {op:?} {b} = {res}");
        Ok(res)
    }

    fn logical(&self, op: BitOp, x: &ClassicInterval, y: &ClassicInterval) -> ClassicInterval {
        let (w, signed) = (x.width(), x.is_signed());
        if op == BitOp::And && (x.is_zero() || y.is_zero()) {
            return ClassicInterval::singleton(w, signed, 0);
        }
        if op == BitOp::Or {
            if x.is_zero() {
                return *y;
            }
            if y.is_zero() {
                return *x;
            }
        }
        let (a, b) = x.bounds().unwrap();
        let (c, d) = y.bounds().unwrap();
        if signed {
            if op == BitOp::Or {
                return self.signed_or(x, y);
            }
            // The scans need unsigned-ordered boxes; mixed-sign operands
            // would hand them wrapped bounds.
            if a.is_msb_set() != b.is_msb_set() || c.is_msb_set() != d.is_msb_set() {
                return ClassicInterval::top(w, signed);
            }
        }
        let (lo, hi) = match op {
            BitOp::And => (
                bits::min_and(a.raw(), b.raw(), c.raw(), d.raw(), w),
                bits::max_and(a.raw(), b.raw(), c.raw(), d.raw(), w),
            ),
            BitOp::Or => (
                bits::min_or(a.raw(), b.raw(), c.raw(), d.raw(), w),
                bits::max_or(a.raw(), b.raw(), c.raw(), d.raw(), w),
            ),
            BitOp::Xor => (
                bits::min_xor(a.raw(), b.raw(), c.raw(), d.raw(), w),
                bits::max_xor(a.raw(), b.raw(), c.raw(), d.raw(), w),
            ),
            _ => unreachable!(),
        };
        if signed {
            // Same-sign boxes keep the scan result signed-ordered only when
            // both operands sit in one hemisphere each; re-check.
            let lo = Wrapint::new(w, lo);
            let hi = Wrapint::new(w, hi);
            if lo.sle(hi) {
                return ClassicInterval::from_wrapints(w, signed, lo, hi);
            }
            return ClassicInterval::top(w, signed);
        }
        ClassicInterval::from_bounds(w, signed, lo, hi)
    }

    /// Warren's nine sign cases for signed `or`, keyed on the sign bits of
    /// the four bounds.
    fn signed_or(&self, x: &ClassicInterval, y: &ClassicInterval) -> ClassicInterval {
        let (w, signed) = (x.width(), x.is_signed());
        let (a, b) = x.bounds().unwrap();
        let (c, d) = y.bounds().unwrap();
        let (ar, br, cr, dr) = (a.raw(), b.raw(), c.raw(), d.raw());
        let all_ones = mask(w);
        let case = (u8::from(!a.is_msb_set()) << 3)
            | (u8::from(!b.is_msb_set()) << 2)
            | (u8::from(!c.is_msb_set()) << 1)
            | u8::from(!d.is_msb_set());
        let (lo, hi) = match case {
            0b0000 | 0b0011 | 0b1100 | 0b1111 => (
                bits::min_or(ar, br, cr, dr, w),
                bits::max_or(ar, br, cr, dr, w),
            ),
            0b0001 => (ar, all_ones),
            0b0100 => (cr, all_ones),
            0b0101 => (
                if a.slt(c) { ar } else { cr },
                bits::max_or(0, br, 0, dr, w),
            ),
            0b0111 => (
                bits::min_or(ar, all_ones, cr, dr, w),
                bits::max_or(0, br, cr, dr, w),
            ),
            0b1101 => (
                bits::min_or(ar, br, cr, all_ones, w),
                bits::max_or(ar, br, 0, dr, w),
            ),
            _ => return ClassicInterval::top(w, signed),
        };
        ClassicInterval::from_bounds(w, signed, lo, hi)
    }

    fn shift(
        &self,
        op: BitOp,
        x: &ClassicInterval,
        shift: &ClassicInterval,
    ) -> Result<ClassicInterval, DomainError> {
        let (w, signed) = (x.width(), x.is_signed());
        if shift.is_top() {
            return Ok(ClassicInterval::top(w, signed));
        }
        let (slb, sub) = shift.bounds().unwrap();
        if slb.as_signed() < 0 || sub.as_signed() < 0 || sub.as_signed() >= w as i64 {
            return Err(DomainError::ShiftOutOfRange { width: w });
        }
        if !shift.is_constant() {
            return Ok(ClassicInterval::top(w, signed));
        }
        let k = slb.raw() as u32;
        if k == 0 {
            return Ok(*x);
        }
        let (a, b) = x.bounds().unwrap();
        Ok(match op {
            BitOp::Shl => {
                let (lo, o1) = if signed { a.overflowing_sshl(k) } else { a.overflowing_ushl(k) };
                let (hi, o2) = if signed { b.overflowing_sshl(k) } else { b.overflowing_ushl(k) };
                if o1 || o2 {
                    self.note_overflow();
                    ClassicInterval::top(w, signed)
                } else {
                    ClassicInterval::from_wrapints(w, signed, lo, hi)
                }
            }
            BitOp::LShr => {
                if signed && a.is_msb_set() != b.is_msb_set() {
                    // Logical shift tears a mixed-sign interval apart.
                    ClassicInterval::from_bounds(w, signed, 0, mask(w - k))
                } else {
                    // Hemisphere-uniform bounds are raw-ordered, and the
                    // shift is monotone on raw patterns.
                    ClassicInterval::from_wrapints(w, signed, a.lshr(k), b.lshr(k))
                }
            }
            BitOp::AShr => ClassicInterval::from_wrapints(w, signed, a.ashr(k), b.ashr(k)),
            _ => unreachable!(),
        })
    }

    /// Casts on the baseline.
    pub fn cast(
        &self,
        op: CastOp,
        v: &ClassicInterval,
        target_width: u32,
    ) -> Result<ClassicInterval, DomainError> {
        let w = v.width();
        let bad = match op {
            CastOp::Trunc => target_width >= w,
            CastOp::SExt | CastOp::ZExt => target_width < w,
            CastOp::BitCast => target_width != w,
        };
        if bad {
            return Err(DomainError::BadCastWidth { from: w, to: target_width });
        }
        let signed = v.is_signed();
        if v.is_bot() || v.is_top() {
            return Ok(ClassicInterval::top(target_width, signed));
        }
        let (a, b) = v.bounds().unwrap();
        let res = match op {
            CastOp::BitCast => *v,
            CastOp::Trunc => {
                let fits = if signed {
                    let lo = Wrapint::min_signed(target_width).sext(w);
                    let hi = Wrapint::max_signed(target_width).sext(w);
                    lo.sle(a) && b.sle(hi)
                } else {
                    b.ule(Wrapint::max_unsigned(target_width).zext(w))
                };
                if !fits {
                    self.note_overflow();
                    ClassicInterval::top(target_width, signed)
                } else {
                    ClassicInterval::from_wrapints(
                        target_width,
                        signed,
                        a.trunc(target_width),
                        b.trunc(target_width),
                    )
                }
            }
            CastOp::SExt => ClassicInterval::from_wrapints(
                target_width,
                signed,
                a.sext(target_width),
                b.sext(target_width),
            ),
            CastOp::ZExt => ClassicInterval::from_wrapints(
                target_width,
                signed,
                a.zext(target_width),
                b.zext(target_width),
            ),
        };
        Ok(res)
    }

    /// Three-valued guard evaluation; requires the predicate's signedness to
    /// match the values'.
    pub fn compare(
        &self,
        pred: CmpPred,
        a: &ClassicInterval,
        b: &ClassicInterval,
    ) -> Result<TriBool, DomainError> {
        if a.width() != b.width() {
            return Err(DomainError::WidthMismatch(a.width(), b.width()));
        }
        if a.is_bot() || b.is_bot() {
            return Ok(TriBool::Maybe);
        }
        let may_true = classic_may_hold(pred, a, b);
        let may_false = classic_may_hold(pred.negation(), a, b);
        Ok(match (may_true, may_false) {
            (true, true) | (false, false) => TriBool::Maybe,
            (true, false) => TriBool::True,
            (false, true) => TriBool::False,
        })
    }

    /// Classical sigma-node refinement: intersect with the half-line the
    /// predicate induces, or with the other range directly.
    pub fn filter_sigma(
        &self,
        pred: CmpPred,
        refined: &ClassicInterval,
        other: &ClassicInterval,
    ) -> Result<ClassicInterval, DomainError> {
        if refined.width() != other.width() {
            return Err(DomainError::WidthMismatch(refined.width(), other.width()));
        }
        let (w, signed) = (refined.width(), refined.is_signed());
        if refined.is_bot() || refined.is_constant() {
            return Ok(*refined);
        }
        if other.is_bot() {
            return Ok(*refined);
        }
        let (a, b) = refined.bounds().unwrap();
        let (c, d) = other.bounds().unwrap();
        let typ_min = ClassicInterval::type_min(w, signed);
        let typ_max = ClassicInterval::type_max(w, signed);
        let meet_or_keep = |half: ClassicInterval| {
            let m = refined.meet(&half);
            if m.is_bot() { *refined } else { m }
        };
        let res = match pred {
            CmpPred::Eq => refined.meet(other),
            CmpPred::Ne => {
                if other.is_constant() {
                    let k = c;
                    let lb = if a == k { a.succ() } else { a };
                    let ub = if b == k { b.pred() } else { b };
                    ClassicInterval::from_wrapints(w, signed, lb, ub)
                } else {
                    *refined
                }
            }
            CmpPred::Ult | CmpPred::Slt => {
                let ub = if d == typ_min { d } else { d.pred() };
                meet_or_keep(ClassicInterval::from_wrapints(w, signed, typ_min, ub))
            }
            CmpPred::Ule | CmpPred::Sle => {
                meet_or_keep(ClassicInterval::from_wrapints(w, signed, typ_min, d))
            }
            CmpPred::Ugt | CmpPred::Sgt => {
                let lb = if c == typ_max { c } else { c.succ() };
                meet_or_keep(ClassicInterval::from_wrapints(w, signed, lb, typ_max))
            }
            CmpPred::Uge | CmpPred::Sge => {
                meet_or_keep(ClassicInterval::from_wrapints(w, signed, c, typ_max))
            }
        };
        Ok(res)
    }
}

fn classic_may_hold(pred: CmpPred, a: &ClassicInterval, b: &ClassicInterval) -> bool {
    let (l1, u1) = a.bounds().unwrap();
    let (l2, u2) = b.bounds().unwrap();
    match pred {
        CmpPred::Eq => !a.meet(b).is_bot(),
        CmpPred::Ne => !(a.is_constant() && b.is_constant() && l1 == l2),
        CmpPred::Ult => l1.ult(u2),
        CmpPred::Ule => l1.ule(u2),
        CmpPred::Ugt => l2.ult(u1),
        CmpPred::Uge => l2.ule(u1),
        CmpPred::Slt => l1.slt(u2),
        CmpPred::Sle => l1.sle(u2),
        CmpPred::Sgt => l2.slt(u1),
        CmpPred::Sge => l2.sle(u1),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::WideningStrategy;
    use crate::domain::WrappedDomain;

    fn d() -> ClassicDomain {
        ClassicDomain::new(WideningStrategy::Classical, false)
    }

    fn ur(lb: u64, ub: u64) -> ClassicInterval {
        ClassicInterval::from_bounds(8, false, lb, ub)
    }

    fn sr(lb: i64, ub: i64) -> ClassicInterval {
        ClassicInterval::from_bounds(8, true, lb as u64, ub as u64)
    }

    #[test]
    fn test_construction() {
        assert!(ClassicInterval::from_bounds(8, false, 10, 5).is_bot());
        assert!(ClassicInterval::from_bounds(8, false, 0, 255).is_top());
        assert!(ClassicInterval::from_bounds(8, true, 128, 127).is_top());
        assert!(sr(-5, 5).contains(Wrapint::new(8, 0)));
        assert!(!sr(-5, 5).contains(Wrapint::new(8, 100)));
        assert_eq!(sr(-5, 5).cardinality(), 11);
    }

    #[test]
    fn test_lattice_ops() {
        assert_eq!(ur(0, 10).join(&ur(5, 20)), ur(0, 20));
        assert_eq!(ur(0, 10).meet(&ur(5, 20)), ur(5, 10));
        assert!(ur(0, 10).meet(&ur(20, 30)).is_bot());
        assert!(ur(5, 10).leq(&ur(0, 20)));
        assert_eq!(sr(-10, 0).join(&sr(-2, 5)), sr(-10, 5));
    }

    #[test]
    fn test_add_overflow_goes_top() {
        let dom = d();
        // The wrap-around add the wrapped domain keeps precise.
        let res = dom.arith_binop(ArithOp::Add, &ur(200, 250), &ur(100, 110)).unwrap();
        assert!(res.is_top());
        assert_eq!(dom.overflow_count(), 1);
        // In range, precise.
        let res = dom.arith_binop(ArithOp::Add, &ur(10, 20), &ur(1, 2)).unwrap();
        assert_eq!(res, ur(11, 22));
    }

    #[test]
    fn test_signed_arith() {
        let dom = d();
        let res = dom.arith_binop(ArithOp::Add, &sr(-10, 10), &sr(-5, 5)).unwrap();
        assert_eq!(res, sr(-15, 15));
        let res = dom.arith_binop(ArithOp::Mul, &sr(-3, 2), &sr(4, 5)).unwrap();
        assert_eq!(res, sr(-15, 10));
        let res = dom.arith_binop(ArithOp::SDiv, &sr(-20, 20), &sr(2, 4)).unwrap();
        assert_eq!(res, sr(-10, 10));
    }

    #[test]
    fn test_baseline_vs_wrapped_precision() {
        // The motivating comparison: a south-pole-wrapping addition.
        let classic = d();
        let wrapped = WrappedDomain::default();
        let c = classic.arith_binop(ArithOp::Add, &ur(200, 250), &ur(100, 110)).unwrap();
        let w = wrapped
            .arith_binop(
                ArithOp::Add,
                &crate::wrapped::WrappedInterval::from_bounds(8, 200, 250),
                &crate::wrapped::WrappedInterval::from_bounds(8, 100, 110),
            )
            .unwrap();
        assert!(c.is_top());
        assert_eq!(w.cardinality(), 61);
    }

    #[test]
    fn test_rem() {
        let dom = d();
        let res = dom.arith_binop(ArithOp::URem, &ur(0, 200), &ur(10, 10)).unwrap();
        assert_eq!(res, ur(0, 9));
        let res = dom.arith_binop(ArithOp::SRem, &sr(-6, -1), &sr(3, 3)).unwrap();
        assert_eq!(res, sr(-2, 0));
        assert_eq!(
            dom.arith_binop(ArithOp::UDiv, &ur(1, 2), &ur(0, 3)),
            Err(DomainError::DivisionByZero)
        );
    }

    #[test]
    fn test_bitwise() {
        let dom = d();
        let res = dom.bit_binop(BitOp::And, &ur(0, 255), &ur(0x0f, 0x0f)).unwrap();
        assert!(res.is_top()); // baseline cannot tighten top operands
        let res = dom.bit_binop(BitOp::And, &ur(0, 200), &ur(0x0f, 0x0f)).unwrap();
        assert_eq!(res, ur(0, 0x0f));
        // [-4,-1] | [1,2]: the sign bit survives, low bits fill in.
        let res = dom.bit_binop(BitOp::Or, &sr(-4, -1), &sr(1, 2)).unwrap();
        assert_eq!(res, sr(-3, -1));
    }

    #[test]
    fn test_shifts() {
        let dom = d();
        let k = ClassicInterval::singleton(8, false, 2);
        assert_eq!(dom.bit_binop(BitOp::Shl, &ur(1, 8), &k).unwrap(), ur(4, 32));
        assert_eq!(dom.bit_binop(BitOp::LShr, &ur(16, 64), &k).unwrap(), ur(4, 16));
        let ks = ClassicInterval::singleton(8, true, 2);
        assert_eq!(
            dom.bit_binop(BitOp::AShr, &sr(-16, -4), &ks).unwrap(),
            sr(-4, -1)
        );
        let over = dom.bit_binop(BitOp::Shl, &ur(64, 65), &k).unwrap();
        assert!(over.is_top());
    }

    #[test]
    fn test_casts() {
        let dom = d();
        assert_eq!(
            dom.cast(CastOp::ZExt, &ur(10, 20), 16).unwrap(),
            ClassicInterval::from_bounds(16, false, 10, 20)
        );
        assert_eq!(
            dom.cast(CastOp::SExt, &sr(-5, 5), 16).unwrap(),
            ClassicInterval::from_bounds(16, true, 0xfffb, 5)
        );
        let res = dom.cast(CastOp::Trunc, &ClassicInterval::from_bounds(16, false, 0, 300), 8).unwrap();
        assert!(res.is_top());
        let res = dom.cast(CastOp::Trunc, &ClassicInterval::from_bounds(16, false, 0, 200), 8).unwrap();
        assert_eq!(res, ur(0, 200));
    }

    #[test]
    fn test_widening() {
        let prev = ur(0, 10);
        let grown = ur(0, 12);
        assert!(prev.widen_cousot(&grown).is_top());
        assert_eq!(prev.widen_cousot(&ur(2, 8)), ur(2, 8));

        let jumps: JumpSet = [Wrapint::new(8, 0), Wrapint::new(8, 100)]
            .into_iter()
            .collect();
        assert_eq!(prev.widen_jump(&grown, &jumps), ur(0, 100));
        // Without a landmark above, the bound escapes to the extreme.
        let empty = JumpSet::new();
        assert!(prev.widen_jump(&grown, &empty).is_top());
    }

    #[test]
    fn test_compare_and_filter() {
        let dom = d();
        assert_eq!(
            dom.compare(CmpPred::Slt, &sr(-10, -1), &sr(0, 5)).unwrap(),
            TriBool::True
        );
        assert_eq!(
            dom.compare(CmpPred::Ult, &ur(20, 30), &ur(0, 10)).unwrap(),
            TriBool::False
        );
        let res = dom
            .filter_sigma(CmpPred::Slt, &sr(-10, 10), &ClassicInterval::singleton(8, true, 5))
            .unwrap();
        assert_eq!(res, sr(-10, 4));
        let res = dom
            .filter_sigma(CmpPred::Uge, &ur(0, 100), &ur(20, 30))
            .unwrap();
        assert_eq!(res, ur(20, 100));
    }
}
