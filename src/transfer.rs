//! Transfer functions: arithmetic, bitwise, and casting.
//!
//! Each transfer function follows the same recipe: handle bottom and top,
//! cut the operands at the pole(s) the operation is sensitive to, compute
//! the operation on each pair of monotone pieces, and combine the partial
//! results with the generalized join. Overflows (a result that would cover
//! the whole circle) degrade to `Top` and bump the manager's counter;
//! contract violations return [`DomainError`].

use log::debug;

use crate::domain::WrappedDomain;
use crate::error::DomainError;
use crate::split::{nsplit, psplit, ssplit};
use crate::wrapint::{mask, Wrapint};
use crate::wrapped::WrappedInterval;
use crate::{bits, split};

/// Arithmetic operations at a common width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithOp {
    Add,
    Sub,
    Mul,
    SDiv,
    UDiv,
    SRem,
    URem,
}

/// Bitwise operations at a common width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BitOp {
    And,
    Or,
    Xor,
    Shl,
    LShr,
    AShr,
}

/// Width-changing (or width-preserving) casts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CastOp {
    Trunc,
    SExt,
    ZExt,
    BitCast,
}

fn check_widths(a: &WrappedInterval, b: &WrappedInterval) -> Result<(), DomainError> {
    if let (Some(w1), Some(w2)) = (a.width(), b.width()) {
        if w1 != w2 {
            return Err(DomainError::WidthMismatch(w1, w2));
        }
    }
    Ok(())
}

impl WrappedDomain {
    /// Transfer function for binary arithmetic.
    ///
    /// Bottom propagates; top propagates except where a zero-range operand
    /// forces a constant. Division and remainder require a divisor interval
    /// that provably excludes zero (note that `Top` contains zero).
    pub fn arith_binop(
        &self,
        op: ArithOp,
        a: &WrappedInterval,
        b: &WrappedInterval,
    ) -> Result<WrappedInterval, DomainError> {
        check_widths(a, b)?;
        if a.is_bot() || b.is_bot() {
            return Ok(WrappedInterval::bot());
        }
        let w = a.width().unwrap();
        let res = match op {
            ArithOp::Add | ArithOp::Sub => {
                if a.is_top() || b.is_top() {
                    WrappedInterval::top(w)
                } else {
                    self.add_sub(op, a, b)
                }
            }
            ArithOp::Mul => {
                if a.is_zero() || b.is_zero() {
                    WrappedInterval::singleton(w, 0)
                } else if a.is_top() || b.is_top() {
                    WrappedInterval::top(w)
                } else {
                    self.mul(a, b)
                }
            }
            ArithOp::SDiv | ArithOp::UDiv | ArithOp::SRem | ArithOp::URem => {
                if b.contains(Wrapint::zero(w)) {
                    return Err(DomainError::DivisionByZero);
                }
                if a.is_zero() {
                    WrappedInterval::singleton(w, 0)
                } else if a.is_top() {
                    WrappedInterval::top(w)
                } else {
                    self.div_rem(op, a, b)
                }
            }
        };
        debug!("{a} {op:?} {b} = {res}");
        Ok(res)
    }

    /// `[a,b] + [c,d] = [a+c, b+d]` and `[a,b] - [c,d] = [a-d, b-c]` unless
    /// the cardinalities sum past the circle, in which case the result would
    /// self-overlap and must be `Top`. Wrapped intervals are closed under
    /// rotation, so no pole split is needed here.
    fn add_sub(&self, op: ArithOp, x: &WrappedInterval, y: &WrappedInterval) -> WrappedInterval {
        let w = x.width().unwrap();
        if x.cardinality() + y.cardinality() > 1u128 << w {
            self.note_overflow();
            return WrappedInterval::top(w);
        }
        let (a, b) = x.bounds().unwrap();
        let (c, d) = y.bounds().unwrap();
        match op {
            ArithOp::Add => {
                WrappedInterval::from_wrapints(a.wrapping_add(c), b.wrapping_add(d))
            }
            ArithOp::Sub => {
                WrappedInterval::from_wrapints(a.wrapping_sub(d), b.wrapping_sub(c))
            }
            _ => unreachable!(),
        }
    }

    /// Multiplication: cut both operands at both poles so every piece is
    /// sign-uniform, take the meet of the unsigned and the signed box
    /// product per pair, and combine with the generalized join.
    fn mul(&self, x: &WrappedInterval, y: &WrappedInterval) -> WrappedInterval {
        let mut partial = Vec::new();
        for p1 in psplit(x) {
            for p2 in psplit(y) {
                let u = self.unsigned_mul_piece(&p1, &p2);
                let s = self.signed_mul_piece(&p1, &p2);
                partial.push(u.meet(&s));
            }
        }
        WrappedInterval::generalized_join(partial)
    }

    /// Unsigned box product of monotone pieces: `[a*c, b*d]`, `Top` when the
    /// true spread `b*d - a*c` exceeds `2^w - 1`.
    fn unsigned_mul_piece(&self, x: &WrappedInterval, y: &WrappedInterval) -> WrappedInterval {
        let (a, b) = x.bounds().unwrap();
        let (c, d) = y.bounds().unwrap();
        let w = a.width();
        let lo = a.raw() as u128 * c.raw() as u128;
        let hi = b.raw() as u128 * d.raw() as u128;
        if hi - lo > mask(w) as u128 {
            self.note_overflow();
            return WrappedInterval::top(w);
        }
        WrappedInterval::from_wrapints(Wrapint::new(w, lo as u64), Wrapint::new(w, hi as u64))
    }

    /// Signed box product of sign-uniform pieces: corner products under the
    /// signed reading, `Top` on the analogous spread overflow.
    fn signed_mul_piece(&self, x: &WrappedInterval, y: &WrappedInterval) -> WrappedInterval {
        let (a, b) = x.bounds().unwrap();
        let (c, d) = y.bounds().unwrap();
        let w = a.width();
        let corners = [
            a.as_signed() as i128 * c.as_signed() as i128,
            a.as_signed() as i128 * d.as_signed() as i128,
            b.as_signed() as i128 * c.as_signed() as i128,
            b.as_signed() as i128 * d.as_signed() as i128,
        ];
        let lo = *corners.iter().min().unwrap();
        let hi = *corners.iter().max().unwrap();
        if hi - lo > mask(w) as i128 {
            self.note_overflow();
            return WrappedInterval::top(w);
        }
        WrappedInterval::from_wrapints(Wrapint::new(w, lo as u64), Wrapint::new(w, hi as u64))
    }

    /// Division and remainder. Signed variants cut at the north pole,
    /// unsigned at the south pole; the per-pair rules below are exact on the
    /// resulting pieces.
    fn div_rem(&self, op: ArithOp, x: &WrappedInterval, y: &WrappedInterval) -> WrappedInterval {
        let signed = matches!(op, ArithOp::SDiv | ArithOp::SRem);
        let split_fn = if signed { nsplit } else { ssplit };
        let mut partial = Vec::new();
        for p1 in split_fn(x) {
            for p2 in split_fn(y).iter().flat_map(|p| split::trim_zero(p)) {
                partial.push(match op {
                    ArithOp::SDiv => self.sdiv_piece(&p1, &p2),
                    ArithOp::UDiv => udiv_piece(&p1, &p2),
                    ArithOp::SRem => srem_piece(&p1, &p2),
                    ArithOp::URem => urem_piece(&p1, &p2),
                    _ => unreachable!(),
                });
            }
        }
        WrappedInterval::generalized_join(partial)
    }

    /// Four-corner signed division; the lone overflow is `MIN_S / -1`.
    fn sdiv_piece(&self, x: &WrappedInterval, y: &WrappedInterval) -> WrappedInterval {
        let (a, b) = x.bounds().unwrap();
        let (c, d) = y.bounds().unwrap();
        let w = a.width();
        let nonzero = |v: Wrapint| -> i128 {
            let s = v.as_signed() as i128;
            if s == 0 { 1 } else { s }
        };
        let corners = [
            a.as_signed() as i128 / nonzero(c),
            a.as_signed() as i128 / nonzero(d),
            b.as_signed() as i128 / nonzero(c),
            b.as_signed() as i128 / nonzero(d),
        ];
        let half = 1i128 << (w - 1);
        if corners.iter().any(|q| *q < -half || *q >= half) {
            self.note_overflow();
            return WrappedInterval::top(w);
        }
        let lo = *corners.iter().min().unwrap();
        let hi = *corners.iter().max().unwrap();
        WrappedInterval::from_wrapints(Wrapint::new(w, lo as u64), Wrapint::new(w, hi as u64))
    }

    /// Transfer function for bitwise operations.
    ///
    /// A top operand of a logical operation is treated as the full unsigned
    /// range, so masking idioms like `x & 0xff` still tighten the result.
    /// Shifts demand a shift interval inside `[0, w)` and degrade to `Top`
    /// when the amount is not a single constant.
    pub fn bit_binop(
        &self,
        op: BitOp,
        a: &WrappedInterval,
        b: &WrappedInterval,
    ) -> Result<WrappedInterval, DomainError> {
        check_widths(a, b)?;
        let w = match a.common_width(b) {
            Some(w) => w,
            None => return Ok(WrappedInterval::bot()),
        };
        let res = match op {
            BitOp::And | BitOp::Or | BitOp::Xor => {
                if a.is_bot() || b.is_bot() {
                    WrappedInterval::bot()
                } else if a.is_top() && b.is_top() {
                    WrappedInterval::top(w)
                } else {
                    self.logical(op, a, b)
                }
            }
            BitOp::Shl | BitOp::LShr | BitOp::AShr => {
                // A bottom operand may become reachable again during
                // narrowing; be conservative rather than empty.
                if a.is_bot() || b.is_bot() {
                    WrappedInterval::top(w)
                } else {
                    self.shift(op, a, b)?
                }
            }
        };
        debug!("{a} {op:?} {b} = {res}");
        Ok(res)
    }

    fn logical(&self, op: BitOp, x: &WrappedInterval, y: &WrappedInterval) -> WrappedInterval {
        let mut partial = Vec::new();
        for p1 in ssplit(x) {
            for p2 in ssplit(y) {
                partial.push(logical_piece(op, &p1, &p2));
            }
        }
        WrappedInterval::generalized_join(partial)
    }

    fn shift(
        &self,
        op: BitOp,
        x: &WrappedInterval,
        shift: &WrappedInterval,
    ) -> Result<WrappedInterval, DomainError> {
        let w = x.width().unwrap();
        if shift.is_top() {
            return Ok(WrappedInterval::top(w));
        }
        let (slb, sub) = shift.bounds().unwrap();
        if slb.as_signed() < 0 || sub.as_signed() < 0 || sub.as_signed() >= w as i64 {
            return Err(DomainError::ShiftOutOfRange { width: w });
        }
        if !shift.is_constant() {
            return Ok(WrappedInterval::top(w));
        }
        let k = slb.raw() as u32;
        if k == 0 {
            return Ok(*x);
        }
        Ok(match op {
            BitOp::Shl => self.shl_const(x, k),
            BitOp::LShr => lshr_const(x, k),
            BitOp::AShr => ashr_const(x, k),
            _ => unreachable!(),
        })
    }

    /// Left shift by a constant. If truncating to the surviving `w-k` bits
    /// preserves both bounds, no information falls off the top and the
    /// bounds shift directly; otherwise the result is every multiple of
    /// `2^k`, i.e. `[0, 1^{w-k}0^k]`.
    fn shl_const(&self, x: &WrappedInterval, k: u32) -> WrappedInterval {
        let w = x.width().unwrap();
        let keep = w - k;
        let fill = WrappedInterval::from_bounds(w, 0, mask(keep) << k);
        if x.cardinality() > 1u128 << keep {
            self.note_overflow();
            return fill;
        }
        let (a, b) = x.bounds().unwrap();
        if !x.crosses_south_pole() && a.raw() <= mask(keep) && b.raw() <= mask(keep) {
            WrappedInterval::from_wrapints(a.shl(k), b.shl(k))
        } else {
            fill
        }
    }

    /// Transfer function for casts. A bottom input casts to `Top`: during
    /// narrowing a previously-unreachable value may be re-evaluated, and the
    /// target width has no empty evidence to stand on.
    pub fn cast(
        &self,
        op: CastOp,
        v: &WrappedInterval,
        target_width: u32,
    ) -> Result<WrappedInterval, DomainError> {
        if let Some(w) = v.width() {
            let bad = match op {
                CastOp::Trunc => target_width >= w,
                CastOp::SExt | CastOp::ZExt => target_width < w,
                CastOp::BitCast => target_width != w,
            };
            if bad {
                return Err(DomainError::BadCastWidth { from: w, to: target_width });
            }
        }
        if v.is_bot() {
            return Ok(WrappedInterval::top(target_width));
        }
        if v.is_top() && op != CastOp::ZExt && op != CastOp::SExt {
            return Ok(WrappedInterval::top(target_width));
        }
        let res = match op {
            CastOp::BitCast => *v,
            CastOp::Trunc => self.trunc(v, target_width),
            CastOp::SExt => {
                let pieces = nsplit(v).into_iter().map(|p| {
                    let (a, b) = p.bounds().unwrap();
                    WrappedInterval::from_wrapints(a.sext(target_width), b.sext(target_width))
                });
                WrappedInterval::generalized_join(pieces.collect::<Vec<_>>())
            }
            CastOp::ZExt => {
                let pieces = ssplit(v).into_iter().map(|p| {
                    let (a, b) = p.bounds().unwrap();
                    WrappedInterval::from_wrapints(a.zext(target_width), b.zext(target_width))
                });
                WrappedInterval::generalized_join(pieces.collect::<Vec<_>>())
            }
        };
        debug!("{op:?} {v} to {target_width} = {res}");
        Ok(res)
    }

    /// Truncation: if more values are denoted than the target circle holds,
    /// the image is everything; otherwise the walk maps onto the smaller
    /// circle without self-overlap and the bounds truncate directly.
    fn trunc(&self, v: &WrappedInterval, target_width: u32) -> WrappedInterval {
        if v.cardinality() > 1u128 << target_width {
            self.note_overflow();
            return WrappedInterval::top(target_width);
        }
        let (a, b) = v.bounds().unwrap();
        WrappedInterval::from_wrapints(a.trunc(target_width), b.trunc(target_width))
    }
}

fn logical_piece(op: BitOp, x: &WrappedInterval, y: &WrappedInterval) -> WrappedInterval {
    let (a, b) = x.bounds().unwrap();
    let (c, d) = y.bounds().unwrap();
    let w = a.width();
    match op {
        BitOp::And => {
            if x.is_zero() || y.is_zero() {
                return WrappedInterval::singleton(w, 0);
            }
            WrappedInterval::from_bounds(
                w,
                bits::min_and(a.raw(), b.raw(), c.raw(), d.raw(), w),
                bits::max_and(a.raw(), b.raw(), c.raw(), d.raw(), w),
            )
        }
        BitOp::Or => {
            if x.is_zero() {
                return *y;
            }
            if y.is_zero() {
                return *x;
            }
            WrappedInterval::from_bounds(
                w,
                bits::min_or(a.raw(), b.raw(), c.raw(), d.raw(), w),
                bits::max_or(a.raw(), b.raw(), c.raw(), d.raw(), w),
            )
        }
        BitOp::Xor => WrappedInterval::from_bounds(
            w,
            bits::min_xor(a.raw(), b.raw(), c.raw(), d.raw(), w),
            bits::max_xor(a.raw(), b.raw(), c.raw(), d.raw(), w),
        ),
        _ => unreachable!(),
    }
}

/// Four-corner unsigned division on south-pole-free pieces.
fn udiv_piece(x: &WrappedInterval, y: &WrappedInterval) -> WrappedInterval {
    let (a, b) = x.bounds().unwrap();
    let (c, d) = y.bounds().unwrap();
    let w = a.width();
    let nonzero = |v: Wrapint| if v.raw() == 0 { 1 } else { v.raw() };
    let corners = [
        a.raw() / nonzero(c),
        a.raw() / nonzero(d),
        b.raw() / nonzero(c),
        b.raw() / nonzero(d),
    ];
    WrappedInterval::from_bounds(
        w,
        *corners.iter().min().unwrap(),
        *corners.iter().max().unwrap(),
    )
}

/// Unsigned remainder on south-pole-free pieces: exact when the dividend
/// lies entirely below the divisor, else bounded by divisor and dividend.
fn urem_piece(x: &WrappedInterval, y: &WrappedInterval) -> WrappedInterval {
    let (a, b) = x.bounds().unwrap();
    let (c, d) = y.bounds().unwrap();
    let w = a.width();
    if b.ult(c) {
        return WrappedInterval::from_wrapints(a, b);
    }
    WrappedInterval::from_bounds(w, 0, b.raw().min(d.raw() - 1))
}

/// Signed remainder on north-pole-free pieces: the result has the dividend's
/// sign and magnitude strictly below the divisor's.
fn srem_piece(x: &WrappedInterval, y: &WrappedInterval) -> WrappedInterval {
    let (a, b) = x.bounds().unwrap();
    let (c, d) = y.bounds().unwrap();
    let w = a.width();
    let divisor_positive = !c.is_msb_set();
    let mag_minus_1: i128 = if divisor_positive {
        d.as_signed() as i128 - 1
    } else {
        -(c.as_signed() as i128) - 1
    };
    let lo: i128 = if a.as_signed() >= 0 { 0 } else { -mag_minus_1 };
    let hi: i128 = if b.as_signed() < 0 { 0 } else { mag_minus_1 };
    WrappedInterval::from_wrapints(Wrapint::new(w, lo as u64), Wrapint::new(w, hi as u64))
}

/// Logical right shift by a constant. A south-crossing operand has members
/// on both sides of the wrap, so only the generic `[0, 0^k1^{w-k}]` is safe.
fn lshr_const(x: &WrappedInterval, k: u32) -> WrappedInterval {
    let w = x.width().unwrap();
    if x.is_top() || x.crosses_south_pole() {
        return WrappedInterval::from_bounds(w, 0, mask(w - k));
    }
    let (a, b) = x.bounds().unwrap();
    WrappedInterval::from_wrapints(a.lshr(k), b.lshr(k))
}

/// Arithmetic right shift by a constant; the north pole plays the role the
/// south pole plays for the logical shift.
fn ashr_const(x: &WrappedInterval, k: u32) -> WrappedInterval {
    let w = x.width().unwrap();
    if x.is_top() || x.crosses_north_pole() {
        return WrappedInterval::from_bounds(w, mask(k) << (w - k), mask(w - k));
    }
    let (a, b) = x.bounds().unwrap();
    WrappedInterval::from_wrapints(a.ashr(k), b.ashr(k))
}
