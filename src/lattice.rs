//! Order, pseudo-join, generalized join, meet, and widening.
//!
//! The wrapped domain is a pre-order, not a lattice: `leq` is not
//! antisymmetric, the binary join is neither associative nor monotone, and
//! there is no least upper bound in general. Every operation here therefore
//! pins an explicit evaluation order: multi-piece combinations go through
//! [`WrappedInterval::generalized_join`], which computes the *pseudo-lub* of
//! a finite set (Fig. 3 of the Navas et al. paper) instead of folding binary
//! joins, and all non-deterministic tie-breaks prefer the earlier operand.

use log::trace;

use crate::split::ssplit;
use crate::wrapint::Wrapint;
use crate::wrapped::WrappedInterval;

/// A finite, immutable set of landmark constants for widening.
///
/// Callers build one jump set per analysed program, holding every integer
/// literal plus `0`, `MIN_S`, `MAX_S` and `MAX_U` at each width of interest,
/// and pass it by shared reference. Constants of a different width than the
/// value being widened are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JumpSet {
    landmarks: Vec<Wrapint>,
}

impl JumpSet {
    /// The empty jump set.
    pub fn new() -> Self {
        JumpSet::default()
    }

    /// Adds a landmark constant.
    pub fn insert(&mut self, c: Wrapint) {
        if !self.landmarks.contains(&c) {
            self.landmarks.push(c);
        }
    }

    /// Adds the four distinguished patterns `0`, `MAX_S`, `MIN_S`, `MAX_U`
    /// at the given width.
    pub fn insert_extremes(&mut self, width: u32) {
        self.insert(Wrapint::min_unsigned(width));
        self.insert(Wrapint::max_signed(width));
        self.insert(Wrapint::min_signed(width));
        self.insert(Wrapint::max_unsigned(width));
    }

    pub fn is_empty(&self) -> bool {
        self.landmarks.is_empty()
    }

    pub fn len(&self) -> usize {
        self.landmarks.len()
    }

    /// The largest landmark `<=_u x` at `x`'s width.
    pub fn largest_le(&self, x: Wrapint) -> Option<Wrapint> {
        self.landmarks
            .iter()
            .copied()
            .filter(|c| c.width() == x.width() && c.ule(x))
            .reduce(Wrapint::umax)
    }

    /// The smallest landmark `>=_u x` at `x`'s width.
    pub fn smallest_ge(&self, x: Wrapint) -> Option<Wrapint> {
        self.landmarks
            .iter()
            .copied()
            .filter(|c| c.width() == x.width() && c.uge(x))
            .reduce(Wrapint::umin)
    }

    /// Iterates over the landmarks.
    pub fn iter(&self) -> impl Iterator<Item = Wrapint> + '_ {
        self.landmarks.iter().copied()
    }
}

impl FromIterator<Wrapint> for JumpSet {
    fn from_iter<I: IntoIterator<Item = Wrapint>>(iter: I) -> Self {
        let mut s = JumpSet::new();
        for c in iter {
            s.insert(c);
        }
        s
    }
}

/// Cardinality of the clockwise walk from `x` to `y` inclusive.
fn wcard(x: Wrapint, y: Wrapint) -> u128 {
    y.wrapping_sub(x).raw() as u128 + 1
}

/// The larger-cardinality interval; ties and double-bottom keep the first.
fn bigger(r1: &WrappedInterval, r2: &WrappedInterval) -> WrappedInterval {
    if r1.is_bot() && !r2.is_bot() {
        return *r2;
    }
    if r2.is_bot() {
        return *r1;
    }
    if r2.cardinality() > r1.cardinality() {
        *r2
    } else {
        *r1
    }
}

/// The clockwise distance from the end of `r1` to the start of `r2`, or
/// bottom when the two touch or overlap.
fn clockwise_gap(r1: &WrappedInterval, r2: &WrappedInterval) -> WrappedInterval {
    let ((_, b), (c, _)) = match (r1.bounds(), r2.bounds()) {
        (Some(x), Some(y)) => (x, y),
        _ => return WrappedInterval::bot(),
    };
    if r2.contains(b) || r1.contains(c) || b.succ() == c {
        return WrappedInterval::bot();
    }
    WrappedInterval::from_wrapints(b.succ(), c.pred())
}

impl WrappedInterval {
    /// The pre-order of the domain: `self` denotes a subset of `other`.
    ///
    /// `s <= t` holds when `s` is bottom, `t` is top, or both of `s`'s bounds
    /// lie in `t` and additionally `s = t` or at least one of `t`'s bounds
    /// falls outside `s`. The extra clause rejects the degenerate situation
    /// of two distinct arcs that mutually contain each other's endpoints.
    /// Note `leq(s,t) && leq(t,s)` does not imply `s = t`.
    pub fn leq(&self, other: &Self) -> bool {
        if self.is_bot() {
            return true;
        }
        if other.is_top() {
            return true;
        }
        if self.is_top() || other.is_bot() {
            return false;
        }
        let (a, b) = self.bounds().unwrap();
        let (c, d) = other.bounds().unwrap();
        other.contains(a)
            && other.contains(b)
            && (self == other || !self.contains(c) || !self.contains(d))
    }

    /// Syntactic equality of canonical values.
    pub fn equal(&self, other: &Self) -> bool {
        self == other
    }

    /// The raw binary pseudo-join: the four-way case analysis on two arcs.
    ///
    /// Containment returns the larger operand; mutual endpoint coverage
    /// returns `Top`; a one-sided overlap returns the union arc; disjoint
    /// arcs connect across the smaller clockwise gap (tie: keep the gap
    /// after `self`, i.e. extend `self` with `other`).
    pub(crate) fn pseudo_join(&self, other: &Self) -> Self {
        if other.leq(self) {
            return *self;
        }
        if self.leq(other) {
            return *other;
        }
        let (a, b) = self.bounds().unwrap();
        let (c, d) = other.bounds().unwrap();
        assert_eq!(a.width(), c.width(), "join of mismatched widths");
        if other.contains(a) && other.contains(b) && self.contains(c) && self.contains(d) {
            return WrappedInterval::top(a.width());
        }
        if self.contains(c) {
            return WrappedInterval::from_wrapints(a, d);
        }
        if other.contains(a) {
            return WrappedInterval::from_wrapints(c, b);
        }
        if wcard(b, c) <= wcard(d, a) {
            WrappedInterval::from_wrapints(a, d)
        } else {
            WrappedInterval::from_wrapints(c, b)
        }
    }

    /// Convex-hull style join: fold the binary pseudo-join over the
    /// south-pole pieces of both operands, left to right. This is the
    /// `extend` step of the generalized join.
    pub(crate) fn hull_join(&self, other: &Self) -> Self {
        let mut acc = WrappedInterval::bot();
        for piece in ssplit(self).into_iter().chain(ssplit(other)) {
            acc = acc.pseudo_join(&piece);
        }
        acc
    }

    /// Pseudo-join of two intervals.
    ///
    /// Joins are mostly taken at phi nodes, where nothing is known about the
    /// signedness of the incoming values, so both operands are first cut at
    /// the south pole; the pieces are then combined with the generalized
    /// join, which is tighter than folding the binary join in any order.
    pub fn join(&self, other: &Self) -> Self {
        if let (Some(w1), Some(w2)) = (self.width(), other.width()) {
            assert_eq!(w1, w2, "join of mismatched widths");
        }
        let mut pieces = ssplit(self);
        pieces.extend(ssplit(other));
        let res = Self::generalized_join(pieces);
        trace!("join({self}, {other}) = {res}");
        res
    }

    /// The pseudo-least-upper-bound of a finite set of intervals.
    ///
    /// Sorts by unsigned lower bound, absorbs every south-pole-crossing
    /// element into a growing hull `f`, tracks the biggest clockwise gap `g`
    /// between the hull and each element in turn, and finally returns the
    /// complement of the bigger of `g` and the complement of `f` — the
    /// tightest arc that covers all inputs while leaving the largest gap
    /// uncovered. Ties break toward the earliest candidate, so the result
    /// is deterministic for a fixed input order.
    pub fn generalized_join<I>(rs: I) -> Self
    where
        I: IntoIterator<Item = WrappedInterval>,
    {
        let mut rs: Vec<WrappedInterval> = rs.into_iter().filter(|r| !r.is_bot()).collect();
        match rs.len() {
            0 => return WrappedInterval::bot(),
            1 => return rs[0],
            _ => {}
        }
        let width = rs[0].width().unwrap();
        assert!(
            rs.iter().all(|r| r.width() == Some(width)),
            "generalized join of mismatched widths"
        );
        rs.sort_by_key(|r| r.lb().unwrap().raw());

        let mut f = WrappedInterval::bot();
        for r in &rs {
            if r.is_top() || r.crosses_south_pole() {
                f = f.hull_join(r);
            }
        }
        let mut g = WrappedInterval::bot();
        for r in &rs {
            let gap = clockwise_gap(&f, r);
            g = bigger(&g, &gap);
            f = f.hull_join(r);
        }
        let uncovered = bigger(&g, &Self::complement_at(width, &f));
        Self::complement_at(width, &uncovered)
    }

    /// The raw binary meet: containment, mutual coverage (keep the
    /// smaller-cardinality operand), one-sided overlap (the bridging arc),
    /// or bottom for disjoint arcs.
    pub(crate) fn wrapped_meet(&self, other: &Self) -> Self {
        if self.leq(other) {
            return *self;
        }
        if other.leq(self) {
            return *other;
        }
        let (a, b) = self.bounds().unwrap();
        let (c, d) = other.bounds().unwrap();
        assert_eq!(a.width(), c.width(), "meet of mismatched widths");
        if other.contains(a) && other.contains(b) && self.contains(c) && self.contains(d) {
            // The true intersection is two arcs; keep the smaller operand.
            return if self.cardinality() <= other.cardinality() {
                *self
            } else {
                *other
            };
        }
        if self.contains(c) {
            return WrappedInterval::from_wrapints(c, b);
        }
        if other.contains(a) {
            return WrappedInterval::from_wrapints(a, d);
        }
        WrappedInterval::bot()
    }

    /// Over-approximation of the intersection.
    ///
    /// Both operands are cut at the south pole, each pair of pieces is met
    /// with the binary case analysis, and the per-pair results are combined
    /// with the generalized join.
    pub fn meet(&self, other: &Self) -> Self {
        if let (Some(w1), Some(w2)) = (self.width(), other.width()) {
            assert_eq!(w1, w2, "meet of mismatched widths");
        }
        let mut partial = Vec::with_capacity(4);
        for p1 in ssplit(self) {
            for p2 in ssplit(other) {
                partial.push(p1.wrapped_meet(&p2));
            }
        }
        let res = Self::generalized_join(partial);
        trace!("meet({self}, {other}) = {res}");
        res
    }

    /// Jump-set widening. Returns a value `>= curr` that stabilises any
    /// ascending chain.
    ///
    /// `self` is the previous iterate. If the new value does not grow, it is
    /// returned unchanged. Otherwise the growing side doubles the previous
    /// cardinality and then snaps outward to the nearest landmark (largest
    /// jump `<=_u curr.lb` on the left, smallest jump `>=_u curr.ub` on the
    /// right). With no landmark on a side, the doubled bound stands; once
    /// doubling can no longer be represented (`|prev| >= 2^{w-1}`) the
    /// result jumps to `Top`, which is what bounds the chain length.
    pub fn widen(&self, curr: &Self, jumps: &JumpSet) -> Self {
        self.widen_reporting(curr, jumps).0
    }

    /// As [`widen`][Self::widen], also reporting a doubling overflow.
    pub(crate) fn widen_reporting(&self, curr: &Self, jumps: &JumpSet) -> (Self, bool) {
        let prev = self;
        if curr.leq(prev) {
            return (*curr, false);
        }
        if prev.is_bot() {
            return (*curr, false);
        }
        if curr.is_top() {
            return (*curr, false);
        }
        let w = prev.width().unwrap();
        assert_eq!(Some(w), curr.width(), "widening of mismatched widths");

        let (u, v) = prev.bounds().unwrap();
        let (x, y) = curr.bounds().unwrap();
        let card_old = prev.cardinality();
        let merged = prev.join(curr);
        let (m_lb, m_ub) = merged.bounds().unwrap();

        let grown_up = prev.leq(curr) && !prev.contains(x) && !prev.contains(y);
        let grown_right = m_lb == u && m_ub == y;
        let grown_left = m_lb == x && m_ub == v;
        if !(grown_up || grown_right || grown_left) {
            // No recognisable growth direction (the operands cover each
            // other's endpoints); the join still covers both iterates.
            return (merged, false);
        }
        if card_old >= 1u128 << (w - 1) {
            return (WrappedInterval::top(w), true);
        }
        let doubled = Wrapint::new(w, 2 * card_old as u64);
        let (tentative_lb, tentative_ub) = if grown_up {
            (x, x.wrapping_add(doubled).umax(y))
        } else if grown_right {
            (u, u.wrapping_add(doubled).umax(y))
        } else {
            (u.wrapping_sub(doubled).umin(x), v)
        };
        let lb = jumps.largest_le(x).unwrap_or(tentative_lb);
        let ub = jumps.smallest_ge(y).unwrap_or(tentative_ub);
        // The growth-case formulas reason in unsigned bound order; when the
        // current value wraps a pole they can land beside it, so the current
        // value is joined back in to keep widen(prev, curr) >= curr.
        (WrappedInterval::from_wrapints(lb, ub).join(curr), false)
    }

    /// Classical Cousot'76-style widening, adapted to the circle: if the new
    /// value is not contained in the previous one, the result snaps to
    /// `Top`. A wrapped interval cannot push a single bound to infinity
    /// without risking a wrap, so any unstable bound gives up the whole
    /// circle.
    pub fn widen_classical(&self, curr: &Self) -> Self {
        if curr.leq(self) {
            return *curr;
        }
        if self.is_bot() {
            return *curr;
        }
        let w = self.width().or_else(|| curr.width()).unwrap();
        let merged = self.join(curr);
        if merged.leq(self) {
            *self
        } else {
            WrappedInterval::top(w)
        }
    }
}
