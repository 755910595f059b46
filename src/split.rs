//! Pole splits.
//!
//! Cutting a wrapped interval at the south pole (`11...1 | 00...0`) or north
//! pole (`01...1 | 10...0`) yields pieces on which the unsigned respectively
//! signed reading is monotone. Every transfer function in this crate is a
//! dispatch over the at most four pieces of [`psplit`].

use crate::wrapint::Wrapint;
use crate::wrapped::WrappedInterval;

/// South-pole split: `[[a,b]]` if the arc does not wrap past `2^w-1 | 0`,
/// else `[[a, 2^w-1], [0, b]]`. Bottom has no pieces; `Top` is one piece
/// (it is monotone under any view via its canonical bounds).
pub fn ssplit(v: &WrappedInterval) -> Vec<WrappedInterval> {
    match v {
        WrappedInterval::Bot => vec![],
        WrappedInterval::Top(_) => vec![*v],
        WrappedInterval::Range { lb, ub } => {
            if ub.ult(*lb) {
                let w = lb.width();
                vec![
                    WrappedInterval::Range { lb: *lb, ub: Wrapint::max_unsigned(w) },
                    WrappedInterval::Range { lb: Wrapint::min_unsigned(w), ub: *ub },
                ]
            } else {
                vec![*v]
            }
        }
    }
}

/// North-pole split: `[[a,b]]` if the arc does not wrap past
/// `2^{w-1}-1 | 2^{w-1}`, else `[[a, MAX_S], [MIN_S, b]]`. `Top` splits into
/// the two signed hemispheres.
pub fn nsplit(v: &WrappedInterval) -> Vec<WrappedInterval> {
    match v {
        WrappedInterval::Bot => vec![],
        WrappedInterval::Top(w) => vec![
            WrappedInterval::Range {
                lb: Wrapint::min_unsigned(*w),
                ub: Wrapint::max_signed(*w),
            },
            WrappedInterval::Range {
                lb: Wrapint::min_signed(*w),
                ub: Wrapint::max_unsigned(*w),
            },
        ],
        WrappedInterval::Range { lb, ub } => {
            if ub.slt(*lb) {
                let w = lb.width();
                vec![
                    WrappedInterval::Range { lb: *lb, ub: Wrapint::max_signed(w) },
                    WrappedInterval::Range { lb: Wrapint::min_signed(w), ub: *ub },
                ]
            } else {
                vec![*v]
            }
        }
    }
}

/// Both splits: north first, then south on each piece. Up to four pieces,
/// each monotone under both the signed and the unsigned view.
pub fn psplit(v: &WrappedInterval) -> Vec<WrappedInterval> {
    let mut res = Vec::with_capacity(4);
    for piece in nsplit(v) {
        res.extend(ssplit(&piece));
    }
    res
}

/// Removes the value 0 from an interval, splitting it if 0 lies strictly
/// inside. Used on divisor pieces. The zero singleton yields no pieces.
pub fn trim_zero(v: &WrappedInterval) -> Vec<WrappedInterval> {
    let (lb, ub) = match v.bounds() {
        None => return vec![],
        Some(b) => b,
    };
    let w = lb.width();
    if v.is_zero() {
        return vec![];
    }
    let zero = Wrapint::zero(w);
    if lb == zero {
        vec![WrappedInterval::from_wrapints(Wrapint::one(w), ub)]
    } else if ub == zero {
        vec![WrappedInterval::from_wrapints(lb, Wrapint::max_unsigned(w))]
    } else if v.contains(zero) {
        vec![
            WrappedInterval::from_wrapints(lb, Wrapint::max_unsigned(w)),
            WrappedInterval::from_wrapints(Wrapint::one(w), ub),
        ]
    } else {
        vec![*v]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gamma(v: &WrappedInterval) -> Vec<u64> {
        (0..=255u64).filter(|e| v.contains_raw(*e)).collect()
    }

    #[test]
    fn test_ssplit() {
        let plain = WrappedInterval::from_bounds(8, 10, 20);
        assert_eq!(ssplit(&plain), vec![plain]);

        let wrapping = WrappedInterval::from_bounds(8, 250, 10);
        assert_eq!(
            ssplit(&wrapping),
            vec![
                WrappedInterval::from_bounds(8, 250, 255),
                WrappedInterval::from_bounds(8, 0, 10),
            ]
        );

        assert_eq!(ssplit(&WrappedInterval::bot()), vec![]);
        assert_eq!(ssplit(&WrappedInterval::top(8)), vec![WrappedInterval::top(8)]);
    }

    #[test]
    fn test_nsplit() {
        let plain = WrappedInterval::from_bounds(8, 10, 20);
        assert_eq!(nsplit(&plain), vec![plain]);

        let wrapping = WrappedInterval::from_bounds(8, 120, 130);
        assert_eq!(
            nsplit(&wrapping),
            vec![
                WrappedInterval::from_bounds(8, 120, 127),
                WrappedInterval::from_bounds(8, 128, 130),
            ]
        );

        assert_eq!(
            nsplit(&WrappedInterval::top(8)),
            vec![
                WrappedInterval::from_bounds(8, 0, 127),
                WrappedInterval::from_bounds(8, 128, 255),
            ]
        );
    }

    #[test]
    fn test_psplit_four_pieces() {
        // [200, 130] passes both poles: south between 255 and 0, north
        // between 127 and 128.
        let v = WrappedInterval::from_bounds(8, 200, 130);
        let pieces = psplit(&v);
        assert_eq!(
            pieces,
            vec![
                WrappedInterval::from_bounds(8, 200, 255),
                WrappedInterval::from_bounds(8, 0, 127),
                WrappedInterval::from_bounds(8, 128, 130),
            ]
        );
    }

    /// The pieces of any split cover exactly the members of the input.
    #[test]
    fn test_split_exactness() {
        let samples = [
            WrappedInterval::bot(),
            WrappedInterval::top(8),
            WrappedInterval::singleton(8, 0),
            WrappedInterval::singleton(8, 128),
            WrappedInterval::from_bounds(8, 10, 20),
            WrappedInterval::from_bounds(8, 250, 10),
            WrappedInterval::from_bounds(8, 120, 130),
            WrappedInterval::from_bounds(8, 200, 130),
            WrappedInterval::from_bounds(8, 128, 127).complement(),
        ];
        for v in &samples {
            for split in [ssplit, nsplit, psplit] {
                let mut members: Vec<u64> = split(v).iter().flat_map(|p| gamma(p)).collect();
                members.sort_unstable();
                members.dedup();
                assert_eq!(members, gamma(v), "split not exact for {v}");
            }
        }
    }

    #[test]
    fn test_trim_zero() {
        assert_eq!(trim_zero(&WrappedInterval::singleton(8, 0)), vec![]);
        assert_eq!(
            trim_zero(&WrappedInterval::from_bounds(8, 0, 10)),
            vec![WrappedInterval::from_bounds(8, 1, 10)]
        );
        assert_eq!(
            trim_zero(&WrappedInterval::from_bounds(8, 250, 0)),
            vec![WrappedInterval::from_bounds(8, 250, 255)]
        );
        assert_eq!(
            trim_zero(&WrappedInterval::from_bounds(8, 250, 10)),
            vec![
                WrappedInterval::from_bounds(8, 250, 255),
                WrappedInterval::from_bounds(8, 1, 10),
            ]
        );
        let away = WrappedInterval::from_bounds(8, 5, 10);
        assert_eq!(trim_zero(&away), vec![away]);
    }
}
