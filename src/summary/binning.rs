//! Bucket boundaries for numeric attributes
//!
//! Bounds are kept as floored `f64` values so any finite column can be
//! bucketed, however wide its observed span.

use serde::{Deserialize, Serialize};

/// Observed ranges below this get one bucket per integer
pub const NARROW_RANGE_LIMIT: f64 = 12.0;

/// Bucket count for wide ranges
pub const WIDE_BUCKETS: usize = 8;

/// How a numeric attribute's observed range is cut into buckets
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Bucketing {
    /// One bucket per integer in `min..=max`
    Integer { min: f64, max: f64 },
    /// [`WIDE_BUCKETS`] buckets of `width` starting at `min`
    Wide { min: f64, width: f64 },
}

impl Bucketing {
    /// Pick bucketing from the observed values. `None` when there are none.
    ///
    /// Values must be finite.
    pub fn from_values(values: impl IntoIterator<Item = f64>) -> Option<Self> {
        let (lo, hi) = values
            .into_iter()
            .fold(None, |acc: Option<(f64, f64)>, v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })?;

        // `+ 0.0` turns -0.0 into 0.0 so labels never read "-0"
        let min = lo.floor() + 0.0;
        let max = hi.floor() + 0.0;
        let range = max - min;

        if range < NARROW_RANGE_LIMIT {
            Some(Bucketing::Integer { min, max })
        } else {
            // scaled before subtracting: `max - min` can overflow to infinity
            let width = (max / WIDE_BUCKETS as f64 - min / WIDE_BUCKETS as f64).floor();
            Some(Bucketing::Wide { min, width })
        }
    }

    pub fn len(&self) -> usize {
        match *self {
            Bucketing::Integer { min, max } => (max - min) as usize + 1,
            Bucketing::Wide { .. } => WIDE_BUCKETS,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Bucket labels: the integer itself, or `"{lower}-{lower + width - 1}"`
    pub fn labels(&self) -> Vec<String> {
        match *self {
            Bucketing::Integer { min, .. } => (0..self.len()).map(|i| format!("{}", min + i as f64)).collect(),
            Bucketing::Wide { min, width } => (0..WIDE_BUCKETS)
                .map(|i| {
                    let lower = width.mul_add(i as f64, min);
                    format!("{}-{}", lower, lower + width - 1.0)
                })
                .collect(),
        }
    }

    /// Index of the bucket holding `x`
    ///
    /// Wide buckets test `[lower, lower + width]` inclusive at both ends, so a
    /// value on a shared boundary lands in the lower bucket. Values past the
    /// last bucket's nominal end fold into the last bucket.
    pub fn bucket_of(&self, x: f64) -> usize {
        match *self {
            Bucketing::Integer { min, max } => (x.floor().clamp(min, max) - min) as usize,
            Bucketing::Wide { min, width } => (0..WIDE_BUCKETS)
                .find(|&i| x <= width.mul_add((i + 1) as f64, min))
                .unwrap_or(WIDE_BUCKETS - 1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_narrow_range_one_bucket_per_integer() {
        let b = Bucketing::from_values([3.0, 7.0, 14.0]).unwrap();
        assert_eq!(b, Bucketing::Integer { min: 3.0, max: 14.0 });
        assert_eq!(b.len(), 12);
        assert_eq!(b.labels()[0], "3");
        assert_eq!(b.bucket_of(14.0), 11);
    }

    #[test]
    fn test_range_of_twelve_is_wide() {
        let b = Bucketing::from_values([0.0, 12.0]).unwrap();
        assert_eq!(b, Bucketing::Wide { min: 0.0, width: 1.0 });
        assert_eq!(b.len(), 8);
        // remainder folds into the last bucket
        assert_eq!(b.bucket_of(12.0), 7);
    }

    #[test]
    fn test_age_example() {
        let b = Bucketing::from_values([18.0, 70.0]).unwrap();
        assert_eq!(b, Bucketing::Wide { min: 18.0, width: 6.0 });
        let labels = b.labels();
        assert_eq!(labels.len(), 8);
        assert_eq!(labels[0], "18-23");
        assert_eq!(labels[7], "60-65");
    }

    #[test]
    fn test_boundary_ties_go_low() {
        let b = Bucketing::Wide { min: 18.0, width: 6.0 };
        assert_eq!(b.bucket_of(18.0), 0);
        assert_eq!(b.bucket_of(23.5), 0);
        // 24 is the upper end of [18, 24] and the lower end of [24, 30]
        assert_eq!(b.bucket_of(24.0), 0);
        assert_eq!(b.bucket_of(24.5), 1);
        assert_eq!(b.bucket_of(70.0), 7);
    }

    #[test]
    fn test_constant_values() {
        let b = Bucketing::from_values([4.2, 4.2]).unwrap();
        assert_eq!(b.len(), 1);
        assert_eq!(b.labels(), vec!["4"]);
        assert_eq!(b.bucket_of(4.2), 0);
    }

    #[test]
    fn test_negative_zero_label() {
        let b = Bucketing::from_values([-0.0, 0.5]).unwrap();
        assert_eq!(b.labels(), vec!["0"]);
    }

    #[test]
    fn test_span_beyond_i64() {
        let b = Bucketing::from_values([-1e19, 1e19]).unwrap();
        assert_eq!(b, Bucketing::Wide { min: -1e19, width: 2.5e18 });
        assert_eq!(b.len(), 8);
        assert_eq!(b.bucket_of(-1e19), 0);
        assert_eq!(b.bucket_of(1e19), 7);
        assert!(b.labels().iter().all(|l| !l.contains("inf") && !l.contains("NaN")));
    }

    #[test]
    fn test_span_near_f64_max() {
        let b = Bucketing::from_values([-f64::MAX, f64::MAX]).unwrap();
        let Bucketing::Wide { width, .. } = b else {
            panic!("expected wide bucketing");
        };
        assert!(width.is_finite());
        assert_eq!(b.bucket_of(-f64::MAX), 0);
        assert_eq!(b.bucket_of(f64::MAX), 7);
        assert!(b.labels().iter().all(|l| !l.contains("inf")));
    }

    #[test]
    fn test_no_values() {
        assert!(Bucketing::from_values(Vec::<f64>::new()).is_none());
    }
}
