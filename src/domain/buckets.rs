//! Range-to-bucket mapping.
//!
//! Bucket indices are absolute (`floor(value / width)`), not relative to
//! the market's `min_value`: the distribution is keyed by absolute index.

use serde::{Deserialize, Serialize};

use super::error::PricingError;

/// Inclusive span of absolute bucket indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BucketRange {
    pub start: i64,
    pub end: i64,
}

impl BucketRange {
    /// Whether `bucket` falls inside the span.
    pub fn contains(&self, bucket: i64) -> bool {
        bucket >= self.start && bucket <= self.end
    }

    /// Number of buckets in the span.
    pub fn len(&self) -> u64 {
        self.end.abs_diff(self.start) + 1
    }

    /// A mapped span always holds at least one bucket.
    pub fn is_empty(&self) -> bool {
        false
    }
}

impl std::fmt::Display for BucketRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}..={}]", self.start, self.end)
    }
}

/// Map the value range `[range_min, range_max)` onto bucket indices.
///
/// `start = floor(range_min / width)`, `end = floor((range_max - 1) / width)`.
/// A range narrower than one bucket still yields a single-bucket span.
///
/// # Errors
/// `InvalidInput` when `range_min >= range_max` or `bucket_width <= 0`.
pub fn map_range_to_buckets(
    range_min: i64,
    range_max: i64,
    bucket_width: i64,
) -> Result<BucketRange, PricingError> {
    if bucket_width <= 0 {
        return Err(PricingError::invalid(format!(
            "bucket width must be positive, got {bucket_width}"
        )));
    }
    if range_min >= range_max {
        return Err(PricingError::invalid(format!(
            "range min {range_min} must be below range max {range_max}"
        )));
    }

    // range_min < range_max, so range_max - 1 cannot underflow
    let start = range_min.div_euclid(bucket_width);
    let end = (range_max - 1).div_euclid(bucket_width);

    Ok(BucketRange { start, end })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_bucket() {
        let r = map_range_to_buckets(100, 200, 100).unwrap();
        assert_eq!(r, BucketRange { start: 1, end: 1 });
        assert_eq!(r.len(), 1);
    }

    #[test]
    fn test_multi_bucket() {
        let r = map_range_to_buckets(500, 1_000, 100).unwrap();
        assert_eq!(r, BucketRange { start: 5, end: 9 });
        assert_eq!(r.len(), 5);
        assert!(r.contains(5) && r.contains(9));
        assert!(!r.contains(10));
    }

    #[test]
    fn test_narrow_range_inside_one_bucket() {
        let r = map_range_to_buckets(510, 520, 100).unwrap();
        assert_eq!(r, BucketRange { start: 5, end: 5 });
    }

    #[test]
    fn test_unaligned_range_spans_partial_buckets() {
        let r = map_range_to_buckets(150, 251, 100).unwrap();
        assert_eq!(r, BucketRange { start: 1, end: 2 });
    }

    #[test]
    fn test_indices_are_absolute_for_negative_values() {
        let r = map_range_to_buckets(-150, -50, 100).unwrap();
        assert_eq!(r, BucketRange { start: -2, end: -1 });
    }

    #[test]
    fn test_rejects_inverted_range() {
        assert!(matches!(
            map_range_to_buckets(200, 200, 100),
            Err(PricingError::InvalidInput(_))
        ));
        assert!(map_range_to_buckets(300, 200, 100).is_err());
    }

    #[test]
    fn test_rejects_non_positive_width() {
        assert!(map_range_to_buckets(0, 100, 0).is_err());
        assert!(map_range_to_buckets(0, 100, -5).is_err());
    }
}
