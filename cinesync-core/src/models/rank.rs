use serde::{Deserialize, Serialize};

/// Numeric privilege level, compared with `>=` against thresholds.
///
/// Fractional values are meaningful: a threshold may sit strictly between
/// integer ranks (e.g. 4.5 for "leader-or-above but below moderator").
/// Negative thresholds are valid and mean "everyone, including anonymous".
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Rank(pub f64);

impl Rank {
    /// Threshold that no rank satisfies.
    pub const UNATTAINABLE: Self = Self(f64::INFINITY);

    #[must_use]
    pub const fn new(value: f64) -> Self {
        Self(value)
    }

    /// The comparison rule used everywhere: `self >= threshold`.
    #[must_use]
    pub fn at_least(self, threshold: Self) -> bool {
        self.0 >= threshold.0
    }
}

impl From<f64> for Rank {
    fn from(value: f64) -> Self {
        Self(value)
    }
}

impl std::fmt::Display for Rank {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_at_least_is_gte() {
        assert!(Rank(5.0).at_least(Rank(5.0)));
        assert!(Rank(5.0).at_least(Rank(4.5)));
        assert!(!Rank(4.0).at_least(Rank(4.5)));
    }

    #[test]
    fn test_fractional_thresholds() {
        // 4.5 sits strictly between rank 4 and rank 5
        assert!(!Rank(4.0).at_least(Rank(4.5)));
        assert!(Rank(5.0).at_least(Rank(4.5)));
    }

    #[test]
    fn test_negative_thresholds() {
        assert!(Rank(0.0).at_least(Rank(-1.0)));
    }

    #[test]
    fn test_unattainable() {
        assert!(!Rank(f64::MAX).at_least(Rank::UNATTAINABLE));
    }

    #[test]
    fn test_nan_fails_closed() {
        assert!(!Rank(f64::NAN).at_least(Rank(0.0)));
        assert!(!Rank(0.0).at_least(Rank(f64::NAN)));
    }
}
