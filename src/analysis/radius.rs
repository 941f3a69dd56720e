//! Maps aggregate counts to symbol radii.

use serde::{Deserialize, Serialize};

/// Percentile clipped power-curve scaling of counts onto `[min_radius, max_radius]`.
///
/// The upper reference value is the count at the given percentile (80th by default)
/// rather than the maximum, so one extreme station does not squash every other
/// symbol to the minimum size. Counts above that reference produce radii slightly
/// larger than `max_radius`; that overflow is left as is.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RadiusScaler {
    pub min_radius: f64,
    pub max_radius: f64,
    pub exponent: f64,
    pub percentile: f64,
}

impl Default for RadiusScaler {
    fn default() -> Self {
        Self {
            min_radius: 2.0,
            max_radius: 7.0,
            exponent: 1.2,
            percentile: 0.8,
        }
    }
}

/// The reference values derived from one set of counts.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RadiusScale {
    scaler: RadiusScaler,
    min: u64,
    effective_max: u64,
}

impl RadiusScaler {
    /// Derives the scale from every station's count.
    ///
    /// `effective_max` is `sorted[floor(percentile * n)]`; when that is `0` the true
    /// maximum is used instead.
    pub fn fit(&self, counts: &[u64]) -> RadiusScale {
        let mut sorted = counts.to_vec();
        sorted.sort_unstable();

        let min = sorted.first().copied().unwrap_or(0);
        let max = sorted.last().copied().unwrap_or(0);
        let index = (self.percentile * sorted.len() as f64).floor() as usize;
        let effective_max = match sorted.get(index) {
            Some(&value) if value != 0 => value,
            _ => max,
        };

        RadiusScale {
            scaler: *self,
            min,
            effective_max,
        }
    }
}

impl RadiusScale {
    pub fn min(&self) -> u64 {
        self.min
    }

    pub fn effective_max(&self) -> u64 {
        self.effective_max
    }

    /// Radius of the symbol for `count`.
    ///
    /// # Examples
    ///
    /// ```
    /// use velostat::RadiusScaler;
    ///
    /// let scale = RadiusScaler::default().fit(&[0, 10, 20, 30, 40]);
    /// assert_eq!(scale.radius(0), 2.0);
    /// assert_eq!(scale.radius(40), 7.0);
    /// ```
    pub fn radius(&self, count: u64) -> f64 {
        let RadiusScaler {
            min_radius,
            max_radius,
            exponent,
            ..
        } = self.scaler;
        if self.effective_max <= self.min {
            return min_radius;
        }
        let normalized = count.saturating_sub(self.min) as f64 / (self.effective_max - self.min) as f64;
        min_radius + normalized.powf(exponent) * (max_radius - min_radius)
    }
}

/// Radius used before any query has been applied: `min(20, 5 + count / 100)`.
pub fn default_radius(count: u64) -> f64 {
    (5.0 + count as f64 / 100.0).min(20.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equal_counts_give_min_radius() {
        let scaler = RadiusScaler::default();
        let scale = scaler.fit(&[50, 50, 50]);
        assert_eq!(scale.radius(50), scaler.min_radius);

        let zeros = scaler.fit(&[0, 0]);
        assert_eq!(zeros.radius(0), scaler.min_radius);
    }

    #[test]
    fn test_percentile_clipping() {
        // n = 5, index floor(0.8 * 5) = 4, the maximum itself.
        let scale = RadiusScaler::default().fit(&[40, 10, 0, 30, 20]);
        assert_eq!(scale.min(), 0);
        assert_eq!(scale.effective_max(), 40);

        // n = 10, index 8: the outlier at index 9 is clipped away.
        let counts = [1, 2, 3, 4, 5, 6, 7, 8, 9, 1000];
        let scale = RadiusScaler::default().fit(&counts);
        assert_eq!(scale.effective_max(), 9);
        assert_eq!(scale.radius(9), 7.0);
        assert!(scale.radius(1000) > 7.0);
    }

    #[test]
    fn test_zero_at_percentile_falls_back_to_max() {
        let scale = RadiusScaler::default().fit(&[0, 0, 0, 0, 0, 0, 0, 0, 0, 12]);
        assert_eq!(scale.effective_max(), 12);
        assert_eq!(scale.radius(12), 7.0);
    }

    #[test]
    fn test_radius_is_monotonic_below_effective_max() {
        let counts: Vec<u64> = (0..=100).step_by(5).collect();
        let scale = RadiusScaler::default().fit(&counts);
        let mut previous = f64::MIN;
        for count in 0..=scale.effective_max() {
            let radius = scale.radius(count);
            assert!(radius >= previous, "radius dropped at {count}");
            assert!(radius >= 2.0);
            previous = radius;
        }
    }

    #[test]
    fn test_power_curve() {
        let scale = RadiusScaler::default().fit(&[0, 100, 100, 100, 100]);
        let expected = 2.0 + 0.5f64.powf(1.2) * 5.0;
        assert!((scale.radius(50) - expected).abs() < 1e-12);
    }

    #[test]
    fn test_empty_fit() {
        let scale = RadiusScaler::default().fit(&[]);
        assert_eq!(scale.radius(10), 2.0);
    }

    #[test]
    fn test_default_radius() {
        assert_eq!(default_radius(0), 5.0);
        assert_eq!(default_radius(250), 7.5);
        assert_eq!(default_radius(10_000), 20.0);
    }
}
