//! Campaign metrics snapshot and the figures derived from it.

use serde::{Deserialize, Serialize};

/// Goal used when nothing has ever been fetched successfully.
pub const FALLBACK_TARGET: f64 = 100_000.0;

/// An immutable snapshot of the campaign's progress.
///
/// Construct through [`CampaignMetrics::new`], which guarantees a
/// non-negative amount and a strictly positive target so every derived
/// figure is defined.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignMetrics {
    pub amount_raised: f64,
    pub target: f64,
    pub donation_count: u64,
}

impl CampaignMetrics {
    /// Normalise raw upstream values.
    ///
    /// * a missing, negative or non-finite amount becomes `0`
    /// * a missing, non-positive or non-finite target becomes `1`
    /// * a missing or negative donation count becomes `0`; fractions are truncated
    pub fn new(amount_raised: Option<f64>, target: Option<f64>, donation_count: Option<f64>) -> Self {
        let amount_raised = amount_raised
            .filter(|v| v.is_finite() && *v > 0.0)
            .unwrap_or(0.0);
        let target = target.filter(|v| v.is_finite() && *v > 0.0).unwrap_or(1.0);
        let donation_count = donation_count
            .filter(|v| v.is_finite() && *v > 0.0)
            .map(|v| v.trunc() as u64)
            .unwrap_or(0);

        Self {
            amount_raised,
            target,
            donation_count,
        }
    }

    /// The hard-coded snapshot served before any fetch has ever succeeded.
    pub fn fallback() -> Self {
        Self::new(Some(0.0), Some(FALLBACK_TARGET), Some(0.0))
    }

    fn ratio(&self) -> f64 {
        let target = if self.target > 0.0 { self.target } else { 1.0 };
        self.amount_raised / target
    }

    /// Whole-number percentage of the target reached. Not capped at 100.
    pub fn percent(&self) -> i64 {
        // `as` saturates, so absurd ratios still produce a printable number.
        (self.ratio() * 100.0).round() as i64
    }

    /// Share of the progress track to paint, clamped to `[0, 1]`.
    pub fn fill_fraction(&self) -> f64 {
        let ratio = self.ratio();
        if ratio.is_nan() {
            return 0.0;
        }
        ratio.clamp(0.0, 1.0)
    }
}

impl Default for CampaignMetrics {
    fn default() -> Self {
        Self::fallback()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metrics(amount: f64, target: f64) -> CampaignMetrics {
        CampaignMetrics::new(Some(amount), Some(target), Some(0.0))
    }

    #[test]
    fn zero_or_missing_target_becomes_one() {
        assert_eq!(metrics(50.0, 0.0).target, 1.0);
        assert_eq!(metrics(50.0, -10.0).target, 1.0);
        assert_eq!(CampaignMetrics::new(Some(5.0), None, None).target, 1.0);
        assert_eq!(metrics(50.0, 0.0).percent(), 5000);
    }

    #[test]
    fn negative_and_missing_values_become_zero() {
        let m = CampaignMetrics::new(Some(-3.0), Some(100.0), Some(-1.0));
        assert_eq!(m.amount_raised, 0.0);
        assert_eq!(m.donation_count, 0);

        let m = CampaignMetrics::new(None, None, None);
        assert_eq!(m.amount_raised, 0.0);
        assert_eq!(m.donation_count, 0);
    }

    #[test]
    fn fractional_donation_count_is_truncated() {
        let m = CampaignMetrics::new(Some(1.0), Some(2.0), Some(37.9));
        assert_eq!(m.donation_count, 37);
    }

    #[test]
    fn fallback_snapshot() {
        let m = CampaignMetrics::fallback();
        assert_eq!(m.amount_raised, 0.0);
        assert_eq!(m.target, 100_000.0);
        assert_eq!(m.donation_count, 0);
        assert_eq!(m.percent(), 0);
    }

    #[test]
    fn percent_rounds_and_exceeds_hundred() {
        assert_eq!(metrics(50_000.0, 100_000.0).percent(), 50);
        assert_eq!(metrics(142_000.0, 100_000.0).percent(), 142);
        assert_eq!(metrics(1.0, 200.0).percent(), 1);
        assert_eq!(metrics(1.0, 300.0).percent(), 0);
    }

    #[test]
    fn fill_fraction_is_clamped_and_monotonic() {
        let target = 1_000.0;
        let mut previous = 0.0;
        for step in 0..=300 {
            let amount = step as f64 * 10.0;
            let fill = metrics(amount, target).fill_fraction();
            assert!((0.0..=1.0).contains(&fill), "fill {fill} out of range");
            assert!(fill >= previous, "fill decreased at amount {amount}");
            previous = fill;
        }
        assert_eq!(metrics(142.0, 100.0).fill_fraction(), 1.0);
    }

    #[test]
    fn serialises_as_camel_case() {
        let json = serde_json::to_value(CampaignMetrics::new(Some(10.0), Some(20.0), Some(3.0))).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "amountRaised": 10.0, "target": 20.0, "donationCount": 3 })
        );
    }
}
