use itertools::Itertools;
use rust_decimal::Decimal;
use std::fmt;

/// One evaluated grid point.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchPoint {
    pub params: Vec<Decimal>,
    /// Percentage of decision instants that produced an advisory.
    pub frequency: Decimal,
    /// Percentage of advisories that reached take-profit.
    pub accuracy: Decimal,
}

impl SearchPoint {
    /// Whether `self` strictly beats `other`: higher accuracy, then higher frequency.
    pub fn beats(&self, other: &SearchPoint) -> bool {
        (self.accuracy, self.frequency) > (other.accuracy, other.frequency)
    }
}

impl fmt::Display for SearchPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {:.2} {:.2}",
            self.params.iter().join(" "),
            self.frequency.round_dp(2),
            self.accuracy.round_dp(2)
        )
    }
}

/// Keeps the best grid point seen so far and every point that fired often enough.
#[derive(Debug, Clone)]
pub struct BestPointTracker {
    min_frequency: Decimal,
    best: Option<SearchPoint>,
    qualifying: Vec<SearchPoint>,
}

impl BestPointTracker {
    pub fn new(min_frequency: Decimal) -> Self {
        Self { min_frequency, best: None, qualifying: Vec::new() }
    }

    /// Considers one point. Returns `true` when it passed the frequency threshold.
    ///
    /// On a full tie the earlier point stays best.
    pub fn observe(&mut self, point: SearchPoint) -> bool {
        if point.frequency < self.min_frequency {
            return false;
        }

        let improves = self.best.as_ref().is_none_or(|best| point.beats(best));
        if improves {
            self.best = Some(point.clone());
        }
        self.qualifying.push(point);
        true
    }

    pub fn best(&self) -> Option<&SearchPoint> {
        self.best.as_ref()
    }

    pub fn qualifying(&self) -> &[SearchPoint] {
        &self.qualifying
    }

    pub fn into_parts(self) -> (Option<SearchPoint>, Vec<SearchPoint>) {
        (self.best, self.qualifying)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn point(tag: i64, frequency: Decimal, accuracy: Decimal) -> SearchPoint {
        SearchPoint { params: vec![Decimal::from(tag)], frequency, accuracy }
    }

    #[test]
    fn accuracy_wins_then_frequency() {
        let mut tracker = BestPointTracker::new(dec!(3));
        tracker.observe(point(1, dec!(5), dec!(60)));
        tracker.observe(point(2, dec!(4), dec!(70)));
        tracker.observe(point(3, dec!(6), dec!(70)));
        tracker.observe(point(4, dec!(20), dec!(65)));
        assert_eq!(tracker.best().unwrap().params, vec![dec!(3)]);
        assert_eq!(tracker.qualifying().len(), 4);
    }

    #[test]
    fn full_tie_keeps_the_first_point() {
        let mut tracker = BestPointTracker::new(dec!(3));
        tracker.observe(point(1, dec!(5), dec!(70)));
        tracker.observe(point(2, dec!(5), dec!(70)));
        assert_eq!(tracker.best().unwrap().params, vec![dec!(1)]);
    }

    #[test]
    fn rare_points_are_ignored() {
        let mut tracker = BestPointTracker::new(dec!(3));
        assert!(!tracker.observe(point(1, dec!(2.99), dec!(100))));
        assert!(tracker.observe(point(2, dec!(3), dec!(10))));
        let (best, qualifying) = tracker.into_parts();
        assert_eq!(best.unwrap().params, vec![dec!(2)]);
        assert_eq!(qualifying.len(), 1);
    }

    #[test]
    fn display_rounds_rates() {
        let shown = point(7, dec!(2.083333), dec!(100)).to_string();
        assert_eq!(shown, "[7] 2.08 100.00");
    }
}
