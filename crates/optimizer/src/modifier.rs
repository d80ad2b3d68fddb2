use crate::error::OptimizerError;
use itertools::Itertools;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

/// Enumerates every point of a discretised hyper-rectangle.
///
/// Each dimension `d` is visited at `min[d]`, `min[d] + s`, `min[d] + 2s`, ...
/// up to and including `max[d]`, where `s = rate * (max[d] - min[d])` and the
/// last step is clamped to `max[d]`. Points are produced in lexicographic order
/// with the last varying dimension incrementing fastest. Dimensions with
/// `min == max` are fixed and never move.
#[derive(Debug, Clone)]
pub struct BruteForceModifier {
    min: Vec<Decimal>,
    max: Vec<Decimal>,
    rate: Decimal,
    /// Indices of the dimensions that are not fixed.
    varying: Vec<usize>,
    started: bool,
    step: u64,
}

impl BruteForceModifier {
    pub fn new(min: Vec<Decimal>, max: Vec<Decimal>, rate: Decimal) -> Result<Self, OptimizerError> {
        if min.len() != max.len() {
            return Err(OptimizerError::SearchSpace(format!(
                "min has {} dimensions but max has {}",
                min.len(),
                max.len()
            )));
        }
        if rate <= Decimal::ZERO || rate > Decimal::ONE {
            return Err(OptimizerError::SearchSpace(format!("rate must lie in (0, 1], got {}", rate)));
        }
        if let Some(d) = min.iter().zip(&max).position(|(lo, hi)| lo > hi) {
            return Err(OptimizerError::SearchSpace(format!(
                "dimension {} has min {} above max {}",
                d, min[d], max[d]
            )));
        }

        let varying = min.iter().zip(&max).positions(|(lo, hi)| lo != hi).collect();
        Ok(Self { min, max, rate, varying, started: false, step: 0 })
    }

    /// Moves `current` to the next grid point.
    ///
    /// The first call resets `current` to the all-minimum point. Once the space
    /// is exhausted, `current` is reset to the minimum again, `false` is
    /// returned, and the next call starts over.
    pub fn advance(&mut self, current: &mut [Decimal]) -> bool {
        if !self.started {
            self.reset(current, 0);
            self.started = true;
            self.step = 0;
            return true;
        }

        for &d in self.varying.iter().rev() {
            if current[d] < self.max[d] {
                let increment = (self.max[d] - self.min[d]) * self.rate;
                current[d] = (current[d] + increment).min(self.max[d]);
                self.reset(current, d + 1);
                self.step += 1;
                return true;
            }
        }

        self.reset(current, 0);
        self.started = false;
        false
    }

    /// Upper bound on the number of points: `(ceil(1 / rate) + 1) ^ varying dimensions`.
    pub fn total_steps(&self) -> u64 {
        let per_dimension = (Decimal::ONE / self.rate).ceil().to_u64().unwrap_or(u64::MAX).saturating_add(1);
        let exponent = u32::try_from(self.varying.len()).unwrap_or(u32::MAX);
        per_dimension.checked_pow(exponent).unwrap_or(u64::MAX)
    }

    /// Number of advances since the all-minimum point.
    pub fn current_step(&self) -> u64 {
        self.step
    }

    pub fn dimensions(&self) -> usize {
        self.min.len()
    }

    fn reset(&self, current: &mut [Decimal], offset: usize) {
        for (value, min) in current.iter_mut().zip(&self.min).skip(offset) {
            *value = *min;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::collections::HashSet;

    fn modifier() -> BruteForceModifier {
        BruteForceModifier::new(vec![dec!(10), dec!(20), dec!(30)], vec![dec!(20), dec!(40), dec!(30)], dec!(0.2))
            .unwrap()
    }

    #[test]
    fn enumerates_the_whole_grid_once() {
        let mut modifier = modifier();
        let mut current = vec![dec!(11), dec!(22), dec!(33)];
        let mut seen = HashSet::new();
        let mut visited = Vec::new();

        while modifier.advance(&mut current) {
            assert!(seen.insert(current.clone()), "revisited {:?}", current);
            visited.push(current.clone());
        }

        assert_eq!(visited.len() as u64, modifier.total_steps());
        assert_eq!(visited.len(), 36);
        assert_eq!(visited[0], vec![dec!(10), dec!(20), dec!(30)]);
        assert_eq!(visited[1], vec![dec!(10), dec!(24), dec!(30)]);
        assert_eq!(visited[6], vec![dec!(12), dec!(20), dec!(30)]);
        assert_eq!(visited[35], vec![dec!(20), dec!(40), dec!(30)]);
        // Exhaustion leaves the start point behind.
        assert_eq!(current, vec![dec!(10), dec!(20), dec!(30)]);
    }

    #[test]
    fn fixed_dimension_never_moves() {
        let mut modifier = modifier();
        let mut current = vec![Decimal::ZERO; 3];
        while modifier.advance(&mut current) {
            assert_eq!(current[2], dec!(30));
        }
    }

    #[test]
    fn increments_are_clamped_to_max() {
        let mut modifier = BruteForceModifier::new(vec![dec!(0)], vec![dec!(10)], dec!(0.3)).unwrap();
        let mut current = vec![Decimal::ZERO];
        let mut visited = Vec::new();
        while modifier.advance(&mut current) {
            visited.push(current[0]);
        }
        assert_eq!(visited, vec![dec!(0), dec!(3), dec!(6), dec!(9), dec!(10)]);
        assert_eq!(modifier.total_steps(), 5);
    }

    #[test]
    fn restarts_after_exhaustion() {
        let mut modifier = BruteForceModifier::new(vec![dec!(1)], vec![dec!(2)], dec!(1)).unwrap();
        let mut current = vec![Decimal::ZERO];
        assert!(modifier.advance(&mut current));
        assert!(modifier.advance(&mut current));
        assert_eq!(modifier.current_step(), 1);
        assert!(!modifier.advance(&mut current));
        assert!(modifier.advance(&mut current));
        assert_eq!(current, vec![dec!(1)]);
        assert_eq!(modifier.current_step(), 0);
    }

    #[test]
    fn fully_fixed_space_has_one_point() {
        let mut modifier = BruteForceModifier::new(vec![dec!(5), dec!(6)], vec![dec!(5), dec!(6)], dec!(0.5)).unwrap();
        let mut current = vec![Decimal::ZERO; 2];
        assert!(modifier.advance(&mut current));
        assert!(!modifier.advance(&mut current));
        assert_eq!(modifier.total_steps(), 1);
    }

    #[test]
    fn invalid_spaces_are_rejected() {
        assert!(BruteForceModifier::new(vec![dec!(1)], vec![dec!(2), dec!(3)], dec!(0.5)).is_err());
        assert!(BruteForceModifier::new(vec![dec!(3)], vec![dec!(2)], dec!(0.5)).is_err());
        assert!(BruteForceModifier::new(vec![dec!(1)], vec![dec!(2)], dec!(0)).is_err());
        assert!(BruteForceModifier::new(vec![dec!(1)], vec![dec!(2)], dec!(1.5)).is_err());
    }
}
