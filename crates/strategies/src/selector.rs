use crate::{Candidate, Decision};
use core_types::Advisory;

/// An advisory picked out of a set of overlapping candidates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Selected<'a> {
    pub hours_before: u32,
    pub advisory: &'a Advisory,
}

/// Picks one representative advisory per decision instant.
///
/// Prefers the shortest lookback window and, among those, the lowest
/// take-profit. Full ties keep the earliest candidate.
#[derive(Debug, Default, Clone, Copy)]
pub struct Selector;

impl Selector {
    pub fn select<'a>(&self, candidates: &'a [Candidate]) -> Option<Selected<'a>> {
        candidates
            .iter()
            .filter_map(|candidate| match &candidate.decision {
                Decision::Advice(advisory) => Some(Selected { hours_before: candidate.hours_before, advisory }),
                Decision::Rejected(_) => None,
            })
            .min_by(|a, b| {
                a.hours_before
                    .cmp(&b.hours_before)
                    .then_with(|| a.advisory.take_profit.cmp(&b.advisory.take_profit))
            })
    }
}
