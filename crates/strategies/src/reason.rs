use std::collections::BTreeMap;
use std::fmt;

/// Why the storm/calm family declined to advise.
///
/// Declaration order is the tie-break order when reasons are ranked by frequency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CbsReason {
    CalmPeriodTooShort,
    CalmPeriodTooVolatile,
    TooSteepCalmLine,
    StormTooWeak,
    StormTooStrong,
    StormTooSmall,
    StormUnstable,
    WrongDirection,
    /// The scaled strategy's period range produced no storm/calm split to try.
    NoWindowSplits,
}

impl CbsReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            CbsReason::CalmPeriodTooShort => "calm_period_too_short",
            CbsReason::CalmPeriodTooVolatile => "calm_period_too_volatile",
            CbsReason::TooSteepCalmLine => "too_steep_calm_line",
            CbsReason::StormTooWeak => "storm_too_weak",
            CbsReason::StormTooStrong => "storm_too_strong",
            CbsReason::StormTooSmall => "storm_too_small",
            CbsReason::StormUnstable => "storm_unstable",
            CbsReason::WrongDirection => "wrong_direction",
            CbsReason::NoWindowSplits => "no_window_splits",
        }
    }
}

/// Why the trend-following strategy declined to advise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FtReason {
    TrendTooVolatile,
    TrendTooStrong,
    TrendTooWeak,
    WrongDirection,
}

impl FtReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            FtReason::TrendTooVolatile => "trend_too_volatile",
            FtReason::TrendTooStrong => "trend_too_strong",
            FtReason::TrendTooWeak => "trend_too_weak",
            FtReason::WrongDirection => "wrong_direction",
        }
    }
}

/// A typed "no advisory for this instant" outcome, qualified by strategy family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Rejection {
    Cbs(CbsReason),
    Ft(FtReason),
    /// The adviser returned no candidates at all.
    NoCandidates,
}

impl Rejection {
    /// The most frequent rejection, ties going to the one that sorts first.
    /// `None` for an empty input.
    pub fn dominant<I>(rejections: I) -> Option<Rejection>
    where
        I: IntoIterator<Item = Rejection>,
    {
        let mut counts: BTreeMap<Rejection, usize> = BTreeMap::new();
        for rejection in rejections {
            *counts.entry(rejection).or_default() += 1;
        }

        let mut best: Option<(Rejection, usize)> = None;
        for (rejection, count) in counts {
            match best {
                Some((_, best_count)) if best_count >= count => {}
                _ => best = Some((rejection, count)),
            }
        }
        best.map(|(rejection, _)| rejection)
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::Cbs(reason) => write!(f, "cbs.{}", reason.as_str()),
            Rejection::Ft(reason) => write!(f, "ft.{}", reason.as_str()),
            Rejection::NoCandidates => write!(f, "adviser.no_candidates"),
        }
    }
}

impl From<CbsReason> for Rejection {
    fn from(reason: CbsReason) -> Self {
        Rejection::Cbs(reason)
    }
}

impl From<FtReason> for Rejection {
    fn from(reason: FtReason) -> Self {
        Rejection::Ft(reason)
    }
}
