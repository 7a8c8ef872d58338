//! Fuzzy Durations
//!
//! Coarse "how long ago" labels for the age column: `  5s`, ` 12m`, `  3h`,
//! `  4d`, `  2w`. Only the largest unit that is at least one is shown.

use std::fmt;

/// Width labels are right-aligned to
const LABEL_WIDTH: usize = 4;

/// Bucket unit, ordered from finest to coarsest
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FuzzyUnit {
    Seconds,
    Minutes,
    Hours,
    Days,
    Weeks,
}

impl FuzzyUnit {
    const ALL: [FuzzyUnit; 5] = [
        FuzzyUnit::Weeks,
        FuzzyUnit::Days,
        FuzzyUnit::Hours,
        FuzzyUnit::Minutes,
        FuzzyUnit::Seconds,
    ];

    /// Length of one unit in seconds
    pub fn seconds(self) -> u64 {
        match self {
            FuzzyUnit::Seconds => 1,
            FuzzyUnit::Minutes => 60,
            FuzzyUnit::Hours => 3_600,
            FuzzyUnit::Days => 86_400,
            FuzzyUnit::Weeks => 604_800,
        }
    }

    /// Label suffix
    pub fn suffix(self) -> char {
        match self {
            FuzzyUnit::Seconds => 's',
            FuzzyUnit::Minutes => 'm',
            FuzzyUnit::Hours => 'h',
            FuzzyUnit::Days => 'd',
            FuzzyUnit::Weeks => 'w',
        }
    }

    fn from_suffix(suffix: char) -> Option<Self> {
        Self::ALL.into_iter().find(|unit| unit.suffix() == suffix)
    }
}

/// An elapsed time reduced to one unit
///
/// Ordering compares the unit first, then the amount, and is monotonic in the
/// input seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FuzzyDuration {
    unit: FuzzyUnit,
    amount: u64,
}

impl FuzzyDuration {
    /// Bucket an elapsed time; negative input (clock skew) counts as zero
    pub fn from_secs(seconds: i64) -> Self {
        let seconds = seconds.max(0).unsigned_abs();
        let unit = FuzzyUnit::ALL
            .into_iter()
            .find(|unit| seconds >= unit.seconds())
            .unwrap_or(FuzzyUnit::Seconds);

        Self {
            unit,
            amount: seconds / unit.seconds(),
        }
    }

    pub fn unit(&self) -> FuzzyUnit {
        self.unit
    }

    pub fn amount(&self) -> u64 {
        self.amount
    }

    /// Sort key of the bucket
    pub fn rank(&self) -> (FuzzyUnit, u64) {
        (self.unit, self.amount)
    }
}

impl fmt::Display for FuzzyDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = format!("{}{}", self.amount, self.unit.suffix());
        write!(f, "{:>width$}", label, width = LABEL_WIDTH)
    }
}

/// Format an elapsed number of seconds as a fuzzy label
pub fn format_fuzzy(seconds: i64) -> String {
    FuzzyDuration::from_secs(seconds).to_string()
}

/// Recover the sort key of a label produced by [`format_fuzzy`]
pub fn bucket_rank(label: &str) -> Option<(FuzzyUnit, u64)> {
    let label = label.trim();
    let suffix = label.chars().last()?;
    let unit = FuzzyUnit::from_suffix(suffix)?;
    let amount = label[..label.len() - suffix.len_utf8()].parse().ok()?;
    Some((unit, amount))
}
