//! Per-feeder compliance rules, evaluated on the last day of the range.

use std::fmt;

use crate::{matrix::FeederMatrix, store::FeederView};

pub const LOW_RATIO: f64 = 0.7;
pub const HIGH_RATIO: f64 = 1.3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Check {
    /// Actual did not increase over the previous day.
    Decline,
    NominationLow,
    NominationHigh,
    /// Day-over-day delta against the daily uptake.
    UptakeLow,
    UptakeHigh,
}

impl Check {
    /// Reporting order.
    pub const ALL: [Check; 5] = [
        Check::Decline,
        Check::NominationLow,
        Check::NominationHigh,
        Check::UptakeLow,
        Check::UptakeHigh,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Check::Decline => "Actual D-0 < Actual D-1",
            Check::NominationLow => "Actual < 70% Nomination",
            Check::NominationHigh => "Actual > 130% Nomination",
            Check::UptakeLow => "Daily Delta < 70% Uptake",
            Check::UptakeHigh => "Daily Delta > 130% Uptake",
        }
    }
}

impl fmt::Display for Check {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Classification {
    /// No reading on the last day, or a non-positive one. Not the same as
    /// compliant: the feeder takes no part in analysis.
    InsufficientData,
    Evaluated { failed: Vec<Check> },
}

impl Classification {
    pub fn failed(&self) -> &[Check] {
        match self {
            Classification::InsufficientData => &[],
            Classification::Evaluated { failed } => failed,
        }
    }

    pub fn is_evaluated(&self) -> bool {
        matches!(self, Classification::Evaluated { .. })
    }
}

fn band_check(value: f64, target: f64, low: Check, high: Check) -> Option<Check> {
    if value < LOW_RATIO * target {
        Some(low)
    } else if value > HIGH_RATIO * target {
        Some(high)
    } else {
        None
    }
}

pub fn classify(feeder: &FeederView, row: &FeederMatrix) -> Classification {
    let Some(last) = row.last() else {
        return Classification::InsufficientData;
    };
    if !last.recorded || last.actual <= 0.0 {
        return Classification::InsufficientData;
    }

    let multi_day = row.days.len() > 1;
    let previous = row.previous_actual();
    let mut failed = Vec::new();

    if multi_day && last.actual <= previous {
        failed.push(Check::Decline);
    }

    failed.extend(band_check(
        last.actual,
        last.nomination,
        Check::NominationLow,
        Check::NominationHigh,
    ));

    if multi_day {
        failed.extend(band_check(
            last.actual - previous,
            feeder.daily_energy_uptake,
            Check::UptakeLow,
            Check::UptakeHigh,
        ));
    }

    Classification::Evaluated { failed }
}
