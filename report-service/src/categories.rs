//! Routing of classified feeders into the analysis sheets.

use crate::{
    compliance::{self, Check, Classification},
    matrix::FeederMatrix,
    store::FeederView,
};

/// Joins check labels on the failed-checks summary sheet.
pub const SUMMARY_SEPARATOR: &str = ", ";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    Decline,
    NominationLow,
    NominationHigh,
    UptakeLow,
    UptakeHigh,
    PositiveVariance,
    NoFlags,
    FailedChecks,
}

impl Category {
    /// Sheet order in the rendered document.
    pub const ALL: [Category; 8] = [
        Category::Decline,
        Category::NominationLow,
        Category::NominationHigh,
        Category::UptakeLow,
        Category::UptakeHigh,
        Category::PositiveVariance,
        Category::NoFlags,
        Category::FailedChecks,
    ];

    pub fn sheet_name(&self) -> &'static str {
        match self {
            Category::Decline => "Decline",
            Category::NominationLow => "Nomination Low",
            Category::NominationHigh => "Nomination High",
            Category::UptakeLow => "Uptake Low",
            Category::UptakeHigh => "Uptake High",
            Category::PositiveVariance => "Positive Variance",
            Category::NoFlags => "No Flags",
            Category::FailedChecks => "Failed Checks",
        }
    }
}

impl From<Check> for Category {
    fn from(check: Check) -> Self {
        match check {
            Check::Decline => Category::Decline,
            Check::NominationLow => Category::NominationLow,
            Check::NominationHigh => Category::NominationHigh,
            Check::UptakeLow => Category::UptakeLow,
            Check::UptakeHigh => Category::UptakeHigh,
        }
    }
}

pub fn summary_labels(checks: &[Check]) -> String {
    checks
        .iter()
        .map(Check::label)
        .collect::<Vec<_>>()
        .join(SUMMARY_SEPARATOR)
}

/// Categories a feeder belongs to, in sheet order. Feeders without
/// sufficient last-day data belong to none.
pub fn route(row: &FeederMatrix, classification: &Classification) -> Vec<Category> {
    let Classification::Evaluated { failed } = classification else {
        return Vec::new();
    };

    let mut categories: Vec<Category> = failed.iter().copied().map(Category::from).collect();

    if row.last().is_some_and(|d| d.variance >= 0.0) {
        categories.push(Category::PositiveVariance);
    }

    if failed.is_empty() {
        categories.push(Category::NoFlags);
    } else {
        categories.push(Category::FailedChecks);
    }

    categories.sort();
    categories.dedup();
    categories
}

/// Classification and routing of one feeder row.
#[derive(Debug, Clone, PartialEq)]
pub struct FeederAnalysis {
    pub feeder_id: String,
    pub classification: Classification,
    pub categories: Vec<Category>,
}

pub fn analyse(feeder: &FeederView, row: &FeederMatrix) -> FeederAnalysis {
    let classification = compliance::classify(feeder, row);
    if !classification.is_evaluated() {
        metrics::counter!("report_feeders_skipped_total").increment(1);
        tracing::debug!(
            feeder_id = %feeder.id,
            "insufficient last-day data, skipping classification"
        );
    }
    let categories = route(row, &classification);

    FeederAnalysis {
        feeder_id: feeder.id.clone(),
        classification,
        categories,
    }
}
