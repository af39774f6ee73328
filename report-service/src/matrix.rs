//! Day-by-day nomination / actual / variance reconstruction.

use std::collections::HashMap;

use feeder_client::domain::Reading;
use time::Date;

use crate::store::FeederView;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DayCell {
    pub date: Date,
    pub nomination: f64,
    pub actual: f64,
    pub variance: f64,
    /// Whether `actual` came from a reading dated this day rather than
    /// being carried forward.
    pub recorded: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FeederMatrix {
    pub feeder_id: String,
    pub days: Vec<DayCell>,
}

impl FeederMatrix {
    pub fn last(&self) -> Option<&DayCell> {
        self.days.last()
    }

    /// Resolved actual of the day before the last one; 0 for a one-day range.
    pub fn previous_actual(&self) -> f64 {
        match self.days.len() {
            0 | 1 => 0.0,
            n => self.days[n - 2].actual,
        }
    }
}

/// Readings grouped per feeder, keyed by their exact calendar day.
pub fn index_by_feeder(readings: &[Reading]) -> HashMap<&str, HashMap<Date, f64>> {
    let mut index: HashMap<&str, HashMap<Date, f64>> = HashMap::new();
    for r in readings {
        index
            .entry(r.feeder_id.as_str())
            .or_default()
            .insert(r.reading_date, r.cumulative_energy_consumption);
    }
    index
}

/// Build one feeder's row over `days`.
///
/// Day `i` (1-based) nominates `daily_energy_uptake * i`. A day without a
/// reading repeats the previous day's actual, starting from 0.
pub fn build_feeder(
    feeder: &FeederView,
    days: &[Date],
    readings: Option<&HashMap<Date, f64>>,
) -> FeederMatrix {
    let mut carried = 0.0;
    let cells = days
        .iter()
        .enumerate()
        .map(|(idx, &date)| {
            let nomination = feeder.daily_energy_uptake * (idx + 1) as f64;
            let recorded_value = readings.and_then(|r| r.get(&date).copied());
            let actual = recorded_value.unwrap_or(carried);
            carried = actual;

            DayCell {
                date,
                nomination,
                actual,
                variance: actual - nomination,
                recorded: recorded_value.is_some(),
            }
        })
        .collect();

    FeederMatrix {
        feeder_id: feeder.id.clone(),
        days: cells,
    }
}

/// Build rows for every feeder, in feeder order.
pub fn build(feeders: &[FeederView], days: &[Date], readings: &[Reading]) -> Vec<FeederMatrix> {
    let index = index_by_feeder(readings);
    feeders
        .iter()
        .map(|f| build_feeder(f, days, index.get(f.id.as_str())))
        .collect()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::dates;
    use feeder_client::domain::Band;
    use time::macros::{date, datetime};

    pub(crate) fn view(id: &str, uptake: f64) -> FeederView {
        FeederView {
            id: id.to_string(),
            name: format!("Feeder {id}"),
            business_hub: "Ikeja".to_string(),
            region: "Lagos West".to_string(),
            band: Band::A,
            daily_energy_uptake: uptake,
            monthly_delivery_plan: uptake * 30.0,
            previous_month_consumption: uptake * 29.0,
        }
    }

    pub(crate) fn reading(feeder_id: &str, day: Date, value: f64) -> Reading {
        Reading::new(feeder_id, day, value, "op", datetime!(2024-01-01 00:00:00 UTC))
    }

    #[test]
    fn feeder_without_readings_stays_at_zero() {
        let days = dates::expand(date!(2024 - 01 - 01), date!(2024 - 01 - 04)).unwrap();
        let rows = build(&[view("f-1", 50.0)], &days, &[]);

        assert!(rows[0].days.iter().all(|d| d.actual == 0.0 && !d.recorded));
        assert_eq!(rows[0].days[3].variance, -200.0);
    }

    #[test]
    fn variance_is_actual_minus_linear_nomination() {
        let days = dates::expand(date!(2024 - 01 - 01), date!(2024 - 01 - 05)).unwrap();
        let readings = vec![
            reading("f-1", date!(2024 - 01 - 01), 90.0),
            reading("f-1", date!(2024 - 01 - 02), 230.0),
            reading("f-1", date!(2024 - 01 - 04), 410.0),
        ];
        let rows = build(&[view("f-1", 100.0)], &days, &readings);

        for (i, cell) in rows[0].days.iter().enumerate() {
            let nomination = 100.0 * (i + 1) as f64;
            assert_eq!(cell.nomination, nomination);
            assert_eq!(cell.variance, cell.actual - nomination);
        }
    }

    #[test]
    fn missing_day_carries_previous_actual_forward() {
        let days = dates::expand(date!(2024 - 01 - 01), date!(2024 - 01 - 03)).unwrap();
        let readings = vec![
            reading("f-1", date!(2024 - 01 - 01), 120.0),
            reading("f-1", date!(2024 - 01 - 03), 310.0),
        ];
        let rows = build(&[view("f-1", 100.0)], &days, &readings);
        let d = &rows[0].days;

        assert_eq!(d[1].actual, d[0].actual);
        assert!(!d[1].recorded);
        assert_eq!(d[2].actual, 310.0);
        assert!(d[2].recorded);
        assert_eq!(rows[0].previous_actual(), 120.0);
    }

    #[test]
    fn readings_outside_range_or_of_other_feeders_are_ignored() {
        let days = vec![date!(2024 - 01 - 02)];
        let readings = vec![
            reading("f-1", date!(2024 - 01 - 01), 999.0),
            reading("f-2", date!(2024 - 01 - 02), 40.0),
        ];
        let rows = build(&[view("f-1", 10.0), view("f-2", 10.0)], &days, &readings);

        assert_eq!(rows[0].days[0].actual, 0.0);
        assert_eq!(rows[1].days[0].actual, 40.0);
        assert_eq!(rows[1].previous_actual(), 0.0);
    }

    #[test]
    fn rebuilding_identical_inputs_is_identical() {
        let days = dates::expand(date!(2024 - 01 - 01), date!(2024 - 01 - 03)).unwrap();
        let feeders = vec![view("f-1", 100.0), view("f-2", 30.0)];
        let readings = vec![
            reading("f-1", date!(2024 - 01 - 02), 180.0),
            reading("f-2", date!(2024 - 01 - 01), 25.0),
        ];

        assert_eq!(build(&feeders, &days, &readings), build(&feeders, &days, &readings));
    }
}
