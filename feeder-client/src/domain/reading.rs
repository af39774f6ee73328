use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

/// Prior state of a reading, captured before each overwrite.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadingSnapshot {
    pub reading_date: Date,
    pub cumulative_energy_consumption: f64,
    pub recorded_at: OffsetDateTime,
    pub recorded_by: String,
}

/// One reading per (feeder, calendar day).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    pub feeder_id: String,
    pub reading_date: Date,
    pub cumulative_energy_consumption: f64,
    pub recorded_by: String,
    pub recorded_at: OffsetDateTime,
    pub history: Vec<ReadingSnapshot>,
}

impl Reading {
    pub fn new(
        feeder_id: impl Into<String>,
        reading_date: Date,
        cumulative_energy_consumption: f64,
        recorded_by: impl Into<String>,
        recorded_at: OffsetDateTime,
    ) -> Self {
        Self {
            feeder_id: feeder_id.into(),
            reading_date,
            cumulative_energy_consumption,
            recorded_by: recorded_by.into(),
            recorded_at,
            history: Vec::new(),
        }
    }

    /// Overwrite the cumulative value. The pre-mutation state is appended to
    /// `history` first; history entries are never edited or removed.
    pub fn record(&mut self, value: f64, actor: impl Into<String>, at: OffsetDateTime) {
        self.history.push(ReadingSnapshot {
            reading_date: self.reading_date,
            cumulative_energy_consumption: self.cumulative_energy_consumption,
            recorded_at: self.recorded_at,
            recorded_by: self.recorded_by.clone(),
        });
        self.cumulative_energy_consumption = value;
        self.recorded_by = actor.into();
        self.recorded_at = at;
    }
}

/// Row shape of the `readings` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ReadingRecord {
    pub feeder_id: String,
    pub reading_date: Date,
    pub cumulative_energy_consumption: f64,
    pub recorded_by: String,
    pub recorded_at: OffsetDateTime,
    pub history: sqlx::types::Json<Vec<ReadingSnapshot>>,
}

impl From<ReadingRecord> for Reading {
    fn from(r: ReadingRecord) -> Self {
        Reading {
            feeder_id: r.feeder_id,
            reading_date: r.reading_date,
            cumulative_energy_consumption: r.cumulative_energy_consumption,
            recorded_by: r.recorded_by,
            recorded_at: r.recorded_at,
            history: r.history.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::{date, datetime};

    #[test]
    fn record_appends_previous_state_to_history() {
        let mut reading = Reading::new(
            "f-1",
            date!(2024 - 03 - 01),
            100.0,
            "alice",
            datetime!(2024-03-01 08:00:00 UTC),
        );

        reading.record(120.0, "bob", datetime!(2024-03-01 09:00:00 UTC));
        reading.record(125.0, "carol", datetime!(2024-03-01 10:00:00 UTC));

        assert_eq!(reading.cumulative_energy_consumption, 125.0);
        assert_eq!(reading.recorded_by, "carol");
        assert_eq!(reading.history.len(), 2);
        assert_eq!(reading.history[0].cumulative_energy_consumption, 100.0);
        assert_eq!(reading.history[0].recorded_by, "alice");
        assert_eq!(reading.history[1].cumulative_energy_consumption, 120.0);
        assert_eq!(reading.history[1].recorded_at, datetime!(2024-03-01 09:00:00 UTC));
    }
}
