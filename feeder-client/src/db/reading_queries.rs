use anyhow::Result;
use sqlx::PgPool;
use time::{Date, OffsetDateTime};

use crate::domain::{Reading, ReadingRecord};

const READING_COLUMNS: &str = r#"
    feeder_id,
    reading_date,
    cumulative_energy_consumption,
    recorded_by,
    recorded_at,
    history
"#;

/// All readings across feeders with `start <= reading_date <= end`.
pub async fn readings_in_range(pool: &PgPool, start: Date, end: Date) -> Result<Vec<Reading>> {
    let sql = format!(
        r#"
        SELECT {READING_COLUMNS}
        FROM readings
        WHERE reading_date >= $1
          AND reading_date <= $2
        ORDER BY feeder_id, reading_date
        "#
    );

    let rows = sqlx::query_as::<_, ReadingRecord>(&sql)
        .bind(start)
        .bind(end)
        .fetch_all(pool)
        .await?;

    Ok(rows.into_iter().map(Reading::from).collect())
}

/// The reading of one feeder on exactly `day`, if any.
pub async fn reading_on(pool: &PgPool, feeder_id: &str, day: Date) -> Result<Option<Reading>> {
    let sql = format!(
        r#"
        SELECT {READING_COLUMNS}
        FROM readings
        WHERE feeder_id = $1
          AND reading_date = $2
        "#
    );

    let row = sqlx::query_as::<_, ReadingRecord>(&sql)
        .bind(feeder_id)
        .bind(day)
        .fetch_optional(pool)
        .await?;

    Ok(row.map(Reading::from))
}

/// Insert a reading, or overwrite the existing one for the same
/// (feeder, day) after appending its previous state to history.
pub async fn record_reading(
    pool: &PgPool,
    feeder_id: &str,
    day: Date,
    value: f64,
    actor: &str,
    at: OffsetDateTime,
) -> Result<Reading> {
    let mut tx = pool.begin().await?;

    let sql = format!(
        r#"
        SELECT {READING_COLUMNS}
        FROM readings
        WHERE feeder_id = $1
          AND reading_date = $2
        FOR UPDATE
        "#
    );
    let existing = sqlx::query_as::<_, ReadingRecord>(&sql)
        .bind(feeder_id)
        .bind(day)
        .fetch_optional(&mut *tx)
        .await?;

    let reading = match existing {
        Some(record) => {
            let mut reading = Reading::from(record);
            reading.record(value, actor, at);
            reading
        }
        None => Reading::new(feeder_id, day, value, actor, at),
    };

    sqlx::query(
        r#"
        INSERT INTO readings
            (feeder_id, reading_date, cumulative_energy_consumption, recorded_by, recorded_at, history)
        VALUES ($1, $2, $3, $4, $5, $6)
        ON CONFLICT (feeder_id, reading_date) DO UPDATE SET
            cumulative_energy_consumption = EXCLUDED.cumulative_energy_consumption,
            recorded_by = EXCLUDED.recorded_by,
            recorded_at = EXCLUDED.recorded_at,
            history = EXCLUDED.history
        "#,
    )
    .bind(&reading.feeder_id)
    .bind(reading.reading_date)
    .bind(reading.cumulative_energy_consumption)
    .bind(&reading.recorded_by)
    .bind(reading.recorded_at)
    .bind(sqlx::types::Json(&reading.history))
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    Ok(reading)
}
