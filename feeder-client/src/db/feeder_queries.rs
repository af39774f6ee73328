use anyhow::Result;
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::domain::{BusinessHub, Feeder, FeederRecord, Region};

/// Optional narrowing applied to the feeder listing. Empty means "all".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeederQuery {
    pub region_id: Option<String>,
    pub business_hub_id: Option<String>,
    pub feeder_ids: Option<Vec<String>>,
    pub active_only: bool,
}

impl FeederQuery {
    pub fn matches(&self, feeder: &Feeder) -> bool {
        if self.active_only && !feeder.is_active() {
            return false;
        }
        if let Some(region_id) = &self.region_id {
            if &feeder.region_id != region_id {
                return false;
            }
        }
        if let Some(hub_id) = &self.business_hub_id {
            if &feeder.business_hub_id != hub_id {
                return false;
            }
        }
        if let Some(ids) = &self.feeder_ids {
            if !ids.iter().any(|id| id == &feeder.id) {
                return false;
            }
        }
        true
    }
}

pub async fn list_regions(pool: &PgPool) -> Result<Vec<Region>> {
    let rows = sqlx::query_as::<_, Region>("SELECT id, name FROM regions ORDER BY name")
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

pub async fn list_business_hubs(pool: &PgPool) -> Result<Vec<BusinessHub>> {
    let rows = sqlx::query_as::<_, BusinessHub>(
        "SELECT id, name, region_id FROM business_hubs ORDER BY name",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Fetch feeders matching `query`, ordered by name.
pub async fn list_feeders(pool: &PgPool, query: &FeederQuery) -> Result<Vec<Feeder>> {
    let mut builder = QueryBuilder::<Postgres>::new(
        r#"
        SELECT
            id,
            name,
            business_hub_id,
            region_id,
            band,
            daily_energy_uptake,
            monthly_delivery_plan,
            previous_month_consumption,
            status
        FROM feeders
        WHERE 1 = 1
        "#,
    );

    if let Some(region_id) = &query.region_id {
        builder.push(" AND region_id = ").push_bind(region_id);
    }
    if let Some(hub_id) = &query.business_hub_id {
        builder.push(" AND business_hub_id = ").push_bind(hub_id);
    }
    if let Some(ids) = &query.feeder_ids {
        builder.push(" AND id = ANY(").push_bind(ids).push(")");
    }
    if query.active_only {
        builder.push(" AND status = 'active'");
    }
    builder.push(" ORDER BY name");

    let rows = builder
        .build_query_as::<FeederRecord>()
        .fetch_all(pool)
        .await?;

    let feeders = rows
        .into_iter()
        .map(Feeder::try_from)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(feeders)
}
