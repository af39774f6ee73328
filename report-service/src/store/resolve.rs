use std::collections::HashMap;

use feeder_client::domain::{Band, BusinessHub, Feeder, Region};

/// A feeder with its hub and region references resolved to display names.
#[derive(Debug, Clone, PartialEq)]
pub struct FeederView {
    pub id: String,
    pub name: String,
    pub business_hub: String,
    pub region: String,
    pub band: Band,
    pub daily_energy_uptake: f64,
    pub monthly_delivery_plan: f64,
    pub previous_month_consumption: f64,
}

/// Resolve hub/region references and order the result by region, then hub,
/// then feeder name (case-sensitive, stable).
///
/// Feeders whose references do not resolve are dropped with a warning.
pub fn materialize(
    feeders: Vec<Feeder>,
    regions: &[Region],
    hubs: &[BusinessHub],
) -> Vec<FeederView> {
    let region_names: HashMap<&str, &str> = regions
        .iter()
        .map(|r| (r.id.as_str(), r.name.as_str()))
        .collect();
    let hub_names: HashMap<&str, &str> = hubs
        .iter()
        .map(|h| (h.id.as_str(), h.name.as_str()))
        .collect();

    let mut views: Vec<FeederView> = feeders
        .into_iter()
        .filter_map(|f| {
            let region = region_names.get(f.region_id.as_str());
            let hub = hub_names.get(f.business_hub_id.as_str());
            match (region, hub) {
                (Some(region), Some(hub)) => Some(FeederView {
                    region: region.to_string(),
                    business_hub: hub.to_string(),
                    id: f.id,
                    name: f.name,
                    band: f.band,
                    daily_energy_uptake: f.daily_energy_uptake,
                    monthly_delivery_plan: f.monthly_delivery_plan,
                    previous_month_consumption: f.previous_month_consumption,
                }),
                _ => {
                    tracing::warn!(
                        feeder_id = %f.id,
                        region_id = %f.region_id,
                        business_hub_id = %f.business_hub_id,
                        "feeder references unknown region or hub, skipping"
                    );
                    None
                }
            }
        })
        .collect();

    views.sort_by(|a, b| {
        (&a.region, &a.business_hub, &a.name).cmp(&(&b.region, &b.business_hub, &b.name))
    });

    views
}
