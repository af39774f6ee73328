use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use super::{BusinessHub, DomainError};

/// Capacity tier of a feeder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Band {
    A,
    B,
    C,
    D,
    E,
}

impl Band {
    pub fn as_str(&self) -> &'static str {
        match self {
            Band::A => "A",
            Band::B => "B",
            Band::C => "C",
            Band::D => "D",
            Band::E => "E",
        }
    }
}

impl fmt::Display for Band {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Band {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "A" => Ok(Band::A),
            "B" => Ok(Band::B),
            "C" => Ok(Band::C),
            "D" => Ok(Band::D),
            "E" => Ok(Band::E),
            _ => Err(DomainError::UnknownBand(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeederStatus {
    Active,
    Inactive,
}

impl FromStr for FeederStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "active" => Ok(FeederStatus::Active),
            "inactive" => Ok(FeederStatus::Inactive),
            _ => Err(DomainError::UnknownStatus(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feeder {
    pub id: String,
    pub name: String,
    pub business_hub_id: String,
    /// Denormalized from the owning hub.
    pub region_id: String,
    pub band: Band,
    pub daily_energy_uptake: f64,
    pub monthly_delivery_plan: f64,
    pub previous_month_consumption: f64,
    pub status: FeederStatus,
}

impl Feeder {
    /// Write-time checks: non-negative uptake and a region that matches the
    /// owning hub's region.
    pub fn validate(&self, hub: &BusinessHub) -> Result<(), DomainError> {
        if !self.daily_energy_uptake.is_finite() || self.daily_energy_uptake < 0.0 {
            return Err(DomainError::InvalidUptake(self.daily_energy_uptake));
        }

        if self.business_hub_id != hub.id {
            return Err(DomainError::HubMismatch {
                feeder_id: self.id.clone(),
                expected_hub: self.business_hub_id.clone(),
                actual_hub: hub.id.clone(),
            });
        }

        if self.region_id != hub.region_id {
            return Err(DomainError::RegionMismatch {
                feeder_id: self.id.clone(),
                feeder_region: self.region_id.clone(),
                hub_id: hub.id.clone(),
                hub_region: hub.region_id.clone(),
            });
        }

        Ok(())
    }

    pub fn is_active(&self) -> bool {
        self.status == FeederStatus::Active
    }
}

/// Row shape of the `feeders` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct FeederRecord {
    pub id: String,
    pub name: String,
    pub business_hub_id: String,
    pub region_id: String,
    pub band: String,
    pub daily_energy_uptake: f64,
    pub monthly_delivery_plan: f64,
    pub previous_month_consumption: f64,
    pub status: String,
}

impl TryFrom<FeederRecord> for Feeder {
    type Error = DomainError;

    fn try_from(r: FeederRecord) -> Result<Self, Self::Error> {
        Ok(Feeder {
            band: r.band.parse()?,
            status: r.status.parse()?,
            id: r.id,
            name: r.name,
            business_hub_id: r.business_hub_id,
            region_id: r.region_id,
            daily_energy_uptake: r.daily_energy_uptake,
            monthly_delivery_plan: r.monthly_delivery_plan,
            previous_month_consumption: r.previous_month_consumption,
        })
    }
}
