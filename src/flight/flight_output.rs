use chrono::TimeDelta;
use itertools::Itertools;
use serde::Serialize;
use strum::{AsRefStr, Display};

use super::{
    airframe::fuel::fuel_efficiency_km_per_kg,
    weather::{Advisory, FlightCondition},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, AsRefStr, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum LegStatus {
    Advancing,
    /// Wind cancels all forward progress
    NonAdvancing,
    /// Fuel ran out during the leg
    Exhausted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, AsRefStr, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum FlightStatus {
    Complete,
    NonAdvancing,
    FuelExhausted,
}

/// Outcome of a single leg.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegBreakdown {
    pub index: usize,
    pub from: String,
    pub to: String,
    pub distance_km: f64,
    /// Less than `distance_km` only when fuel ran out during the leg
    pub distance_flown_km: f64,
    pub true_airspeed_kmh: f64,
    pub ground_speed_kmh: f64,
    pub density_factor: f64,
    pub air_density_kg_m3: f64,
    pub mach: f64,
    pub burn_rate_kg_h: f64,
    /// `None` when the leg cannot be flown
    pub time_h: Option<f64>,
    pub fuel_kg: f64,
    pub weight_end_kg: f64,
    pub condition: FlightCondition,
    pub advisories: Vec<Advisory>,
    pub status: LegStatus,
}

impl LegBreakdown {
    pub fn duration(&self) -> Option<TimeDelta> {
        self.time_h.and_then(hours_to_delta)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlightResult {
    pub route: String,
    pub airframe: String,
    pub legs: Vec<LegBreakdown>,
    pub total_time_h: f64,
    pub total_fuel_kg: f64,
    pub distance_flown_km: f64,
    pub remaining_fuel_kg: f64,
    pub final_weight_kg: f64,
    pub feasible: bool,
    pub status: FlightStatus,
    pub exhausted_at: Option<usize>,
    pub non_advancing: Vec<usize>,
    pub reserve_fuel_kg: f64,
    /// Whether the fuel left at the end covers the reserve
    pub meets_reserve: bool,
}

impl FlightResult {
    pub fn fuel_efficiency_km_per_kg(&self) -> f64 {
        fuel_efficiency_km_per_kg(self.distance_flown_km, self.total_fuel_kg)
    }

    pub fn total_duration(&self) -> Option<TimeDelta> {
        hours_to_delta(self.total_time_h)
    }

    /// Most severe condition met along the route.
    pub fn worst_condition(&self) -> Option<FlightCondition> {
        self.legs.iter().map(|leg| leg.condition).max()
    }
}

pub fn hours_to_delta(hours: f64) -> Option<TimeDelta> {
    if !hours.is_finite() {
        return None;
    }

    TimeDelta::try_milliseconds((hours * 3_600_000.0).round() as i64)
}

/// Formats a duration as `HH:MM:SS`.
pub fn format_hms(delta: TimeDelta) -> String {
    let secs = delta.num_seconds();
    let sign = if secs < 0 { "-" } else { "" };
    let secs = secs.abs();

    format!(
        "{sign}{:02}:{:02}:{:02}",
        secs / 3600,
        (secs % 3600) / 60,
        secs % 60
    )
}

/// Flat per-leg row for csv output.
#[derive(Debug, Clone, Serialize)]
pub struct LegRecord {
    pub index: usize,
    pub from: String,
    pub to: String,
    pub distance_km: f64,
    pub distance_flown_km: f64,
    pub true_airspeed_kmh: f64,
    pub ground_speed_kmh: f64,
    pub density_factor: f64,
    pub air_density_kg_m3: f64,
    pub mach: f64,
    pub burn_rate_kg_h: f64,
    pub time_h: Option<f64>,
    pub fuel_kg: f64,
    pub weight_end_kg: f64,
    pub condition: FlightCondition,
    pub advisories: String,
    pub status: LegStatus,
}

impl From<&LegBreakdown> for LegRecord {
    fn from(leg: &LegBreakdown) -> Self {
        LegRecord {
            index: leg.index,
            from: leg.from.clone(),
            to: leg.to.clone(),
            distance_km: leg.distance_km,
            distance_flown_km: leg.distance_flown_km,
            true_airspeed_kmh: leg.true_airspeed_kmh,
            ground_speed_kmh: leg.ground_speed_kmh,
            density_factor: leg.density_factor,
            air_density_kg_m3: leg.air_density_kg_m3,
            mach: leg.mach,
            burn_rate_kg_h: leg.burn_rate_kg_h,
            time_h: leg.time_h,
            fuel_kg: leg.fuel_kg,
            weight_end_kg: leg.weight_end_kg,
            condition: leg.condition,
            advisories: leg.advisories.iter().map(AsRef::<str>::as_ref).join(";"),
            status: leg.status,
        }
    }
}
