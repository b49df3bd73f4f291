//! Fuel burn model.
//!
//! Burn scales linearly with weight and with a power fraction that grows with
//! the square of the speed ratio and the square root of the density factor.
//! The power fraction never drops below the idle floor.

use serde::Serialize;
use strum::{AsRefStr, EnumIter, EnumString};

use super::airframe_data::{AirframeProfile, InvalidAirframe, check_positive};
use crate::parameters::{self, ParameterMap};

/// Lower bound on the power fraction
pub const MIN_POWER_FRACTION: f64 = 0.4;

/// Fuel flow at the given conditions, in kg/h.
pub fn burn_rate(
    tas_kmh: f64,
    density_factor: f64,
    current_weight_kg: f64,
    airframe: &AirframeProfile,
) -> Result<f64, InvalidAirframe> {
    airframe.validate()?;
    check_positive("tas_kmh", tas_kmh)?;
    check_positive("density_factor", density_factor)?;
    check_positive("current_weight_kg", current_weight_kg)?;

    let speed_ratio = tas_kmh / airframe.cruise_tas_kmh;
    let power_fraction = (density_factor.sqrt() * speed_ratio.powi(2)).max(MIN_POWER_FRACTION);

    Ok(airframe.reference_burn_kg_h
        * (current_weight_kg / airframe.reference_weight_kg)
        * power_fraction)
}

/// Distance covered per kg of fuel. Zero when no fuel was burnt.
pub fn fuel_efficiency_km_per_kg(distance_km: f64, fuel_kg: f64) -> f64 {
    if fuel_kg <= 0.0 {
        0.0
    } else {
        distance_km / fuel_kg
    }
}

pub fn fuel_cost(fuel_kg: f64, price_per_kg: f64) -> f64 {
    fuel_kg * price_per_kg
}

/// Fuel to carry on top of the trip fuel: a holding allowance at the trip's
/// average burn plus a fraction of the trip fuel.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FuelReserve {
    pub holding_time_h: f64,
    pub contingency_fraction: f64,
}

impl Default for FuelReserve {
    fn default() -> Self {
        FuelReserve {
            holding_time_h: 0.5,
            contingency_fraction: 0.05,
        }
    }
}

impl FuelReserve {
    pub fn from_params(params: &ParameterMap) -> Result<Self, parameters::Error> {
        Ok(FuelReserve {
            holding_time_h: params.get_param("holding_time_h")?.value_float()?,
            contingency_fraction: params.get_param("contingency_fraction")?.value_float()?,
        })
    }

    pub fn required_kg(&self, trip_fuel_kg: f64, holding_burn_kg_h: f64) -> f64 {
        self.holding_time_h * holding_burn_kg_h + self.contingency_fraction * trip_fuel_kg
    }
}

/// How the planner picks the true airspeed for a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, AsRefStr, EnumIter, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SpeedSchedule {
    #[default]
    Cruise,
    /// Slow down on short routes to save fuel
    DistanceOptimized,
}

impl SpeedSchedule {
    pub fn tas_kmh(&self, airframe: &AirframeProfile, route_distance_km: f64) -> f64 {
        let fraction = match self {
            Self::Cruise => 1.0,
            Self::DistanceOptimized if route_distance_km < 1000.0 => 0.9,
            Self::DistanceOptimized if route_distance_km < 3000.0 => 0.95,
            Self::DistanceOptimized => 1.0,
        };

        airframe.cruise_tas_kmh * fraction
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use pretty_assertions::assert_eq;
    use strum::IntoEnumIterator;

    use super::*;

    fn airframe() -> AirframeProfile {
        AirframeProfile::new("test", 800.0, 2000.0, 40000.0, 2000.0).unwrap()
    }

    #[test]
    fn test_reference_conditions() {
        let burn = burn_rate(800.0, 1.0, 42000.0, &airframe()).unwrap();
        assert_eq!(burn, 2000.0);
    }

    #[test]
    fn test_burn_scales_with_weight() {
        let heavy = burn_rate(800.0, 1.0, 42000.0, &airframe()).unwrap();
        let light = burn_rate(800.0, 1.0, 21000.0, &airframe()).unwrap();
        assert_relative_eq!(light, heavy / 2.0, epsilon = 1e-9);
    }

    #[test]
    fn test_thin_air_reduces_burn() {
        let sea_level = burn_rate(800.0, 1.0, 42000.0, &airframe()).unwrap();
        let altitude = burn_rate(800.0, 0.64, 42000.0, &airframe()).unwrap();
        assert_relative_eq!(altitude, sea_level * 0.8, epsilon = 1e-9);
    }

    #[test]
    fn test_power_floor() {
        let slow = burn_rate(100.0, 0.3, 42000.0, &airframe()).unwrap();
        assert_relative_eq!(slow, 2000.0 * MIN_POWER_FRACTION, epsilon = 1e-9);
    }

    #[test]
    fn test_invalid_inputs() {
        assert_eq!(
            burn_rate(0.0, 1.0, 42000.0, &airframe()),
            Err(InvalidAirframe::NonPositive {
                field: "tas_kmh",
                value: 0.0
            })
        );
        assert!(burn_rate(800.0, 0.0, 42000.0, &airframe()).is_err());
        assert!(burn_rate(800.0, 1.0, -1.0, &airframe()).is_err());

        let mut bad = airframe();
        bad.reference_burn_kg_h = 0.0;
        assert!(burn_rate(800.0, 1.0, 42000.0, &bad).is_err());
    }

    #[test]
    fn test_efficiency_and_cost() {
        assert_eq!(fuel_efficiency_km_per_kg(1000.0, 0.0), 0.0);
        assert_eq!(fuel_efficiency_km_per_kg(1000.0, 250.0), 4.0);
        assert_eq!(fuel_cost(250.0, 0.8), 200.0);
    }

    #[test]
    fn test_reserve() {
        let reserve = FuelReserve::default();
        assert_relative_eq!(reserve.required_kg(1000.0, 500.0), 300.0, epsilon = 1e-9);
    }

    #[test]
    fn test_speed_schedule() {
        let a = airframe();

        assert_eq!(SpeedSchedule::Cruise.tas_kmh(&a, 500.0), 800.0);
        assert_relative_eq!(SpeedSchedule::DistanceOptimized.tas_kmh(&a, 500.0), 720.0);
        assert_relative_eq!(SpeedSchedule::DistanceOptimized.tas_kmh(&a, 2000.0), 760.0);
        assert_eq!(SpeedSchedule::DistanceOptimized.tas_kmh(&a, 5000.0), 800.0);

        for schedule in SpeedSchedule::iter() {
            assert_eq!(schedule.as_ref().parse::<SpeedSchedule>(), Ok(schedule));
        }
        assert!("DistanceOptimized".parse::<SpeedSchedule>().is_err());
    }
}
