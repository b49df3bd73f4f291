use std::str::FromStr;

use anyhow::{Result, anyhow};
use log::{debug, info, warn};
use serde::Serialize;
use thiserror::Error;

use super::{
    aero::{
        atmosphere::{density_factor, mach_number, properties},
        wind::{self, WindVector},
    },
    airframe::{
        AirframeProfile, InvalidAirframe,
        fuel::{FuelReserve, SpeedSchedule, burn_rate},
    },
    flight_output::{FlightResult, FlightStatus, LegBreakdown, LegStatus},
    route::{LegError, Route, RouteLeg},
    weather::{ClassifierThresholds, advisories},
};
use crate::parameters::{self, ParameterMap};

#[derive(Debug, Clone, Error, PartialEq)]
pub enum Error {
    #[error("Route '{0}' has no legs")]
    EmptyRoute(String),

    #[error("Invalid airframe")]
    InvalidAirframe(#[from] InvalidAirframe),

    #[error("Fuel load of {fuel_kg} kg does not fit in a capacity of {capacity_kg} kg")]
    InvalidFuelLoad { fuel_kg: f64, capacity_kg: f64 },

    #[error("Payload must be non-negative and finite, got {0} kg")]
    InvalidPayload(f64),

    #[error("Error in leg {index}")]
    Leg {
        index: usize,
        #[source]
        source: LegError,
    },
}

impl Error {
    fn leg(index: usize, source: impl Into<LegError>) -> Self {
        Error::Leg {
            index,
            source: source.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PlannerConfig {
    pub reserve: FuelReserve,
    pub speed: SpeedSchedule,
    pub thresholds: ClassifierThresholds,
}

impl PlannerConfig {
    /// Reads the `planner` section of the parameters. Every entry is optional.
    pub fn from_params(params: &ParameterMap) -> Result<Self> {
        let mut config = Self::default();

        if params.contains_key("reserve") {
            config.reserve = FuelReserve::from_params(params.get_map("reserve")?)?;
        }

        if params.contains_key("thresholds") {
            config.thresholds = ClassifierThresholds::from_params(params.get_map("thresholds")?)?;
        }

        if let Some(speed) = params.get_opt_param("speed_schedule")? {
            let name = speed.value_string()?;
            config.speed = SpeedSchedule::from_str(name)
                .map_err(|_| anyhow!("Unknown speed schedule '{name}'"))?;
        }

        Ok(config)
    }

    /// Reads the `planner` section if the parameters have one.
    pub fn lookup(params: &ParameterMap) -> Result<Self> {
        match params.get_map("planner") {
            Ok(planner_params) => Self::from_params(planner_params),
            Err(parameters::Error::NotFound { .. }) => Ok(Self::default()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Feasibility phase of a planning call. Later phases absorb earlier ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Phase {
    Pending,
    Advancing,
    NonAdvancing,
    Exhausted,
}

/// Inputs shared by every leg of a planning call
struct LegContext<'a> {
    airframe: &'a AirframeProfile,
    thresholds: &'a ClassifierThresholds,
    tas_kmh: f64,
    payload_kg: f64,
}

#[derive(Debug, Clone)]
struct Accumulator {
    phase: Phase,
    fuel_on_board_kg: f64,
    fuel_used_kg: f64,
    time_h: f64,
    distance_flown_km: f64,
    legs: Vec<LegBreakdown>,
    non_advancing: Vec<usize>,
    exhausted_at: Option<usize>,
}

impl Accumulator {
    fn new(fuel_kg: f64, num_legs: usize) -> Self {
        Accumulator {
            phase: Phase::Pending,
            fuel_on_board_kg: fuel_kg,
            fuel_used_kg: 0.0,
            time_h: 0.0,
            distance_flown_km: 0.0,
            legs: Vec::with_capacity(num_legs),
            non_advancing: vec![],
            exhausted_at: None,
        }
    }

    fn weight_kg(&self, ctx: &LegContext) -> f64 {
        ctx.airframe.empty_weight_kg + ctx.payload_kg + self.fuel_on_board_kg
    }

    /// Legs after the exhaustion point are neither validated nor recorded.
    fn step(mut self, index: usize, leg: &RouteLeg, ctx: &LegContext) -> Result<Self, Error> {
        if self.phase == Phase::Exhausted {
            return Ok(self);
        }

        if !(leg.distance_km.is_finite() && leg.distance_km >= 0.0) {
            return Err(Error::leg(index, LegError::Distance(leg.distance_km)));
        }
        let density_factor = density_factor(&leg.reading).map_err(|e| Error::leg(index, e))?;
        let correction = wind::correct(ctx.tas_kmh, &leg.wind).map_err(|e| Error::leg(index, e))?;
        let air = properties(&leg.reading).map_err(|e| Error::leg(index, e))?;

        let gs_kmh = correction.ground_speed_kmh;
        let burn_rate_kg_h = burn_rate(ctx.tas_kmh, density_factor, self.weight_kg(ctx), ctx.airframe)?;

        // An empty tank ends the flight even on legs that need no fuel
        let (status, time_h, fuel_kg, distance_flown_km) = if self.fuel_on_board_kg <= 0.0 {
            (LegStatus::Exhausted, Some(0.0), 0.0, 0.0)
        } else if leg.distance_km == 0.0 {
            (LegStatus::Advancing, Some(0.0), 0.0, 0.0)
        } else if !correction.is_advancing() {
            (LegStatus::NonAdvancing, None, 0.0, 0.0)
        } else {
            let time_h = leg.distance_km / gs_kmh;
            let fuel_kg = burn_rate_kg_h * time_h;

            if fuel_kg > self.fuel_on_board_kg {
                let partial_time_h = self.fuel_on_board_kg / burn_rate_kg_h;
                (
                    LegStatus::Exhausted,
                    Some(partial_time_h),
                    self.fuel_on_board_kg,
                    gs_kmh * partial_time_h,
                )
            } else {
                (LegStatus::Advancing, Some(time_h), fuel_kg, leg.distance_km)
            }
        };

        match status {
            LegStatus::Advancing => {
                self.phase = self.phase.max(Phase::Advancing);
            }
            LegStatus::NonAdvancing => {
                warn!(
                    "Leg {index} ({} -> {}) cannot advance: ground speed is zero",
                    leg.from.ident, leg.to.ident
                );
                self.phase = self.phase.max(Phase::NonAdvancing);
                self.non_advancing.push(index);
            }
            LegStatus::Exhausted => {
                warn!(
                    "Fuel exhausted on leg {index} ({} -> {}) after {distance_flown_km:.1} of {:.1} km",
                    leg.from.ident, leg.to.ident, leg.distance_km
                );
                self.phase = Phase::Exhausted;
                self.exhausted_at = Some(index);
            }
        }

        if status == LegStatus::Exhausted {
            self.fuel_on_board_kg = 0.0;
        } else {
            self.fuel_on_board_kg -= fuel_kg;
        }
        self.fuel_used_kg += fuel_kg;
        self.time_h += time_h.unwrap_or(0.0);
        self.distance_flown_km += distance_flown_km;

        let breakdown = LegBreakdown {
            index,
            from: leg.from.ident.clone(),
            to: leg.to.ident.clone(),
            distance_km: leg.distance_km,
            distance_flown_km,
            true_airspeed_kmh: ctx.tas_kmh,
            ground_speed_kmh: gs_kmh,
            density_factor,
            air_density_kg_m3: air.air_density_kg_m3,
            mach: mach_number(ctx.tas_kmh, air.speed_of_sound_m_s),
            burn_rate_kg_h,
            time_h,
            fuel_kg,
            weight_end_kg: self.weight_kg(ctx),
            condition: ctx.thresholds.classify(&leg.reading, &leg.wind),
            advisories: advisories(&leg.reading, &leg.wind),
            status,
        };

        debug!(
            "Leg {index}: {:.1} km, gs {gs_kmh:.1} km/h, sigma {density_factor:.4}, burn {burn_rate_kg_h:.1} kg/h, fuel {fuel_kg:.1} kg, {}",
            leg.distance_km, breakdown.condition
        );

        self.legs.push(breakdown);

        Ok(self)
    }

    fn finish(self, route: &Route, ctx: &LegContext, reserve: &FuelReserve) -> FlightResult {
        let status = match self.phase {
            Phase::Exhausted => FlightStatus::FuelExhausted,
            Phase::NonAdvancing => FlightStatus::NonAdvancing,
            Phase::Pending | Phase::Advancing => FlightStatus::Complete,
        };
        let feasible = status == FlightStatus::Complete;

        // Hold at the trip's average burn
        let holding_burn_kg_h = if self.time_h > 0.0 {
            self.fuel_used_kg / self.time_h
        } else {
            ctx.airframe.reference_burn_kg_h
        };
        let reserve_fuel_kg = reserve.required_kg(self.fuel_used_kg, holding_burn_kg_h);

        FlightResult {
            route: route.name.clone(),
            airframe: ctx.airframe.name.clone(),
            total_time_h: self.time_h,
            total_fuel_kg: self.fuel_used_kg,
            distance_flown_km: self.distance_flown_km,
            remaining_fuel_kg: self.fuel_on_board_kg,
            final_weight_kg: self.weight_kg(ctx),
            feasible,
            status,
            exhausted_at: self.exhausted_at,
            non_advancing: self.non_advancing,
            reserve_fuel_kg,
            meets_reserve: feasible && self.fuel_on_board_kg >= reserve_fuel_kg,
            legs: self.legs,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct TrajectoryPlanner {
    config: PlannerConfig,
}

impl TrajectoryPlanner {
    pub fn new(config: PlannerConfig) -> Self {
        TrajectoryPlanner { config }
    }

    /// Plans the route with full tanks.
    pub fn plan(&self, route: &Route, airframe: &AirframeProfile) -> Result<FlightResult, Error> {
        self.plan_with_fuel(route, airframe, airframe.fuel_capacity_kg)
    }

    pub fn plan_with_fuel(
        &self,
        route: &Route,
        airframe: &AirframeProfile,
        fuel_kg: f64,
    ) -> Result<FlightResult, Error> {
        self.plan_with_load(route, airframe, fuel_kg, 0.0)
    }

    /// Plans the route with the given fuel and payload on board at departure.
    pub fn plan_with_load(
        &self,
        route: &Route,
        airframe: &AirframeProfile,
        fuel_kg: f64,
        payload_kg: f64,
    ) -> Result<FlightResult, Error> {
        airframe.validate()?;

        if route.legs.is_empty() {
            return Err(Error::EmptyRoute(route.name.clone()));
        }

        if !(fuel_kg.is_finite() && (0.0..=airframe.fuel_capacity_kg).contains(&fuel_kg)) {
            return Err(Error::InvalidFuelLoad {
                fuel_kg,
                capacity_kg: airframe.fuel_capacity_kg,
            });
        }

        if !(payload_kg.is_finite() && payload_kg >= 0.0) {
            return Err(Error::InvalidPayload(payload_kg));
        }

        let ctx = LegContext {
            airframe,
            thresholds: &self.config.thresholds,
            tas_kmh: self.config.speed.tas_kmh(airframe, route.total_distance_km()),
            payload_kg,
        };

        info!(
            "Planning route '{}' ({} legs, {:.1} km) for {} at {:.1} km/h with {fuel_kg:.1} kg of fuel and {payload_kg:.1} kg of payload",
            route.name,
            route.legs.len(),
            route.total_distance_km(),
            airframe.name,
            ctx.tas_kmh
        );

        let result = route
            .legs
            .iter()
            .enumerate()
            .try_fold(
                Accumulator::new(fuel_kg, route.legs.len()),
                |acc, (index, leg)| acc.step(index, leg, &ctx),
            )?
            .finish(route, &ctx, &self.config.reserve);

        if result.feasible {
            info!(
                "Route '{}': {:.3} h, {:.1} kg of fuel, {:.1} kg remaining",
                result.route, result.total_time_h, result.total_fuel_kg, result.remaining_fuel_kg
            );
        } else {
            warn!(
                "Route '{}' is not feasible for {}: {}",
                result.route, result.airframe, result.status
            );
        }

        Ok(result)
    }
}

/// Plans the route with full tanks and the default configuration.
pub fn plan(route: &Route, airframe: &AirframeProfile) -> Result<FlightResult, Error> {
    TrajectoryPlanner::default().plan(route, airframe)
}

/// Quick time estimate for a distance flown at a given speed, with the wind
/// expressed as a factor on that speed.
pub fn flight_time(distance_km: f64, speed_kmh: f64, wind_factor: f64) -> Result<f64, LegError> {
    if !(distance_km.is_finite() && distance_km >= 0.0) {
        return Err(LegError::Distance(distance_km));
    }

    let wind = WindVector::from_factor(0.0, wind_factor)?;

    Ok(distance_km / wind::ground_speed(speed_kmh, &wind)?)
}
