//! Atmosphere model.
//!
//! Readings are reference observations (surface temperature and sea-level
//! corrected pressure) paired with the altitude at which a leg is flown. The
//! observation is projected to altitude by keeping its deviation from the
//! standard day: the temperature offset is carried unchanged and the pressure
//! is scaled by the observed/standard ratio.

use std::ops::RangeInclusive;

use serde::Serialize;
use thiserror::Error;

/// Standard sea-level pressure
pub const PRESSURE_0_HPA: f64 = 1013.25;
/// Standard sea-level temperature
pub const TEMPERATURE_0_C: f64 = 15.0;
/// Standard sea-level density
pub const DENSITY_0_KG_M3: f64 = 1.2250;

pub const TEMPERATURE_RANGE_C: RangeInclusive<f64> = -90.0..=60.0;
pub const ALTITUDE_RANGE_M: RangeInclusive<f64> = -500.0..=20000.0;

const KELVIN_OFFSET: f64 = 273.15;
const HEAT_CAPACITY_RATIO: f64 = 1.4;

#[derive(Debug, Clone, Copy, Error, PartialEq)]
pub enum InvalidReading {
    #[error("Pressure must be positive, got {0} hPa")]
    Pressure(f64),

    #[error("Temperature {0} °C is outside the plausible range")]
    Temperature(f64),

    #[error("Altitude {0} m is outside the supported range")]
    Altitude(f64),

    #[error("Visibility must be non-negative, got {0} m")]
    Visibility(f64),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AtmosphericReading {
    pub temperature_c: f64,
    pub pressure_hpa: f64,
    pub altitude_m: f64,
    /// Horizontal visibility, when observed
    pub visibility_m: Option<f64>,
}

impl AtmosphericReading {
    /// Builds a validated reading. A missing altitude means sea level.
    pub fn new(
        temperature_c: f64,
        pressure_hpa: f64,
        altitude_m: Option<f64>,
    ) -> Result<Self, InvalidReading> {
        let reading = AtmosphericReading {
            temperature_c,
            pressure_hpa,
            altitude_m: altitude_m.unwrap_or(0.0),
            visibility_m: None,
        };
        reading.validate()?;

        Ok(reading)
    }

    pub fn with_visibility(mut self, visibility_m: f64) -> Result<Self, InvalidReading> {
        self.visibility_m = Some(visibility_m);
        self.validate()?;

        Ok(self)
    }

    /// Standard day at sea level.
    pub fn standard() -> Self {
        AtmosphericReading {
            temperature_c: TEMPERATURE_0_C,
            pressure_hpa: PRESSURE_0_HPA,
            altitude_m: 0.0,
            visibility_m: None,
        }
    }

    pub fn validate(&self) -> Result<(), InvalidReading> {
        if !(self.pressure_hpa.is_finite() && self.pressure_hpa > 0.0) {
            return Err(InvalidReading::Pressure(self.pressure_hpa));
        }
        if !TEMPERATURE_RANGE_C.contains(&self.temperature_c) {
            return Err(InvalidReading::Temperature(self.temperature_c));
        }
        if !ALTITUDE_RANGE_M.contains(&self.altitude_m) {
            return Err(InvalidReading::Altitude(self.altitude_m));
        }
        if let Some(visibility_m) = self.visibility_m.filter(|v| !(v.is_finite() && *v >= 0.0)) {
            return Err(InvalidReading::Visibility(visibility_m));
        }
        Ok(())
    }

    pub fn temperature_offset_k(&self) -> f64 {
        self.temperature_c - TEMPERATURE_0_C
    }

    pub fn pressure_ratio(&self) -> f64 {
        self.pressure_hpa / PRESSURE_0_HPA
    }
}

pub trait Atmosphere {
    fn pressure_pa(&self, alt_m: f64) -> f64;
    fn temperature_k(&self, alt_m: f64) -> f64;
    fn specific_gas_constant(&self) -> f64;

    fn density_kg_m3(&self, alt_m: f64) -> f64 {
        self.pressure_pa(alt_m) / (self.specific_gas_constant() * self.temperature_k(alt_m))
    }

    fn speed_of_sound_m_s(&self, alt_m: f64) -> f64 {
        f64::sqrt(HEAT_CAPACITY_RATIO * self.specific_gas_constant() * self.temperature_k(alt_m))
    }

    fn properties(&self, alt_m: f64) -> AtmosphereProperties {
        AtmosphereProperties {
            pressure_pa: self.pressure_pa(alt_m),
            air_density_kg_m3: self.density_kg_m3(alt_m),
            temperature_k: self.temperature_k(alt_m),
            speed_of_sound_m_s: self.speed_of_sound_m_s(alt_m),
        }
    }
}

pub fn mach_number(tas_kmh: f64, speed_of_sound_m_s: f64) -> f64 {
    tas_kmh / 3.6 / speed_of_sound_m_s
}

#[derive(Debug, Clone, PartialEq)]
pub struct AtmosphereProperties {
    pub pressure_pa: f64,
    pub air_density_kg_m3: f64,
    pub temperature_k: f64,
    pub speed_of_sound_m_s: f64,
}

/// Two-layer ISA: constant lapse rate up to the tropopause, isothermal above.
#[derive(Debug, Clone)]
pub struct AtmosphereIsa {
    pressure_0: f64,
    temperature_0: f64,
    g_0: f64,
    specific_gas_constant: f64,
    a: f64,
    tropopause_m: f64,
}

impl Default for AtmosphereIsa {
    fn default() -> Self {
        AtmosphereIsa {
            pressure_0: PRESSURE_0_HPA * 100.0,
            temperature_0: TEMPERATURE_0_C + KELVIN_OFFSET,
            g_0: 9.80665,
            specific_gas_constant: 287.052874,
            a: -0.0065,
            tropopause_m: 11000.0,
        }
    }
}

impl AtmosphereIsa {
    pub fn pressure_0_pa(&self) -> f64 {
        self.pressure_0
    }

    pub fn temperature_0_k(&self) -> f64 {
        self.temperature_0
    }

    fn troposphere_pressure(&self, t: f64) -> f64 {
        let exponent = -self.g_0 / (self.a * self.specific_gas_constant);
        (t / self.temperature_0).powf(exponent) * self.pressure_0
    }
}

impl Atmosphere for AtmosphereIsa {
    fn pressure_pa(&self, alt_m: f64) -> f64 {
        let t = self.temperature_k(alt_m);
        if alt_m <= self.tropopause_m {
            self.troposphere_pressure(t)
        } else {
            let dh = alt_m - self.tropopause_m;
            self.troposphere_pressure(t) * (-self.g_0 * dh / (self.specific_gas_constant * t)).exp()
        }
    }

    fn temperature_k(&self, alt_m: f64) -> f64 {
        self.temperature_0 + self.a * alt_m.min(self.tropopause_m)
    }

    fn specific_gas_constant(&self) -> f64 {
        self.specific_gas_constant
    }
}

/// Standard atmosphere shifted by the deviation of an observed reading.
#[derive(Debug, Clone)]
pub struct ObservedAtmosphere {
    isa: AtmosphereIsa,
    temperature_offset_k: f64,
    pressure_ratio: f64,
}

impl ObservedAtmosphere {
    pub fn new(reading: &AtmosphericReading) -> Result<Self, InvalidReading> {
        reading.validate()?;

        Ok(ObservedAtmosphere {
            isa: AtmosphereIsa::default(),
            temperature_offset_k: reading.temperature_offset_k(),
            pressure_ratio: reading.pressure_ratio(),
        })
    }
}

impl Atmosphere for ObservedAtmosphere {
    fn pressure_pa(&self, alt_m: f64) -> f64 {
        self.isa.pressure_pa(alt_m) * self.pressure_ratio
    }

    fn temperature_k(&self, alt_m: f64) -> f64 {
        self.isa.temperature_k(alt_m) + self.temperature_offset_k
    }

    fn specific_gas_constant(&self) -> f64 {
        self.isa.specific_gas_constant
    }
}

/// Air density at the reading's altitude relative to standard sea-level
/// density. Exactly 1.0 for [`AtmosphericReading::standard`].
pub fn density_factor(reading: &AtmosphericReading) -> Result<f64, InvalidReading> {
    let atmosphere = ObservedAtmosphere::new(reading)?;
    let isa = &atmosphere.isa;
    let alt_m = reading.altitude_m;

    Ok((atmosphere.pressure_pa(alt_m) / isa.pressure_0_pa())
        * (isa.temperature_0_k() / atmosphere.temperature_k(alt_m)))
}

/// Air properties at the reading's altitude.
pub fn properties(reading: &AtmosphericReading) -> Result<AtmosphereProperties, InvalidReading> {
    Ok(ObservedAtmosphere::new(reading)?.properties(reading.altitude_m))
}

/// ISA pressure at the given altitude.
pub fn standard_pressure_hpa(alt_m: f64) -> f64 {
    AtmosphereIsa::default().pressure_pa(alt_m) / 100.0
}
