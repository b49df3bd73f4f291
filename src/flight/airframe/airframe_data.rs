use anyhow::Result;
use serde::Serialize;
use thiserror::Error;

use crate::parameters::{self, ParameterMap};

#[derive(Debug, Clone, Error, PartialEq)]
pub enum InvalidAirframe {
    #[error("'{field}' must be positive and finite, got {value}")]
    NonPositive { field: &'static str, value: f64 },

    #[error("Unknown airframe preset '{0}'")]
    UnknownPreset(String),
}

/// Performance characteristics of an aircraft type.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AirframeProfile {
    pub name: String,
    pub cruise_tas_kmh: f64,
    /// Burn at cruise TAS, sea-level standard density and reference weight
    pub reference_burn_kg_h: f64,
    pub reference_weight_kg: f64,
    pub empty_weight_kg: f64,
    pub fuel_capacity_kg: f64,
}

pub const PRESETS: [&str; 5] = [
    "boeing_737",
    "airbus_a320",
    "boeing_777",
    "airbus_a380",
    "cessna_172",
];

pub(crate) fn check_positive(field: &'static str, value: f64) -> Result<(), InvalidAirframe> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(InvalidAirframe::NonPositive { field, value })
    }
}

impl AirframeProfile {
    /// Builds a validated profile whose reference weight is the fully fuelled
    /// weight.
    pub fn new(
        name: &str,
        cruise_tas_kmh: f64,
        reference_burn_kg_h: f64,
        empty_weight_kg: f64,
        fuel_capacity_kg: f64,
    ) -> Result<Self, InvalidAirframe> {
        let profile = AirframeProfile {
            name: name.to_string(),
            cruise_tas_kmh,
            reference_burn_kg_h,
            reference_weight_kg: empty_weight_kg + fuel_capacity_kg,
            empty_weight_kg,
            fuel_capacity_kg,
        };
        profile.validate()?;

        Ok(profile)
    }

    pub fn with_reference_weight(mut self, reference_weight_kg: f64) -> Result<Self, InvalidAirframe> {
        self.reference_weight_kg = reference_weight_kg;
        self.validate()?;

        Ok(self)
    }

    pub fn validate(&self) -> Result<(), InvalidAirframe> {
        check_positive("cruise_tas_kmh", self.cruise_tas_kmh)?;
        check_positive("reference_burn_kg_h", self.reference_burn_kg_h)?;
        check_positive("reference_weight_kg", self.reference_weight_kg)?;
        check_positive("empty_weight_kg", self.empty_weight_kg)?;
        check_positive("fuel_capacity_kg", self.fuel_capacity_kg)?;

        Ok(())
    }

    pub fn preset(name: &str) -> Result<Self, InvalidAirframe> {
        match name {
            "boeing_737" => Self::new("Boeing 737", 800.0, 2500.0, 41400.0, 20800.0),
            "airbus_a320" => Self::new("Airbus A320", 820.0, 2400.0, 42600.0, 19200.0),
            "boeing_777" => Self::new("Boeing 777", 900.0, 7000.0, 138100.0, 144000.0),
            "airbus_a380" => Self::new("Airbus A380", 900.0, 11000.0, 277000.0, 256000.0),
            "cessna_172" => Self::new("Cessna 172", 200.0, 28.0, 767.0, 160.0),
            unknown => Err(InvalidAirframe::UnknownPreset(unknown.to_string())),
        }
    }

    /// Reads a profile from a parameter map such as `airframes.<key>`.
    /// `reference_weight_kg` and `name` are optional.
    pub fn from_params(key: &str, params: &ParameterMap) -> Result<Self> {
        let name = match params.get_opt_param("name")? {
            Some(name) => name.value_string()?.to_string(),
            None => key.to_string(),
        };

        let profile = Self::new(
            &name,
            params.get_param("cruise_tas_kmh")?.value_float()?,
            params.get_param("reference_burn_kg_h")?.value_float()?,
            params.get_param("empty_weight_kg")?.value_float()?,
            params.get_param("fuel_capacity_kg")?.value_float()?,
        )?;

        match params.get_opt_param("reference_weight_kg")? {
            Some(weight) => Ok(profile.with_reference_weight(weight.value_float()?)?),
            None => Ok(profile),
        }
    }

    /// Looks the airframe up under `airframes.<key>` in the parameters,
    /// falling back to the built-in presets.
    pub fn lookup(key: &str, params: &ParameterMap) -> Result<Self> {
        let path = format!("airframes.{key}");

        match params.get_map(&path) {
            Ok(map) => Self::from_params(key, map),
            Err(parameters::Error::NotFound { .. }) => Ok(Self::preset(key)?),
            Err(e) => Err(e.into()),
        }
    }
}

/// Every airframe key that [`AirframeProfile::lookup`] can resolve: the
/// presets, then the airframes defined in the parameters.
pub fn available_keys(params: &ParameterMap) -> Result<Vec<String>, parameters::Error> {
    let mut keys: Vec<String> = PRESETS.iter().map(|key| key.to_string()).collect();

    let defined = match params.get_map("airframes") {
        Ok(airframes) => airframes.keys().map(str::to_string).collect(),
        Err(parameters::Error::NotFound { .. }) => vec![],
        Err(e) => return Err(e),
    };

    for key in defined {
        if !keys.contains(&key) {
            keys.push(key);
        }
    }

    Ok(keys)
}
