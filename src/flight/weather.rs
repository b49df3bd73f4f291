use serde::Serialize;
use strum::{AsRefStr, Display, EnumIter};

use crate::{
    flight::aero::{atmosphere::AtmosphericReading, wind::WindVector},
    parameters::{self, ParameterMap},
};

/// Flight-condition tier, ordered by severity.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, AsRefStr, Display, EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum FlightCondition {
    Favorable,
    Marginal,
    Adverse,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, AsRefStr, Display, EnumIter)]
#[serde(rename_all = "snake_case")]
pub enum Advisory {
    #[strum(to_string = "strong wind")]
    StrongWind,
    #[strum(to_string = "low pressure")]
    LowPressure,
    #[strum(to_string = "high pressure")]
    HighPressure,
    #[strum(to_string = "limited visibility")]
    LimitedVisibility,
    #[strum(to_string = "extreme cold")]
    ExtremeCold,
    #[strum(to_string = "extreme heat")]
    ExtremeHeat,
}

const STRONG_WIND_KMH: f64 = 72.0;
const LOW_PRESSURE_HPA: f64 = 1000.0;
const HIGH_PRESSURE_HPA: f64 = 1030.0;
const LIMITED_VISIBILITY_M: f64 = 5000.0;
const EXTREME_COLD_C: f64 = -20.0;
const EXTREME_HEAT_C: f64 = 40.0;

/// Below this the wind has no chill effect
const WIND_CHILL_MIN_WIND_KMH: f64 = 4.68;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassifierThresholds {
    pub adverse_wind_kmh: f64,
    pub marginal_wind_kmh: f64,
    pub low_pressure_hpa: f64,
    pub high_pressure_hpa: f64,
    pub min_temperature_c: f64,
    pub max_temperature_c: f64,
    pub adverse_visibility_m: f64,
    pub marginal_visibility_m: f64,
}

impl Default for ClassifierThresholds {
    fn default() -> Self {
        ClassifierThresholds {
            adverse_wind_kmh: 90.0,
            marginal_wind_kmh: 72.0,
            low_pressure_hpa: 963.0,
            high_pressure_hpa: 1063.0,
            min_temperature_c: -40.0,
            max_temperature_c: 50.0,
            adverse_visibility_m: 500.0,
            marginal_visibility_m: 1000.0,
        }
    }
}

impl ClassifierThresholds {
    /// Reads thresholds from a parameter map, keeping the default for any
    /// entry that is not present.
    pub fn from_params(params: &ParameterMap) -> Result<Self, parameters::Error> {
        let defaults = Self::default();
        let float_or = |key: &str, default: f64| -> Result<f64, parameters::Error> {
            match params.get_opt_param(key)? {
                Some(param) => param.value_float(),
                None => Ok(default),
            }
        };

        Ok(ClassifierThresholds {
            adverse_wind_kmh: float_or("adverse_wind_kmh", defaults.adverse_wind_kmh)?,
            marginal_wind_kmh: float_or("marginal_wind_kmh", defaults.marginal_wind_kmh)?,
            low_pressure_hpa: float_or("low_pressure_hpa", defaults.low_pressure_hpa)?,
            high_pressure_hpa: float_or("high_pressure_hpa", defaults.high_pressure_hpa)?,
            min_temperature_c: float_or("min_temperature_c", defaults.min_temperature_c)?,
            max_temperature_c: float_or("max_temperature_c", defaults.max_temperature_c)?,
            adverse_visibility_m: float_or("adverse_visibility_m", defaults.adverse_visibility_m)?,
            marginal_visibility_m: float_or("marginal_visibility_m", defaults.marginal_visibility_m)?,
        })
    }

    /// Visibility is only judged when the reading carries it.
    pub fn classify(&self, reading: &AtmosphericReading, wind: &WindVector) -> FlightCondition {
        let below_visibility =
            |threshold_m: f64| reading.visibility_m.is_some_and(|visibility_m| visibility_m < threshold_m);

        if wind.speed_kmh > self.adverse_wind_kmh || below_visibility(self.adverse_visibility_m) {
            return FlightCondition::Adverse;
        }

        let pressure_off_nominal = reading.pressure_hpa < self.low_pressure_hpa
            || reading.pressure_hpa > self.high_pressure_hpa;
        let temperature_off_nominal =
            !(self.min_temperature_c..=self.max_temperature_c).contains(&reading.temperature_c);

        [
            (wind.speed_kmh > self.marginal_wind_kmh, FlightCondition::Marginal),
            (pressure_off_nominal, FlightCondition::Marginal),
            (temperature_off_nominal, FlightCondition::Marginal),
            (below_visibility(self.marginal_visibility_m), FlightCondition::Marginal),
        ]
        .into_iter()
        .filter_map(|(hit, condition)| hit.then_some(condition))
        .max()
        .unwrap_or(FlightCondition::Favorable)
    }
}

pub fn classify(reading: &AtmosphericReading, wind: &WindVector) -> FlightCondition {
    ClassifierThresholds::default().classify(reading, wind)
}

pub fn advisories(reading: &AtmosphericReading, wind: &WindVector) -> Vec<Advisory> {
    let mut advisories = vec![];

    if wind.speed_kmh > STRONG_WIND_KMH {
        advisories.push(Advisory::StrongWind);
    }

    if reading.pressure_hpa < LOW_PRESSURE_HPA {
        advisories.push(Advisory::LowPressure);
    } else if reading.pressure_hpa > HIGH_PRESSURE_HPA {
        advisories.push(Advisory::HighPressure);
    }

    if reading
        .visibility_m
        .is_some_and(|visibility_m| visibility_m < LIMITED_VISIBILITY_M)
    {
        advisories.push(Advisory::LimitedVisibility);
    }

    if reading.temperature_c < EXTREME_COLD_C {
        advisories.push(Advisory::ExtremeCold);
    } else if reading.temperature_c > EXTREME_HEAT_C {
        advisories.push(Advisory::ExtremeHeat);
    }

    advisories
}

/// Felt temperature in the wind. The air temperature is returned unchanged in
/// near-calm air.
pub fn wind_chill_c(temperature_c: f64, wind_speed_kmh: f64) -> f64 {
    if wind_speed_kmh < WIND_CHILL_MIN_WIND_KMH {
        return temperature_c;
    }

    let v = wind_speed_kmh.powf(0.16);

    13.12 + 0.6215 * temperature_c - 11.37 * v + 0.3965 * temperature_c * v
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use pretty_assertions::assert_eq;
    use strum::IntoEnumIterator;

    use super::*;
    use crate::parameters::parameters::parse_string;

    fn reading(temperature_c: f64, pressure_hpa: f64) -> AtmosphericReading {
        AtmosphericReading::new(temperature_c, pressure_hpa, None).unwrap()
    }

    fn wind(speed_kmh: f64) -> WindVector {
        WindVector::from_bearing(speed_kmh, 0.0).unwrap()
    }

    #[test]
    fn test_nominal_conditions_are_favorable() {
        assert_eq!(classify(&reading(15.0, 1013.0), &wind(20.0)), FlightCondition::Favorable);
    }

    #[test]
    fn test_strong_wind_is_adverse_regardless() {
        for (t, p) in [(15.0, 1013.0), (-60.0, 900.0), (55.0, 1080.0)] {
            assert_eq!(classify(&reading(t, p), &wind(120.0)), FlightCondition::Adverse);
        }
    }

    #[test]
    fn test_marginal_rules() {
        assert_eq!(classify(&reading(15.0, 950.0), &wind(10.0)), FlightCondition::Marginal);
        assert_eq!(classify(&reading(15.0, 1070.0), &wind(10.0)), FlightCondition::Marginal);
        assert_eq!(classify(&reading(-45.0, 1013.0), &wind(10.0)), FlightCondition::Marginal);
        assert_eq!(classify(&reading(52.0, 1013.0), &wind(10.0)), FlightCondition::Marginal);
        assert_eq!(classify(&reading(15.0, 1013.0), &wind(80.0)), FlightCondition::Marginal);
        assert_eq!(classify(&reading(-45.0, 950.0), &wind(80.0)), FlightCondition::Marginal);
    }

    #[test]
    fn test_thresholds_are_exclusive() {
        assert_eq!(classify(&reading(50.0, 963.0), &wind(72.0)), FlightCondition::Favorable);
        assert_eq!(classify(&reading(15.0, 1013.0), &wind(90.0)), FlightCondition::Marginal);
    }

    #[test]
    fn test_factor_wind_uses_speed() {
        let gusty = WindVector::from_factor(100.0, 0.9).unwrap();
        assert_eq!(classify(&reading(15.0, 1013.0), &gusty), FlightCondition::Adverse);
        assert_eq!(
            classify(&reading(15.0, 1013.0), &WindVector::calm()),
            FlightCondition::Favorable
        );
    }

    #[test]
    fn test_classification_is_total() {
        let tiers: Vec<_> = FlightCondition::iter().collect();

        for t in [-90.0, -40.0, 0.0, 15.0, 50.0, 60.0] {
            for p in [100.0, 963.0, 1013.0, 1100.0] {
                for w in [0.0, 50.0, 72.5, 90.5, 300.0] {
                    let condition = classify(&reading(t, p), &wind(w));
                    assert!(tiers.contains(&condition));
                    assert_eq!(condition, classify(&reading(t, p), &wind(w)));
                }
            }
        }
    }

    #[test]
    fn test_severity_order() {
        assert!(FlightCondition::Adverse > FlightCondition::Marginal);
        assert!(FlightCondition::Marginal > FlightCondition::Favorable);
        assert_eq!(FlightCondition::Marginal.to_string(), "marginal");
    }

    #[test]
    fn test_advisories() {
        assert_eq!(advisories(&reading(15.0, 1013.0), &wind(20.0)), vec![]);
        assert_eq!(
            advisories(&reading(-25.0, 990.0), &wind(80.0)),
            vec![Advisory::StrongWind, Advisory::LowPressure, Advisory::ExtremeCold]
        );
        assert_eq!(
            advisories(&reading(45.0, 1035.0), &wind(0.0)),
            vec![Advisory::HighPressure, Advisory::ExtremeHeat]
        );
        assert_eq!(Advisory::StrongWind.to_string(), "strong wind");
    }

    #[test]
    fn test_visibility_tiers() {
        let seen = |visibility_m: f64| reading(15.0, 1013.0).with_visibility(visibility_m).unwrap();

        assert_eq!(classify(&seen(300.0), &wind(10.0)), FlightCondition::Adverse);
        assert_eq!(classify(&seen(800.0), &wind(10.0)), FlightCondition::Marginal);
        assert_eq!(classify(&seen(500.0), &wind(10.0)), FlightCondition::Marginal);
        assert_eq!(classify(&seen(1000.0), &wind(10.0)), FlightCondition::Favorable);
        assert_eq!(classify(&seen(20000.0), &wind(10.0)), FlightCondition::Favorable);

        // Fog makes an otherwise marginal leg adverse
        assert_eq!(classify(&seen(100.0), &wind(80.0)), FlightCondition::Adverse);
    }

    #[test]
    fn test_limited_visibility_advisory() {
        let seen = |visibility_m: f64| reading(15.0, 1013.0).with_visibility(visibility_m).unwrap();

        assert_eq!(advisories(&seen(4000.0), &wind(10.0)), vec![Advisory::LimitedVisibility]);
        assert_eq!(advisories(&seen(5000.0), &wind(10.0)), vec![]);
        assert_eq!(
            advisories(&reading(-25.0, 990.0).with_visibility(800.0).unwrap(), &wind(80.0)),
            vec![
                Advisory::StrongWind,
                Advisory::LowPressure,
                Advisory::LimitedVisibility,
                Advisory::ExtremeCold
            ]
        );
        assert_eq!(Advisory::LimitedVisibility.to_string(), "limited visibility");
    }

    #[test]
    fn test_wind_chill() {
        assert_relative_eq!(wind_chill_c(5.0, 54.0), -1.5444, epsilon = 1e-4);
        assert_relative_eq!(wind_chill_c(-10.0, 30.0), -19.5205, epsilon = 1e-4);

        assert_eq!(wind_chill_c(5.0, 0.0), 5.0);
        assert_eq!(wind_chill_c(-10.0, 4.0), -10.0);

        assert!(wind_chill_c(-10.0, 60.0) < wind_chill_c(-10.0, 20.0));
    }

    #[test]
    fn test_thresholds_from_params() {
        let params = parse_string("adverse_wind_kmh = { val = 60.0, type = \"float\" }").unwrap();
        let thresholds = ClassifierThresholds::from_params(&params).unwrap();

        assert_eq!(thresholds.adverse_wind_kmh, 60.0);
        assert_eq!(thresholds.low_pressure_hpa, 963.0);
        assert_eq!(thresholds.adverse_visibility_m, 500.0);
        assert_eq!(
            thresholds.classify(&reading(15.0, 1013.0), &wind(65.0)),
            FlightCondition::Adverse
        );
    }
}
