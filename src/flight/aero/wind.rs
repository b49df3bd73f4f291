use nalgebra::Vector2;
use serde::Serialize;
use thiserror::Error;

pub const WIND_FACTOR_MAX: f64 = 2.0;

#[derive(Debug, Clone, Copy, Error, PartialEq)]
pub enum InvalidWind {
    #[error("Wind speed must be non-negative, got {0} km/h")]
    Speed(f64),

    #[error("Relative wind bearing must be within 0..=360 deg, got {0}")]
    Bearing(f64),

    #[error("Wind factor must be within (0, 2], got {0}")]
    Factor(f64),

    #[error("True airspeed must be positive, got {0} km/h")]
    Airspeed(f64),
}

/// How the wind acts on the aircraft along its track.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WindEffect {
    /// Direction the wind blows from, relative to the direction of travel:
    /// 0 deg is a pure headwind, 180 deg a pure tailwind.
    Bearing { relative_bearing_deg: f64 },
    /// Pre-computed multiplier on true airspeed, 1.0 meaning no effect.
    Factor { factor: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WindVector {
    pub speed_kmh: f64,
    pub effect: WindEffect,
}

impl WindVector {
    pub fn from_bearing(speed_kmh: f64, relative_bearing_deg: f64) -> Result<Self, InvalidWind> {
        let wind = WindVector {
            speed_kmh,
            effect: WindEffect::Bearing {
                relative_bearing_deg,
            },
        };
        wind.validate()?;

        Ok(wind)
    }

    /// `speed_kmh` is only used to classify the weather, the factor alone
    /// drives the ground speed.
    pub fn from_factor(speed_kmh: f64, factor: f64) -> Result<Self, InvalidWind> {
        let wind = WindVector {
            speed_kmh,
            effect: WindEffect::Factor { factor },
        };
        wind.validate()?;

        Ok(wind)
    }

    pub fn calm() -> Self {
        WindVector {
            speed_kmh: 0.0,
            effect: WindEffect::Factor { factor: 1.0 },
        }
    }

    pub fn validate(&self) -> Result<(), InvalidWind> {
        if !(self.speed_kmh.is_finite() && self.speed_kmh >= 0.0) {
            return Err(InvalidWind::Speed(self.speed_kmh));
        }

        match self.effect {
            WindEffect::Bearing {
                relative_bearing_deg,
            } if !(0.0..=360.0).contains(&relative_bearing_deg) => {
                Err(InvalidWind::Bearing(relative_bearing_deg))
            }
            WindEffect::Factor { factor } if !(factor > 0.0 && factor <= WIND_FACTOR_MAX) => {
                Err(InvalidWind::Factor(factor))
            }
            _ => Ok(()),
        }
    }

    /// Wind velocity in the track frame (x forward, y to the right).
    /// `None` when only a scalar factor is known.
    pub fn velocity_track_kmh(&self) -> Option<Vector2<f64>> {
        match self.effect {
            WindEffect::Bearing {
                relative_bearing_deg,
            } => Some(track_velocity(self.speed_kmh, relative_bearing_deg)),
            WindEffect::Factor { .. } => None,
        }
    }
}

fn track_velocity(speed_kmh: f64, relative_bearing_deg: f64) -> Vector2<f64> {
    let theta = relative_bearing_deg.to_radians();
    -speed_kmh * Vector2::new(theta.cos(), theta.sin())
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WindCorrection {
    pub ground_speed_kmh: f64,
    /// Positive against the direction of travel, negative for a tailwind
    pub headwind_kmh: f64,
    pub crosswind_kmh: f64,
    /// Crab angle needed to hold the track
    pub correction_angle_deg: f64,
}

impl WindCorrection {
    /// False when the wind cancels all forward progress.
    pub fn is_advancing(&self) -> bool {
        self.ground_speed_kmh > 0.0
    }
}

/// Resolves the wind triangle for the given true airspeed. A ground speed
/// that would be negative, or a crosswind the aircraft cannot crab into, is
/// clamped to zero.
pub fn correct(tas_kmh: f64, wind: &WindVector) -> Result<WindCorrection, InvalidWind> {
    if !(tas_kmh.is_finite() && tas_kmh > 0.0) {
        return Err(InvalidWind::Airspeed(tas_kmh));
    }
    wind.validate()?;

    let wind_vel = match wind.effect {
        WindEffect::Factor { factor } => {
            let ground_speed_kmh = tas_kmh * factor;

            return Ok(WindCorrection {
                ground_speed_kmh,
                headwind_kmh: tas_kmh - ground_speed_kmh,
                crosswind_kmh: 0.0,
                correction_angle_deg: 0.0,
            });
        }
        WindEffect::Bearing {
            relative_bearing_deg,
        } => track_velocity(wind.speed_kmh, relative_bearing_deg),
    };

    let headwind_kmh = -wind_vel.x;
    let crosswind_kmh = wind_vel.y.abs();

    if crosswind_kmh >= tas_kmh {
        return Ok(WindCorrection {
            ground_speed_kmh: 0.0,
            headwind_kmh,
            crosswind_kmh,
            correction_angle_deg: 90.0,
        });
    }

    let wca = (crosswind_kmh / tas_kmh).asin();
    let ground_speed_kmh = (tas_kmh * wca.cos() - headwind_kmh).max(0.0);

    Ok(WindCorrection {
        ground_speed_kmh,
        headwind_kmh,
        crosswind_kmh,
        correction_angle_deg: wca.to_degrees(),
    })
}

pub fn ground_speed(tas_kmh: f64, wind: &WindVector) -> Result<f64, InvalidWind> {
    Ok(correct(tas_kmh, wind)?.ground_speed_kmh)
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn test_factor_scales_airspeed() {
        let wind = WindVector::from_factor(0.0, 0.9).unwrap();
        assert_relative_eq!(ground_speed(800.0, &wind).unwrap(), 720.0, epsilon = 1e-9);

        let wind = WindVector::from_factor(0.0, 0.8).unwrap();
        assert_eq!(ground_speed(800.0, &wind), Ok(640.0));

        assert_eq!(ground_speed(800.0, &WindVector::calm()), Ok(800.0));
    }

    #[test]
    fn test_factor_is_monotonic() {
        let mut last = 0.0;
        for factor in [0.1, 0.5, 0.8, 1.0, 1.2, 1.5, 2.0] {
            let gs = ground_speed(500.0, &WindVector::from_factor(0.0, factor).unwrap()).unwrap();
            assert!(gs > last);
            last = gs;
        }
    }

    #[test]
    fn test_pure_headwind_and_tailwind() {
        let head = correct(800.0, &WindVector::from_bearing(100.0, 0.0).unwrap()).unwrap();
        assert_relative_eq!(head.ground_speed_kmh, 700.0, epsilon = 1e-9);
        assert_relative_eq!(head.headwind_kmh, 100.0, epsilon = 1e-9);
        assert_relative_eq!(head.correction_angle_deg, 0.0, epsilon = 1e-9);

        let tail = correct(800.0, &WindVector::from_bearing(100.0, 180.0).unwrap()).unwrap();
        assert_relative_eq!(tail.ground_speed_kmh, 900.0, epsilon = 1e-9);
        assert_relative_eq!(tail.headwind_kmh, -100.0, epsilon = 1e-9);

        let full_circle = ground_speed(800.0, &WindVector::from_bearing(100.0, 360.0).unwrap());
        assert_relative_eq!(full_circle.unwrap(), 700.0, epsilon = 1e-9);
    }

    #[test]
    fn test_crosswind_penalty_is_smaller_than_wind() {
        let cross = correct(800.0, &WindVector::from_bearing(100.0, 90.0).unwrap()).unwrap();

        assert_relative_eq!(cross.crosswind_kmh, 100.0, epsilon = 1e-9);
        assert_relative_eq!(cross.ground_speed_kmh, 793.7254, epsilon = 1e-4);
        assert!(800.0 - cross.ground_speed_kmh < 100.0);
        assert_relative_eq!(cross.correction_angle_deg, 7.1808, epsilon = 1e-4);

        // Same crosswind from the other side
        let left = correct(800.0, &WindVector::from_bearing(100.0, 270.0).unwrap()).unwrap();
        assert_relative_eq!(left.ground_speed_kmh, cross.ground_speed_kmh, epsilon = 1e-9);
    }

    #[test]
    fn test_quartering_headwind() {
        let gs = ground_speed(800.0, &WindVector::from_bearing(100.0, 45.0).unwrap()).unwrap();
        let expected = (800.0f64.powi(2) - 5000.0).sqrt() - 100.0 * 45f64.to_radians().cos();
        assert_relative_eq!(gs, expected, epsilon = 1e-9);
    }

    #[test]
    fn test_overwhelming_wind_clamps_to_zero() {
        let head = correct(200.0, &WindVector::from_bearing(250.0, 0.0).unwrap()).unwrap();
        assert_eq!(head.ground_speed_kmh, 0.0);
        assert!(!head.is_advancing());

        let cross = correct(200.0, &WindVector::from_bearing(250.0, 90.0).unwrap()).unwrap();
        assert_eq!(cross.ground_speed_kmh, 0.0);
        assert_eq!(cross.correction_angle_deg, 90.0);
    }

    #[test]
    fn test_invalid_wind() {
        assert_eq!(
            WindVector::from_bearing(-1.0, 0.0),
            Err(InvalidWind::Speed(-1.0))
        );
        assert_eq!(
            WindVector::from_bearing(10.0, 361.0),
            Err(InvalidWind::Bearing(361.0))
        );
        assert_eq!(
            WindVector::from_bearing(10.0, -0.5),
            Err(InvalidWind::Bearing(-0.5))
        );
        assert_eq!(WindVector::from_factor(0.0, 0.0), Err(InvalidWind::Factor(0.0)));
        assert_eq!(WindVector::from_factor(0.0, 2.1), Err(InvalidWind::Factor(2.1)));
        assert!(WindVector::from_factor(0.0, 2.0).is_ok());
        assert!(WindVector::from_factor(0.0, f64::NAN).is_err());

        assert_eq!(
            ground_speed(0.0, &WindVector::calm()),
            Err(InvalidWind::Airspeed(0.0))
        );

        let bad = WindVector {
            speed_kmh: -3.0,
            effect: WindEffect::Factor { factor: 1.0 },
        };
        assert_eq!(ground_speed(800.0, &bad), Err(InvalidWind::Speed(-3.0)));
    }
}
