//! Heat-stress indicators from ambient weather readings.

use crate::ValidationError;
use serde::{Deserialize, Serialize};

/// One ambient reading supplied by an external weather source.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct WeatherSample {
    /// Air temperature, °C.
    pub temperature_c: f64,
    /// Relative humidity, percent (0–100).
    pub relative_humidity: f64,
}

/// Heat-stress band derived from the temperature-humidity index.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum HeatStress {
    None,
    Mild,
    Moderate,
    Severe,
    Emergency,
}

impl HeatStress {
    pub fn from_thi(thi: f64) -> Self {
        if thi < 72.0 {
            HeatStress::None
        } else if thi < 79.0 {
            HeatStress::Mild
        } else if thi < 89.0 {
            HeatStress::Moderate
        } else if thi < 99.0 {
            HeatStress::Severe
        } else {
            HeatStress::Emergency
        }
    }
}

impl WeatherSample {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.temperature_c.is_finite() {
            return Err(ValidationError::NonFinite("temperature_c"));
        }
        if !(0.0..=100.0).contains(&self.relative_humidity) {
            return Err(ValidationError::InvalidHumidity(self.relative_humidity));
        }
        Ok(())
    }

    /// Temperature-humidity index (NRC 1971 form).
    pub fn thi(&self) -> f64 {
        let t = self.temperature_c;
        let rh = self.relative_humidity;
        (1.8 * t + 32.0) - (0.55 - 0.0055 * rh) * (1.8 * t - 26.0)
    }

    pub fn heat_stress(&self) -> HeatStress {
        HeatStress::from_thi(self.thi())
    }
}
