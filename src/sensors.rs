//! Static sensor configuration.
//!
//! Loaded once from a JSON array, for example:
//!
//! ```text
//! [
//!   {
//!     "id": "sensor-2",
//!     "name": "Urban Drain South",
//!     "description": "Monitoring water levels in the southern drainage system.",
//!     "position": [26.1158, 91.7086],
//!     "thresholds": { "low": 150, "medium": 300, "high": 500 },
//!     "camera_views": ["front", "side"],
//!     "default_data": { "level": 520, "battery": 12.4, "solar": 13.1 }
//!   }
//! ]
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

use crate::common::Reading;
use crate::error::{AppError, AppResult};

/// Level bounds in centimetres. `medium` and `high` decide the gauge bucket;
/// `low` is advisory.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    pub low: f64,
    pub medium: f64,
    pub high: f64,
}

/// Values shown while a sensor has no live data.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DefaultReading {
    #[serde(default)]
    pub level: f64,
    #[serde(default)]
    pub battery: f64,
    #[serde(default)]
    pub solar: f64,
}

impl DefaultReading {
    /// The fallback as an offline reading.
    #[must_use]
    pub fn to_reading(self) -> Reading {
        Reading {
            level: self.level,
            battery: self.battery,
            solar: self.solar,
            observed_at: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorConfig {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// `[latitude, longitude]`
    pub position: [f64; 2],
    pub thresholds: Thresholds,
    #[serde(default, alias = "image_views", alias = "imageViews")]
    pub camera_views: Vec<String>,
    #[serde(default, alias = "default_data")]
    pub default_reading: Option<DefaultReading>,
    /// Backend id when it differs from the display id.
    #[serde(default)]
    pub station_id: Option<String>,
}

impl SensorConfig {
    /// Id used in queries.
    #[must_use]
    pub fn query_id(&self) -> &str {
        self.station_id.as_deref().unwrap_or(&self.id)
    }

    #[must_use]
    pub fn has_camera(&self) -> bool {
        !self.camera_views.is_empty()
    }

    pub fn default_view(&self) -> Option<&str> {
        self.camera_views.first().map(String::as_str)
    }
}

#[derive(Debug, Clone)]
pub struct SensorRegistry {
    sensors: Vec<SensorConfig>,
}

impl SensorRegistry {
    /// Build a registry, rejecting empty lists and duplicate ids.
    ///
    /// # Errors
    ///
    /// Returns `AppError::SensorConfig` if the list is empty or an id repeats.
    pub fn new(sensors: Vec<SensorConfig>) -> AppResult<Self> {
        if sensors.is_empty() {
            return Err(AppError::SensorConfig("No sensors configured".to_string()));
        }

        let mut seen = HashSet::new();
        for sensor in &sensors {
            if !seen.insert(sensor.id.as_str()) {
                return Err(AppError::SensorConfig(format!(
                    "Duplicate sensor id: {}",
                    sensor.id
                )));
            }
            if sensor.thresholds.medium > sensor.thresholds.high {
                tracing::warn!(
                    sensor_id = %sensor.id,
                    medium = sensor.thresholds.medium,
                    high = sensor.thresholds.high,
                    "Medium threshold above high threshold"
                );
            }
        }

        Ok(Self { sensors })
    }

    /// Parse a registry from a JSON array.
    ///
    /// # Errors
    ///
    /// Returns `AppError::SensorConfig` if the JSON is invalid or fails validation.
    pub fn from_json(json: &str) -> AppResult<Self> {
        let sensors: Vec<SensorConfig> = serde_json::from_str(json)
            .map_err(|e| AppError::SensorConfig(format!("Invalid sensor JSON: {e}")))?;
        Self::new(sensors)
    }

    /// Load a registry from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns `AppError::SensorConfig` if the file cannot be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            AppError::SensorConfig(format!("Failed to read {}: {e}", path.display()))
        })?;
        Self::from_json(&json)
    }

    pub fn get(&self, id: &str) -> Option<&SensorConfig> {
        self.sensors.iter().find(|s| s.id == id)
    }

    /// Look up a sensor, failing with `AppError::UnknownSensor`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::UnknownSensor` if no sensor has this id.
    pub fn require(&self, id: &str) -> AppResult<&SensorConfig> {
        self.get(id)
            .ok_or_else(|| AppError::UnknownSensor(id.to_string()))
    }

    #[must_use]
    pub fn first(&self) -> &SensorConfig {
        // Non-empty by construction.
        &self.sensors[0]
    }

    pub fn iter(&self) -> impl Iterator<Item = &SensorConfig> {
        self.sensors.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.sensors.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sensors.is_empty()
    }
}
