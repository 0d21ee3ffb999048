use crate::interface::alert::AlertLevel;
use serde::{Deserialize, Serialize};

/// Weather around ownship for one cycle. Indices are on a 0-1 scale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeatherReport {
    pub visibility_m: f64,
    pub precipitation_mm_h: f64,
    pub cloud_ceiling_m: f64,
    pub wind_speed_kt: f64,
    pub wind_direction_deg: f64,
    pub turbulence: f64,
    pub icing: f64,
    pub lightning: f64,
}

impl Default for WeatherReport {
    fn default() -> Self {
        Self {
            visibility_m: 10_000.0,
            precipitation_mm_h: 0.0,
            cloud_ceiling_m: 3000.0,
            wind_speed_kt: 0.0,
            wind_direction_deg: 0.0,
            turbulence: 0.0,
            icing: 0.0,
            lightning: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerrainType {
    Mountain,
    Valley,
    Plateau,
    #[default]
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Obstacle {
    pub distance_m: f64,
    pub height_m: f64,
}

/// Terrain below and ahead of ownship for one cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainReport {
    pub elevation_m: f64,
    pub clearance_m: f64,
    pub slope_deg: f64,
    pub roughness: f64,
    pub terrain_type: TerrainType,
    pub obstacles: Vec<Obstacle>,
}

impl Default for TerrainReport {
    fn default() -> Self {
        Self {
            elevation_m: 0.0,
            clearance_m: 3000.0,
            slope_deg: 0.0,
            roughness: 0.0,
            terrain_type: TerrainType::Other,
            obstacles: Vec::new(),
        }
    }
}

/// Optional environment attached to a cycle frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvironmentContext {
    pub weather: Option<WeatherReport>,
    pub terrain: Option<TerrainReport>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnvironmentSource {
    Weather,
    Terrain,
}

/// One scored environmental factor, e.g. visibility or slope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub source: EnvironmentSource,
    pub factor: String,
    pub risk: f64,
}

/// Environment summary carried on the cycle report and on every alert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentAdvisory {
    /// Worse of the weather and terrain levels.
    pub level: AlertLevel,
    pub weather_score: Option<f64>,
    pub terrain_score: Option<f64>,
    pub conditions: Vec<Condition>,
    pub recommendations: Vec<String>,
}
