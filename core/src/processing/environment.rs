use crate::config::EnvironmentConfig;
use crate::interface::{
    AlertLevel, Condition, EnvironmentAdvisory, EnvironmentContext, EnvironmentSource, TerrainReport,
    TerrainType, WeatherReport,
};
use crate::math::StatsHelper;
use crate::prelude::clamp_unit;
use crate::telemetry::log::LogManager;

/// Factor risk at which the severe recommendation replaces the elevated one.
const SEVERE: f64 = 0.8;
const ELEVATED: f64 = 0.6;

/// Scored factor with its severe and elevated recommendations.
struct Factor {
    name: &'static str,
    risk: f64,
    severe: &'static str,
    elevated: &'static str,
}

/// Weather or terrain summary before the two are merged.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceAssessment {
    pub score: f64,
    pub level: AlertLevel,
    pub conditions: Vec<Condition>,
    pub recommendations: Vec<String>,
}

/// Scores the optional weather and terrain context of a cycle. The result
/// is advisory only and never changes an intruder's collision score.
pub struct EnvironmentAssessor {
    config: EnvironmentConfig,
    logger: LogManager,
}

impl EnvironmentAssessor {
    pub fn new(config: EnvironmentConfig) -> Self {
        Self {
            config,
            logger: LogManager::new("environment"),
        }
    }

    /// `None` when the frame carries neither weather nor terrain.
    pub fn assess(&self, context: &EnvironmentContext) -> Option<EnvironmentAdvisory> {
        let weather = context.weather.as_ref().map(|w| self.assess_weather(w));
        let terrain = context.terrain.as_ref().map(|t| self.assess_terrain(t));
        if weather.is_none() && terrain.is_none() {
            return None;
        }

        let mut advisory = EnvironmentAdvisory {
            level: AlertLevel::None,
            weather_score: weather.as_ref().map(|w| w.score),
            terrain_score: terrain.as_ref().map(|t| t.score),
            conditions: Vec::new(),
            recommendations: Vec::new(),
        };
        for source in [weather, terrain].into_iter().flatten() {
            advisory.level = advisory.level.max(source.level);
            advisory.conditions.extend(source.conditions);
            advisory.recommendations.extend(source.recommendations);
        }
        if advisory.level >= AlertLevel::High {
            self.logger.record(&format!(
                "environment {}: {}",
                advisory.level,
                advisory.recommendations.join("; ")
            ));
        }
        Some(advisory)
    }

    pub fn assess_weather(&self, weather: &WeatherReport) -> SourceAssessment {
        let cfg = &self.config;
        let factors = [
            Factor {
                name: "visibility",
                risk: cfg.visibility_m.below(weather.visibility_m),
                severe: "Consider alternate routing due to low visibility",
                elevated: "Increase separation distances due to reduced visibility",
            },
            Factor {
                name: "precipitation",
                risk: cfg.precipitation_mm_h.above(weather.precipitation_mm_h),
                severe: "Activate weather radar and maintain increased separation",
                elevated: "Monitor precipitation intensity and adjust speed accordingly",
            },
            Factor {
                name: "wind",
                risk: cfg.wind_kt.above(weather.wind_speed_kt),
                severe: "Consider altitude change due to strong winds",
                elevated: "Adjust speed and heading for wind compensation",
            },
            Factor {
                name: "turbulence",
                risk: clamp_unit(weather.turbulence),
                severe: "Activate turbulence mode and increase separation",
                elevated: "Maintain increased separation in turbulent conditions",
            },
            Factor {
                name: "icing",
                risk: clamp_unit(weather.icing),
                severe: "Activate anti-ice systems and consider altitude change",
                elevated: "Monitor icing conditions and activate anti-ice as needed",
            },
            Factor {
                name: "lightning",
                risk: clamp_unit(weather.lightning),
                severe: "Maintain maximum separation from storm cells",
                elevated: "Monitor lightning activity and adjust route if necessary",
            },
        ];
        let mut assessment = self.summarise(EnvironmentSource::Weather, &factors);
        let general = match assessment.level {
            AlertLevel::Critical => Some("Consider immediate diversion or holding pattern"),
            AlertLevel::High => Some("Increase situational awareness and prepare for possible diversion"),
            AlertLevel::Medium => Some("Maintain increased vigilance and monitor weather conditions"),
            AlertLevel::Low | AlertLevel::None => None,
        };
        assessment.recommendations.extend(general.map(String::from));
        assessment
    }

    pub fn assess_terrain(&self, terrain: &TerrainReport) -> SourceAssessment {
        let cfg = &self.config;
        let factors = [
            Factor {
                name: "clearance",
                risk: cfg.clearance_m.below(terrain.clearance_m),
                severe: "IMMEDIATE CLIMB REQUIRED - Critical terrain clearance",
                elevated: "Maintain increased altitude - Low terrain clearance",
            },
            Factor {
                name: "slope",
                risk: cfg.slope_deg.above(terrain.slope_deg),
                severe: "Avoid steep terrain areas - Critical slope detected",
                elevated: "Exercise caution - Significant terrain slope",
            },
            Factor {
                name: "roughness",
                risk: cfg.roughness.above(terrain.roughness),
                severe: "Maintain increased separation - Rough terrain",
                elevated: "Exercise caution - Moderate terrain roughness",
            },
            Factor {
                name: "obstacles",
                risk: self.obstacle_risk(terrain),
                severe: "Multiple obstacles detected - Maintain maximum clearance",
                elevated: "Obstacles present - Maintain increased separation",
            },
        ];
        let mut assessment = self.summarise(EnvironmentSource::Terrain, &factors);
        let by_type = match terrain.terrain_type {
            TerrainType::Mountain => Some("Mountainous terrain - Maintain increased vigilance"),
            TerrainType::Valley => Some("Valley terrain - Monitor terrain clearance"),
            TerrainType::Plateau | TerrainType::Other => None,
        };
        let general = match assessment.level {
            AlertLevel::Critical => Some("TERRAIN TERRAIN PULL UP - Immediate action required"),
            AlertLevel::High => Some("Increase terrain clearance and prepare for possible diversion"),
            AlertLevel::Medium => Some("Monitor terrain proximity and maintain safe clearance"),
            AlertLevel::Low | AlertLevel::None => None,
        };
        assessment
            .recommendations
            .extend(by_type.into_iter().chain(general).map(String::from));
        assessment
    }

    /// Worst obstacle, each scored as the mean of its nearness and height.
    /// No obstacles scores the ladder floor.
    fn obstacle_risk(&self, terrain: &TerrainReport) -> f64 {
        let cfg = &self.config;
        terrain
            .obstacles
            .iter()
            .map(|obstacle| {
                let nearness = 1.0 - clamp_unit(obstacle.distance_m / cfg.obstacle_distance_scale_m);
                let height = clamp_unit(obstacle.height_m / cfg.obstacle_height_scale_m);
                (nearness + height) / 2.0
            })
            .reduce(f64::max)
            .unwrap_or(0.2)
    }

    fn summarise(&self, source: EnvironmentSource, factors: &[Factor]) -> SourceAssessment {
        let risks: Vec<f64> = factors.iter().map(|f| f.risk).collect();
        let score = clamp_unit(StatsHelper::mean(&risks).unwrap_or(0.0));
        let recommendations = factors
            .iter()
            .filter_map(|f| {
                if f.risk >= SEVERE {
                    Some(f.severe.to_string())
                } else if f.risk >= ELEVATED {
                    Some(f.elevated.to_string())
                } else {
                    None
                }
            })
            .collect();
        SourceAssessment {
            score,
            level: self.config.levels.level_for(score),
            conditions: factors
                .iter()
                .map(|f| Condition {
                    source,
                    factor: f.name.to_string(),
                    risk: f.risk,
                })
                .collect(),
            recommendations,
        }
    }
}
