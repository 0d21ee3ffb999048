pub mod alert;
pub mod cycle;
pub mod environment;
pub mod report;

pub use alert::{Advisory, Alert, AlertLevel, Geometry, RiskFactors};
pub use cycle::{CycleFrame, CycleReport, CycleStatus, SkippedObject};
pub use environment::{
    Condition, EnvironmentAdvisory, EnvironmentContext, EnvironmentSource, Obstacle, TerrainReport,
    TerrainType, WeatherReport,
};
pub use report::{Classification, Kinematics, ObjectId, SensorKind, SensorReport};
