//! Predictive collision-risk and alerting core for an airborne traffic
//! awareness system.
//!
//! Each cycle fuses transponder, radar and visual reports into per-object
//! tracks, extrapolates ownship and intruders over a fixed horizon, scores
//! every intruder's closest approach and arbitrates the scores into a ranked
//! alert list with hysteresis.

pub mod config;
pub mod engine;
pub mod interface;
pub mod math;
pub mod prelude;
pub mod processing;
pub mod telemetry;
pub mod tracking;

pub use config::EngineConfig;
pub use engine::{CollisionEngine, CycleAssessment};
pub use prelude::{EngineError, EngineResult};
