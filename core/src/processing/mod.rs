pub mod arbiter;
pub mod environment;
pub mod fusion;
pub mod predictor;
pub mod risk;

pub use arbiter::AlertArbiter;
pub use environment::{EnvironmentAssessor, SourceAssessment};
pub use fusion::{FusionOutput, SensorFusion};
pub use predictor::{PredictedTrajectory, TrajectoryPredictor, TrajectorySample};
pub use risk::{RiskAssessment, RiskAssessor};
