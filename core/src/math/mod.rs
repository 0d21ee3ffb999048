pub mod regression;
pub mod stats;
pub mod vector;

pub use regression::RegressionHelper;
pub use stats::StatsHelper;
pub use vector::Vec3;
