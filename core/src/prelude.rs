use crate::interface::ObjectId;

/// Common error type for engine stages.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("insufficient history for {id}: {points} point(s), need 2")]
    InsufficientHistory { id: ObjectId, points: usize },
    #[error("invalid report: {0}")]
    InvalidReport(String),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("no valid ownship state for cycle at t={0:.3}")]
    MissingOwnship(f64),
}

pub type EngineResult<T> = Result<T, EngineError>;

/// Clamps a score or confidence into `[0, 1]`; NaN collapses to 0.
pub fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp_unit_bounds_values() {
        assert_eq!(clamp_unit(-0.5), 0.0);
        assert_eq!(clamp_unit(1.7), 1.0);
        assert_eq!(clamp_unit(0.25), 0.25);
        assert_eq!(clamp_unit(f64::NAN), 0.0);
    }
}
