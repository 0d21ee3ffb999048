use crate::math::vector::Vec3;
use ndarray::{Array1, Array2, Axis};

pub struct RegressionHelper;

impl RegressionHelper {
    /// Least-squares slope of position against time, i.e. the mean velocity
    /// over the window. Returns `None` for fewer than two samples or when all
    /// timestamps coincide.
    pub fn velocity(times: &[f64], positions: &[Vec3]) -> Option<Vec3> {
        let n = times.len().min(positions.len());
        if n < 2 {
            return None;
        }

        let t = Array1::from_iter(times[..n].iter().copied());
        let p = Array2::from_shape_fn((n, 3), |(row, col)| {
            let point = positions[row];
            match col {
                0 => point.x,
                1 => point.y,
                _ => point.z,
            }
        });

        let t_mean = t.mean()?;
        let p_mean = p.mean_axis(Axis(0))?;
        let t_centered = t.mapv(|value| value - t_mean);
        let p_centered = &p - &p_mean;

        let denominator = t_centered.dot(&t_centered);
        if denominator <= f64::EPSILON {
            return None;
        }
        let slope = t_centered.dot(&p_centered) / denominator;
        let velocity = Vec3::new(slope[0], slope[1], slope[2]);
        velocity.is_finite().then_some(velocity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn regression_recovers_constant_velocity() {
        let times = [0.0, 1.0, 2.0, 3.0];
        let positions: Vec<Vec3> = times
            .iter()
            .map(|&t| Vec3::new(100.0 * t, -20.0 * t, 3000.0 + 5.0 * t))
            .collect();
        let v = RegressionHelper::velocity(&times, &positions).unwrap();
        assert!((v.x - 100.0).abs() < 1e-9);
        assert!((v.y + 20.0).abs() < 1e-9);
        assert!((v.z - 5.0).abs() < 1e-9);
    }

    #[test]
    fn regression_rejects_degenerate_time_base() {
        let positions = [Vec3::ZERO, Vec3::new(1.0, 0.0, 0.0)];
        assert!(RegressionHelper::velocity(&[5.0, 5.0], &positions).is_none());
        assert!(RegressionHelper::velocity(&[5.0], &positions[..1]).is_none());
    }
}
