use crate::math::vector::Vec3;

pub struct StatsHelper;

impl StatsHelper {
    pub fn mean(values: &[f64]) -> Option<f64> {
        if values.is_empty() {
            return None;
        }
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }

    /// Weighted average of vectors; weights are renormalised over the input.
    pub fn weighted_average(samples: &[(Vec3, f64)]) -> Option<Vec3> {
        let total: f64 = samples.iter().map(|(_, w)| w.max(0.0)).sum();
        if total <= 0.0 || !total.is_finite() {
            return None;
        }
        let sum = samples
            .iter()
            .fold(Vec3::ZERO, |acc, (v, w)| acc + *v * w.max(0.0));
        Some(sum * (1.0 / total))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weighted_average_renormalises() {
        let avg = StatsHelper::weighted_average(&[
            (Vec3::new(0.0, 0.0, 0.0), 0.4),
            (Vec3::new(10.0, 0.0, 0.0), 0.4),
        ])
        .unwrap();
        assert!((avg.x - 5.0).abs() < 1e-12);
        assert!(StatsHelper::weighted_average(&[(Vec3::ZERO, 0.0)]).is_none());
    }

    #[test]
    fn mean_of_nothing_is_none() {
        assert_eq!(StatsHelper::mean(&[0.25, 0.5, 0.75]), Some(0.5));
        assert!(StatsHelper::mean(&[]).is_none());
    }
}
