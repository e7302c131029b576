/// Computes the arithmetic mean of a slice of values. Returns 0.0 for empty input.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Rounds to `decimals` places, halves away from zero (`f64::round`).
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_empty() {
        assert_eq!(mean(&[]), 0.0);
    }

    #[test]
    fn test_mean_of_window() {
        let window = [-1.0, -2.0, -3.0, -4.0, -5.0, -6.0, -7.0];
        assert_eq!(round_to(mean(&window), 6), -4.0);
    }

    #[test]
    fn test_round_to_six_places() {
        assert_eq!(round_to(-80.0 / 7.0, 6), -11.428571);
        assert_eq!(round_to(1.0 / 3.0, 6), 0.333333);
        assert_eq!(round_to(2.0 / 3.0, 6), 0.666667);
    }

    #[test]
    fn test_round_half_away_from_zero() {
        assert_eq!(round_to(2.5, 0), 3.0);
        assert_eq!(round_to(-2.5, 0), -3.0);
        assert_eq!(round_to(60.04, 1), 60.0);
    }
}
