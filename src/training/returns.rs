//! Monte-Carlo return and advantage estimation for one finished episode.

use crate::error::TrainingError;

/// Default discount factor.
pub const DEFAULT_GAMMA: f32 = 0.98;

/// Standard deviations at or below this are treated as zero.
pub const MIN_RETURN_STD: f32 = 1e-6;

/// `G[t] = r[t] + gamma * G[t+1]`, computed backward with `G[T] = 0`.
pub fn discount_returns(rewards: &[f32], gamma: f32) -> Vec<f32> {
    let mut returns = vec![0.0; rewards.len()];
    let mut running = 0.0;
    for (t, &reward) in rewards.iter().enumerate().rev() {
        running = reward + gamma * running;
        returns[t] = running;
    }
    returns
}

/// Standardize returns to zero mean and unit sample standard deviation.
///
/// Returns an error instead of dividing by a vanishing spread, so the result
/// never contains NaN.
pub fn normalize_returns(returns: &[f32]) -> Result<Vec<f32>, TrainingError> {
    let n = returns.len();
    if n == 0 {
        return Err(TrainingError::EmptyEpisode);
    }
    if n < 2 {
        return Err(TrainingError::DegenerateReturns { len: n, std: 0.0 });
    }
    let mean = returns.iter().sum::<f32>() / n as f32;
    let var = returns.iter().map(|g| (g - mean).powi(2)).sum::<f32>() / (n - 1) as f32;
    let std = var.sqrt();
    if !std.is_finite() || std <= MIN_RETURN_STD {
        return Err(TrainingError::DegenerateReturns { len: n, std });
    }
    Ok(returns.iter().map(|g| (g - mean) / std).collect())
}

/// `A[t] = G[t] - V[t]`.
pub fn advantages(returns: &[f32], values: &[f32]) -> Vec<f32> {
    returns.iter().zip(values).map(|(g, v)| g - v).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: &[f32], expected: &[f32]) {
        assert_eq!(actual.len(), expected.len());
        for (a, e) in actual.iter().zip(expected) {
            assert!((a - e).abs() < 1e-4, "{actual:?} != {expected:?}");
        }
    }

    #[test]
    fn test_discount_three_ones() {
        assert_close(&discount_returns(&[1.0, 1.0, 1.0], 0.98), &[1.0 + 0.98 + 0.98 * 0.98, 1.98, 1.0]);
    }

    #[test]
    fn test_discount_three_ones_sum() {
        let returns = discount_returns(&[1.0, 1.0, 1.0], 0.98);
        assert!((returns[0] - 2.9404).abs() < 1e-4);
    }

    #[test]
    fn test_discount_terminal_reward_only() {
        let returns = discount_returns(&[0.0, 0.0, 0.0, 0.0, 1.0], 0.98);
        assert_close(&returns, &[0.98f32.powi(4), 0.98f32.powi(3), 0.98 * 0.98, 0.98, 1.0]);
    }

    #[test]
    fn test_discount_empty() {
        assert!(discount_returns(&[], 0.98).is_empty());
    }

    #[test]
    fn test_normalized_mean_zero_sample_std_one() {
        let normalized = normalize_returns(&[3.0, -1.0, 10.0, 0.5, 2.0]).unwrap();
        let n = normalized.len() as f32;
        let mean = normalized.iter().sum::<f32>() / n;
        let var = normalized.iter().map(|g| (g - mean).powi(2)).sum::<f32>() / (n - 1.0);
        assert!(mean.abs() < 1e-5);
        assert!((var.sqrt() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_constant_returns_are_degenerate() {
        let err = normalize_returns(&[2.0, 2.0, 2.0]).unwrap_err();
        assert!(matches!(err, TrainingError::DegenerateReturns { len: 3, .. }));
    }

    #[test]
    fn test_single_step_is_degenerate() {
        let err = normalize_returns(&[10.0]).unwrap_err();
        assert!(matches!(err, TrainingError::DegenerateReturns { len: 1, .. }));
    }

    #[test]
    fn test_empty_returns_error() {
        assert!(matches!(normalize_returns(&[]), Err(TrainingError::EmptyEpisode)));
    }

    #[test]
    fn test_advantages() {
        assert_close(&advantages(&[2.0, 0.5], &[1.0, 1.0]), &[1.0, -0.5]);
    }
}
