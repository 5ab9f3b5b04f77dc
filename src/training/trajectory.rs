use burn::prelude::*;

use crate::error::TrainingError;

/// One episode's index-aligned rollout record.
///
/// The rollout loop owns it while the episode runs and hands it by value to
/// the update, which consumes it.
#[derive(Debug)]
pub struct Trajectory<B: Backend> {
    log_probs: Vec<Tensor<B, 1>>,
    entropies: Vec<Tensor<B, 1>>,
    values: Vec<Tensor<B, 1>>,
    rewards: Vec<f32>,
}

impl<B: Backend> Default for Trajectory<B> {
    fn default() -> Self {
        Trajectory {
            log_probs: Vec::new(),
            entropies: Vec::new(),
            values: Vec::new(),
            rewards: Vec::new(),
        }
    }
}

impl<B: Backend> Trajectory<B> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the policy outputs of the action just taken.
    pub fn push_step(&mut self, log_prob: Tensor<B, 1>, entropy: Tensor<B, 1>, value: Tensor<B, 1>) {
        self.log_probs.push(log_prob);
        self.entropies.push(entropy);
        self.values.push(value);
    }

    /// Record the reward the environment returned for that action.
    pub fn push_reward(&mut self, reward: f32) {
        self.rewards.push(reward);
    }

    pub fn len(&self) -> usize {
        self.rewards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.log_probs.is_empty() && self.rewards.is_empty()
    }

    pub fn rewards(&self) -> &[f32] {
        &self.rewards
    }

    pub fn total_reward(&self) -> f32 {
        self.rewards.iter().sum()
    }

    /// Lengths of (log-probs, entropies, rewards, values).
    pub fn lengths(&self) -> (usize, usize, usize, usize) {
        (
            self.log_probs.len(),
            self.entropies.len(),
            self.rewards.len(),
            self.values.len(),
        )
    }

    /// Check that every sequence has the same length and return it.
    pub fn check_aligned(&self) -> Result<usize, TrainingError> {
        let (log_probs, entropies, rewards, values) = self.lengths();
        if log_probs == entropies && entropies == rewards && rewards == values {
            Ok(rewards)
        } else {
            Err(TrainingError::TrajectoryMismatch {
                log_probs,
                entropies,
                rewards,
                values,
            })
        }
    }

    /// Split into (log-probs, entropies, values, rewards).
    pub fn into_parts(self) -> (Vec<Tensor<B, 1>>, Vec<Tensor<B, 1>>, Vec<Tensor<B, 1>>, Vec<f32>) {
        (self.log_probs, self.entropies, self.values, self.rewards)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray<f32>;

    fn scalar(v: f32) -> Tensor<TestBackend, 1> {
        Tensor::from_floats([v], &Default::default())
    }

    #[test]
    fn test_aligned_after_full_steps() {
        let mut trajectory = Trajectory::<TestBackend>::new();
        assert!(trajectory.is_empty());
        for t in 0..4 {
            trajectory.push_step(scalar(-1.0), scalar(1.0), scalar(0.1));
            trajectory.push_reward(t as f32);
        }
        assert_eq!(trajectory.check_aligned().unwrap(), 4);
        assert_eq!(trajectory.total_reward(), 6.0);
    }

    #[test]
    fn test_missing_reward_is_mismatch() {
        let mut trajectory = Trajectory::<TestBackend>::new();
        trajectory.push_step(scalar(-1.0), scalar(1.0), scalar(0.1));
        trajectory.push_step(scalar(-1.0), scalar(1.0), scalar(0.1));
        trajectory.push_reward(0.0);
        let err = trajectory.check_aligned().unwrap_err();
        assert!(matches!(
            err,
            TrainingError::TrajectoryMismatch {
                log_probs: 2,
                rewards: 1,
                ..
            }
        ));
    }
}
