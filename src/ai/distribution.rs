use burn::prelude::*;
use burn::tensor::activation::log_softmax;
use rand::rngs::StdRng;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::AgentError;
use crate::game::Action;

/// How the training policy turns its distribution into an action.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionSelection {
    /// Most probable action.
    #[default]
    Greedy,
    /// Draw from the categorical distribution.
    Sample,
}

/// Categorical action distribution and value estimate from one forward pass.
///
/// Log-probability, entropy and value stay attached to the graph that
/// produced them, so a loss built from them backpropagates into the network.
pub struct PolicyStep<B: Backend> {
    log_probs: Tensor<B, 2>,
    value: Tensor<B, 1>,
}

impl<B: Backend> PolicyStep<B> {
    /// `logits` is `[1, 3]`, `value` is `[1, 1]`.
    pub fn new(logits: Tensor<B, 2>, value: Tensor<B, 2>) -> Self {
        PolicyStep {
            log_probs: log_softmax(logits, 1),
            value: value.reshape([1]),
        }
    }

    pub fn probabilities(&self) -> Result<Vec<f32>, AgentError> {
        self.log_probs
            .clone()
            .exp()
            .into_data()
            .to_vec::<f32>()
            .map_err(|e| AgentError::TensorRead(format!("{e:?}")))
    }

    pub fn select(&self, selection: ActionSelection, rng: &mut StdRng) -> Result<Action, AgentError> {
        let probs = self.probabilities()?;
        let idx = match selection {
            ActionSelection::Greedy => argmax(&probs),
            ActionSelection::Sample => sample_categorical(&probs, rng),
        };
        Ok(Action::from_index(idx).unwrap_or_default())
    }

    pub fn greedy(&self) -> Result<Action, AgentError> {
        let probs = self.probabilities()?;
        Ok(Action::from_index(argmax(&probs)).unwrap_or_default())
    }

    /// `log pi(action)`, shape `[1]`.
    pub fn log_prob(&self, action: Action) -> Tensor<B, 1> {
        let idx = action.index();
        self.log_probs.clone().slice([0..1, idx..idx + 1]).reshape([1])
    }

    /// Shannon entropy of the distribution, shape `[1]`.
    pub fn entropy(&self) -> Tensor<B, 1> {
        let probs = self.log_probs.clone().exp();
        (probs * self.log_probs.clone()).sum_dim(1).neg().reshape([1])
    }

    /// Critic estimate, shape `[1]`.
    pub fn value(&self) -> Tensor<B, 1> {
        self.value.clone()
    }
}

/// Index of the largest probability; ties go to the lowest index.
fn argmax(probs: &[f32]) -> usize {
    let mut best = 0;
    for (i, &p) in probs.iter().enumerate() {
        if p > probs[best] {
            best = i;
        }
    }
    best
}

fn sample_categorical(probs: &[f32], rng: &mut StdRng) -> usize {
    let r: f32 = rng.random_range(0.0..1.0);
    let mut cumulative = 0.0;
    for (i, &p) in probs.iter().enumerate() {
        cumulative += p;
        if r < cumulative {
            return i;
        }
    }
    probs.iter().rposition(|&p| p > 0.0).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;
    use burn::tensor::TensorData;
    use rand::SeedableRng;

    type TestBackend = NdArray<f32>;

    fn step(logits: [f32; 3], value: f32) -> PolicyStep<TestBackend> {
        let device = Default::default();
        let logits = Tensor::<TestBackend, 1>::from_data(TensorData::from(logits), &device).reshape([1, 3]);
        let value = Tensor::<TestBackend, 1>::from_data(TensorData::from([value]), &device).reshape([1, 1]);
        PolicyStep::new(logits, value)
    }

    fn scalar(t: Tensor<TestBackend, 1>) -> f32 {
        t.into_data().to_vec::<f32>().unwrap()[0]
    }

    #[test]
    fn test_probabilities_sum_to_one() {
        let probs = step([0.3, -1.0, 2.0], 0.0).probabilities().unwrap();
        assert!((probs.iter().sum::<f32>() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_greedy_picks_largest_logit() {
        assert_eq!(step([0.3, -1.0, 2.0], 0.0).greedy().unwrap(), Action::Down);
        assert_eq!(step([5.0, -1.0, 2.0], 0.0).greedy().unwrap(), Action::Stay);
    }

    #[test]
    fn test_greedy_tie_goes_to_stay() {
        assert_eq!(step([0.0, 0.0, 0.0], 0.0).greedy().unwrap(), Action::Stay);
    }

    #[test]
    fn test_log_prob_matches_probability() {
        let s = step([0.3, -1.0, 2.0], 0.0);
        let probs = s.probabilities().unwrap();
        let lp = scalar(s.log_prob(Action::Up));
        assert!((lp - probs[1].ln()).abs() < 1e-5);
    }

    #[test]
    fn test_uniform_entropy_is_ln3() {
        let h = scalar(step([1.0, 1.0, 1.0], 0.0).entropy());
        assert!((h - 3.0f32.ln()).abs() < 1e-5);
    }

    #[test]
    fn test_value_passthrough() {
        assert!((scalar(step([0.0; 3], 0.75).value()) - 0.75).abs() < 1e-6);
    }

    #[test]
    fn test_sample_explores() {
        let s = step([0.0, 0.0, 0.0], 0.0);
        let mut rng = StdRng::seed_from_u64(3);
        let mut seen = std::collections::HashSet::new();
        for _ in 0..100 {
            seen.insert(s.select(ActionSelection::Sample, &mut rng).unwrap());
        }
        assert_eq!(seen.len(), 3);
    }

    #[test]
    fn test_selection_serde() {
        let s: ActionSelection = serde_json::from_str("\"sample\"").unwrap();
        assert_eq!(s, ActionSelection::Sample);
        assert_eq!(ActionSelection::default(), ActionSelection::Greedy);
    }
}
