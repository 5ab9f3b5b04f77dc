use burn::module::Param;
use burn::nn::{Linear, LinearConfig};
use burn::prelude::*;

use crate::game::Action;

/// Shared-trunk actor-critic network.
///
/// ```text
/// Input:       [batch, input_dim]
/// FC_shared:   input_dim -> hidden, tanh
/// Actor head:  hidden -> 3   (logits: stay, up, down)
/// Critic head: hidden -> 1   (state value estimate)
/// ```
#[derive(Module, Debug)]
pub struct ActorCriticNetwork<B: Backend> {
    fc_shared: Linear<B>,
    actor_head: Linear<B>,
    critic_head: Linear<B>,
}

#[derive(Config, Debug)]
pub struct ActorCriticNetworkConfig {
    pub input_dim: usize,
    #[config(default = 64)]
    pub hidden_dim: usize,
}

impl ActorCriticNetworkConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> ActorCriticNetwork<B> {
        ActorCriticNetwork {
            fc_shared: LinearConfig::new(self.input_dim, self.hidden_dim).init(device),
            actor_head: LinearConfig::new(self.hidden_dim, Action::COUNT).init(device),
            critic_head: LinearConfig::new(self.hidden_dim, 1).init(device),
        }
    }
}

impl<B: Backend> ActorCriticNetwork<B> {
    /// Forward pass: [batch, input_dim] -> (logits [batch, 3], value [batch, 1]).
    pub fn forward(&self, input: Tensor<B, 2>) -> (Tensor<B, 2>, Tensor<B, 2>) {
        let x = self.fc_shared.forward(input).tanh();
        let logits = self.actor_head.forward(x.clone());
        let value = self.critic_head.forward(x);
        (logits, value)
    }

    pub fn input_dim(&self) -> usize {
        self.fc_shared.weight.val().dims()[0]
    }

    /// Flattened copy of every parameter tensor, in declaration order.
    pub fn parameter_snapshot(&self) -> Vec<Vec<f32>> {
        let mut out = Vec::new();
        for layer in [&self.fc_shared, &self.actor_head, &self.critic_head] {
            out.push(flatten(&layer.weight));
            if let Some(bias) = &layer.bias {
                out.push(flatten(bias));
            }
        }
        out
    }
}

fn flatten<B: Backend, const D: usize>(param: &Param<Tensor<B, D>>) -> Vec<f32> {
    param
        .val()
        .into_data()
        .convert::<f32>()
        .to_vec::<f32>()
        .unwrap_or_default()
}
