use burn::nn::{Linear, LinearConfig, Relu};
use burn::prelude::*;

/// Scalar regressor from preprocessed frame features.
///
/// ```text
/// Input:  [batch, input_dim]   (binarized half-resolution frame)
/// FC1:    input_dim -> hidden, ReLU
/// FC2:    hidden -> 1
/// ```
#[derive(Module, Debug)]
pub struct PerceptionNetwork<B: Backend> {
    fc1: Linear<B>,
    fc2: Linear<B>,
    relu: Relu,
}

#[derive(Config, Debug)]
pub struct PerceptionNetworkConfig {
    pub input_dim: usize,
    #[config(default = 64)]
    pub hidden_dim: usize,
}

impl PerceptionNetworkConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> PerceptionNetwork<B> {
        PerceptionNetwork {
            fc1: LinearConfig::new(self.input_dim, self.hidden_dim).init(device),
            fc2: LinearConfig::new(self.hidden_dim, 1).init(device),
            relu: Relu::new(),
        }
    }
}

impl<B: Backend> PerceptionNetwork<B> {
    /// Forward pass: [batch, input_dim] -> [batch, 1].
    pub fn forward(&self, input: Tensor<B, 2>) -> Tensor<B, 2> {
        let x = self.relu.forward(self.fc1.forward(input));
        self.fc2.forward(x)
    }

    /// Number of input features the first layer accepts.
    pub fn input_dim(&self) -> usize {
        self.fc1.weight.val().dims()[0]
    }
}
