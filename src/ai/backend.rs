//! Backend type aliases and device management.
//!
//! Everything runs on the CPU `NdArray` backend: the networks are small and
//! an episode is evaluated one frame at a time.

use burn::backend::{
    ndarray::{NdArray, NdArrayDevice},
    Autodiff,
};

/// Backend used for the policy network and its optimizer.
pub type TrainBackend = Autodiff<InferBackend>;

/// Backend used for the frozen perception networks and evaluation.
pub type InferBackend = NdArray<f32>;

pub fn default_device() -> NdArrayDevice {
    NdArrayDevice::default()
}
