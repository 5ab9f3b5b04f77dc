use burn::prelude::*;
use burn::tensor::TensorData;

use crate::game::{Frame, BACKGROUND};

/// Channel-0 intensity of the court background, erased by preprocessing.
pub const BACKGROUND_INTENSITY: u8 = BACKGROUND[0];

/// Length of the feature vector produced for a frame of the given size.
pub fn feature_len(height: usize, width: usize) -> usize {
    height.div_ceil(2) * width.div_ceil(2)
}

/// Downsample and binarize a frame.
///
/// Every second row and column of channel 0 is kept; the background becomes
/// 0.0, any other nonzero intensity becomes 1.0. Output is row-major with
/// `ceil(H/2) * ceil(W/2)` entries.
pub fn preprocess_frame(frame: &Frame) -> Vec<f32> {
    let mut features = Vec::with_capacity(feature_len(frame.height(), frame.width()));
    for row in (0..frame.height()).step_by(2) {
        for col in (0..frame.width()).step_by(2) {
            let value = frame.get(row, col, 0);
            let on = value != 0 && value != BACKGROUND_INTENSITY;
            features.push(if on { 1.0 } else { 0.0 });
        }
    }
    features
}

/// Wrap feature vectors as a `[batch, features]` tensor.
pub fn features_to_tensor<B: Backend>(features: &[f32], batch: usize, device: &B::Device) -> Tensor<B, 2> {
    let width = if batch == 0 { 0 } else { features.len() / batch };
    Tensor::<B, 1>::from_data(TensorData::from(features), device).reshape([batch, width])
}
