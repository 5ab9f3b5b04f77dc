use super::perception::Estimate;

/// Number of entries in a [`StateVector`].
pub const STATE_DIM: usize = 6;

/// Policy input built from perception estimates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StateVector {
    pub my_y: f32,
    pub opponent_y: f32,
    pub ball_x: f32,
    pub ball_y: f32,
    pub prev_ball_x: f32,
    pub prev_ball_y: f32,
}

impl StateVector {
    /// Order: my_y, opponent_y, ball_x, ball_y, prev_ball_x, prev_ball_y.
    pub fn to_array(&self) -> [f32; STATE_DIM] {
        [
            self.my_y,
            self.opponent_y,
            self.ball_x,
            self.ball_y,
            self.prev_ball_x,
            self.prev_ball_y,
        ]
    }
}

/// Assembles state vectors across an episode, remembering the previous
/// ball estimate.
#[derive(Debug, Clone, Default)]
pub struct StateBuilder {
    prev_ball: Option<(f32, f32)>,
}

impl StateBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget the previous ball position. Call at the start of every episode.
    pub fn reset(&mut self) {
        self.prev_ball = None;
    }

    /// Build the state for this step, then remember this step's ball.
    ///
    /// On the first step after a reset the previous ball equals the current one.
    pub fn build(&mut self, estimate: Estimate) -> StateVector {
        let (prev_x, prev_y) = self.prev_ball.unwrap_or((estimate.ball_x, estimate.ball_y));
        self.prev_ball = Some((estimate.ball_x, estimate.ball_y));
        StateVector {
            my_y: estimate.my_y,
            opponent_y: estimate.opponent_y,
            ball_x: estimate.ball_x,
            ball_y: estimate.ball_y,
            prev_ball_x: prev_x,
            prev_ball_y: prev_y,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn estimate(ball_x: f32, ball_y: f32) -> Estimate {
        Estimate {
            ball_x,
            ball_y,
            my_y: 0.5,
            opponent_y: 0.25,
        }
    }

    #[test]
    fn test_first_step_prev_equals_current() {
        let mut builder = StateBuilder::new();
        let state = builder.build(estimate(0.3, 0.7));
        assert_eq!(state.prev_ball_x, 0.3);
        assert_eq!(state.prev_ball_y, 0.7);
    }

    #[test]
    fn test_prev_tracks_previous_step() {
        let mut builder = StateBuilder::new();
        builder.build(estimate(0.3, 0.7));
        let state = builder.build(estimate(0.4, 0.6));
        assert_eq!((state.prev_ball_x, state.prev_ball_y), (0.3, 0.7));
        assert_eq!((state.ball_x, state.ball_y), (0.4, 0.6));
    }

    #[test]
    fn test_reset_clears_memo() {
        let mut builder = StateBuilder::new();
        builder.build(estimate(0.3, 0.7));
        builder.reset();
        let state = builder.build(estimate(0.9, 0.1));
        assert_eq!((state.prev_ball_x, state.prev_ball_y), (0.9, 0.1));
    }

    #[test]
    fn test_array_order() {
        let mut builder = StateBuilder::new();
        let state = builder.build(estimate(0.3, 0.7));
        assert_eq!(state.to_array(), [0.5, 0.25, 0.3, 0.7, 0.3, 0.7]);
    }
}
