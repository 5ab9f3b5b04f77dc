/// A paddle move. Discriminants are the indices the policy network emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Action {
    #[default]
    Stay = 0,
    Up = 1,
    Down = 2,
}

impl Action {
    /// Number of discrete actions.
    pub const COUNT: usize = 3;

    pub const ALL: [Action; Action::COUNT] = [Action::Stay, Action::Up, Action::Down];

    /// Convert a network output index into an action.
    pub fn from_index(index: usize) -> Option<Action> {
        Action::ALL.get(index).copied()
    }

    pub fn index(self) -> usize {
        self as usize
    }

    /// Vertical direction in screen coordinates (rows grow downward).
    pub fn dy(self) -> f32 {
        match self {
            Action::Stay => 0.0,
            Action::Up => -1.0,
            Action::Down => 1.0,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Action::Stay => "Stay",
            Action::Up => "Up",
            Action::Down => "Down",
        }
    }
}
