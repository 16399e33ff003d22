use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BuildState {
    Idle,
    Testing,
    Compiling,
    Packaging,
    Done,
    Failed,
}

impl BuildState {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Testing => "testing",
            Self::Compiling => "compiling",
            Self::Packaging => "packaging",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }

    /// The state that follows on success, `None` for terminal states.
    #[must_use]
    pub const fn next(&self) -> Option<Self> {
        match self {
            Self::Idle => Some(Self::Testing),
            Self::Testing => Some(Self::Compiling),
            Self::Compiling => Some(Self::Packaging),
            Self::Packaging => Some(Self::Done),
            Self::Done | Self::Failed => None,
        }
    }

    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }

    #[must_use]
    pub fn can_transition_to(&self, target: Self) -> bool {
        match target {
            Self::Failed => !self.is_terminal(),
            _ => self.next() == Some(target),
        }
    }
}

impl fmt::Display for BuildState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl TryFrom<&str> for BuildState {
    type Error = String;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        match s {
            "idle" => Ok(Self::Idle),
            "testing" => Ok(Self::Testing),
            "compiling" => Ok(Self::Compiling),
            "packaging" => Ok(Self::Packaging),
            "done" => Ok(Self::Done),
            "failed" => Ok(Self::Failed),
            _ => Err(format!("Unknown build state: {s}")),
        }
    }
}
