use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerMode {
    Focus,
    Break,
}

impl TimerMode {
    /// The mode an automatic switch moves to after this one completes.
    pub fn other(self) -> Self {
        match self {
            TimerMode::Focus => TimerMode::Break,
            TimerMode::Break => TimerMode::Focus,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TimerMode::Focus => "focus",
            TimerMode::Break => "break",
        }
    }
}

impl fmt::Display for TimerMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TimerMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "focus" => Ok(TimerMode::Focus),
            "break" => Ok(TimerMode::Break),
            other => Err(format!("unknown timer mode: {other}")),
        }
    }
}

/// Snapshot of the countdown.
///
/// `running` and `paused` are independent flags: a paused countdown still
/// reports `running == true` but receives no ticks. Use
/// [`TimerState::is_active`] to ask whether a countdown is in progress at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerState {
    pub mode: TimerMode,
    pub time_remaining_seconds: u64,
    pub total_seconds: u64,
    pub running: bool,
    pub paused: bool,
    pub cycles_completed: u64,
}

impl TimerState {
    pub(crate) fn idle(mode: TimerMode, total_seconds: u64, cycles_completed: u64) -> Self {
        Self {
            mode,
            time_remaining_seconds: total_seconds,
            total_seconds,
            running: false,
            paused: false,
            cycles_completed,
        }
    }

    pub fn is_active(&self) -> bool {
        self.running || self.paused
    }
}

/// The task the user has selected in the task list. Display-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentTask {
    pub id: String,
    pub title: String,
}
