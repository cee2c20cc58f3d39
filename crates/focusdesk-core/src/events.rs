use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::trace;

use crate::timer::{CurrentTask, TimerMode, TimerState};

pub const MODE_CHANGED: &str = "modeChanged";
pub const CYCLE_COMPLETED: &str = "cycleCompleted";
pub const CURRENT_TASK_CHANGED: &str = "currentTaskChanged";
pub const STATE_CHANGED: &str = "stateChanged";

/// Everything observers can learn about the timer arrives as an Event.
/// The serialized `type` tag is the event name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Event {
    ModeChanged {
        mode: TimerMode,
        total_seconds: u64,
        at: DateTime<Utc>,
    },
    /// A countdown reached zero. `mode` is the mode that finished.
    CycleCompleted {
        mode: TimerMode,
        cycles_completed: u64,
        at: DateTime<Utc>,
    },
    /// Published by the task layer; the timer only reads it.
    CurrentTaskChanged {
        task: Option<CurrentTask>,
        at: DateTime<Utc>,
    },
    /// The timer state changed and should be re-rendered.
    StateChanged {
        state: TimerState,
        at: DateTime<Utc>,
    },
}

impl Event {
    pub fn name(&self) -> &'static str {
        match self {
            Event::ModeChanged { .. } => MODE_CHANGED,
            Event::CycleCompleted { .. } => CYCLE_COMPLETED,
            Event::CurrentTaskChanged { .. } => CURRENT_TASK_CHANGED,
            Event::StateChanged { .. } => STATE_CHANGED,
        }
    }

    pub fn current_task_changed(task: Option<CurrentTask>) -> Self {
        Event::CurrentTaskChanged {
            task,
            at: Utc::now(),
        }
    }
}

/// Publish side of the event channel.
pub trait EventBus: Send + Sync {
    fn publish(&self, event: Event);
}

/// [`EventBus`] over a tokio broadcast channel. Every subscriber sees every
/// event published after it subscribed.
#[derive(Debug, Clone)]
pub struct BroadcastBus {
    tx: broadcast::Sender<Event>,
}

impl BroadcastBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }
}

impl Default for BroadcastBus {
    fn default() -> Self {
        Self::new(256)
    }
}

impl EventBus for BroadcastBus {
    fn publish(&self, event: Event) {
        let name = event.name();
        // Sending only fails when nobody is listening.
        if self.tx.send(event).is_err() {
            trace!(event = name, "no subscribers for event");
        }
    }
}
