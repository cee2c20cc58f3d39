//! Real-time driver for [`TimerEngine`].
//!
//! Spawns a tokio task that measures elapsed wall-clock time at a fixed
//! resolution and feeds it to the engine, and that applies
//! `currentTaskChanged` events from the bus. All engine access goes through
//! one mutex, so the engine still sees a single thread of control.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::events::{BroadcastBus, Event};
use crate::timer::{TimerEngine, TimerState};

type SharedEngine = Arc<Mutex<TimerEngine>>;

pub struct TimerDriver {
    engine: SharedEngine,
    task: JoinHandle<()>,
}

impl TimerDriver {
    /// Move `engine` into a background task. Must be called from within a
    /// tokio runtime.
    pub fn spawn(engine: TimerEngine, bus: &BroadcastBus, resolution: Duration) -> Self {
        let engine = Arc::new(Mutex::new(engine));
        let events = bus.subscribe();
        let task = tokio::spawn(run(Arc::clone(&engine), events, resolution));
        info!(?resolution, "timer driver started");
        Self { engine, task }
    }

    /// Run `f` with exclusive access to the engine.
    pub fn with_engine<R>(&self, f: impl FnOnce(&mut TimerEngine) -> R) -> R {
        f(&mut lock(&self.engine))
    }

    pub fn state(&self) -> TimerState {
        lock(&self.engine).state()
    }

    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }

    /// Stop feeding time to the engine.
    pub fn shutdown(self) {
        debug!("timer driver shutting down");
        // Drop aborts the task.
    }
}

impl Drop for TimerDriver {
    fn drop(&mut self) {
        self.task.abort();
    }
}

fn lock(engine: &Mutex<TimerEngine>) -> MutexGuard<'_, TimerEngine> {
    engine.lock().unwrap_or_else(PoisonError::into_inner)
}

async fn run(
    engine: SharedEngine,
    mut events: broadcast::Receiver<Event>,
    resolution: Duration,
) {
    let mut interval = tokio::time::interval(resolution);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut last = Instant::now();
    let mut listening = true;

    loop {
        tokio::select! {
            _ = interval.tick() => {
                let now = Instant::now();
                let elapsed = now.duration_since(last);
                last = now;
                lock(&engine).advance(elapsed);
            }

            received = events.recv(), if listening => {
                match received {
                    Ok(Event::CurrentTaskChanged { task, .. }) => {
                        lock(&engine).set_current_task(task);
                    }
                    Ok(_) => {}
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "timer driver lagged behind the event bus");
                    }
                    Err(RecvError::Closed) => {
                        debug!("event bus closed, driver keeps ticking");
                        listening = false;
                    }
                }
            }
        }
    }
}
