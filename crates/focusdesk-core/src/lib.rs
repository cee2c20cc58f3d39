//! # Focusdesk Core Library
//!
//! Core logic for Focusdesk, a task list paired with a Pomodoro-style
//! countdown. The CLI (and any GUI shell) is a thin layer over this crate.
//!
//! ## Architecture
//!
//! - **Timer Engine**: a countdown state machine with its own cancellable
//!   job queue; time is fed in from outside via `advance()`
//! - **Driver**: a tokio task that feeds wall-clock time to the engine
//! - **Storage**: a key-value port with SQLite and in-memory adapters, plus
//!   TOML application settings
//! - **Events**: typed publish/subscribe for `modeChanged`, `cycleCompleted`,
//!   `currentTaskChanged` and `stateChanged`
//! - **Notify**: best-effort completion sound and alert
//!
//! ## Key Components
//!
//! - [`TimerEngine`]: Core timer state machine
//! - [`TimerDriver`]: Real-time driver
//! - [`KvStore`]: Persistence port
//! - [`EventBus`]: Event publication port
//! - [`Notifier`]: Notification port

pub mod driver;
pub mod error;
pub mod events;
pub mod notify;
pub mod storage;
pub mod timer;

pub use driver::TimerDriver;
pub use error::{ConfigKeyError, NotifyError, PersistenceError, SettingsError};
pub use events::{BroadcastBus, Event, EventBus};
pub use notify::{Notifier, NullNotifier, TerminalNotifier};
pub use storage::{AppSettings, KvStore, MemoryStore, SqliteStore};
pub use timer::{
    ConfigPatch, ConfigStore, CurrentTask, CycleCounter, EngineOptions, TimerConfig, TimerEngine,
    TimerMode, TimerState,
};
