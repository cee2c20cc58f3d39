mod config;
mod cycles;
mod engine;
mod scheduler;
mod state;

pub use config::{ConfigPatch, ConfigStore, TimerConfig, CONFIG_KEY};
pub use cycles::{CycleCounter, CYCLES_KEY};
pub use engine::{EngineOptions, TimerEngine};
pub use scheduler::{ScheduleHandle, Scheduler};
pub use state::{CurrentTask, TimerMode, TimerState};
