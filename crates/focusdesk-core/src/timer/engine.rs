//! Timer engine implementation.
//!
//! The engine is a countdown state machine over two modes (focus and break).
//! It owns a [`Scheduler`] for its recurring one-second tick and for the
//! delayed automatic mode switch; the caller feeds elapsed time in through
//! [`TimerEngine::advance`]. No internal threads.
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Running -> Paused -> Running -> (complete) -> Idle
//!   ^                                          |
//!   +--------- reset / switch_mode ------------+
//! ```
//!
//! `running` and `paused` are separate flags: a paused timer still reports
//! `running == true`.
//!
//! ## Usage
//!
//! ```ignore
//! let mut engine = TimerEngine::open(store, notifier, bus);
//! engine.start();
//! // In a loop:
//! engine.advance(elapsed);
//! ```

use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, trace, warn};

use super::config::{ConfigPatch, ConfigStore, TimerConfig};
use super::cycles::CycleCounter;
use super::scheduler::{ScheduleHandle, Scheduler};
use super::state::{CurrentTask, TimerMode, TimerState};
use crate::events::{Event, EventBus};
use crate::notify::Notifier;
use crate::storage::KvStore;

/// Timing knobs for the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineOptions {
    pub tick_interval: Duration,
    /// Delay between completion and the automatic mode switch.
    pub auto_switch_delay: Duration,
    /// When set, `reset`, `switch_mode` and `start` drop a pending automatic
    /// switch. Off by default: the switch fires even after the user acted.
    pub cancel_pending_auto_switch: bool,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_secs(1),
            auto_switch_delay: Duration::from_secs(2),
            cancel_pending_auto_switch: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EngineJob {
    Tick,
    AutoSwitch(TimerMode),
}

/// Core timer engine.
pub struct TimerEngine {
    state: TimerState,
    config: ConfigStore,
    cycles: CycleCounter,
    notifier: Arc<dyn Notifier>,
    bus: Arc<dyn EventBus>,
    scheduler: Scheduler<EngineJob>,
    tick_handle: Option<ScheduleHandle>,
    current_task: Option<CurrentTask>,
    options: EngineOptions,
}

impl TimerEngine {
    /// Create an engine in focus mode, idle, with the persisted cycle count.
    pub fn new(
        config: ConfigStore,
        cycles: CycleCounter,
        notifier: Arc<dyn Notifier>,
        bus: Arc<dyn EventBus>,
    ) -> Self {
        let total = config.current().focus_seconds;
        let state = TimerState::idle(TimerMode::Focus, total, cycles.load());
        debug!(total, cycles = state.cycles_completed, "timer engine created");
        Self {
            state,
            config,
            cycles,
            notifier,
            bus,
            scheduler: Scheduler::new(),
            tick_handle: None,
            current_task: None,
            options: EngineOptions::default(),
        }
    }

    /// Load configuration and cycle count from `store` and build an engine.
    pub fn open(
        store: Arc<dyn KvStore>,
        notifier: Arc<dyn Notifier>,
        bus: Arc<dyn EventBus>,
    ) -> Self {
        let config = ConfigStore::open(Arc::clone(&store));
        let cycles = CycleCounter::new(store);
        Self::new(config, cycles, notifier, bus)
    }

    pub fn with_options(mut self, options: EngineOptions) -> Self {
        self.options = options;
        self
    }

    // ── Queries ──────────────────────────────────────────────────────

    /// Copy of the current state.
    pub fn state(&self) -> TimerState {
        self.state
    }

    pub fn config(&self) -> &TimerConfig {
        self.config.current()
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    pub fn current_task(&self) -> Option<&CurrentTask> {
        self.current_task.as_ref()
    }

    pub fn is_active(&self) -> bool {
        self.state.is_active()
    }

    pub fn has_pending_auto_switch(&self) -> bool {
        self.scheduler
            .any(|job| matches!(job, EngineJob::AutoSwitch(_)))
    }

    // ── Commands ─────────────────────────────────────────────────────

    pub fn start(&mut self) {
        self.drop_pending_auto_switch();
        if self.state.running {
            trace!("start ignored, already running");
            return;
        }
        self.state.running = true;
        self.state.paused = false;
        self.schedule_ticks();
        info!(
            mode = %self.state.mode,
            remaining = self.state.time_remaining_seconds,
            "timer started"
        );
        self.render();
    }

    pub fn pause(&mut self) {
        if !self.state.running || self.state.paused {
            trace!("pause ignored, not counting down");
            return;
        }
        self.state.paused = true;
        self.cancel_ticks();
        info!(remaining = self.state.time_remaining_seconds, "timer paused");
        self.render();
    }

    pub fn resume(&mut self) {
        if !self.state.paused {
            trace!("resume ignored, not paused");
            return;
        }
        self.state.paused = false;
        self.state.running = true;
        self.schedule_ticks();
        info!(remaining = self.state.time_remaining_seconds, "timer resumed");
        self.render();
    }

    pub fn reset(&mut self) {
        self.drop_pending_auto_switch();
        self.cancel_ticks();
        self.state.running = false;
        self.state.paused = false;
        self.state.time_remaining_seconds = self.state.total_seconds;
        info!(mode = %self.state.mode, "timer reset");
        self.render();
    }

    pub fn switch_mode(&mut self, target: TimerMode) {
        if target == self.state.mode {
            trace!(mode = %target, "switch ignored, already in mode");
            return;
        }
        self.drop_pending_auto_switch();
        self.cancel_ticks();
        let total = self.config.current().seconds_for(target);
        self.state = TimerState::idle(target, total, self.state.cycles_completed);
        info!(mode = %target, total, "mode switched");
        self.bus.publish(Event::ModeChanged {
            mode: target,
            total_seconds: total,
            at: Utc::now(),
        });
        self.render();
    }

    /// Merge `patch` into the configuration and persist it. An idle timer
    /// picks up the new duration for its current mode immediately.
    pub fn update_config(&mut self, patch: &ConfigPatch) {
        let config = self.config.apply(patch);
        debug!(?config, "timer config updated");
        if !self.state.running {
            let total = config.seconds_for(self.state.mode);
            self.state.total_seconds = total;
            self.state.time_remaining_seconds = total;
            self.render();
        }
    }

    /// Record the task selected in the task list. Does not touch the countdown.
    pub fn set_current_task(&mut self, task: Option<CurrentTask>) {
        debug!(task = ?task.as_ref().map(|t| &t.title), "current task changed");
        self.current_task = task;
    }

    /// Deliver `elapsed` time, firing every job that falls due in order.
    pub fn advance(&mut self, elapsed: Duration) {
        let until = self.scheduler.now() + elapsed;
        while let Some((_, job)) = self.scheduler.pop_due(until) {
            match job {
                EngineJob::Tick => self.tick(),
                EngineJob::AutoSwitch(target) => self.run_auto_switch(target),
            }
        }
        self.scheduler.advance_to(until);
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn tick(&mut self) {
        if self.state.time_remaining_seconds > 0 {
            self.state.time_remaining_seconds -= 1;
            trace!(remaining = self.state.time_remaining_seconds, "tick");
            self.render();
        }
        if self.state.time_remaining_seconds == 0 {
            self.complete();
        }
    }

    fn complete(&mut self) {
        self.cancel_ticks();
        self.state.running = false;
        self.state.paused = false;

        let finished = self.state.mode;
        self.notify_completion(finished);

        if finished == TimerMode::Focus {
            self.state.cycles_completed += 1;
            self.cycles.save(self.state.cycles_completed);
        }
        info!(
            mode = %finished,
            cycles = self.state.cycles_completed,
            "countdown completed"
        );
        self.bus.publish(Event::CycleCompleted {
            mode: finished,
            cycles_completed: self.state.cycles_completed,
            at: Utc::now(),
        });

        if self.config.current().auto_switch {
            let target = finished.other();
            self.scheduler
                .schedule_once(self.options.auto_switch_delay, EngineJob::AutoSwitch(target));
            debug!(mode = %target, delay = ?self.options.auto_switch_delay, "auto-switch scheduled");
        }
        self.render();
    }

    fn run_auto_switch(&mut self, target: TimerMode) {
        debug!(mode = %target, "auto-switch firing");
        self.switch_mode(target);
        self.start();
    }

    fn notify_completion(&self, finished: TimerMode) {
        if self.config.current().sound_enabled {
            if let Err(e) = self.notifier.play_sound() {
                warn!(error = %e, "failed to play completion sound");
            }
        }

        let (title, mut body) = match finished {
            TimerMode::Focus => ("Focus session complete", String::from("Time for a break.")),
            TimerMode::Break => ("Break is over", String::from("Ready to focus again?")),
        };
        if let Some(task) = &self.current_task {
            body.push_str(&format!(" Task: {}", task.title));
        }
        if let Err(e) = self.notifier.show_alert(title, &body) {
            warn!(error = %e, "failed to show completion alert");
        }
    }

    fn schedule_ticks(&mut self) {
        self.cancel_ticks();
        let handle = self
            .scheduler
            .schedule_repeating(self.options.tick_interval, EngineJob::Tick);
        self.tick_handle = Some(handle);
    }

    fn cancel_ticks(&mut self) {
        if let Some(handle) = self.tick_handle.take() {
            self.scheduler.cancel(handle);
        }
    }

    fn drop_pending_auto_switch(&mut self) {
        if !self.options.cancel_pending_auto_switch {
            return;
        }
        let dropped = self
            .scheduler
            .cancel_where(|job| matches!(job, EngineJob::AutoSwitch(_)));
        if dropped > 0 {
            debug!(dropped, "pending auto-switch cancelled");
        }
    }

    fn render(&self) {
        self.bus.publish(Event::StateChanged {
            state: self.state,
            at: Utc::now(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::NotifyError;
    use crate::events::BroadcastBus;
    use crate::storage::{save_value, MemoryStore};
    use crate::timer::config::CONFIG_KEY;
    use crate::timer::cycles::CYCLES_KEY;
    use proptest::prelude::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use tokio::sync::broadcast;

    #[derive(Default)]
    struct RecordingNotifier {
        sounds: AtomicUsize,
        alerts: Mutex<Vec<(String, String)>>,
        fail: bool,
    }

    impl RecordingNotifier {
        fn failing() -> Self {
            Self {
                fail: true,
                ..Self::default()
            }
        }

        fn alerts(&self) -> Vec<(String, String)> {
            self.alerts.lock().unwrap().clone()
        }
    }

    impl Notifier for RecordingNotifier {
        fn play_sound(&self) -> Result<(), NotifyError> {
            self.sounds.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(NotifyError::Sound("no audio device".into()));
            }
            Ok(())
        }

        fn show_alert(&self, title: &str, body: &str) -> Result<(), NotifyError> {
            self.alerts
                .lock()
                .unwrap()
                .push((title.to_string(), body.to_string()));
            if self.fail {
                return Err(NotifyError::Alert("permission denied".into()));
            }
            Ok(())
        }
    }

    struct Harness {
        engine: TimerEngine,
        store: Arc<MemoryStore>,
        notifier: Arc<RecordingNotifier>,
        events: broadcast::Receiver<Event>,
    }

    impl Harness {
        fn with(config: TimerConfig, notifier: RecordingNotifier) -> Self {
            let store = Arc::new(MemoryStore::new());
            save_value(store.as_ref(), CONFIG_KEY, &config).unwrap();
            let notifier = Arc::new(notifier);
            let bus = Arc::new(BroadcastBus::new(1024));
            let events = bus.subscribe();
            let engine = TimerEngine::open(store.clone(), notifier.clone(), bus);
            Self {
                engine,
                store,
                notifier,
                events,
            }
        }

        fn new(config: TimerConfig) -> Self {
            Self::with(config, RecordingNotifier::default())
        }

        fn ticks(&mut self, n: u64) {
            for _ in 0..n {
                self.engine.advance(Duration::from_secs(1));
            }
        }

        fn event_names(&mut self) -> Vec<&'static str> {
            let mut names = Vec::new();
            while let Ok(event) = self.events.try_recv() {
                names.push(event.name());
            }
            names
        }
    }

    fn short(auto_switch: bool) -> TimerConfig {
        TimerConfig {
            focus_seconds: 5,
            break_seconds: 2,
            auto_switch,
            sound_enabled: true,
        }
    }

    #[test]
    fn new_engine_is_idle_in_focus() {
        let h = Harness::new(short(false));
        let state = h.engine.state();
        assert_eq!(state.mode, TimerMode::Focus);
        assert_eq!(state.time_remaining_seconds, 5);
        assert_eq!(state.total_seconds, 5);
        assert!(!state.running);
        assert!(!state.paused);
        assert_eq!(state.cycles_completed, 0);
    }

    #[test]
    fn new_engine_loads_persisted_cycles() {
        let store = Arc::new(MemoryStore::new());
        save_value(store.as_ref(), CYCLES_KEY, &7u64).unwrap();
        let engine = TimerEngine::open(
            store,
            Arc::new(RecordingNotifier::default()),
            Arc::new(BroadcastBus::default()),
        );
        assert_eq!(engine.state().cycles_completed, 7);
        assert_eq!(engine.state().total_seconds, 1500);
    }

    #[test]
    fn ticks_are_ignored_until_started() {
        let mut h = Harness::new(short(false));
        h.ticks(3);
        assert_eq!(h.engine.state().time_remaining_seconds, 5);
    }

    #[test]
    fn focus_completion_counts_cycle_without_auto_switch() {
        let mut h = Harness::new(short(false));
        h.engine.start();
        h.ticks(5);

        let state = h.engine.state();
        assert_eq!(state.time_remaining_seconds, 0);
        assert!(!state.running);
        assert!(!state.paused);
        assert_eq!(state.cycles_completed, 1);
        assert_eq!(state.mode, TimerMode::Focus);
        assert_eq!(h.store.get_raw(CYCLES_KEY).unwrap().as_deref(), Some("1"));

        h.ticks(5);
        assert_eq!(h.engine.state().mode, TimerMode::Focus);
        assert!(!h.engine.has_pending_auto_switch());
        assert!(h.event_names().contains(&crate::events::CYCLE_COMPLETED));
    }

    #[test]
    fn auto_switch_starts_break_after_delay() {
        let mut h = Harness::new(short(true));
        h.engine.start();
        h.ticks(5);
        assert!(h.engine.has_pending_auto_switch());
        assert_eq!(h.engine.state().mode, TimerMode::Focus);

        h.engine.advance(Duration::from_millis(1999));
        assert_eq!(h.engine.state().mode, TimerMode::Focus);

        h.engine.advance(Duration::from_millis(1));
        let state = h.engine.state();
        assert_eq!(state.mode, TimerMode::Break);
        assert_eq!(state.time_remaining_seconds, 2);
        assert!(state.running);
        assert!(!h.engine.has_pending_auto_switch());
    }

    #[test]
    fn break_completion_keeps_cycle_count_and_switches_back() {
        let mut h = Harness::new(short(true));
        h.engine.start();
        h.ticks(5);
        h.engine.advance(Duration::from_secs(2));
        h.ticks(2);

        let state = h.engine.state();
        assert_eq!(state.mode, TimerMode::Break);
        assert_eq!(state.cycles_completed, 1);
        assert!(!state.running);

        h.engine.advance(Duration::from_secs(2));
        let state = h.engine.state();
        assert_eq!(state.mode, TimerMode::Focus);
        assert_eq!(state.time_remaining_seconds, 5);
        assert!(state.running);
    }

    #[test]
    fn pause_suspends_ticks() {
        let mut h = Harness::new(TimerConfig {
            focus_seconds: 20,
            ..short(false)
        });
        h.engine.start();
        h.ticks(2);
        h.engine.pause();
        let paused = h.engine.state();
        assert!(paused.running);
        assert!(paused.paused);
        assert!(h.engine.is_active());

        h.ticks(3);
        assert_eq!(h.engine.state().time_remaining_seconds, 18);

        h.engine.resume();
        h.ticks(3);
        let state = h.engine.state();
        assert_eq!(state.time_remaining_seconds, state.total_seconds - 5);
        assert!(state.running);
        assert!(!state.paused);
    }

    #[test]
    fn pause_then_resume_keeps_time() {
        let mut h = Harness::new(short(false));
        h.engine.start();
        h.ticks(1);
        h.engine.pause();
        h.engine.resume();
        assert_eq!(h.engine.state().time_remaining_seconds, 4);
    }

    #[test]
    fn resume_restarts_a_full_period() {
        let mut h = Harness::new(short(false));
        h.engine.start();
        h.engine.advance(Duration::from_millis(900));
        h.engine.pause();
        h.engine.resume();
        h.engine.advance(Duration::from_millis(900));
        assert_eq!(h.engine.state().time_remaining_seconds, 5);
        h.engine.advance(Duration::from_millis(100));
        assert_eq!(h.engine.state().time_remaining_seconds, 4);
    }

    #[test]
    fn start_and_pause_are_idempotent() {
        let mut h = Harness::new(short(false));
        h.engine.start();
        h.engine.start();
        h.ticks(2);
        // A second tick schedule would have double-decremented.
        assert_eq!(h.engine.state().time_remaining_seconds, 3);

        h.engine.pause();
        let once = h.engine.state();
        h.engine.pause();
        assert_eq!(h.engine.state(), once);
    }

    #[test]
    fn preconditions_unmet_are_no_ops() {
        let mut h = Harness::new(short(false));
        let before = h.engine.state();
        h.engine.pause();
        h.engine.resume();
        h.engine.switch_mode(TimerMode::Focus);
        assert_eq!(h.engine.state(), before);
        assert!(h.event_names().is_empty());
    }

    #[test]
    fn reset_restores_full_time() {
        let mut h = Harness::new(short(false));
        h.engine.start();
        h.ticks(3);
        h.engine.pause();
        h.engine.reset();

        let state = h.engine.state();
        assert_eq!(state.time_remaining_seconds, state.total_seconds);
        assert!(!state.running);
        assert!(!state.paused);
        h.ticks(2);
        assert_eq!(h.engine.state().time_remaining_seconds, 5);
    }

    #[test]
    fn switch_mode_mid_countdown_resets_to_break() {
        let mut h = Harness::new(short(false));
        h.engine.start();
        h.ticks(2);
        h.event_names();

        h.engine.switch_mode(TimerMode::Break);
        let state = h.engine.state();
        assert_eq!(state.mode, TimerMode::Break);
        assert_eq!(state.total_seconds, 2);
        assert_eq!(state.time_remaining_seconds, 2);
        assert!(!state.running);
        assert!(!state.paused);
        assert_eq!(state.cycles_completed, 0);
        assert_eq!(
            h.event_names(),
            vec![crate::events::MODE_CHANGED, crate::events::STATE_CHANGED]
        );

        h.ticks(3);
        assert_eq!(h.engine.state().time_remaining_seconds, 2);
    }

    #[test]
    fn pending_auto_switch_survives_manual_reset() {
        let mut h = Harness::new(short(true));
        h.engine.start();
        h.ticks(5);
        h.engine.reset();
        h.engine.advance(Duration::from_secs(2));

        let state = h.engine.state();
        assert_eq!(state.mode, TimerMode::Break);
        assert!(state.running);
    }

    #[test]
    fn pending_auto_switch_can_be_cancelled_by_user_action() {
        let mut h = Harness::new(short(true));
        h.engine = h.engine.with_options(EngineOptions {
            cancel_pending_auto_switch: true,
            ..EngineOptions::default()
        });
        h.engine.start();
        h.ticks(5);
        h.engine.reset();
        assert!(!h.engine.has_pending_auto_switch());
        h.engine.advance(Duration::from_secs(2));

        let state = h.engine.state();
        assert_eq!(state.mode, TimerMode::Focus);
        assert!(!state.running);
    }

    #[test]
    fn update_config_applies_to_idle_timer() {
        let mut h = Harness::new(short(false));
        h.engine.update_config(&ConfigPatch::default().focus_seconds(90));
        let state = h.engine.state();
        assert_eq!(state.total_seconds, 90);
        assert_eq!(state.time_remaining_seconds, 90);
        assert_eq!(h.engine.config().focus_seconds, 90);

        let stored: TimerConfig =
            serde_json::from_str(&h.store.get_raw(CONFIG_KEY).unwrap().unwrap()).unwrap();
        assert_eq!(stored.focus_seconds, 90);
    }

    #[test]
    fn update_config_leaves_running_countdown_alone() {
        let mut h = Harness::new(short(false));
        h.engine.start();
        h.ticks(1);
        h.engine.update_config(&ConfigPatch::default().focus_seconds(90));
        assert_eq!(h.engine.state().total_seconds, 5);
        assert_eq!(h.engine.state().time_remaining_seconds, 4);

        h.engine.reset();
        assert_eq!(h.engine.state().time_remaining_seconds, 5);
        h.engine.switch_mode(TimerMode::Break);
        h.engine.switch_mode(TimerMode::Focus);
        assert_eq!(h.engine.state().total_seconds, 90);
    }

    #[test]
    fn update_config_while_paused_keeps_countdown() {
        let mut h = Harness::new(short(false));
        h.engine.start();
        h.ticks(1);
        h.engine.pause();
        h.engine.update_config(&ConfigPatch::default().focus_seconds(90));
        assert_eq!(h.engine.state().time_remaining_seconds, 4);
    }

    #[test]
    fn completion_notifies_with_current_task() {
        let mut h = Harness::new(short(false));
        h.engine.set_current_task(Some(CurrentTask {
            id: "1".into(),
            title: "Write report".into(),
        }));
        h.engine.start();
        h.ticks(5);

        assert_eq!(h.notifier.sounds.load(Ordering::SeqCst), 1);
        let alerts = h.notifier.alerts();
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].0, "Focus session complete");
        assert!(alerts[0].1.ends_with("Task: Write report"));
    }

    #[test]
    fn sound_respects_config() {
        let mut h = Harness::new(TimerConfig {
            sound_enabled: false,
            ..short(false)
        });
        h.engine.start();
        h.ticks(5);
        assert_eq!(h.notifier.sounds.load(Ordering::SeqCst), 0);
        assert_eq!(h.notifier.alerts().len(), 1);
    }

    #[test]
    fn notifier_failure_does_not_stop_completion() {
        let mut h = Harness::with(short(false), RecordingNotifier::failing());
        h.engine.start();
        h.ticks(5);
        assert_eq!(h.engine.state().cycles_completed, 1);
        assert_eq!(h.store.get_raw(CYCLES_KEY).unwrap().as_deref(), Some("1"));
    }

    #[test]
    fn persistence_failure_keeps_in_memory_count() {
        let mut h = Harness::new(short(false));
        h.store.set_available(false);
        h.engine.start();
        h.ticks(5);
        assert_eq!(h.engine.state().cycles_completed, 1);

        h.store.set_available(true);
        assert!(h.store.get_raw(CYCLES_KEY).unwrap().is_none());
    }

    #[test]
    fn starting_at_zero_completes_on_next_tick() {
        let mut h = Harness::new(short(false));
        h.engine.start();
        h.ticks(5);
        h.engine.start();
        h.ticks(1);
        let state = h.engine.state();
        assert_eq!(state.cycles_completed, 2);
        assert!(!state.running);
    }

    proptest! {
        #[test]
        fn ticks_decrement_exactly_and_clamp(total in 1u64..120, n in 0u64..200) {
            let mut h = Harness::new(TimerConfig {
                focus_seconds: total,
                ..short(false)
            });
            h.engine.start();
            h.ticks(n);
            let state = h.engine.state();
            prop_assert_eq!(state.time_remaining_seconds, total.saturating_sub(n));
            prop_assert!(state.time_remaining_seconds <= state.total_seconds);
            prop_assert_eq!(state.cycles_completed, u64::from(n >= total));
        }
    }
}
