//! Cancellable job queue driven by elapsed time.
//!
//! The queue keeps its own clock, which only moves when the caller pops due
//! jobs or advances it. Nothing here sleeps or spawns: the owner decides
//! when time passes, so the same queue serves the tokio driver and tests.
//!
//! ```text
//! let tick = queue.schedule_repeating(Duration::from_secs(1), Job::Tick);
//! while let Some((_, job)) = queue.pop_due(until) { /* handle job */ }
//! queue.advance_to(until);
//! ```

use std::time::Duration;

/// Identifies one scheduled job. Stays valid (and harmless to cancel) after
/// the job has fired or been cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScheduleHandle(u64);

#[derive(Debug)]
struct Entry<J> {
    handle: ScheduleHandle,
    due: Duration,
    period: Option<Duration>,
    job: J,
}

#[derive(Debug)]
pub struct Scheduler<J> {
    now: Duration,
    next_id: u64,
    entries: Vec<Entry<J>>,
}

impl<J: Clone> Scheduler<J> {
    pub fn new() -> Self {
        Self {
            now: Duration::ZERO,
            next_id: 0,
            entries: Vec::new(),
        }
    }

    /// Current queue time, measured from construction.
    pub fn now(&self) -> Duration {
        self.now
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Run `job` once, `delay` from now.
    pub fn schedule_once(&mut self, delay: Duration, job: J) -> ScheduleHandle {
        self.push(delay, None, job)
    }

    /// Run `job` every `period`, first one `period` from now.
    pub fn schedule_repeating(&mut self, period: Duration, job: J) -> ScheduleHandle {
        // A zero period would never let the clock move past a due entry.
        let period = period.max(Duration::from_millis(1));
        self.push(period, Some(period), job)
    }

    fn push(&mut self, delay: Duration, period: Option<Duration>, job: J) -> ScheduleHandle {
        let handle = ScheduleHandle(self.next_id);
        self.next_id += 1;
        self.entries.push(Entry {
            handle,
            due: self.now + delay,
            period,
            job,
        });
        handle
    }

    /// Cancel a job. Returns whether anything was removed; cancelling a
    /// fired, cancelled or unknown handle is a no-op.
    pub fn cancel(&mut self, handle: ScheduleHandle) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.handle != handle);
        self.entries.len() != before
    }

    /// Cancel every job matching `pred`. Returns how many were removed.
    pub fn cancel_where(&mut self, mut pred: impl FnMut(&J) -> bool) -> usize {
        let before = self.entries.len();
        self.entries.retain(|e| !pred(&e.job));
        before - self.entries.len()
    }

    pub fn is_scheduled(&self, handle: ScheduleHandle) -> bool {
        self.entries.iter().any(|e| e.handle == handle)
    }

    pub fn any(&self, mut pred: impl FnMut(&J) -> bool) -> bool {
        self.entries.iter().any(|e| pred(&e.job))
    }

    /// Pop the earliest job due at or before `until`.
    ///
    /// Ties fire in scheduling order. The clock moves to the job's due time,
    /// so anything scheduled while handling it is relative to that instant.
    /// Recurring jobs are re-armed one period later.
    pub fn pop_due(&mut self, until: Duration) -> Option<(ScheduleHandle, J)> {
        let idx = self
            .entries
            .iter()
            .enumerate()
            .filter(|(_, e)| e.due <= until)
            .min_by_key(|(_, e)| (e.due, e.handle))
            .map(|(i, _)| i)?;

        let due = self.entries[idx].due;
        self.now = self.now.max(due);

        match self.entries[idx].period {
            Some(period) => {
                let entry = &mut self.entries[idx];
                entry.due += period;
                Some((entry.handle, entry.job.clone()))
            }
            None => {
                let entry = self.entries.remove(idx);
                Some((entry.handle, entry.job))
            }
        }
    }

    /// Move the clock forward without firing anything.
    pub fn advance_to(&mut self, until: Duration) {
        self.now = self.now.max(until);
    }
}

impl<J: Clone> Default for Scheduler<J> {
    fn default() -> Self {
        Self::new()
    }
}
