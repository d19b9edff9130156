//! Cancellable timers on a virtual millisecond clock.
//!
//! The host feeds elapsed time in; the owner drains due tasks one by one with
//! [`Scheduler::pop_due`] and runs each to completion before asking for the
//! next, so a task scheduled by another task is seen in the same drain if it
//! falls due in time.

/// Identifies a scheduled task for cancellation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskHandle(u64);

#[derive(Debug)]
struct Entry<T> {
    handle: TaskHandle,
    due: u64,
    /// Re-arm period for repeating tasks.
    period: Option<u64>,
    task: T,
}

#[derive(Debug)]
pub struct Scheduler<T> {
    now: u64,
    next_handle: u64,
    entries: Vec<Entry<T>>,
}

impl<T: Clone> Scheduler<T> {
    pub fn new() -> Self {
        Self {
            now: 0,
            next_handle: 0,
            entries: Vec::new(),
        }
    }

    /// Current virtual time in milliseconds.
    pub fn now(&self) -> u64 {
        self.now
    }

    fn push(&mut self, due: u64, period: Option<u64>, task: T) -> TaskHandle {
        let handle = TaskHandle(self.next_handle);
        self.next_handle += 1;
        self.entries.push(Entry {
            handle,
            due,
            period,
            task,
        });
        handle
    }

    /// Run `task` once, `delay_ms` from now.
    pub fn once(&mut self, delay_ms: u64, task: T) -> TaskHandle {
        self.push(self.now + delay_ms, None, task)
    }

    /// Run `task` every `period_ms`, first after one period. A zero period
    /// is treated as 1 ms.
    pub fn every(&mut self, period_ms: u64, task: T) -> TaskHandle {
        let period = period_ms.max(1);
        self.push(self.now + period, Some(period), task)
    }

    /// Returns false if the task already ran (one-shot) or was cancelled.
    pub fn cancel(&mut self, handle: TaskHandle) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.handle != handle);
        self.entries.len() != before
    }

    pub fn is_scheduled(&self, handle: TaskHandle) -> bool {
        self.entries.iter().any(|e| e.handle == handle)
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Take the earliest task due at or before `until`, moving the clock to
    /// its due time. Ties go to the task scheduled first. Repeating tasks
    /// are re-armed before being returned.
    pub fn pop_due(&mut self, until: u64) -> Option<(TaskHandle, T)> {
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
                Some((entry.handle, entry.task.clone()))
            }
            None => {
                let entry = self.entries.remove(idx);
                Some((entry.handle, entry.task))
            }
        }
    }

    /// Move the clock to `until` once every due task has been drained.
    pub fn finish(&mut self, until: u64) {
        self.now = self.now.max(until);
    }
}

impl<T: Clone> Default for Scheduler<T> {
    fn default() -> Self {
        Self::new()
    }
}
