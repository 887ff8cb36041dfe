//! Coalescing deferred task queue.
//!
//! Mutations schedule a task to run on the next turn of the host event loop.
//! Scheduling while a task is pending replaces it, so a burst of mutations
//! in one turn collapses into a single run. The host drains the queue with
//! [`CoalescingQueue::take_due`] once the current turn has finished.

/// Identifies one scheduled task. Replaced tasks keep their old handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaskHandle(u64);

#[derive(Debug, Clone)]
pub struct CoalescingQueue<T> {
    pending: Option<(TaskHandle, T)>,
    next: u64,
    coalesced: usize,
}

impl<T> Default for CoalescingQueue<T> {
    fn default() -> Self {
        Self {
            pending: None,
            next: 0,
            coalesced: 0,
        }
    }
}

impl<T> CoalescingQueue<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `task`, replacing any pending one.
    pub fn schedule(&mut self, task: T) -> TaskHandle {
        let handle = TaskHandle(self.next);
        self.next += 1;
        if self.pending.replace((handle, task)).is_some() {
            self.coalesced += 1;
        }
        handle
    }

    /// Drop the pending task, if any.
    pub fn cancel(&mut self) -> Option<T> {
        self.coalesced = 0;
        self.pending.take().map(|(_, task)| task)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn pending_handle(&self) -> Option<TaskHandle> {
        self.pending.as_ref().map(|(handle, _)| *handle)
    }

    /// Take the task that should run this turn.
    pub fn take_due(&mut self) -> Option<T> {
        let (handle, task) = self.pending.take()?;
        if self.coalesced > 0 {
            tracing::trace!(?handle, coalesced = self.coalesced, "Running coalesced task");
        }
        self.coalesced = 0;
        Some(task)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_last_task_runs() {
        let mut queue = CoalescingQueue::new();
        queue.schedule(1);
        queue.schedule(2);
        let last = queue.schedule(3);
        assert_eq!(queue.pending_handle(), Some(last));
        assert_eq!(queue.take_due(), Some(3));
        assert_eq!(queue.take_due(), None);
    }

    #[test]
    fn test_cancel() {
        let mut queue = CoalescingQueue::new();
        queue.schedule("apply");
        assert!(queue.is_pending());
        assert_eq!(queue.cancel(), Some("apply"));
        assert!(!queue.is_pending());
        assert_eq!(queue.take_due(), None);
    }

    #[test]
    fn test_handles_increase() {
        let mut queue = CoalescingQueue::new();
        let a = queue.schedule(());
        queue.take_due();
        let b = queue.schedule(());
        assert!(b > a);
    }
}
