//! The queue that hands log entries from producers to the single writer.
//!
//! Producers push from any thread through a plain mutex; the writer task
//! awaits new entries through a `Notify`. Besides the entries themselves the
//! queue keeps the pending count (queued plus the entry being written), which
//! lets owners wait for the writer to catch up.
use crate::config::{OverflowPolicy, QueueMode};
use crate::entry::LogEntry;
use crate::error::{LoggerError, Result};
use std::collections::VecDeque;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use tokio::sync::Notify;

/// A FIFO queue of log entries with a single consumer.
pub struct LogQueue {
    state: Mutex<QueueState>,
    mode: QueueMode,
    /// Wakes the writer when an entry arrives or the queue closes.
    available: Notify,
    /// Wakes producers blocked on a full bounded queue.
    space: Condvar,
    /// Wakes `wait_idle` callers when nothing is pending anymore.
    idle: Notify,
}

#[derive(Default)]
struct QueueState {
    entries: VecDeque<LogEntry>,
    closed: bool,
    pending: usize,
    dropped: u64,
}

impl LogQueue {
    pub fn new(mode: QueueMode) -> Self {
        // A bounded capacity is a limit, not a preallocation size.
        Self {
            state: Mutex::new(QueueState::default()),
            mode,
            available: Notify::new(),
            space: Condvar::new(),
            idle: Notify::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Appends an entry to the tail of the queue.
    ///
    /// In unbounded mode this never blocks. In bounded mode a full queue is
    /// handled according to the configured `OverflowPolicy`.
    ///
    /// # Errors
    ///
    /// Returns `LoggerError::Closed` once the queue has been closed for input,
    /// and `LoggerError::QueueFull` when a `DropNewest` queue rejects the entry.
    pub fn enqueue(&self, entry: LogEntry) -> Result<()> {
        let mut state = self.lock();
        if state.closed {
            return Err(LoggerError::Closed);
        }

        if let QueueMode::Bounded { capacity, overflow } = self.mode {
            while state.entries.len() >= capacity.max(1) {
                match overflow {
                    OverflowPolicy::Block => {
                        state = self
                            .space
                            .wait(state)
                            .unwrap_or_else(PoisonError::into_inner);
                        if state.closed {
                            return Err(LoggerError::Closed);
                        }
                    }
                    OverflowPolicy::DropOldest => {
                        state.entries.pop_front();
                        state.pending = state.pending.saturating_sub(1);
                        state.dropped += 1;
                    }
                    OverflowPolicy::DropNewest => {
                        state.dropped += 1;
                        return Err(LoggerError::QueueFull);
                    }
                }
            }
        }

        state.entries.push_back(entry);
        state.pending += 1;
        drop(state);

        self.available.notify_one();
        Ok(())
    }

    /// Takes the next entry, waiting until one is available.
    ///
    /// Returns `None` once the queue is closed and fully drained. Only the
    /// writer task calls this.
    pub(crate) async fn dequeue(&self) -> Option<LogEntry> {
        loop {
            {
                let mut state = self.lock();
                if let Some(entry) = state.entries.pop_front() {
                    drop(state);
                    self.space.notify_one();
                    return Some(entry);
                }
                if state.closed {
                    return None;
                }
            }
            self.available.notified().await;
        }
    }

    /// Records that a dequeued entry has been written or reported as failed.
    pub(crate) fn mark_processed(&self) {
        let mut state = self.lock();
        state.pending = state.pending.saturating_sub(1);
        let idle = state.pending == 0;
        drop(state);

        if idle {
            self.idle.notify_waiters();
        }
    }

    /// Stops accepting new entries. Entries already queued are still handed
    /// to the writer, after which `dequeue` reports end-of-stream.
    pub fn close_for_input(&self) {
        self.lock().closed = true;
        self.available.notify_one();
        self.space.notify_all();
    }

    /// Closes the queue and discards everything still queued.
    ///
    /// Returns the number of discarded entries.
    pub(crate) fn abandon(&self) -> usize {
        let mut state = self.lock();
        state.closed = true;
        let discarded = state.entries.len();
        state.entries.clear();
        state.pending = 0;
        drop(state);

        self.available.notify_one();
        self.space.notify_all();
        self.idle.notify_waiters();
        discarded
    }

    /// Waits until every accepted entry has been processed.
    pub async fn wait_idle(&self) {
        loop {
            let notified = self.idle.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if self.pending() == 0 {
                return;
            }
            notified.await;
        }
    }

    /// Entries accepted but not yet written, including the one in flight.
    pub fn pending(&self) -> usize {
        self.lock().pending
    }

    /// Entries lost to a bounded queue's overflow policy.
    pub fn dropped(&self) -> u64 {
        self.lock().dropped
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    fn drain_now(queue: &LogQueue) -> Vec<String> {
        let mut state = queue.lock();
        state.entries.drain(..).map(|e| e.message).collect()
    }

    #[tokio::test]
    async fn preserves_submission_order() {
        let queue = LogQueue::new(QueueMode::Unbounded);
        for i in 0..5 {
            queue.enqueue(LogEntry::simple(i.to_string())).unwrap();
        }
        queue.close_for_input();

        let mut seen = Vec::new();
        while let Some(entry) = queue.dequeue().await {
            seen.push(entry.message);
            queue.mark_processed();
        }
        assert_eq!(seen, ["0", "1", "2", "3", "4"]);
        assert_eq!(queue.pending(), 0);
    }

    #[tokio::test]
    async fn closed_queue_rejects_input_but_drains() {
        let queue = LogQueue::new(QueueMode::Unbounded);
        queue.enqueue(LogEntry::info("kept")).unwrap();
        queue.close_for_input();

        assert!(matches!(
            queue.enqueue(LogEntry::info("late")),
            Err(LoggerError::Closed)
        ));
        assert_eq!(queue.dequeue().await.unwrap().message, "kept");
        assert!(queue.dequeue().await.is_none());
    }

    #[tokio::test]
    async fn dequeue_waits_for_producer() {
        let queue = Arc::new(LogQueue::new(QueueMode::Unbounded));
        let producer = Arc::clone(&queue);
        std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(20));
            producer.enqueue(LogEntry::trace("late arrival")).unwrap();
        });

        let entry = tokio::time::timeout(Duration::from_secs(5), queue.dequeue())
            .await
            .expect("dequeue timed out");
        assert_eq!(entry.unwrap().message, "late arrival");
    }

    #[test]
    fn drop_oldest_evicts_head() {
        let queue = LogQueue::new(QueueMode::Bounded {
            capacity: 2,
            overflow: OverflowPolicy::DropOldest,
        });
        for msg in ["a", "b", "c"] {
            queue.enqueue(LogEntry::simple(msg)).unwrap();
        }
        assert_eq!(queue.dropped(), 1);
        assert_eq!(queue.pending(), 2);
        assert_eq!(drain_now(&queue), ["b", "c"]);
    }

    #[test]
    fn drop_newest_rejects_entry() {
        let queue = LogQueue::new(QueueMode::Bounded {
            capacity: 1,
            overflow: OverflowPolicy::DropNewest,
        });
        queue.enqueue(LogEntry::simple("a")).unwrap();
        assert!(matches!(
            queue.enqueue(LogEntry::simple("b")),
            Err(LoggerError::QueueFull)
        ));
        assert_eq!(queue.dropped(), 1);
        assert_eq!(queue.pending(), 1);
        assert_eq!(drain_now(&queue), ["a"]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn block_policy_waits_for_space() {
        let queue = Arc::new(LogQueue::new(QueueMode::Bounded {
            capacity: 1,
            overflow: OverflowPolicy::Block,
        }));
        queue.enqueue(LogEntry::simple("first")).unwrap();

        let producer = Arc::clone(&queue);
        let blocked = std::thread::spawn(move || producer.enqueue(LogEntry::simple("second")));

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(queue.dequeue().await.unwrap().message, "first");
        blocked.join().unwrap().unwrap();
        assert_eq!(queue.dequeue().await.unwrap().message, "second");
        assert_eq!(queue.dropped(), 0);
    }

    #[test]
    fn closing_releases_blocked_producers() {
        let queue = Arc::new(LogQueue::new(QueueMode::Bounded {
            capacity: 1,
            overflow: OverflowPolicy::Block,
        }));
        queue.enqueue(LogEntry::simple("first")).unwrap();

        let producer = Arc::clone(&queue);
        let blocked = std::thread::spawn(move || producer.enqueue(LogEntry::simple("second")));
        std::thread::sleep(Duration::from_millis(20));
        queue.close_for_input();

        assert!(matches!(blocked.join().unwrap(), Err(LoggerError::Closed)));
    }

    #[test]
    fn huge_capacity_does_not_preallocate() {
        let queue = LogQueue::new(QueueMode::Bounded {
            capacity: usize::MAX,
            overflow: OverflowPolicy::DropNewest,
        });
        queue.enqueue(LogEntry::simple("fits")).unwrap();
        assert_eq!(queue.pending(), 1);
        assert_eq!(queue.dropped(), 0);
    }

    #[tokio::test]
    async fn wait_idle_returns_after_abandon() {
        let queue = LogQueue::new(QueueMode::Unbounded);
        queue.enqueue(LogEntry::simple("x")).unwrap();
        queue.enqueue(LogEntry::simple("y")).unwrap();

        assert_eq!(queue.abandon(), 2);
        tokio::time::timeout(Duration::from_secs(5), queue.wait_idle())
            .await
            .expect("wait_idle hung");
        assert!(queue.is_closed());
    }
}
