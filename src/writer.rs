//! This module contains the writer loop, the only code that appends to the
//! target file.
use crate::error::{LoggerError, Result, WriteFailure};
use crate::format::LineFormatter;
use crate::queue::LogQueue;
use crate::retry::WriteRetryPolicy;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tokio::select;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Summary of a writer loop's lifetime, returned when it stops.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriterReport {
    /// Lines appended to the file.
    pub written: u64,
    /// Lines that could not be appended and were reported as failures.
    pub failed: u64,
    /// Whether the loop stopped because of cancellation rather than end-of-stream.
    pub cancelled: bool,
}

/// Where the writer reports failed appends, shared with the owning logger.
///
/// The most recent failure message is always kept. Full `WriteFailure`s are
/// only sent once the owner has asked for a receiver.
#[derive(Default)]
pub(crate) struct FailureReporter {
    last_error: Mutex<Option<String>>,
    sink: Mutex<Option<mpsc::UnboundedSender<WriteFailure>>>,
}

impl FailureReporter {
    /// Starts forwarding failures to a new channel and returns its receiver.
    pub(crate) fn subscribe(&self) -> mpsc::UnboundedReceiver<WriteFailure> {
        let (tx, rx) = mpsc::unbounded_channel();
        *self.sink.lock().unwrap_or_else(PoisonError::into_inner) = Some(tx);
        rx
    }

    pub(crate) fn last_error(&self) -> Option<String> {
        self.last_error
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn report(&self, line: String, error: LoggerError) {
        error!("Failed to write log line: {}", error);
        *self
            .last_error
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(error.to_string());

        let mut sink = self.sink.lock().unwrap_or_else(PoisonError::into_inner);
        let receiver_gone = match sink.as_ref() {
            Some(tx) => tx.send(WriteFailure { line, error }).is_err(),
            None => false,
        };
        if receiver_gone {
            debug!("Failure receiver dropped, keeping only the last error");
            *sink = None;
        }
    }

    #[cfg(test)]
    fn is_subscribed(&self) -> bool {
        self.sink
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }
}

pub(crate) struct LogWriter {
    pub(crate) path: PathBuf,
    pub(crate) queue: Arc<LogQueue>,
    pub(crate) formatter: LineFormatter,
    pub(crate) retry: WriteRetryPolicy,
    pub(crate) failures: Arc<FailureReporter>,
    pub(crate) shutdown: CancellationToken,
}

/// Closes the queue when the writer exits for any reason, so producers never
/// feed a queue nobody is draining.
struct CloseOnExit(Arc<LogQueue>);

impl Drop for CloseOnExit {
    fn drop(&mut self) {
        let discarded = self.0.abandon();
        if discarded > 0 {
            warn!("Log writer stopped with {} entries still queued", discarded);
        }
    }
}

impl LogWriter {
    /// Runs the writer loop until the queue reports end-of-stream or the
    /// shutdown token is cancelled.
    ///
    /// Each entry is formatted, then appended with its own open/write/close
    /// cycle. Opening the file is retried per the retry policy; a failed
    /// append is reported and the loop carries on with the next entry.
    pub(crate) async fn run(self) -> WriterReport {
        let _guard = CloseOnExit(Arc::clone(&self.queue));
        info!("Starting log writer for {}", self.path.display());

        let mut report = WriterReport::default();

        loop {
            let next = select! {
                biased;

                _ = self.shutdown.cancelled() => {
                    info!("Log writer cancelled");
                    report.cancelled = true;
                    break;
                }

                entry = self.queue.dequeue() => entry,
            };

            let Some(entry) = next else {
                debug!("Log queue drained, stopping writer");
                break;
            };

            let line = self.formatter.format(&entry);
            match append_line(&self.path, &line, &self.retry).await {
                Ok(()) => report.written += 1,
                Err(e) => {
                    report.failed += 1;
                    self.failures.report(line, e);
                }
            }
            self.queue.mark_processed();
        }

        info!(
            "Log writer stopped: {} written, {} failed",
            report.written, report.failed
        );
        report
    }
}

/// Appends one newline-terminated line, releasing the file before returning.
///
/// Only opening the file is retried. Once bytes may have reached the file a
/// second attempt could append a duplicate fragment, so write errors are final.
async fn append_line(path: &Path, line: &str, retry: &WriteRetryPolicy) -> Result<()> {
    let write_error = |source| LoggerError::Write {
        path: path.to_path_buf(),
        source,
    };

    let mut options = OpenOptions::new();
    options.create(true).append(true);

    let mut file = retry
        .retry(|| options.open(path))
        .await
        .map_err(write_error)?;

    let mut buf = String::with_capacity(line.len() + 1);
    buf.push_str(line);
    buf.push('\n');

    file.write_all(buf.as_bytes()).await.map_err(write_error)?;
    file.flush().await.map_err(write_error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::QueueMode;
    use crate::entry::LogEntry;
    use std::time::Duration;

    fn writer_for(
        path: PathBuf,
        queue: Arc<LogQueue>,
    ) -> LogWriter {
        LogWriter {
            path,
            queue,
            formatter: LineFormatter::new(false, "%H").unwrap(),
            retry: WriteRetryPolicy::none(),
            failures: Arc::default(),
            shutdown: CancellationToken::new(),
        }
    }

    #[tokio::test]
    async fn appends_one_line_per_entry() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.log");
        let queue = Arc::new(LogQueue::new(QueueMode::Unbounded));
        queue.enqueue(LogEntry::info("one")).unwrap();
        queue.enqueue(LogEntry::simple("two")).unwrap();
        queue.close_for_input();

        let writer = writer_for(path.clone(), Arc::clone(&queue));
        let report = writer.run().await;

        assert_eq!(report.written, 2);
        assert!(!report.cancelled);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "Info - one\ntwo\n");
        assert_eq!(queue.pending(), 0);
    }

    #[tokio::test]
    async fn failed_appends_are_reported_and_loop_continues() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("out.log");
        let queue = Arc::new(LogQueue::new(QueueMode::Unbounded));
        queue.enqueue(LogEntry::info("a")).unwrap();
        queue.enqueue(LogEntry::info("b")).unwrap();
        queue.close_for_input();

        let writer = writer_for(path, Arc::clone(&queue));
        let failures = Arc::clone(&writer.failures);
        let mut rx = failures.subscribe();
        let report = writer.run().await;

        assert_eq!(report.failed, 2);
        assert_eq!(rx.recv().await.unwrap().line, "Info - a");
        assert_eq!(rx.recv().await.unwrap().line, "Info - b");
        assert!(failures.last_error().is_some());
        assert_eq!(queue.pending(), 0);
    }

    #[tokio::test]
    async fn failures_are_not_buffered_without_a_subscriber() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("out.log");
        let queue = Arc::new(LogQueue::new(QueueMode::Unbounded));
        for i in 0..100 {
            queue.enqueue(LogEntry::simple(i.to_string())).unwrap();
        }
        queue.close_for_input();

        let writer = writer_for(path, Arc::clone(&queue));
        let failures = Arc::clone(&writer.failures);
        let report = writer.run().await;

        assert_eq!(report.failed, 100);
        assert!(!failures.is_subscribed());
        assert!(failures.last_error().unwrap().contains("failed to append"));
    }

    #[tokio::test]
    async fn dropped_receiver_unsubscribes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("out.log");
        let queue = Arc::new(LogQueue::new(QueueMode::Unbounded));
        queue.enqueue(LogEntry::simple("x")).unwrap();
        queue.close_for_input();

        let writer = writer_for(path, Arc::clone(&queue));
        let failures = Arc::clone(&writer.failures);
        drop(failures.subscribe());
        writer.run().await;

        assert!(!failures.is_subscribed());
    }

    #[tokio::test]
    async fn open_is_retried_until_the_directory_exists() {
        let dir = tempfile::tempdir().unwrap();
        let parent = dir.path().join("late");
        let path = parent.join("out.log");
        let queue = Arc::new(LogQueue::new(QueueMode::Unbounded));
        queue.enqueue(LogEntry::info("eventually")).unwrap();
        queue.close_for_input();

        let mut writer = writer_for(path.clone(), Arc::clone(&queue));
        writer.retry =
            WriteRetryPolicy::new(20, Duration::from_millis(10), Duration::from_millis(50));

        let creator = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(30)).await;
            tokio::fs::create_dir(&parent).await.unwrap();
        });
        let report = writer.run().await;
        creator.await.unwrap();

        assert_eq!(report.written, 1);
        assert_eq!(report.failed, 0);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "Info - eventually\n");
    }

    #[tokio::test]
    async fn cancellation_abandons_queue() {
        let dir = tempfile::tempdir().unwrap();
        let queue = Arc::new(LogQueue::new(QueueMode::Unbounded));
        let writer = writer_for(dir.path().join("out.log"), Arc::clone(&queue));
        writer.shutdown.cancel();
        queue.enqueue(LogEntry::info("never written")).unwrap();

        let report = writer.run().await;

        assert!(report.cancelled);
        assert_eq!(report.written, 0);
        assert!(queue.is_closed());
        assert_eq!(queue.pending(), 0);
    }
}
