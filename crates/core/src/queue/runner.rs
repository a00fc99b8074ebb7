//! Queue worker implementation.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures::future::{BoxFuture, FutureExt};
use tokio::sync::{mpsc, oneshot};
use tokio::time::{sleep, sleep_until, timeout, Instant};
use tracing::{debug, info, warn};

use crate::carrier::Carrier;
use crate::metrics;
use crate::provider::ProviderError;

use super::{CarrierBackoff, QueueConfig, QueueError, QueueStatus};

type TaskFn<T> = Box<dyn FnOnce() -> BoxFuture<'static, Result<T, ProviderError>> + Send>;

/// A unit of work waiting for its turn.
struct QueuedTask<T> {
    carrier: Carrier,
    execute: TaskFn<T>,
    reply: oneshot::Sender<Result<T, QueueError>>,
}

#[derive(Default)]
struct QueueStats {
    pending: AtomicU64,
    processed: AtomicU64,
    failed: AtomicU64,
    timed_out: AtomicU64,
}

/// FIFO queue that runs one task at a time with per-carrier pacing.
///
/// Every enqueued task settles exactly once: with its value, its error, a
/// timeout, or an abort. A failing task never stops the worker.
pub struct RateLimitedQueue<T> {
    tx: mpsc::UnboundedSender<QueuedTask<T>>,
    backoff: Arc<Mutex<CarrierBackoff>>,
    stats: Arc<QueueStats>,
}

fn lock(backoff: &Mutex<CarrierBackoff>) -> MutexGuard<'_, CarrierBackoff> {
    backoff.lock().unwrap_or_else(PoisonError::into_inner)
}

impl<T: Send + 'static> RateLimitedQueue<T> {
    /// Create the queue and spawn its worker. Must be called inside a Tokio runtime.
    ///
    /// The worker exits once every handle to the queue is dropped and the
    /// remaining tasks are drained.
    pub fn new(config: QueueConfig) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let backoff = Arc::new(Mutex::new(CarrierBackoff::new(config.clone())));
        let stats = Arc::new(QueueStats::default());

        tokio::spawn(Self::run_worker(
            rx,
            config,
            Arc::clone(&backoff),
            Arc::clone(&stats),
        ));

        Self { tx, backoff, stats }
    }

    /// Append a task and wait for it to settle.
    ///
    /// The caller is suspended until the task's turn comes, any backoff wait
    /// for `carrier` elapses, and the task completes or times out.
    pub async fn enqueue<F, Fut>(&self, carrier: Carrier, execute: F) -> Result<T, QueueError>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, ProviderError>> + Send + 'static,
    {
        let (reply, rx) = oneshot::channel();
        let task = QueuedTask {
            carrier,
            execute: Box::new(move || execute().boxed()),
            reply,
        };

        self.stats.pending.fetch_add(1, Ordering::Relaxed);
        metrics::QUEUE_PENDING.inc();
        if self.tx.send(task).is_err() {
            self.stats.pending.fetch_sub(1, Ordering::Relaxed);
            metrics::QUEUE_PENDING.dec();
            return Err(QueueError::Closed);
        }

        rx.await.map_err(|_| QueueError::Closed)?
    }

    /// Current counters and per-carrier pacing.
    pub fn status(&self) -> QueueStatus {
        let carriers = lock(&self.backoff).status(Instant::now());
        QueueStatus {
            pending: self.stats.pending.load(Ordering::Relaxed),
            total_processed: self.stats.processed.load(Ordering::Relaxed),
            total_failed: self.stats.failed.load(Ordering::Relaxed),
            total_timed_out: self.stats.timed_out.load(Ordering::Relaxed),
            carriers,
        }
    }

    /// Consecutive failures currently recorded for `carrier`.
    pub fn failures(&self, carrier: Carrier) -> u32 {
        lock(&self.backoff).failures(carrier)
    }

    async fn run_worker(
        mut rx: mpsc::UnboundedReceiver<QueuedTask<T>>,
        config: QueueConfig,
        backoff: Arc<Mutex<CarrierBackoff>>,
        stats: Arc<QueueStats>,
    ) {
        debug!("Check queue worker started");
        let mut last_finished: Option<Instant> = None;

        while let Some(task) = rx.recv().await {
            if let Some(finished) = last_finished {
                sleep_until(finished + config.inter_task_gap()).await;
            }

            let carrier = task.carrier;
            let wait = lock(&backoff).wait_time(carrier, Instant::now());
            if !wait.is_zero() {
                info!(
                    carrier = %carrier,
                    failures = lock(&backoff).failures(carrier),
                    "Rate limited for {}, waiting {}s",
                    carrier,
                    wait.as_secs()
                );
                metrics::QUEUE_WAIT_SECONDS
                    .with_label_values(&[carrier.as_str()])
                    .observe(wait.as_secs_f64());
                sleep(wait).await;
            }

            let started = Instant::now();
            lock(&backoff).record_check(carrier, started);

            let outcome = Self::execute(task.execute, carrier, &config).await;
            metrics::CHECK_DURATION_SECONDS
                .with_label_values(&[carrier.as_str()])
                .observe(started.elapsed().as_secs_f64());

            let result_label = match &outcome {
                Ok(_) => {
                    lock(&backoff).record_success(carrier);
                    stats.processed.fetch_add(1, Ordering::Relaxed);
                    "success"
                }
                Err(e) => {
                    let failures = {
                        let mut backoff = lock(&backoff);
                        backoff.record_failure(carrier);
                        backoff.failures(carrier)
                    };
                    stats.failed.fetch_add(1, Ordering::Relaxed);
                    warn!(carrier = %carrier, failures, "Check failed: {}", e);
                    if matches!(e, QueueError::TimedOut { .. }) {
                        stats.timed_out.fetch_add(1, Ordering::Relaxed);
                        "timeout"
                    } else {
                        "failure"
                    }
                }
            };
            metrics::QUEUE_TASKS_TOTAL
                .with_label_values(&[carrier.as_str(), result_label])
                .inc();

            stats.pending.fetch_sub(1, Ordering::Relaxed);
            metrics::QUEUE_PENDING.dec();
            if task.reply.send(outcome).is_err() {
                debug!(carrier = %carrier, "Task caller went away before the result arrived");
            }
            last_finished = Some(Instant::now());
        }

        debug!("Check queue worker stopped");
    }

    /// Run one task under the deadline.
    ///
    /// The task runs on its own Tokio task so that on timeout it is abandoned,
    /// not cancelled: it may still finish in the background, its result unused.
    async fn execute(
        execute: TaskFn<T>,
        carrier: Carrier,
        config: &QueueConfig,
    ) -> Result<T, QueueError> {
        let handle = tokio::spawn(execute());
        match timeout(config.task_timeout(), handle).await {
            Ok(Ok(result)) => result.map_err(QueueError::Task),
            Ok(Err(join_error)) => Err(QueueError::Aborted {
                carrier,
                reason: join_error.to_string(),
            }),
            Err(_) => Err(QueueError::TimedOut {
                carrier,
                timeout: config.task_timeout(),
            }),
        }
    }
}
