//! Bounded worker pool driving one probing stage.
//!
//! A fixed number of workers pull tasks from a shared queue until it is
//! drained. Each task runs to completion independently: a failing task only
//! affects its own output, and a worker that dies is logged while the rest
//! of the pool keeps draining the queue. [`run_pool`] returns only once every
//! submitted task has been handled, which is the join point between stages.

use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::{Mutex as AsyncMutex, mpsc};
use tokio::task::JoinSet;
use tracing::error;

/// Completions between two progress reports.
pub const REPORT_EVERY: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Latency,
    Location,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Latency => f.write_str("latency"),
            Stage::Location => f.write_str("location"),
        }
    }
}

/// Receives progress of the probing stages.
pub trait ProgressSink: Send + Sync {
    fn stage_started(&self, stage: Stage, total: usize);
    /// `done` never decreases within a stage and never exceeds `total`.
    fn advanced(&self, stage: Stage, done: usize, total: usize);
    fn stage_finished(&self, stage: Stage);
}

/// Discards all progress.
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn stage_started(&self, _stage: Stage, _total: usize) {}
    fn advanced(&self, _stage: Stage, _done: usize, _total: usize) {}
    fn stage_finished(&self, _stage: Stage) {}
}

/// Counts completions of one stage and forwards throttled, monotonic reports.
pub struct ProgressTracker {
    stage: Stage,
    total: usize,
    completed: AtomicUsize,
    last_reported: Mutex<usize>,
    sink: Arc<dyn ProgressSink>,
}

impl ProgressTracker {
    pub fn new(stage: Stage, total: usize, sink: Arc<dyn ProgressSink>) -> Self {
        sink.stage_started(stage, total);
        Self {
            stage,
            total,
            completed: AtomicUsize::new(0),
            last_reported: Mutex::new(0),
            sink,
        }
    }

    pub fn complete_one(&self) {
        let current = (self.completed.fetch_add(1, Ordering::SeqCst) + 1).min(self.total);
        if current % REPORT_EVERY != 0 && current != self.total {
            return;
        }

        let mut last = self
            .last_reported
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if current > *last {
            *last = current;
            self.sink.advanced(self.stage, current, self.total);
        }
    }

    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }

    pub fn finish(&self) {
        self.sink.stage_finished(self.stage);
    }
}

/// Runs `handler` over `tasks` with `workers` concurrent workers.
///
/// Every task runs as its own tokio task, so a panicking handler loses only
/// its own output. Outputs are returned in task submission order regardless
/// of completion order.
pub async fn run_pool<T, O, F, Fut>(
    tasks: Vec<T>,
    workers: usize,
    tracker: Arc<ProgressTracker>,
    handler: F,
) -> Vec<O>
where
    T: Send + 'static,
    O: Send + 'static,
    F: Fn(T) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = O> + Send + 'static,
{
    let workers = workers.max(1);
    let (tx, rx) = mpsc::channel::<(usize, T)>(workers * 2);
    let (done_tx, mut done_rx) = mpsc::unbounded_channel::<(usize, O)>();
    let rx = Arc::new(AsyncMutex::new(rx));
    let handler = Arc::new(handler);

    let mut pool: JoinSet<()> = JoinSet::new();
    for _ in 0..workers {
        let rx = rx.clone();
        let done_tx = done_tx.clone();
        let handler = handler.clone();
        let tracker = tracker.clone();

        pool.spawn(async move {
            loop {
                let next = rx.lock().await.recv().await;
                let Some((idx, task)) = next else { break };

                match tokio::spawn(handler(task)).await {
                    Ok(output) => {
                        let _ = done_tx.send((idx, output));
                    }
                    Err(e) => error!("Probe task #{idx} failed: {e}"),
                }
                tracker.complete_one();
            }
        });
    }
    // Only workers hold the queue and result ends from here on.
    drop(rx);
    drop(done_tx);

    for (idx, task) in tasks.into_iter().enumerate() {
        if tx.send((idx, task)).await.is_err() {
            error!("All probe workers exited before the queue was drained");
            break;
        }
    }
    drop(tx);

    while let Some(joined) = pool.join_next().await {
        if let Err(e) = joined {
            error!("Probe worker aborted: {e}");
        }
    }

    let mut outputs: Vec<(usize, O)> = Vec::new();
    while let Some(done) = done_rx.recv().await {
        outputs.push(done);
    }

    outputs.sort_by_key(|(idx, _)| *idx);
    outputs.into_iter().map(|(_, output)| output).collect()
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
