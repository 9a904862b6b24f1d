//! Bounded worker pool for detached analyses.
//!
//! Callers that don't want to wait on a full pipeline run (webhook
//! handlers, sibling channels enriching a single tool name) submit
//! jobs here instead. Submission is `try_send` against a bounded
//! queue, so producers fail fast instead of piling up work. Failed
//! runs surface on the pool's own error channel; progress still flows
//! through the engine's event bus like any foreground run.

use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;

use crate::bus::{PipelineBus, PipelineEvent};
use crate::engine::{research_url_for, ScoutEngine, ENGINE};
use crate::error::{DiscoveryError, Result};

/// Default number of pool workers.
pub const DEFAULT_WORKERS: usize = 2;

/// Default job queue capacity.
pub const DEFAULT_QUEUE_CAPACITY: usize = 32;

/// A unit of detached work.
#[derive(Debug, Clone)]
pub enum Job {
    /// Run the full pipeline on a URL.
    AnalyzeUrl(String),

    /// Run the pipeline on already-fetched text (scrape skipped).
    AnalyzeText { origin: String, text: String },
}

impl Job {
    /// Label used in events and error reports.
    fn source(&self) -> &str {
        match self {
            Self::AnalyzeUrl(url) => url,
            Self::AnalyzeText { origin, .. } => origin,
        }
    }
}

/// A detached job whose report came back with a top-level error.
#[derive(Debug, Clone)]
pub struct PoolError {
    /// URL or origin label of the failed job
    pub source: String,

    /// The report's error message
    pub message: String,
}

/// Fixed-size pool of workers draining a shared job queue.
///
/// Workers share nothing with submitters beyond the queue and the
/// engine's event bus. [`ScoutPool::shutdown`] closes the queue and
/// waits for in-flight jobs to finish.
pub struct ScoutPool {
    sender: mpsc::Sender<Job>,
    workers: Vec<JoinHandle<()>>,
}

impl ScoutPool {
    /// Spawn `workers` workers over a queue of `queue_capacity` jobs.
    ///
    /// Returns the pool handle and the receiving end of the error
    /// channel. Both counts are clamped to at least 1.
    pub fn new(
        engine: Arc<ScoutEngine>,
        workers: usize,
        queue_capacity: usize,
    ) -> (Self, mpsc::Receiver<PoolError>) {
        let (job_tx, job_rx) = mpsc::channel::<Job>(queue_capacity.max(1));
        let (error_tx, error_rx) = mpsc::channel::<PoolError>(queue_capacity.max(1));
        let job_rx = Arc::new(Mutex::new(job_rx));
        let bus = engine.bus();

        let handles = (0..workers.max(1))
            .map(|id| {
                let engine = engine.clone();
                let jobs = job_rx.clone();
                let errors = error_tx.clone();
                let bus = bus.clone();
                tokio::spawn(worker_loop(id, engine, jobs, errors, bus))
            })
            .collect();

        (
            Self {
                sender: job_tx,
                workers: handles,
            },
            error_rx,
        )
    }

    /// Queue a URL analysis.
    pub fn submit_url(&self, url: impl Into<String>) -> Result<()> {
        self.submit(Job::AnalyzeUrl(url.into()))
    }

    /// Queue a text analysis (scrape skipped).
    pub fn submit_text(&self, origin: impl Into<String>, text: impl Into<String>) -> Result<()> {
        self.submit(Job::AnalyzeText {
            origin: origin.into(),
            text: text.into(),
        })
    }

    /// Queue a deep-dive on a bare tool name.
    ///
    /// The name is wrapped in a search-results URL so the regular
    /// scrape stage has something to fetch.
    pub fn submit_enrichment(&self, tool_name: &str) -> Result<()> {
        self.submit_url(research_url_for(tool_name))
    }

    /// Queue a job, failing fast when the queue is full or closed.
    pub fn submit(&self, job: Job) -> Result<()> {
        self.sender.try_send(job).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => DiscoveryError::PoolSaturated,
            mpsc::error::TrySendError::Closed(_) => DiscoveryError::PoolClosed,
        })
    }

    /// Close the queue and wait for queued and in-flight jobs to finish.
    pub async fn shutdown(self) {
        drop(self.sender);
        for handle in self.workers {
            if let Err(e) = handle.await {
                tracing::warn!(error = %e, "pool worker panicked");
            }
        }
        tracing::debug!("pool shut down");
    }
}

async fn worker_loop(
    id: usize,
    engine: Arc<ScoutEngine>,
    jobs: Arc<Mutex<mpsc::Receiver<Job>>>,
    errors: mpsc::Sender<PoolError>,
    bus: Option<PipelineBus>,
) {
    tracing::debug!(worker = id, "pool worker started");

    loop {
        // Hold the receiver lock only while waiting for a job, never
        // while running one.
        let job = { jobs.lock().await.recv().await };
        let Some(job) = job else {
            break;
        };

        if let Some(bus) = &bus {
            bus.publish(PipelineEvent::agent(
                ENGINE,
                "worker",
                format!("Worker {id} analyzing {}", job.source()),
            ));
        }

        let source = job.source().to_string();
        let report = match job {
            Job::AnalyzeUrl(url) => engine.analyze(&url).await,
            Job::AnalyzeText { origin, text } => engine.analyze_text(&origin, &text).await,
        };

        if let Some(message) = report.error {
            tracing::warn!(source = %source, error = %message, "detached job failed");
            if errors.try_send(PoolError { source, message }).is_err() {
                tracing::debug!("error channel full or closed, dropping failure report");
            }
        }
    }

    tracing::debug!(worker = id, "pool worker stopped");
}
