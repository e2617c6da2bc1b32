//! Runs a batch: jobs one after another, progress through a watch channel, one archive at the end.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Local, Utc};
use parking_lot::RwLock;
use thiserror::Error;
use tokio::sync::{mpsc, watch};
use uuid::Uuid;

use super::archive::PackagedArchive;
use super::job::{DocumentJob, JobId};
use super::machine::{BatchEvent, BatchMachine, BatchStatus, JobSummary};
use super::progress::SyntheticCurve;
use crate::documents::naming::{archive_file_name, document_file_name};
use crate::documents::{DocumentKind, DocumentRequest, GeneratedDocument, OutputFormat, Render, RenderError};
use crate::history::{HistorySender, ReportSnapshot};
use crate::layout::FontSet;
use crate::metrics;
use crate::word_renderer::{TransportError, WordRenderer};

const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(400);

/// Why a single job produced nothing. Never aborts the batch.
#[derive(Debug, Error)]
pub enum JobError {
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("render task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

#[derive(Clone)]
pub struct Orchestrator {
    fonts: Arc<FontSet>,
    word: Arc<dyn WordRenderer>,
    history: HistorySender,
    reset_delay: Duration,
    tick_interval: Duration,
}

impl Orchestrator {
    pub fn new(fonts: Arc<FontSet>, word: Arc<dyn WordRenderer>, history: HistorySender, reset_delay: Duration) -> Self {
        Self {
            fonts,
            word,
            history,
            reset_delay,
            tick_interval: DEFAULT_TICK_INTERVAL,
        }
    }

    pub fn with_tick_interval(mut self, tick_interval: Duration) -> Self {
        self.tick_interval = tick_interval;
        self
    }

    pub fn fonts(&self) -> &FontSet {
        &self.fonts
    }

    /// Start a batch over already validated jobs and return its handle immediately.
    pub fn launch(&self, kind: DocumentKind, jobs: Vec<DocumentJob>) -> Arc<BatchHandle> {
        let id = Uuid::new_v4();
        let summaries = jobs
            .iter()
            .map(|job| JobSummary::pending(job, job.request.title()))
            .collect();

        let mut machine = BatchMachine::new(id);
        if let Err(e) = machine.apply(BatchEvent::Started { jobs: summaries }) {
            log::error!("Batch {} could not start: {}", id, e);
        }
        let (status_tx, status_rx) = watch::channel(machine.status());
        let handle = Arc::new(BatchHandle {
            id,
            kind,
            created_at: Utc::now(),
            status: status_rx,
            archive: RwLock::new(None),
        });

        log::info!("Batch {} started: {} job(s) of {}", id, jobs.len(), kind.slug());

        let (events_tx, events_rx) = mpsc::unbounded_channel();
        tokio::spawn(drive(machine, events_rx, status_tx, Arc::clone(&handle), self.reset_delay));
        tokio::spawn(self.clone().run_jobs(kind, jobs, events_tx));
        handle
    }

    async fn run_jobs(self, kind: DocumentKind, jobs: Vec<DocumentJob>, events: mpsc::UnboundedSender<BatchEvent>) {
        let ticker = (jobs.len() == 1).then(|| tokio::spawn(synthetic_ticker(events.clone(), self.tick_interval)));

        for job in jobs {
            let result = self.run_job(kind, &job).await;
            if let Some(ticker) = &ticker {
                ticker.abort();
            }
            self.report(kind, &job, &result);

            let result = result.map_err(|e| e.to_string());
            if events.send(BatchEvent::JobFinished { job: job.id, result }).is_err() {
                log::error!("Batch event loop stopped before job {} was reported", job.id.0);
                return;
            }
        }
    }

    /// Render a single request outside any batch, with the same logging, metrics and history.
    pub async fn render_single(
        &self,
        request: DocumentRequest,
        format: OutputFormat,
    ) -> Result<Vec<GeneratedDocument>, JobError> {
        let kind = request.kind();
        let job = DocumentJob {
            id: JobId(0),
            entity_id: request.company().id.clone(),
            format,
            request: Arc::new(request),
        };
        let result = self.run_job(kind, &job).await;
        self.report(kind, &job, &result);
        result
    }

    fn report(&self, kind: DocumentKind, job: &DocumentJob, result: &Result<Vec<GeneratedDocument>, JobError>) {
        match result {
            Ok(documents) => {
                log::info!(
                    "Job {} ({}, {}) produced {} file(s)",
                    job.id.0,
                    job.entity_id,
                    job.format.as_str(),
                    documents.len()
                );
                metrics::record_rendered(job.format, documents.len());
                self.history.record(ReportSnapshot {
                    document_type: kind.label().to_string(),
                    title: job.request.title(),
                    data: job.request.data(),
                });
            }
            Err(e) => {
                log::warn!("Job {} ({}, {}) failed: {}", job.id.0, job.entity_id, job.format.as_str(), e);
                metrics::record_failed(job.format);
            }
        }
    }

    /// Render one job in its format.
    pub async fn run_job(&self, kind: DocumentKind, job: &DocumentJob) -> Result<Vec<GeneratedDocument>, JobError> {
        match job.format {
            OutputFormat::Pdf => {
                let fonts = Arc::clone(&self.fonts);
                let request = Arc::clone(&job.request);
                let documents = tokio::task::spawn_blocking(move || request.render(&fonts)).await??;
                Ok(documents)
            }
            OutputFormat::Word => {
                let bytes = self.word.render(kind, &job.request.data()).await?;
                Ok(vec![GeneratedDocument {
                    filename: document_file_name(&job.request.company().name, kind, OutputFormat::Word),
                    bytes,
                    format: OutputFormat::Word,
                }])
            }
        }
    }
}

async fn synthetic_ticker(events: mpsc::UnboundedSender<BatchEvent>, interval: Duration) {
    let mut curve = SyntheticCurve::new();
    let mut timer = tokio::time::interval(interval);
    timer.tick().await;
    loop {
        timer.tick().await;
        if events.send(BatchEvent::Tick { percent: curve.tick() }).is_err() {
            return;
        }
    }
}

/// Sole owner of the machine: applies events in arrival order and publishes each new status.
async fn drive(
    mut machine: BatchMachine,
    mut events: mpsc::UnboundedReceiver<BatchEvent>,
    status: watch::Sender<BatchStatus>,
    handle: Arc<BatchHandle>,
    reset_delay: Duration,
) {
    let id = handle.id;
    loop {
        if machine.ready_to_package() {
            let manifest = machine.take_manifest();
            let name = archive_file_name(Local::now().date_naive());
            let result = match tokio::task::spawn_blocking(move || manifest.package(name)).await {
                Ok(Ok(archive)) => Ok(archive),
                Ok(Err(e)) => Err(e.to_string()),
                Err(e) => Err(format!("packaging task failed: {}", e)),
            };
            if let Err(e) = &result {
                log::error!("Batch {} archive failed: {}", id, e);
            }
            if let Err(e) = machine.apply(BatchEvent::Packaged { result }) {
                log::error!("Batch {}: {}", id, e);
            }
            *handle.archive.write() = machine.archive();
            let snapshot = machine.status();
            log::info!(
                "Batch {} finished as {:?}: {} file(s), {} failed job(s)",
                id,
                snapshot.state,
                snapshot.files.len(),
                snapshot.failed_jobs()
            );
            status.send_replace(snapshot);
            break;
        }

        let Some(event) = events.recv().await else {
            log::error!("Batch {} lost its job runner before finishing", id);
            return;
        };
        if let Err(e) = machine.apply(event) {
            log::error!("Batch {}: {}", id, e);
            continue;
        }
        log::debug!("Batch {} at {}%", id, machine.progress().percent);
        status.send_replace(machine.status());
    }

    tokio::time::sleep(reset_delay).await;
    if let Err(e) = machine.apply(BatchEvent::Reset) {
        log::error!("Batch {}: {}", id, e);
    }
    status.send_replace(machine.status());
}

/// Read side of a running or finished batch.
pub struct BatchHandle {
    pub id: Uuid,
    pub kind: DocumentKind,
    pub created_at: DateTime<Utc>,
    status: watch::Receiver<BatchStatus>,
    archive: RwLock<Option<Arc<PackagedArchive>>>,
}

impl BatchHandle {
    pub fn status(&self) -> BatchStatus {
        self.status.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<BatchStatus> {
        self.status.clone()
    }

    pub fn archive(&self) -> Option<Arc<PackagedArchive>> {
        self.archive.read().clone()
    }

    /// Resolve once the batch has reached a terminal state.
    pub async fn wait(&self) -> BatchStatus {
        let mut receiver = self.subscribe();
        let status = match receiver.wait_for(|s| s.finished).await {
            Ok(status) => status.clone(),
            Err(_) => self.status(),
        };
        status
    }
}
