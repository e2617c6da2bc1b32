//! Batch lifecycle as an explicit state machine.
//!
//! ```text
//! Idle --Started--> Running --Packaged--> Completed | PartiallyCompleted --Reset--> Idle
//! ```
//!
//! Jobs live in an arena indexed by [`JobId`]; every [`BatchEvent::JobFinished`] resolves one
//! slot, counts one progress unit and feeds the manifest in the same step.

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;
use uuid::Uuid;

use super::archive::{ArchiveManifest, PackagedArchive};
use super::job::{DocumentJob, JobId};
use super::progress::BatchProgress;
use crate::documents::{GeneratedDocument, OutputFormat};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum BatchState {
    Idle,
    Running,
    Completed,
    PartiallyCompleted,
}

impl BatchState {
    pub fn is_terminal(self) -> bool {
        matches!(self, BatchState::Completed | BatchState::PartiallyCompleted)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum JobOutcome {
    Pending,
    /// Names the job's files got in the archive.
    Success { files: Vec<String> },
    Failed { reason: String },
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct JobSummary {
    #[schema(value_type = usize)]
    pub job: JobId,
    pub entity_id: String,
    pub title: String,
    pub format: OutputFormat,
    pub outcome: JobOutcome,
}

impl JobSummary {
    pub fn pending(job: &DocumentJob, title: String) -> Self {
        Self {
            job: job.id,
            entity_id: job.entity_id.clone(),
            title,
            format: job.format,
            outcome: JobOutcome::Pending,
        }
    }
}

#[derive(Debug)]
pub enum BatchEvent {
    Started { jobs: Vec<JobSummary> },
    JobFinished {
        job: JobId,
        result: Result<Vec<GeneratedDocument>, String>,
    },
    /// Synthetic progress for a lone job still in flight.
    Tick { percent: u8 },
    Packaged { result: Result<PackagedArchive, String> },
    Reset,
}

impl BatchEvent {
    fn name(&self) -> &'static str {
        match self {
            BatchEvent::Started { .. } => "started",
            BatchEvent::JobFinished { .. } => "job_finished",
            BatchEvent::Tick { .. } => "tick",
            BatchEvent::Packaged { .. } => "packaged",
            BatchEvent::Reset => "reset",
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum TransitionError {
    #[error("event '{event}' is not allowed while {state:?}")]
    Invalid { event: &'static str, state: BatchState },
    #[error("unknown job {0:?}")]
    UnknownJob(JobId),
    #[error("job {0:?} already resolved")]
    AlreadyResolved(JobId),
    #[error("{0} job(s) still pending")]
    JobsPending(usize),
}

/// Snapshot published to status readers.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BatchStatus {
    pub batch_id: Uuid,
    pub state: BatchState,
    pub progress: BatchProgress,
    pub jobs: Vec<JobSummary>,
    /// Files in the packaged archive.
    pub files: Vec<String>,
    pub error: Option<String>,
    /// Share of resolved jobs, `round(completed / total × 100)`.
    pub unit_percent: u8,
    /// Set once the run reached a terminal state; survives the reset to idle.
    pub finished: bool,
}

impl BatchStatus {
    pub fn failed_jobs(&self) -> usize {
        self.jobs
            .iter()
            .filter(|j| matches!(j.outcome, JobOutcome::Failed { .. }))
            .count()
    }
}

pub struct BatchMachine {
    id: Uuid,
    state: BatchState,
    progress: BatchProgress,
    jobs: Vec<JobSummary>,
    manifest: ArchiveManifest,
    archive: Option<Arc<PackagedArchive>>,
    error: Option<String>,
    finished: bool,
}

impl BatchMachine {
    pub fn new(id: Uuid) -> Self {
        Self {
            id,
            state: BatchState::Idle,
            progress: BatchProgress::idle(),
            jobs: Vec::new(),
            manifest: ArchiveManifest::new(),
            archive: None,
            error: None,
            finished: false,
        }
    }

    pub fn state(&self) -> BatchState {
        self.state
    }

    pub fn progress(&self) -> &BatchProgress {
        &self.progress
    }

    pub fn archive(&self) -> Option<Arc<PackagedArchive>> {
        self.archive.clone()
    }

    fn pending_jobs(&self) -> usize {
        self.jobs
            .iter()
            .filter(|j| j.outcome == JobOutcome::Pending)
            .count()
    }

    /// Every job is resolved and the manifest can be compressed.
    pub fn ready_to_package(&self) -> bool {
        self.state == BatchState::Running && self.pending_jobs() == 0
    }

    /// Hand the manifest to the packager, leaving an empty one behind.
    pub fn take_manifest(&mut self) -> ArchiveManifest {
        std::mem::take(&mut self.manifest)
    }

    pub fn apply(&mut self, event: BatchEvent) -> Result<(), TransitionError> {
        let name = event.name();
        match (self.state, event) {
            (BatchState::Idle, BatchEvent::Started { jobs }) => {
                self.progress = BatchProgress::start(jobs.len());
                self.jobs = jobs;
                self.manifest = ArchiveManifest::new();
                self.archive = None;
                self.error = None;
                self.finished = false;
                self.state = BatchState::Running;
                Ok(())
            }
            (BatchState::Running, BatchEvent::JobFinished { job, result }) => self.resolve(job, result),
            (BatchState::Running, BatchEvent::Tick { percent }) => {
                // only a lone unresolved job runs on the synthetic curve
                if self.jobs.len() == 1 && self.pending_jobs() == 1 {
                    self.progress.advance_to(percent);
                }
                Ok(())
            }
            (BatchState::Running, BatchEvent::Packaged { result }) => {
                let pending = self.pending_jobs();
                if pending > 0 {
                    return Err(TransitionError::JobsPending(pending));
                }
                let failed = self
                    .jobs
                    .iter()
                    .any(|j| matches!(j.outcome, JobOutcome::Failed { .. }));
                match result {
                    Ok(archive) => self.archive = Some(Arc::new(archive)),
                    Err(e) => self.error = Some(e),
                }
                self.progress.finish();
                self.finished = true;
                self.state = if failed || self.error.is_some() {
                    BatchState::PartiallyCompleted
                } else {
                    BatchState::Completed
                };
                Ok(())
            }
            (state, BatchEvent::Reset) if state.is_terminal() => {
                self.progress = BatchProgress::idle();
                self.state = BatchState::Idle;
                Ok(())
            }
            (BatchState::Idle, BatchEvent::Reset) => Ok(()),
            (state, _) => Err(TransitionError::Invalid { event: name, state }),
        }
    }

    fn resolve(&mut self, job: JobId, result: Result<Vec<GeneratedDocument>, String>) -> Result<(), TransitionError> {
        let slot = self.jobs.get_mut(job.0).ok_or(TransitionError::UnknownJob(job))?;
        if slot.outcome != JobOutcome::Pending {
            return Err(TransitionError::AlreadyResolved(job));
        }

        slot.outcome = match result {
            Ok(documents) => {
                let files = documents
                    .into_iter()
                    .map(|doc| self.manifest.insert(job, doc.filename, doc.bytes))
                    .collect();
                JobOutcome::Success { files }
            }
            Err(reason) => JobOutcome::Failed { reason },
        };
        self.progress.complete_unit();
        Ok(())
    }

    pub fn status(&self) -> BatchStatus {
        BatchStatus {
            batch_id: self.id,
            state: self.state,
            progress: self.progress.clone(),
            jobs: self.jobs.clone(),
            files: self
                .archive
                .as_ref()
                .map(|a| a.files.clone())
                .unwrap_or_default(),
            error: self.error.clone(),
            unit_percent: self.progress.unit_percent(),
            finished: self.finished,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::progress::Phase;

    fn summaries(n: usize) -> Vec<JobSummary> {
        (0..n)
            .map(|i| JobSummary {
                job: JobId(i),
                entity_id: format!("c-{}", i),
                title: format!("Firma {}", i),
                format: OutputFormat::Pdf,
                outcome: JobOutcome::Pending,
            })
            .collect()
    }

    fn document(name: &str) -> GeneratedDocument {
        GeneratedDocument {
            filename: name.into(),
            bytes: b"%PDF".to_vec(),
            format: OutputFormat::Pdf,
        }
    }

    fn package(machine: &mut BatchMachine) {
        let manifest = machine.take_manifest();
        let result = manifest.package("test.zip").map_err(|e| e.to_string());
        machine.apply(BatchEvent::Packaged { result }).unwrap();
    }

    #[test]
    fn test_full_run_completes() {
        let mut machine = BatchMachine::new(Uuid::new_v4());
        machine.apply(BatchEvent::Started { jobs: summaries(2) }).unwrap();
        assert_eq!(machine.state(), BatchState::Running);

        machine
            .apply(BatchEvent::JobFinished {
                job: JobId(0),
                result: Ok(vec![document("A Firma - Calisma Izni.pdf")]),
            })
            .unwrap();
        assert_eq!(machine.progress().percent, 45);
        assert!(!machine.ready_to_package());

        machine
            .apply(BatchEvent::JobFinished {
                job: JobId(1),
                result: Ok(vec![document("B Firma - Calisma Izni.pdf")]),
            })
            .unwrap();
        assert!(machine.ready_to_package());
        assert_eq!(machine.progress().phase, Phase::Finalizing);

        package(&mut machine);
        let status = machine.status();
        assert_eq!(status.state, BatchState::Completed);
        assert_eq!(status.progress.percent, 100);
        assert_eq!(status.files.len(), 2);
        assert!(status.finished);
    }

    #[test]
    fn test_failed_job_still_packages_successes() {
        let mut machine = BatchMachine::new(Uuid::new_v4());
        machine.apply(BatchEvent::Started { jobs: summaries(2) }).unwrap();
        machine
            .apply(BatchEvent::JobFinished {
                job: JobId(0),
                result: Err("renderer unavailable".into()),
            })
            .unwrap();
        let halfway = machine.status();
        assert_eq!(halfway.unit_percent, 50);
        assert_eq!(halfway.progress.percent, 45);

        machine
            .apply(BatchEvent::JobFinished {
                job: JobId(1),
                result: Ok(vec![document("x.pdf")]),
            })
            .unwrap();
        package(&mut machine);

        let status = machine.status();
        assert_eq!(status.state, BatchState::PartiallyCompleted);
        assert_eq!(status.progress.completed_units, 2);
        assert_eq!(status.files, vec!["x.pdf"]);
        assert_eq!(status.failed_jobs(), 1);
        assert_eq!(status.unit_percent, 100);
    }

    #[test]
    fn test_job_resolves_once() {
        let mut machine = BatchMachine::new(Uuid::new_v4());
        machine.apply(BatchEvent::Started { jobs: summaries(1) }).unwrap();
        let finish = || BatchEvent::JobFinished {
            job: JobId(0),
            result: Err("x".into()),
        };
        machine.apply(finish()).unwrap();
        assert_eq!(machine.apply(finish()), Err(TransitionError::AlreadyResolved(JobId(0))));
        assert_eq!(
            machine.apply(BatchEvent::JobFinished {
                job: JobId(7),
                result: Err("x".into()),
            }),
            Err(TransitionError::UnknownJob(JobId(7)))
        );
    }

    #[test]
    fn test_packaging_waits_for_every_job() {
        let mut machine = BatchMachine::new(Uuid::new_v4());
        machine.apply(BatchEvent::Started { jobs: summaries(3) }).unwrap();
        let result = machine.apply(BatchEvent::Packaged {
            result: Err("early".into()),
        });
        assert_eq!(result, Err(TransitionError::JobsPending(3)));
    }

    #[test]
    fn test_ticks_only_move_a_lone_job() {
        let mut machine = BatchMachine::new(Uuid::new_v4());
        machine.apply(BatchEvent::Started { jobs: summaries(1) }).unwrap();
        machine.apply(BatchEvent::Tick { percent: 40 }).unwrap();
        assert_eq!(machine.progress().percent, 40);
        machine.apply(BatchEvent::Tick { percent: 10 }).unwrap();
        assert_eq!(machine.progress().percent, 40);

        let mut multi = BatchMachine::new(Uuid::new_v4());
        multi.apply(BatchEvent::Started { jobs: summaries(2) }).unwrap();
        multi.apply(BatchEvent::Tick { percent: 40 }).unwrap();
        assert_eq!(multi.progress().percent, 0);
    }

    #[test]
    fn test_reset_returns_to_idle_and_keeps_results() {
        let mut machine = BatchMachine::new(Uuid::new_v4());
        assert!(machine.apply(BatchEvent::Reset).is_ok());
        machine.apply(BatchEvent::Started { jobs: summaries(1) }).unwrap();
        assert!(matches!(
            machine.apply(BatchEvent::Reset),
            Err(TransitionError::Invalid { state: BatchState::Running, .. })
        ));
        machine
            .apply(BatchEvent::JobFinished {
                job: JobId(0),
                result: Ok(vec![document("a.pdf")]),
            })
            .unwrap();
        package(&mut machine);
        machine.apply(BatchEvent::Reset).unwrap();

        let status = machine.status();
        assert_eq!(status.state, BatchState::Idle);
        assert_eq!(status.progress.percent, 0);
        assert!(status.finished);
        assert!(machine.archive().is_some());

        // a new run starts from zero again
        machine.apply(BatchEvent::Started { jobs: summaries(2) }).unwrap();
        assert_eq!(machine.progress().percent, 0);
        assert!(!machine.status().finished);
    }
}
