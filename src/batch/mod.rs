//! Bulk generation: many companies, one or two formats, one archive.

pub mod archive;
pub mod handlers;
pub mod job;
pub mod machine;
pub mod orchestrator;
pub mod progress;

pub use archive::{ArchiveError, ArchiveManifest, PackagedArchive};
pub use job::{BatchRequest, DocumentJob, DocumentNumbering, FormatSelection, JobId};
pub use machine::{BatchEvent, BatchMachine, BatchState, BatchStatus, JobOutcome, JobSummary};
pub use orchestrator::{BatchHandle, JobError, Orchestrator};
pub use progress::{BatchProgress, Phase};

use thiserror::Error;

/// Problems with the batch input itself. The batch never starts.
#[derive(Debug, Error)]
pub enum BatchError {
    #[error("{0}")]
    Validation(String),
}
