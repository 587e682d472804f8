use std::collections::BTreeMap;

use lbs_model::Change;
use thiserror::Error;
use tokio::sync::oneshot;

#[derive(Error, Debug)]
pub enum ExecutorError {
    #[error("build executor rejected job: {0}")]
    Rejected(String),
}

/// Outcome reported by the build executor for one job.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum BuildResult {
    Success,
    Failed,
}

/// One batched job submission: builder names, the originating change
/// set (possibly empty), and a property mapping.
#[derive(Clone, Debug, PartialEq)]
pub struct JobSpec {
    pub builders: Vec<String>,
    pub branch: Option<String>,
    pub changes: Vec<Change>,
    pub properties: BTreeMap<String, serde_json::Value>,
}

impl JobSpec {
    #[must_use]
    pub fn new(builders: Vec<String>) -> Self {
        Self {
            builders,
            branch: None,
            changes: Vec::new(),
            properties: BTreeMap::new(),
        }
    }

    pub fn set_property(&mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) {
        self.properties.insert(key.into(), value.into());
    }
}

/// Completion handle for a submitted job.
///
/// The executor keeps the sending half and resolves it when the job
/// finishes; a dropped sender counts as a failure.
#[derive(Debug)]
pub struct BuildHandle {
    rx: oneshot::Receiver<BuildResult>,
}

impl BuildHandle {
    /// Create a handle together with the sender the executor resolves.
    #[must_use]
    pub fn pair() -> (oneshot::Sender<BuildResult>, Self) {
        let (tx, rx) = oneshot::channel();
        (tx, Self { rx })
    }

    /// Wait until the job completes.
    pub async fn completion(self) -> BuildResult {
        self.rx.await.unwrap_or(BuildResult::Failed)
    }
}

/// The external build executor.
///
/// Submission is synchronous; completion is observed through the
/// returned [`BuildHandle`].
pub trait BuildExecutor: Send + Sync {
    fn submit(&self, job: JobSpec) -> Result<BuildHandle, ExecutorError>;
}
