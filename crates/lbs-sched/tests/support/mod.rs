use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use lbs_remote::BuildExecutor;
use lbs_remote::BuildHandle;
use lbs_remote::BuildResult;
use lbs_remote::ExecutorError;
use lbs_remote::FetchError;
use lbs_remote::Forest;
use lbs_remote::JobSpec;
use lbs_remote::LocaleSource;
use lbs_remote::MetadataService;
use lbs_remote::Push;
use lbs_remote::Repository;
use lbs_remote::NULL_REVISION;
use tokio::sync::oneshot;

/// Build executor that records every submitted job.
///
/// In `auto` mode jobs complete successfully on submission; in
/// `manual` mode the test resolves them via [`complete_all`].
pub struct RecordingExecutor {
    auto_complete: bool,
    jobs: Mutex<Vec<JobSpec>>,
    completions: Mutex<Vec<oneshot::Sender<BuildResult>>>,
}

impl RecordingExecutor {
    pub fn auto() -> Self {
        Self::new(true)
    }

    pub fn manual() -> Self {
        Self::new(false)
    }

    fn new(auto_complete: bool) -> Self {
        Self {
            auto_complete,
            jobs: Mutex::new(Vec::new()),
            completions: Mutex::new(Vec::new()),
        }
    }

    pub fn jobs(&self) -> Vec<JobSpec> {
        self.jobs.lock().unwrap().clone()
    }

    pub fn jobs_for(&self, builder: &str) -> Vec<JobSpec> {
        self.jobs()
            .into_iter()
            .filter(|job| job.builders.iter().any(|b| b == builder))
            .collect()
    }

    pub fn complete_all(&self) {
        for tx in self.completions.lock().unwrap().drain(..) {
            let _ = tx.send(BuildResult::Success);
        }
    }
}

impl BuildExecutor for RecordingExecutor {
    fn submit(&self, job: JobSpec) -> Result<BuildHandle, ExecutorError> {
        self.jobs.lock().unwrap().push(job);
        let (tx, handle) = BuildHandle::pair();
        if self.auto_complete {
            let _ = tx.send(BuildResult::Success);
        } else {
            self.completions.lock().unwrap().push(tx);
        }
        Ok(handle)
    }
}

/// In-memory metadata store.
#[derive(Default)]
pub struct StoreMetadata {
    forests: Mutex<HashMap<String, Forest>>,
    binds: Mutex<HashMap<String, String>>,
    bind_calls: Mutex<usize>,
    repos: Mutex<HashMap<String, Repository>>,
    pushes: Mutex<HashMap<String, Vec<Push>>>,
}

impl StoreMetadata {
    pub fn add_forest(&self, name: &str, relative_path: &str) {
        self.forests.lock().unwrap().insert(
            name.to_string(),
            Forest {
                name: name.to_string(),
                relative_path: relative_path.to_string(),
            },
        );
    }

    pub fn add_repo(&self, name: &str, relative_path: &str) {
        self.repos.lock().unwrap().insert(
            name.to_string(),
            Repository {
                name: name.to_string(),
                relative_path: relative_path.to_string(),
            },
        );
    }

    pub fn add_push(&self, repo: &str, date: Option<i64>, revision: &str) {
        self.pushes
            .lock()
            .unwrap()
            .entry(repo.to_string())
            .or_default()
            .push(Push {
                date,
                revision: revision.to_string(),
            });
    }

    pub fn bind_calls(&self) -> usize {
        *self.bind_calls.lock().unwrap()
    }
}

impl MetadataService for StoreMetadata {
    fn ensure_forest(&self, name: &str) -> (Forest, bool) {
        let mut forests = self.forests.lock().unwrap();
        if let Some(forest) = forests.get(name) {
            (forest.clone(), false)
        } else {
            let forest = Forest {
                name: name.to_string(),
                relative_path: name.to_string(),
            };
            forests.insert(name.to_string(), forest.clone());
            (forest, true)
        }
    }

    fn tree_forest(&self, code: &str) -> Option<String> {
        self.binds.lock().unwrap().get(code).cloned()
    }

    fn bind_tree(&self, code: &str, forest: &str) {
        self.binds
            .lock()
            .unwrap()
            .insert(code.to_string(), forest.to_string());
        *self.bind_calls.lock().unwrap() += 1;
    }

    fn repository(&self, name: &str) -> Option<Repository> {
        self.repos.lock().unwrap().get(name).cloned()
    }

    fn latest_push(&self, repo: &Repository, before: Option<i64>) -> Option<Push> {
        self.pushes
            .lock()
            .unwrap()
            .get(&repo.name)?
            .iter()
            .filter(|push| match (before, push.date) {
                (Some(bound), Some(date)) => date <= bound,
                _ => true,
            })
            .last()
            .cloned()
    }

    fn latest_changeset(&self, _repo: &Repository) -> String {
        NULL_REVISION.to_string()
    }

    fn forest(&self, name: &str) -> Option<Forest> {
        self.forests.lock().unwrap().get(name).cloned()
    }
}

/// Locale source serving one canned body, recording requested URLs.
#[derive(Default)]
pub struct CannedLocales {
    body: Mutex<Option<String>>,
    requests: Mutex<Vec<String>>,
}

impl CannedLocales {
    pub fn set_body(&self, body: &str) {
        *self.body.lock().unwrap() = Some(body.to_string());
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl LocaleSource for CannedLocales {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        self.requests.lock().unwrap().push(url.to_string());
        self.body
            .lock()
            .unwrap()
            .clone()
            .ok_or(FetchError::Status(404))
    }
}
