use lbs_model::Change;
use lbs_model::Locale;
use lbs_model::Tree;
use lbs_remote::ExecutorError;
use lbs_remote::JobSpec;
use lbs_remote::MetadataService;
use thiserror::Error;
use tracing::warn;

#[derive(Error, Debug)]
pub enum SubmitError {
    #[error("tree {0} is not registered")]
    UnknownTree(String),
    #[error("tree {tree}: en branch {branch} has no repository in the metadata store")]
    EnBranchUnresolved { tree: String, branch: String },
    #[error("no forest named {0}")]
    UnknownForest(String),
    #[error("tree {0} has no l10n.ini registered for its en branch")]
    MissingIniPath(String),
    #[error(transparent)]
    Executor(#[from] ExecutorError),
}

/// Resolve per-branch revisions for one pending (tree, locale) entry
/// and assemble the compare-build job.
///
/// A branch whose repository is unknown to the metadata store is
/// logged and dropped from the job's revision set; the job is still
/// assembled with partial revision info. A missing en-branch
/// resolution or missing forest fails this key only.
pub fn build_compare_job(
    builders: &[String],
    tree: &Tree,
    locale: &Locale,
    changes: Vec<Change>,
    metadata: &dyn MetadataService,
) -> Result<JobSpec, SubmitError> {
    let mut when = changes.iter().filter_map(|c| c.when).max();
    let mut job = JobSpec::new(builders.to_vec());
    let mut revisions: Vec<&str> = Vec::new();
    let mut en_relative_path = None;

    for (key, branch) in tree.branches.iter() {
        let repo_name = if key == "l10n" {
            format!("{branch}/{locale}")
        } else {
            branch.to_string()
        };
        let Some(repo) = metadata.repository(&repo_name) else {
            warn!(repository = %repo_name, "repository does not exist, skipping");
            continue;
        };

        let revision = match metadata.latest_push(&repo, when) {
            Some(push) => {
                // the push resolving the revision advances srctime
                if let Some(date) = push.date {
                    when = Some(when.map_or(date, |w| w.max(date)));
                }
                push.revision
            }
            // no pushes recorded; at worst this is the null changeset
            None => metadata.latest_changeset(&repo),
        };

        job.set_property(format!("{key}_branch"), repo.relative_path.clone());
        if repo.relative_path != repo.name {
            job.set_property(format!("local_{}", repo.name), repo.relative_path.clone());
        }
        job.set_property(format!("{key}_revision"), revision);
        if key == "en" {
            en_relative_path = Some(repo.relative_path);
        }
        revisions.push(key);
    }

    let forest = metadata
        .forest(&tree.branches.l10n)
        .ok_or_else(|| SubmitError::UnknownForest(tree.branches.l10n.clone()))?;
    let en_relative_path =
        en_relative_path.ok_or_else(|| SubmitError::EnBranchUnresolved {
            tree: tree.name.to_string(),
            branch: tree.branches.en.clone(),
        })?;
    let ini = tree
        .l10n_inis
        .get(&tree.branches.en)
        .and_then(|inis| inis.first())
        .ok_or_else(|| SubmitError::MissingIniPath(tree.name.to_string()))?;

    job.set_property("tree", tree.name.as_str());
    job.set_property("l10nbase", forest.relative_path);
    job.set_property("locale", locale.as_str());
    job.set_property("inipath", format!("{en_relative_path}/{ini}"));
    job.set_property("srctime", when);
    job.set_property(
        "revisions",
        revisions
            .into_iter()
            .map(serde_json::Value::from)
            .collect::<Vec<_>>(),
    );
    job.changes = changes;
    Ok(job)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lbs_remote::Forest;
    use lbs_remote::Push;
    use lbs_remote::Repository;
    use lbs_remote::NULL_REVISION;
    use rustc_hash::FxHashMap;
    use serde_json::json;

    #[derive(Default)]
    struct FakeMetadata {
        repos: FxHashMap<String, Repository>,
        pushes: FxHashMap<String, Vec<Push>>,
        forests: FxHashMap<String, Forest>,
    }

    impl FakeMetadata {
        fn with_repo(mut self, name: &str, relative_path: &str) -> Self {
            self.repos.insert(
                name.to_string(),
                Repository {
                    name: name.to_string(),
                    relative_path: relative_path.to_string(),
                },
            );
            self
        }

        fn with_push(mut self, repo: &str, date: Option<i64>, revision: &str) -> Self {
            self.pushes.entry(repo.to_string()).or_default().push(Push {
                date,
                revision: revision.to_string(),
            });
            self
        }

        fn with_forest(mut self, name: &str, relative_path: &str) -> Self {
            self.forests.insert(
                name.to_string(),
                Forest {
                    name: name.to_string(),
                    relative_path: relative_path.to_string(),
                },
            );
            self
        }
    }

    impl MetadataService for FakeMetadata {
        fn ensure_forest(&self, name: &str) -> (Forest, bool) {
            (self.forests[name].clone(), false)
        }

        fn tree_forest(&self, _code: &str) -> Option<String> {
            None
        }

        fn bind_tree(&self, _code: &str, _forest: &str) {}

        fn repository(&self, name: &str) -> Option<Repository> {
            self.repos.get(name).cloned()
        }

        fn latest_push(&self, repo: &Repository, before: Option<i64>) -> Option<Push> {
            self.pushes.get(&repo.name)?.iter().filter(|p| {
                match (before, p.date) {
                    (Some(bound), Some(date)) => date <= bound,
                    _ => true,
                }
            }).last().cloned()
        }

        fn latest_changeset(&self, _repo: &Repository) -> String {
            NULL_REVISION.to_string()
        }

        fn forest(&self, name: &str) -> Option<Forest> {
            self.forests.get(name).cloned()
        }
    }

    fn tree() -> Tree {
        Tree::new(
            "fx",
            "https://hg.example.org",
            "en-branch",
            "l10n-branch",
            "browser/l10n.ini",
        )
    }

    fn change_at(when: i64) -> Change {
        Change {
            branch: "l10n-branch".to_string(),
            when: Some(when),
            ..Change::default()
        }
    }

    #[test]
    fn assembles_full_property_set() {
        let metadata = FakeMetadata::default()
            .with_repo("en-branch", "en-branch")
            .with_repo("l10n-branch/de", "l10n/l10n-branch/de")
            .with_push("en-branch", Some(100), "abc123")
            .with_push("l10n-branch/de", Some(90), "def456")
            .with_forest("l10n-branch", "l10n/l10n-branch");

        let job = build_compare_job(
            &["compare".to_string()],
            &tree(),
            &Locale::from("de"),
            vec![change_at(95)],
            &metadata,
        )
        .unwrap();

        assert_eq!(job.builders, vec!["compare".to_string()]);
        assert_eq!(job.properties["tree"], json!("fx"));
        assert_eq!(job.properties["locale"], json!("de"));
        assert_eq!(job.properties["l10nbase"], json!("l10n/l10n-branch"));
        assert_eq!(
            job.properties["inipath"],
            json!("en-branch/browser/l10n.ini")
        );
        assert_eq!(job.properties["en_revision"], json!("abc123"));
        assert_eq!(job.properties["l10n_revision"], json!("def456"));
        assert_eq!(job.properties["revisions"], json!(["en", "l10n"]));
        // l10n repo's relative path differs from its name
        assert_eq!(
            job.properties["local_l10n-branch/de"],
            json!("l10n/l10n-branch/de")
        );
        assert!(!job.properties.contains_key("local_en-branch"));
    }

    #[test]
    fn srctime_folds_in_push_dates() {
        let metadata = FakeMetadata::default()
            .with_repo("en-branch", "en-branch")
            .with_repo("l10n-branch/de", "l10n-branch/de")
            .with_push("en-branch", Some(200), "abc123")
            .with_push("l10n-branch/de", Some(150), "def456")
            .with_forest("l10n-branch", "l10n-branch");

        // no change carries a timestamp, pushes supply one
        let job = build_compare_job(
            &[],
            &tree(),
            &Locale::from("de"),
            vec![Change::default()],
            &metadata,
        )
        .unwrap();
        assert_eq!(job.properties["srctime"], json!(200));
    }

    #[test]
    fn no_pushes_falls_back_to_latest_changeset() {
        let metadata = FakeMetadata::default()
            .with_repo("en-branch", "en-branch")
            .with_repo("l10n-branch/de", "l10n-branch/de")
            .with_forest("l10n-branch", "l10n-branch");

        let job = build_compare_job(
            &[],
            &tree(),
            &Locale::from("de"),
            vec![],
            &metadata,
        )
        .unwrap();
        assert_eq!(job.properties["en_revision"], json!(NULL_REVISION));
        assert_eq!(job.properties["srctime"], json!(null));
    }

    #[test]
    fn unknown_l10n_repo_is_dropped_from_revisions() {
        let metadata = FakeMetadata::default()
            .with_repo("en-branch", "en-branch")
            .with_push("en-branch", Some(10), "abc123")
            .with_forest("l10n-branch", "l10n-branch");

        let job = build_compare_job(
            &[],
            &tree(),
            &Locale::from("xx"),
            vec![],
            &metadata,
        )
        .unwrap();
        assert_eq!(job.properties["revisions"], json!(["en"]));
        assert!(!job.properties.contains_key("l10n_revision"));
    }

    #[test]
    fn unresolved_en_branch_fails_this_key() {
        let metadata = FakeMetadata::default()
            .with_repo("l10n-branch/de", "l10n-branch/de")
            .with_forest("l10n-branch", "l10n-branch");

        let err = build_compare_job(&[], &tree(), &Locale::from("de"), vec![], &metadata)
            .unwrap_err();
        assert!(matches!(err, SubmitError::EnBranchUnresolved { .. }));
    }

    #[test]
    fn missing_forest_fails_this_key() {
        let metadata = FakeMetadata::default()
            .with_repo("en-branch", "en-branch")
            .with_repo("l10n-branch/de", "l10n-branch/de");

        let err = build_compare_job(&[], &tree(), &Locale::from("de"), vec![], &metadata)
            .unwrap_err();
        assert!(matches!(err, SubmitError::UnknownForest(_)));
    }
}
