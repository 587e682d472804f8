use std::collections::BTreeSet;
use std::sync::Arc;

use camino::Utf8Path;
use camino::Utf8PathBuf;
use lbs_conf::Settings;
use lbs_conf::TreesConfig;
use lbs_model::parse_locales;
use lbs_model::Change;
use lbs_model::Locale;
use lbs_model::Tree;
use lbs_model::TreeName;
use lbs_remote::BuildExecutor;
use lbs_remote::BuildHandle;
use lbs_remote::JobSpec;
use lbs_remote::LocaleSource;
use lbs_remote::MetadataService;
use tokio::sync::mpsc;
use tracing::debug;
use tracing::error;
use tracing::info;
use tracing::warn;

use crate::barrier::Barrier;
use crate::indices::build_indices;
use crate::indices::Indices;
use crate::pending::PendingBuilds;
use crate::registry::Registry;
use crate::submit::build_compare_job;
use crate::submit::SubmitError;

/// Messages driving the scheduler task.
#[derive(Debug)]
pub enum Event {
    /// A new revision-control change from the upstream event source.
    Change(Change),
    /// Tree data produced by a completed topology sub-build.
    TreeLoaded { tree: Tree, changes: Vec<Change> },
    /// All sub-builds of one refresh round finished.
    RefreshComplete { change: Option<Change> },
    /// Flush tick for the pending-build aggregator.
    Flush,
}

#[derive(Clone, Debug)]
pub struct SchedulerConfig {
    /// Builder names compare-build jobs are submitted to.
    pub builders: Vec<String>,
    /// Builder that re-derives tree topology from remote l10n.ini files.
    pub tree_builder: String,
    /// Path of the trees file, forwarded to topology jobs as their
    /// `l10nbuilds` property.
    pub trees_path: Utf8PathBuf,
    /// Trees refreshed at startup.
    pub tree_names: Vec<TreeName>,
}

impl SchedulerConfig {
    #[must_use]
    pub fn from_settings(settings: &Settings, trees: &TreesConfig) -> Self {
        Self {
            builders: settings.builders.clone(),
            tree_builder: settings.tree_builder.clone(),
            trees_path: trees.path().to_owned(),
            tree_names: trees.names().iter().map(TreeName::new).collect(),
        }
    }

    /// Union of compare-build builder names and the topology builder.
    #[must_use]
    pub fn builder_names(&self) -> Vec<String> {
        self.builders
            .iter()
            .cloned()
            .chain([self.tree_builder.clone()])
            .collect()
    }
}

/// Cheap-to-clone handle exposing the scheduler's surface to
/// collaborators: the upstream change source and the topology
/// sub-build's result handler.
#[derive(Clone)]
pub struct SchedulerHandle {
    tx: mpsc::UnboundedSender<Event>,
}

impl SchedulerHandle {
    /// Deliver one change event.
    pub fn handle_change(&self, change: Change) {
        if self.tx.send(Event::Change(change)).is_err() {
            warn!("scheduler stopped, dropping change");
        }
    }

    /// Deliver tree data re-derived by a topology sub-build.
    pub fn add_tree(&self, tree: Tree, changes: Vec<Change>) {
        if self.tx.send(Event::TreeLoaded { tree, changes }).is_err() {
            warn!("scheduler stopped, dropping tree data");
        }
    }
}

/// The change-triggered build scheduler.
///
/// Owns the registry, the derived indices, the refresh barrier and
/// the pending-build aggregator. All state is mutated from a single
/// task; collaborators talk to it through [`SchedulerHandle`].
pub struct Scheduler {
    config: SchedulerConfig,
    executor: Arc<dyn BuildExecutor>,
    metadata: Arc<dyn MetadataService>,
    locales: Arc<dyn LocaleSource>,
    registry: Registry,
    indices: Indices,
    barrier: Barrier,
    /// Trees reported changed by the current refresh round, picked up
    /// by the next en-US continuation.
    trees_changed: BTreeSet<TreeName>,
    pending: PendingBuilds,
    tx: mpsc::UnboundedSender<Event>,
    rx: mpsc::UnboundedReceiver<Event>,
}

impl Scheduler {
    pub fn new(
        config: SchedulerConfig,
        executor: Arc<dyn BuildExecutor>,
        metadata: Arc<dyn MetadataService>,
        locales: Arc<dyn LocaleSource>,
    ) -> (Self, SchedulerHandle) {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = SchedulerHandle { tx: tx.clone() };
        let scheduler = Self {
            config,
            executor,
            metadata,
            locales,
            registry: Registry::default(),
            indices: Indices::default(),
            barrier: Barrier::default(),
            trees_changed: BTreeSet::new(),
            pending: PendingBuilds::default(),
            tx,
            rx,
        };
        (scheduler, handle)
    }

    #[must_use]
    pub fn builder_names(&self) -> Vec<String> {
        self.config.builder_names()
    }

    #[must_use]
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    #[must_use]
    pub fn indices(&self) -> &Indices {
        &self.indices
    }

    #[must_use]
    pub fn is_refreshing(&self) -> bool {
        self.barrier.is_refreshing()
    }

    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Submit the startup topology refresh and run the event loop
    /// until every handle is gone.
    pub async fn run(mut self) {
        self.start();
        while let Some(event) = self.rx.recv().await {
            self.process(event).await;
        }
        info!("l10n scheduler stopped");
    }

    /// Trigger a topology refresh for every configured tree.
    pub fn start(&mut self) {
        if self.config.tree_names.is_empty() {
            return;
        }
        info!(trees = self.config.tree_names.len(), "starting l10n scheduler");
        let names = self.config.tree_names.clone();
        let handles = self.submit_tree_jobs(&names, None);
        self.begin_refresh(handles, None);
    }

    /// Process one event.
    ///
    /// Public so tests can drive the scheduler deterministically
    /// without the event loop.
    pub async fn process(&mut self, event: Event) {
        match event {
            Event::Change(change) => self.handle_change(change).await,
            Event::TreeLoaded { tree, changes } => self.add_tree(tree, &changes),
            Event::RefreshComplete { change } => self.on_trees_built(change).await,
            Event::Flush => self.flush(),
        }
    }

    /// Process everything already queued, without waiting for more.
    pub async fn drain(&mut self) {
        while let Ok(event) = self.rx.try_recv() {
            self.process(event).await;
        }
    }

    /// Store or update one tree's metadata and rebuild the indices.
    ///
    /// Callback target of the topology sub-build's result handler. An
    /// unchanged re-registration is a full no-op.
    fn add_tree(&mut self, tree: Tree, _related: &[Change]) {
        if let Some(existing) = self.registry.get(&tree.name) {
            if *existing == tree {
                debug!(tree = %tree.name, "tree info loaded, unchanged");
                return;
            }
            // picked up by the continuation after this refresh round
            self.trees_changed.insert(tree.name.clone());
        }

        // keep the external tree/forest relationship in sync
        let (forest, created) = self.metadata.ensure_forest(&tree.branches.l10n);
        if created {
            warn!(forest = %forest.name, "scheduler created forest, not expected");
        }
        match self.metadata.tree_forest(tree.name.as_str()) {
            None => self.metadata.bind_tree(tree.name.as_str(), &forest.name),
            Some(bound) if bound != forest.name => {
                warn!(tree = %tree.name, from = %bound, to = %forest.name, "tree moved to another forest");
                self.metadata.bind_tree(tree.name.as_str(), &forest.name);
            }
            Some(_) => {}
        }

        debug!(tree = %tree.name, "updated tree");
        self.registry.insert(tree);
        self.indices = build_indices(&self.registry);
        debug!("branch data cache updated");
    }

    /// Classify one change event. Main entry point.
    async fn handle_change(&mut self, change: Change) {
        if self.barrier.is_refreshing() {
            debug!("tree refresh in flight, deferring change");
            self.barrier.defer(change);
            return;
        }
        match change.effective_locale() {
            None => self.handle_en_change(change).await,
            Some(locale) => self.handle_l10n_change(&change, &locale),
        }
    }

    /// English/source-branch change: either kick off a topology
    /// refresh (an l10n.ini was touched) or run the continuation
    /// directly.
    async fn handle_en_change(&mut self, change: Change) {
        let Some(branch_index) = self.indices.branches.get(&change.branch) else {
            debug!(branch = %change.branch, "not our branch");
            return;
        };

        let mut triggered: BTreeSet<TreeName> = BTreeSet::new();
        for file in &change.files {
            if let Some(trees) = branch_index.ini_trees.get(file) {
                triggered.extend(trees.iter().cloned());
            }
        }

        if triggered.is_empty() {
            self.check_en_us(&change).await;
            return;
        }

        info!(
            trees = triggered.len(),
            branch = %change.branch,
            "l10n.ini changed, refreshing tree info"
        );
        let names: Vec<TreeName> = triggered.into_iter().collect();
        let handles = self.submit_tree_jobs(&names, Some(&change));
        self.begin_refresh(handles, Some(change));
    }

    /// Localization-branch change: resolve affected trees by
    /// directory prefix and enqueue compare-builds for known locales.
    fn handle_l10n_change(&mut self, change: &Change, locale: &Locale) {
        let Some(index) = self.indices.l10n_branches.get(&change.branch) else {
            debug!(branch = %change.branch, "not one of our l10n branches");
            return;
        };

        let mut affected: BTreeSet<TreeName> = BTreeSet::new();
        for file in &change.files {
            affected.extend(index.trees_for_file(file).cloned());
        }

        let mut hits = Vec::new();
        for name in affected {
            let Some(tree) = self.registry.get(&name) else {
                continue;
            };
            if tree.locales.contains(locale) {
                hits.push(name);
            } else {
                // unknown locales are never built speculatively
                info!(locale = %locale, tree = %name, "locale not known for tree, skipping");
            }
        }
        for name in hits {
            self.compare_build(name, locale.clone(), vec![change.clone()]);
        }
    }

    /// Submit one topology sub-build per tree name.
    fn submit_tree_jobs(&self, names: &[TreeName], change: Option<&Change>) -> Vec<BuildHandle> {
        let mut handles = Vec::with_capacity(names.len());
        for name in names {
            let mut job = JobSpec::new(vec![self.config.tree_builder.clone()]);
            job.set_property("tree", name.as_str());
            job.set_property("l10nbuilds", self.config.trees_path.as_str());
            if let Some(change) = change {
                job.branch = Some(change.branch.clone());
                job.changes = vec![change.clone()];
            }
            match self.executor.submit(job) {
                Ok(handle) => handles.push(handle),
                Err(e) => warn!(tree = %name, error = %e, "failed to submit tree refresh"),
            }
        }
        handles
    }

    /// Idle → Refreshing; a waiter task posts [`Event::RefreshComplete`]
    /// once every sub-build of this round finished.
    fn begin_refresh(&mut self, handles: Vec<BuildHandle>, change: Option<Change>) {
        self.barrier.begin();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            for handle in handles {
                let _ = handle.completion().await;
            }
            let _ = tx.send(Event::RefreshComplete { change });
        });
    }

    /// Refreshing → Idle: run the continuation for a change-triggered
    /// refresh, then replay deferred changes in order. Replay can
    /// re-enter Refreshing, so draining is iterative.
    async fn on_trees_built(&mut self, change: Option<Change>) {
        debug!(change_given = change.is_some(), "pending tree refresh finished");
        let mut queued = self.barrier.complete();
        if let Some(change) = change {
            self.check_en_us(&change).await;
        }
        while let Some(next) = queued.pop_front() {
            self.handle_change(next).await;
            if self.barrier.is_refreshing() {
                self.barrier.requeue(queued);
                return;
            }
        }
    }

    /// The en-US continuation: resolve targets touched by the change,
    /// run locale discovery, and enqueue compare-builds.
    async fn check_en_us(&mut self, change: &Change) {
        debug!(branch = %change.branch, "checking en-US for change");

        let mut en_us = std::mem::take(&mut self.trees_changed);
        let mut discovery: BTreeSet<TreeName> = BTreeSet::new();
        let mut top_level: BTreeSet<TreeName> = BTreeSet::new();
        // a refresh can rename branches out from under the triggering
        // change; file matching then finds nothing, but trees flagged
        // changed by the refresh are still force-built below
        if let Some(branch_index) = self.indices.branches.get(&change.branch) {
            for file in &change.files {
                if let Some(trees) = branch_index.all_locales_trees.get(file) {
                    discovery.extend(trees.iter().cloned());
                }
                if let Some(idx) = file.as_str().find("locales/en-US") {
                    let module = file.as_str()[..idx].trim_end_matches('/');
                    if module.is_empty() {
                        // single-module layout, no directory to resolve
                        top_level.extend(branch_index.top_level.iter().cloned());
                    } else if let Some(trees) =
                        branch_index.dir_trees.get(Utf8Path::new(module))
                    {
                        en_us.extend(trees.iter().cloned());
                    }
                }
            }
        }

        for name in top_level {
            self.build_all_locales(&name, change);
        }

        // load all-locales files for discovery targets
        let rev = change
            .revision
            .clone()
            .unwrap_or_else(|| "default".to_string());
        let locales = Arc::clone(&self.locales);
        for name in discovery {
            let Some(tree) = self.registry.get(&name) else {
                continue;
            };
            let Some(all_locales) = &tree.all_locales else {
                continue;
            };
            let url = format!(
                "{}/{}/raw-file/{}/{}",
                tree.repo_url.trim_end_matches('/'),
                tree.branches.en,
                rev,
                all_locales
            );
            match locales.fetch(&url).await {
                Ok(body) => self.on_all_locales(&name, &body, change),
                Err(e) => {
                    // one tree's discovery failure must not abort the rest
                    warn!(tree = %name, error = %e, "all-locales fetch failed, skipping discovery");
                }
            }
        }

        // trigger every known locale for the remaining targets
        for name in en_us {
            self.build_all_locales(&name, change);
        }
    }

    /// Diff freshly fetched locales against the tree's known list and
    /// enqueue compare-builds for the newly added ones.
    fn on_all_locales(&mut self, name: &TreeName, body: &str, change: &Change) {
        let new_locales = parse_locales(body);
        let Some(tree) = self.registry.get_mut(name) else {
            return;
        };
        let added: Vec<Locale> = new_locales
            .iter()
            .filter(|locale| !tree.locales.contains(locale))
            .cloned()
            .collect();
        debug!(
            tree = %name,
            had = tree.locales.len(),
            got = new_locales.len(),
            new = added.len(),
            "all-locales loaded"
        );
        tree.locales = new_locales;
        for locale in added {
            self.compare_build(name.clone(), locale, vec![change.clone()]);
        }
    }

    fn build_all_locales(&mut self, name: &TreeName, change: &Change) {
        let locales = self
            .registry
            .get(name)
            .map(|tree| tree.locales.clone())
            .unwrap_or_default();
        for locale in locales {
            self.compare_build(name.clone(), locale, vec![change.clone()]);
        }
    }

    /// Coalesce a compare-build trigger and schedule a flush tick if
    /// none is scheduled yet.
    fn compare_build(&mut self, tree: TreeName, locale: Locale, changes: Vec<Change>) {
        if self.pending.add(tree, locale, changes) {
            // lands strictly behind everything already queued
            let _ = self.tx.send(Event::Flush);
        }
    }

    /// Submit one job per pending (tree, locale); a failed key is
    /// logged and does not affect the others.
    fn flush(&mut self) {
        let pending = self.pending.take();
        if pending.is_empty() {
            return;
        }
        info!(pending = pending.len(), "submitting pending compare builds");
        for ((tree, locale), changes) in pending {
            if let Err(e) = self.submit_compare(&tree, &locale, changes) {
                error!(tree = %tree, locale = %locale, error = %e, "compare build submission failed");
            }
        }
    }

    fn submit_compare(
        &self,
        name: &TreeName,
        locale: &Locale,
        changes: Vec<Change>,
    ) -> Result<(), SubmitError> {
        let tree = self
            .registry
            .get(name)
            .ok_or_else(|| SubmitError::UnknownTree(name.to_string()))?;
        let job = build_compare_job(
            &self.config.builders,
            tree,
            locale,
            changes,
            self.metadata.as_ref(),
        )?;
        self.executor.submit(job)?;
        debug!(tree = %name, locale = %locale, "compare build submitted");
        Ok(())
    }
}
