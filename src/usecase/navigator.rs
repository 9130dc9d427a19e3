//! Folder navigator: the chain state machine behind the popup.
//!
//! The chain depth is the only state. Every transition (descend, ascend,
//! reset, store invalidation) ends in [`Navigator::refresh`], which
//! re-validates the chain against the store, refetches the current folder,
//! notifies listeners and pushes the new state through the channel.
//!
//! A chain the store disagrees with is dropped wholesale and navigation
//! restarts at the root. Rebuilding a partial chain is deliberately not
//! attempted.

use crate::domain::error::NavError;
use crate::domain::model::{
    Breadcrumb, FolderChain, FolderEntry, FolderListing, FolderOption, NavState, SampleSize,
    StoreEvent, ROOT_FOLDER_ID,
};
use crate::domain::traits::{BookmarkStore, StateChannel, UniformSource, UrlOpener};
use crate::usecase::event::NavEvent;
use crate::usecase::sample::reservoir_sample;
use anyhow::{anyhow, Context, Result};
use tokio::sync::mpsc;
use tracing::{debug, error, warn};

pub type ChangeListener = Box<dyn FnMut(&NavView) + Send>;

/// What a UI needs to draw the navigator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavView {
    pub breadcrumb: Breadcrumb,
    pub folders: Vec<FolderOption>,
    pub url_count: usize,
    pub sample_size: SampleSize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Validation {
    Valid,
    Reset(String),
}

pub struct Navigator<S, C> {
    store: S,
    channel: C,
    chain: FolderChain,
    sample_size: SampleSize,
    listing: FolderListing,
    listeners: Vec<ChangeListener>,
    sink: Option<mpsc::Sender<NavEvent>>,
}

impl<S, C> Navigator<S, C>
where
    S: BookmarkStore,
    C: StateChannel,
{
    /// Read the persisted state once and bring the listing up to date.
    pub async fn restore(
        store: S,
        mut channel: C,
        sink: Option<mpsc::Sender<NavEvent>>,
    ) -> Result<Self> {
        let state = channel
            .load()
            .await
            .context("loading navigator state")?;

        let mut nav = Self {
            store,
            channel,
            chain: state.folder_chain,
            sample_size: state.sample_size,
            listing: FolderListing::default(),
            listeners: Vec::new(),
            sink,
        };

        emit(
            &nav.sink,
            NavEvent::StateRestored {
                depth: nav.chain.len(),
                sample_size: nav.sample_size.get(),
            },
        )
        .await;

        nav.refresh().await;
        Ok(nav)
    }

    pub fn chain(&self) -> &FolderChain {
        &self.chain
    }

    pub fn sample_size(&self) -> SampleSize {
        self.sample_size
    }

    pub fn folders(&self) -> &[FolderOption] {
        &self.listing.folders
    }

    pub fn urls(&self) -> &[String] {
        &self.listing.urls
    }

    pub fn breadcrumb(&self) -> Breadcrumb {
        self.chain.breadcrumb()
    }

    pub fn state(&self) -> NavState {
        NavState {
            folder_chain: self.chain.clone(),
            sample_size: self.sample_size,
        }
    }

    pub fn view(&self) -> NavView {
        NavView {
            breadcrumb: self.chain.breadcrumb(),
            folders: self.listing.folders.clone(),
            url_count: self.listing.urls.len(),
            sample_size: self.sample_size,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn on_change<F>(&mut self, listener: F)
    where
        F: FnMut(&NavView) + Send + 'static,
    {
        self.listeners.push(Box::new(listener));
    }

    pub async fn descend(&mut self, id: &str, name: &str) -> Result<(), NavError> {
        if self.listing.folders.is_empty() {
            return Err(NavError::NoChildFolder);
        }
        if !self.listing.folders.iter().any(|f| f.id == id) {
            return Err(NavError::UnknownChildFolder(id.to_string()));
        }

        self.chain.push(FolderEntry::new(id, name));
        emit(
            &self.sink,
            NavEvent::Descended {
                id: id.to_string(),
                name: name.to_string(),
            },
        )
        .await;
        self.refresh().await;
        Ok(())
    }

    /// Descend into the child folder matching `selector`: exact id first,
    /// then exact title, then case-insensitive title.
    pub async fn descend_by(&mut self, selector: &str) -> Result<(), NavError> {
        if self.listing.folders.is_empty() {
            return Err(NavError::NoChildFolder);
        }

        let folder = find_folder(&self.listing.folders, selector)
            .cloned()
            .ok_or_else(|| NavError::UnknownChildFolder(selector.to_string()))?;
        self.descend(&folder.id, &folder.title).await
    }

    pub async fn ascend(&mut self) -> Result<(), NavError> {
        let left = self.chain.pop().ok_or(NavError::AtRoot)?;
        emit(
            &self.sink,
            NavEvent::Ascended {
                id: left.id,
                name: left.name,
            },
        )
        .await;
        self.refresh().await;
        Ok(())
    }

    pub async fn reset(&mut self) {
        self.chain.clear();
        self.refresh().await;
    }

    /// Record a new sample size and sync it. The listing is not refetched.
    pub async fn set_sample_size(&mut self, size: SampleSize) {
        self.sample_size = size;
        emit(
            &self.sink,
            NavEvent::SampleSizeChanged {
                sample_size: size.get(),
            },
        )
        .await;
        self.sync().await;
    }

    /// Check the leaf folder against the store and drop the chain when the
    /// store no longer agrees with it.
    pub async fn validate(&mut self) -> Validation {
        let Some(leaf) = self.chain.leaf() else {
            return Validation::Valid;
        };

        let verdict = match self.store.get_node(&leaf.id) {
            Err(err) => Some(err.to_string()),
            Ok(node) => match self.chain.leaf_parent() {
                // Depth 1: the leaf hangs off the implicit root.
                None => None,
                Some(parent) if node.parent_id.as_deref() == Some(parent.id.as_str()) => None,
                Some(parent) => Some(format!(
                    "folder {} is now under {}, expected {}",
                    leaf.id,
                    node.parent_id.as_deref().unwrap_or("nothing"),
                    parent.id
                )),
            },
        };

        match verdict {
            None => Validation::Valid,
            Some(reason) => {
                self.reset_chain(&reason).await;
                Validation::Reset(reason)
            }
        }
    }

    /// Entry point for store change notifications.
    pub async fn invalidate(&mut self) {
        self.refresh().await;
    }

    pub async fn handle_store_event(&mut self, event: StoreEvent) {
        debug!(?event, "bookmark store changed");
        emit(&self.sink, NavEvent::StoreChanged { event }).await;
        self.invalidate().await;
    }

    /// Validate, refetch, notify, sync. Never fails: the root is always a
    /// usable fallback.
    pub async fn refresh(&mut self) {
        self.validate().await;
        self.listing = self.fetch_listing().await;

        let view = self.view();
        emit(
            &self.sink,
            NavEvent::Refreshed {
                folder_id: self.chain.current_folder_id().to_string(),
                breadcrumb: view.breadcrumb.to_string(),
                folders: view.folders.clone(),
                urls: view.url_count,
            },
        )
        .await;

        for listener in self.listeners.iter_mut() {
            listener(&view);
        }

        self.sync().await;
    }

    pub async fn sample<R: UniformSource + ?Sized>(&self, rng: &mut R) -> Vec<String> {
        let picked = reservoir_sample(&self.listing.urls, self.sample_size.as_usize(), rng);
        emit(
            &self.sink,
            NavEvent::Sampled {
                requested: self.sample_size.as_usize(),
                available: self.listing.urls.len(),
                urls: picked.clone(),
            },
        )
        .await;
        picked
    }

    /// Sample and open every picked URL in the background. Each URL is
    /// tried; failures are reported together once all were attempted.
    pub async fn open_sample<R: UniformSource + ?Sized>(
        &self,
        rng: &mut R,
        opener: &dyn UrlOpener,
    ) -> Result<Vec<String>> {
        let picked = self.sample(rng).await;

        let mut failed = Vec::new();
        for url in &picked {
            if let Err(err) = opener.open_in_background(url) {
                let error = format!("{err:#}");
                warn!(%url, %error, "could not open url");
                failed.push(url.as_str());
            }
        }

        if !failed.is_empty() {
            return Err(anyhow!(
                "could not open {} of {} urls: {}",
                failed.len(),
                picked.len(),
                failed.join(", ")
            ));
        }
        Ok(picked)
    }

    async fn fetch_listing(&mut self) -> FolderListing {
        match self.store.get_children(self.chain.current_folder_id()) {
            Ok(children) => return FolderListing::partition(children),
            Err(err) if !self.chain.is_empty() => {
                self.reset_chain(&err.to_string()).await;
            }
            Err(err) => {
                error!(%err, "root folder lookup failed");
                return FolderListing::default();
            }
        }

        match self.store.get_children(ROOT_FOLDER_ID) {
            Ok(children) => FolderListing::partition(children),
            Err(err) => {
                error!(%err, "root folder lookup failed");
                FolderListing::default()
            }
        }
    }

    async fn reset_chain(&mut self, reason: &str) {
        warn!(depth = self.chain.len(), %reason, "folder chain is stale, back to root");
        self.chain.clear();
        emit(
            &self.sink,
            NavEvent::ChainReset {
                reason: reason.to_string(),
            },
        )
        .await;
    }

    async fn sync(&mut self) {
        let state = self.state();
        match self.channel.save(&state).await {
            Ok(()) => debug!(depth = state.folder_chain.len(), "state synced"),
            Err(err) => {
                warn!(error = %err, "state sync failed");
                emit(
                    &self.sink,
                    NavEvent::StateSyncFailed {
                        error: format!("{err:#}"),
                    },
                )
                .await;
            }
        }
    }
}

fn find_folder<'a>(folders: &'a [FolderOption], selector: &str) -> Option<&'a FolderOption> {
    folders
        .iter()
        .find(|f| f.id == selector)
        .or_else(|| folders.iter().find(|f| f.title == selector))
        .or_else(|| {
            let wanted = selector.to_lowercase();
            folders.iter().find(|f| f.title.to_lowercase() == wanted)
        })
}

async fn emit(sink: &Option<mpsc::Sender<NavEvent>>, ev: NavEvent) {
    if let Some(tx) = sink {
        let _ = tx.send(ev).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::error::StoreError;
    use crate::domain::model::{BookmarkChild, NodeInfo};
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct MapStore {
        children: HashMap<String, Vec<BookmarkChild>>,
        parents: HashMap<String, String>,
    }

    impl MapStore {
        fn folder(mut self, parent: &str, id: &str, title: &str) -> Self {
            self.children
                .entry(parent.to_string())
                .or_default()
                .push(BookmarkChild::folder(id, title));
            self.children.entry(id.to_string()).or_default();
            self.parents.insert(id.to_string(), parent.to_string());
            self
        }

        fn link(mut self, parent: &str, id: &str, url: &str) -> Self {
            self.children
                .entry(parent.to_string())
                .or_default()
                .push(BookmarkChild::link(id, "", url));
            self.parents.insert(id.to_string(), parent.to_string());
            self
        }
    }

    impl BookmarkStore for MapStore {
        fn get_children(&self, folder_id: &str) -> Result<Vec<BookmarkChild>, StoreError> {
            if folder_id == ROOT_FOLDER_ID {
                return Ok(self.children.get(folder_id).cloned().unwrap_or_default());
            }
            self.children
                .get(folder_id)
                .cloned()
                .ok_or_else(|| StoreError::NotFound(folder_id.to_string()))
        }

        fn get_node(&self, id: &str) -> Result<NodeInfo, StoreError> {
            let parent = self
                .parents
                .get(id)
                .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
            Ok(NodeInfo {
                id: id.to_string(),
                parent_id: Some(parent.clone()),
            })
        }
    }

    #[derive(Clone, Default)]
    struct MemoryChannel {
        initial: NavState,
        saved: Arc<Mutex<Vec<NavState>>>,
        fail_saves: bool,
    }

    impl MemoryChannel {
        fn last_saved(&self) -> Option<NavState> {
            self.saved.lock().expect("lock").last().cloned()
        }
    }

    impl StateChannel for MemoryChannel {
        async fn load(&mut self) -> Result<NavState> {
            Ok(self.initial.clone())
        }

        async fn save(&mut self, state: &NavState) -> Result<()> {
            if self.fail_saves {
                anyhow::bail!("channel closed");
            }
            self.saved.lock().expect("lock").push(state.clone());
            Ok(())
        }
    }

    fn work_store() -> MapStore {
        MapStore::default()
            .folder("0", "1", "Work")
            .link("0", "2", "http://a")
            .link("0", "3", "http://b")
            .link("1", "4", "http://c")
    }

    fn state_with(chain: &[(&str, &str)], size: u8) -> NavState {
        NavState {
            folder_chain: FolderChain::from(
                chain
                    .iter()
                    .map(|(id, name)| FolderEntry::new(*id, *name))
                    .collect::<Vec<_>>(),
            ),
            sample_size: SampleSize::new(size).expect("size"),
        }
    }

    #[tokio::test]
    async fn root_listing_partitions_folders_and_urls() {
        let nav = Navigator::restore(work_store(), MemoryChannel::default(), None)
            .await
            .expect("restore");

        assert_eq!(nav.urls(), ["http://a", "http://b"]);
        let titles: Vec<&str> = nav.folders().iter().map(|f| f.title.as_str()).collect();
        assert_eq!(titles, vec!["Work"]);
        assert_eq!(nav.breadcrumb().to_string(), "root");
    }

    #[tokio::test]
    async fn descend_updates_breadcrumb_and_urls_then_ascend_round_trips() {
        let channel = MemoryChannel::default();
        let mut nav = Navigator::restore(work_store(), channel.clone(), None)
            .await
            .expect("restore");
        let before = nav.chain().clone();

        nav.descend("1", "Work").await.expect("descend");
        assert_eq!(nav.breadcrumb().to_string(), "root → Work");
        assert_eq!(nav.breadcrumb().to_html(), "root &rarr; <strong>Work</strong>");
        assert_eq!(nav.urls(), ["http://c"]);
        assert_eq!(
            channel.last_saved().map(|s| s.folder_chain.len()),
            Some(1)
        );

        nav.ascend().await.expect("ascend");
        assert_eq!(nav.chain(), &before);
        assert_eq!(nav.urls(), ["http://a", "http://b"]);
    }

    #[tokio::test]
    async fn descend_without_child_folders_is_refused() {
        let mut nav = Navigator::restore(work_store(), MemoryChannel::default(), None)
            .await
            .expect("restore");
        nav.descend("1", "Work").await.expect("descend");

        let err = nav.descend_by("anything").await.unwrap_err();
        assert_eq!(err, NavError::NoChildFolder);
        assert_eq!(nav.chain().len(), 1);
    }

    #[tokio::test]
    async fn descend_to_a_non_child_is_refused() {
        let mut nav = Navigator::restore(work_store(), MemoryChannel::default(), None)
            .await
            .expect("restore");
        let err = nav.descend("4", "c").await.unwrap_err();
        assert_eq!(err, NavError::UnknownChildFolder("4".to_string()));
        assert!(nav.chain().is_empty());
    }

    #[tokio::test]
    async fn descend_by_matches_id_then_title_case_insensitively() {
        let mut nav = Navigator::restore(work_store(), MemoryChannel::default(), None)
            .await
            .expect("restore");
        nav.descend_by("work").await.expect("by title");
        assert_eq!(nav.chain().leaf(), Some(&FolderEntry::new("1", "Work")));

        nav.ascend().await.expect("ascend");
        nav.descend_by("1").await.expect("by id");
        assert_eq!(nav.chain().len(), 1);
    }

    #[tokio::test]
    async fn ascend_at_root_is_refused_without_sync() {
        let channel = MemoryChannel::default();
        let mut nav = Navigator::restore(work_store(), channel.clone(), None)
            .await
            .expect("restore");
        let saves_before = channel.saved.lock().expect("lock").len();

        assert_eq!(nav.ascend().await, Err(NavError::AtRoot));
        assert_eq!(channel.saved.lock().expect("lock").len(), saves_before);
    }

    #[tokio::test]
    async fn parent_mismatch_resets_deep_chain() {
        let store = MapStore::default()
            .folder("0", "1", "Work")
            .folder("1", "5", "Projects")
            .folder("0", "9", "Elsewhere")
            .folder("9", "6", "Deep");
        // Chain claims 6 lives under 5, the store says 9.
        let channel = MemoryChannel {
            initial: state_with(&[("1", "Work"), ("5", "Projects"), ("6", "Deep")], 2),
            ..MemoryChannel::default()
        };

        let mut nav = Navigator::restore(store, channel.clone(), None)
            .await
            .expect("restore");
        assert!(nav.chain().is_empty());
        assert_eq!(nav.breadcrumb().to_string(), "root");
        assert_eq!(nav.sample_size().get(), 2);
        assert_eq!(channel.last_saved().map(|s| s.folder_chain.len()), Some(0));

        assert_eq!(nav.validate().await, Validation::Valid);
    }

    #[tokio::test]
    async fn missing_leaf_resets_chain() {
        let channel = MemoryChannel {
            initial: state_with(&[("1", "Work"), ("77", "Gone")], 1),
            ..MemoryChannel::default()
        };
        let nav = Navigator::restore(work_store(), channel, None)
            .await
            .expect("restore");
        assert!(nav.chain().is_empty());
        assert_eq!(nav.urls(), ["http://a", "http://b"]);
    }

    #[tokio::test]
    async fn depth_one_chain_skips_parent_check() {
        let store = MapStore::default()
            .folder("0", "1", "Bar")
            .folder("1", "2", "Nested")
            .link("2", "3", "http://n");
        // "2" is really under "1", but a depth-1 chain only needs the node to exist.
        let channel = MemoryChannel {
            initial: state_with(&[("2", "Nested")], 1),
            ..MemoryChannel::default()
        };
        let nav = Navigator::restore(store, channel, None)
            .await
            .expect("restore");
        assert_eq!(nav.chain().len(), 1);
        assert_eq!(nav.urls(), ["http://n"]);
    }

    #[tokio::test]
    async fn store_events_revalidate_against_the_current_store() {
        let mut nav = Navigator::restore(work_store(), MemoryChannel::default(), None)
            .await
            .expect("restore");
        nav.descend("1", "Work").await.expect("descend");

        nav.store_mut().children.remove("1");
        nav.store_mut().parents.remove("1");
        nav.handle_store_event(StoreEvent::Removed {
            id: "1".to_string(),
            parent_id: "0".to_string(),
        })
        .await;

        assert!(nav.chain().is_empty());
        assert_eq!(nav.urls(), ["http://a", "http://b"]);
    }

    #[tokio::test]
    async fn listeners_see_every_refresh() {
        let mut nav = Navigator::restore(work_store(), MemoryChannel::default(), None)
            .await
            .expect("restore");

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        nav.on_change(move |view| {
            sink.lock()
                .expect("lock")
                .push((view.breadcrumb.to_string(), view.url_count));
        });

        nav.descend("1", "Work").await.expect("descend");
        nav.ascend().await.expect("ascend");

        let seen = seen.lock().expect("lock").clone();
        assert_eq!(
            seen,
            vec![("root → Work".to_string(), 1), ("root".to_string(), 2)]
        );
    }

    #[tokio::test]
    async fn sample_size_change_syncs_without_refetch() {
        let channel = MemoryChannel::default();
        let mut nav = Navigator::restore(work_store(), channel.clone(), None)
            .await
            .expect("restore");
        nav.set_sample_size(SampleSize::new(3).expect("size")).await;
        assert_eq!(channel.last_saved().map(|s| s.sample_size.get()), Some(3));
    }

    #[tokio::test]
    async fn failed_sync_is_reported_not_fatal() {
        let channel = MemoryChannel {
            fail_saves: true,
            ..MemoryChannel::default()
        };
        let (tx, mut rx) = mpsc::channel(64);
        let mut nav = Navigator::restore(work_store(), channel, Some(tx))
            .await
            .expect("restore");
        nav.descend("1", "Work").await.expect("descend");
        drop(nav);

        let mut failures = 0;
        while let Some(ev) = rx.recv().await {
            if matches!(ev, NavEvent::StateSyncFailed { .. }) {
                failures += 1;
            }
        }
        assert_eq!(failures, 2);
    }

    #[tokio::test]
    async fn sample_draws_current_size_from_current_urls() {
        struct Zero;
        impl UniformSource for Zero {
            fn next_unit(&mut self) -> f64 {
                0.0
            }
        }

        let store = MapStore::default()
            .link("0", "1", "http://1")
            .link("0", "2", "http://2")
            .link("0", "3", "http://3")
            .link("0", "4", "http://4")
            .link("0", "5", "http://5");
        let channel = MemoryChannel {
            initial: state_with(&[], 3),
            ..MemoryChannel::default()
        };
        let nav = Navigator::restore(store, channel, None)
            .await
            .expect("restore");

        let picked = nav.sample(&mut Zero).await;
        // Every later item lands in slot 0.
        assert_eq!(picked, vec!["http://5", "http://2", "http://3"]);
    }

    #[tokio::test]
    async fn a_failing_url_does_not_stop_the_rest() {
        struct FailsOnSecond {
            seen: Mutex<Vec<String>>,
        }
        impl UrlOpener for FailsOnSecond {
            fn open_in_background(&self, url: &str) -> Result<()> {
                let mut seen = self.seen.lock().expect("lock");
                seen.push(url.to_string());
                if seen.len() == 2 {
                    anyhow::bail!("browser refused {url}");
                }
                Ok(())
            }
        }
        struct Half;
        impl UniformSource for Half {
            fn next_unit(&mut self) -> f64 {
                0.5
            }
        }

        let store = MapStore::default()
            .link("0", "1", "http://1")
            .link("0", "2", "http://2")
            .link("0", "3", "http://3");
        let channel = MemoryChannel {
            initial: state_with(&[], 3),
            ..MemoryChannel::default()
        };
        let nav = Navigator::restore(store, channel, None)
            .await
            .expect("restore");

        let opener = FailsOnSecond {
            seen: Mutex::new(Vec::new()),
        };
        let err = nav.open_sample(&mut Half, &opener).await.unwrap_err();

        let seen = opener.seen.lock().expect("lock").clone();
        assert_eq!(seen, vec!["http://1", "http://2", "http://3"]);
        let msg = err.to_string();
        assert!(msg.contains("could not open 1 of 3 urls"), "{msg}");
        assert!(msg.contains("http://2"), "{msg}");
    }
}
