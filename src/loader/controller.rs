//! The content loader behind one folder view.
//!
//! `ContentLoader` owns the visible rows and the playable subset, drives
//! one `EnumerationSession` at a time and reports loading/empty state:
//! - every load starts a new generation, which retires the previous session
//! - rows are appended under the content lock only while the generation is
//!   still current, so a superseded session never adds a row
//! - the loading flag is debounced and only set when a load is slow

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use flume::{Receiver, Sender};
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use super::session::{Batch, EnumerationSession, GenerationGate};
use super::timer::LoadingTimer;
use crate::config::LoaderConfig;
use crate::messaging::{BusMessage, MessageBus, Navigator, NoNavigation};
use crate::models::{Library, MediaHandle, NavigationTarget, RawEntry, VisibleItem};
use crate::source::{ExtensionResolver, FileEnumerator, MediaResolver, PagedQuery};

/// Change notifications for views following the collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentEvent {
    Cleared,
    Appended { start: usize, count: usize },
    LoadingChanged(bool),
    EmptyChanged(bool),
}

/// State shared with the loading timer.
struct Signals {
    gate: GenerationGate,
    loading: AtomicBool,
    empty: AtomicBool,
    observers: Mutex<Vec<Sender<ContentEvent>>>,
}

impl Signals {
    fn notify(&self, event: ContentEvent) {
        self.observers.lock().retain(|tx| tx.send(event).is_ok());
    }

    fn set_loading(&self, loading: bool) {
        if self.loading.swap(loading, Ordering::SeqCst) != loading {
            self.notify(ContentEvent::LoadingChanged(loading));
        }
    }

    fn set_empty(&self, empty: bool) {
        if self.empty.swap(empty, Ordering::SeqCst) != empty {
            self.notify(ContentEvent::EmptyChanged(empty));
        }
    }
}

#[derive(Default)]
struct Content {
    items: Vec<VisibleItem>,
    playable: Vec<MediaHandle>,
    breadcrumbs: Vec<PathBuf>,
    target: Option<NavigationTarget>,
    /// Bumped whenever `playable` changes.
    revision: u64,
    /// Revision of the last playlist sent to the bus.
    published: Option<u64>,
}

pub struct ContentLoader {
    files: Arc<dyn FileEnumerator>,
    resolver: Arc<dyn MediaResolver>,
    navigator: Arc<dyn Navigator>,
    bus: MessageBus,
    batch_size: usize,
    active: AtomicBool,
    timer: LoadingTimer,
    signals: Arc<Signals>,
    content: Mutex<Content>,
}

impl ContentLoader {
    pub fn builder(files: Arc<dyn FileEnumerator>) -> ContentLoaderBuilder {
        ContentLoaderBuilder::new(files)
    }

    /// Shows `target`, replacing whatever was displayed.
    ///
    /// Resolves when the listing is complete or has been superseded.
    pub async fn activate(&self, target: NavigationTarget) {
        self.active.store(true, Ordering::SeqCst);

        let Some(target) = target.validated() else {
            debug!("Empty breadcrumb trail, nothing to show");
            let generation = self.begin(None);
            self.finish(generation);
            return;
        };

        info!(?target, "Loading content");
        let generation = self.begin(Some(target.clone()));
        match target {
            NavigationTarget::Folder(folder) => {
                self.set_breadcrumbs(generation, vec![folder.clone()]);
                let query = self.files.supported_children(&folder);
                self.drain(query, generation, false).await;
            }
            NavigationTarget::Breadcrumbs(trail) => {
                let Some(last) = trail.last() else {
                    return;
                };
                let query = self.files.supported_children(last);
                self.set_breadcrumbs(generation, trail);
                self.drain(query, generation, false).await;
            }
            NavigationTarget::Library(library) => self.load_library(library, generation).await,
            NavigationTarget::Query(query) => {
                self.set_breadcrumbs(generation, Vec::new());
                self.drain(query, generation, true).await;
            }
        }
    }

    /// Tears the view down: stops any session and clears the rows.
    pub fn deactivate(&self) {
        self.active.store(false, Ordering::SeqCst);
        self.signals.gate.advance();
        self.timer.stop();

        let mut content = self.content.lock();
        content.items.clear();
        content.playable.clear();
        content.revision += 1;
        self.signals.notify(ContentEvent::Cleared);
        debug!("Content loader deactivated");
    }

    /// Reloads the last target. No-op unless the loader is active.
    pub async fn refresh(&self) {
        if !self.is_active() {
            debug!("Ignoring refresh for inactive loader");
            return;
        }
        let target = self.content.lock().target.clone();
        if let Some(target) = target {
            self.activate(target).await;
        }
    }

    /// Calls `refresh` for every `RefreshRequested` on `bus`.
    ///
    /// The task holds only a weak reference and ends once the loader is gone.
    pub fn listen(self: &Arc<Self>, bus: &MessageBus) -> JoinHandle<()> {
        let rx = bus.subscribe();
        let weak_self = Arc::downgrade(self);
        tokio::spawn(async move {
            while let Ok(message) = rx.recv_async().await {
                if message != BusMessage::RefreshRequested {
                    continue;
                }
                let Some(loader) = weak_self.upgrade() else {
                    break;
                };
                loader.refresh().await;
            }
        })
    }

    pub fn subscribe(&self) -> Receiver<ContentEvent> {
        let (tx, rx) = flume::unbounded();
        self.signals.observers.lock().push(tx);
        rx
    }

    /// Plays a media row, first replacing the play queue with this view's
    /// playable items unless that exact list was already sent.
    pub fn play(&self, item: &VisibleItem) {
        let Some(media) = &item.media else {
            return;
        };
        {
            let mut content = self.content.lock();
            if content.published != Some(content.revision) {
                self.bus
                    .publish(BusMessage::PlaylistReplace(content.playable.clone()));
                content.published = Some(content.revision);
            }
        }
        self.bus.publish(BusMessage::PlayMedia(media.clone()));
    }

    pub fn play_next(&self, item: &VisibleItem) {
        if let Some(media) = &item.media {
            self.bus.publish(BusMessage::PlayNext(media.clone()));
        }
    }

    /// Plays media rows and drills into folder rows.
    pub fn open(&self, item: &VisibleItem) {
        if item.media.is_some() {
            self.play(item);
        } else if item.is_folder() {
            let mut crumbs = self.breadcrumbs();
            crumbs.push(item.path().to_path_buf());
            self.navigator.navigate(crumbs);
        }
    }

    pub fn items(&self) -> Vec<VisibleItem> {
        self.content.lock().items.clone()
    }

    pub fn playable_items(&self) -> Vec<MediaHandle> {
        self.content.lock().playable.clone()
    }

    pub fn item_count(&self) -> usize {
        self.content.lock().items.len()
    }

    pub fn breadcrumbs(&self) -> Vec<PathBuf> {
        self.content.lock().breadcrumbs.clone()
    }

    pub fn current_target(&self) -> Option<NavigationTarget> {
        self.content.lock().target.clone()
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    pub fn is_loading(&self) -> bool {
        self.signals.loading.load(Ordering::SeqCst)
    }

    /// True once a finished load produced no rows.
    pub fn is_empty(&self) -> bool {
        self.signals.empty.load(Ordering::SeqCst)
    }

    /// Starts a new generation and resets the collection for it.
    fn begin(&self, target: Option<NavigationTarget>) -> u64 {
        let mut content = self.content.lock();
        let generation = self.signals.gate.advance();
        content.items.clear();
        content.playable.clear();
        content.revision += 1;
        content.target = target;
        self.signals.notify(ContentEvent::Cleared);
        self.signals.set_empty(false);
        generation
    }

    async fn load_library(&self, library: Library, generation: u64) {
        match library.folders.as_slice() {
            [] => {
                debug!(library = %library.name, "Library has no folders");
                self.set_breadcrumbs(generation, Vec::new());
                self.finish(generation);
            }
            [folder] => {
                self.set_breadcrumbs(generation, vec![folder.clone()]);
                let query = self.files.supported_children(folder);
                self.drain(query, generation, false).await;
            }
            folders => {
                self.set_breadcrumbs(generation, Vec::new());
                self.load_containers(folders.to_vec(), generation).await;
            }
        }
    }

    async fn drain(&self, query: Arc<dyn PagedQuery>, generation: u64, files_only: bool) {
        let liveness = self.signals.gate.liveness(generation);
        let mut session =
            EnumerationSession::new(query, liveness, self.batch_size).files_only(files_only);

        self.arm_loading_timer(generation);
        loop {
            match session.next_batch().await {
                Batch::Entries(entries) => {
                    if self.append(generation, entries).is_none() {
                        return;
                    }
                }
                Batch::Exhausted => {
                    self.finish(generation);
                    return;
                }
                Batch::Aborted => return,
            }
        }
    }

    /// One row per library folder, each captioned after it is shown.
    async fn load_containers(&self, folders: Vec<PathBuf>, generation: u64) {
        self.arm_loading_timer(generation);
        for folder in folders {
            let Some(added) = self.append(generation, vec![RawEntry::folder(folder)]) else {
                return;
            };
            for item in &added {
                item.refresh_caption(self.files.as_ref()).await;
            }
        }
        self.finish(generation);
    }

    /// Appends adapted rows if `generation` is still current; returns the
    /// rows added.
    fn append(&self, generation: u64, entries: Vec<RawEntry>) -> Option<Vec<VisibleItem>> {
        let mut content = self.content.lock();
        if !self.signals.gate.is_current(generation) {
            return None;
        }

        let start = content.items.len();
        let mut added = Vec::with_capacity(entries.len());
        for entry in entries {
            let item = VisibleItem::adapt(entry, content.items.len(), self.resolver.as_ref());
            if let Some(media) = &item.media {
                content.playable.push(media.clone());
            }
            content.items.push(item.clone());
            added.push(item);
        }

        if !added.is_empty() {
            content.revision += 1;
            self.signals.notify(ContentEvent::Appended {
                start,
                count: added.len(),
            });
        }
        Some(added)
    }

    fn finish(&self, generation: u64) {
        let content = self.content.lock();
        if !self.signals.gate.is_current(generation) {
            return;
        }
        self.timer.stop();
        self.signals.set_loading(false);
        self.signals.set_empty(content.items.is_empty());
        debug!(
            items = content.items.len(),
            playable = content.playable.len(),
            "Content loaded"
        );
    }

    fn set_breadcrumbs(&self, generation: u64, breadcrumbs: Vec<PathBuf>) {
        let mut content = self.content.lock();
        if self.signals.gate.is_current(generation) {
            content.breadcrumbs = breadcrumbs;
        }
    }

    /// Starts the loading countdown for `generation`. A retired
    /// generation must not displace the countdown of its successor.
    fn arm_loading_timer(&self, generation: u64) {
        let _content = self.content.lock();
        if !self.signals.gate.is_current(generation) {
            return;
        }
        let signals = Arc::clone(&self.signals);
        self.timer.debounce(move || {
            if signals.gate.is_current(generation) {
                signals.set_loading(true);
            }
        });
    }
}

pub struct ContentLoaderBuilder {
    files: Arc<dyn FileEnumerator>,
    resolver: Arc<dyn MediaResolver>,
    navigator: Arc<dyn Navigator>,
    bus: MessageBus,
    config: LoaderConfig,
}

impl ContentLoaderBuilder {
    pub fn new(files: Arc<dyn FileEnumerator>) -> Self {
        Self {
            files,
            resolver: Arc::new(ExtensionResolver),
            navigator: Arc::new(NoNavigation),
            bus: MessageBus::new(),
            config: LoaderConfig::default(),
        }
    }

    pub fn resolver(mut self, resolver: Arc<dyn MediaResolver>) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn navigator(mut self, navigator: Arc<dyn Navigator>) -> Self {
        self.navigator = navigator;
        self
    }

    pub fn bus(mut self, bus: MessageBus) -> Self {
        self.bus = bus;
        self
    }

    pub fn config(mut self, config: LoaderConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> Arc<ContentLoader> {
        Arc::new(ContentLoader {
            files: self.files,
            resolver: self.resolver,
            navigator: self.navigator,
            bus: self.bus,
            batch_size: self.config.batch_size.max(1),
            active: AtomicBool::new(true),
            timer: LoadingTimer::new(self.config.loading_delay()),
            signals: Arc::new(Signals {
                gate: GenerationGate::new(),
                loading: AtomicBool::new(false),
                empty: AtomicBool::new(false),
                observers: Mutex::new(Vec::new()),
            }),
            content: Mutex::new(Content::default()),
        })
    }
}
