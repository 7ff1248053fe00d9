/*!
 * Mount Resolver
 * Turns a mount specification into scheduled transfers and mounted stores
 */

use bytes::Bytes;
use parking_lot::Mutex;
use reqwest::Url;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::fetcher::{AssetFetcher, Materializer};
use super::mount_spec::{MountEntry, MountSpec};
use crate::core::errors::{LoaderError, LoaderResult};
use crate::vfs::{BuiltStore, MountKind, StoreFactory, VfsComposer};

/// Settlement state of one entry in specification order
enum Slot {
    Waiting,
    Ready(PathBuf, BuiltStore),
    Abandoned,
}

/// Applies settled entries to the composer strictly in specification order
///
/// An entry is committed only once every earlier entry has settled, so the
/// later of two overlapping entries always wins regardless of which
/// transfer finished first.
struct CommitQueue {
    composer: VfsComposer,
    slots: Vec<Slot>,
    next: usize,
    failures: Vec<(PathBuf, LoaderError)>,
}

impl CommitQueue {
    fn new(composer: VfsComposer, len: usize) -> Self {
        Self {
            composer,
            slots: (0..len).map(|_| Slot::Waiting).collect(),
            next: 0,
            failures: Vec::new(),
        }
    }

    fn settle(&mut self, index: usize, slot: Slot) {
        self.slots[index] = slot;

        while self.next < self.slots.len() {
            match std::mem::replace(&mut self.slots[self.next], Slot::Abandoned) {
                Slot::Waiting => {
                    self.slots[self.next] = Slot::Waiting;
                    break;
                }
                Slot::Ready(path, built) => {
                    debug!(index = self.next, path = %path.display(), "Committing entry");
                    if let Err(e) = self.composer.apply(&path, built) {
                        warn!(path = %path.display(), error = %e, "Failed to mount entry");
                        self.failures.push((path, e.into()));
                    }
                }
                Slot::Abandoned => {}
            }
            self.next += 1;
        }
    }

    fn is_drained(&self) -> bool {
        self.next == self.slots.len()
    }
}

/// Materializer bound to one entry's path and kind
struct EntryMaterializer {
    index: usize,
    path: PathBuf,
    kind: MountKind,
    factory: StoreFactory,
    queue: Arc<Mutex<CommitQueue>>,
}

impl Materializer for EntryMaterializer {
    fn materialize(self: Box<Self>, body: Bytes) -> LoaderResult<()> {
        let EntryMaterializer {
            index,
            path,
            kind,
            factory,
            queue,
        } = *self;

        let built = factory.create(kind, &path, Some(&body[..]));
        let mut queue = queue.lock();
        match built {
            Ok(built) => {
                queue.settle(index, Slot::Ready(path, built));
                Ok(())
            }
            Err(e) => {
                queue.settle(index, Slot::Abandoned);
                Err(e)
            }
        }
    }

    fn abandon(self: Box<Self>, reason: &str) {
        debug!(path = %self.path.display(), reason, "Entry abandoned");
        self.queue.lock().settle(self.index, Slot::Abandoned);
    }
}

/// Mount resolver
pub struct MountResolver {
    factory: StoreFactory,
    composer: VfsComposer,
    webroot: Option<Url>,
    queue: Option<Arc<Mutex<CommitQueue>>>,
}

impl MountResolver {
    pub fn new(factory: StoreFactory, composer: VfsComposer, webroot: Option<Url>) -> Self {
        Self {
            factory,
            composer,
            webroot,
            queue: None,
        }
    }

    /// Resolve a relative locator against the webroot
    ///
    /// Absolute URLs pass through. Without a webroot, a relative locator is
    /// taken as a local path.
    pub fn locate(&self, source: &str) -> LoaderResult<String> {
        if let Ok(url) = Url::parse(source) {
            return Ok(url.to_string());
        }
        match &self.webroot {
            Some(base) => base
                .join(source)
                .map(|u| u.to_string())
                .map_err(|e| LoaderError::InvalidSpec(format!("{source}: {e}"))),
            None => Ok(source.to_string()),
        }
    }

    /// Schedule or materialize every entry of `spec`
    ///
    /// Every locator is resolved and every sourceless store is built before
    /// the first transfer is scheduled, so a failing entry leaves no batch
    /// open. When nothing needs fetching the batch opens and closes before
    /// this returns.
    pub fn resolve(&mut self, spec: &MountSpec, fetcher: &mut AssetFetcher) -> LoaderResult<()> {
        let mut transfers = Vec::new();
        let mut local = Vec::new();

        for (index, entry) in spec.entries().iter().enumerate() {
            let MountEntry { path, kind, source } = entry;
            match source {
                Some(source) => transfers.push((index, path, *kind, self.locate(source)?)),
                None => {
                    debug!(path = %path.display(), kind = %kind, "Materializing entry");
                    local.push((index, path.clone(), self.factory.create(*kind, path, None)?));
                }
            }
        }

        let queue = Arc::new(Mutex::new(CommitQueue::new(self.composer.clone(), spec.len())));
        self.queue = Some(queue.clone());

        for (index, path, built) in local {
            queue.lock().settle(index, Slot::Ready(path, built));
        }

        for (index, path, kind, url) in transfers {
            debug!(path = %path.display(), kind = %kind, url = %url, "Scheduling entry");
            fetcher.schedule(
                url,
                Box::new(EntryMaterializer {
                    index,
                    path: path.clone(),
                    kind,
                    factory: self.factory.clone(),
                    queue: queue.clone(),
                }),
            );
        }

        info!(
            entries = spec.len(),
            transfers = fetcher.pending(),
            module_root = %self.composer.module_root(),
            "Mount specification resolved"
        );
        if fetcher.pending() == 0 {
            fetcher.close_empty();
        }
        Ok(())
    }

    /// Whether every entry of the last resolution has settled
    pub fn is_settled(&self) -> bool {
        self.queue.as_ref().map_or(true, |q| q.lock().is_drained())
    }

    /// Mount failures found while committing, drained
    pub fn take_commit_failures(&mut self) -> Vec<(PathBuf, LoaderError)> {
        self.queue
            .as_ref()
            .map(|q| std::mem::take(&mut q.lock().failures))
            .unwrap_or_default()
    }
}
