//! Background persistence of the document
//!
//! [`PersistenceChannel`] lives on the main thread and forwards every content
//! change to a [`StorageWorker`] over a message channel, so disk I/O never
//! blocks editing. Inbound `CONTENT_LOADED` messages are drained by [`poll`],
//! the same try_recv pattern the editor uses for its async file loads.
//!
//! When no store can be opened (or the worker thread cannot start) the channel
//! runs disabled: one warning, and every operation becomes a no-op.
//!
//! [`poll`]: PersistenceChannel::poll

mod protocol;
mod store;
mod worker;

pub use protocol::{WorkerRequest, WorkerResponse};
pub use store::{DocumentStore, FileStore, MemoryStore, StorageError};
pub use worker::{StorageWorker, TransportError, WorkerTransport};

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use crate::config::{StorageConfig, DEFAULT_STORAGE_SLOT};
use crate::document::ContentStore;

type SharedTransport = Rc<RefCell<Option<Box<dyn WorkerTransport>>>>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistenceOptions {
    /// Slot the document is stored under
    pub slot: String,
    /// Quiet period before the worker writes a save
    pub save_debounce: Duration,
    /// Boot parameters supplied the document; stored content must not replace it
    pub external_boot_content: bool,
}

impl Default for PersistenceOptions {
    fn default() -> Self {
        Self {
            slot: DEFAULT_STORAGE_SLOT.to_string(),
            save_debounce: Duration::from_millis(300),
            external_boot_content: false,
        }
    }
}

impl PersistenceOptions {
    pub fn from_config(config: &StorageConfig, external_boot_content: bool) -> Self {
        Self {
            slot: config.slot.clone(),
            save_debounce: config.save_debounce(),
            external_boot_content,
        }
    }
}

/// Host visibility, as reported by the windowing layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Visible,
    Hidden,
}

pub struct PersistenceChannel {
    content: Rc<dyn ContentStore>,
    worker: SharedTransport,
    external_boot_content: bool,
    hooks_attached: bool,
}

impl PersistenceChannel {
    /// Start a storage worker over `store`.
    ///
    /// A failed store or worker spawn disables persistence instead of failing.
    pub fn new<S: DocumentStore>(
        content: Rc<dyn ContentStore>,
        store: Result<S, StorageError>,
        options: PersistenceOptions,
    ) -> Self {
        let worker = store.and_then(|store| {
            StorageWorker::spawn(store, options.slot.clone(), options.save_debounce)
        });

        match worker {
            Ok(worker) => Self::with_transport(content, Box::new(worker), options),
            Err(e) => {
                tracing::warn!("Persistence disabled: {}", e);
                Self::disabled(content, options)
            }
        }
    }

    /// Use an existing transport (tests, alternative hosts)
    pub fn with_transport(
        content: Rc<dyn ContentStore>,
        transport: Box<dyn WorkerTransport>,
        options: PersistenceOptions,
    ) -> Self {
        let worker: SharedTransport = Rc::new(RefCell::new(Some(transport)));

        let weak = Rc::downgrade(&worker);
        content.on_content_changed(Box::new(move |text: &str| {
            let Some(worker) = weak.upgrade() else {
                return;
            };
            let worker = worker.borrow();
            if let Some(worker) = worker.as_ref() {
                let request = WorkerRequest::SaveContent {
                    content: text.to_string(),
                };
                if let Err(e) = worker.post(request) {
                    tracing::debug!("Dropping save: {}", e);
                }
            }
        }));

        Self {
            content,
            worker,
            external_boot_content: options.external_boot_content,
            hooks_attached: true,
        }
    }

    fn disabled(content: Rc<dyn ContentStore>, options: PersistenceOptions) -> Self {
        Self {
            content,
            worker: Rc::new(RefCell::new(None)),
            external_boot_content: options.external_boot_content,
            hooks_attached: false,
        }
    }

    /// A worker is attached and accepting messages
    pub fn is_enabled(&self) -> bool {
        self.worker.borrow().is_some()
    }

    /// Visibility and unload hooks are registered
    pub fn lifecycle_hooks_attached(&self) -> bool {
        self.hooks_attached
    }

    fn post(&self, request: WorkerRequest) {
        let worker = self.worker.borrow();
        let Some(worker) = worker.as_ref() else {
            return;
        };
        let kind = request.kind();
        match worker.post(request) {
            Ok(()) => tracing::trace!(kind, "Posted to storage worker"),
            Err(e) => tracing::warn!(kind, "Storage worker unreachable: {}", e),
        }
    }

    /// Ask the worker for the stored document; the reply arrives via [`Self::poll`]
    pub fn load(&self) {
        self.post(WorkerRequest::LoadContent);
    }

    /// Apply every message the worker has sent. Returns how many changed the document.
    pub fn poll(&self) -> usize {
        let mut responses = Vec::new();
        {
            let worker = self.worker.borrow();
            let Some(worker) = worker.as_ref() else {
                return 0;
            };
            while let Some(response) = worker.try_recv() {
                responses.push(response);
            }
        }

        // Borrow released: set_content re-enters the save subscription
        responses
            .into_iter()
            .filter(|response| self.apply(response))
            .count()
    }

    /// Block until the first worker reply (or `timeout`) and apply it
    pub fn wait_for_load(&self, timeout: Duration) -> bool {
        let response = {
            let worker = self.worker.borrow();
            match worker.as_ref() {
                Some(worker) => worker.recv_timeout(timeout),
                None => return false,
            }
        };

        match response {
            Some(response) => self.apply(&response),
            None => {
                tracing::debug!("No stored document arrived within {:?}", timeout);
                false
            }
        }
    }

    fn apply(&self, response: &WorkerResponse) -> bool {
        match response {
            WorkerResponse::ContentLoaded { content } => {
                if self.external_boot_content {
                    tracing::debug!("Ignoring stored document, boot content takes precedence");
                    return false;
                }
                if content.is_empty() {
                    return false;
                }
                tracing::info!(bytes = content.len(), "Restored stored document");
                self.content.set_content(content);
                true
            }
        }
    }

    /// Flush immediately when the host is hidden
    pub fn handle_visibility_change(&self, visibility: Visibility) {
        if self.hooks_attached && visibility == Visibility::Hidden {
            self.flush_now();
        }
    }

    /// Flush immediately before the host goes away
    pub fn handle_before_unload(&self) {
        if self.hooks_attached {
            self.flush_now();
        }
    }

    fn flush_now(&self) {
        self.post(WorkerRequest::FlushNow {
            content: self.content.get_content(),
        });
    }

    /// Stop the worker (writing any pending save) and detach lifecycle hooks
    pub fn cleanup(&mut self) {
        self.hooks_attached = false;
        let worker = self.worker.borrow_mut().take();
        if let Some(mut worker) = worker {
            worker.terminate();
            tracing::debug!("Persistence channel cleaned up");
        }
    }
}

impl Drop for PersistenceChannel {
    fn drop(&mut self) {
        self.cleanup();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;
    use std::time::Instant;

    const SLOT: &str = "markon-content";

    fn wait_until(mut done: impl FnMut() -> bool) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while !done() && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn test_loaded_content_is_applied() {
        let doc = Rc::new(Document::new(""));
        let store = MemoryStore::with_slot(SLOT, "# Restored");
        let channel = PersistenceChannel::new(doc.clone(), Ok(store), PersistenceOptions::default());

        channel.load();
        assert!(channel.wait_for_load(Duration::from_secs(5)));
        assert_eq!(doc.get_content(), "# Restored");
    }

    #[test]
    fn test_edits_reach_the_store_on_cleanup() {
        let doc = Rc::new(Document::new(""));
        let store = MemoryStore::new();
        let mut channel =
            PersistenceChannel::new(doc.clone(), Ok(store.clone()), PersistenceOptions::default());

        doc.set_content("draft one");
        doc.set_content("draft two");
        channel.cleanup();

        assert_eq!(store.get(SLOT).as_deref(), Some("draft two"));
        assert!(!channel.is_enabled());
        assert!(!channel.lifecycle_hooks_attached());
    }

    #[test]
    fn test_unavailable_store_disables_persistence() {
        let doc = Rc::new(Document::new("keep me"));
        let channel = PersistenceChannel::new(
            doc.clone(),
            Err::<MemoryStore, _>(StorageError::Unavailable),
            PersistenceOptions::default(),
        );

        assert!(!channel.is_enabled());
        channel.load();
        channel.handle_before_unload();
        assert_eq!(channel.poll(), 0);
        assert_eq!(doc.get_content(), "keep me");
    }

    #[test]
    fn test_poll_drains_asynchronously() {
        let doc = Rc::new(Document::new(""));
        let store = MemoryStore::with_slot(SLOT, "stored");
        let channel = PersistenceChannel::new(doc.clone(), Ok(store), PersistenceOptions::default());

        channel.load();
        let mut applied = 0;
        wait_until(|| {
            applied += channel.poll();
            applied > 0
        });
        assert_eq!(applied, 1);
        assert_eq!(doc.get_content(), "stored");
    }
}
