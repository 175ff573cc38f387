//! Background storage thread
//!
//! The worker owns the [`DocumentStore`] and is the only code that touches it.
//! Saves are debounced with `recv_timeout`: each `SAVE_CONTENT` replaces the
//! pending content and pushes the deadline out, and the write happens once the
//! channel has been quiet for the whole debounce window.

use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use thiserror::Error;

use super::protocol::{Envelope, WorkerRequest, WorkerResponse};
use super::store::{DocumentStore, StorageError};

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("storage worker has shut down")]
    Disconnected,
}

/// Message link between the main thread and a storage worker
pub trait WorkerTransport {
    fn post(&self, request: WorkerRequest) -> Result<(), TransportError>;

    /// Next inbound message, if one is waiting
    fn try_recv(&self) -> Option<WorkerResponse>;

    /// Block up to `timeout` for the next inbound message
    fn recv_timeout(&self, timeout: Duration) -> Option<WorkerResponse>;

    /// Stop the worker. Pending saves are written before this returns.
    fn terminate(&mut self);
}

/// Handle to the storage thread
pub struct StorageWorker {
    tx: Option<Sender<Envelope>>,
    rx: Receiver<WorkerResponse>,
    handle: Option<JoinHandle<()>>,
}

impl StorageWorker {
    pub fn spawn<S: DocumentStore>(
        store: S,
        slot: impl Into<String>,
        save_debounce: Duration,
    ) -> Result<Self, StorageError> {
        let slot = slot.into();
        let (request_tx, request_rx) = mpsc::channel();
        let (response_tx, response_rx) = mpsc::channel();

        let handle = thread::Builder::new()
            .name("markon-storage".into())
            .spawn(move || {
                WorkerLoop {
                    store,
                    slot,
                    save_debounce,
                    pending: None,
                }
                .run(request_rx, response_tx)
            })
            .map_err(StorageError::Spawn)?;

        tracing::debug!("Started storage worker");
        Ok(Self {
            tx: Some(request_tx),
            rx: response_rx,
            handle: Some(handle),
        })
    }
}

impl WorkerTransport for StorageWorker {
    fn post(&self, request: WorkerRequest) -> Result<(), TransportError> {
        let tx = self.tx.as_ref().ok_or(TransportError::Disconnected)?;
        tx.send(Envelope::Request(request))
            .map_err(|_| TransportError::Disconnected)
    }

    fn try_recv(&self) -> Option<WorkerResponse> {
        self.rx.try_recv().ok()
    }

    fn recv_timeout(&self, timeout: Duration) -> Option<WorkerResponse> {
        self.rx.recv_timeout(timeout).ok()
    }

    fn terminate(&mut self) {
        if let Some(tx) = self.tx.take() {
            let _ = tx.send(Envelope::Terminate);
        }
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::warn!("Storage worker panicked");
            } else {
                tracing::debug!("Storage worker stopped");
            }
        }
    }
}

impl Drop for StorageWorker {
    fn drop(&mut self) {
        self.terminate();
    }
}

struct PendingSave {
    content: String,
    deadline: Instant,
}

struct WorkerLoop<S> {
    store: S,
    slot: String,
    save_debounce: Duration,
    pending: Option<PendingSave>,
}

impl<S: DocumentStore> WorkerLoop<S> {
    fn run(mut self, rx: Receiver<Envelope>, tx: Sender<WorkerResponse>) {
        loop {
            let envelope = match self.pending.as_ref().map(|p| p.deadline) {
                Some(deadline) => {
                    let wait = deadline.saturating_duration_since(Instant::now());
                    match rx.recv_timeout(wait) {
                        Ok(envelope) => envelope,
                        Err(RecvTimeoutError::Timeout) => {
                            self.flush_pending();
                            continue;
                        }
                        Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
                None => match rx.recv() {
                    Ok(envelope) => envelope,
                    Err(_) => break,
                },
            };

            match envelope {
                Envelope::Request(WorkerRequest::SaveContent { content }) => {
                    self.pending = Some(PendingSave {
                        content,
                        deadline: Instant::now() + self.save_debounce,
                    });
                }
                Envelope::Request(WorkerRequest::FlushNow { content }) => {
                    self.pending = None;
                    self.write(&content);
                }
                Envelope::Request(WorkerRequest::LoadContent) => {
                    self.flush_pending();
                    let content = match self.store.read(&self.slot) {
                        Ok(content) => content.unwrap_or_default(),
                        Err(e) => {
                            tracing::warn!("Failed to read stored document: {}", e);
                            String::new()
                        }
                    };
                    tracing::debug!(bytes = content.len(), "Loaded stored document");
                    if tx.send(WorkerResponse::ContentLoaded { content }).is_err() {
                        break;
                    }
                }
                Envelope::Terminate => break,
            }
        }

        self.flush_pending();
    }

    fn flush_pending(&mut self) {
        if let Some(pending) = self.pending.take() {
            self.write(&pending.content);
        }
    }

    fn write(&mut self, content: &str) {
        if let Err(e) = self.store.write(&self.slot, content) {
            tracing::warn!("Failed to save document: {}", e);
        }
    }
}
