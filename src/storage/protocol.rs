//! Messages exchanged with the storage worker
//!
//! Serialized as JSON objects tagged by `type`, e.g.
//! `{"type":"SAVE_CONTENT","content":"# Notes"}`.

use serde::{Deserialize, Serialize};

/// Main thread -> worker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkerRequest {
    /// Read the stored document; answered with [`WorkerResponse::ContentLoaded`]
    LoadContent,
    /// Debounced save of the latest content
    SaveContent { content: String },
    /// Immediate save, used when the host is about to go away
    FlushNow { content: String },
}

/// Worker -> main thread
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkerResponse {
    /// Stored content, empty when nothing was stored
    ContentLoaded { content: String },
}

impl WorkerRequest {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::LoadContent => "LOAD_CONTENT",
            Self::SaveContent { .. } => "SAVE_CONTENT",
            Self::FlushNow { .. } => "FLUSH_NOW",
        }
    }
}

/// What actually travels over the worker channel
#[derive(Debug)]
pub(crate) enum Envelope {
    Request(WorkerRequest),
    /// Flush pending work and exit
    Terminate,
}
