//! Stream emitter — the ordered, append-only event channel between the
//! controller and the SSE response.

use serde::Serialize;
use thiserror::Error;
use tokio::sync::mpsc;

/// Bounded so a slow consumer applies backpressure instead of buffering reviews.
pub const STREAM_BUFFER: usize = 16;

/// Lifecycle events of one generation request, serialized as
/// `{"type": "<kind>", ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StreamEvent {
    Total { total: usize },
    Review { id: String, content: String },
    Completed { generated: usize },
    Error { message: String },
}

/// The consumer hung up. The controller stops as soon as it sees this.
#[derive(Debug, Error)]
#[error("event stream consumer disconnected")]
pub struct Disconnected;

/// Producer half of the event channel. Emits in call order, no batching.
///
/// Once `completed` has been emitted the controller drops the emitter,
/// which closes the stream.
pub struct StreamEmitter {
    tx: mpsc::Sender<StreamEvent>,
}

impl StreamEmitter {
    pub fn channel() -> (Self, mpsc::Receiver<StreamEvent>) {
        let (tx, rx) = mpsc::channel(STREAM_BUFFER);
        (Self { tx }, rx)
    }

    pub async fn emit(&self, event: StreamEvent) -> Result<(), Disconnected> {
        self.tx.send(event).await.map_err(|_| Disconnected)
    }

    /// True once the consumer has dropped its receiver.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    /// Resolves when the consumer drops its receiver.
    pub async fn closed(&self) {
        self.tx.closed().await
    }
}
