/// Voice connection handles and playback completion futures
use super::ids::ChannelId;
use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;

/// Opaque handle to a live voice connection
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConnectionHandle {
    pub id: u64,
    pub channel: ChannelId,
}

impl ConnectionHandle {
    pub fn new(id: u64, channel: ChannelId) -> Self {
        Self { id, channel }
    }
}

/// How a started stream ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompletionOutcome {
    /// Stream played to the end
    Finished,

    /// Stream ended with an error (the queue still advances)
    Failed(String),

    /// Transport dropped the stream without reporting (stopped or torn down)
    Dropped,
}

/// Transport side of a completion channel
#[derive(Debug)]
pub struct CompletionSender(oneshot::Sender<Result<(), String>>);

impl CompletionSender {
    /// Report that the stream finished, successfully or not
    pub fn finish(self, result: Result<(), String>) {
        // The player may have detached already; nobody left to tell.
        let _ = self.0.send(result);
    }
}

/// Resolves once the stream started by `VoiceTransport::play` ends
#[derive(Debug)]
pub struct PlaybackCompletion(oneshot::Receiver<Result<(), String>>);

impl PlaybackCompletion {
    /// Create a linked sender/completion pair
    pub fn channel() -> (CompletionSender, PlaybackCompletion) {
        let (tx, rx) = oneshot::channel();
        (CompletionSender(tx), PlaybackCompletion(rx))
    }

    /// Wait for the stream to end
    pub async fn wait(self) -> CompletionOutcome {
        match self.0.await {
            Ok(Ok(())) => CompletionOutcome::Finished,
            Ok(Err(error)) => CompletionOutcome::Failed(error),
            Err(_) => CompletionOutcome::Dropped,
        }
    }
}
