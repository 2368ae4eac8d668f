use std::sync::Arc;
use tokio::{sync::mpsc, task::JoinHandle};

use crate::{
    error::AppResult,
    models::{Player, RoomChange, Session},
};

/// Durable store for room records
#[async_trait::async_trait]
pub trait RoomSink: Send + Sync {
    async fn upsert_session(&self, session: &Session) -> AppResult<()>;

    async fn upsert_player(&self, player: &Player) -> AppResult<()>;
}

/// Write-behind queue of room changes.
///
/// Changes are written one at a time in the order they were recorded, so a
/// session row always lands before the player rows that reference it.
#[derive(Clone)]
pub struct Journal {
    tx: mpsc::UnboundedSender<RoomChange>,
}

/// Stops the journal writer once its queue is flushed
pub struct JournalHandle {
    shutdown_tx: mpsc::Sender<()>,
    task: JoinHandle<()>,
}

impl JournalHandle {
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(()).await;
        if let Err(e) = self.task.await {
            tracing::error!(error = %e, "Journal writer task panicked");
        }
    }
}

impl Journal {
    /// Creates the journal and spawns its writer task
    pub fn spawn(sink: Arc<dyn RoomSink>) -> (Self, JournalHandle) {
        let (tx, rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);

        let task = tokio::spawn(Self::writer_task(sink, rx, shutdown_rx));

        (Self { tx }, JournalHandle { shutdown_tx, task })
    }

    /// Queues a change without waiting on the store
    pub fn record(&self, change: RoomChange) {
        if self.tx.send(change).is_err() {
            tracing::error!("Journal writer is gone, dropping room change");
        }
    }

    async fn writer_task(
        sink: Arc<dyn RoomSink>,
        mut rx: mpsc::UnboundedReceiver<RoomChange>,
        mut shutdown_rx: mpsc::Receiver<()>,
    ) {
        tracing::info!("Journal writer task started");

        loop {
            tokio::select! {
                change = rx.recv() => match change {
                    Some(change) => Self::write(sink.as_ref(), change).await,
                    None => break,
                },
                _ = shutdown_rx.recv() => {
                    rx.close();
                    let mut flushed = 0usize;
                    while let Some(change) = rx.recv().await {
                        Self::write(sink.as_ref(), change).await;
                        flushed += 1;
                    }
                    tracing::info!(flushed, "Journal writer task stopped");
                    break;
                }
            }
        }
    }

    async fn write(sink: &dyn RoomSink, change: RoomChange) {
        let result = match &change {
            RoomChange::Session(session) => sink.upsert_session(session).await,
            RoomChange::Player(player) => sink.upsert_player(player).await,
        };

        if let Err(e) = result {
            match change {
                RoomChange::Session(session) => {
                    tracing::error!(error = %e, session_id = %session.id, "Failed to persist session")
                }
                RoomChange::Player(player) => tracing::error!(
                    error = %e,
                    player_session_id = %player.player_session_id,
                    "Failed to persist player"
                ),
            }
        }
    }
}
