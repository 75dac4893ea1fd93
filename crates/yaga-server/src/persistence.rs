//! Best-effort persistence of joins and accepted messages.
//!
//! [`PersistenceLog`] is the single owner of every store mutation. Sessions and
//! the broadcaster enqueue commands and move on; a dedicated writer thread
//! applies them in order. Storage failures are logged and dropped, so a full
//! disk or a missing file never holds up chat delivery.
//!
//! Funnelling user-store rewrites (`remove_user`) through the same queue as
//! appends means a rewrite can never interleave with a concurrent append.

use std::thread;

use tokio::sync::{mpsc, oneshot};

use crate::storage::Store;

enum Command {
    RecordUser(String),
    RecordMessage(String),
    RemoveUser(String),
    Flush(oneshot::Sender<()>),
}

/// Handle to the persistence writer.
///
/// Clones are cheap and feed the same writer. The writer thread exits once
/// every handle is dropped and the queue is drained.
#[derive(Clone)]
pub struct PersistenceLog {
    tx: mpsc::UnboundedSender<Command>,
}

impl PersistenceLog {
    /// Start the writer thread owning `store`.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the OS refuses to spawn the thread.
    pub fn spawn<S: Store>(store: S) -> std::io::Result<Self> {
        let (tx, rx) = mpsc::unbounded_channel();

        thread::Builder::new()
            .name("yaga-persistence".to_string())
            .spawn(move || run_writer(&store, rx))?;

        Ok(Self { tx })
    }

    /// Append a joined user to the users store.
    pub fn record_user(&self, username: &str) {
        self.enqueue(Command::RecordUser(username.to_string()));
    }

    /// Append an accepted message to the messages store.
    pub fn record_message(&self, raw_line: &str) {
        self.enqueue(Command::RecordMessage(raw_line.to_string()));
    }

    /// Remove every users-store record carrying `username`.
    pub fn remove_user(&self, username: &str) {
        self.enqueue(Command::RemoveUser(username.to_string()));
    }

    /// Wait until every command enqueued before this call has been applied.
    pub async fn flush(&self) {
        let (done_tx, done_rx) = oneshot::channel();
        self.enqueue(Command::Flush(done_tx));
        // A dead writer drops the sender; nothing left to wait for either way
        let _ = done_rx.await;
    }

    fn enqueue(&self, command: Command) {
        if self.tx.send(command).is_err() {
            tracing::error!("Persistence writer has stopped, dropping record");
        }
    }
}

fn run_writer<S: Store>(store: &S, mut rx: mpsc::UnboundedReceiver<Command>) {
    while let Some(command) = rx.blocking_recv() {
        match command {
            Command::RecordUser(name) => match store.append_user(&name) {
                Ok(seq) => tracing::debug!(seq, user = %name, "Recorded user"),
                Err(e) => tracing::error!("Failed to record user {}: {}", name, e),
            },
            Command::RecordMessage(line) => {
                if let Err(e) = store.append_message(&line) {
                    tracing::error!("Failed to record message: {}", e);
                }
            },
            Command::RemoveUser(name) => match store.remove_user(&name) {
                Ok(removed) => tracing::debug!(removed, user = %name, "Removed user records"),
                Err(e) => tracing::error!("Failed to remove user {}: {}", name, e),
            },
            Command::Flush(done) => {
                let _ = done.send(());
            },
        }
    }

    tracing::debug!("Persistence writer stopped");
}
