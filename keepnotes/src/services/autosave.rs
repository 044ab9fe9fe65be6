//! Debounced autosave
//!
//! Edits to an already-persisted note are coalesced: each new snapshot
//! restarts the debounce window, and only the latest snapshot is saved once
//! the window passes quietly. Saves are dispatched in order, so the newest
//! snapshot always lands last (last write wins, no field merging).

use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use super::NotesService;
use crate::api::Note;

/// Save state of one open note
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveState {
    /// Everything is persisted
    Clean,
    /// There are edits the service has not seen
    Dirty,
    /// A save is in flight and no edit arrived since it was dispatched
    Saving,
}

impl SaveState {
    pub fn on_edit(self) -> Self {
        SaveState::Dirty
    }

    pub fn on_save_started(self) -> Self {
        SaveState::Saving
    }

    /// A completion only cleans the state if nothing changed meanwhile
    pub fn on_save_finished(self, success: bool) -> Self {
        match (self, success) {
            (SaveState::Saving, true) => SaveState::Clean,
            (SaveState::Saving, false) => SaveState::Dirty,
            (other, _) => other,
        }
    }
}

struct Shared {
    state: watch::Sender<SaveState>,
    last_error: Mutex<Option<String>>,
    last_saved: Mutex<Option<Note>>,
}

impl Shared {
    fn transition(&self, f: impl FnOnce(SaveState) -> SaveState) {
        self.state.send_modify(|state| *state = f(*state));
    }
}

/// Debounced autosave worker for one open note
pub struct Autosaver {
    shared: Arc<Shared>,
    tx: mpsc::UnboundedSender<Note>,
    task: JoinHandle<()>,
}

impl Autosaver {
    /// Spawn the worker on the current tokio runtime
    pub fn spawn(service: NotesService, delay: Duration) -> Self {
        let (state, _) = watch::channel(SaveState::Clean);
        let shared = Arc::new(Shared {
            state,
            last_error: Mutex::new(None),
            last_saved: Mutex::new(None),
        });
        let (tx, rx) = mpsc::unbounded_channel();

        let task = tokio::spawn(run(service, delay, rx, Arc::clone(&shared)));

        Self { shared, tx, task }
    }

    /// Queue a snapshot of an edited note.
    ///
    /// Only notes that already exist on the service are autosaved; returns
    /// false (and does nothing) for unsaved notes.
    pub fn schedule(&self, note: Note) -> bool {
        if !note.is_persisted() {
            tracing::debug!("Skipping autosave for unsaved note");
            return false;
        }

        self.shared.transition(SaveState::on_edit);
        if self.tx.send(note).is_err() {
            tracing::warn!("Autosave worker stopped; edit not queued");
            return false;
        }
        true
    }

    pub fn state(&self) -> SaveState {
        *self.shared.state.borrow()
    }

    /// Watch state transitions
    pub fn subscribe(&self) -> watch::Receiver<SaveState> {
        self.shared.state.subscribe()
    }

    /// Message of the most recent failed save, cleared by the next success
    pub fn last_error(&self) -> Option<String> {
        self.shared.last_error.lock().ok().and_then(|e| e.clone())
    }

    /// Record returned by the most recent successful save
    pub fn last_saved(&self) -> Option<Note> {
        self.shared.last_saved.lock().ok().and_then(|n| n.clone())
    }

    /// Wait until the state reaches `Clean`
    pub async fn wait_clean(&self) {
        let mut rx = self.subscribe();
        // Only fails if the sender is gone, which cannot happen while self is alive
        let _ = rx.wait_for(|state| *state == SaveState::Clean).await;
    }

    /// Close the editor: a snapshot still waiting out its debounce window is
    /// discarded, a save already dispatched still completes.
    pub fn discard(self) {
        tracing::debug!("Discarding autosaver in state {:?}", self.state());
        self.task.abort();
    }
}

impl Drop for Autosaver {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn run(
    service: NotesService,
    delay: Duration,
    mut rx: mpsc::UnboundedReceiver<Note>,
    shared: Arc<Shared>,
) {
    let mut in_flight: Option<JoinHandle<()>> = None;

    while let Some(mut pending) = rx.recv().await {
        // Debounce: keep taking newer snapshots until the window passes quietly
        loop {
            tokio::select! {
                next = rx.recv() => match next {
                    Some(note) => pending = note,
                    None => return,
                },
                _ = tokio::time::sleep(delay) => break,
            }
        }

        if let Some(previous) = in_flight.take() {
            let _ = previous.await;
        }

        shared.transition(SaveState::on_save_started);
        let service = service.clone();
        let shared = Arc::clone(&shared);
        in_flight = Some(tokio::spawn(async move {
            let result = service.save_note(&pending).await;
            let success = result.is_ok();
            match result {
                Ok(saved) => {
                    tracing::debug!("Autosaved note {:?}", saved.id);
                    if let Ok(mut error) = shared.last_error.lock() {
                        *error = None;
                    }
                    if let Ok(mut last) = shared.last_saved.lock() {
                        *last = Some(saved);
                    }
                }
                Err(e) => {
                    tracing::error!("Autosave failed: {}", e);
                    if let Ok(mut error) = shared.last_error.lock() {
                        *error = Some(e.to_string());
                    }
                }
            }
            shared.transition(|state| state.on_save_finished(success));
        }));
    }

    if let Some(previous) = in_flight.take() {
        let _ = previous.await;
    }
}
