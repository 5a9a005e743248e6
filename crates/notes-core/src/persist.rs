//! Persister: serializes saves of the note list.
//!
//! Each save runs on its own spawned task so it completes even if the caller
//! stops awaiting it. Tasks write one at a time behind a single gate, and a
//! snapshot older than one already written is dropped (last write wins).
//! `flush()` waits for every outstanding save.

use crate::note::Note;
use crate::storage::{NoteStorage, Result, StorageError};
use futures::future::join_all;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::{oneshot, Mutex as AsyncMutex};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

pub(crate) struct Persister<S: NoteStorage + 'static> {
    storage: Arc<S>,
    /// Generation of the newest snapshot that reached storage
    written: Arc<AsyncMutex<u64>>,
    issued: AtomicU64,
    in_flight: Mutex<Vec<JoinHandle<()>>>,
}

impl<S: NoteStorage + 'static> Persister<S> {
    pub fn new(storage: Arc<S>) -> Self {
        Self {
            storage,
            written: Arc::new(AsyncMutex::new(0)),
            issued: AtomicU64::new(0),
            in_flight: Mutex::new(Vec::new()),
        }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Persist `snapshot` and wait for the outcome.
    ///
    /// Dropping the returned future does not cancel the write.
    pub async fn save(&self, snapshot: Vec<Note>) -> Result<()> {
        let generation = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
        let storage = Arc::clone(&self.storage);
        let written = Arc::clone(&self.written);
        let (tx, rx) = oneshot::channel();

        let handle = tokio::spawn(async move {
            let result = write_snapshot(storage.as_ref(), &written, generation, snapshot).await;
            // Receiver is gone if the caller stopped waiting
            let _ = tx.send(result);
        });
        self.track(handle);

        rx.await
            .unwrap_or_else(|_| Err(StorageError::Unavailable("save task aborted".to_string())))
    }

    /// Wait for every save issued so far.
    pub async fn flush(&self) {
        let handles = std::mem::take(&mut *self.in_flight.lock().unwrap_or_else(|e| e.into_inner()));
        if handles.is_empty() {
            return;
        }
        debug!("Flushing {} outstanding save(s)", handles.len());
        for result in join_all(handles).await {
            if let Err(e) = result {
                warn!("Save task ended abnormally: {}", e);
            }
        }
    }

    fn track(&self, handle: JoinHandle<()>) {
        let mut in_flight = self.in_flight.lock().unwrap_or_else(|e| e.into_inner());
        in_flight.retain(|h| !h.is_finished());
        in_flight.push(handle);
    }
}

async fn write_snapshot<S: NoteStorage + ?Sized>(
    storage: &S,
    written: &AsyncMutex<u64>,
    generation: u64,
    snapshot: Vec<Note>,
) -> Result<()> {
    let mut last = written.lock().await;
    if *last > generation {
        debug!(
            "Skipping stale snapshot {} (snapshot {} already written)",
            generation, *last
        );
        return Ok(());
    }
    storage.save_all(&snapshot).await?;
    *last = generation;
    debug!("Saved snapshot {} ({} notes)", generation, snapshot.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::InMemoryStorage;
    use async_trait::async_trait;
    use std::time::Duration;

    /// Storage whose writes take a while, recording overlap
    struct SlowStorage {
        inner: InMemoryStorage,
        active: std::sync::atomic::AtomicUsize,
        max_active: std::sync::atomic::AtomicUsize,
    }

    #[async_trait]
    impl NoteStorage for SlowStorage {
        async fn load_all(&self) -> Result<Vec<Note>> {
            self.inner.load_all().await
        }

        async fn save_all(&self, notes: &[Note]) -> Result<()> {
            let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_active.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            let result = self.inner.save_all(notes).await;
            self.active.fetch_sub(1, Ordering::SeqCst);
            result
        }

        async fn export_to(&self, destination: &str, notes: &[Note]) -> Result<()> {
            self.inner.export_to(destination, notes).await
        }

        async fn import_from(&self, source: &str) -> Result<Vec<Note>> {
            self.inner.import_from(source).await
        }
    }

    fn slow() -> Arc<SlowStorage> {
        Arc::new(SlowStorage {
            inner: InMemoryStorage::new(),
            active: Default::default(),
            max_active: Default::default(),
        })
    }

    #[tokio::test]
    async fn test_saves_never_overlap() {
        let storage = slow();
        let persister = Persister::new(Arc::clone(&storage));

        let a = persister.save(vec![Note::new()]);
        let b = persister.save(vec![Note::new(), Note::new()]);
        let c = persister.save(vec![Note::new(), Note::new(), Note::new()]);
        let (a, b, c) = tokio::join!(a, b, c);
        assert!(a.is_ok() && b.is_ok() && c.is_ok());

        assert_eq!(storage.max_active.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_dropped_save_still_completes_on_flush() {
        let storage = slow();
        let persister = Persister::new(Arc::clone(&storage));

        let note = Note::new();
        let pending = persister.save(vec![note.clone()]);
        // Poll once so the task is spawned, then stop waiting
        let _ = tokio::time::timeout(Duration::from_millis(1), pending).await;

        persister.flush().await;
        assert_eq!(storage.inner.stored(), vec![note]);
    }

    #[tokio::test]
    async fn test_failed_save_is_reported() {
        let storage = Arc::new(InMemoryStorage::new());
        storage.set_fail_writes(true);
        let persister = Persister::new(Arc::clone(&storage));

        let result = persister.save(vec![Note::new()]).await;
        assert!(matches!(result, Err(StorageError::Unavailable(_))));

        storage.set_fail_writes(false);
        assert!(persister.save(vec![Note::new()]).await.is_ok());
        assert_eq!(storage.save_count(), 1);
    }

    #[tokio::test]
    async fn test_stale_snapshot_is_skipped() {
        let storage = InMemoryStorage::new();
        let written = AsyncMutex::new(0);

        let newer = vec![Note::new(), Note::new()];
        write_snapshot(&storage, &written, 2, newer.clone()).await.unwrap();
        write_snapshot(&storage, &written, 1, vec![Note::new()]).await.unwrap();

        assert_eq!(storage.stored(), newer);
        assert_eq!(storage.save_count(), 1);
    }
}
