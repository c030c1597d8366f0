//! Persistence thread and bounded job queue (component C5).
//!
//! Grounded in `original_source/src/database.c`'s `loop()` function: the
//! thread opens one transaction at construction and keeps it open,
//! issuing `COMMIT;BEGIN;` on every `Commit` job and a final `COMMIT;` on
//! `Quit`. `original_source/src/save.c`'s direct-mutex-write model (no job
//! queue) is not used here since spec.md §4.5 explicitly calls for a
//! dedicated thread consuming a bounded FIFO.
//!
//! spec.md §9 notes this queue is "well-modeled as a bounded channel
//! carrying a tagged message variant" — `crossbeam-channel` (already a
//! teacher dependency) provides exactly that, so there is no hand-rolled
//! ring buffer here. QUIT/COMMIT get their own unbounded channel so they
//! are never blocked behind a full data queue (spec.md §4.5's "priority
//! flag lets QUIT/COMMIT insert at head").

mod store;

pub use store::{BlockRecord, PlayerRecord};

use crossbeam_channel::{bounded, unbounded, Receiver, Sender};
use parking_lot::Mutex;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread::JoinHandle;

#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("failed to open database: {0}")]
    OpenFailed(String),
    #[error("database statement failed: {0}")]
    StepFailed(String),
    #[error("persistence queue is full")]
    QueueFull,
}

#[derive(Debug, Clone)]
enum Job {
    Quit,
    Commit,
    PutPlayer(PlayerRecord),
    PutBlock(BlockRecord),
}

pub struct PersistenceHandle {
    data_tx: Sender<Job>,
    priority_tx: Sender<Job>,
    conn: Arc<Mutex<store::Store>>,
    thread: Option<JoinHandle<()>>,
}

impl PersistenceHandle {
    pub fn open(path: impl Into<PathBuf>, max_queued_jobs: usize) -> Result<Self, PersistenceError> {
        let path = path.into();
        let store = store::Store::open(&path)?;
        let conn = Arc::new(Mutex::new(store));

        let (data_tx, data_rx) = bounded::<Job>(max_queued_jobs);
        let (priority_tx, priority_rx) = unbounded::<Job>();

        let thread_conn = conn.clone();
        let thread = std::thread::Builder::new()
            .name("persistence".into())
            .spawn(move || run_persistence_loop(thread_conn, data_rx, priority_rx))
            .expect("failed to spawn persistence thread");

        Ok(PersistenceHandle { data_tx, priority_tx, conn, thread: Some(thread) })
    }

    /// Enqueues a world-edit write. Blocks the caller if the queue is full
    /// rather than dropping the edit (documented choice; see DESIGN.md) —
    /// spec.md §7 allows either behavior.
    pub fn put_block(&self, record: BlockRecord) {
        if self.data_tx.send(Job::PutBlock(record)).is_err() {
            log::error!("persistence thread gone, dropping block write {:?}", record);
        }
    }

    pub fn put_player(&self, record: PlayerRecord) {
        if self.data_tx.send(Job::PutPlayer(record)).is_err() {
            log::error!("persistence thread gone, dropping player write {:?}", record);
        }
    }

    /// Non-blocking enqueue variant for callers that would rather drop a
    /// write than stall (spec.md §7's alternative documented behavior).
    pub fn try_put_block(&self, record: BlockRecord) -> Result<(), PersistenceError> {
        self.data_tx.try_send(Job::PutBlock(record)).map_err(|_| PersistenceError::QueueFull)
    }

    pub fn commit(&self) {
        let _ = self.priority_tx.send(Job::Commit);
    }

    /// Synchronous read, bypassing the queue entirely (spec.md §4.5).
    pub fn get_player(&self, id: i64) -> Result<Option<PlayerRecord>, PersistenceError> {
        self.conn.lock().get_player(id)
    }

    /// Synchronous read, bypassing the queue entirely (spec.md §4.5).
    pub fn get_blocks(&self, cx: i32, cz: i32) -> Result<Vec<BlockRecord>, PersistenceError> {
        self.conn.lock().get_blocks(cx, cz)
    }
}

impl Drop for PersistenceHandle {
    fn drop(&mut self) {
        let _ = self.priority_tx.send(Job::Quit);
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

fn run_persistence_loop(conn: Arc<Mutex<store::Store>>, data_rx: Receiver<Job>, priority_rx: Receiver<Job>) {
    {
        let guard = conn.lock();
        if let Err(e) = guard.begin() {
            log::error!("persistence thread failed to open initial transaction: {e}");
            return;
        }
    }

    loop {
        let job = match priority_rx.try_recv() {
            Ok(job) => job,
            Err(_) => {
                crossbeam_channel::select! {
                    recv(priority_rx) -> job => match job {
                        Ok(job) => job,
                        Err(_) => Job::Quit,
                    },
                    recv(data_rx) -> job => match job {
                        Ok(job) => job,
                        Err(_) => Job::Quit,
                    },
                }
            }
        };

        let guard = conn.lock();
        match job {
            Job::Quit => {
                if let Err(e) = guard.commit_final() {
                    log::error!("persistence thread failed final commit: {e}");
                }
                return;
            }
            Job::Commit => {
                if let Err(e) = guard.commit_and_reopen() {
                    log::error!("persistence thread failed to commit/reopen transaction: {e}");
                }
            }
            Job::PutPlayer(record) => {
                if let Err(e) = guard.put_player(record) {
                    log::error!("dropping player write, statement failed: {e}");
                }
            }
            Job::PutBlock(record) => {
                if let Err(e) = guard.put_block(record) {
                    log::error!("dropping block write, statement failed: {e}");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn edit_persists_across_handle_restart() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("world.sqlite");

        {
            let handle = PersistenceHandle::open(&path, 16).unwrap();
            handle.put_block(BlockRecord { cx: 0, cz: 0, bx: 1, by: 2, bz: 3, block: 9 });
            handle.commit();
            std::thread::sleep(Duration::from_millis(50));
        }

        let handle = PersistenceHandle::open(&path, 16).unwrap();
        let blocks = handle.get_blocks(0, 0).unwrap();
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].block, 9);
    }

    #[test]
    fn repeated_put_block_leaves_single_row() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("world.sqlite");
        let handle = PersistenceHandle::open(&path, 16).unwrap();
        let rec = BlockRecord { cx: 2, cz: 2, bx: 4, by: 5, bz: 6, block: 1 };
        handle.put_block(rec);
        handle.put_block(BlockRecord { block: 2, ..rec });
        handle.commit();
        std::thread::sleep(Duration::from_millis(50));
        let blocks = handle.get_blocks(2, 2).unwrap();
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].block, 2);
    }
}
