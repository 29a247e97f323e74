use crate::errors::{ErrorKind, MiniDbError, MiniDbResult};
use crate::store::{Collections, Storage, StorageProvider};
use crossbeam::channel::{self, Receiver, Sender};
use parking_lot::{Condvar, Mutex};
use std::fmt::{Debug, Formatter};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

/// How mutations reach storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WriteMode {
    /// Snapshots are saved by a background thread; mutations return as soon
    /// as the snapshot is queued.
    #[default]
    Background,
    /// Snapshots are saved before the mutation returns.
    Synchronous,
}

type Callback = Box<dyn FnOnce(&MiniDbResult<()>) + Send>;

struct TicketState {
    result: Option<MiniDbResult<()>>,
    callbacks: Vec<Callback>,
}

struct TicketInner {
    state: Mutex<TicketState>,
    completed: Condvar,
}

/// Completion signal for one persistence write.
///
/// Every mutation returns a ticket. It completes once the snapshot taken by
/// that mutation, or a newer one, has been saved. A failed save completes the
/// ticket with the storage error; the in-memory change is kept either way.
#[derive(Clone)]
pub struct WriteTicket {
    inner: Arc<TicketInner>,
}

impl WriteTicket {
    pub(crate) fn pending() -> Self {
        WriteTicket {
            inner: Arc::new(TicketInner {
                state: Mutex::new(TicketState {
                    result: None,
                    callbacks: Vec::new(),
                }),
                completed: Condvar::new(),
            }),
        }
    }

    /// Creates a ticket that is already complete.
    pub fn completed(result: MiniDbResult<()>) -> Self {
        let ticket = WriteTicket::pending();
        ticket.complete(result);
        ticket
    }

    pub(crate) fn complete(&self, result: MiniDbResult<()>) {
        let callbacks = self.resolve(&result);
        run_callbacks(callbacks, &result);
    }

    /// Stores the outcome and wakes waiters. Returns the callbacks still to
    /// run; the first completion wins.
    fn resolve(&self, result: &MiniDbResult<()>) -> Vec<Callback> {
        let mut state = self.inner.state.lock();
        if state.result.is_some() {
            return Vec::new();
        }
        state.result = Some(result.clone());
        self.inner.completed.notify_all();
        std::mem::take(&mut state.callbacks)
    }

    /// Blocks until the write completes and returns its outcome.
    pub fn wait(&self) -> MiniDbResult<()> {
        let mut state = self.inner.state.lock();
        loop {
            if let Some(result) = &state.result {
                return result.clone();
            }
            self.inner.completed.wait(&mut state);
        }
    }

    /// Blocks for at most `timeout`. Returns `None` if the write is still
    /// pending.
    pub fn wait_timeout(&self, timeout: Duration) -> Option<MiniDbResult<()>> {
        let deadline = Instant::now() + timeout;
        let mut state = self.inner.state.lock();
        loop {
            if let Some(result) = &state.result {
                return Some(result.clone());
            }
            if self.inner.completed.wait_until(&mut state, deadline).timed_out() {
                return state.result.clone();
            }
        }
    }

    /// The outcome, if the write has completed.
    pub fn try_result(&self) -> Option<MiniDbResult<()>> {
        self.inner.state.lock().result.clone()
    }

    pub fn is_complete(&self) -> bool {
        self.inner.state.lock().result.is_some()
    }

    /// Runs `callback` with the outcome once the write completes, on the
    /// thread that completes it. Runs immediately if already complete.
    pub fn on_complete<F>(&self, callback: F)
    where
        F: FnOnce(&MiniDbResult<()>) + Send + 'static,
    {
        let result = {
            let mut state = self.inner.state.lock();
            match &state.result {
                Some(result) => result.clone(),
                None => {
                    state.callbacks.push(Box::new(callback));
                    return;
                }
            }
        };
        callback(&result);
    }
}

impl Debug for WriteTicket {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.try_result() {
            None => write!(f, "WriteTicket(pending)"),
            Some(Ok(())) => write!(f, "WriteTicket(ok)"),
            Some(Err(err)) => write!(f, "WriteTicket(failed: {})", err),
        }
    }
}

struct WriteJob {
    snapshot: Collections,
    ticket: WriteTicket,
}

/// Serializes snapshot saves onto one writer.
///
/// Jobs are saved strictly in enqueue order. When several snapshots are
/// waiting, only the newest is written and every waiting ticket completes
/// with that result, since it contains all earlier changes.
pub struct PersistenceWriter {
    storage: Storage,
    mode: WriteMode,
    sender: Mutex<Option<Sender<WriteJob>>>,
    handle: Mutex<Option<JoinHandle<()>>>,
    last_ticket: Mutex<Option<WriteTicket>>,
}

impl PersistenceWriter {
    pub fn new(storage: Storage, mode: WriteMode) -> MiniDbResult<Self> {
        let (sender, handle) = match mode {
            WriteMode::Synchronous => (None, None),
            WriteMode::Background => {
                let (sender, receiver) = channel::unbounded::<WriteJob>();
                let worker_storage = storage.clone();
                let handle = std::thread::Builder::new()
                    .name("minidb-writer".to_string())
                    .spawn(move || writer_loop(worker_storage, receiver))
                    .map_err(|err| {
                        log::error!("Failed to start persistence writer: {}", err);
                        MiniDbError::new_with_cause(
                            "Failed to start persistence writer",
                            ErrorKind::InternalError,
                            MiniDbError::from(err),
                        )
                    })?;
                (Some(sender), Some(handle))
            }
        };

        Ok(PersistenceWriter {
            storage,
            mode,
            sender: Mutex::new(sender),
            handle: Mutex::new(handle),
            last_ticket: Mutex::new(None),
        })
    }

    pub fn mode(&self) -> WriteMode {
        self.mode
    }

    /// Queues a snapshot for saving.
    pub fn enqueue(&self, snapshot: Collections) -> WriteTicket {
        let ticket = WriteTicket::pending();

        match self.mode {
            WriteMode::Synchronous => {
                ticket.complete(save_guarded(&self.storage, &snapshot));
            }
            WriteMode::Background => {
                let sender = self.sender.lock();
                let job = WriteJob {
                    snapshot,
                    ticket: ticket.clone(),
                };
                let sent = match sender.as_ref() {
                    Some(sender) => sender.send(job).is_ok(),
                    None => false,
                };
                if !sent {
                    log::error!("Persistence writer is closed, snapshot dropped");
                    ticket.complete(Err(MiniDbError::new(
                        "Persistence writer is closed",
                        ErrorKind::StoreAlreadyClosed,
                    )));
                }
            }
        }

        *self.last_ticket.lock() = Some(ticket.clone());
        ticket
    }

    /// Waits until every queued snapshot has been saved. Returns the outcome
    /// of the most recent save.
    pub fn flush(&self) -> MiniDbResult<()> {
        let last = self.last_ticket.lock().clone();
        match last {
            Some(ticket) => ticket.wait(),
            None => Ok(()),
        }
    }

    /// Drains the queue and stops the writer thread. Further snapshots are
    /// rejected.
    pub fn close(&self) {
        // dropping the sender ends the writer loop once the queue is empty
        drop(self.sender.lock().take());
        if let Some(handle) = self.handle.lock().take() {
            if handle.join().is_err() {
                log::error!("Persistence writer thread panicked");
            }
        }
    }
}

impl Drop for PersistenceWriter {
    fn drop(&mut self) {
        self.close();
    }
}

fn save_guarded(storage: &Storage, snapshot: &Collections) -> MiniDbResult<()> {
    match panic::catch_unwind(AssertUnwindSafe(|| storage.save(snapshot))) {
        Ok(result) => result,
        Err(_) => {
            log::error!("Storage {} panicked while saving", storage.location());
            Err(MiniDbError::new(
                "Storage panicked while saving",
                ErrorKind::InternalError,
            ))
        }
    }
}

fn run_callbacks(callbacks: Vec<Callback>, result: &MiniDbResult<()>) {
    for callback in callbacks {
        if panic::catch_unwind(AssertUnwindSafe(|| callback(result))).is_err() {
            log::error!("Write ticket callback panicked");
        }
    }
}

fn writer_loop(storage: Storage, receiver: Receiver<WriteJob>) {
    log::debug!("Persistence writer started for {}", storage.location());

    while let Ok(first) = receiver.recv() {
        let mut tickets = vec![first.ticket];
        let mut snapshot = first.snapshot;
        for job in receiver.try_iter() {
            tickets.push(job.ticket);
            snapshot = job.snapshot;
        }

        if tickets.len() > 1 {
            log::debug!("Coalesced {} queued snapshots into one save", tickets.len());
        }

        let result = save_guarded(&storage, &snapshot);
        if let Err(err) = &result {
            log::error!("Failed to persist snapshot to {}: {}", storage.location(), err);
        }
        // every ticket of the batch is resolved before any callback runs
        let callbacks: Vec<Callback> = tickets
            .iter()
            .flat_map(|ticket| ticket.resolve(&result))
            .collect();
        run_callbacks(callbacks, &result);
    }

    log::debug!("Persistence writer stopped for {}", storage.location());
}
