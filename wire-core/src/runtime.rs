//! Per-peer runtime: a dedicated reader thread plus a serialized work queue,
//! modeled on the reference client's `listen` goroutine and `internal/cq`
//! concurrent queue. The reader thread only ever turns socket activity into
//! closures pushed onto the queue; a single consumer (whichever thread calls
//! [`PeerRuntime::dispatch_pending`], `flush`, `round_trip` or the implicit
//! drain on drop) runs them, so no two closures ever execute concurrently
//! for one peer.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::thread::JoinHandle;

use crate::error::WireError;
use crate::object::Dispatch;
use crate::socket::Connection;
use crate::store::ObjectStore;

type Job = Box<dyn FnOnce() -> Result<(), WireError> + Send>;

struct Queue {
    jobs: Mutex<VecDeque<Job>>,
    cond: Condvar,
    closed: AtomicBool,
}

impl Queue {
    fn new() -> Self {
        Queue {
            jobs: Mutex::new(VecDeque::new()),
            cond: Condvar::new(),
            closed: AtomicBool::new(false),
        }
    }

    fn push(&self, job: Job) {
        let mut jobs = self.jobs.lock().unwrap();
        jobs.push_back(job);
        self.cond.notify_all();
    }

    /// Drain every job currently queued, running each in order. Does not
    /// block waiting for new jobs to appear.
    fn drain_available(&self) -> Result<(), WireError> {
        loop {
            let job = {
                let mut jobs = self.jobs.lock().unwrap();
                jobs.pop_front()
            };
            match job {
                Some(job) => job()?,
                None => return Ok(()),
            }
        }
    }

    fn stop(&self) {
        self.closed.store(true, Ordering::SeqCst);
        self.cond.notify_all();
    }
}

/// Drives the reader side of one peer connection: a background thread reads
/// whole messages off the socket and turns each into a dispatch closure on
/// the shared queue; callers drain the queue from whichever thread owns the
/// event loop.
type SyncWaiter = Arc<(Mutex<bool>, Condvar)>;

pub struct PeerRuntime<Data: Send + Sync + 'static> {
    queue: Arc<Queue>,
    conn: Arc<Mutex<Connection>>,
    store: Arc<ObjectStore<Data>>,
    reader: Option<JoinHandle<()>>,
    stopped: Arc<AtomicBool>,
    pending_syncs: Mutex<HashMap<u32, SyncWaiter>>,
}

impl<Data: Send + Sync + 'static> PeerRuntime<Data> {
    pub fn new(conn: Connection, store: Arc<ObjectStore<Data>>) -> Self {
        let queue = Arc::new(Queue::new());
        let conn = Arc::new(Mutex::new(conn));
        let stopped = Arc::new(AtomicBool::new(false));

        let reader = {
            let queue = queue.clone();
            let conn = conn.clone();
            let store = store.clone();
            let stopped = stopped.clone();
            std::thread::spawn(move || read_loop(conn, store, queue, stopped))
        };

        PeerRuntime {
            queue,
            conn,
            store,
            reader: Some(reader),
            stopped,
            pending_syncs: Mutex::new(HashMap::new()),
        }
    }

    pub fn store(&self) -> &Arc<ObjectStore<Data>> {
        &self.store
    }

    /// Queue an outbound message for sending on the next flush.
    pub fn enqueue_send(&self, builder: crate::builder::MessageBuilder) {
        let conn = self.conn.clone();
        self.queue.push(Box::new(move || {
            conn.lock().unwrap().queue_send(builder)
        }));
    }

    /// Run every closure currently on the queue (both inbound dispatch and
    /// outbound sends), then flush the socket. Does not block on new
    /// incoming data.
    pub fn flush(&self) -> Result<(), WireError> {
        self.queue.drain_available()?;
        self.conn.lock().unwrap().flush()
    }

    /// Register a waiter keyed by `sync_id` — the id of the `wl_callback`
    /// object the peer is expected to send a `done` event for — then run
    /// `send_sync` to build and queue the request that asks for it. The
    /// generated `wl_callback` binding's listener calls
    /// [`PeerRuntime::complete_sync`] with that same id when `done` is
    /// dispatched, which is what unblocks this call.
    ///
    /// `sync_id` is the caller's to choose (typically a freshly allocated
    /// [`crate::store::ObjectStore`] id already inserted with a handler that
    /// calls `complete_sync`); it is not generated here, since the object id
    /// and the correlation token must be the same value for the handler to
    /// find this waiter at all.
    ///
    /// Drains the queue (both inbound dispatch and outbound sends) while
    /// waiting, so a single-threaded caller still makes progress, then
    /// blocks until the matching callback fires. Mirrors the reference
    /// client's `RoundTrip`.
    pub fn round_trip<F>(&self, sync_id: u32, send_sync: F) -> Result<(), WireError>
    where
        F: FnOnce() -> crate::builder::MessageBuilder,
    {
        let waiter: SyncWaiter = Arc::new((Mutex::new(false), Condvar::new()));
        self.pending_syncs.lock().unwrap().insert(sync_id, waiter.clone());

        let builder = send_sync();
        self.enqueue_send(builder);
        self.flush()?;

        let (lock, cvar) = &*waiter;
        let mut finished = lock.lock().unwrap();
        while !*finished {
            if self.stopped.load(Ordering::SeqCst) {
                self.pending_syncs.lock().unwrap().remove(&sync_id);
                return Err(WireError::Closed);
            }
            self.queue.drain_available()?;
            if *finished {
                break;
            }
            let (guard, _timeout) = cvar
                .wait_timeout(finished, std::time::Duration::from_millis(10))
                .unwrap();
            finished = guard;
        }
        Ok(())
    }

    /// Called by the `wl_callback` binding's dispatch handler once the
    /// `done` event for `sync_id` has arrived, unblocking the matching
    /// [`PeerRuntime::round_trip`] call.
    pub fn complete_sync(&self, sync_id: u32) {
        if let Some(waiter) = self.pending_syncs.lock().unwrap().remove(&sync_id) {
            let (lock, cvar) = &*waiter;
            *lock.lock().unwrap() = true;
            cvar.notify_all();
        }
    }

    /// Stop the reader thread and drop any pending queued work. Idempotent.
    ///
    /// Shuts down the underlying socket first: the reader thread's `recv` is
    /// typically parked in an unbounded `poll` waiting for the peer, and
    /// without this, `close()` on a still-connected peer would hang in
    /// `handle.join()` forever.
    pub fn close(&mut self) {
        if self.stopped.swap(true, Ordering::SeqCst) {
            return;
        }
        let _ = self.conn.lock().unwrap().shutdown();
        self.queue.stop();
        if let Some(handle) = self.reader.take() {
            let _ = handle.join();
        }
    }
}

impl<Data: Send + Sync + 'static> Drop for PeerRuntime<Data> {
    fn drop(&mut self) {
        self.close();
    }
}

fn read_loop<Data: Send + Sync + 'static>(
    conn: Arc<Mutex<Connection>>,
    store: Arc<ObjectStore<Data>>,
    queue: Arc<Queue>,
    stopped: Arc<AtomicBool>,
) {
    loop {
        if stopped.load(Ordering::SeqCst) {
            return;
        }
        let recv_result = conn.lock().unwrap().recv();
        match recv_result {
            Ok(mut msg) => {
                let store = store.clone();
                queue.push(Box::new(move || {
                    let sender = msg.sender();
                    match store.find(sender) {
                        Some((_, handler)) => dispatch_one(handler, sender, &mut msg, &store),
                        None => Err(WireError::UnknownSender(sender)),
                    }
                }));
            }
            Err(WireError::Closed) => {
                stopped.store(true, Ordering::SeqCst);
                queue.stop();
                return;
            }
            Err(e) => {
                queue.push(Box::new(move || Err(e)));
                stopped.store(true, Ordering::SeqCst);
                queue.stop();
                return;
            }
        }
    }
}

fn dispatch_one<Data>(
    handler: Arc<dyn Dispatch<Data>>,
    sender: u32,
    msg: &mut crate::buffer::MessageBuffer,
    store: &ObjectStore<Data>,
) -> Result<(), WireError> {
    handler.dispatch(sender, msg, store)
}
