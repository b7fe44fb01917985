//! Cross-module scenarios: a server pushes a handful of events to a client,
//! the client drains its queue and observes them in order, then a
//! round-trip sync completes once the matching `done` marker is seen.

use std::os::unix::net::UnixStream;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use wire_core::object::{ArgKind, Dispatch, Interface, MessageDesc, ANONYMOUS_INTERFACE};
use wire_core::{Connection, MessageBuffer, MessageBuilder, ObjectStore, PeerRuntime, WireError};

static ECHO_INTERFACE: Interface = Interface {
    name: "test_echo",
    version: 1,
    requests: &[],
    events: &[MessageDesc {
        name: "pong",
        signature: &[ArgKind::Uint],
        since: 1,
        is_destructor: false,
        child_interface: None,
    }],
};

struct Echo {
    received: Mutex<Vec<u32>>,
}

impl Dispatch<()> for Echo {
    fn dispatch(
        &self,
        _id: u32,
        msg: &mut MessageBuffer,
        _store: &ObjectStore<()>,
    ) -> Result<(), WireError> {
        let v = msg.read_uint()?;
        self.received.lock().unwrap().push(v);
        Ok(())
    }

    fn interface(&self) -> &'static Interface {
        &ECHO_INTERFACE
    }
}

struct SyncObj {
    runtime: std::sync::Weak<PeerRuntime<()>>,
}

impl Dispatch<()> for SyncObj {
    fn dispatch(
        &self,
        id: u32,
        _msg: &mut MessageBuffer,
        _store: &ObjectStore<()>,
    ) -> Result<(), WireError> {
        if let Some(rt) = self.runtime.upgrade() {
            rt.complete_sync(id);
        }
        Ok(())
    }

    fn interface(&self) -> &'static Interface {
        &ANONYMOUS_INTERFACE
    }
}

#[test]
fn events_are_dispatched_in_order() {
    let (client_sock, server_sock) = UnixStream::pair().unwrap();

    let store: Arc<ObjectStore<()>> = Arc::new(ObjectStore::new());
    let echo = Arc::new(Echo {
        received: Mutex::new(Vec::new()),
    });
    store.insert_at(5, &ECHO_INTERFACE, echo.clone()).unwrap();

    let client_runtime = PeerRuntime::new(Connection::new(client_sock), store.clone());

    // Server side: just a raw connection, sending three pong events.
    let mut server_conn = Connection::new(server_sock);
    for v in [1u32, 2, 3] {
        let mut b = MessageBuilder::new(5, 0);
        b.write_uint(v);
        server_conn.queue_send(b).unwrap();
    }
    server_conn.flush().unwrap();

    // Drive the client's queue until all three have arrived.
    let deadline = std::time::Instant::now() + std::time::Duration::from_secs(2);
    while echo.received.lock().unwrap().len() < 3 {
        client_runtime.flush().unwrap();
        assert!(std::time::Instant::now() < deadline, "timed out waiting for events");
        std::thread::sleep(std::time::Duration::from_millis(5));
    }

    assert_eq!(*echo.received.lock().unwrap(), vec![1, 2, 3]);
}

#[test]
fn round_trip_blocks_until_matching_callback_fires() {
    let (client_sock, server_sock) = UnixStream::pair().unwrap();

    let store: Arc<ObjectStore<()>> = Arc::new(ObjectStore::new());
    let client_runtime = Arc::new(PeerRuntime::new(Connection::new(client_sock), store.clone()));

    let sync_handler = Arc::new(SyncObj {
        runtime: Arc::downgrade(&client_runtime),
    });
    // The server allocates the sync object's id in the server-range half
    // of the space, as it would for any server-created object.
    let sync_id = wire_core::store::SERVER_ID_LIMIT + 1;
    store
        .insert_at(sync_id, &ANONYMOUS_INTERFACE, sync_handler)
        .unwrap();

    // Simulate the peer: read the outgoing sync request then immediately
    // echo back a `done` event for the object id the client asked it to
    // create.
    let responder = std::thread::spawn(move || {
        let mut server_conn = Connection::new(server_sock);
        let mut req = server_conn.recv().unwrap();
        let requested_new_id = req.read_object().unwrap();
        assert_eq!(requested_new_id, sync_id);

        let done = MessageBuilder::new(sync_id, 0);
        server_conn.queue_send(done).unwrap();
        server_conn.flush().unwrap();
    });

    let seq = AtomicU32::new(0);
    client_runtime
        .round_trip(sync_id, || {
            seq.fetch_add(1, Ordering::SeqCst);
            let mut b = MessageBuilder::new(1, 0); // wl_display.sync(new_id)
            b.write_object(sync_id);
            b
        })
        .unwrap();

    responder.join().unwrap();
    assert_eq!(seq.load(Ordering::SeqCst), 1);
}

#[test]
fn close_returns_promptly_while_peer_is_still_open() {
    let (client_sock, server_sock) = UnixStream::pair().unwrap();
    // Keep the peer end alive and silent: nothing is ever sent and the
    // socket is never dropped, so the reader thread's `recv` would block
    // forever if `close()` didn't shut down the client's own socket.
    let _server_conn = Connection::new(server_sock);

    let store: Arc<ObjectStore<()>> = Arc::new(ObjectStore::new());
    let mut client_runtime = PeerRuntime::new(Connection::new(client_sock), store);

    let (done_tx, done_rx) = std::sync::mpsc::channel();
    let closer = std::thread::spawn(move || {
        client_runtime.close();
        done_tx.send(()).unwrap();
    });

    done_rx
        .recv_timeout(std::time::Duration::from_secs(2))
        .expect("close() did not return while the peer was still open");
    closer.join().unwrap();
}
