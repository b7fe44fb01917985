//! Hand-authored bindings in the exact shape `wire-scanner` would emit for
//! [`protocols/wayland.xml`](../protocols/wayland.xml) (see
//! [`generated`]), plus a small client bootstrap helper built on them:
//! connect, bind the registry, and collect every advertised global via a
//! `wl_display.sync` round trip.

pub mod generated;

use std::sync::{Arc, Mutex};

use wire_core::{Connection, MessageBuilder, ObjectStore, PeerRuntime, WireError};

use generated::callback::{CallbackHandler, CallbackListener};
use generated::display::{Display, DisplayHandler, DisplayListener};
use generated::registry::{RegistryHandler, RegistryListener};

/// One global advertised by the server, as collected by [`collect_globals`].
#[derive(Debug, Clone)]
pub struct GlobalEntry {
    pub name: u32,
    pub interface: String,
    pub version: u32,
}

struct LoggingDisplay;

impl DisplayListener for LoggingDisplay {
    fn error(&self, _sender_id: u32, object_id: u32, code: u32, message: String) {
        log::error!("fatal protocol error on object {object_id} (code {code}): {message}");
    }
}

struct GlobalCollector {
    globals: Arc<Mutex<Vec<GlobalEntry>>>,
}

impl RegistryListener for GlobalCollector {
    fn global(&self, _sender_id: u32, name: u32, interface: String, version: u32) {
        self.globals.lock().unwrap().push(GlobalEntry { name, interface, version });
    }

    fn global_remove(&self, _sender_id: u32, name: u32) {
        self.globals.lock().unwrap().retain(|g| g.name != name);
    }
}

/// Completes the matching [`PeerRuntime::round_trip`] once this specific
/// callback's `done` event is dispatched; the callback's own object id
/// doubles as the round trip's correlation token.
struct SyncWaiter<Data: Send + Sync + 'static> {
    runtime: Arc<PeerRuntime<Data>>,
}

impl<Data: Send + Sync + 'static> CallbackListener for SyncWaiter<Data> {
    fn done(&self, sender_id: u32, _callback_data: u32) {
        self.runtime.complete_sync(sender_id);
    }
}

/// Connect as a client over `conn`, bind `wl_registry`, and return every
/// global the server had advertised by the time a `wl_display.sync` round
/// trip completes.
pub fn collect_globals(conn: Connection) -> Result<Vec<GlobalEntry>, WireError> {
    let store: Arc<ObjectStore<()>> = Arc::new(ObjectStore::new());
    let runtime = Arc::new(PeerRuntime::new(conn, store.clone()));

    store.insert_at(
        wire_core::store::DISPLAY_ID,
        &generated::display::INTERFACE,
        Arc::new(DisplayHandler::<(), _>::new(LoggingDisplay)),
    )?;
    let display = Display { id: wire_core::store::DISPLAY_ID, runtime: runtime.clone() };

    let globals = Arc::new(Mutex::new(Vec::new()));
    let registry_id = store.next_client_id();
    store.insert_at(
        registry_id,
        &generated::registry::INTERFACE,
        Arc::new(RegistryHandler::<(), _>::new(GlobalCollector { globals: globals.clone() })),
    )?;
    display.get_registry(registry_id)?;

    let callback_id = store.next_client_id();
    store.insert_at(
        callback_id,
        &generated::callback::INTERFACE,
        Arc::new(CallbackHandler::<(), _>::new(SyncWaiter { runtime: runtime.clone() })),
    )?;
    runtime.round_trip(callback_id, || {
        let mut b = MessageBuilder::new(display.id, 0); // wl_display.sync
        b.write_object(callback_id);
        b
    })?;

    let collected = globals.lock().unwrap().clone();
    Ok(collected)
}
