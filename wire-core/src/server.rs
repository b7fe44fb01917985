//! Server-side socket discovery and accept loop, plus a small `Globals`
//! helper for brokering a `wl_registry`-style advertisement table.
//!
//! Grounded on the reference server's accept loop (`server/server.go`):
//! a dedicated thread accepts connections and pushes a "new client" closure
//! onto a queue, exactly as the per-peer reader thread pushes dispatch
//! closures in [`crate::runtime`].

use std::collections::HashMap;
use std::env;
use std::os::unix::net::{UnixListener, UnixStream};
use std::path::PathBuf;
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::Arc;
use std::thread::JoinHandle;

use crate::error::WireError;
use crate::object::Interface;

/// Bind the first free `wayland-N` socket under `XDG_RUNTIME_DIR` (or its
/// fallback), the way a reference compositor advertises its display.
pub fn bind_first_free() -> Result<(UnixListener, PathBuf), WireError> {
    let runtime_dir = env::var("XDG_RUNTIME_DIR").map(PathBuf::from).unwrap_or_else(|_| {
        let uid = rustix::process::getuid().as_raw();
        PathBuf::from(format!("/var/run/user/{uid}"))
    });
    for n in 0..32 {
        let path = runtime_dir.join(format!("wayland-{n}"));
        match UnixListener::bind(&path) {
            Ok(listener) => return Ok((listener, path)),
            Err(e) if e.kind() == std::io::ErrorKind::AddrInUse => continue,
            Err(e) => return Err(e.into()),
        }
    }
    Err(WireError::Protocol("no free wayland-N socket found".into()))
}

/// Accepts connections on a background thread and hands each accepted
/// stream to the caller through a channel, decoupling socket `accept()`
/// from whatever the caller does to spin up a [`crate::runtime::PeerRuntime`]
/// per client.
pub struct Listener {
    accepted: Receiver<std::io::Result<UnixStream>>,
    accept_thread: Option<JoinHandle<()>>,
}

impl Listener {
    pub fn new(listener: UnixListener) -> Self {
        let (tx, rx): (Sender<std::io::Result<UnixStream>>, _) = channel();
        let accept_thread = std::thread::spawn(move || accept_loop(listener, tx));
        Listener {
            accepted: rx,
            accept_thread: Some(accept_thread),
        }
    }

    /// Block until a client connects or the listener is closed.
    pub fn accept(&self) -> Option<std::io::Result<UnixStream>> {
        self.accepted.recv().ok()
    }
}

impl Drop for Listener {
    fn drop(&mut self) {
        if let Some(h) = self.accept_thread.take() {
            let _ = h.join();
        }
    }
}

fn accept_loop(listener: UnixListener, tx: Sender<std::io::Result<UnixStream>>) {
    loop {
        match listener.accept() {
            Ok((stream, _addr)) => {
                if tx.send(Ok(stream)).is_err() {
                    return;
                }
            }
            Err(e) => {
                let _ = tx.send(Err(e));
                return;
            }
        }
    }
}

/// One advertised global, as broadcast through `wl_registry.global` events.
pub struct Global<Data> {
    pub name: u32,
    pub interface: &'static Interface,
    pub version: u32,
    pub bind: Arc<dyn Fn(u32, u32) -> Arc<dyn crate::object::Dispatch<Data>> + Send + Sync>,
}

/// A table of globals a server advertises to clients, independent of any
/// particular interface so the same broker works regardless of which
/// protocol bindings are layered on top (mirrors the reference server's
/// `Registry` type, minus its libwayland-specific bind-request plumbing).
pub struct Globals<Data> {
    next_name: std::sync::atomic::AtomicU32,
    globals: std::sync::RwLock<HashMap<u32, Global<Data>>>,
}

impl<Data> Globals<Data> {
    pub fn new() -> Self {
        Globals {
            next_name: std::sync::atomic::AtomicU32::new(1),
            globals: std::sync::RwLock::new(HashMap::new()),
        }
    }

    pub fn add(
        &self,
        interface: &'static Interface,
        version: u32,
        bind: impl Fn(u32, u32) -> Arc<dyn crate::object::Dispatch<Data>> + Send + Sync + 'static,
    ) -> u32 {
        let name = self.next_name.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        self.globals.write().unwrap().insert(
            name,
            Global {
                name,
                interface,
                version,
                bind: Arc::new(bind),
            },
        );
        name
    }

    pub fn remove(&self, name: u32) -> bool {
        self.globals.write().unwrap().remove(&name).is_some()
    }

    /// All currently advertised globals, in ascending name order (matches
    /// the order a reference registry sends its initial burst of `global`
    /// events in).
    pub fn snapshot(&self) -> Vec<(u32, &'static Interface, u32)> {
        let mut v: Vec<_> = self
            .globals
            .read()
            .unwrap()
            .values()
            .map(|g| (g.name, g.interface, g.version))
            .collect();
        v.sort_by_key(|(name, _, _)| *name);
        v
    }

    pub fn bind(&self, name: u32, version: u32, new_id: u32) -> Option<Arc<dyn crate::object::Dispatch<Data>>> {
        let table = self.globals.read().unwrap();
        table.get(&name).map(|g| (g.bind)(version, new_id))
    }
}

impl<Data> Default for Globals<Data> {
    fn default() -> Self {
        Self::new()
    }
}
