//! Object id allocation and lookup.
//!
//! The id space is split in half, as in the wire protocol this crate binds:
//! ids below [`SERVER_ID_LIMIT`] are allocated by the client (monotonically,
//! starting at 2 — id 1 is reserved for the display), ids at or above it
//! are allocated by the server when it creates objects on the client's
//! behalf. Both halves are stored in separate growable tables, the same
//! split `ObjectMap` uses internally, so a client-side id and a
//! server-side id never collide.

use std::sync::RwLock;

use crate::error::StoreError;
use crate::object::{DynDispatch, Interface};

/// First id in the server-allocated half of the space.
pub const SERVER_ID_LIMIT: u32 = 0xFF00_0000;

/// Id reserved for the display object; never allocated or freed.
pub const DISPLAY_ID: u32 = 1;

/// Runs once when the object it was registered against is removed from the
/// store, either by [`ObjectStore::remove`] or [`ObjectStore::clear`].
pub type DeleteHook = Box<dyn FnOnce() + Send>;

struct Slot<Data> {
    interface: &'static Interface,
    handler: DynDispatch<Data>,
    on_delete: Option<DeleteHook>,
}

struct Table<Data> {
    slots: Vec<Option<Slot<Data>>>,
}

impl<Data> Table<Data> {
    fn new() -> Self {
        Table { slots: Vec::new() }
    }

    fn get(&self, idx: usize) -> Option<&Slot<Data>> {
        self.slots.get(idx).and_then(|s| s.as_ref())
    }

    fn set(&mut self, idx: usize, slot: Slot<Data>) {
        if idx >= self.slots.len() {
            self.slots.resize_with(idx + 1, || None);
        }
        self.slots[idx] = Some(slot);
    }

    fn take(&mut self, idx: usize) -> Option<Slot<Data>> {
        self.slots.get_mut(idx).and_then(|s| s.take())
    }

    fn take_all(&mut self) -> Vec<Slot<Data>> {
        self.slots.drain(..).flatten().collect()
    }
}

/// Id allocation and dispatch-table lookup for one peer. Internally
/// synchronized so it can be shared between the reader thread and the
/// thread driving the work queue.
pub struct ObjectStore<Data> {
    client: RwLock<Table<Data>>,
    server: RwLock<Table<Data>>,
    next_client_id: std::sync::atomic::AtomicU32,
}

impl<Data> ObjectStore<Data> {
    pub fn new() -> Self {
        ObjectStore {
            client: RwLock::new(Table::new()),
            server: RwLock::new(Table::new()),
            next_client_id: std::sync::atomic::AtomicU32::new(DISPLAY_ID + 1),
        }
    }

    fn split(id: u32) -> (bool, usize) {
        if id >= SERVER_ID_LIMIT {
            (false, (id - SERVER_ID_LIMIT) as usize)
        } else {
            (true, id as usize)
        }
    }

    /// Allocate the next free client-range id (monotonic, never reused).
    pub fn next_client_id(&self) -> u32 {
        self.next_client_id
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst)
    }

    /// Insert a handler at a specific id, failing if that id is already
    /// occupied. This is how both the display (id 1, reserved up front)
    /// and every inbound `new_id` argument populate the table.
    pub fn insert_at(
        &self,
        id: u32,
        interface: &'static Interface,
        handler: DynDispatch<Data>,
    ) -> Result<(), StoreError> {
        self.insert_at_with_hook(id, interface, handler, None)
    }

    /// Like [`ObjectStore::insert_at`], but registers a hook run once when
    /// this id is later removed, whether by an explicit [`ObjectStore::remove`]
    /// or by [`ObjectStore::clear`].
    pub fn insert_at_with_hook(
        &self,
        id: u32,
        interface: &'static Interface,
        handler: DynDispatch<Data>,
        on_delete: Option<DeleteHook>,
    ) -> Result<(), StoreError> {
        let (is_client, idx) = Self::split(id);
        let mut table = if is_client {
            self.client.write().unwrap()
        } else {
            self.server.write().unwrap()
        };
        if table.get(idx).is_some() {
            return Err(StoreError::IdInUse(id));
        }
        table.set(idx, Slot { interface, handler, on_delete });
        Ok(())
    }

    /// Look up the handler and static interface for an id.
    pub fn find(&self, id: u32) -> Option<(&'static Interface, DynDispatch<Data>)> {
        let (is_client, idx) = Self::split(id);
        let table = if is_client {
            self.client.read().unwrap()
        } else {
            self.server.read().unwrap()
        };
        table.get(idx).map(|s| (s.interface, s.handler.clone()))
    }

    /// Remove an id from the table, e.g. after a destructor request/event or
    /// a `delete_id` event, running its deletion hook if one was registered.
    /// Returns an error if the id was never allocated.
    pub fn remove(&self, id: u32) -> Result<(), StoreError> {
        let (is_client, idx) = Self::split(id);
        let mut table = if is_client {
            self.client.write().unwrap()
        } else {
            self.server.write().unwrap()
        };
        match table.take(idx) {
            Some(slot) => {
                drop(table);
                if let Some(hook) = slot.on_delete {
                    hook();
                }
                Ok(())
            }
            None => Err(StoreError::Unknown(id)),
        }
    }

    /// Remove every object from both halves of the store, running each
    /// one's deletion hook. Used when tearing down a connection.
    pub fn clear(&self) {
        let removed: Vec<Slot<Data>> = {
            let mut client = self.client.write().unwrap();
            let mut server = self.server.write().unwrap();
            let mut removed = client.take_all();
            removed.extend(server.take_all());
            removed
        };
        for slot in removed {
            if let Some(hook) = slot.on_delete {
                hook();
            }
        }
    }
}

impl<Data> Default for ObjectStore<Data> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::MessageBuffer;
    use crate::error::WireError;
    use crate::object::{Dispatch, ANONYMOUS_INTERFACE};
    use std::sync::Arc;

    struct Noop;
    impl Dispatch<()> for Noop {
        fn dispatch(
            &self,
            _id: u32,
            _msg: &mut MessageBuffer,
            _store: &ObjectStore<()>,
        ) -> Result<(), WireError> {
            Ok(())
        }
        fn interface(&self) -> &'static crate::object::Interface {
            &ANONYMOUS_INTERFACE
        }
    }

    #[test]
    fn allocates_monotonic_client_ids() {
        let store: ObjectStore<()> = ObjectStore::new();
        let a = store.next_client_id();
        let b = store.next_client_id();
        assert_eq!(b, a + 1);
        assert!(a > DISPLAY_ID);
    }

    #[test]
    fn rejects_colliding_insert() {
        let store: ObjectStore<()> = ObjectStore::new();
        let h: DynDispatch<()> = Arc::new(Noop);
        store.insert_at(2, &ANONYMOUS_INTERFACE, h.clone()).unwrap();
        assert!(matches!(
            store.insert_at(2, &ANONYMOUS_INTERFACE, h),
            Err(StoreError::IdInUse(2))
        ));
    }

    #[test]
    fn client_and_server_halves_are_independent() {
        let store: ObjectStore<()> = ObjectStore::new();
        let h: DynDispatch<()> = Arc::new(Noop);
        store.insert_at(5, &ANONYMOUS_INTERFACE, h.clone()).unwrap();
        store
            .insert_at(SERVER_ID_LIMIT + 5, &ANONYMOUS_INTERFACE, h)
            .unwrap();
        assert!(store.find(5).is_some());
        assert!(store.find(SERVER_ID_LIMIT + 5).is_some());
    }

    #[test]
    fn remove_then_reinsert_succeeds() {
        let store: ObjectStore<()> = ObjectStore::new();
        let h: DynDispatch<()> = Arc::new(Noop);
        store.insert_at(9, &ANONYMOUS_INTERFACE, h.clone()).unwrap();
        store.remove(9).unwrap();
        assert!(store.find(9).is_none());
        store.insert_at(9, &ANONYMOUS_INTERFACE, h).unwrap();
        assert!(store.find(9).is_some());
    }

    #[test]
    fn remove_runs_the_deletion_hook_once() {
        let store: ObjectStore<()> = ObjectStore::new();
        let h: DynDispatch<()> = Arc::new(Noop);
        let ran = Arc::new(std::sync::atomic::AtomicBool::new(false));
        let ran_in_hook = ran.clone();
        store
            .insert_at_with_hook(
                11,
                &ANONYMOUS_INTERFACE,
                h,
                Some(Box::new(move || ran_in_hook.store(true, std::sync::atomic::Ordering::SeqCst))),
            )
            .unwrap();
        store.remove(11).unwrap();
        assert!(ran.load(std::sync::atomic::Ordering::SeqCst));
    }

    #[test]
    fn clear_removes_both_halves_and_runs_every_hook() {
        let store: ObjectStore<()> = ObjectStore::new();
        let h: DynDispatch<()> = Arc::new(Noop);
        let count = Arc::new(std::sync::atomic::AtomicU32::new(0));
        for id in [3u32, 4, SERVER_ID_LIMIT + 3] {
            let count = count.clone();
            store
                .insert_at_with_hook(
                    id,
                    &ANONYMOUS_INTERFACE,
                    h.clone(),
                    Some(Box::new(move || {
                        count.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
                    })),
                )
                .unwrap();
        }
        store.clear();
        assert_eq!(count.load(std::sync::atomic::Ordering::SeqCst), 3);
        assert!(store.find(3).is_none());
        assert!(store.find(4).is_none());
        assert!(store.find(SERVER_ID_LIMIT + 3).is_none());
    }
}
