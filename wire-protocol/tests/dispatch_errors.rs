//! Exercises the typed dispatch errors and the store-level `delete_id`
//! handling directly against the generated `wl_display` binding.

use std::collections::VecDeque;
use std::sync::Arc;

use wire_core::object::ANONYMOUS_INTERFACE;
use wire_core::{Dispatch, MessageBuffer, MessageKind, ObjectStore, WireError};
use wire_protocol::generated::display::{DisplayHandler, DisplayListener, INTERFACE};

struct NoOverrides;
impl DisplayListener for NoOverrides {}

struct Noop;
impl Dispatch<()> for Noop {
    fn dispatch(&self, _id: u32, _msg: &mut MessageBuffer, _store: &ObjectStore<()>) -> Result<(), WireError> {
        Ok(())
    }
    fn interface(&self) -> &'static wire_core::object::Interface {
        &ANONYMOUS_INTERFACE
    }
}

fn delete_id_msg(deleted: u32) -> MessageBuffer {
    MessageBuffer::from_parts(wire_core::store::DISPLAY_ID, 1, deleted.to_ne_bytes().to_vec(), VecDeque::new())
}

#[test]
fn delete_id_frees_the_store_slot_even_with_no_listener() {
    let store: ObjectStore<()> = ObjectStore::new();
    store.insert_at(5, &ANONYMOUS_INTERFACE, Arc::new(Noop)).unwrap();

    let handler = DisplayHandler::<(), NoOverrides>::without_listener();
    let mut msg = delete_id_msg(5);
    let result = handler.dispatch(wire_core::store::DISPLAY_ID, &mut msg, &store);

    assert!(matches!(result, Err(WireError::NilListener)));
    assert!(store.find(5).is_none());
}

#[test]
fn delete_id_frees_the_store_slot_with_a_listener_installed() {
    let store: ObjectStore<()> = ObjectStore::new();
    store.insert_at(7, &ANONYMOUS_INTERFACE, Arc::new(Noop)).unwrap();

    let handler = DisplayHandler::<(), _>::new(NoOverrides);
    let mut msg = delete_id_msg(7);
    handler.dispatch(wire_core::store::DISPLAY_ID, &mut msg, &store).unwrap();

    assert!(store.find(7).is_none());
}

#[test]
fn unrecognized_opcode_reports_unknown_op() {
    let store: ObjectStore<()> = ObjectStore::new();
    let handler = DisplayHandler::<(), _>::new(NoOverrides);
    let mut msg = MessageBuffer::from_parts(wire_core::store::DISPLAY_ID, 99, Vec::new(), VecDeque::new());

    let err = handler.dispatch(wire_core::store::DISPLAY_ID, &mut msg, &store).unwrap_err();
    match err {
        WireError::UnknownOp { interface, kind, op } => {
            assert_eq!(interface, INTERFACE.name);
            assert_eq!(kind, MessageKind::Event);
            assert_eq!(op, 99);
        }
        other => panic!("expected UnknownOp, got {other:?}"),
    }
}
