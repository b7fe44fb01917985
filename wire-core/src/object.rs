//! Protocol descriptors shared between hand-written and generated bindings:
//! the static shape of an interface (its messages, signatures, child
//! interfaces) plus the runtime `Dispatch` seam that lets the object store
//! hand an inbound message to the right handler without knowing its
//! concrete type.

use std::sync::Arc;

use crate::buffer::MessageBuffer;
use crate::error::WireError;
use crate::store::ObjectStore;

/// Which message table an opcode was looked up in. Carried by
/// [`crate::error::WireError::UnknownOp`] so a caller can tell a bad request
/// apart from a bad event without parsing an error string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Request,
    Event,
}

impl std::fmt::Display for MessageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MessageKind::Request => write!(f, "request"),
            MessageKind::Event => write!(f, "event"),
        }
    }
}

/// One wire argument's type, used by the generator's descriptors and by
/// debug printing. Mirrors the six primitive kinds named by the protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgKind {
    Int,
    Uint,
    Fixed,
    String,
    Array,
    Fd,
    Object,
    NewId,
}

/// Static description of one request or event.
#[derive(Debug, Clone)]
pub struct MessageDesc {
    pub name: &'static str,
    pub signature: &'static [ArgKind],
    pub since: u32,
    pub is_destructor: bool,
    /// Interface the `new_id` argument binds to, if statically known
    /// (`None` for a polymorphic `new_id`, e.g. `wl_registry.bind`).
    pub child_interface: Option<&'static Interface>,
}

/// Static description of an interface: its name/version and the two
/// message tables (requests travel client->server, events server->client).
#[derive(Debug)]
pub struct Interface {
    pub name: &'static str,
    pub version: u32,
    pub requests: &'static [MessageDesc],
    pub events: &'static [MessageDesc],
}

/// Seam between the object store and a concrete binding's handler: every
/// generated (or hand-written) object implements this to receive messages
/// addressed to it.
pub trait Dispatch<Data>: Send + Sync {
    /// Handle one inbound message addressed to this object. `store` allows
    /// resolving `new_id`/`object` arguments and allocating children.
    fn dispatch(
        &self,
        id: u32,
        msg: &mut MessageBuffer,
        store: &ObjectStore<Data>,
    ) -> Result<(), WireError>;

    fn interface(&self) -> &'static Interface;
}

/// Type-erased handle to a dispatchable object, as stored in the object
/// table.
pub type DynDispatch<Data> = Arc<dyn Dispatch<Data>>;

/// Placeholder interface used for ids that exist in the table only to
/// reserve a slot (e.g. the display object before its interface is known).
pub static ANONYMOUS_INTERFACE: Interface = Interface {
    name: "<anonymous>",
    version: 0,
    requests: &[],
    events: &[],
};
