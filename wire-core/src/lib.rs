//! Symmetric wire protocol core: the primitive codec, inbound/outbound
//! message framing, an object id store, and a per-peer runtime built on a
//! dedicated reader thread plus a serialized work queue. Shared by both
//! client- and server-side generated bindings.

pub mod buffer;
pub mod builder;
pub mod debug;
pub mod error;
pub mod fixed;
pub mod object;
pub mod runtime;
pub mod server;
pub mod socket;
pub mod store;
pub mod wire;

pub use buffer::MessageBuffer;
pub use builder::MessageBuilder;
pub use error::{BuildError, ParseError, Result, StoreError, WireError};
pub use fixed::Fixed;
pub use object::{ArgKind, Dispatch, DynDispatch, Interface, MessageDesc, MessageKind};
pub use runtime::PeerRuntime;
pub use socket::Connection;
pub use store::ObjectStore;
