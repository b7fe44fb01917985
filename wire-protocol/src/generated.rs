// Generated from the `wayland` protocol. Do not edit by hand.
#![allow(clippy::too_many_arguments)]

use std::sync::Arc;
use wire_core::object::{ArgKind, Dispatch, Interface, MessageDesc};
use wire_core::{MessageBuffer, MessageBuilder, ObjectStore, PeerRuntime, WireError};

/// The singleton global object, id 1, present on every connection.
pub mod display {
    use super::*;

    pub static INTERFACE: Interface = Interface {
        name: "wl_display",
        version: 1,
        requests: &REQUESTS,
        events: &EVENTS,
    };

    static REQUESTS: [MessageDesc; 2] = [
        MessageDesc {
            name: "sync",
            signature: &[ArgKind::NewId],
            since: 1,
            is_destructor: false,
            child_interface: Some(&super::callback::INTERFACE),
        },
        MessageDesc {
            name: "get_registry",
            signature: &[ArgKind::NewId],
            since: 1,
            is_destructor: false,
            child_interface: Some(&super::registry::INTERFACE),
        },
    ];

    static EVENTS: [MessageDesc; 2] = [
        MessageDesc {
            name: "error",
            signature: &[ArgKind::Object, ArgKind::Uint, ArgKind::String],
            since: 1,
            is_destructor: false,
            child_interface: None,
        },
        MessageDesc {
            name: "delete_id",
            signature: &[ArgKind::Uint],
            since: 1,
            is_destructor: false,
            child_interface: None,
        },
    ];

    #[allow(dead_code)]
    mod request_opcode {
        pub const SYNC: u16 = 0;
        pub const GET_REGISTRY: u16 = 1;
    }

    #[allow(dead_code)]
    mod event_opcode {
        pub const ERROR: u16 = 0;
        pub const DELETE_ID: u16 = 1;
    }

    pub trait DisplayListener: Send + Sync {
        /// A fatal protocol error; the connection must be closed after this.
        #[allow(unused_variables)]
        fn error(&self, sender_id: u32, object_id: u32, code: u32, message: String) {}
        /// Sent after the client's destructor request for an object has been
        /// processed, so the id can be reused.
        #[allow(unused_variables)]
        fn delete_id(&self, sender_id: u32, id: u32) {}
    }

    pub struct Display<Data: Send + Sync + 'static> {
        pub id: u32,
        pub runtime: Arc<PeerRuntime<Data>>,
    }

    impl<Data: Send + Sync + 'static> Display<Data> {
        /// Results in a done event for the returned wl_callback once every
        /// request sent before it has been processed by the server.
        pub fn sync(&self, callback: u32) -> Result<(), WireError> {
            let mut builder = MessageBuilder::new(self.id, 0);
            builder.write_object(callback);
            wire_core::debug::print_sent(INTERFACE.name, self.id, "sync", &format!("callback={callback:?}"));
            self.runtime.enqueue_send(builder);
            Ok(())
        }
        /// Binds the registry object that advertises the server's globals.
        pub fn get_registry(&self, registry: u32) -> Result<(), WireError> {
            let mut builder = MessageBuilder::new(self.id, 1);
            builder.write_object(registry);
            wire_core::debug::print_sent(INTERFACE.name, self.id, "get_registry", &format!("registry={registry:?}"));
            self.runtime.enqueue_send(builder);
            Ok(())
        }
    }

    pub struct DisplayHandler<Data, L: DisplayListener> {
        pub listener: Option<L>,
        _data: std::marker::PhantomData<Data>,
    }

    impl<Data, L: DisplayListener> DisplayHandler<Data, L> {
        pub fn new(listener: L) -> Self {
            Self { listener: Some(listener), _data: std::marker::PhantomData }
        }

        /// A handler with no listener installed: inbound messages are still
        /// decoded (and, for `delete_id`, still acted on at the store level),
        /// but every dispatch that would reach a listener returns `NilListener`.
        pub fn without_listener() -> Self {
            Self { listener: None, _data: std::marker::PhantomData }
        }
    }

    impl<Data: Send + Sync + 'static, L: DisplayListener> Dispatch<Data> for DisplayHandler<Data, L> {
        fn interface(&self) -> &'static Interface { &INTERFACE }

        fn dispatch(&self, id: u32, msg: &mut MessageBuffer, store: &ObjectStore<Data>) -> Result<(), WireError> {
            match msg.opcode() {
                0 => {
                    let object_id = msg.read_object()?;
                    let code = msg.read_uint()?;
                    let message = msg.read_string()?;
                    wire_core::debug::print_dispatched(INTERFACE.name, id, "error", &format!("object_id={object_id:?}, code={code:?}, message={message:?}"));
                    match &self.listener {
                        Some(listener) => { listener.error(id, object_id, code, message); Ok(()) }
                        None => Err(WireError::NilListener),
                    }
                }
                1 => {
                    let id_ = msg.read_uint()?;
                    wire_core::debug::print_dispatched(INTERFACE.name, id, "delete_id", &format!("id={id_:?}"));
                    let _ = store.remove(id_);
                    match &self.listener {
                        Some(listener) => { listener.delete_id(id, id_); Ok(()) }
                        None => Err(WireError::NilListener),
                    }
                }
                other => Err(WireError::UnknownOp { interface: INTERFACE.name, kind: wire_core::MessageKind::Event, op: other }),
            }
        }
    }
}

/// Advertises the globals a server makes available.
pub mod registry {
    use super::*;

    pub static INTERFACE: Interface = Interface {
        name: "wl_registry",
        version: 1,
        requests: &REQUESTS,
        events: &EVENTS,
    };

    static REQUESTS: [MessageDesc; 1] = [
        MessageDesc {
            name: "bind",
            signature: &[ArgKind::Uint, ArgKind::NewId],
            since: 1,
            is_destructor: false,
            child_interface: None,
        },
    ];

    static EVENTS: [MessageDesc; 2] = [
        MessageDesc {
            name: "global",
            signature: &[ArgKind::Uint, ArgKind::String, ArgKind::Uint],
            since: 1,
            is_destructor: false,
            child_interface: None,
        },
        MessageDesc {
            name: "global_remove",
            signature: &[ArgKind::Uint],
            since: 1,
            is_destructor: false,
            child_interface: None,
        },
    ];

    #[allow(dead_code)]
    mod request_opcode {
        pub const BIND: u16 = 0;
    }

    #[allow(dead_code)]
    mod event_opcode {
        pub const GLOBAL: u16 = 0;
        pub const GLOBAL_REMOVE: u16 = 1;
    }

    pub trait RegistryListener: Send + Sync {
        #[allow(unused_variables)]
        fn global(&self, sender_id: u32, name: u32, interface: String, version: u32) {}
        #[allow(unused_variables)]
        fn global_remove(&self, sender_id: u32, name: u32) {}
    }

    pub struct Registry<Data: Send + Sync + 'static> {
        pub id: u32,
        pub runtime: Arc<PeerRuntime<Data>>,
    }

    impl<Data: Send + Sync + 'static> Registry<Data> {
        pub fn bind(&self, name: u32, id: (&str, u32, u32)) -> Result<(), WireError> {
            let mut builder = MessageBuilder::new(self.id, 0);
            builder.write_uint(name);
            builder.write_new_id_dynamic(id.0, id.1, id.2);
            wire_core::debug::print_sent(INTERFACE.name, self.id, "bind", &format!("name={name:?}, id={id:?}"));
            self.runtime.enqueue_send(builder);
            Ok(())
        }
    }

    pub struct RegistryHandler<Data, L: RegistryListener> {
        pub listener: Option<L>,
        _data: std::marker::PhantomData<Data>,
    }

    impl<Data, L: RegistryListener> RegistryHandler<Data, L> {
        pub fn new(listener: L) -> Self {
            Self { listener: Some(listener), _data: std::marker::PhantomData }
        }

        pub fn without_listener() -> Self {
            Self { listener: None, _data: std::marker::PhantomData }
        }
    }

    impl<Data: Send + Sync + 'static, L: RegistryListener> Dispatch<Data> for RegistryHandler<Data, L> {
        fn interface(&self) -> &'static Interface { &INTERFACE }

        fn dispatch(&self, id: u32, msg: &mut MessageBuffer, _store: &ObjectStore<Data>) -> Result<(), WireError> {
            match msg.opcode() {
                0 => {
                    let name = msg.read_uint()?;
                    let interface = msg.read_string()?;
                    let version = msg.read_uint()?;
                    wire_core::debug::print_dispatched(INTERFACE.name, id, "global", &format!("name={name:?}, interface={interface:?}, version={version:?}"));
                    match &self.listener {
                        Some(listener) => { listener.global(id, name, interface, version); Ok(()) }
                        None => Err(WireError::NilListener),
                    }
                }
                1 => {
                    let name = msg.read_uint()?;
                    wire_core::debug::print_dispatched(INTERFACE.name, id, "global_remove", &format!("name={name:?}"));
                    match &self.listener {
                        Some(listener) => { listener.global_remove(id, name); Ok(()) }
                        None => Err(WireError::NilListener),
                    }
                }
                other => Err(WireError::UnknownOp { interface: INTERFACE.name, kind: wire_core::MessageKind::Event, op: other }),
            }
        }
    }
}

pub mod callback {
    use super::*;

    pub static INTERFACE: Interface = Interface {
        name: "wl_callback",
        version: 1,
        requests: &REQUESTS,
        events: &EVENTS,
    };

    static REQUESTS: [MessageDesc; 0] = [];

    static EVENTS: [MessageDesc; 1] = [
        MessageDesc {
            name: "done",
            signature: &[ArgKind::Uint],
            since: 1,
            is_destructor: true,
            child_interface: None,
        },
    ];

    #[allow(dead_code)]
    mod event_opcode {
        pub const DONE: u16 = 0;
    }

    pub trait CallbackListener: Send + Sync {
        #[allow(unused_variables)]
        fn done(&self, sender_id: u32, callback_data: u32) {}
    }

    pub struct Callback<Data: Send + Sync + 'static> {
        pub id: u32,
        pub runtime: Arc<PeerRuntime<Data>>,
    }

    impl<Data: Send + Sync + 'static> Callback<Data> {}

    pub struct CallbackHandler<Data, L: CallbackListener> {
        pub listener: Option<L>,
        _data: std::marker::PhantomData<Data>,
    }

    impl<Data, L: CallbackListener> CallbackHandler<Data, L> {
        pub fn new(listener: L) -> Self {
            Self { listener: Some(listener), _data: std::marker::PhantomData }
        }

        pub fn without_listener() -> Self {
            Self { listener: None, _data: std::marker::PhantomData }
        }
    }

    impl<Data: Send + Sync + 'static, L: CallbackListener> Dispatch<Data> for CallbackHandler<Data, L> {
        fn interface(&self) -> &'static Interface { &INTERFACE }

        fn dispatch(&self, id: u32, msg: &mut MessageBuffer, _store: &ObjectStore<Data>) -> Result<(), WireError> {
            match msg.opcode() {
                0 => {
                    let callback_data = msg.read_uint()?;
                    wire_core::debug::print_dispatched(INTERFACE.name, id, "done", &format!("callback_data={callback_data:?}"));
                    match &self.listener {
                        Some(listener) => { listener.done(id, callback_data); Ok(()) }
                        None => Err(WireError::NilListener),
                    }
                }
                other => Err(WireError::UnknownOp { interface: INTERFACE.name, kind: wire_core::MessageKind::Event, op: other }),
            }
        }
    }
}

/// A factory for surfaces and regions.
pub mod compositor {
    use super::*;

    pub static INTERFACE: Interface = Interface {
        name: "wl_compositor",
        version: 1,
        requests: &REQUESTS,
        events: &EVENTS,
    };

    static REQUESTS: [MessageDesc; 1] = [
        MessageDesc {
            name: "create_surface",
            signature: &[ArgKind::NewId],
            since: 1,
            is_destructor: false,
            child_interface: Some(&super::surface::INTERFACE),
        },
    ];

    static EVENTS: [MessageDesc; 0] = [];

    #[allow(dead_code)]
    mod request_opcode {
        pub const CREATE_SURFACE: u16 = 0;
    }

    pub trait CompositorListener: Send + Sync {}

    pub struct Compositor<Data: Send + Sync + 'static> {
        pub id: u32,
        pub runtime: Arc<PeerRuntime<Data>>,
    }

    impl<Data: Send + Sync + 'static> Compositor<Data> {
        pub fn create_surface(&self, id: u32) -> Result<(), WireError> {
            let mut builder = MessageBuilder::new(self.id, 0);
            builder.write_object(id);
            wire_core::debug::print_sent(INTERFACE.name, self.id, "create_surface", &format!("id={id:?}"));
            self.runtime.enqueue_send(builder);
            Ok(())
        }
    }

    pub struct CompositorHandler<Data, L: CompositorListener> {
        pub listener: Option<L>,
        _data: std::marker::PhantomData<Data>,
    }

    impl<Data, L: CompositorListener> CompositorHandler<Data, L> {
        pub fn new(listener: L) -> Self {
            Self { listener: Some(listener), _data: std::marker::PhantomData }
        }

        pub fn without_listener() -> Self {
            Self { listener: None, _data: std::marker::PhantomData }
        }
    }

    impl<Data: Send + Sync + 'static, L: CompositorListener> Dispatch<Data> for CompositorHandler<Data, L> {
        fn interface(&self) -> &'static Interface { &INTERFACE }

        fn dispatch(&self, id: u32, msg: &mut MessageBuffer, _store: &ObjectStore<Data>) -> Result<(), WireError> {
            let _ = id;
            Err(WireError::UnknownOp { interface: INTERFACE.name, kind: wire_core::MessageKind::Event, op: msg.opcode() })
        }
    }
}

/// An onscreen surface.
pub mod surface {
    use super::*;

    pub static INTERFACE: Interface = Interface {
        name: "wl_surface",
        version: 1,
        requests: &REQUESTS,
        events: &EVENTS,
    };

    static REQUESTS: [MessageDesc; 2] = [
        MessageDesc {
            name: "destroy",
            signature: &[],
            since: 1,
            is_destructor: true,
            child_interface: None,
        },
        MessageDesc {
            name: "commit",
            signature: &[],
            since: 1,
            is_destructor: false,
            child_interface: None,
        },
    ];

    static EVENTS: [MessageDesc; 0] = [];

    #[allow(dead_code)]
    mod request_opcode {
        pub const DESTROY: u16 = 0;
        pub const COMMIT: u16 = 1;
    }

    pub trait SurfaceListener: Send + Sync {}

    pub struct Surface<Data: Send + Sync + 'static> {
        pub id: u32,
        pub runtime: Arc<PeerRuntime<Data>>,
    }

    impl<Data: Send + Sync + 'static> Surface<Data> {
        /// Delete surface.
        pub fn destroy(&self) -> Result<(), WireError> {
            let mut builder = MessageBuilder::new(self.id, 0);
            wire_core::debug::print_sent(INTERFACE.name, self.id, "destroy", &format!(""));
            self.runtime.enqueue_send(builder);
            Ok(())
        }
        /// Commit pending state.
        pub fn commit(&self) -> Result<(), WireError> {
            let mut builder = MessageBuilder::new(self.id, 1);
            wire_core::debug::print_sent(INTERFACE.name, self.id, "commit", &format!(""));
            self.runtime.enqueue_send(builder);
            Ok(())
        }
    }

    pub struct SurfaceHandler<Data, L: SurfaceListener> {
        pub listener: Option<L>,
        _data: std::marker::PhantomData<Data>,
    }

    impl<Data, L: SurfaceListener> SurfaceHandler<Data, L> {
        pub fn new(listener: L) -> Self {
            Self { listener: Some(listener), _data: std::marker::PhantomData }
        }

        pub fn without_listener() -> Self {
            Self { listener: None, _data: std::marker::PhantomData }
        }
    }

    impl<Data: Send + Sync + 'static, L: SurfaceListener> Dispatch<Data> for SurfaceHandler<Data, L> {
        fn interface(&self) -> &'static Interface { &INTERFACE }

        fn dispatch(&self, id: u32, msg: &mut MessageBuffer, _store: &ObjectStore<Data>) -> Result<(), WireError> {
            let _ = id;
            Err(WireError::UnknownOp { interface: INTERFACE.name, kind: wire_core::MessageKind::Event, op: msg.opcode() })
        }
    }
}

/// Lets a client pass a shared memory file descriptor for pixel buffers.
pub mod shm {
    use super::*;

    pub static INTERFACE: Interface = Interface {
        name: "wl_shm",
        version: 1,
        requests: &REQUESTS,
        events: &EVENTS,
    };

    static REQUESTS: [MessageDesc; 1] = [
        MessageDesc {
            name: "create_pool",
            signature: &[ArgKind::NewId, ArgKind::Fd, ArgKind::Int],
            since: 1,
            is_destructor: false,
            child_interface: Some(&super::shm_pool::INTERFACE),
        },
    ];

    static EVENTS: [MessageDesc; 0] = [];

    #[allow(dead_code)]
    mod request_opcode {
        pub const CREATE_POOL: u16 = 0;
    }

    pub trait ShmListener: Send + Sync {}

    pub struct Shm<Data: Send + Sync + 'static> {
        pub id: u32,
        pub runtime: Arc<PeerRuntime<Data>>,
    }

    impl<Data: Send + Sync + 'static> Shm<Data> {
        pub fn create_pool(&self, id: u32, fd: std::os::fd::BorrowedFd<'_>, size: i32) -> Result<(), WireError> {
            let mut builder = MessageBuilder::new(self.id, 0);
            builder.write_object(id);
            builder.attach_fd(fd)?;
            builder.write_int(size);
            wire_core::debug::print_sent(INTERFACE.name, self.id, "create_pool", &format!("id={id:?}, fd={fd:?}, size={size:?}"));
            self.runtime.enqueue_send(builder);
            Ok(())
        }
    }

    pub struct ShmHandler<Data, L: ShmListener> {
        pub listener: Option<L>,
        _data: std::marker::PhantomData<Data>,
    }

    impl<Data, L: ShmListener> ShmHandler<Data, L> {
        pub fn new(listener: L) -> Self {
            Self { listener: Some(listener), _data: std::marker::PhantomData }
        }

        pub fn without_listener() -> Self {
            Self { listener: None, _data: std::marker::PhantomData }
        }
    }

    impl<Data: Send + Sync + 'static, L: ShmListener> Dispatch<Data> for ShmHandler<Data, L> {
        fn interface(&self) -> &'static Interface { &INTERFACE }

        fn dispatch(&self, id: u32, msg: &mut MessageBuffer, _store: &ObjectStore<Data>) -> Result<(), WireError> {
            let _ = id;
            Err(WireError::UnknownOp { interface: INTERFACE.name, kind: wire_core::MessageKind::Event, op: msg.opcode() })
        }
    }
}

/// A shared memory pool.
pub mod shm_pool {
    use super::*;

    pub static INTERFACE: Interface = Interface {
        name: "wl_shm_pool",
        version: 1,
        requests: &REQUESTS,
        events: &EVENTS,
    };

    static REQUESTS: [MessageDesc; 1] = [
        MessageDesc {
            name: "destroy",
            signature: &[],
            since: 1,
            is_destructor: true,
            child_interface: None,
        },
    ];

    static EVENTS: [MessageDesc; 0] = [];

    #[allow(dead_code)]
    mod request_opcode {
        pub const DESTROY: u16 = 0;
    }

    pub trait ShmPoolListener: Send + Sync {}

    pub struct ShmPool<Data: Send + Sync + 'static> {
        pub id: u32,
        pub runtime: Arc<PeerRuntime<Data>>,
    }

    impl<Data: Send + Sync + 'static> ShmPool<Data> {
        /// Destroy the pool.
        pub fn destroy(&self) -> Result<(), WireError> {
            let mut builder = MessageBuilder::new(self.id, 0);
            wire_core::debug::print_sent(INTERFACE.name, self.id, "destroy", &format!(""));
            self.runtime.enqueue_send(builder);
            Ok(())
        }
    }

    pub struct ShmPoolHandler<Data, L: ShmPoolListener> {
        pub listener: Option<L>,
        _data: std::marker::PhantomData<Data>,
    }

    impl<Data, L: ShmPoolListener> ShmPoolHandler<Data, L> {
        pub fn new(listener: L) -> Self {
            Self { listener: Some(listener), _data: std::marker::PhantomData }
        }

        pub fn without_listener() -> Self {
            Self { listener: None, _data: std::marker::PhantomData }
        }
    }

    impl<Data: Send + Sync + 'static, L: ShmPoolListener> Dispatch<Data> for ShmPoolHandler<Data, L> {
        fn interface(&self) -> &'static Interface { &INTERFACE }

        fn dispatch(&self, id: u32, msg: &mut MessageBuffer, _store: &ObjectStore<Data>) -> Result<(), WireError> {
            let _ = id;
            Err(WireError::UnknownOp { interface: INTERFACE.name, kind: wire_core::MessageKind::Event, op: msg.opcode() })
        }
    }
}
