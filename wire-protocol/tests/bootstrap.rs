//! End-to-end bootstrap: a fake server advertises two globals and answers
//! a `wl_display.sync`; the client side collects them via
//! [`wire_protocol::collect_globals`] in the order they were sent.

use std::os::unix::net::UnixStream;

use wire_core::{Connection, MessageBuilder};
use wire_protocol::collect_globals;

#[test]
fn bootstrap_collects_advertised_globals_in_order() {
    let (client_sock, server_sock) = UnixStream::pair().unwrap();

    let responder = std::thread::spawn(move || {
        let mut server_conn = Connection::new(server_sock);

        // wl_display.get_registry(new_id registry)
        let mut get_registry = server_conn.recv().unwrap();
        assert_eq!(get_registry.sender(), wire_core::store::DISPLAY_ID);
        assert_eq!(get_registry.opcode(), 1);
        let registry_id = get_registry.read_object().unwrap();

        // wl_display.sync(new_id callback)
        let mut sync = server_conn.recv().unwrap();
        assert_eq!(sync.sender(), wire_core::store::DISPLAY_ID);
        assert_eq!(sync.opcode(), 0);
        let callback_id = sync.read_object().unwrap();

        for (name, interface, version) in [(1u32, "wl_compositor", 1u32), (2, "wl_shm", 1)] {
            let mut global = MessageBuilder::new(registry_id, 0); // wl_registry.global
            global.write_uint(name);
            global.write_string(interface);
            global.write_uint(version);
            server_conn.queue_send(global).unwrap();
        }

        let mut done = MessageBuilder::new(callback_id, 0); // wl_callback.done
        done.write_uint(0);
        server_conn.queue_send(done).unwrap();
        server_conn.flush().unwrap();
    });

    let globals = collect_globals(Connection::new(client_sock)).unwrap();
    responder.join().unwrap();

    assert_eq!(globals.len(), 2);
    assert_eq!(globals[0].name, 1);
    assert_eq!(globals[0].interface, "wl_compositor");
    assert_eq!(globals[0].version, 1);
    assert_eq!(globals[1].name, 2);
    assert_eq!(globals[1].interface, "wl_shm");
}
