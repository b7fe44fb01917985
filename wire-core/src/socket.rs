//! Unix-socket transport: raw ancillary-fd send/receive plus the
//! `Connection` type that frames whole messages on top of it and resolves
//! which socket to connect to from the environment.

use std::collections::VecDeque;
use std::env;
use std::io::{self, IoSlice, IoSliceMut};
use std::mem::MaybeUninit;
use std::os::unix::io::{AsFd, AsRawFd, BorrowedFd, FromRawFd, OwnedFd, RawFd};
use std::os::unix::net::UnixStream;
use std::path::{Path, PathBuf};
use std::slice;

use rustix::io::retry_on_intr;
use rustix::net::{
    recvmsg, send, sendmsg, RecvAncillaryBuffer, RecvAncillaryMessage, RecvFlags,
    SendAncillaryBuffer, SendAncillaryMessage, SendFlags,
};

use crate::buffer::MessageBuffer;
use crate::builder::MessageBuilder;
use crate::error::WireError;
use crate::wire::{pack_header, unpack_header, HEADER_LEN};

/// Maximum number of FDs sent in a single `sendmsg`/`recvmsg` call.
pub const MAX_FDS_OUT: usize = 28;
/// Maximum number of payload bytes read per `recvmsg` call.
pub const MAX_BYTES_IN: usize = 4096;

/// A raw Wayland-style socket: ancillary-fd aware send/receive on top of a
/// `UnixStream`, with no message framing of its own.
#[derive(Debug)]
pub struct Socket {
    stream: UnixStream,
}

impl Socket {
    pub fn send_msg(&self, bytes: &[u8], fds: &[OwnedFd]) -> io::Result<usize> {
        let flags = SendFlags::DONTWAIT | SendFlags::NOSIGNAL;
        if fds.is_empty() {
            return retry_on_intr(|| send(self, bytes, flags));
        }
        let iov = [IoSlice::new(bytes)];
        let mut cmsg_space = vec![MaybeUninit::uninit(); rustix::cmsg_space!(ScmRights(fds.len()))];
        let mut cmsg_buffer = SendAncillaryBuffer::new(&mut cmsg_space);
        let borrowed =
            unsafe { slice::from_raw_parts(fds.as_ptr() as *const BorrowedFd, fds.len()) };
        cmsg_buffer.push(SendAncillaryMessage::ScmRights(borrowed));
        retry_on_intr(|| sendmsg(self, &iov, &mut cmsg_buffer, flags))
    }

    pub fn rcv_msg(&self, buf: &mut [u8], fds: &mut VecDeque<OwnedFd>) -> io::Result<usize> {
        let flags = RecvFlags::DONTWAIT | RecvFlags::CMSG_CLOEXEC;
        let mut cmsg_space = [MaybeUninit::uninit(); rustix::cmsg_space!(ScmRights(MAX_FDS_OUT))];
        let mut cmsg_buffer = RecvAncillaryBuffer::new(&mut cmsg_space);
        let mut iov = [IoSliceMut::new(buf)];
        let msg = retry_on_intr(|| recvmsg(&self.stream, &mut iov[..], &mut cmsg_buffer, flags))?;
        let received = cmsg_buffer.drain().filter_map(|m| match m {
            RecvAncillaryMessage::ScmRights(fds) => Some(fds),
            _ => None,
        });
        fds.extend(received.flatten());
        Ok(msg.bytes)
    }
}

impl From<UnixStream> for Socket {
    fn from(stream: UnixStream) -> Self {
        Socket { stream }
    }
}

impl AsFd for Socket {
    fn as_fd(&self) -> BorrowedFd<'_> {
        self.stream.as_fd()
    }
}

impl AsRawFd for Socket {
    fn as_raw_fd(&self) -> RawFd {
        self.stream.as_raw_fd()
    }
}

/// Sequential-read ring buffer used for both the inbound byte stream and
/// staged outbound writes before a flush.
#[derive(Debug)]
struct Ring {
    storage: Vec<u8>,
    occupied: usize,
    offset: usize,
}

impl Ring {
    fn new(size: usize) -> Self {
        Ring {
            storage: vec![0; size],
            occupied: 0,
            offset: 0,
        }
    }

    fn contents(&self) -> &[u8] {
        &self.storage[self.offset..self.occupied]
    }

    fn writable(&mut self) -> &mut [u8] {
        if self.occupied >= self.storage.len() {
            self.storage.resize(self.storage.len() * 2, 0);
        }
        &mut self.storage[self.occupied..]
    }

    fn advance(&mut self, n: usize) {
        self.occupied += n;
    }

    fn consume(&mut self, n: usize) {
        self.offset += n;
    }

    fn compact(&mut self) {
        if self.offset > 0 {
            self.storage.copy_within(self.offset..self.occupied, 0);
            self.occupied -= self.offset;
            self.offset = 0;
        }
    }
}

/// A framed connection: reads and writes whole [`MessageBuffer`]s /
/// [`MessageBuilder`]s instead of raw bytes, on top of a [`Socket`].
pub struct Connection {
    socket: Socket,
    in_data: Ring,
    in_fds: VecDeque<OwnedFd>,
    out_data: Vec<u8>,
    out_fds: Vec<OwnedFd>,
}

impl Connection {
    pub fn new(stream: UnixStream) -> Self {
        Connection {
            socket: Socket::from(stream),
            in_data: Ring::new(2 * MAX_BYTES_IN),
            in_fds: VecDeque::new(),
            out_data: Vec::new(),
            out_fds: Vec::new(),
        }
    }

    /// Resolve `WAYLAND_SOCKET`/`WAYLAND_DISPLAY`/`XDG_RUNTIME_DIR` the way
    /// a reference client does, and connect.
    pub fn connect_to_env() -> Result<Connection, WireError> {
        if let Ok(raw) = env::var("WAYLAND_SOCKET") {
            let fd: RawFd = raw.parse().map_err(|_| {
                WireError::Protocol(format!("WAYLAND_SOCKET is not a valid fd: {raw}"))
            })?;
            // SAFETY: WAYLAND_SOCKET names an fd handed to us by the parent
            // process, which transfers ownership to this process.
            let owned = unsafe { OwnedFd::from_raw_fd(fd) };
            let stream = UnixStream::from(owned);
            return Ok(Connection::new(stream));
        }
        let path = socket_path()?;
        let stream = UnixStream::connect(&path)?;
        Ok(Connection::new(stream))
    }

    pub fn connect_to_path(path: impl AsRef<Path>) -> Result<Connection, WireError> {
        let stream = UnixStream::connect(path)?;
        Ok(Connection::new(stream))
    }

    /// Queue a message for sending. Does not touch the socket until
    /// [`Connection::flush`] is called.
    pub fn queue_send(&mut self, builder: MessageBuilder) -> Result<(), WireError> {
        let (sender, opcode, payload, mut fds) = builder.finish();
        let header = pack_header(sender, opcode, (HEADER_LEN + payload.len()) as u16);
        self.out_data.extend_from_slice(&header);
        self.out_data.extend_from_slice(&payload);
        self.out_fds.append(&mut fds);
        Ok(())
    }

    /// Write any queued messages to the socket. Non-blocking: returns
    /// `Ok(())` once everything queued has been handed to the kernel, or as
    /// much as could be without blocking.
    pub fn flush(&mut self) -> Result<(), WireError> {
        let mut written_bytes = 0;
        let mut written_fds = 0;
        while written_bytes < self.out_data.len() {
            let mut bytes = &self.out_data[written_bytes..];
            let mut fds = &self.out_fds[written_fds..];
            if fds.len() > MAX_FDS_OUT {
                bytes = &bytes[..1.min(bytes.len())];
                fds = &fds[..MAX_FDS_OUT];
            }
            match self.socket.send_msg(bytes, fds) {
                Ok(0) => break,
                Ok(n) => {
                    written_bytes += n;
                    written_fds += fds.len();
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock && written_bytes > 0 => break,
                Err(e) => {
                    self.out_data.drain(..written_bytes);
                    self.out_fds.drain(..written_fds);
                    return Err(e.into());
                }
            }
        }
        self.out_data.drain(..written_bytes);
        self.out_fds.drain(..written_fds);
        Ok(())
    }

    /// Block until at least one full message is available, then decode it.
    pub fn recv(&mut self) -> Result<MessageBuffer, WireError> {
        loop {
            if let Some(msg) = self.try_decode_one()? {
                return Ok(msg);
            }
            self.fill_incoming()?;
        }
    }

    fn fill_incoming(&mut self) -> Result<(), WireError> {
        self.in_data.compact();
        let n = {
            let buf = self.in_data.writable();
            blocking_recv(&self.socket, buf, &mut self.in_fds)?
        };
        if n == 0 {
            return Err(WireError::Closed);
        }
        self.in_data.advance(n);
        Ok(())
    }

    /// Shut down both directions of the underlying socket, forcing a
    /// concurrent blocked `recv` (parked in `poll`) to return rather than
    /// wait for data that will never arrive.
    pub fn shutdown(&self) -> Result<(), WireError> {
        match rustix::net::shutdown(&self.socket, rustix::net::Shutdown::ReadWrite) {
            Ok(()) | Err(rustix::io::Errno::NOTCONN) => Ok(()),
            Err(e) => Err(io::Error::from(e).into()),
        }
    }

    fn try_decode_one(&mut self) -> Result<Option<MessageBuffer>, WireError> {
        let data = self.in_data.contents();
        if data.len() < HEADER_LEN {
            return Ok(None);
        }
        let header: [u8; HEADER_LEN] = data[..HEADER_LEN].try_into().unwrap();
        let (sender, opcode, len) = unpack_header(&header);
        let len = len as usize;
        if len < HEADER_LEN || data.len() < len {
            return Ok(None);
        }
        let payload = data[HEADER_LEN..len].to_vec();
        self.in_data.consume(len);
        // Any fds attached to this socket datagram are logically associated
        // with the first message decoded from it; a message with `fd`
        // arguments must be fully decoded before more data is read.
        let fds = std::mem::take(&mut self.in_fds);
        Ok(Some(MessageBuffer::from_parts(sender, opcode, payload, fds)))
    }
}

impl AsFd for Connection {
    fn as_fd(&self) -> BorrowedFd<'_> {
        self.socket.as_fd()
    }
}

fn blocking_recv(
    socket: &Socket,
    buf: &mut [u8],
    fds: &mut VecDeque<OwnedFd>,
) -> io::Result<usize> {
    loop {
        match socket.rcv_msg(buf, fds) {
            Ok(n) => return Ok(n),
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                rustix::event::poll(
                    &mut [rustix::event::PollFd::new(socket, rustix::event::PollFlags::IN)],
                    None,
                )?;
            }
            Err(e) => return Err(e),
        }
    }
}

/// `WAYLAND_DISPLAY` joined against `XDG_RUNTIME_DIR` (or its fallback),
/// matching the reference client's discovery rule exactly.
pub fn socket_path() -> Result<PathBuf, WireError> {
    let display = env::var("WAYLAND_DISPLAY").unwrap_or_else(|_| "wayland-0".to_owned());
    let display_path = Path::new(&display);
    if display_path.is_absolute() {
        return Ok(display_path.to_owned());
    }
    let runtime_dir = env::var("XDG_RUNTIME_DIR").map(PathBuf::from).unwrap_or_else(|_| {
        let uid = rustix::process::getuid().as_raw();
        PathBuf::from(format!("/var/run/user/{uid}"))
    });
    Ok(runtime_dir.join(display_path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixed::Fixed;

    #[test]
    fn socket_path_defaults_to_wayland_0() {
        // SAFETY: test-local env mutation, no other thread in this test touches these vars.
        unsafe {
            env::remove_var("WAYLAND_DISPLAY");
            env::set_var("XDG_RUNTIME_DIR", "/tmp/xdg-test");
        }
        let p = socket_path().unwrap();
        assert_eq!(p, PathBuf::from("/tmp/xdg-test/wayland-0"));
    }

    #[test]
    fn absolute_display_name_is_used_verbatim() {
        unsafe {
            env::set_var("WAYLAND_DISPLAY", "/tmp/explicit.sock");
        }
        let p = socket_path().unwrap();
        assert_eq!(p, PathBuf::from("/tmp/explicit.sock"));
        unsafe {
            env::remove_var("WAYLAND_DISPLAY");
        }
    }

    #[test]
    fn connection_round_trips_a_message() {
        let (a, b) = UnixStream::pair().unwrap();
        let mut client = Connection::new(a);
        let mut server = Connection::new(b);

        let mut builder = MessageBuilder::new(3, 1);
        builder.write_uint(7).write_fixed(Fixed::from_int(2)).write_string("hi");
        client.queue_send(builder).unwrap();
        client.flush().unwrap();

        let mut msg = server.recv().unwrap();
        assert_eq!(msg.sender(), 3);
        assert_eq!(msg.opcode(), 1);
        assert_eq!(msg.read_uint().unwrap(), 7);
        assert_eq!(msg.read_fixed().unwrap().to_int(), 2);
        assert_eq!(msg.read_string().unwrap(), "hi");
    }
}
