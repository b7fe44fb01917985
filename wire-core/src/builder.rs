//! Outbound message encoding.
//!
//! [`MessageBuilder`] is the write-side counterpart of
//! [`crate::buffer::MessageBuffer`]: sequential typed writers that append to
//! an in-memory payload, plus a side list of file descriptors to be sent as
//! ancillary data. Descriptors are duplicated at attach time (`attach_fd`),
//! matching the teacher's `rs/socket.rs` convention that the sender always
//! keeps its own copy open.

use std::os::fd::{BorrowedFd, OwnedFd};

use crate::error::BuildError;
use crate::fixed::Fixed;
use crate::wire::padded_len;

pub struct MessageBuilder {
    sender: u32,
    opcode: u16,
    data: Vec<u8>,
    fds: Vec<OwnedFd>,
}

impl MessageBuilder {
    pub fn new(sender: u32, opcode: u16) -> Self {
        MessageBuilder {
            sender,
            opcode,
            data: Vec::new(),
            fds: Vec::new(),
        }
    }

    pub fn sender(&self) -> u32 {
        self.sender
    }

    pub fn opcode(&self) -> u16 {
        self.opcode
    }

    pub fn write_int(&mut self, v: i32) -> &mut Self {
        self.data.extend_from_slice(&v.to_ne_bytes());
        self
    }

    pub fn write_uint(&mut self, v: u32) -> &mut Self {
        self.data.extend_from_slice(&v.to_ne_bytes());
        self
    }

    pub fn write_fixed(&mut self, v: Fixed) -> &mut Self {
        self.write_int(v.to_bits())
    }

    /// `object`/bare `new_id` argument, 0 meaning null.
    pub fn write_object(&mut self, id: u32) -> &mut Self {
        self.write_uint(id)
    }

    pub fn write_string(&mut self, s: &str) -> &mut Self {
        let len = s.len() + 1;
        self.write_uint(len as u32);
        self.data.extend_from_slice(s.as_bytes());
        self.data.push(0);
        pad_to(&mut self.data, padded_len(len));
        self
    }

    pub fn write_array(&mut self, bytes: &[u8]) -> &mut Self {
        self.write_uint(bytes.len() as u32);
        self.data.extend_from_slice(bytes);
        pad_to(&mut self.data, padded_len(bytes.len()));
        self
    }

    /// Polymorphic `new_id`: interface name, version, allocated id.
    pub fn write_new_id_dynamic(&mut self, interface: &str, version: u32, id: u32) -> &mut Self {
        self.write_string(interface);
        self.write_uint(version);
        self.write_uint(id);
        self
    }

    /// Attach a file descriptor to be sent as ancillary data. The descriptor
    /// is duplicated immediately so the caller retains ownership of `fd`.
    pub fn attach_fd(&mut self, fd: BorrowedFd<'_>) -> Result<&mut Self, BuildError> {
        let dup = rustix::io::dup(fd).map_err(|e| BuildError::DupFdFailed(e.into()))?;
        self.fds.push(dup);
        Ok(self)
    }

    /// Consume the builder, returning the payload bytes (without the
    /// 8-byte header, which the caller/socket layer prepends) and the
    /// descriptors to send alongside it.
    pub fn finish(self) -> (u32, u16, Vec<u8>, Vec<OwnedFd>) {
        (self.sender, self.opcode, self.data, self.fds)
    }
}

fn pad_to(data: &mut Vec<u8>, padded_len: usize) {
    while data.len() < padded_len {
        data.push(0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::MessageBuffer;
    use std::collections::VecDeque;

    #[test]
    fn round_trips_through_buffer() {
        let mut b = MessageBuilder::new(3, 1);
        b.write_int(-5)
            .write_uint(9)
            .write_fixed(Fixed::from_int(2))
            .write_string("hello")
            .write_array(&[1, 2, 3]);
        let (sender, opcode, data, fds) = b.finish();
        assert_eq!(sender, 3);
        assert_eq!(opcode, 1);
        assert!(fds.is_empty());

        let mut r = MessageBuffer::from_parts(sender, opcode, data, VecDeque::new());
        assert_eq!(r.read_int().unwrap(), -5);
        assert_eq!(r.read_uint().unwrap(), 9);
        assert_eq!(r.read_fixed().unwrap().to_int(), 2);
        assert_eq!(r.read_string().unwrap(), "hello");
        assert_eq!(r.read_array().unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn string_padding_is_four_aligned() {
        let mut b = MessageBuilder::new(1, 0);
        b.write_string("abc"); // len 4 -> already aligned, +0 pad
        let (_, _, data, _) = b.finish();
        assert_eq!(data.len() % 4, 0);
    }
}
