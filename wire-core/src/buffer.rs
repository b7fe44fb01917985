//! Inbound message decoding.
//!
//! A [`MessageBuffer`] wraps one fully-received message (header already
//! stripped) and offers sequential typed readers, mirroring the shape of
//! `wire/decode.go`'s `MessageBuffer` in the original implementation: each
//! `read_*` call consumes the next argument and latches the first error it
//! hits so callers can do a run of reads and check the result once at the
//! end.

use std::collections::VecDeque;
use std::os::fd::OwnedFd;

use crate::error::ParseError;
use crate::wire::padded_len;

pub struct MessageBuffer {
    sender: u32,
    opcode: u16,
    data: Vec<u8>,
    pos: usize,
    fds: VecDeque<OwnedFd>,
    err: Option<ParseError>,
}

impl MessageBuffer {
    /// Build a buffer from an already-demarshalled message: `sender`/`opcode`
    /// from the header, `data` the payload after the 8-byte header, `fds`
    /// any ancillary descriptors received alongside this message.
    pub fn from_parts(sender: u32, opcode: u16, data: Vec<u8>, fds: VecDeque<OwnedFd>) -> Self {
        MessageBuffer {
            sender,
            opcode,
            data,
            pos: 0,
            fds,
            err: None,
        }
    }

    pub fn sender(&self) -> u32 {
        self.sender
    }

    pub fn opcode(&self) -> u16 {
        self.opcode
    }

    /// Total payload length in bytes (excluding the 8-byte header).
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// The first error hit by a prior read, if any. Once set, every
    /// subsequent read call is a no-op that returns the same error.
    pub fn err(&self) -> Option<&ParseError> {
        self.err.as_ref()
    }

    fn take_bytes(&mut self, n: usize) -> Result<&[u8], ParseError> {
        if self.err.is_some() {
            return Err(ParseError::MissingData);
        }
        if self.pos + n > self.data.len() {
            self.err = Some(ParseError::MissingData);
            return Err(ParseError::MissingData);
        }
        let s = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(s)
    }

    fn fail<T>(&mut self, e: ParseError) -> Result<T, ParseError> {
        self.err.get_or_insert(e);
        Err(e)
    }

    pub fn read_int(&mut self) -> Result<i32, ParseError> {
        let b = self.take_bytes(4)?;
        Ok(i32::from_ne_bytes(b.try_into().unwrap()))
    }

    pub fn read_uint(&mut self) -> Result<u32, ParseError> {
        let b = self.take_bytes(4)?;
        Ok(u32::from_ne_bytes(b.try_into().unwrap()))
    }

    pub fn read_fixed(&mut self) -> Result<crate::fixed::Fixed, ParseError> {
        let bits = self.read_int()?;
        Ok(crate::fixed::Fixed::from_bits(bits))
    }

    /// `object`/bare `new_id` arguments: a plain u32 id, 0 meaning null.
    pub fn read_object(&mut self) -> Result<u32, ParseError> {
        self.read_uint()
    }

    pub fn read_string(&mut self) -> Result<String, ParseError> {
        let len = self.read_uint()? as usize;
        if len == 0 {
            return self.fail(ParseError::Malformed);
        }
        let padded = padded_len(len);
        let bytes = self.take_bytes(padded)?;
        if bytes[len - 1] != 0 {
            return self.fail(ParseError::Malformed);
        }
        let s = &bytes[..len - 1];
        match std::str::from_utf8(s) {
            Ok(s) => Ok(s.to_owned()),
            Err(_) => self.fail(ParseError::Malformed),
        }
    }

    pub fn read_array(&mut self) -> Result<Vec<u8>, ParseError> {
        let len = self.read_uint()? as usize;
        let padded = padded_len(len);
        let bytes = self.take_bytes(padded)?;
        Ok(bytes[..len].to_vec())
    }

    /// A polymorphic `new_id` (no prior `child_interface` in the protocol
    /// descriptor): interface name, version, then the allocated id.
    pub fn read_new_id_dynamic(&mut self) -> Result<(String, u32, u32), ParseError> {
        let interface = self.read_string()?;
        let version = self.read_uint()?;
        let id = self.read_uint()?;
        Ok((interface, version, id))
    }

    pub fn read_fd(&mut self) -> Result<OwnedFd, ParseError> {
        if self.err.is_some() {
            return Err(ParseError::MissingFd);
        }
        match self.fds.pop_front() {
            Some(fd) => Ok(fd),
            None => self.fail(ParseError::MissingFd),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buf_with(bytes: Vec<u8>) -> MessageBuffer {
        MessageBuffer::from_parts(1, 0, bytes, VecDeque::new())
    }

    #[test]
    fn reads_int_and_uint() {
        let mut b = buf_with(vec![0xFF, 0xFF, 0xFF, 0xFF, 0x2A, 0, 0, 0]);
        assert_eq!(b.read_int().unwrap(), -1);
        assert_eq!(b.read_uint().unwrap(), 42);
    }

    #[test]
    fn reads_padded_string() {
        // "hi" -> len=3 (including NUL), padded to 4
        let mut data = 3u32.to_ne_bytes().to_vec();
        data.extend_from_slice(b"hi\0\0");
        let mut b = buf_with(data);
        assert_eq!(b.read_string().unwrap(), "hi");
    }

    #[test]
    fn missing_data_latches() {
        let mut b = buf_with(vec![0, 0]);
        assert!(b.read_uint().is_err());
        assert!(b.err().is_some());
        assert!(b.read_uint().is_err());
    }

    #[test]
    fn rejects_string_missing_trailing_nul() {
        let mut data = 3u32.to_ne_bytes().to_vec();
        data.extend_from_slice(b"hiX\0"); // len=3 means last payload byte must be NUL
        let mut b = buf_with(data);
        assert!(matches!(b.read_string(), Err(ParseError::Malformed)));
    }

    #[test]
    fn reads_array_exact_bytes() {
        let mut data = 5u32.to_ne_bytes().to_vec();
        data.extend_from_slice(&[1, 2, 3, 4, 5, 0, 0, 0]);
        let mut b = buf_with(data);
        assert_eq!(b.read_array().unwrap(), vec![1, 2, 3, 4, 5]);
    }
}
