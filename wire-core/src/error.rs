use std::fmt;
use std::io;

use crate::object::MessageKind;

/// Error produced while reading arguments out of a [`crate::buffer::MessageBuffer`].
#[derive(Debug, Clone, Copy)]
pub enum ParseError {
    /// The message ended before the requested argument could be read.
    MissingData,
    /// A `fd` argument was requested but no ancillary descriptor was queued.
    MissingFd,
    /// The payload could not be decoded as the requested type (bad string
    /// length, non-4-aligned array, etc).
    Malformed,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::MissingData => write!(f, "message ended before argument"),
            ParseError::MissingFd => write!(f, "no file descriptor available"),
            ParseError::Malformed => write!(f, "malformed argument"),
        }
    }
}

impl std::error::Error for ParseError {}

/// Error produced while writing arguments into a [`crate::builder::MessageBuilder`].
#[derive(Debug)]
pub enum BuildError {
    /// Duplicating a file descriptor for attachment failed.
    DupFdFailed(io::Error),
}

impl fmt::Display for BuildError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildError::DupFdFailed(e) => write!(f, "failed to duplicate file descriptor: {e}"),
        }
    }
}

impl std::error::Error for BuildError {}

/// Errors that can surface while the object store allocates or looks up ids.
#[derive(Debug)]
pub enum StoreError {
    /// The requested id was already occupied by a live object.
    IdInUse(u32),
    /// The id is outside the caller's half of the id space.
    IdOutOfRange(u32),
    /// No id was found in the table.
    Unknown(u32),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::IdInUse(id) => write!(f, "object id {id} is already in use"),
            StoreError::IdOutOfRange(id) => write!(f, "object id {id} is out of range"),
            StoreError::Unknown(id) => write!(f, "no object with id {id}"),
        }
    }
}

impl std::error::Error for StoreError {}

/// Top-level error type covering socket I/O, protocol violations and the
/// object-store/codec errors above. Returned from every fallible public
/// entry point of this crate.
#[derive(Debug)]
pub enum WireError {
    Io(io::Error),
    Parse(ParseError),
    Build(BuildError),
    Store(StoreError),
    /// The peer sent a message referencing an object id this side has no
    /// record of.
    UnknownSender(u32),
    /// A fatal protocol violation was detected (id collision, signature
    /// mismatch). The connection must be closed.
    Protocol(String),
    /// An inbound message's opcode has no corresponding entry in the
    /// addressed interface's request/event table.
    UnknownOp {
        interface: &'static str,
        kind: MessageKind,
        op: u16,
    },
    /// An inbound message arrived for an object with no listener installed.
    NilListener,
    /// The peer's runtime has already been shut down.
    Closed,
}

impl fmt::Display for WireError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WireError::Io(e) => write!(f, "i/o error: {e}"),
            WireError::Parse(e) => write!(f, "{e}"),
            WireError::Build(e) => write!(f, "{e}"),
            WireError::Store(e) => write!(f, "{e}"),
            WireError::UnknownSender(id) => write!(f, "message from unknown object {id}"),
            WireError::Protocol(msg) => write!(f, "protocol error: {msg}"),
            WireError::UnknownOp { interface, kind, op } => {
                write!(f, "unknown {kind} opcode {op} for interface {interface}")
            }
            WireError::NilListener => write!(f, "message dispatched with no listener installed"),
            WireError::Closed => write!(f, "connection closed"),
        }
    }
}

impl std::error::Error for WireError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            WireError::Io(e) => Some(e),
            WireError::Parse(e) => Some(e),
            WireError::Build(e) => Some(e),
            WireError::Store(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for WireError {
    fn from(e: io::Error) -> Self {
        WireError::Io(e)
    }
}

impl From<ParseError> for WireError {
    fn from(e: ParseError) -> Self {
        WireError::Parse(e)
    }
}

impl From<BuildError> for WireError {
    fn from(e: BuildError) -> Self {
        WireError::Build(e)
    }
}

impl From<StoreError> for WireError {
    fn from(e: StoreError) -> Self {
        WireError::Store(e)
    }
}

pub type Result<T> = std::result::Result<T, WireError>;
