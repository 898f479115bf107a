//! Error taxonomy untuk semua operasi pipe
//!
//! `WouldBlock` dan `Interrupted` adalah hasil yang wajar (retryable),
//! bukan kegagalan fatal. Core tidak pernah retry atau menelan error.

use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipeError {
    /// Operasi non-blocking tidak bisa lanjut sekarang
    #[error("operation would block")]
    WouldBlock,

    /// Cancellation datang saat menunggu
    #[error("interrupted while waiting")]
    Interrupted,

    /// Buffer milik caller tidak valid saat copy
    #[error("bad address in caller buffer")]
    Fault,

    #[error("could not allocate {capacity} bytes of pipe storage: {source}")]
    AllocationFailure {
        capacity: usize,
        #[source]
        source: io::Error,
    },

    #[error("capacity must be at least 2 bytes, got {0}")]
    InvalidCapacity(usize),

    #[error("handle was not opened for reading")]
    NotReadable,

    #[error("handle was not opened for writing")]
    NotWritable,

    #[error("handle belongs to pipe {handle}, not pipe {pipe}")]
    ForeignHandle { handle: usize, pipe: usize },

    #[error("no pipe with index {0}")]
    NoSuchPipe(usize),

    #[error("pipe {0} failed to initialize and cannot be opened")]
    Unavailable(usize),

    #[error("pipe {0} still has open handles")]
    Busy(usize),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
}

impl PipeError {
    /// Caller boleh mencoba lagi tanpa mengubah apa pun
    #[inline]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::WouldBlock | Self::Interrupted)
    }
}

impl From<PipeError> for io::Error {
    fn from(err: PipeError) -> Self {
        let kind = match &err {
            PipeError::WouldBlock => io::ErrorKind::WouldBlock,
            PipeError::Interrupted => io::ErrorKind::Interrupted,
            PipeError::Fault => io::ErrorKind::InvalidData,
            PipeError::AllocationFailure { .. } => io::ErrorKind::OutOfMemory,
            PipeError::NotReadable | PipeError::NotWritable | PipeError::ForeignHandle { .. } => {
                io::ErrorKind::PermissionDenied
            }
            PipeError::NoSuchPipe(_) | PipeError::Unavailable(_) => io::ErrorKind::NotFound,
            PipeError::Busy(_) => io::ErrorKind::Other,
            PipeError::InvalidCapacity(_) | PipeError::Config(_) => io::ErrorKind::InvalidInput,
            PipeError::Io(e) => e.kind(),
        };
        match err {
            PipeError::Io(e) => e,
            other => io::Error::new(kind, other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_errors() {
        assert!(PipeError::WouldBlock.is_retryable());
        assert!(PipeError::Interrupted.is_retryable());
        assert!(!PipeError::Fault.is_retryable());
        assert!(!PipeError::Busy(0).is_retryable());
    }

    #[test]
    fn test_io_error_kind_mapping() {
        let e: io::Error = PipeError::WouldBlock.into();
        assert_eq!(e.kind(), io::ErrorKind::WouldBlock);

        let e: io::Error = PipeError::Interrupted.into();
        assert_eq!(e.kind(), io::ErrorKind::Interrupted);

        let e: io::Error = PipeError::NotReadable.into();
        assert_eq!(e.kind(), io::ErrorKind::PermissionDenied);
    }
}
