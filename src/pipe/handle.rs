use std::fmt;
use std::io;
use std::sync::Arc;

use super::{CancelToken, Pipe, Subscriber};
use crate::error::PipeError;

/// Hak akses yang diminta saat open
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMode {
    ReadOnly,
    WriteOnly,
    ReadWrite,
}

impl AccessMode {
    #[inline(always)]
    pub fn can_read(self) -> bool {
        matches!(self, Self::ReadOnly | Self::ReadWrite)
    }

    #[inline(always)]
    pub fn can_write(self) -> bool {
        matches!(self, Self::WriteOnly | Self::ReadWrite)
    }
}

/// Kebijakan saat operasi tidak bisa langsung lanjut
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Blocking {
    /// Tidur sampai kondisi terpenuhi atau di-cancel
    #[default]
    Block,
    /// Langsung gagal dengan `WouldBlock`
    NonBlock,
}

/// Builder untuk membuka pipe, mirip `std::fs::OpenOptions`
///
/// ```
/// use ringpipe::pipe::{AccessMode, OpenOptions, Pipe};
///
/// let pipe = Pipe::new(0, 64)?;
/// let writer = OpenOptions::new(AccessMode::WriteOnly).open(&pipe)?;
/// let reader = OpenOptions::new(AccessMode::ReadOnly)
///     .nonblocking(true)
///     .open(&pipe)?;
/// # drop((writer, reader));
/// # Ok::<(), ringpipe::PipeError>(())
/// ```
#[derive(Clone)]
pub struct OpenOptions {
    pub(crate) mode: AccessMode,
    pub(crate) blocking: Blocking,
    pub(crate) cancel: CancelToken,
    pub(crate) subscriber: Option<Arc<dyn Subscriber>>,
}

impl OpenOptions {
    pub fn new(mode: AccessMode) -> Self {
        Self {
            mode,
            blocking: Blocking::Block,
            cancel: CancelToken::new(),
            subscriber: None,
        }
    }

    /// Default mode untuk open dan untuk `io::Read`/`io::Write` pada handle
    pub fn nonblocking(&mut self, nonblocking: bool) -> &mut Self {
        self.blocking = if nonblocking {
            Blocking::NonBlock
        } else {
            Blocking::Block
        };
        self
    }

    pub fn cancel_token(&mut self, token: CancelToken) -> &mut Self {
        self.cancel = token;
        self
    }

    /// Daftarkan subscriber "readable" selama handle terbuka
    pub fn subscriber(&mut self, subscriber: Arc<dyn Subscriber>) -> &mut Self {
        self.subscriber = Some(subscriber);
        self
    }

    pub fn open(&self, pipe: &Arc<Pipe>) -> Result<Handle, PipeError> {
        pipe.open(self)
    }
}

impl fmt::Debug for OpenOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenOptions")
            .field("mode", &self.mode)
            .field("blocking", &self.blocking)
            .field("subscriber", &self.subscriber.is_some())
            .finish()
    }
}

/// Handle terbuka ke satu pipe
///
/// Drop = close: participant count dikurangi dan subscriber dilepas.
pub struct Handle {
    pub(crate) pipe: Arc<Pipe>,
    pub(crate) mode: AccessMode,
    pub(crate) blocking: Blocking,
    pub(crate) cancel: CancelToken,
    pub(crate) subscriber_id: Option<u64>,
}

impl Handle {
    #[inline(always)]
    pub fn pipe(&self) -> &Arc<Pipe> {
        &self.pipe
    }

    #[inline(always)]
    pub fn index(&self) -> usize {
        self.pipe.index()
    }

    #[inline(always)]
    pub fn mode(&self) -> AccessMode {
        self.mode
    }

    #[inline(always)]
    pub fn blocking(&self) -> Blocking {
        self.blocking
    }

    #[inline(always)]
    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    pub fn close(self) {
        drop(self);
    }
}

impl Drop for Handle {
    fn drop(&mut self) {
        self.pipe.release(self.mode, self.subscriber_id);
    }
}

impl fmt::Debug for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handle")
            .field("pipe", &self.pipe.index())
            .field("mode", &self.mode)
            .field("blocking", &self.blocking)
            .finish()
    }
}

impl io::Read for Handle {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        Ok(self.pipe.read(self, buf, self.blocking)?)
    }
}

impl io::Write for Handle {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        Ok(self.pipe.write(self, buf, self.blocking)?)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
