//! Notifikasi "readable" setelah write
//!
//! Pengganti async signal: subscriber didaftarkan per handle saat open,
//! dipanggil setelah setiap write sukses melepas lock. Best-effort,
//! subscriber yang gagal tidak mempengaruhi write.

use std::io;
use std::sync::Arc;

use mio::{Poll, Token, Waker};
use tracing::trace;

/// Penerima notifikasi input tersedia
pub trait Subscriber: Send + Sync {
    /// Dipanggil tanpa lock pipe. `index` = index pipe yang ditulis.
    fn notify_readable(&self, index: usize);
}

impl<F> Subscriber for F
where
    F: Fn(usize) + Send + Sync,
{
    fn notify_readable(&self, index: usize) {
        self(index)
    }
}

/// Subscriber yang membangunkan event loop `mio::Poll`
///
/// Reader bisa menunggu beberapa pipe sekaligus dari satu `Poll`, lalu
/// membaca dengan `Blocking::NonBlock` saat token-nya muncul.
pub struct WakerSubscriber {
    waker: Waker,
}

impl WakerSubscriber {
    pub fn new(poll: &Poll, token: Token) -> io::Result<Arc<Self>> {
        let waker = Waker::new(poll.registry(), token)?;
        Ok(Arc::new(Self { waker }))
    }
}

impl Subscriber for WakerSubscriber {
    fn notify_readable(&self, index: usize) {
        if let Err(e) = self.waker.wake() {
            trace!(pipe = index, error = %e, "waker notification dropped");
        }
    }
}
