use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cooperative cancellation untuk operasi yang sedang menunggu
///
/// Clone berbagi flag yang sama. Setiap titik tunggu di `Pipe` memeriksa
/// token ini; begitu `cancel()` dipanggil, operasi yang blocked kembali
/// dengan `Interrupted` tanpa mengubah state pipe.
#[derive(Clone, Debug, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    /// Izinkan operasi blocking lagi setelah cancellation ditangani
    pub fn reset(&self) {
        self.cancelled.store(false, Ordering::Release);
    }

    #[inline(always)]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}
