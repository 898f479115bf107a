//! Pipe: blocking byte channel di atas satu `RingBuffer`
//!
//! Satu mutex melindungi ring dan participant count. Dua condvar:
//! - `data_ready`: data baru masuk, atau writer datang/pergi
//! - `space_ready`: ruang kosong bertambah
//!
//! Semua titik tunggu (lock, open-for-read, read, write) bisa di-cancel
//! lewat `CancelToken`. Tunggu dilakukan per `poll_interval` lalu predicate
//! dicek ulang, jadi spurious wakeup dan cancellation ditangani sama.

mod cancel;
mod handle;
mod notify;
mod transfer;

pub use cancel::CancelToken;
pub use handle::{AccessMode, Blocking, Handle, OpenOptions};
pub use notify::{Subscriber, WakerSubscriber};
pub use transfer::{Destination, Fault, Source};

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Condvar, Mutex, MutexGuard, RwLock};
use tracing::{debug, trace};

use crate::core::RingBuffer;
use crate::error::PipeError;

/// Granularity pengecekan cancellation saat menunggu
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(10);

struct PipeState {
    buffer: RingBuffer,
    readers: usize,
    writers: usize,
}

/// State pipe yang dilihat endpoint diagnostik
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Snapshot {
    pub index: usize,
    pub capacity: usize,
    pub used: usize,
    pub free: usize,
    pub readers: usize,
    pub writers: usize,
}

/// Satu instance pipe
pub struct Pipe {
    index: usize,
    poll_interval: Duration,
    state: Mutex<PipeState>,
    data_ready: Condvar,
    space_ready: Condvar,
    subscribers: RwLock<Vec<(u64, Arc<dyn Subscriber>)>>,
    next_subscriber: AtomicU64,
}

impl Pipe {
    /// Membuat pipe dengan storage `capacity` byte (usable `capacity - 1`)
    pub fn new(index: usize, capacity: usize) -> Result<Arc<Self>, PipeError> {
        Self::with_poll_interval(index, capacity, DEFAULT_POLL_INTERVAL)
    }

    pub fn with_poll_interval(
        index: usize,
        capacity: usize,
        poll_interval: Duration,
    ) -> Result<Arc<Self>, PipeError> {
        let buffer = RingBuffer::new(capacity)?;

        Ok(Arc::new(Self {
            index,
            poll_interval,
            state: Mutex::new(PipeState {
                buffer,
                readers: 0,
                writers: 0,
            }),
            data_ready: Condvar::new(),
            space_ready: Condvar::new(),
            subscribers: RwLock::new(Vec::new()),
            next_subscriber: AtomicU64::new(0),
        }))
    }

    #[inline(always)]
    pub fn index(&self) -> usize {
        self.index
    }

    /// Buka pipe sesuai `options`
    ///
    /// Read-only menunggu sampai ada writer (atau gagal `WouldBlock` dalam
    /// mode non-blocking). Write-only dan read-write tidak pernah menunggu.
    /// Open yang gagal tidak meninggalkan jejak di participant count.
    pub fn open(self: &Arc<Self>, options: &OpenOptions) -> Result<Handle, PipeError> {
        let cancel = &options.cancel;
        let mut state = self.lock(cancel)?;

        match options.mode {
            AccessMode::ReadOnly => {
                state.readers += 1;
                while state.writers == 0 {
                    if options.blocking == Blocking::NonBlock {
                        state.readers -= 1;
                        return Err(PipeError::WouldBlock);
                    }
                    trace!(pipe = self.index, "reader waiting for a writer");
                    if let Err(e) = self.wait(&mut state, &self.data_ready, cancel) {
                        state.readers -= 1;
                        return Err(e);
                    }
                }
            }
            AccessMode::WriteOnly => {
                state.writers += 1;
                self.data_ready.notify_all();
            }
            AccessMode::ReadWrite => {
                state.readers += 1;
                state.writers += 1;
                self.data_ready.notify_all();
            }
        }

        debug!(
            pipe = self.index,
            mode = ?options.mode,
            readers = state.readers,
            writers = state.writers,
            "opened"
        );
        drop(state);

        let subscriber_id = options
            .subscriber
            .as_ref()
            .map(|sub| self.subscribe(Arc::clone(sub)));

        Ok(Handle {
            pipe: Arc::clone(self),
            mode: options.mode,
            blocking: options.blocking,
            cancel: options.cancel.clone(),
            subscriber_id,
        })
    }

    /// Baca paling banyak `dst.capacity()` byte
    ///
    /// Return 0 jika tidak ada writer, walaupun masih ada data di buffer.
    /// Destination kosong (`dst.capacity() == 0`) juga selalu return 0.
    /// Short read normal terjadi saat data wrap melewati ujung storage.
    pub fn read<D>(
        &self,
        handle: &Handle,
        dst: &mut D,
        blocking: Blocking,
    ) -> Result<usize, PipeError>
    where
        D: Destination + ?Sized,
    {
        self.check_handle(handle)?;
        if !handle.mode.can_read() {
            return Err(PipeError::NotReadable);
        }

        let cancel = &handle.cancel;
        let mut state = self.lock(cancel)?;

        if state.writers == 0 {
            return Ok(0);
        }

        while state.buffer.is_empty() {
            if blocking == Blocking::NonBlock {
                return Err(PipeError::WouldBlock);
            }
            trace!(pipe = self.index, "reader going to sleep");
            self.wait(&mut state, &self.data_ready, cancel)?;

            // Writer terakhir pergi saat kita tidur
            if state.writers == 0 {
                return Ok(0);
            }
        }

        let n = state.buffer.peek_contiguous_readable(dst.capacity());
        dst.accept(state.buffer.readable(n))
            .map_err(|Fault| PipeError::Fault)?;
        state.buffer.advance_read(n);
        drop(state);

        self.space_ready.notify_all();
        trace!(pipe = self.index, bytes = n, "read");
        Ok(n)
    }

    /// Tulis paling banyak `src.len()` byte
    ///
    /// Byte dari satu panggilan selalu contiguous di buffer. Short write
    /// normal; caller loop untuk sisanya.
    pub fn write<S>(&self, handle: &Handle, src: &S, blocking: Blocking) -> Result<usize, PipeError>
    where
        S: Source + ?Sized,
    {
        self.check_handle(handle)?;
        if !handle.mode.can_write() {
            return Err(PipeError::NotWritable);
        }

        let cancel = &handle.cancel;
        let mut state = self.lock(cancel)?;

        while state.buffer.is_full() {
            if blocking == Blocking::NonBlock {
                return Err(PipeError::WouldBlock);
            }
            trace!(pipe = self.index, "writer going to sleep");
            self.wait(&mut state, &self.space_ready, cancel)?;
        }

        let n = state.buffer.peek_contiguous_writable(src.len());
        src.drain_into(state.buffer.writable(n))
            .map_err(|Fault| PipeError::Fault)?;
        state.buffer.advance_write(n);
        drop(state);

        self.data_ready.notify_all();
        if n > 0 {
            self.notify_subscribers();
        }
        trace!(pipe = self.index, bytes = n, "write");
        Ok(n)
    }

    /// Snapshot read-only untuk diagnostik. Tidak pernah menunggu condvar.
    pub fn snapshot(&self, cancel: &CancelToken) -> Result<Snapshot, PipeError> {
        let state = self.lock(cancel)?;

        Ok(Snapshot {
            index: self.index,
            capacity: state.buffer.capacity(),
            used: state.buffer.used(),
            free: state.buffer.free(),
            readers: state.readers,
            writers: state.writers,
        })
    }

    /// Close: dipanggil dari `Drop` milik `Handle`
    ///
    /// Writer terakhir yang pergi membangunkan reader yang sedang tidur
    /// supaya mereka melihat `writers == 0` dan kembali dengan 0.
    pub(crate) fn release(&self, mode: AccessMode, subscriber_id: Option<u64>) {
        if let Some(id) = subscriber_id {
            self.subscribers.write().retain(|(sid, _)| *sid != id);
        }

        let mut state = self.state.lock();
        if mode.can_read() {
            debug_assert!(state.readers > 0, "reader count underflow");
            state.readers = state.readers.saturating_sub(1);
        }
        if mode.can_write() {
            debug_assert!(state.writers > 0, "writer count underflow");
            state.writers = state.writers.saturating_sub(1);
            if state.writers == 0 {
                self.data_ready.notify_all();
            }
        }

        debug!(
            pipe = self.index,
            mode = ?mode,
            readers = state.readers,
            writers = state.writers,
            "closed"
        );
    }

    fn check_handle(&self, handle: &Handle) -> Result<(), PipeError> {
        if std::ptr::eq(Arc::as_ptr(&handle.pipe), self) {
            Ok(())
        } else {
            Err(PipeError::ForeignHandle {
                handle: handle.pipe.index,
                pipe: self.index,
            })
        }
    }

    /// Ambil lock, bisa di-interrupt selama menunggu
    fn lock(&self, cancel: &CancelToken) -> Result<MutexGuard<'_, PipeState>, PipeError> {
        if let Some(guard) = self.state.try_lock() {
            return Ok(guard);
        }
        loop {
            if cancel.is_cancelled() {
                return Err(PipeError::Interrupted);
            }
            if let Some(guard) = self.state.try_lock_for(self.poll_interval) {
                return Ok(guard);
            }
        }
    }

    /// Satu putaran tunggu; caller wajib cek ulang predicate
    fn wait(
        &self,
        state: &mut MutexGuard<'_, PipeState>,
        condvar: &Condvar,
        cancel: &CancelToken,
    ) -> Result<(), PipeError> {
        if cancel.is_cancelled() {
            return Err(PipeError::Interrupted);
        }
        condvar.wait_for(state, self.poll_interval);
        if cancel.is_cancelled() {
            return Err(PipeError::Interrupted);
        }
        Ok(())
    }

    fn subscribe(&self, subscriber: Arc<dyn Subscriber>) -> u64 {
        let id = self.next_subscriber.fetch_add(1, Ordering::Relaxed);
        self.subscribers.write().push((id, subscriber));
        id
    }

    fn notify_subscribers(&self) {
        let subscribers: Vec<Arc<dyn Subscriber>> = {
            let list = self.subscribers.read();
            if list.is_empty() {
                return;
            }
            list.iter().map(|(_, sub)| Arc::clone(sub)).collect()
        };

        for sub in subscribers {
            sub.notify_readable(self.index);
        }
    }
}
