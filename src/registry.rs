//! Registry: pool tetap berisi pipe independen
//!
//! Dibuat sekali sebelum open pertama, dilepas sekali saat shutdown.
//! Tidak ada global state; registry di-pass by reference ke caller.

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use crate::config::Config;
use crate::error::PipeError;
use crate::pipe::{CancelToken, Handle, OpenOptions, Pipe, Snapshot};

enum Slot {
    Ready(Arc<Pipe>),
    /// Storage gagal dialokasikan; slot tidak boleh dibuka
    Failed,
}

pub struct Registry {
    slots: Vec<Slot>,
}

impl Registry {
    /// Buat `config.pipe_count` pipe dengan `config.buffer_size` byte
    ///
    /// Kegagalan alokasi hanya mematikan slot itu sendiri.
    pub fn new(config: &Config) -> Result<Self, PipeError> {
        Self::with_factory(config, Pipe::with_poll_interval)
    }

    /// Seperti `new`, dengan constructor pipe yang bisa diganti
    pub fn with_factory<F>(config: &Config, mut factory: F) -> Result<Self, PipeError>
    where
        F: FnMut(usize, usize, Duration) -> Result<Arc<Pipe>, PipeError>,
    {
        config.validate()?;
        info!(
            pipes = config.pipe_count,
            buffer_size = config.buffer_size,
            "initializing pipe registry"
        );

        let slots = (0..config.pipe_count)
            .map(
                |index| match factory(index, config.buffer_size, config.poll_interval()) {
                    Ok(pipe) => Slot::Ready(pipe),
                    Err(e) => {
                        warn!(pipe = index, error = %e, "pipe unavailable");
                        Slot::Failed
                    }
                },
            )
            .collect();

        Ok(Self { slots })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn pipe(&self, index: usize) -> Result<&Arc<Pipe>, PipeError> {
        match self.slots.get(index) {
            Some(Slot::Ready(pipe)) => Ok(pipe),
            Some(Slot::Failed) => Err(PipeError::Unavailable(index)),
            None => Err(PipeError::NoSuchPipe(index)),
        }
    }

    pub fn open(&self, index: usize, options: &OpenOptions) -> Result<Handle, PipeError> {
        options.open(self.pipe(index)?)
    }

    /// Snapshot semua slot sesuai urutan pembuatan; `None` untuk slot gagal
    pub fn snapshots(&self, cancel: &CancelToken) -> Result<Vec<Option<Snapshot>>, PipeError> {
        self.slots
            .iter()
            .map(|slot| match slot {
                Slot::Ready(pipe) => pipe.snapshot(cancel).map(Some),
                Slot::Failed => Ok(None),
            })
            .collect()
    }

    /// Lepas semua pipe
    ///
    /// Semua slot dicek dulu; jika masih ada handle terbuka, registry
    /// dikembalikan utuh bersama `Busy` supaya caller bisa coba lagi.
    pub fn shutdown(self) -> Result<(), (Self, PipeError)> {
        let busy = self.slots.iter().position(|slot| match slot {
            Slot::Ready(pipe) => Arc::strong_count(pipe) > 1,
            Slot::Failed => false,
        });

        if let Some(index) = busy {
            warn!(pipe = index, "pipe still open at shutdown");
            return Err((self, PipeError::Busy(index)));
        }

        for (index, slot) in self.slots.into_iter().enumerate() {
            if let Slot::Ready(pipe) = slot {
                drop(pipe);
                info!(pipe = index, "pipe removed");
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipe::{AccessMode, Blocking};
    use std::io;

    fn small_config() -> Config {
        Config {
            pipe_count: 3,
            buffer_size: 16,
            poll_interval_ms: 1,
        }
    }

    #[test]
    fn test_pipes_created_in_order() {
        let registry = Registry::new(&small_config()).unwrap();

        assert_eq!(registry.len(), 3);
        for index in 0..3 {
            let pipe = registry.pipe(index).unwrap();
            assert_eq!(pipe.index(), index);
        }
        assert!(matches!(registry.pipe(3), Err(PipeError::NoSuchPipe(3))));
    }

    #[test]
    fn test_pipes_are_independent() {
        let registry = Registry::new(&small_config()).unwrap();
        let rw = OpenOptions::new(AccessMode::ReadWrite);

        let a = registry.open(0, &rw).unwrap();
        let b = registry.open(1, &rw).unwrap();
        a.pipe().write(&a, b"only in zero", Blocking::Block).unwrap();

        let snaps = registry.snapshots(&CancelToken::new()).unwrap();
        assert_eq!(snaps[0].unwrap().used, 12);
        assert_eq!(snaps[1].unwrap().used, 0);
        drop(b);
    }

    #[test]
    fn test_allocation_failure_only_affects_one_slot() {
        let registry = Registry::with_factory(&small_config(), |index, capacity, poll| {
            if index == 1 {
                Err(PipeError::AllocationFailure {
                    capacity,
                    source: io::Error::from(io::ErrorKind::OutOfMemory),
                })
            } else {
                Pipe::with_poll_interval(index, capacity, poll)
            }
        })
        .unwrap();

        let options = OpenOptions::new(AccessMode::WriteOnly);
        assert!(registry.open(0, &options).is_ok());
        assert!(matches!(
            registry.open(1, &options),
            Err(PipeError::Unavailable(1))
        ));
        assert!(registry.open(2, &options).is_ok());

        let snaps = registry.snapshots(&CancelToken::new()).unwrap();
        assert!(snaps[1].is_none());
    }

    #[test]
    fn test_shutdown_refuses_open_handles() {
        let registry = Registry::new(&small_config()).unwrap();
        let handle = registry
            .open(2, &OpenOptions::new(AccessMode::WriteOnly))
            .unwrap();

        let (registry, err) = registry.shutdown().unwrap_err();
        assert!(matches!(err, PipeError::Busy(2)));
        // handle masih bisa dipakai
        assert_eq!(
            handle.pipe().write(&handle, b"x", Blocking::NonBlock).unwrap(),
            1
        );

        drop(handle);
        assert!(registry.shutdown().is_ok());
    }

    #[test]
    fn test_busy_shutdown_keeps_idle_pipes() {
        let registry = Registry::new(&small_config()).unwrap();
        let idle = Arc::downgrade(registry.pipe(0).unwrap());
        let _busy = registry
            .open(2, &OpenOptions::new(AccessMode::WriteOnly))
            .unwrap();

        let (registry, err) = registry.shutdown().unwrap_err();
        assert!(matches!(err, PipeError::Busy(2)));
        assert!(idle.upgrade().is_some());

        let w = registry
            .open(0, &OpenOptions::new(AccessMode::ReadWrite))
            .unwrap();
        assert_eq!(w.pipe().write(&w, b"ok", Blocking::NonBlock).unwrap(), 2);
    }

    #[test]
    fn test_clean_shutdown() {
        let registry = Registry::new(&small_config()).unwrap();
        {
            let _h = registry
                .open(0, &OpenOptions::new(AccessMode::ReadWrite))
                .unwrap();
        }
        assert!(registry.shutdown().is_ok());
    }
}
