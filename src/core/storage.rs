//! Anonymous mmap storage untuk byte ring
//!
//! Storage dialokasikan sekali saat pipe dibuat dan dilepas tepat sekali
//! saat di-drop. Tidak ada file backing, tidak ada persistence.

use memmap2::{MmapMut, MmapOptions};

use crate::error::PipeError;

/// Region byte berukuran tetap, zero-filled oleh kernel
pub struct Storage {
    mmap: MmapMut,
}

impl Storage {
    /// Map `capacity` bytes anonymous memory
    ///
    /// Gagal dengan `AllocationFailure` jika kernel menolak mapping.
    pub fn allocate(capacity: usize) -> Result<Self, PipeError> {
        let mmap = MmapOptions::new()
            .len(capacity)
            .map_anon()
            .map_err(|source| PipeError::AllocationFailure { capacity, source })?;

        Ok(Self { mmap })
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        self.mmap.len()
    }

    #[inline(always)]
    pub fn as_slice(&self) -> &[u8] {
        &self.mmap[..]
    }

    #[inline(always)]
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.mmap[..]
    }
}

impl std::fmt::Debug for Storage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Storage").field("len", &self.len()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_zero_filled() {
        let storage = Storage::allocate(4096).unwrap();

        assert_eq!(storage.len(), 4096);
        assert!(storage.as_slice().iter().all(|&b| b == 0));
    }

    #[test]
    fn test_storage_write_visible() {
        let mut storage = Storage::allocate(16).unwrap();

        storage.as_mut_slice()[3..8].copy_from_slice(b"scull");
        assert_eq!(&storage.as_slice()[3..8], b"scull");
    }
}
