//! Copy seams antara ring storage dan buffer milik caller
//!
//! Slice biasa tidak pernah gagal. Buffer yang dipinjam dari luar proses
//! (shared memory, guest memory, dsb.) bisa gagal di tengah copy; pipe
//! lalu membatalkan operasi dengan `Fault` tanpa memajukan cursor.

/// Copy gagal karena buffer caller tidak valid
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fault;

/// Tujuan read
pub trait Destination {
    /// Maksimum byte yang diminta caller
    fn capacity(&self) -> usize;

    /// Salin `src` ke awal buffer. `src.len() <= capacity()`.
    fn accept(&mut self, src: &[u8]) -> Result<(), Fault>;
}

/// Sumber write
pub trait Source {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Salin `dst.len()` byte pertama ke `dst`
    fn drain_into(&self, dst: &mut [u8]) -> Result<(), Fault>;
}

impl Destination for [u8] {
    #[inline(always)]
    fn capacity(&self) -> usize {
        self.len()
    }

    #[inline(always)]
    fn accept(&mut self, src: &[u8]) -> Result<(), Fault> {
        self[..src.len()].copy_from_slice(src);
        Ok(())
    }
}

impl Source for [u8] {
    #[inline(always)]
    fn len(&self) -> usize {
        <[u8]>::len(self)
    }

    #[inline(always)]
    fn drain_into(&self, dst: &mut [u8]) -> Result<(), Fault> {
        dst.copy_from_slice(&self[..dst.len()]);
        Ok(())
    }
}

impl<const N: usize> Destination for [u8; N] {
    #[inline(always)]
    fn capacity(&self) -> usize {
        N
    }

    #[inline(always)]
    fn accept(&mut self, src: &[u8]) -> Result<(), Fault> {
        self[..].accept(src)
    }
}

impl<const N: usize> Source for [u8; N] {
    #[inline(always)]
    fn len(&self) -> usize {
        N
    }

    #[inline(always)]
    fn drain_into(&self, dst: &mut [u8]) -> Result<(), Fault> {
        self[..].drain_into(dst)
    }
}
