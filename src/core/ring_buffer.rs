//! Byte Ring Buffer dengan dua cursor
//!
//! Satu slot selalu dikorbankan: `read == write` berarti kosong, dan buffer
//! dianggap penuh jika write maju satu langkah akan sama dengan read.
//! Kapasitas yang bisa dipakai = `capacity - 1`.
//!
//! Tidak ada sinkronisasi di sini. Semua akses dilakukan oleh `Pipe`
//! sambil memegang lock.

use super::Storage;
use crate::error::PipeError;

/// Jumlah byte yang siap dibaca
#[inline(always)]
pub fn used(rp: usize, wp: usize, capacity: usize) -> usize {
    (wp + capacity - rp) % capacity
}

/// Jumlah byte yang bisa ditulis tanpa blocking
#[inline(always)]
pub fn free(rp: usize, wp: usize, capacity: usize) -> usize {
    capacity - 1 - used(rp, wp, capacity)
}

/// Fixed-size byte ring
///
/// Storage dialokasikan sekali di `new`, tidak ada alokasi setelahnya.
#[derive(Debug)]
pub struct RingBuffer {
    storage: Storage,
    read: usize,
    write: usize,
    capacity: usize,
}

impl RingBuffer {
    /// Membuat ring buffer baru dengan `capacity` byte storage.
    ///
    /// # Errors
    /// `InvalidCapacity` jika `capacity < 2`, `AllocationFailure` jika
    /// storage tidak bisa di-map.
    pub fn new(capacity: usize) -> Result<Self, PipeError> {
        if capacity < 2 {
            return Err(PipeError::InvalidCapacity(capacity));
        }

        Ok(Self {
            storage: Storage::allocate(capacity)?,
            read: 0,
            write: 0,
            capacity,
        })
    }

    #[inline(always)]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline(always)]
    pub fn read_cursor(&self) -> usize {
        self.read
    }

    #[inline(always)]
    pub fn write_cursor(&self) -> usize {
        self.write
    }

    #[inline(always)]
    pub fn used(&self) -> usize {
        used(self.read, self.write, self.capacity)
    }

    #[inline(always)]
    pub fn free(&self) -> usize {
        free(self.read, self.write, self.capacity)
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.read == self.write
    }

    #[inline(always)]
    pub fn is_full(&self) -> bool {
        self.free() == 0
    }

    /// Berapa byte bisa dibaca dari read cursor tanpa wrap
    ///
    /// Read yang melewati ujung storage berhenti di ujung; caller harus
    /// loop untuk sisanya.
    #[inline]
    pub fn peek_contiguous_readable(&self, requested: usize) -> usize {
        if self.write > self.read {
            requested.min(self.used())
        } else {
            requested.min(self.capacity - self.read)
        }
    }

    /// Berapa byte bisa ditulis dari write cursor tanpa wrap
    #[inline]
    pub fn peek_contiguous_writable(&self, requested: usize) -> usize {
        if self.write >= self.read {
            requested.min(self.free()).min(self.capacity - self.write)
        } else {
            requested.min(self.read - self.write - 1)
        }
    }

    /// Slice `n` byte mulai dari read cursor
    ///
    /// `n` harus hasil dari `peek_contiguous_readable`.
    #[inline]
    pub fn readable(&self, n: usize) -> &[u8] {
        &self.storage.as_slice()[self.read..self.read + n]
    }

    /// Slice `n` byte mulai dari write cursor
    ///
    /// `n` harus hasil dari `peek_contiguous_writable`.
    #[inline]
    pub fn writable(&mut self, n: usize) -> &mut [u8] {
        let start = self.write;
        &mut self.storage.as_mut_slice()[start..start + n]
    }

    #[inline]
    pub fn advance_read(&mut self, n: usize) {
        self.read = advance(self.read, n, self.capacity);
    }

    #[inline]
    pub fn advance_write(&mut self, n: usize) {
        self.write = advance(self.write, n, self.capacity);
    }
}

// Wrap ke 0 tepat di `capacity`
#[inline(always)]
fn advance(cursor: usize, n: usize, capacity: usize) -> usize {
    let next = cursor + n;
    if next >= capacity {
        next - capacity
    } else {
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Tulis sampai habis atau penuh, meniru loop caller
    fn push(rb: &mut RingBuffer, data: &[u8]) -> usize {
        let mut done = 0;
        while done < data.len() {
            let n = rb.peek_contiguous_writable(data.len() - done);
            if n == 0 {
                break;
            }
            rb.writable(n).copy_from_slice(&data[done..done + n]);
            rb.advance_write(n);
            done += n;
        }
        done
    }

    fn pop(rb: &mut RingBuffer, max: usize) -> Vec<u8> {
        let mut out = Vec::new();
        while out.len() < max && !rb.is_empty() {
            let n = rb.peek_contiguous_readable(max - out.len());
            out.extend_from_slice(rb.readable(n));
            rb.advance_read(n);
        }
        out
    }

    #[test]
    fn test_fresh_buffer() {
        for capacity in [2, 3, 8, 64, 4000] {
            let rb = RingBuffer::new(capacity).unwrap();
            assert_eq!(rb.used(), 0);
            assert_eq!(rb.free(), capacity - 1);
            assert!(rb.is_empty());
        }
    }

    #[test]
    fn test_capacity_too_small() {
        assert!(matches!(
            RingBuffer::new(1),
            Err(PipeError::InvalidCapacity(1))
        ));
        assert!(matches!(
            RingBuffer::new(0),
            Err(PipeError::InvalidCapacity(0))
        ));
    }

    #[test]
    fn test_arithmetic() {
        // rp = 4, wp = 6, capacity 10
        assert_eq!(used(4, 6, 10), 2);
        assert_eq!(free(4, 6, 10), 7);

        // wrapped: wp di belakang rp
        assert_eq!(used(8, 2, 10), 4);
        assert_eq!(free(8, 2, 10), 5);

        // penuh
        assert_eq!(used(3, 2, 10), 9);
        assert_eq!(free(3, 2, 10), 0);
    }

    #[test]
    fn test_capacity_two_holds_one_byte() {
        let mut rb = RingBuffer::new(2).unwrap();

        assert_eq!(push(&mut rb, b"ab"), 1);
        assert!(rb.is_full());
        assert_eq!(pop(&mut rb, 2), b"a");
        assert!(rb.is_empty());
    }

    #[test]
    fn test_capacity_eight_example() {
        let mut rb = RingBuffer::new(8).unwrap();

        assert_eq!(push(&mut rb, b"0123456"), 7);
        assert_eq!(rb.free(), 0);
        assert_eq!(rb.peek_contiguous_writable(1), 0);

        assert_eq!(pop(&mut rb, 3), b"012");
        assert_eq!(rb.free(), 3);
        assert_eq!(push(&mut rb, b"789"), 3);
        assert_eq!(pop(&mut rb, 16), b"3456789");
    }

    #[test]
    fn test_contiguous_readable_stops_at_end() {
        let mut rb = RingBuffer::new(8).unwrap();

        push(&mut rb, b"xxxxxx");
        pop(&mut rb, 6);
        // read = write = 6
        push(&mut rb, b"abcde");
        assert_eq!(rb.write_cursor(), 3);
        assert_eq!(rb.used(), 5);

        // hanya dua byte sebelum ujung storage
        assert_eq!(rb.peek_contiguous_readable(5), 2);
        assert_eq!(rb.readable(2), b"ab");
        rb.advance_read(2);
        assert_eq!(rb.read_cursor(), 0);
        assert_eq!(rb.peek_contiguous_readable(5), 3);
    }

    #[test]
    fn test_contiguous_writable_cases() {
        let mut rb = RingBuffer::new(8).unwrap();

        // write >= read: dibatasi ujung storage
        push(&mut rb, b"xxxxx");
        pop(&mut rb, 5);
        assert_eq!(rb.peek_contiguous_writable(10), 3);

        // write < read: dibatasi read - write - 1
        push(&mut rb, b"yyyyy");
        assert_eq!(rb.write_cursor(), 2);
        assert_eq!(rb.peek_contiguous_writable(10), 2);
        assert_eq!(rb.peek_contiguous_writable(1), 1);
    }

    #[test]
    fn test_cursor_wraps_exactly_at_capacity() {
        let mut rb = RingBuffer::new(4).unwrap();

        push(&mut rb, b"abc");
        rb.advance_read(3);
        assert_eq!(rb.read_cursor(), 3);
        assert!(rb.is_empty());

        assert_eq!(push(&mut rb, b"d"), 1);
        assert_eq!(rb.write_cursor(), 0);
        assert_eq!(rb.used(), 1);
        assert_eq!(rb.readable(1), b"d");
    }

    #[test]
    fn test_wraparound() {
        let mut rb = RingBuffer::new(5).unwrap();

        // Isi dan kuras berkali-kali untuk menguji wraparound
        for round in 0u8..20 {
            let chunk = [round, round.wrapping_add(1), round.wrapping_add(2)];
            assert_eq!(push(&mut rb, &chunk), 3);
            assert_eq!(pop(&mut rb, 3), chunk);
            assert!(rb.is_empty());
        }
    }
}
