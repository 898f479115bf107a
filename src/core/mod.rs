//! Core module: byte ring buffer dengan mmap backing
//!
//! Prinsip desain:
//! - No-Allocation: storage di-map sekali saat pipe dibuat
//! - No-Sync: ring buffer murni aritmatika, locking ada di `pipe`
//! - One slot sacrificed: kosong vs penuh cukup dibedakan dua cursor

mod ring_buffer;
mod storage;

pub use ring_buffer::{free, used, RingBuffer};
pub use storage::Storage;
