//! ringpipe - Bounded Blocking Byte Pipe
//!
//! Arsitektur:
//! - `core`: byte ring buffer dengan mmap storage, murni aritmatika
//! - `pipe`: mutex + dua condvar, protokol open/read/write/close blocking
//! - `registry`: pool tetap berisi pipe independen
//! - `diagnostics`: laporan state semua pipe
//!
//! ```
//! use std::io::{Read, Write};
//! use ringpipe::pipe::{AccessMode, OpenOptions, Pipe};
//!
//! let pipe = Pipe::new(0, 16)?;
//! let mut writer = OpenOptions::new(AccessMode::WriteOnly).open(&pipe)?;
//! let mut reader = OpenOptions::new(AccessMode::ReadOnly).open(&pipe)?;
//!
//! writer.write_all(b"ping")?;
//! let mut buf = [0u8; 4];
//! reader.read_exact(&mut buf)?;
//! assert_eq!(&buf, b"ping");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod config;
pub mod core;
pub mod diagnostics;
pub mod error;
pub mod pipe;
pub mod registry;

pub use config::Config;
pub use error::PipeError;
pub use pipe::{AccessMode, Blocking, CancelToken, Handle, OpenOptions, Pipe, Snapshot};
pub use registry::Registry;
