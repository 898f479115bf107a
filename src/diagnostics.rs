//! Laporan diagnostik untuk semua pipe di registry
//!
//! Satu baris per pipe sesuai urutan pembuatan:
//!
//! ```text
//! Device 0 buffersize 4000 used 12 free 3987 readers 1 writers 1
//! Device 1 unavailable
//! ```
//!
//! Snapshot diambil dulu untuk semua pipe, baru ditulis. `Interrupted`
//! saat mengambil lock diteruskan ke caller (retryable).

use std::io::Write;

use crate::error::PipeError;
use crate::pipe::{CancelToken, Snapshot};
use crate::registry::Registry;

pub fn write_report<W: Write>(
    registry: &Registry,
    out: &mut W,
    cancel: &CancelToken,
) -> Result<(), PipeError> {
    let snapshots = registry.snapshots(cancel)?;

    for (index, snapshot) in snapshots.iter().enumerate() {
        match snapshot {
            Some(snap) => writeln!(out, "{}", format_line(snap))?,
            None => writeln!(out, "Device {} unavailable", index)?,
        }
    }

    Ok(())
}

/// Render laporan ke `String`
pub fn report(registry: &Registry, cancel: &CancelToken) -> Result<String, PipeError> {
    let mut out = Vec::new();
    write_report(registry, &mut out, cancel)?;
    Ok(String::from_utf8_lossy(&out).into_owned())
}

fn format_line(snap: &Snapshot) -> String {
    format!(
        "Device {} buffersize {} used {} free {} readers {} writers {}",
        snap.index, snap.capacity, snap.used, snap.free, snap.readers, snap.writers
    )
}
