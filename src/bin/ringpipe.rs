//! ringpipe CLI
//!
//! - `stress`: beberapa writer thread menulis ke satu pipe, satu reader
//!   menguras; urutan per-writer dan jumlah byte diverifikasi
//! - `report`: cetak laporan diagnostik registry
//!
//! Usage:
//!   cargo run --release --bin ringpipe -- stress --writers 4 --bytes 1000000
//!   RUST_LOG=ringpipe=trace cargo run --bin ringpipe -- --buffer-size 64 stress

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use clap::{Parser, Subcommand};
use eyre::{bail, Result, WrapErr};
use ringpipe::{
    diagnostics, AccessMode, Blocking, CancelToken, Config, Handle, OpenOptions, PipeError,
    Registry,
};
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "ringpipe")]
#[command(about = "bounded blocking byte pipe: stress run and diagnostics")]
struct Args {
    #[arg(short, long, help = "configuration file path (toml format)")]
    config: Option<PathBuf>,

    #[arg(long, help = "override number of pipes in the registry")]
    pipes: Option<usize>,

    #[arg(long, help = "override ring storage size in bytes")]
    buffer_size: Option<usize>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Concurrent writers into one pipe while a reader drains it
    Stress {
        #[arg(long, default_value_t = 0)]
        pipe: usize,

        #[arg(long, default_value_t = 2, value_parser = clap::value_parser!(u8).range(1..=4))]
        writers: u8,

        #[arg(long, default_value_t = 1_000_000, help = "bytes per writer")]
        bytes: u64,

        #[arg(long, default_value_t = 512, help = "bytes per write call")]
        chunk: usize,
    },
    /// Print one line per pipe
    Report,
}

/// Statistik stress run
struct StressStats {
    bytes_written: AtomicU64,
    bytes_read: AtomicU64,
    write_calls: AtomicU64,
    short_writes: AtomicU64,
    read_calls: AtomicU64,
}

impl StressStats {
    fn new() -> Self {
        Self {
            bytes_written: AtomicU64::new(0),
            bytes_read: AtomicU64::new(0),
            write_calls: AtomicU64::new(0),
            short_writes: AtomicU64::new(0),
            read_calls: AtomicU64::new(0),
        }
    }

    fn print_report(&self, duration: Duration) {
        let written = self.bytes_written.load(Ordering::Relaxed);
        let read = self.bytes_read.load(Ordering::Relaxed);
        let write_calls = self.write_calls.load(Ordering::Relaxed);
        let short_writes = self.short_writes.load(Ordering::Relaxed);
        let read_calls = self.read_calls.load(Ordering::Relaxed);

        println!("\n📊 STRESS RESULTS");
        println!("=================");
        println!("  Duration:      {:.2}s", duration.as_secs_f64());
        println!("  Written:       {} bytes in {} calls", written, write_calls);
        println!("  Short writes:  {}", short_writes);
        println!("  Read:          {} bytes in {} calls", read, read_calls);
        println!(
            "  Throughput:    {:.2} MB/sec",
            read as f64 / duration.as_secs_f64() / 1_000_000.0
        );
    }
}

/// Byte ke-`seq` milik writer `id`: id di 2 bit atas, urutan di 6 bit bawah
#[inline(always)]
fn pattern(id: u8, seq: u64) -> u8 {
    (id << 6) | (seq % 64) as u8
}

fn run_writer(
    handle: Handle,
    id: u8,
    total: u64,
    chunk: usize,
    stats: Arc<StressStats>,
) -> Result<u64, PipeError> {
    let mut seq = 0u64;
    let mut buf = vec![0u8; chunk];

    while seq < total {
        let len = chunk.min((total - seq) as usize);
        for (i, b) in buf[..len].iter_mut().enumerate() {
            *b = pattern(id, seq + i as u64);
        }

        let n = handle.pipe().write(&handle, &buf[..len], Blocking::Block)?;
        stats.write_calls.fetch_add(1, Ordering::Relaxed);
        stats.bytes_written.fetch_add(n as u64, Ordering::Relaxed);
        if n < len {
            stats.short_writes.fetch_add(1, Ordering::Relaxed);
        }
        seq += n as u64;
    }

    Ok(seq)
}

fn run_reader(
    handle: Handle,
    writers: u8,
    expected: u64,
    stats: Arc<StressStats>,
) -> Result<u64, PipeError> {
    let mut next = vec![0u64; writers as usize];
    let mut total = 0u64;
    let mut buf = [0u8; 4096];

    while total < expected {
        let n = handle.pipe().read(&handle, &mut buf[..], Blocking::Block)?;
        if n == 0 {
            warn!("all writers gone before stream was drained");
            break;
        }
        stats.read_calls.fetch_add(1, Ordering::Relaxed);

        for &b in &buf[..n] {
            let id = b >> 6;
            let slot = next
                .get_mut(id as usize)
                .ok_or(PipeError::Fault)?;
            if b != pattern(id, *slot) {
                warn!(writer = id, offset = *slot, byte = b, "out of order byte");
                return Err(PipeError::Fault);
            }
            *slot += 1;
        }
        total += n as u64;
        stats.bytes_read.fetch_add(n as u64, Ordering::Relaxed);
    }

    Ok(total)
}

fn stress(
    registry: &Registry,
    cancel: &CancelToken,
    pipe: usize,
    writers: u8,
    bytes: u64,
    chunk: usize,
) -> Result<()> {
    if chunk == 0 {
        bail!("--chunk must be at least 1");
    }

    let mut write_options = OpenOptions::new(AccessMode::WriteOnly);
    write_options.cancel_token(cancel.clone());
    let mut read_options = OpenOptions::new(AccessMode::ReadOnly);
    read_options.cancel_token(cancel.clone());

    // Writer tambahan supaya reader tidak melihat EOF sebelum buffer kosong
    let keepalive = registry.open(pipe, &write_options)?;
    let reader = registry.open(pipe, &read_options)?;
    let stats = Arc::new(StressStats::new());

    println!("🚀 ringpipe stress");
    println!("==================");
    println!("  Pipe:          {}", pipe);
    println!("  Writers:       {}", writers);
    println!("  Bytes/writer:  {}", bytes);
    println!("  Chunk:         {}", chunk);

    let start = Instant::now();

    let writer_threads: Vec<_> = (0..writers)
        .map(|id| {
            let handle = registry.open(pipe, &write_options)?;
            let stats = Arc::clone(&stats);
            Ok(thread::spawn(move || {
                run_writer(handle, id, bytes, chunk, stats)
            }))
        })
        .collect::<Result<_, PipeError>>()?;

    let expected = bytes * writers as u64;
    let reader_stats = Arc::clone(&stats);
    let reader_thread = thread::spawn(move || run_reader(reader, writers, expected, reader_stats));

    let mut failed = false;
    for (id, t) in writer_threads.into_iter().enumerate() {
        match t.join() {
            Ok(Ok(n)) => info!(writer = id, bytes = n, "writer finished"),
            Ok(Err(e)) => {
                warn!(writer = id, error = %e, "writer stopped");
                failed = true;
            }
            Err(_) => bail!("writer {} panicked", id),
        }
    }

    if failed {
        // Reader mungkin masih menunggu byte yang tidak akan datang
        cancel.cancel();
    }

    let read = match reader_thread.join() {
        Ok(result) => result,
        Err(_) => bail!("reader panicked"),
    };
    drop(keepalive);

    let duration = start.elapsed();
    stats.print_report(duration);

    println!("\n{}", diagnostics::report(registry, &CancelToken::new())?);

    match read {
        Ok(n) if n == expected => {
            println!("✅ {} bytes delivered in order, nothing lost", n);
            Ok(())
        }
        Ok(n) => bail!("reader got {} of {} bytes", n, expected),
        Err(PipeError::Interrupted) => {
            println!("⚠️  interrupted");
            Ok(())
        }
        Err(e) => Err(e).wrap_err("reader failed"),
    }
}

fn load_config(args: &Args) -> Result<Config> {
    let mut config = match &args.config {
        Some(path) => Config::load(path)
            .wrap_err_with(|| format!("failed to load config from {}", path.display()))?,
        None => Config::default(),
    };

    if let Some(pipes) = args.pipes {
        config.pipe_count = pipes;
    }
    if let Some(size) = args.buffer_size {
        config.buffer_size = size;
    }
    config.validate()?;
    Ok(config)
}

fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = load_config(&args)?;
    let registry = Registry::new(&config)?;
    let cancel = CancelToken::new();
    let on_interrupt = cancel.clone();
    ctrlc::set_handler(move || {
        warn!("interrupt received, cancelling blocked operations");
        on_interrupt.cancel();
    })?;

    match args.command {
        Command::Stress {
            pipe,
            writers,
            bytes,
            chunk,
        } => stress(&registry, &cancel, pipe, writers, bytes, chunk)?,
        Command::Report => print!("{}", diagnostics::report(&registry, &cancel)?),
    }

    if let Err((_, e)) = registry.shutdown() {
        warn!(error = %e, "registry shutdown incomplete");
    }
    Ok(())
}
