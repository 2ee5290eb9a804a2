//! Feed Ingester - external price process to hot path bridge
//!
//! Spawns the feed process, drains its stderr, and runs a read loop over its
//! stdout on a dedicated, CPU-pinned thread.
//!
//! ## Read Loop
//!
//! ```text
//!   read(4096) ──► LineAssembler ──► FieldExtractor (per line)
//!        ▲                                  │
//!        │                    keep last price of this read
//!        │                                  │
//!        └──────── forward (at most once per read) ◄──┘
//!                      │
//!          first ever? ├── yes ─► PriceListener::on_feed_connected
//!                      └── no  ─► PriceListener::on_price   (hot path, inline)
//! ```
//!
//! Intermediate prices inside one read are dropped on purpose: the hot path
//! runs at most once per I/O read, never once per line.

use super::extract::{FieldExtractor, KeyExtractor};
use super::line::LineAssembler;
use crate::config::FeedConfig;
use crate::core::FeedError;
use crate::perf::AffinityPinner;
use parking_lot::Mutex;
use std::io::{self, BufRead, BufReader, Read};
use std::process::{Child, Command, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle, ThreadId};
use std::time::{Duration, Instant};
use tracing::{debug, info, trace, warn};

/// How long a terminated feed process gets to exit before it is killed
pub const TERMINATE_GRACE: Duration = Duration::from_millis(500);

/// Receiver of prices produced by the read loop
///
/// Both methods run on the feed reader thread. `on_price` is the hot path
/// and must not block.
pub trait PriceListener: Send + Sync + 'static {
    /// First price of the session (called exactly once)
    fn on_feed_connected(&self, price: f64);

    /// Every later price, at most once per I/O read
    fn on_price(&self, price: f64);
}

/// Counters from one run of the read loop
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReadLoopStats {
    pub reads: u64,
    pub bytes: u64,
    pub lines: u64,
    pub prices_forwarded: u64,
    pub truncated_lines: u64,
}

/// Routes forwarded prices: the first one signals "connected", the rest
/// go straight to the quote path
struct PriceForwarder<'l, L: ?Sized> {
    listener: &'l L,
    connected: bool,
}

impl<'l, L: PriceListener + ?Sized> PriceForwarder<'l, L> {
    fn new(listener: &'l L) -> Self {
        Self {
            listener,
            connected: false,
        }
    }

    #[inline(always)]
    fn forward(&mut self, price: f64) {
        if self.connected {
            self.listener.on_price(price);
        } else {
            self.connected = true;
            self.listener.on_feed_connected(price);
        }
    }
}

/// Last successfully extracted price among the lines completed by `chunk`
#[inline]
pub fn latest_in_chunk<const N: usize, E: FieldExtractor + ?Sized>(
    assembler: &mut LineAssembler<N>,
    extractor: &E,
    chunk: &[u8],
) -> (Option<f64>, u64) {
    let mut latest = None;
    let mut lines = 0u64;
    assembler.feed(chunk).for_each(|line| {
        lines += 1;
        if let Some(price) = extractor.extract(line) {
            latest = Some(price);
        }
    });
    (latest, lines)
}

/// Drive `reader` until EOF, a read error, or `stop` is raised
///
/// Read failures end the loop silently; there is no restart.
pub fn run_read_loop<R, E, L>(
    mut reader: R,
    extractor: &E,
    listener: &L,
    buffer_size: usize,
    stop: &AtomicBool,
) -> ReadLoopStats
where
    R: Read,
    E: FieldExtractor + ?Sized,
    L: PriceListener + ?Sized,
{
    let mut io_buf = vec![0u8; buffer_size.max(1)];
    let mut assembler: LineAssembler = LineAssembler::new();
    let mut forwarder = PriceForwarder::new(listener);
    let mut stats = ReadLoopStats::default();

    while !stop.load(Ordering::Acquire) {
        let n = match reader.read(&mut io_buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => {
                debug!("Feed read failed: {}", e);
                break;
            }
        };

        stats.reads += 1;
        stats.bytes += n as u64;

        let (latest, lines) = latest_in_chunk(&mut assembler, extractor, &io_buf[..n]);
        stats.lines += lines;

        if let Some(price) = latest {
            if stop.load(Ordering::Acquire) {
                break;
            }
            trace!(price, "feed price");
            forwarder.forward(price);
            stats.prices_forwarded += 1;
        }
    }

    stats.truncated_lines = assembler.truncated_lines();
    stats
}

/// Handle to a running feed process and its reader thread
pub struct FeedIngester {
    pid: u32,
    program: String,
    child: Mutex<Option<Child>>,
    reader: Mutex<Option<JoinHandle<ReadLoopStats>>>,
    reader_id: ThreadId,
    stop_flag: Arc<AtomicBool>,
}

impl FeedIngester {
    /// Spawn the configured feed process and start reading `"midprice"` records
    pub fn start<L: PriceListener + ?Sized>(
        config: &FeedConfig,
        listener: Arc<L>,
    ) -> Result<Self, FeedError> {
        Self::start_with(config, KeyExtractor::midprice(), listener)
    }

    /// Same as `start` with a custom extractor
    pub fn start_with<E, L>(
        config: &FeedConfig,
        extractor: E,
        listener: Arc<L>,
    ) -> Result<Self, FeedError>
    where
        E: FieldExtractor + 'static,
        L: PriceListener + ?Sized,
    {
        let mut command = Command::new(&config.program);
        command
            .args(&config.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(dir) = config.resolved_working_dir() {
            command.current_dir(dir);
        }

        let mut child = command.spawn().map_err(|source| FeedError::Spawn {
            program: config.program.clone(),
            source,
        })?;
        let pid = child.id();

        let stdout = match child.stdout.take() {
            Some(stdout) => stdout,
            None => {
                let _ = child.kill();
                return Err(FeedError::MissingPipe { stream: "stdout" });
            }
        };

        if let Some(stderr) = child.stderr.take() {
            // Best-effort drain; a failure here never affects the feed
            let drained = thread::Builder::new()
                .name("feed-stderr".to_string())
                .spawn(move || drain_stderr(stderr));
            if let Err(e) = drained {
                warn!("Failed to start feed stderr drain: {}", e);
            }
        }

        let stop_flag = Arc::new(AtomicBool::new(false));
        let pinner = if config.pin_thread {
            AffinityPinner::for_core(config.cpu_core)
        } else {
            None
        };
        let buffer_size = config.read_buffer_size;
        let loop_stop = stop_flag.clone();

        let reader = thread::Builder::new()
            .name("feed-reader".to_string())
            .spawn(move || {
                if let Some(pinner) = pinner {
                    pinner.pin_current();
                }
                let stats = run_read_loop(stdout, &extractor, &*listener, buffer_size, &loop_stop);
                info!(
                    reads = stats.reads,
                    prices = stats.prices_forwarded,
                    truncated = stats.truncated_lines,
                    "Feed read loop ended"
                );
                stats
            });

        let reader = match reader {
            Ok(handle) => handle,
            Err(e) => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(FeedError::Thread(e));
            }
        };

        info!(pid, program = %config.program, "Feed process started");

        Ok(Self {
            pid,
            program: config.program.clone(),
            reader_id: reader.thread().id(),
            child: Mutex::new(Some(child)),
            reader: Mutex::new(Some(reader)),
            stop_flag,
        })
    }

    /// OS process id of the feed process
    pub fn pid(&self) -> u32 {
        self.pid
    }

    /// Whether `stop` has not been called and the process has not exited
    pub fn is_running(&self) -> bool {
        if self.stop_flag.load(Ordering::Acquire) {
            return false;
        }
        match self.child.lock().as_mut() {
            Some(child) => matches!(child.try_wait(), Ok(None)),
            None => false,
        }
    }

    /// Block until the read loop ends on its own (EOF or read error)
    ///
    /// Returns `None` if the loop was already joined, or when called from
    /// the reader thread itself.
    pub fn wait(&self) -> Option<ReadLoopStats> {
        if thread::current().id() == self.reader_id {
            return None;
        }
        let handle = self.reader.lock().take()?;
        handle.join().ok()
    }

    /// Terminate the feed process
    ///
    /// Idempotent: later calls are no-ops. No price is forwarded after this
    /// returns. The reader thread is not joined; it ends when the pipe closes.
    pub fn stop(&self) -> Result<(), FeedError> {
        if self.stop_flag.swap(true, Ordering::AcqRel) {
            return Ok(());
        }

        let Some(mut child) = self.child.lock().take() else {
            return Ok(());
        };

        if !matches!(child.try_wait(), Ok(None)) {
            debug!(pid = self.pid, "Feed process already exited");
            return Ok(());
        }

        send_terminate(&mut child)?;

        let deadline = Instant::now() + TERMINATE_GRACE;
        loop {
            match child.try_wait() {
                Ok(Some(status)) => {
                    info!(pid = self.pid, %status, "Feed process stopped");
                    return Ok(());
                }
                Ok(None) if Instant::now() < deadline => thread::sleep(Duration::from_millis(10)),
                _ => break,
            }
        }

        warn!(pid = self.pid, program = %self.program, "Feed process ignored termination, killing");
        let _ = child.kill();
        let _ = child.wait();
        Ok(())
    }
}

impl Drop for FeedIngester {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            warn!("Failed to stop feed on drop: {}", e);
        }
    }
}

#[cfg(unix)]
fn send_terminate(child: &mut Child) -> Result<(), FeedError> {
    let pid = child.id();
    // SAFETY: kill(2) with a pid we own and a valid signal number
    let rc = unsafe { libc::kill(pid as libc::pid_t, libc::SIGTERM) };
    if rc == 0 {
        return Ok(());
    }
    let err = io::Error::last_os_error();
    if err.raw_os_error() == Some(libc::ESRCH) {
        // Exited between try_wait and kill
        return Ok(());
    }
    Err(FeedError::Signal { pid, source: err })
}

#[cfg(not(unix))]
fn send_terminate(child: &mut Child) -> Result<(), FeedError> {
    let pid = child.id();
    child
        .kill()
        .map_err(|source| FeedError::Signal { pid, source })
}

fn drain_stderr<R: Read>(stderr: R) {
    for line in BufReader::new(stderr).lines() {
        match line {
            Ok(line) => debug!(target: "feed_stderr", "{}", line),
            Err(_) => break,
        }
    }
}
