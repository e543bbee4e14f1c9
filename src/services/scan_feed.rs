//! Badge capture: the decode capability, the devices that hand it out and the
//! fixed-cadence feed that polls a decoder while the scanner view is open.
//!
//! Device release is tied to the decoder's lifetime. A decoder owns a
//! [`CaptureLease`]; the feed task owns the decoder and drops it on every exit
//! path, which returns the lease.
//!
//! A feed nobody reads from for [`IDLE_PERIODS`] periods cancels itself. That
//! covers a client that navigated away without telling the server.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::{DeskError, DeskResult};

pub const READ_FAILURE: &str = "Could not read QR code";
const CAMERA_UNAVAILABLE: &str = "Camera access denied or not available";
const SCAN_EVENT_BUFFER: usize = 16;
/// Periods without a read before the feed releases the device on its own.
pub const IDLE_PERIODS: u32 = 3;

/// One decode attempt per call; `None` means nothing readable was in view.
pub trait Decoder: Send {
    fn try_decode(&mut self) -> Option<String>;
}

/// Something that can be opened to obtain a [`Decoder`].
pub trait CaptureDevice: Send + Sync {
    fn acquire(&self) -> DeskResult<Box<dyn Decoder>>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScanOutcome {
    Decoded { payload: String },
    Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanEvent {
    pub generation: u64,
    pub outcome: ScanOutcome,
}

/// Counts decoders currently handed out by a device.
#[derive(Debug, Clone, Default)]
pub struct CaptureLeases(Arc<AtomicUsize>);

impl CaptureLeases {
    pub fn active(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }

    fn lease(&self) -> CaptureLease {
        self.0.fetch_add(1, Ordering::SeqCst);
        CaptureLease(self.0.clone())
    }
}

#[derive(Debug)]
pub struct CaptureLease(Arc<AtomicUsize>);

impl Drop for CaptureLease {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Stand-in for a camera decoder: succeeds with a fixed probability and
/// reports one of the known payloads.
pub struct SimulatedDecoder {
    rng: StdRng,
    success_probability: f64,
    payloads: Vec<String>,
    _lease: Option<CaptureLease>,
}

impl SimulatedDecoder {
    pub fn new(success_probability: f64, payloads: Vec<String>) -> Self {
        Self::from_rng(StdRng::from_os_rng(), success_probability, payloads)
    }

    pub fn with_seed(success_probability: f64, payloads: Vec<String>, seed: u64) -> Self {
        Self::from_rng(StdRng::seed_from_u64(seed), success_probability, payloads)
    }

    fn from_rng(rng: StdRng, success_probability: f64, payloads: Vec<String>) -> Self {
        let success_probability = if success_probability.is_finite() {
            success_probability.clamp(0.0, 1.0)
        } else {
            0.0
        };
        Self {
            rng,
            success_probability,
            payloads,
            _lease: None,
        }
    }
}

impl Decoder for SimulatedDecoder {
    fn try_decode(&mut self) -> Option<String> {
        if !self.rng.random_bool(self.success_probability) {
            return None;
        }
        if self.payloads.is_empty() {
            return Some(format!("DELEGATE-{}", self.rng.random_range(0..1000)));
        }
        let idx = self.rng.random_range(0..self.payloads.len());
        Some(self.payloads[idx].clone())
    }
}

/// Replays a fixed list of decode results, then reads nothing.
pub struct ScriptedDecoder {
    script: VecDeque<Option<String>>,
    _lease: Option<CaptureLease>,
}

impl ScriptedDecoder {
    pub fn new(script: impl IntoIterator<Item = Option<String>>) -> Self {
        Self {
            script: script.into_iter().collect(),
            _lease: None,
        }
    }
}

impl Decoder for ScriptedDecoder {
    fn try_decode(&mut self) -> Option<String> {
        self.script.pop_front().flatten()
    }
}

/// Camera that produces [`SimulatedDecoder`]s.
#[derive(Debug, Clone)]
pub struct SimulatedCamera {
    available: bool,
    success_probability: f64,
    payloads: Vec<String>,
    seed: Option<u64>,
    leases: CaptureLeases,
}

impl SimulatedCamera {
    pub fn new(success_probability: f64, payloads: Vec<String>) -> Self {
        Self {
            available: true,
            success_probability,
            payloads,
            seed: None,
            leases: CaptureLeases::default(),
        }
    }

    /// A camera whose acquisition always fails.
    pub fn unavailable() -> Self {
        Self {
            available: false,
            ..Self::new(0.0, Vec::new())
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn leases(&self) -> CaptureLeases {
        self.leases.clone()
    }
}

impl CaptureDevice for SimulatedCamera {
    fn acquire(&self) -> DeskResult<Box<dyn Decoder>> {
        if !self.available {
            return Err(DeskError::CaptureUnavailable(CAMERA_UNAVAILABLE.to_string()));
        }
        let mut decoder = match self.seed {
            Some(seed) => {
                SimulatedDecoder::with_seed(self.success_probability, self.payloads.clone(), seed)
            }
            None => SimulatedDecoder::new(self.success_probability, self.payloads.clone()),
        };
        decoder._lease = Some(self.leases.lease());
        Ok(Box::new(decoder))
    }
}

/// Device that hands out [`ScriptedDecoder`]s replaying the same script.
#[derive(Debug, Clone, Default)]
pub struct ScriptedCamera {
    script: Vec<Option<String>>,
    leases: CaptureLeases,
}

impl ScriptedCamera {
    pub fn new(script: Vec<Option<String>>) -> Self {
        Self {
            script,
            leases: CaptureLeases::default(),
        }
    }

    pub fn leases(&self) -> CaptureLeases {
        self.leases.clone()
    }
}

impl CaptureDevice for ScriptedCamera {
    fn acquire(&self) -> DeskResult<Box<dyn Decoder>> {
        let mut decoder = ScriptedDecoder::new(self.script.clone());
        decoder._lease = Some(self.leases.lease());
        Ok(Box::new(decoder))
    }
}

/// A running scan cadence bound to one scanner-view generation.
///
/// Stopping consumes the feed, so cancellation happens once. Events not yet
/// received are dropped together with the receiver.
pub struct ScanFeed {
    generation: u64,
    cancel: CancellationToken,
    events: mpsc::Receiver<ScanEvent>,
    task: Option<JoinHandle<()>>,
    heartbeat: Heartbeat,
}

/// Time of the last read, in milliseconds since the feed started.
#[derive(Clone)]
struct Heartbeat {
    origin: Instant,
    last_ms: Arc<AtomicU64>,
}

impl Heartbeat {
    fn new() -> Self {
        Self {
            origin: Instant::now(),
            last_ms: Arc::new(AtomicU64::new(0)),
        }
    }

    fn touch(&self) {
        let now = self.origin.elapsed().as_millis() as u64;
        self.last_ms.store(now, Ordering::SeqCst);
    }

    fn idle_for(&self) -> Duration {
        let last = Duration::from_millis(self.last_ms.load(Ordering::SeqCst));
        self.origin.elapsed().saturating_sub(last)
    }
}

impl ScanFeed {
    /// Acquires `device` and starts polling it every `period`.
    pub fn start(device: &dyn CaptureDevice, period: Duration, generation: u64) -> DeskResult<Self> {
        let decoder = device.acquire()?;
        let cancel = CancellationToken::new();
        let (tx, events) = mpsc::channel(SCAN_EVENT_BUFFER);
        let heartbeat = Heartbeat::new();
        let task = tokio::spawn(run_feed(
            decoder,
            period,
            generation,
            tx,
            cancel.clone(),
            heartbeat.clone(),
        ));
        debug!(generation, period_ms = period.as_millis() as u64, "scan feed started");
        Ok(Self {
            generation,
            cancel,
            events,
            task: Some(task),
            heartbeat,
        })
    }

    /// True once the feed was stopped, including by its idle watchdog.
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Next buffered event without waiting. Counts as a read for the idle
    /// watchdog.
    pub fn try_next(&mut self) -> Option<ScanEvent> {
        self.heartbeat.touch();
        self.events.try_recv().ok()
    }

    pub async fn next(&mut self) -> Option<ScanEvent> {
        self.heartbeat.touch();
        self.events.recv().await
    }

    /// Throws away everything buffered so far. Returns how many were dropped.
    pub fn discard_buffered(&mut self) -> usize {
        self.heartbeat.touch();
        let mut dropped = 0;
        while self.events.try_recv().is_ok() {
            dropped += 1;
        }
        dropped
    }

    /// Cancels the cadence and waits until the decoder has been released.
    pub async fn stop(mut self) {
        self.cancel.cancel();
        self.events.close();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                warn!(generation = self.generation, "scan feed task failed: {}", e);
            }
        }
    }
}

impl Drop for ScanFeed {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn run_feed(
    mut decoder: Box<dyn Decoder>,
    period: Duration,
    generation: u64,
    tx: mpsc::Sender<ScanEvent>,
    cancel: CancellationToken,
    heartbeat: Heartbeat,
) {
    let idle_limit = period * IDLE_PERIODS;
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    // The first tick completes immediately; the first read happens one period in.
    ticker.tick().await;

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {
                if heartbeat.idle_for() > idle_limit {
                    info!(generation, "scan feed unread, releasing capture");
                    cancel.cancel();
                    break;
                }
                let outcome = match decoder.try_decode() {
                    Some(payload) => ScanOutcome::Decoded { payload },
                    None => ScanOutcome::Failed { reason: READ_FAILURE.to_string() },
                };
                match tx.try_send(ScanEvent { generation, outcome }) {
                    Ok(()) => {}
                    Err(mpsc::error::TrySendError::Full(_)) => {
                        debug!(generation, "scan event dropped, nobody is reading");
                    }
                    Err(mpsc::error::TrySendError::Closed(_)) => break,
                }
            }
        }
    }

    drop(decoder);
    debug!(generation, "scan feed stopped, capture released");
}
