//! Live fall monitoring
//!
//! [`FallMonitor`] connects a [`SensorSource`] to a [`FallProcessor`] running on
//! a dedicated worker thread. The worker is the only owner of the processor:
//! readings arrive over an `mpsc` channel and the periodic eviction tick is
//! driven from the same loop through `recv_timeout`, so sample processing and
//! eviction never interleave.
//!
//! Lifecycle:
//! 1. `start` checks sensor availability, sets the update interval, spawns the
//!    worker and subscribes a [`SensorListener`].
//! 2. The source pushes readings into the listener from any thread.
//! 3. `stop` removes the subscription, stops the worker and returns the final
//!    [`FallSnapshot`]. It is idempotent and also runs on drop.
//!
//! Ticks run on the readings' timeline: each tick is stamped with the later of
//! the wall time since the origin and the last accepted reading, so sources
//! that supply their own timestamps through [`SensorListener::emit_at`] are
//! evicted against the same clock they report.
//!
//! Results reach the host two ways: the [`AlertSink`] fires once per counted
//! fall and the [`DisplaySink`] is pushed a snapshot after every reading and
//! every tick. [`FallMonitor::snapshot`] offers a pull-based read at any time.

use crate::config::DetectorConfig;
use crate::error::FallError;
use crate::pipeline::FallProcessor;
use crate::types::{AccelReading, FallEvent, FallSnapshot};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

/// A platform accelerometer
pub trait SensorSource {
    /// Whether the sensor can be used on this device
    fn is_available(&self) -> bool;

    /// Request a sampling period
    fn set_update_interval(&mut self, interval: Duration);

    /// Start delivering readings to `listener`
    fn subscribe(
        &mut self,
        listener: SensorListener,
    ) -> Result<Box<dyn SensorSubscription>, FallError>;
}

/// Handle to an active sensor subscription
pub trait SensorSubscription: Send {
    /// Stop delivering readings. Called exactly once by the monitor.
    fn remove(&mut self);
}

/// Receives one notification per counted fall
pub trait AlertSink: Send {
    fn alert(&mut self, event: &FallEvent);
}

impl<F> AlertSink for F
where
    F: FnMut(&FallEvent) + Send,
{
    fn alert(&mut self, event: &FallEvent) {
        self(event)
    }
}

/// Receives snapshots for display
pub trait DisplaySink: Send {
    fn update(&mut self, snapshot: &FallSnapshot);
}

impl<F> DisplaySink for F
where
    F: FnMut(&FallSnapshot) + Send,
{
    fn update(&mut self, snapshot: &FallSnapshot) {
        self(snapshot)
    }
}

enum Message {
    Reading(AccelReading),
    Closed,
    Stop,
}

/// Entry point for sensor callbacks.
///
/// Cheap to clone; every clone feeds the same monitor.
#[derive(Clone)]
pub struct SensorListener {
    tx: Sender<Message>,
    origin: Instant,
}

impl SensorListener {
    /// Deliver a reading stamped with its arrival time.
    ///
    /// Returns `false` once the monitor has stopped.
    pub fn emit(&self, x: f64, y: f64, z: f64) -> bool {
        self.emit_at(self.origin.elapsed(), x, y, z)
    }

    /// Deliver a reading with a source timestamp measured from [`origin`](Self::origin)
    pub fn emit_at(&self, timestamp: Duration, x: f64, y: f64, z: f64) -> bool {
        self.tx
            .send(Message::Reading(AccelReading::new(timestamp, x, y, z)))
            .is_ok()
    }

    /// Signal that the source has no more readings
    pub fn close(&self) {
        let _ = self.tx.send(Message::Closed);
    }

    /// Instant the monitor's clock counts from
    pub fn origin(&self) -> Instant {
        self.origin
    }
}

struct Running {
    subscription: Option<Box<dyn SensorSubscription>>,
    control: Sender<Message>,
    worker: Option<JoinHandle<()>>,
}

/// Runs fall detection against a live sensor
pub struct FallMonitor {
    config: DetectorConfig,
    shared: Arc<Mutex<FallSnapshot>>,
    running: Option<Running>,
}

impl FallMonitor {
    pub fn new(config: DetectorConfig) -> Result<Self, FallError> {
        config.validate()?;
        Ok(Self {
            config,
            shared: Arc::new(Mutex::new(FallSnapshot::default())),
            running: None,
        })
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Start monitoring `source`.
    ///
    /// Fails with [`FallError::SensorUnavailable`] before touching any state
    /// when the sensor is missing, and with [`FallError::Subscription`] when the
    /// worker or the subscription cannot be set up. A failed start leaves the
    /// monitor stopped.
    pub fn start<A, D>(
        &mut self,
        source: &mut dyn SensorSource,
        alert: A,
        display: D,
    ) -> Result<(), FallError>
    where
        A: AlertSink + 'static,
        D: DisplaySink + 'static,
    {
        if self.running.is_some() {
            return Err(FallError::AlreadyRunning);
        }

        if !source.is_available() {
            warn!("Accelerometer not available, monitor not started");
            return Err(FallError::SensorUnavailable);
        }

        source.set_update_interval(self.config.sample_interval());

        let processor = FallProcessor::with_config(self.config.clone())?;
        *lock(&self.shared) = FallSnapshot::default();

        let (tx, rx) = mpsc::channel();
        let origin = Instant::now();
        let worker = Worker {
            processor,
            rx,
            origin,
            shared: Arc::clone(&self.shared),
            alert: Box::new(alert),
            display: Box::new(display),
        };

        let handle = thread::Builder::new()
            .name("fall-monitor".to_string())
            .spawn(move || worker.run())
            .map_err(|e| FallError::Subscription(format!("failed to spawn worker: {e}")))?;

        let listener = SensorListener {
            tx: tx.clone(),
            origin,
        };
        let subscription = match source.subscribe(listener) {
            Ok(subscription) => subscription,
            Err(e) => {
                let _ = tx.send(Message::Stop);
                if handle.join().is_err() {
                    error!("Fall monitor worker panicked");
                }
                error!(error = %e, "Failed to subscribe to accelerometer");
                return Err(match e {
                    FallError::Subscription(_) => e,
                    other => FallError::Subscription(other.to_string()),
                });
            }
        };

        self.running = Some(Running {
            subscription: Some(subscription),
            control: tx,
            worker: Some(handle),
        });

        info!(
            sample_interval_ms = self.config.sample_interval_ms,
            eviction_interval_ms = self.config.eviction_interval_ms,
            "Fall monitor started"
        );
        Ok(())
    }

    /// Stop monitoring and return the final snapshot.
    ///
    /// Safe to call before `start` and more than once.
    pub fn stop(&mut self) -> FallSnapshot {
        if let Some(mut running) = self.running.take() {
            if let Some(mut subscription) = running.subscription.take() {
                subscription.remove();
            }

            let _ = running.control.send(Message::Stop);
            if let Some(worker) = running.worker.take() {
                if worker.join().is_err() {
                    error!("Fall monitor worker panicked");
                }
            }

            let snapshot = self.snapshot();
            info!(fall_count = snapshot.fall_count, "Fall monitor stopped");
            return snapshot;
        }

        self.snapshot()
    }

    /// Block until the source closes the stream, then stop
    pub fn wait(&mut self) -> FallSnapshot {
        if let Some(worker) = self.running.as_mut().and_then(|r| r.worker.take()) {
            if worker.join().is_err() {
                error!("Fall monitor worker panicked");
            }
        }
        self.stop()
    }

    pub fn is_running(&self) -> bool {
        self.running.is_some()
    }

    /// Latest state published by the worker
    pub fn snapshot(&self) -> FallSnapshot {
        lock(&self.shared).clone()
    }

    pub fn fall_count(&self) -> u64 {
        lock(&self.shared).fall_count
    }
}

impl Drop for FallMonitor {
    fn drop(&mut self) {
        self.stop();
    }
}

fn lock(shared: &Mutex<FallSnapshot>) -> MutexGuard<'_, FallSnapshot> {
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}

struct Worker {
    processor: FallProcessor,
    rx: Receiver<Message>,
    origin: Instant,
    shared: Arc<Mutex<FallSnapshot>>,
    alert: Box<dyn AlertSink>,
    display: Box<dyn DisplaySink>,
}

impl Worker {
    fn run(mut self) {
        let interval = self.processor.config().eviction_interval();
        let mut next_tick = self.origin + interval;

        loop {
            let now = Instant::now();
            if now >= next_tick {
                let wall = now.duration_since(self.origin);
                let stream = self.processor.last_timestamp().unwrap_or_default();
                self.tick(wall.max(stream));
                next_tick += interval;
                if next_tick <= now {
                    next_tick = now + interval;
                }
                continue;
            }

            match self.rx.recv_timeout(next_tick - now) {
                Ok(Message::Reading(reading)) => self.process(&reading),
                Ok(Message::Closed) => {
                    info!("Accelerometer stream closed");
                    break;
                }
                Ok(Message::Stop) | Err(RecvTimeoutError::Disconnected) => break,
                Err(RecvTimeoutError::Timeout) => {}
            }
        }
    }

    fn process(&mut self, reading: &AccelReading) {
        let event = self.processor.ingest(reading);
        let snapshot = self.publish();

        if let Some(event) = event {
            self.alert.alert(&event);
        }
        self.display.update(&snapshot);
    }

    fn tick(&mut self, now: Duration) {
        self.processor.tick(now);
        let snapshot = self.publish();
        self.display.update(&snapshot);
    }

    fn publish(&self) -> FallSnapshot {
        let snapshot = self.processor.snapshot();
        *lock(&self.shared) = snapshot.clone();
        snapshot
    }
}
