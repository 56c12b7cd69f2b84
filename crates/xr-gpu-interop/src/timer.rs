//! GPU and CPU timers.
//!
//! [`GpuTimer`] owns the validity state machine and the tick arithmetic. The
//! backends only implement [`TimestampQueries`]: record a begin stamp, record
//! an end stamp, and read both back once the GPU is done.

use std::time::{Duration, Instant};

use tracing::{trace, warn};
use xr_interop_core::{Api, Result};

use crate::device::{GraphicsTimer, Timer};

/// Raw timestamp data read back from the GPU.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TimestampReadback {
    pub start: u64,
    pub end: u64,
    /// Ticks per second.
    pub frequency: u64,
    /// The GPU clock was unreliable between the two stamps.
    pub disjoint: bool,
}

impl TimestampReadback {
    /// Elapsed microseconds, or 0 if the measurement cannot be trusted.
    pub fn elapsed_micros(&self) -> u64 {
        if self.disjoint || self.frequency == 0 || self.end < self.start {
            return 0;
        }
        let ticks = u128::from(self.end - self.start);
        (ticks * 1_000_000 / u128::from(self.frequency)) as u64
    }
}

/// A begin/end pair of native timestamp queries.
pub trait TimestampQueries {
    fn begin(&mut self) -> Result<()>;
    fn end(&mut self) -> Result<()>;
    /// `Ok(None)` while the GPU has not produced the data yet.
    fn read(&mut self) -> Result<Option<TimestampReadback>>;
}

/// A [`Timer`] over native timestamp queries.
pub struct GpuTimer<Q> {
    api: Api,
    queries: Q,
    valid: bool,
}

impl<Q: TimestampQueries> GpuTimer<Q> {
    pub fn new(api: Api, queries: Q) -> Self {
        Self {
            api,
            queries,
            valid: false,
        }
    }
}

impl<Q: TimestampQueries> Timer for GpuTimer<Q> {
    fn start(&mut self) -> Result<()> {
        self.queries.begin()
    }

    fn stop(&mut self) -> Result<()> {
        self.queries.end()?;
        self.valid = true;
        Ok(())
    }

    fn query(&mut self) -> u64 {
        if !std::mem::take(&mut self.valid) {
            return 0;
        }
        match self.queries.read() {
            Ok(Some(readback)) => {
                let micros = readback.elapsed_micros();
                trace!(api = %self.api, ?readback, micros, "GPU timer query");
                micros
            }
            Ok(None) => 0,
            Err(e) => {
                warn!(api = %self.api, "GPU timer readback failed: {e}");
                0
            }
        }
    }
}

impl<Q: TimestampQueries + Send> GraphicsTimer for GpuTimer<Q> {
    fn api(&self) -> Api {
        self.api
    }
}

/// A [`Timer`] measuring wall-clock time on the host.
///
/// Successive `start`/`stop` pairs accumulate; `query` returns the total and
/// resets it.
#[derive(Debug, Default)]
pub struct CpuTimer {
    started: Option<Instant>,
    accumulated: Duration,
}

impl CpuTimer {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Timer for CpuTimer {
    fn start(&mut self) -> Result<()> {
        self.started = Some(Instant::now());
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        if let Some(started) = self.started.take() {
            self.accumulated += started.elapsed();
        }
        Ok(())
    }

    fn query(&mut self) -> u64 {
        std::mem::take(&mut self.accumulated).as_micros() as u64
    }
}
